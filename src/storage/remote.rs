//! Preferences stored by the authenticated backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::COOKIE, Client, RequestBuilder, StatusCode};
use tracing::debug;

use super::PreferencesStore;
use crate::{error::StoreError, state::Preferences};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for `GET`/`PUT /api/preferences`, authenticated by the session cookie
#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: String,
    token: String,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/api/preferences", self.base_url)
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(COOKIE, format!("token={}", self.token))
            .timeout(REQUEST_TIMEOUT)
    }
}

fn check_status(status: StatusCode) -> Result<(), StoreError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unauthorized(status.as_u16())),
        StatusCode::NOT_FOUND => Err(StoreError::NotFound),
        s => Err(StoreError::Status(s.as_u16())),
    }
}

#[async_trait]
impl PreferencesStore for RemoteStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn load(&self) -> Result<Preferences, StoreError> {
        debug!("Fetching preferences from {}", self.url());
        let response = self.auth_request(self.client.get(self.url())).send().await?;
        check_status(response.status())?;
        Ok(response.json::<Preferences>().await?)
    }

    async fn save(&self, preferences: &Preferences) -> Result<(), StoreError> {
        debug!("Uploading preferences to {}", self.url());
        let response = self
            .auth_request(self.client.put(self.url()))
            .json(preferences)
            .send()
            .await?;
        check_status(response.status())
    }
}
