//! Preferences persistence
//!
//! A single capability with two backends: a local JSON file for anonymous use and the remote
//! preferences endpoint once a session token is available.

pub mod local;
pub mod remote;

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{error::StoreError, state::Preferences};

pub use local::LocalStore;
pub use remote::RemoteStore;

#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// Short name used in logs and status output
    fn name(&self) -> &'static str;

    async fn load(&self) -> Result<Preferences, StoreError>;

    async fn save(&self, preferences: &Preferences) -> Result<(), StoreError>;
}

/// Pick the backend: remote when a session token is present, local otherwise
pub fn select_store(
    local_path: impl Into<PathBuf>,
    backend_url: Option<&str>,
    token: Option<&str>,
) -> Arc<dyn PreferencesStore> {
    match (backend_url, token) {
        (Some(base_url), Some(token)) => {
            info!("Using remote preferences at {}", base_url);
            Arc::new(RemoteStore::new(base_url, token))
        }
        (None, Some(_)) => {
            warn!("Session token given without a backend URL, keeping preferences locally");
            local_store(local_path)
        }
        _ => local_store(local_path),
    }
}

fn local_store(path: impl Into<PathBuf>) -> Arc<dyn PreferencesStore> {
    let store = LocalStore::new(path);
    info!("Using local preferences file {}", store.path().display());
    Arc::new(store)
}

/// Read the starting preferences, falling back to defaults on any failure
pub async fn load_initial_preferences(store: &dyn PreferencesStore) -> Preferences {
    match store.load().await {
        Ok(preferences) => match preferences.validate() {
            Ok(()) => preferences,
            Err(e) => {
                warn!("Stored preferences are invalid ({}), using defaults", e);
                Preferences::default()
            }
        },
        Err(e) => {
            warn!("Failed to load preferences from {} store: {}", store.name(), e);
            Preferences::default()
        }
    }
}
