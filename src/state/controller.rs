//! Pomodoro session controller
//!
//! Owns the countdown and the focus/break cycle. The controller performs no I/O: everything it
//! wants to say goes out through the registered [`TimerEventSink`]s, in registration order.

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{AlertSettings, Phase, SessionState, TimerConfig, TimerEvent};

/// Focus sessions between long breaks
const LONG_BREAK_EVERY: u32 = 4;

/// Receiver of controller events
pub trait TimerEventSink: Send {
    fn handle(&mut self, event: &TimerEvent);
}

impl<F> TimerEventSink for F
where
    F: FnMut(&TimerEvent) + Send,
{
    fn handle(&mut self, event: &TimerEvent) {
        self(event)
    }
}

/// Fans events out to async subscribers
#[derive(Debug, Clone)]
pub struct BroadcastSink(pub broadcast::Sender<TimerEvent>);

impl TimerEventSink for BroadcastSink {
    fn handle(&mut self, event: &TimerEvent) {
        // No subscribers is fine, the event is simply unobserved
        if self.0.send(event.clone()).is_err() {
            debug!("No subscribers for {} event", event.name());
        }
    }
}

/// Percentage of `total_seconds` already elapsed, clamped to [0, 100]
pub fn progress(total_seconds: u32, time_left_seconds: u32) -> f64 {
    if total_seconds == 0 {
        return 100.0;
    }
    let total = f64::from(total_seconds);
    ((total - f64::from(time_left_seconds)) / total * 100.0).clamp(0.0, 100.0)
}

pub struct SessionController {
    config: TimerConfig,
    alerts: AlertSettings,
    state: SessionState,
    sinks: Vec<Box<dyn TimerEventSink>>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("alerts", &self.alerts)
            .field("state", &self.state)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl SessionController {
    /// Create a paused controller at the start of the first focus session
    pub fn new(config: TimerConfig, alerts: AlertSettings) -> Self {
        Self {
            state: SessionState::new(config.study_seconds()),
            config,
            alerts,
            sinks: Vec::new(),
        }
    }

    pub fn register_sink(&mut self, sink: impl TimerEventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn alerts(&self) -> &AlertSettings {
        &self.alerts
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    /// Elapsed share of the current phase, in percent
    pub fn progress(&self) -> f64 {
        progress(self.state.phase_duration_seconds, self.state.time_left_seconds)
    }

    /// Resume the countdown. Does nothing once the countdown has reached zero.
    pub fn start(&mut self) {
        if self.state.is_running || self.state.time_left_seconds == 0 {
            return;
        }
        self.state.is_running = true;
        debug!("Timer started in {} phase", self.state.phase.label());
    }

    pub fn pause(&mut self) {
        self.state.is_running = false;
    }

    /// Back to the first focus session. The completed count survives a reset.
    pub fn reset(&mut self) {
        self.state.is_running = false;
        self.state.current_session = 1;
        self.state.enter(Phase::Focus, self.config.study_seconds());
        info!("Timer reset to session 1");
    }

    /// Replace the cycle configuration. The running countdown keeps its length until the next
    /// phase boundary. A shorter cycle pulls the current session back inside it, so the next break
    /// end completes the cycle.
    pub fn update_config(&mut self, config: TimerConfig) {
        let last_session = config.study_sessions.max(1);
        if self.state.current_session > last_session {
            debug!(
                "Current session {} is past the new cycle length, moving to {}",
                self.state.current_session, last_session
            );
            self.state.current_session = last_session;
        }
        self.config = config;
        debug!("Timer configuration updated: {:?}", config);
    }

    pub fn update_alerts(&mut self, alerts: AlertSettings) {
        self.alerts = alerts;
    }

    /// Advance the countdown by one second.
    ///
    /// Reaching zero ends the phase within the same tick: the end of the phase is announced, the
    /// next phase is entered and announced (or the cycle completes).
    pub fn tick(&mut self) {
        if !self.state.is_running {
            return;
        }

        if self.state.time_left_seconds > 0 {
            self.state.time_left_seconds -= 1;
            self.emit(TimerEvent::TimeUpdated {
                time_left_seconds: self.state.time_left_seconds,
            });
        }

        if self.state.time_left_seconds == 0 {
            self.end_phase();
        }
    }

    fn end_phase(&mut self) {
        let ended = self.state.phase;
        info!("{} phase ended (session {})", ended.label(), self.state.current_session);

        self.emit(TimerEvent::PhaseEnded { phase: ended });
        self.request_alerts(ended);

        match ended {
            Phase::Focus => self.enter_break(),
            Phase::Break | Phase::LongBreak => self.finish_break(),
        }
    }

    fn enter_break(&mut self) {
        // Decided on the session that just finished, and never on the last one
        let session = self.state.current_session;
        let long_break = self.config.enable_long_breaks
            && session % LONG_BREAK_EVERY == 0
            && session < self.config.study_sessions;

        let (phase, duration) = if long_break {
            (Phase::LongBreak, self.config.long_break_seconds())
        } else {
            (Phase::Break, self.config.break_seconds())
        };

        self.state.enter(phase, duration);
        self.state.completed_sessions += 1;
        if !self.config.auto_start_breaks {
            self.state.is_running = false;
        }

        self.emit(TimerEvent::PhaseStarted { phase, duration_seconds: duration });
    }

    fn finish_break(&mut self) {
        if self.state.current_session < self.config.study_sessions {
            self.state.current_session += 1;
            let duration = self.config.study_seconds();
            self.state.enter(Phase::Focus, duration);
            if !self.config.auto_start_pomodoros {
                self.state.is_running = false;
            }

            self.emit(TimerEvent::PhaseStarted {
                phase: Phase::Focus,
                duration_seconds: duration,
            });
        } else {
            self.state.is_running = false;
            self.state.completed_sessions += 1;
            info!(
                "Cycle complete after {} sessions ({} completed in total)",
                self.config.study_sessions, self.state.completed_sessions
            );
            self.emit(TimerEvent::SessionCompleted);
        }
    }

    fn request_alerts(&mut self, ended: Phase) {
        if self.alerts.sound_enabled {
            self.emit(TimerEvent::AlarmRequested { volume: self.alerts.volume() });
        }

        if self.alerts.notifications {
            let (title, body) = if ended.is_break() {
                ("Break finished!", "Time to focus again.")
            } else {
                ("Time to take a break!", "Good job! Take a short break.")
            };
            self.emit(TimerEvent::NotificationRequested {
                title: title.to_string(),
                body: body.to_string(),
            });
        }
    }

    fn emit(&mut self, event: TimerEvent) {
        for sink in &mut self.sinks {
            sink.handle(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn config() -> TimerConfig {
        TimerConfig {
            study_sessions: 4,
            study_length: 25,
            break_length: 5,
            long_break_length: 15,
            enable_long_breaks: true,
            auto_start_breaks: true,
            auto_start_pomodoros: true,
        }
    }

    fn quiet() -> AlertSettings {
        AlertSettings { sound_enabled: false, sound_volume: 0, notifications: false }
    }

    fn recording(
        config: TimerConfig,
        alerts: AlertSettings,
    ) -> (SessionController, Arc<Mutex<Vec<TimerEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut controller = SessionController::new(config, alerts);
        let sink = Arc::clone(&events);
        controller.register_sink(move |event: &TimerEvent| sink.lock().unwrap().push(event.clone()));
        (controller, events)
    }

    fn run(controller: &mut SessionController, ticks: u32) {
        for _ in 0..ticks {
            controller.tick();
        }
    }

    /// Run until the current phase ends, restarting if auto-start gating paused the timer
    fn finish_phase(controller: &mut SessionController) {
        let ticks = controller.state().time_left_seconds;
        run(controller, ticks);
        controller.start();
    }

    #[test]
    fn test_new_controller_is_paused_at_first_focus() {
        let controller = SessionController::new(config(), quiet());
        let state = controller.state();
        assert_eq!(state.phase, Phase::Focus);
        assert_eq!(state.time_left_seconds, 1500);
        assert_eq!(state.current_session, 1);
        assert_eq!(state.completed_sessions, 0);
        assert!(!state.is_running);
    }

    #[test]
    fn test_tick_does_nothing_while_paused() {
        let (mut controller, events) = recording(config(), quiet());
        run(&mut controller, 10);
        assert_eq!(controller.state().time_left_seconds, 1500);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_start_pause_are_idempotent() {
        let mut controller = SessionController::new(config(), quiet());
        controller.start();
        controller.start();
        assert!(controller.is_running());
        controller.tick();
        controller.pause();
        controller.pause();
        assert!(!controller.is_running());
        assert_eq!(controller.state().time_left_seconds, 1499);
    }

    #[test]
    fn test_focus_ends_exactly_after_study_length_ticks() {
        let (mut controller, events) = recording(config(), quiet());
        controller.reset();
        controller.start();

        run(&mut controller, 1499);
        assert_eq!(controller.state().phase, Phase::Focus);
        assert_eq!(controller.state().time_left_seconds, 1);
        events.lock().unwrap().clear();

        controller.tick();
        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                TimerEvent::TimeUpdated { time_left_seconds: 0 },
                TimerEvent::PhaseEnded { phase: Phase::Focus },
                TimerEvent::PhaseStarted { phase: Phase::Break, duration_seconds: 300 },
            ]
        );
        assert_eq!(controller.state().phase, Phase::Break);
        assert_eq!(controller.state().completed_sessions, 1);
    }

    #[test]
    fn test_focus_break_focus_scenario() {
        let mut controller = SessionController::new(config(), quiet());
        controller.start();

        run(&mut controller, 25 * 60 + 5 * 60);
        let state = controller.state();
        assert_eq!(state.current_session, 2);
        assert_eq!(state.phase, Phase::Focus);
        assert_eq!(state.time_left_seconds, 1500);
        assert_eq!(state.completed_sessions, 1);
        assert!(state.is_running);

        run(&mut controller, 25 * 60);
        let state = controller.state();
        assert_eq!(state.current_session, 2);
        assert_eq!(state.phase, Phase::Break);
        assert_eq!(state.completed_sessions, 2);
    }

    #[test]
    fn test_long_break_after_fourth_session_but_not_the_last() {
        let mut controller = SessionController::new(TimerConfig { study_sessions: 8, ..config() }, quiet());
        controller.start();

        let mut breaks = Vec::new();
        for _ in 0..8 {
            finish_phase(&mut controller);
            breaks.push((controller.state().current_session, controller.state().phase));
            finish_phase(&mut controller);
        }

        assert_eq!(breaks[3], (4, Phase::LongBreak));
        assert_eq!(breaks[7], (8, Phase::Break));
        assert!(breaks
            .iter()
            .filter(|(session, _)| *session != 4)
            .all(|(_, phase)| *phase == Phase::Break));
    }

    #[test]
    fn test_long_break_uses_long_break_length() {
        let mut controller = SessionController::new(config(), quiet());
        controller.start();
        for _ in 0..3 {
            finish_phase(&mut controller);
            finish_phase(&mut controller);
        }
        finish_phase(&mut controller);
        assert_eq!(controller.state().phase, Phase::LongBreak);
        assert_eq!(controller.state().time_left_seconds, 15 * 60);
    }

    #[test]
    fn test_long_breaks_can_be_disabled() {
        let cfg = TimerConfig { study_sessions: 8, enable_long_breaks: false, ..config() };
        let mut controller = SessionController::new(cfg, quiet());
        controller.start();
        for _ in 0..3 {
            finish_phase(&mut controller);
            finish_phase(&mut controller);
        }
        finish_phase(&mut controller);
        assert_eq!(controller.state().current_session, 4);
        assert_eq!(controller.state().phase, Phase::Break);
    }

    #[test]
    fn test_single_session_cycle_stops_in_terminal_state() {
        let cfg = TimerConfig { study_sessions: 1, ..config() };
        let (mut controller, events) = recording(cfg, quiet());
        controller.start();

        run(&mut controller, 1500 + 300);
        let state = controller.state().clone();
        assert!(!state.is_running);
        assert_eq!(state.current_session, 1);
        assert_eq!(state.time_left_seconds, 0);
        // focus end and final break end
        assert_eq!(state.completed_sessions, 2);
        assert_eq!(events.lock().unwrap().last(), Some(&TimerEvent::SessionCompleted));

        controller.start();
        run(&mut controller, 100);
        assert_eq!(controller.state(), &state);

        controller.reset();
        assert_eq!(controller.state().time_left_seconds, 1500);
        assert_eq!(controller.state().completed_sessions, 2);
        controller.start();
        assert!(controller.is_running());
    }

    #[test]
    fn test_auto_start_breaks_off_pauses_on_break() {
        let cfg = TimerConfig { auto_start_breaks: false, ..config() };
        let mut controller = SessionController::new(cfg, quiet());
        controller.start();
        run(&mut controller, 1500);
        assert_eq!(controller.state().phase, Phase::Break);
        assert!(!controller.is_running());
        assert_eq!(controller.state().time_left_seconds, 300);

        // halted at the full duration until started again
        run(&mut controller, 10);
        assert_eq!(controller.state().time_left_seconds, 300);
    }

    #[test]
    fn test_auto_start_pomodoros_off_pauses_on_focus() {
        let cfg = TimerConfig { auto_start_pomodoros: false, ..config() };
        let mut controller = SessionController::new(cfg, quiet());
        controller.start();
        run(&mut controller, 1500);
        assert!(controller.is_running());
        run(&mut controller, 300);
        assert_eq!(controller.state().phase, Phase::Focus);
        assert_eq!(controller.state().current_session, 2);
        assert!(!controller.is_running());
    }

    #[test]
    fn test_completed_sessions_never_decrease() {
        let cfg = TimerConfig { study_sessions: 5, study_length: 1, break_length: 1, long_break_length: 2, ..config() };
        let mut controller = SessionController::new(cfg, quiet());
        controller.start();

        let mut last = 0;
        for step in 0..2000 {
            match step {
                700 => controller.reset(),
                900 => controller.pause(),
                901 => controller.start(),
                _ => {}
            }
            controller.tick();
            if !controller.is_running() {
                controller.start();
            }
            let completed = controller.state().completed_sessions;
            assert!(completed >= last);
            last = completed;
        }
        assert!(last > 0);
    }

    #[test]
    fn test_reset_keeps_completed_count() {
        let mut controller = SessionController::new(config(), quiet());
        controller.start();
        run(&mut controller, 1500 + 300 + 10);
        controller.reset();
        let state = controller.state();
        assert!(!state.is_running);
        assert_eq!(state.phase, Phase::Focus);
        assert_eq!(state.current_session, 1);
        assert_eq!(state.time_left_seconds, 1500);
        assert_eq!(state.completed_sessions, 1);
    }

    #[test]
    fn test_reset_from_short_break() {
        let mut controller = SessionController::new(config(), quiet());
        controller.start();
        run(&mut controller, 1500 + 30);
        assert_eq!(controller.state().phase, Phase::Break);

        controller.reset();
        let state = controller.state();
        assert!(!state.is_running);
        assert_eq!(state.phase, Phase::Focus);
        assert_eq!(state.current_session, 1);
        assert_eq!(state.time_left_seconds, 1500);
        assert_eq!(state.phase_duration_seconds, 1500);
        assert_eq!(state.completed_sessions, 1);
        assert_eq!(controller.progress(), 0.0);
    }

    #[test]
    fn test_reset_from_long_break() {
        let mut controller = SessionController::new(TimerConfig { study_sessions: 8, ..config() }, quiet());
        controller.start();
        for _ in 0..3 {
            finish_phase(&mut controller);
            finish_phase(&mut controller);
        }
        finish_phase(&mut controller);
        run(&mut controller, 60);
        assert_eq!(controller.state().phase, Phase::LongBreak);
        assert_eq!(controller.state().current_session, 4);

        controller.reset();
        let state = controller.state();
        assert!(!state.is_running);
        assert_eq!(state.phase, Phase::Focus);
        assert_eq!(state.current_session, 1);
        assert_eq!(state.time_left_seconds, 1500);
        assert_eq!(state.phase_duration_seconds, 1500);
        assert_eq!(state.completed_sessions, 4);

        // the next focus end is an ordinary short break again
        controller.start();
        run(&mut controller, 1500);
        assert_eq!(controller.state().phase, Phase::Break);
        assert_eq!(controller.state().time_left_seconds, 300);
    }

    #[test]
    fn test_shorter_cycle_clamps_current_session() {
        let (mut controller, events) = recording(config(), quiet());
        controller.start();
        for _ in 0..2 {
            finish_phase(&mut controller);
            finish_phase(&mut controller);
        }
        assert_eq!(controller.state().current_session, 3);
        assert_eq!(controller.state().phase, Phase::Focus);

        controller.update_config(TimerConfig { study_sessions: 2, ..config() });
        assert_eq!(controller.state().current_session, 2);
        assert_eq!(controller.state().phase, Phase::Focus);
        assert_eq!(controller.state().time_left_seconds, 1500);

        finish_phase(&mut controller);
        assert_eq!(controller.state().phase, Phase::Break);
        events.lock().unwrap().clear();
        run(&mut controller, 300);

        let state = controller.state();
        assert!(!state.is_running);
        assert_eq!(state.current_session, 2);
        assert_eq!(state.time_left_seconds, 0);
        assert_eq!(state.completed_sessions, 4);
        assert_eq!(events.lock().unwrap().last(), Some(&TimerEvent::SessionCompleted));
    }

    #[test]
    fn test_longer_cycle_keeps_current_session() {
        let mut controller = SessionController::new(config(), quiet());
        controller.start();
        finish_phase(&mut controller);
        finish_phase(&mut controller);
        controller.update_config(TimerConfig { study_sessions: 6, ..config() });
        assert_eq!(controller.state().current_session, 2);
    }

    #[test]
    fn test_update_config_applies_at_next_boundary() {
        let mut controller = SessionController::new(config(), quiet());
        controller.start();
        run(&mut controller, 100);

        controller.update_config(TimerConfig { study_length: 50, break_length: 10, ..config() });
        assert_eq!(controller.state().time_left_seconds, 1400);
        assert_eq!(controller.state().phase_duration_seconds, 1500);

        run(&mut controller, 1400);
        assert_eq!(controller.state().phase, Phase::Break);
        assert_eq!(controller.state().time_left_seconds, 600);
    }

    #[test]
    fn test_alerts_follow_settings() {
        let alerts = AlertSettings { sound_enabled: true, sound_volume: 40, notifications: true };
        let (mut controller, events) = recording(config(), alerts);
        controller.start();
        run(&mut controller, 1500);

        let events = events.lock().unwrap();
        let tail: Vec<_> = events.iter().skip_while(|e| !matches!(e, TimerEvent::PhaseEnded { .. })).cloned().collect();
        assert_eq!(
            tail,
            vec![
                TimerEvent::PhaseEnded { phase: Phase::Focus },
                TimerEvent::AlarmRequested { volume: 0.4 },
                TimerEvent::NotificationRequested {
                    title: "Time to take a break!".to_string(),
                    body: "Good job! Take a short break.".to_string(),
                },
                TimerEvent::PhaseStarted { phase: Phase::Break, duration_seconds: 300 },
            ]
        );
    }

    #[test]
    fn test_break_end_notification_text() {
        let alerts = AlertSettings { sound_enabled: false, sound_volume: 0, notifications: true };
        let (mut controller, events) = recording(config(), alerts);
        controller.start();
        run(&mut controller, 1800);

        let events = events.lock().unwrap();
        let titles: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::NotificationRequested { title, .. } => Some(title.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(titles, vec!["Time to take a break!", "Break finished!"]);
        assert!(!events.iter().any(|e| matches!(e, TimerEvent::AlarmRequested { .. })));
    }

    #[test]
    fn test_progress_bounds() {
        assert_eq!(progress(1500, 1500), 0.0);
        assert_eq!(progress(1500, 0), 100.0);
        assert!((progress(300, 150) - 50.0).abs() < f64::EPSILON);
        for left in 0..=300 {
            let p = progress(300, left);
            assert!((0.0..=100.0).contains(&p));
        }
        // a longer countdown than the phase would allow still clamps
        assert_eq!(progress(300, 600), 0.0);
    }

    #[test]
    fn test_controller_progress_tracks_phase_duration() {
        let mut controller = SessionController::new(config(), quiet());
        controller.start();
        run(&mut controller, 750);
        assert!((controller.progress() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_broadcast_sink_forwards_events() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut controller = SessionController::new(config(), quiet());
        controller.register_sink(BroadcastSink(tx));
        controller.start();
        controller.tick();
        assert_eq!(rx.try_recv().unwrap(), TimerEvent::TimeUpdated { time_left_seconds: 1499 });
    }
}
