//! Session inactivity monitor.
//!
//! A per-session state machine with three states and two named timers:
//!
//! ```text
//!            activity                    activity
//!   ┌──────────────────┐        ┌──────────────────────┐
//!   ▼                  │        │                      │
//! Active ──warning_timer──▶ Warning ──expiry_timer──▶ Expired
//! ```
//!
//! `warning_timer` is due `inactivity_timeout - warning_time` after the last
//! activity; `expiry_timer` is due `warning_time` after entering Warning.
//! Every qualifying activity event resets the machine, with no throttling.
//!
//! The monitor does not spawn anything. Time comes from an injected [`Clock`]
//! and the owner calls [`SessionMonitor::tick`] periodically (a UI frame, a
//! once-per-second loop) to fire due timers.

use crate::clock::Clock;
use crate::{Error, Result, SessionId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// User-interaction signals that count as activity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    PointerMove,
    KeyPress,
    PointerDown,
    Scroll,
    Touch,
}

impl ActivityEvent {
    pub const ALL: [ActivityEvent; 5] = [
        ActivityEvent::PointerMove,
        ActivityEvent::KeyPress,
        ActivityEvent::PointerDown,
        ActivityEvent::Scroll,
        ActivityEvent::Touch,
    ];

    /// Map a DOM event name onto an activity event; other events don't count
    pub fn from_dom_event(name: &str) -> Option<Self> {
        match name {
            "mousemove" | "pointermove" => Some(ActivityEvent::PointerMove),
            "keydown" | "keypress" => Some(ActivityEvent::KeyPress),
            "mousedown" | "pointerdown" => Some(ActivityEvent::PointerDown),
            "scroll" => Some(ActivityEvent::Scroll),
            "touchstart" => Some(ActivityEvent::Touch),
            _ => None,
        }
    }
}

/// Lifecycle state of a monitored session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Warning { expires_at: DateTime<Utc> },
    /// Terminal: the countdown ran out
    Expired,
    /// Terminal: the user logged out explicitly
    LoggedOut,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Expired | SessionState::LoggedOut)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Warning,
    Expiry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    Timeout,
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectReason::Timeout => f.write_str("timeout"),
        }
    }
}

/// Where to send the user after a forced logout
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub target: String,
    pub reason: RedirectReason,
}

impl Redirect {
    pub fn url(&self) -> String {
        let separator = if self.target.contains('?') { '&' } else { '?' };
        format!("{}{}reason={}", self.target, separator, self.reason)
    }
}

/// Observable state changes
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    EnteredWarning { at: DateTime<Utc>, expires_at: DateTime<Utc> },
    ReturnedToActive { at: DateTime<Utc> },
    Expired { at: DateTime<Utc>, redirect: Redirect },
}

/// Validated timing parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    inactivity_timeout: Duration,
    warning_time: Duration,
    login_path: String,
}

impl SessionSettings {
    /// # Errors
    /// `Config` unless `0 < warning_time < inactivity_timeout`.
    pub fn new(inactivity_timeout: Duration, warning_time: Duration) -> Result<Self> {
        if warning_time <= Duration::zero() {
            return Err(Error::Config("session warning time must be positive".into()));
        }
        if warning_time >= inactivity_timeout {
            return Err(Error::Config(format!(
                "session warning time ({}s) must be shorter than the inactivity timeout ({}s)",
                warning_time.num_seconds(),
                inactivity_timeout.num_seconds()
            )));
        }
        Ok(Self {
            inactivity_timeout,
            warning_time,
            login_path: "/login".into(),
        })
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn inactivity_timeout(&self) -> Duration {
        self.inactivity_timeout
    }

    pub fn warning_time(&self) -> Duration {
        self.warning_time
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Quiet time before the warning appears
    pub fn warning_lead(&self) -> Duration {
        self.inactivity_timeout - self.warning_time
    }
}

/// The authority that actually invalidates the session credential
pub trait SessionTerminator {
    fn invalidate(&mut self, session: SessionId) -> Result<()>;
}

/// Terminator for sessions with no remote credential
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalOnly;

impl SessionTerminator for LocalOnly {
    fn invalidate(&mut self, _session: SessionId) -> Result<()> {
        Ok(())
    }
}

pub struct SessionMonitor<C: Clock, T: SessionTerminator> {
    id: SessionId,
    settings: SessionSettings,
    clock: C,
    terminator: T,
    state: SessionState,
    last_activity: DateTime<Utc>,
    warning_timer: Option<DateTime<Utc>>,
    expiry_timer: Option<DateTime<Utc>>,
}

impl<C: Clock, T: SessionTerminator> SessionMonitor<C, T> {
    /// Start monitoring a freshly logged-in session
    pub fn start(settings: SessionSettings, clock: C, terminator: T) -> Self {
        let now = clock.now();
        let mut monitor = Self {
            id: SessionId::new(),
            settings,
            clock,
            terminator,
            state: SessionState::Active,
            last_activity: now,
            warning_timer: None,
            expiry_timer: None,
        };
        monitor.arm_warning(now);
        tracing::debug!("Session {} started", monitor.id);
        monitor
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn terminator(&self) -> &T {
        &self.terminator
    }

    /// Timers currently pending
    pub fn live_timers(&self) -> Vec<TimerKind> {
        let mut live = Vec::new();
        if self.warning_timer.is_some() {
            live.push(TimerKind::Warning);
        }
        if self.expiry_timer.is_some() {
            live.push(TimerKind::Expiry);
        }
        live
    }

    /// Time left on the warning countdown; `None` outside Warning
    pub fn countdown(&self) -> Option<Duration> {
        match self.state {
            SessionState::Warning { expires_at } => {
                Some((expires_at - self.clock.now()).max(Duration::zero()))
            }
            _ => None,
        }
    }

    /// Fire every timer that is due, in deadline order
    pub fn tick(&mut self) -> Vec<Transition> {
        let now = self.clock.now();
        let mut transitions = Vec::new();

        while let Some((kind, due)) = self.next_due(now) {
            match kind {
                TimerKind::Warning => {
                    self.warning_timer = None;
                    let expires_at = due + self.settings.warning_time;
                    self.expiry_timer = Some(expires_at);
                    self.state = SessionState::Warning { expires_at };
                    tracing::info!("Session {} idle, expires at {}", self.id, expires_at);
                    transitions.push(Transition::EnteredWarning { at: due, expires_at });
                }
                TimerKind::Expiry => {
                    let redirect = self.expire();
                    transitions.push(Transition::Expired { at: due, redirect });
                }
            }
        }

        transitions
    }

    /// Register a user-interaction signal
    ///
    /// Timers that were already due fire first, so activity after the
    /// deadline cannot revive an expired session.
    pub fn record_activity(&mut self, event: ActivityEvent) -> Vec<Transition> {
        let mut transitions = self.tick();
        if self.state.is_terminal() {
            tracing::debug!("Ignoring {:?} on closed session {}", event, self.id);
            return transitions;
        }

        let now = self.clock.now();
        let was_warning = matches!(self.state, SessionState::Warning { .. });

        self.last_activity = now;
        self.expiry_timer = None;
        self.state = SessionState::Active;
        self.arm_warning(now);

        if was_warning {
            tracing::info!("Session {} active again after {:?}", self.id, event);
            transitions.push(Transition::ReturnedToActive { at: now });
        }
        transitions
    }

    /// Destroy the session explicitly. Cancels all timers.
    pub fn logout(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.cancel_timers();
        self.state = SessionState::LoggedOut;
        self.invalidate_remote();
        tracing::info!("Session {} logged out", self.id);
    }

    fn arm_warning(&mut self, from: DateTime<Utc>) {
        // Assignment replaces any earlier pending timer
        self.warning_timer = Some(from + self.settings.warning_lead());
    }

    fn cancel_timers(&mut self) {
        self.warning_timer = None;
        self.expiry_timer = None;
    }

    fn next_due(&self, now: DateTime<Utc>) -> Option<(TimerKind, DateTime<Utc>)> {
        [
            self.warning_timer.map(|due| (TimerKind::Warning, due)),
            self.expiry_timer.map(|due| (TimerKind::Expiry, due)),
        ]
        .into_iter()
        .flatten()
        .filter(|(_, due)| *due <= now)
        .min_by_key(|(_, due)| *due)
    }

    fn expire(&mut self) -> Redirect {
        self.cancel_timers();
        self.state = SessionState::Expired;
        self.invalidate_remote();
        tracing::info!("Session {} expired after inactivity", self.id);
        Redirect {
            target: self.settings.login_path.clone(),
            reason: RedirectReason::Timeout,
        }
    }

    /// Remote invalidation is best-effort; local state is already cleared
    fn invalidate_remote(&mut self) {
        if let Err(e) = self.terminator.invalidate(self.id) {
            tracing::warn!("Failed to invalidate session {} remotely: {}", self.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    /// Records invalidation calls; optionally fails them
    #[derive(Default)]
    struct RecordingTerminator {
        calls: Vec<SessionId>,
        fail: bool,
    }

    impl SessionTerminator for RecordingTerminator {
        fn invalidate(&mut self, session: SessionId) -> Result<()> {
            self.calls.push(session);
            if self.fail {
                Err(Error::Repository("network unreachable".into()))
            } else {
                Ok(())
            }
        }
    }

    fn settings() -> SessionSettings {
        SessionSettings::new(Duration::minutes(30), Duration::minutes(5)).unwrap()
    }

    fn start(fail: bool) -> (ManualClock, SessionMonitor<ManualClock, RecordingTerminator>) {
        crate::logging::init_test();
        let clock = ManualClock::new(Utc::now());
        let terminator = RecordingTerminator {
            calls: vec![],
            fail,
        };
        let monitor = SessionMonitor::start(settings(), clock.clone(), terminator);
        (clock, monitor)
    }

    #[test]
    fn test_settings_require_warning_shorter_than_timeout() {
        assert!(SessionSettings::new(Duration::minutes(5), Duration::minutes(5)).is_err());
        assert!(SessionSettings::new(Duration::minutes(5), Duration::minutes(10)).is_err());
        assert!(SessionSettings::new(Duration::minutes(5), Duration::zero()).is_err());
        assert_eq!(settings().warning_lead(), Duration::minutes(25));
    }

    #[test]
    fn test_starts_active_with_only_warning_timer() {
        let (_clock, monitor) = start(false);
        assert_eq!(monitor.state(), SessionState::Active);
        assert_eq!(monitor.live_timers(), vec![TimerKind::Warning]);
        assert_eq!(monitor.countdown(), None);
    }

    #[test]
    fn test_enters_warning_after_25_minutes() {
        let (clock, mut monitor) = start(false);

        clock.advance(Duration::minutes(24) + Duration::seconds(59));
        assert!(monitor.tick().is_empty());

        clock.advance(Duration::seconds(1));
        let transitions = monitor.tick();
        assert_eq!(transitions.len(), 1);
        assert!(matches!(transitions[0], Transition::EnteredWarning { .. }));
        assert!(matches!(monitor.state(), SessionState::Warning { .. }));
        assert_eq!(monitor.countdown(), Some(Duration::minutes(5)));
        assert_eq!(monitor.live_timers(), vec![TimerKind::Expiry]);
    }

    #[test]
    fn test_activity_in_warning_returns_to_active() {
        let (clock, mut monitor) = start(false);
        clock.advance(Duration::minutes(25));
        monitor.tick();

        let transitions = monitor.record_activity(ActivityEvent::KeyPress);
        assert_eq!(transitions.len(), 1);
        assert!(matches!(transitions[0], Transition::ReturnedToActive { .. }));
        assert_eq!(monitor.state(), SessionState::Active);
        assert_eq!(monitor.countdown(), None);
        assert_eq!(monitor.live_timers(), vec![TimerKind::Warning]);

        // Countdown was cancelled: nothing happens at the old expiry time
        clock.advance(Duration::minutes(5));
        assert!(monitor.tick().is_empty());
        assert_eq!(monitor.state(), SessionState::Active);
    }

    #[test]
    fn test_expires_at_30_minutes_and_redirects() {
        let (clock, mut monitor) = start(false);
        clock.advance(Duration::minutes(25));
        monitor.tick();
        clock.advance(Duration::minutes(5));

        let transitions = monitor.tick();
        match &transitions[..] {
            [Transition::Expired { redirect, .. }] => {
                assert_eq!(redirect.reason, RedirectReason::Timeout);
                assert_eq!(redirect.url(), "/login?reason=timeout");
            }
            other => panic!("unexpected transitions: {:?}", other),
        }
        assert_eq!(monitor.state(), SessionState::Expired);
        assert!(monitor.live_timers().is_empty());
        assert_eq!(monitor.terminator().calls, vec![monitor.id()]);
    }

    #[test]
    fn test_late_tick_fires_both_timers_in_order() {
        let (clock, mut monitor) = start(false);
        let started = clock.now();
        clock.advance(Duration::hours(2));

        let transitions = monitor.tick();
        assert_eq!(transitions.len(), 2);
        match (&transitions[0], &transitions[1]) {
            (Transition::EnteredWarning { at, expires_at }, Transition::Expired { at: expired, .. }) => {
                assert_eq!(*at, started + Duration::minutes(25));
                assert_eq!(*expires_at, started + Duration::minutes(30));
                assert_eq!(*expired, *expires_at);
            }
            other => panic!("unexpected transitions: {:?}", other),
        }
    }

    #[test]
    fn test_every_event_resets_the_timeout() {
        let (clock, mut monitor) = start(false);
        for event in ActivityEvent::ALL {
            clock.advance(Duration::minutes(20));
            assert!(monitor.record_activity(event).is_empty());
            assert_eq!(monitor.state(), SessionState::Active);
            assert_eq!(monitor.last_activity(), clock.now());
        }
    }

    #[test]
    fn test_activity_after_deadline_cannot_revive() {
        let (clock, mut monitor) = start(false);
        clock.advance(Duration::minutes(31));

        let transitions = monitor.record_activity(ActivityEvent::PointerMove);
        assert!(matches!(transitions.last(), Some(Transition::Expired { .. })));
        assert_eq!(monitor.state(), SessionState::Expired);
        assert!(monitor.record_activity(ActivityEvent::Scroll).is_empty());
    }

    #[test]
    fn test_logout_cancels_all_timers() {
        let (clock, mut monitor) = start(false);
        clock.advance(Duration::minutes(26));
        monitor.tick();
        assert_eq!(monitor.live_timers(), vec![TimerKind::Expiry]);

        monitor.logout();
        assert_eq!(monitor.state(), SessionState::LoggedOut);
        assert!(monitor.live_timers().is_empty());

        clock.advance(Duration::hours(1));
        assert!(monitor.tick().is_empty());
        assert_eq!(monitor.terminator().calls.len(), 1);
    }

    #[test]
    fn test_failed_remote_invalidation_still_expires_locally() {
        let (clock, mut monitor) = start(true);
        clock.advance(Duration::minutes(30));

        let transitions = monitor.tick();
        assert!(matches!(transitions.last(), Some(Transition::Expired { .. })));
        assert_eq!(monitor.state(), SessionState::Expired);
        assert_eq!(monitor.terminator().calls.len(), 1);
    }

    #[test]
    fn test_redirect_url_keeps_existing_query() {
        let redirect = Redirect {
            target: "/auth?next=/plantas".into(),
            reason: RedirectReason::Timeout,
        };
        assert_eq!(redirect.url(), "/auth?next=/plantas&reason=timeout");
    }

    #[test]
    fn test_dom_event_mapping() {
        assert_eq!(ActivityEvent::from_dom_event("mousemove"), Some(ActivityEvent::PointerMove));
        assert_eq!(ActivityEvent::from_dom_event("touchstart"), Some(ActivityEvent::Touch));
        assert_eq!(ActivityEvent::from_dom_event("focus"), None);
    }

    #[test]
    fn test_fresh_session_on_wall_clock_is_active() {
        let mut monitor = SessionMonitor::start(settings(), crate::clock::SystemClock, LocalOnly);
        assert!(monitor.tick().is_empty());
        assert_eq!(monitor.state(), SessionState::Active);
        assert!(monitor.last_activity() <= Utc::now());
    }
}
