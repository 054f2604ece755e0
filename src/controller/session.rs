//! Controller session - binds a profile, a normalized state and an event source
//!
//! # State Machine
//!
//! ```text
//! Detecting ──(open / attach)──► Ready ──(close)──► Closed
//!     │
//!     └── UnknownDevice (descriptor matches no family)
//! ```
//!
//! # Threading
//!
//! ```text
//! EventSource ──► dispatch thread ──send_if_modified──► watch<NormalizedState>
//!   (blocking)     (only writer)                            │
//!                                                read() ◄───┘ copy out, scale outside the lock
//! ```
//!
//! The state and the lifecycle status each live in a `tokio::sync::watch` channel.
//! The dispatch thread mutates the state in place under the channel's lock, and
//! readers copy it out under the same lock, so a reader never sees half an update.
//! The dispatch thread checks the status between events; closing a session never
//! joins the thread because the source read may block indefinitely.

use chrono::Local;
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::dispatcher::dispatch;
use super::profile::{ControllerFamily, DeviceProfile, ScalingOverrides};
use super::scaling::ScalingError;
use super::state::{NormalizedState, Snapshot};
use crate::device::{DeviceBackend, DeviceDescriptor, DeviceError, EventSource};

/// Additional device-name substrings per family, checked after the built-in ones
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionRules {
    pub xbox_one: Vec<String>,
    pub ps3: Vec<String>,
}

impl DetectionRules {
    pub fn detect(&self, device_name: &str) -> Option<ControllerFamily> {
        ControllerFamily::detect(device_name).or_else(|| {
            ControllerFamily::ALL.into_iter().find(|family| {
                self.patterns_for(*family)
                    .iter()
                    .any(|pattern| !pattern.is_empty() && device_name.contains(pattern.as_str()))
            })
        })
    }

    fn patterns_for(&self, family: ControllerFamily) -> &[String] {
        match family {
            ControllerFamily::XboxOne => &self.xbox_one,
            ControllerFamily::Ps3 => &self.ps3,
        }
    }
}

/// Settings for one controller session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds between dispatch statistics log lines
    pub stats_interval_secs: u64,

    pub detection: DetectionRules,

    /// Scaling overrides applied on top of the built-in Xbox One constants
    pub xbox_one: ScalingOverrides,

    /// Scaling overrides applied on top of the built-in PS3 constants
    pub ps3: ScalingOverrides,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            stats_interval_secs: 10,
            detection: DetectionRules::default(),
            xbox_one: ScalingOverrides::default(),
            ps3: ScalingOverrides::default(),
        }
    }
}

impl SessionSettings {
    pub fn overrides_for(&self, family: ControllerFamily) -> &ScalingOverrides {
        match family {
            ControllerFamily::XboxOne => &self.xbox_one,
            ControllerFamily::Ps3 => &self.ps3,
        }
    }

    pub fn validate(&self) -> Result<(), ScalingError> {
        self.xbox_one.validate()?;
        self.ps3.validate()
    }

    /// Profile for `family` with the configured overrides applied
    pub fn profile_for(&self, family: ControllerFamily) -> DeviceProfile {
        DeviceProfile::for_family(family).with_overrides(self.overrides_for(family))
    }
}

/// Errors surfaced to the owner of a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Enumeration returned no candidate; callers may retry later
    #[error("No gamepad found")]
    NoDeviceFound,

    /// The device matched neither supported family
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// The event source ended or failed; the session no longer updates
    #[error("Session closed")]
    SessionClosed,

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Failed to spawn dispatch thread: {0}")]
    Spawn(std::io::Error),

    #[error("Session has no bound profile")]
    NotBound,
}

/// Runtime lifecycle of a started session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Closed,
}

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Detecting,
    Ready(Arc<DeviceProfile>),
    Closed(Arc<DeviceProfile>),
}

#[machine]
#[derive(Debug)]
pub struct ControllerSession<S: SessionState> {
    settings: SessionSettings,
    state_tx: Arc<watch::Sender<NormalizedState>>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
}

// Available in every state
impl<S: SessionState> ControllerSession<S> {
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Receiver notified whenever the dispatcher changes the raw state
    pub fn subscribe(&self) -> watch::Receiver<NormalizedState> {
        debug!("New subscriber to controller state");
        self.state_tx.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status_tx.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.status() == SessionStatus::Closed
    }

    // Copies the state out while holding the lock as briefly as possible
    fn current_state(&self) -> NormalizedState {
        *self.state_tx.borrow()
    }
}

impl ControllerSession<Detecting> {
    pub fn create(settings: Option<SessionSettings>) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating controller session with settings: {:?}", settings);

        let (state_tx, _) = watch::channel(NormalizedState::default());
        let (status_tx, _) = watch::channel(SessionStatus::Running);

        Self::new(settings, Arc::new(state_tx), Arc::new(status_tx))
    }

    /// Resolves the controller family from the descriptor's name
    pub fn detect(&self, descriptor: &DeviceDescriptor) -> Result<ControllerFamily, SessionError> {
        match self.settings.detection.detect(&descriptor.name) {
            Some(family) => {
                info!("Detected {} controller: {}", family, descriptor);
                Ok(family)
            }
            None => {
                warn!("Unsupported controller: {}", descriptor);
                Err(SessionError::UnknownDevice(descriptor.name.clone()))
            }
        }
    }

    /// Detects the family, opens the device and starts dispatching
    pub fn open<B: DeviceBackend + ?Sized>(
        self,
        backend: &B,
        descriptor: &DeviceDescriptor,
    ) -> Result<ControllerSession<Ready>, SessionError> {
        let family = self.detect(descriptor)?;
        let source = backend.open(descriptor)?;
        self.attach(family, source)
    }

    /// Starts dispatching events from an already opened source
    pub fn attach<E: EventSource + 'static>(
        self,
        family: ControllerFamily,
        source: E,
    ) -> Result<ControllerSession<Ready>, SessionError> {
        let profile = Arc::new(self.settings.profile_for(family));
        debug!(
            "Bound {} profile: joystick {:?}, trigger {:?}",
            family,
            profile.joystick_scaling(),
            profile.trigger_scaling()
        );

        let worker = DispatchWorker {
            source: Box::new(source),
            profile: Arc::clone(&profile),
            state_tx: Arc::clone(&self.state_tx),
            status_tx: Arc::clone(&self.status_tx),
            stats_interval: chrono::Duration::seconds(self.settings.stats_interval_secs as i64),
        };

        let thread_name = format!("padnorm-{:?}", family).to_lowercase();
        std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || worker.run())
            .map_err(SessionError::Spawn)?;
        info!("Dispatch thread {} started", thread_name);

        Ok(self.transition_with(profile))
    }
}

impl ControllerSession<Ready> {
    fn bound_profile(&self) -> Result<&Arc<DeviceProfile>, SessionError> {
        self.get_state_data().ok_or(SessionError::NotBound)
    }

    pub fn profile(&self) -> Result<&DeviceProfile, SessionError> {
        self.bound_profile().map(|profile| profile.as_ref())
    }

    pub fn family(&self) -> Result<ControllerFamily, SessionError> {
        self.profile().map(DeviceProfile::family)
    }

    /// Fully scaled copy of the current state.
    ///
    /// Returns [`SessionError::SessionClosed`] once the event source has ended; use
    /// [`close`](Self::close) and [`ControllerSession::last_snapshot`] to read the
    /// final state.
    pub fn read(&self) -> Result<Snapshot, SessionError> {
        if self.is_closed() {
            return Err(SessionError::SessionClosed);
        }
        let profile = self.bound_profile()?;
        let state = self.current_state();
        Ok(Snapshot::scale(&state, profile))
    }

    /// Unscaled copy of the current state, same closed semantics as [`read`](Self::read)
    pub fn read_raw(&self) -> Result<NormalizedState, SessionError> {
        if self.is_closed() {
            return Err(SessionError::SessionClosed);
        }
        Ok(self.current_state())
    }

    /// Resolves once the source is exhausted or the session is closed
    pub async fn wait_closed(&self) {
        let mut status = self.status_tx.subscribe();
        if let Err(e) = status.wait_for(|s| *s == SessionStatus::Closed).await {
            // The sender lives as long as the session, so this only happens on teardown
            warn!("Status channel dropped while waiting for close: {}", e);
        };
    }

    /// Stops dispatching and keeps the final state readable
    pub fn close(self) -> Result<ControllerSession<Closed>, SessionError> {
        let profile = Arc::clone(self.bound_profile()?);
        self.status_tx.send_replace(SessionStatus::Closed);
        info!("Closed {} controller session", profile.family());
        Ok(self.transition_with(profile))
    }
}

impl ControllerSession<Closed> {
    pub fn last_state(&self) -> NormalizedState {
        self.current_state()
    }

    /// Scaled copy of the state as it was when the session ended
    pub fn last_snapshot(&self) -> Result<Snapshot, SessionError> {
        let profile = self.get_state_data().ok_or(SessionError::NotBound)?;
        Ok(Snapshot::scale(&self.current_state(), profile))
    }
}

/// Returns the first device the backend reports
pub fn first_gamepad<B: DeviceBackend + ?Sized>(backend: &B) -> Result<DeviceDescriptor, SessionError> {
    let devices = backend.enumerate()?;
    info!("Found {} candidate devices", devices.len());
    devices.into_iter().next().ok_or(SessionError::NoDeviceFound)
}

/// Creates a session for `descriptor` and starts it
pub fn detect_and_open<B: DeviceBackend + ?Sized>(
    backend: &B,
    descriptor: &DeviceDescriptor,
    settings: Option<SessionSettings>,
) -> Result<ControllerSession<Ready>, SessionError> {
    ControllerSession::create(settings).open(backend, descriptor)
}

// Owns the source on the dispatch thread
struct DispatchWorker {
    source: Box<dyn EventSource>,
    profile: Arc<DeviceProfile>,
    state_tx: Arc<watch::Sender<NormalizedState>>,
    status_tx: Arc<watch::Sender<SessionStatus>>,
    stats_interval: chrono::Duration,
}

impl DispatchWorker {
    fn closed(&self) -> bool {
        *self.status_tx.borrow() == SessionStatus::Closed
    }

    fn run(mut self) {
        info!("Starting dispatch loop for {}", self.profile.family());

        let mut handled: u64 = 0;
        let mut changed: u64 = 0;
        let mut last_log_time = Local::now();

        while !self.closed() {
            let event = match self.source.next_event() {
                Ok(Some(event)) => event,
                Ok(None) => {
                    info!("Event source exhausted after {} events", handled);
                    break;
                }
                Err(e) => {
                    error!("Event source failed: {}", e);
                    break;
                }
            };

            // close() may have happened while blocked on the source
            if self.closed() {
                debug!("Dropping event received after close: {}", event);
                break;
            }

            handled += 1;
            let profile = &self.profile;
            if self
                .state_tx
                .send_if_modified(|state| dispatch(&event, profile, state))
            {
                changed += 1;
            }

            let now = Local::now();
            if now - last_log_time > self.stats_interval {
                debug!(
                    "Dispatch stats: {} events, {} state changes in last {} seconds",
                    handled,
                    changed,
                    self.stats_interval.num_seconds()
                );
                handled = 0;
                changed = 0;
                last_log_time = now;
            }
        }

        self.status_tx.send_replace(SessionStatus::Closed);
        info!("Dispatch loop for {} finished", self.profile.family());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_rules_extend_builtin_patterns() {
        let rules = DetectionRules {
            xbox_one: vec!["Xbox Wireless".to_string()],
            ps3: vec![String::new()],
        };
        assert_eq!(rules.detect("Microsoft X-Box One pad"), Some(ControllerFamily::XboxOne));
        assert_eq!(rules.detect("Xbox Wireless Controller"), Some(ControllerFamily::XboxOne));
        assert_eq!(rules.detect("Sony PLAYSTATION(R)3 Controller"), Some(ControllerFamily::Ps3));
        // an empty pattern must not match everything
        assert_eq!(rules.detect("8BitDo Pro 2"), None);
    }

    #[test]
    fn detect_reports_unknown_devices() {
        let session = ControllerSession::create(None);
        assert_eq!(
            session.detect(&DeviceDescriptor::named("Microsoft X-Box One pad")).unwrap(),
            ControllerFamily::XboxOne
        );
        assert_eq!(
            session.detect(&DeviceDescriptor::named("Sony PLAYSTATION(R)3 Controller")).unwrap(),
            ControllerFamily::Ps3
        );
        assert!(matches!(
            session.detect(&DeviceDescriptor::named("Generic USB Joystick")),
            Err(SessionError::UnknownDevice(name)) if name == "Generic USB Joystick"
        ));
    }

    #[test]
    fn settings_apply_family_overrides() {
        let mut settings = SessionSettings::default();
        settings.ps3.trigger = Some(crate::controller::scaling::ScalingConstants::new(0, 1023, 0, 0.0, 1.0));

        assert_eq!(settings.profile_for(ControllerFamily::Ps3).trigger_scaling().raw_max, 1023);
        assert_eq!(settings.profile_for(ControllerFamily::XboxOne).trigger_scaling().raw_max, 255);
        assert!(settings.validate().is_ok());

        settings.xbox_one.joystick = Some(crate::controller::scaling::ScalingConstants::new(0, 0, 0, 0.0, 1.0));
        assert!(settings.validate().is_err());
    }
}
