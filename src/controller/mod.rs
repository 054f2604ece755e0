//! Controller subsystem for gamepad event normalization
//!
//! Turns the raw event stream of a supported gamepad into one device-independent
//! state model:
//!
//! 1. [`profile`] - per-family constant tables (codes, class tags, scaling)
//! 2. [`dispatcher`] - routes each raw event onto [`state::NormalizedState`]
//! 3. [`scaling`] - deadband-compensated rescaling applied at read time
//! 4. [`session`] - typestate lifecycle, dispatch thread and reader API
//!
//! # Architecture
//!
//! ```text
//! EventSource ──► Dispatcher ──► NormalizedState ──► Snapshot
//!  (raw events)   (profile)       (raw, shared)      (scaled copy)
//! ```
//!
//! Xbox One and PS3 differ only in their [`profile::DeviceProfile`]; the
//! dispatcher and the session never branch on the family.

pub mod dispatcher;
pub mod event;
pub mod profile;
pub mod scaling;
pub mod session;
pub mod state;

pub use event::{EventClass, RawEvent};
pub use profile::{ControllerFamily, DeviceProfile, ScalingOverrides};
pub use scaling::{ScalingConstants, ScalingError};
pub use session::{
    detect_and_open, first_gamepad, ControllerSession, SessionError, SessionSettings, SessionStatus,
};
pub use state::{NormalizedState, Snapshot};
