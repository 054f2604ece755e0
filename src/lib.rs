//! Normalizes Xbox One and PS3 gamepad events into one scaled state model.
//!
//! ```no_run
//! use padnorm::controller::{detect_and_open, first_gamepad};
//! use padnorm::device::replay::ReplayBackend;
//!
//! # fn main() -> Result<(), padnorm::controller::SessionError> {
//! let backend = ReplayBackend::new();
//! let descriptor = first_gamepad(&backend)?;
//! let session = detect_and_open(&backend, &descriptor, None)?;
//! println!("{}", session.read()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod device;
