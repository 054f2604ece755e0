//! Device I/O boundary
//!
//! The controller core never touches hardware. It consumes a [`DeviceBackend`] that
//! can list candidate devices and open one of them as a blocking [`EventSource`].
//!
//! - [`replay`] - scripted events, recorded traces and channel-fed sources
//! - `evdev` - Linux input devices (feature `evdev`)

pub mod replay;

#[cfg(all(target_os = "linux", feature = "evdev"))]
pub mod evdev;

use std::fmt;
use std::path::PathBuf;

use crate::controller::event::RawEvent;

/// Identity of an input device as reported by its backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub name: String,
    pub path: Option<PathBuf>,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

impl DeviceDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let (Some(vendor), Some(product)) = (self.vendor_id, self.product_id) {
            write!(f, " [{:04x}:{:04x}]", vendor, product)?;
        }
        if let Some(path) = &self.path {
            write!(f, " at {}", path.display())?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device has no path to open: {0}")]
    MissingPath(String),

    #[error("Device is not supported by this backend: {0}")]
    Unsupported(String),
}

/// Blocking stream of raw events from one opened device
pub trait EventSource: Send {
    /// Blocks until the next event. `Ok(None)` means the source is exhausted
    /// (device unplugged, end of a recording) and will not produce more events.
    fn next_event(&mut self) -> Result<Option<RawEvent>, DeviceError>;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_event(&mut self) -> Result<Option<RawEvent>, DeviceError> {
        (**self).next_event()
    }
}

/// Lists and opens devices
pub trait DeviceBackend {
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DeviceError>;

    fn open(&self, descriptor: &DeviceDescriptor) -> Result<Box<dyn EventSource>, DeviceError>;
}
