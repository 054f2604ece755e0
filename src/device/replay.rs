//! In-memory and recorded event sources
//!
//! Trace format: one event per line, `<tag> <code> <value>`, where the tag is the
//! profile's class tag (`Absolute` or `Key`). Blank lines and `#` comments are
//! skipped.
//!
//! ```text
//! # left stick pushed right, then A pressed
//! Absolute ABS_X 23185
//! Key BTN_SOUTH 1
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{DeviceBackend, DeviceDescriptor, DeviceError, EventSource};
use crate::controller::event::RawEvent;
use crate::controller::profile::DeviceProfile;

/// A trace line that does not describe an event. [`ReplaySource::parse`] logs and skips these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed event on line {line}: {reason}")]
pub struct MalformedEvent {
    pub line: usize,
    pub reason: String,
}

/// Parses one trace line; `Ok(None)` for blank lines and comments
pub fn parse_trace_line(
    line_number: usize,
    line: &str,
    profile: &DeviceProfile,
) -> Result<Option<RawEvent>, MalformedEvent> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let malformed = |reason: String| MalformedEvent {
        line: line_number,
        reason,
    };

    let mut fields = line.split_whitespace();
    let (Some(tag), Some(code), Some(value), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed(format!("expected `<tag> <code> <value>`, got `{line}`")));
    };

    let class = profile
        .resolve_class(tag)
        .ok_or_else(|| malformed(format!("unknown event tag `{tag}`")))?;
    let value = value
        .parse::<i32>()
        .map_err(|e| malformed(format!("bad value `{value}`: {e}")))?;

    Ok(Some(RawEvent::new(class, code, value)))
}

/// Replays a fixed list of events, then reports exhaustion
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    events: VecDeque<RawEvent>,
    pacing: Option<Duration>,
}

impl ReplaySource {
    pub fn new(events: impl IntoIterator<Item = RawEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            pacing: None,
        }
    }

    /// Parses trace text, dropping malformed lines
    pub fn parse(text: &str, profile: &DeviceProfile) -> Self {
        let mut skipped = 0;
        let events: Vec<RawEvent> = text
            .lines()
            .enumerate()
            .filter_map(|(index, line)| match parse_trace_line(index + 1, line, profile) {
                Ok(event) => event,
                Err(e) => {
                    debug!("Dropping trace line: {}", e);
                    skipped += 1;
                    None
                }
            })
            .collect();

        if skipped > 0 {
            debug!("Skipped {} malformed trace lines", skipped);
        }
        Self::new(events)
    }

    pub fn from_file(path: impl AsRef<Path>, profile: &DeviceProfile) -> Result<Self, DeviceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let source = Self::parse(&text, profile);
        info!("Loaded {} events from trace {}", source.len(), path.display());
        Ok(source)
    }

    /// Sleeps for `delay` before handing out each event
    pub fn with_pacing(mut self, delay: Duration) -> Self {
        self.pacing = Some(delay);
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for ReplaySource {
    fn next_event(&mut self) -> Result<Option<RawEvent>, DeviceError> {
        if let (Some(delay), false) = (self.pacing, self.events.is_empty()) {
            std::thread::sleep(delay);
        }
        Ok(self.events.pop_front())
    }
}

/// Live source fed from a channel; exhausted once every sender is dropped
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::UnboundedReceiver<RawEvent>,
}

impl ChannelSource {
    pub fn channel() -> (mpsc::UnboundedSender<RawEvent>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }
}

impl EventSource for ChannelSource {
    // Must run outside an async context, like every blocking source
    fn next_event(&mut self) -> Result<Option<RawEvent>, DeviceError> {
        Ok(self.receiver.blocking_recv())
    }
}

/// Backend over a fixed set of named recordings
#[derive(Debug, Clone, Default)]
pub struct ReplayBackend {
    devices: Vec<(DeviceDescriptor, Vec<RawEvent>)>,
}

impl ReplayBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, descriptor: DeviceDescriptor, events: Vec<RawEvent>) -> Self {
        self.devices.push((descriptor, events));
        self
    }
}

impl DeviceBackend for ReplayBackend {
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DeviceError> {
        Ok(self.devices.iter().map(|(d, _)| d.clone()).collect())
    }

    fn open(&self, descriptor: &DeviceDescriptor) -> Result<Box<dyn EventSource>, DeviceError> {
        self.devices
            .iter()
            .find(|(d, _)| d == descriptor)
            .map(|(_, events)| Box::new(ReplaySource::new(events.clone())) as Box<dyn EventSource>)
            .ok_or_else(|| DeviceError::Unsupported(descriptor.name.clone()))
    }
}
