//! Linux evdev backend
//!
//! Reads `/dev/input/event*` nodes directly so the raw kernel values reach the
//! dispatcher untouched. Codes are reported by their kernel names (`ABS_X`,
//! `BTN_SOUTH`, `BTN_DPAD_UP`, ...), which is what the device profiles expect.

use std::collections::VecDeque;

use evdev::{Device, EventSummary, InputEvent, KeyCode};
use tracing::{debug, info, trace};

use super::{DeviceBackend, DeviceDescriptor, DeviceError, EventSource};
use crate::controller::event::RawEvent;

/// Enumerates and opens evdev gamepads
#[derive(Debug, Clone, Copy, Default)]
pub struct EvdevBackend;

// Anything with a south face button is treated as a gamepad
fn is_gamepad(device: &Device) -> bool {
    device
        .supported_keys()
        .is_some_and(|keys| keys.contains(KeyCode::BTN_SOUTH))
}

impl DeviceBackend for EvdevBackend {
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DeviceError> {
        let mut found = Vec::new();
        for (path, device) in evdev::enumerate() {
            if !is_gamepad(&device) {
                trace!("Skipping non-gamepad input device at {}", path.display());
                continue;
            }
            let id = device.input_id();
            let descriptor = DeviceDescriptor {
                name: device.name().unwrap_or_default().to_string(),
                path: Some(path),
                vendor_id: Some(id.vendor()),
                product_id: Some(id.product()),
            };
            debug!("Found gamepad: {}", descriptor);
            found.push(descriptor);
        }
        info!("Found {} evdev gamepads", found.len());
        Ok(found)
    }

    fn open(&self, descriptor: &DeviceDescriptor) -> Result<Box<dyn EventSource>, DeviceError> {
        let path = descriptor
            .path
            .as_ref()
            .ok_or_else(|| DeviceError::MissingPath(descriptor.name.clone()))?;
        info!("Opening evdev device {}", descriptor);
        let device = Device::open(path)?;
        Ok(Box::new(EvdevSource {
            device,
            pending: VecDeque::new(),
        }))
    }
}

/// Blocking reader over one evdev node
pub struct EvdevSource {
    device: Device,
    pending: VecDeque<RawEvent>,
}

impl EventSource for EvdevSource {
    fn next_event(&mut self) -> Result<Option<RawEvent>, DeviceError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            // Blocks until the kernel delivers a batch. A removed device
            // surfaces as an I/O error and ends the session.
            for event in self.device.fetch_events()? {
                if let Some(raw) = translate(&event) {
                    self.pending.push_back(raw);
                }
            }
        }
    }
}

/// Absolute axes and keys by kernel code name; sync, misc and the rest carry
/// no control state
fn translate(event: &InputEvent) -> Option<RawEvent> {
    match event.destructure() {
        EventSummary::AbsoluteAxis(_, code, value) => Some(RawEvent::axis(format!("{:?}", code), value)),
        EventSummary::Key(_, code, value) => Some(RawEvent::button(format!("{:?}", code), value)),
        _ => None,
    }
}
