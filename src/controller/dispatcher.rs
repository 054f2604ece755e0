//! Routing of raw events onto [`NormalizedState`] fields
//!
//! Runs at hardware event rate, so it stays allocation-free and only stores raw
//! values. Scaling happens when a reader takes a [`Snapshot`](super::state::Snapshot).
//!
//! Each event goes through two passes that are not mutually exclusive:
//!
//! - **axis pass** (`EventClass::Axis`): stick and trigger values are stored raw,
//!   D-pad hat axes are sign-decoded, bumper-as-axis codes become `value > 0`
//! - **button pass** (`EventClass::Button`): one code, one boolean
//!
//! On the Xbox One profile the trigger axes also drive the stage-2 bumpers, so one
//! axis event can update two fields.

use tracing::trace;

use super::event::{EventClass, RawEvent};
use super::profile::{Control, DeviceProfile};
use super::state::NormalizedState;

/// Applies one event to `state`. Returns whether any field changed.
///
/// Codes the profile does not know are ignored without error; hardware reports
/// controls outside this model (guide button, motion axes, sync markers).
pub fn dispatch(event: &RawEvent, profile: &DeviceProfile, state: &mut NormalizedState) -> bool {
    let before = *state;
    let mut matched = false;

    for control in profile.controls_for(event.class, &event.code) {
        matched = true;
        match event.class {
            EventClass::Axis => apply_axis(control, event.value, state),
            EventClass::Button => apply_button(control, event.value, state),
        }
    }

    if !matched {
        trace!("Ignoring unmapped {} code {}", event.class, event.code);
    }

    *state != before
}

fn apply_axis(control: Control, value: i32, state: &mut NormalizedState) {
    match control {
        Control::LeftStickX => state.left_stick.x = value,
        Control::LeftStickY => state.left_stick.y = value,
        Control::RightStickX => state.right_stick.x = value,
        Control::RightStickY => state.right_stick.y = value,
        Control::LeftTrigger => state.left_trigger.value = value,
        Control::RightTrigger => state.right_trigger.value = value,
        Control::DPadX => decode_hat(value, &mut state.dpad.left, &mut state.dpad.right),
        Control::DPadY => decode_hat(value, &mut state.dpad.up, &mut state.dpad.down),
        Control::LeftBumper2 => state.left_trigger.bumper_2 = value > 0,
        Control::RightBumper2 => state.right_trigger.bumper_2 = value > 0,
        other => trace!("{:?} is not an axis control, dropping axis event", other),
    }
}

fn apply_button(control: Control, value: i32, state: &mut NormalizedState) {
    let pressed = value != 0;
    let field = match control {
        Control::South => &mut state.buttons.south,
        Control::East => &mut state.buttons.east,
        Control::West => &mut state.buttons.west,
        Control::North => &mut state.buttons.north,
        Control::Start => &mut state.buttons.start,
        Control::Select => &mut state.buttons.select,
        Control::LeftStickPush => &mut state.left_stick.pushed,
        Control::RightStickPush => &mut state.right_stick.pushed,
        Control::LeftBumper1 => &mut state.left_trigger.bumper_1,
        Control::RightBumper1 => &mut state.right_trigger.bumper_1,
        Control::LeftBumper2 => &mut state.left_trigger.bumper_2,
        Control::RightBumper2 => &mut state.right_trigger.bumper_2,
        Control::DPadLeft => &mut state.dpad.left,
        Control::DPadRight => &mut state.dpad.right,
        Control::DPadUp => &mut state.dpad.up,
        Control::DPadDown => &mut state.dpad.down,
        other => {
            trace!("{:?} is not a button control, dropping button event", other);
            return;
        }
    };
    *field = pressed;
}

// A hat axis reports one direction per sign; zero releases both.
// The opposite direction is left as is when one side is pressed.
fn decode_hat(value: i32, negative: &mut bool, positive: &mut bool) {
    match value {
        v if v < 0 => *negative = true,
        v if v > 0 => *positive = true,
        _ => {
            *negative = false;
            *positive = false;
        }
    }
}
