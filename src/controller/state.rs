//! Normalized controller state and its scaled snapshot
//!
//! [`NormalizedState`] is what the dispatcher writes: raw integers for the analog
//! inputs and booleans for everything digital. It is `Copy` so readers can take it
//! out of the lock in one move. [`Snapshot`] is what applications read: the same
//! layout with the analog values run through the profile's scaling constants.

use chrono::{DateTime, Local};
use std::fmt;

use super::profile::{ControllerFamily, DeviceProfile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoystickState {
    pub x: i32,
    pub y: i32,
    pub pushed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerState {
    pub value: i32,
    pub bumper_1: bool,
    pub bumper_2: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DPadState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Face buttons by position plus Start / Select
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSet {
    pub south: bool,
    pub east: bool,
    pub west: bool,
    pub north: bool,
    pub start: bool,
    pub select: bool,
}

/// Unscaled per-session controller state, written only by the dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizedState {
    pub left_stick: JoystickState,
    pub right_stick: JoystickState,
    pub left_trigger: TriggerState,
    pub right_trigger: TriggerState,
    pub dpad: DPadState,
    pub buttons: ButtonSet,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickReading {
    pub x: f64,
    pub y: f64,
    pub pushed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerReading {
    pub value: f64,
    pub bumper_1: bool,
    pub bumper_2: bool,
}

/// Immutable, fully scaled copy of a session's state
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub family: ControllerFamily,
    pub left_stick: StickReading,
    pub right_stick: StickReading,
    pub left_trigger: TriggerReading,
    pub right_trigger: TriggerReading,
    pub dpad: DPadState,
    pub buttons: ButtonSet,
    pub taken_at: DateTime<Local>,
}

impl Snapshot {
    /// Scales `state` with the profile's joystick and trigger constants
    pub fn scale(state: &NormalizedState, profile: &DeviceProfile) -> Self {
        let joystick = profile.joystick_scaling();
        let trigger = profile.trigger_scaling();

        let stick = |s: &JoystickState| StickReading {
            x: joystick.scale(s.x),
            y: joystick.scale(s.y),
            pushed: s.pushed,
        };
        let trig = |t: &TriggerState| TriggerReading {
            value: trigger.scale(t.value),
            bumper_1: t.bumper_1,
            bumper_2: t.bumper_2,
        };

        Self {
            family: profile.family(),
            left_stick: stick(&state.left_stick),
            right_stick: stick(&state.right_stick),
            left_trigger: trig(&state.left_trigger),
            right_trigger: trig(&state.right_trigger),
            dpad: state.dpad,
            buttons: state.buttons,
            taken_at: Local::now(),
        }
    }

    /// Names of the face buttons currently held, using the family's labels
    pub fn pressed_face_buttons(&self) -> Vec<&'static str> {
        let labels = self.family.face_labels();
        [
            (self.buttons.south, labels.south),
            (self.buttons.east, labels.east),
            (self.buttons.west, labels.west),
            (self.buttons.north, labels.north),
        ]
        .into_iter()
        .filter_map(|(held, label)| held.then_some(label))
        .collect()
    }
}

fn flag(on: bool, name: &str) -> &str {
    if on {
        name
    } else {
        "-"
    }
}

impl fmt::Display for Snapshot {
    // Single-line summary for terminal output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] L:({:.2},{:.2}){} R:({:.2},{:.2}){} LT:{:.2}{}{} RT:{:.2}{}{} DPad:{}{}{}{}",
            self.family,
            self.left_stick.x,
            self.left_stick.y,
            if self.left_stick.pushed { "*" } else { "" },
            self.right_stick.x,
            self.right_stick.y,
            if self.right_stick.pushed { "*" } else { "" },
            self.left_trigger.value,
            if self.left_trigger.bumper_1 { " LB1" } else { "" },
            if self.left_trigger.bumper_2 { " LB2" } else { "" },
            self.right_trigger.value,
            if self.right_trigger.bumper_1 { " RB1" } else { "" },
            if self.right_trigger.bumper_2 { " RB2" } else { "" },
            flag(self.dpad.left, "L"),
            flag(self.dpad.right, "R"),
            flag(self.dpad.up, "U"),
            flag(self.dpad.down, "D"),
        )?;

        let face = self.pressed_face_buttons();
        if !face.is_empty() {
            write!(f, " Buttons:{}", face.join("+"))?;
        }
        if self.buttons.start {
            f.write_str(" Start")?;
        }
        if self.buttons.select {
            f.write_str(" Select")?;
        }
        Ok(())
    }
}
