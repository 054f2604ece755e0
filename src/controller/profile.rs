//! Per-family constant tables
//!
//! A [`DeviceProfile`] is the only place where vendor code strings, class tags and
//! scaling constants live. The dispatcher is family-agnostic and is driven purely by
//! the profile it is handed, so supporting a controller means adding a table here.
//!
//! The two families differ in how they report the D-pad and the stage-2 bumpers:
//!
//! ```text
//!             D-pad                      bumper 2
//! Xbox One    ABS_HAT0X / ABS_HAT0Y      ABS_Z / ABS_RZ  (shared with the trigger axis)
//! PS3         BTN_DPAD_{LEFT,RIGHT,..}   BTN_TL2 / BTN_TR2
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::event::EventClass;
use super::scaling::{ScalingConstants, ScalingError};

/// Supported controller families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerFamily {
    XboxOne,
    Ps3,
}

/// Printable names of the four face buttons, by position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceLabels {
    pub south: &'static str,
    pub east: &'static str,
    pub west: &'static str,
    pub north: &'static str,
}

impl ControllerFamily {
    pub const ALL: [ControllerFamily; 2] = [ControllerFamily::XboxOne, ControllerFamily::Ps3];

    pub fn name(&self) -> &'static str {
        match self {
            ControllerFamily::XboxOne => "Xbox One",
            ControllerFamily::Ps3 => "PS3",
        }
    }

    pub fn face_labels(&self) -> FaceLabels {
        match self {
            ControllerFamily::XboxOne => FaceLabels {
                south: "A",
                east: "B",
                west: "X",
                north: "Y",
            },
            ControllerFamily::Ps3 => FaceLabels {
                south: "Cross",
                east: "Circle",
                west: "Square",
                north: "Triangle",
            },
        }
    }

    /// Device-name substrings that identify this family out of the box
    pub fn default_patterns(&self) -> &'static [&'static str] {
        match self {
            ControllerFamily::XboxOne => &["Microsoft"],
            ControllerFamily::Ps3 => &["PLAYSTATION(R)3"],
        }
    }

    /// Detects the family from a device name using the built-in patterns
    pub fn detect(device_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| {
            family
                .default_patterns()
                .iter()
                .any(|pattern| device_name.contains(pattern))
        })
    }
}

impl fmt::Display for ControllerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical controls a raw code can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftTrigger,
    RightTrigger,
    DPadX,
    DPadY,
    DPadLeft,
    DPadRight,
    DPadUp,
    DPadDown,
    South,
    East,
    West,
    North,
    Start,
    Select,
    LeftStickPush,
    RightStickPush,
    LeftBumper1,
    RightBumper1,
    LeftBumper2,
    RightBumper2,
}

/// Binds one logical control to the class and code the hardware reports it with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlBinding {
    pub control: Control,
    pub class: EventClass,
    pub code: &'static str,
}

const fn axis(control: Control, code: &'static str) -> ControlBinding {
    ControlBinding {
        control,
        class: EventClass::Axis,
        code,
    }
}

const fn key(control: Control, code: &'static str) -> ControlBinding {
    ControlBinding {
        control,
        class: EventClass::Button,
        code,
    }
}

static XBOX_ONE_BINDINGS: &[ControlBinding] = &[
    axis(Control::LeftStickX, "ABS_X"),
    axis(Control::LeftStickY, "ABS_Y"),
    axis(Control::RightStickX, "ABS_RX"),
    axis(Control::RightStickY, "ABS_RY"),
    axis(Control::LeftTrigger, "ABS_Z"),
    axis(Control::RightTrigger, "ABS_RZ"),
    axis(Control::DPadX, "ABS_HAT0X"),
    axis(Control::DPadY, "ABS_HAT0Y"),
    // stage-2 bumpers share the trigger axes
    axis(Control::LeftBumper2, "ABS_Z"),
    axis(Control::RightBumper2, "ABS_RZ"),
    key(Control::South, "BTN_SOUTH"),
    key(Control::East, "BTN_EAST"),
    key(Control::West, "BTN_WEST"),
    key(Control::North, "BTN_NORTH"),
    key(Control::LeftBumper1, "BTN_TL"),
    key(Control::RightBumper1, "BTN_TR"),
    key(Control::LeftStickPush, "BTN_THUMBL"),
    key(Control::RightStickPush, "BTN_THUMBR"),
    key(Control::Start, "BTN_START"),
    key(Control::Select, "BTN_SELECT"),
];

static PS3_BINDINGS: &[ControlBinding] = &[
    axis(Control::LeftStickX, "ABS_X"),
    axis(Control::LeftStickY, "ABS_Y"),
    axis(Control::RightStickX, "ABS_RX"),
    axis(Control::RightStickY, "ABS_RY"),
    axis(Control::LeftTrigger, "ABS_Z"),
    axis(Control::RightTrigger, "ABS_RZ"),
    key(Control::DPadLeft, "BTN_DPAD_LEFT"),
    key(Control::DPadRight, "BTN_DPAD_RIGHT"),
    key(Control::DPadUp, "BTN_DPAD_UP"),
    key(Control::DPadDown, "BTN_DPAD_DOWN"),
    key(Control::South, "BTN_SOUTH"),
    key(Control::East, "BTN_EAST"),
    key(Control::West, "BTN_WEST"),
    key(Control::North, "BTN_NORTH"),
    key(Control::LeftBumper1, "BTN_TL"),
    key(Control::RightBumper1, "BTN_TR"),
    key(Control::LeftBumper2, "BTN_TL2"),
    key(Control::RightBumper2, "BTN_TR2"),
    key(Control::LeftStickPush, "BTN_THUMBL"),
    key(Control::RightStickPush, "BTN_THUMBR"),
    key(Control::Start, "BTN_START"),
    key(Control::Select, "BTN_SELECT"),
];

pub const JOYSTICK_SCALING: ScalingConstants = ScalingConstants::new(-32768, 32767, 1000, -100.0, 100.0);
pub const TRIGGER_SCALING: ScalingConstants = ScalingConstants::new(0, 255, 0, 0.0, 100.0);

/// Optional replacements for a profile's scaling constants
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingOverrides {
    pub joystick: Option<ScalingConstants>,
    pub trigger: Option<ScalingConstants>,
}

impl ScalingOverrides {
    pub fn validate(&self) -> Result<(), ScalingError> {
        if let Some(joystick) = &self.joystick {
            joystick.validate()?;
        }
        if let Some(trigger) = &self.trigger {
            trigger.validate()?;
        }
        Ok(())
    }
}

/// Immutable constant table for one controller family
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    family: ControllerFamily,
    axis_tag: &'static str,
    button_tag: &'static str,
    bindings: &'static [ControlBinding],
    joystick: ScalingConstants,
    trigger: ScalingConstants,
}

impl DeviceProfile {
    pub fn xbox_one() -> Self {
        Self {
            family: ControllerFamily::XboxOne,
            axis_tag: "Absolute",
            button_tag: "Key",
            bindings: XBOX_ONE_BINDINGS,
            joystick: JOYSTICK_SCALING,
            trigger: TRIGGER_SCALING,
        }
    }

    pub fn ps3() -> Self {
        Self {
            family: ControllerFamily::Ps3,
            axis_tag: "Absolute",
            button_tag: "Key",
            bindings: PS3_BINDINGS,
            joystick: JOYSTICK_SCALING,
            trigger: TRIGGER_SCALING,
        }
    }

    pub fn for_family(family: ControllerFamily) -> Self {
        match family {
            ControllerFamily::XboxOne => Self::xbox_one(),
            ControllerFamily::Ps3 => Self::ps3(),
        }
    }

    /// Copy of this profile with the given scaling constants swapped in
    pub fn with_overrides(mut self, overrides: &ScalingOverrides) -> Self {
        if let Some(joystick) = overrides.joystick {
            self.joystick = joystick;
        }
        if let Some(trigger) = overrides.trigger {
            self.trigger = trigger;
        }
        self
    }

    pub fn family(&self) -> ControllerFamily {
        self.family
    }

    /// Maps a raw event-type tag ("Absolute", "Key") to its class
    pub fn resolve_class(&self, tag: &str) -> Option<EventClass> {
        if tag == self.axis_tag {
            Some(EventClass::Axis)
        } else if tag == self.button_tag {
            Some(EventClass::Button)
        } else {
            None
        }
    }

    pub fn class_tag(&self, class: EventClass) -> &'static str {
        match class {
            EventClass::Axis => self.axis_tag,
            EventClass::Button => self.button_tag,
        }
    }

    /// Every control addressed by `code` within `class`; at most two on the modeled families
    pub fn controls_for<'a>(
        &'a self,
        class: EventClass,
        code: &'a str,
    ) -> impl Iterator<Item = Control> + 'a {
        self.bindings
            .iter()
            .filter(move |binding| binding.class == class && binding.code == code)
            .map(|binding| binding.control)
    }

    /// Code reporting `control`, or `None` if the family has no such control
    pub fn code_for(&self, control: Control) -> Option<&'static str> {
        self.binding_for(control).map(|binding| binding.code)
    }

    pub fn binding_for(&self, control: Control) -> Option<&ControlBinding> {
        self.bindings.iter().find(|binding| binding.control == control)
    }

    pub fn bindings(&self) -> &'static [ControlBinding] {
        self.bindings
    }

    pub fn joystick_scaling(&self) -> &ScalingConstants {
        &self.joystick
    }

    pub fn trigger_scaling(&self) -> &ScalingConstants {
        &self.trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn detects_families_by_name() {
        assert_eq!(
            ControllerFamily::detect("Microsoft X-Box One pad"),
            Some(ControllerFamily::XboxOne)
        );
        assert_eq!(
            ControllerFamily::detect("Sony PLAYSTATION(R)3 Controller"),
            Some(ControllerFamily::Ps3)
        );
        assert_eq!(ControllerFamily::detect("Logitech Gamepad F310"), None);
        // match is case sensitive, as reported by the kernel
        assert_eq!(ControllerFamily::detect("sony playstation(r)3"), None);
    }

    #[test]
    fn codes_are_unique_except_trigger_bumper_overlap() {
        for profile in [DeviceProfile::xbox_one(), DeviceProfile::ps3()] {
            let mut seen: HashMap<(EventClass, &str), Vec<Control>> = HashMap::new();
            for binding in profile.bindings() {
                seen.entry((binding.class, binding.code))
                    .or_default()
                    .push(binding.control);
            }
            for ((_, code), controls) in seen {
                if controls.len() > 1 {
                    assert_eq!(profile.family(), ControllerFamily::XboxOne, "{code}");
                    assert!(
                        controls == [Control::LeftTrigger, Control::LeftBumper2]
                            || controls == [Control::RightTrigger, Control::RightBumper2],
                        "{code}: {controls:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn dpad_representation_differs_by_family() {
        let xbox = DeviceProfile::xbox_one();
        assert_eq!(xbox.code_for(Control::DPadX), Some("ABS_HAT0X"));
        assert_eq!(xbox.code_for(Control::DPadLeft), None);

        let ps3 = DeviceProfile::ps3();
        assert_eq!(ps3.code_for(Control::DPadX), None);
        assert_eq!(ps3.code_for(Control::DPadUp), Some("BTN_DPAD_UP"));
        assert_eq!(
            ps3.binding_for(Control::LeftBumper2).map(|b| b.class),
            Some(EventClass::Button)
        );
    }

    #[test]
    fn controls_for_respects_class() {
        let xbox = DeviceProfile::xbox_one();
        let axis: Vec<_> = xbox.controls_for(EventClass::Axis, "ABS_Z").collect();
        assert_eq!(axis, vec![Control::LeftTrigger, Control::LeftBumper2]);
        assert_eq!(xbox.controls_for(EventClass::Button, "ABS_Z").count(), 0);
        assert_eq!(xbox.controls_for(EventClass::Axis, "BTN_SOUTH").count(), 0);
        assert_eq!(xbox.controls_for(EventClass::Axis, "ABS_MISC").count(), 0);
    }

    #[test]
    fn resolves_class_tags() {
        let profile = DeviceProfile::ps3();
        assert_eq!(profile.resolve_class("Absolute"), Some(EventClass::Axis));
        assert_eq!(profile.resolve_class("Key"), Some(EventClass::Button));
        assert_eq!(profile.resolve_class("Sync"), None);
        assert_eq!(profile.class_tag(EventClass::Axis), "Absolute");
    }

    #[test]
    fn overrides_replace_only_given_constants() {
        let trigger = ScalingConstants::new(0, 1023, 8, 0.0, 1.0);
        let profile = DeviceProfile::xbox_one().with_overrides(&ScalingOverrides {
            joystick: None,
            trigger: Some(trigger),
        });
        assert_eq!(*profile.trigger_scaling(), trigger);
        assert_eq!(*profile.joystick_scaling(), JOYSTICK_SCALING);
    }
}
