use std::fmt;

/// Class of a raw hardware event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    Axis,
    Button,
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventClass::Axis => f.write_str("axis"),
            EventClass::Button => f.write_str("button"),
        }
    }
}

// One hardware report as delivered by an event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub class: EventClass,
    pub code: String,
    pub value: i32,
}

impl RawEvent {
    pub fn new(class: EventClass, code: impl Into<String>, value: i32) -> Self {
        Self {
            class,
            code: code.into(),
            value,
        }
    }

    pub fn axis(code: impl Into<String>, value: i32) -> Self {
        Self::new(EventClass::Axis, code, value)
    }

    pub fn button(code: impl Into<String>, value: i32) -> Self {
        Self::new(EventClass::Button, code, value)
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.class, self.code, self.value)
    }
}
