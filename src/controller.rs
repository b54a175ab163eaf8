//! Command-based wrappers over driver-station gamepads.

use std::fmt;

use crate::{command::button::Trigger, driver_station, event::BooleanEvent, CommandScheduler};

/// Button indices of an Xbox controller, as reported by the driver station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum XboxButton {
    A = 1,
    B = 2,
    X = 3,
    Y = 4,
    LeftBumper = 5,
    RightBumper = 6,
    Back = 7,
    Start = 8,
    LeftStick = 9,
    RightStick = 10,
}

/// Axis indices of an Xbox controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum XboxAxis {
    LeftX = 0,
    LeftY = 1,
    LeftTrigger = 2,
    RightTrigger = 3,
    RightX = 4,
    RightY = 5,
}

/// An Xbox controller plugged into a driver-station port.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CommandXboxController {
    port: usize,
}

impl fmt::Debug for CommandXboxController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandXboxController({})", self.port)
    }
}

impl CommandXboxController {
    pub fn new(port: usize) -> Self {
        if port >= driver_station::NUM_JOYSTICK_PORTS {
            log::warn!("controller port {port} is out of range; it will never report input");
        }
        Self { port }
    }

    pub fn port(&self) -> usize {
        self.port
    }

    pub fn button(&self, button: XboxButton) -> Trigger {
        let port = self.port;
        Trigger::new(move || driver_station::joystick_button(port, button as u8))
    }

    pub fn axis(&self, axis: XboxAxis) -> f64 {
        driver_station::joystick_axis(self.port, axis as usize)
    }

    /// True while `axis` reads above `threshold`, sampled once per scheduler run.
    pub fn axis_greater_than(&self, axis: XboxAxis, threshold: f64) -> Trigger {
        let port = self.port;
        BooleanEvent::new(CommandScheduler::button_event_loop(), move || {
            driver_station::joystick_axis(port, axis as usize) > threshold
        })
        .into()
    }

    pub fn a(&self) -> Trigger {
        self.button(XboxButton::A)
    }

    pub fn b(&self) -> Trigger {
        self.button(XboxButton::B)
    }

    pub fn x(&self) -> Trigger {
        self.button(XboxButton::X)
    }

    pub fn y(&self) -> Trigger {
        self.button(XboxButton::Y)
    }

    pub fn left_bumper(&self) -> Trigger {
        self.button(XboxButton::LeftBumper)
    }

    pub fn right_bumper(&self) -> Trigger {
        self.button(XboxButton::RightBumper)
    }

    pub fn back(&self) -> Trigger {
        self.button(XboxButton::Back)
    }

    pub fn start(&self) -> Trigger {
        self.button(XboxButton::Start)
    }

    pub fn left_stick(&self) -> Trigger {
        self.button(XboxButton::LeftStick)
    }

    pub fn right_stick(&self) -> Trigger {
        self.button(XboxButton::RightStick)
    }

    pub fn left_trigger(&self, threshold: f64) -> Trigger {
        self.axis_greater_than(XboxAxis::LeftTrigger, threshold)
    }

    pub fn right_trigger(&self, threshold: f64) -> Trigger {
        self.axis_greater_than(XboxAxis::RightTrigger, threshold)
    }

    pub fn left_x(&self) -> f64 {
        self.axis(XboxAxis::LeftX)
    }

    pub fn left_y(&self) -> f64 {
        self.axis(XboxAxis::LeftY)
    }

    pub fn right_x(&self) -> f64 {
        self.axis(XboxAxis::RightX)
    }

    pub fn right_y(&self) -> f64 {
        self.axis(XboxAxis::RightY)
    }
}
