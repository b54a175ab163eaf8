//! Robot mode and operator joystick state as reported by the driver station.

use std::cell::{Cell, RefCell};

pub const NUM_JOYSTICK_PORTS: usize = 6;
pub const MAX_AXES: usize = 12;
pub const MAX_BUTTONS: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotMode {
    #[default]
    Disabled,
    Autonomous,
    Teleop,
    Test,
}

#[derive(Debug, Clone, Copy, Default)]
struct JoystickState {
    /// Bit `n - 1` holds button `n`.
    buttons: u32,
    axes: [f64; MAX_AXES],
}

#[derive(Default)]
struct DriverStationState {
    mode: Cell<RobotMode>,
    joysticks: RefCell<[JoystickState; NUM_JOYSTICK_PORTS]>,
}

thread_local! {
    static STATE: DriverStationState = DriverStationState::default();
}

pub fn mode() -> RobotMode {
    STATE.with(|state| state.mode.get())
}

pub fn is_disabled() -> bool {
    mode() == RobotMode::Disabled
}

pub fn is_enabled() -> bool {
    !is_disabled()
}

pub fn is_autonomous() -> bool {
    mode() == RobotMode::Autonomous
}

pub fn is_teleop() -> bool {
    mode() == RobotMode::Teleop
}

/// Whether a 1-indexed button is held. Unknown ports and buttons read as released.
pub fn joystick_button(port: usize, button: u8) -> bool {
    if button == 0 || button > MAX_BUTTONS {
        return false;
    }
    STATE.with(|state| {
        state
            .joysticks
            .borrow()
            .get(port)
            .is_some_and(|js| js.buttons & (1 << (button - 1)) != 0)
    })
}

/// The value of an axis in `[-1, 1]`. Unknown ports and axes read as zero.
pub fn joystick_axis(port: usize, axis: usize) -> f64 {
    STATE.with(|state| {
        state
            .joysticks
            .borrow()
            .get(port)
            .and_then(|js| js.axes.get(axis).copied())
            .unwrap_or(0.0)
    })
}

/// Driver station inputs for simulation and tests.
pub mod sim {
    use super::*;

    pub fn set_mode(mode: RobotMode) {
        STATE.with(|state| state.mode.set(mode));
    }

    pub fn set_button(port: usize, button: u8, pressed: bool) {
        if button == 0 || button > MAX_BUTTONS {
            log::warn!("ignoring button {button} on joystick {port}");
            return;
        }
        STATE.with(|state| {
            if let Some(js) = state.joysticks.borrow_mut().get_mut(port) {
                let mask = 1 << (button - 1);
                if pressed {
                    js.buttons |= mask;
                } else {
                    js.buttons &= !mask;
                }
            }
        });
    }

    pub fn set_axis(port: usize, axis: usize, value: f64) {
        STATE.with(|state| {
            if let Some(slot) = state
                .joysticks
                .borrow_mut()
                .get_mut(port)
                .and_then(|js| js.axes.get_mut(axis))
            {
                *slot = value.clamp(-1.0, 1.0);
            }
        });
    }

    /// Releases every button and centers every axis.
    pub fn reset_joysticks() {
        STATE.with(|state| {
            *state.joysticks.borrow_mut() = Default::default();
        });
    }
}
