//! Compile-time defaults. Everything here can be overridden from `robot.toml`.

pub mod operator {
    pub const DRIVER_CONTROLLER_PORT: usize = 0;
    pub const MANIP_CONTROLLER_PORT: usize = 1;
    pub const DRIVE_DEADBAND: f64 = 0.05;
    pub const TRIGGER_BUTTON_THRESHOLD: f64 = 0.2;
}

pub mod drive {
    use std::f64::consts::PI;

    pub const MAX_SPEED_METERS_PER_SECOND: f64 = 4.8;
    /// Radians per second.
    pub const MAX_ANGULAR_SPEED: f64 = 2.0 * PI;

    // 26.5 in between module centers in both directions.
    pub const TRACK_WIDTH: f64 = 0.6731;
    pub const WHEEL_BASE: f64 = 0.6731;
}

pub mod coral {
    pub const ARM_KP: f64 = 0.1;
    pub const ELEVATOR_KP: f64 = 0.1;

    pub const INTAKE_FORWARD: f64 = 0.5;
    pub const INTAKE_REVERSE: f64 = -0.5;

    /// (arm, elevator) targets in motor rotations.
    pub const FEEDER_STATION: (f64, f64) = (33.0, 0.0);
    pub const LEVEL_1: (f64, f64) = (0.0, 0.0);
    pub const LEVEL_2: (f64, f64) = (2.0, 0.0);
    pub const LEVEL_3: (f64, f64) = (2.0, 100.0);
    pub const LEVEL_4: (f64, f64) = (19.0, 150.0);

    pub const ARM_LIMITS: (f64, f64) = (-2.0, 40.0);
    pub const ELEVATOR_LIMITS: (f64, f64) = (0.0, 160.0);
}

pub mod algae {
    pub const ARM_KP: f64 = 0.1;

    pub const ARM_STOW: f64 = 18.5;
    pub const ARM_HOLD: f64 = 11.5;
    pub const ARM_DOWN: f64 = 0.0;

    pub const INTAKE_FORWARD: f64 = 0.5;
    pub const INTAKE_REVERSE: f64 = -0.5;
    pub const INTAKE_HOLD: f64 = 0.25;

    pub const ARM_LIMITS: (f64, f64) = (-1.0, 25.0);
}

pub mod auto {
    pub const DEPLOY_DIR: &str = "deploy";
}

pub mod sim {
    pub const NOMINAL_VOLTAGE: f64 = 12.0;
    /// Seconds for a mechanism to reach ~63% of a commanded speed change.
    pub const MECHANISM_TIME_CONSTANT: f64 = 0.08;
}
