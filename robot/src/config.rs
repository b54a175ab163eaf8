//! Robot configuration, read from a TOML file. Every field falls back to the
//! matching value in [`crate::constants`], so a partial file is fine.

use std::{
    fs,
    path::{Path, PathBuf},
};

use frc_command::driver_station::NUM_JOYSTICK_PORTS;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};

use crate::{
    constants,
    error::{ConfigError, InvalidSnafu, ParseSnafu, ReadSnafu},
    subsystems::coral::Setpoint,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RobotConfig {
    pub operator: OperatorConfig,
    pub drive: DriveConfig,
    pub coral: CoralConfig,
    pub algae: AlgaeConfig,
    pub auto: AutoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperatorConfig {
    pub driver_controller_port: usize,
    pub manip_controller_port: usize,
    pub drive_deadband: f64,
    pub trigger_button_threshold: f64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        use constants::operator::*;
        Self {
            driver_controller_port: DRIVER_CONTROLLER_PORT,
            manip_controller_port: MANIP_CONTROLLER_PORT,
            drive_deadband: DRIVE_DEADBAND,
            trigger_button_threshold: TRIGGER_BUTTON_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriveConfig {
    pub max_speed_meters_per_second: f64,
    pub max_angular_speed: f64,
    pub track_width: f64,
    pub wheel_base: f64,
    pub field_relative: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        use constants::drive::*;
        Self {
            max_speed_meters_per_second: MAX_SPEED_METERS_PER_SECOND,
            max_angular_speed: MAX_ANGULAR_SPEED,
            track_width: TRACK_WIDTH,
            wheel_base: WHEEL_BASE,
            field_relative: true,
        }
    }
}

/// Arm and elevator targets for one coral setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoralPosition {
    pub arm: f64,
    pub elevator: f64,
}

impl From<(f64, f64)> for CoralPosition {
    fn from((arm, elevator): (f64, f64)) -> Self {
        Self { arm, elevator }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoralSetpoints {
    pub feeder_station: CoralPosition,
    pub level1: CoralPosition,
    pub level2: CoralPosition,
    pub level3: CoralPosition,
    pub level4: CoralPosition,
}

impl Default for CoralSetpoints {
    fn default() -> Self {
        use constants::coral::*;
        Self {
            feeder_station: FEEDER_STATION.into(),
            level1: LEVEL_1.into(),
            level2: LEVEL_2.into(),
            level3: LEVEL_3.into(),
            level4: LEVEL_4.into(),
        }
    }
}

impl CoralSetpoints {
    pub fn position(&self, setpoint: Setpoint) -> CoralPosition {
        match setpoint {
            Setpoint::FeederStation => self.feeder_station,
            Setpoint::Level1 => self.level1,
            Setpoint::Level2 => self.level2,
            Setpoint::Level3 => self.level3,
            Setpoint::Level4 => self.level4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoralConfig {
    pub arm_kp: f64,
    pub elevator_kp: f64,
    pub intake_forward: f64,
    pub intake_reverse: f64,
    pub setpoints: CoralSetpoints,
}

impl Default for CoralConfig {
    fn default() -> Self {
        use constants::coral::*;
        Self {
            arm_kp: ARM_KP,
            elevator_kp: ELEVATOR_KP,
            intake_forward: INTAKE_FORWARD,
            intake_reverse: INTAKE_REVERSE,
            setpoints: CoralSetpoints::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlgaeConfig {
    pub arm_kp: f64,
    pub arm_stow: f64,
    pub arm_hold: f64,
    pub arm_down: f64,
    pub intake_forward: f64,
    pub intake_reverse: f64,
    pub intake_hold: f64,
}

impl Default for AlgaeConfig {
    fn default() -> Self {
        use constants::algae::*;
        Self {
            arm_kp: ARM_KP,
            arm_stow: ARM_STOW,
            arm_hold: ARM_HOLD,
            arm_down: ARM_DOWN,
            intake_forward: INTAKE_FORWARD,
            intake_reverse: INTAKE_REVERSE,
            intake_hold: INTAKE_HOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoConfig {
    /// Directory holding `pathplanner/autos/*.auto`.
    pub deploy_dir: PathBuf,
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            deploy_dir: PathBuf::from(constants::auto::DEPLOY_DIR),
        }
    }
}

fn is_power(value: f64) -> bool {
    (-1.0..=1.0).contains(&value)
}

impl RobotConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).context(ReadSnafu { path })?;
        let config: Self = toml::from_str(&text).context(ParseSnafu { path })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let operator = &self.operator;
        ensure!(
            operator.driver_controller_port < NUM_JOYSTICK_PORTS,
            InvalidSnafu {
                field: "operator.driver_controller_port",
                reason: format!("must be below {NUM_JOYSTICK_PORTS}"),
            }
        );
        ensure!(
            operator.manip_controller_port < NUM_JOYSTICK_PORTS,
            InvalidSnafu {
                field: "operator.manip_controller_port",
                reason: format!("must be below {NUM_JOYSTICK_PORTS}"),
            }
        );
        ensure!(
            (0.0..1.0).contains(&operator.drive_deadband),
            InvalidSnafu {
                field: "operator.drive_deadband",
                reason: "must be in [0, 1)",
            }
        );
        ensure!(
            operator.trigger_button_threshold > 0.0 && operator.trigger_button_threshold < 1.0,
            InvalidSnafu {
                field: "operator.trigger_button_threshold",
                reason: "must be in (0, 1)",
            }
        );

        let drive = &self.drive;
        ensure!(
            drive.max_speed_meters_per_second > 0.0 && drive.max_angular_speed > 0.0,
            InvalidSnafu {
                field: "drive",
                reason: "maximum speeds must be positive",
            }
        );
        ensure!(
            drive.track_width > 0.0 && drive.wheel_base > 0.0,
            InvalidSnafu {
                field: "drive",
                reason: "track width and wheel base must be positive",
            }
        );

        let coral = &self.coral;
        ensure!(
            is_power(coral.intake_forward) && is_power(coral.intake_reverse),
            InvalidSnafu {
                field: "coral",
                reason: "intake powers must be in [-1, 1]",
            }
        );

        let algae = &self.algae;
        ensure!(
            is_power(algae.intake_forward)
                && is_power(algae.intake_reverse)
                && is_power(algae.intake_hold),
            InvalidSnafu {
                field: "algae",
                reason: "intake powers must be in [-1, 1]",
            }
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_constants() {
        let config: RobotConfig = toml::from_str("").unwrap();
        assert_eq!(config, RobotConfig::default());
        assert_eq!(config.operator.manip_controller_port, 1);
        assert_eq!(config.coral.setpoints.position(Setpoint::Level4).elevator, 150.0);
        config.validate().unwrap();
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config: RobotConfig = toml::from_str(
            r#"
            [operator]
            drive_deadband = 0.1

            [coral.setpoints.level3]
            arm = 4.0
            elevator = 90.0
            "#,
        )
        .unwrap();
        assert_eq!(config.operator.drive_deadband, 0.1);
        assert_eq!(config.operator.driver_controller_port, 0);
        assert_eq!(
            config.coral.setpoints.level3,
            CoralPosition { arm: 4.0, elevator: 90.0 }
        );
        assert_eq!(config.coral.setpoints.level2, CoralPosition { arm: 2.0, elevator: 0.0 });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<RobotConfig>("[drive]\nmax_sped = 3.0").is_err());
    }

    #[test]
    fn load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robot.toml");
        fs::write(&path, "[operator]\nmanip_controller_port = 9\n").unwrap();
        let err = RobotConfig::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "operator.manip_controller_port", .. }
        ));

        fs::write(&path, "[drive]\nmax_speed_meters_per_second = 3.5\n").unwrap();
        let config = RobotConfig::load(&path).unwrap();
        assert_eq!(config.drive.max_speed_meters_per_second, 3.5);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RobotConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
