use std::{cell::RefCell, rc::Rc};

use frc_command::{
    command::{CommandExt, FunctionalCommand, WrapperCommand},
    dashboard,
    robot::ITERATION_PERIOD,
    subsystem::{Subsystem, SubsystemRefExt},
};

use super::kinematics::{
    ChassisSpeeds, Pose2d, Rotation2d, SwerveDriveKinematics, SwerveModuleState, Translation2d,
};
use crate::config::DriveConfig;

const MODULE_NAMES: [&str; 4] = ["Front Left", "Front Right", "Rear Left", "Rear Right"];

/// Four-module swerve drive with a simulated gyro. Module states are
/// assumed to be achieved instantly.
#[derive(Debug)]
pub struct DriveSubsystem {
    config: DriveConfig,
    kinematics: SwerveDriveKinematics,
    desired_states: [SwerveModuleState; 4],
    /// Raw gyro yaw, counter-clockwise positive.
    gyro_yaw: Rotation2d,
    pose: Pose2d,
}

impl DriveSubsystem {
    pub fn new(config: DriveConfig) -> Self {
        Self {
            kinematics: SwerveDriveKinematics::new(config.wheel_base, config.track_width),
            desired_states: Default::default(),
            gyro_yaw: Rotation2d::default(),
            pose: Pose2d::default(),
            config,
        }
    }

    /// Drives the robot. Inputs are fractions of the configured maximum
    /// speeds: `x_speed` forward, `y_speed` left, `rot` counter-clockwise.
    pub fn drive(&mut self, x_speed: f64, y_speed: f64, rot: f64, field_relative: bool) {
        let vx = x_speed * self.config.max_speed_meters_per_second;
        let vy = y_speed * self.config.max_speed_meters_per_second;
        let omega = rot * self.config.max_angular_speed;

        let speeds = if field_relative {
            ChassisSpeeds::from_field_relative(vx, vy, omega, self.heading())
        } else {
            ChassisSpeeds::new(vx, vy, omega)
        };
        let mut states = self.kinematics.to_module_states(speeds, &self.desired_states);
        SwerveDriveKinematics::desaturate_wheel_speeds(
            &mut states,
            self.config.max_speed_meters_per_second,
        );
        self.desired_states = states;
    }

    /// Points the wheels into an X so the robot resists being pushed.
    pub fn set_x(&mut self) {
        self.desired_states = [45.0, -45.0, -45.0, 45.0]
            .map(|degrees| SwerveModuleState::new(0.0, Rotation2d::from_degrees(degrees)));
    }

    pub fn zero_gyro(&mut self) {
        self.gyro_yaw = Rotation2d::default();
    }

    /// Makes the current facing the field-relative forward direction.
    pub fn zero_heading(&mut self) {
        self.zero_gyro();
        self.pose.rotation = Rotation2d::default();
    }

    pub fn heading(&self) -> Rotation2d {
        self.gyro_yaw
    }

    pub fn pose(&self) -> Pose2d {
        self.pose
    }

    pub fn module_states(&self) -> &[SwerveModuleState; 4] {
        &self.desired_states
    }

    pub fn set_x_command(this: &Rc<RefCell<Self>>) -> WrapperCommand<FunctionalCommand> {
        this.run(Self::set_x).with_name("Set X")
    }

    pub fn zero_heading_command(this: &Rc<RefCell<Self>>) -> WrapperCommand<FunctionalCommand> {
        this.run_once(Self::zero_heading).with_name("Zero Heading")
    }
}

impl Subsystem for DriveSubsystem {
    fn periodic(&mut self) {
        let dt = ITERATION_PERIOD.as_secs_f64();
        let speeds = self.kinematics.to_chassis_speeds(&self.desired_states);
        let field = self.gyro_yaw.rotate(&Translation2d::new(speeds.vx, speeds.vy));
        self.pose.translation += field * dt;
        self.pose.rotation = self.gyro_yaw;

        dashboard::put_number("Drive/Pose X", self.pose.translation.x);
        dashboard::put_number("Drive/Pose Y", self.pose.translation.y);
        dashboard::put_number("Drive/Heading", self.gyro_yaw.degrees());
        for (name, state) in MODULE_NAMES.iter().zip(&self.desired_states) {
            dashboard::put_number(format!("Drive/{name}/Speed"), state.speed);
            dashboard::put_number(format!("Drive/{name}/Angle"), state.angle.degrees());
        }
    }

    fn sim_periodic(&mut self) {
        let dt = ITERATION_PERIOD.as_secs_f64();
        let omega = self.kinematics.to_chassis_speeds(&self.desired_states).omega;
        self.gyro_yaw = Rotation2d::from_radians(self.gyro_yaw.radians() + omega * dt);
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn full_stick_reaches_max_speed() {
        let mut drive = DriveSubsystem::new(DriveConfig::default());
        drive.drive(1.0, 0.0, 0.0, false);
        for state in drive.module_states() {
            assert!((state.speed - 4.8).abs() < EPSILON);
        }
    }

    #[test]
    fn combined_input_is_desaturated() {
        let mut drive = DriveSubsystem::new(DriveConfig::default());
        drive.drive(1.0, 1.0, 1.0, false);
        let fastest = drive
            .module_states()
            .iter()
            .map(|s| s.speed)
            .fold(0.0, f64::max);
        assert!((fastest - 4.8).abs() < EPSILON);
    }

    #[test]
    fn set_x_forms_an_x() {
        let mut drive = DriveSubsystem::new(DriveConfig::default());
        drive.set_x();
        let degrees = drive.module_states().map(|s| s.angle.degrees());
        for (actual, expected) in degrees.iter().zip([45.0, -45.0, -45.0, 45.0]) {
            assert!((actual - expected).abs() < EPSILON);
        }
        assert!(drive.module_states().iter().all(|s| s.speed == 0.0));
    }

    #[test]
    fn field_relative_uses_gyro() {
        let mut drive = DriveSubsystem::new(DriveConfig::default());
        drive.gyro_yaw = Rotation2d::from_radians(FRAC_PI_2);
        drive.drive(0.5, 0.0, 0.0, true);
        // Field forward is robot right when facing left.
        let angle = drive.module_states()[0].angle.radians();
        assert!((angle + FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn rotation_integrates_gyro_and_zeroes() {
        let mut drive = DriveSubsystem::new(DriveConfig::default());
        drive.drive(0.0, 0.0, 0.25, false);
        for _ in 0..25 {
            drive.sim_periodic();
            drive.periodic();
        }
        // 0.25 * 2pi rad/s for half a second.
        assert!((drive.heading().radians() - std::f64::consts::FRAC_PI_4).abs() < 1e-6);

        drive.zero_heading();
        assert_eq!(drive.heading(), Rotation2d::default());
        assert_eq!(drive.pose().rotation, Rotation2d::default());
    }

    #[test]
    fn odometry_tracks_translation() {
        let mut drive = DriveSubsystem::new(DriveConfig::default());
        drive.drive(0.5, 0.0, 0.0, true);
        for _ in 0..50 {
            drive.sim_periodic();
            drive.periodic();
        }
        assert!((drive.pose().translation.x - 2.4).abs() < 1e-6);
        assert!(drive.pose().translation.y.abs() < 1e-9);
    }
}
