//! Swerve drive kinematics for four modules laid out symmetrically about the
//! robot center. Robot frame: +x forward, +y left, counter-clockwise positive.

use nalgebra::{Rotation2, Vector2};
use uom::si::{
    angle::{degree, radian},
    f64::Angle,
};

/// Meters, robot or field frame depending on context.
pub type Translation2d = Vector2<f64>;

/// A heading, kept in `(-pi, pi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation2d(Rotation2<f64>);

impl Rotation2d {
    pub fn from_radians(radians: f64) -> Self {
        Self(Rotation2::new(radians))
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(Angle::new::<degree>(degrees).get::<radian>())
    }

    pub fn radians(&self) -> f64 {
        self.0.angle()
    }

    pub fn degrees(&self) -> f64 {
        Angle::new::<radian>(self.radians()).get::<degree>()
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    pub fn rotate(&self, translation: &Translation2d) -> Translation2d {
        self.0 * *translation
    }
}

impl Default for Rotation2d {
    fn default() -> Self {
        Self(Rotation2::identity())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2d {
    pub translation: Translation2d,
    pub rotation: Rotation2d,
}

impl Default for Pose2d {
    fn default() -> Self {
        Self {
            translation: Translation2d::zeros(),
            rotation: Rotation2d::default(),
        }
    }
}

/// Robot-relative velocities: m/s forward, m/s left, rad/s counter-clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChassisSpeeds {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

impl ChassisSpeeds {
    pub const fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }

    /// Converts field-relative velocities to robot-relative ones given the
    /// robot's heading on the field.
    pub fn from_field_relative(vx: f64, vy: f64, omega: f64, heading: Rotation2d) -> Self {
        let robot = heading.inverse().rotate(&Translation2d::new(vx, vy));
        Self::new(robot.x, robot.y, omega)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwerveModuleState {
    /// Meters per second.
    pub speed: f64,
    pub angle: Rotation2d,
}

impl SwerveModuleState {
    pub fn new(speed: f64, angle: Rotation2d) -> Self {
        Self { speed, angle }
    }
}

/// Module order everywhere is front left, front right, rear left, rear right.
#[derive(Debug, Clone, PartialEq)]
pub struct SwerveDriveKinematics {
    modules: [Translation2d; 4],
}

impl SwerveDriveKinematics {
    pub fn new(wheel_base: f64, track_width: f64) -> Self {
        let (x, y) = (wheel_base / 2.0, track_width / 2.0);
        Self {
            modules: [
                Translation2d::new(x, y),
                Translation2d::new(x, -y),
                Translation2d::new(-x, y),
                Translation2d::new(-x, -y),
            ],
        }
    }

    /// Module states for `speeds`. A robot at rest keeps `previous` module
    /// angles instead of snapping every wheel forward.
    pub fn to_module_states(
        &self,
        speeds: ChassisSpeeds,
        previous: &[SwerveModuleState; 4],
    ) -> [SwerveModuleState; 4] {
        if speeds == ChassisSpeeds::default() {
            return previous.map(|state| SwerveModuleState::new(0.0, state.angle));
        }

        let translation = Translation2d::new(speeds.vx, speeds.vy);
        self.modules.map(|module| {
            // Rotation adds omega x r, which is r turned a quarter turn and scaled.
            let v = translation + Translation2d::new(-module.y, module.x) * speeds.omega;
            SwerveModuleState::new(v.norm(), Rotation2d::from_radians(v.y.atan2(v.x)))
        })
    }

    /// Chassis speeds implied by the module states.
    pub fn to_chassis_speeds(&self, states: &[SwerveModuleState; 4]) -> ChassisSpeeds {
        let mut speeds = ChassisSpeeds::default();
        for (module, state) in self.modules.iter().zip(states) {
            let v = state.angle.rotate(&Translation2d::new(state.speed, 0.0));
            speeds.vx += v.x / 4.0;
            speeds.vy += v.y / 4.0;
            speeds.omega += module.perp(&v) / (module.norm_squared() * 4.0);
        }
        speeds
    }

    /// Scales every module down so none exceeds `max_speed`, preserving the
    /// ratios between them.
    pub fn desaturate_wheel_speeds(states: &mut [SwerveModuleState; 4], max_speed: f64) {
        let fastest = states.iter().map(|s| s.speed.abs()).fold(0.0, f64::max);
        if fastest > max_speed {
            for state in states.iter_mut() {
                state.speed *= max_speed / fastest;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn kinematics() -> SwerveDriveKinematics {
        SwerveDriveKinematics::new(0.6, 0.6)
    }

    #[test]
    fn straight_line_points_every_module_forward() {
        let states = kinematics().to_module_states(ChassisSpeeds::new(2.0, 0.0, 0.0), &Default::default());
        for state in states {
            assert!((state.speed - 2.0).abs() < EPSILON);
            assert!(state.angle.radians().abs() < EPSILON);
        }
    }

    #[test]
    fn pure_rotation_points_modules_tangentially() {
        let states = kinematics().to_module_states(ChassisSpeeds::new(0.0, 0.0, 1.0), &Default::default());
        let radius = Translation2d::new(0.3, 0.3).norm();
        for state in &states {
            assert!((state.speed - radius).abs() < EPSILON);
        }
        assert!((states[0].angle.radians() - 3.0 * FRAC_PI_4).abs() < EPSILON);
        assert!((states[3].angle.radians() + FRAC_PI_4).abs() < EPSILON);
    }

    #[test]
    fn at_rest_modules_keep_their_angles() {
        let previous = [SwerveModuleState::new(1.0, Rotation2d::from_radians(0.7)); 4];
        let states = kinematics().to_module_states(ChassisSpeeds::default(), &previous);
        for state in states {
            assert_eq!(state.speed, 0.0);
            assert_eq!(state.angle, Rotation2d::from_radians(0.7));
        }
    }

    #[test]
    fn forward_kinematics_inverts_inverse() {
        let k = kinematics();
        let speeds = ChassisSpeeds::new(1.2, -0.4, 0.9);
        let back = k.to_chassis_speeds(&k.to_module_states(speeds, &Default::default()));
        assert!((back.vx - speeds.vx).abs() < EPSILON);
        assert!((back.vy - speeds.vy).abs() < EPSILON);
        assert!((back.omega - speeds.omega).abs() < EPSILON);
    }

    #[test]
    fn desaturation_preserves_ratios() {
        let mut states = [
            SwerveModuleState::new(6.0, Rotation2d::default()),
            SwerveModuleState::new(3.0, Rotation2d::default()),
            SwerveModuleState::new(-6.0, Rotation2d::default()),
            SwerveModuleState::new(1.5, Rotation2d::default()),
        ];
        SwerveDriveKinematics::desaturate_wheel_speeds(&mut states, 4.8);
        assert!((states[0].speed - 4.8).abs() < EPSILON);
        assert!((states[1].speed - 2.4).abs() < EPSILON);
        assert!((states[2].speed + 4.8).abs() < EPSILON);
    }

    #[test]
    fn field_relative_rotates_by_heading() {
        let speeds = ChassisSpeeds::from_field_relative(1.0, 0.0, 0.0, Rotation2d::from_radians(FRAC_PI_2));
        assert!(speeds.vx.abs() < EPSILON);
        assert!((speeds.vy + 1.0).abs() < EPSILON);
    }
}
