use std::f64::consts::PI;

use super::motor::DcMotor;
use crate::constants::sim::{MECHANISM_TIME_CONSTANT, NOMINAL_VOLTAGE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMode {
    /// Fraction of bus voltage in `[-1, 1]`.
    DutyCycle(f64),
    /// Onboard proportional loop toward a position in motor rotations.
    Position(f64),
}

/// A simulated motor controller driving a mechanism, with an onboard
/// position loop. Positions and velocities are in motor rotations.
#[derive(Debug, Clone)]
pub struct SimSpark {
    motor: DcMotor,
    mode: ControlMode,
    kp: f64,
    limits: (f64, f64),
    position: f64,
    /// Rotations per second.
    velocity: f64,
    applied_output: f64,
    current: f64,
}

impl SimSpark {
    pub fn new(motor: DcMotor, kp: f64) -> Self {
        Self {
            motor,
            mode: ControlMode::DutyCycle(0.0),
            kp,
            limits: (f64::NEG_INFINITY, f64::INFINITY),
            position: 0.0,
            velocity: 0.0,
            applied_output: 0.0,
            current: 0.0,
        }
    }

    /// Hard stops the mechanism cannot travel past.
    pub fn with_limits(mut self, (min, max): (f64, f64)) -> Self {
        self.limits = (min, max);
        self.position = self.position.clamp(min, max);
        self
    }

    pub fn set(&mut self, output: f64) {
        self.mode = ControlMode::DutyCycle(output.clamp(-1.0, 1.0));
    }

    pub fn set_position_reference(&mut self, position: f64) {
        self.mode = ControlMode::Position(position);
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Resets the encoder without moving the mechanism.
    pub fn set_encoder_position(&mut self, position: f64) {
        let offset = position - self.position;
        self.position = position;
        self.limits = (self.limits.0 + offset, self.limits.1 + offset);
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn applied_output(&self) -> f64 {
        self.applied_output
    }

    /// Amps drawn during the last update.
    pub fn current(&self) -> f64 {
        self.current
    }

    /// True when resting against the lower hard stop.
    pub fn at_reverse_limit(&self) -> bool {
        self.position <= self.limits.0
    }

    fn free_velocity(&self) -> f64 {
        self.motor.free_speed / (2.0 * PI)
    }

    /// Advances the mechanism by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        let output = match self.mode {
            ControlMode::DutyCycle(output) => output,
            ControlMode::Position(target) => (self.kp * (target - self.position)).clamp(-1.0, 1.0),
        };
        self.applied_output = output;

        let target_velocity = output * self.free_velocity();
        let alpha = dt / (MECHANISM_TIME_CONSTANT + dt);
        self.velocity += (target_velocity - self.velocity) * alpha;
        self.position += self.velocity * dt;

        let (min, max) = self.limits;
        if self.position <= min || self.position >= max {
            self.position = self.position.clamp(min, max);
            self.velocity = 0.0;
        }

        let speed = self.velocity * 2.0 * PI;
        self.current = self.motor.current(speed, output * NOMINAL_VOLTAGE).abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.02;

    fn settle(spark: &mut SimSpark, seconds: f64) {
        for _ in 0..(seconds / DT) as usize {
            spark.update(DT);
        }
    }

    #[test]
    fn position_loop_reaches_target() {
        let mut spark = SimSpark::new(DcMotor::neo(1), 0.1).with_limits((0.0, 160.0));
        spark.set_position_reference(150.0);
        settle(&mut spark, 5.0);
        assert!((spark.position() - 150.0).abs() < 1.0, "at {}", spark.position());
        assert!(spark.current() < 5.0);
    }

    #[test]
    fn hard_stop_stalls_motor() {
        let mut spark = SimSpark::new(DcMotor::neo(1), 0.1).with_limits((0.0, 10.0));
        spark.set(-0.5);
        settle(&mut spark, 0.5);
        assert!(spark.at_reverse_limit());
        assert_eq!(spark.velocity(), 0.0);
        assert!((spark.current() - 52.5).abs() < 1e-6);
    }

    #[test]
    fn accelerating_draws_more_than_cruising() {
        let mut spark = SimSpark::new(DcMotor::neo_550(1), 0.0);
        spark.set(1.0);
        spark.update(DT);
        let inrush = spark.current();
        settle(&mut spark, 2.0);
        assert!(inrush > spark.current());
        assert!(spark.velocity() > 0.0);
    }

    #[test]
    fn encoder_reset_keeps_physical_limits() {
        let mut spark = SimSpark::new(DcMotor::neo(1), 0.1).with_limits((0.0, 10.0));
        spark.set(0.2);
        settle(&mut spark, 0.2);
        let moved = spark.position();
        spark.set_encoder_position(0.0);
        spark.set(-1.0);
        settle(&mut spark, 1.0);
        assert!((spark.position() + moved).abs() < 1e-9);
    }
}
