use std::f64::consts::PI;

/// Steady-state model of a brushed-equivalent DC motor (or a gang of
/// identical motors on one shaft).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcMotor {
    pub nominal_voltage: f64,
    pub stall_torque: f64,
    pub stall_current: f64,
    pub free_current: f64,
    /// Radians per second.
    pub free_speed: f64,
    /// Winding resistance, ohms.
    pub r: f64,
    /// Radians per second per volt.
    pub kv: f64,
}

fn rpm_to_rad_per_sec(rpm: f64) -> f64 {
    rpm * 2.0 * PI / 60.0
}

impl DcMotor {
    pub fn new(
        nominal_voltage: f64,
        stall_torque: f64,
        stall_current: f64,
        free_current: f64,
        free_speed_rpm: f64,
        count: u32,
    ) -> Self {
        let count = f64::from(count.max(1));
        let stall_current = stall_current * count;
        let free_current = free_current * count;
        let r = nominal_voltage / stall_current;
        let free_speed = rpm_to_rad_per_sec(free_speed_rpm);
        Self {
            nominal_voltage,
            stall_torque: stall_torque * count,
            stall_current,
            free_current,
            free_speed,
            r,
            kv: free_speed / (nominal_voltage - r * free_current),
        }
    }

    pub fn neo(count: u32) -> Self {
        Self::new(12.0, 2.6, 105.0, 1.8, 5676.0, count)
    }

    pub fn neo_550(count: u32) -> Self {
        Self::new(12.0, 0.97, 100.0, 1.4, 11000.0, count)
    }

    pub fn neo_vortex(count: u32) -> Self {
        Self::new(12.0, 3.6, 211.0, 3.6, 6784.0, count)
    }

    /// Current drawn at `speed` rad/s with `voltage` applied.
    pub fn current(&self, speed: f64, voltage: f64) -> f64 {
        (voltage - speed / self.kv) / self.r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stalled_motor_draws_stall_current() {
        let neo = DcMotor::neo(1);
        assert!((neo.current(0.0, 12.0) - 105.0).abs() < 1e-9);
    }

    #[test]
    fn free_running_motor_draws_free_current() {
        let neo = DcMotor::neo(1);
        assert!((neo.current(neo.free_speed, 12.0) - 1.8).abs() < 1e-6);
    }

    #[test]
    fn ganged_motors_scale_current() {
        let pair = DcMotor::neo_vortex(2);
        assert!((pair.current(0.0, 12.0) - 422.0).abs() < 1e-9);
        assert_eq!(pair.free_speed, DcMotor::neo_vortex(1).free_speed);
    }
}
