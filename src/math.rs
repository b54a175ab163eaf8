use std::f64::consts::PI;

/// Zeroes `value` inside `deadband` and rescales the rest so the output still
/// spans `[-max_magnitude, max_magnitude]`. A band as wide as the range
/// zeroes everything.
pub fn apply_deadband(value: f64, deadband: f64, max_magnitude: f64) -> f64 {
    if value.abs() < deadband || deadband >= max_magnitude {
        return 0.0;
    }
    if max_magnitude / deadband > 1.0e12 {
        // Rescaling only loses precision here; shift toward zero instead.
        return if value > 0.0 { value - deadband } else { value + deadband };
    }
    if value > 0.0 {
        max_magnitude * (value - deadband) / (max_magnitude - deadband)
    } else {
        max_magnitude * (value + deadband) / (max_magnitude - deadband)
    }
}

/// Wraps an angle in radians into `[-PI, PI)`.
pub fn angle_modulus(radians: f64) -> f64 {
    (radians + PI).rem_euclid(2.0 * PI) - PI
}
