//! Angle helpers shared by the look-based behaviors.
//!
//! Yaw and pitch are in degrees.  Yaw 0 faces +Z and −90 faces +X; positive
//! pitch looks down.

use blockpilot_nav::yaw_toward;
use blockpilot_types::Vec3;

/// Wrap an angle into `(-180, 180]`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Signed shortest rotation from `from` to `to`.
pub fn angle_diff(from: f64, to: f64) -> f64 {
    wrap_degrees(to - from)
}

/// Yaw and pitch that look from `eye` at `point`.
pub fn look_angles(eye: Vec3, point: Vec3) -> (f64, f64) {
    let d = point - eye;
    let horizontal = d.x.hypot(d.z);
    let pitch = (-d.y).atan2(horizontal).to_degrees();
    (yaw_toward(eye, point), pitch)
}

/// Rotate `current` toward `target` by at most `max_step` degrees.
pub fn turn_toward(current: f64, target: f64, max_step: f64) -> f64 {
    let diff = angle_diff(current, target);
    if diff.abs() <= max_step {
        target
    } else {
        wrap_degrees(current + max_step.copysign(diff))
    }
}
