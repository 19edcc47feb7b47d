//! Vector helpers on top of glam.

use glam::{DMat3, DQuat, DVec3};

/// Mirror `dir` about the plane with normal `normal`.
pub fn reflect(dir: DVec3, normal: DVec3) -> DVec3 {
    dir - 2.0 * dir.dot(normal) * normal
}

/// Remove the component of `v` along `normal`.
pub fn project_on_plane(v: DVec3, normal: DVec3) -> DVec3 {
    let n = normal.normalize_or_zero();
    v - n * v.dot(n)
}

/// Rotate unit vector `from` toward `to` by at most `max_radians`.
/// Zero-length inputs return `from` unchanged.
pub fn rotate_towards(from: DVec3, to: DVec3, max_radians: f64) -> DVec3 {
    let a = from.normalize_or_zero();
    let b = to.normalize_or_zero();
    if a == DVec3::ZERO || b == DVec3::ZERO || max_radians <= 0.0 {
        return from;
    }
    let angle = a.angle_between(b);
    if angle <= max_radians {
        return b;
    }
    let mut axis = a.cross(b);
    if axis.length_squared() < 1e-18 {
        // Opposite directions: any perpendicular axis will do.
        axis = a.any_orthonormal_vector();
    }
    DQuat::from_axis_angle(axis.normalize(), max_radians) * a
}

/// Orientation whose local +Z looks along `forward` with local +Y as close
/// to `up` as possible.
pub fn look_rotation(forward: DVec3, up: DVec3) -> DQuat {
    let f = forward.normalize_or_zero();
    if f == DVec3::ZERO {
        return DQuat::IDENTITY;
    }
    let mut right = up.cross(f);
    if right.length_squared() < 1e-18 {
        right = f.any_orthonormal_vector();
    }
    let right = right.normalize();
    let true_up = f.cross(right);
    DQuat::from_mat3(&DMat3::from_cols(right, true_up, f))
}

/// Rotation by pitch (about X) then yaw (about Y), in degrees.
pub fn euler_degrees(pitch: f64, yaw: f64, roll: f64) -> DQuat {
    DQuat::from_euler(
        glam::EulerRot::YXZ,
        yaw.to_radians(),
        pitch.to_radians(),
        roll.to_radians(),
    )
}
