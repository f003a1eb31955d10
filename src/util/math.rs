//! Math type re-exports and quaternion helpers.
//!
//! Cast stores vectors as packed little-endian float components and
//! rotations as XYZW quaternions; `glam` provides the in-memory types.

pub use glam::{Quat, Vec2, Vec3, Vec4};

/// Unpack an XYZW vector into a quaternion.
#[inline]
pub fn quat_from_vec4(v: Vec4) -> Quat {
    Quat::from_xyzw(v.x, v.y, v.z, v.w)
}

/// Pack a quaternion into an XYZW vector.
#[inline]
pub fn quat_to_vec4(q: Quat) -> Vec4 {
    Vec4::new(q.x, q.y, q.z, q.w)
}

/// The identity rotation in wire form (0, 0, 0, 1).
pub const QUAT_IDENTITY_WIRE: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
