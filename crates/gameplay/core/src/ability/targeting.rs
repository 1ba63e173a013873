//! Melee hit shapes.
//!
//! Shapes are evaluated in the avatar's frame: `origin` is the avatar
//! position and `forward` its facing. Candidates come from the spatial oracle.

use glam::Vec3;

use crate::env::AvatarTransform;

/// Volume a melee swing sweeps.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeleeTargeting {
    /// Sphere centered `range` units in front of the avatar.
    Sphere { range: f32, radius: f32 },
    /// Capsule from the avatar to `range` units ahead.
    Capsule { range: f32, radius: f32 },
    /// Cone of `half_angle_deg` around the facing, up to `range`.
    Cone { range: f32, half_angle_deg: f32 },
}

impl MeleeTargeting {
    /// Radius of a sphere around the avatar that contains the whole shape.
    pub fn reach(&self) -> f32 {
        match *self {
            Self::Sphere { range, radius } | Self::Capsule { range, radius } => range + radius,
            Self::Cone { range, .. } => range,
        }
    }

    pub fn contains(&self, from: &AvatarTransform, point: Vec3) -> bool {
        let forward = from.forward;
        match *self {
            Self::Sphere { range, radius } => {
                let center = from.position + forward * range;
                center.distance_squared(point) <= radius * radius
            }
            Self::Capsule { range, radius } => {
                let end = from.position + forward * range;
                distance_to_segment_squared(point, from.position, end) <= radius * radius
            }
            Self::Cone {
                range,
                half_angle_deg,
            } => {
                let offset = point - from.position;
                let distance = offset.length();
                if distance > range {
                    return false;
                }
                if distance <= f32::EPSILON {
                    return true;
                }
                let cos = forward.dot(offset / distance);
                cos >= half_angle_deg.to_radians().cos()
            }
        }
    }
}

fn distance_to_segment_squared(point: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance_squared(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance_squared(a + ab * t)
}
