//! World positions used by melee targeting.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::ids::ActorId;

/// Location and facing of an actor's avatar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvatarTransform {
    pub position: Vec3,
    /// Unit facing direction.
    pub forward: Vec3,
}

impl AvatarTransform {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.normalize_or_zero(),
        }
    }
}

/// Answers spatial queries about avatars.
pub trait SpatialOracle: Send + Sync {
    fn transform(&self, actor: ActorId) -> Option<AvatarTransform>;

    /// Every avatar whose position lies within `radius` of `origin`.
    fn actors_within(&self, origin: Vec3, radius: f32) -> Vec<(ActorId, Vec3)>;
}

/// Flat list of avatar transforms.
#[derive(Clone, Debug, Default)]
pub struct SpatialTable {
    avatars: BTreeMap<ActorId, AvatarTransform>,
}

impl SpatialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_avatar(mut self, actor: ActorId, transform: AvatarTransform) -> Self {
        self.avatars.insert(actor, transform);
        self
    }

    pub fn place(&mut self, actor: ActorId, transform: AvatarTransform) {
        self.avatars.insert(actor, transform);
    }

    pub fn remove(&mut self, actor: ActorId) {
        self.avatars.remove(&actor);
    }
}

impl SpatialOracle for SpatialTable {
    fn transform(&self, actor: ActorId) -> Option<AvatarTransform> {
        self.avatars.get(&actor).copied()
    }

    fn actors_within(&self, origin: Vec3, radius: f32) -> Vec<(ActorId, Vec3)> {
        self.avatars
            .iter()
            .filter(|(_, t)| t.position.distance_squared(origin) <= radius * radius)
            .map(|(actor, t)| (*actor, t.position))
            .collect()
    }
}
