use std::collections::BTreeMap;
use std::sync::Arc;

use crate::tags::TagSet;

use super::{DurationPolicy, EffectContext, EffectDef, EffectError, Magnitude, SetByCallerKey};

/// Resolved lifetime of a spec.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResolvedDuration {
    Instant,
    Timed(f32),
    Infinite,
}

/// An effect definition bound to a level, a context and caller magnitudes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSpec {
    pub def: Arc<EffectDef>,
    pub level: f32,
    pub context: EffectContext,
    set_by_caller: BTreeMap<SetByCallerKey, f32>,
    /// Source DamageBoost snapshotted when the spec was built.
    pub captured_damage_boost: f32,
    pub dynamic_asset_tags: TagSet,
}

impl EffectSpec {
    pub fn new(def: Arc<EffectDef>, level: f32, context: EffectContext) -> Self {
        Self {
            def,
            level,
            context,
            set_by_caller: BTreeMap::new(),
            captured_damage_boost: 0.0,
            dynamic_asset_tags: TagSet::empty(),
        }
    }

    pub fn with_set_by_caller(mut self, key: SetByCallerKey, value: f32) -> Self {
        self.set_set_by_caller(key, value);
        self
    }

    pub fn set_set_by_caller(&mut self, key: SetByCallerKey, value: f32) {
        self.set_by_caller.insert(key, value);
    }

    pub fn set_by_caller(&self, key: SetByCallerKey) -> Option<f32> {
        self.set_by_caller.get(&key).copied()
    }

    /// Effect tags plus tags added to this spec only.
    pub fn asset_tags(&self) -> TagSet {
        self.def.asset_tags | self.dynamic_asset_tags
    }

    pub fn magnitude(&self, magnitude: &Magnitude) -> Result<f32, EffectError> {
        match *magnitude {
            Magnitude::Scalable { base, per_level } => {
                Ok(base + per_level * (self.level - 1.0).max(0.0))
            }
            Magnitude::SetByCaller(key) => {
                self.set_by_caller(key)
                    .ok_or_else(|| EffectError::MissingSetByCaller {
                        effect: self.def.id.clone(),
                        key,
                    })
            }
        }
    }

    pub fn duration(&self) -> Result<ResolvedDuration, EffectError> {
        match &self.def.duration {
            DurationPolicy::Instant => Ok(ResolvedDuration::Instant),
            DurationPolicy::Infinite => Ok(ResolvedDuration::Infinite),
            DurationPolicy::HasDuration(m) => Ok(ResolvedDuration::Timed(self.magnitude(m)?)),
        }
    }
}
