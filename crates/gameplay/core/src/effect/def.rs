//! Effect definitions authored as data.

use core::fmt;

use crate::attribute::{Attribute, ModOp};
use crate::tags::TagSet;

/// Identifier of an effect definition.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EffectId(pub String);

impl EffectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keys of magnitudes supplied by the code that builds a spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SetByCallerKey {
    Duration,
    Damage,
    Healing,
    Overhealth,
    UltimateCharge,
}

/// How a magnitude is computed when a spec is built.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Magnitude {
    /// `base + per_level × (level − 1)`.
    Scalable { base: f32, per_level: f32 },
    /// Supplied on the spec under the given key.
    SetByCaller(SetByCallerKey),
}

impl Magnitude {
    pub const fn flat(value: f32) -> Self {
        Self::Scalable {
            base: value,
            per_level: 0.0,
        }
    }

    pub fn is_set_by_caller(&self, key: SetByCallerKey) -> bool {
        matches!(self, Self::SetByCaller(k) if *k == key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DurationPolicy {
    /// Applied once to base values, never stored.
    Instant,
    /// Stored until the duration elapses.
    HasDuration(Magnitude),
    /// Stored until removed.
    Infinite,
}

/// One attribute modification of an effect.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierInfo {
    pub attribute: Attribute,
    pub op: ModOp,
    pub magnitude: Magnitude,
}

/// Calculations that turn a captured magnitude into an attribute delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionKind {
    Damage,
    Healing,
    Overhealth,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionDef {
    pub kind: ExecutionKind,
    pub magnitude: Magnitude,
}

/// Complete description of an effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectDef {
    pub id: EffectId,
    pub duration: DurationPolicy,
    /// Seconds between periodic applications of a stored effect.
    #[cfg_attr(feature = "serde", serde(default))]
    pub period: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<ModifierInfo>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub execution: Option<ExecutionDef>,
    /// Tags describing the effect itself.
    #[cfg_attr(feature = "serde", serde(default))]
    pub asset_tags: TagSet,
    /// Tags given to the target while the effect is active.
    #[cfg_attr(feature = "serde", serde(default))]
    pub granted_tags: TagSet,
}

impl EffectDef {
    pub fn new(id: impl Into<String>, duration: DurationPolicy) -> Self {
        Self {
            id: EffectId::new(id),
            duration,
            period: None,
            modifiers: Vec::new(),
            execution: None,
            asset_tags: TagSet::empty(),
            granted_tags: TagSet::empty(),
        }
    }

    pub fn instant(id: impl Into<String>) -> Self {
        Self::new(id, DurationPolicy::Instant)
    }

    pub fn infinite(id: impl Into<String>) -> Self {
        Self::new(id, DurationPolicy::Infinite)
    }

    pub fn timed(id: impl Into<String>, duration: Magnitude) -> Self {
        Self::new(id, DurationPolicy::HasDuration(duration))
    }

    pub fn with_modifier(mut self, attribute: Attribute, op: ModOp, magnitude: Magnitude) -> Self {
        self.modifiers.push(ModifierInfo {
            attribute,
            op,
            magnitude,
        });
        self
    }

    pub fn with_execution(mut self, kind: ExecutionKind, magnitude: Magnitude) -> Self {
        self.execution = Some(ExecutionDef { kind, magnitude });
        self
    }

    pub fn with_period(mut self, seconds: f32) -> Self {
        self.period = Some(seconds);
        self
    }

    pub fn with_asset_tags(mut self, tags: TagSet) -> Self {
        self.asset_tags |= tags;
        self
    }

    pub fn with_granted_tags(mut self, tags: TagSet) -> Self {
        self.granted_tags |= tags;
        self
    }

    pub fn is_instant(&self) -> bool {
        matches!(self.duration, DurationPolicy::Instant)
    }

    /// True if the duration is read from the spec's set-by-caller duration.
    pub fn has_set_by_caller_duration(&self) -> bool {
        matches!(
            self.duration,
            DurationPolicy::HasDuration(m) if m.is_set_by_caller(SetByCallerKey::Duration)
        )
    }
}
