//! Attribute domain: per-owner clamped numeric values.
//!
//! # Module Structure
//!
//! - `store`: [`AttributeStore`], the only place attribute values change
//! - `clamp`: the [`Clampable`] hook pair and the clamp table
//! - `event`: change notifications and listener ids
//!
//! Attributes are grouped into sets ([`AttributeSetKind`]); an owner only has
//! the attributes of the sets registered on its store.

mod clamp;
mod event;
mod store;

pub use clamp::Clampable;
pub use event::{AttributeEvent, ChangeCause, ListenerId};
pub use store::{AttributeModifier, AttributeSnapshot, AttributeStore};

use strum::{AsRefStr, EnumIter, IntoStaticStr};

/// Every attribute the core knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(AsRefStr, IntoStaticStr, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attribute {
    // Health set
    Health,
    MaxHealth,
    Overhealth,
    /// Meta: incoming damage, folded into Overhealth then Health.
    Damage,
    /// Meta: incoming healing, folded into Health.
    Healing,
    /// Meta: overhealth lost over time.
    OverhealthDecay,
    DamageBoost,
    DamageResistance,

    // Ultimate set
    UltimateCharge,

    // Lives set
    Lives,

    // Movement set
    MaxWalkSpeed,
    JumpVelocity,
    GravityScale,
}

impl Attribute {
    /// The set this attribute belongs to.
    pub const fn set(self) -> AttributeSetKind {
        use Attribute::*;
        match self {
            Health | MaxHealth | Overhealth | Damage | Healing | OverhealthDecay | DamageBoost
            | DamageResistance => AttributeSetKind::Health,
            UltimateCharge => AttributeSetKind::Ultimate,
            Lives => AttributeSetKind::Lives,
            MaxWalkSpeed | JumpVelocity | GravityScale => AttributeSetKind::Movement,
        }
    }

    /// Meta attributes carry a one-shot magnitude and are reset to 0 after folding.
    pub const fn is_meta(self) -> bool {
        matches!(self, Self::Damage | Self::Healing | Self::OverhealthDecay)
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Attribute groups that can be registered on a store independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeSetKind {
    Health,
    Ultimate,
    Lives,
    Movement,
}

impl AttributeSetKind {
    /// Attributes of this set with their initial base values.
    pub fn defaults(self) -> &'static [(Attribute, f32)] {
        match self {
            Self::Health => &[
                (Attribute::MaxHealth, 100.0),
                (Attribute::Health, 100.0),
                (Attribute::Overhealth, 0.0),
                (Attribute::Damage, 0.0),
                (Attribute::Healing, 0.0),
                (Attribute::OverhealthDecay, 0.0),
                (Attribute::DamageBoost, 0.0),
                (Attribute::DamageResistance, 0.0),
            ],
            Self::Ultimate => &[(Attribute::UltimateCharge, 0.0)],
            Self::Lives => &[(Attribute::Lives, 0.0)],
            Self::Movement => &[
                (Attribute::MaxWalkSpeed, 600.0),
                (Attribute::JumpVelocity, 420.0),
                (Attribute::GravityScale, 1.0),
            ],
        }
    }
}

/// Base and current value of one attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeValue {
    /// Value without temporary modifiers.
    pub base: f32,
    /// Value with every active modifier aggregated.
    pub current: f32,
}

impl AttributeValue {
    pub const fn new(value: f32) -> Self {
        Self {
            base: value,
            current: value,
        }
    }
}

/// How a modifier combines with the base value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModOp {
    #[default]
    Add,
    Multiply,
    Override,
}

impl ModOp {
    /// Applies this operation once to `value`.
    pub fn apply(self, value: f32, magnitude: f32) -> f32 {
        match self {
            Self::Add => value + magnitude,
            Self::Multiply => value * magnitude,
            Self::Override => magnitude,
        }
    }
}

/// Initial values of the health set, applied when a pawn binds its store.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HealthBaseValues {
    pub max_health: f32,
    pub health: f32,
    pub overhealth: f32,
}

impl Default for HealthBaseValues {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            health: 100.0,
            overhealth: 0.0,
        }
    }
}
