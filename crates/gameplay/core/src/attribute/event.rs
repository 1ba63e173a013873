//! Attribute change notifications.

use crate::effect::EffectId;
use crate::ids::ActorId;

use super::Attribute;

/// Who caused an attribute change, if anyone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeCause {
    pub instigator: Option<ActorId>,
    pub causer: Option<ActorId>,
    pub effect: Option<EffectId>,
}

impl ChangeCause {
    /// Change with no gameplay source (initialization, replication).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_instigator(instigator: ActorId) -> Self {
        Self {
            instigator: Some(instigator),
            causer: Some(instigator),
            effect: None,
        }
    }
}

/// Notification produced by an [`AttributeStore`](super::AttributeStore).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeEvent {
    /// A non-meta attribute's current value changed.
    Changed {
        attribute: Attribute,
        old: f32,
        new: f32,
        cause: ChangeCause,
    },
    /// A meta attribute was folded into stateful attributes.
    Folded {
        meta: Attribute,
        magnitude: f32,
        cause: ChangeCause,
    },
    /// Health reached 0. Fires once until Health rises above 0 again.
    OutOfHealth { magnitude: f32, cause: ChangeCause },
}

/// Identifies a registered change listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u32);
