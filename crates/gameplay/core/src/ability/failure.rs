//! Reasons an activation attempt is refused.

use crate::error::{ErrorSeverity, GameplayError};
use crate::tags::{GameplayTag, TagSet};

use super::AbilitySpecHandle;

/// Why `can_activate` refused an ability.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationFailure {
    #[error("no ability granted with handle {0}")]
    UnknownAbility(AbilitySpecHandle),

    #[error("owner has no valid avatar")]
    InvalidAvatar,

    /// Net role or execution policy does not allow running here.
    #[error("ability cannot run on this machine")]
    Networking,

    #[error("ability is disabled")]
    Disabled,

    #[error("ability is already active")]
    AlreadyActive,

    #[error("activation group is blocked by an active exclusive ability")]
    ActivationGroupBlocked,

    #[error("owner carries blocking tags {0:?}")]
    TagsBlocked(TagSet),

    #[error("owner lacks required tags {0:?}")]
    TagsMissing(TagSet),

    #[error("ability is on cooldown ({remaining:.2}s left)")]
    OnCooldown { remaining: f32 },

    #[error("cost not met")]
    CostNotMet,
}

impl ActivationFailure {
    /// Tag surfaced to UI for this failure, if any.
    pub fn failure_tag(&self) -> Option<GameplayTag> {
        match self {
            Self::UnknownAbility(_) => None,
            Self::InvalidAvatar => Some(GameplayTag::FailInvalidAvatar),
            Self::Networking => Some(GameplayTag::FailNetworking),
            Self::Disabled => Some(GameplayTag::FailDisabled),
            Self::AlreadyActive => Some(GameplayTag::FailAlreadyActive),
            Self::ActivationGroupBlocked => Some(GameplayTag::FailActivationGroup),
            Self::TagsBlocked(_) => Some(GameplayTag::FailTagsBlocked),
            Self::TagsMissing(_) => Some(GameplayTag::FailTagsMissing),
            Self::OnCooldown { .. } => Some(GameplayTag::FailCooldown),
            Self::CostNotMet => Some(GameplayTag::FailCost),
        }
    }
}

impl GameplayError for ActivationFailure {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::OnCooldown { .. } | Self::CostNotMet | Self::AlreadyActive => {
                ErrorSeverity::Recoverable
            }
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAbility(_) => "ACTIVATION_UNKNOWN_ABILITY",
            Self::InvalidAvatar => "ACTIVATION_INVALID_AVATAR",
            Self::Networking => "ACTIVATION_NETWORKING",
            Self::Disabled => "ACTIVATION_DISABLED",
            Self::AlreadyActive => "ACTIVATION_ALREADY_ACTIVE",
            Self::ActivationGroupBlocked => "ACTIVATION_GROUP_BLOCKED",
            Self::TagsBlocked(_) => "ACTIVATION_TAGS_BLOCKED",
            Self::TagsMissing(_) => "ACTIVATION_TAGS_MISSING",
            Self::OnCooldown { .. } => "ACTIVATION_ON_COOLDOWN",
            Self::CostNotMet => "ACTIVATION_COST_NOT_MET",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_map_to_ui_tags() {
        assert_eq!(
            ActivationFailure::ActivationGroupBlocked.failure_tag(),
            Some(GameplayTag::FailActivationGroup)
        );
        assert_eq!(
            ActivationFailure::UnknownAbility(AbilitySpecHandle(3)).failure_tag(),
            None
        );
        assert!(ActivationFailure::CostNotMet.severity().is_recoverable());
    }
}
