//! Mutual exclusion between exclusive abilities of one owner.

use crate::error::{ErrorSeverity, GameplayError};

use super::{AbilitySpecHandle, ActivationGroup};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArbiterError {
    /// An exclusive ability was activated over a blocking one.
    #[error("{incoming} activated while blocking exclusive {current} is active")]
    CurrentNotReplaceable {
        current: AbilitySpecHandle,
        incoming: AbilitySpecHandle,
    },

    #[error("{handle} cannot move to {group:?} while {current} blocks it")]
    GroupBlocked {
        handle: AbilitySpecHandle,
        group: ActivationGroup,
        current: AbilitySpecHandle,
    },
}

impl GameplayError for ArbiterError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CurrentNotReplaceable { .. } => ErrorSeverity::Internal,
            Self::GroupBlocked { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CurrentNotReplaceable { .. } => "ARBITER_CURRENT_NOT_REPLACEABLE",
            Self::GroupBlocked { .. } => "ARBITER_GROUP_BLOCKED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ExclusiveSlot {
    handle: AbilitySpecHandle,
    group: ActivationGroup,
}

/// Tracks the single exclusive ability currently active on an owner.
///
/// Replaceable exclusives are pre-empted by any later exclusive activation;
/// the caller force-cancels the handle returned by
/// [`on_ability_activated`](Self::on_ability_activated). Blocking exclusives
/// are never pre-empted: competing activations fail `can_activate` first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivationGroupArbiter {
    current: Option<ExclusiveSlot>,
}

impl ActivationGroupArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<AbilitySpecHandle> {
        self.current.map(|slot| slot.handle)
    }

    pub fn current_group(&self) -> Option<ActivationGroup> {
        self.current.map(|slot| slot.group)
    }

    pub fn is_blocked(&self, group: ActivationGroup) -> bool {
        match group {
            ActivationGroup::Independent => false,
            ActivationGroup::ExclusiveReplaceable | ActivationGroup::ExclusiveBlocking => {
                self.current_group() == Some(ActivationGroup::ExclusiveBlocking)
            }
        }
    }

    /// Registers a newly active ability.
    ///
    /// Returns the replaced exclusive ability, which the caller must cancel.
    /// When the current exclusive is blocking the state is left untouched.
    pub fn on_ability_activated(
        &mut self,
        handle: AbilitySpecHandle,
        group: ActivationGroup,
    ) -> Result<Option<AbilitySpecHandle>, ArbiterError> {
        if !group.is_exclusive() {
            return Ok(None);
        }
        let replaced = match self.current {
            Some(slot) if slot.handle == handle => None,
            Some(slot) if slot.group == ActivationGroup::ExclusiveReplaceable => Some(slot.handle),
            Some(slot) => {
                return Err(ArbiterError::CurrentNotReplaceable {
                    current: slot.handle,
                    incoming: handle,
                });
            }
            None => None,
        };
        self.current = Some(ExclusiveSlot { handle, group });
        Ok(replaced)
    }

    pub fn on_ability_ended(&mut self, handle: AbilitySpecHandle) {
        if self.current() == Some(handle) {
            self.current = None;
        }
    }

    /// Moves an active ability to another group.
    ///
    /// Like activation, moving into an exclusive group returns a replaceable
    /// ability to cancel. Moving out of an exclusive group frees the slot.
    pub fn change_group(
        &mut self,
        handle: AbilitySpecHandle,
        group: ActivationGroup,
    ) -> Result<Option<AbilitySpecHandle>, ArbiterError> {
        if !group.is_exclusive() {
            self.on_ability_ended(handle);
            return Ok(None);
        }
        match self.current {
            Some(slot)
                if slot.handle != handle && slot.group == ActivationGroup::ExclusiveBlocking =>
            {
                Err(ArbiterError::GroupBlocked {
                    handle,
                    group,
                    current: slot.handle,
                })
            }
            _ => self.on_ability_activated(handle, group),
        }
    }
}
