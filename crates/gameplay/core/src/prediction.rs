//! Prediction keys and their reconciliation.
//!
//! A client brackets every predicted action with a [`PredictionKey`]. The
//! server later confirms or rejects the key; on rejection every
//! [`RollbackAction`] bound to the key (and to keys opened inside it) runs.
//! [`ScopedPredictionWindow`] is the only way code enters a key: the previous
//! key is restored when the guard drops, on every exit path.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use arrayvec::ArrayVec;

use crate::ability::AbilitySpecHandle;
use crate::config::GameplayConfig;
use crate::error::{ErrorSeverity, GameplayError};
use crate::ids::MontageId;
use crate::net::NetRole;

/// Token bracketing one predicted action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictionKey(pub u32);

impl PredictionKey {
    /// Keys at or above this value were generated by the server.
    pub const SERVER_BASE: u32 = 1 << 31;

    pub const fn is_server_generated(self) -> bool {
        self.0 >= Self::SERVER_BASE
    }
}

impl core::fmt::Display for PredictionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "key#{}", self.0)
    }
}

/// Undo step registered against a key, run only if the key is rejected.
///
/// `activation` is the key the ability instance was activated under; a
/// rollback only touches the instance while it still runs under that key,
/// so a late rejection never undoes a newer activation of the same ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollbackAction {
    /// Stop a montage that was played optimistically.
    StopMontage {
        ability: AbilitySpecHandle,
        activation: PredictionKey,
        montage: MontageId,
    },
    /// End an ability that the server refused to run.
    EndAbility {
        ability: AbilitySpecHandle,
        activation: PredictionKey,
    },
}

impl RollbackAction {
    pub fn ability(&self) -> AbilitySpecHandle {
        match *self {
            Self::StopMontage { ability, .. } | Self::EndAbility { ability, .. } => ability,
        }
    }

    /// Activation key the rollback belongs to.
    pub fn activation(&self) -> PredictionKey {
        match *self {
            Self::StopMontage { activation, .. } | Self::EndAbility { activation, .. } => {
                activation
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyStatus {
    Open,
    Confirmed,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PredictionError {
    #[error("prediction key {0} is not pending")]
    UnknownKey(PredictionKey),

    #[error("prediction key {0} already holds the maximum number of rollbacks")]
    RollbackCapacity(PredictionKey),
}

impl GameplayError for PredictionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownKey(_) => ErrorSeverity::Validation,
            Self::RollbackCapacity(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownKey(_) => "PREDICTION_UNKNOWN_KEY",
            Self::RollbackCapacity(_) => "PREDICTION_ROLLBACK_CAPACITY",
        }
    }
}

#[derive(Clone, Debug)]
struct KeyEntry {
    base: Option<PredictionKey>,
    rollbacks: ArrayVec<RollbackAction, { GameplayConfig::MAX_ROLLBACKS_PER_KEY }>,
}

/// Keys pending a server verdict, plus the key currently in scope.
#[derive(Clone, Debug)]
pub struct PredictionLedger {
    role: NetRole,
    next: u32,
    current: Option<PredictionKey>,
    pending: BTreeMap<PredictionKey, KeyEntry>,
    resolved: BTreeMap<PredictionKey, KeyStatus>,
}

impl PredictionLedger {
    /// Verdicts remembered per ledger; older ones are forgotten first.
    const RESOLVED_HISTORY: usize = 64;

    pub fn new(role: NetRole) -> Self {
        let next = if role.is_authority() {
            PredictionKey::SERVER_BASE + 1
        } else {
            1
        };
        Self {
            role,
            next,
            current: None,
            pending: BTreeMap::new(),
            resolved: BTreeMap::new(),
        }
    }

    /// Key in scope, if any.
    pub fn current(&self) -> Option<PredictionKey> {
        self.current
    }

    /// True if new predicted work may be attached to the key in scope.
    pub fn is_valid_for_more_prediction(&self) -> bool {
        match self.current {
            Some(_) if self.role.is_authority() => true,
            Some(key) => self.pending.contains_key(&key),
            None => false,
        }
    }

    pub fn status(&self, key: PredictionKey) -> Option<KeyStatus> {
        if self.pending.contains_key(&key) {
            return Some(KeyStatus::Open);
        }
        self.resolved.get(&key).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Registers a rollback that runs if and only if `key` is rejected.
    pub fn bind_rejection_rollback(
        &mut self,
        key: PredictionKey,
        action: RollbackAction,
    ) -> Result<(), PredictionError> {
        let entry = self
            .pending
            .get_mut(&key)
            .ok_or(PredictionError::UnknownKey(key))?;
        entry
            .rollbacks
            .try_push(action)
            .map_err(|_| PredictionError::RollbackCapacity(key))
    }

    /// Server agreed with the prediction. Bound rollbacks are discarded.
    ///
    /// Returns false if the key was not pending.
    pub fn confirm(&mut self, key: PredictionKey) -> bool {
        if self.pending.remove(&key).is_none() {
            return false;
        }
        self.remember(key, KeyStatus::Confirmed);
        tracing::trace!(%key, "prediction key confirmed");
        true
    }

    /// Server refused the prediction. Rejects `key` and every key opened
    /// inside it, returning their rollbacks in binding order, outer key first.
    pub fn reject(&mut self, key: PredictionKey) -> Vec<RollbackAction> {
        let mut rollbacks = Vec::new();
        let mut frontier = vec![key];
        while let Some(next) = frontier.pop() {
            let Some(entry) = self.pending.remove(&next) else {
                continue;
            };
            rollbacks.extend(entry.rollbacks);
            self.remember(next, KeyStatus::Rejected);
            let dependents: Vec<_> = self
                .pending
                .iter()
                .filter(|(_, e)| e.base == Some(next))
                .map(|(k, _)| *k)
                .collect();
            frontier.extend(dependents.into_iter().rev());
        }
        if self.current == Some(key) {
            self.current = None;
        }
        tracing::debug!(%key, rollbacks = rollbacks.len(), "prediction key rejected");
        rollbacks
    }

    fn allocate(&mut self, base: Option<PredictionKey>) -> PredictionKey {
        let key = PredictionKey(self.next);
        self.next = self.next.wrapping_add(1);
        if !self.role.is_authority() {
            self.pending.insert(
                key,
                KeyEntry {
                    base,
                    rollbacks: ArrayVec::new(),
                },
            );
        }
        key
    }

    fn remember(&mut self, key: PredictionKey, status: KeyStatus) {
        self.resolved.insert(key, status);
        while self.resolved.len() > Self::RESOLVED_HISTORY {
            self.resolved.pop_first();
        }
    }

    fn set_current(&mut self, key: Option<PredictionKey>) {
        self.current = key;
    }
}

/// Anything that owns a prediction ledger.
pub trait PredictionHost {
    fn prediction_ledger(&mut self) -> &mut PredictionLedger;
}

impl PredictionHost for PredictionLedger {
    fn prediction_ledger(&mut self) -> &mut PredictionLedger {
        self
    }
}

/// RAII guard that puts a key in scope for the lifetime of the guard.
///
/// The guard dereferences to its host so predicted work is done through it.
pub struct ScopedPredictionWindow<'a, H: PredictionHost + ?Sized> {
    host: &'a mut H,
    key: PredictionKey,
    previous: Option<PredictionKey>,
}

impl<'a, H: PredictionHost + ?Sized> ScopedPredictionWindow<'a, H> {
    /// Opens a window. With `can_extend`, nests inside the current key if it
    /// still accepts prediction; otherwise a fresh key is allocated, based on
    /// the current one when that is still open.
    pub fn new(host: &'a mut H, can_extend: bool) -> Self {
        let ledger = host.prediction_ledger();
        let previous = ledger.current();
        let open = if ledger.is_valid_for_more_prediction() {
            previous
        } else {
            None
        };
        let key = match (can_extend, open) {
            (true, Some(key)) => key,
            (_, base) => ledger.allocate(base),
        };
        ledger.set_current(Some(key));
        Self {
            host,
            key,
            previous,
        }
    }

    /// Puts a key received from the other side in scope, so work done on the
    /// server is attributed to the client's prediction.
    pub fn with_key(host: &'a mut H, key: PredictionKey) -> Self {
        let ledger = host.prediction_ledger();
        let previous = ledger.current();
        ledger.set_current(Some(key));
        Self {
            host,
            key,
            previous,
        }
    }

    pub fn key(&self) -> PredictionKey {
        self.key
    }
}

impl<H: PredictionHost + ?Sized> Deref for ScopedPredictionWindow<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: PredictionHost + ?Sized> DerefMut for ScopedPredictionWindow<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: PredictionHost + ?Sized> Drop for ScopedPredictionWindow<'_, H> {
    fn drop(&mut self) {
        self.host.prediction_ledger().set_current(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(ability: u32) -> RollbackAction {
        RollbackAction::StopMontage {
            ability: AbilitySpecHandle(ability),
            activation: PredictionKey(1),
            montage: MontageId(9),
        }
    }

    #[test]
    fn window_restores_previous_key() {
        let mut ledger = PredictionLedger::new(NetRole::AutonomousProxy);
        let outer = {
            let window = ScopedPredictionWindow::new(&mut ledger, true);
            let outer = window.key();
            assert_eq!(window.current(), Some(outer));
            outer
        };
        assert_eq!(ledger.current(), None);
        assert_eq!(ledger.status(outer), Some(KeyStatus::Open));
    }

    #[test]
    fn extending_reuses_open_key() {
        let mut ledger = PredictionLedger::new(NetRole::AutonomousProxy);
        let mut outer = ScopedPredictionWindow::new(&mut ledger, false);
        let outer_key = outer.key();
        let inner = ScopedPredictionWindow::new(&mut *outer, true);
        assert_eq!(inner.key(), outer_key);
    }

    #[test]
    fn window_closes_on_early_return() {
        fn predicted_step(ledger: &mut PredictionLedger) -> Result<(), PredictionError> {
            let mut window = ScopedPredictionWindow::new(ledger, false);
            let key = window.key();
            window.bind_rejection_rollback(key, stop(1))?;
            window.bind_rejection_rollback(PredictionKey(999), stop(1))?;
            Ok(())
        }

        let mut ledger = PredictionLedger::new(NetRole::AutonomousProxy);
        assert!(predicted_step(&mut ledger).is_err());
        assert_eq!(ledger.current(), None);
    }

    #[test]
    fn rejection_cascades_to_dependent_keys() {
        let mut ledger = PredictionLedger::new(NetRole::AutonomousProxy);
        let mut outer = ScopedPredictionWindow::new(&mut ledger, false);
        let outer_key = outer.key();
        outer.bind_rejection_rollback(outer_key, stop(1)).unwrap();
        let inner_key = {
            let mut inner = ScopedPredictionWindow::new(&mut *outer, false);
            let key = inner.key();
            inner
                .bind_rejection_rollback(key, RollbackAction::EndAbility {
                    ability: AbilitySpecHandle(2),
                    activation: key,
                })
                .unwrap();
            key
        };
        drop(outer);
        assert_ne!(outer_key, inner_key);

        let rollbacks = ledger.reject(outer_key);
        assert_eq!(rollbacks.len(), 2);
        assert_eq!(rollbacks[0], stop(1));
        assert_eq!(ledger.status(inner_key), Some(KeyStatus::Rejected));
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn confirmed_key_never_rolls_back() {
        let mut ledger = PredictionLedger::new(NetRole::AutonomousProxy);
        let key = ScopedPredictionWindow::new(&mut ledger, false).key();
        ledger.bind_rejection_rollback(key, stop(3)).unwrap();
        assert!(ledger.confirm(key));
        assert!(ledger.reject(key).is_empty());
        assert_eq!(ledger.status(key), Some(KeyStatus::Confirmed));
    }

    #[test]
    fn rollback_capacity_is_bounded() {
        let mut ledger = PredictionLedger::new(NetRole::AutonomousProxy);
        let key = ScopedPredictionWindow::new(&mut ledger, false).key();
        for _ in 0..GameplayConfig::MAX_ROLLBACKS_PER_KEY {
            ledger.bind_rejection_rollback(key, stop(1)).unwrap();
        }
        assert_eq!(
            ledger.bind_rejection_rollback(key, stop(1)),
            Err(PredictionError::RollbackCapacity(key))
        );
    }

    #[test]
    fn server_keys_are_distinct_and_always_valid() {
        let mut ledger = PredictionLedger::new(NetRole::Authority);
        let window = ScopedPredictionWindow::new(&mut ledger, false);
        assert!(window.key().is_server_generated());
        assert!(window.is_valid_for_more_prediction());
    }
}
