//! Effects currently applied to one owner.

use crate::ability::AbilitySpecHandle;
use crate::prediction::PredictionKey;

use super::{EffectId, EffectSpec};

/// Opaque reference to an active effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEffectHandle(pub u32);

/// One-shot callback run when an effect leaves the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalListener {
    /// Broadcast "cooldown ended" for the ability that applied the cooldown.
    CooldownEnded { ability: AbilitySpecHandle },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveEffect {
    pub handle: ActiveEffectHandle,
    pub spec: EffectSpec,
    /// Seconds left; `None` for infinite effects.
    pub remaining: Option<f32>,
    period_elapsed: f32,
    /// Key this effect was predicted under; cleared when the key is confirmed.
    pub predicted_key: Option<PredictionKey>,
}

impl ActiveEffect {
    pub fn is_predicted(&self) -> bool {
        self.predicted_key.is_some()
    }
}

/// Handles that came due during [`ActiveEffectContainer::advance`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// Periodic effects that must execute once per entry.
    pub periodic: Vec<ActiveEffectHandle>,
    /// Effects whose duration ran out.
    pub expired: Vec<ActiveEffectHandle>,
}

/// Stored (non-instant) effects of one owner.
#[derive(Clone, Debug, Default)]
pub struct ActiveEffectContainer {
    effects: Vec<ActiveEffect>,
    next_handle: u32,
    removal_listeners: Vec<(ActiveEffectHandle, RemovalListener)>,
}

impl ActiveEffectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        spec: EffectSpec,
        duration: Option<f32>,
        predicted_key: Option<PredictionKey>,
    ) -> ActiveEffectHandle {
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = ActiveEffectHandle(self.next_handle);
        self.effects.push(ActiveEffect {
            handle,
            spec,
            remaining: duration,
            period_elapsed: 0.0,
            predicted_key,
        });
        handle
    }

    /// Removes an effect and hands back its pending removal listeners.
    pub fn remove(
        &mut self,
        handle: ActiveEffectHandle,
    ) -> Option<(ActiveEffect, Vec<RemovalListener>)> {
        let index = self.effects.iter().position(|e| e.handle == handle)?;
        let effect = self.effects.remove(index);
        let mut listeners = Vec::new();
        self.removal_listeners.retain(|(h, listener)| {
            if *h == handle {
                listeners.push(*listener);
                false
            } else {
                true
            }
        });
        Some((effect, listeners))
    }

    pub fn get(&self, handle: ActiveEffectHandle) -> Option<&ActiveEffect> {
        self.effects.iter().find(|e| e.handle == handle)
    }

    pub fn contains(&self, handle: ActiveEffectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Seconds left on a timed effect.
    pub fn remaining(&self, handle: ActiveEffectHandle) -> Option<f32> {
        self.get(handle).and_then(|e| e.remaining)
    }

    /// First active effect built from the given definition.
    pub fn find_by_effect(&self, id: &EffectId) -> Option<&ActiveEffect> {
        self.effects.iter().find(|e| &e.spec.def.id == id)
    }

    /// Registers a one-shot listener. Returns false if the handle is not active.
    pub fn add_removal_listener(
        &mut self,
        handle: ActiveEffectHandle,
        listener: RemovalListener,
    ) -> bool {
        if !self.contains(handle) {
            return false;
        }
        self.removal_listeners.push((handle, listener));
        true
    }

    /// Advances timers by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> AdvanceOutcome {
        let mut outcome = AdvanceOutcome::default();
        for effect in self.effects.iter_mut() {
            if let Some(period) = effect.spec.def.period.filter(|p| *p > 0.0) {
                effect.period_elapsed += dt;
                while effect.period_elapsed >= period {
                    effect.period_elapsed -= period;
                    outcome.periodic.push(effect.handle);
                }
            }
            if let Some(remaining) = effect.remaining.as_mut() {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    outcome.expired.push(effect.handle);
                }
            }
        }
        outcome
    }

    /// Effects still waiting on the verdict for `key`.
    pub fn predicted_under(&self, key: PredictionKey) -> Vec<ActiveEffectHandle> {
        self.effects
            .iter()
            .filter(|e| e.predicted_key == Some(key))
            .map(|e| e.handle)
            .collect()
    }

    /// Server accepted `key`: its predicted effects become regular effects.
    pub fn confirm_prediction(&mut self, key: PredictionKey) {
        for effect in self.effects.iter_mut() {
            if effect.predicted_key == Some(key) {
                effect.predicted_key = None;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    pub fn handles(&self) -> Vec<ActiveEffectHandle> {
        self.effects.iter().map(|e| e.handle).collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
