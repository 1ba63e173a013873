use std::collections::{BTreeMap, BTreeSet};

use crate::effect::ActiveEffectHandle;

use super::clamp::clamp_range;
use super::{
    Attribute, AttributeEvent, AttributeSetKind, AttributeValue, ChangeCause, Clampable,
    ListenerId, ModOp,
};

/// Temporary modifier contributed by an active effect.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeModifier {
    pub source: ActiveEffectHandle,
    pub op: ModOp,
    pub magnitude: f32,
}

/// Replicated attribute values of one owner.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeSnapshot {
    pub sets: Vec<AttributeSetKind>,
    pub values: Vec<(Attribute, AttributeValue)>,
}

impl AttributeSnapshot {
    pub fn get(&self, attribute: Attribute) -> Option<AttributeValue> {
        self.values
            .iter()
            .find(|(a, _)| *a == attribute)
            .map(|(_, v)| *v)
    }
}

type Listener = Box<dyn FnMut(&AttributeEvent) + Send>;

/// Per-owner attribute values with their clamping pipeline.
///
/// Every modification runs `pre_change` (clamp) before the value is written
/// and `post_change` (cross-attribute fixups, notifications) after. Listeners
/// registered with [`subscribe`](Self::subscribe) see every event as it
/// happens; the same events are also queued for [`take_events`](Self::take_events).
pub struct AttributeStore {
    sets: BTreeSet<AttributeSetKind>,
    values: BTreeMap<Attribute, AttributeValue>,
    modifiers: BTreeMap<Attribute, Vec<AttributeModifier>>,
    ultimate_charge_cap: f32,
    out_of_health: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u32,
    events: Vec<AttributeEvent>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self {
            sets: BTreeSet::new(),
            values: BTreeMap::new(),
            modifiers: BTreeMap::new(),
            ultimate_charge_cap: 0.0,
            out_of_health: false,
            listeners: Vec::new(),
            next_listener: 0,
            events: Vec::new(),
        }
    }

    pub fn with_sets(sets: impl IntoIterator<Item = AttributeSetKind>) -> Self {
        let mut store = Self::new();
        for kind in sets {
            store.add_set(kind);
        }
        store
    }

    // ========================================================================
    // Sets
    // ========================================================================

    /// Registers a set with its default values. Returns false if already present.
    pub fn add_set(&mut self, kind: AttributeSetKind) -> bool {
        if !self.sets.insert(kind) {
            return false;
        }
        for (attribute, value) in kind.defaults() {
            self.values.insert(*attribute, AttributeValue::new(*value));
        }
        if kind == AttributeSetKind::Health {
            self.out_of_health = self.get(Attribute::Health) <= 0.0;
        }
        true
    }

    /// Drops a set and every value and modifier it held.
    pub fn remove_set(&mut self, kind: AttributeSetKind) -> bool {
        if !self.sets.remove(&kind) {
            return false;
        }
        self.values.retain(|attribute, _| attribute.set() != kind);
        self.modifiers.retain(|attribute, _| attribute.set() != kind);
        true
    }

    pub fn has_set(&self, kind: AttributeSetKind) -> bool {
        self.sets.contains(&kind)
    }

    pub fn has_attribute(&self, attribute: Attribute) -> bool {
        self.has_set(attribute.set())
    }

    pub fn sets(&self) -> impl Iterator<Item = AttributeSetKind> + '_ {
        self.sets.iter().copied()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Current value, or 0 when the attribute's set is not registered.
    pub fn get(&self, attribute: Attribute) -> f32 {
        self.values
            .get(&attribute)
            .map(|v| v.current)
            .unwrap_or_default()
    }

    /// Base value, or 0 when the attribute's set is not registered.
    pub fn base(&self, attribute: Attribute) -> f32 {
        self.values
            .get(&attribute)
            .map(|v| v.base)
            .unwrap_or_default()
    }

    pub fn value(&self, attribute: Attribute) -> Option<AttributeValue> {
        self.values.get(&attribute).copied()
    }

    pub fn is_out_of_health(&self) -> bool {
        self.out_of_health
    }

    pub fn ultimate_charge_cap(&self) -> f32 {
        self.ultimate_charge_cap
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Sets the base value through the clamp pipeline. Meta attributes are folded.
    ///
    /// Returns false when the attribute's set is not registered.
    pub fn set_base(&mut self, attribute: Attribute, value: f32, cause: &ChangeCause) -> bool {
        if !self.has_attribute(attribute) {
            return false;
        }
        if attribute.is_meta() {
            self.execute_meta(attribute, value, cause);
            return true;
        }
        self.write_base(attribute, value, cause);
        self.after_change(0.0, cause);
        true
    }

    /// Applies one instant modifier to the base value.
    pub fn apply_instant(
        &mut self,
        attribute: Attribute,
        op: ModOp,
        magnitude: f32,
        cause: &ChangeCause,
    ) -> bool {
        if attribute.is_meta() {
            if !self.has_attribute(attribute) {
                return false;
            }
            self.execute_meta(attribute, op.apply(0.0, magnitude), cause);
            return true;
        }
        let next = op.apply(self.base(attribute), magnitude);
        self.set_base(attribute, next, cause)
    }

    /// Changes the upper bound of UltimateCharge and re-clamps the charge.
    pub fn set_ultimate_charge_cap(&mut self, cap: f32) {
        self.ultimate_charge_cap = cap.max(0.0);
        if self.has_set(AttributeSetKind::Ultimate) {
            let base = self.base(Attribute::UltimateCharge);
            self.write_base(Attribute::UltimateCharge, base, &ChangeCause::none());
        }
    }

    /// Adds a temporary modifier and re-aggregates the attribute.
    pub fn add_modifier(
        &mut self,
        attribute: Attribute,
        modifier: AttributeModifier,
        cause: &ChangeCause,
    ) -> bool {
        if !self.has_attribute(attribute) || attribute.is_meta() {
            return false;
        }
        self.modifiers.entry(attribute).or_default().push(modifier);
        self.recompute(attribute, cause);
        self.after_change(0.0, cause);
        true
    }

    /// Removes every modifier contributed by `source`.
    pub fn remove_modifiers(&mut self, source: ActiveEffectHandle, cause: &ChangeCause) {
        let mut touched = Vec::new();
        for (attribute, mods) in self.modifiers.iter_mut() {
            let before = mods.len();
            mods.retain(|m| m.source != source);
            if mods.len() != before {
                touched.push(*attribute);
            }
        }
        self.modifiers.retain(|_, mods| !mods.is_empty());
        for attribute in touched {
            self.recompute(attribute, cause);
        }
        self.after_change(0.0, cause);
    }

    /// Writes `magnitude` into a meta attribute, folds it into the stateful
    /// attributes and resets the meta attribute to 0.
    ///
    /// Returns the magnitude actually folded after clamping.
    pub fn execute_meta(&mut self, meta: Attribute, magnitude: f32, cause: &ChangeCause) -> f32 {
        if !meta.is_meta() || !self.has_attribute(meta) {
            return 0.0;
        }
        let mut amount = magnitude;
        self.pre_change(meta, &mut amount);
        self.values.insert(meta, AttributeValue::new(amount));

        match meta {
            Attribute::Damage => {
                let absorbed = amount.min(self.get(Attribute::Overhealth));
                if absorbed > 0.0 {
                    let over = self.base(Attribute::Overhealth) - absorbed;
                    self.write_base(Attribute::Overhealth, over, cause);
                }
                let remainder = amount - absorbed;
                if remainder > 0.0 {
                    let health = self.base(Attribute::Health) - remainder;
                    self.write_base(Attribute::Health, health, cause);
                }
            }
            Attribute::Healing => {
                let health = self.base(Attribute::Health) + amount;
                self.write_base(Attribute::Health, health, cause);
            }
            Attribute::OverhealthDecay => {
                let over = self.base(Attribute::Overhealth) - amount;
                self.write_base(Attribute::Overhealth, over, cause);
            }
            _ => {}
        }

        self.values.insert(meta, AttributeValue::new(0.0));
        if amount > 0.0 {
            self.emit(AttributeEvent::Folded {
                meta,
                magnitude: amount,
                cause: cause.clone(),
            });
        }
        self.after_change(amount, cause);
        amount
    }

    /// Overwrites values with the server's, bypassing clamps.
    ///
    /// Sets present in the snapshot but missing locally are registered first.
    pub fn apply_replicated(&mut self, snapshot: &AttributeSnapshot) {
        for kind in &snapshot.sets {
            self.add_set(*kind);
        }
        let cause = ChangeCause::none();
        for (attribute, value) in &snapshot.values {
            if attribute.is_meta() || !self.has_attribute(*attribute) {
                continue;
            }
            let old = self.get(*attribute);
            self.values.insert(*attribute, *value);
            if old != value.current {
                self.emit(AttributeEvent::Changed {
                    attribute: *attribute,
                    old,
                    new: value.current,
                    cause: cause.clone(),
                });
            }
        }
        self.after_change(0.0, &cause);
    }

    pub fn snapshot(&self) -> AttributeSnapshot {
        AttributeSnapshot {
            sets: self.sets.iter().copied().collect(),
            values: self
                .values
                .iter()
                .filter(|(attribute, _)| !attribute.is_meta())
                .map(|(attribute, value)| (*attribute, *value))
                .collect(),
        }
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&AttributeEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Drains the queued events.
    pub fn take_events(&mut self) -> Vec<AttributeEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    fn write_base(&mut self, attribute: Attribute, value: f32, cause: &ChangeCause) {
        let mut value = value;
        self.pre_base_change(attribute, &mut value);
        let Some(entry) = self.values.get_mut(&attribute) else {
            return;
        };
        entry.base = value;
        self.recompute(attribute, cause);
    }

    fn recompute(&mut self, attribute: Attribute, cause: &ChangeCause) {
        let Some(entry) = self.values.get(&attribute).copied() else {
            return;
        };
        let mut next = aggregate(entry.base, self.modifiers.get(&attribute));
        self.pre_change(attribute, &mut next);
        if next == entry.current {
            return;
        }
        if let Some(value) = self.values.get_mut(&attribute) {
            value.current = next;
        }
        self.post_change(attribute, entry.current, next, cause);
    }

    fn post_change(&mut self, attribute: Attribute, old: f32, new: f32, cause: &ChangeCause) {
        if !attribute.is_meta() {
            self.emit(AttributeEvent::Changed {
                attribute,
                old,
                new,
                cause: cause.clone(),
            });
        }
        // A shrinking maximum overrides health down to the new maximum.
        if attribute == Attribute::MaxHealth && self.get(Attribute::Health) > new {
            self.write_base(Attribute::Health, new, cause);
        }
    }

    fn after_change(&mut self, magnitude: f32, cause: &ChangeCause) {
        if !self.has_set(AttributeSetKind::Health) {
            return;
        }
        if self.get(Attribute::Health) > 0.0 {
            self.out_of_health = false;
            return;
        }
        if !self.out_of_health {
            self.out_of_health = true;
            self.emit(AttributeEvent::OutOfHealth {
                magnitude,
                cause: cause.clone(),
            });
        }
    }

    fn emit(&mut self, event: AttributeEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
        self.events.push(event);
    }
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("sets", &self.sets)
            .field("values", &self.values)
            .field("modifiers", &self.modifiers)
            .field("out_of_health", &self.out_of_health)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Clampable for AttributeStore {
    fn pre_change(&self, attribute: Attribute, value: &mut f32) {
        use Attribute::*;
        *value = match attribute {
            Health => clamp_range(*value, 0.0, self.get(MaxHealth)),
            MaxHealth => clamp_range(*value, 1.0, f32::INFINITY),
            Overhealth | DamageBoost | Lives | MaxWalkSpeed | JumpVelocity | GravityScale => {
                clamp_range(*value, 0.0, f32::INFINITY)
            }
            Damage => clamp_range(*value, 0.0, self.get(Health) + self.get(Overhealth)),
            Healing => clamp_range(*value, 0.0, self.get(MaxHealth) - self.get(Health)),
            OverhealthDecay => clamp_range(*value, 0.0, self.get(Overhealth)),
            DamageResistance => clamp_range(*value, 0.0, 1.0),
            UltimateCharge => clamp_range(*value, 0.0, self.ultimate_charge_cap),
        };
    }
}

/// Override wins (last one), otherwise `(base + Σadd) × Πmultiply`.
fn aggregate(base: f32, modifiers: Option<&Vec<AttributeModifier>>) -> f32 {
    let Some(modifiers) = modifiers else {
        return base;
    };
    if let Some(last) = modifiers.iter().rev().find(|m| m.op == ModOp::Override) {
        return last.magnitude;
    }
    let added: f32 = modifiers
        .iter()
        .filter(|m| m.op == ModOp::Add)
        .map(|m| m.magnitude)
        .sum();
    let multiplied: f32 = modifiers
        .iter()
        .filter(|m| m.op == ModOp::Multiply)
        .map(|m| m.magnitude)
        .product();
    (base + added) * multiplied
}
