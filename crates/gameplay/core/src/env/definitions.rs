//! Ability and effect definitions looked up by id.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ability::{AbilityDef, AbilityId};
use crate::effect::{EffectDef, EffectId};

/// Resolves definition ids to shared definitions.
pub trait DefinitionOracle: Send + Sync {
    fn ability(&self, id: &AbilityId) -> Option<Arc<AbilityDef>>;

    fn effect(&self, id: &EffectId) -> Option<Arc<EffectDef>>;
}

/// In-memory definition table.
#[derive(Clone, Debug, Default)]
pub struct DefinitionTable {
    abilities: BTreeMap<AbilityId, Arc<AbilityDef>>,
    effects: BTreeMap<EffectId, Arc<EffectDef>>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an ability, replacing any previous definition with the same id.
    pub fn insert_ability(&mut self, def: AbilityDef) -> Arc<AbilityDef> {
        let def = Arc::new(def);
        self.abilities.insert(def.id.clone(), Arc::clone(&def));
        def
    }

    /// Registers an effect, replacing any previous definition with the same id.
    pub fn insert_effect(&mut self, def: EffectDef) -> Arc<EffectDef> {
        let def = Arc::new(def);
        self.effects.insert(def.id.clone(), Arc::clone(&def));
        def
    }

    pub fn abilities(&self) -> impl Iterator<Item = &Arc<AbilityDef>> {
        self.abilities.values()
    }

    pub fn effects(&self) -> impl Iterator<Item = &Arc<EffectDef>> {
        self.effects.values()
    }
}

impl DefinitionOracle for DefinitionTable {
    fn ability(&self, id: &AbilityId) -> Option<Arc<AbilityDef>> {
        self.abilities.get(id).cloned()
    }

    fn effect(&self, id: &EffectId) -> Option<Arc<EffectDef>> {
        self.effects.get(id).cloned()
    }
}
