//! Input-driven activation.
//!
//! Presses and releases are recorded as they arrive and processed once per
//! frame by [`AbilitySystem::process_input`].

use crate::ability::{AbilitySpecHandle, ActivationMethod};
use crate::env::GameplayEnv;
use crate::tags::{InputTag, TagSet};

use super::AbilitySystem;

impl AbilitySystem {
    pub fn ability_input_pressed(&mut self, input: InputTag) {
        self.inputs_pressed.push(input);
        self.inputs_held.insert(input);
        for spec in self.specs.iter_mut().filter(|spec| spec.input_tag == Some(input)) {
            spec.input_pressed = true;
        }
    }

    pub fn ability_input_released(&mut self, input: InputTag) {
        self.inputs_released.push(input);
        self.inputs_held.remove(&input);
        for spec in self.specs.iter_mut().filter(|spec| spec.input_tag == Some(input)) {
            spec.input_pressed = false;
        }
    }

    /// Activates and ends abilities for the input recorded since the last call.
    ///
    /// Held inputs keep trying `WhileInputActive` abilities, fresh presses
    /// trigger `OnInputTriggered` ones and releases end running
    /// `WhileInputActive` abilities. Everything is dropped while input is blocked.
    pub fn process_input(&mut self, env: &GameplayEnv<'_>) {
        if self.tags.has_any(TagSet::INPUT_BLOCKED) {
            self.clear_ability_input();
            return;
        }

        let mut to_activate: Vec<AbilitySpecHandle> = Vec::new();
        for spec in &self.specs {
            let Some(input) = spec.input_tag else {
                continue;
            };
            if spec.is_active() {
                continue;
            }
            let wanted = match spec.def.activation_method {
                ActivationMethod::WhileInputActive => self.inputs_held.contains(&input),
                ActivationMethod::OnInputTriggered => self.inputs_pressed.contains(&input),
                ActivationMethod::Passive => false,
            };
            if wanted && !to_activate.contains(&spec.handle) {
                to_activate.push(spec.handle);
            }
        }
        for handle in to_activate {
            if let Err(failure) = self.try_activate_internal(handle, None, env) {
                tracing::trace!(owner = %self.owner, %handle, %failure, "input activation refused");
            }
        }

        let to_end: Vec<_> = self
            .specs
            .iter()
            .filter(|spec| {
                spec.is_active()
                    && spec.def.activation_method == ActivationMethod::WhileInputActive
                    && spec
                        .input_tag
                        .is_some_and(|input| self.inputs_released.contains(&input))
                    && !spec.input_pressed
            })
            .map(|spec| spec.handle)
            .collect();
        for handle in to_end {
            self.end_internal(handle, true, false, env);
        }

        self.inputs_pressed.clear();
        self.inputs_released.clear();
        self.flush(env);
    }

    /// Forgets every pressed, released and held input.
    pub fn clear_ability_input(&mut self) {
        self.inputs_pressed.clear();
        self.inputs_released.clear();
        self.inputs_held.clear();
        for spec in self.specs.iter_mut() {
            spec.input_pressed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::ability::{AbilityDef, ActivationMethod};
    use crate::system::test_support::{World, server};
    use crate::tags::{GameplayTag, InputTag};

    #[test]
    fn held_input_runs_while_pressed() {
        let world = World::new();
        let env = world.env();
        let mut system = server(&world);
        let block = system
            .give_ability(
                Arc::new(
                    AbilityDef::new("ga.block")
                        .with_input(InputTag::Secondary)
                        .with_activation_method(ActivationMethod::WhileInputActive),
                ),
                1,
                None,
                &env,
            )
            .unwrap();

        system.ability_input_pressed(InputTag::Secondary);
        system.process_input(&env);
        assert!(system.is_active(block));

        system.process_input(&env);
        assert!(system.is_active(block));

        system.ability_input_released(InputTag::Secondary);
        system.process_input(&env);
        assert!(!system.is_active(block));
    }

    #[test]
    fn pressed_input_triggers_once() {
        let world = World::new();
        let env = world.env();
        let mut system = server(&world);
        let jab = system
            .give_ability(
                Arc::new(AbilityDef::new("ga.jab").with_input(InputTag::Primary)),
                1,
                None,
                &env,
            )
            .unwrap();
        system.ability_input_pressed(InputTag::Primary);
        system.process_input(&env);
        assert!(system.is_active(jab));
        system.end_ability(jab, &env);

        // Still held, but no new press.
        system.process_input(&env);
        assert!(!system.is_active(jab));
    }

    #[test]
    fn blocked_input_is_discarded() {
        let world = World::new();
        let env = world.env();
        let mut system = server(&world);
        let jab = system
            .give_ability(
                Arc::new(AbilityDef::new("ga.jab").with_input(InputTag::Primary)),
                1,
                None,
                &env,
            )
            .unwrap();
        system.add_loose_tag(GameplayTag::AbilityInputBlocked);
        system.ability_input_pressed(InputTag::Primary);
        system.process_input(&env);
        assert!(!system.is_active(jab));

        system.remove_loose_tag(GameplayTag::AbilityInputBlocked);
        system.process_input(&env);
        assert!(!system.is_active(jab));
    }
}
