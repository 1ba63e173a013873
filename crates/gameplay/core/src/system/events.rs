//! Gameplay events and attribute notifications.

use crate::ability::GameplayEventData;
use crate::attribute::{Attribute, AttributeEvent, ChangeCause};
use crate::env::GameplayEnv;
use crate::health::DeathTransition;
use crate::message::MessageKind;
use crate::net::NetRole;
use crate::prediction::ScopedPredictionWindow;
use crate::tags::GameplayTag;

use super::AbilitySystem;

impl AbilitySystem {
    /// Delivers a gameplay event to this owner.
    ///
    /// Abilities parked on `tag` resume first, then inactive abilities
    /// triggered by `tag` try to activate. Returns how many activated.
    pub fn handle_gameplay_event(
        &mut self,
        tag: GameplayTag,
        payload: GameplayEventData,
        env: &GameplayEnv<'_>,
    ) -> usize {
        let activated = self.dispatch_event(tag, payload, env);
        self.flush(env);
        activated
    }

    pub(crate) fn dispatch_event(
        &mut self,
        tag: GameplayTag,
        payload: GameplayEventData,
        env: &GameplayEnv<'_>,
    ) -> usize {
        let waiting: Vec<_> = self
            .specs
            .iter()
            .filter(|spec| spec.is_active() && spec.instance.awaits_event(tag))
            .map(|spec| spec.handle)
            .collect();
        for handle in waiting {
            if let Some(spec) = self.spec_mut(handle) {
                spec.instance.clear_continuation();
            }
            self.resume_on_event(handle, tag, payload, env);
        }

        let role = self.role;
        let triggered: Vec<_> = self
            .specs
            .iter()
            .filter(|spec| spec.def.trigger_event == Some(tag) && !spec.is_active())
            .filter(|spec| match role {
                NetRole::Authority => spec.def.net_execution.runs_on_server(),
                NetRole::AutonomousProxy => spec.def.net_execution.runs_locally_first(),
                NetRole::SimulatedProxy => false,
            })
            .map(|spec| spec.handle)
            .collect();

        let mut activated = 0;
        for handle in triggered {
            match self.try_activate_internal(handle, Some(payload), env) {
                Ok(()) => activated += 1,
                Err(failure) => {
                    tracing::debug!(owner = %self.owner, %handle, %failure, tag = tag.name(), "triggered ability did not activate");
                }
            }
        }
        activated
    }

    /// Turns queued attribute events into messages and reactions.
    ///
    /// Reactions may change attributes again, so the queue is drained until
    /// it stays empty. Re-entrant calls return immediately.
    pub(crate) fn flush(&mut self, env: &GameplayEnv<'_>) {
        if self.flushing {
            return;
        }
        self.flushing = true;
        loop {
            let events = self.attributes.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.on_attribute_event(event, env);
            }
        }
        self.flushing = false;
    }

    fn on_attribute_event(&mut self, event: AttributeEvent, env: &GameplayEnv<'_>) {
        match event {
            AttributeEvent::Changed {
                attribute,
                old,
                new,
                cause,
            } => self.push_message(MessageKind::AttributeChanged {
                attribute,
                old,
                new,
                instigator: cause.instigator,
                effect: cause.effect,
            }),
            AttributeEvent::Folded {
                meta: Attribute::Damage,
                magnitude,
                cause,
            } => {
                self.push_message(MessageKind::DamageTaken {
                    instigator: cause.instigator,
                    amount: magnitude,
                });
                self.queue_ultimate_charge(
                    cause.instigator,
                    magnitude,
                    GameplayTag::UltimateChargeFromDamage,
                );
            }
            AttributeEvent::Folded {
                meta: Attribute::Healing,
                magnitude,
                cause,
            } => {
                self.push_message(MessageKind::HealingReceived {
                    instigator: cause.instigator,
                    amount: magnitude,
                });
                self.queue_ultimate_charge(
                    cause.instigator,
                    magnitude,
                    GameplayTag::UltimateChargeFromHealing,
                );
            }
            AttributeEvent::Folded { .. } => {}
            AttributeEvent::OutOfHealth { magnitude, cause } => {
                self.push_message(MessageKind::OutOfHealth {
                    instigator: cause.instigator,
                    causer: cause.causer,
                    magnitude,
                });
                if self.role.is_authority() {
                    self.on_out_of_health(magnitude, &cause, env);
                }
            }
        }
    }

    /// Sends the death event to this owner's own abilities.
    fn on_out_of_health(&mut self, magnitude: f32, cause: &ChangeCause, env: &GameplayEnv<'_>) {
        let payload = GameplayEventData {
            instigator: cause.instigator,
            target: Some(self.owner),
            magnitude,
        };
        let mut window = ScopedPredictionWindow::new(self, false);
        let activated = window.dispatch_event(GameplayTag::EventDeath, payload, env);
        if activated == 0 {
            tracing::debug!(owner = %window.owner, "out of health with no death ability to run");
        }
    }

    /// Reports a death lifecycle transition.
    pub(crate) fn on_death_transition(&mut self, transition: DeathTransition, env: &GameplayEnv<'_>) {
        tracing::debug!(owner = %self.owner, ?transition, "death transition");
        match transition {
            DeathTransition::Started { generation } => {
                self.push_message(MessageKind::DeathStarted { generation });
                self.on_death_started(env);
            }
            DeathTransition::Finished { generation } => {
                self.push_message(MessageKind::DeathFinished { generation });
            }
            DeathTransition::Reset { .. } => {}
        }
    }
}
