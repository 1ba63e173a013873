//! Death lifecycle of one ability-owner.
//!
//! `NotDead -> DeathStarted -> DeathFinished`, terminal until [`reset`].
//! Clients drive the machine predictively from their death ability and
//! reconcile against the server's [`ReplicatedDeathState`]. Every respawn
//! bumps a life generation so replication from a previous life can be told
//! apart from a server that is merely behind.
//!
//! [`reset`]: HealthComponent::reset

use crate::tags::{GameplayTag, TagCountContainer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeathState {
    #[default]
    NotDead,
    DeathStarted,
    DeathFinished,
}

/// Death state as replicated from the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplicatedDeathState {
    pub generation: u32,
    pub state: DeathState,
}

/// A transition performed by the component, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathTransition {
    Started { generation: u32 },
    Finished { generation: u32 },
    Reset { generation: u32 },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealthComponent {
    state: DeathState,
    generation: u32,
}

impl HealthComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DeathState {
        self.state
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_dead_or_dying(&self) -> bool {
        self.state != DeathState::NotDead
    }

    pub fn replicated(&self) -> ReplicatedDeathState {
        ReplicatedDeathState {
            generation: self.generation,
            state: self.state,
        }
    }

    /// No-op unless alive.
    pub fn start_death(&mut self, tags: &mut TagCountContainer) -> Option<DeathTransition> {
        if self.state != DeathState::NotDead {
            return None;
        }
        self.state = DeathState::DeathStarted;
        tags.set_count(GameplayTag::StateDying, 1);
        Some(DeathTransition::Started {
            generation: self.generation,
        })
    }

    /// No-op unless dying.
    pub fn finish_death(&mut self, tags: &mut TagCountContainer) -> Option<DeathTransition> {
        if self.state != DeathState::DeathStarted {
            return None;
        }
        self.state = DeathState::DeathFinished;
        tags.set_count(GameplayTag::StateDead, 1);
        Some(DeathTransition::Finished {
            generation: self.generation,
        })
    }

    /// Starts a new life: clears the death tags and bumps the generation.
    pub fn reset(&mut self, tags: &mut TagCountContainer) -> DeathTransition {
        self.enter_generation(self.generation.wrapping_add(1), tags)
    }

    /// Brings the local state in line with the server's.
    ///
    /// * Older generation: stale replication, ignored.
    /// * Newer generation: the server already respawned us; reset, then replay.
    /// * Same generation, server behind: keep the local state, it will catch up.
    /// * Same generation, server ahead: replay the missing transitions in order.
    pub fn reconcile(
        &mut self,
        server: ReplicatedDeathState,
        tags: &mut TagCountContainer,
    ) -> Vec<DeathTransition> {
        let mut transitions = Vec::new();
        if server.generation < self.generation {
            tracing::debug!(
                local = self.generation,
                server = server.generation,
                "ignoring death state from a previous life"
            );
            return transitions;
        }
        if server.generation > self.generation {
            transitions.push(self.enter_generation(server.generation, tags));
        }
        if server.state < self.state {
            tracing::warn!(
                local = ?self.state,
                server = ?server.state,
                "server death state is behind the local prediction; keeping local state"
            );
            return transitions;
        }
        if self.state == DeathState::NotDead && server.state > DeathState::NotDead {
            transitions.extend(self.start_death(tags));
        }
        if self.state == DeathState::DeathStarted && server.state == DeathState::DeathFinished {
            transitions.extend(self.finish_death(tags));
        }
        transitions
    }

    fn enter_generation(&mut self, generation: u32, tags: &mut TagCountContainer) -> DeathTransition {
        self.generation = generation;
        self.state = DeathState::NotDead;
        tags.set_count(GameplayTag::StateDying, 0);
        tags.set_count(GameplayTag::StateDead, 0);
        DeathTransition::Reset { generation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagSet;

    fn replicated(generation: u32, state: DeathState) -> ReplicatedDeathState {
        ReplicatedDeathState { generation, state }
    }

    #[test]
    fn transitions_are_one_way() {
        let mut tags = TagCountContainer::new();
        let mut health = HealthComponent::new();
        assert_eq!(health.finish_death(&mut tags), None);
        assert!(health.start_death(&mut tags).is_some());
        assert_eq!(health.start_death(&mut tags), None);
        assert!(health.finish_death(&mut tags).is_some());
        assert!(tags.has_all(TagSet::DEAD_OR_DYING));
    }

    #[test]
    fn server_ahead_is_replayed_in_order() {
        let mut tags = TagCountContainer::new();
        let mut health = HealthComponent::new();
        let transitions = health.reconcile(replicated(0, DeathState::DeathFinished), &mut tags);
        assert_eq!(
            transitions,
            vec![
                DeathTransition::Started { generation: 0 },
                DeathTransition::Finished { generation: 0 },
            ]
        );
        assert_eq!(tags.count(GameplayTag::StateDying), 1);
        assert_eq!(tags.count(GameplayTag::StateDead), 1);
    }

    #[test]
    fn server_behind_keeps_local_prediction() {
        let mut tags = TagCountContainer::new();
        let mut health = HealthComponent::new();
        health.start_death(&mut tags);
        assert!(
            health
                .reconcile(replicated(0, DeathState::NotDead), &mut tags)
                .is_empty()
        );
        assert_eq!(health.state(), DeathState::DeathStarted);
    }

    #[test]
    fn newer_generation_resets_before_replay() {
        let mut tags = TagCountContainer::new();
        let mut health = HealthComponent::new();
        health.start_death(&mut tags);
        health.finish_death(&mut tags);

        let transitions = health.reconcile(replicated(1, DeathState::NotDead), &mut tags);
        assert_eq!(transitions, vec![DeathTransition::Reset { generation: 1 }]);
        assert!(!tags.has_any(TagSet::DEAD_OR_DYING));

        // A late packet from the previous life changes nothing.
        assert!(
            health
                .reconcile(replicated(0, DeathState::DeathFinished), &mut tags)
                .is_empty()
        );
        assert_eq!(health.state(), DeathState::NotDead);
    }
}
