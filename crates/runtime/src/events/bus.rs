//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use gameplay_core::{GameplayMessage, MessageKind};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{Peer, PlayerEvent, TeamEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Grants, activations, ends, failures and montages
    Ability,
    /// Attribute changes, damage and healing
    Attribute,
    /// Death, respawn, reset and player initialization
    Lifecycle,
    /// Team assignment and team lives
    Team,
    /// Cooldown start and end
    Cooldown,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Ability,
        Topic::Attribute,
        Topic::Lifecycle,
        Topic::Team,
        Topic::Cooldown,
    ];

    pub fn of_message(kind: &MessageKind) -> Self {
        match kind {
            MessageKind::AbilityGranted { .. }
            | MessageKind::AbilityRemoved { .. }
            | MessageKind::AbilityActivated { .. }
            | MessageKind::AbilityEnded { .. }
            | MessageKind::ActivationFailed { .. }
            | MessageKind::MontagePlayed { .. }
            | MessageKind::MontageStopped { .. } => Topic::Ability,
            MessageKind::CooldownStarted { .. } | MessageKind::CooldownEnded { .. } => {
                Topic::Cooldown
            }
            MessageKind::AttributeChanged { .. }
            | MessageKind::DamageTaken { .. }
            | MessageKind::HealingReceived { .. }
            | MessageKind::OutOfHealth { .. } => Topic::Attribute,
            MessageKind::DeathStarted { .. }
            | MessageKind::DeathFinished { .. }
            | MessageKind::PlayerReset
            | MessageKind::RespawnStarted { .. }
            | MessageKind::RespawnCompleted
            | MessageKind::RespawnFailed => Topic::Lifecycle,
        }
    }
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Gameplay { peer: Peer, message: GameplayMessage },
    Team(TeamEvent),
    Player(PlayerEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Gameplay { message, .. } => Topic::of_message(&message.kind),
            Event::Team(_) => Topic::Team,
            Event::Player(_) => Topic::Lifecycle,
        }
    }
}

/// Topic-based event bus
///
/// Channels are created for every topic up front and never change, so
/// publishing and subscribing need no locking.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .iter()
            .map(|&topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic gets a channel in `with_capacity`.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels
            .get(&topic)
            .map_or(0, |tx| tx.receiver_count())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use gameplay_core::ActorId;

    use super::*;

    fn message(kind: MessageKind) -> Event {
        Event::Gameplay {
            peer: Peer::Server,
            message: GameplayMessage::new(ActorId(1), kind),
        }
    }

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut lifecycle = bus.subscribe(Topic::Lifecycle);
        let mut attributes = bus.subscribe(Topic::Attribute);

        bus.publish(message(MessageKind::DeathStarted { generation: 0 }));
        bus.publish(message(MessageKind::DamageTaken {
            instigator: None,
            amount: 5.0,
        }));

        let Event::Gameplay { message, .. } = lifecycle.recv().await.unwrap() else {
            panic!("expected a gameplay message");
        };
        assert_eq!(message.kind, MessageKind::DeathStarted { generation: 0 });
        assert!(lifecycle.try_recv().is_err());
        assert_eq!(attributes.recv().await.unwrap().topic(), Topic::Attribute);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::with_capacity(0);
        assert_eq!(bus.subscriber_count(Topic::Team), 0);
        bus.publish(message(MessageKind::RespawnCompleted));

        let subscriptions = bus.subscribe_multiple(&[Topic::Team, Topic::Cooldown]);
        assert_eq!(subscriptions.len(), 2);
        assert_eq!(bus.subscriber_count(Topic::Team), 1);
    }
}
