//! Replication link between the server and its clients.
//!
//! Every payload is encoded with `bincode` when sent and decoded when
//! delivered, so only data that survives the wire format reaches the other
//! side. Delivery is in order with a fixed latency in ticks.

use std::collections::VecDeque;

use gameplay_core::{ActorId, NetRequest, ReplicatedState};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    ToServer,
    ToClient,
}

/// What travels over the link for one ability-owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkPayload {
    Request(NetRequest),
    State(ReplicatedState),
}

impl LinkPayload {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request(request) => request.as_str(),
            Self::State(_) => "replicated_state",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub owner: ActorId,
    pub direction: Direction,
    pub payload: LinkPayload,
}

#[derive(Debug)]
struct InFlight {
    deliver_at: u64,
    owner: ActorId,
    direction: Direction,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct NetLink {
    latency_ticks: u64,
    in_flight: VecDeque<InFlight>,
    bytes_sent: u64,
}

impl NetLink {
    pub fn new(latency_ticks: u64) -> Self {
        Self {
            latency_ticks: latency_ticks.max(1),
            ..Self::default()
        }
    }

    pub fn latency_ticks(&self) -> u64 {
        self.latency_ticks
    }

    /// Queues `payload` for delivery at tick `now + latency`.
    pub fn send(
        &mut self,
        now: u64,
        owner: ActorId,
        direction: Direction,
        payload: &LinkPayload,
    ) -> Result<()> {
        let bytes = bincode::serialize(payload)?;
        tracing::trace!(%owner, ?direction, payload = payload.as_str(), size = bytes.len(), "link send");
        self.bytes_sent += bytes.len() as u64;
        self.in_flight.push_back(InFlight {
            deliver_at: now + self.latency_ticks,
            owner,
            direction,
            bytes,
        });
        Ok(())
    }

    /// Removes and decodes every payload due at or before `now`, in send order.
    pub fn deliver(&mut self, now: u64) -> Result<Vec<Delivery>> {
        let mut delivered = Vec::new();
        while let Some(front) = self.in_flight.front() {
            if front.deliver_at > now {
                break;
            }
            let Some(packet) = self.in_flight.pop_front() else {
                break;
            };
            let payload: LinkPayload = bincode::deserialize(&packet.bytes)?;
            delivered.push(Delivery {
                owner: packet.owner,
                direction: packet.direction,
                payload,
            });
        }
        Ok(delivered)
    }

    /// Drops everything queued for or from `owner`.
    pub fn forget(&mut self, owner: ActorId) {
        self.in_flight.retain(|packet| packet.owner != owner);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }
}

#[cfg(test)]
mod tests {
    use gameplay_core::{AbilitySpecHandle, PredictionKey};

    use super::*;

    fn request(n: u32) -> LinkPayload {
        LinkPayload::Request(NetRequest::ServerEndAbility {
            handle: AbilitySpecHandle(n),
            cancelled: false,
        })
    }

    #[test]
    fn payloads_arrive_after_the_latency_in_order() {
        let mut link = NetLink::new(2);
        link.send(0, ActorId(1), Direction::ToServer, &request(1)).unwrap();
        link.send(1, ActorId(1), Direction::ToServer, &request(2)).unwrap();

        assert!(link.deliver(1).unwrap().is_empty());
        let first = link.deliver(2).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].payload, request(1));
        assert_eq!(link.deliver(3).unwrap()[0].payload, request(2));
        assert_eq!(link.in_flight(), 0);
        assert!(link.bytes_sent() > 0);
    }

    #[test]
    fn zero_latency_still_takes_a_tick() {
        let mut link = NetLink::new(0);
        link.send(5, ActorId(1), Direction::ToClient, &request(1)).unwrap();
        assert!(link.deliver(5).unwrap().is_empty());
        assert_eq!(link.deliver(6).unwrap().len(), 1);
    }

    #[test]
    fn verdicts_and_state_survive_the_wire() {
        let mut link = NetLink::new(1);
        let verdict = LinkPayload::Request(NetRequest::ClientKeyVerdict {
            key: PredictionKey(7),
            accepted: false,
        });
        let state = LinkPayload::State(ReplicatedState::default());
        link.send(0, ActorId(4), Direction::ToClient, &verdict).unwrap();
        link.send(0, ActorId(4), Direction::ToClient, &state).unwrap();
        link.send(0, ActorId(5), Direction::ToClient, &state).unwrap();
        link.forget(ActorId(5));

        let delivered: Vec<_> = link.deliver(1).unwrap().into_iter().map(|d| d.payload).collect();
        assert_eq!(delivered, vec![verdict, state]);
    }
}
