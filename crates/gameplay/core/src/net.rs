//! Network roles, execution policies and the requests one ability system sends
//! to its counterpart on the other side of the replication link.
//!
//! The core never touches a socket. Each [`AbilitySystem`](crate::AbilitySystem)
//! queues [`NetRequest`]s in an outbox that the runtime drains and delivers to
//! the peer owning the same ability-owner.

use crate::ability::{AbilityId, AbilitySpecHandle, GameplayEventData};
use crate::ids::ActorId;
use crate::prediction::PredictionKey;
use crate::tags::InputTag;

/// Connection role of the machine an ability system runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetRole {
    /// Server copy; the canonical state.
    Authority,
    /// Copy on the client that controls this owner; may predict.
    AutonomousProxy,
    /// Copy on every other client; only mirrors replicated state.
    SimulatedProxy,
}

impl NetRole {
    pub const fn is_authority(self) -> bool {
        matches!(self, Self::Authority)
    }

    /// True when input for this owner originates on this machine.
    pub const fn is_locally_controlled(self) -> bool {
        matches!(self, Self::AutonomousProxy)
    }
}

/// Where an ability is allowed to run and who starts it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetExecutionPolicy {
    /// Runs immediately on the owning client under a prediction key, then on the server.
    #[default]
    LocalPredicted,
    /// Runs only on the owning client.
    LocalOnly,
    /// Started by the server, mirrored to the owning client.
    ServerInitiated,
    /// Runs only on the server.
    ServerOnly,
}

impl NetExecutionPolicy {
    /// True if the ability may start on a client without asking the server.
    pub const fn runs_locally_first(self) -> bool {
        matches!(self, Self::LocalPredicted | Self::LocalOnly)
    }

    /// True if the server runs this ability at all.
    pub const fn runs_on_server(self) -> bool {
        !matches!(self, Self::LocalOnly)
    }

    /// True if the owning client runs this ability at all.
    pub const fn runs_on_client(self) -> bool {
        !matches!(self, Self::ServerOnly)
    }
}

/// Messages exchanged between the server and client copies of one ability-owner.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetRequest {
    // ========================================================================
    // Client -> server
    // ========================================================================
    /// Client asks the server to run an ability it may already be predicting.
    ServerTryActivate {
        handle: AbilitySpecHandle,
        key: Option<PredictionKey>,
        payload: Option<GameplayEventData>,
    },
    /// Client ended a predicted ability.
    ServerEndAbility {
        handle: AbilitySpecHandle,
        cancelled: bool,
    },
    /// Client resolved targets for an ability waiting on target data.
    ServerSetTargetData {
        handle: AbilitySpecHandle,
        key: Option<PredictionKey>,
        targets: Vec<ActorId>,
    },

    // ========================================================================
    // Server -> client
    // ========================================================================
    /// Server granted an ability; the client mirrors the spec with the same handle.
    ClientGiveAbility {
        handle: AbilitySpecHandle,
        ability: AbilityId,
        level: u32,
        input_tag: Option<InputTag>,
    },
    /// Server removed an ability.
    ClientRemoveAbility { handle: AbilitySpecHandle },
    /// Server started an ability the client should run as well.
    ClientActivateAbility {
        handle: AbilitySpecHandle,
        key: PredictionKey,
        payload: Option<GameplayEventData>,
    },
    /// Server accepted or rejected a client prediction key.
    ClientKeyVerdict { key: PredictionKey, accepted: bool },
    /// Server ended or cancelled an ability the client is running.
    ClientEndAbility {
        handle: AbilitySpecHandle,
        cancelled: bool,
    },
    /// Server re-initialized the avatar (respawn or reset) and started life `generation`.
    ClientResetAvatar { generation: u32 },
}

impl NetRequest {
    /// True for requests that travel from client to server.
    pub const fn is_server_bound(&self) -> bool {
        matches!(
            self,
            Self::ServerTryActivate { .. }
                | Self::ServerEndAbility { .. }
                | Self::ServerSetTargetData { .. }
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ServerTryActivate { .. } => "server_try_activate",
            Self::ServerEndAbility { .. } => "server_end_ability",
            Self::ServerSetTargetData { .. } => "server_set_target_data",
            Self::ClientGiveAbility { .. } => "client_give_ability",
            Self::ClientRemoveAbility { .. } => "client_remove_ability",
            Self::ClientActivateAbility { .. } => "client_activate_ability",
            Self::ClientKeyVerdict { .. } => "client_key_verdict",
            Self::ClientEndAbility { .. } => "client_end_ability",
            Self::ClientResetAvatar { .. } => "client_reset_avatar",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_placement() {
        assert!(NetExecutionPolicy::LocalPredicted.runs_locally_first());
        assert!(NetExecutionPolicy::LocalPredicted.runs_on_server());
        assert!(!NetExecutionPolicy::LocalOnly.runs_on_server());
        assert!(!NetExecutionPolicy::ServerOnly.runs_on_client());
        assert!(!NetExecutionPolicy::ServerInitiated.runs_locally_first());
    }

    #[test]
    fn request_direction() {
        let up = NetRequest::ServerEndAbility {
            handle: AbilitySpecHandle(1),
            cancelled: false,
        };
        let down = NetRequest::ClientKeyVerdict {
            key: PredictionKey(4),
            accepted: true,
        };
        assert!(up.is_server_bound());
        assert!(!down.is_server_bound());
        assert_eq!(down.as_str(), "client_key_verdict");
    }
}
