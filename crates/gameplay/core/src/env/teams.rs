//! Team membership and the damage/healing permissions derived from it.

use std::collections::BTreeMap;

use crate::ids::{ActorId, TeamId};

/// Result of comparing the teams of two actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TeamComparison {
    SameTeam,
    DifferentTeams,
    /// At least one actor has no team.
    InvalidArgument,
}

/// Provides team assignment for actors.
pub trait TeamOracle: Send + Sync {
    fn team_of(&self, actor: ActorId) -> Option<TeamId>;

    fn compare(&self, a: ActorId, b: ActorId) -> TeamComparison {
        match (self.team_of(a), self.team_of(b)) {
            (Some(ta), Some(tb)) if ta == tb => TeamComparison::SameTeam,
            (Some(_), Some(_)) => TeamComparison::DifferentTeams,
            _ => TeamComparison::InvalidArgument,
        }
    }

    /// Enemies can be damaged, and so can teamless targets when the
    /// instigator belongs to a team.
    fn can_cause_damage(&self, instigator: ActorId, target: ActorId) -> bool {
        match self.compare(instigator, target) {
            TeamComparison::DifferentTeams => true,
            TeamComparison::SameTeam => false,
            TeamComparison::InvalidArgument => {
                self.team_of(instigator).is_some() && self.team_of(target).is_none()
            }
        }
    }

    fn can_cause_healing(&self, instigator: ActorId, target: ActorId) -> bool {
        self.compare(instigator, target) == TeamComparison::SameTeam
    }
}

/// Fixed actor-to-team map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeamTable {
    members: BTreeMap<ActorId, TeamId>,
}

impl TeamTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, actor: ActorId, team: TeamId) -> Self {
        self.members.insert(actor, team);
        self
    }

    /// Assigns `actor` to `team`, returning the previous team.
    pub fn assign(&mut self, actor: ActorId, team: TeamId) -> Option<TeamId> {
        self.members.insert(actor, team)
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<TeamId> {
        self.members.remove(&actor)
    }

    pub fn members_of(&self, team: TeamId) -> impl Iterator<Item = ActorId> + '_ {
        self.members
            .iter()
            .filter(move |(_, t)| **t == team)
            .map(|(actor, _)| *actor)
    }
}

impl TeamOracle for TeamTable {
    fn team_of(&self, actor: ActorId) -> Option<TeamId> {
        self.members.get(&actor).copied()
    }
}
