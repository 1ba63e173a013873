//! Team registry with balanced assignment.

use gameplay_core::{ActorId, TeamId, TeamOracle, TeamTable};

/// Teams of one session.
///
/// New members join the team with the fewest members, lowest id first.
#[derive(Debug, Clone)]
pub struct TeamRegistry {
    table: TeamTable,
    team_count: u8,
}

impl TeamRegistry {
    pub fn new(team_count: u8) -> Self {
        Self {
            table: TeamTable::new(),
            team_count: team_count.max(1),
        }
    }

    pub fn team_count(&self) -> u8 {
        self.team_count
    }

    /// Assigns `actor` to the smallest team and returns it with the previous team.
    ///
    /// An actor that already has a team keeps it.
    pub fn assign_balanced(&mut self, actor: ActorId) -> (TeamId, Option<TeamId>) {
        if let Some(team) = self.table.team_of(actor) {
            return (team, Some(team));
        }
        let team = (0..self.team_count)
            .map(TeamId)
            .min_by_key(|team| (self.member_count(*team), *team))
            .unwrap_or(TeamId(0));
        (team, self.table.assign(actor, team))
    }

    /// Moves `actor` to `team`, returning its previous team.
    pub fn assign(&mut self, actor: ActorId, team: TeamId) -> Option<TeamId> {
        self.table.assign(actor, team)
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<TeamId> {
        self.table.remove(actor)
    }

    pub fn members_of(&self, team: TeamId) -> Vec<ActorId> {
        self.table.members_of(team).collect()
    }

    pub fn member_count(&self, team: TeamId) -> usize {
        self.table.members_of(team).count()
    }
}

impl TeamOracle for TeamRegistry {
    fn team_of(&self, actor: ActorId) -> Option<TeamId> {
        self.table.team_of(actor)
    }
}

#[cfg(test)]
mod tests {
    use gameplay_core::TeamComparison;

    use super::*;

    #[test]
    fn joins_fill_the_smallest_team() {
        let mut teams = TeamRegistry::new(2);
        let assigned: Vec<_> = (1..=5)
            .map(|id| teams.assign_balanced(ActorId(id)).0)
            .collect();
        assert_eq!(
            assigned,
            vec![TeamId(0), TeamId(1), TeamId(0), TeamId(1), TeamId(0)]
        );

        teams.remove(ActorId(2));
        teams.remove(ActorId(4));
        assert_eq!(teams.assign_balanced(ActorId(6)).0, TeamId(1));
    }

    #[test]
    fn reassigning_keeps_the_existing_team() {
        let mut teams = TeamRegistry::new(3);
        assert_eq!(teams.assign_balanced(ActorId(1)), (TeamId(0), None));
        assert_eq!(
            teams.assign_balanced(ActorId(1)),
            (TeamId(0), Some(TeamId(0)))
        );
        assert_eq!(teams.assign(ActorId(1), TeamId(2)), Some(TeamId(0)));
        assert_eq!(
            teams.compare(ActorId(1), ActorId(9)),
            TeamComparison::InvalidArgument
        );
    }
}
