//! Session state for one league: the players, the teams, and the
//! operations that edit assignments between matching runs.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::entity::{Player, PlayerId, Team, TeamId};
use crate::geometry::compute_player_team_distances;
use crate::matching::{DeferredAcceptance, MatchError, MatchSummary};

/// Number of nearest players a coach's kid is drawn from.
pub const COACH_KID_POOL: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum RosterError {
    #[error("{0} has a non-finite location")]
    PlayerLocation(PlayerId),
    #[error("{0} has a non-finite location")]
    TeamLocation(TeamId),
    #[error("{0} defined more than once")]
    DuplicatePlayer(PlayerId),
    #[error("{0} defined more than once")]
    DuplicateTeam(TeamId),
    #[error("{team} holds {members} players, above its maximum of {max}")]
    OverCapacity {
        team: TeamId,
        members: usize,
        max: usize,
    },
    #[error("unknown {0}")]
    UnknownPlayer(PlayerId),
    #[error("unknown {0}")]
    UnknownTeam(TeamId),
    #[error("{0} has no room")]
    TeamFull(TeamId),
}

#[derive(Debug, Error)]
pub enum AssignError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Match(#[from] MatchError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TeamCount {
    pub team: TeamId,
    pub name: String,
    pub members: usize,
    pub min_roster_size: Option<usize>,
    pub max_roster_size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(players: Vec<Player>, teams: Vec<Team>) -> Self {
        Self { players, teams }
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn add_team(&mut self, team: Team) {
        self.teams.push(team);
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    pub fn team_mut(&mut self, id: TeamId) -> Option<&mut Team> {
        self.teams.iter_mut().find(|team| team.id == id)
    }

    /// Rejects input the matching engine does not check on every access.
    pub fn validate(&self) -> Result<(), RosterError> {
        let mut seen_players = HashSet::new();
        for player in &self.players {
            if !player.location.is_finite() {
                return Err(RosterError::PlayerLocation(player.id));
            }
            if !seen_players.insert(player.id) {
                return Err(RosterError::DuplicatePlayer(player.id));
            }
        }

        let mut seen_teams = HashSet::new();
        for team in &self.teams {
            if !team.location.is_finite() {
                return Err(RosterError::TeamLocation(team.id));
            }
            if !seen_teams.insert(team.id) {
                return Err(RosterError::DuplicateTeam(team.id));
            }
            if let Some(max) = team.max_roster_size {
                if team.members.len() > max {
                    return Err(RosterError::OverCapacity {
                        team: team.id,
                        members: team.members.len(),
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn compute_rankings(&mut self) {
        compute_player_team_distances(&mut self.players, &mut self.teams);
    }

    /// Rebuilds team member lists from the players' side, then moves coach
    /// kids onto their coach's team where it has room. Assignments to teams
    /// that no longer exist are cleared.
    pub fn sync_teams(&mut self) {
        for team in &mut self.teams {
            team.members.clear();
        }
        for player in &mut self.players {
            let Some(team_id) = player.team else {
                continue;
            };
            match self.teams.iter_mut().find(|team| team.id == team_id) {
                Some(team) => team.add_member(player.id),
                None => {
                    warn!(
                        player = player.id.raw(),
                        team = team_id.raw(),
                        "dropping assignment to unknown team"
                    );
                    player.unassign();
                }
            }
        }

        for player in &mut self.players {
            let Some(coach_team) = player.coach_kid else {
                continue;
            };
            let Some(index) = self.teams.iter().position(|team| team.id == coach_team) else {
                continue;
            };
            if player.team != Some(coach_team) {
                if !self.teams[index].room_on_team() {
                    warn!(
                        player = player.id.raw(),
                        team = coach_team.raw(),
                        "coach's team is full, kid keeps current assignment"
                    );
                    continue;
                }
                if let Some(previous) = player.team {
                    if let Some(team) = self.teams.iter_mut().find(|team| team.id == previous) {
                        team.remove_member(player.id);
                    }
                }
                player.assign_to_team(coach_team);
                self.teams[index].add_member(player.id);
            }
            self.teams[index].coach_kid = Some(player.id);
        }
    }

    pub fn unassign_all(&mut self) {
        for player in &mut self.players {
            player.unassign();
        }
        for team in &mut self.teams {
            team.members.clear();
        }
    }

    /// Manual move between teams; `None` returns the player to the
    /// unassigned pool.
    pub fn move_player(
        &mut self,
        player_id: PlayerId,
        to: Option<TeamId>,
    ) -> Result<(), RosterError> {
        let current = self
            .player(player_id)
            .ok_or(RosterError::UnknownPlayer(player_id))?
            .team;
        if current == to {
            return Ok(());
        }
        if let Some(team_id) = to {
            let team = self.team(team_id).ok_or(RosterError::UnknownTeam(team_id))?;
            if !team.room_on_team() {
                return Err(RosterError::TeamFull(team_id));
            }
        }

        if let Some(previous) = current.and_then(|id| self.team_mut(id)) {
            previous.remove_member(player_id);
        }
        if let Some(team) = to.and_then(|id| self.team_mut(id)) {
            team.add_member(player_id);
        }
        if let Some(player) = self.player_mut(player_id) {
            player.team = to;
        }
        Ok(())
    }

    /// Removes a team; its players go back to the unassigned pool.
    pub fn remove_team(&mut self, team_id: TeamId) -> Result<Team, RosterError> {
        let index = self
            .teams
            .iter()
            .position(|team| team.id == team_id)
            .ok_or(RosterError::UnknownTeam(team_id))?;
        let team = self.teams.remove(index);
        for player in &mut self.players {
            if player.team == Some(team_id) {
                player.unassign();
            }
            if player.coach_kid == Some(team_id) {
                player.coach_kid = None;
            }
            player.rankings.retain(|id| *id != team_id);
            player.distances.retain(|(_, id)| *id != team_id);
        }
        Ok(team)
    }

    /// Pre-assigns one coach's kid per team, drawn among the nearest
    /// [`COACH_KID_POOL`] players still unassigned. Requires computed rankings.
    pub fn seed_coach_kids<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let mut seeded = 0;
        for index in 0..self.teams.len() {
            let team = &self.teams[index];
            if team.coach_kid.is_some() {
                continue;
            }
            if !team.room_on_team() {
                warn!(team = team.id.raw(), "no room for a coach's kid");
                continue;
            }
            let candidates: Vec<PlayerId> = team
                .distances
                .iter()
                .map(|(_, id)| *id)
                .filter(|id| self.player(*id).is_some_and(|p| !p.is_assigned()))
                .take(COACH_KID_POOL)
                .collect();
            let Some(&kid) = candidates.choose(rng) else {
                warn!(team = team.id.raw(), "no unassigned player left for the coach's kid");
                continue;
            };

            let team_id = team.id;
            let team = &mut self.teams[index];
            team.coach_kid = Some(kid);
            team.add_member(kid);
            if let Some(player) = self.player_mut(kid) {
                player.coach_kid = Some(team_id);
                player.assign_to_team(team_id);
            }
            seeded += 1;
        }
        seeded
    }

    /// Validates, recomputes rankings, then matches every unassigned player.
    pub fn auto_assign(
        &mut self,
        engine: &DeferredAcceptance,
    ) -> Result<MatchSummary, AssignError> {
        self.validate()?;
        self.compute_rankings();
        let summary = engine.run(self)?;
        for team in self.undersized_teams() {
            warn!(
                team = team.team.raw(),
                members = team.members,
                min = ?team.min_roster_size,
                "team below minimum roster size"
            );
        }
        info!(
            rounds = summary.rounds,
            depth = summary.final_depth,
            "auto assign complete"
        );
        Ok(summary)
    }

    /// Sum of every set maximum; teams without one contribute nothing.
    pub fn total_capacity(&self) -> usize {
        self.teams.iter().filter_map(|team| team.max_roster_size).sum()
    }

    pub fn unassigned_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| !player.is_assigned())
    }

    pub fn team_counts(&self) -> Vec<TeamCount> {
        self.teams
            .iter()
            .map(|team| TeamCount {
                team: team.id,
                name: team.name.clone(),
                members: team.members.len(),
                min_roster_size: team.min_roster_size,
                max_roster_size: team.max_roster_size,
            })
            .collect()
    }

    pub fn undersized_teams(&self) -> Vec<TeamCount> {
        self.team_counts()
            .into_iter()
            .filter(|count| count.min_roster_size.is_some_and(|min| count.members < min))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::entity::Location;

    fn league() -> Roster {
        let mut roster = Roster::new();
        for (id, x) in [(1, 0.0), (2, 1.0), (3, 9.0), (4, 10.0)] {
            let location = Location::new(x, 0.0);
            roster.add_player(Player::new(PlayerId(id), format!("Player {id}"), location));
        }
        for (id, x) in [(1, 0.0), (2, 10.0)] {
            let team = Team::new(TeamId(id), format!("Team {id}"), Location::new(x, 0.0));
            roster.add_team(team.with_roster_bounds(1, 2));
        }
        roster
    }

    #[test]
    fn validate_rejects_bad_input() {
        let mut roster = league();
        roster.players[1].location = Location::new(f64::NAN, 0.0);
        assert_eq!(roster.validate(), Err(RosterError::PlayerLocation(PlayerId(2))));

        let mut roster = league();
        roster.add_team(Team::new(TeamId(2), "Again", Location::new(1.0, 1.0)));
        assert_eq!(roster.validate(), Err(RosterError::DuplicateTeam(TeamId(2))));

        let mut roster = league();
        for id in 1..=3 {
            roster.teams[0].add_member(PlayerId(id));
        }
        assert!(matches!(roster.validate(), Err(RosterError::OverCapacity { max: 2, .. })));
    }

    #[test]
    fn auto_assign_splits_by_proximity() {
        let mut roster = league();
        roster.auto_assign(&DeferredAcceptance::new()).unwrap();
        let members = |id| roster.team(TeamId(id)).unwrap().members.clone();
        assert_eq!(members(1), vec![PlayerId(1), PlayerId(2)]);
        assert_eq!(members(2), vec![PlayerId(4), PlayerId(3)]);
        assert!(roster.undersized_teams().is_empty());
        assert_eq!(roster.unassigned_players().count(), 0);
    }

    #[test]
    fn move_player_respects_capacity() {
        let mut roster = league();
        roster.auto_assign(&DeferredAcceptance::new()).unwrap();
        assert_eq!(
            roster.move_player(PlayerId(1), Some(TeamId(2))),
            Err(RosterError::TeamFull(TeamId(2)))
        );

        roster.move_player(PlayerId(3), None).unwrap();
        assert_eq!(roster.player(PlayerId(3)).unwrap().team, None);
        assert_eq!(roster.team(TeamId(2)).unwrap().members, vec![PlayerId(4)]);

        roster.move_player(PlayerId(1), Some(TeamId(2))).unwrap();
        assert_eq!(roster.team(TeamId(1)).unwrap().members, vec![PlayerId(2)]);
        assert!(roster.team(TeamId(2)).unwrap().has_member(PlayerId(1)));
        assert_eq!(
            roster.move_player(PlayerId(9), None),
            Err(RosterError::UnknownPlayer(PlayerId(9)))
        );
    }

    #[test]
    fn remove_team_returns_players_to_pool() {
        let mut roster = league();
        roster.auto_assign(&DeferredAcceptance::new()).unwrap();
        let removed = roster.remove_team(TeamId(2)).unwrap();
        assert_eq!(removed.members.len(), 2);
        assert_eq!(roster.unassigned_players().count(), 2);
        assert!(roster.players.iter().all(|p| !p.rankings.contains(&TeamId(2))));
        assert_eq!(
            roster.remove_team(TeamId(2)),
            Err(RosterError::UnknownTeam(TeamId(2)))
        );
    }

    #[test]
    fn sync_rebuilds_members_from_players() {
        let mut roster = league();
        roster.players[0].team = Some(TeamId(2));
        roster.players[2].team = Some(TeamId(7));
        roster.players[3].coach_kid = Some(TeamId(1));
        roster.teams[0].members = vec![PlayerId(3)];
        roster.sync_teams();

        assert_eq!(roster.team(TeamId(1)).unwrap().members, vec![PlayerId(4)]);
        assert_eq!(roster.team(TeamId(1)).unwrap().coach_kid, Some(PlayerId(4)));
        assert_eq!(roster.team(TeamId(2)).unwrap().members, vec![PlayerId(1)]);
        assert_eq!(roster.player(PlayerId(3)).unwrap().team, None);
        assert_eq!(roster.player(PlayerId(4)).unwrap().team, Some(TeamId(1)));
    }

    #[test]
    fn coach_kids_come_from_nearest_pool() {
        let mut roster = league();
        roster.compute_rankings();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(roster.seed_coach_kids(&mut rng), 2);

        for team in &roster.teams {
            let kid = team.coach_kid.expect("coach kid seeded");
            assert_eq!(team.members, vec![kid]);
            assert_eq!(roster.player(kid).unwrap().coach_kid, Some(team.id));
        }
        // Already seeded teams are left alone.
        assert_eq!(roster.seed_coach_kids(&mut rng), 0);

        roster.auto_assign(&DeferredAcceptance::new()).unwrap();
        assert_eq!(roster.unassigned_players().count(), 0);
    }

    #[test]
    fn unassign_all_clears_both_sides() {
        let mut roster = league();
        roster.auto_assign(&DeferredAcceptance::new()).unwrap();
        roster.unassign_all();
        assert_eq!(roster.unassigned_players().count(), 4);
        assert!(roster.teams.iter().all(|team| team.members.is_empty()));
        assert_eq!(roster.total_capacity(), 4);
    }

    #[test]
    fn sync_never_overfills_coach_team() {
        let mut roster = league();
        roster.players[0].team = Some(TeamId(1));
        roster.players[1].team = Some(TeamId(1));
        roster.players[2].team = Some(TeamId(2));
        roster.players[2].coach_kid = Some(TeamId(1));
        roster.sync_teams();

        assert_eq!(roster.team(TeamId(1)).unwrap().members, vec![PlayerId(1), PlayerId(2)]);
        assert_eq!(roster.team(TeamId(2)).unwrap().members, vec![PlayerId(3)]);
        assert_eq!(roster.player(PlayerId(3)).unwrap().team, Some(TeamId(2)));
        assert_eq!(roster.validate(), Ok(()));
    }

    #[test]
    fn sync_after_unassign_restores_coach_kids() {
        let mut roster = league();
        roster.players[2].team = Some(TeamId(2));
        roster.players[2].coach_kid = Some(TeamId(1));
        roster.sync_teams();
        assert_eq!(roster.team(TeamId(1)).unwrap().members, vec![PlayerId(3)]);
        assert!(roster.team(TeamId(2)).unwrap().members.is_empty());

        roster.unassign_all();
        roster.sync_teams();
        assert_eq!(roster.player(PlayerId(3)).unwrap().team, Some(TeamId(1)));
        assert_eq!(roster.team(TeamId(1)).unwrap().coach_kid, Some(PlayerId(3)));

        roster.auto_assign(&DeferredAcceptance::new()).unwrap();
        assert!(roster.team(TeamId(1)).unwrap().has_member(PlayerId(3)));
        assert_eq!(roster.validate(), Ok(()));
    }
}
