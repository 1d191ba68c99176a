//! Capacity-aware deferred acceptance.
//!
//! Players propose to their nearest remaining team. A team accepts any
//! proposer that sits among its `depth` nearest players, and `depth` widens by
//! one after every full pass. A full team is dropped from the proposer's queue
//! for the rest of the run. Accepted players are never displaced, so a team
//! roster only grows.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::entity::{PlayerId, TeamId};
use crate::roster::Roster;

#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error(
        "{player} exhausted every team preference; \
         total capacity {total_capacity} for {player_count} players"
    )]
    CapacityInsufficient {
        player: PlayerId,
        player_count: usize,
        total_capacity: usize,
    },
    #[error(
        "matching stalled in round {round} at depth {depth} \
         with {unassigned} players unassigned"
    )]
    Stalled {
        round: u64,
        depth: usize,
        unassigned: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundSummary {
    pub round: u64,
    pub depth: usize,
    pub assigned_this_round: usize,
    pub dropped_preferences: usize,
    pub unassigned_remaining: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchSummary {
    pub rounds: u64,
    pub final_depth: usize,
    pub pre_assigned: usize,
    pub assigned_this_run: usize,
}

#[derive(Debug, Default, Clone)]
pub struct DeferredAcceptance;

impl DeferredAcceptance {
    pub fn new() -> Self {
        Self
    }

    /// Runs to completion. Rankings must already be computed.
    pub fn run(&self, roster: &mut Roster) -> Result<MatchSummary, MatchError> {
        self.run_with_hook(roster, |_, _| {})
    }

    /// Same as [`run`](Self::run), calling `hook` with the roster after
    /// every full pass.
    pub fn run_with_hook<F>(
        &self,
        roster: &mut Roster,
        mut hook: F,
    ) -> Result<MatchSummary, MatchError>
    where
        F: FnMut(&RoundSummary, &Roster),
    {
        let player_count = roster.players.len();
        let total_capacity = roster.total_capacity();
        let team_index: HashMap<TeamId, usize> = roster
            .teams
            .iter()
            .enumerate()
            .map(|(index, team)| (team.id, index))
            .collect();
        // Once depth reaches this, every team accepts its whole ordering.
        let full_depth = roster
            .teams
            .iter()
            .map(|team| team.distances.len())
            .max()
            .unwrap_or(0);

        let pre_assigned = roster.players.iter().filter(|p| p.is_assigned()).count();
        let mut unassigned = player_count - pre_assigned;
        let mut depth = 1_usize;
        let mut round = 0_u64;

        while unassigned > 0 {
            round += 1;
            let mut assigned_this_round = 0;
            let mut dropped_preferences = 0;

            for player in roster.players.iter_mut().filter(|p| !p.is_assigned()) {
                let Some(preferred) = player.preferred_team() else {
                    return Err(MatchError::CapacityInsufficient {
                        player: player.id,
                        player_count,
                        total_capacity,
                    });
                };
                let Some(&index) = team_index.get(&preferred) else {
                    warn!(
                        player = player.id.raw(),
                        team = preferred.raw(),
                        "skipping unknown team"
                    );
                    continue;
                };
                let team = &mut roster.teams[index];
                if team.is_full() {
                    player.drop_preferred_team();
                    dropped_preferences += 1;
                    continue;
                }
                if team.accepts(player.id, depth) {
                    player.assign_to_team(team.id);
                    team.add_member(player.id);
                    assigned_this_round += 1;
                    unassigned -= 1;
                }
            }

            let summary = RoundSummary {
                round,
                depth,
                assigned_this_round,
                dropped_preferences,
                unassigned_remaining: unassigned,
            };
            debug!(
                round,
                depth,
                assigned = assigned_this_round,
                dropped = dropped_preferences,
                remaining = unassigned,
                "matching round complete"
            );
            hook(&summary, roster);

            let stalled = assigned_this_round == 0 && dropped_preferences == 0;
            if unassigned > 0 && stalled && depth >= full_depth {
                return Err(MatchError::Stalled {
                    round,
                    depth,
                    unassigned,
                });
            }
            depth += 1;
        }

        let summary = MatchSummary {
            rounds: round,
            final_depth: depth,
            pre_assigned,
            assigned_this_run: player_count - pre_assigned,
        };
        info!(
            players = player_count,
            teams = roster.teams.len(),
            rounds = summary.rounds,
            "matching finished"
        );
        Ok(summary)
    }
}
