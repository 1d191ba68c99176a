//! Pairwise distances and nearest-first preference orders.

use std::collections::VecDeque;

use crate::entity::{Location, Player, PlayerId, Team, TeamId};

pub fn euclidean_distance(a: Location, b: Location) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Anything with an identity and a position in the plane.
pub trait Positioned {
    type Id: Copy;

    fn id(&self) -> Self::Id;
    fn location(&self) -> Location;
}

impl Positioned for Player {
    type Id = PlayerId;

    fn id(&self) -> PlayerId {
        self.id
    }

    fn location(&self) -> Location {
        self.location
    }
}

impl Positioned for Team {
    type Id = TeamId;

    fn id(&self) -> TeamId {
        self.id
    }

    fn location(&self) -> Location {
        self.location
    }
}

/// Distances from `origin` to every target, nearest first. Equal distances
/// keep the targets' input order.
pub fn rank_by_distance<O, T>(origin: &O, targets: &[T]) -> Vec<(f64, T::Id)>
where
    O: Positioned,
    T: Positioned,
{
    let from = origin.location();
    let mut distances: Vec<(f64, T::Id)> = targets
        .iter()
        .map(|target| (euclidean_distance(from, target.location()), target.id()))
        .collect();
    distances.sort_by(|a, b| a.0.total_cmp(&b.0));
    distances
}

fn ids_of<Id: Copy>(distances: &[(f64, Id)]) -> VecDeque<Id> {
    distances.iter().map(|(_, id)| *id).collect()
}

/// Recomputes distances and rankings on both sides from scratch.
pub fn compute_player_team_distances(players: &mut [Player], teams: &mut [Team]) {
    for player in players.iter_mut() {
        player.distances = rank_by_distance(&*player, &*teams);
        player.rankings = ids_of(&player.distances);
    }
    for team in teams.iter_mut() {
        team.distances = rank_by_distance(&*team, &*players);
        team.rankings = ids_of(&team.distances);
    }
}
