use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u64);

impl TeamId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}

/// Point in the 2-D plane, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Location {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Location> for [f64; 2] {
    fn from(value: Location) -> Self {
        [value.x, value.y]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub location: Location,
    pub team: Option<TeamId>,
    pub friends: Vec<PlayerId>,
    pub distances: Vec<(f64, TeamId)>,
    pub rankings: VecDeque<TeamId>,
    pub coach_kid: Option<TeamId>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            team: None,
            friends: Vec::new(),
            distances: Vec::new(),
            rankings: VecDeque::new(),
            coach_kid: None,
        }
    }

    /// Replaces any previous assignment; a player belongs to at most one team.
    pub fn assign_to_team(&mut self, team: TeamId) {
        self.team = Some(team);
    }

    pub fn unassign(&mut self) {
        self.team = None;
    }

    pub fn is_assigned(&self) -> bool {
        self.team.is_some()
    }

    pub fn preferred_team(&self) -> Option<TeamId> {
        self.rankings.front().copied()
    }

    pub fn drop_preferred_team(&mut self) -> Option<TeamId> {
        self.rankings.pop_front()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub location: Location,
    pub members: Vec<PlayerId>,
    pub friends: Vec<PlayerId>,
    pub distances: Vec<(f64, PlayerId)>,
    pub rankings: VecDeque<PlayerId>,
    pub min_roster_size: Option<usize>,
    pub max_roster_size: Option<usize>,
    pub coach_kid: Option<PlayerId>,
}

impl Team {
    pub fn new(id: TeamId, name: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            members: Vec::new(),
            friends: Vec::new(),
            distances: Vec::new(),
            rankings: VecDeque::new(),
            min_roster_size: None,
            max_roster_size: None,
            coach_kid: None,
        }
    }

    pub fn with_roster_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_roster_size = Some(min);
        self.max_roster_size = Some(max);
        self
    }

    pub fn add_member(&mut self, player: PlayerId) {
        if !self.members.contains(&player) {
            self.members.push(player);
        }
    }

    pub fn remove_member(&mut self, player: PlayerId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| *member != player);
        self.members.len() != before
    }

    pub fn has_member(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    /// A team without a maximum roster size never has room.
    pub fn room_on_team(&self) -> bool {
        match self.max_roster_size {
            Some(max) => self.members.len() < max,
            None => false,
        }
    }

    pub fn is_full(&self) -> bool {
        !self.room_on_team()
    }

    pub fn is_below_minimum(&self) -> bool {
        self.min_roster_size
            .map(|min| self.members.len() < min)
            .unwrap_or(false)
    }

    /// The team's `depth` nearest players, whether or not they have applied.
    pub fn acceptable_players(&self, depth: usize) -> impl Iterator<Item = PlayerId> + '_ {
        self.distances.iter().take(depth).map(|(_, id)| *id)
    }

    pub fn accepts(&self, player: PlayerId, depth: usize) -> bool {
        self.acceptable_players(depth).any(|id| id == player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_without_max_has_no_room() {
        let team = Team::new(TeamId(1), "Team 1", Location::new(0.0, 0.0));
        assert!(!team.room_on_team());
        assert!(team.is_full());
    }

    #[test]
    fn room_tracks_member_count() {
        let mut team =
            Team::new(TeamId(1), "Team 1", Location::new(0.0, 0.0)).with_roster_bounds(1, 2);
        assert!(team.room_on_team());
        assert!(team.is_below_minimum());
        team.add_member(PlayerId(1));
        team.add_member(PlayerId(1));
        assert_eq!(team.members.len(), 1);
        assert!(!team.is_below_minimum());
        team.add_member(PlayerId(2));
        assert!(team.is_full());
        assert!(team.remove_member(PlayerId(1)));
        assert!(!team.remove_member(PlayerId(1)));
        assert!(team.room_on_team());
    }

    #[test]
    fn acceptable_set_is_distance_prefix() {
        let mut team = Team::new(TeamId(1), "Team 1", Location::new(0.0, 0.0));
        team.distances = vec![(1.0, PlayerId(7)), (2.0, PlayerId(3)), (3.0, PlayerId(5))];
        assert!(team.accepts(PlayerId(7), 1));
        assert!(!team.accepts(PlayerId(3), 1));
        assert!(team.accepts(PlayerId(3), 2));
        assert!(team.accepts(PlayerId(5), 10));
        assert!(!team.accepts(PlayerId(9), 10));
    }

    #[test]
    fn player_queue_pops_from_front() {
        let mut player = Player::new(PlayerId(1), "Player 1", Location::new(0.0, 0.0));
        player.rankings = VecDeque::from(vec![TeamId(2), TeamId(1)]);
        assert_eq!(player.preferred_team(), Some(TeamId(2)));
        assert_eq!(player.drop_preferred_team(), Some(TeamId(2)));
        assert_eq!(player.preferred_team(), Some(TeamId(1)));
        player.assign_to_team(TeamId(1));
        player.assign_to_team(TeamId(2));
        assert_eq!(player.team, Some(TeamId(2)));
        player.unassign();
        assert!(!player.is_assigned());
    }

    #[test]
    fn location_serializes_as_pair() {
        let json = serde_json::to_string(&Location::new(1.5, -2.0)).unwrap();
        assert_eq!(json, "[1.5,-2.0]");
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Location::new(1.5, -2.0));
    }
}
