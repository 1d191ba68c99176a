//! JSON snapshot of a roster: `{ "players": [...], "teams": [...] }`.
//!
//! Every entity carries the same keys so that files written by the roster
//! editor or the batch exporter load here unchanged. A player's `team` is
//! `null` or a team id. On read the id may also be a numeric string (the
//! editor after a drag) or a list with at most one entry (older files).
//! Roster bounds are written camelCase; the exporter's snake_case keys are
//! accepted as aliases.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::entity::{Location, Player, PlayerId, Team, TeamId};
use crate::roster::Roster;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub location: Location,
    #[serde(default, deserialize_with = "single_team")]
    pub team: Option<TeamId>,
    #[serde(default)]
    pub friends: Vec<PlayerId>,
    #[serde(default)]
    pub distances: Vec<(f64, TeamId)>,
    #[serde(default)]
    pub rankings: Vec<TeamId>,
    #[serde(rename = "minRosterSize", alias = "min_roster_size", default)]
    pub min_roster_size: Option<usize>,
    #[serde(rename = "maxRosterSize", alias = "max_roster_size", default)]
    pub max_roster_size: Option<usize>,
    #[serde(default)]
    pub coach_kid: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub name: String,
    pub location: Location,
    #[serde(default, deserialize_with = "member_list")]
    pub team: Vec<PlayerId>,
    #[serde(default)]
    pub friends: Vec<PlayerId>,
    #[serde(default)]
    pub distances: Vec<(f64, PlayerId)>,
    #[serde(default)]
    pub rankings: Vec<PlayerId>,
    #[serde(rename = "minRosterSize", alias = "min_roster_size", default)]
    pub min_roster_size: Option<usize>,
    #[serde(rename = "maxRosterSize", alias = "max_roster_size", default)]
    pub max_roster_size: Option<usize>,
    #[serde(default)]
    pub coach_kid: Option<PlayerId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub teams: Vec<TeamRecord>,
}

fn single_team<'de, D>(deserializer: D) -> Result<Option<TeamId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Id(TeamId),
        Text(String),
        List(Vec<TeamId>),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Id(id)) => Ok(Some(id)),
        Some(Raw::Text(text)) if text.is_empty() || text == "null" => Ok(None),
        Some(Raw::Text(text)) => text
            .parse()
            .map(|id| Some(TeamId(id)))
            .map_err(|_| D::Error::custom(format!("team id {text:?} is not a number"))),
        Some(Raw::List(ids)) => match ids.as_slice() {
            [] => Ok(None),
            [id] => Ok(Some(*id)),
            _ => Err(D::Error::custom(format!(
                "player assigned to {} teams, expected at most one",
                ids.len()
            ))),
        },
    }
}

fn member_list<'de, D>(deserializer: D) -> Result<Vec<PlayerId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<PlayerId>>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<&Player> for PlayerRecord {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            location: player.location,
            team: player.team,
            friends: player.friends.clone(),
            distances: player.distances.clone(),
            rankings: player.rankings.iter().copied().collect(),
            min_roster_size: None,
            max_roster_size: None,
            coach_kid: player.coach_kid,
        }
    }
}

impl From<PlayerRecord> for Player {
    fn from(record: PlayerRecord) -> Self {
        let mut player = Player::new(record.id, record.name, record.location);
        player.team = record.team;
        player.friends = record.friends;
        player.distances = record.distances;
        player.rankings = record.rankings.into();
        player.coach_kid = record.coach_kid;
        player
    }
}

impl From<&Team> for TeamRecord {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            location: team.location,
            team: team.members.clone(),
            friends: team.friends.clone(),
            distances: team.distances.clone(),
            rankings: team.rankings.iter().copied().collect(),
            min_roster_size: team.min_roster_size,
            max_roster_size: team.max_roster_size,
            coach_kid: team.coach_kid,
        }
    }
}

impl From<TeamRecord> for Team {
    fn from(record: TeamRecord) -> Self {
        let mut team = Team::new(record.id, record.name, record.location);
        team.members = record.team;
        team.friends = record.friends;
        team.distances = record.distances;
        team.rankings = record.rankings.into();
        team.min_roster_size = record.min_roster_size;
        team.max_roster_size = record.max_roster_size;
        team.coach_kid = record.coach_kid;
        team
    }
}

impl Snapshot {
    pub fn from_roster(roster: &Roster) -> Self {
        Self {
            players: roster.players.iter().map(PlayerRecord::from).collect(),
            teams: roster.teams.iter().map(TeamRecord::from).collect(),
        }
    }

    pub fn into_roster(self) -> Roster {
        Roster::from_parts(
            self.players.into_iter().map(Player::from).collect(),
            self.teams.into_iter().map(Team::from).collect(),
        )
    }

    pub fn from_json_str(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let io_error = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, self.to_json_string()?).map_err(io_error)
    }
}

/// Writes snapshots as `<output_dir>/<name>.json`.
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn write(&self, name: &str, roster: &Roster) -> Result<PathBuf, SnapshotError> {
        let path = self.output_dir.join(format!("{name}.json"));
        Snapshot::from_roster(roster).save(&path)?;
        Ok(path)
    }
}
