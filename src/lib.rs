pub mod entity;
pub mod geometry;
pub mod matching;
pub mod rng;
pub mod roster;
pub mod scenario;
pub mod sim;
pub mod snapshot;

pub use entity::{Location, Player, PlayerId, Team, TeamId};
pub use matching::{DeferredAcceptance, MatchError, MatchSummary, RoundSummary};
pub use roster::{AssignError, Roster, RosterError};
pub use snapshot::{Snapshot, SnapshotError};
