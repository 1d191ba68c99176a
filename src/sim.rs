//! Synthetic leagues for demos and tests.
//!
//! Locations are scattered around a center: the radius is normally
//! distributed and the angle is uniform.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{Location, Player, PlayerId, Team, TeamId};

#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("invalid location spread (mean {mean}, std_dev {std_dev})")]
    InvalidSpread { mean: f64, std_dev: f64 },
    #[error("roster bounds are inverted: min {min} > max {max}")]
    InvertedBounds { min: usize, max: usize },
}

fn default_mean() -> f64 {
    0.0
}

fn default_std_dev() -> f64 {
    1.0
}

/// How many entities to generate and how to scatter them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSpec {
    pub count: usize,
    #[serde(default)]
    pub center: [f64; 2],
    #[serde(default = "default_mean")]
    pub mean: f64,
    #[serde(default = "default_std_dev")]
    pub std_dev: f64,
}

impl PopulationSpec {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            center: [0.0, 0.0],
            mean: default_mean(),
            std_dev: default_std_dev(),
        }
    }

    pub fn around(mut self, center: [f64; 2], std_dev: f64) -> Self {
        self.center = center;
        self.std_dev = std_dev;
        self
    }

    fn radius(&self) -> Result<Normal<f64>, SimError> {
        radius(self.mean, self.std_dev)
    }
}

/// `Normal::new` only rejects a NaN spread, so the sign and finiteness
/// checks live here.
fn radius(mean: f64, std_dev: f64) -> Result<Normal<f64>, SimError> {
    let invalid = SimError::InvalidSpread { mean, std_dev };
    if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
        return Err(invalid);
    }
    Normal::new(mean, std_dev).map_err(|_| invalid)
}

pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn random_location<R: Rng + ?Sized>(
    rng: &mut R,
    center: Location,
    mean: f64,
    std_dev: f64,
) -> Result<Location, SimError> {
    let radius = radius(mean, std_dev)?;
    Ok(offset(rng, center, &radius))
}

fn offset<R: Rng + ?Sized>(rng: &mut R, center: Location, radius: &Normal<f64>) -> Location {
    let r = radius.sample(rng);
    let theta = rng.gen::<f64>() * TAU;
    Location::new(r * theta.cos() + center.x, r * theta.sin() + center.y)
}

pub fn sim_players<R: Rng + ?Sized>(
    rng: &mut R,
    spec: &PopulationSpec,
) -> Result<Vec<Player>, SimError> {
    let radius = spec.radius()?;
    let center = Location::from(spec.center);
    Ok((1..=spec.count as u64)
        .map(|id| Player::new(PlayerId(id), format!("Player {id}"), offset(rng, center, &radius)))
        .collect())
}

pub fn sim_teams<R: Rng + ?Sized>(
    rng: &mut R,
    spec: &PopulationSpec,
    min_roster_size: usize,
    max_roster_size: usize,
) -> Result<Vec<Team>, SimError> {
    if min_roster_size > max_roster_size {
        return Err(SimError::InvertedBounds {
            min: min_roster_size,
            max: max_roster_size,
        });
    }
    let radius = spec.radius()?;
    let center = Location::from(spec.center);
    Ok((1..=spec.count as u64)
        .map(|id| {
            Team::new(TeamId(id), format!("Team {id}"), offset(rng, center, &radius))
                .with_roster_bounds(min_roster_size, max_roster_size)
        })
        .collect())
}
