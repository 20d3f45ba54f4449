use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const ADDR_ENV: &str = "TIMETABLE_SOLVER_ADDR";

/// How a room is picked for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomSelection {
    /// Use the first room whose lab flag matches, else the first room at all.
    #[default]
    FallbackToFirst,
    /// Only rooms whose lab flag matches; otherwise the subject is skipped.
    StrictMatch,
}

/// Tuning knobs of the evolutionary search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    pub elite_count: usize,
    /// Best fitness at or above this stops the search early.
    pub target_fitness: f64,
    pub seed: Option<u64>,
    pub room_selection: RoomSelection,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            mutation_rate: 0.1,
            tournament_size: 5,
            elite_count: 1,
            target_fitness: 1000.0,
            seed: None,
            room_selection: RoomSelection::FallbackToFirst,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size == 0 {
            return Err("populationSize must be at least 1".to_string());
        }
        if self.tournament_size == 0 {
            return Err("tournamentSize must be at least 1".to_string());
        }
        if self.elite_count >= self.population_size {
            return Err(format!(
                "eliteCount ({}) must be smaller than populationSize ({})",
                self.elite_count, self.population_size
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(format!(
                "mutationRate must lie in [0, 1], got {}",
                self.mutation_rate
            ));
        }
        Ok(())
    }
}

/// Address the HTTP server binds to, read from the environment.
pub fn bind_addr() -> Result<SocketAddr, String> {
    let raw = env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    raw.parse().map_err(|e| format!("invalid {ADDR_ENV} '{raw}': {e}"))
}
