/// run settings for polytrace
/// fixed for the lifetime of one run; persisted as JSON
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    // genome shape (constant across the population)
    /// vertices per polygon (>= 3)
    pub vertex_count: usize,
    /// polygons per chromosome (>= 1)
    pub polygon_count: usize,

    // mutation operator
    /// chance that any single scalar gets perturbed (0.0-1.0)
    pub mutation_rate: f32,
    /// max absolute perturbation of a picked scalar
    pub mutation_amount: f32,

    // reference driver
    pub population_size: usize,
    /// best chromosomes carried over unchanged each generation
    pub elitism: usize,
    pub tournament_size: usize,
    pub generations: u64,
    pub seed: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            vertex_count: 6,
            polygon_count: 50,
            mutation_rate: 0.01,
            mutation_amount: 0.15,
            population_size: 50,
            elitism: 2,
            tournament_size: 3,
            generations: 1_000,
            seed: 0xDEADBEEF,
        }
    }
}

impl RunSettings {
    /// reject degenerate configurations before a run starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vertex_count < 3 {
            return Err(ConfigError::VertexCount(self.vertex_count));
        }
        if self.polygon_count < 1 {
            return Err(ConfigError::PolygonCount(self.polygon_count));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::MutationRate(self.mutation_rate));
        }
        if !self.mutation_amount.is_finite() || self.mutation_amount < 0.0 {
            return Err(ConfigError::MutationAmount(self.mutation_amount));
        }
        if self.population_size < 2 {
            return Err(ConfigError::PopulationSize(self.population_size));
        }
        if self.elitism >= self.population_size {
            return Err(ConfigError::Elitism {
                elitism: self.elitism,
                population: self.population_size,
            });
        }
        if self.tournament_size < 1 {
            return Err(ConfigError::TournamentSize);
        }
        Ok(())
    }

    /// save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings, surfacing read and parse failures
    pub fn load_strict(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// load settings from a JSON file, or return defaults if it's missing or malformed
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("failed to parse {}: {}. using defaults.", path.display(), e);
                    Self::default()
                }
            },
            // file doesn't exist or can't be read - use defaults
            Err(_) => Self::default(),
        }
    }
}
