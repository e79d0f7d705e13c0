//! Swarm configuration

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::optim::hpo::error::{HPOError, Result};
use crate::optim::hpo::swarm::SwarmCoefficients;
use crate::optim::hpo::types::Direction;

/// PSO engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoConfig {
    /// Swarm size (fixed for the whole run)
    pub num_particles: usize,
    /// Number of generations to evaluate
    pub max_generations: usize,
    /// Inertia weight `w`
    pub inertia: f64,
    /// Cognitive weight `c1`
    pub cognitive: f64,
    /// Social weight `c2`
    pub social: f64,
    /// Which way is better
    pub direction: Direction,
    /// Seed for initialization and velocity updates
    pub seed: u64,
    /// Worker threads per generation (default: available parallelism)
    pub workers: Option<usize>,
    /// Initial velocity range as a fraction of each coordinate's span
    pub velocity_scale: f64,
    /// Stop after this many generations without global-best improvement
    pub stagnation_patience: Option<usize>,
    /// Whether pruned trials may update personal bests with their partial score
    pub pruned_update_bests: bool,
}

impl Default for PsoConfig {
    fn default() -> Self {
        let coefficients = SwarmCoefficients::default();
        Self {
            num_particles: 10,
            max_generations: 10,
            inertia: coefficients.inertia,
            cognitive: coefficients.cognitive,
            social: coefficients.social,
            direction: Direction::Maximize,
            seed: 42,
            workers: None,
            velocity_scale: 0.1,
            stagnation_patience: None,
            pruned_update_bests: true,
        }
    }
}

impl PsoConfig {
    /// Configuration with the given swarm size and generation count
    pub fn new(num_particles: usize, max_generations: usize) -> Self {
        Self { num_particles, max_generations, ..Default::default() }
    }

    pub fn with_coefficients(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_velocity_scale(mut self, velocity_scale: f64) -> Self {
        self.velocity_scale = velocity_scale;
        self
    }

    pub fn with_stagnation_patience(mut self, generations: usize) -> Self {
        self.stagnation_patience = Some(generations);
        self
    }

    pub fn with_pruned_update_bests(mut self, enabled: bool) -> Self {
        self.pruned_update_bests = enabled;
        self
    }

    pub fn coefficients(&self) -> SwarmCoefficients {
        SwarmCoefficients::new(self.inertia, self.cognitive, self.social)
    }

    /// Worker count actually used
    pub fn effective_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(HPOError::InvalidConfig("num_particles must be >= 1".to_string()));
        }
        if self.max_generations == 0 {
            return Err(HPOError::InvalidConfig("max_generations must be >= 1".to_string()));
        }
        self.coefficients().validate()?;
        if !self.velocity_scale.is_finite() || self.velocity_scale < 0.0 {
            return Err(HPOError::InvalidConfig(format!(
                "velocity_scale must be finite and >= 0, got {}",
                self.velocity_scale
            )));
        }
        if self.workers == Some(0) {
            return Err(HPOError::InvalidConfig("workers must be >= 1".to_string()));
        }
        if self.stagnation_patience == Some(0) {
            return Err(HPOError::InvalidConfig("stagnation_patience must be >= 1".to_string()));
        }
        Ok(())
    }
}
