//! Particle swarm state
//!
//! Particles are created once per run and mutated in place between
//! generations. Each carries its position in encoded space, a velocity, and
//! the best position/score it has seen. The swarm tracks the global best
//! across all particles; it never regresses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::optim::hpo::error::{HPOError, Result};
use crate::optim::hpo::types::Direction;

/// Velocity update coefficients `(w, c1, c2)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwarmCoefficients {
    /// Inertia weight `w`
    pub inertia: f64,
    /// Cognitive (personal best) weight `c1`
    pub cognitive: f64,
    /// Social (global best) weight `c2`
    pub social: f64,
}

impl Default for SwarmCoefficients {
    /// Constriction-factor values from Clerc & Kennedy (2002)
    fn default() -> Self {
        Self { inertia: 0.7298, cognitive: 1.49618, social: 1.49618 }
    }
}

impl SwarmCoefficients {
    pub fn new(inertia: f64, cognitive: f64, social: f64) -> Self {
        Self { inertia, cognitive, social }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, v) in [("inertia", self.inertia), ("cognitive", self.cognitive), ("social", self.social)] {
            if !v.is_finite() || v < 0.0 {
                return Err(HPOError::InvalidConfig(format!(
                    "{name} coefficient must be finite and >= 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// One candidate solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: usize,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    /// Position at which `best_score` was reached
    pub best_position: Option<Vec<f64>>,
    /// Absent until the first scored evaluation
    pub best_score: Option<f64>,
}

impl Particle {
    /// Record `score` for the current position if it strictly improves the personal best
    pub fn offer(&mut self, score: f64, direction: Direction) -> bool {
        if !score.is_finite() || !direction.improves(score, self.best_score) {
            return false;
        }
        self.best_score = Some(score);
        self.best_position = Some(self.position.clone());
        true
    }

    /// Move one step toward the personal and global bests
    ///
    /// `v' = w*v + c1*r1*(pbest - x) + c2*r2*(gbest - x)`, `x' = x + v'`.
    /// Coordinates leaving `bounds` are clamped and their velocity zeroed.
    /// A missing best contributes nothing.
    pub fn update<R: Rng>(
        &mut self,
        global_best: Option<&[f64]>,
        coefficients: &SwarmCoefficients,
        bounds: &[(f64, f64)],
        rng: &mut R,
    ) {
        for (d, &(low, high)) in bounds.iter().enumerate() {
            let x = self.position[d];
            let pbest = self.best_position.as_ref().map_or(x, |p| p[d]);
            let gbest = global_best.map_or(x, |g| g[d]);
            let r1: f64 = rng.random();
            let r2: f64 = rng.random();

            let v = coefficients.inertia * self.velocity[d]
                + coefficients.cognitive * r1 * (pbest - x)
                + coefficients.social * r2 * (gbest - x);
            let next = x + v;

            if next <= low {
                self.position[d] = low;
                self.velocity[d] = 0.0;
            } else if next >= high {
                self.position[d] = high;
                self.velocity[d] = 0.0;
            } else {
                self.position[d] = next;
                self.velocity[d] = v;
            }
        }
    }
}

/// Fixed-size particle collection plus the global best
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swarm {
    particles: Vec<Particle>,
    bounds: Vec<(f64, f64)>,
    global_best_position: Option<Vec<f64>>,
    global_best_score: Option<f64>,
    best_particle: Option<usize>,
    generation: usize,
}

impl Swarm {
    /// Create `num_particles` particles with uniform positions in `bounds` and
    /// velocities in `±velocity_scale * (high - low)`
    pub fn initialize(
        num_particles: usize,
        bounds: &[(f64, f64)],
        velocity_scale: f64,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::initialize_with_rng(num_particles, bounds, velocity_scale, &mut rng)
    }

    /// Like [`Swarm::initialize`], drawing from a caller-owned generator
    pub fn initialize_with_rng<R: Rng>(
        num_particles: usize,
        bounds: &[(f64, f64)],
        velocity_scale: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if num_particles == 0 {
            return Err(HPOError::InvalidConfig("num_particles must be >= 1".to_string()));
        }
        if bounds.is_empty() {
            return Err(HPOError::EmptySpace);
        }
        if !velocity_scale.is_finite() || velocity_scale < 0.0 {
            return Err(HPOError::InvalidConfig(format!(
                "velocity_scale must be finite and >= 0, got {velocity_scale}"
            )));
        }

        let particles = (0..num_particles)
            .map(|id| {
                let mut position = Vec::with_capacity(bounds.len());
                let mut velocity = Vec::with_capacity(bounds.len());
                for &(low, high) in bounds {
                    let range = velocity_scale * (high - low);
                    position.push(low + rng.random::<f64>() * (high - low));
                    velocity.push(-range + rng.random::<f64>() * 2.0 * range);
                }
                Particle { id, position, velocity, best_position: None, best_score: None }
            })
            .collect();

        Ok(Self {
            particles,
            bounds: bounds.to_vec(),
            global_best_position: None,
            global_best_score: None,
            best_particle: None,
            generation: 0,
        })
    }

    /// Offer a score for a particle's current position
    pub fn offer(&mut self, particle_id: usize, score: f64, direction: Direction) -> bool {
        self.particles.get_mut(particle_id).is_some_and(|p| p.offer(score, direction))
    }

    /// Fold personal bests into the global best; true if it improved
    pub fn refresh_global_best(&mut self, direction: Direction) -> bool {
        let mut improved = false;
        for particle in &self.particles {
            if let (Some(score), Some(position)) = (particle.best_score, &particle.best_position) {
                if direction.improves(score, self.global_best_score) {
                    self.global_best_score = Some(score);
                    self.global_best_position = Some(position.clone());
                    self.best_particle = Some(particle.id);
                    improved = true;
                }
            }
        }
        improved
    }

    /// Move every particle once, in id order
    pub fn step<R: Rng>(&mut self, coefficients: &SwarmCoefficients, rng: &mut R) {
        let global_best = self.global_best_position.as_deref();
        for particle in &mut self.particles {
            particle.update(global_best, coefficients, &self.bounds, rng);
        }
    }

    pub fn advance_generation(&mut self) {
        self.generation += 1;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    pub fn global_best_score(&self) -> Option<f64> {
        self.global_best_score
    }

    pub fn global_best_position(&self) -> Option<&[f64]> {
        self.global_best_position.as_deref()
    }

    /// Particle holding the global best
    pub fn best_particle(&self) -> Option<usize> {
        self.best_particle
    }

    /// Number of completed generations
    pub fn generation(&self) -> usize {
        self.generation
    }
}
