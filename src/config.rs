//! Experiment configuration, loadable from and saveable to JSON.

use crate::error::{OverlayError, Result};
use crate::generator::{GeneratorConfig, ServiceSelection};
use crate::overlay::Weighting;
use crate::reducer::ReducerConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Config file failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Narrowest label width used for bit labels
pub const MIN_LABEL_WIDTH: u8 = 8;

/// One experiment iteration: a generated network plus its scoring rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Total node count (N)
    pub num_nodes: usize,
    /// Service node count (M)
    pub num_services: usize,
    /// Connection radius (D)
    pub radius: f64,
    pub selection: ServiceSelection,
    pub weighting: Weighting,
    pub include_tree_center: bool,
    /// Service nodes sampled as the target set in each round
    pub senders: usize,
    pub rounds: usize,
    pub seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_nodes: 200,
            num_services: 20,
            radius: 0.125,
            selection: ServiceSelection::Random,
            weighting: Weighting::PathHops,
            include_tree_center: false,
            senders: 10,
            rounds: 10,
            seed: 42,
        }
    }
}

impl ExperimentConfig {
    pub fn new(num_nodes: usize, num_services: usize, senders: usize, seed: u64) -> Self {
        Self {
            num_nodes,
            num_services,
            senders,
            seed,
            ..Self::default()
        }
    }

    /// Generator parameters; Hamming weighting gets labels wide enough for
    /// every node id
    pub fn generator_config(&self) -> GeneratorConfig {
        let config = GeneratorConfig::new(self.num_nodes, self.num_services, self.radius)
            .with_selection(self.selection);
        match self.weighting {
            Weighting::Hamming => config.with_labels(label_width_for(self.num_nodes)),
            Weighting::PathHops => config,
        }
    }

    pub fn reducer_config(&self) -> ReducerConfig {
        ReducerConfig {
            include_tree_center: self.include_tree_center,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.generator_config().validate()?;
        if self.num_services == 0 {
            return Err(OverlayError::InvalidParameters(
                "an experiment needs at least one service node".to_string(),
            ));
        }
        if self.senders > self.num_services {
            return Err(OverlayError::InvalidParameters(format!(
                "{} senders requested from {} service nodes",
                self.senders, self.num_services
            )));
        }
        if self.rounds == 0 {
            return Err(OverlayError::InvalidParameters(
                "an iteration needs at least one round".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn label_width_for(num_nodes: usize) -> u8 {
    let bits = usize::BITS - num_nodes.saturating_sub(1).leading_zeros();
    (bits as u8).max(MIN_LABEL_WIDTH)
}

/// A list of experiments run back to back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    pub experiments: Vec<ExperimentConfig>,
}

impl SweepPlan {
    /// The classic 40-iteration assignment sweep.
    ///
    /// Four blocks of ten, each with a randomly drawn service count:
    /// - N=200, M in {10..100} step 10, every service sends
    /// - N=200, M in {10..100} step 10, half the services send
    /// - N=500, M in {50..250} step 50, a quarter of the services send
    /// - N=400, M in {40..200} step 40, every service sends
    pub fn classic(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let blocks: [(usize, usize, usize, usize); 4] =
            [(200, 10, 10, 1), (200, 10, 10, 2), (500, 50, 5, 4), (400, 40, 5, 1)];

        let mut experiments = Vec::with_capacity(40);
        for (num_nodes, step, steps, divisor) in blocks {
            for _ in 0..10 {
                let num_services = rng.gen_range(1..=steps) * step;
                let index = experiments.len() as u64;
                experiments.push(ExperimentConfig::new(
                    num_nodes,
                    num_services,
                    num_services / divisor,
                    seed.wrapping_add(index),
                ));
            }
        }
        Self { experiments }
    }

    pub fn validate(&self) -> Result<()> {
        self.experiments.iter().try_for_each(ExperimentConfig::validate)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> std::result::Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
