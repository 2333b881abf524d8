//! Simulation configuration: typed knobs, YAML loading, validation, and
//! CLI overrides.

use std::fs::File;
use std::path::Path;

use color_eyre::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::ledger::PoolType;
use crate::simulation::migration::{MigrationPools, MigrationStrategy};

/// Zatoshis per coin
pub const COIN: u64 = 100_000_000;

fn default_periods() -> u64 {
    600
}

fn default_activation_period() -> u64 {
    400
}

fn default_user_count() -> u32 {
    10
}

fn default_mint_per_period() -> u64 {
    10 * COIN
}

fn default_min_chunk() -> u64 {
    COIN / 20
}

fn default_shielded_probability() -> f64 {
    0.2
}

fn default_source_pool() -> PoolType {
    PoolType::Sprout
}

fn default_destination_pool() -> PoolType {
    PoolType::Sapling
}

/// Configuration errors reported at load time
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid simulation settings: {0}")]
    InvalidSimulation(String),

    #[error("invalid migration settings: {0}")]
    InvalidMigration(String),
}

/// Complete simulation configuration.
///
/// Every field has a default, so an empty YAML document (or no config file
/// at all) yields a runnable simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation end height; periods run 1..=periods
    #[serde(default = "default_periods")]
    pub periods: u64,

    /// Height at which the second shielded pool activates. Shielded
    /// coinbase chunks land in the first pool below this height and in
    /// the second pool at or above it; migrations start here too.
    #[serde(default = "default_activation_period")]
    pub activation_period: u64,

    /// Fixed user population
    #[serde(default = "default_user_count")]
    pub user_count: u32,

    /// Newly minted zatoshis per period
    #[serde(default = "default_mint_per_period")]
    pub mint_per_period: u64,

    /// Remaining-budget threshold below which the coinbase pays the whole
    /// remainder in one chunk
    #[serde(default = "default_min_chunk")]
    pub min_chunk: u64,

    /// Probability that a coinbase chunk is shielded
    #[serde(default = "default_shielded_probability")]
    pub shielded_probability: f64,

    /// RNG seed; identical seed and settings reproduce the run exactly
    #[serde(default)]
    pub seed: u64,

    /// Per-user migration policy
    #[serde(default)]
    pub migration: MigrationConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            periods: default_periods(),
            activation_period: default_activation_period(),
            user_count: default_user_count(),
            mint_per_period: default_mint_per_period(),
            min_chunk: default_min_chunk(),
            shielded_probability: default_shielded_probability(),
            seed: 0,
            migration: MigrationConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.periods == 0 {
            return Err(ValidationError::InvalidSimulation(
                "periods must be at least 1".to_string(),
            ));
        }
        if self.user_count == 0 {
            return Err(ValidationError::InvalidSimulation(
                "user_count must be at least 1".to_string(),
            ));
        }
        if self.mint_per_period == 0 {
            return Err(ValidationError::InvalidSimulation(
                "mint_per_period must be positive".to_string(),
            ));
        }
        if self.min_chunk == 0 {
            return Err(ValidationError::InvalidSimulation(
                "min_chunk must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.shielded_probability) {
            return Err(ValidationError::InvalidSimulation(format!(
                "shielded_probability must be within [0, 1], got {}",
                self.shielded_probability
            )));
        }
        self.migration.validate()
    }
}

/// Migration policy configuration, tagged by strategy name in YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MigrationConfig {
    /// No migrations; coinbase-only history
    Noop,
    /// Uniformly random per-user migration targets each period
    UniformRandom {
        lowerbound: u64,
        upperbound: u64,
        #[serde(default = "default_source_pool")]
        source_pool: PoolType,
        #[serde(default = "default_destination_pool")]
        destination_pool: PoolType,
    },
}

impl Default for MigrationConfig {
    fn default() -> Self {
        MigrationConfig::UniformRandom {
            lowerbound: COIN,
            upperbound: 5 * COIN,
            source_pool: default_source_pool(),
            destination_pool: default_destination_pool(),
        }
    }
}

impl MigrationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            MigrationConfig::Noop => Ok(()),
            MigrationConfig::UniformRandom {
                lowerbound,
                upperbound,
                source_pool,
                destination_pool,
            } => {
                if lowerbound > upperbound {
                    return Err(ValidationError::InvalidMigration(format!(
                        "lowerbound {} exceeds upperbound {}",
                        lowerbound, upperbound
                    )));
                }
                if source_pool == destination_pool {
                    return Err(ValidationError::InvalidMigration(format!(
                        "source and destination pool are both {}",
                        source_pool
                    )));
                }
                Ok(())
            }
        }
    }

    /// Strategy variant the engine dispatches on
    pub fn strategy(&self) -> MigrationStrategy {
        match self {
            MigrationConfig::Noop => MigrationStrategy::NoOp,
            MigrationConfig::UniformRandom {
                lowerbound,
                upperbound,
                ..
            } => MigrationStrategy::UniformRandom {
                lowerbound: *lowerbound,
                upperbound: *upperbound,
            },
        }
    }

    /// Source/destination pool pair for migration transactions
    pub fn pools(&self) -> MigrationPools {
        match self {
            MigrationConfig::Noop => MigrationPools {
                source: default_source_pool(),
                destination: default_destination_pool(),
            },
            MigrationConfig::UniformRandom {
                source_pool,
                destination_pool,
                ..
            } => MigrationPools {
                source: *source_pool,
                destination: *destination_pool,
            },
        }
    }
}

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<SimulationConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)?;
    let config: SimulationConfig = serde_yaml::from_reader(file)?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub seed: Option<u64>,
    pub periods: Option<u64>,
    pub users: Option<u32>,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut SimulationConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(seed) = overrides.seed {
        info!("Overriding seed: {}", seed);
        config.seed = seed;
    }
    if let Some(periods) = overrides.periods {
        info!("Overriding periods: {}", periods);
        config.periods = periods;
    }
    if let Some(users) = overrides.users {
        info!("Overriding user_count: {}", users);
        config.user_count = users;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
