//! v1 cross-boundary contracts for the agent cognition core.

use serde::{Deserialize, Serialize};

pub mod agency;
pub mod archetype;
pub mod planning;
pub mod serde_seed;
pub mod tom;
pub mod world;

pub use agency::*;
pub use archetype::*;
pub use planning::*;
pub use tom::*;
pub use world::*;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Identity of one simulation run. The seed feeds every per-agent RNG stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulationConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub run_id: String,
    #[serde(with = "serde_seed")]
    pub seed: u64,
    pub max_ticks: u64,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION_V1.to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: "run_local_001".to_string(),
            seed: 1337,
            max_ticks: 240,
        }
    }
}
