//! Network file format.
//!
//! ```yaml
//! node_count: 3          # optional, derived from the elements otherwise
//! elements:
//!   - kind: pump
//!     inlet: 0
//!     outlet: 1
//!   - kind: pipe
//!     inlet: 1
//!     outlet: 2
//!     resistance: 1400.0
//! solver:                # optional overrides
//!   strategy: dense
//!   max_iterations: 50
//! ```

use hn_components::pump::{DEFAULT_MAX_HEAD, DEFAULT_RATED_FLOW};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<usize>,
    pub elements: Vec<ElementDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementDef {
    Pipe {
        inlet: u32,
        outlet: u32,
        /// Pa·s²/kg²
        resistance: f64,
    },
    Pump {
        inlet: u32,
        outlet: u32,
        /// Pa
        #[serde(default = "default_max_head")]
        max_head: f64,
        /// kg/s
        #[serde(default = "default_rated_flow")]
        rated_flow: f64,
    },
}

fn default_max_head() -> f64 {
    DEFAULT_MAX_HEAD
}

fn default_rated_flow() -> f64 {
    DEFAULT_RATED_FLOW
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyDef {
    Dense,
    Sparse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SolverDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jacobian_eps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_guess: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_pressure: Option<f64>,
    /// Enables clamp damping with this floor (scaled mass flux units)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping_floor: Option<f64>,
}
