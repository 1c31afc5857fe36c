//! hn-components: flow element library for hydraulic networks.
//!
//! Provides models for the elements a network is built from:
//! - Pipes with a quadratic resistance law
//! - Pumps with a quadratic droop curve
//!
//! All elements implement the `FlowElement` trait: a pure pressure-loss (or
//! pressure-gain) relation between an element's mass flux and the pressures of
//! its two end nodes, with no knowledge of the solver.
//!
//! # Example
//!
//! ```
//! use hn_components::{FlowElement, Pipe};
//!
//! let pipe = Pipe::new(1400.0).unwrap();
//! // 0.5 kg/s through the pipe needs 350 Pa of pressure difference
//! let r = pipe.system_function(0.5, 1350.0, 1000.0);
//! assert!(r.abs() < 1e-9);
//! ```

pub mod common;
pub mod error;
pub mod pipe;
pub mod pump;
pub mod traits;

// Re-exports
pub use error::{ComponentError, ComponentResult};
pub use pipe::Pipe;
pub use pump::Pump;
pub use traits::{ElementKind, FlowElement};
