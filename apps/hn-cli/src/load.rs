//! Conversion from file definitions to solver inputs.

use std::path::Path;

use hn_components::Pump;
use hn_core::units::{kgps, pa};
use hn_solver::{Damping, JacobianStrategy, Network, NetworkBuilder, SolverConfig};

use crate::error::{CliError, CliResult};
use crate::schema::{ElementDef, NetworkDef, SolverDef, StrategyDef};

pub fn read_network_def(path: &Path) -> CliResult<NetworkDef> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_yaml::from_str(&content)?)
}

pub fn build_network(def: &NetworkDef) -> CliResult<Network> {
    if def.elements.is_empty() {
        return Err(CliError::Definition("no elements".to_string()));
    }
    let mut builder = match def.node_count {
        Some(n) => NetworkBuilder::new().with_node_count(n),
        None => NetworkBuilder::new(),
    };
    for element in &def.elements {
        match *element {
            ElementDef::Pipe {
                inlet,
                outlet,
                resistance,
            } => {
                builder.add_pipe(inlet, outlet, resistance)?;
            }
            ElementDef::Pump {
                inlet,
                outlet,
                max_head,
                rated_flow,
            } => {
                let pump = Pump::new(pa(max_head), kgps(rated_flow))
                    .map_err(hn_solver::SolverError::from)?;
                builder.add_pump(inlet, outlet, pump);
            }
        }
    }
    Ok(builder.build()?)
}

pub fn strategy(def: StrategyDef) -> JacobianStrategy {
    match def {
        StrategyDef::Dense => JacobianStrategy::Dense,
        StrategyDef::Sparse => JacobianStrategy::SparseColored,
    }
}

/// Layer file overrides on top of `config`.
pub fn apply_solver_def(mut config: SolverConfig, def: &SolverDef) -> SolverConfig {
    if let Some(s) = def.strategy {
        config.strategy = strategy(s);
    }
    if let Some(n) = def.max_iterations {
        config.max_iterations = n;
    }
    if let Some(t) = def.residual_threshold {
        config.residual_threshold = t;
    }
    if let Some(eps) = def.jacobian_eps {
        config.jacobian_eps = eps;
    }
    if let Some(y0) = def.initial_guess {
        config.initial_guess = y0;
    }
    if let Some(p) = def.reference_pressure {
        config.reference_pressure = p;
    }
    if let Some(floor) = def.damping_floor {
        config.damping = Some(Damping::ClampNegative { floor });
    }
    config
}

/// Five nodes, one pump and six pipes (two of them in parallel).
pub fn demo_network_def() -> NetworkDef {
    let pipe = |inlet, outlet, resistance| ElementDef::Pipe {
        inlet,
        outlet,
        resistance,
    };
    NetworkDef {
        node_count: None,
        elements: vec![
            ElementDef::Pump {
                inlet: 0,
                outlet: 1,
                max_head: hn_components::pump::DEFAULT_MAX_HEAD,
                rated_flow: hn_components::pump::DEFAULT_RATED_FLOW,
            },
            pipe(1, 2, 1400.0),
            pipe(1, 2, 2400.0),
            pipe(2, 0, 1000.0),
            pipe(2, 3, 1400.0),
            pipe(3, 4, 2400.0),
            pipe(4, 0, 2400.0),
        ],
        solver: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_solver::NewtonSolver;

    #[test]
    fn demo_network_solves() {
        let net = build_network(&demo_network_def()).unwrap();
        assert_eq!(net.element_count(), 7);
        assert_eq!(net.node_count(), 5);

        let mut solver = NewtonSolver::new(net, SolverConfig::default()).unwrap();
        let summary = solver.solve().unwrap();
        assert!(summary.residual_norm < 1.0);
    }

    #[test]
    fn demo_round_trips_through_yaml() {
        let def = demo_network_def();
        let text = serde_yaml::to_string(&def).unwrap();
        let back: NetworkDef = serde_yaml::from_str(&text).unwrap();
        assert_eq!(def, back);
    }

    #[test]
    fn overrides_are_applied() {
        let def = SolverDef {
            strategy: Some(StrategyDef::Dense),
            max_iterations: Some(5),
            damping_floor: Some(0.02),
            ..SolverDef::default()
        };
        let cfg = apply_solver_def(SolverConfig::default(), &def);
        assert_eq!(cfg.strategy, JacobianStrategy::Dense);
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.damping, Some(Damping::ClampNegative { floor: 0.02 }));
        assert_eq!(cfg.residual_threshold, 1.0);
    }

    #[test]
    fn bad_elements_are_reported() {
        let mut def = demo_network_def();
        def.elements.push(ElementDef::Pipe {
            inlet: 3,
            outlet: 3,
            resistance: 10.0,
        });
        assert!(matches!(build_network(&def), Err(CliError::Solver(_))));

        let def = NetworkDef {
            node_count: None,
            elements: vec![ElementDef::Pump {
                inlet: 0,
                outlet: 1,
                max_head: -1.0,
                rated_flow: 1.0,
            }],
            solver: None,
        };
        assert!(matches!(build_network(&def), Err(CliError::Solver(_))));

        let empty = NetworkDef {
            node_count: None,
            elements: Vec::new(),
            solver: None,
        };
        assert!(matches!(build_network(&empty), Err(CliError::Definition(_))));
    }

    #[test]
    fn out_of_range_node_indices_are_topology_errors() {
        let overflow: NetworkDef = serde_yaml::from_str(
            "elements:\n  - kind: pump\n    inlet: 0\n    outlet: 1\n  - kind: pipe\n    inlet: 4294967295\n    outlet: 0\n    resistance: 10.0\n",
        )
        .unwrap();
        assert!(matches!(
            build_network(&overflow),
            Err(CliError::Solver(hn_solver::SolverError::InvalidTopology(_)))
        ));

        let sparse: NetworkDef = serde_yaml::from_str(
            "elements:\n  - kind: pipe\n    inlet: 1\n    outlet: 4000000000\n    resistance: 10.0\n",
        )
        .unwrap();
        assert!(matches!(
            build_network(&sparse),
            Err(CliError::Solver(hn_solver::SolverError::InvalidTopology(_)))
        ));
    }
}
