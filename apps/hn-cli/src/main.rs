mod error;
mod load;
mod schema;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use hn_core::{ElemId, NodeId};
use hn_solver::{Damping, NewtonSolver, SolverConfig};
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};
use crate::schema::{NetworkDef, StrategyDef};

#[derive(Parser)]
#[command(name = "hn-cli")]
#[command(about = "HydroNet CLI - steady-state hydraulic network solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct SolveArgs {
    /// Jacobian strategy (overrides the network file)
    #[arg(long, value_enum)]
    strategy: Option<StrategyDef>,
    /// Maximum Newton iterations (overrides the network file)
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Clamp steps that would reverse a positive mass flux
    #[arg(long)]
    damping: bool,
    /// Log how well each linear solve satisfies J·Δ = -G
    #[arg(long)]
    verify: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the built-in five node reference network
    Demo {
        #[command(flatten)]
        args: SolveArgs,
        /// Write the reference network as YAML instead of solving it
        #[arg(long)]
        write: Option<PathBuf>,
    },
    /// Solve a network described in a YAML file
    Solve {
        /// Path to the network YAML file
        network_path: PathBuf,
        #[command(flatten)]
        args: SolveArgs,
    },
    /// Export a network as a Graphviz digraph
    Dot {
        /// Path to the network YAML file
        network_path: PathBuf,
        /// Output file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { args, write } => match write {
            Some(path) => cmd_write_demo(&path),
            None => run_solve(&load::demo_network_def(), &args),
        },
        Commands::Solve { network_path, args } => {
            let def = load::read_network_def(&network_path)?;
            println!("Solving network: {}", network_path.display());
            run_solve(&def, &args)
        }
        Commands::Dot {
            network_path,
            output,
        } => cmd_dot(&network_path, output.as_deref()),
    }
}

fn solver_config(def: &NetworkDef, args: &SolveArgs) -> SolverConfig {
    let mut config = match &def.solver {
        Some(solver) => load::apply_solver_def(SolverConfig::default(), solver),
        None => SolverConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.strategy = load::strategy(strategy);
    }
    if let Some(n) = args.max_iterations {
        config.max_iterations = n;
    }
    if args.damping && config.damping.is_none() {
        config.damping = Some(Damping::clamp_negative());
    }
    config.verify_linear_solve |= args.verify;
    config
}

fn run_solve(def: &NetworkDef, args: &SolveArgs) -> CliResult<()> {
    let network = load::build_network(def)?;
    let config = solver_config(def, args);
    println!(
        "  {} nodes, {} elements, strategy {:?}",
        network.node_count(),
        network.element_count(),
        config.strategy
    );

    let start = Instant::now();
    let mut solver = NewtonSolver::new(network, config)?;
    let result = solver.solve();
    let elapsed = start.elapsed().as_secs_f64();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            println!("✗ Solve failed after {:.3}s", elapsed);
            return Err(CliError::Solver(e));
        }
    };

    println!(
        "✓ Converged in {} iterations ({:.3}s), residual {:.3e}",
        summary.iterations, elapsed, summary.residual_norm
    );
    println!(
        "  Residual evaluations per Jacobian: {}",
        solver.evaluations_per_jacobian()
    );

    let network = solver.network();
    println!("\nMass fluxes:");
    for elem in network.topology().elements() {
        let kind = network
            .element(elem.id)
            .map(|e| e.kind().to_string())
            .unwrap_or_default();
        let mdot = mass_flux(&solver, elem.id);
        println!(
            "  {:>3} {:<5} {} -> {}  {:>10.4} kg/s",
            elem.id, kind, elem.inlet, elem.outlet, mdot
        );
    }

    println!("\nPressures:");
    for node in network.topology().node_ids() {
        println!("  {:>3}  {:>12.2} Pa", node, pressure(&solver, node));
    }
    Ok(())
}

fn mass_flux(solver: &NewtonSolver, elem: ElemId) -> f64 {
    solver.mass_flux(elem).map_or(f64::NAN, |m| m.value)
}

fn pressure(solver: &NewtonSolver, node: NodeId) -> f64 {
    solver.pressure(node).map_or(f64::NAN, |p| p.value)
}

fn cmd_write_demo(path: &Path) -> CliResult<()> {
    let text = serde_yaml::to_string(&load::demo_network_def())?;
    write_file(path, &text)?;
    println!("✓ Wrote reference network to {}", path.display());
    Ok(())
}

fn cmd_dot(network_path: &Path, output: Option<&Path>) -> CliResult<()> {
    let def = load::read_network_def(network_path)?;
    let dot = load::build_network(&def)?.to_dot();
    match output {
        Some(path) => {
            write_file(path, &dot)?;
            println!("✓ Exported graph to {}", path.display());
        }
        None => print!("{}", dot),
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> CliResult<()> {
    std::fs::write(path, contents).map_err(|source| CliError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}
