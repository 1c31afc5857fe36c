//! Error types for the command line front end.

use std::path::PathBuf;

use hn_solver::SolverError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read network file: {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid network definition: {0}")]
    Definition(String),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}
