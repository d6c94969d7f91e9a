//! Error types for the eq-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Failed to read scenario file: {path}")]
    ScenarioFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Problem not found: {0}")]
    ProblemNotFound(String),

    #[error("Scenario '{0}' defines no path")]
    NoPath(String),

    #[error("Chemistry error: {0}")]
    Chemistry(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Path error: {0}")]
    Path(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for eq-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<eq_project::ProjectError> for AppError {
    fn from(err: eq_project::ProjectError) -> Self {
        match err {
            eq_project::ProjectError::Io(source) => AppError::Io(source),
            other => AppError::Scenario(other.to_string()),
        }
    }
}

impl From<eq_chem::ChemError> for AppError {
    fn from(err: eq_chem::ChemError) -> Self {
        AppError::Chemistry(err.to_string())
    }
}

impl From<eq_solver::SolverError> for AppError {
    fn from(err: eq_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<eq_path::PathError> for AppError {
    fn from(err: eq_path::PathError) -> Self {
        AppError::Path(err.to_string())
    }
}
