//! Path tracing errors.

use eq_core::CoreError;
use eq_solver::SolverError;
use thiserror::Error;

pub type PathResult<T> = Result<T, PathError>;

#[derive(Error, Debug)]
pub enum PathError {
    /// The solver failed at `t` and the step policy gave up.
    #[error("Path tracing failed at t = {t}: {source}")]
    PathTracing {
        t: f64,
        #[source]
        source: Box<SolverError>,
    },

    /// An endpoint state was computed from a different chemical system.
    #[error("State {which} does not belong to the path's chemical system")]
    IncompatibleState { which: &'static str },

    #[error("Invalid property query '{query}': {reason}")]
    Query { query: String, reason: String },

    #[error("Path exceeded {max_steps} steps before reaching t = 1 (stopped at t = {t})")]
    StepLimit { t: f64, max_steps: usize },

    #[error("Invalid path configuration: {what}")]
    InvalidConfig { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
