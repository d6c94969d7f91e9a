//! Error types for equilibrium solving.

use eq_chem::ChemError;
use eq_core::CoreError;
use thiserror::Error;

/// Errors that can occur while solving for equilibrium.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Equilibrium did not converge after {iterations} iterations (residual {residual:e})")]
    Convergence { iterations: usize, residual: f64 },

    #[error("Mass balance of element {element} violated after convergence (residual {residual:e} mol)")]
    MassBalance { element: String, residual: f64 },

    #[error("Invalid state: {what}")]
    InvalidState { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Chemistry error: {0}")]
    Chem(#[from] ChemError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;
