//! Application service layer for equilibrium path scenarios.
//!
//! Loads scenario files, builds the chemical system, problems, solver and
//! path they describe, and runs them. The CLI is a thin shell over this crate.

pub mod demo;
pub mod error;
pub mod progress;
pub mod run_service;
pub mod runtime;
pub mod scenario_service;

pub use demo::{co2_scenario, run_demo};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use run_service::{
    EquilibriumSummary, RunOptions, RunRequest, RunResponse, SpeciesRow, SpeciesSummary,
    equilibrate, list_queries, list_species, run, run_scenario, run_with_progress, solve_problem,
};
pub use runtime::{StepChoice, build_problem, build_solver, build_system, configure_path};
pub use scenario_service::{ProblemSummary, get_problem, list_problems, load_scenario, validate_scenario};
