//! Scenario loading, validation and introspection.

use eq_project::{ProblemDef, ProjectError, Scenario};
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Summary of a problem for listing.
#[derive(Debug, Clone)]
pub struct ProblemSummary {
    pub id: String,
    pub substance_count: usize,
    pub temperature: Option<String>,
    pub is_path_endpoint: bool,
}

/// Load and validate a scenario file (YAML or JSON).
pub fn load_scenario(path: &Path) -> AppResult<Scenario> {
    eq_project::load(path).map_err(|e| match e {
        ProjectError::Io(source) => AppError::ScenarioFileRead {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

pub fn validate_scenario(scenario: &Scenario) -> AppResult<()> {
    eq_project::validate_scenario(scenario)
        .map_err(|e| AppError::Scenario(format!("Validation failed: {}", e)))
}

pub fn list_problems(scenario: &Scenario) -> Vec<ProblemSummary> {
    let endpoints: Vec<&str> = scenario
        .path
        .iter()
        .flat_map(|p| [p.from.as_str(), p.to.as_str()])
        .collect();

    scenario
        .problems
        .iter()
        .map(|problem| ProblemSummary {
            id: problem.id.clone(),
            substance_count: problem.amounts.len(),
            temperature: problem
                .temperature
                .as_ref()
                .map(|t| format!("{} {}", t.value, t.unit)),
            is_path_endpoint: endpoints.contains(&problem.id.as_str()),
        })
        .collect()
}

/// Get a specific problem by ID.
pub fn get_problem<'a>(scenario: &'a Scenario, problem_id: &str) -> AppResult<&'a ProblemDef> {
    scenario
        .problem(problem_id)
        .ok_or_else(|| AppError::ProblemNotFound(problem_id.to_string()))
}
