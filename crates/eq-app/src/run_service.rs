//! Scenario execution: single equilibria and equilibrium paths.

use eq_chem::ChemicalSystem;
use eq_path::{EquilibriumPath, PathProgress, PropertyRegistry};
use eq_project::Scenario;
use eq_solver::{ActivityModelKind, ChemicalState, EquilibriumSolver};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use uom::si::pressure::bar;
use uom::si::thermodynamic_temperature::degree_celsius;

use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};
use crate::runtime;
use crate::scenario_service;

/// Options shared by every run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Write every output and plot file into this directory
    pub output_dir: Option<PathBuf>,
    /// Replace the scenario's activity model
    pub activity_model: Option<ActivityModelKind>,
}

/// Request to trace the path of a scenario file.
pub struct RunRequest<'a> {
    pub scenario_path: &'a Path,
    pub options: RunOptions,
}

/// Summary of a traced path.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub scenario: String,
    pub steps: usize,
    pub rejected_steps: usize,
    pub total_iterations: usize,
    /// Files written by outputs and plots
    pub files: Vec<PathBuf>,
    pub initial_ph: Option<f64>,
    pub final_ph: Option<f64>,
    pub elapsed_s: f64,
}

/// One species row of an equilibrium summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesRow {
    pub name: String,
    pub amount_mol: f64,
    pub molality: f64,
    pub activity_coefficient: f64,
}

/// Summary of a single equilibrium calculation.
#[derive(Debug, Clone)]
pub struct EquilibriumSummary {
    pub problem_id: String,
    pub temperature_c: f64,
    pub pressure_bar: f64,
    pub ph: Option<f64>,
    pub ionic_strength: f64,
    pub solvent_mass_kg: f64,
    pub iterations: usize,
    pub species: Vec<SpeciesRow>,
}

/// Species of a scenario's chemical system.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesSummary {
    pub name: String,
    pub formula: String,
    pub charge: i32,
    pub is_master: bool,
    pub log_k: f64,
}

fn emit(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    path: Option<PathProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            path,
        });
    }
}

fn base_dir(scenario_path: &Path) -> &Path {
    scenario_path.parent().unwrap_or(Path::new("."))
}

fn solver_for(scenario: &Scenario, options: &RunOptions) -> EquilibriumSolver {
    let mut def = scenario.solver.clone();
    if let Some(kind) = options.activity_model {
        def.activity_model = match kind {
            ActivityModelKind::Davies => eq_project::ActivityModelDef::Davies,
            ActivityModelKind::Ideal => eq_project::ActivityModelDef::Ideal,
        };
    }
    runtime::build_solver(&def)
}

fn ph_of(system: &ChemicalSystem, state: &ChemicalState) -> Option<f64> {
    system.species_index("H+").map(|h| state.ph(h))
}

/// Solve one problem of a scenario.
pub fn solve_problem(
    scenario: &Scenario,
    base_dir: &Path,
    problem_id: &str,
    options: &RunOptions,
) -> AppResult<EquilibriumSummary> {
    let problem_def = scenario_service::get_problem(scenario, problem_id)?;
    let system = runtime::build_system(&scenario.system, base_dir)?;
    let problem = runtime::build_problem(&system, problem_def)?;
    let state = solver_for(scenario, options).solve(&system, &problem)?;

    let species = system
        .species()
        .iter()
        .enumerate()
        .map(|(i, s)| SpeciesRow {
            name: s.name().to_string(),
            amount_mol: state.species_amount(i),
            molality: state.molality(i),
            activity_coefficient: state.activity_coefficient(i),
        })
        .collect();

    Ok(EquilibriumSummary {
        problem_id: problem_id.to_string(),
        temperature_c: state.temperature().get::<degree_celsius>(),
        pressure_bar: state.pressure().get::<bar>(),
        ph: ph_of(&system, &state),
        ionic_strength: state.ionic_strength(),
        solvent_mass_kg: state.solvent_mass_kg(),
        iterations: state.iterations(),
        species,
    })
}

/// Load a scenario file and solve one of its problems.
pub fn equilibrate(
    scenario_path: &Path,
    problem_id: &str,
    options: &RunOptions,
) -> AppResult<EquilibriumSummary> {
    let scenario = scenario_service::load_scenario(scenario_path)?;
    solve_problem(&scenario, base_dir(scenario_path), problem_id, options)
}

/// List the species the scenario's system selects.
pub fn list_species(scenario_path: &Path) -> AppResult<Vec<SpeciesSummary>> {
    let scenario = scenario_service::load_scenario(scenario_path)?;
    let system = runtime::build_system(&scenario.system, base_dir(scenario_path))?;
    Ok(system
        .species()
        .iter()
        .map(|s| SpeciesSummary {
            name: s.name().to_string(),
            formula: s.formula().text().to_string(),
            charge: s.charge(),
            is_master: s.is_master(),
            log_k: s.log_k(),
        })
        .collect())
}

/// Property queries usable in plots and outputs, with descriptions.
pub fn list_queries() -> Vec<(String, &'static str)> {
    PropertyRegistry::standard().describe().collect()
}

pub fn run(request: &RunRequest<'_>) -> AppResult<RunResponse> {
    run_with_progress(request, None)
}

pub fn run_with_progress(
    request: &RunRequest<'_>,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    emit(&mut progress_cb, RunStage::LoadingScenario, started, None);
    let scenario = scenario_service::load_scenario(request.scenario_path)?;
    run_scenario(
        &scenario,
        base_dir(request.scenario_path),
        &request.options,
        progress_cb,
    )
}

/// Trace the path of an already loaded scenario.
pub fn run_scenario(
    scenario: &Scenario,
    base_dir: &Path,
    options: &RunOptions,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let path_def = scenario
        .path
        .as_ref()
        .ok_or_else(|| AppError::NoPath(scenario.name.clone()))?;

    emit(&mut progress_cb, RunStage::BuildingSystem, started, None);
    let system = runtime::build_system(&scenario.system, base_dir)?;
    let from = runtime::build_problem(&system, scenario_service::get_problem(scenario, &path_def.from)?)?;
    let to = runtime::build_problem(&system, scenario_service::get_problem(scenario, &path_def.to)?)?;

    emit(&mut progress_cb, RunStage::SolvingEndpoints, started, None);
    let solver = solver_for(scenario, options);
    let state1 = solver.solve(&system, &from)?;
    let state2 = solver.solve(&system, &to)?;

    let mut path = EquilibriumPath::new(&system);
    path.set_solver(solver);
    runtime::configure_path(&mut path, path_def, options.output_dir.as_deref());

    info!(
        scenario = %scenario.name,
        from = %path_def.from,
        to = %path_def.to,
        "tracing equilibrium path"
    );
    emit(&mut progress_cb, RunStage::TracingPath, started, None);
    let report = path.solve_with_progress(&state1, &state2, |p| {
        emit(&mut progress_cb, RunStage::TracingPath, started, Some(*p));
    })?;

    let mut files: Vec<PathBuf> = path
        .outputs()
        .iter()
        .filter_map(|o| o.path().map(Path::to_path_buf))
        .collect();
    for plot in path.plots() {
        if let Some(stem) = plot.file_stem() {
            for suffix in [".dat", ".plt"] {
                let mut name = stem.as_os_str().to_owned();
                name.push(suffix);
                files.push(PathBuf::from(name));
            }
        }
    }

    let response = RunResponse {
        scenario: scenario.name.clone(),
        steps: report.parameters.len(),
        rejected_steps: report.rejected_steps,
        total_iterations: report.iterations.iter().sum(),
        files,
        initial_ph: ph_of(&system, &state1),
        final_ph: ph_of(&system, &report.final_state),
        elapsed_s: started.elapsed().as_secs_f64(),
    };
    emit(&mut progress_cb, RunStage::Completed, started, None);
    info!(
        steps = response.steps,
        rejected = response.rejected_steps,
        elapsed_s = response.elapsed_s,
        "scenario run complete"
    );
    Ok(response)
}
