//! Build chemistry, solver and path objects from scenario definitions.

use eq_chem::{ChemicalEditor, ChemicalSystem, Database};
use eq_path::{AdaptiveStep, EquilibriumPath, FixedStep, OutputSpec, PlotSpec};
use eq_project::schema::{
    ActivityModelDef, OutputDef, PathDef, PlotDef, ProblemDef, SolverDef, SteppingDef, SystemDef,
};
use eq_solver::{ActivityModelKind, EquilibriumOptions, EquilibriumProblem, EquilibriumSolver};
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Build the chemical system. A relative database path is resolved against `base_dir`.
pub fn build_system(def: &SystemDef, base_dir: &Path) -> AppResult<ChemicalSystem> {
    let mut editor = match &def.database {
        Some(file) => {
            let path = base_dir.join(file);
            debug!(database = %path.display(), "loading species database");
            ChemicalEditor::with_database(Database::load(&path)?)
        }
        None => ChemicalEditor::new(),
    };
    editor.add_aqueous_phase(&def.elements)?;
    let system = editor.build()?;
    debug!(
        elements = system.num_elements(),
        species = system.num_species(),
        "chemical system built"
    );
    Ok(system)
}

pub fn build_problem<'a>(
    system: &'a ChemicalSystem,
    def: &ProblemDef,
) -> AppResult<EquilibriumProblem<'a>> {
    let in_problem = |e: eq_chem::ChemError| AppError::Chemistry(format!("problem '{}': {}", def.id, e));

    let mut problem = EquilibriumProblem::new(system);
    if let Some(t) = &def.temperature {
        problem.set_temperature(t.value, &t.unit).map_err(in_problem)?;
    }
    if let Some(p) = &def.pressure {
        problem.set_pressure(p.value, &p.unit).map_err(in_problem)?;
    }
    for amount in &def.amounts {
        problem
            .add(&amount.substance, amount.amount, &amount.unit)
            .map_err(in_problem)?;
    }
    Ok(problem)
}

pub fn build_solver(def: &SolverDef) -> EquilibriumSolver {
    let mut options = EquilibriumOptions {
        activity_model: match def.activity_model {
            ActivityModelDef::Davies => ActivityModelKind::Davies,
            ActivityModelDef::Ideal => ActivityModelKind::Ideal,
        },
        ..EquilibriumOptions::default()
    };
    if let Some(max_iterations) = def.max_iterations {
        options.newton.max_iterations = max_iterations;
    }
    if let Some(tol) = def.tolerance {
        options.newton.abs_tol = tol;
    }
    if let Some(tol) = def.mass_balance {
        options.mass_balance = tol;
    }
    EquilibriumSolver::new(options)
}

pub fn build_step_policy(def: &SteppingDef) -> StepChoice {
    match *def {
        SteppingDef::Fixed { steps } => StepChoice::Fixed(FixedStep::new(steps)),
        SteppingDef::Adaptive {
            initial,
            min,
            max,
            grow_factor,
            cutback_factor,
        } => {
            let d = AdaptiveStep::default();
            StepChoice::Adaptive(AdaptiveStep {
                initial: initial.unwrap_or(d.initial),
                min: min.unwrap_or(d.min),
                max: max.unwrap_or(d.max),
                grow_factor: grow_factor.unwrap_or(d.grow_factor),
                cutback_factor: cutback_factor.unwrap_or(d.cutback_factor),
                ..d
            })
        }
    }
}

/// Step policy selected by a scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepChoice {
    Fixed(FixedStep),
    Adaptive(AdaptiveStep),
}

/// Apply stepping, limits, plots and outputs of `def` to `path`.
///
/// With `output_dir`, every output and plot file keeps its file name but is
/// written into that directory.
pub fn configure_path(path: &mut EquilibriumPath<'_>, def: &PathDef, output_dir: Option<&Path>) {
    match build_step_policy(&def.stepping) {
        StepChoice::Fixed(policy) => path.set_step_policy(policy),
        StepChoice::Adaptive(policy) => path.set_step_policy(policy),
    };
    if let Some(max_steps) = def.max_steps {
        path.set_max_steps(max_steps);
    }

    for plot in &def.plots {
        let spec = plot_spec(plot);
        path.add_plot(match output_dir {
            Some(dir) => spec.relocated(dir),
            None => spec,
        });
    }
    for output in &def.outputs {
        let spec = output_spec(output);
        path.add_output(match output_dir {
            Some(dir) => spec.relocated(dir),
            None => spec,
        });
    }
}

fn plot_spec(def: &PlotDef) -> PlotSpec {
    let mut spec = PlotSpec::default();
    spec.x(&def.x);
    for series in &def.series {
        spec.y(&series.label, &series.query);
    }
    if let Some(title) = &def.title {
        spec.title(title);
    }
    if let Some(label) = &def.xlabel {
        spec.xlabel(label);
    }
    if let Some(label) = &def.ylabel {
        spec.ylabel(label);
    }
    if let Some(format) = &def.xformat {
        spec.xformat(format);
    }
    if let Some(format) = &def.yformat {
        spec.yformat(format);
    }
    if let Some(placement) = &def.legend {
        spec.legend(placement);
    }
    if let Some(stem) = &def.file {
        spec.file(stem);
    }
    spec
}

fn output_spec(def: &OutputDef) -> OutputSpec {
    let mut spec = OutputSpec::default();
    spec.filename(&def.file);
    for column in &def.columns {
        match &column.label {
            Some(label) => spec.add_labeled(&column.query, label),
            None => spec.add(&column.query),
        };
    }
    if let Some(delimiter) = def.delimiter {
        spec.delimiter(delimiter);
    }
    if let Some(precision) = def.precision {
        spec.precision(precision);
    }
    spec
}
