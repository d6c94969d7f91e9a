//! Scenario validation.
//!
//! Structural checks only: ids, references and numeric ranges. Substances,
//! units and queries depend on the chemical system and are checked when the
//! scenario is run.

use crate::schema::{PathDef, ProblemDef, QuantityDef, Scenario, SolverDef, SteppingDef};
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version == 0 || scenario.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    if scenario.system.elements.split_whitespace().next().is_none() {
        return Err(invalid(
            "system elements",
            &scenario.system.elements,
            "at least one element symbol is required",
        ));
    }

    let mut problem_ids = HashSet::new();
    for problem in &scenario.problems {
        if !problem_ids.insert(problem.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: problem.id.clone(),
                context: "problems".to_string(),
            });
        }
        validate_problem(problem)?;
    }

    validate_solver(&scenario.solver)?;

    if let Some(path) = &scenario.path {
        validate_path(path, &problem_ids)?;
    }

    Ok(())
}

fn validate_problem(problem: &ProblemDef) -> Result<(), ValidationError> {
    if problem.amounts.is_empty() {
        return Err(invalid(
            &format!("problem '{}' amounts", problem.id),
            "[]",
            "at least one substance is required",
        ));
    }

    for amount in &problem.amounts {
        if !amount.amount.is_finite() || amount.amount < 0.0 {
            return Err(invalid(
                &format!("problem '{}' amount of {}", problem.id, amount.substance),
                &amount.amount.to_string(),
                "must be finite and non-negative",
            ));
        }
    }

    let conditions = [
        ("temperature", &problem.temperature),
        ("pressure", &problem.pressure),
    ];
    for (name, quantity) in conditions {
        if let Some(QuantityDef { value, .. }) = quantity {
            if !value.is_finite() {
                return Err(invalid(
                    &format!("problem '{}' {}", problem.id, name),
                    &value.to_string(),
                    "must be finite",
                ));
            }
        }
    }

    Ok(())
}

fn validate_solver(solver: &SolverDef) -> Result<(), ValidationError> {
    if solver.max_iterations == Some(0) {
        return Err(invalid("solver max_iterations", "0", "must be positive"));
    }
    if let Some(tol) = solver.tolerance {
        if !(tol.is_finite() && tol > 0.0) {
            return Err(invalid(
                "solver tolerance",
                &tol.to_string(),
                "must be positive and finite",
            ));
        }
    }
    if let Some(tol) = solver.mass_balance {
        let ok = tol.abs.is_finite() && tol.abs >= 0.0 && tol.rel.is_finite() && tol.rel >= 0.0;
        if !ok {
            return Err(invalid(
                "solver mass_balance",
                &format!("{{abs: {}, rel: {}}}", tol.abs, tol.rel),
                "must be finite and non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_path(path: &PathDef, problem_ids: &HashSet<&str>) -> Result<(), ValidationError> {
    for (context, id) in [("path from", &path.from), ("path to", &path.to)] {
        if !problem_ids.contains(id.as_str()) {
            return Err(ValidationError::MissingReference {
                id: id.clone(),
                context: context.to_string(),
            });
        }
    }

    match &path.stepping {
        SteppingDef::Fixed { steps: 0 } => {
            return Err(invalid("path stepping steps", "0", "must be positive"));
        }
        SteppingDef::Fixed { .. } => {}
        SteppingDef::Adaptive {
            initial,
            min,
            max,
            grow_factor,
            cutback_factor,
        } => {
            let fields = [
                ("initial", initial),
                ("min", min),
                ("max", max),
                ("grow_factor", grow_factor),
                ("cutback_factor", cutback_factor),
            ];
            for (name, value) in fields {
                if let Some(v) = value {
                    if !(v.is_finite() && *v > 0.0) {
                        return Err(invalid(
                            &format!("path stepping {name}"),
                            &v.to_string(),
                            "must be positive and finite",
                        ));
                    }
                }
            }
        }
    }

    if path.max_steps == Some(0) {
        return Err(invalid("path max_steps", "0", "must be positive"));
    }

    for (i, plot) in path.plots.iter().enumerate() {
        if plot.series.is_empty() {
            return Err(invalid(
                &format!("path plot #{i} series"),
                "[]",
                "at least one series is required",
            ));
        }
    }

    let mut files = HashSet::new();
    for output in &path.outputs {
        if !files.insert(&output.file) {
            return Err(ValidationError::DuplicateId {
                id: output.file.display().to_string(),
                context: "path outputs".to_string(),
            });
        }
        if output.columns.is_empty() {
            return Err(invalid(
                &format!("output '{}' columns", output.file.display()),
                "[]",
                "at least one column is required",
            ));
        }
    }

    Ok(())
}

fn invalid(field: &str, value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use std::path::PathBuf;

    fn scenario() -> Scenario {
        Scenario {
            version: 1,
            name: "NaCl".to_string(),
            system: SystemDef {
                elements: "Na Cl".to_string(),
                database: None,
            },
            problems: vec![ProblemDef {
                id: "brine".to_string(),
                temperature: Some(QuantityDef::new(25.0, "degC")),
                pressure: None,
                amounts: vec![
                    AmountDef::new("H2O", 1.0, "kg"),
                    AmountDef::new("NaCl", 0.1, "mol"),
                ],
            }],
            solver: SolverDef::default(),
            path: None,
        }
    }

    fn with_path(mut s: Scenario) -> Scenario {
        s.path = Some(PathDef {
            from: "brine".to_string(),
            to: "brine".to_string(),
            stepping: SteppingDef::default(),
            max_steps: None,
            plots: vec![],
            outputs: vec![OutputDef {
                file: PathBuf::from("result.txt"),
                columns: vec![ColumnDef::new("t"), ColumnDef::new("pH")],
                delimiter: None,
                precision: None,
            }],
        });
        s
    }

    #[test]
    fn valid_scenario_passes() {
        validate_scenario(&scenario()).unwrap();
        validate_scenario(&with_path(scenario())).unwrap();
    }

    #[test]
    fn rejects_future_version() {
        let mut s = scenario();
        s.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::UnsupportedVersion { version: 2 })
        ));
    }

    #[test]
    fn rejects_duplicate_problem() {
        let mut s = scenario();
        s.problems.push(s.problems[0].clone());
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_negative_amount() {
        let mut s = scenario();
        s.problems[0].amounts[1].amount = -0.1;
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_missing_path_endpoint() {
        let mut s = with_path(scenario());
        if let Some(path) = s.path.as_mut() {
            path.to = "seawater".to_string();
        }
        match validate_scenario(&s) {
            Err(ValidationError::MissingReference { id, .. }) => assert_eq!(id, "seawater"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_output() {
        let mut s = with_path(scenario());
        if let Some(path) = s.path.as_mut() {
            path.outputs[0].columns.clear();
        }
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_zero_fixed_steps() {
        let mut s = with_path(scenario());
        if let Some(path) = s.path.as_mut() {
            path.stepping = SteppingDef::Fixed { steps: 0 };
        }
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_zero_tolerance() {
        let mut s = scenario();
        s.solver.tolerance = Some(0.0);
        assert!(validate_scenario(&s).is_err());
    }
}
