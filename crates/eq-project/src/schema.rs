//! Scenario schema definitions.

use eq_core::Tolerances;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    pub system: SystemDef,
    #[serde(default)]
    pub problems: Vec<ProblemDef>,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathDef>,
}

impl Scenario {
    pub fn problem(&self, id: &str) -> Option<&ProblemDef> {
        self.problems.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemDef {
    /// Element symbols of the aqueous phase, e.g. `"H O C Na Cl"`
    pub elements: String,
    /// Database file (YAML or JSON); the built-in database when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// A value with a unit string, e.g. `{ value: 60, unit: degC }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantityDef {
    pub value: f64,
    pub unit: String,
}

impl QuantityDef {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<QuantityDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<QuantityDef>,
    #[serde(default)]
    pub amounts: Vec<AmountDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmountDef {
    pub substance: String,
    pub amount: f64,
    pub unit: String,
}

impl AmountDef {
    pub fn new(substance: impl Into<String>, amount: f64, unit: impl Into<String>) -> Self {
        Self {
            substance: substance.into(),
            amount,
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityModelDef {
    #[default]
    Davies,
    Ideal,
}

/// Solver overrides; anything left out keeps the solver default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default)]
    pub activity_model: ActivityModelDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    /// Newton convergence threshold on the residual max-norm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_balance: Option<Tolerances>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathDef {
    /// Problem id of the `t = 0` state
    pub from: String,
    /// Problem id of the `t = 1` state
    pub to: String,
    #[serde(default)]
    pub stepping: SteppingDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
    #[serde(default)]
    pub plots: Vec<PlotDef>,
    #[serde(default)]
    pub outputs: Vec<OutputDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SteppingDef {
    Fixed {
        steps: usize,
    },
    Adaptive {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        grow_factor: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cutback_factor: Option<f64>,
    },
}

impl Default for SteppingDef {
    fn default() -> Self {
        SteppingDef::Adaptive {
            initial: None,
            min: None,
            max: None,
            grow_factor: None,
            cutback_factor: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesDef {
    pub label: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotDef {
    pub x: String,
    pub series: Vec<SeriesDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xlabel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ylabel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xformat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yformat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
    /// Stem of the `.dat`/`.plt` files; the plot is only staged in memory when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDef {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ColumnDef {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            label: None,
        }
    }

    pub fn labeled(query: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            label: Some(label.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputDef {
    pub file: PathBuf,
    pub columns: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<usize>,
}
