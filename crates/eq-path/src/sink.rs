//! Per-step data consumers.

use crate::error::PathResult;
use crate::query::{CompiledQuery, PropertyRegistry};
use eq_chem::ChemicalSystem;
use eq_solver::ChemicalState;

/// Receives one row of values per accepted path step.
pub trait PathSink {
    /// Called once before the first row with the column labels.
    fn begin(&mut self, labels: &[String]) -> PathResult<()>;

    /// One accepted step; `row` matches the labels passed to `begin`.
    fn record(&mut self, row: &[f64]) -> PathResult<()>;

    /// Called once after the last row, also when the path fails.
    fn finish(&mut self) -> PathResult<()>;
}

/// A column of per-step values: the path parameter or a property query.
#[derive(Debug, Clone)]
pub enum Column {
    Parameter,
    Query(CompiledQuery),
}

impl Column {
    /// Resolve an expression; `t` is the path parameter.
    pub fn compile(
        registry: &PropertyRegistry,
        system: &ChemicalSystem,
        expression: &str,
    ) -> PathResult<Self> {
        if expression.trim() == "t" {
            Ok(Self::Parameter)
        } else {
            registry.compile(system, expression).map(Self::Query)
        }
    }

    pub fn value(&self, t: f64, state: &ChemicalState) -> f64 {
        match self {
            Self::Parameter => t,
            Self::Query(query) => query.evaluate(state),
        }
    }
}
