//! Chemistry-layer errors.

use crate::units::UnitError;
use thiserror::Error;

/// Result type for chemistry operations.
pub type ChemResult<T> = Result<T, ChemError>;

/// Errors raised while describing chemical systems and problems.
#[derive(Error, Debug)]
pub enum ChemError {
    /// Element symbol not in the element table or not in the system.
    #[error("Unknown element: {symbol}")]
    UnknownElement { symbol: String },

    /// Species name not present in the database or system.
    #[error("Unknown species: {name}")]
    UnknownSpecies { name: String },

    /// Substance cannot be represented by the system's elements.
    #[error("Unknown substance '{substance}': {reason}")]
    UnknownSubstance { substance: String, reason: String },

    /// Unit string not recognized for the requested quantity.
    #[error("Invalid unit '{unit}' for {quantity}")]
    InvalidUnit { unit: String, quantity: String },

    /// Amount value not usable (negative or non-finite).
    #[error("Invalid amount for {what}: {value}")]
    InvalidAmount { what: String, value: f64 },

    /// Chemical formula could not be parsed.
    #[error("Invalid formula '{formula}': {reason}")]
    Formula { formula: String, reason: String },

    /// `build()` called before any phase was added.
    #[error("Chemical system has no phases")]
    NoPhases,

    /// Inconsistent database content.
    #[error("Database error: {what}")]
    Database { what: String },

    /// Numeric value with unit could not be parsed.
    #[error("Unit error: {0}")]
    Unit(UnitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<UnitError> for ChemError {
    fn from(err: UnitError) -> Self {
        match err {
            UnitError::UnknownUnit { unit, quantity } => ChemError::InvalidUnit { unit, quantity },
            other => ChemError::Unit(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ChemError::UnknownSubstance {
            substance: "CaCO3".into(),
            reason: "element Ca is not in the system".into(),
        };
        assert!(err.to_string().contains("CaCO3"));

        let err = ChemError::InvalidUnit {
            unit: "furlong".into(),
            quantity: "Amount".into(),
        };
        assert!(err.to_string().contains("furlong"));
    }

    #[test]
    fn unknown_unit_maps_to_invalid_unit() {
        let err: ChemError = UnitError::UnknownUnit {
            unit: "stone".into(),
            quantity: "Mass".into(),
        }
        .into();
        assert!(matches!(err, ChemError::InvalidUnit { .. }));

        let err: ChemError = UnitError::ParseError("oops".into()).into();
        assert!(matches!(err, ChemError::Unit(_)));
    }
}
