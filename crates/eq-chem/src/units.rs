//! Unit-aware numeric input.
//!
//! Values arrive either as `(value, unit)` pairs (the `EquilibriumProblem::add`
//! style) or as text with an embedded unit (`"25 C"`, `"1 bar"`, scenario
//! files). Both paths convert to canonical SI:
//!
//! - Amount: mol
//! - Mass: kg
//! - Temperature: K
//! - Pressure: Pa (absolute)

use std::fmt;

/// Dimension/quantity family for a numeric input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Amount of substance (canonical: mol)
    Amount,
    /// Mass (canonical: kg)
    Mass,
    /// Temperature (canonical: Kelvin)
    Temperature,
    /// Absolute pressure (canonical: Pa)
    Pressure,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount => write!(f, "Amount"),
            Self::Mass => write!(f, "Mass"),
            Self::Temperature => write!(f, "Temperature"),
            Self::Pressure => write!(f, "Pressure"),
        }
    }
}

/// Error in unit parsing or conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    /// Input text did not parse to a number + optional unit
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Unit not recognized for this quantity
    #[error("Unknown unit '{unit}' for {quantity}")]
    UnknownUnit { unit: String, quantity: String },
    /// Value out of physical range (e.g., negative absolute temperature)
    #[error("Value {value} out of range: {reason}")]
    OutOfRange { value: f64, reason: String },
}

/// Classify a unit string: amount units, mass units, or neither.
pub fn quantity_of_unit(unit: &str) -> Option<Quantity> {
    if amount_factor(unit).is_some() {
        Some(Quantity::Amount)
    } else if mass_factor(unit).is_some() {
        Some(Quantity::Mass)
    } else {
        None
    }
}

/// Convert a value expressed in `unit` to canonical SI for `quantity`.
pub fn convert_to_si(value: f64, unit: &str, quantity: Quantity) -> Result<f64, UnitError> {
    if !value.is_finite() {
        return Err(UnitError::OutOfRange {
            value,
            reason: "value must be finite".to_string(),
        });
    }
    let unit = unit.trim();
    let unknown = || UnitError::UnknownUnit {
        unit: unit.to_string(),
        quantity: quantity.to_string(),
    };

    match quantity {
        Quantity::Amount => amount_factor(unit).map(|f| value * f).ok_or_else(unknown),
        Quantity::Mass => mass_factor(unit).map(|f| value * f).ok_or_else(unknown),
        Quantity::Temperature => {
            let kelvin = match unit.to_lowercase().as_str() {
                "k" | "kelvin" | "" => value,
                "c" | "°c" | "degc" | "celsius" => value + 273.15,
                "f" | "°f" | "degf" | "fahrenheit" => (value + 459.67) * 5.0 / 9.0,
                _ => return Err(unknown()),
            };
            if kelvin <= 0.0 {
                return Err(UnitError::OutOfRange {
                    value: kelvin,
                    reason: "Absolute temperature must be > 0 K".to_string(),
                });
            }
            Ok(kelvin)
        }
        Quantity::Pressure => {
            let pa = match unit.to_lowercase().as_str() {
                "pa" | "pascal" | "" => value,
                "kpa" => value * 1e3,
                "mpa" => value * 1e6,
                "gpa" => value * 1e9,
                "bar" => value * 1e5,
                "mbar" => value * 100.0,
                "atm" => value * 101_325.0,
                "psi" | "psia" => value * 6_894.757,
                _ => return Err(unknown()),
            };
            if pa <= 0.0 {
                return Err(UnitError::OutOfRange {
                    value: pa,
                    reason: "Absolute pressure must be positive".to_string(),
                });
            }
            Ok(pa)
        }
    }
}

/// Parse a quantity value from text such as `"25 C"` or `"1bar"`.
pub fn parse_quantity(raw_text: &str, quantity: Quantity) -> Result<f64, UnitError> {
    let (value, unit) = split_value_and_unit(raw_text)?;
    convert_to_si(value, &unit, quantity)
}

/// Factor from `unit` to mol. Amount units are case-sensitive (`mmol` vs `Mmol`).
fn amount_factor(unit: &str) -> Option<f64> {
    match unit {
        "mol" => Some(1.0),
        "mmol" => Some(1e-3),
        "umol" | "µmol" => Some(1e-6),
        "nmol" => Some(1e-9),
        "kmol" => Some(1e3),
        _ => None,
    }
}

/// Factor from `unit` to kg.
fn mass_factor(unit: &str) -> Option<f64> {
    match unit {
        "kg" => Some(1.0),
        "g" => Some(1e-3),
        "mg" => Some(1e-6),
        "ug" | "µg" => Some(1e-9),
        "t" => Some(1e3),
        _ => None,
    }
}

/// Split a value+unit string into (numeric_value, unit_string).
///
/// Examples:
/// - "25C" -> (25.0, "C")
/// - "1.5 bar" -> (1.5, "bar")
/// - "300" -> (300.0, "")
fn split_value_and_unit(input: &str) -> Result<(f64, String), UnitError> {
    let trimmed = input.trim();

    // Numeric part: digits, sign, decimal point, and an exponent marker only when
    // followed by a digit or sign (so "1 degC" and "5e3 Pa" both split correctly).
    let chars: Vec<char> = trimmed.chars().collect();
    let mut split_idx = chars.len();
    for (i, &c) in chars.iter().enumerate() {
        let is_exponent = (c == 'e' || c == 'E')
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_digit() || *n == '-' || *n == '+');
        if !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || is_exponent) {
            split_idx = i;
            break;
        }
    }

    let num_part: String = chars[..split_idx].iter().collect();
    let unit_part: String = chars[split_idx..].iter().collect();

    let value: f64 = num_part.trim().parse().map_err(|_| {
        UnitError::ParseError(format!("Could not parse numeric value from '{}'", input))
    })?;

    Ok((value, unit_part.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_units() {
        assert_eq!(convert_to_si(2.0, "mol", Quantity::Amount).unwrap(), 2.0);
        assert!((convert_to_si(5.0, "mmol", Quantity::Amount).unwrap() - 5e-3).abs() < 1e-15);
        assert!(matches!(
            convert_to_si(1.0, "kg", Quantity::Amount),
            Err(UnitError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn mass_units() {
        assert_eq!(convert_to_si(1.0, "kg", Quantity::Mass).unwrap(), 1.0);
        assert!((convert_to_si(250.0, "g", Quantity::Mass).unwrap() - 0.25).abs() < 1e-15);
    }

    #[test]
    fn classify_units() {
        assert_eq!(quantity_of_unit("mol"), Some(Quantity::Amount));
        assert_eq!(quantity_of_unit("g"), Some(Quantity::Mass));
        assert_eq!(quantity_of_unit("liter"), None);
    }

    #[test]
    fn parse_celsius() {
        let t = parse_quantity("25 C", Quantity::Temperature).unwrap();
        assert!((t - 298.15).abs() < 1e-9);
        let t = parse_quantity("60degC", Quantity::Temperature).unwrap();
        assert!((t - 333.15).abs() < 1e-9);
    }

    #[test]
    fn parse_kelvin_default() {
        assert_eq!(parse_quantity("300", Quantity::Temperature).unwrap(), 300.0);
    }

    #[test]
    fn reject_non_positive_temperature() {
        assert!(matches!(
            parse_quantity("-300 C", Quantity::Temperature),
            Err(UnitError::OutOfRange { .. })
        ));
    }

    #[test]
    fn parse_pressures() {
        assert_eq!(parse_quantity("1 bar", Quantity::Pressure).unwrap(), 1e5);
        assert_eq!(parse_quantity("5e3 Pa", Quantity::Pressure).unwrap(), 5e3);
        assert_eq!(parse_quantity("1atm", Quantity::Pressure).unwrap(), 101_325.0);
    }

    #[test]
    fn unknown_unit_is_reported() {
        assert!(matches!(
            parse_quantity("3 furlong", Quantity::Pressure),
            Err(UnitError::UnknownUnit { unit, .. }) if unit == "furlong"
        ));
    }

    #[test]
    fn garbage_fails_to_parse() {
        assert!(matches!(
            parse_quantity("bar", Quantity::Pressure),
            Err(UnitError::ParseError(_))
        ));
    }
}
