//! Chemical formula parsing.
//!
//! Accepted forms:
//! - plain formulas: `H2O`, `CO2`, `NaHCO3`, `C6H12O6`
//! - parenthesized groups: `Ca(OH)2`, `Fe(CN)6-3`
//! - phase marks (ignored): `CO2(aq)`, `H2O(l)`, `CaCO3(s)`, `CO2(g)`
//! - charges: `H+`, `CO3--`, `Ca++`, `Ca+2`, `SO4-2`

use crate::element::lookup_element;
use crate::error::{ChemError, ChemResult};
use std::collections::BTreeMap;
use std::fmt;

/// Parsed chemical formula: element coefficients plus electric charge.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    text: String,
    elements: BTreeMap<String, f64>,
    charge: i32,
}

impl Formula {
    /// Parse a formula string.
    pub fn parse(text: &str) -> ChemResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(formula_error(text, "empty formula"));
        }

        let without_phase = strip_phase_mark(trimmed);
        let (body, charge) = split_charge(without_phase);
        if body.is_empty() {
            return Err(formula_error(text, "formula has no elements"));
        }

        let chars: Vec<char> = body.chars().collect();
        let mut pos = 0;
        let elements = parse_sequence(text, &chars, &mut pos, 0)?;
        if pos != chars.len() {
            return Err(formula_error(text, "unbalanced ')'"));
        }
        if elements.is_empty() {
            return Err(formula_error(text, "formula has no elements"));
        }

        Ok(Self {
            text: trimmed.to_string(),
            elements,
            charge,
        })
    }

    /// Original formula text (trimmed).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Element symbols and their coefficients.
    pub fn elements(&self) -> &BTreeMap<String, f64> {
        &self.elements
    }

    /// Coefficient of an element (0.0 if absent).
    pub fn coefficient(&self, symbol: &str) -> f64 {
        self.elements.get(symbol).copied().unwrap_or(0.0)
    }

    /// Electric charge in units of the elementary charge.
    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn is_neutral(&self) -> bool {
        self.charge == 0
    }

    /// Molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.elements
            .iter()
            .filter_map(|(symbol, n)| lookup_element(symbol).map(|e| e.molar_mass * n))
            .sum()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl std::str::FromStr for Formula {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

/// Species name with a single charge spelling: a sign followed by the
/// magnitude, the magnitude omitted for 1. `CO3--` and `CO3-2` both give
/// `CO3-2`, `Na+1` gives `Na+`.
pub fn canonical_name(name: &str) -> String {
    let (body, charge) = split_charge(name.trim());
    match charge {
        0 => body.to_string(),
        1 => format!("{}+", body),
        -1 => format!("{}-", body),
        z if z > 0 => format!("{}+{}", body, z),
        z => format!("{}-{}", body, -z),
    }
}

fn formula_error(text: &str, reason: &str) -> ChemError {
    ChemError::Formula {
        formula: text.to_string(),
        reason: reason.to_string(),
    }
}

/// Remove a trailing lowercase phase mark such as `(aq)` or `(g)`.
fn strip_phase_mark(text: &str) -> &str {
    if !text.ends_with(')') {
        return text;
    }
    match text.rfind('(') {
        Some(open) => {
            let inner = &text[open + 1..text.len() - 1];
            if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_lowercase()) {
                &text[..open]
            } else {
                text
            }
        }
        None => text,
    }
}

/// Split a trailing charge suffix from the formula body.
fn split_charge(text: &str) -> (&str, i32) {
    let Some(last) = text.chars().last() else {
        return (text, 0);
    };

    // Run of signs: `CO3--`, `Ca++`, `H+`
    if last == '+' || last == '-' {
        let run = text.chars().rev().take_while(|&c| c == last).count();
        let magnitude = run as i32;
        let sign = if last == '+' { 1 } else { -1 };
        return (&text[..text.len() - run], sign * magnitude);
    }

    // Sign followed by digits: `Ca+2`, `SO4-2`
    if last.is_ascii_digit() {
        if let Some(idx) = text.rfind(['+', '-']) {
            let digits = &text[idx + 1..];
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(magnitude) = digits.parse::<i32>() {
                    let sign = if text[idx..].starts_with('+') { 1 } else { -1 };
                    return (&text[..idx], sign * magnitude);
                }
            }
        }
    }

    (text, 0)
}

fn parse_sequence(
    text: &str,
    chars: &[char],
    pos: &mut usize,
    depth: usize,
) -> ChemResult<BTreeMap<String, f64>> {
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();

    while *pos < chars.len() {
        let c = chars[*pos];
        match c {
            'A'..='Z' => {
                let start = *pos;
                *pos += 1;
                while *pos < chars.len() && chars[*pos].is_ascii_lowercase() {
                    *pos += 1;
                }
                let symbol: String = chars[start..*pos].iter().collect();
                if lookup_element(&symbol).is_none() {
                    return Err(ChemError::UnknownElement { symbol });
                }
                let n = parse_count(text, chars, pos)?;
                *counts.entry(symbol).or_insert(0.0) += n;
            }
            '(' => {
                *pos += 1;
                let inner = parse_sequence(text, chars, pos, depth + 1)?;
                if *pos >= chars.len() || chars[*pos] != ')' {
                    return Err(formula_error(text, "unbalanced '('"));
                }
                *pos += 1;
                let n = parse_count(text, chars, pos)?;
                for (symbol, k) in inner {
                    *counts.entry(symbol).or_insert(0.0) += k * n;
                }
            }
            ')' => {
                if depth == 0 {
                    return Err(formula_error(text, "unbalanced ')'"));
                }
                return Ok(counts);
            }
            other => {
                return Err(formula_error(
                    text,
                    &format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    if depth > 0 {
        return Err(formula_error(text, "unbalanced '('"));
    }
    Ok(counts)
}

/// Parse an optional stoichiometric count (integer or decimal); defaults to 1.
fn parse_count(text: &str, chars: &[char], pos: &mut usize) -> ChemResult<f64> {
    let start = *pos;
    while *pos < chars.len() && (chars[*pos].is_ascii_digit() || chars[*pos] == '.') {
        *pos += 1;
    }
    if start == *pos {
        return Ok(1.0);
    }
    let digits: String = chars[start..*pos].iter().collect();
    digits
        .parse::<f64>()
        .map_err(|_| formula_error(text, &format!("bad count '{}'", digits)))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn counts_survive_formatting(h in 1_u32..20, c in 1_u32..20, o in 1_u32..20) {
            let text = format!("C{}H{}O{}", c, h, o);
            let f = Formula::parse(&text).unwrap();
            prop_assert_eq!(f.coefficient("C"), c as f64);
            prop_assert_eq!(f.coefficient("H"), h as f64);
            prop_assert_eq!(f.coefficient("O"), o as f64);
        }
    }
}
