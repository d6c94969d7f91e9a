//! Aqueous species definitions.
//!
//! A species is either a master species (one per element, no reaction) or a
//! product species defined by a formation reaction from master species:
//!
//! ```text
//! CO3-2 = HCO3- - H+        log_k = -10.329, delta_h = 14.9 kJ/mol
//! ```

use crate::error::{ChemError, ChemResult};
use crate::formula::Formula;
use eq_core::constants::{R, T_REF_K};
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_10;

/// Role of a species inside the aqueous phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesKind {
    /// The solvent (water).
    Solvent,
    /// Any dissolved species.
    #[default]
    Solute,
}

/// One term of a formation reaction: `coefficient * species`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionTerm {
    pub species: String,
    pub coefficient: f64,
}

impl ReactionTerm {
    pub fn new(species: impl Into<String>, coefficient: f64) -> Self {
        Self {
            species: species.into(),
            coefficient,
        }
    }
}

/// Serialized species record, as stored in database files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub name: String,
    /// Formula used for element composition; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default)]
    pub kind: SpeciesKind,
    /// Formation reaction from master species. Empty for master species.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reaction: Vec<ReactionTerm>,
    /// log10 K of the formation reaction at 25 °C.
    #[serde(default)]
    pub log_k: f64,
    /// Reaction enthalpy [kJ/mol], used for the van't Hoff correction.
    #[serde(default)]
    pub delta_h: f64,
}

impl SpeciesDef {
    /// Master species record (no formation reaction).
    pub fn master(name: &str) -> Self {
        Self {
            name: name.to_string(),
            formula: None,
            kind: SpeciesKind::Solute,
            reaction: Vec::new(),
            log_k: 0.0,
            delta_h: 0.0,
        }
    }

    /// Product species record.
    pub fn product(name: &str, reaction: &[(&str, f64)], log_k: f64, delta_h: f64) -> Self {
        Self {
            name: name.to_string(),
            formula: None,
            kind: SpeciesKind::Solute,
            reaction: reaction
                .iter()
                .map(|(s, c)| ReactionTerm::new(*s, *c))
                .collect(),
            log_k,
            delta_h,
        }
    }

    pub fn with_kind(mut self, kind: SpeciesKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Compiled species: parsed formula plus thermodynamic data.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    name: String,
    formula: Formula,
    kind: SpeciesKind,
    reaction: Vec<ReactionTerm>,
    log_k: f64,
    delta_h: f64,
}

impl Species {
    /// Compile a record, parsing its formula.
    pub fn from_def(def: &SpeciesDef) -> ChemResult<Self> {
        if def.name.trim().is_empty() {
            return Err(ChemError::Database {
                what: "species with empty name".to_string(),
            });
        }
        for (what, value) in [("log_k", def.log_k), ("delta_h", def.delta_h)] {
            if !value.is_finite() {
                return Err(ChemError::InvalidAmount {
                    what: format!("{} of {}", what, def.name),
                    value,
                });
            }
        }
        let formula = Formula::parse(def.formula.as_deref().unwrap_or(&def.name))?;
        Ok(Self {
            name: def.name.clone(),
            formula,
            kind: def.kind,
            reaction: def.reaction.clone(),
            log_k: def.log_k,
            delta_h: def.delta_h,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn kind(&self) -> SpeciesKind {
        self.kind
    }

    pub fn charge(&self) -> i32 {
        self.formula.charge()
    }

    pub fn reaction(&self) -> &[ReactionTerm] {
        &self.reaction
    }

    pub fn log_k(&self) -> f64 {
        self.log_k
    }

    pub fn delta_h(&self) -> f64 {
        self.delta_h
    }

    /// Master species carry no formation reaction.
    pub fn is_master(&self) -> bool {
        self.reaction.is_empty()
    }

    /// Molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.formula.molar_mass()
    }

    /// Natural log of the formation constant at `t_kelvin` (van't Hoff).
    pub fn ln_k(&self, t_kelvin: f64) -> f64 {
        let ln_k_ref = LN_10 * self.log_k;
        ln_k_ref - self.delta_h * 1000.0 / R * (1.0 / t_kelvin - 1.0 / T_REF_K)
    }

    pub fn to_def(&self) -> SpeciesDef {
        SpeciesDef {
            name: self.name.clone(),
            formula: (self.formula.text() != self.name).then(|| self.formula.text().to_string()),
            kind: self.kind,
            reaction: self.reaction.clone(),
            log_k: self.log_k,
            delta_h: self.delta_h,
        }
    }
}
