//! Property queries evaluated on equilibrium states.
//!
//! A query is a name, optionally with one argument: `pH`,
//! `speciesMolality(HCO3-)`, `elementAmount(C)`. Queries are compiled once
//! against a chemical system into a function pointer plus the resolved
//! species or element index; evaluation does no lookups.

use crate::error::{PathError, PathResult};
use eq_chem::ChemicalSystem;
use eq_solver::ChemicalState;
use std::fmt;

type QueryFn = fn(&ChemicalState, usize) -> f64;

/// What a query's argument names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arg {
    /// No argument.
    None,
    /// No argument; bound to the hydrogen ion.
    HydrogenIon,
    Species,
    Element,
}

#[derive(Clone, Copy)]
struct Entry {
    name: &'static str,
    arg: Arg,
    func: QueryFn,
    description: &'static str,
}

/// Query resolved against one chemical system.
#[derive(Clone)]
pub struct CompiledQuery {
    expression: String,
    func: QueryFn,
    index: usize,
}

impl CompiledQuery {
    /// The expression this query was compiled from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn evaluate(&self, state: &ChemicalState) -> f64 {
        (self.func)(state, self.index)
    }
}

impl fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("expression", &self.expression)
            .field("index", &self.index)
            .finish()
    }
}

/// Named property functions.
#[derive(Clone)]
pub struct PropertyRegistry {
    entries: Vec<Entry>,
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.name))
            .finish()
    }
}

impl PropertyRegistry {
    /// Registry with every built-in query.
    pub fn standard() -> Self {
        let entries = vec![
            Entry {
                name: "pH",
                arg: Arg::HydrogenIon,
                func: |s, h| s.ph(h),
                description: "-log10 of the H+ activity",
            },
            Entry {
                name: "temperature",
                arg: Arg::None,
                func: |s, _| s.temperature_k(),
                description: "temperature [K]",
            },
            Entry {
                name: "pressure",
                arg: Arg::None,
                func: |s, _| s.pressure_pa(),
                description: "pressure [Pa]",
            },
            Entry {
                name: "ionicStrength",
                arg: Arg::None,
                func: |s, _| s.ionic_strength(),
                description: "ionic strength [mol/kg]",
            },
            Entry {
                name: "solventMass",
                arg: Arg::None,
                func: |s, _| s.solvent_mass_kg(),
                description: "mass of water [kg]",
            },
            Entry {
                name: "speciesAmount",
                arg: Arg::Species,
                func: |s, i| s.species_amount(i),
                description: "species amount [mol]",
            },
            Entry {
                name: "speciesMolality",
                arg: Arg::Species,
                func: |s, i| s.molality(i),
                description: "species molality [mol/kg]",
            },
            Entry {
                name: "speciesActivity",
                arg: Arg::Species,
                func: |s, i| s.activity(i),
                description: "species activity",
            },
            Entry {
                name: "speciesActivityCoefficient",
                arg: Arg::Species,
                func: |s, i| s.activity_coefficient(i),
                description: "species activity coefficient",
            },
            Entry {
                name: "speciesMoleFraction",
                arg: Arg::Species,
                func: |s, i| s.mole_fraction(i),
                description: "species mole fraction in the aqueous phase",
            },
            Entry {
                name: "elementAmount",
                arg: Arg::Element,
                func: |s, e| s.element_amount(e),
                description: "element amount [mol]",
            },
            Entry {
                name: "elementMolality",
                arg: Arg::Element,
                func: |s, e| s.element_molality(e),
                description: "element amount per kg of water [mol/kg]",
            },
        ];
        Self { entries }
    }

    /// Query names with a short description, for listings.
    pub fn describe(&self) -> impl Iterator<Item = (String, &'static str)> + '_ {
        self.entries.iter().map(|e| {
            let usage = match e.arg {
                Arg::None | Arg::HydrogenIon => e.name.to_string(),
                Arg::Species => format!("{}(species)", e.name),
                Arg::Element => format!("{}(element)", e.name),
            };
            (usage, e.description)
        })
    }

    /// Resolve `expression` against `system`.
    pub fn compile(&self, system: &ChemicalSystem, expression: &str) -> PathResult<CompiledQuery> {
        let (name, argument) = split_expression(expression)?;
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| query_error(expression, format!("unknown property '{}'", name)))?;

        let index = match (entry.arg, argument) {
            (Arg::None, None) => 0,
            (Arg::HydrogenIon, None) => system
                .species_index("H+")
                .ok_or_else(|| query_error(expression, "system has no H+ species"))?,
            (Arg::Species, Some(species)) => system
                .species_index(species)
                .ok_or_else(|| query_error(expression, format!("unknown species '{}'", species)))?,
            (Arg::Element, Some(symbol)) => system
                .element_index(symbol)
                .ok_or_else(|| query_error(expression, format!("unknown element '{}'", symbol)))?,
            (Arg::None | Arg::HydrogenIon, Some(_)) => {
                return Err(query_error(expression, "property takes no argument"));
            }
            (Arg::Species | Arg::Element, None) => {
                return Err(query_error(expression, "property needs an argument"));
            }
        };

        Ok(CompiledQuery {
            expression: expression.trim().to_string(),
            func: entry.func,
            index,
        })
    }
}

/// Split `name(arg)` into its parts. The argument may itself contain
/// parentheses, as in `speciesMolality(CO2(aq))`.
fn split_expression(expression: &str) -> PathResult<(&str, Option<&str>)> {
    let text = expression.trim();
    if text.is_empty() {
        return Err(query_error(expression, "empty query"));
    }
    let Some(open) = text.find('(') else {
        return Ok((text, None));
    };
    if !text.ends_with(')') {
        return Err(query_error(expression, "missing closing ')'"));
    }
    let name = text[..open].trim();
    let argument = text[open + 1..text.len() - 1].trim();
    if name.is_empty() || argument.is_empty() {
        return Err(query_error(expression, "expected name(argument)"));
    }
    Ok((name, Some(argument)))
}

fn query_error(query: &str, reason: impl Into<String>) -> PathError {
    PathError::Query {
        query: query.to_string(),
        reason: reason.into(),
    }
}
