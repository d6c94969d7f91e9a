//! Thermodynamic database of aqueous species.
//!
//! Every element has exactly one master species. Product species are defined
//! by formation reactions from master species, with `log_k` at 25 °C and a
//! reaction enthalpy for temperature correction. Water is the master species
//! of oxygen and the only solvent.

use crate::element::lookup_element;
use crate::error::{ChemError, ChemResult};
use crate::formula::canonical_name;
use crate::species::{Species, SpeciesDef, SpeciesKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

const CONSERVATION_TOL: f64 = 1e-9;

/// Element record in a database file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDef {
    pub symbol: String,
    /// Name of the master species for this element.
    pub master: String,
}

/// Serialized database layout (YAML/JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDef {
    pub elements: Vec<ElementDef>,
    pub species: Vec<SpeciesDef>,
}

/// Validated database.
#[derive(Debug, Clone)]
pub struct Database {
    elements: Vec<ElementDef>,
    species: Vec<Species>,
    by_name: HashMap<String, usize>,
}

impl Database {
    /// Built-in database covering H O C Na Cl K Ca Mg S.
    pub fn builtin() -> ChemResult<Self> {
        Self::from_def(builtin_def())
    }

    /// Validate and compile a database definition.
    pub fn from_def(def: DatabaseDef) -> ChemResult<Self> {
        let mut species = Vec::with_capacity(def.species.len());
        let mut by_name = HashMap::new();
        for sd in &def.species {
            let sp = Species::from_def(sd)?;
            if by_name.insert(canonical_name(sp.name()), species.len()).is_some() {
                return Err(db_error(format!("duplicate species '{}'", sp.name())));
            }
            species.push(sp);
        }

        let mut symbols = HashSet::new();
        let mut masters = HashSet::new();
        for el in &def.elements {
            if lookup_element(&el.symbol).is_none() {
                return Err(ChemError::UnknownElement {
                    symbol: el.symbol.clone(),
                });
            }
            if !symbols.insert(el.symbol.as_str()) {
                return Err(db_error(format!("duplicate element '{}'", el.symbol)));
            }
            let master_key = canonical_name(&el.master);
            let idx = by_name.get(&master_key).copied().ok_or_else(|| {
                db_error(format!(
                    "master species '{}' of element {} is not defined",
                    el.master, el.symbol
                ))
            })?;
            let master = &species[idx];
            if !master.is_master() {
                return Err(db_error(format!(
                    "master species '{}' must not have a formation reaction",
                    el.master
                )));
            }
            if master.formula().coefficient(&el.symbol) <= 0.0 {
                return Err(db_error(format!(
                    "master species '{}' does not contain element {}",
                    el.master, el.symbol
                )));
            }
            if !masters.insert(master_key) {
                return Err(db_error(format!(
                    "species '{}' is master of more than one element",
                    el.master
                )));
            }
        }

        let solvents: Vec<&Species> = species
            .iter()
            .filter(|s| s.kind() == SpeciesKind::Solvent)
            .collect();
        match solvents.as_slice() {
            [water] if water.is_master() && water.charge() == 0 => {}
            [other] => {
                return Err(db_error(format!(
                    "solvent '{}' must be a neutral master species",
                    other.name()
                )));
            }
            _ => return Err(db_error("database needs exactly one solvent species")),
        }

        for sp in &species {
            for symbol in sp.formula().elements().keys() {
                if !symbols.contains(symbol.as_str()) {
                    return Err(db_error(format!(
                        "species '{}' contains element {} which has no master species",
                        sp.name(),
                        symbol
                    )));
                }
            }
            if sp.is_master() {
                if !masters.contains(&canonical_name(sp.name())) {
                    return Err(db_error(format!(
                        "species '{}' has no reaction and is not a master species",
                        sp.name()
                    )));
                }
                continue;
            }
            check_reaction(sp, &species, &by_name, &masters)?;
        }

        Ok(Self {
            elements: def.elements,
            species,
            by_name,
        })
    }

    pub fn from_yaml_str(text: &str) -> ChemResult<Self> {
        Self::from_def(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> ChemResult<Self> {
        Self::from_def(serde_json::from_str(text)?)
    }

    /// Load a database file; the format follows the extension (`.yaml`, `.yml`, `.json`).
    pub fn load(path: &Path) -> ChemResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(db_error(format!(
                "unsupported database file extension: {}",
                path.display()
            ))),
        }
    }

    pub fn to_def(&self) -> DatabaseDef {
        DatabaseDef {
            elements: self.elements.clone(),
            species: self.species.iter().map(Species::to_def).collect(),
        }
    }

    pub fn elements(&self) -> &[ElementDef] {
        &self.elements
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Look up a species; charge suffixes match in either notation.
    pub fn species_by_name(&self, name: &str) -> Option<&Species> {
        self.by_name.get(&canonical_name(name)).map(|&i| &self.species[i])
    }

    /// Master species of an element.
    pub fn master_of(&self, symbol: &str) -> Option<&Species> {
        self.elements
            .iter()
            .find(|e| e.symbol == symbol)
            .and_then(|e| self.species_by_name(&e.master))
    }

    pub fn has_element(&self, symbol: &str) -> bool {
        self.elements.iter().any(|e| e.symbol == symbol)
    }
}

fn check_reaction(
    sp: &Species,
    species: &[Species],
    by_name: &HashMap<String, usize>,
    masters: &HashSet<String>,
) -> ChemResult<()> {
    let mut balance: BTreeMap<String, f64> = BTreeMap::new();
    let mut charge = 0.0;
    for term in sp.reaction() {
        let key = canonical_name(&term.species);
        if !masters.contains(&key) {
            return Err(db_error(format!(
                "reaction of '{}' references '{}', which is not a master species",
                sp.name(),
                term.species
            )));
        }
        let Some(&idx) = by_name.get(&key) else {
            return Err(ChemError::UnknownSpecies {
                name: term.species.clone(),
            });
        };
        let reactant = &species[idx];
        for (symbol, coeff) in reactant.formula().elements() {
            *balance.entry(symbol.clone()).or_insert(0.0) += term.coefficient * coeff;
        }
        charge += term.coefficient * f64::from(reactant.charge());
    }
    for (symbol, coeff) in sp.formula().elements() {
        *balance.entry(symbol.clone()).or_insert(0.0) -= coeff;
    }

    if let Some((symbol, _)) = balance
        .iter()
        .find(|(_, residual)| residual.abs() > CONSERVATION_TOL)
    {
        return Err(db_error(format!(
            "reaction of '{}' does not conserve element {}",
            sp.name(),
            symbol
        )));
    }
    if (charge - f64::from(sp.charge())).abs() > CONSERVATION_TOL {
        return Err(db_error(format!(
            "reaction of '{}' does not conserve charge",
            sp.name()
        )));
    }
    Ok(())
}

fn db_error(what: impl Into<String>) -> ChemError {
    ChemError::Database { what: what.into() }
}

fn element(symbol: &str, master: &str) -> ElementDef {
    ElementDef {
        symbol: symbol.to_string(),
        master: master.to_string(),
    }
}

/// Built-in data at 25 °C (log_k) with reaction enthalpies in kJ/mol.
fn builtin_def() -> DatabaseDef {
    let elements = vec![
        element("H", "H+"),
        element("O", "H2O"),
        element("C", "HCO3-"),
        element("Na", "Na+"),
        element("Cl", "Cl-"),
        element("K", "K+"),
        element("Ca", "Ca+2"),
        element("Mg", "Mg+2"),
        element("S", "SO4-2"),
    ];

    let mut species = vec![SpeciesDef::master("H2O").with_kind(SpeciesKind::Solvent)];
    species.extend(
        ["H+", "HCO3-", "Na+", "Cl-", "K+", "Ca+2", "Mg+2", "SO4-2"]
            .into_iter()
            .map(SpeciesDef::master),
    );

    let products: &[(&str, &[(&str, f64)], f64, f64)] = &[
        ("OH-", &[("H2O", 1.0), ("H+", -1.0)], -14.0, 55.90),
        ("CO3-2", &[("HCO3-", 1.0), ("H+", -1.0)], -10.329, 14.90),
        (
            "CO2(aq)",
            &[("HCO3-", 1.0), ("H+", 1.0), ("H2O", -1.0)],
            6.352,
            -9.109,
        ),
        (
            "NaCO3-",
            &[("Na+", 1.0), ("HCO3-", 1.0), ("H+", -1.0)],
            -9.059,
            52.18,
        ),
        ("NaHCO3(aq)", &[("Na+", 1.0), ("HCO3-", 1.0)], -0.25, 0.0),
        (
            "NaOH(aq)",
            &[("Na+", 1.0), ("H2O", 1.0), ("H+", -1.0)],
            -14.18,
            0.0,
        ),
        ("NaSO4-", &[("Na+", 1.0), ("SO4-2", 1.0)], 0.7, 4.69),
        ("KSO4-", &[("K+", 1.0), ("SO4-2", 1.0)], 0.85, 9.41),
        (
            "KOH(aq)",
            &[("K+", 1.0), ("H2O", 1.0), ("H+", -1.0)],
            -14.46,
            0.0,
        ),
        (
            "CaCO3(aq)",
            &[("Ca+2", 1.0), ("HCO3-", 1.0), ("H+", -1.0)],
            -7.105,
            29.73,
        ),
        ("CaHCO3+", &[("Ca+2", 1.0), ("HCO3-", 1.0)], 1.106, 11.25),
        (
            "CaOH+",
            &[("Ca+2", 1.0), ("H2O", 1.0), ("H+", -1.0)],
            -12.78,
            0.0,
        ),
        ("CaSO4(aq)", &[("Ca+2", 1.0), ("SO4-2", 1.0)], 2.25, 5.54),
        (
            "MgCO3(aq)",
            &[("Mg+2", 1.0), ("HCO3-", 1.0), ("H+", -1.0)],
            -7.349,
            26.25,
        ),
        ("MgHCO3+", &[("Mg+2", 1.0), ("HCO3-", 1.0)], 1.07, 3.31),
        (
            "MgOH+",
            &[("Mg+2", 1.0), ("H2O", 1.0), ("H+", -1.0)],
            -11.44,
            66.74,
        ),
        ("MgSO4(aq)", &[("Mg+2", 1.0), ("SO4-2", 1.0)], 2.37, 19.04),
        ("HSO4-", &[("SO4-2", 1.0), ("H+", 1.0)], 1.988, 16.11),
    ];
    species.extend(
        products
            .iter()
            .map(|(name, reaction, log_k, delta_h)| {
                SpeciesDef::product(name, reaction, *log_k, *delta_h)
            }),
    );

    DatabaseDef { elements, species }
}
