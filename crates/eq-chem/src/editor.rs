//! Chemical system builder.

use crate::database::Database;
use crate::element::lookup_element;
use crate::error::{ChemError, ChemResult};
use crate::formula::canonical_name;
use crate::species::SpeciesKind;
use crate::system::ChemicalSystem;
use std::collections::{BTreeSet, HashMap};

/// Collects phase definitions and builds an immutable [`ChemicalSystem`].
#[derive(Debug, Clone, Default)]
pub struct ChemicalEditor {
    database: Option<Database>,
    aqueous_elements: Option<BTreeSet<String>>,
}

impl ChemicalEditor {
    /// Editor over the built-in database.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(database: Database) -> Self {
        Self {
            database: Some(database),
            aqueous_elements: None,
        }
    }

    /// Add an aqueous phase spanning the given whitespace-separated element
    /// symbols. H and O are always included. Repeated calls extend the set.
    pub fn add_aqueous_phase(&mut self, elements: &str) -> ChemResult<&mut Self> {
        let selected = self
            .aqueous_elements
            .get_or_insert_with(|| ["H", "O"].iter().map(|s| s.to_string()).collect());
        for symbol in elements.split_whitespace() {
            if lookup_element(symbol).is_none() {
                return Err(ChemError::UnknownElement {
                    symbol: symbol.to_string(),
                });
            }
            selected.insert(symbol.to_string());
        }
        Ok(self)
    }

    /// Build the system: every database species whose elements are all selected.
    pub fn build(&self) -> ChemResult<ChemicalSystem> {
        let selected = self.aqueous_elements.as_ref().ok_or(ChemError::NoPhases)?;
        let builtin;
        let db = match &self.database {
            Some(db) => db,
            None => {
                builtin = Database::builtin()?;
                &builtin
            }
        };

        for symbol in selected {
            if !db.has_element(symbol) {
                return Err(ChemError::UnknownElement {
                    symbol: symbol.clone(),
                });
            }
        }

        // Keep database order for elements and species.
        let elements: Vec<String> = db
            .elements()
            .iter()
            .filter(|e| selected.contains(&e.symbol))
            .map(|e| e.symbol.clone())
            .collect();

        let mut species = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for sp in db.species() {
            let in_scope = sp.formula().elements().keys().all(|s| selected.contains(s));
            let reactants_in_scope = sp
                .reaction()
                .iter()
                .all(|t| index.contains_key(&canonical_name(&t.species)));
            if in_scope && (sp.is_master() || reactants_in_scope) {
                index.insert(canonical_name(sp.name()), species.len());
                species.push(sp.clone());
            }
        }

        let mut masters = Vec::with_capacity(elements.len());
        for e in &elements {
            let master = db
                .master_of(e)
                .and_then(|m| index.get(&canonical_name(m.name())).copied())
                .ok_or_else(|| ChemError::Database {
                    what: format!("master species of element {} is not selectable", e),
                })?;
            masters.push(master);
        }

        let solvent = species
            .iter()
            .position(|s| s.kind() == SpeciesKind::Solvent)
            .ok_or_else(|| ChemError::Database {
                what: "no solvent species in the aqueous phase".to_string(),
            })?;

        let reactions = species
            .iter()
            .map(|sp| {
                sp.reaction()
                    .iter()
                    .filter_map(|t| {
                        index
                            .get(&canonical_name(&t.species))
                            .map(|&i| (i, t.coefficient))
                    })
                    .collect()
            })
            .collect();

        Ok(ChemicalSystem::assemble(
            elements, species, masters, solvent, reactions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co2_system() -> ChemicalSystem {
        let mut editor = ChemicalEditor::new();
        editor.add_aqueous_phase("H O C Na Cl").unwrap();
        editor.build().unwrap()
    }

    #[test]
    fn selects_species_by_elements() {
        let system = co2_system();
        assert_eq!(system.elements(), ["H", "O", "C", "Na", "Cl"]);
        for name in ["H2O", "H+", "OH-", "HCO3-", "CO3-2", "CO2(aq)", "Na+", "Cl-", "NaCO3-"] {
            assert!(system.species_index(name).is_some(), "missing {name}");
        }
        for name in ["Ca+2", "KSO4-", "HSO4-"] {
            assert!(system.species_index(name).is_none(), "unexpected {name}");
        }
        assert_eq!(system.phases().len(), 1);
        assert_eq!(system.phases()[0].species().len(), system.num_species());
    }

    #[test]
    fn species_lookup_ignores_charge_spelling() {
        let system = co2_system();
        let co3 = system.species_index("CO3-2").unwrap();
        assert_eq!(system.species_index("CO3--"), Some(co3));
        assert_eq!(system.species_index("Na+1"), system.species_index("Na+"));
        assert!(system.species_index("CO3").is_none());
    }

    #[test]
    fn masters_and_solvent() {
        let system = co2_system();
        let c = system.element_index("C").unwrap();
        assert_eq!(system.species()[system.master(c)].name(), "HCO3-");
        assert_eq!(system.species()[system.solvent()].name(), "H2O");
        assert!(system.is_master(system.solvent()));
    }

    #[test]
    fn reactions_reference_masters() {
        let system = co2_system();
        let co2 = system.species_index("CO2(aq)").unwrap();
        let reaction = system.reaction(co2);
        assert_eq!(reaction.len(), 3);
        assert!(reaction.iter().all(|&(i, _)| system.is_master(i)));
    }

    #[test]
    fn formula_matrix_and_charges() {
        let system = co2_system();
        let a = system.formula_matrix();
        assert_eq!(a.nrows(), system.num_elements());
        assert_eq!(a.ncols(), system.num_species());
        let h = system.element_index("H").unwrap();
        let water = system.solvent();
        assert_eq!(a[(h, water)], 2.0);
        let co3 = system.species_index("CO3-2").unwrap();
        assert_eq!(system.charges()[co3], -2.0);
    }

    #[test]
    fn unknown_element_symbol() {
        let mut editor = ChemicalEditor::new();
        assert!(matches!(
            editor.add_aqueous_phase("H O Qq"),
            Err(ChemError::UnknownElement { symbol }) if symbol == "Qq"
        ));
    }

    #[test]
    fn element_missing_from_database() {
        let mut editor = ChemicalEditor::new();
        editor.add_aqueous_phase("Fe").unwrap();
        assert!(matches!(
            editor.build(),
            Err(ChemError::UnknownElement { symbol }) if symbol == "Fe"
        ));
    }

    #[test]
    fn build_without_phase_fails() {
        assert!(matches!(
            ChemicalEditor::new().build(),
            Err(ChemError::NoPhases)
        ));
    }

    #[test]
    fn key_is_stable_and_content_based() {
        let a = co2_system();
        let b = co2_system();
        assert_eq!(a.key(), b.key());

        let mut editor = ChemicalEditor::new();
        editor.add_aqueous_phase("C Na Cl Ca").unwrap();
        assert_ne!(editor.build().unwrap().key(), a.key());
    }

    #[test]
    fn phase_calls_accumulate() {
        let mut editor = ChemicalEditor::new();
        editor.add_aqueous_phase("C").unwrap().add_aqueous_phase("Na").unwrap();
        let system = editor.build().unwrap();
        assert_eq!(system.elements(), ["H", "O", "C", "Na"]);
    }
}
