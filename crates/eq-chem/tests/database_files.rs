//! Database files and system selection.
//!
//! Custom databases are written to temporary files and loaded back, then used
//! to build systems the same way the built-in data is.

use eq_chem::{ChemError, ChemicalEditor, Database, DatabaseDef};
use std::io::Write;

const SMALL_DB: &str = r#"
elements:
  - { symbol: H, master: H+ }
  - { symbol: O, master: H2O }
  - { symbol: Na, master: Na+ }
  - { symbol: Cl, master: Cl- }
species:
  - { name: H2O, kind: solvent }
  - { name: H+ }
  - { name: Na+ }
  - { name: Cl- }
  - name: OH-
    reaction:
      - { species: H2O, coefficient: 1.0 }
      - { species: H+, coefficient: -1.0 }
    log_k: -14.0
    delta_h: 55.9
  - name: NaCl(aq)
    reaction:
      - { species: Na+, coefficient: 1.0 }
      - { species: Cl-, coefficient: 1.0 }
    log_k: -0.5
"#;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn load_yaml_database_and_build_system() {
    let file = write_temp(".yaml", SMALL_DB);
    let db = Database::load(file.path()).unwrap();
    assert_eq!(db.species().len(), 6);

    let mut editor = ChemicalEditor::with_database(db);
    editor.add_aqueous_phase("Na Cl").unwrap();
    let system = editor.build().unwrap();

    assert_eq!(system.num_elements(), 4);
    assert!(system.species_index("NaCl(aq)").is_some());
    assert!(system.species_index("HCO3-").is_none());
}

#[test]
fn load_json_database() {
    let def: DatabaseDef = serde_yaml::from_str(SMALL_DB).unwrap();
    let json = serde_json::to_string_pretty(&def).unwrap();
    let file = write_temp(".json", &json);

    let db = Database::load(file.path()).unwrap();
    assert_eq!(db.master_of("Na").unwrap().name(), "Na+");
}

#[test]
fn unsupported_extension_is_rejected() {
    let file = write_temp(".txt", SMALL_DB);
    assert!(matches!(
        Database::load(file.path()),
        Err(ChemError::Database { .. })
    ));
}

#[test]
fn malformed_yaml_is_reported() {
    let file = write_temp(".yaml", "elements: [ {symbol: H");
    assert!(matches!(Database::load(file.path()), Err(ChemError::Yaml(_))));
}

#[test]
fn element_outside_custom_database() {
    let db = Database::from_yaml_str(SMALL_DB).unwrap();
    let mut editor = ChemicalEditor::with_database(db);
    editor.add_aqueous_phase("C").unwrap();
    assert!(matches!(
        editor.build(),
        Err(ChemError::UnknownElement { symbol }) if symbol == "C"
    ));
}

#[test]
fn builtin_temperature_dependence() {
    let mut editor = ChemicalEditor::new();
    editor.add_aqueous_phase("C").unwrap();
    let system = editor.build().unwrap();
    let co2 = system.species_index("CO2(aq)").unwrap();

    // Exothermic formation: K decreases with temperature.
    assert!(system.ln_k(co2, 348.15) < system.ln_k(co2, 298.15));
}
