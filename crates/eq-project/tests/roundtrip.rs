use eq_core::Tolerances;
use eq_project::schema::*;
use eq_project::{ProjectError, load, load_json, load_yaml, save, save_json, save_yaml};
use std::path::PathBuf;

fn titration() -> Scenario {
    let problem = |id: &str, titrant: &str, amount: f64| ProblemDef {
        id: id.to_string(),
        temperature: Some(QuantityDef::new(25.0, "degC")),
        pressure: Some(QuantityDef::new(1.0, "bar")),
        amounts: vec![
            AmountDef::new("H2O", 1.0, "kg"),
            AmountDef::new("CO2", 0.5, "mol"),
            AmountDef::new(titrant, amount, "mol"),
        ],
    };

    Scenario {
        version: 1,
        name: "CO2 titration".to_string(),
        system: SystemDef {
            elements: "H O C Na Cl".to_string(),
            database: None,
        },
        problems: vec![problem("acidic", "HCl", 1.0), problem("alkaline", "NaOH", 2.0)],
        solver: SolverDef {
            activity_model: ActivityModelDef::Davies,
            max_iterations: Some(50),
            tolerance: None,
            mass_balance: Some(Tolerances {
                abs: 1e-10,
                rel: 1e-8,
            }),
        },
        path: Some(PathDef {
            from: "acidic".to_string(),
            to: "alkaline".to_string(),
            stepping: SteppingDef::Adaptive {
                initial: Some(0.005),
                min: None,
                max: Some(0.05),
                grow_factor: None,
                cutback_factor: None,
            },
            max_steps: Some(10_000),
            plots: vec![PlotDef {
                x: "pH".to_string(),
                series: vec![SeriesDef {
                    label: "CO_2(aq)".to_string(),
                    query: "speciesMolality(CO2(aq))".to_string(),
                }],
                title: None,
                xlabel: Some("pH".to_string()),
                ylabel: Some("Concentration [molal]".to_string()),
                xformat: None,
                yformat: Some("%g".to_string()),
                legend: None,
                file: Some("carbonate".to_string()),
            }],
            outputs: vec![OutputDef {
                file: PathBuf::from("result.txt"),
                columns: vec![
                    ColumnDef::new("t"),
                    ColumnDef::new("pH"),
                    ColumnDef::labeled("speciesMolality(HCO3-)", "HCO3- [molal]"),
                ],
                delimiter: None,
                precision: Some(6),
            }],
        }),
    }
}

#[test]
fn roundtrip_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("titration.yaml");
    let scenario = titration();

    save_yaml(&path, &scenario).unwrap();
    assert_eq!(load_yaml(&path).unwrap(), scenario);
}

#[test]
fn roundtrip_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("titration.json");
    let scenario = titration();

    save_json(&path, &scenario).unwrap();
    assert_eq!(load_json(&path).unwrap(), scenario);
}

#[test]
fn extension_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = titration();

    for name in ["a.yml", "b.YAML", "c.json"] {
        let path = dir.path().join(name);
        save(&path, &scenario).unwrap();
        assert_eq!(load(&path).unwrap(), scenario);
    }

    let err = save(&dir.path().join("d.toml"), &scenario).unwrap_err();
    assert!(matches!(err, ProjectError::UnsupportedFormat { .. }));
}

#[test]
fn minimal_yaml_uses_defaults() {
    let yaml = "\
version: 1
name: water
system:
  elements: H O
problems:
  - id: pure
    amounts:
      - { substance: H2O, amount: 1, unit: kg }
";
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("water.yaml");
    std::fs::write(&path, yaml).unwrap();

    let scenario = load_yaml(&path).unwrap();
    assert_eq!(scenario.solver, SolverDef::default());
    assert!(scenario.path.is_none());
    let problem = scenario.problem("pure").unwrap();
    assert!(problem.temperature.is_none());
    assert_eq!(problem.amounts[0].substance, "H2O");
}

#[test]
fn save_refuses_invalid_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    let mut scenario = titration();
    scenario.problems.clear();

    let err = save_yaml(&path, &scenario).unwrap_err();
    assert!(matches!(err, ProjectError::Validation(_)));
    assert!(!path.exists());
}

#[test]
fn malformed_yaml_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "version: [1\nname: x").unwrap();
    assert!(matches!(load_yaml(&path), Err(ProjectError::Yaml(_))));
}
