//! Built-in CO2 titration demo.
//!
//! A CO2 solution acidified with 1 mol HCl is carried to the same solution
//! made alkaline with 2 mol NaOH. The carbonate species are plotted against
//! pH and tabulated together with `t`.

use eq_project::schema::*;
use std::path::Path;

use crate::error::AppResult;
use crate::progress::RunProgressEvent;
use crate::run_service::{self, RunOptions, RunResponse};

/// The demo scenario, writing its table to `output`.
///
/// The plot files land next to the table as `carbonate.dat` and `carbonate.plt`.
pub fn co2_scenario(output: &Path) -> Scenario {
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

    let carbonate = PlotDef {
        x: "pH".to_string(),
        series: [
            ("HCO@_3^-", "speciesMolality(HCO3-)"),
            ("CO_2(aq)", "speciesMolality(CO2(aq))"),
            ("CO@_3^{2-}", "speciesMolality(CO3--)"),
        ]
        .into_iter()
        .map(|(label, query)| SeriesDef {
            label: label.to_string(),
            query: query.to_string(),
        })
        .collect(),
        title: None,
        xlabel: Some("pH".to_string()),
        ylabel: Some("Concentration [molal]".to_string()),
        xformat: None,
        yformat: Some("%g".to_string()),
        legend: Some("left center Left reverse".to_string()),
        file: Some(plot_stem(output)),
    };

    let table = OutputDef {
        file: output.to_path_buf(),
        columns: vec![
            ColumnDef::new("t"),
            ColumnDef::new("pH"),
            ColumnDef::labeled("speciesMolality(HCO3-)", "HCO3- [molal]"),
            ColumnDef::labeled("speciesMolality(CO2(aq))", "CO2(aq) [molal]"),
            ColumnDef::labeled("speciesMolality(CO3--)", "CO3-- [molal]"),
        ],
        delimiter: None,
        precision: None,
    };

    Scenario {
        version: eq_project::LATEST_VERSION,
        name: "CO2 titration".to_string(),
        system: SystemDef {
            elements: "H O C Na Cl".to_string(),
            database: None,
        },
        problems: vec![problem("acidic", "HCl", 1.0), problem("alkaline", "NaOH", 2.0)],
        solver: SolverDef::default(),
        path: Some(PathDef {
            from: "acidic".to_string(),
            to: "alkaline".to_string(),
            stepping: SteppingDef::default(),
            max_steps: None,
            plots: vec![carbonate],
            outputs: vec![table],
        }),
    }
}

fn plot_stem(output: &Path) -> String {
    output.with_file_name("carbonate").to_string_lossy().into_owned()
}

/// Run the demo, writing `output` and the carbonate plot files.
pub fn run_demo(
    output: &Path,
    progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let scenario = co2_scenario(output);
    run_service::run_scenario(&scenario, Path::new("."), &RunOptions::default(), progress_cb)
}
