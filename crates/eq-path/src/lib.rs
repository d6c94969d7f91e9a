//! Equilibrium path tracing.
//!
//! An [`EquilibriumPath`] connects two solved states by interpolating bulk
//! element amounts, temperature and pressure in a parameter `t ∈ [0, 1]` and
//! re-solving the equilibrium at each step. Every accepted state is evaluated
//! against the registered property queries and handed to the attached sinks:
//! tabular file outputs and staged plots.
//!
//! ```no_run
//! use eq_chem::ChemicalEditor;
//! use eq_path::EquilibriumPath;
//! use eq_solver::{EquilibriumProblem, equilibrate};
//!
//! let mut editor = ChemicalEditor::new();
//! editor.add_aqueous_phase("H O C Na Cl")?;
//! let system = editor.build()?;
//!
//! let mut p1 = EquilibriumProblem::new(&system);
//! p1.add("H2O", 1.0, "kg")?.add("CO2", 0.5, "mol")?.add("HCl", 1.0, "mol")?;
//! let mut p2 = EquilibriumProblem::new(&system);
//! p2.add("H2O", 1.0, "kg")?.add("CO2", 0.5, "mol")?.add("NaOH", 2.0, "mol")?;
//!
//! let state1 = equilibrate(&system, &p1)?;
//! let state2 = equilibrate(&system, &p2)?;
//!
//! let mut path = EquilibriumPath::new(&system);
//! path.output()
//!     .filename("result.txt")
//!     .add("t")
//!     .add("pH")
//!     .add_labeled("speciesMolality(HCO3-)", "HCO3- [molal]");
//! let report = path.solve(&state1, &state2)?;
//! println!("{} steps", report.parameters.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod output;
pub mod path;
pub mod plot;
pub mod query;
pub mod sink;
pub mod stepping;

pub use error::{PathError, PathResult};
pub use output::{OutputSink, OutputSpec};
pub use path::{EquilibriumPath, PathProgress, PathReport};
pub use plot::{PlotData, PlotSeries, PlotSink, PlotSpec};
pub use query::{CompiledQuery, PropertyRegistry};
pub use sink::{Column, PathSink};
pub use stepping::{AdaptiveStep, FixedStep, StepPolicy};
