//! eq-chem: chemical description layer for equilibrium calculations.
//!
//! Provides:
//! - Element table (symbols, molar masses)
//! - Chemical formula parsing (`H2O`, `Ca(OH)2`, `HCO3-`, `CO2(aq)`)
//! - Species definitions with formation reactions from master species
//! - A thermodynamic database (built-in, or loaded from YAML/JSON)
//! - `ChemicalEditor` to select phases, producing an immutable `ChemicalSystem`
//! - Unit-aware parsing of amounts, masses, temperatures and pressures
//!
//! # Example
//!
//! ```
//! use eq_chem::ChemicalEditor;
//!
//! let mut editor = ChemicalEditor::new();
//! editor.add_aqueous_phase("H O C Na Cl").unwrap();
//! let system = editor.build().unwrap();
//!
//! assert!(system.species_index("HCO3-").is_some());
//! assert!(system.species_index("Ca+2").is_none());
//! ```

pub mod database;
pub mod editor;
pub mod element;
pub mod error;
pub mod formula;
pub mod species;
pub mod system;
pub mod units;

// Re-exports for ergonomics
pub use database::{Database, DatabaseDef, ElementDef};
pub use editor::ChemicalEditor;
pub use element::{Element, lookup_element};
pub use error::{ChemError, ChemResult};
pub use formula::Formula;
pub use species::{ReactionTerm, Species, SpeciesDef, SpeciesKind};
pub use system::{ChemicalSystem, Phase, PhaseKind};
pub use units::{Quantity, UnitError, convert_to_si, parse_quantity};
