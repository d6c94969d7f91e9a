//! Aqueous equilibrium solver.
//!
//! The unknowns are the log amount of water, the log molalities of the other
//! master species and the log ionic strength. Product species follow from
//! the law of mass action; the residuals are the element balances (with the
//! hydrogen balance replaced by charge balance) and the ionic strength
//! definition. A damped Newton iteration with a finite-difference Jacobian
//! drives them to zero.

pub mod activity;
pub mod equilibrium;
pub mod error;
pub mod jacobian;
pub mod newton;
pub mod options;
pub mod problem;
pub mod state;

pub use activity::{ActivityModel, ActivityModelKind, Davies, Ideal};
pub use equilibrium::{EquilibriumSolver, equilibrate};
pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult};
pub use options::EquilibriumOptions;
pub use problem::EquilibriumProblem;
pub use state::ChemicalState;
