//! Solver options.

use crate::activity::ActivityModelKind;
use crate::newton::NewtonConfig;
use eq_core::Tolerances;

/// Options for [`EquilibriumSolver`](crate::EquilibriumSolver).
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumOptions {
    pub newton: NewtonConfig,
    pub activity_model: ActivityModelKind,
    /// Amount [mol] substituted for elements with zero bulk amount
    pub trace_amount: f64,
    /// Relative perturbation for the finite-difference Jacobian
    pub jacobian_epsilon: f64,
    /// Post-convergence element balance check [mol]
    pub mass_balance: Tolerances,
}

impl Default for EquilibriumOptions {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            activity_model: ActivityModelKind::Davies,
            trace_amount: 1e-16,
            jacobian_epsilon: 1e-7,
            mass_balance: Tolerances {
                abs: 1e-10,
                rel: 1e-8,
            },
        }
    }
}
