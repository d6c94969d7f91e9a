//! Chemical equilibrium state.

use eq_chem::ChemicalSystem;
use eq_core::units::{Mass, Pressure, Temperature, k, kg, pa};
use nalgebra::DVector;
use std::f64::consts::LN_10;

/// Snapshot of a solved equilibrium. Immutable once produced.
///
/// Species vectors follow the species order of the system the state was
/// computed from; [`system_key`](Self::system_key) identifies that system.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalState {
    pub(crate) system_key: String,
    pub(crate) temperature: f64,
    pub(crate) pressure: f64,
    pub(crate) amounts: DVector<f64>,
    pub(crate) molalities: DVector<f64>,
    pub(crate) ln_gamma: DVector<f64>,
    pub(crate) element_amounts: DVector<f64>,
    pub(crate) solvent: usize,
    pub(crate) solvent_mass: f64,
    pub(crate) ionic_strength: f64,
    pub(crate) iterations: usize,
}

impl ChemicalState {
    pub fn system_key(&self) -> &str {
        &self.system_key
    }

    /// Whether this state was computed from `system`.
    pub fn belongs_to(&self, system: &ChemicalSystem) -> bool {
        self.system_key == system.key()
    }

    pub fn temperature(&self) -> Temperature {
        k(self.temperature)
    }

    pub fn pressure(&self) -> Pressure {
        pa(self.pressure)
    }

    pub fn temperature_k(&self) -> f64 {
        self.temperature
    }

    pub fn pressure_pa(&self) -> f64 {
        self.pressure
    }

    /// Species amounts [mol].
    pub fn amounts(&self) -> &DVector<f64> {
        &self.amounts
    }

    pub fn species_amount(&self, i: usize) -> f64 {
        self.amounts[i]
    }

    /// Molality [mol/kg water].
    pub fn molality(&self, i: usize) -> f64 {
        self.molalities[i]
    }

    pub fn activity_coefficient(&self, i: usize) -> f64 {
        self.ln_gamma[i].exp()
    }

    /// Activity; the solvent has unit activity.
    pub fn activity(&self, i: usize) -> f64 {
        if i == self.solvent {
            1.0
        } else {
            self.ln_gamma[i].exp() * self.molalities[i]
        }
    }

    /// Mole fraction within the aqueous phase.
    pub fn mole_fraction(&self, i: usize) -> f64 {
        let total = self.amounts.sum();
        if total > 0.0 {
            self.amounts[i] / total
        } else {
            0.0
        }
    }

    /// Element amounts [mol] summed over all species.
    pub fn element_amounts(&self) -> &DVector<f64> {
        &self.element_amounts
    }

    pub fn element_amount(&self, e: usize) -> f64 {
        self.element_amounts[e]
    }

    /// Element amount per kg of water [mol/kg].
    pub fn element_molality(&self, e: usize) -> f64 {
        self.element_amounts[e] / self.solvent_mass
    }

    /// Mass of water [kg].
    pub fn solvent_mass(&self) -> Mass {
        kg(self.solvent_mass)
    }

    pub fn solvent_mass_kg(&self) -> f64 {
        self.solvent_mass
    }

    /// Ionic strength [mol/kg].
    pub fn ionic_strength(&self) -> f64 {
        self.ionic_strength
    }

    /// pH = -log10 a(H+), given the index of H+.
    pub fn ph(&self, h_plus: usize) -> f64 {
        -(self.molalities[h_plus].ln() + self.ln_gamma[h_plus]) / LN_10
    }

    /// Newton iterations taken to reach this state.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}
