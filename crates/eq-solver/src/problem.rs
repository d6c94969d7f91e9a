//! Equilibrium problem definition.

use eq_chem::units::quantity_of_unit;
use eq_chem::{ChemError, ChemResult, ChemicalSystem, Formula, Quantity, convert_to_si};
use eq_core::constants::{P_REF_PA, T_REF_K};
use eq_core::units::{Pressure, Temperature, k, pa};
use nalgebra::DVector;

/// Bulk composition plus conditions for one equilibrium calculation.
///
/// Built incrementally with [`add`](Self::add); there is no removal. The
/// problem borrows the system it describes.
#[derive(Debug, Clone)]
pub struct EquilibriumProblem<'a> {
    system: &'a ChemicalSystem,
    element_amounts: DVector<f64>,
    temperature: f64,
    pressure: f64,
    inputs: Vec<(String, f64)>,
}

impl<'a> EquilibriumProblem<'a> {
    /// Empty problem at 25 °C and 1 bar.
    pub fn new(system: &'a ChemicalSystem) -> Self {
        Self {
            system,
            element_amounts: DVector::zeros(system.num_elements()),
            temperature: T_REF_K,
            pressure: P_REF_PA,
            inputs: Vec::new(),
        }
    }

    /// Add `amount` of a neutral compound, in an amount (`mol`, `mmol`, …)
    /// or mass (`kg`, `g`, …) unit.
    pub fn add(&mut self, substance: &str, amount: f64, unit: &str) -> ChemResult<&mut Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ChemError::InvalidAmount {
                what: substance.to_string(),
                value: amount,
            });
        }

        let formula = Formula::parse(substance).map_err(|err| ChemError::UnknownSubstance {
            substance: substance.to_string(),
            reason: err.to_string(),
        })?;
        if !formula.is_neutral() {
            return Err(ChemError::UnknownSubstance {
                substance: substance.to_string(),
                reason: "bulk inputs must be electrically neutral".to_string(),
            });
        }

        let mut indices = Vec::with_capacity(formula.elements().len());
        for (symbol, coeff) in formula.elements() {
            let e = self.system.element_index(symbol).ok_or_else(|| {
                ChemError::UnknownSubstance {
                    substance: substance.to_string(),
                    reason: format!("element {} is not in the chemical system", symbol),
                }
            })?;
            indices.push((e, *coeff));
        }

        let moles = match quantity_of_unit(unit.trim()) {
            Some(Quantity::Amount) => convert_to_si(amount, unit, Quantity::Amount)?,
            Some(Quantity::Mass) => {
                convert_to_si(amount, unit, Quantity::Mass)? / formula.molar_mass()
            }
            _ => {
                return Err(ChemError::InvalidUnit {
                    unit: unit.to_string(),
                    quantity: "Amount or Mass".to_string(),
                });
            }
        };

        for (e, coeff) in indices {
            self.element_amounts[e] += coeff * moles;
        }
        self.inputs.push((formula.text().to_string(), moles));
        Ok(self)
    }

    pub fn set_temperature(&mut self, value: f64, unit: &str) -> ChemResult<&mut Self> {
        self.temperature = convert_to_si(value, unit, Quantity::Temperature)?;
        Ok(self)
    }

    pub fn set_pressure(&mut self, value: f64, unit: &str) -> ChemResult<&mut Self> {
        self.pressure = convert_to_si(value, unit, Quantity::Pressure)?;
        Ok(self)
    }

    pub fn system(&self) -> &'a ChemicalSystem {
        self.system
    }

    /// Bulk element amounts [mol], in system element order.
    pub fn element_amounts(&self) -> &DVector<f64> {
        &self.element_amounts
    }

    /// Substances added so far, with their amounts in mol.
    pub fn inputs(&self) -> &[(String, f64)] {
        &self.inputs
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use eq_chem::{ChemicalEditor, UnitError};

    fn system() -> ChemicalSystem {
        let mut editor = ChemicalEditor::new();
        editor.add_aqueous_phase("H O C Na Cl").unwrap();
        editor.build().unwrap()
    }

    #[test]
    fn add_accumulates_element_amounts() {
        let system = system();
        let mut problem = EquilibriumProblem::new(&system);
        problem
            .add("H2O", 1.0, "kg")
            .unwrap()
            .add("CO2", 0.5, "mol")
            .unwrap()
            .add("HCl", 1.0, "mol")
            .unwrap();

        let b = problem.element_amounts();
        let h = system.element_index("H").unwrap();
        let o = system.element_index("O").unwrap();
        let c = system.element_index("C").unwrap();
        let na = system.element_index("Na").unwrap();
        let n_water = 1.0 / Formula::parse("H2O").unwrap().molar_mass();

        assert!((b[h] - (2.0 * n_water + 1.0)).abs() < 1e-9);
        assert!((b[o] - (n_water + 1.0)).abs() < 1e-9);
        assert_eq!(b[c], 0.5);
        assert_eq!(b[na], 0.0);
        assert_eq!(problem.inputs().len(), 3);
    }

    #[test]
    fn mass_units_use_molar_mass() {
        let system = system();
        let mut problem = EquilibriumProblem::new(&system);
        problem.add("NaCl", 58.44, "g").unwrap();
        let na = system.element_index("Na").unwrap();
        assert!((problem.element_amounts()[na] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn conditions_default_and_set() {
        let system = system();
        let mut problem = EquilibriumProblem::new(&system);
        assert_eq!(problem.temperature_k(), 298.15);
        assert_eq!(problem.pressure_pa(), 1e5);

        problem.set_temperature(60.0, "C").unwrap().set_pressure(2.0, "bar").unwrap();
        assert!((problem.temperature_k() - 333.15).abs() < 1e-12);
        assert_eq!(problem.pressure_pa(), 2e5);
    }

    #[test]
    fn non_physical_conditions_rejected() {
        let system = system();
        let mut problem = EquilibriumProblem::new(&system);
        for result in [
            problem.set_temperature(-300.0, "C").map(|_| ()),
            problem.set_temperature(0.0, "K").map(|_| ()),
            problem.set_pressure(-1.0, "bar").map(|_| ()),
            problem.set_pressure(f64::NAN, "Pa").map(|_| ()),
        ] {
            assert!(matches!(
                result,
                Err(ChemError::Unit(UnitError::OutOfRange { .. }))
            ));
        }
        // Rejected values leave the previous conditions in place.
        assert_eq!(problem.temperature_k(), 298.15);
        assert_eq!(problem.pressure_pa(), 1e5);
    }

    #[test]
    fn unknown_substance() {
        let system = system();
        let mut problem = EquilibriumProblem::new(&system);
        assert!(matches!(
            problem.add("CaCO3", 1.0, "mol"),
            Err(ChemError::UnknownSubstance { .. })
        ));
        assert!(matches!(
            problem.add("Xy2", 1.0, "mol"),
            Err(ChemError::UnknownSubstance { .. })
        ));
        assert!(matches!(
            problem.add("Na+", 1.0, "mol"),
            Err(ChemError::UnknownSubstance { .. })
        ));
    }

    #[test]
    fn invalid_unit_and_amount() {
        let system = system();
        let mut problem = EquilibriumProblem::new(&system);
        assert!(matches!(
            problem.add("NaOH", 1.0, "liter"),
            Err(ChemError::InvalidUnit { .. })
        ));
        assert!(matches!(
            problem.set_temperature(25.0, "rankine"),
            Err(ChemError::InvalidUnit { .. })
        ));
        assert!(matches!(
            problem.add("NaOH", -1.0, "mol"),
            Err(ChemError::InvalidAmount { .. })
        ));
        assert!(matches!(
            problem.add("NaOH", f64::NAN, "mol"),
            Err(ChemError::InvalidAmount { .. })
        ));
    }
}
