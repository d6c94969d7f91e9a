//! Carbonate system solves: mass balance, charge balance, warm starts.

use eq_chem::{ChemicalEditor, ChemicalSystem};
use eq_solver::{ChemicalState, EquilibriumProblem, EquilibriumSolver, SolverError, equilibrate};
use proptest::prelude::*;

fn co2_system() -> ChemicalSystem {
    let mut editor = ChemicalEditor::new();
    editor.add_aqueous_phase("H O C Na Cl").unwrap();
    editor.build().unwrap()
}

fn acid_problem(system: &ChemicalSystem) -> EquilibriumProblem<'_> {
    let mut problem = EquilibriumProblem::new(system);
    problem
        .add("H2O", 1.0, "kg")
        .unwrap()
        .add("CO2", 0.5, "mol")
        .unwrap()
        .add("HCl", 1.0, "mol")
        .unwrap();
    problem
}

fn base_problem(system: &ChemicalSystem) -> EquilibriumProblem<'_> {
    let mut problem = EquilibriumProblem::new(system);
    problem
        .add("H2O", 1.0, "kg")
        .unwrap()
        .add("CO2", 0.5, "mol")
        .unwrap()
        .add("NaOH", 2.0, "mol")
        .unwrap();
    problem
}

fn assert_mass_balance(system: &ChemicalSystem, state: &ChemicalState, bulk: &[f64]) {
    for (e, symbol) in system.elements().iter().enumerate() {
        let tol = 1e-9 + 1e-8 * bulk[e];
        assert!(
            (state.element_amount(e) - bulk[e]).abs() <= tol,
            "{}: {} vs {}",
            symbol,
            state.element_amount(e),
            bulk[e]
        );
    }
}

fn net_charge(system: &ChemicalSystem, state: &ChemicalState) -> f64 {
    system
        .charges()
        .iter()
        .zip(state.amounts().iter())
        .map(|(z, n)| z * n)
        .sum()
}

#[test]
fn acidic_endpoint() {
    let system = co2_system();
    let problem = acid_problem(&system);
    let state = equilibrate(&system, &problem).unwrap();

    assert_mass_balance(&system, &state, problem.element_amounts().as_slice());
    assert!(net_charge(&system, &state).abs() < 1e-8);

    let h = system.species_index("H+").unwrap();
    let co2 = system.species_index("CO2(aq)").unwrap();
    let hco3 = system.species_index("HCO3-").unwrap();
    assert!(state.ph(h) < 1.0, "pH = {}", state.ph(h));
    // Dissolved carbon stays as CO2(aq) in strong acid.
    assert!(state.molality(co2) > 100.0 * state.molality(hco3));
}

#[test]
fn dissolved_co2_without_acid() {
    let system = co2_system();
    let mut problem = EquilibriumProblem::new(&system);
    problem.add("H2O", 1.0, "kg").unwrap().add("CO2", 0.5, "mol").unwrap();

    let state = EquilibriumSolver::default().solve(&system, &problem).unwrap();
    assert_mass_balance(&system, &state, problem.element_amounts().as_slice());

    let h = system.species_index("H+").unwrap();
    let hco3 = system.species_index("HCO3-").unwrap();
    assert!((state.ph(h) - 3.33).abs() < 0.05, "pH = {}", state.ph(h));
    assert!((state.molality(hco3) - 4.8e-4).abs() < 2e-5);
    assert!(state.ionic_strength() < 1e-3);
    assert!(state.iterations() < 20, "{} iterations", state.iterations());
}

#[test]
fn basic_endpoint() {
    let system = co2_system();
    let problem = base_problem(&system);
    let state = equilibrate(&system, &problem).unwrap();

    assert_mass_balance(&system, &state, problem.element_amounts().as_slice());
    assert!(net_charge(&system, &state).abs() < 1e-8);

    let h = system.species_index("H+").unwrap();
    let co2 = system.species_index("CO2(aq)").unwrap();
    let co3 = system.species_index("CO3-2").unwrap();
    assert!(state.ph(h) > 12.0, "pH = {}", state.ph(h));
    assert!(state.molality(co3) > 1e3 * state.molality(co2));
}

#[test]
fn identical_inputs_give_identical_states() {
    let system = co2_system();
    let problem = acid_problem(&system);
    let a = equilibrate(&system, &problem).unwrap();
    let b = equilibrate(&system, &problem).unwrap();
    assert_eq!(a, b);
}

#[test]
fn warm_start_matches_cold_start() {
    let system = co2_system();
    let solver = EquilibriumSolver::default();
    let acid = solver.solve(&system, &acid_problem(&system)).unwrap();

    let mut nearby = acid_problem(&system);
    nearby.add("NaOH", 0.05, "mol").unwrap();
    let bulk = nearby.element_amounts().as_slice();

    let cold = solver.solve(&system, &nearby).unwrap();
    let warm = solver
        .solve_bulk(&system, bulk, 298.15, 1e5, Some(&acid))
        .unwrap();

    let h = system.species_index("H+").unwrap();
    assert!((cold.ph(h) - warm.ph(h)).abs() < 1e-8);
    assert!(warm.iterations() <= cold.iterations());
}

#[test]
fn warm_start_from_foreign_state_rejected() {
    let system = co2_system();
    let mut editor = ChemicalEditor::new();
    editor.add_aqueous_phase("H O").unwrap();
    let water = editor.build().unwrap();

    let mut problem = EquilibriumProblem::new(&water);
    problem.add("H2O", 1.0, "kg").unwrap();
    let foreign = equilibrate(&water, &problem).unwrap();

    let bulk = acid_problem(&system).element_amounts().clone();
    let err = EquilibriumSolver::default()
        .solve_bulk(&system, bulk.as_slice(), 298.15, 1e5, Some(&foreign))
        .unwrap_err();
    assert!(matches!(err, SolverError::InvalidState { .. }));
}

#[test]
fn iteration_limit_reports_convergence_error() {
    let system = co2_system();
    let mut options = eq_solver::EquilibriumOptions::default();
    options.newton.max_iterations = 2;
    let err = EquilibriumSolver::new(options)
        .solve(&system, &base_problem(&system))
        .unwrap_err();
    assert!(matches!(err, SolverError::Convergence { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn random_mixtures_balance(
        co2 in 0.0f64..0.5,
        hcl in 0.0f64..0.5,
        naoh in 0.0f64..0.5,
        nacl in 0.0f64..0.5,
    ) {
        let system = co2_system();
        let mut problem = EquilibriumProblem::new(&system);
        problem
            .add("H2O", 1.0, "kg").unwrap()
            .add("CO2", co2, "mol").unwrap()
            .add("HCl", hcl, "mol").unwrap()
            .add("NaOH", naoh, "mol").unwrap()
            .add("NaCl", nacl, "mol").unwrap();

        let state = equilibrate(&system, &problem).unwrap();
        let bulk = problem.element_amounts();
        for e in 0..system.num_elements() {
            let tol = 1e-9 + 1e-8 * bulk[e];
            prop_assert!((state.element_amount(e) - bulk[e]).abs() <= tol);
        }
        let h = system.species_index("H+").unwrap();
        let ph = state.ph(h);
        prop_assert!(ph > -1.0 && ph < 15.0);
    }
}
