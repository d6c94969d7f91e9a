//! Equilibrium speciation solver.

use crate::activity::{ActivityModel, Ideal};
use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian;
use crate::newton::{NewtonResult, newton_solve};
use crate::options::EquilibriumOptions;
use crate::problem::EquilibriumProblem;
use crate::state::ChemicalState;
use eq_chem::ChemicalSystem;
use eq_core::{CoreError, ensure_non_negative, nearly_equal};
use nalgebra::DVector;
use tracing::debug;

/// Bracket for ln m(H+) in the cold-start speciation estimate.
const SEED_LN_H: (f64, f64) = (-80.0, 10.0);
const SEED_BISECTIONS: usize = 64;

/// Computes equilibrium states for a chemical system.
#[derive(Debug)]
pub struct EquilibriumSolver {
    options: EquilibriumOptions,
    model: Box<dyn ActivityModel>,
}

impl Default for EquilibriumSolver {
    fn default() -> Self {
        Self::new(EquilibriumOptions::default())
    }
}

impl EquilibriumSolver {
    pub fn new(options: EquilibriumOptions) -> Self {
        let model = options.activity_model.build();
        Self { options, model }
    }

    /// Replace the activity model chosen by the options.
    pub fn with_activity_model(mut self, model: Box<dyn ActivityModel>) -> Self {
        self.model = model;
        self
    }

    pub fn options(&self) -> &EquilibriumOptions {
        &self.options
    }

    pub fn activity_model(&self) -> &dyn ActivityModel {
        self.model.as_ref()
    }

    /// Solve the equilibrium described by `problem`.
    pub fn solve(
        &self,
        system: &ChemicalSystem,
        problem: &EquilibriumProblem<'_>,
    ) -> SolverResult<ChemicalState> {
        if problem.system().key() != system.key() {
            return Err(SolverError::InvalidState {
                what: "problem was built for a different chemical system".to_string(),
            });
        }
        self.solve_bulk(
            system,
            problem.element_amounts().as_slice(),
            problem.temperature_k(),
            problem.pressure_pa(),
            None,
        )
    }

    /// Solve for raw bulk element amounts [mol] at `t_kelvin` and `p_pa`.
    ///
    /// With `warm_start`, the iteration starts from that state's speciation
    /// rescaled to the new element amounts. Otherwise it starts from the ideal
    /// solution, and the reported iterations include that solve.
    pub fn solve_bulk(
        &self,
        system: &ChemicalSystem,
        element_amounts: &[f64],
        t_kelvin: f64,
        p_pa: f64,
        warm_start: Option<&ChemicalState>,
    ) -> SolverResult<ChemicalState> {
        let ne = system.num_elements();
        if element_amounts.len() != ne {
            return Err(CoreError::LengthMismatch {
                what: "bulk element amounts",
                left: element_amounts.len(),
                right: ne,
            }
            .into());
        }
        for &b in element_amounts {
            ensure_non_negative(b, "bulk element amount")?;
        }
        if !(t_kelvin.is_finite() && t_kelvin > 0.0 && p_pa.is_finite() && p_pa > 0.0) {
            return Err(SolverError::InvalidState {
                what: format!("conditions T = {} K, P = {} Pa", t_kelvin, p_pa),
            });
        }
        if let Some(state) = warm_start {
            if !state.belongs_to(system) {
                return Err(SolverError::InvalidState {
                    what: "warm-start state belongs to a different chemical system".to_string(),
                });
            }
        }

        let bulk = DVector::from_column_slice(element_amounts);
        let eval = Speciator::new(system, self.model.as_ref(), &bulk, t_kelvin, &self.options)?;

        let (x0, start_iterations) = match warm_start {
            Some(state) => (eval.warm_start(state), 0),
            None => self.cold_start(system, &bulk, t_kelvin)?,
        };
        let result = self.iterate(&eval, x0)?;
        let iterations = start_iterations + result.iterations;
        debug!(
            iterations,
            residual = result.residual_norm,
            warm = warm_start.is_some(),
            "equilibrium converged"
        );

        let sp = eval.speciate(&result.x);
        let computed = system.formula_matrix() * &sp.amounts;
        for e in 0..ne {
            if !nearly_equal(computed[e], bulk[e], self.options.mass_balance) {
                return Err(SolverError::MassBalance {
                    element: system.elements()[e].clone(),
                    residual: computed[e] - bulk[e],
                });
            }
        }

        Ok(ChemicalState {
            system_key: system.key().to_string(),
            temperature: t_kelvin,
            pressure: p_pa,
            amounts: sp.amounts,
            molalities: sp.molalities,
            ln_gamma: sp.ln_gamma,
            element_amounts: computed,
            solvent: system.solvent(),
            solvent_mass: sp.solvent_mass,
            ionic_strength: result.x[ne].exp(),
            iterations,
        })
    }

    /// Solve the ideal-solution problem from the speciation seed. Returns its
    /// unknowns, which start the iteration with the configured model, and the
    /// iterations spent.
    fn cold_start(
        &self,
        system: &ChemicalSystem,
        bulk: &DVector<f64>,
        t_kelvin: f64,
    ) -> SolverResult<(DVector<f64>, usize)> {
        let ideal = Speciator::new(system, &Ideal, bulk, t_kelvin, &self.options)?;
        let result = self.iterate(&ideal, ideal.seed())?;
        Ok((result.x, result.iterations))
    }

    fn iterate(&self, eval: &Speciator<'_>, x0: DVector<f64>) -> SolverResult<NewtonResult> {
        let epsilon = self.options.jacobian_epsilon;
        newton_solve(
            x0,
            |x| Ok(eval.residual(x)),
            |x, r| finite_difference_jacobian(x, r, |xp| Ok(eval.residual(xp)), epsilon),
            &self.options.newton,
        )
    }
}

/// Solve with default options.
pub fn equilibrate(
    system: &ChemicalSystem,
    problem: &EquilibriumProblem<'_>,
) -> SolverResult<ChemicalState> {
    EquilibriumSolver::default().solve(system, problem)
}

/// Species distribution for one vector of unknowns.
struct Speciation {
    molalities: DVector<f64>,
    ln_gamma: DVector<f64>,
    amounts: DVector<f64>,
    solvent_mass: f64,
    ionic_strength: f64,
}

/// Maps unknowns to species and residuals.
///
/// Unknown `e < num_elements` is ln n(H2O) for the solvent's element and ln m
/// of the element's master species otherwise; the last unknown is ln I.
struct Speciator<'a> {
    system: &'a ChemicalSystem,
    model: &'a dyn ActivityModel,
    t_kelvin: f64,
    ln_k: Vec<f64>,
    bulk: DVector<f64>,
    ln_bulk: DVector<f64>,
    trace: f64,
    water_molar_mass: f64,
    solvent_element: usize,
    charge_element: usize,
}

impl<'a> Speciator<'a> {
    fn new(
        system: &'a ChemicalSystem,
        model: &'a dyn ActivityModel,
        bulk: &DVector<f64>,
        t_kelvin: f64,
        options: &EquilibriumOptions,
    ) -> SolverResult<Self> {
        let solvent = system.solvent();
        let solvent_element = system
            .masters()
            .iter()
            .position(|&m| m == solvent)
            .ok_or_else(|| SolverError::InvalidState {
                what: "solvent is not the master species of any element".to_string(),
            })?;
        let charge_element =
            system
                .element_index("H")
                .ok_or_else(|| SolverError::InvalidState {
                    what: "chemical system has no hydrogen".to_string(),
                })?;
        let trace = options.trace_amount;
        if bulk[solvent_element] <= trace {
            return Err(SolverError::InvalidState {
                what: "no water in the bulk composition".to_string(),
            });
        }

        let floored = bulk.map(|b| b.max(trace));
        Ok(Self {
            system,
            model,
            t_kelvin,
            ln_k: (0..system.num_species())
                .map(|i| system.ln_k(i, t_kelvin))
                .collect(),
            ln_bulk: floored.map(f64::ln),
            bulk: floored,
            trace,
            water_molar_mass: system.species()[solvent].molar_mass(),
            solvent_element,
            charge_element,
        })
    }

    fn speciate(&self, x: &DVector<f64>) -> Speciation {
        let system = self.system;
        let ns = system.num_species();
        let ne = system.num_elements();
        let solvent = system.solvent();
        let charges = system.charges();

        let n_water = x[self.solvent_element].exp();
        let solvent_mass = n_water * self.water_molar_mass;
        let ionic = x[ne].exp();

        let mut ln_gamma = DVector::zeros(ns);
        for i in (0..ns).filter(|&i| i != solvent) {
            ln_gamma[i] = self.model.ln_gamma(charges[i], ionic, self.t_kelvin);
        }

        let mut ln_a = vec![0.0; ns];
        let mut ln_m = vec![0.0; ns];
        for e in 0..ne {
            let i = system.master(e);
            if i != solvent {
                ln_m[i] = x[e];
                ln_a[i] = x[e] + ln_gamma[i];
            }
        }
        for j in (0..ns).filter(|&j| !system.is_master(j)) {
            let la = self.ln_k[j]
                + system
                    .reaction(j)
                    .iter()
                    .map(|&(k, nu)| nu * ln_a[k])
                    .sum::<f64>();
            ln_a[j] = la;
            ln_m[j] = la - ln_gamma[j];
        }

        let mut molalities = DVector::zeros(ns);
        let mut amounts = DVector::zeros(ns);
        let mut ionic_calc = 0.0;
        for i in 0..ns {
            if i == solvent {
                molalities[i] = 1.0 / self.water_molar_mass;
                amounts[i] = n_water;
            } else {
                let m = ln_m[i].exp();
                molalities[i] = m;
                amounts[i] = m * solvent_mass;
                ionic_calc += 0.5 * charges[i] * charges[i] * m;
            }
        }

        Speciation {
            molalities,
            ln_gamma,
            amounts,
            solvent_mass,
            ionic_strength: ionic_calc,
        }
    }

    /// Element balances in log form, charge balance in place of hydrogen,
    /// ionic strength closure last.
    fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
        let system = self.system;
        let ne = system.num_elements();
        let sp = self.speciate(x);
        let computed = system.formula_matrix() * &sp.amounts;

        let mut r = DVector::zeros(ne + 1);
        for e in 0..ne {
            r[e] = if e == self.charge_element {
                self.charge_balance(&sp)
            } else {
                computed[e].ln() - self.ln_bulk[e]
            };
        }
        r[ne] = sp.ionic_strength.ln() - x[ne];
        r
    }

    /// Σ z m / Σ |z| m over solutes.
    fn charge_balance(&self, sp: &Speciation) -> f64 {
        let charges = self.system.charges();
        let (net, total) = charges
            .iter()
            .zip(sp.molalities.iter())
            .fold((0.0, 0.0), |(net, total), (&z, &m)| {
                (net + z * m, total + z.abs() * m)
            });
        if total > 0.0 { net / total } else { 0.0 }
    }

    /// Initial guess from an ideal speciation estimate.
    ///
    /// Each element is shared between its master and the products formed from
    /// that master with H+ and water alone. ln m(H+) is bisected until the
    /// estimate is electrically neutral.
    fn seed(&self) -> DVector<f64> {
        let system = self.system;
        let ne = system.num_elements();
        let a = system.formula_matrix();
        let o = self.solvent_element;
        let h = self.charge_element;

        // Water takes whatever oxygen the other masters leave.
        let mut n_water = self.bulk[o];
        for e in (0..ne).filter(|&e| e != o && e != h) {
            let i = system.master(e);
            n_water -= a[(o, i)] / a[(e, i)] * self.bulk[e];
        }
        let n_water = n_water.max(0.1 * self.bulk[o]);
        let ln_w = (n_water * self.water_molar_mass).ln();

        let groups = self.seed_groups();
        let (mut lo, mut hi) = SEED_LN_H;
        for _ in 0..SEED_BISECTIONS {
            let mid = 0.5 * (lo + hi);
            if self.estimate(mid, ln_w, &groups).net_charge > 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        let ln_h = 0.5 * (lo + hi);
        let estimate = self.estimate(ln_h, ln_w, &groups);

        let mut x = DVector::zeros(ne + 1);
        for (e, &ln_m) in estimate.ln_master.iter().enumerate() {
            x[e] = ln_m;
        }
        x[o] = n_water.ln();
        x[h] = ln_h;
        x[ne] = estimate.ionic_strength.max(1e-12).ln();
        x
    }

    fn seed_groups(&self) -> SeedGroups {
        let system = self.system;
        let h_plus = system.master(self.charge_element);
        let solvent = system.solvent();

        let mut groups = SeedGroups {
            free: Vec::new(),
            attached: vec![Vec::new(); system.num_elements()],
        };
        for j in (0..system.num_species()).filter(|&j| !system.is_master(j)) {
            let reaction = system.reaction(j);
            let nu_h = reaction
                .iter()
                .find(|&&(k, _)| k == h_plus)
                .map_or(0.0, |&(_, nu)| nu);
            let mut others = reaction
                .iter()
                .filter(|&&(k, _)| k != h_plus && k != solvent);
            match (others.next(), others.next()) {
                (None, _) => groups.free.push((j, nu_h)),
                (Some(&(k, nu)), None) if nu == 1.0 => {
                    if let Some(e) = system.masters().iter().position(|&m| m == k) {
                        groups.attached[e].push((j, nu_h));
                    }
                }
                _ => {}
            }
        }
        groups
    }

    fn estimate(&self, ln_h: f64, ln_w: f64, groups: &SeedGroups) -> Estimate {
        let system = self.system;
        let ne = system.num_elements();
        let a = system.formula_matrix();
        let charges = system.charges();

        let mut estimate = Estimate {
            ln_master: vec![0.0; ne],
            net_charge: 0.0,
            ionic_strength: 0.0,
        };
        estimate.add(charges[system.master(self.charge_element)], ln_h);
        for &(j, nu_h) in &groups.free {
            estimate.add(charges[j], self.ln_k[j] + nu_h * ln_h);
        }

        for e in (0..ne).filter(|&e| e != self.solvent_element && e != self.charge_element) {
            let i = system.master(e);
            // ln(m_j / m_master) for each product of this master
            let products: Vec<(usize, f64)> = groups.attached[e]
                .iter()
                .map(|&(j, nu_h)| (j, self.ln_k[j] + nu_h * ln_h))
                .collect();
            let mut terms = vec![a[(e, i)].ln()];
            terms.extend(
                products
                    .iter()
                    .filter(|&&(j, _)| a[(e, j)] > 0.0)
                    .map(|&(j, ln_ratio)| a[(e, j)].ln() + ln_ratio),
            );
            let ln_m = self.ln_bulk[e] - ln_w - log_sum_exp(&terms);

            estimate.ln_master[e] = ln_m;
            estimate.add(charges[i], ln_m);
            for &(j, ln_ratio) in &products {
                estimate.add(charges[j], ln_m + ln_ratio);
            }
        }
        estimate
    }

    /// Initial guess from a previous state, rescaled to the new bulk amounts.
    fn warm_start(&self, state: &ChemicalState) -> DVector<f64> {
        let system = self.system;
        let ne = system.num_elements();
        let o = self.solvent_element;
        let h = self.charge_element;
        let ratio = |e: usize| self.bulk[e] / state.element_amount(e).max(self.trace);
        let water_shift = ratio(o).ln();

        let mut x = DVector::zeros(ne + 1);
        for e in 0..ne {
            let i = system.master(e);
            x[e] = if e == o {
                state.species_amount(i).ln() + water_shift
            } else if e == h {
                state.molality(i).ln()
            } else {
                state.molality(i).ln() + ratio(e).ln() - water_shift
            };
        }
        x[ne] = state.ionic_strength().max(1e-12).ln();
        x
    }
}

/// Products grouped for the cold-start estimate, as (species, ν of H+).
struct SeedGroups {
    /// Formed from H+ and water only
    free: Vec<(usize, f64)>,
    /// Formed from one other master with unit coefficient, per element
    attached: Vec<Vec<(usize, f64)>>,
}

struct Estimate {
    ln_master: Vec<f64>,
    net_charge: f64,
    ionic_strength: f64,
}

impl Estimate {
    fn add(&mut self, charge: f64, ln_m: f64) {
        let m = ln_m.exp();
        self.net_charge += charge * m;
        self.ionic_strength += 0.5 * charge * charge * m;
    }
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}
