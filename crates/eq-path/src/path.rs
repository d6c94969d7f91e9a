//! Equilibrium path continuation.

use crate::error::{PathError, PathResult};
use crate::output::{OutputSink, OutputSpec};
use crate::plot::{PlotData, PlotSink, PlotSpec};
use crate::query::PropertyRegistry;
use crate::sink::{Column, PathSink};
use crate::stepping::{AdaptiveStep, StepPolicy};
use eq_chem::ChemicalSystem;
use eq_core::{lerp, lerp_slice};
use eq_solver::{ChemicalState, EquilibriumSolver};
use tracing::{debug, info, warn};

/// A step ending this close to 1 is snapped to exactly 1.
const T_SNAP: f64 = 1e-10;

/// Progress of a running path, reported after every accepted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProgress {
    /// Accepted steps so far, including the one at `t = 0`
    pub step: usize,
    pub t: f64,
    /// Newton iterations of the step just accepted
    pub iterations: usize,
    /// Rejected attempts so far
    pub rejected: usize,
}

/// Result of a completed path.
#[derive(Debug, Clone)]
pub struct PathReport {
    /// Accepted values of `t`, from 0 to 1
    pub parameters: Vec<f64>,
    /// Newton iterations per accepted step
    pub iterations: Vec<usize>,
    /// Steps rejected and retried with a smaller increment
    pub rejected_steps: usize,
    /// State at `t = 1`
    pub final_state: ChemicalState,
    /// Staged data of every plot, in registration order
    pub plots: Vec<PlotData>,
}

/// Continuation between two equilibrium states of one chemical system.
///
/// The path borrows the system and owns its plot and output specifications;
/// the endpoint states are only read during [`solve`](Self::solve).
#[derive(Debug)]
pub struct EquilibriumPath<'a> {
    system: &'a ChemicalSystem,
    solver: EquilibriumSolver,
    policy: Box<dyn StepPolicy>,
    registry: PropertyRegistry,
    plots: Vec<PlotSpec>,
    outputs: Vec<OutputSpec>,
    max_steps: usize,
}

impl<'a> EquilibriumPath<'a> {
    pub fn new(system: &'a ChemicalSystem) -> Self {
        Self {
            system,
            solver: EquilibriumSolver::default(),
            policy: Box::new(AdaptiveStep::default()),
            registry: PropertyRegistry::standard(),
            plots: Vec::new(),
            outputs: Vec::new(),
            max_steps: 100_000,
        }
    }

    pub fn system(&self) -> &'a ChemicalSystem {
        self.system
    }

    pub fn set_solver(&mut self, solver: EquilibriumSolver) -> &mut Self {
        self.solver = solver;
        self
    }

    pub fn set_step_policy(&mut self, policy: impl StepPolicy + 'static) -> &mut Self {
        self.policy = Box::new(policy);
        self
    }

    /// Upper bound on accepted plus rejected steps.
    pub fn set_max_steps(&mut self, max_steps: usize) -> &mut Self {
        self.max_steps = max_steps;
        self
    }

    /// Register a new plot and return it for configuration.
    pub fn plot(&mut self) -> &mut PlotSpec {
        self.add_plot(PlotSpec::default())
    }

    /// Register a new output table and return it for configuration.
    pub fn output(&mut self) -> &mut OutputSpec {
        self.add_output(OutputSpec::default())
    }

    pub fn add_plot(&mut self, spec: PlotSpec) -> &mut PlotSpec {
        self.plots.push(spec);
        let last = self.plots.len() - 1;
        &mut self.plots[last]
    }

    pub fn add_output(&mut self, spec: OutputSpec) -> &mut OutputSpec {
        self.outputs.push(spec);
        let last = self.outputs.len() - 1;
        &mut self.outputs[last]
    }

    pub fn plots(&self) -> &[PlotSpec] {
        &self.plots
    }

    pub fn outputs(&self) -> &[OutputSpec] {
        &self.outputs
    }

    /// Trace the path from `state1` (t = 0) to `state2` (t = 1).
    pub fn solve(&self, state1: &ChemicalState, state2: &ChemicalState) -> PathResult<PathReport> {
        self.solve_with_progress(state1, state2, |_| {})
    }

    /// [`solve`](Self::solve) with a callback after every accepted step.
    pub fn solve_with_progress(
        &self,
        state1: &ChemicalState,
        state2: &ChemicalState,
        mut progress: impl FnMut(&PathProgress),
    ) -> PathResult<PathReport> {
        if !state1.belongs_to(self.system) {
            return Err(PathError::IncompatibleState { which: "state1" });
        }
        if !state2.belongs_to(self.system) {
            return Err(PathError::IncompatibleState { which: "state2" });
        }
        self.policy
            .validate()
            .map_err(|what| PathError::InvalidConfig { what })?;

        // Every query is resolved before the first step.
        let mut sinks = self.compile_sinks()?;
        sinks.begin()?;
        info!(
            outputs = sinks.outputs.len(),
            plots = sinks.plots.len(),
            "tracing equilibrium path"
        );

        let traced = self.trace(state1, state2, &mut sinks, &mut progress);
        let finished = sinks.finish();
        let trace = traced?;
        finished?;

        info!(
            steps = trace.parameters.len(),
            rejected = trace.rejected,
            "equilibrium path complete"
        );
        Ok(PathReport {
            parameters: trace.parameters,
            iterations: trace.iterations,
            rejected_steps: trace.rejected,
            final_state: trace.final_state,
            plots: sinks.into_plot_data(),
        })
    }

    fn compile_columns<'q>(
        &self,
        expressions: impl IntoIterator<Item = &'q str>,
    ) -> PathResult<Vec<Column>> {
        expressions
            .into_iter()
            .map(|e| Column::compile(&self.registry, self.system, e))
            .collect()
    }

    fn compile_sinks(&self) -> PathResult<Sinks> {
        let mut sinks = Sinks::default();
        for (n, spec) in self.outputs.iter().enumerate() {
            let path = spec.path().ok_or_else(|| PathError::InvalidConfig {
                what: format!("output #{} has no file name", n + 1),
            })?;
            if spec.columns().is_empty() {
                return Err(PathError::InvalidConfig {
                    what: format!("output '{}' has no columns", path.display()),
                });
            }
            let columns = self.compile_columns(spec.columns().iter().map(|(q, _)| q.as_str()))?;
            sinks.outputs.push(Active {
                columns,
                labels: spec.labels(),
                sink: spec.sink(path.to_path_buf()),
            });
        }
        for (n, spec) in self.plots.iter().enumerate() {
            let x = spec.x_query().ok_or_else(|| PathError::InvalidConfig {
                what: format!("plot #{} has no x quantity", n + 1),
            })?;
            if spec.y_series().is_empty() {
                return Err(PathError::InvalidConfig {
                    what: format!("plot #{} has no y quantities", n + 1),
                });
            }
            let expressions =
                std::iter::once(x).chain(spec.y_series().iter().map(|(_, q)| q.as_str()));
            let mut labels = vec![x.to_string()];
            labels.extend(spec.y_series().iter().map(|(l, _)| l.clone()));
            sinks.plots.push(Active {
                columns: self.compile_columns(expressions)?,
                labels,
                sink: spec.sink(),
            });
        }
        Ok(sinks)
    }

    fn trace(
        &self,
        state1: &ChemicalState,
        state2: &ChemicalState,
        sinks: &mut Sinks,
        progress: &mut impl FnMut(&PathProgress),
    ) -> PathResult<Trace> {
        let b1 = state1.element_amounts().as_slice();
        let b2 = state2.element_amounts().as_slice();
        let (t1, t2) = (state1.temperature_k(), state2.temperature_k());
        let (p1, p2) = (state1.pressure_pa(), state2.pressure_pa());

        let solve_at = |t: f64, warm: &ChemicalState| -> PathResult<_> {
            let bulk = lerp_slice(b1, b2, t)?;
            Ok(self.solver.solve_bulk(
                self.system,
                &bulk,
                lerp(t1, t2, t),
                lerp(p1, p2, t),
                Some(warm),
            ))
        };

        let mut current = solve_at(0.0, state1)?.map_err(|err| PathError::PathTracing {
            t: 0.0,
            source: Box::new(err),
        })?;
        let mut trace = Trace {
            parameters: vec![0.0],
            iterations: vec![current.iterations()],
            rejected: 0,
            final_state: current.clone(),
        };
        sinks.deliver(0.0, &current)?;
        progress(&PathProgress {
            step: 1,
            t: 0.0,
            iterations: current.iterations(),
            rejected: 0,
        });

        let mut t = 0.0;
        let mut h = self.policy.initial_step();
        while t < 1.0 {
            if trace.parameters.len() + trace.rejected > self.max_steps {
                return Err(PathError::StepLimit {
                    t,
                    max_steps: self.max_steps,
                });
            }
            let step = h.min(1.0 - t);
            let t_next = if 1.0 - (t + step) <= T_SNAP {
                1.0
            } else {
                t + step
            };

            match solve_at(t_next, &current)? {
                Ok(next) => {
                    debug!(t = t_next, iterations = next.iterations(), "path step accepted");
                    h = self.policy.after_accept(step, next.iterations());
                    t = t_next;
                    sinks.deliver(t, &next)?;
                    trace.parameters.push(t);
                    trace.iterations.push(next.iterations());
                    progress(&PathProgress {
                        step: trace.parameters.len(),
                        t,
                        iterations: next.iterations(),
                        rejected: trace.rejected,
                    });
                    current = next;
                }
                Err(err) => {
                    trace.rejected += 1;
                    warn!(t = t_next, step, error = %err, "path step rejected");
                    match self.policy.after_reject(step) {
                        Some(smaller) => h = smaller,
                        None => {
                            return Err(PathError::PathTracing {
                                t: t_next,
                                source: Box::new(err),
                            });
                        }
                    }
                }
            }
        }

        trace.final_state = current;
        Ok(trace)
    }
}

struct Trace {
    parameters: Vec<f64>,
    iterations: Vec<usize>,
    rejected: usize,
    final_state: ChemicalState,
}

/// A sink with its compiled columns.
struct Active<S> {
    columns: Vec<Column>,
    labels: Vec<String>,
    sink: S,
}

impl<S: PathSink> Active<S> {
    fn record(&mut self, t: f64, state: &ChemicalState) -> PathResult<()> {
        let row: Vec<f64> = self.columns.iter().map(|c| c.value(t, state)).collect();
        self.sink.record(&row)
    }
}

#[derive(Default)]
struct Sinks {
    outputs: Vec<Active<OutputSink>>,
    plots: Vec<Active<PlotSink>>,
}

impl Sinks {
    fn begin(&mut self) -> PathResult<()> {
        for a in &mut self.outputs {
            a.sink.begin(&a.labels)?;
        }
        for a in &mut self.plots {
            a.sink.begin(&a.labels)?;
        }
        Ok(())
    }

    fn deliver(&mut self, t: f64, state: &ChemicalState) -> PathResult<()> {
        for a in &mut self.outputs {
            a.record(t, state)?;
        }
        for a in &mut self.plots {
            a.record(t, state)?;
        }
        Ok(())
    }

    /// Finish every sink; the first error is returned after all were tried.
    fn finish(&mut self) -> PathResult<()> {
        let sinks = self
            .outputs
            .iter_mut()
            .map(|a| &mut a.sink as &mut dyn PathSink)
            .chain(self.plots.iter_mut().map(|a| &mut a.sink as &mut dyn PathSink));
        let mut first = Ok(());
        for sink in sinks {
            if let Err(err) = sink.finish() {
                warn!(error = %err, "failed to finish path sink");
                if first.is_ok() {
                    first = Err(err);
                }
            }
        }
        first
    }

    fn into_plot_data(self) -> Vec<PlotData> {
        self.plots.into_iter().map(|a| a.sink.into_data()).collect()
    }
}
