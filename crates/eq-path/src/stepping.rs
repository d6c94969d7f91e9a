//! Step size control for path continuation.

use std::fmt;

/// Chooses the increment of the path parameter `t`.
///
/// Policies are stateless: the path passes the current step in and gets the
/// next one back.
pub trait StepPolicy: fmt::Debug {
    /// First increment after `t = 0`.
    fn initial_step(&self) -> f64;

    /// Next increment after a step of size `h` converged in `iterations`.
    fn after_accept(&self, h: f64, iterations: usize) -> f64;

    /// Smaller increment to retry with after a failed step, or `None` to give up.
    fn after_reject(&self, h: f64) -> Option<f64>;

    /// Check the policy parameters before a path starts.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Uniform steps; a failed step is fatal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStep {
    pub steps: usize,
}

impl FixedStep {
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }
}

impl StepPolicy for FixedStep {
    fn initial_step(&self) -> f64 {
        1.0 / self.steps.max(1) as f64
    }

    fn after_accept(&self, h: f64, _iterations: usize) -> f64 {
        h
    }

    fn after_reject(&self, _h: f64) -> Option<f64> {
        None
    }

    fn validate(&self) -> Result<(), String> {
        if self.steps == 0 {
            return Err("fixed stepping needs at least one step".to_string());
        }
        Ok(())
    }
}

/// Grow the step after easy solves, shrink after hard ones, cut back on failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveStep {
    /// Initial step
    pub initial: f64,
    /// Smallest step before giving up
    pub min: f64,
    /// Largest step
    pub max: f64,
    /// Growth factor after an easy solve
    pub grow_factor: f64,
    /// Reduction factor after a hard or failed solve
    pub cutback_factor: f64,
    /// Solves at or below this many iterations count as easy
    pub easy_iterations: usize,
    /// Solves at or above this many iterations count as hard
    pub hard_iterations: usize,
}

impl Default for AdaptiveStep {
    fn default() -> Self {
        Self {
            initial: 0.01,
            min: 1e-6,
            max: 0.02,
            grow_factor: 1.5,
            cutback_factor: 0.5,
            easy_iterations: 4,
            hard_iterations: 12,
        }
    }
}

impl StepPolicy for AdaptiveStep {
    fn initial_step(&self) -> f64 {
        self.initial.clamp(self.min, self.max)
    }

    fn after_accept(&self, h: f64, iterations: usize) -> f64 {
        let next = if iterations <= self.easy_iterations {
            h * self.grow_factor
        } else if iterations >= self.hard_iterations {
            h * self.cutback_factor
        } else {
            h
        };
        next.clamp(self.min, self.max)
    }

    fn after_reject(&self, h: f64) -> Option<f64> {
        let next = h * self.cutback_factor;
        (next >= self.min).then_some(next)
    }

    fn validate(&self) -> Result<(), String> {
        let ordered = 0.0 < self.min && self.min <= self.initial && self.initial <= self.max;
        if !(ordered && self.max <= 1.0) {
            return Err(format!(
                "adaptive steps need 0 < min <= initial <= max <= 1 (got {}, {}, {})",
                self.min, self.initial, self.max
            ));
        }
        if !(self.grow_factor >= 1.0 && self.cutback_factor > 0.0 && self.cutback_factor < 1.0) {
            return Err("adaptive steps need grow_factor >= 1 and 0 < cutback_factor < 1".to_string());
        }
        if self.easy_iterations >= self.hard_iterations {
            return Err("easy_iterations must be below hard_iterations".to_string());
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn adaptive_steps_stay_in_bounds(
            h in 1e-6_f64..0.02,
            iterations in proptest::collection::vec(0_usize..40, 1..50),
        ) {
            let policy = AdaptiveStep::default();
            let mut step = h;
            for n in iterations {
                step = policy.after_accept(step, n);
                prop_assert!(step >= policy.min && step <= policy.max);
            }
            if let Some(smaller) = policy.after_reject(step) {
                prop_assert!(smaller < step && smaller >= policy.min);
            }
        }
    }
}
