//! Damped Newton solver in log variables.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};

/// Newton solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for the residual max-norm
    pub abs_tol: f64,
    /// Largest change of any log variable in one iteration
    pub max_step: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abs_tol: 1e-10,
            max_step: 2.0,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
        }
    }
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual max-norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Newton solver with a capped step and backtracking line search.
///
/// Returns `SolverError::Convergence` when the residual does not drop below
/// `abs_tol` within `max_iterations`, or when no damped step lowers the
/// residual.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>, &DVector<f64>) -> SolverResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.amax();
    if !r_norm.is_finite() {
        return Err(SolverError::Numeric {
            what: "non-finite residual at initial guess".to_string(),
        });
    }

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = jacobian_fn(&x, &r)?;

        // Solve J * dx = -r
        let mut dx = jac
            .lu()
            .solve(&(-&r))
            .ok_or_else(|| SolverError::Numeric {
                what: "Jacobian solve failed".to_string(),
            })?;
        if dx.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::Numeric {
                what: format!("non-finite Newton step at iteration {}", iter),
            });
        }

        let largest = dx.amax();
        if largest > config.max_step {
            dx *= config.max_step / largest;
        }

        // Backtrack until the residual decreases.
        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..=config.max_line_search_iters {
            let x_trial = &x + alpha * &dx;
            let r_trial = residual_fn(&x_trial)?;
            let norm = r_trial.amax();
            if norm.is_finite() && norm < r_norm {
                accepted = Some((x_trial, r_trial, norm));
                break;
            }
            alpha *= config.line_search_beta;
        }
        let Some((x_new, r_new, r_new_norm)) = accepted else {
            return Err(SolverError::Convergence {
                iterations: iter + 1,
                residual: r_norm,
            });
        };

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    if r_norm < config.abs_tol {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }

    Err(SolverError::Convergence {
        iterations: config.max_iterations,
        residual: r_norm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0, x > 0
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };
        let jacobian = |x: &DVector<f64>, _r: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };

        let x0 = DVector::from_element(1, 3.0);
        let config = NewtonConfig::default();
        let result = newton_solve(x0, residual, jacobian, &config).unwrap();

        assert!((result.x[0] - 2.0).abs() < 1e-9);
        assert!(result.residual_norm < config.abs_tol);
    }

    #[test]
    fn step_is_capped() {
        // ln-variable problem: exp(x) = 1e-12, from x = 0 needs |dx| ~ 27.6
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] - (1e-12f64).ln()))
        };
        let jacobian = |_x: &DVector<f64>, _r: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 1.0))
        };

        let config = NewtonConfig::default();
        let result = newton_solve(DVector::zeros(1), residual, jacobian, &config).unwrap();

        // 27.63 / 2.0 per iteration
        assert_eq!(result.iterations, 14);
        assert!((result.x[0].exp() - 1e-12).abs() < 1e-20);
    }

    #[test]
    fn reports_non_convergence() {
        // x^2 + 1 = 0 has no real root
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] + 1.0))
        };
        let jacobian = |x: &DVector<f64>, _r: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };

        let config = NewtonConfig {
            max_iterations: 10,
            ..NewtonConfig::default()
        };
        let err = newton_solve(DVector::from_element(1, 0.5), residual, jacobian, &config)
            .unwrap_err();
        assert!(matches!(
            err,
            SolverError::Convergence { .. } | SolverError::Numeric { .. }
        ));
    }

    #[test]
    fn uphill_direction_is_not_taken() {
        // Wrong-signed Jacobian: every damped step moves away from x = 1.
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] - 1.0))
        };
        let jacobian = |_x: &DVector<f64>, _r: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, -1.0))
        };

        let err = newton_solve(DVector::zeros(1), residual, jacobian, &NewtonConfig::default())
            .unwrap_err();
        match err {
            SolverError::Convergence {
                iterations,
                residual,
            } => {
                assert_eq!(iterations, 1);
                assert_eq!(residual, 1.0);
            }
            other => panic!("expected a convergence error, got {:?}", other),
        }
    }
}
