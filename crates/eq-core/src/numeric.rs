use crate::CoreError;

/// Floating point type used throughout the workspace
pub type Real = f64;

/// Absolute/relative tolerance pair
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(CoreError::Negative { what, value: v });
    }
    Ok(v)
}

/// Linear interpolation `a + t (b - a)`.
///
/// Exact at both ends: `t == 0` returns `a` and `t == 1` returns `b`.
#[inline]
pub fn lerp(a: Real, b: Real, t: Real) -> Real {
    if t == 1.0 { b } else { a + t * (b - a) }
}

/// Element-wise [`lerp`] of two equally sized slices.
pub fn lerp_slice(a: &[Real], b: &[Real], t: Real) -> Result<Vec<Real>, CoreError> {
    if a.len() != b.len() {
        return Err(CoreError::LengthMismatch {
            what: "interpolation endpoints",
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(&x, &y)| lerp(x, y, t)).collect())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn lerp_stays_between_endpoints(a in -1e6_f64..1e6, b in -1e6_f64..1e6, t in 0.0_f64..=1.0) {
            let v = lerp(a, b, t);
            let lo = a.min(b) - 1e-9 * a.abs().max(b.abs()).max(1.0);
            let hi = a.max(b) + 1e-9 * a.abs().max(b.abs()).max(1.0);
            prop_assert!(v >= lo && v <= hi);
        }
    }
}
