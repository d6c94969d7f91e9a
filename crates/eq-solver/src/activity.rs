//! Activity coefficient models for aqueous solutes.

use std::f64::consts::LN_10;
use std::fmt;
use std::str::FromStr;

/// Activity coefficient model.
///
/// Implementations return ln γ for a solute of the given charge. The solvent
/// is handled by the solver (unit activity) and never passed here.
pub trait ActivityModel: fmt::Debug + Send + Sync {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// Natural log of the activity coefficient.
    fn ln_gamma(&self, charge: f64, ionic_strength: f64, t_kelvin: f64) -> f64;
}

/// Davies equation: log10 γ = -A z² (√I / (1 + √I) - 0.3 I).
#[derive(Debug, Clone, Copy, Default)]
pub struct Davies;

impl Davies {
    /// Debye-Hückel A parameter [kg^0.5 mol^-0.5], quadratic fit in °C.
    pub fn a_parameter(t_kelvin: f64) -> f64 {
        let dt = t_kelvin - 273.15;
        0.4918 + 6.6098e-4 * dt + 5.0231e-6 * dt * dt
    }
}

impl ActivityModel for Davies {
    fn name(&self) -> &str {
        "davies"
    }

    fn ln_gamma(&self, charge: f64, ionic_strength: f64, t_kelvin: f64) -> f64 {
        if charge == 0.0 {
            return 0.0;
        }
        let sqrt_i = ionic_strength.max(0.0).sqrt();
        let log10_gamma = -Self::a_parameter(t_kelvin)
            * charge
            * charge
            * (sqrt_i / (1.0 + sqrt_i) - 0.3 * ionic_strength);
        LN_10 * log10_gamma
    }
}

/// Ideal solution: γ = 1 for every solute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ideal;

impl ActivityModel for Ideal {
    fn name(&self) -> &str {
        "ideal"
    }

    fn ln_gamma(&self, _charge: f64, _ionic_strength: f64, _t_kelvin: f64) -> f64 {
        0.0
    }
}

/// Selectable activity model, used by configuration layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityModelKind {
    #[default]
    Davies,
    Ideal,
}

impl ActivityModelKind {
    pub fn build(self) -> Box<dyn ActivityModel> {
        match self {
            Self::Davies => Box::new(Davies),
            Self::Ideal => Box::new(Ideal),
        }
    }
}

impl FromStr for ActivityModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "davies" => Ok(Self::Davies),
            "ideal" => Ok(Self::Ideal),
            other => Err(format!("unknown activity model '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn neutral_species_are_ideal() {
        assert_eq!(Davies.ln_gamma(0.0, 0.5, 298.15), 0.0);
    }

    #[test]
    fn a_parameter_near_reference() {
        assert!((Davies::a_parameter(298.15) - 0.5115).abs() < 1e-3);
    }

    #[test]
    fn davies_at_tenth_molal() {
        // log10 γ(z=1, I=0.1) ≈ -0.1075 at 25 °C
        let log10_gamma = Davies.ln_gamma(1.0, 0.1, 298.15) / LN_10;
        assert!((log10_gamma + 0.1075).abs() < 1e-3, "{}", log10_gamma);
    }

    #[test]
    fn parse_kind() {
        assert_eq!("Davies".parse::<ActivityModelKind>(), Ok(ActivityModelKind::Davies));
        assert_eq!(ActivityModelKind::Ideal.build().name(), "ideal");
        assert!("pitzer".parse::<ActivityModelKind>().is_err());
    }

    proptest! {
        #[test]
        fn divalent_ions_deviate_more(i in 1e-6f64..0.5) {
            let mono = Davies.ln_gamma(1.0, i, 298.15);
            let di = Davies.ln_gamma(2.0, i, 298.15);
            prop_assert!(di <= mono);
            prop_assert!((di - 4.0 * mono).abs() < 1e-12);
        }
    }
}
