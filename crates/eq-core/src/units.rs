// eq-core/src/units.rs

use uom::si::f64::{
    Mass as UomMass, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Mass = UomMass;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

pub mod constants {
    /// Universal gas constant [J/(mol K)]
    pub const R: f64 = 8.314_462_618;

    /// Reference temperature for tabulated log K values [K]
    pub const T_REF_K: f64 = 298.15;

    /// Reference pressure [Pa]
    pub const P_REF_PA: f64 = 1.0e5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_are_si() {
        assert_eq!(pa(101_325.0).value, 101_325.0);
        assert_eq!(k(constants::T_REF_K).value, 298.15);
        assert_eq!(kg(1.0).value, 1.0);
    }
}
