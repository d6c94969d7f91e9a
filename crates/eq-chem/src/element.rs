//! Chemical element table.

/// A chemical element with its standard atomic weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Symbol as written in formulas (e.g. `Na`)
    pub symbol: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Molar mass [kg/mol]
    pub molar_mass: f64,
}

macro_rules! element {
    ($symbol:literal, $name:literal, $g_per_mol:literal) => {
        Element {
            symbol: $symbol,
            name: $name,
            molar_mass: $g_per_mol * 1e-3,
        }
    };
}

/// Elements known to the formula parser (IUPAC standard atomic weights, g/mol).
pub const ELEMENTS: &[Element] = &[
    element!("H", "Hydrogen", 1.00794),
    element!("He", "Helium", 4.002602),
    element!("Li", "Lithium", 6.941),
    element!("Be", "Beryllium", 9.012182),
    element!("B", "Boron", 10.811),
    element!("C", "Carbon", 12.0107),
    element!("N", "Nitrogen", 14.0067),
    element!("O", "Oxygen", 15.9994),
    element!("F", "Fluorine", 18.9984032),
    element!("Ne", "Neon", 20.1797),
    element!("Na", "Sodium", 22.98976928),
    element!("Mg", "Magnesium", 24.305),
    element!("Al", "Aluminium", 26.9815386),
    element!("Si", "Silicon", 28.0855),
    element!("P", "Phosphorus", 30.973762),
    element!("S", "Sulfur", 32.065),
    element!("Cl", "Chlorine", 35.453),
    element!("Ar", "Argon", 39.948),
    element!("K", "Potassium", 39.0983),
    element!("Ca", "Calcium", 40.078),
    element!("Mn", "Manganese", 54.938045),
    element!("Fe", "Iron", 55.845),
    element!("Cu", "Copper", 63.546),
    element!("Zn", "Zinc", 65.38),
    element!("Br", "Bromine", 79.904),
    element!("Sr", "Strontium", 87.62),
    element!("Ba", "Barium", 137.327),
    element!("I", "Iodine", 126.90447),
];

/// Look up an element by its exact symbol.
pub fn lookup_element(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}
