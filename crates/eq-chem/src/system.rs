//! Immutable chemical system: the elements, species and phases selected by a
//! [`ChemicalEditor`](crate::ChemicalEditor).

use crate::formula::canonical_name;
use crate::species::Species;
use nalgebra::{DMatrix, DVector};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Aqueous,
}

/// A phase and the indices of its species in the system.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    name: String,
    kind: PhaseKind,
    species: Vec<usize>,
}

impl Phase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    pub fn species(&self) -> &[usize] {
        &self.species
    }
}

/// Static description of a chemical system. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ChemicalSystem {
    elements: Vec<String>,
    species: Vec<Species>,
    /// Keyed by [`canonical_name`].
    species_index: HashMap<String, usize>,
    phases: Vec<Phase>,
    /// Element coefficients, elements x species.
    formula_matrix: DMatrix<f64>,
    charges: DVector<f64>,
    /// Master species index for each element.
    masters: Vec<usize>,
    solvent: usize,
    /// Formation reaction of each species in terms of master species indices.
    reactions: Vec<Vec<(usize, f64)>>,
    key: String,
}

impl ChemicalSystem {
    /// Assemble a system from already selected pieces.
    ///
    /// `masters[e]` and every reaction entry index into `species`; the editor
    /// guarantees consistency.
    pub(crate) fn assemble(
        elements: Vec<String>,
        species: Vec<Species>,
        masters: Vec<usize>,
        solvent: usize,
        reactions: Vec<Vec<(usize, f64)>>,
    ) -> Self {
        let formula_matrix = DMatrix::from_fn(elements.len(), species.len(), |e, s| {
            species[s].formula().coefficient(&elements[e])
        });
        let charges = DVector::from_iterator(
            species.len(),
            species.iter().map(|s| f64::from(s.charge())),
        );
        let species_index = species
            .iter()
            .enumerate()
            .map(|(i, s)| (canonical_name(s.name()), i))
            .collect();
        let phases = vec![Phase {
            name: "Aqueous".to_string(),
            kind: PhaseKind::Aqueous,
            species: (0..species.len()).collect(),
        }];
        let key = content_key(&elements, &species);

        Self {
            elements,
            species,
            species_index,
            phases,
            formula_matrix,
            charges,
            masters,
            solvent,
            reactions,
            key,
        }
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn element_index(&self, symbol: &str) -> Option<usize> {
        self.elements.iter().position(|e| e == symbol)
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    /// Index of a species by name. `CO3--` and `CO3-2` name the same species.
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species_index.get(&canonical_name(name)).copied()
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn formula_matrix(&self) -> &DMatrix<f64> {
        &self.formula_matrix
    }

    pub fn charges(&self) -> &DVector<f64> {
        &self.charges
    }

    /// Master species index of element `e`.
    pub fn master(&self, e: usize) -> usize {
        self.masters[e]
    }

    pub fn masters(&self) -> &[usize] {
        &self.masters
    }

    pub fn is_master(&self, i: usize) -> bool {
        self.reactions[i].is_empty()
    }

    /// Index of the solvent (water).
    pub fn solvent(&self) -> usize {
        self.solvent
    }

    pub fn reaction(&self, i: usize) -> &[(usize, f64)] {
        &self.reactions[i]
    }

    /// ln K of the formation reaction of species `i` at `t_kelvin`.
    pub fn ln_k(&self, i: usize, t_kelvin: f64) -> f64 {
        self.species[i].ln_k(t_kelvin)
    }

    /// Content key identifying this system's elements and species.
    pub fn key(&self) -> &str {
        &self.key
    }
}

fn content_key(elements: &[String], species: &[Species]) -> String {
    let mut hasher = Sha256::new();
    for e in elements {
        hasher.update(e.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update([0xffu8]);
    for s in species {
        hasher.update(s.name().as_bytes());
        hasher.update(s.log_k().to_le_bytes());
        hasher.update(s.delta_h().to_le_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
