use std::collections::HashMap;

use crate::{
    atom::Nucleus,
    config::ConfigBasisSet,
    error::{Error, Result},
    molecule::Molecule,
};

use super::{BasisFunction, ContractedGaussian};

#[derive(Debug)]
pub struct BasisSet {
    name: String,
    atomic_mapping: HashMap<u32, AtomicBasis>,
}

impl BasisSet {
    /// Create a new basis set given mappings from atomic number to the basis of that element
    pub(crate) fn new(name: String, atomic_mapping: HashMap<u32, AtomicBasis>) -> Self {
        Self {
            name,
            atomic_mapping,
        }
    }

    /// Parses a basis set in basis set exchange json format.
    pub fn from_bse_json(json: &str) -> Result<Self> {
        let config: ConfigBasisSet = serde_json::from_str(json)?;
        Self::try_from(config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    /// Returns the basis of a given nucleus, if it exists.
    pub fn for_nucleus(&self, nucleus: &Nucleus) -> Option<&AtomicBasis> {
        self.atomic_mapping.get(&nucleus.atomic_number)
    }

    /// Returns whether this set has parameters for the given element.
    pub fn supports(&self, atomic_number: u32) -> bool {
        self.atomic_mapping.contains_key(&atomic_number)
    }

    /// Places the basis functions of every nucleus of the molecule, in the order of the
    /// nuclei. This ordering defines the atomic orbital indices.
    pub fn basis_for(&self, molecule: &Molecule) -> Result<Vec<BasisFunction>> {
        let mut basis = Vec::new();

        for nucleus in molecule.nuclei() {
            let atomic_basis = self
                .for_nucleus(nucleus)
                .ok_or_else(|| Error::UnknownBasis {
                    basis: self.name.clone(),
                    atomic_number: Some(nucleus.atomic_number),
                })?;

            basis.extend(
                atomic_basis
                    .basis_functions()
                    .map(|contracted_gaussian| BasisFunction {
                        contracted_gaussian: contracted_gaussian.clone(),
                        position: nucleus.position,
                    }),
            );
        }

        Ok(basis)
    }
}

/// Represents the basis functions for a single atom.
#[derive(Debug)]
pub struct AtomicBasis {
    pub(crate) shells: Vec<ElectronShell>,
}

impl AtomicBasis {
    pub(crate) fn empty() -> Self {
        Self { shells: Vec::new() }
    }

    pub fn basis_functions(&self) -> impl Iterator<Item = &ContractedGaussian> {
        self.shells.iter().flat_map(|shell| &shell.basis_functions)
    }

    /// The angular momentum of every shell, in basis-function order.
    pub fn shell_angular_momenta(&self) -> impl Iterator<Item = i32> + '_ {
        self.shells.iter().map(|shell| shell.angular_magnitude)
    }

    pub fn n_basis_functions(&self) -> usize {
        self.shells
            .iter()
            .map(|shell| shell.basis_functions.len())
            .sum()
    }
}

/// All cartesian components of one contracted shell.
#[derive(Debug, Clone)]
pub(crate) struct ElectronShell {
    pub(crate) angular_magnitude: i32,
    pub(crate) basis_functions: Vec<ContractedGaussian>,
}

impl ElectronShell {
    pub(crate) fn new(angular_magnitude: i32) -> Self {
        Self {
            angular_magnitude,
            basis_functions: Vec::new(),
        }
    }
}
