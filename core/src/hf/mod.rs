mod mo;
pub mod rhf;

use serde::{Deserialize, Serialize};

pub use crate::diis::DiisOptions;
pub use mo::OrbitalBasis;
pub use rhf::{restricted_hartree_fock, RestrictedHartreeFockOutput};

use crate::{
    error::{Error, Result},
    integrals::AtomicIntegrals,
};

/// Where the first density of a self consistent field calculation comes from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum InitialGuess {
    /// Orbitals of the core hamiltonian, ignoring electron repulsion.
    #[default]
    Core,
    /// Extended hückel orbitals, using the generalized Wolfsberg-Helmholz approximation.
    Huckel,
    /// Orbitals of an earlier calculation over the same atomic basis.
    Orbitals(OrbitalBasis),
}

/// Convergence criteria and acceleration of a self consistent field calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScfOptions {
    /// the maximum number of fock matrix builds
    pub max_iterations: usize,
    /// largest change in electronic energy between iterations that counts as converged
    pub energy_threshold: f64,
    /// largest root mean square change of the density that counts as converged
    pub density_threshold: f64,
    /// fock extrapolation, disabled with `None`
    pub diis: Option<DiisOptions>,
}

impl Default for ScfOptions {
    fn default() -> Self {
        Self {
            max_iterations: 128,
            energy_threshold: 1e-10,
            density_threshold: 1e-8,
            diis: Some(DiisOptions::default()),
        }
    }
}

/// The input to a hartree fock calculation
pub struct HartreeFockInput<'a> {
    /// integrals over the atomic basis
    pub integrals: &'a AtomicIntegrals,
    /// the total number of electrons, which has to be even
    pub n_electrons: usize,
    pub guess: InitialGuess,
    pub options: &'a ScfOptions,
}

impl HartreeFockInput<'_> {
    /// Returns the number of doubly occupied orbitals
    pub(crate) fn n_pairs(&self) -> Result<usize> {
        let n_basis = self.integrals.n_basis();

        if self.n_electrons % 2 != 0 {
            return Err(Error::InvalidMolecule(format!(
                "{} electrons can't all be paired in a restricted calculation",
                self.n_electrons
            )));
        }

        if self.n_electrons > 2 * n_basis {
            return Err(Error::InvalidMolecule(format!(
                "{} electrons don't fit into {n_basis} basis functions",
                self.n_electrons
            )));
        }

        Ok(self.n_electrons / 2)
    }
}
