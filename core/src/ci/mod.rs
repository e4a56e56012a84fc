//! Doubly occupied configuration interaction.
mod davidson;
mod doci;
mod space;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

pub use davidson::DavidsonOptions;
pub use doci::{solve, DociHamiltonian};
pub use space::{SeniorityZeroSpace, MAX_ORBITALS};

/// How the lowest eigenvalue of the DOCI hamiltonian is found.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CiMethod {
    /// dense up to the dense limit, davidson beyond
    #[default]
    Auto,
    /// diagonalize the full matrix
    Dense,
    /// iterate on matrix-vector products
    Davidson,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiOptions {
    pub method: CiMethod,
    /// the largest dimension that is diagonalized densely, by `Auto` and as a fallback
    /// for davidson
    pub dense_limit: usize,
    pub davidson: DavidsonOptions,
}

impl Default for CiOptions {
    fn default() -> Self {
        Self {
            method: CiMethod::Auto,
            dense_limit: 2000,
            davidson: DavidsonOptions::default(),
        }
    }
}

/// The lowest root of a DOCI calculation.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct CiOutput {
    /// electronic energy
    pub energy: f64,
    /// the ground state, indexed by configuration address
    pub coefficients: DVector<f64>,
    pub iterations: usize,
    /// the method that produced the result, never `Auto`
    pub method: CiMethod,
    /// the number of configurations
    pub dimension: usize,
}
