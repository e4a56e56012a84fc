mod electron_tensor;
mod evaluator;
mod mmd;
mod utils;

pub use electron_tensor::ElectronTensor;
pub use evaluator::{
    compute_kinetic_matrix, compute_nuclear_matrix, compute_overlap_matrix, evaluate,
    evaluate_basis, AtomicIntegrals,
};
pub use mmd::McMurchieDavidson;

use crate::atom::Nucleus;

/// The integration scheme used unless a caller picks another one.
pub type DefaultIntegrator = McMurchieDavidson;

/// An integration scheme for the one- and two-electron integrals over pairs and
/// quartets of basis functions.
pub trait Integrator {
    type Function;

    /// <a|b>
    fn overlap(&self, functions: (&Self::Function, &Self::Function)) -> f64;

    /// <a|-1/2 nabla^2|b>
    fn kinetic(&self, functions: (&Self::Function, &Self::Function)) -> f64;

    /// Attraction of the electron density a*b to all `nuclei`.
    fn nuclear(&self, functions: (&Self::Function, &Self::Function), nuclei: &[Nucleus]) -> f64;

    /// (ab|cd) in chemists' notation.
    fn electron_repulsion(
        &self,
        functions: (
            &Self::Function,
            &Self::Function,
            &Self::Function,
            &Self::Function,
        ),
    ) -> f64;
}
