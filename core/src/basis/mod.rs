mod functions;
mod registry;
mod set;

pub use functions::{BasisFunction, ContractedGaussian, Gaussian};
pub use registry::BasisSetRegistry;
pub use set::{AtomicBasis, BasisSet};
pub(crate) use set::ElectronShell;
