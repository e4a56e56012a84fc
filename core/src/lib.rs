pub mod atom;
pub mod basis;
pub mod ci;
mod config;
mod diis;
pub mod error;
pub mod hamiltonian;
pub mod hf;
pub mod integrals;
pub mod molecule;
pub mod periodic_table;
pub mod solver;
mod utils;

pub use atom::Nucleus;
pub use basis::BasisSetRegistry;
pub use error::{Error, Result};
pub use molecule::Molecule;
pub use solver::{Solution, Solver, SolverOptions};
