use std::fmt;

/// The iterative stage of the pipeline that failed to converge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// The restricted hartree fock self-consistent field loop
    Scf,
    /// The configuration interaction eigensolver
    Ci,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Scf => write!(f, "SCF"),
            Stage::Ci => write!(f, "CI"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("basis set {basis:?} is not registered{}", element_suffix(.atomic_number))]
    UnknownBasis {
        basis: String,
        /// The element that has no parameters, or `None` if the whole set is missing
        atomic_number: Option<u32>,
    },

    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{stage} did not converge after {iterations} iterations (last energy {last_energy:.10}, residual {residual:.3e})")]
    Convergence {
        stage: Stage,
        iterations: usize,
        last_energy: f64,
        residual: f64,
    },

    #[error("invalid molecule: {0}")]
    InvalidMolecule(String),

    #[error("the energy was requested before a successful solve")]
    NotSolved,

    #[error("invalid configuration space: {0}")]
    ConfigurationSpace(String),

    #[error("malformed basis set: {0}")]
    BasisFormat(String),

    #[error("malformed xyz input on line {line}: {reason}")]
    XyzFormat { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn element_suffix(atomic_number: &Option<u32>) -> String {
    match atomic_number {
        Some(z) => format!(" for element Z={z}"),
        None => String::new(),
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
