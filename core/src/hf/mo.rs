use nalgebra::DMatrix;

use crate::{
    error::{Error, Result},
    utils,
};

/// Singular values below this are treated as zero when checking that a set of orbitals
/// spans the whole atomic basis.
const RANK_TOLERANCE: f64 = 1e-10;

/// Molecular orbitals as the columns of a coefficient matrix over the atomic basis,
/// C_{mu p}. Orbitals are stored in ascending order of their energies when they come out
/// of a self consistent field calculation.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitalBasis {
    coefficients: DMatrix<f64>,
}

impl OrbitalBasis {
    /// Wraps a square, invertible coefficient matrix.
    pub fn new(coefficients: DMatrix<f64>) -> Result<Self> {
        if !coefficients.is_square() {
            return Err(Error::DimensionMismatch {
                what: "orbital coefficient columns",
                expected: coefficients.nrows(),
                found: coefficients.ncols(),
            });
        }

        let rank = coefficients.rank(RANK_TOLERANCE);
        if rank != coefficients.nrows() {
            return Err(Error::DimensionMismatch {
                what: "orbital coefficient rank",
                expected: coefficients.nrows(),
                found: rank,
            });
        }

        Ok(Self { coefficients })
    }

    /// Eigenvectors of a roothaan equation are invertible by construction.
    pub(super) fn from_scf(coefficients: DMatrix<f64>) -> Self {
        Self { coefficients }
    }

    /// The atomic basis itself, orbital p = basis function p.
    pub fn identity(n_basis: usize) -> Self {
        Self {
            coefficients: DMatrix::identity(n_basis, n_basis),
        }
    }

    pub fn coefficients(&self) -> &DMatrix<f64> {
        &self.coefficients
    }

    pub fn n_basis(&self) -> usize {
        self.coefficients.nrows()
    }

    pub fn n_orbitals(&self) -> usize {
        self.coefficients.ncols()
    }

    /// Closed shell density D = 2 C_occ C_occ^T of the `n_pairs` lowest orbitals.
    pub fn density(&self, n_pairs: usize) -> DMatrix<f64> {
        closed_shell_density(&self.coefficients, n_pairs)
    }
}

pub(crate) fn closed_shell_density(coefficients: &DMatrix<f64>, n_pairs: usize) -> DMatrix<f64> {
    utils::symmetric_matrix(coefficients.nrows(), |i, j| {
        let mut sum = 0.0;
        for k in 0..n_pairs {
            sum += coefficients[(i, k)] * coefficients[(j, k)]
        }
        2.0 * sum
    })
}
