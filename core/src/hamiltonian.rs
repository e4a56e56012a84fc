//! One- and two-electron integrals over molecular orbitals.
use nalgebra::DMatrix;

use crate::{
    error::{Error, Result},
    hf::OrbitalBasis,
    integrals::ElectronTensor,
};

/// The electronic hamiltonian in an orthonormal orbital basis: h_pq and (pq|rs) in
/// chemists' notation.
#[derive(Clone, Debug, PartialEq)]
pub struct MolecularHamiltonian {
    one_electron: DMatrix<f64>,
    /// dense (pq|rs), indexed by ((p n + q) n + r) n + s
    two_electron: Vec<f64>,
    n_orbitals: usize,
}

impl MolecularHamiltonian {
    /// Transforms the core hamiltonian and the electron repulsion integrals of an atomic
    /// basis into `orbitals`.
    pub fn from_atomic(
        core_hamiltonian: &DMatrix<f64>,
        electron: &ElectronTensor,
        orbitals: &OrbitalBasis,
    ) -> Result<Self> {
        let n_basis = orbitals.n_basis();

        if core_hamiltonian.nrows() != n_basis || core_hamiltonian.ncols() != n_basis {
            return Err(Error::DimensionMismatch {
                what: "core hamiltonian",
                expected: n_basis,
                found: core_hamiltonian.nrows().max(core_hamiltonian.ncols()),
            });
        }

        if electron.size() != n_basis {
            return Err(Error::DimensionMismatch {
                what: "electron repulsion tensor",
                expected: n_basis,
                found: electron.size(),
            });
        }

        let coefficients = orbitals.coefficients();
        let one_electron = coefficients.transpose() * core_hamiltonian * coefficients;

        let mut two_electron = Vec::with_capacity(n_basis.pow(4));
        for (mu, nu, la, si) in itertools::iproduct!(0..n_basis, 0..n_basis, 0..n_basis, 0..n_basis)
        {
            two_electron.push(electron[(mu, nu, la, si)]);
        }

        // each pass transforms the leading index and moves it to the back
        for _ in 0..4 {
            two_electron = transform_leading_index(&two_electron, coefficients, n_basis);
        }

        log::debug!("transformed integrals into {n_basis} orbitals");

        Ok(Self {
            one_electron,
            two_electron,
            n_orbitals: n_basis,
        })
    }

    /// Builds a hamiltonian from integrals that are already in an orthonormal basis.
    /// `two_electron` holds (pq|rs) at ((p n + q) n + r) n + s.
    pub fn from_parts(one_electron: DMatrix<f64>, two_electron: Vec<f64>) -> Result<Self> {
        let n_orbitals = one_electron.nrows();

        if !one_electron.is_square() {
            return Err(Error::DimensionMismatch {
                what: "one electron integrals",
                expected: n_orbitals,
                found: one_electron.ncols(),
            });
        }

        if two_electron.len() != n_orbitals.pow(4) {
            return Err(Error::DimensionMismatch {
                what: "two electron integrals",
                expected: n_orbitals.pow(4),
                found: two_electron.len(),
            });
        }

        Ok(Self {
            one_electron,
            two_electron,
            n_orbitals,
        })
    }

    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }

    /// h_pq
    pub fn one_electron(&self) -> &DMatrix<f64> {
        &self.one_electron
    }

    /// (pq|rs)
    pub fn two_electron(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        let n = self.n_orbitals;
        self.two_electron[((p * n + q) * n + r) * n + s]
    }

    /// Electronic energy of the closed shell determinant that doubly occupies the first
    /// `n_pairs` orbitals.
    pub fn restricted_energy(&self, n_pairs: usize) -> f64 {
        let occupied = 0..n_pairs.min(self.n_orbitals);

        let one_electron: f64 = occupied
            .clone()
            .map(|i| 2.0 * self.one_electron[(i, i)])
            .sum();

        let two_electron: f64 = itertools::iproduct!(occupied.clone(), occupied)
            .map(|(i, j)| 2.0 * self.two_electron(i, i, j, j) - self.two_electron(i, j, j, i))
            .sum();

        one_electron + two_electron
    }
}

/// out[q, r, s, p] = sum_mu c[mu, p] in[mu, q, r, s]
fn transform_leading_index(data: &[f64], coefficients: &DMatrix<f64>, n: usize) -> Vec<f64> {
    let stride = n.pow(3);
    let mut output = vec![0.0; n.pow(4)];

    for rest in 0..stride {
        for p in 0..n {
            let mut sum = 0.0;
            for mu in 0..n {
                sum += coefficients[(mu, p)] * data[mu * stride + rest];
            }
            output[rest * n + p] = sum;
        }
    }

    output
}
