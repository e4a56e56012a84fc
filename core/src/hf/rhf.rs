use nalgebra::DMatrix;

use crate::{
    diis::Diis,
    error::{Error, Result, Stage},
    utils,
};

use super::{mo::closed_shell_density, HartreeFockInput, InitialGuess, OrbitalBasis};

/// The output of a restricted hartree fock calculation
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct RestrictedHartreeFockOutput {
    /// the canonical orbitals, sorted by ascending orbital energy
    pub orbitals: OrbitalBasis,
    /// the orbital energies that were found in this hartree fock calculation, sorted in
    /// ascending order
    pub orbital_energies: Vec<f64>,
    /// the density matrix built from the final orbitals
    pub density: DMatrix<f64>,
    /// The electronic energy of the system
    pub electronic_energy: f64,
    /// After how many iterations did the system converge
    pub iterations: usize,
}

impl RestrictedHartreeFockOutput {
    pub fn total_energy(&self, nuclear_repulsion: f64) -> f64 {
        self.electronic_energy + nuclear_repulsion
    }
}

/// The states of a self consistent field calculation. Every step moves from `Start` or
/// `Iterating` into one of the other states; `Converged` and `Failed` are terminal.
#[derive(Debug)]
pub(crate) enum ScfState {
    /// no density yet
    Start,
    Iterating {
        /// the number of completed iterations
        iteration: usize,
        density: DMatrix<f64>,
        /// electronic energy of the previous iteration
        previous_energy: Option<f64>,
    },
    Converged(RestrictedHartreeFockOutput),
    Failed {
        iterations: usize,
        last_energy: f64,
        /// root mean square change of the density in the last iteration
        residual: f64,
    },
}

/// Runs a restricted hartree fock calculation until it converges or its iteration
/// budget is exhausted.
pub fn restricted_hartree_fock(input: &HartreeFockInput) -> Result<RestrictedHartreeFockOutput> {
    let mut scf = Scf::new(input)?;
    let mut state = ScfState::Start;

    loop {
        state = match scf.step(state)? {
            ScfState::Converged(output) => {
                log::info!(
                    "scf converged after {} iterations, electronic energy {:1.10}",
                    output.iterations,
                    output.electronic_energy
                );
                return Ok(output);
            }
            ScfState::Failed {
                iterations,
                last_energy,
                residual,
            } => {
                return Err(Error::Convergence {
                    stage: Stage::Scf,
                    iterations,
                    last_energy,
                    residual,
                })
            }
            state => state,
        };
    }
}

struct Scf<'a> {
    input: &'a HartreeFockInput<'a>,
    n_basis: usize,
    n_pairs: usize,
    /// symmetric orthogonalization of the atomic basis
    transform: DMatrix<f64>,
    /// (mu nu|la si) - 1/2 (mu la|nu si), indexed by [nu][mu][si][la]
    electron_terms: Vec<f64>,
    diis: Option<Diis>,
}

impl<'a> Scf<'a> {
    fn new(input: &'a HartreeFockInput<'a>) -> Result<Self> {
        let n_pairs = input.n_pairs()?;
        let integrals = input.integrals;
        let n_basis = integrals.n_basis();

        if integrals.electron.size() != n_basis {
            return Err(Error::DimensionMismatch {
                what: "electron repulsion tensor",
                expected: n_basis,
                found: integrals.electron.size(),
            });
        }

        let electron = &integrals.electron;
        let mut electron_terms = vec![0.0; n_basis.pow(4)];
        for (j, i, x, y) in itertools::iproduct!(0..n_basis, 0..n_basis, 0..n_basis, 0..n_basis) {
            electron_terms[j * n_basis.pow(3) + i * n_basis.pow(2) + y * n_basis + x] =
                electron[(i, j, x, y)] - 0.5 * electron[(i, x, j, y)];
        }

        Ok(Self {
            input,
            n_basis,
            n_pairs,
            transform: utils::symmetric_orthogonalization(&integrals.overlap),
            electron_terms,
            diis: input.options.diis.map(Diis::new),
        })
    }

    fn step(&mut self, state: ScfState) -> Result<ScfState> {
        match state {
            ScfState::Start => Ok(ScfState::Iterating {
                iteration: 0,
                density: self.initial_density()?,
                previous_energy: None,
            }),
            ScfState::Iterating {
                iteration,
                density,
                previous_energy,
            } => Ok(self.iterate(iteration, density, previous_energy)),
            terminal => Ok(terminal),
        }
    }

    fn initial_density(&self) -> Result<DMatrix<f64>> {
        let integrals = self.input.integrals;

        let orbitals = match &self.input.guess {
            InitialGuess::Core => self.orthogonal_eigenvectors(&integrals.core_hamiltonian),
            InitialGuess::Huckel => self.orthogonal_eigenvectors(&compute_huckel_hamiltonian(
                &integrals.core_hamiltonian,
                &integrals.overlap,
            )),
            InitialGuess::Orbitals(orbitals) => {
                if orbitals.n_basis() != self.n_basis || orbitals.n_orbitals() < self.n_pairs {
                    return Err(Error::DimensionMismatch {
                        what: "initial orbitals",
                        expected: self.n_basis,
                        found: orbitals.n_basis(),
                    });
                }
                orbitals.coefficients().clone()
            }
        };

        Ok(closed_shell_density(&orbitals, self.n_pairs))
    }

    /// Solves the generalized eigenproblem F C = S C e through the orthogonal basis.
    fn orthogonal_eigenvectors(&self, matrix: &DMatrix<f64>) -> DMatrix<f64> {
        self.solve_roothaan(matrix).0
    }

    fn solve_roothaan(&self, matrix: &DMatrix<f64>) -> (DMatrix<f64>, Vec<f64>) {
        let transformed = self.transform.transpose() * (matrix * &self.transform);
        let (transformed_coefficients, energies) = utils::sorted_eigs(transformed);
        (
            &self.transform * transformed_coefficients,
            energies.as_slice().to_vec(),
        )
    }

    fn iterate(
        &mut self,
        iteration: usize,
        density: DMatrix<f64>,
        previous_energy: Option<f64>,
    ) -> ScfState {
        let integrals = self.input.integrals;
        let options = self.input.options;
        let core_hamiltonian = &integrals.core_hamiltonian;
        let overlap = &integrals.overlap;

        let electronic_hamiltonian =
            compute_electronic_hamiltonian(&density, &self.electron_terms, self.n_basis);
        let fock = core_hamiltonian + &electronic_hamiltonian;

        let electronic_energy =
            0.5 * (&density * (2.0 * core_hamiltonian + &electronic_hamiltonian)).trace();

        let fock = match &mut self.diis {
            Some(diis) => {
                let error = &fock * &density * overlap - overlap * &density * &fock;
                match diis.fock(error, fock.clone()) {
                    Some(extrapolated) => extrapolated,
                    None => {
                        log::warn!("DIIS equations are singular, using the plain fock matrix");
                        fock
                    }
                }
            }
            None => fock,
        };

        let (coefficients, orbital_energies) = self.solve_roothaan(&fock);
        let new_density = closed_shell_density(&coefficients, self.n_pairs);

        let density_rms = ((&new_density - &density).norm_squared()
            / self.n_basis.pow(2) as f64)
            .sqrt();
        let energy_change = previous_energy.map(|previous| (electronic_energy - previous).abs());
        let iterations = iteration + 1;

        log::info!(
            "iteration {iterations:<4} - electronic energy {electronic_energy:1.10}. density rms {density_rms:1.4e}",
        );
        if let Some(error) = self.diis.as_ref().and_then(Diis::max_error) {
            log::debug!("max DIIS error {error:1.4e}");
        }

        let converged = energy_change.is_some_and(|change| change < options.energy_threshold)
            && density_rms < options.density_threshold;

        if converged {
            ScfState::Converged(RestrictedHartreeFockOutput {
                orbitals: OrbitalBasis::from_scf(coefficients),
                orbital_energies,
                density: new_density,
                electronic_energy,
                iterations,
            })
        } else if iterations >= options.max_iterations {
            ScfState::Failed {
                iterations,
                last_energy: electronic_energy,
                residual: density_rms,
            }
        } else {
            ScfState::Iterating {
                iteration: iterations,
                density: new_density,
                previous_energy: Some(electronic_energy),
            }
        }
    }
}

/// Extended hückel hamiltonian H_ij = K S_ij (H_ii + H_jj) / 2.
fn compute_huckel_hamiltonian(
    hamiltonian: &DMatrix<f64>,
    overlap: &DMatrix<f64>,
) -> DMatrix<f64> {
    const WOLFSBERG_HELMHOLZ: f64 = 1.75;

    utils::symmetric_matrix(hamiltonian.nrows(), |i, j| {
        if i == j {
            hamiltonian[(i, i)]
        } else {
            WOLFSBERG_HELMHOLZ * overlap[(i, j)] * (hamiltonian[(i, i)] + hamiltonian[(j, j)])
                / 2.0
        }
    })
}

fn compute_electronic_hamiltonian(
    density: &DMatrix<f64>,
    electron_terms: &[f64],
    n_basis: usize,
) -> DMatrix<f64> {
    utils::symmetric_matrix(n_basis, |i, j| {
        let mut sum = 0.0;
        for y in 0..n_basis {
            for x in 0..n_basis {
                sum += density[(x, y)]
                    * electron_terms[j * n_basis.pow(3) + i * n_basis.pow(2) + y * n_basis + x];
            }
        }
        sum
    })
}
