use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::{
    error::{Error, Result, Stage},
    hamiltonian::MolecularHamiltonian,
};

use super::{
    davidson,
    space::{occupied_orbitals, SeniorityZeroSpace},
    CiMethod, CiOptions, CiOutput,
};

/// Sweep budget of the dense eigensolver.
const DENSE_MAX_ITERATIONS: usize = 10_000;

/// The hamiltonian restricted to the seniority zero configurations of a space.
///
/// Only the integrals that couple pair configurations are kept: h_ii, J_ij = (ii|jj) and
/// K_ij = (ij|ij).
#[derive(Clone, Debug)]
pub struct DociHamiltonian {
    space: SeniorityZeroSpace,
    configurations: Vec<u64>,
    diagonal: DVector<f64>,
    /// (ij|ij), the amplitude of moving a pair from orbital i to orbital j
    exchange: DMatrix<f64>,
}

impl DociHamiltonian {
    pub fn new(hamiltonian: &MolecularHamiltonian, space: SeniorityZeroSpace) -> Result<Self> {
        let n = space.n_orbitals();
        if hamiltonian.n_orbitals() != n {
            return Err(Error::DimensionMismatch {
                what: "orbitals of the configuration space",
                expected: hamiltonian.n_orbitals(),
                found: n,
            });
        }

        let h = hamiltonian.one_electron();
        let coulomb = DMatrix::from_fn(n, n, |i, j| hamiltonian.two_electron(i, i, j, j));
        let exchange = DMatrix::from_fn(n, n, |i, j| hamiltonian.two_electron(i, j, i, j));

        let configurations = space.configurations().collect::<Vec<_>>();
        let diagonal = DVector::from_iterator(
            configurations.len(),
            configurations.iter().map(|&configuration| {
                let mut energy = 0.0;
                for i in occupied_orbitals(configuration) {
                    energy += 2.0 * h[(i, i)];
                    for j in occupied_orbitals(configuration) {
                        energy += 2.0 * coulomb[(i, j)] - exchange[(i, j)];
                    }
                }
                energy
            }),
        );

        Ok(Self {
            space,
            configurations,
            diagonal,
            exchange,
        })
    }

    pub fn space(&self) -> &SeniorityZeroSpace {
        &self.space
    }

    pub fn dimension(&self) -> usize {
        self.configurations.len()
    }

    pub fn diagonal(&self) -> &DVector<f64> {
        &self.diagonal
    }

    /// Calls `f(row, column, element)` for every nonzero off-diagonal element.
    fn for_each_coupling(&self, mut f: impl FnMut(usize, usize, f64)) {
        let n = self.space.n_orbitals();

        for (column, &configuration) in self.configurations.iter().enumerate() {
            for i in occupied_orbitals(configuration) {
                for a in (0..n).filter(|&a| configuration & (1 << a) == 0) {
                    let excited = configuration ^ (1 << i) ^ (1 << a);
                    f(self.space.address(excited), column, self.exchange[(i, a)]);
                }
            }
        }
    }

    /// H x, without building H.
    pub fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = self.diagonal.component_mul(x);
        self.for_each_coupling(|row, column, element| y[row] += element * x[column]);
        y
    }

    /// The full hamiltonian matrix.
    pub fn dense(&self) -> DMatrix<f64> {
        let mut matrix = DMatrix::from_diagonal(&self.diagonal);
        self.for_each_coupling(|row, column, element| matrix[(row, column)] = element);
        matrix
    }

    /// The unit vector on the configuration with the lowest diagonal element.
    fn lowest_diagonal_guess(&self) -> DVector<f64> {
        let (start, _) = self
            .diagonal
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap_or((0, &0.0));
        DVector::from_fn(self.dimension(), |i, _| if i == start { 1.0 } else { 0.0 })
    }
}

/// Finds the lowest DOCI eigenvalue of `hamiltonian` with `n_pairs` electron pairs in
/// `n_orbitals` orbitals. The energy is electronic, without nuclear repulsion.
pub fn solve(
    hamiltonian: &MolecularHamiltonian,
    n_orbitals: usize,
    n_pairs: usize,
    options: &CiOptions,
) -> Result<CiOutput> {
    let space = SeniorityZeroSpace::new(n_orbitals, n_pairs)?;
    let doci = DociHamiltonian::new(hamiltonian, space)?;
    let dimension = doci.dimension();

    let use_davidson = match options.method {
        CiMethod::Dense => false,
        CiMethod::Davidson => true,
        CiMethod::Auto => dimension > options.dense_limit,
    };

    log::info!(
        "DOCI with {n_pairs} pairs in {n_orbitals} orbitals: {dimension} configurations, {} solver",
        if use_davidson { "davidson" } else { "dense" }
    );

    if !use_davidson {
        return solve_dense(&doci, None);
    }

    match davidson::lowest_eigenpair(
        |x| doci.matvec(x),
        doci.diagonal(),
        doci.lowest_diagonal_guess(),
        &options.davidson,
    ) {
        Ok(pair) => Ok(CiOutput {
            energy: pair.value,
            coefficients: pair.vector,
            iterations: pair.iterations,
            method: CiMethod::Davidson,
            dimension,
        }),
        Err(failure) if dimension <= options.dense_limit => {
            log::warn!(
                "davidson did not converge after {} iterations (residual {:1.4e}), falling back to dense diagonalization",
                failure.iterations,
                failure.residual
            );
            solve_dense(&doci, Some(failure))
        }
        Err(failure) => Err(Error::Convergence {
            stage: Stage::Ci,
            iterations: failure.iterations,
            last_energy: failure.eigenvalue,
            residual: failure.residual,
        }),
    }
}

fn solve_dense(
    doci: &DociHamiltonian,
    previous: Option<davidson::DavidsonFailure>,
) -> Result<CiOutput> {
    let eigen = SymmetricEigen::try_new(doci.dense(), f64::EPSILON, DENSE_MAX_ITERATIONS)
        .ok_or_else(|| Error::Convergence {
            stage: Stage::Ci,
            iterations: DENSE_MAX_ITERATIONS,
            last_energy: previous.map_or(f64::NAN, |failure| failure.eigenvalue),
            residual: previous.map_or(f64::NAN, |failure| failure.residual),
        })?;

    let (lowest, &energy) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .ok_or_else(|| Error::ConfigurationSpace("empty configuration space".to_string()))?;

    Ok(CiOutput {
        energy,
        coefficients: eigen.eigenvectors.column(lowest).into_owned(),
        iterations: 1,
        method: CiMethod::Dense,
        dimension: doci.dimension(),
    })
}
