//! Davidson's method for the lowest eigenpair of a large symmetric matrix that is only
//! available through matrix-vector products.
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};

/// Denominators of the diagonal preconditioner are kept at least this far from zero.
const PRECONDITIONER_FLOOR: f64 = 1e-10;

/// Correction vectors with less than this norm after orthogonalization can't extend the
/// subspace.
const LINEAR_DEPENDENCE: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DavidsonOptions {
    pub max_iterations: usize,
    /// the norm of the residual A x - theta x below which the eigenpair counts as converged
    pub residual_threshold: f64,
    /// the subspace collapses onto the current ritz vector beyond this size
    pub max_subspace: usize,
}

impl Default for DavidsonOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            residual_threshold: 1e-8,
            max_subspace: 32,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Eigenpair {
    pub value: f64,
    pub vector: DVector<f64>,
    pub iterations: usize,
}

/// Progress of a Davidson run that did not converge.
#[derive(Copy, Clone, Debug)]
pub(crate) struct DavidsonFailure {
    pub iterations: usize,
    pub eigenvalue: f64,
    pub residual: f64,
}

/// Finds the lowest eigenpair of the symmetric matrix A given by `matvec` and its
/// `diagonal`, starting from a nonzero `guess`.
pub(crate) fn lowest_eigenpair(
    matvec: impl Fn(&DVector<f64>) -> DVector<f64>,
    diagonal: &DVector<f64>,
    guess: DVector<f64>,
    options: &DavidsonOptions,
) -> Result<Eigenpair, DavidsonFailure> {
    let dimension = diagonal.len();
    let max_subspace = options.max_subspace.clamp(2, dimension.max(2));

    let mut failure = DavidsonFailure {
        iterations: 0,
        eigenvalue: f64::NAN,
        residual: f64::INFINITY,
    };

    let norm = guess.norm();
    if dimension == 0 || norm == 0.0 || !norm.is_finite() {
        return Err(failure);
    }

    let start = guess / norm;
    let mut sigma = vec![matvec(&start)];
    let mut basis = vec![start];

    for iteration in 1..=options.max_iterations {
        let size = basis.len();
        let subspace = DMatrix::from_fn(size, size, |i, j| {
            0.5 * (basis[i].dot(&sigma[j]) + basis[j].dot(&sigma[i]))
        });
        let eigen = SymmetricEigen::new(subspace);

        let lowest = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, _)| index)
            .unwrap_or(0);
        let theta = eigen.eigenvalues[lowest];
        let weights = eigen.eigenvectors.column(lowest);

        let mut ritz = DVector::zeros(dimension);
        let mut image = DVector::zeros(dimension);
        for (k, &weight) in weights.iter().enumerate() {
            ritz.axpy(weight, &basis[k], 1.0);
            image.axpy(weight, &sigma[k], 1.0);
        }

        let residual = &image - theta * &ritz;
        let residual_norm = residual.norm();
        failure = DavidsonFailure {
            iterations: iteration,
            eigenvalue: theta,
            residual: residual_norm,
        };

        log::info!(
            "davidson iteration {iteration:<4} - eigenvalue {theta:1.10}. residual {residual_norm:1.4e}. subspace {size}"
        );

        if residual_norm < options.residual_threshold {
            return Ok(Eigenpair {
                value: theta,
                vector: ritz,
                iterations: iteration,
            });
        }

        let mut correction = DVector::from_fn(dimension, |i, _| {
            let denominator = theta - diagonal[i];
            let denominator = if denominator.abs() < PRECONDITIONER_FLOOR {
                PRECONDITIONER_FLOOR.copysign(denominator)
            } else {
                denominator
            };
            residual[i] / denominator
        });

        if size >= max_subspace {
            log::debug!("collapsing davidson subspace of size {size}");
            basis = vec![ritz];
            sigma = vec![image];
        }

        // twice is enough
        for _ in 0..2 {
            for vector in &basis {
                let overlap = vector.dot(&correction);
                correction.axpy(-overlap, vector, 1.0);
            }
        }

        let norm = correction.norm();
        if norm < LINEAR_DEPENDENCE || !norm.is_finite() {
            log::warn!("davidson correction vanished before convergence");
            return Err(failure);
        }

        correction /= norm;
        sigma.push(matvec(&correction));
        basis.push(correction);
    }

    Err(failure)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::{lowest_eigenpair, DavidsonOptions};

    /// A diagonally dominant random symmetric matrix, like a CI hamiltonian.
    fn random_symmetric(dimension: usize, seed: u64) -> DMatrix<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut matrix = DMatrix::from_fn(dimension, dimension, |_, _| rng.gen_range(-0.1..0.1));
        matrix = 0.5 * (&matrix + matrix.transpose());
        for i in 0..dimension {
            matrix[(i, i)] = i as f64 * 0.5 + rng.gen_range(-0.2..0.2);
        }
        matrix
    }

    fn unit(dimension: usize, index: usize) -> DVector<f64> {
        DVector::from_fn(dimension, |i, _| if i == index { 1.0 } else { 0.0 })
    }

    #[test]
    fn matches_dense_eigensolver() {
        let matrix = random_symmetric(120, 7);
        let diagonal = matrix.diagonal();
        let start = diagonal.argmin().0;

        let pair = lowest_eigenpair(
            |x| &matrix * x,
            &diagonal,
            unit(120, start),
            &DavidsonOptions {
                max_subspace: 12,
                ..DavidsonOptions::default()
            },
        )
        .unwrap();

        let lowest = matrix.symmetric_eigenvalues().min();
        assert_relative_eq!(pair.value, lowest, epsilon = 1e-10);
        assert_relative_eq!(pair.vector.norm(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(&matrix * &pair.vector, pair.value * &pair.vector, epsilon = 1e-7);
    }

    #[test]
    fn one_dimensional_problems_converge_immediately() {
        let matrix = DMatrix::from_element(1, 1, -2.5);
        let pair = lowest_eigenpair(
            |x| &matrix * x,
            &matrix.diagonal(),
            unit(1, 0),
            &DavidsonOptions::default(),
        )
        .unwrap();

        assert_eq!(pair.iterations, 1);
        assert_relative_eq!(pair.value, -2.5);
    }

    #[test]
    fn reports_progress_when_budget_is_exhausted() {
        let matrix = random_symmetric(40, 11);
        let failure = lowest_eigenpair(
            |x| &matrix * x,
            &matrix.diagonal(),
            unit(40, 0),
            &DavidsonOptions {
                max_iterations: 1,
                ..DavidsonOptions::default()
            },
        )
        .unwrap_err();

        assert_eq!(failure.iterations, 1);
        assert!(failure.eigenvalue.is_finite());
        assert!(failure.residual > 1e-8);
    }

    #[test]
    fn rejects_zero_guess() {
        let matrix = DMatrix::<f64>::identity(3, 3);
        assert!(lowest_eigenpair(
            |x| &matrix * x,
            &matrix.diagonal(),
            DVector::zeros(3),
            &DavidsonOptions::default()
        )
        .is_err());
    }
}
