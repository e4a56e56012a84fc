use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Subspace sizes of the direct inversion in the iterative subspace.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiisOptions {
    /// fock matrices are only extrapolated once this many samples were collected
    pub min_subspace: usize,
    /// the oldest samples are dropped beyond this many
    pub max_subspace: usize,
}

impl Default for DiisOptions {
    fn default() -> Self {
        Self {
            min_subspace: 6,
            max_subspace: 6,
        }
    }
}

struct Sample {
    error: DMatrix<f64>,
    fock: DMatrix<f64>,
}

pub(crate) struct Diis {
    options: DiisOptions,
    /// newest first
    previous_samples: VecDeque<Sample>,
}

impl Diis {
    pub fn new(options: DiisOptions) -> Self {
        Self {
            options,
            previous_samples: VecDeque::with_capacity(options.max_subspace + 1),
        }
    }

    /// Records a fock matrix with its commutator error FDS - SDF and returns the
    /// extrapolated fock matrix. Returns `None` if the subspace equations are singular.
    pub fn fock(&mut self, error: DMatrix<f64>, fock: DMatrix<f64>) -> Option<DMatrix<f64>> {
        self.previous_samples.push_front(Sample { error, fock });
        self.previous_samples.truncate(self.options.max_subspace.max(1));

        let n = self.previous_samples.len();
        if n < self.options.min_subspace.max(2) {
            return self
                .previous_samples
                .front()
                .map(|Sample { fock, .. }| fock.to_owned());
        }

        let matrix = DMatrix::from_fn(n + 1, n + 1, |i, j| match (i, j) {
            (i, j) if i == n && j == n => 0.0,
            (i, j) if i == n || j == n => 1.0,
            _ => self.previous_samples[j]
                .error
                .dot(&self.previous_samples[i].error),
        });

        let b = DVector::from_fn(n + 1, |i, _| if i == n { 1.0 } else { 0.0 });

        let solution = matrix.qr().solve(&b)?;
        if solution.iter().any(|x| !x.is_finite()) {
            return None;
        }

        Some(
            solution
                .iter()
                .enumerate()
                .take(n)
                .map(|(i, &x)| x * &self.previous_samples[i].fock)
                .sum(),
        )
    }

    /// The largest absolute entry of the newest error matrix.
    pub fn max_error(&self) -> Option<f64> {
        self.previous_samples
            .front()
            .map(|Sample { error, .. }| error.amax())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    use super::{Diis, DiisOptions};

    #[test]
    fn returns_newest_fock_until_subspace_is_filled() {
        let mut diis = Diis::new(DiisOptions {
            min_subspace: 3,
            max_subspace: 4,
        });

        let fock = DMatrix::from_element(2, 2, 1.0);
        let error = DMatrix::from_element(2, 2, 0.1);
        assert_eq!(diis.fock(error.clone(), fock.clone()), Some(fock.clone()));
        assert_eq!(diis.fock(error * 0.5, fock * 2.0), Some(DMatrix::from_element(2, 2, 2.0)));
        assert_relative_eq!(diis.max_error().unwrap(), 0.05);
    }

    #[test]
    fn extrapolates_to_vanishing_error() {
        let mut diis = Diis::new(DiisOptions {
            min_subspace: 2,
            max_subspace: 2,
        });

        // the error is linear in the fock matrix and vanishes at f = 3
        let sample = |f: f64| {
            (
                DMatrix::from_element(1, 1, f - 3.0),
                DMatrix::from_element(1, 1, f),
            )
        };

        let (error, fock) = sample(1.0);
        diis.fock(error, fock);
        let (error, fock) = sample(2.0);
        let extrapolated = diis.fock(error, fock).unwrap();

        assert_relative_eq!(extrapolated[(0, 0)], 3.0, epsilon = 1e-12);
    }
}
