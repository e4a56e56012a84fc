use std::ops::Index;

use crate::basis::BasisFunction;

use super::Integrator;

/// Compound index of a symmetric pair, (ij) = (ji).
#[inline(always)]
const fn pair_index(i: usize, j: usize) -> usize {
    let (i, j) = if i >= j { (i, j) } else { (j, i) };
    i * (i + 1) / 2 + j
}

/// Position of (ij|kl) in the compact storage. Every one of the eight equivalent
/// orderings of an integral maps to the same position.
#[inline(always)]
const fn quartet_index((i, j, k, l): (usize, usize, usize, usize)) -> usize {
    pair_index(pair_index(i, j), pair_index(k, l))
}

/// Electron repulsion integrals (ij|kl) in chemists' notation between the functions of
/// an atomic basis.
///
/// Only the unique integrals under
///   (ij|kl) = (ji|kl) = (ij|lk) = (kl|ij)
/// are stored, in the order of their compound indices.
#[derive(Clone, Debug, PartialEq)]
pub struct ElectronTensor {
    data: Vec<f64>,
    /// side length
    size: usize,
}

impl ElectronTensor {
    /// Computes all unique electron repulsion integrals of `basis`. With the `rayon` feature
    /// the integrals are evaluated in parallel; every integral is written to its own slot,
    /// so the result does not depend on the number of threads.
    pub fn from_basis(
        basis: &[BasisFunction],
        integrator: &(impl Integrator<Function = BasisFunction> + Sync),
    ) -> Self {
        let n_pairs = basis.len() * (basis.len() + 1) / 2;
        log::debug!(
            "computing {} unique electron repulsion integrals",
            n_pairs * (n_pairs + 1) / 2
        );

        #[cfg(feature = "rayon")]
        let data = compute_parallel(basis, integrator);
        #[cfg(not(feature = "rayon"))]
        let data = compute_sequential(basis, integrator);

        Self {
            data,
            size: basis.len(),
        }
    }

    /// Builds a tensor from a function of the four indices, which is only evaluated for
    /// one ordering of every unique integral.
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize, usize, usize) -> f64) -> Self {
        let pairs = basis_pairs(size);

        let mut data = Vec::with_capacity(pairs.len() * (pairs.len() + 1) / 2);
        for (ij, &(i, j)) in pairs.iter().enumerate() {
            for &(k, l) in &pairs[..=ij] {
                data.push(f(i, j, k, l));
            }
        }

        Self { data, size }
    }

    /// The number of basis functions each index runs over.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of stored unique integrals.
    pub fn n_unique(&self) -> usize {
        self.data.len()
    }
}

/// All index pairs (i, j) with j <= i, in the order of their compound index.
fn basis_pairs(n_basis: usize) -> Vec<(usize, usize)> {
    (0..n_basis)
        .flat_map(|i| (0..=i).map(move |j| (i, j)))
        .collect()
}

fn repulsion(
    basis: &[BasisFunction],
    integrator: &impl Integrator<Function = BasisFunction>,
    (i, j): (usize, usize),
    (k, l): (usize, usize),
) -> f64 {
    let integral = integrator.electron_repulsion((&basis[i], &basis[j], &basis[k], &basis[l]));

    log::trace!("ERI ({i} {j}|{k} {l}) = {integral:<1.8}");
    integral
}

#[cfg(any(test, not(feature = "rayon")))]
fn compute_sequential(
    basis: &[BasisFunction],
    integrator: &impl Integrator<Function = BasisFunction>,
) -> Vec<f64> {
    let pairs = basis_pairs(basis.len());

    (0..pairs.len())
        .flat_map(|ij| (0..=ij).map(move |kl| (ij, kl)))
        .map(|(ij, kl)| repulsion(basis, integrator, pairs[ij], pairs[kl]))
        .collect()
}

#[cfg(feature = "rayon")]
fn compute_parallel(
    basis: &[BasisFunction],
    integrator: &(impl Integrator<Function = BasisFunction> + Sync),
) -> Vec<f64> {
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    let pairs = basis_pairs(basis.len());

    (0..pairs.len())
        .into_par_iter()
        .flat_map_iter(|ij| (0..=ij).map(move |kl| (ij, kl)))
        .map(|(ij, kl)| repulsion(basis, integrator, pairs[ij], pairs[kl]))
        .collect()
}

impl Index<(usize, usize, usize, usize)> for ElectronTensor {
    type Output = f64;

    fn index(&self, index: (usize, usize, usize, usize)) -> &Self::Output {
        let (i, j, k, l) = index;
        assert!(
            i < self.size && j < self.size && k < self.size && l < self.size,
            "electron repulsion index ({i} {j}|{k} {l}) out of range for {} functions",
            self.size
        );

        &self.data[quartet_index(index)]
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_sequential, pair_index, quartet_index, ElectronTensor};
    #[cfg(feature = "rayon")]
    use super::compute_parallel;
    use crate::{
        atom::Nucleus,
        basis::{BasisFunction, BasisSetRegistry},
        integrals::McMurchieDavidson,
        molecule::Molecule,
    };

    #[test]
    fn compound_indices_are_dense() {
        let n = 4;
        let mut seen = vec![false; n * (n + 1) / 2];
        for i in 0..n {
            for j in 0..=i {
                assert_eq!(pair_index(i, j), pair_index(j, i));
                seen[pair_index(i, j)] = true;
            }
        }
        assert!(seen.into_iter().all(|seen| seen));
    }

    #[test]
    fn equivalent_orderings_share_storage() {
        let (i, j, k, l) = (3, 1, 0, 2);
        let reference = quartet_index((i, j, k, l));

        for permuted in [
            (j, i, k, l),
            (i, j, l, k),
            (j, i, l, k),
            (k, l, i, j),
            (l, k, i, j),
            (k, l, j, i),
            (l, k, j, i),
        ] {
            assert_eq!(quartet_index(permuted), reference);
        }

        // (ij|kl) and (ik|jl) are different integrals
        assert_ne!(quartet_index((i, k, j, l)), reference);
    }

    #[test]
    fn from_fn_fills_every_slot() {
        let size = 3;
        let tensor = ElectronTensor::from_fn(size, |i, j, k, l| (i * j + k * l) as f64);

        assert_eq!(tensor.size(), size);
        assert_eq!(tensor.n_unique(), 21);
        for (i, j, k, l) in itertools::iproduct!(0..size, 0..size, 0..size, 0..size) {
            assert_eq!(tensor[(i, j, k, l)], (i * j + k * l) as f64);
        }
    }

    fn water_basis() -> Vec<BasisFunction> {
        let water = Molecule::new(
            vec![
                Nucleus::new(8, 0.0, -0.143225816552, 0.0).unwrap(),
                Nucleus::new(1, 1.638036840407, 1.136548822547, 0.0).unwrap(),
                Nucleus::new(1, -1.638036840407, 1.136548822547, 0.0).unwrap(),
            ],
            0,
        )
        .unwrap();

        BasisSetRegistry::builtin()
            .unwrap()
            .get("STO-3G")
            .unwrap()
            .basis_for(&water)
            .unwrap()
    }

    #[test]
    fn from_basis_stores_every_unique_integral() {
        let basis = water_basis();
        let tensor = ElectronTensor::from_basis(&basis, &McMurchieDavidson);

        assert_eq!(tensor.size(), 7);
        assert_eq!(tensor.n_unique(), 406);
        assert_eq!(tensor.data, compute_sequential(&basis, &McMurchieDavidson));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_integrals_are_bit_identical() {
        let basis = water_basis();
        let sequential = compute_sequential(&basis, &McMurchieDavidson);

        for threads in [1, 4] {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let parallel = pool.install(|| compute_parallel(&basis, &McMurchieDavidson));

            assert!(parallel == sequential, "{threads} threads changed the integrals");
        }
    }

    #[test]
    #[should_panic]
    fn rejects_out_of_range_indices() {
        let tensor = ElectronTensor::from_fn(2, |_, _, _, _| 1.0);
        let _ = tensor[(0, 0, 0, 2)];
    }
}
