use crate::error::{Error, Result};

/// Configurations are bit strings over the orbitals.
pub const MAX_ORBITALS: usize = u64::BITS as usize;

/// All seniority zero configurations of `n_pairs` electron pairs in `n_orbitals` spatial
/// orbitals. Bit p of a configuration is set if orbital p is doubly occupied.
///
/// Configurations are ordered by their value as integers, and addressed through the
/// combinatorial number system: the configuration with occupied orbitals p_1 < ... < p_k
/// has the address sum_k C(p_k, k).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeniorityZeroSpace {
    n_orbitals: usize,
    n_pairs: usize,
    dimension: usize,
    /// binomials[n][k] = C(n, k) for n <= n_orbitals, k <= n_pairs
    binomials: Vec<Vec<usize>>,
}

impl SeniorityZeroSpace {
    pub fn new(n_orbitals: usize, n_pairs: usize) -> Result<Self> {
        if n_orbitals > MAX_ORBITALS {
            return Err(Error::ConfigurationSpace(format!(
                "{n_orbitals} orbitals exceed the limit of {MAX_ORBITALS}"
            )));
        }

        if n_pairs > n_orbitals {
            return Err(Error::ConfigurationSpace(format!(
                "{n_pairs} electron pairs don't fit into {n_orbitals} orbitals"
            )));
        }

        let mut binomials = vec![vec![0usize; n_pairs + 1]; n_orbitals + 1];
        for n in 0..=n_orbitals {
            binomials[n][0] = 1;
            for k in 1..=n_pairs.min(n) {
                binomials[n][k] = binomials[n - 1][k - 1]
                    .checked_add(binomials[n - 1][k])
                    .ok_or_else(|| {
                        Error::ConfigurationSpace(format!(
                            "C({n_orbitals}, {n_pairs}) configurations can't be addressed"
                        ))
                    })?;
            }
        }

        let dimension = binomials[n_orbitals][n_pairs];

        Ok(Self {
            n_orbitals,
            n_pairs,
            dimension,
            binomials,
        })
    }

    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }

    pub fn n_pairs(&self) -> usize {
        self.n_pairs
    }

    /// The number of configurations, C(n_orbitals, n_pairs).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The configuration with the lowest orbitals occupied, at address zero.
    pub fn aufbau(&self) -> u64 {
        lowest_bits(self.n_pairs)
    }

    /// All configurations in ascending order, which is also the order of their addresses.
    pub fn configurations(&self) -> impl Iterator<Item = u64> {
        std::iter::successors(Some(self.aufbau()), |&configuration| {
            next_permutation(configuration)
        })
        .take(self.dimension)
    }

    /// The position of `configuration` among all configurations of this space.
    pub fn address(&self, configuration: u64) -> usize {
        occupied_orbitals(configuration)
            .enumerate()
            .map(|(k, orbital)| self.binomials[orbital][k + 1])
            .sum()
    }
}

/// The indices of the set bits, in ascending order.
pub(crate) fn occupied_orbitals(configuration: u64) -> impl Iterator<Item = usize> {
    let mut remaining = configuration;
    std::iter::from_fn(move || {
        if remaining == 0 {
            None
        } else {
            let orbital = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            Some(orbital)
        }
    })
}

fn lowest_bits(n: usize) -> u64 {
    if n >= MAX_ORBITALS {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

/// The next larger integer with the same number of set bits (Gosper's hack).
fn next_permutation(configuration: u64) -> Option<u64> {
    if configuration == 0 {
        return None;
    }

    let lowest = configuration & configuration.wrapping_neg();
    let ripple = configuration.checked_add(lowest)?;
    Some((((ripple ^ configuration) >> 2) / lowest) | ripple)
}
