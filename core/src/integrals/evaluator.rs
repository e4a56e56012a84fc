use nalgebra::DMatrix;

use crate::{
    atom::Nucleus, basis::BasisFunction, basis::BasisSetRegistry, error::Result,
    molecule::Molecule, utils,
};

use super::{DefaultIntegrator, ElectronTensor, Integrator};

/// The integrals over the atomic basis of a molecule that a restricted calculation needs.
#[derive(Clone, Debug)]
pub struct AtomicIntegrals {
    /// the basis functions the integrals run over, in atomic orbital order
    pub basis: Vec<BasisFunction>,
    pub overlap: DMatrix<f64>,
    pub kinetic: DMatrix<f64>,
    pub nuclear: DMatrix<f64>,
    /// kinetic + nuclear
    pub core_hamiltonian: DMatrix<f64>,
    pub electron: ElectronTensor,
}

impl AtomicIntegrals {
    pub fn n_basis(&self) -> usize {
        self.basis.len()
    }
}

/// Places the named basis set on the nuclei of `molecule` and computes all atomic
/// integrals with the default integrator.
pub fn evaluate(
    molecule: &Molecule,
    registry: &BasisSetRegistry,
    basis_name: &str,
) -> Result<AtomicIntegrals> {
    let basis = registry.get(basis_name)?.basis_for(molecule)?;
    log::info!("{} basis functions in {basis_name}", basis.len());

    Ok(evaluate_basis(
        basis,
        molecule.nuclei(),
        &DefaultIntegrator::default(),
    ))
}

/// Computes all atomic integrals of an explicit basis.
pub fn evaluate_basis(
    basis: Vec<BasisFunction>,
    nuclei: &[Nucleus],
    integrator: &(impl Integrator<Function = BasisFunction> + Sync),
) -> AtomicIntegrals {
    let overlap = compute_overlap_matrix(&basis, integrator);
    log::debug!("overlap matrix: {overlap:0.4}");
    let kinetic = compute_kinetic_matrix(&basis, integrator);
    log::debug!("kinetic matrix: {kinetic:0.4}");
    let nuclear = compute_nuclear_matrix(&basis, nuclei, integrator);
    log::debug!("nuclear matrix: {nuclear:0.4}");
    let electron = ElectronTensor::from_basis(&basis, integrator);

    AtomicIntegrals {
        core_hamiltonian: &kinetic + &nuclear,
        basis,
        overlap,
        kinetic,
        nuclear,
        electron,
    }
}

pub fn compute_overlap_matrix(
    basis: &[BasisFunction],
    integrator: &impl Integrator<Function = BasisFunction>,
) -> DMatrix<f64> {
    utils::symmetric_matrix(basis.len(), |i, j| {
        let overlap_ij = integrator.overlap((&basis[i], &basis[j]));
        log::trace!("overlap ({i}{j}) = {overlap_ij}");
        overlap_ij
    })
}

pub fn compute_kinetic_matrix(
    basis: &[BasisFunction],
    integrator: &impl Integrator<Function = BasisFunction>,
) -> DMatrix<f64> {
    utils::symmetric_matrix(basis.len(), |i, j| {
        let kinetic_ij = integrator.kinetic((&basis[i], &basis[j]));
        log::trace!("kinetic ({i}{j}) = {kinetic_ij}");
        kinetic_ij
    })
}

pub fn compute_nuclear_matrix(
    basis: &[BasisFunction],
    nuclei: &[Nucleus],
    integrator: &impl Integrator<Function = BasisFunction>,
) -> DMatrix<f64> {
    utils::symmetric_matrix(basis.len(), |i, j| {
        let nuclear_ij = integrator.nuclear((&basis[i], &basis[j]), nuclei);
        log::trace!("nuclear ({i}{j}) = {nuclear_ij}");
        nuclear_ij
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::evaluate;
    use crate::{atom::Nucleus, basis::BasisSetRegistry, error::Error, molecule::Molecule};

    fn water() -> Molecule {
        Molecule::new(
            vec![
                Nucleus::new(8, 0.0, -0.143225816552, 0.0).unwrap(),
                Nucleus::new(1, 1.638036840407, 1.136548822547, 0.0).unwrap(),
                Nucleus::new(1, -1.638036840407, 1.136548822547, 0.0).unwrap(),
            ],
            0,
        )
        .unwrap()
    }

    #[test]
    fn water_sto_3g_integrals() {
        let integrals = evaluate(&water(), BasisSetRegistry::builtin().unwrap(), "STO-3G").unwrap();
        let n = integrals.n_basis();

        assert_eq!(n, 7);
        assert_eq!(integrals.electron.size(), 7);
        assert_relative_eq!(integrals.overlap, integrals.overlap.transpose());
        assert_relative_eq!(
            integrals.core_hamiltonian,
            &integrals.kinetic + &integrals.nuclear,
            epsilon = 1e-14
        );

        for i in 0..n {
            assert_relative_eq!(integrals.overlap[(i, i)], 1.0, epsilon = 1e-4);
            assert!(integrals.kinetic[(i, i)] > 0.0);
            assert!(integrals.nuclear[(i, i)] < 0.0);
            assert!(integrals.electron[(i, i, i, i)] > 0.0);
        }

        // the overlap of linearly independent functions is positive definite
        let eigenvalues = integrals.overlap.clone().symmetric_eigenvalues();
        assert!(eigenvalues.iter().all(|&value| value > 0.0));

        // oxygen p_z is the only function that is odd under reflection through the
        // molecular plane
        for i in 0..n {
            if i != 4 {
                assert_relative_eq!(integrals.overlap[(i, 4)], 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn cauchy_schwarz_bound_holds() {
        let integrals = evaluate(&water(), BasisSetRegistry::builtin().unwrap(), "sto-3g").unwrap();
        let eri = &integrals.electron;
        let n = integrals.n_basis();

        for (i, j, k, l) in itertools::iproduct!(0..n, 0..n, 0..n, 0..n) {
            let bound = (eri[(i, j, i, j)] * eri[(k, l, k, l)]).sqrt();
            assert!(eri[(i, j, k, l)].abs() <= bound + 1e-12);
        }
    }

    #[test]
    fn unknown_basis_fails_before_integration() {
        assert!(matches!(
            evaluate(&water(), BasisSetRegistry::builtin().unwrap(), "def2-TZVP"),
            Err(Error::UnknownBasis { .. })
        ));
    }
}
