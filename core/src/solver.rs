use serde::{Deserialize, Serialize};

use crate::{
    basis::BasisSetRegistry,
    ci::{self, CiMethod, CiOptions},
    error::{Error, Result},
    hamiltonian::MolecularHamiltonian,
    hf::{restricted_hartree_fock, HartreeFockInput, InitialGuess, ScfOptions},
    integrals,
    molecule::Molecule,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub scf: ScfOptions,
    pub ci: CiOptions,
}

/// The results of a DOCI calculation on top of restricted hartree fock orbitals.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Solution {
    /// total DOCI energy, including nuclear repulsion
    pub energy: f64,
    /// total hartree fock energy, including nuclear repulsion
    pub rhf_energy: f64,
    pub nuclear_repulsion: f64,
    /// hartree fock orbital energies in ascending order
    pub orbital_energies: Vec<f64>,
    pub scf_iterations: usize,
    pub ci_iterations: usize,
    pub ci_method: CiMethod,
    pub ci_dimension: usize,
}

/// Computes the DOCI energy of a closed shell molecule in the canonical orbitals of a
/// restricted hartree fock calculation.
#[derive(Debug)]
pub struct Solver<'r> {
    molecule: Molecule,
    basis_name: String,
    use_initial_guess: bool,
    n_pairs: usize,
    registry: &'r BasisSetRegistry,
    options: SolverOptions,
    solution: Option<Solution>,
}

impl Solver<'static> {
    /// Creates a solver that looks its basis set up in the built-in registry. With
    /// `use_initial_guess`, the hartree fock calculation starts from extended hückel
    /// orbitals instead of core hamiltonian orbitals.
    pub fn new(
        molecule: Molecule,
        basis_name: impl Into<String>,
        use_initial_guess: bool,
    ) -> Result<Self> {
        Self::with_registry(
            BasisSetRegistry::builtin()?,
            molecule,
            basis_name,
            use_initial_guess,
        )
    }
}

impl<'r> Solver<'r> {
    pub fn with_registry(
        registry: &'r BasisSetRegistry,
        molecule: Molecule,
        basis_name: impl Into<String>,
        use_initial_guess: bool,
    ) -> Result<Self> {
        let n_pairs = molecule.n_electron_pairs()?;

        Ok(Self {
            molecule,
            basis_name: basis_name.into(),
            use_initial_guess,
            n_pairs,
            registry,
            options: SolverOptions::default(),
            solution: None,
        })
    }

    /// Replaces the options of the next [`Solver::solve`].
    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn basis_name(&self) -> &str {
        &self.basis_name
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Runs integral evaluation, hartree fock, the orbital transformation and DOCI. Any
    /// earlier solution is discarded first, also when the calculation fails.
    pub fn solve(&mut self) -> Result<()> {
        self.solution = None;

        let nuclear_repulsion = self.molecule.nuclear_repulsion();
        log::debug!("nuclear repulsion energy: {nuclear_repulsion}");

        let integrals = integrals::evaluate(&self.molecule, self.registry, &self.basis_name)?;

        let guess = if self.use_initial_guess {
            InitialGuess::Huckel
        } else {
            InitialGuess::Core
        };

        let scf = restricted_hartree_fock(&HartreeFockInput {
            integrals: &integrals,
            n_electrons: self.molecule.n_electrons(),
            guess,
            options: &self.options.scf,
        })?;
        let rhf_energy = scf.total_energy(nuclear_repulsion);
        log::info!("RHF energy: {rhf_energy:1.10}");

        let hamiltonian = MolecularHamiltonian::from_atomic(
            &integrals.core_hamiltonian,
            &integrals.electron,
            &scf.orbitals,
        )?;

        let ci = ci::solve(
            &hamiltonian,
            hamiltonian.n_orbitals(),
            self.n_pairs,
            &self.options.ci,
        )?;
        let energy = ci.energy + nuclear_repulsion;
        log::info!("DOCI energy: {energy:1.10}");

        self.solution = Some(Solution {
            energy,
            rhf_energy,
            nuclear_repulsion,
            orbital_energies: scf.orbital_energies,
            scf_iterations: scf.iterations,
            ci_iterations: ci.iterations,
            ci_method: ci.method,
            ci_dimension: ci.dimension,
        });

        Ok(())
    }

    /// The total DOCI energy of the last successful [`Solver::solve`].
    pub fn energy(&self) -> Result<f64> {
        self.solution().map(|solution| solution.energy).ok_or(Error::NotSolved)
    }

    /// The total hartree fock energy of the last successful [`Solver::solve`].
    pub fn rhf_energy(&self) -> Result<f64> {
        self.solution()
            .map(|solution| solution.rhf_energy)
            .ok_or(Error::NotSolved)
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{Solver, SolverOptions};
    use crate::{
        atom::Nucleus,
        basis::BasisSetRegistry,
        ci::{CiMethod, CiOptions},
        error::Error,
        hf::ScfOptions,
        molecule::Molecule,
    };

    fn fluorine_cation() -> Molecule {
        Molecule::new(vec![Nucleus::new(9, 0.0, 0.0, 0.0).unwrap()], 1).unwrap()
    }

    fn hydrogen() -> Molecule {
        Molecule::new(
            vec![
                Nucleus::new(1, 0.0, 0.0, 0.0).unwrap(),
                Nucleus::new(1, 0.0, 0.0, 1.4).unwrap(),
            ],
            0,
        )
        .unwrap()
    }

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
    fn fluorine_cation_sto_3g() {
        let mut solver = Solver::new(fluorine_cation(), "STO-3G", false).unwrap();
        solver.solve().unwrap();

        assert_relative_eq!(solver.energy().unwrap(), -97.41595197133647, epsilon = 1e-6);
        assert_relative_eq!(
            solver.rhf_energy().unwrap(),
            -97.36218167802473,
            epsilon = 1e-8
        );

        let solution = solver.solution().unwrap();
        let expected = [-27.20506, -2.22529, -1.35299, -1.35299, -0.62432];
        for (&found, expected) in solution.orbital_energies.iter().zip(expected) {
            assert_relative_eq!(found, expected, epsilon = 1e-4);
        }
        // 4 pairs in 5 orbitals
        assert_eq!(solution.ci_dimension, 5);
        assert_eq!(solution.nuclear_repulsion, 0.0);
    }

    #[test]
    fn fluorine_cation_from_huckel_guess() {
        let mut solver = Solver::new(fluorine_cation(), "sto-3g", true).unwrap();
        solver.solve().unwrap();

        assert_relative_eq!(solver.energy().unwrap(), -97.41595197133647, epsilon = 1e-6);
    }

    #[test]
    fn two_electrons_give_full_ci() {
        let mut solver = Solver::new(hydrogen(), "STO-3G", false).unwrap();
        solver.solve().unwrap();

        assert_relative_eq!(solver.energy().unwrap(), -1.1372759437827176, epsilon = 1e-8);
        assert_relative_eq!(
            solver.rhf_energy().unwrap(),
            -1.1167143251757694,
            epsilon = 1e-8
        );
    }

    #[test]
    fn lithium_hydride_and_water() {
        let lithium_hydride = Molecule::new(
            vec![
                Nucleus::new(3, 0.0, 0.0, 0.0).unwrap(),
                Nucleus::new(1, 0.0, 0.0, 3.015).unwrap(),
            ],
            0,
        )
        .unwrap();

        let mut solver = Solver::new(lithium_hydride, "STO-3G", false).unwrap();
        solver.solve().unwrap();
        assert_relative_eq!(solver.energy().unwrap(), -7.877996989734765, epsilon = 1e-7);

        let mut solver = Solver::new(water(), "STO-3G", false).unwrap();
        solver.solve().unwrap();
        assert_relative_eq!(solver.energy().unwrap(), -74.97709826579023, epsilon = 1e-7);
        assert_eq!(solver.solution().unwrap().ci_dimension, 21);
    }

    #[test]
    fn doci_lies_below_hartree_fock() {
        for molecule in [fluorine_cation(), hydrogen(), water()] {
            let mut solver = Solver::new(molecule, "STO-3G", false).unwrap();
            solver.solve().unwrap();

            let solution = solver.solution().unwrap();
            assert!(solution.energy <= solution.rhf_energy + 1e-10);
        }
    }

    #[test]
    fn davidson_agrees_with_dense() {
        let solve_with = |method| {
            let options = SolverOptions {
                ci: CiOptions {
                    method,
                    ..CiOptions::default()
                },
                ..SolverOptions::default()
            };
            let mut solver = Solver::new(water(), "STO-3G", false)
                .unwrap()
                .with_options(options);
            solver.solve().unwrap();
            solver.solution().unwrap().clone()
        };

        let dense = solve_with(CiMethod::Dense);
        let davidson = solve_with(CiMethod::Davidson);

        assert_eq!(dense.ci_method, CiMethod::Dense);
        assert_eq!(davidson.ci_method, CiMethod::Davidson);
        assert_relative_eq!(dense.energy, davidson.energy, epsilon = 1e-10);
    }

    #[test]
    fn solving_twice_gives_the_same_result() {
        let mut solver = Solver::new(water(), "STO-3G", false).unwrap();

        solver.solve().unwrap();
        let first = solver.solution().unwrap().clone();
        solver.solve().unwrap();

        assert_eq!(solver.solution().unwrap(), &first);
    }

    #[test]
    fn energy_requires_a_solution() {
        let solver = Solver::new(hydrogen(), "STO-3G", false).unwrap();

        assert!(matches!(solver.energy(), Err(Error::NotSolved)));
        assert!(matches!(solver.rhf_energy(), Err(Error::NotSolved)));
        assert!(solver.solution().is_none());
    }

    #[test]
    fn odd_electron_counts_are_rejected() {
        let fluorine = Molecule::new(vec![Nucleus::new(9, 0.0, 0.0, 0.0).unwrap()], 0).unwrap();

        assert!(matches!(
            Solver::new(fluorine, "STO-3G", false),
            Err(Error::InvalidMolecule(_))
        ));
    }

    #[test]
    fn failures_clear_the_previous_solution() {
        let mut solver = Solver::new(water(), "STO-3G", false).unwrap();
        solver.solve().unwrap();
        let mut solver = solver.with_options(SolverOptions {
            scf: ScfOptions {
                max_iterations: 1,
                ..ScfOptions::default()
            },
            ..SolverOptions::default()
        });
        assert!(solver.energy().is_ok());
        assert!(matches!(solver.solve(), Err(Error::Convergence { .. })));
        assert!(matches!(solver.energy(), Err(Error::NotSolved)));
    }

    #[test]
    fn unknown_basis_sets_fail_to_solve() {
        let mut solver = Solver::new(hydrogen(), "cc-pVDZ", false).unwrap();

        assert!(matches!(
            solver.solve(),
            Err(Error::UnknownBasis {
                atomic_number: None,
                ..
            })
        ));
    }

    #[test]
    fn explicit_registries_are_used() {
        let registry = BasisSetRegistry::new();
        let mut solver = Solver::with_registry(&registry, hydrogen(), "STO-3G", false).unwrap();

        assert!(matches!(solver.solve(), Err(Error::UnknownBasis { .. })));
    }
}
