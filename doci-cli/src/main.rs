use std::{path::PathBuf, time::Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use doci_core::{
    ci::{CiMethod, CiOptions},
    hf::{restricted_hartree_fock, HartreeFockInput, InitialGuess, ScfOptions},
    integrals, BasisSetRegistry, Molecule, Solver, SolverOptions,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restricted hartree fock
    #[command(name = "rhf")]
    RestrictedHartreeFock {
        #[command(flatten)]
        system: SystemArgs,
        #[command(flatten)]
        scf: ScfArgs,
    },
    /// Doubly occupied configuration interaction in the hartree fock orbitals
    #[command(name = "doci")]
    Doci {
        #[command(flatten)]
        system: SystemArgs,
        #[command(flatten)]
        scf: ScfArgs,
        /// How to find the lowest eigenvalue of the configuration interaction matrix
        #[arg(long, value_enum, default_value_t = Method::Auto)]
        ci_method: Method,
        /// Print the solution as json instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct SystemArgs {
    /// A path to an xyz file of the molecule, with coordinates in ångström
    #[arg(long, short)]
    molecule: PathBuf,
    /// The charge of the molecule
    #[arg(long, short, default_value_t = 0, allow_negative_numbers = true)]
    charge: i32,
    /// The name of a registered basis set
    #[arg(long, short, default_value = "STO-3G")]
    basis_set: String,
    /// A basis set exchange json file, which replaces --basis-set
    #[arg(long)]
    basis_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScfArgs {
    /// The maximum number of iterations the SCF loop should attempt before the
    /// calculation is considered to not converge
    #[arg(long, default_value_t = 128)]
    max_iterations: usize,
    /// if the energy changes by less than this between iterations (and the density
    /// converged), the system is considered converged
    #[arg(long, default_value_t = 1e-10)]
    energy_threshold: f64,
    /// if the rms of the density matrix change drops below this (and the energy
    /// converged), the system is considered converged
    #[arg(long, default_value_t = 1e-8)]
    density_threshold: f64,
    /// Start from extended hückel orbitals instead of core hamiltonian orbitals
    #[arg(long)]
    huckel_guess: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    Auto,
    Dense,
    Davidson,
}

impl From<Method> for CiMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Auto => CiMethod::Auto,
            Method::Dense => CiMethod::Dense,
            Method::Davidson => CiMethod::Davidson,
        }
    }
}

impl ScfArgs {
    fn options(&self) -> ScfOptions {
        ScfOptions {
            max_iterations: self.max_iterations,
            energy_threshold: self.energy_threshold,
            density_threshold: self.density_threshold,
            ..ScfOptions::default()
        }
    }
}

impl SystemArgs {
    /// Loads the molecule, and the registry with the name of the basis set to use.
    fn load(&self) -> anyhow::Result<(Molecule, BasisSetRegistry, String)> {
        let molecule = Molecule::read_xyz(&self.molecule, self.charge)
            .with_context(|| format!("failed to read {}", self.molecule.display()))?;

        let mut registry =
            BasisSetRegistry::with_builtin_sets().context("failed to load built-in basis sets")?;

        let basis_name = match &self.basis_file {
            Some(path) => registry
                .load_json(path)
                .with_context(|| format!("failed to load basis set {}", path.display()))?
                .name()
                .to_string(),
            None => self.basis_set.clone(),
        };

        log::debug!("{molecule}");
        Ok((molecule, registry, basis_name))
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::RestrictedHartreeFock { system, scf } => {
            let (molecule, registry, basis_name) = system.load()?;
            let options = scf.options();
            let guess = if scf.huckel_guess {
                InitialGuess::Huckel
            } else {
                InitialGuess::Core
            };

            let start = Instant::now();
            let integrals = integrals::evaluate(&molecule, &registry, &basis_name)?;
            let output = restricted_hartree_fock(&HartreeFockInput {
                integrals: &integrals,
                n_electrons: molecule.n_electrons(),
                guess,
                options: &options,
            })
            .context("hartree fock failed")?;

            let nuclear_repulsion = molecule.nuclear_repulsion();
            println!(
                "hartree fock converged after {} iterations and {:0.2?}",
                output.iterations,
                start.elapsed()
            );
            println!("electronic energy: {:3.10}", output.electronic_energy);
            println!("nuclear repulsion energy: {nuclear_repulsion:3.10}");
            println!(
                "hartree fock energy: {:3.10}",
                output.total_energy(nuclear_repulsion)
            );
            println!("orbital energies: {:3.5?}", output.orbital_energies);
        }

        Command::Doci {
            system,
            scf,
            ci_method,
            json,
        } => {
            let (molecule, registry, basis_name) = system.load()?;
            let options = SolverOptions {
                scf: scf.options(),
                ci: CiOptions {
                    method: ci_method.into(),
                    ..CiOptions::default()
                },
            };

            let start = Instant::now();
            let mut solver =
                Solver::with_registry(&registry, molecule, basis_name, scf.huckel_guess)?
                    .with_options(options);
            solver.solve().context("DOCI calculation failed")?;

            let solution = solver
                .solution()
                .context("solver finished without a solution")?;
            if json {
                println!("{}", serde_json::to_string_pretty(solution)?);
                return Ok(());
            }

            println!(
                "DOCI finished after {} SCF and {} CI iterations and {:0.2?}",
                solution.scf_iterations,
                solution.ci_iterations,
                start.elapsed()
            );
            println!("nuclear repulsion energy: {:3.10}", solution.nuclear_repulsion);
            println!("hartree fock energy: {:3.10}", solution.rhf_energy);
            println!(
                "DOCI energy ({} configurations, {:?}): {:3.10}",
                solution.ci_dimension, solution.ci_method, solution.energy
            );
            println!(
                "correlation energy: {:3.10}",
                solution.energy - solution.rhf_energy
            );
        }
    }

    Ok(())
}
