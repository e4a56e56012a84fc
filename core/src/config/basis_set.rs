use std::collections::HashMap;

use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    basis::{AtomicBasis, BasisSet, ContractedGaussian, ElectronShell, Gaussian},
    error::Error,
};

/// A basis set in the json format of the basis set exchange.
#[derive(Deserialize)]
pub(crate) struct ConfigBasisSet {
    #[serde(default)]
    name: Option<String>,
    elements: HashMap<String, ConfigElectronicConfiguration>,
}

#[derive(Deserialize)]
struct ConfigElectronicConfiguration {
    electron_shells: Vec<ConfigElectronShell>,
}

#[derive(Deserialize)]
struct ConfigElectronShell {
    function_type: String,
    angular_momentum: Vec<i32>,
    exponents: Vec<String>,
    coefficients: Vec<Vec<String>>,
}

impl TryFrom<ConfigBasisSet> for BasisSet {
    type Error = Error;

    fn try_from(value: ConfigBasisSet) -> Result<Self, Self::Error> {
        let name = value.name.unwrap_or_default();
        let mut atomic_mapping = HashMap::with_capacity(value.elements.len());

        for (element, configuration) in value.elements {
            let atomic_number = element.parse::<u32>().map_err(|_| {
                Error::BasisFormat(format!("element key {element:?} is not an atomic number"))
            })?;

            let mut element_atomic_basis = AtomicBasis::empty();
            for electron_shell in &configuration.electron_shells {
                element_atomic_basis
                    .shells
                    .extend(parse_shell(atomic_number, electron_shell)?);
            }

            atomic_mapping.insert(atomic_number, element_atomic_basis);
        }

        Ok(Self::new(name, atomic_mapping))
    }
}

/// Expands one basis set exchange shell into electron shells. A shell either pairs every
/// angular momentum with one coefficient row (e.g. `sp` shells), or is a general
/// contraction of a single angular momentum with several coefficient rows.
fn parse_shell(
    atomic_number: u32,
    electron_shell: &ConfigElectronShell,
) -> Result<Vec<ElectronShell>, Error> {
    let ConfigElectronShell {
        function_type,
        angular_momentum,
        exponents,
        coefficients,
    } = electron_shell;

    let cartesian = match function_type.as_str() {
        "gto" | "gto_cartesian" => true,
        "gto_spherical" => false,
        other => {
            return Err(Error::BasisFormat(format!(
                "unsupported function type {other:?} for element Z={atomic_number}"
            )))
        }
    };

    let pairs = match (angular_momentum.as_slice(), coefficients.len()) {
        (momenta, rows) if momenta.len() == rows => {
            momenta.iter().copied().zip(coefficients).collect::<Vec<_>>()
        }
        (&[angular_magnitude], _) => coefficients
            .iter()
            .map(|row| (angular_magnitude, row))
            .collect(),
        (momenta, rows) => {
            return Err(Error::BasisFormat(format!(
                "{} angular momenta but {rows} coefficient rows for element Z={atomic_number}",
                momenta.len()
            )))
        }
    };

    let exponents = exponents
        .iter()
        .map(|exponent| parse_number(exponent))
        .collect::<Result<Vec<_>, _>>()?;

    let mut shells = Vec::with_capacity(pairs.len());
    for (angular_magnitude, row) in pairs {
        if !(0..=6).contains(&angular_magnitude) {
            return Err(Error::BasisFormat(format!(
                "angular momentum {angular_magnitude} is out of range"
            )));
        }

        // cartesian and spherical functions only coincide up to p functions
        if !cartesian && angular_magnitude > 1 {
            return Err(Error::BasisFormat(format!(
                "spherical shells with angular momentum {angular_magnitude} are not supported"
            )));
        }

        if row.len() != exponents.len() {
            return Err(Error::BasisFormat(format!(
                "{} exponents but {} coefficients for element Z={atomic_number}",
                exponents.len(),
                row.len()
            )));
        }

        let row = row
            .iter()
            .map(|coefficient| parse_number(coefficient))
            .collect::<Result<Vec<_>, _>>()?;

        let mut shell = ElectronShell::new(angular_magnitude);
        for angular in generate_angular_vectors(angular_magnitude) {
            let primitives = exponents
                .iter()
                .zip(&row)
                .map(|(&exponent, &coefficient)| Gaussian {
                    exponent,
                    coefficient: coefficient * Gaussian::norm(exponent, angular),
                    angular,
                })
                .collect::<SmallVec<_>>();

            shell
                .basis_functions
                .push(ContractedGaussian(primitives));
        }

        shells.push(shell);
    }

    Ok(shells)
}

fn parse_number(text: &str) -> Result<f64, Error> {
    // some sources write fortran style exponents: 0.1D+01
    text.trim()
        .replace(|c| c == 'D' || c == 'd', "E")
        .parse::<f64>()
        .map_err(|error| Error::BasisFormat(format!("invalid number {text:?}: {error}")))
}

// generate all (i, j, k) such that i + j + k = angular
fn generate_angular_vectors(angular_magnitude: i32) -> Vec<(i32, i32, i32)> {
    let mut angular_vectors = Vec::with_capacity(8);

    for (i, j, k) in itertools::iproduct!(
        (0..=angular_magnitude).rev(),
        (0..=angular_magnitude).rev(),
        0..=angular_magnitude
    ) {
        if i + j + k == angular_magnitude {
            angular_vectors.push((i, j, k));
        }
    }

    angular_vectors
}

#[cfg(test)]
mod tests {
    use super::{generate_angular_vectors, ConfigBasisSet};
    use crate::{atom::Nucleus, basis::BasisSet, error::Error};

    #[test]
    fn angular_vectors_are_complete() {
        assert_eq!(generate_angular_vectors(0), vec![(0, 0, 0)]);
        assert_eq!(
            generate_angular_vectors(1),
            vec![(1, 0, 0), (0, 1, 0), (0, 0, 1)]
        );
        assert_eq!(generate_angular_vectors(2).len(), 6);
        assert_eq!(generate_angular_vectors(3).len(), 10);
    }

    #[test]
    fn general_contractions_become_separate_functions() {
        const GENERAL: &str = r#"{"name":"toy","elements":{"2":{"electron_shells":[{"function_type":"gto","angular_momentum":[0],"exponents":["2.0","0.5"],"coefficients":[["0.6","0.4"],["0.0","1.0"]]}]}}}"#;

        let config: ConfigBasisSet = serde_json::from_str(GENERAL).unwrap();
        let basis_set = BasisSet::try_from(config).unwrap();
        let helium = basis_set
            .for_nucleus(&Nucleus::new(2, 0.0, 0.0, 0.0).unwrap())
            .unwrap();

        assert_eq!(helium.n_basis_functions(), 2);
        assert_eq!(helium.shell_angular_momenta().collect::<Vec<_>>(), vec![0, 0]);
    }

    #[test]
    fn rejects_malformed_numbers() {
        const BROKEN: &str = r#"{"elements":{"1":{"electron_shells":[{"function_type":"gto","angular_momentum":[0],"exponents":["three"],"coefficients":[["1.0"]]}]}}}"#;

        let config: ConfigBasisSet = serde_json::from_str(BROKEN).unwrap();
        assert!(matches!(
            BasisSet::try_from(config),
            Err(Error::BasisFormat(_))
        ));
    }

    #[test]
    fn rejects_mismatched_rows() {
        const BROKEN: &str = r#"{"elements":{"1":{"electron_shells":[{"function_type":"gto","angular_momentum":[0,1],"exponents":["1.0","2.0"],"coefficients":[["1.0"],["1.0","0.5"]]}]}}}"#;

        let config: ConfigBasisSet = serde_json::from_str(BROKEN).unwrap();
        assert!(matches!(
            BasisSet::try_from(config),
            Err(Error::BasisFormat(_))
        ));
    }

    #[test]
    fn accepts_fortran_exponents() {
        assert_eq!(super::parse_number("0.1D+01").unwrap(), 1.0);
        assert_eq!(super::parse_number(" 0.25E+00 ").unwrap(), 0.25);
    }
}
