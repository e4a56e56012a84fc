use std::{fmt, fs, path::Path};

use nalgebra::Vector3;

use crate::{
    atom::Nucleus,
    error::{Error, Result},
    periodic_table,
};

/// Conversion factor from ångström (the unit of xyz files) to bohr.
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / 0.529_177_210_903;

/// Represents a molecule: an ordered list of nuclei and a net charge.
#[derive(Clone, Debug, PartialEq)]
pub struct Molecule {
    pub(crate) nuclei: Vec<Nucleus>,
    pub(crate) charge: i32,
}

impl Molecule {
    /// Creates a molecule, rejecting empty nuclei lists and charges that would
    /// leave a negative number of electrons.
    pub fn new(nuclei: Vec<Nucleus>, charge: i32) -> Result<Self> {
        if nuclei.is_empty() {
            return Err(Error::InvalidMolecule(
                "a molecule needs at least one nucleus".to_string(),
            ));
        }

        let nuclear_charge = nuclei
            .iter()
            .map(|nucleus| nucleus.atomic_number as i64)
            .sum::<i64>();

        if nuclear_charge < charge as i64 {
            return Err(Error::InvalidMolecule(format!(
                "charge {charge} exceeds the total nuclear charge {nuclear_charge}"
            )));
        }

        Ok(Self { nuclei, charge })
    }

    /// Reads a molecule from an xyz file. Coordinates are read in ångström.
    pub fn read_xyz(path: impl AsRef<Path>, charge: i32) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_xyz_str(&text, charge)
    }

    /// Parses a molecule in xyz format: an atom count, an optional comment line and
    /// one `<element> x y z` record per atom, where the element is either a symbol or
    /// an atomic number. Coordinates are read in ångström.
    pub fn from_xyz_str(text: &str, charge: i32) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .skip_while(|(_, line)| line.trim().is_empty());

        let (count_line, count) = lines.next().ok_or_else(|| Error::XyzFormat {
            line: 1,
            reason: "missing atom count".to_string(),
        })?;
        let count = count
            .trim()
            .parse::<usize>()
            .map_err(|error| Error::XyzFormat {
                line: count_line,
                reason: format!("invalid atom count: {error}"),
            })?;

        let mut rest = lines.collect::<Vec<_>>();
        while rest.last().is_some_and(|(_, line)| line.trim().is_empty()) {
            rest.pop();
        }

        // without a comment line, the count line is followed directly by the records
        let records = match rest.len() {
            n if n == count => &rest[..],
            0 => &rest[..],
            _ => &rest[1..],
        };

        if records.len() != count {
            return Err(Error::XyzFormat {
                line: count_line,
                reason: format!("expected {count} atoms, found {}", records.len()),
            });
        }

        let nuclei = records
            .iter()
            .map(|&(line, record)| parse_xyz_record(line, record))
            .collect::<Result<Vec<_>>>()?;

        Self::new(nuclei, charge)
    }

    pub fn nuclei(&self) -> &[Nucleus] {
        &self.nuclei
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    /// Returns the number of total electrons in the system
    pub fn n_electrons(&self) -> usize {
        let nuclear_charge = self
            .nuclei
            .iter()
            .map(|nucleus| nucleus.atomic_number as i64)
            .sum::<i64>();

        // non-negative by construction
        (nuclear_charge - self.charge as i64) as usize
    }

    /// Returns the number of electron pairs of a closed-shell treatment. Fails if the
    /// electrons can't all be paired.
    pub fn n_electron_pairs(&self) -> Result<usize> {
        let n_electrons = self.n_electrons();

        if n_electrons % 2 != 0 {
            return Err(Error::InvalidMolecule(format!(
                "{n_electrons} electrons can't all be paired"
            )));
        }

        Ok(n_electrons / 2)
    }

    /// The classical repulsion energy between all pairs of nuclei.
    pub fn nuclear_repulsion(&self) -> f64 {
        let n_nuclei = self.nuclei.len();

        let mut potential = 0.0;
        for a in 0..n_nuclei {
            for b in a + 1..n_nuclei {
                let (nucleus_a, nucleus_b) = (&self.nuclei[a], &self.nuclei[b]);
                potential += nucleus_a.nuclear_charge() * nucleus_b.nuclear_charge()
                    / (nucleus_b.position - nucleus_a.position).norm()
            }
        }
        potential
    }
}

fn parse_xyz_record(line: usize, record: &str) -> Result<Nucleus> {
    let format_error = |reason: String| Error::XyzFormat { line, reason };

    let mut fields = record.split_whitespace();
    let element = fields
        .next()
        .ok_or_else(|| format_error("empty atom record".to_string()))?;

    let atomic_number = match element.parse::<u32>() {
        Ok(atomic_number) => atomic_number,
        Err(_) => periodic_table::atomic_number(element)
            .ok_or_else(|| format_error(format!("unknown element {element:?}")))?,
    };

    let mut coordinates = [0.0; 3];
    for coordinate in &mut coordinates {
        let field = fields
            .next()
            .ok_or_else(|| format_error("expected three coordinates".to_string()))?;
        *coordinate = field
            .parse::<f64>()
            .map_err(|error| format_error(format!("invalid coordinate {field:?}: {error}")))?;
    }

    Nucleus::at(
        atomic_number,
        Vector3::from(coordinates) * ANGSTROM_TO_BOHR,
    )
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "molecule with {} nuclei, charge {:+} (bohr)",
            self.nuclei.len(),
            self.charge
        )?;

        for nucleus in &self.nuclei {
            let position = nucleus.position();
            writeln!(
                f,
                "{:<3} {:>14.8} {:>14.8} {:>14.8}",
                nucleus.symbol().unwrap_or("?"),
                position.x,
                position.y,
                position.z
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::{Molecule, ANGSTROM_TO_BOHR};
    use crate::{atom::Nucleus, error::Error};

    const CH4_XYZ: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/ch4_crawdad.xyz");

    #[test]
    fn counts_electrons_with_charge() {
        let fluorine = Nucleus::new(9, 0.0, 0.0, 0.0).unwrap();
        let cation = Molecule::new(vec![fluorine], 1).unwrap();

        assert_eq!(cation.n_electrons(), 8);
        assert_eq!(cation.n_electron_pairs().unwrap(), 4);
    }

    #[test]
    fn odd_electron_counts_cannot_be_paired() {
        let fluorine = Nucleus::new(9, 0.0, 0.0, 0.0).unwrap();
        let neutral = Molecule::new(vec![fluorine], 0).unwrap();

        assert!(matches!(
            neutral.n_electron_pairs(),
            Err(Error::InvalidMolecule(_))
        ));
    }

    #[test]
    fn rejects_impossible_molecules() {
        let hydrogen = Nucleus::new(1, 0.0, 0.0, 0.0).unwrap();

        assert!(matches!(
            Molecule::new(vec![hydrogen], 2),
            Err(Error::InvalidMolecule(_))
        ));
        assert!(matches!(
            Molecule::new(Vec::new(), 0),
            Err(Error::InvalidMolecule(_))
        ));
    }

    #[test]
    fn nuclear_repulsion_of_hydrogen() {
        let molecule = Molecule::new(
            vec![
                Nucleus::new(1, 0.0, 0.0, 0.0).unwrap(),
                Nucleus::new(1, 0.0, 0.0, 1.4).unwrap(),
            ],
            0,
        )
        .unwrap();

        assert_relative_eq!(molecule.nuclear_repulsion(), 1.0 / 1.4, epsilon = 1e-14);
    }

    #[test]
    fn xyz_file_matches_programmatic_molecule() {
        let from_file = Molecule::read_xyz(CH4_XYZ, 0).unwrap();

        let angstrom = [
            (6, [0.000000, 0.000000, 0.000000]),
            (1, [0.629118, 0.629118, 0.629118]),
            (1, [-0.629118, -0.629118, 0.629118]),
            (1, [-0.629118, 0.629118, -0.629118]),
            (1, [0.629118, -0.629118, -0.629118]),
        ];
        let nuclei = angstrom
            .iter()
            .map(|&(z, position)| {
                Nucleus::at(z, Vector3::from(position) * ANGSTROM_TO_BOHR).unwrap()
            })
            .collect();
        let programmatic = Molecule::new(nuclei, 0).unwrap();

        assert_eq!(from_file.nuclei().len(), programmatic.nuclei().len());
        for (a, b) in from_file.nuclei().iter().zip(programmatic.nuclei()) {
            assert_eq!(a.atomic_number(), b.atomic_number());
            assert_relative_eq!(*a.position(), *b.position(), epsilon = 1e-12);
        }
        assert_eq!(from_file.n_electrons(), 10);
    }

    #[test]
    fn xyz_comment_line_is_optional() {
        let with_comment = "2\nhydrogen\nH 0.0 0.0 0.0\nH 0.0 0.0 0.74\n";
        let without_comment = "2\nH 0.0 0.0 0.0\n1 0.0 0.0 0.74\n\n";

        let a = Molecule::from_xyz_str(with_comment, 0).unwrap();
        let b = Molecule::from_xyz_str(without_comment, 0).unwrap();
        assert_eq!(a, b);
        assert_relative_eq!(a.nuclei()[1].position().z, 0.74 * ANGSTROM_TO_BOHR);
    }

    #[test]
    fn xyz_errors_report_lines() {
        assert!(matches!(
            Molecule::from_xyz_str("two\n\nH 0 0 0\n", 0),
            Err(Error::XyzFormat { line: 1, .. })
        ));
        assert!(matches!(
            Molecule::from_xyz_str("1\ncomment\nH 0 zero 0\n", 0),
            Err(Error::XyzFormat { line: 3, .. })
        ));
        assert!(matches!(
            Molecule::from_xyz_str("1\ncomment\nQq 0 0 0\n", 0),
            Err(Error::XyzFormat { line: 3, .. })
        ));
        assert!(matches!(
            Molecule::from_xyz_str("3\ncomment\nH 0 0 0\n", 0),
            Err(Error::XyzFormat { line: 1, .. })
        ));
    }

    #[test]
    fn display_lists_every_nucleus() {
        let molecule = Molecule::new(vec![Nucleus::new(9, 0.0, 0.0, 0.0).unwrap()], 1).unwrap();
        let printed = molecule.to_string();

        assert!(printed.contains("charge +1"));
        assert!(printed.lines().nth(1).unwrap().starts_with("F"));
    }
}
