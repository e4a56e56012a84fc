use nalgebra::Vector3;

use crate::{
    error::{Error, Result},
    periodic_table,
};

/// Represents a nucleus in a molecule.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Nucleus {
    pub(crate) position: Vector3<f64>,
    pub(crate) atomic_number: u32,
}

impl Nucleus {
    /// Creates a nucleus with the given atomic number at (x, y, z), in bohr.
    pub fn new(atomic_number: u32, x: f64, y: f64, z: f64) -> Result<Self> {
        Self::at(atomic_number, Vector3::new(x, y, z))
    }

    /// Creates a nucleus with the given atomic number at a position, in bohr.
    pub fn at(atomic_number: u32, position: Vector3<f64>) -> Result<Self> {
        if atomic_number == 0 {
            return Err(Error::InvalidMolecule(
                "atomic numbers must be positive".to_string(),
            ));
        }

        if position.iter().any(|coordinate| !coordinate.is_finite()) {
            return Err(Error::InvalidMolecule(format!(
                "nucleus with atomic number {atomic_number} has a non-finite position"
            )));
        }

        Ok(Self {
            position,
            atomic_number,
        })
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    /// Returns the charge of this nucleus
    pub fn nuclear_charge(&self) -> f64 {
        self.atomic_number as f64
    }

    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    pub fn symbol(&self) -> Option<&'static str> {
        periodic_table::symbol(self.atomic_number)
    }
}
