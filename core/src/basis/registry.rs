use std::{collections::HashMap, fs::File, io::BufReader, path::Path, sync::OnceLock};

use crate::{
    config::ConfigBasisSet,
    error::{Error, Result},
};

use super::BasisSet;

const STO_3G: &str = include_str!("../../data/basis/STO-3G.json");

/// Named basis sets, looked up case-insensitively.
///
/// The registry is an explicit object: callers either build their own and register
/// basis sets from basis set exchange json, or use [`BasisSetRegistry::builtin`], which
/// is initialized once per process and contains STO-3G for hydrogen through neon.
#[derive(Debug, Default)]
pub struct BasisSetRegistry {
    sets: HashMap<String, BasisSet>,
}

impl BasisSetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh registry containing the basis sets that ship with this crate.
    pub fn with_builtin_sets() -> Result<Self> {
        let mut registry = Self::new();
        registry.register_bse_json(STO_3G)?;
        Ok(registry)
    }

    /// The process-wide registry of built-in basis sets.
    pub fn builtin() -> Result<&'static Self> {
        static BUILTIN: OnceLock<Result<BasisSetRegistry, String>> = OnceLock::new();

        BUILTIN
            .get_or_init(|| Self::with_builtin_sets().map_err(|error| error.to_string()))
            .as_ref()
            .map_err(|message| Error::BasisFormat(message.clone()))
    }

    /// Adds a basis set, replacing and returning any set registered under the same name.
    pub fn register(&mut self, basis_set: BasisSet) -> Option<BasisSet> {
        self.sets.insert(registry_key(basis_set.name()), basis_set)
    }

    /// Parses and registers a basis set in basis set exchange json format. The json
    /// has to carry the name of the set.
    pub fn register_bse_json(&mut self, json: &str) -> Result<&BasisSet> {
        let basis_set = BasisSet::from_bse_json(json)?;

        if basis_set.name().trim().is_empty() {
            return Err(Error::BasisFormat("basis set has no name".to_string()));
        }

        Ok(self.insert(basis_set))
    }

    /// Loads a basis set exchange json file. Sets without a name are registered under
    /// the file stem, e.g. `6-31G.json` becomes `6-31G`.
    pub fn load_json(&mut self, path: impl AsRef<Path>) -> Result<&BasisSet> {
        let path = path.as_ref();
        let config: ConfigBasisSet = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        let mut basis_set = BasisSet::try_from(config)?;

        if basis_set.name().trim().is_empty() {
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| {
                    Error::BasisFormat(format!("can't name the basis set in {}", path.display()))
                })?;
            basis_set.rename(stem.to_string());
        }

        log::debug!("loaded basis set {} from {}", basis_set.name(), path.display());
        Ok(self.insert(basis_set))
    }

    /// Looks up a basis set by name.
    pub fn get(&self, name: &str) -> Result<&BasisSet> {
        self.sets
            .get(&registry_key(name))
            .ok_or_else(|| Error::UnknownBasis {
                basis: name.to_string(),
                atomic_number: None,
            })
    }

    /// The names of all registered basis sets.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.values().map(|basis_set| basis_set.name())
    }

    fn insert(&mut self, basis_set: BasisSet) -> &BasisSet {
        let key = registry_key(basis_set.name());
        self.sets.insert(key.clone(), basis_set);
        &self.sets[&key]
    }
}

fn registry_key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}
