pub(crate) use basis_set::ConfigBasisSet;

mod basis_set;
