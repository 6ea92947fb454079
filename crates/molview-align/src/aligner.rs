//! The alignment strategy interface

use std::fmt;
use std::str::FromStr;

use molview_mol::Molecule;
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::error::AlignError;

/// Which alignment strategy an aligner implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMethod {
    Substructure,
    Mcs,
    Fingerprint,
}

/// Method names and their short synonyms
static METHOD_NAMES: phf::Map<&'static str, AlignMethod> = phf_map! {
    "substructure" => AlignMethod::Substructure,
    "ss" => AlignMethod::Substructure,
    "mcs" => AlignMethod::Mcs,
    "mcss" => AlignMethod::Mcs,
    "fingerprint" => AlignMethod::Fingerprint,
    "fp" => AlignMethod::Fingerprint,
};

impl AlignMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AlignMethod::Substructure => "substructure",
            AlignMethod::Mcs => "mcs",
            AlignMethod::Fingerprint => "fingerprint",
        }
    }
}

impl fmt::Display for AlignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlignMethod {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        METHOD_NAMES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| AlignError::UnknownMethod(s.to_string()))
    }
}

/// A strategy that moves a molecule's depiction to match a reference
///
/// `validate` only inspects the molecule; `align` replaces its coordinates.
/// Aligners hold no per-call state, so one instance can be applied to any
/// number of molecules.
pub trait Aligner {
    fn method(&self) -> AlignMethod;

    /// Whether `align` can succeed on `mol`
    fn validate(&self, mol: &Molecule) -> bool;

    /// Move `mol`'s depiction onto the reference; false leaves it unchanged
    fn align(&self, mol: &mut Molecule) -> bool;

    /// Validate, then align
    fn apply(&self, mol: &mut Molecule) -> bool {
        if !self.validate(mol) {
            log::debug!(
                "Skipping {} alignment of '{}': no usable match",
                self.method(),
                mol.title
            );
            return false;
        }
        let aligned = self.align(mol);
        if !aligned {
            log::debug!("{} alignment of '{}' failed", self.method(), mol.title);
        }
        aligned
    }
}

impl<A: Aligner + ?Sized> Aligner for Box<A> {
    fn method(&self) -> AlignMethod {
        (**self).method()
    }

    fn validate(&self, mol: &Molecule) -> bool {
        (**self).validate(mol)
    }

    fn align(&self, mol: &mut Molecule) -> bool {
        (**self).align(mol)
    }

    fn apply(&self, mol: &mut Molecule) -> bool {
        (**self).apply(mol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_synonyms() {
        assert_eq!("ss".parse::<AlignMethod>().unwrap(), AlignMethod::Substructure);
        assert_eq!("MCSS".parse::<AlignMethod>().unwrap(), AlignMethod::Mcs);
        assert_eq!(" fp ".parse::<AlignMethod>().unwrap(), AlignMethod::Fingerprint);
        assert_eq!(
            "overlay".parse::<AlignMethod>(),
            Err(AlignError::UnknownMethod("overlay".to_string()))
        );
    }
}
