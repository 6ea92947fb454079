//! Atom and bond feature masks
//!
//! Fingerprint generators hash only the atom and bond properties selected by
//! these masks. Masks can be written as `|`-separated names, for example
//! `"AtomicNumber|Aromaticity|HvyDegree"`, and are resolved against a
//! [`MaskTable`].

use std::sync::LazyLock;

use ahash::AHashMap;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};

bitflags! {
    /// Atom properties a fingerprint can distinguish
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AtomFeatures: u32 {
        const ATOMIC_NUMBER = 0x0001;
        const AROMATICITY = 0x0002;
        /// Accepted for compatibility; stereo is not perceived so it adds nothing
        const CHIRAL = 0x0004;
        const FORMAL_CHARGE = 0x0008;
        /// Number of heavy-atom neighbors
        const HVY_DEGREE = 0x0010;
        const HYBRIDIZATION = 0x0020;
        const IN_RING = 0x0040;
        /// Total hydrogen count, implicit and explicit
        const H_COUNT = 0x0080;
        /// All aromatic atoms hash alike regardless of element
        const EQ_AROMATIC = 0x0100;
        /// All halogens hash alike
        const EQ_HALOGEN = 0x0200;

        const DEFAULT_PATH_ATOM = Self::ATOMIC_NUMBER.bits()
            | Self::AROMATICITY.bits()
            | Self::CHIRAL.bits()
            | Self::FORMAL_CHARGE.bits()
            | Self::HVY_DEGREE.bits()
            | Self::HYBRIDIZATION.bits()
            | Self::EQ_HALOGEN.bits();
        const DEFAULT_CIRCULAR_ATOM = Self::ATOMIC_NUMBER.bits()
            | Self::AROMATICITY.bits()
            | Self::CHIRAL.bits()
            | Self::FORMAL_CHARGE.bits()
            | Self::HVY_DEGREE.bits()
            | Self::H_COUNT.bits()
            | Self::EQ_HALOGEN.bits();
        const DEFAULT_TREE_ATOM = Self::ATOMIC_NUMBER.bits()
            | Self::AROMATICITY.bits()
            | Self::CHIRAL.bits()
            | Self::FORMAL_CHARGE.bits()
            | Self::HVY_DEGREE.bits()
            | Self::H_COUNT.bits()
            | Self::EQ_HALOGEN.bits();
    }
}

bitflags! {
    /// Bond properties a fingerprint can distinguish
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct BondFeatures: u32 {
        const BOND_ORDER = 0x0001;
        /// Accepted for compatibility; stereo is not perceived so it adds nothing
        const CHIRAL = 0x0002;
        const IN_RING = 0x0004;

        const DEFAULT_PATH_BOND = Self::BOND_ORDER.bits() | Self::CHIRAL.bits();
        const DEFAULT_CIRCULAR_BOND = Self::BOND_ORDER.bits() | Self::CHIRAL.bits();
        const DEFAULT_TREE_BOND = Self::BOND_ORDER.bits() | Self::CHIRAL.bits();
    }
}

/// A name-to-bits lookup used by [`build_mask`]
///
/// Keys are stored lowercased. An optional namespace prefix (for example
/// `atomtype::`) is stripped from each name before lookup.
#[derive(Debug, Clone)]
pub struct MaskTable {
    kind: &'static str,
    prefix: Option<String>,
    names: AHashMap<String, u32>,
}

impl MaskTable {
    /// Build a table; `kind` names the table in error messages
    pub fn new<'a>(kind: &'static str, entries: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let names = entries
            .into_iter()
            .map(|(name, bits)| (name.to_ascii_lowercase(), bits))
            .collect();
        MaskTable {
            kind,
            prefix: None,
            names,
        }
    }

    /// Accept names written with this namespace prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_ascii_lowercase());
        self
    }

    /// What the table's names describe
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Look up one name (case-insensitive, prefix optional)
    pub fn get(&self, name: &str) -> Option<u32> {
        let key = name.trim().to_ascii_lowercase();
        let key = match &self.prefix {
            Some(prefix) => key.strip_prefix(prefix.as_str()).unwrap_or(&key),
            None => &key,
        };
        self.names.get(key).copied()
    }
}

/// Combine `|`-separated names into a bit mask
///
/// Fails with [`AlignError::UnknownName`] for a name missing from `table`
/// and with [`AlignError::EmptyMask`] when the combined mask is zero.
pub fn build_mask(names: &str, table: &MaskTable) -> AlignResult<u32> {
    let mut mask = 0;
    for token in names.split('|') {
        let bits = table.get(token).ok_or_else(|| AlignError::UnknownName {
            kind: table.kind,
            name: token.trim().to_string(),
        })?;
        mask |= bits;
    }
    if mask == 0 {
        return Err(AlignError::EmptyMask(names.to_string()));
    }
    Ok(mask)
}

const ATOM_FEATURE_NAMES: &[(&str, u32)] = &[
    ("AtomicNumber", AtomFeatures::ATOMIC_NUMBER.bits()),
    ("Aromaticity", AtomFeatures::AROMATICITY.bits()),
    ("Chiral", AtomFeatures::CHIRAL.bits()),
    ("FormalCharge", AtomFeatures::FORMAL_CHARGE.bits()),
    ("HvyDegree", AtomFeatures::HVY_DEGREE.bits()),
    ("Hybridization", AtomFeatures::HYBRIDIZATION.bits()),
    ("InRing", AtomFeatures::IN_RING.bits()),
    ("HCount", AtomFeatures::H_COUNT.bits()),
    ("EqAromatic", AtomFeatures::EQ_AROMATIC.bits()),
    ("EqHalogen", AtomFeatures::EQ_HALOGEN.bits()),
    ("DefaultPathAtom", AtomFeatures::DEFAULT_PATH_ATOM.bits()),
    ("DefaultCircularAtom", AtomFeatures::DEFAULT_CIRCULAR_ATOM.bits()),
    ("DefaultTreeAtom", AtomFeatures::DEFAULT_TREE_ATOM.bits()),
    ("None", 0),
];

const BOND_FEATURE_NAMES: &[(&str, u32)] = &[
    ("BondOrder", BondFeatures::BOND_ORDER.bits()),
    ("Chiral", BondFeatures::CHIRAL.bits()),
    ("InRing", BondFeatures::IN_RING.bits()),
    ("DefaultPathBond", BondFeatures::DEFAULT_PATH_BOND.bits()),
    ("DefaultCircularBond", BondFeatures::DEFAULT_CIRCULAR_BOND.bits()),
    ("DefaultTreeBond", BondFeatures::DEFAULT_TREE_BOND.bits()),
    ("None", 0),
];

/// Atom feature names, accepting an `AtomType::` prefix
pub static ATOM_FEATURES: LazyLock<MaskTable> = LazyLock::new(|| {
    MaskTable::new("atom type", ATOM_FEATURE_NAMES.iter().copied()).with_prefix("AtomType::")
});

/// Bond feature names, accepting a `BondType::` prefix
pub static BOND_FEATURES: LazyLock<MaskTable> = LazyLock::new(|| {
    MaskTable::new("bond type", BOND_FEATURE_NAMES.iter().copied()).with_prefix("BondType::")
});

/// Parse an atom feature mask such as `"AtomicNumber|InRing"`
pub fn atom_mask(names: &str) -> AlignResult<AtomFeatures> {
    build_mask(names, &ATOM_FEATURES).map(AtomFeatures::from_bits_truncate)
}

/// Parse a bond feature mask such as `"BondOrder|InRing"`
pub fn bond_mask(names: &str) -> AlignResult<BondFeatures> {
    build_mask(names, &BOND_FEATURES).map(BondFeatures::from_bits_truncate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_table() -> MaskTable {
        MaskTable::new("toy", [("foo", 1), ("bar", 2)])
    }

    #[test]
    fn test_build_mask_case_and_duplicates() {
        assert_eq!(build_mask("Foo|bar|FOO", &toy_table()).unwrap(), 3);
        assert_eq!(build_mask(" foo | bar ", &toy_table()).unwrap(), 3);
    }

    #[test]
    fn test_build_mask_unknown_name() {
        let err = build_mask("foo|baz", &toy_table()).unwrap_err();
        assert_eq!(
            err,
            AlignError::UnknownName {
                kind: "toy",
                name: "baz".to_string()
            }
        );
        assert!(build_mask("", &toy_table()).is_err());
    }

    #[test]
    fn test_build_mask_empty() {
        let table = MaskTable::new("toy", [("nothing", 0)]);
        assert_eq!(
            build_mask("nothing", &table),
            Err(AlignError::EmptyMask("nothing".to_string()))
        );
    }

    #[test]
    fn test_prefixed_names() {
        let mask = atom_mask("AtomType::AtomicNumber|aromaticity").unwrap();
        assert_eq!(mask, AtomFeatures::ATOMIC_NUMBER | AtomFeatures::AROMATICITY);
        let bonds = bond_mask("bondtype::BondOrder").unwrap();
        assert_eq!(bonds, BondFeatures::BOND_ORDER);
    }

    #[test]
    fn test_default_aliases() {
        assert_eq!(
            atom_mask("DefaultTreeAtom").unwrap(),
            AtomFeatures::DEFAULT_TREE_ATOM
        );
        assert_eq!(
            bond_mask("DefaultPathBond").unwrap(),
            BondFeatures::DEFAULT_PATH_BOND
        );
        assert!(matches!(atom_mask("None"), Err(AlignError::EmptyMask(_))));
    }
}
