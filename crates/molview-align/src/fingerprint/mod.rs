//! Molecular fingerprints
//!
//! A [`FingerprintSpec`] names a fingerprint kind and its parameters;
//! [`make_fingerprint_fn`] validates it once and returns a
//! [`FingerprintMaker`] that can be applied to any number of molecules.
//!
//! | Kind       | Features                                   | Parameters used          |
//! |------------|--------------------------------------------|--------------------------|
//! | `path`     | linear paths of `min..=max` bonds          | bits, distances, masks   |
//! | `circular` | atom environments of radius `min..=max`    | bits, distances, masks   |
//! | `tree`     | acyclic connected subgraphs                | bits, distances, masks   |
//! | `maccs`    | fixed structural keys                      | none                     |
//! | `lingo`    | substrings of a SMILES-like walk           | bits                     |
//!
//! Besides the bit vector, a maker can report which atoms set each bit
//! ([`BitRegion`]); fingerprint-overlap alignment pairs atoms through them.

mod generate;
mod maccs;
mod mask;

pub use mask::{
    atom_mask, bond_mask, build_mask, AtomFeatures, BondFeatures, MaskTable, ATOM_FEATURES,
    BOND_FEATURES,
};

use std::fmt;
use std::str::FromStr;

use bitvec::prelude::*;
use molview_mol::{AtomIndex, Molecule};
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};
use generate::Features;

/// The supported fingerprint families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintKind {
    Path,
    Circular,
    #[default]
    Tree,
    Maccs,
    Lingo,
}

static FINGERPRINT_KINDS: phf::Map<&'static str, FingerprintKind> = phf_map! {
    "path" => FingerprintKind::Path,
    "circular" => FingerprintKind::Circular,
    "tree" => FingerprintKind::Tree,
    "maccs" => FingerprintKind::Maccs,
    "maccs166" => FingerprintKind::Maccs,
    "lingo" => FingerprintKind::Lingo,
};

impl FingerprintKind {
    pub const ALL: [FingerprintKind; 5] = [
        FingerprintKind::Path,
        FingerprintKind::Circular,
        FingerprintKind::Tree,
        FingerprintKind::Maccs,
        FingerprintKind::Lingo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FingerprintKind::Path => "path",
            FingerprintKind::Circular => "circular",
            FingerprintKind::Tree => "tree",
            FingerprintKind::Maccs => "maccs",
            FingerprintKind::Lingo => "lingo",
        }
    }
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FingerprintKind {
    type Err = AlignError;

    /// Case-insensitive; an `FPType::` prefix is accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let key = key.strip_prefix("fptype::").unwrap_or(&key);
        FINGERPRINT_KINDS
            .get(key)
            .copied()
            .ok_or_else(|| AlignError::UnknownName {
                kind: "fingerprint type",
                name: s.trim().to_string(),
            })
    }
}

/// Fingerprint kind plus its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintSpec {
    pub kind: FingerprintKind,
    /// Length of the folded bit vector
    pub num_bits: usize,
    /// Smallest feature size, in bonds (path/tree) or radius (circular)
    pub min_distance: u32,
    /// Largest feature size
    pub max_distance: u32,
    pub atom_mask: AtomFeatures,
    pub bond_mask: BondFeatures,
}

impl Default for FingerprintSpec {
    fn default() -> Self {
        Self::for_kind(FingerprintKind::Tree)
    }
}

impl FingerprintSpec {
    /// Customary parameters for each kind
    pub fn for_kind(kind: FingerprintKind) -> Self {
        let (num_bits, min_distance, max_distance, atom_mask, bond_mask) = match kind {
            FingerprintKind::Path => (
                4096,
                0,
                5,
                AtomFeatures::DEFAULT_PATH_ATOM,
                BondFeatures::DEFAULT_PATH_BOND,
            ),
            FingerprintKind::Circular => (
                4096,
                0,
                2,
                AtomFeatures::DEFAULT_CIRCULAR_ATOM,
                BondFeatures::DEFAULT_CIRCULAR_BOND,
            ),
            FingerprintKind::Tree | FingerprintKind::Lingo => (
                4096,
                0,
                4,
                AtomFeatures::DEFAULT_TREE_ATOM,
                BondFeatures::DEFAULT_TREE_BOND,
            ),
            FingerprintKind::Maccs => (
                maccs::KEY_COUNT,
                0,
                0,
                AtomFeatures::DEFAULT_TREE_ATOM,
                BondFeatures::DEFAULT_TREE_BOND,
            ),
        };
        FingerprintSpec {
            kind,
            num_bits,
            min_distance,
            max_distance,
            atom_mask,
            bond_mask,
        }
    }

    /// Build a spec from textual names, as accepted in configuration
    ///
    /// Fails on an unknown kind or feature name before any fingerprint is made.
    pub fn from_names(
        kind: &str,
        num_bits: usize,
        min_distance: u32,
        max_distance: u32,
        atom_types: &str,
        bond_types: &str,
    ) -> AlignResult<Self> {
        let spec = FingerprintSpec {
            kind: kind.parse()?,
            num_bits,
            min_distance,
            max_distance,
            atom_mask: atom_mask(atom_types)?,
            bond_mask: bond_mask(bond_types)?,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_num_bits(mut self, num_bits: usize) -> Self {
        self.num_bits = num_bits;
        self
    }

    pub fn with_distance(mut self, min: u32, max: u32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn with_atom_mask(mut self, mask: AtomFeatures) -> Self {
        self.atom_mask = mask;
        self
    }

    pub fn with_bond_mask(mut self, mask: BondFeatures) -> Self {
        self.bond_mask = mask;
        self
    }

    /// Check the parameters the kind actually uses
    pub fn validate(&self) -> AlignResult<()> {
        if self.kind == FingerprintKind::Maccs {
            return Ok(());
        }
        if self.num_bits == 0 {
            return Err(AlignError::InvalidFingerprint(
                "bit count must be positive".to_string(),
            ));
        }
        if self.min_distance > self.max_distance {
            return Err(AlignError::InvalidFingerprint(format!(
                "min distance {} exceeds max distance {}",
                self.min_distance, self.max_distance
            )));
        }
        Ok(())
    }

    /// Bit vector length actually produced
    pub fn bit_count(&self) -> usize {
        match self.kind {
            FingerprintKind::Maccs => maccs::KEY_COUNT,
            _ => self.num_bits,
        }
    }
}

/// A folded fingerprint bit vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    kind: FingerprintKind,
    bits: BitVec<u64, Lsb0>,
}

impl Fingerprint {
    /// An all-zero fingerprint of `len` bits
    pub fn new(kind: FingerprintKind, len: usize) -> Self {
        Fingerprint {
            kind,
            bits: bitvec![u64, Lsb0; 0; len],
        }
    }

    #[inline]
    pub fn kind(&self) -> FingerprintKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Set a bit; out-of-range indices are ignored
    pub fn set(&mut self, bit: usize) {
        if bit < self.bits.len() {
            self.bits.set(bit, true);
        }
    }

    pub fn get(&self, bit: usize) -> bool {
        self.bits.get(bit).is_some_and(|b| *b)
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Bits set in both fingerprints
    pub fn common_bits(&self, other: &Fingerprint) -> Vec<usize> {
        self.bits.iter_ones().filter(|&i| other.get(i)).collect()
    }

    /// Tanimoto coefficient: |A & B| / |A | B|, 0.0 when both are empty
    pub fn tanimoto(&self, other: &Fingerprint) -> f64 {
        let common = self.bits.iter_ones().filter(|&i| other.get(i)).count();
        let union = self.count_ones() + other.count_ones() - common;
        if union == 0 {
            return 0.0;
        }
        common as f64 / union as f64
    }
}

/// The atoms behind one feature that set `bit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitRegion {
    pub bit: usize,
    pub atoms: Vec<AtomIndex>,
}

/// Something that turns a molecule into a fingerprint
pub trait FingerprintFn {
    fn fingerprint(&self, mol: &Molecule) -> Fingerprint;
}

/// A validated fingerprint configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintMaker {
    spec: FingerprintSpec,
}

impl FingerprintMaker {
    #[inline]
    pub fn spec(&self) -> &FingerprintSpec {
        &self.spec
    }

    /// Fingerprint plus the atom regions behind every feature
    pub fn fingerprint_with_regions(&self, mol: &Molecule) -> (Fingerprint, Vec<BitRegion>) {
        let spec = &self.spec;
        let len = spec.bit_count();
        let mut fp = Fingerprint::new(spec.kind, len);
        let mut regions = Vec::new();

        let features = Features::new(mol, spec.atom_mask, spec.bond_mask);
        let mut emit = |hash: u64, atoms: Vec<AtomIndex>| {
            let bit = (hash % len as u64) as usize;
            fp.set(bit);
            regions.push(BitRegion { bit, atoms });
        };

        let (min, max) = (spec.min_distance, spec.max_distance);
        match spec.kind {
            FingerprintKind::Path => generate::paths(&features, min, max, &mut emit),
            FingerprintKind::Circular => generate::circular(&features, min, max, &mut emit),
            FingerprintKind::Tree => generate::trees(&features, min, max, &mut emit),
            FingerprintKind::Lingo => generate::lingos(&features, &mut emit),
            FingerprintKind::Maccs => {
                for (bit, atoms) in maccs::keys(mol, &features.rings) {
                    fp.set(bit);
                    regions.push(BitRegion { bit, atoms });
                }
            }
        }

        (fp, regions)
    }
}

impl FingerprintFn for FingerprintMaker {
    fn fingerprint(&self, mol: &Molecule) -> Fingerprint {
        self.fingerprint_with_regions(mol).0
    }
}

/// Validate `spec` and return a reusable fingerprint function
pub fn make_fingerprint_fn(spec: FingerprintSpec) -> AlignResult<FingerprintMaker> {
    spec.validate()?;
    Ok(FingerprintMaker { spec })
}
