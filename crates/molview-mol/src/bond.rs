//! Bond data structure

use serde::{Deserialize, Serialize};

use crate::index::AtomIndex;

/// Bond order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single = 1,
    Double = 2,
    Triple = 3,
    /// Aromatic/delocalized bond (1.5 order)
    Aromatic = 4,
}

impl BondOrder {
    /// Effective valence contribution, doubled so aromatic bonds stay integral (aromatic = 3)
    #[inline]
    pub fn doubled_valence(&self) -> u8 {
        match self {
            BondOrder::Single => 2,
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Aromatic => 3,
        }
    }

    /// SMILES bond symbol; single and aromatic bonds are usually implicit
    pub fn symbol(&self) -> char {
        match self {
            BondOrder::Single => '-',
            BondOrder::Double => '=',
            BondOrder::Triple => '#',
            BondOrder::Aromatic => ':',
        }
    }
}

/// A bond between two atoms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub atom1: AtomIndex,
    pub atom2: AtomIndex,
    pub order: BondOrder,
}

impl Bond {
    /// Create a new bond
    pub fn new(atom1: AtomIndex, atom2: AtomIndex, order: BondOrder) -> Self {
        Bond { atom1, atom2, order }
    }

    /// Get the atom on the other end of the bond
    #[inline]
    pub fn other(&self, atom: AtomIndex) -> Option<AtomIndex> {
        if atom == self.atom1 {
            Some(self.atom2)
        } else if atom == self.atom2 {
            Some(self.atom1)
        } else {
            None
        }
    }

    /// Check whether the bond connects the given atom
    #[inline]
    pub fn involves(&self, atom: AtomIndex) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }
}
