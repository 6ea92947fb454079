//! Molecule container
//!
//! [`Molecule`] is the chemical graph handed to the depiction pipeline: atoms,
//! bonds, an optional set of 2D depiction coordinates and a title.

use smallvec::SmallVec;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::depict;
use crate::element::Element;
use crate::error::{MolError, MolResult};
use crate::index::{AtomIndex, BondIndex};
use crate::rings::RingInfo;

/// A 2D depiction coordinate
pub type Point2 = [f64; 2];

/// A molecular graph with optional 2D depiction coordinates
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// Map from atom index to the bonds touching it
    atom_bonds: Vec<SmallVec<[BondIndex; 4]>>,
    /// 2D coordinates, one per atom, once a depiction exists
    coords: Option<Vec<Point2>>,
    /// Title shown above the depiction
    pub title: String,
}

impl Molecule {
    /// Create a new empty molecule with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Molecule {
            title: title.into(),
            ..Default::default()
        }
    }

    // =========================================================================
    // Atom Operations
    // =========================================================================

    /// Add an atom, returning its index
    ///
    /// Adding an atom discards any existing depiction.
    pub fn add_atom(&mut self, atom: Atom) -> AtomIndex {
        let index = AtomIndex(self.atoms.len() as u32);
        self.atoms.push(atom);
        self.atom_bonds.push(SmallVec::new());
        self.coords = None;
        index
    }

    /// Get an atom by index
    #[inline]
    pub fn atom(&self, index: AtomIndex) -> Option<&Atom> {
        self.atoms.get(index.as_usize())
    }

    /// Number of atoms
    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Iterate over atoms
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    /// Iterate over atoms with their indices
    pub fn atoms_indexed(&self) -> impl Iterator<Item = (AtomIndex, &Atom)> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| (AtomIndex(i as u32), atom))
    }

    // =========================================================================
    // Bond Operations
    // =========================================================================

    /// Add a bond between two existing atoms
    pub fn add_bond(
        &mut self,
        atom1: AtomIndex,
        atom2: AtomIndex,
        order: BondOrder,
    ) -> MolResult<BondIndex> {
        let n = self.atoms.len();
        for atom in [atom1, atom2] {
            if atom.as_usize() >= n {
                return Err(MolError::atom_out_of_bounds(atom.0, n));
            }
        }
        if atom1 == atom2 || self.find_bond(atom1, atom2).is_some() {
            return Err(MolError::InvalidBond(atom1.0, atom2.0));
        }

        let index = BondIndex(self.bonds.len() as u32);
        self.bonds.push(Bond::new(atom1, atom2, order));
        self.atom_bonds[atom1.as_usize()].push(index);
        self.atom_bonds[atom2.as_usize()].push(index);
        Ok(index)
    }

    /// Get a bond by index
    #[inline]
    pub fn bond(&self, index: BondIndex) -> Option<&Bond> {
        self.bonds.get(index.as_usize())
    }

    /// Number of bonds
    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Iterate over bonds
    pub fn bonds(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.iter()
    }

    /// Iterate over bonds with their indices
    pub fn bonds_indexed(&self) -> impl Iterator<Item = (BondIndex, &Bond)> {
        self.bonds
            .iter()
            .enumerate()
            .map(|(i, bond)| (BondIndex(i as u32), bond))
    }

    /// Find the bond between two atoms
    pub fn find_bond(&self, atom1: AtomIndex, atom2: AtomIndex) -> Option<BondIndex> {
        self.atom_bonds
            .get(atom1.as_usize())?
            .iter()
            .copied()
            .find(|&b| self.bonds[b.as_usize()].involves(atom2))
    }

    /// Neighbors of an atom with the connecting bond
    pub fn neighbors(&self, atom: AtomIndex) -> impl Iterator<Item = (AtomIndex, BondIndex)> + '_ {
        self.atom_bonds
            .get(atom.as_usize())
            .into_iter()
            .flat_map(|bonds| bonds.iter())
            .filter_map(move |&b| self.bonds[b.as_usize()].other(atom).map(|other| (other, b)))
    }

    /// Number of explicit neighbors
    #[inline]
    pub fn degree(&self, atom: AtomIndex) -> usize {
        self.atom_bonds.get(atom.as_usize()).map_or(0, |b| b.len())
    }

    /// Number of non-hydrogen neighbors
    pub fn heavy_degree(&self, atom: AtomIndex) -> usize {
        self.neighbors(atom)
            .filter(|(n, _)| self.atoms[n.as_usize()].element != Element::Hydrogen)
            .count()
    }

    /// Total hydrogen count (explicit bracket count or derived from default valence)
    pub fn hydrogen_count(&self, atom: AtomIndex) -> u8 {
        let Some(a) = self.atom(atom) else {
            return 0;
        };
        if let Some(h) = a.explicit_hydrogens {
            return h;
        }

        let doubled: u32 = self.atom_bonds[atom.as_usize()]
            .iter()
            .map(|b| self.bonds[b.as_usize()].order.doubled_valence() as u32)
            .sum();
        let used = (doubled / 2) as i32;

        // Group 15/16 elements gain a bond per positive charge; everything else loses one
        let charge = a.formal_charge as i32;
        let shift = match a.element {
            Element::Nitrogen | Element::Phosphorus | Element::Oxygen | Element::Sulfur
            | Element::Selenium => charge,
            _ => -charge.abs(),
        };

        a.element
            .valences()
            .iter()
            .map(|&v| v as i32 + shift)
            .find(|&v| v >= used)
            .map_or(0, |v| (v - used).clamp(0, u8::MAX as i32) as u8)
    }

    /// Ring perception for this molecule
    pub fn ring_info(&self) -> RingInfo {
        RingInfo::perceive(self)
    }

    // =========================================================================
    // Validity
    // =========================================================================

    /// A molecule is valid when it has atoms and its coordinates (if any) cover every atom
    pub fn is_valid(&self) -> bool {
        !self.atoms.is_empty()
            && self
                .coords
                .as_ref()
                .map_or(true, |c| c.len() == self.atoms.len())
    }

    // =========================================================================
    // Depiction Coordinates
    // =========================================================================

    /// Whether 2D depiction coordinates are present
    #[inline]
    pub fn has_depiction(&self) -> bool {
        self.coords.is_some()
    }

    /// Depiction coordinates, one per atom
    #[inline]
    pub fn coords(&self) -> Option<&[Point2]> {
        self.coords.as_deref()
    }

    /// Depiction coordinate of one atom
    pub fn coord(&self, atom: AtomIndex) -> Option<Point2> {
        self.coords.as_ref()?.get(atom.as_usize()).copied()
    }

    /// Replace all depiction coordinates
    pub fn set_coords(&mut self, coords: Vec<Point2>) -> MolResult<()> {
        if coords.len() != self.atoms.len() {
            return Err(MolError::CoordinateMismatch {
                expected: self.atoms.len(),
                actual: coords.len(),
            });
        }
        self.coords = Some(coords);
        Ok(())
    }

    /// Drop the depiction coordinates
    pub fn clear_coords(&mut self) {
        self.coords = None;
    }

    /// Ensure the molecule has 2D depiction coordinates, generating them if absent
    pub fn prepare_depiction(&mut self) {
        if !self.has_depiction() {
            self.coords = Some(depict::layout(self));
        }
    }

    /// Regenerate 2D coordinates even if a depiction already exists
    pub fn generate_depiction(&mut self) {
        self.coords = Some(depict::layout(self));
    }

    /// Axis-aligned bounding box of the depiction as `(min, max)`
    pub fn bounding_box(&self) -> Option<(Point2, Point2)> {
        let coords = self.coords.as_ref()?;
        let first = *coords.first()?;
        Some(coords.iter().fold((first, first), |(lo, hi), p| {
            (
                [lo[0].min(p[0]), lo[1].min(p[1])],
                [hi[0].max(p[0]), hi[1].max(p[1])],
            )
        }))
    }

    /// Connected components as lists of atoms in BFS order
    pub fn components(&self) -> Vec<Vec<AtomIndex>> {
        let n = self.atoms.len();
        let mut seen = vec![false; n];
        let mut components = Vec::new();

        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut order = vec![AtomIndex(start as u32)];
            let mut head = 0;
            while head < order.len() {
                let atom = order[head];
                head += 1;
                for (next, _) in self.neighbors(atom) {
                    if !seen[next.as_usize()] {
                        seen[next.as_usize()] = true;
                        order.push(next);
                    }
                }
            }
            components.push(order);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethanol() -> Molecule {
        let mut mol = Molecule::new("ethanol");
        let c1 = mol.add_atom(Atom::new(Element::Carbon));
        let c2 = mol.add_atom(Atom::new(Element::Carbon));
        let o = mol.add_atom(Atom::new(Element::Oxygen));
        mol.add_bond(c1, c2, BondOrder::Single).unwrap();
        mol.add_bond(c2, o, BondOrder::Single).unwrap();
        mol
    }

    #[test]
    fn test_counts_and_neighbors() {
        let mol = ethanol();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.degree(AtomIndex(1)), 2);
        let neighbors: Vec<AtomIndex> = mol.neighbors(AtomIndex(1)).map(|(a, _)| a).collect();
        assert_eq!(neighbors, vec![AtomIndex(0), AtomIndex(2)]);
        assert!(mol.find_bond(AtomIndex(2), AtomIndex(1)).is_some());
        assert!(mol.find_bond(AtomIndex(0), AtomIndex(2)).is_none());
    }

    #[test]
    fn test_rejects_bad_bonds() {
        let mut mol = ethanol();
        assert_eq!(
            mol.add_bond(AtomIndex(0), AtomIndex(0), BondOrder::Single),
            Err(MolError::InvalidBond(0, 0))
        );
        assert!(mol.add_bond(AtomIndex(0), AtomIndex(1), BondOrder::Double).is_err());
        assert!(matches!(
            mol.add_bond(AtomIndex(0), AtomIndex(9), BondOrder::Single),
            Err(MolError::AtomIndexOutOfBounds(9, 3))
        ));
    }

    #[test]
    fn test_hydrogen_count() {
        let mol = ethanol();
        assert_eq!(mol.hydrogen_count(AtomIndex(0)), 3);
        assert_eq!(mol.hydrogen_count(AtomIndex(1)), 2);
        assert_eq!(mol.hydrogen_count(AtomIndex(2)), 1);
    }

    #[test]
    fn test_validity() {
        assert!(!Molecule::new("empty").is_valid());
        let mut mol = ethanol();
        assert!(mol.is_valid());
        assert!(mol.set_coords(vec![[0.0, 0.0]]).is_err());
        mol.prepare_depiction();
        assert!(mol.has_depiction());
        assert!(mol.is_valid());
        assert_eq!(mol.coords().map(|c| c.len()), Some(3));
    }

    #[test]
    fn test_components() {
        let mut mol = ethanol();
        mol.add_atom(Atom::new(Element::Sodium));
        let components = mol.components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[1], vec![AtomIndex(3)]);
    }
}
