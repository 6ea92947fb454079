//! Ring perception
//!
//! One ring per independent cycle: every bond that closes a cycle in a BFS
//! spanning tree contributes the shortest cycle running through it. For the
//! fused and isolated ring systems of typical depictions this is the SSSR.

use ahash::AHashSet;
use smallvec::SmallVec;

use crate::index::{AtomIndex, BondIndex};
use crate::molecule::Molecule;

/// Perceived rings of a molecule
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    /// Rings as atoms in cyclic order
    rings: Vec<Vec<AtomIndex>>,
    /// Indices into `rings` per atom
    atom_rings: Vec<SmallVec<[usize; 2]>>,
    /// Ring membership per bond
    ring_bonds: Vec<bool>,
}

impl RingInfo {
    /// Perceive the rings of `mol`
    pub fn perceive(mol: &Molecule) -> Self {
        let n = mol.atom_count();
        let mut info = RingInfo {
            rings: Vec::new(),
            atom_rings: vec![SmallVec::new(); n],
            ring_bonds: vec![false; mol.bond_count()],
        };

        let mut tree_bond = vec![false; mol.bond_count()];
        for component in mol.components() {
            let mut seen = AHashSet::new();
            seen.insert(component[0]);
            for &atom in &component {
                for (next, bond) in mol.neighbors(atom) {
                    if seen.insert(next) {
                        tree_bond[bond.as_usize()] = true;
                    }
                }
            }
        }

        let mut seen_sets: AHashSet<Vec<AtomIndex>> = AHashSet::new();
        for (bond_idx, bond) in mol.bonds_indexed() {
            if tree_bond[bond_idx.as_usize()] {
                continue;
            }
            let Some(path) = shortest_path_avoiding(mol, bond.atom1, bond.atom2, bond_idx) else {
                continue;
            };
            let mut key = path.clone();
            key.sort();
            if !seen_sets.insert(key) {
                continue;
            }

            let ring_idx = info.rings.len();
            for (i, &atom) in path.iter().enumerate() {
                info.atom_rings[atom.as_usize()].push(ring_idx);
                let next = path[(i + 1) % path.len()];
                if let Some(b) = mol.find_bond(atom, next) {
                    info.ring_bonds[b.as_usize()] = true;
                }
            }
            info.rings.push(path);
        }

        info
    }

    /// All rings, atoms in cyclic order
    #[inline]
    pub fn rings(&self) -> &[Vec<AtomIndex>] {
        &self.rings
    }

    /// Number of rings
    #[inline]
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Rings containing an atom
    pub fn rings_of(&self, atom: AtomIndex) -> &[usize] {
        self.atom_rings
            .get(atom.as_usize())
            .map_or(&[], |r| r.as_slice())
    }

    /// Whether an atom belongs to any ring
    #[inline]
    pub fn atom_in_ring(&self, atom: AtomIndex) -> bool {
        !self.rings_of(atom).is_empty()
    }

    /// Whether a bond belongs to any ring
    #[inline]
    pub fn bond_in_ring(&self, bond: BondIndex) -> bool {
        self.ring_bonds.get(bond.as_usize()).copied().unwrap_or(false)
    }

    /// Size of the smallest ring containing an atom
    pub fn smallest_ring_size(&self, atom: AtomIndex) -> Option<usize> {
        self.rings_of(atom).iter().map(|&r| self.rings[r].len()).min()
    }
}

/// BFS path from `from` to `to` that never crosses `skip`
fn shortest_path_avoiding(
    mol: &Molecule,
    from: AtomIndex,
    to: AtomIndex,
    skip: BondIndex,
) -> Option<Vec<AtomIndex>> {
    let mut parent: Vec<Option<AtomIndex>> = vec![None; mol.atom_count()];
    let mut visited = vec![false; mol.atom_count()];
    visited[from.as_usize()] = true;
    let mut queue = std::collections::VecDeque::from([from]);

    while let Some(atom) = queue.pop_front() {
        if atom == to {
            let mut path = vec![to];
            let mut cur = to;
            while let Some(p) = parent[cur.as_usize()] {
                path.push(p);
                cur = p;
            }
            path.reverse();
            return Some(path);
        }
        for (next, bond) in mol.neighbors(atom) {
            if bond == skip || visited[next.as_usize()] {
                continue;
            }
            visited[next.as_usize()] = true;
            parent[next.as_usize()] = Some(atom);
            queue.push_back(next);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benzene_single_ring() {
        let mol = Molecule::from_smiles("c1ccccc1").unwrap();
        let info = mol.ring_info();
        assert_eq!(info.ring_count(), 1);
        assert_eq!(info.rings()[0].len(), 6);
        assert!((0..6).all(|i| info.atom_in_ring(AtomIndex(i))));
    }

    #[test]
    fn test_naphthalene_two_rings() {
        let mol = Molecule::from_smiles("c1ccc2ccccc2c1").unwrap();
        let info = mol.ring_info();
        assert_eq!(info.ring_count(), 2);
        assert!(info.rings().iter().all(|r| r.len() == 6));
    }

    #[test]
    fn test_chain_has_no_rings() {
        let mol = Molecule::from_smiles("CCCC(=O)O").unwrap();
        let info = mol.ring_info();
        assert_eq!(info.ring_count(), 0);
        assert!(!info.bond_in_ring(BondIndex(0)));
    }

    #[test]
    fn test_substituent_bond_not_in_ring() {
        let mol = Molecule::from_smiles("Cc1ccccc1").unwrap();
        let info = mol.ring_info();
        assert!(!info.atom_in_ring(AtomIndex(0)));
        assert!(!info.bond_in_ring(BondIndex(0)));
        assert_eq!(info.smallest_ring_size(AtomIndex(1)), Some(6));
    }
}
