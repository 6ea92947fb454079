//! Feature enumeration for the hashed fingerprint kinds
//!
//! Every generator reports each feature it finds as a 64-bit hash together
//! with the atoms that produced it. The caller folds hashes into bits and
//! keeps the atoms as the bit's region.

use std::hash::Hash;

use ahash::{AHashSet, RandomState};
use molview_mol::{AtomIndex, BondIndex, BondOrder, Element, Molecule, RingInfo};

use super::mask::{AtomFeatures, BondFeatures};

/// Upper bound on enumerated subtrees per molecule
const MAX_SUBTREES: usize = 200_000;

/// Length of a lingo substring
pub(crate) const LINGO_LENGTH: usize = 4;

/// Per-molecule atom and bond invariants under a pair of feature masks
pub(crate) struct Features<'a> {
    pub mol: &'a Molecule,
    pub rings: RingInfo,
    atoms: Vec<u64>,
    bond_mask: BondFeatures,
    hasher: RandomState,
}

impl<'a> Features<'a> {
    pub fn new(mol: &'a Molecule, atom_mask: AtomFeatures, bond_mask: BondFeatures) -> Self {
        let rings = mol.ring_info();
        // Fixed seeds keep bit positions stable across processes
        let hasher = RandomState::with_seeds(
            0x6d6f_6c76_6965_7731,
            0x6669_6e67_6572_7072,
            0x696e_7473_0000_0001,
            0x0000_0000_9e37_79b9,
        );
        let atoms = (0..mol.atom_count())
            .map(AtomIndex::from)
            .map(|a| hasher.hash_one(atom_invariant(mol, &rings, a, atom_mask)))
            .collect();
        Features {
            mol,
            rings,
            atoms,
            bond_mask,
            hasher,
        }
    }

    #[inline]
    pub fn hash<T: Hash>(&self, value: T) -> u64 {
        self.hasher.hash_one(value)
    }

    #[inline]
    pub fn atom(&self, atom: AtomIndex) -> u64 {
        self.atoms[atom.as_usize()]
    }

    pub fn bond(&self, bond: BondIndex) -> u64 {
        let Some(b) = self.mol.bond(bond) else {
            return 0;
        };
        let order = if self.bond_mask.contains(BondFeatures::BOND_ORDER) {
            b.order as u8
        } else {
            0
        };
        let in_ring =
            self.bond_mask.contains(BondFeatures::IN_RING) && self.rings.bond_in_ring(bond);
        self.hash((order, in_ring))
    }
}

fn atom_invariant(
    mol: &Molecule,
    rings: &RingInfo,
    atom: AtomIndex,
    mask: AtomFeatures,
) -> [i32; 7] {
    let Some(a) = mol.atom(atom) else {
        return [0; 7];
    };
    let element = if mask.contains(AtomFeatures::EQ_AROMATIC) && a.aromatic {
        -1
    } else if mask.contains(AtomFeatures::EQ_HALOGEN) && a.element.is_halogen() {
        -2
    } else if mask.contains(AtomFeatures::ATOMIC_NUMBER) {
        a.element.atomic_number() as i32
    } else {
        0
    };
    let pick = |feature: AtomFeatures, value: i32| if mask.contains(feature) { value } else { 0 };

    [
        element,
        pick(AtomFeatures::AROMATICITY, a.aromatic as i32),
        pick(AtomFeatures::FORMAL_CHARGE, a.formal_charge as i32),
        pick(AtomFeatures::HVY_DEGREE, mol.heavy_degree(atom) as i32),
        pick(AtomFeatures::HYBRIDIZATION, hybridization(mol, atom)),
        pick(AtomFeatures::IN_RING, rings.atom_in_ring(atom) as i32),
        pick(AtomFeatures::H_COUNT, mol.hydrogen_count(atom) as i32),
    ]
}

/// 1 for sp, 2 for sp2, 3 for sp3
fn hybridization(mol: &Molecule, atom: AtomIndex) -> i32 {
    let mut doubles = 0;
    let mut planar = false;
    for (_, b) in mol.neighbors(atom) {
        match mol.bond(b).map(|b| b.order) {
            Some(BondOrder::Triple) => return 1,
            Some(BondOrder::Double) => doubles += 1,
            Some(BondOrder::Aromatic) => planar = true,
            _ => {}
        }
    }
    match doubles {
        0 if planar => 2,
        0 => 3,
        1 => 2,
        _ => 1,
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Linear paths of `min..=max` bonds
pub(crate) fn paths(f: &Features, min: u32, max: u32, emit: &mut impl FnMut(u64, Vec<AtomIndex>)) {
    let mut on_path = vec![false; f.mol.atom_count()];
    for start in 0..f.mol.atom_count() {
        let start = AtomIndex::from(start);
        let mut atoms = vec![start];
        let mut bonds = Vec::new();
        on_path[start.as_usize()] = true;
        extend_path(f, &mut atoms, &mut bonds, &mut on_path, min, max, emit);
        on_path[start.as_usize()] = false;
    }
}

fn extend_path(
    f: &Features,
    atoms: &mut Vec<AtomIndex>,
    bonds: &mut Vec<BondIndex>,
    on_path: &mut [bool],
    min: u32,
    max: u32,
    emit: &mut impl FnMut(u64, Vec<AtomIndex>),
) {
    let length = bonds.len() as u32;
    if length >= min {
        emit_path(f, atoms, bonds, emit);
    }
    if length >= max {
        return;
    }
    let Some(&last) = atoms.last() else {
        return;
    };
    let next: Vec<(AtomIndex, BondIndex)> = f.mol.neighbors(last).collect();
    for (n, b) in next {
        if on_path[n.as_usize()] {
            continue;
        }
        on_path[n.as_usize()] = true;
        atoms.push(n);
        bonds.push(b);
        extend_path(f, atoms, bonds, on_path, min, max, emit);
        bonds.pop();
        atoms.pop();
        on_path[n.as_usize()] = false;
    }
}

fn emit_path(
    f: &Features,
    atoms: &[AtomIndex],
    bonds: &[BondIndex],
    emit: &mut impl FnMut(u64, Vec<AtomIndex>),
) {
    let mut forward = Vec::with_capacity(atoms.len() + bonds.len());
    for (i, &atom) in atoms.iter().enumerate() {
        forward.push(f.atom(atom));
        if let Some(&b) = bonds.get(i) {
            forward.push(f.bond(b));
        }
    }
    let reverse: Vec<u64> = forward.iter().rev().copied().collect();

    // Each path is walked from both ends; keep the canonical direction
    if forward <= reverse {
        emit(f.hash(("path", &forward)), atoms.to_vec());
    }
}

// =============================================================================
// Circular environments
// =============================================================================

/// Atom environments of radius `min..=max`
pub(crate) fn circular(
    f: &Features,
    min: u32,
    max: u32,
    emit: &mut impl FnMut(u64, Vec<AtomIndex>),
) {
    let n = f.mol.atom_count();
    let mut labels: Vec<u64> = (0..n).map(|a| f.atom(AtomIndex::from(a))).collect();

    for radius in 0..=max {
        if radius >= min {
            for a in 0..n {
                let atom = AtomIndex::from(a);
                emit(
                    f.hash(("circular", radius, labels[a])),
                    environment(f.mol, atom, radius),
                );
            }
        }
        if radius == max {
            break;
        }
        labels = (0..n)
            .map(|a| {
                let atom = AtomIndex::from(a);
                let mut around: Vec<(u64, u64)> = f
                    .mol
                    .neighbors(atom)
                    .map(|(nb, b)| (f.bond(b), labels[nb.as_usize()]))
                    .collect();
                around.sort_unstable();
                f.hash((labels[a], around))
            })
            .collect();
    }
}

/// Atoms within `radius` bonds of `center`, center first, in BFS order
fn environment(mol: &Molecule, center: AtomIndex, radius: u32) -> Vec<AtomIndex> {
    let mut seen = AHashSet::new();
    seen.insert(center);
    let mut order = vec![center];
    let mut frontier = vec![center];
    for _ in 0..radius {
        let mut next = Vec::new();
        for &atom in &frontier {
            for (n, _) in mol.neighbors(atom) {
                if seen.insert(n) {
                    order.push(n);
                    next.push(n);
                }
            }
        }
        frontier = next;
    }
    order
}

// =============================================================================
// Trees
// =============================================================================

/// Connected acyclic bond subsets of `min..=max` bonds
pub(crate) fn trees(f: &Features, min: u32, max: u32, emit: &mut impl FnMut(u64, Vec<AtomIndex>)) {
    if min == 0 {
        for a in 0..f.mol.atom_count() {
            let atom = AtomIndex::from(a);
            emit(f.hash(("tree", 0u32, f.atom(atom))), vec![atom]);
        }
    }

    let mut frontier: Vec<Vec<BondIndex>> = (0..f.mol.bond_count())
        .map(|b| vec![BondIndex::from(b)])
        .collect();
    let mut seen: AHashSet<Vec<BondIndex>> = frontier.iter().cloned().collect();

    for size in 1..=max {
        if size >= min {
            for subtree in &frontier {
                emit_tree(f, subtree, emit);
            }
        }
        if size == max {
            break;
        }

        let mut next = Vec::new();
        for subtree in &frontier {
            let atoms = tree_atoms(f.mol, subtree);
            for &atom in &atoms {
                for (n, b) in f.mol.neighbors(atom) {
                    // Both ends already present would close a ring
                    if subtree.contains(&b) || atoms.contains(&n) {
                        continue;
                    }
                    let mut grown = subtree.clone();
                    grown.push(b);
                    grown.sort_unstable();
                    if seen.insert(grown.clone()) {
                        next.push(grown);
                    }
                }
            }
            if seen.len() > MAX_SUBTREES {
                log::debug!(
                    "Subtree enumeration for '{}' stopped at {} bonds",
                    f.mol.title,
                    size
                );
                next.clear();
                break;
            }
        }
        frontier = next;
    }
}

fn tree_atoms(mol: &Molecule, bonds: &[BondIndex]) -> Vec<AtomIndex> {
    let mut atoms = Vec::with_capacity(bonds.len() + 1);
    for b in bonds.iter().filter_map(|&b| mol.bond(b)) {
        for atom in [b.atom1, b.atom2] {
            if !atoms.contains(&atom) {
                atoms.push(atom);
            }
        }
    }
    atoms
}

fn emit_tree(f: &Features, bonds: &[BondIndex], emit: &mut impl FnMut(u64, Vec<AtomIndex>)) {
    let atoms = tree_atoms(f.mol, bonds);
    let mut labels: Vec<u64> = atoms.iter().map(|&a| f.atom(a)).collect();

    // Refine labels within the subtree; its diameter never exceeds its bond count
    for _ in 0..bonds.len() {
        labels = atoms
            .iter()
            .enumerate()
            .map(|(i, &atom)| {
                let mut around: Vec<(u64, u64)> = f
                    .mol
                    .neighbors(atom)
                    .filter(|(_, b)| bonds.contains(b))
                    .filter_map(|(n, b)| {
                        let j = atoms.iter().position(|&a| a == n)?;
                        Some((f.bond(b), labels[j]))
                    })
                    .collect();
                around.sort_unstable();
                f.hash((labels[i], around))
            })
            .collect();
    }

    let mut ranked: Vec<(u64, AtomIndex)> = labels.into_iter().zip(atoms).collect();
    ranked.sort_unstable();
    let shape: Vec<u64> = ranked.iter().map(|&(label, _)| label).collect();
    emit(
        f.hash(("tree", bonds.len() as u32, shape)),
        ranked.into_iter().map(|(_, atom)| atom).collect(),
    );
}

// =============================================================================
// Lingos
// =============================================================================

/// Overlapping substrings of a SMILES-like atom walk
pub(crate) fn lingos(f: &Features, emit: &mut impl FnMut(u64, Vec<AtomIndex>)) {
    let tokens = walk_tokens(f);
    for window in tokens.windows(LINGO_LENGTH) {
        let text: String = window.iter().map(|&(c, _)| c).collect();
        let atoms = window.iter().filter_map(|&(_, a)| a).collect();
        emit(f.hash(("lingo", text)), atoms);
    }
}

fn walk_tokens(f: &Features) -> Vec<(char, Option<AtomIndex>)> {
    let mol = f.mol;
    let mut tokens = Vec::new();
    let mut visited = vec![false; mol.atom_count()];
    let mut written = vec![false; mol.bond_count()];

    for component in mol.components() {
        // Start each fragment at its lowest-ranked atom
        let Some(&start) = component.iter().min_by_key(|&&a| (f.atom(a), a)) else {
            continue;
        };
        if !tokens.is_empty() {
            tokens.push(('.', None));
        }
        write_atom(mol, start, &mut visited, &mut written, &mut tokens);
    }
    tokens
}

fn write_atom(
    mol: &Molecule,
    atom: AtomIndex,
    visited: &mut [bool],
    written: &mut [bool],
    tokens: &mut Vec<(char, Option<AtomIndex>)>,
) {
    visited[atom.as_usize()] = true;
    tokens.push((atom_token(mol, atom), Some(atom)));

    let mut branches = Vec::new();
    for (n, b) in mol.neighbors(atom) {
        if written[b.as_usize()] {
            continue;
        }
        if visited[n.as_usize()] {
            // Ring closure digits are normalized to a single symbol
            written[b.as_usize()] = true;
            tokens.push(('0', None));
        } else {
            branches.push((n, b));
        }
    }

    let last = branches.len().saturating_sub(1);
    for (i, (n, b)) in branches.into_iter().enumerate() {
        if written[b.as_usize()] {
            continue;
        }
        written[b.as_usize()] = true;
        if i != last {
            tokens.push(('(', None));
        }
        match mol.bond(b).map(|b| b.order) {
            Some(BondOrder::Double) => tokens.push(('=', None)),
            Some(BondOrder::Triple) => tokens.push(('#', None)),
            _ => {}
        }
        write_atom(mol, n, visited, written, tokens);
        if i != last {
            tokens.push((')', None));
        }
    }
}

/// One character per atom; two-letter halogens get their customary stand-ins
fn atom_token(mol: &Molecule, atom: AtomIndex) -> char {
    let Some(a) = mol.atom(atom) else {
        return '*';
    };
    let c = match a.element {
        Element::Chlorine => 'L',
        Element::Bromine => 'R',
        other => other.symbol().chars().next().unwrap_or('*'),
    };
    if a.aromatic {
        c.to_ascii_lowercase()
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(
        smiles: &str,
        run: impl Fn(&Features, &mut dyn FnMut(u64, Vec<AtomIndex>)),
    ) -> Vec<(u64, Vec<AtomIndex>)> {
        let mol = Molecule::from_smiles(smiles).unwrap();
        let f = Features::new(
            &mol,
            AtomFeatures::DEFAULT_PATH_ATOM,
            BondFeatures::DEFAULT_PATH_BOND,
        );
        let mut out = Vec::new();
        run(&f, &mut |h, atoms| out.push((h, atoms)));
        out
    }

    #[test]
    fn test_paths_are_canonical() {
        // Propane: 3 atoms, 2 one-bond paths (identical), 1 two-bond path
        let found = collect("CCC", |f, emit| paths(f, 0, 5, &mut |h, a| emit(h, a)));
        let longest: Vec<_> = found.iter().filter(|(_, a)| a.len() == 3).collect();
        assert_eq!(longest.len(), 2, "palindromic path kept in both directions");
        assert_eq!(longest[0].0, longest[1].0);
        let singles = found.iter().filter(|(_, a)| a.len() == 1).count();
        assert_eq!(singles, 3);
    }

    #[test]
    fn test_path_length_window() {
        let found = collect("CCCC", |f, emit| paths(f, 2, 2, &mut |h, a| emit(h, a)));
        assert!(found.iter().all(|(_, a)| a.len() == 3));
    }

    #[test]
    fn test_circular_regions_grow() {
        let found = collect("CCO", |f, emit| circular(f, 0, 1, &mut |h, a| emit(h, a)));
        assert_eq!(found.len(), 6);
        assert_eq!(found[3].1[0], AtomIndex(0));
        assert_eq!(found[4].1.len(), 3);
    }

    #[test]
    fn test_trees_in_a_ring() {
        // Cyclopropane: 3 single bonds, 3 two-bond subtrees, no three-bond tree
        let found = collect("C1CC1", |f, emit| trees(f, 1, 4, &mut |h, a| emit(h, a)));
        assert_eq!(found.len(), 6);
        assert!(found.iter().all(|(_, a)| a.len() <= 3));
    }

    #[test]
    fn test_tree_hash_ignores_atom_order() {
        let a = collect("OCC", |f, emit| trees(f, 2, 2, &mut |h, a| emit(h, a)));
        let b = collect("CCO", |f, emit| trees(f, 2, 2, &mut |h, a| emit(h, a)));
        assert_eq!(a[0].0, b[0].0);
    }

    #[test]
    fn test_lingo_tokens() {
        let mol = Molecule::from_smiles("ClCC=O").unwrap();
        let f = Features::new(&mol, AtomFeatures::empty(), BondFeatures::empty());
        let text: String = walk_tokens(&f).into_iter().map(|(c, _)| c).collect();
        assert_eq!(text.len(), 5);
        assert!(text.contains('L'));
        assert!(text.contains("=O") || text.starts_with('O'));
    }

    #[test]
    fn test_halogen_tokens() {
        let mol = Molecule::from_smiles("BrCCl").unwrap();
        let tokens: Vec<char> = mol.atoms_indexed().map(|(i, _)| atom_token(&mol, i)).collect();
        assert_eq!(tokens, vec!['R', 'C', 'L']);
    }
}
