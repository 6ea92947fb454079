//! Structural keys
//!
//! A fixed dictionary of substructure keys in the spirit of MACCS. Each key
//! is an atom predicate; the key's bit is set when any atom satisfies it and
//! its region is every atom that does.

use molview_mol::{AtomIndex, BondOrder, Element, Molecule, RingInfo};

/// Number of structural keys
pub(crate) const KEY_COUNT: usize = 32;

const KEY_ELEMENTS: [Element; 11] = [
    Element::Boron,
    Element::Carbon,
    Element::Nitrogen,
    Element::Oxygen,
    Element::Fluorine,
    Element::Silicon,
    Element::Phosphorus,
    Element::Sulfur,
    Element::Chlorine,
    Element::Bromine,
    Element::Iodine,
];

/// Set bits and their regions, in key order
pub(crate) fn keys(mol: &Molecule, rings: &RingInfo) -> Vec<(usize, Vec<AtomIndex>)> {
    (0..KEY_COUNT)
        .filter_map(|key| {
            let atoms: Vec<AtomIndex> = (0..mol.atom_count())
                .map(AtomIndex::from)
                .filter(|&atom| has_key(key, mol, rings, atom))
                .collect();
            (!atoms.is_empty()).then_some((key, atoms))
        })
        .collect()
}

fn has_key(key: usize, mol: &Molecule, rings: &RingInfo, atom: AtomIndex) -> bool {
    let Some(a) = mol.atom(atom) else {
        return false;
    };
    let in_ring_of = |size: usize| {
        rings
            .rings_of(atom)
            .iter()
            .any(|&r| rings.rings()[r].len() == size)
    };

    match key {
        0..=10 => a.element == KEY_ELEMENTS[key],
        11 => a.formal_charge != 0,
        12 => a.aromatic,
        13 => in_ring_of(3),
        14 => in_ring_of(4),
        15 => in_ring_of(5),
        16 => in_ring_of(6),
        17 => in_ring_of(7),
        18 => rings.rings_of(atom).iter().any(|&r| rings.rings()[r].len() >= 8),
        // Fused or spiro ring atom
        19 => rings.rings_of(atom).len() >= 2,
        20 => a.aromatic && a.element != Element::Carbon,
        21 => a.element.is_halogen(),
        22 => a.element == Element::Oxygen && mol.hydrogen_count(atom) > 0,
        23 => a.element == Element::Nitrogen && mol.hydrogen_count(atom) > 0,
        24 => a.element == Element::Carbon && mol.hydrogen_count(atom) == 3,
        25 => a.element == Element::Carbon && mol.heavy_degree(atom) == 4,
        26 => has_bond(mol, atom, BondOrder::Double),
        27 => has_bond(mol, atom, BondOrder::Triple),
        28 => in_bond(mol, atom, Element::Carbon, Element::Oxygen, Some(BondOrder::Double)),
        29 => in_bond(mol, atom, Element::Nitrogen, Element::Oxygen, None),
        30 => in_bond(mol, atom, Element::Sulfur, Element::Oxygen, Some(BondOrder::Double)),
        31 => in_bond(mol, atom, Element::Carbon, Element::Nitrogen, Some(BondOrder::Triple)),
        _ => false,
    }
}

fn has_bond(mol: &Molecule, atom: AtomIndex, order: BondOrder) -> bool {
    mol.neighbors(atom)
        .any(|(_, b)| mol.bond(b).is_some_and(|b| b.order == order))
}

/// Atom is one end of a bond between elements `x` and `y`
fn in_bond(
    mol: &Molecule,
    atom: AtomIndex,
    x: Element,
    y: Element,
    order: Option<BondOrder>,
) -> bool {
    let element = |a: AtomIndex| mol.atom(a).map(|a| a.element);
    let Some(own) = element(atom) else {
        return false;
    };
    let partner = if own == x {
        y
    } else if own == y {
        x
    } else {
        return false;
    };
    mol.neighbors(atom).any(|(n, b)| {
        element(n) == Some(partner)
            && order.map_or(true, |o| mol.bond(b).is_some_and(|b| b.order == o))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_set(smiles: &str) -> Vec<usize> {
        let mol = Molecule::from_smiles(smiles).unwrap();
        keys(&mol, &mol.ring_info()).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_acetic_acid_keys() {
        let set = key_set("CC(=O)O");
        for key in [1, 3, 22, 24, 26, 28] {
            assert!(set.contains(&key), "missing key {}", key);
        }
        assert!(!set.contains(&12));
        assert!(!set.contains(&16));
    }

    #[test]
    fn test_ring_keys() {
        let set = key_set("c1ccc2ccccc2c1");
        assert!(set.contains(&12));
        assert!(set.contains(&16));
        assert!(set.contains(&19));
        assert!(!set.contains(&15));
    }

    #[test]
    fn test_element_keys() {
        let set = key_set("FC(Cl)(Br)I");
        for key in [1, 4, 8, 9, 10, 21, 25] {
            assert!(set.contains(&key), "missing key {}", key);
        }
        assert!(!set.contains(&2));
        assert!(!set.contains(&3));

        let set = key_set("[SiH3]P(B)S(=O)C");
        for key in [0, 5, 6, 7, 30] {
            assert!(set.contains(&key), "missing key {}", key);
        }
    }

    #[test]
    fn test_key_regions() {
        let mol = Molecule::from_smiles("CC#N").unwrap();
        let found = keys(&mol, &mol.ring_info());
        let nitrile = found.iter().find(|(k, _)| *k == 31).unwrap();
        assert_eq!(nitrile.1, vec![AtomIndex(1), AtomIndex(2)]);
    }
}
