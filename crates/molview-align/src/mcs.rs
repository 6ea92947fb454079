//! Maximum common substructure alignment

use molview_mol::{AtomIndex, McsScoring, McsSearch, Molecule, Point2};

use crate::aligner::{AlignMethod, Aligner};
use crate::superpose::align_to_anchors;

/// Aligns the atoms a molecule shares with a reference onto the reference depiction
#[derive(Debug, Clone)]
pub struct McsAligner {
    search: McsSearch,
}

impl McsAligner {
    pub fn new(reference: &Molecule, scoring: McsScoring, min_atoms: usize) -> Self {
        Self::from_search(
            McsSearch::new(reference.clone())
                .with_scoring(scoring)
                .with_min_atoms(min_atoms),
        )
    }

    /// Wrap a configured search; its reference is depicted if needed
    pub fn from_search(mut search: McsSearch) -> Self {
        search.prepare_depiction();
        McsAligner { search }
    }

    #[inline]
    pub fn search(&self) -> &McsSearch {
        &self.search
    }
}

impl Aligner for McsAligner {
    fn method(&self) -> AlignMethod {
        AlignMethod::Mcs
    }

    fn validate(&self, mol: &Molecule) -> bool {
        mol.is_valid() && self.search.find(mol).is_some()
    }

    fn align(&self, mol: &mut Molecule) -> bool {
        let Some(found) = self.search.find(mol) else {
            return false;
        };
        let reference = self.search.reference();
        let anchors: Vec<(AtomIndex, Point2)> = found
            .pairs
            .iter()
            .filter_map(|&(r, t)| reference.coord(r).map(|p| (t, p)))
            .collect();
        align_to_anchors(mol, &anchors).valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(smiles: &str) -> Molecule {
        Molecule::from_smiles(smiles).unwrap()
    }

    #[test]
    fn test_common_core_is_aligned() {
        let reference = mol("c1ccccc1CCN");
        let aligner = McsAligner::new(&reference, McsScoring::Atoms, 3);
        let mut target = mol("c1ccccc1CCO");
        assert!(aligner.apply(&mut target));

        let found = aligner.search().find(&target).unwrap();
        assert!(found.atom_count() >= 8);
        let reference = aligner.search().reference();
        for (r, t) in found.pairs {
            let expected = reference.coord(r).unwrap();
            let actual = target.coord(t).unwrap();
            assert!((expected[0] - actual[0]).abs() < 1e-9);
            assert!((expected[1] - actual[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_min_atoms_threshold() {
        let aligner = McsAligner::new(&mol("CCCCCC"), McsScoring::Atoms, 4);
        assert!(!aligner.validate(&mol("CCO")));
        assert!(aligner.validate(&mol("CCCCO")));
    }

    #[test]
    fn test_cycle_scoring_rejects_open_rings() {
        let aligner = McsAligner::new(&mol("CCCCCC"), McsScoring::AtomsAndCycles, 3);
        assert!(!aligner.validate(&mol("C1CCCCC1")));
    }
}
