//! Fingerprint-overlap alignment
//!
//! Molecules that are similar enough to the reference are aligned on the
//! atoms behind the fingerprint bits they share with it. Atoms are paired
//! position by position within regions that set the same bit, largest
//! regions first, and only when the paired atoms have the same element and
//! aromaticity. Each atom is used at most once.

use ahash::AHashMap;
use molview_mol::{AtomIndex, Molecule, Point2};

use crate::aligner::{AlignMethod, Aligner};
use crate::error::AlignResult;
use crate::fingerprint::{
    make_fingerprint_fn, BitRegion, Fingerprint, FingerprintFn, FingerprintMaker, FingerprintSpec,
};
use crate::superpose::align_to_anchors;

/// Similarity a molecule needs before it is aligned
pub const DEFAULT_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone)]
struct Reference {
    molecule: Molecule,
    fingerprint: Fingerprint,
    regions: AHashMap<usize, Vec<BitRegion>>,
}

#[derive(Debug, Clone)]
pub struct FingerprintAligner {
    /// `None` when the reference was unusable; the aligner then rejects everything
    reference: Option<Reference>,
    maker: FingerprintMaker,
    threshold: f64,
}

impl FingerprintAligner {
    /// Fails only when `spec` is invalid; an unusable reference yields an inert aligner
    pub fn new(reference: &Molecule, threshold: f64, spec: FingerprintSpec) -> AlignResult<Self> {
        let maker = make_fingerprint_fn(spec)?;

        if !reference.is_valid() {
            log::warn!(
                "Reference molecule '{}' is not valid; fingerprint alignment is disabled",
                reference.title
            );
            return Ok(FingerprintAligner {
                reference: None,
                maker,
                threshold,
            });
        }

        let mut molecule = reference.clone();
        molecule.prepare_depiction();
        let (fingerprint, found) = maker.fingerprint_with_regions(&molecule);
        let mut regions: AHashMap<usize, Vec<BitRegion>> = AHashMap::new();
        for region in found {
            regions.entry(region.bit).or_default().push(region);
        }

        Ok(FingerprintAligner {
            reference: Some(Reference {
                molecule,
                fingerprint,
                regions,
            }),
            maker,
            threshold,
        })
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether a usable reference was given
    #[inline]
    pub fn is_active(&self) -> bool {
        self.reference.is_some()
    }

    /// Tanimoto similarity of `mol` to the reference
    pub fn similarity(&self, mol: &Molecule) -> Option<f64> {
        let reference = self.reference.as_ref()?;
        mol.is_valid()
            .then(|| self.maker.fingerprint(mol).tanimoto(&reference.fingerprint))
    }

    fn anchors(&self, reference: &Reference, mol: &Molecule) -> Vec<(AtomIndex, Point2)> {
        let (_, mut regions) = self.maker.fingerprint_with_regions(mol);
        regions.sort_by(|a, b| b.atoms.len().cmp(&a.atoms.len()));

        let mut used_ref = vec![false; reference.molecule.atom_count()];
        let mut used_target = vec![false; mol.atom_count()];
        let mut anchors = Vec::new();

        for region in &regions {
            let Some(candidates) = reference.regions.get(&region.bit) else {
                continue;
            };
            for candidate in candidates.iter().filter(|c| c.atoms.len() == region.atoms.len()) {
                for (&r, &t) in candidate.atoms.iter().zip(&region.atoms) {
                    if used_ref[r.as_usize()]
                        || used_target[t.as_usize()]
                        || !same_atom(&reference.molecule, r, mol, t)
                    {
                        continue;
                    }
                    if let Some(p) = reference.molecule.coord(r) {
                        used_ref[r.as_usize()] = true;
                        used_target[t.as_usize()] = true;
                        anchors.push((t, p));
                    }
                }
            }
        }
        anchors
    }
}

fn same_atom(a: &Molecule, ai: AtomIndex, b: &Molecule, bi: AtomIndex) -> bool {
    match (a.atom(ai), b.atom(bi)) {
        (Some(x), Some(y)) => x.element == y.element && x.aromatic == y.aromatic,
        _ => false,
    }
}

impl Aligner for FingerprintAligner {
    fn method(&self) -> AlignMethod {
        AlignMethod::Fingerprint
    }

    fn validate(&self, mol: &Molecule) -> bool {
        self.similarity(mol)
            .is_some_and(|similarity| similarity >= self.threshold)
    }

    fn align(&self, mol: &mut Molecule) -> bool {
        let Some(reference) = &self.reference else {
            return false;
        };
        if !mol.is_valid() {
            return false;
        }
        let anchors = self.anchors(reference, mol);
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
    fn test_identical_molecule_aligns_exactly() {
        let reference = mol("c1ccccc1CC(=O)O");
        let aligner =
            FingerprintAligner::new(&reference, DEFAULT_THRESHOLD, FingerprintSpec::default())
                .unwrap();
        let mut target = reference.clone();
        assert_eq!(aligner.similarity(&target), Some(1.0));
        assert!(aligner.apply(&mut target));
        assert!(target.has_depiction());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let reference = mol("Cc1ccccc1");
        let probe = mol("Cc1ccccc1CC");
        let aligner =
            FingerprintAligner::new(&reference, 0.0, FingerprintSpec::default()).unwrap();
        let similarity = aligner.similarity(&probe).unwrap();

        let at = FingerprintAligner::new(&reference, similarity, FingerprintSpec::default())
            .unwrap();
        assert!(at.validate(&probe));
        let above = FingerprintAligner::new(
            &reference,
            similarity + 1e-6,
            FingerprintSpec::default(),
        )
        .unwrap();
        assert!(!above.validate(&probe));
    }

    #[test]
    fn test_dissimilar_molecule_is_skipped() {
        let aligner =
            FingerprintAligner::new(&mol("c1ccccc1"), DEFAULT_THRESHOLD, FingerprintSpec::default())
                .unwrap();
        let mut target = mol("CCCCCCCCN");
        assert!(!aligner.apply(&mut target));
        assert!(!target.has_depiction());
    }

    #[test]
    fn test_invalid_reference_is_inert() {
        let aligner =
            FingerprintAligner::new(&Molecule::new("empty"), 0.0, FingerprintSpec::default())
                .unwrap();
        assert!(!aligner.is_active());
        let mut target = mol("CCO");
        assert!(!aligner.validate(&target));
        assert!(!aligner.align(&mut target));
    }

    #[test]
    fn test_shared_atoms_are_anchored() {
        let reference = mol("c1ccccc1CCO");
        let aligner =
            FingerprintAligner::new(&reference, 0.0, FingerprintSpec::default()).unwrap();
        let target = mol("c1ccccc1CCN");
        let anchors = aligner.anchors(aligner.reference.as_ref().unwrap(), &target);
        assert!(anchors.len() >= 6);
        let mut atoms: Vec<AtomIndex> = anchors.iter().map(|&(t, _)| t).collect();
        atoms.sort();
        atoms.dedup();
        assert_eq!(atoms.len(), anchors.len());
        assert!(!atoms.contains(&AtomIndex(8)));
    }
}
