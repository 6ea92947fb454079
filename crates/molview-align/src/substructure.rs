//! Substructure alignment
//!
//! Matched atoms take the coordinates of the corresponding atoms in a
//! reference depiction. Without a reference molecule the pattern itself is
//! depicted and used as the template.

use molview_mol::{AtomIndex, Molecule, Point2, QueryPattern};

use crate::aligner::{AlignMethod, Aligner};
use crate::error::{AlignError, AlignResult};
use crate::superpose::align_to_anchors;

#[derive(Debug, Clone)]
pub struct SubstructureAligner {
    pattern: QueryPattern,
    /// Template coordinate for each pattern atom
    template: Vec<Point2>,
}

impl SubstructureAligner {
    /// Align to the depiction of a pattern string
    pub fn from_pattern(pattern: &str) -> AlignResult<Self> {
        Ok(Self::from_query(QueryPattern::parse(pattern)?))
    }

    /// Align to the depiction of a compiled pattern
    pub fn from_query(pattern: QueryPattern) -> Self {
        let mut depiction = pattern.molecule().clone();
        depiction.prepare_depiction();
        let template = depiction.coords().map(<[Point2]>::to_vec).unwrap_or_default();
        SubstructureAligner { pattern, template }
    }

    /// Align to where `pattern` sits in `reference`'s depiction
    ///
    /// The reference is depicted if needed; its first match defines the template.
    pub fn from_reference(reference: &Molecule, pattern: QueryPattern) -> AlignResult<Self> {
        let mut reference = reference.clone();
        reference.prepare_depiction();
        let found = pattern
            .first_match(&reference)
            .ok_or_else(|| AlignError::NoReferenceMatch(pattern.as_str().to_string()))?;

        let mut template = vec![[0.0, 0.0]; pattern.atom_count()];
        for (q, r) in found {
            if let Some(p) = reference.coord(r) {
                template[q.as_usize()] = p;
            }
        }
        Ok(SubstructureAligner { pattern, template })
    }

    /// Use the whole reference molecule as the query
    pub fn from_molecule(reference: &Molecule) -> Self {
        let mut reference = reference.clone();
        reference.prepare_depiction();
        let template = reference.coords().map(<[Point2]>::to_vec).unwrap_or_default();
        SubstructureAligner {
            pattern: QueryPattern::from_molecule(&reference),
            template,
        }
    }

    #[inline]
    pub fn pattern(&self) -> &QueryPattern {
        &self.pattern
    }

    /// Template coordinates, one per pattern atom
    #[inline]
    pub fn template(&self) -> &[Point2] {
        &self.template
    }
}

impl Aligner for SubstructureAligner {
    fn method(&self) -> AlignMethod {
        AlignMethod::Substructure
    }

    fn validate(&self, mol: &Molecule) -> bool {
        mol.is_valid() && self.pattern.has_match(mol)
    }

    fn align(&self, mol: &mut Molecule) -> bool {
        let Some(found) = self.pattern.first_match(mol) else {
            return false;
        };
        let anchors: Vec<(AtomIndex, Point2)> = found
            .into_iter()
            .filter_map(|(q, t)| self.template.get(q.as_usize()).map(|&p| (t, p)))
            .collect();
        align_to_anchors(mol, &anchors).valid
    }
}
