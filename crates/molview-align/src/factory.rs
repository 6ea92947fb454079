//! Choosing an aligner from a reference and an optional method name

use molview_mol::{McsScoring, McsSearch, Molecule, QueryPattern};
use serde::{Deserialize, Serialize};

use crate::aligner::{AlignMethod, Aligner};
use crate::error::{AlignError, AlignResult};
use crate::fingerprint::FingerprintSpec;
use crate::mcs::McsAligner;
use crate::overlap::{FingerprintAligner, DEFAULT_THRESHOLD};
use crate::substructure::SubstructureAligner;

/// What a depiction should be aligned to
#[derive(Debug, Clone)]
pub enum ReferenceKind {
    /// A pattern string; always aligned by substructure
    Pattern(String),
    /// A compiled pattern; always aligned by substructure
    Query(QueryPattern),
    /// A configured MCS search
    Mcs(McsSearch),
    /// A reference molecule; any method applies
    Molecule(Molecule),
    /// Anything else, described for the error message
    Unsupported(String),
}

impl ReferenceKind {
    /// Short name used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            ReferenceKind::Pattern(_) => "pattern",
            ReferenceKind::Query(_) => "query",
            ReferenceKind::Mcs(_) => "MCS search",
            ReferenceKind::Molecule(_) => "molecule",
            ReferenceKind::Unsupported(_) => "unsupported",
        }
    }
}

impl From<&str> for ReferenceKind {
    fn from(pattern: &str) -> Self {
        ReferenceKind::Pattern(pattern.to_string())
    }
}

impl From<String> for ReferenceKind {
    fn from(pattern: String) -> Self {
        ReferenceKind::Pattern(pattern)
    }
}

impl From<QueryPattern> for ReferenceKind {
    fn from(query: QueryPattern) -> Self {
        ReferenceKind::Query(query)
    }
}

impl From<McsSearch> for ReferenceKind {
    fn from(search: McsSearch) -> Self {
        ReferenceKind::Mcs(search)
    }
}

impl From<Molecule> for ReferenceKind {
    fn from(mol: Molecule) -> Self {
        ReferenceKind::Molecule(mol)
    }
}

/// Strategy options; each aligner reads the ones that concern it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerOptions {
    /// Substructure pattern to locate in a reference molecule
    pub pattern: Option<String>,
    pub scoring: McsScoring,
    pub min_atoms: usize,
    /// Minimum Tanimoto similarity for fingerprint alignment
    pub threshold: f64,
    pub fingerprint: FingerprintSpec,
}

impl Default for AlignerOptions {
    fn default() -> Self {
        AlignerOptions {
            pattern: None,
            scoring: McsScoring::default(),
            min_atoms: McsSearch::DEFAULT_MIN_ATOMS,
            threshold: DEFAULT_THRESHOLD,
            fingerprint: FingerprintSpec::default(),
        }
    }
}

/// Build the aligner for `reference`
///
/// `method` accepts the full names and the synonyms `ss`, `mcss` and `fp`.
/// Patterns always get a substructure aligner, an MCS search an MCS
/// aligner, and a molecule defaults to fingerprint overlap.
pub fn create_aligner(
    reference: ReferenceKind,
    method: Option<&str>,
    options: &AlignerOptions,
) -> AlignResult<Box<dyn Aligner>> {
    let method = method.map(str::parse::<AlignMethod>).transpose()?;
    let kind = reference.describe();

    let aligner: Box<dyn Aligner> = match reference {
        ReferenceKind::Pattern(pattern) => {
            note_ignored_method(method, kind);
            Box::new(SubstructureAligner::from_pattern(&pattern)?)
        }
        ReferenceKind::Query(query) => {
            note_ignored_method(method, kind);
            Box::new(SubstructureAligner::from_query(query))
        }
        ReferenceKind::Mcs(search) => match method {
            None | Some(AlignMethod::Mcs) => Box::new(McsAligner::from_search(search)),
            Some(other) => {
                return Err(AlignError::IncompatibleMethod {
                    method: other.name().to_string(),
                    reference: kind,
                })
            }
        },
        ReferenceKind::Molecule(mol) => match method.unwrap_or(AlignMethod::Fingerprint) {
            AlignMethod::Substructure => match &options.pattern {
                Some(pattern) => Box::new(SubstructureAligner::from_reference(
                    &mol,
                    QueryPattern::parse(pattern)?,
                )?),
                None => Box::new(SubstructureAligner::from_molecule(&mol)),
            },
            AlignMethod::Mcs => Box::new(McsAligner::new(&mol, options.scoring, options.min_atoms)),
            AlignMethod::Fingerprint => Box::new(FingerprintAligner::new(
                &mol,
                options.threshold,
                options.fingerprint,
            )?),
        },
        ReferenceKind::Unsupported(description) => {
            return Err(AlignError::UnsupportedReference(description))
        }
    };

    log::debug!("Created {} aligner", aligner.method());
    Ok(aligner)
}

fn note_ignored_method(method: Option<AlignMethod>, reference: &str) {
    if let Some(m) = method.filter(|&m| m != AlignMethod::Substructure) {
        log::debug!(
            "A {} reference is aligned by substructure; ignoring method '{}'",
            reference,
            m
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(smiles: &str) -> Molecule {
        Molecule::from_smiles(smiles).unwrap()
    }

    fn create(
        reference: impl Into<ReferenceKind>,
        method: Option<&str>,
    ) -> AlignResult<AlignMethod> {
        create_aligner(reference.into(), method, &AlignerOptions::default()).map(|a| a.method())
    }

    #[test]
    fn test_pattern_is_always_substructure() {
        for method in [None, Some("ss"), Some("fp"), Some("mcs")] {
            assert_eq!(create("c1ccccc1", method).unwrap(), AlignMethod::Substructure);
        }
        let query = QueryPattern::parse("C=O").unwrap();
        assert_eq!(create(query, Some("fingerprint")).unwrap(), AlignMethod::Substructure);
    }

    #[test]
    fn test_molecule_defaults_to_fingerprint() {
        assert_eq!(create(mol("CCO"), None).unwrap(), AlignMethod::Fingerprint);
        assert_eq!(create(mol("CCO"), Some("mcss")).unwrap(), AlignMethod::Mcs);
        assert_eq!(create(mol("CCO"), Some("SS")).unwrap(), AlignMethod::Substructure);
    }

    #[test]
    fn test_molecule_with_pattern_option() {
        let options = AlignerOptions {
            pattern: Some("C=O".to_string()),
            ..Default::default()
        };
        let aligner =
            create_aligner(mol("CC(=O)C").into(), Some("substructure"), &options).unwrap();
        assert!(aligner.validate(&mol("CCC=O")));

        let missing = AlignerOptions {
            pattern: Some("N".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            create_aligner(mol("CCO").into(), Some("ss"), &missing),
            Err(AlignError::NoReferenceMatch(_))
        ));
    }

    #[test]
    fn test_mcs_search_reference() {
        let search = McsSearch::new(mol("c1ccccc1"));
        assert_eq!(create(search.clone(), None).unwrap(), AlignMethod::Mcs);
        assert_eq!(
            create(search, Some("fp")),
            Err(AlignError::IncompatibleMethod {
                method: "fingerprint".to_string(),
                reference: "MCS search",
            })
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            create(mol("CCO"), Some("overlay")),
            Err(AlignError::UnknownMethod("overlay".to_string()))
        );
        assert_eq!(
            create(ReferenceKind::Unsupported("3D grid".to_string()), None),
            Err(AlignError::UnsupportedReference("3D grid".to_string()))
        );
        assert!(matches!(create("c1cc(", None), Err(AlignError::Mol(_))));
    }
}
