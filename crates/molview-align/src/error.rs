//! Error types for alignment and fingerprint configuration

use molview_mol::MolError;
use thiserror::Error;

/// Errors from aligner construction and fingerprint configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignError {
    /// A name is not present in the relevant lookup table
    #[error("Unknown {kind}: '{name}'")]
    UnknownName { kind: &'static str, name: String },

    /// Every name in a mask expression resolved to zero bits
    #[error("Mask '{0}' does not select any feature")]
    EmptyMask(String),

    /// Fingerprint parameters that cannot produce a fingerprint
    #[error("Invalid fingerprint parameters: {0}")]
    InvalidFingerprint(String),

    #[error("Unknown alignment method: '{0}'")]
    UnknownMethod(String),

    /// A recognized method that cannot work with the given reference
    #[error("Alignment method '{method}' cannot be used with a {reference} reference")]
    IncompatibleMethod {
        method: String,
        reference: &'static str,
    },

    #[error("Unsupported alignment reference: {0}")]
    UnsupportedReference(String),

    /// The substructure pattern does not occur in the reference molecule
    #[error("Pattern '{0}' does not match the reference molecule")]
    NoReferenceMatch(String),

    #[error("Coordinate arrays have different lengths: {0} vs {1}")]
    LengthMismatch(usize, usize),

    #[error("Not enough anchor atoms for alignment (got {0})")]
    TooFewAnchors(usize),

    #[error("Transform produced non-finite coordinates")]
    NonFinite,

    #[error(transparent)]
    Mol(MolError),
}

impl From<MolError> for AlignError {
    fn from(err: MolError) -> Self {
        match err {
            MolError::UnknownName { kind, name } => AlignError::UnknownName { kind, name },
            other => AlignError::Mol(other),
        }
    }
}

/// Result type for alignment operations
pub type AlignResult<T> = Result<T, AlignError>;
