//! Error types for molecular operations

use thiserror::Error;

/// Errors that can occur when building or querying molecules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MolError {
    /// Atom index is out of bounds
    #[error("Atom index {0} is out of bounds (max: {1})")]
    AtomIndexOutOfBounds(u32, usize),

    /// Coordinate count doesn't match atom count
    #[error("Coordinate count mismatch: expected {expected}, got {actual}")]
    CoordinateMismatch { expected: usize, actual: usize },

    /// Invalid bond (self-loop or duplicate)
    #[error("Invalid bond: atom1={0}, atom2={1}")]
    InvalidBond(u32, u32),

    /// SMILES or pattern text could not be parsed
    #[error("Parse error at position {position}: {reason}")]
    Parse { position: usize, reason: String },

    /// A name did not resolve to any known option
    #[error("Unknown {kind} name: '{name}'")]
    UnknownName { kind: &'static str, name: String },
}

impl MolError {
    /// Create a parse error at the given input position
    pub fn parse(position: usize, reason: impl Into<String>) -> Self {
        MolError::Parse {
            position,
            reason: reason.into(),
        }
    }

    /// Create an atom out of bounds error
    pub fn atom_out_of_bounds(index: u32, max: usize) -> Self {
        MolError::AtomIndexOutOfBounds(index, max)
    }
}

/// Result type for molecular operations
pub type MolResult<T> = Result<T, MolError>;
