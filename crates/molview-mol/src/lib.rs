//! molview chemical graph model
//!
//! This crate provides the small molecular graph that the molview depiction
//! pipeline works on:
//!
//! - [`Molecule`] - atoms, bonds, optional 2D depiction coordinates and a title
//! - [`Molecule::from_smiles`] - a SMILES subset parser
//! - [`QueryPattern`] - SMARTS-style substructure queries
//! - [`McsSearch`] - maximum common substructure search
//! - [`RingInfo`] - ring perception
//! - [`Molecule::prepare_depiction`] - deterministic 2D layout
//!
//! Chemistry is kept to what depiction and alignment need; there is no
//! stereo perception, kekulization or valence validation.
//!
//! # Example
//!
//! ```rust
//! use molview_mol::{Molecule, QueryPattern};
//!
//! let mut mol = Molecule::from_smiles("c1ccccc1CCO phenethyl alcohol").unwrap();
//! mol.prepare_depiction();
//!
//! let ring = QueryPattern::parse("c1ccccc1").unwrap();
//! assert!(ring.has_match(&mol));
//! assert_eq!(mol.title, "phenethyl alcohol");
//! ```

mod atom;
mod bond;
mod depict;
mod element;
mod error;
mod index;
mod mcs;
mod molecule;
mod pattern;
mod rings;
mod smiles;

pub use atom::Atom;
pub use bond::{Bond, BondOrder};
pub use depict::BOND_LENGTH;
pub use element::Element;
pub use error::{MolError, MolResult};
pub use index::{AtomIndex, BondIndex};
pub use mcs::{McsMatch, McsScoring, McsSearch, DEFAULT_MAX_STEPS};
pub use molecule::{Molecule, Point2};
pub use pattern::{AtomMatch, QueryPattern};
pub use rings::RingInfo;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::{
        AtomIndex, BondOrder, Element, McsScoring, McsSearch, MolError, MolResult, Molecule,
        Point2, QueryPattern,
    };
}
