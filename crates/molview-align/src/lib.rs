//! Depiction alignment for molview
//!
//! Aligners move a molecule's 2D depiction so that it lines up with a
//! reference. Three strategies are provided:
//!
//! - [`SubstructureAligner`] - atoms matching a pattern take the template coordinates
//! - [`McsAligner`] - atoms in the maximum common substructure are aligned
//! - [`FingerprintAligner`] - similar molecules are aligned on shared fingerprint features
//!
//! [`create_aligner`] picks the strategy for a [`ReferenceKind`] and an
//! optional method name. The [`fingerprint`] module holds the fingerprint
//! configuration used by the last strategy.
//!
//! # Example
//!
//! ```rust
//! use molview_align::{create_aligner, AlignerOptions, Aligner};
//! use molview_mol::Molecule;
//!
//! let aligner = create_aligner("c1ccccc1".into(), None, &AlignerOptions::default()).unwrap();
//! let mut mol = Molecule::from_smiles("Oc1ccccc1").unwrap();
//! assert!(aligner.apply(&mut mol));
//! assert!(mol.has_depiction());
//! ```

mod aligner;
mod error;
mod factory;
pub mod fingerprint;
mod mcs;
mod overlap;
mod substructure;
mod superpose;

pub use aligner::{AlignMethod, Aligner};
pub use error::{AlignError, AlignResult};
pub use factory::{create_aligner, AlignerOptions, ReferenceKind};
pub use fingerprint::{make_fingerprint_fn, Fingerprint, FingerprintKind, FingerprintSpec};
pub use mcs::McsAligner;
pub use overlap::{FingerprintAligner, DEFAULT_THRESHOLD};
pub use substructure::SubstructureAligner;
pub use superpose::{align_to_anchors, fit_rigid_2d, AnchorFit, Fit2D, Transform2D};
