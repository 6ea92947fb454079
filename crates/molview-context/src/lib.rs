//! Render contexts and depiction sizing for molview
//!
//! - [`RenderContext`] - every rendering option, each a [`DeferredValue`]
//! - [`ambient`] - the per-thread global context deferred values resolve against
//! - [`create_molecule_display`] - pixel geometry under min/max constraints
//! - [`RenderConfig`] - JSON-loadable context overrides
//! - [`render_molecule`] - align, size, run callbacks and rasterize
//!
//! # Example
//!
//! ```rust
//! use molview_context::{ambient, create_molecule_display, RenderContext};
//! use molview_mol::Molecule;
//!
//! let mol = Molecule::from_smiles("c1ccccc1O phenol").unwrap();
//! let local = RenderContext::local().with_height(150);
//!
//! let display = ambient::with_context(RenderContext::global().with_width(300), || {
//!     create_molecule_display(&mol, &local, None, None)
//! })
//! .unwrap()
//! .unwrap();
//! assert_eq!((display.width, display.height), (300, 150));
//! ```

pub mod ambient;
mod callback;
mod config;
mod context;
mod deferred;
mod display;
mod error;
mod render;

pub use callback::{CallbackList, DisplayCallback};
pub use config::RenderConfig;
pub use context::{
    ImageFormat, RenderContext, Scope, StructureScale, DEFAULT_MIN_SIZE, DEFAULT_SCALE,
    DEFAULT_STRUCTURE_SCALE, FIELD_NAMES,
};
pub use deferred::{ContextValue, DeferredValue, FieldValue, Setting};
pub use display::{create_molecule_display, DisplayRequest, MoleculeDisplay, MARGIN, TITLE_BAND};
pub use error::{ContextError, ContextResult, RenderError};
pub use render::{render_molecule, Rasterizer, RenderedImage};
