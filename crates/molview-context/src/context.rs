//! Render contexts
//!
//! A [`RenderContext`] bundles every option that controls how a structure is
//! depicted. Each option is a [`DeferredValue`]: a *global* context holds
//! concrete defaults, a *local* context starts with every option deferred to
//! the ambient global context and overrides only what the caller sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ambient;
use crate::callback::{CallbackList, DisplayCallback};
use crate::deferred::{DeferredValue, FieldValue, Setting};
use crate::error::{ContextError, ContextResult};

/// Base pixels per depiction unit
pub const DEFAULT_SCALE: f64 = 50.0;

/// Structure scale of the built-in global context
pub const DEFAULT_STRUCTURE_SCALE: f64 = DEFAULT_SCALE * 0.6;

/// Minimum width and height of the built-in global context
pub const DEFAULT_MIN_SIZE: u32 = 200;

/// Names of all context fields, in declaration order
pub const FIELD_NAMES: [&str; 13] = [
    "width",
    "height",
    "min_width",
    "min_height",
    "max_width",
    "max_height",
    "structure_scale",
    "atom_label_font_scale",
    "title_font_scale",
    "image_format",
    "bond_width_scaling",
    "title",
    "callbacks",
];

/// Whether a context holds defaults or per-call overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Local,
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => f.write_str("local"),
            Scope::Global => f.write_str("global"),
        }
    }
}

/// Pixels per depiction unit, or `Auto` to derive it from a pinned dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StructureScale {
    Auto,
    Fixed(f64),
}

impl Default for StructureScale {
    fn default() -> Self {
        StructureScale::Fixed(DEFAULT_STRUCTURE_SCALE)
    }
}

impl StructureScale {
    #[inline]
    pub fn is_auto(&self) -> bool {
        matches!(self, StructureScale::Auto)
    }
}

impl fmt::Display for StructureScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureScale::Auto => f.write_str("auto"),
            StructureScale::Fixed(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for StructureScale {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(StructureScale::Auto);
        }
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(StructureScale::Fixed)
            .ok_or_else(|| ContextError::InvalidValue {
                field: "structure_scale".to_string(),
                reason: format!("expected 'auto' or a positive number, got '{}'", s),
            })
    }
}

// Serialized as the string "auto" or a bare number
impl Serialize for StructureScale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StructureScale::Auto => serializer.serialize_str("auto"),
            StructureScale::Fixed(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for StructureScale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Fixed(f64),
            Named(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Fixed(v) => Ok(StructureScale::Fixed(v)),
            Repr::Named(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            _ => Err(ContextError::InvalidValue {
                field: "image_format".to_string(),
                reason: format!("expected 'png' or 'svg', got '{}'", s.trim()),
            }),
        }
    }
}

/// Every option that controls a depiction
#[derive(Debug, Clone)]
pub struct RenderContext {
    scope: Scope,
    /// Pixel width; 0 lets it follow from the structure
    pub width: DeferredValue<u32>,
    /// Pixel height; 0 lets it follow from the structure
    pub height: DeferredValue<u32>,
    pub min_width: DeferredValue<Option<u32>>,
    pub min_height: DeferredValue<Option<u32>>,
    pub max_width: DeferredValue<Option<u32>>,
    pub max_height: DeferredValue<Option<u32>>,
    pub structure_scale: DeferredValue<StructureScale>,
    pub atom_label_font_scale: DeferredValue<f64>,
    pub title_font_scale: DeferredValue<f64>,
    pub image_format: DeferredValue<ImageFormat>,
    pub bond_width_scaling: DeferredValue<bool>,
    /// Whether the structure title is drawn
    pub title: DeferredValue<bool>,
    pub callbacks: DeferredValue<CallbackList>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::global()
    }
}

impl RenderContext {
    /// A global context holds concrete defaults, a local one defers everything
    pub fn new(scope: Scope) -> Self {
        match scope {
            Scope::Global => RenderContext {
                scope,
                width: DeferredValue::new("width", 0u32),
                height: DeferredValue::new("height", 0u32),
                min_width: DeferredValue::new("min_width", Some(DEFAULT_MIN_SIZE)),
                min_height: DeferredValue::new("min_height", Some(DEFAULT_MIN_SIZE)),
                max_width: DeferredValue::new("max_width", Setting::Value(None)),
                max_height: DeferredValue::new("max_height", Setting::Value(None)),
                structure_scale: DeferredValue::new("structure_scale", StructureScale::default()),
                atom_label_font_scale: DeferredValue::new("atom_label_font_scale", 1.0f64),
                title_font_scale: DeferredValue::new("title_font_scale", 1.0f64),
                image_format: DeferredValue::new("image_format", ImageFormat::Png),
                bond_width_scaling: DeferredValue::new("bond_width_scaling", false),
                title: DeferredValue::new("title", true),
                callbacks: DeferredValue::new("callbacks", CallbackList::new()),
            },
            Scope::Local => RenderContext {
                scope,
                width: DeferredValue::deferred("width"),
                height: DeferredValue::deferred("height"),
                min_width: DeferredValue::deferred("min_width"),
                min_height: DeferredValue::deferred("min_height"),
                max_width: DeferredValue::deferred("max_width"),
                max_height: DeferredValue::deferred("max_height"),
                structure_scale: DeferredValue::deferred("structure_scale"),
                atom_label_font_scale: DeferredValue::deferred("atom_label_font_scale"),
                title_font_scale: DeferredValue::deferred("title_font_scale"),
                image_format: DeferredValue::deferred("image_format"),
                bond_width_scaling: DeferredValue::deferred("bond_width_scaling"),
                title: DeferredValue::deferred("title"),
                callbacks: DeferredValue::deferred("callbacks"),
            },
        }
    }

    /// A context holding the built-in defaults
    pub fn global() -> Self {
        Self::new(Scope::Global)
    }

    /// A context that defers every option
    pub fn local() -> Self {
        Self::new(Scope::Local)
    }

    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    // =========================================================================
    // Builder
    // =========================================================================

    pub fn with_width(mut self, width: u32) -> Self {
        self.width.set_value(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height.set_value(height);
        self
    }

    pub fn with_min_width(mut self, min_width: Option<u32>) -> Self {
        self.min_width.set_value(min_width);
        self
    }

    pub fn with_min_height(mut self, min_height: Option<u32>) -> Self {
        self.min_height.set_value(min_height);
        self
    }

    pub fn with_max_width(mut self, max_width: Option<u32>) -> Self {
        self.max_width.set_value(max_width);
        self
    }

    pub fn with_max_height(mut self, max_height: Option<u32>) -> Self {
        self.max_height.set_value(max_height);
        self
    }

    pub fn with_structure_scale(mut self, scale: StructureScale) -> Self {
        self.structure_scale.set_value(scale);
        self
    }

    pub fn with_atom_label_font_scale(mut self, scale: f64) -> Self {
        self.atom_label_font_scale.set_value(scale);
        self
    }

    pub fn with_title_font_scale(mut self, scale: f64) -> Self {
        self.title_font_scale.set_value(scale);
        self
    }

    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format.set_value(format);
        self
    }

    pub fn with_bond_width_scaling(mut self, enabled: bool) -> Self {
        self.bond_width_scaling.set_value(enabled);
        self
    }

    pub fn with_title(mut self, show: bool) -> Self {
        self.title.set_value(show);
        self
    }

    pub fn with_callbacks(mut self, callbacks: CallbackList) -> Self {
        self.callbacks.set_value(callbacks);
        self
    }

    /// Append a callback; a deferred callback list starts out empty
    pub fn with_callback(mut self, callback: impl DisplayCallback + 'static) -> Self {
        let mut list = self.callbacks.setting().value().cloned().unwrap_or_default();
        list.push(callback);
        self.callbacks.set_value(list);
        self
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// The raw setting of a field by name
    pub fn lookup(&self, name: &str) -> ContextResult<Setting<FieldValue>> {
        let field = match name {
            "width" => self.width.field(),
            "height" => self.height.field(),
            "min_width" => self.min_width.field(),
            "min_height" => self.min_height.field(),
            "max_width" => self.max_width.field(),
            "max_height" => self.max_height.field(),
            "structure_scale" => self.structure_scale.field(),
            "atom_label_font_scale" => self.atom_label_font_scale.field(),
            "title_font_scale" => self.title_font_scale.field(),
            "image_format" => self.image_format.field(),
            "bond_width_scaling" => self.bond_width_scaling.field(),
            "title" => self.title.field(),
            "callbacks" => self.callbacks.field(),
            _ => return Err(ContextError::MissingField(name.to_string())),
        };
        Ok(field)
    }

    /// A local copy holding this context's values resolved against the ambient context
    pub fn copy(&self) -> ContextResult<RenderContext> {
        self.copy_in(&ambient::current())
    }

    /// A local copy holding this context's values resolved against `ambient`
    ///
    /// The copy never defers, so later changes to `ambient` do not reach it.
    pub fn copy_in(&self, ambient: &RenderContext) -> ContextResult<RenderContext> {
        Ok(RenderContext {
            scope: Scope::Local,
            width: resolved(&self.width, ambient)?,
            height: resolved(&self.height, ambient)?,
            min_width: resolved(&self.min_width, ambient)?,
            min_height: resolved(&self.min_height, ambient)?,
            max_width: resolved(&self.max_width, ambient)?,
            max_height: resolved(&self.max_height, ambient)?,
            structure_scale: resolved(&self.structure_scale, ambient)?,
            atom_label_font_scale: resolved(&self.atom_label_font_scale, ambient)?,
            title_font_scale: resolved(&self.title_font_scale, ambient)?,
            image_format: resolved(&self.image_format, ambient)?,
            bond_width_scaling: resolved(&self.bond_width_scaling, ambient)?,
            title: resolved(&self.title, ambient)?,
            callbacks: resolved(&self.callbacks, ambient)?,
        })
    }

    /// MIME type of the configured image format
    pub fn mime_type(&self) -> ContextResult<&'static str> {
        Ok(self.image_format.get()?.mime_type())
    }

    /// Restore every field to its construction-time setting
    pub fn reset(&mut self) {
        self.width.reset();
        self.height.reset();
        self.min_width.reset();
        self.min_height.reset();
        self.max_width.reset();
        self.max_height.reset();
        self.structure_scale.reset();
        self.atom_label_font_scale.reset();
        self.title_font_scale.reset();
        self.image_format.reset();
        self.bond_width_scaling.reset();
        self.title.reset();
        self.callbacks.reset();
    }
}

fn resolved<T: crate::deferred::ContextValue>(
    cell: &DeferredValue<T>,
    ambient: &RenderContext,
) -> ContextResult<DeferredValue<T>> {
    Ok(DeferredValue::new(cell.name(), cell.get_in(ambient)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes() {
        let global = RenderContext::global();
        assert_eq!(global.scope(), Scope::Global);
        for name in FIELD_NAMES {
            assert!(!global.lookup(name).unwrap().is_deferred(), "{}", name);
        }

        let local = RenderContext::local();
        assert_eq!(local.scope(), Scope::Local);
        for name in FIELD_NAMES {
            assert!(local.lookup(name).unwrap().is_deferred(), "{}", name);
        }
    }

    #[test]
    fn test_global_defaults() {
        let ctx = RenderContext::global();
        assert_eq!(ctx.width.get().unwrap(), 0);
        assert_eq!(ctx.min_width.get().unwrap(), Some(200));
        assert_eq!(ctx.max_height.get().unwrap(), None);
        assert_eq!(
            ctx.structure_scale.get().unwrap(),
            StructureScale::Fixed(30.0)
        );
        assert_eq!(ctx.mime_type().unwrap(), "image/png");
        assert!(ctx.callbacks.get().unwrap().is_empty());
    }

    #[test]
    fn test_copy_resolves_and_localizes() {
        let ambient = RenderContext::global().with_width(500).with_image_format(ImageFormat::Svg);
        let local = RenderContext::local().with_height(250);
        let copy = local.copy_in(&ambient).unwrap();

        assert_eq!(copy.scope(), Scope::Local);
        assert_eq!(copy.width.setting(), &Setting::Value(500));
        assert_eq!(copy.height.setting(), &Setting::Value(250));
        assert_eq!(copy.mime_type().unwrap(), "image/svg+xml");
        for name in FIELD_NAMES {
            assert!(!copy.lookup(name).unwrap().is_deferred(), "{}", name);
        }
    }

    #[test]
    fn test_copy_never_shares_callback_list() {
        let source = RenderContext::global().with_callback(
            |d: &mut crate::MoleculeDisplay, _: &molview_mol::Molecule| {
                d.title = None;
            },
        );
        let mut copy = source.copy_in(&RenderContext::global()).unwrap();

        let original = source.callbacks.get().unwrap();
        let mut copied = copy.callbacks.get().unwrap();
        assert!(!original.same_list(&copied));

        copied.push(|_: &mut crate::MoleculeDisplay, _: &molview_mol::Molecule| {});
        copy.callbacks.set_value(copied);
        assert_eq!(source.callbacks.get().unwrap().len(), 1);
        assert_eq!(copy.callbacks.get().unwrap().len(), 2);
    }

    #[test]
    fn test_reset_context() {
        let mut ctx = RenderContext::local().with_width(10).with_title(false);
        ctx.reset();
        assert!(ctx.width.is_deferred());
        assert!(ctx.title.is_deferred());
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("SVG".parse::<ImageFormat>().unwrap(), ImageFormat::Svg);
        assert!("gif".parse::<ImageFormat>().is_err());
        assert_eq!("auto".parse::<StructureScale>().unwrap(), StructureScale::Auto);
        assert_eq!("12.5".parse::<StructureScale>().unwrap(), StructureScale::Fixed(12.5));
        assert!("-1".parse::<StructureScale>().is_err());
    }
}
