//! Serializable render configuration
//!
//! [`RenderConfig`] mirrors every serializable [`RenderContext`] field as an
//! optional value. An absent key leaves the field alone; for the size bounds
//! an explicit `null` sets "no constraint".
//!
//! ```json
//! { "width": 400, "max_height": null, "structure_scale": "auto", "image_format": "svg" }
//! ```

use serde::{Deserialize, Serialize};

use crate::context::{ImageFormat, RenderContext, Scope, StructureScale};
use crate::error::{ContextError, ContextResult};

/// Optional overrides for a render context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(with = "nullable", skip_serializing_if = "Option::is_none")]
    pub min_width: Option<Option<u32>>,
    #[serde(with = "nullable", skip_serializing_if = "Option::is_none")]
    pub min_height: Option<Option<u32>>,
    #[serde(with = "nullable", skip_serializing_if = "Option::is_none")]
    pub max_width: Option<Option<u32>>,
    #[serde(with = "nullable", skip_serializing_if = "Option::is_none")]
    pub max_height: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_scale: Option<StructureScale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_label_font_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_font_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_format: Option<ImageFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bond_width_scaling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<bool>,
}

impl RenderConfig {
    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> ContextResult<Self> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ContextResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject values no context field may hold
    pub fn validate(&self) -> ContextResult<()> {
        if let Some(StructureScale::Fixed(scale)) = self.structure_scale {
            check_positive("structure_scale", scale)?;
        }
        if let Some(scale) = self.atom_label_font_scale {
            check_positive("atom_label_font_scale", scale)?;
        }
        if let Some(scale) = self.title_font_scale {
            check_positive("title_font_scale", scale)?;
        }
        Ok(())
    }

    /// Write every present option into `ctx`
    pub fn apply(&self, ctx: &mut RenderContext) {
        if let Some(v) = self.width {
            ctx.width.set_value(v);
        }
        if let Some(v) = self.height {
            ctx.height.set_value(v);
        }
        if let Some(v) = self.min_width {
            ctx.min_width.set_value(v);
        }
        if let Some(v) = self.min_height {
            ctx.min_height.set_value(v);
        }
        if let Some(v) = self.max_width {
            ctx.max_width.set_value(v);
        }
        if let Some(v) = self.max_height {
            ctx.max_height.set_value(v);
        }
        if let Some(v) = self.structure_scale {
            ctx.structure_scale.set_value(v);
        }
        if let Some(v) = self.atom_label_font_scale {
            ctx.atom_label_font_scale.set_value(v);
        }
        if let Some(v) = self.title_font_scale {
            ctx.title_font_scale.set_value(v);
        }
        if let Some(v) = self.image_format {
            ctx.image_format.set_value(v);
        }
        if let Some(v) = self.bond_width_scaling {
            ctx.bond_width_scaling.set_value(v);
        }
        if let Some(v) = self.title {
            ctx.title.set_value(v);
        }
    }
}

impl RenderContext {
    /// A context of `scope` with `config` applied on top of its defaults
    pub fn from_config(scope: Scope, config: &RenderConfig) -> ContextResult<Self> {
        config.validate()?;
        let mut ctx = RenderContext::new(scope);
        config.apply(&mut ctx);
        Ok(ctx)
    }
}

fn check_positive(field: &str, value: f64) -> ContextResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ContextError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a positive number, got {}", value),
        })
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`)
mod nullable {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::Setting;

    #[test]
    fn test_null_and_absent_bounds() {
        let config = RenderConfig::from_json(r#"{"max_width": null, "min_height": 120}"#).unwrap();
        assert_eq!(config.max_width, Some(None));
        assert_eq!(config.min_height, Some(Some(120)));
        assert_eq!(config.max_height, None);

        let ctx = RenderContext::from_config(Scope::Local, &config).unwrap();
        assert_eq!(ctx.max_width.setting(), &Setting::Value(None));
        assert_eq!(ctx.min_height.setting(), &Setting::Value(Some(120)));
        assert!(ctx.max_height.is_deferred());
        assert!(ctx.width.is_deferred());
    }

    #[test]
    fn test_scale_and_format() {
        let json = r#"{"structure_scale": "auto", "image_format": "svg"}"#;
        let config = RenderConfig::from_json(json).unwrap();
        assert_eq!(config.structure_scale, Some(StructureScale::Auto));
        assert_eq!(config.image_format, Some(ImageFormat::Svg));

        let config = RenderConfig::from_json(r#"{"structure_scale": 12.5}"#).unwrap();
        assert_eq!(config.structure_scale, Some(StructureScale::Fixed(12.5)));

        let ctx = RenderContext::from_config(Scope::Global, &config).unwrap();
        assert_eq!(ctx.structure_scale.get_in(&ctx).unwrap(), StructureScale::Fixed(12.5));
        assert_eq!(ctx.width.get_in(&ctx).unwrap(), 0);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            RenderConfig::from_json(r#"{"depth": 3}"#),
            Err(ContextError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_json(r#"{"image_format": "gif"}"#),
            Err(ContextError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_json(r#"{"title_font_scale": 0}"#),
            Err(ContextError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_json_keeps_explicit_null() {
        let config = RenderConfig {
            width: Some(300),
            max_height: Some(None),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(json, r#"{"width":300,"max_height":null}"#);
        assert_eq!(RenderConfig::from_json(&json).unwrap(), config);
    }
}
