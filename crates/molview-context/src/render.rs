//! Render pipeline
//!
//! Align (optional), size, run callbacks, rasterize. The rasterizer itself is
//! supplied by the caller through the [`Rasterizer`] trait.

use base64::{engine::general_purpose, Engine as _};
use molview_align::Aligner;
use molview_mol::Molecule;

use crate::context::{ImageFormat, RenderContext};
use crate::display::{create_molecule_display, MoleculeDisplay};
use crate::error::RenderError;

/// Turns a sized display into image bytes
pub trait Rasterizer {
    fn rasterize(&self, mol: &Molecule, display: &MoleculeDisplay) -> Result<Vec<u8>, RenderError>;
}

/// Encoded image bytes with their geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RenderedImage {
    #[inline]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `data:` URI with the image base64-encoded
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// HTML fragment embedding the image
    ///
    /// PNG becomes an `<img>` tag with a data URI, SVG is inlined without its
    /// XML declaration.
    pub fn to_html(&self, alt: &str) -> String {
        match self.format {
            ImageFormat::Png => format!(
                r#"<img src="{}" width="{}" height="{}" alt="{}"/>"#,
                self.data_uri(),
                self.width,
                self.height,
                escape_html(alt)
            ),
            ImageFormat::Svg => {
                let markup = String::from_utf8_lossy(&self.data);
                strip_xml_declaration(&markup).to_string()
            }
        }
    }
}

fn strip_xml_declaration(markup: &str) -> &str {
    let trimmed = markup.trim_start();
    match trimmed.strip_prefix("<?xml") {
        Some(rest) => match rest.find("?>") {
            Some(end) => rest[end + 2..].trim_start(),
            None => trimmed,
        },
        None => trimmed,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render `mol` under `ctx`
///
/// The molecule is copied; the caller's coordinates are never touched. A
/// failed or skipped alignment falls back to the plain depiction.
pub fn render_molecule(
    mol: &Molecule,
    ctx: &RenderContext,
    aligner: Option<&dyn Aligner>,
    rasterizer: &dyn Rasterizer,
) -> Result<RenderedImage, RenderError> {
    let mut mol = mol.clone();
    if let Some(aligner) = aligner {
        aligner.apply(&mut mol);
    }
    mol.prepare_depiction();

    let mut display = create_molecule_display(&mol, ctx, None, None)?;
    ctx.callbacks.get()?.apply_all(&mut display, &mol);

    let data = rasterizer.rasterize(&mol, &display)?;
    Ok(RenderedImage {
        format: display.image_format,
        width: display.width,
        height: display.height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(format: ImageFormat, data: &[u8]) -> RenderedImage {
        RenderedImage {
            format,
            width: 4,
            height: 3,
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_png_html() {
        let html = image(ImageFormat::Png, b"abc").to_html("R&D <mol>");
        let expected = concat!(
            r#"<img src="data:image/png;base64,YWJj" width="4" height="3" "#,
            r#"alt="R&amp;D &lt;mol&gt;"/>"#
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_svg_html_drops_declaration() {
        let svg = br#"<?xml version="1.0" encoding="UTF-8"?>
<svg width="4" height="3"></svg>"#;
        let img = image(ImageFormat::Svg, svg);
        assert_eq!(img.to_html("ignored"), r#"<svg width="4" height="3"></svg>"#);
        assert_eq!(img.mime_type(), "image/svg+xml");

        let bare = image(ImageFormat::Svg, b"<svg/>");
        assert_eq!(bare.to_html(""), "<svg/>");
    }
}
