//! Display geometry and size solving
//!
//! [`create_molecule_display`] turns a molecule and a [`RenderContext`] into a
//! [`MoleculeDisplay`]: final pixel dimensions plus the style options the
//! rasterizer reads.

use std::borrow::Cow;

use molview_mol::{Molecule, Point2};

use crate::context::{ImageFormat, RenderContext, StructureScale, DEFAULT_STRUCTURE_SCALE};
use crate::error::ContextResult;

/// Padding on every side of the structure, in pixels
pub const MARGIN: f64 = 10.0;

/// Height reserved below the structure for its title, in pixels
pub const TITLE_BAND: f64 = 20.0;

/// The geometry a display was laid out with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRequest {
    /// Pinned width, 0 when derived
    pub width: u32,
    /// Pinned height, 0 when derived
    pub height: u32,
    pub structure_scale: StructureScale,
}

/// A sized depiction, ready to be rasterized
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeDisplay {
    pub requested: DisplayRequest,
    /// Final pixel width
    pub width: u32,
    /// Final pixel height
    pub height: u32,
    /// Pixels per depiction unit
    pub scale: f64,
    pub atom_label_font_scale: f64,
    pub title_font_scale: f64,
    pub bond_width_scaling: bool,
    /// Title text, `None` when titles are hidden or the molecule has none
    pub title: Option<String>,
    pub image_format: ImageFormat,
    /// Depiction bounding box the layout was computed from
    pub bounds: Option<(Point2, Point2)>,
    /// Pixel height reserved for the title
    pub title_band: f64,
}

impl MoleculeDisplay {
    /// Lay out `mol` at the requested geometry; `mol` must already be depicted
    fn layout(
        mol: &Molecule,
        ctx: &RenderContext,
        requested: DisplayRequest,
    ) -> ContextResult<Self> {
        let title_font_scale = ctx.title_font_scale.get()?;
        let title = (ctx.title.get()? && !mol.title.is_empty()).then(|| mol.title.clone());
        let title_band = if title.is_some() { TITLE_BAND * title_font_scale } else { 0.0 };

        let bounds = mol.bounding_box();
        let (extent_x, extent_y) = match bounds {
            Some((lo, hi)) => (hi[0] - lo[0], hi[1] - lo[1]),
            None => (0.0, 0.0),
        };

        let fit_x = fit_scale(requested.width, extent_x, 0.0);
        let fit_y = fit_scale(requested.height, extent_y, title_band);
        let fitted = match (fit_x, fit_y) {
            (Some(sx), Some(sy)) => Some(sx.min(sy)),
            (Some(s), None) | (None, Some(s)) => Some(s),
            (None, None) => None,
        };
        let scale = match (fitted, requested.structure_scale) {
            (Some(fit), StructureScale::Fixed(cap)) => fit.min(cap),
            (Some(fit), StructureScale::Auto) => fit,
            (None, StructureScale::Fixed(s)) => s,
            (None, StructureScale::Auto) => DEFAULT_STRUCTURE_SCALE,
        };

        let width = match requested.width {
            0 => derived_size(extent_x, scale, 0.0),
            w => w,
        };
        let height = match requested.height {
            0 => derived_size(extent_y, scale, title_band),
            h => h,
        };

        Ok(MoleculeDisplay {
            requested,
            width,
            height,
            scale,
            atom_label_font_scale: ctx.atom_label_font_scale.get()?,
            title_font_scale,
            bond_width_scaling: ctx.bond_width_scaling.get()?,
            title,
            image_format: ctx.image_format.get()?,
            bounds,
            title_band,
        })
    }

    /// Map a depiction coordinate to pixel space, y pointing down
    pub fn to_pixel(&self, point: Point2) -> Point2 {
        let (cx, cy) = match self.bounds {
            Some((lo, hi)) => ((lo[0] + hi[0]) / 2.0, (lo[1] + hi[1]) / 2.0),
            None => (0.0, 0.0),
        };
        let drawing_height = self.height as f64 - self.title_band;
        [
            self.width as f64 / 2.0 + (point[0] - cx) * self.scale,
            drawing_height / 2.0 - (point[1] - cy) * self.scale,
        ]
    }
}

/// Scale that fits `extent` depiction units into a pinned pixel size
fn fit_scale(pinned: u32, extent: f64, reserved: f64) -> Option<f64> {
    if pinned == 0 || extent <= f64::EPSILON {
        return None;
    }
    let available = (pinned as f64 - 2.0 * MARGIN - reserved).max(1.0);
    Some(available / extent)
}

fn derived_size(extent: f64, scale: f64, reserved: f64) -> u32 {
    (extent * scale + 2.0 * MARGIN + reserved).ceil() as u32
}

fn request_of(ctx: &RenderContext) -> ContextResult<DisplayRequest> {
    Ok(DisplayRequest {
        width: ctx.width.get()?,
        height: ctx.height.get()?,
        structure_scale: ctx.structure_scale.get()?,
    })
}

/// Compute the display of `mol` under `ctx`, honoring min and max sizes
///
/// `min_width`/`min_height` override the context's minimums when given.
/// The caller's context is never modified; every correction works on a copy.
pub fn create_molecule_display(
    mol: &Molecule,
    ctx: &RenderContext,
    min_width: Option<u32>,
    min_height: Option<u32>,
) -> ContextResult<MoleculeDisplay> {
    let mol = if mol.has_depiction() {
        Cow::Borrowed(mol)
    } else {
        let mut prepared = mol.clone();
        prepared.prepare_depiction();
        Cow::Owned(prepared)
    };

    let mut work = ctx.copy()?;
    let mut display = MoleculeDisplay::layout(&mol, &work, request_of(&work)?)?;

    // Min pass: grow unpinned axes that came out too small
    let min_width = match min_width {
        Some(m) => Some(m),
        None => work.min_width.get()?,
    };
    let min_height = match min_height {
        Some(m) => Some(m),
        None => work.min_height.get()?,
    };

    let mut grown = false;
    if let Some(min) = min_width {
        if display.requested.width == 0 && display.width < min {
            log::debug!("Display width {} below minimum {}, pinning", display.width, min);
            work.width.set_value(min);
            grown = true;
        }
    }
    if let Some(min) = min_height {
        if display.requested.height == 0 && display.height < min {
            log::debug!("Display height {} below minimum {}, pinning", display.height, min);
            work.height.set_value(min);
            grown = true;
        }
    }
    if grown {
        display = MoleculeDisplay::layout(&mol, &work, request_of(&work)?)?;
    }

    // Max pass: pin the most violated axis and let the other follow
    let over_x = overshoot(display.width, work.max_width.get()?);
    let over_y = overshoot(display.height, work.max_height.get()?);
    let pin_width = match (over_x, over_y) {
        (None, None) => return Ok(display),
        (Some(rx), Some(ry)) => rx >= ry,
        (Some(_), None) => true,
        (None, Some(_)) => false,
    };

    let mut capped = work.clone();
    if pin_width {
        let max = work.max_width.get()?.unwrap_or(display.width);
        log::debug!("Display width {} above maximum {}, pinning", display.width, max);
        capped.width.set_value(max);
        capped.height.set_value(0);
    } else {
        let max = work.max_height.get()?.unwrap_or(display.height);
        log::debug!("Display height {} above maximum {}, pinning", display.height, max);
        capped.height.set_value(max);
        capped.width.set_value(0);
    }
    capped.structure_scale.set_value(StructureScale::Auto);

    // TODO: re-check the unpinned axis against its own maximum; a single
    // correction can leave it oversized when both axes overshoot at different ratios
    MoleculeDisplay::layout(&mol, &capped, request_of(&capped)?)
}

/// Ratio by which `size` exceeds `max`; a max of 0 means no limit
fn overshoot(size: u32, max: Option<u32>) -> Option<f64> {
    match max {
        Some(max) if max > 0 && size > max => Some(size as f64 / max as f64),
        _ => None,
    }
}
