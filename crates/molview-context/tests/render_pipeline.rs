use std::cell::RefCell;

use molview_align::{create_aligner, Aligner, AlignerOptions};
use molview_context::{
    ambient, render_molecule, ImageFormat, MoleculeDisplay, Rasterizer, RenderConfig, RenderContext,
    RenderError, Scope, StructureScale,
};
use molview_mol::{Molecule, QueryPattern};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records what it was asked to draw and emits a stub image
#[derive(Default)]
struct RecordingRasterizer {
    seen: RefCell<Option<(Molecule, MoleculeDisplay)>>,
    fail: bool,
}

impl Rasterizer for RecordingRasterizer {
    fn rasterize(&self, mol: &Molecule, display: &MoleculeDisplay) -> Result<Vec<u8>, RenderError> {
        if self.fail {
            return Err(RenderError::Rasterize("no backend".to_string()));
        }
        *self.seen.borrow_mut() = Some((mol.clone(), display.clone()));
        let bytes = match display.image_format {
            ImageFormat::Svg => format!(
                r#"<?xml version="1.0"?><svg width="{}" height="{}"/>"#,
                display.width, display.height
            )
            .into_bytes(),
            ImageFormat::Png => vec![0x89, b'P', b'N', b'G'],
        };
        Ok(bytes)
    }
}

fn mol(smiles: &str) -> Molecule {
    Molecule::from_smiles(smiles).unwrap()
}

#[test]
fn local_context_renders_svg_from_ambient_format() {
    init_logging();
    let raster = RecordingRasterizer::default();
    let local = RenderContext::local().with_width(320);
    let ambient_ctx = RenderContext::global().with_image_format(ImageFormat::Svg);

    let image = ambient::with_context(ambient_ctx, || {
        render_molecule(&mol("c1ccccc1O phenol"), &local, None, &raster)
    })
    .unwrap()
    .unwrap();

    assert_eq!(image.format, ImageFormat::Svg);
    assert_eq!(image.mime_type(), "image/svg+xml");
    assert_eq!(image.width, 320);
    assert_eq!(image.to_html("phenol"), format!(r#"<svg width="320" height="{}"/>"#, image.height));
}

#[test]
fn png_output_is_embedded_as_data_uri() {
    let raster = RecordingRasterizer::default();
    let image = render_molecule(&mol("CCO"), &RenderContext::global(), None, &raster).unwrap();
    assert_eq!(image.mime_type(), "image/png");
    assert_eq!((image.width, image.height), (200, 200));
    assert!(image.to_html("ethanol").starts_with(r#"<img src="data:image/png;base64,iVBORw=="#));
}

#[test]
fn ambient_callbacks_adjust_the_display() {
    let raster = RecordingRasterizer::default();
    let ambient_ctx =
        RenderContext::global().with_callback(|d: &mut MoleculeDisplay, m: &Molecule| {
            d.bond_width_scaling = true;
            d.title = Some(format!("{} atoms", m.atom_count()));
        });

    ambient::with_context(ambient_ctx, || {
        render_molecule(&mol("CCN amine"), &RenderContext::local(), None, &raster)
    })
    .unwrap()
    .unwrap();

    let (_, display) = raster.seen.borrow().clone().unwrap();
    assert!(display.bond_width_scaling);
    assert_eq!(display.title.as_deref(), Some("3 atoms"));

    // Outside the scope the default global context has no callbacks
    render_molecule(&mol("CCN amine"), &RenderContext::local(), None, &raster).unwrap();
    let (_, display) = raster.seen.borrow().clone().unwrap();
    assert!(!display.bond_width_scaling);
    assert_eq!(display.title.as_deref(), Some("amine"));
}

#[test]
fn alignment_moves_only_the_rendered_copy() {
    init_logging();
    let raster = RecordingRasterizer::default();
    let aligner = create_aligner("c1ccccc1".into(), None, &AlignerOptions::default()).unwrap();
    let target = mol("c1ccccc1CCN");

    render_molecule(&target, &RenderContext::global(), Some(&*aligner), &raster).unwrap();
    assert!(!target.has_depiction());

    let mut expected = target.clone();
    assert!(aligner.apply(&mut expected));
    let (drawn, _) = raster.seen.borrow().clone().unwrap();

    let ring = QueryPattern::parse("c1ccccc1").unwrap();
    for (_, atom) in ring.first_match(&drawn).unwrap() {
        let a = drawn.coord(atom).unwrap();
        let b = expected.coord(atom).unwrap();
        assert!((a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9);
    }
}

#[test]
fn failed_alignment_falls_back_to_plain_depiction() {
    let raster = RecordingRasterizer::default();
    let aligner = create_aligner("C#N".into(), None, &AlignerOptions::default()).unwrap();
    let image = render_molecule(&mol("CCO"), &RenderContext::global(), Some(&*aligner), &raster);
    assert!(image.is_ok());
    let (drawn, _) = raster.seen.borrow().clone().unwrap();
    assert!(drawn.has_depiction());
}

#[test]
fn rasterizer_errors_propagate() {
    let raster = RecordingRasterizer {
        fail: true,
        ..Default::default()
    };
    let err = render_molecule(&mol("CC"), &RenderContext::global(), None, &raster).unwrap_err();
    assert!(matches!(err, RenderError::Rasterize(_)));
}

#[test]
fn copies_do_not_follow_later_ambient_changes() {
    let local = RenderContext::local();
    let copy = ambient::with_context(RenderContext::global().with_width(500), || local.copy())
        .unwrap()
        .unwrap();

    assert_eq!(copy.scope(), Scope::Local);
    assert_eq!(copy.width.get().unwrap(), 500);
    assert_eq!(local.width.get().unwrap(), 0);
}

#[test]
fn configured_context_caps_the_rendered_size() {
    let config = RenderConfig::from_json(r#"{"max_width": 120, "min_width": null}"#).unwrap();
    let ctx = RenderContext::from_config(Scope::Local, &config).unwrap();
    let raster = RecordingRasterizer::default();

    let image = render_molecule(&mol("CCCCCCCCCCCC dodecane"), &ctx, None, &raster).unwrap();
    assert_eq!(image.width, 120);

    let (_, display) = raster.seen.borrow().clone().unwrap();
    assert_eq!(display.requested.height, 0);
    assert_eq!(display.requested.structure_scale, StructureScale::Auto);
}
