use molview_align::fingerprint::{atom_mask, AtomFeatures};
use molview_align::{
    create_aligner, make_fingerprint_fn, AlignError, Aligner, AlignerOptions, FingerprintAligner,
    FingerprintKind, FingerprintSpec, ReferenceKind,
};
use molview_mol::{AtomIndex, Molecule, Point2, QueryPattern};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mol(smiles: &str) -> Molecule {
    Molecule::from_smiles(smiles).unwrap()
}

fn close(a: Point2, b: Point2) -> bool {
    (a[0] - b[0]).abs() < 1e-6 && (a[1] - b[1]).abs() < 1e-6
}

#[test]
fn ring_pattern_aligns_every_match_onto_the_same_template() {
    init_logging();
    let aligner = create_aligner("c1ccccc1".into(), None, &AlignerOptions::default()).unwrap();
    let ring = QueryPattern::parse("c1ccccc1").unwrap();

    let mut first = mol("OCc1ccccc1 benzyl alcohol");
    let mut second = mol("c1ccccc1C(=O)N benzamide");
    for target in [&mut first, &mut second] {
        assert!(aligner.validate(target));
        assert!(aligner.align(target));
    }

    // Both rings occupy the same set of positions
    let positions = |m: &Molecule| -> Vec<Point2> {
        let found = ring.first_match(m).unwrap();
        found.iter().map(|&(_, t)| m.coord(t).unwrap()).collect()
    };
    let a = positions(&first);
    let b = positions(&second);
    for p in &a {
        assert!(b.iter().any(|&q| close(*p, q)), "{:?} has no partner", p);
    }
}

#[test]
fn reference_molecule_fixes_substructure_coordinates() {
    init_logging();
    let mut reference = mol("c1ccc2ccccc2c1");
    reference.generate_depiction();
    let shifted: Vec<Point2> = reference
        .coords()
        .unwrap()
        .iter()
        .map(|p| [p[0] + 20.0, p[1] - 7.0])
        .collect();
    reference.set_coords(shifted).unwrap();

    let options = AlignerOptions {
        pattern: Some("c1ccccc1".to_string()),
        ..Default::default()
    };
    let aligner = create_aligner(reference.clone().into(), Some("ss"), &options).unwrap();

    let mut target = mol("Cc1ccccc1");
    assert!(aligner.apply(&mut target));
    let ring = QueryPattern::parse("c1ccccc1").unwrap();
    for (_, t) in ring.first_match(&target).unwrap() {
        let p = target.coord(t).unwrap();
        assert!(
            reference.coords().unwrap().iter().any(|&q| close(p, q)),
            "{:?} is not a reference position",
            p
        );
    }
}

#[test]
fn mcs_alignment_respects_min_atoms() {
    init_logging();
    let options = AlignerOptions {
        min_atoms: 7,
        ..Default::default()
    };
    let aligner = create_aligner(mol("c1ccccc1CCN").into(), Some("mcs"), &options).unwrap();
    let mut small = mol("c1ccccc1");
    assert!(!aligner.apply(&mut small));
    let mut big = mol("c1ccccc1CCC");
    assert!(aligner.apply(&mut big));
}

#[test]
fn fingerprint_threshold_boundary() {
    init_logging();
    let reference = mol("c1ccccc1CCO");
    let probe = mol("c1ccccc1CCCO");
    let spec = FingerprintSpec::for_kind(FingerprintKind::Path);
    let maker = make_fingerprint_fn(spec).unwrap();
    let similarity = {
        use molview_align::fingerprint::FingerprintFn;
        maker.fingerprint(&reference).tanimoto(&maker.fingerprint(&probe))
    };
    assert!(similarity > 0.0 && similarity < 1.0);

    let options = AlignerOptions {
        threshold: similarity,
        fingerprint: spec,
        ..Default::default()
    };
    let aligner = create_aligner(reference.into(), Some("fp"), &options).unwrap();
    let mut target = probe.clone();
    assert!(aligner.validate(&target));
    assert!(aligner.apply(&mut target));
}

#[test]
fn invalid_reference_gives_inert_aligner() {
    init_logging();
    let aligner =
        FingerprintAligner::new(&Molecule::new("nothing"), 0.0, FingerprintSpec::default())
            .unwrap();
    let mut target = mol("c1ccccc1");
    target.prepare_depiction();
    let before = target.coords().unwrap().to_vec();
    assert!(!aligner.apply(&mut target));
    assert_eq!(target.coords().unwrap(), before.as_slice());
}

#[test]
fn custom_masks_change_similarity() {
    let coarse = FingerprintSpec::for_kind(FingerprintKind::Path)
        .with_atom_mask(atom_mask("HvyDegree").unwrap());
    assert_eq!(coarse.atom_mask, AtomFeatures::HVY_DEGREE);

    let fine = make_fingerprint_fn(FingerprintSpec::for_kind(FingerprintKind::Path)).unwrap();
    let coarse = make_fingerprint_fn(coarse).unwrap();
    let (a, b) = (mol("CCCO"), mol("CCCN"));
    use molview_align::fingerprint::FingerprintFn;
    // Ignoring elements makes propanol and propylamine identical
    assert_eq!(coarse.fingerprint(&a).tanimoto(&coarse.fingerprint(&b)), 1.0);
    assert!(fine.fingerprint(&a).tanimoto(&fine.fingerprint(&b)) < 1.0);
}

#[test]
fn factory_rejects_bad_input() {
    assert!(matches!(
        create_aligner(mol("CCO").into(), Some("bogus"), &AlignerOptions::default()),
        Err(AlignError::UnknownMethod(_))
    ));
    assert!(matches!(
        create_aligner(
            ReferenceKind::Unsupported("protein surface".into()),
            None,
            &AlignerOptions::default()
        ),
        Err(AlignError::UnsupportedReference(_))
    ));
    let bad_spec = AlignerOptions {
        fingerprint: FingerprintSpec::default().with_distance(3, 1),
        ..Default::default()
    };
    assert!(matches!(
        create_aligner(mol("CCO").into(), None, &bad_spec),
        Err(AlignError::InvalidFingerprint(_))
    ));
}

#[test]
fn aligned_anchor_atoms_keep_their_identity() {
    let aligner = create_aligner("C(=O)O".into(), None, &AlignerOptions::default()).unwrap();
    let mut target = mol("CCCC(=O)O");
    assert!(aligner.apply(&mut target));
    // Carbonyl carbon and its oxygens keep bond-length spacing after snapping
    let c = target.coord(AtomIndex(3)).unwrap();
    let o = target.coord(AtomIndex(4)).unwrap();
    let d = ((c[0] - o[0]).powi(2) + (c[1] - o[1]).powi(2)).sqrt();
    assert!((d - molview_mol::BOND_LENGTH).abs() < 1e-6);
}

#[test]
fn ring_reference_aligns_onto_itself() {
    init_logging();
    let reference = mol("c1ccccc1CC(=O)O phenylacetic acid");
    let options = AlignerOptions {
        pattern: Some("c1ccccc1".into()),
        ..Default::default()
    };
    let aligner = create_aligner(reference.clone().into(), Some("ss"), &options).unwrap();
    assert_eq!(aligner.method(), molview_align::AlignMethod::Substructure);

    let mut target = reference.clone();
    assert!(aligner.validate(&target));
    assert!(aligner.align(&mut target));
    assert!(target.has_depiction());
}
