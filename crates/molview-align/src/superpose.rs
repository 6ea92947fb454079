//! 2D rigid superposition onto anchor points
//!
//! The planar analogue of the Kabsch algorithm: the optimal rotation angle
//! has a closed form, so no SVD is needed. Depictions may also be mirrored,
//! so the reflected fit is tried as well and the lower RMSD wins.

use molview_mol::{AtomIndex, Molecule, Point2};

use crate::error::{AlignError, AlignResult};

/// A rotation (optionally preceded by a mirror in x) followed by a translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Row-major 2x2 matrix
    pub matrix: [[f64; 2]; 2],
    pub translation: [f64; 2],
    pub reflected: bool,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        matrix: [[1.0, 0.0], [0.0, 1.0]],
        translation: [0.0, 0.0],
        reflected: false,
    };

    #[inline]
    pub fn apply(&self, p: Point2) -> Point2 {
        let m = &self.matrix;
        [
            m[0][0] * p[0] + m[0][1] * p[1] + self.translation[0],
            m[1][0] * p[0] + m[1][1] * p[1] + self.translation[1],
        ]
    }
}

/// Result of a superposition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit2D {
    pub transform: Transform2D,
    /// RMSD of the fitted source onto the target
    pub rmsd: f64,
    pub n_points: usize,
}

/// Outcome of [`align_to_anchors`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorFit {
    /// Whether the molecule's coordinates were replaced
    pub valid: bool,
    /// RMSD before anchored atoms were snapped onto their anchors
    pub rmsd: f64,
    pub n_anchors: usize,
}

impl AnchorFit {
    fn invalid(n_anchors: usize) -> Self {
        AnchorFit {
            valid: false,
            rmsd: f64::NAN,
            n_anchors,
        }
    }
}

/// Optimal rigid transform mapping `source` onto `target`
///
/// Both slices must have the same non-zero length. A single point yields a
/// pure translation.
pub fn fit_rigid_2d(source: &[Point2], target: &[Point2]) -> AlignResult<Fit2D> {
    let n = source.len();
    if n != target.len() {
        return Err(AlignError::LengthMismatch(n, target.len()));
    }
    if n == 0 {
        return Err(AlignError::TooFewAnchors(0));
    }

    let cs = centroid(source);
    let ct = centroid(target);
    let centered_src: Vec<Point2> = source.iter().map(|p| [p[0] - cs[0], p[1] - cs[1]]).collect();
    let centered_tgt: Vec<Point2> = target.iter().map(|p| [p[0] - ct[0], p[1] - ct[1]]).collect();

    let proper = best_rotation(&centered_src, &centered_tgt, false);
    let mirrored = best_rotation(&centered_src, &centered_tgt, true);
    // A mirror only wins when it is clearly better, so symmetric cases stay unreflected
    let (matrix, reflected) = if n > 2 && mirrored.1 + 1e-9 < proper.1 {
        (mirrored.0, true)
    } else {
        (proper.0, false)
    };

    // t = ct - M * cs
    let translation = [
        ct[0] - (matrix[0][0] * cs[0] + matrix[0][1] * cs[1]),
        ct[1] - (matrix[1][0] * cs[0] + matrix[1][1] * cs[1]),
    ];
    let transform = Transform2D {
        matrix,
        translation,
        reflected,
    };

    Ok(Fit2D {
        transform,
        rmsd: rmsd_after(&transform, source, target),
        n_points: n,
    })
}

/// Rotation (after an optional x mirror) minimizing squared deviation
/// between centered point sets; returns the matrix and the residual
fn best_rotation(src: &[Point2], tgt: &[Point2], mirror: bool) -> ([[f64; 2]; 2], f64) {
    let sign = if mirror { -1.0 } else { 1.0 };
    let (mut a, mut b) = (0.0, 0.0);
    for (s, t) in src.iter().zip(tgt) {
        let sx = sign * s[0];
        a += sx * t[0] + s[1] * t[1];
        b += sx * t[1] - s[1] * t[0];
    }
    let theta = if src.len() < 2 { 0.0 } else { b.atan2(a) };
    let (sin, cos) = theta.sin_cos();
    // R(theta) * diag(sign, 1)
    let matrix = [[cos * sign, -sin], [sin * sign, cos]];

    let residual = src
        .iter()
        .zip(tgt)
        .map(|(s, t)| {
            let x = matrix[0][0] * s[0] + matrix[0][1] * s[1] - t[0];
            let y = matrix[1][0] * s[0] + matrix[1][1] * s[1] - t[1];
            x * x + y * y
        })
        .sum();
    (matrix, residual)
}

fn rmsd_after(transform: &Transform2D, source: &[Point2], target: &[Point2]) -> f64 {
    let sum: f64 = source
        .iter()
        .zip(target)
        .map(|(&s, t)| {
            let p = transform.apply(s);
            (p[0] - t[0]).powi(2) + (p[1] - t[1]).powi(2)
        })
        .sum();
    (sum / source.len() as f64).sqrt()
}

fn centroid(points: &[Point2]) -> Point2 {
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold([0.0, 0.0], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
    [sum[0] / n, sum[1] / n]
}

/// Move `mol`'s depiction so the anchored atoms land on their anchor points
///
/// The molecule is depicted first if it has no coordinates. The rigid fit is
/// applied to every atom, then each anchored atom is placed exactly on its
/// anchor. With no anchors, or when the result would not be finite, the
/// coordinates are left as they were and the fit is reported invalid.
pub fn align_to_anchors(mol: &mut Molecule, anchors: &[(AtomIndex, Point2)]) -> AnchorFit {
    let n_anchors = anchors.len();
    if n_anchors == 0 {
        return AnchorFit::invalid(0);
    }

    mol.prepare_depiction();
    let Some(coords) = mol.coords() else {
        return AnchorFit::invalid(n_anchors);
    };

    let mut source = Vec::with_capacity(n_anchors);
    let mut target = Vec::with_capacity(n_anchors);
    for &(atom, point) in anchors {
        let Some(&p) = coords.get(atom.as_usize()) else {
            log::debug!("Anchor atom {} is outside '{}'", atom, mol.title);
            return AnchorFit::invalid(n_anchors);
        };
        source.push(p);
        target.push(point);
    }

    let fit = match fit_rigid_2d(&source, &target) {
        Ok(fit) => fit,
        Err(e) => {
            log::debug!("Could not fit '{}' to anchors: {}", mol.title, e);
            return AnchorFit::invalid(n_anchors);
        }
    };

    let mut moved: Vec<Point2> = coords.iter().map(|&p| fit.transform.apply(p)).collect();
    for &(atom, point) in anchors {
        moved[atom.as_usize()] = point;
    }
    if !fit.rmsd.is_finite() || moved.iter().flatten().any(|v| !v.is_finite()) {
        log::debug!("Alignment of '{}' produced non-finite coordinates", mol.title);
        return AnchorFit::invalid(n_anchors);
    }

    if mol.set_coords(moved).is_err() {
        return AnchorFit::invalid(n_anchors);
    }
    AnchorFit {
        valid: true,
        rmsd: fit.rmsd,
        n_anchors,
    }
}
