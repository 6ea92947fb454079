//! 2D depiction layout
//!
//! Deterministic coordinate generation: rings become regular polygons fused on
//! shared edges (or attached at a shared atom), unbranched chains zig-zag at
//! 120 degrees and further substituents take the direction furthest from
//! existing bonds.
//! Disconnected fragments are laid out left to right.

use std::f64::consts::PI;

use crate::index::AtomIndex;
use crate::molecule::{Molecule, Point2};
use crate::rings::RingInfo;

/// Bond length in depiction units
pub const BOND_LENGTH: f64 = 1.5;

/// Horizontal gap between fragments
const FRAGMENT_GAP: f64 = 2.0 * BOND_LENGTH;

/// Candidate directions around an atom, every 30 degrees
const DIRECTIONS: usize = 12;

/// Compute depiction coordinates for every atom of `mol`
pub(crate) fn layout(mol: &Molecule) -> Vec<Point2> {
    let rings = mol.ring_info();
    let mut coords: Vec<Option<Point2>> = vec![None; mol.atom_count()];
    let mut placed_rings = vec![false; rings.ring_count()];
    let mut x_offset = 0.0;

    for component in mol.components() {
        let seed = component[0];
        coords[seed.as_usize()] = Some([0.0, 0.0]);

        for &atom in &component {
            // Rings through this atom first so substituents see their bonds
            for &ring in rings.rings_of(atom) {
                if !placed_rings[ring] {
                    place_ring(&rings.rings()[ring], &mut coords);
                    placed_rings[ring] = true;
                }
            }
            place_substituents(mol, &rings, atom, &mut coords);
        }

        // Shift the fragment so it starts right of the previous one
        let (min_x, max_x) = component
            .iter()
            .filter_map(|a| coords[a.as_usize()])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p[0]), hi.max(p[0]))
            });
        if min_x.is_finite() {
            let shift = x_offset - min_x;
            for a in &component {
                if let Some(p) = coords[a.as_usize()].as_mut() {
                    p[0] += shift;
                }
            }
            x_offset += (max_x - min_x) + FRAGMENT_GAP;
        }
    }

    coords.into_iter().map(|c| c.unwrap_or([0.0, 0.0])).collect()
}

fn place_substituents(
    mol: &Molecule,
    rings: &RingInfo,
    atom: AtomIndex,
    coords: &mut [Option<Point2>],
) {
    let Some(origin) = coords[atom.as_usize()] else {
        return;
    };
    let pending: Vec<AtomIndex> = mol
        .neighbors(atom)
        .map(|(n, _)| n)
        .filter(|n| coords[n.as_usize()].is_none())
        .collect();

    for next in pending {
        let occupied: Vec<f64> = mol
            .neighbors(atom)
            .filter_map(|(n, _)| coords[n.as_usize()])
            .map(|p| angle_of(origin, p))
            .collect();
        let angle = match occupied.as_slice() {
            [incoming] if !rings.atom_in_ring(atom) => zigzag(mol, atom, *incoming, coords),
            _ => free_direction(&occupied),
        };
        coords[next.as_usize()] = Some([
            origin[0] + BOND_LENGTH * angle.cos(),
            origin[1] + BOND_LENGTH * angle.sin(),
        ]);
    }
}

/// Turn 120 degrees away from the incoming bond, keeping the new bond parallel
/// to the bond before the incoming one so chains alternate sides
fn zigzag(mol: &Molecule, atom: AtomIndex, incoming: f64, coords: &[Option<Point2>]) -> f64 {
    let left = incoming + 2.0 * PI / 3.0;
    let right = incoming - 2.0 * PI / 3.0;
    let previous = mol.neighbors(atom).find_map(|(parent, _)| {
        let at = coords[parent.as_usize()]?;
        mol.neighbors(parent)
            .filter(|(g, _)| *g != atom)
            .find_map(|(g, _)| coords[g.as_usize()])
            .map(|from| angle_of(from, at))
    });
    match previous {
        Some(target) if angular_distance(left, target) < angular_distance(right, target) => left,
        _ => right,
    }
}

/// Direction furthest from all occupied directions; ties go to the lowest candidate
fn free_direction(occupied: &[f64]) -> f64 {
    // A chain seed starts 30 degrees down so its zig-zag runs along the x axis
    if occupied.is_empty() {
        return -PI / 6.0;
    }

    let mut best = (0.0, f64::NEG_INFINITY);
    for k in 0..DIRECTIONS {
        let candidate = k as f64 * 2.0 * PI / DIRECTIONS as f64;
        let clearance = occupied
            .iter()
            .map(|&o| angular_distance(candidate, o))
            .fold(f64::INFINITY, f64::min);
        if clearance > best.1 + 1e-9 {
            best = (candidate, clearance);
        }
    }
    best.0
}

fn place_ring(ring: &[AtomIndex], coords: &mut [Option<Point2>]) {
    let n = ring.len();
    if n < 3 {
        return;
    }
    let step = 2.0 * PI / n as f64;
    let radius = BOND_LENGTH / (2.0 * (PI / n as f64).sin());
    let placed: Vec<usize> = (0..n)
        .filter(|&i| coords[ring[i].as_usize()].is_some())
        .collect();

    // Fused: two consecutive placed atoms define a shared edge
    let shared_edge = placed
        .iter()
        .copied()
        .find(|&i| coords[ring[(i + 1) % n].as_usize()].is_some());

    let (center, start_index, start_angle, direction) = if let Some(i) = shared_edge {
        let (Some(a), Some(b)) = (coords[ring[i].as_usize()], coords[ring[(i + 1) % n].as_usize()])
        else {
            return;
        };
        let mid = [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0];
        let apothem = BOND_LENGTH / (2.0 * (PI / n as f64).tan());
        let edge = [b[0] - a[0], b[1] - a[1]];
        let len = (edge[0] * edge[0] + edge[1] * edge[1]).sqrt().max(1e-9);
        let normal = [-edge[1] / len, edge[0] / len];

        // Build on the side away from the already placed atoms
        let placed_centroid = centroid(coords.iter().flatten().copied());
        let side_a = [mid[0] + normal[0] * apothem, mid[1] + normal[1] * apothem];
        let side_b = [mid[0] - normal[0] * apothem, mid[1] - normal[1] * apothem];
        let center = if distance(side_a, placed_centroid) >= distance(side_b, placed_centroid) {
            side_a
        } else {
            side_b
        };
        let angle_a = angle_of(center, a);
        let angle_b = angle_of(center, b);
        let direction = if normalize(angle_b - angle_a) > 0.0 { 1.0 } else { -1.0 };
        (center, i, angle_a, direction)
    } else if let Some(&i) = placed.first() {
        // Spiro or substituent attachment: grow the ring outward from the placed atom
        let Some(a) = coords[ring[i].as_usize()] else {
            return;
        };
        let occupied: Vec<f64> = coords
            .iter()
            .flatten()
            .filter(|p| {
                let d = distance(**p, a);
                d > 1e-9 && d < BOND_LENGTH * 1.01
            })
            .map(|&p| angle_of(a, p))
            .collect();
        let outward = free_direction(&occupied);
        let center = [a[0] + radius * outward.cos(), a[1] + radius * outward.sin()];
        (center, i, angle_of(center, a), 1.0)
    } else {
        // Flat-bottomed polygon around the seed position
        let seed = coords[ring[0].as_usize()].unwrap_or([0.0, 0.0]);
        let start = -PI / 2.0 - step / 2.0;
        let center = [seed[0] - radius * start.cos(), seed[1] - radius * start.sin()];
        (center, 0, start, 1.0)
    };

    for k in 0..n {
        let atom = ring[(start_index + k) % n];
        if coords[atom.as_usize()].is_some() {
            continue;
        }
        let angle = start_angle + direction * step * k as f64;
        coords[atom.as_usize()] = Some([
            center[0] + radius * angle.cos(),
            center[1] + radius * angle.sin(),
        ]);
    }
}

fn angle_of(from: Point2, to: Point2) -> f64 {
    (to[1] - from[1]).atan2(to[0] - from[0])
}

/// Wrap an angle into (-PI, PI]
fn normalize(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

fn angular_distance(a: f64, b: f64) -> f64 {
    normalize(a - b).abs()
}

fn distance(a: Point2, b: Point2) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn centroid(points: impl Iterator<Item = Point2>) -> Point2 {
    let (sum, count) = points.fold(([0.0, 0.0], 0usize), |(s, c), p| {
        ([s[0] + p[0], s[1] + p[1]], c + 1)
    });
    if count == 0 {
        return [0.0, 0.0];
    }
    [sum[0] / count as f64, sum[1] / count as f64]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bond_lengths(mol: &Molecule) -> Vec<f64> {
        let coords = mol.coords().unwrap();
        mol.bonds()
            .map(|b| distance(coords[b.atom1.as_usize()], coords[b.atom2.as_usize()]))
            .collect()
    }

    #[test]
    fn test_benzene_is_regular() {
        let mut mol = Molecule::from_smiles("c1ccccc1").unwrap();
        mol.prepare_depiction();
        for len in bond_lengths(&mol) {
            assert!((len - BOND_LENGTH).abs() < 1e-6, "bond length {}", len);
        }
    }

    #[test]
    fn test_naphthalene_fused_edges() {
        let mut mol = Molecule::from_smiles("c1ccc2ccccc2c1").unwrap();
        mol.prepare_depiction();
        for len in bond_lengths(&mol) {
            assert!((len - BOND_LENGTH).abs() < 1e-6, "bond length {}", len);
        }
        // No two atoms collapse onto each other
        let coords = mol.coords().unwrap();
        for i in 0..coords.len() {
            for j in (i + 1)..coords.len() {
                assert!(distance(coords[i], coords[j]) > 0.5);
            }
        }
    }

    #[test]
    fn test_chain_bond_lengths() {
        let mut mol = Molecule::from_smiles("CCC(C)CO").unwrap();
        mol.prepare_depiction();
        for len in bond_lengths(&mol) {
            assert!((len - BOND_LENGTH).abs() < 1e-6);
        }
    }

    #[test]
    fn test_chain_zigzags() {
        let mut mol = Molecule::from_smiles("CCCCCCCC").unwrap();
        mol.prepare_depiction();
        let (lo, hi) = mol.bounding_box().unwrap();
        // Seven bonds at +-30 degrees from the x axis
        assert!((hi[0] - lo[0] - 7.0 * BOND_LENGTH * (PI / 6.0).cos()).abs() < 1e-6);
        assert!((hi[1] - lo[1] - BOND_LENGTH * (PI / 6.0).sin()).abs() < 1e-6);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let mut a = Molecule::from_smiles("c1ccccc1CC(=O)O").unwrap();
        let mut b = a.clone();
        a.prepare_depiction();
        b.prepare_depiction();
        assert_eq!(a.coords(), b.coords());
    }

    #[test]
    fn test_fragments_do_not_overlap() {
        let mut mol = Molecule::from_smiles("CCO.CCN").unwrap();
        mol.prepare_depiction();
        let coords = mol.coords().unwrap();
        let first_max = coords[..3].iter().map(|p| p[0]).fold(f64::MIN, f64::max);
        let second_min = coords[3..].iter().map(|p| p[0]).fold(f64::MAX, f64::min);
        assert!(second_min > first_max);
    }

    #[test]
    fn test_prepare_keeps_existing_coords() {
        let mut mol = Molecule::from_smiles("CC").unwrap();
        mol.set_coords(vec![[5.0, 5.0], [6.5, 5.0]]).unwrap();
        mol.prepare_depiction();
        assert_eq!(mol.coord(AtomIndex(0)), Some([5.0, 5.0]));
        mol.generate_depiction();
        assert_ne!(mol.coord(AtomIndex(0)), Some([5.0, 5.0]));
    }
}
