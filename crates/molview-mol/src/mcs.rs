//! Maximum common substructure search
//!
//! Finds the largest connected subgraph shared by a reference molecule and a
//! target. Atoms match on element and aromaticity, bonds on order. The search
//! grows a mapping one frontier atom at a time and branches on "map it" versus
//! "exclude it", so it is exhaustive up to a step budget.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MolError;
use crate::index::AtomIndex;
use crate::molecule::Molecule;
use crate::rings::RingInfo;

/// Default cap on search steps before the best mapping so far is returned
pub const DEFAULT_MAX_STEPS: usize = 200_000;

/// What an MCS maximizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McsScoring {
    /// Atom count
    #[default]
    Atoms,
    /// Bond count
    Bonds,
    /// Atom count, counting ring atoms only when a whole ring is matched
    AtomsAndCycles,
    /// Bond count, counting ring atoms only when a whole ring is matched
    BondsAndCycles,
}

impl McsScoring {
    /// All scoring functions
    pub const ALL: [McsScoring; 4] = [
        McsScoring::Atoms,
        McsScoring::Bonds,
        McsScoring::AtomsAndCycles,
        McsScoring::BondsAndCycles,
    ];

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            McsScoring::Atoms => "atoms",
            McsScoring::Bonds => "bonds",
            McsScoring::AtomsAndCycles => "atoms_and_cycles",
            McsScoring::BondsAndCycles => "bonds_and_cycles",
        }
    }

    /// Whether partially matched rings are discarded
    #[inline]
    pub fn complete_cycles(&self) -> bool {
        matches!(self, McsScoring::AtomsAndCycles | McsScoring::BondsAndCycles)
    }

    #[inline]
    fn counts_bonds(&self) -> bool {
        matches!(self, McsScoring::Bonds | McsScoring::BondsAndCycles)
    }
}

impl fmt::Display for McsScoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for McsScoring {
    type Err = MolError;

    /// Case-insensitive; underscores and dashes are ignored (`"AtomsAndCycles"` works)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        McsScoring::ALL
            .into_iter()
            .find(|scoring| scoring.name().replace('_', "") == key)
            .ok_or_else(|| MolError::UnknownName {
                kind: "MCS scoring function",
                name: s.to_string(),
            })
    }
}

/// A common substructure found between reference and target
#[derive(Debug, Clone, PartialEq)]
pub struct McsMatch {
    /// (reference atom, target atom), ordered by reference atom
    pub pairs: Vec<(AtomIndex, AtomIndex)>,
    /// Reference bonds covered by the mapping
    pub bond_count: usize,
}

impl McsMatch {
    /// Number of matched atoms
    #[inline]
    pub fn atom_count(&self) -> usize {
        self.pairs.len()
    }
}

/// A reusable MCS search against a fixed reference
#[derive(Debug, Clone)]
pub struct McsSearch {
    reference: Molecule,
    rings: RingInfo,
    scoring: McsScoring,
    min_atoms: usize,
    max_steps: usize,
}

impl McsSearch {
    /// Minimum atom count used unless overridden
    pub const DEFAULT_MIN_ATOMS: usize = 3;

    /// Create a search against `reference`
    pub fn new(reference: Molecule) -> Self {
        let rings = reference.ring_info();
        McsSearch {
            reference,
            rings,
            scoring: McsScoring::default(),
            min_atoms: Self::DEFAULT_MIN_ATOMS,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Set the scoring function
    pub fn with_scoring(mut self, scoring: McsScoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// Set the minimum number of atoms a match must have
    pub fn with_min_atoms(mut self, min_atoms: usize) -> Self {
        self.min_atoms = min_atoms;
        self
    }

    /// Set the search step budget
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// The reference molecule
    #[inline]
    pub fn reference(&self) -> &Molecule {
        &self.reference
    }

    /// Scoring function in use
    #[inline]
    pub fn scoring(&self) -> McsScoring {
        self.scoring
    }

    /// Minimum atom threshold
    #[inline]
    pub fn min_atoms(&self) -> usize {
        self.min_atoms
    }

    /// Give the reference 2D coordinates if it has none
    pub fn prepare_depiction(&mut self) {
        self.reference.prepare_depiction();
    }

    /// Best common substructure with at least `min_atoms` atoms
    pub fn find(&self, target: &Molecule) -> Option<McsMatch> {
        if self.reference.atom_count() == 0 || target.atom_count() == 0 {
            return None;
        }

        let mut state = State {
            search: self,
            target,
            target_rings: target.ring_info(),
            map: vec![None; self.reference.atom_count()],
            used: vec![false; target.atom_count()],
            excluded: vec![false; self.reference.atom_count()],
            mapped: 0,
            steps: 0,
            best: None,
        };

        for r in 0..self.reference.atom_count() {
            let r = AtomIndex::from(r);
            for t in 0..target.atom_count() {
                let t = AtomIndex::from(t);
                if !state.atoms_compatible(r, t) {
                    continue;
                }
                state.assign(r, t);
                state.grow();
                state.unassign(r, t);
            }
            // Every mapping containing `r` has now been explored
            state.excluded[r.as_usize()] = true;
            if state.exhausted() {
                log::debug!(
                    "MCS search stopped after {} steps; returning best mapping so far",
                    state.steps
                );
                break;
            }
        }

        state
            .best
            .map(|(_, m)| m)
            .filter(|m| m.atom_count() >= self.min_atoms)
    }
}

struct State<'a> {
    search: &'a McsSearch,
    target: &'a Molecule,
    target_rings: RingInfo,
    /// Reference atom → target atom
    map: Vec<Option<AtomIndex>>,
    used: Vec<bool>,
    excluded: Vec<bool>,
    mapped: usize,
    steps: usize,
    best: Option<(usize, McsMatch)>,
}

impl<'a> State<'a> {
    fn exhausted(&self) -> bool {
        self.steps >= self.search.max_steps
    }

    fn atoms_compatible(&self, r: AtomIndex, t: AtomIndex) -> bool {
        match (self.search.reference.atom(r), self.target.atom(t)) {
            (Some(a), Some(b)) => a.element == b.element && a.aromatic == b.aromatic,
            _ => false,
        }
    }

    fn assign(&mut self, r: AtomIndex, t: AtomIndex) {
        self.map[r.as_usize()] = Some(t);
        self.used[t.as_usize()] = true;
        self.mapped += 1;
    }

    fn unassign(&mut self, r: AtomIndex, t: AtomIndex) {
        self.map[r.as_usize()] = None;
        self.used[t.as_usize()] = false;
        self.mapped -= 1;
    }

    fn grow(&mut self) {
        self.steps += 1;
        if self.exhausted() {
            return;
        }
        self.evaluate();

        let search = self.search;
        let reference = &search.reference;
        let open = (0..reference.atom_count())
            .filter(|&i| self.map[i].is_none() && !self.excluded[i])
            .count();
        let best_score = self.best.as_ref().map_or(0, |(s, _)| *s);
        let upper = if self.search.scoring.counts_bonds() {
            reference.bond_count()
        } else {
            self.mapped + open
        };
        if upper <= best_score {
            return;
        }

        // Lowest-index unmapped, non-excluded reference atom bonded to the mapping
        let frontier = (0..reference.atom_count()).map(AtomIndex::from).find(|&r| {
            self.map[r.as_usize()].is_none()
                && !self.excluded[r.as_usize()]
                && reference
                    .neighbors(r)
                    .any(|(n, _)| self.map[n.as_usize()].is_some())
        });
        let Some(r) = frontier else {
            return;
        };

        let Some(partner) = reference
            .neighbors(r)
            .find_map(|(n, _)| self.map[n.as_usize()])
        else {
            return;
        };
        let candidates: Vec<AtomIndex> = self.target.neighbors(partner).map(|(n, _)| n).collect();
        for t in candidates {
            if self.used[t.as_usize()]
                || !self.atoms_compatible(r, t)
                || !self.bonds_consistent(r, t)
            {
                continue;
            }
            self.assign(r, t);
            self.grow();
            self.unassign(r, t);
            if self.exhausted() {
                return;
            }
        }

        self.excluded[r.as_usize()] = true;
        self.grow();
        self.excluded[r.as_usize()] = false;
    }

    /// Every reference bond from `r` into the mapping has a matching target bond
    fn bonds_consistent(&self, r: AtomIndex, t: AtomIndex) -> bool {
        let search = self.search;
        let reference = &search.reference;
        reference.neighbors(r).all(|(n, bond)| {
            let Some(tn) = self.map[n.as_usize()] else {
                return true;
            };
            let order = reference.bond(bond).map(|b| b.order);
            self.target
                .find_bond(t, tn)
                .and_then(|b| self.target.bond(b))
                .is_some_and(|b| Some(b.order) == order)
        })
    }

    fn evaluate(&mut self) {
        let pairs = self.scored_pairs();
        let score = if self.search.scoring.counts_bonds() {
            self.bond_count(&pairs)
        } else {
            pairs.len()
        };
        let improves = self.best.as_ref().map_or(true, |(s, _)| score > *s);
        if improves && !pairs.is_empty() {
            let bond_count = self.bond_count(&pairs);
            self.best = Some((score, McsMatch { pairs, bond_count }));
        }
    }

    /// Current mapping, minus partially matched rings when the scoring asks for whole cycles
    fn scored_pairs(&self) -> Vec<(AtomIndex, AtomIndex)> {
        let pairs = self
            .map
            .iter()
            .enumerate()
            .filter_map(|(r, t)| t.map(|t| (AtomIndex::from(r), t)));

        if !self.search.scoring.complete_cycles() {
            return pairs.collect();
        }

        let search = self.search;
        let ref_rings = &search.rings;
        let ref_complete = |atom: AtomIndex| {
            !ref_rings.atom_in_ring(atom)
                || ref_rings.rings_of(atom).iter().any(|&ring| {
                    ref_rings.rings()[ring]
                        .iter()
                        .all(|a| self.map[a.as_usize()].is_some())
                })
        };
        // A target ring is complete only if each of its bonds is covered by a reference bond
        let mut inverse: Vec<Option<AtomIndex>> = vec![None; self.target.atom_count()];
        for (r, t) in self.map.iter().enumerate() {
            if let Some(t) = t {
                inverse[t.as_usize()] = Some(AtomIndex::from(r));
            }
        }
        let tgt_rings = &self.target_rings;
        let ring_covered = |ring: &[AtomIndex]| {
            ring.iter().enumerate().all(|(i, a)| {
                let b = ring[(i + 1) % ring.len()];
                match (inverse[a.as_usize()], inverse[b.as_usize()]) {
                    (Some(ra), Some(rb)) => search.reference.find_bond(ra, rb).is_some(),
                    _ => false,
                }
            })
        };
        let tgt_complete = |atom: AtomIndex| {
            !tgt_rings.atom_in_ring(atom)
                || tgt_rings
                    .rings_of(atom)
                    .iter()
                    .any(|&ring| ring_covered(&tgt_rings.rings()[ring]))
        };

        pairs.filter(|&(r, t)| ref_complete(r) && tgt_complete(t)).collect()
    }

    fn bond_count(&self, pairs: &[(AtomIndex, AtomIndex)]) -> usize {
        let reference = &self.search.reference;
        let mut kept = vec![false; reference.atom_count()];
        for &(r, _) in pairs {
            kept[r.as_usize()] = true;
        }
        reference
            .bonds()
            .filter(|b| kept[b.atom1.as_usize()] && kept[b.atom2.as_usize()])
            .count()
    }
}
