//! Substructure query patterns
//!
//! A [`QueryPattern`] is compiled from a SMARTS-style string and matched
//! against molecules with a backtracking search in the spirit of VF2: pattern
//! atoms are visited in BFS order so every atom after the first of a component
//! only has to be tried against neighbors of an already-mapped target atom.

use ahash::AHashSet;

use crate::bond::BondOrder;
use crate::error::MolResult;
use crate::index::AtomIndex;
use crate::molecule::Molecule;
use crate::smiles::{self, BondSpec, ParsedAtom, ParsedGraph};

/// A pattern-to-target atom mapping, ordered by pattern atom
pub type AtomMatch = Vec<(AtomIndex, AtomIndex)>;

/// A compiled substructure query
#[derive(Debug, Clone)]
pub struct QueryPattern {
    source: String,
    graph: ParsedGraph,
    /// Pattern adjacency: (neighbor, bond index into `graph.bonds`)
    adjacency: Vec<Vec<(usize, usize)>>,
    /// Visit order for the search
    order: Vec<usize>,
    /// Concrete graph of the pattern itself, used when the pattern is depicted
    molecule: Molecule,
}

impl QueryPattern {
    /// Compile a pattern string
    pub fn parse(pattern: &str) -> MolResult<Self> {
        let graph = smiles::parse(pattern, true)?;
        let molecule = graph.to_molecule(pattern.trim())?;

        let mut adjacency = vec![Vec::new(); graph.atoms.len()];
        for (i, bond) in graph.bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, i));
            adjacency[bond.atom2].push((bond.atom1, i));
        }

        let order = molecule
            .components()
            .into_iter()
            .flatten()
            .map(|a| a.as_usize())
            .collect();

        Ok(QueryPattern {
            source: pattern.trim().to_string(),
            graph,
            adjacency,
            order,
            molecule,
        })
    }

    /// Use a whole molecule as an exact query: element, aromaticity and bond orders must match
    pub fn from_molecule(mol: &Molecule) -> Self {
        let atoms = mol
            .atoms()
            .map(|a| ParsedAtom {
                element: Some(a.element),
                aromatic: Some(a.aromatic),
                ..Default::default()
            })
            .collect();
        let bonds = mol
            .bonds()
            .map(|b| smiles::ParsedBond {
                atom1: b.atom1.as_usize(),
                atom2: b.atom2.as_usize(),
                spec: BondSpec::Order(b.order),
            })
            .collect();
        let graph = ParsedGraph { atoms, bonds };

        let mut adjacency = vec![Vec::new(); graph.atoms.len()];
        for (i, bond) in graph.bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, i));
            adjacency[bond.atom2].push((bond.atom1, i));
        }
        let order = mol
            .components()
            .into_iter()
            .flatten()
            .map(|a| a.as_usize())
            .collect();

        QueryPattern {
            source: mol.title.clone(),
            graph,
            adjacency,
            order,
            molecule: mol.clone(),
        }
    }

    /// The pattern text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of pattern atoms
    #[inline]
    pub fn atom_count(&self) -> usize {
        self.graph.atoms.len()
    }

    /// Number of pattern bonds
    #[inline]
    pub fn bond_count(&self) -> usize {
        self.graph.bonds.len()
    }

    /// The pattern as a concrete molecule (wildcards become unknown atoms)
    #[inline]
    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    /// Enumerate matches; with `unique`, matches covering the same target atoms collapse
    pub fn matches(&self, target: &Molecule, unique: bool) -> Vec<AtomMatch> {
        let mut search = Search::new(self, target, None);
        search.run(0);
        if !unique {
            return search.results;
        }

        let mut seen = AHashSet::new();
        search
            .results
            .into_iter()
            .filter(|m| {
                let mut key: Vec<AtomIndex> = m.iter().map(|&(_, t)| t).collect();
                key.sort();
                seen.insert(key)
            })
            .collect()
    }

    /// First match, if any
    pub fn first_match(&self, target: &Molecule) -> Option<AtomMatch> {
        let mut search = Search::new(self, target, Some(1));
        search.run(0);
        search.results.into_iter().next()
    }

    /// Whether the pattern occurs in `target`
    #[inline]
    pub fn has_match(&self, target: &Molecule) -> bool {
        self.first_match(target).is_some()
    }

    fn atom_matches(&self, query: &ParsedAtom, target: &Molecule, atom: AtomIndex) -> bool {
        let Some(t) = target.atom(atom) else {
            return false;
        };
        query.element.map_or(true, |e| e == t.element)
            && query.aromatic.map_or(true, |a| a == t.aromatic)
            && query.charge.map_or(true, |c| c == t.formal_charge)
            && query
                .hydrogens
                .map_or(true, |h| h == target.hydrogen_count(atom))
    }

    fn bond_matches(&self, spec: BondSpec, order: BondOrder) -> bool {
        match spec {
            BondSpec::Any => true,
            BondSpec::Implicit => matches!(order, BondOrder::Single | BondOrder::Aromatic),
            BondSpec::Order(o) => o == order,
        }
    }
}

struct Search<'a> {
    pattern: &'a QueryPattern,
    target: &'a Molecule,
    limit: Option<usize>,
    map: Vec<Option<AtomIndex>>,
    used: Vec<bool>,
    results: Vec<AtomMatch>,
}

impl<'a> Search<'a> {
    fn new(pattern: &'a QueryPattern, target: &'a Molecule, limit: Option<usize>) -> Self {
        Search {
            pattern,
            target,
            limit,
            map: vec![None; pattern.atom_count()],
            used: vec![false; target.atom_count()],
            results: Vec::new(),
        }
    }

    fn done(&self) -> bool {
        self.limit.is_some_and(|l| self.results.len() >= l)
    }

    fn run(&mut self, depth: usize) {
        if self.pattern.atom_count() == 0 || self.done() {
            return;
        }
        if depth == self.pattern.order.len() {
            let found = self
                .map
                .iter()
                .enumerate()
                .filter_map(|(q, t)| t.map(|t| (AtomIndex::from(q), t)))
                .collect();
            self.results.push(found);
            return;
        }

        let q = self.pattern.order[depth];
        let anchor = self.pattern.adjacency[q]
            .iter()
            .find_map(|&(n, _)| self.map[n]);

        let candidates: Vec<AtomIndex> = match anchor {
            Some(t) => self.target.neighbors(t).map(|(n, _)| n).collect(),
            None => (0..self.target.atom_count()).map(AtomIndex::from).collect(),
        };

        for t in candidates {
            if self.used[t.as_usize()] || !self.feasible(q, t) {
                continue;
            }
            self.map[q] = Some(t);
            self.used[t.as_usize()] = true;
            self.run(depth + 1);
            self.map[q] = None;
            self.used[t.as_usize()] = false;
            if self.done() {
                return;
            }
        }
    }

    fn feasible(&self, q: usize, t: AtomIndex) -> bool {
        let pattern = self.pattern;
        if !pattern.atom_matches(&pattern.graph.atoms[q], self.target, t) {
            return false;
        }
        pattern.adjacency[q].iter().all(|&(n, bond_idx)| {
            let Some(tn) = self.map[n] else {
                return true;
            };
            let spec = pattern.graph.bonds[bond_idx].spec;
            self.target
                .find_bond(t, tn)
                .and_then(|b| self.target.bond(b))
                .is_some_and(|b| pattern.bond_matches(spec, b.order))
        })
    }
}
