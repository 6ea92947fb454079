//! SMILES subset parser
//!
//! Supports the organic subset, aromatic lowercase atoms, bracket atoms with
//! hydrogen count and charge, branches, ring closures (`1`..`9`, `%nn`) and
//! explicit bonds (`-` `=` `#` `:`). In query mode the parser also accepts
//! `~` (any bond), `*` (any atom) and `[#n]` atomic-number atoms; the result
//! feeds both [`Molecule::from_smiles`] and [`crate::QueryPattern::parse`].

use ahash::AHashMap;

use crate::atom::Atom;
use crate::bond::BondOrder;
use crate::element::Element;
use crate::error::{MolError, MolResult};
use crate::index::AtomIndex;
use crate::molecule::Molecule;

/// An atom as written in the input
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParsedAtom {
    /// `None` for `*`
    pub element: Option<Element>,
    /// `None` when the atom does not constrain aromaticity (`*`, `[#6]`)
    pub aromatic: Option<bool>,
    pub charge: Option<i8>,
    pub hydrogens: Option<u8>,
    pub bracket: bool,
}

/// A bond as written in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BondSpec {
    /// No bond symbol: single, or aromatic between aromatic atoms
    Implicit,
    Order(BondOrder),
    /// `~`
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ParsedBond {
    pub atom1: usize,
    pub atom2: usize,
    pub spec: BondSpec,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedGraph {
    pub atoms: Vec<ParsedAtom>,
    pub bonds: Vec<ParsedBond>,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    queries: bool,
    graph: ParsedGraph,
    prev: Option<usize>,
    branches: Vec<Option<usize>>,
    pending: Option<BondSpec>,
    open_rings: AHashMap<u32, (usize, Option<BondSpec>)>,
}

/// Parse SMILES (or, with `queries`, a SMARTS-style pattern) into a graph
pub(crate) fn parse(input: &str, queries: bool) -> MolResult<ParsedGraph> {
    let mut parser = Parser {
        input: input.trim().as_bytes(),
        pos: 0,
        queries,
        graph: ParsedGraph::default(),
        prev: None,
        branches: Vec::new(),
        pending: None,
        open_rings: AHashMap::new(),
    };
    parser.run()?;
    Ok(parser.graph)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn error(&self, reason: impl Into<String>) -> MolError {
        MolError::parse(self.pos, reason)
    }

    fn run(&mut self) -> MolResult<()> {
        if self.input.is_empty() {
            return Err(self.error("empty input"));
        }

        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    if self.prev.is_none() {
                        return Err(self.error("branch without a preceding atom"));
                    }
                    self.branches.push(self.prev);
                    self.pos += 1;
                }
                b')' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond symbol before ')'"));
                    }
                    self.prev = self
                        .branches
                        .pop()
                        .ok_or_else(|| self.error("unmatched ')'"))?;
                    self.pos += 1;
                }
                b'-' | b'=' | b'#' | b':' | b'~' => {
                    let spec = match c {
                        b'-' => BondSpec::Order(BondOrder::Single),
                        b'=' => BondSpec::Order(BondOrder::Double),
                        b'#' => BondSpec::Order(BondOrder::Triple),
                        b':' => BondSpec::Order(BondOrder::Aromatic),
                        _ if self.queries => BondSpec::Any,
                        _ => return Err(self.error("'~' is only valid in patterns")),
                    };
                    if self.pending.is_some() {
                        return Err(self.error("consecutive bond symbols"));
                    }
                    self.pending = Some(spec);
                    self.pos += 1;
                }
                b'.' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond symbol before '.'"));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' => {
                    self.pos += 1;
                    self.ring_closure((c - b'0') as u32)?;
                }
                b'%' => {
                    let digits = self.input.get(self.pos + 1..self.pos + 3);
                    let number = digits
                        .filter(|d| d.iter().all(u8::is_ascii_digit))
                        .map(|d| ((d[0] - b'0') * 10 + (d[1] - b'0')) as u32)
                        .ok_or_else(|| self.error("'%' must be followed by two digits"))?;
                    self.pos += 3;
                    self.ring_closure(number)?;
                }
                b'[' => {
                    self.pos += 1;
                    let atom = self.bracket_atom()?;
                    self.push_atom(atom);
                }
                b'*' => {
                    self.pos += 1;
                    self.push_atom(ParsedAtom::default());
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.push_atom(atom);
                }
            }
        }

        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if let Some(number) = self.open_rings.keys().min() {
            return Err(self.error(format!("unclosed ring bond {}", number)));
        }
        if self.pending.is_some() {
            return Err(self.error("dangling bond symbol"));
        }
        Ok(())
    }

    fn push_atom(&mut self, atom: ParsedAtom) {
        let index = self.graph.atoms.len();
        self.graph.atoms.push(atom);
        if let Some(prev) = self.prev {
            let spec = self.pending.take().unwrap_or(BondSpec::Implicit);
            self.graph.bonds.push(ParsedBond {
                atom1: prev,
                atom2: index,
                spec,
            });
        }
        self.pending = None;
        self.prev = Some(index);
    }

    fn ring_closure(&mut self, number: u32) -> MolResult<()> {
        let current = self
            .prev
            .ok_or_else(|| self.error("ring closure without a preceding atom"))?;
        let spec = self.pending.take();

        match self.open_rings.remove(&number) {
            Some((opener, open_spec)) => {
                if opener == current {
                    return Err(self.error("ring closure to the same atom"));
                }
                let spec = match (open_spec, spec) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(self.error("conflicting ring closure bonds"))
                    }
                    (Some(a), _) | (None, Some(a)) => a,
                    (None, None) => BondSpec::Implicit,
                };
                self.graph.bonds.push(ParsedBond {
                    atom1: opener,
                    atom2: current,
                    spec,
                });
            }
            None => {
                self.open_rings.insert(number, (current, spec));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> MolResult<ParsedAtom> {
        let rest = &self.input[self.pos..];
        let (element, aromatic, len) = match rest {
            [b'C', b'l', ..] => (Element::Chlorine, false, 2),
            [b'B', b'r', ..] => (Element::Bromine, false, 2),
            [b'B', ..] => (Element::Boron, false, 1),
            [b'C', ..] => (Element::Carbon, false, 1),
            [b'N', ..] => (Element::Nitrogen, false, 1),
            [b'O', ..] => (Element::Oxygen, false, 1),
            [b'P', ..] => (Element::Phosphorus, false, 1),
            [b'S', ..] => (Element::Sulfur, false, 1),
            [b'F', ..] => (Element::Fluorine, false, 1),
            [b'I', ..] => (Element::Iodine, false, 1),
            [b'b', ..] => (Element::Boron, true, 1),
            [b'c', ..] => (Element::Carbon, true, 1),
            [b'n', ..] => (Element::Nitrogen, true, 1),
            [b'o', ..] => (Element::Oxygen, true, 1),
            [b'p', ..] => (Element::Phosphorus, true, 1),
            [b's', ..] => (Element::Sulfur, true, 1),
            _ => {
                return Err(self.error(format!(
                    "unexpected character '{}'",
                    rest.first().map_or('?', |&b| b as char)
                )))
            }
        };
        self.pos += len;
        Ok(ParsedAtom {
            element: Some(element),
            aromatic: Some(aromatic),
            ..Default::default()
        })
    }

    fn bracket_atom(&mut self) -> MolResult<ParsedAtom> {
        let mut atom = ParsedAtom {
            bracket: true,
            ..Default::default()
        };

        // Isotope labels do not matter for depiction
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }

        match self.peek() {
            Some(b'*') => {
                self.pos += 1;
            }
            Some(b'#') if self.queries => {
                self.pos += 1;
                let number = self
                    .number()
                    .ok_or_else(|| self.error("'#' must be followed by an atomic number"))?;
                let element = u8::try_from(number)
                    .ok()
                    .and_then(Element::from_atomic_number)
                    .ok_or_else(|| self.error(format!("unsupported atomic number {}", number)))?;
                atom.element = Some(element);
            }
            Some(c) if c.is_ascii_lowercase() => {
                let rest = &self.input[self.pos..];
                let (element, len) = if rest.starts_with(b"se") {
                    (Element::Selenium, 2)
                } else {
                    let symbol = (c as char).to_ascii_uppercase().to_string();
                    let element = Element::from_symbol(&symbol)
                        .filter(|e| e.is_organic_subset())
                        .ok_or_else(|| {
                            self.error(format!("unknown aromatic atom '{}'", c as char))
                        })?;
                    (element, 1)
                };
                self.pos += len;
                atom.element = Some(element);
                atom.aromatic = Some(true);
            }
            Some(c) if c.is_ascii_uppercase() => {
                let two = self
                    .input
                    .get(self.pos..self.pos + 2)
                    .and_then(|s| std::str::from_utf8(s).ok())
                    .and_then(Element::from_symbol)
                    .filter(|_| self.input[self.pos + 1].is_ascii_lowercase());
                let (element, len) = match two {
                    Some(e) => (e, 2),
                    None => {
                        let symbol = (c as char).to_string();
                        let e = Element::from_symbol(&symbol)
                            .ok_or_else(|| self.error(format!("unknown element '{}'", symbol)))?;
                        (e, 1)
                    }
                };
                self.pos += len;
                atom.element = Some(element);
                atom.aromatic = Some(false);
            }
            _ => return Err(self.error("expected an atom symbol in brackets")),
        }

        // Stereo marks are accepted and ignored
        while self.peek() == Some(b'@') {
            self.pos += 1;
        }

        if self.peek() == Some(b'H') {
            self.pos += 1;
            let count = self.number().unwrap_or(1);
            atom.hydrogens = Some(count.min(u8::MAX as u32) as u8);
        }

        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let unit: i32 = if sign == b'+' { 1 } else { -1 };
            let mut magnitude = 1i32;
            if let Some(n) = self.number() {
                magnitude = n as i32;
            } else {
                while self.peek() == Some(sign) {
                    self.pos += 1;
                    magnitude += 1;
                }
            }
            atom.charge = Some((unit * magnitude).clamp(i8::MIN as i32, i8::MAX as i32) as i8);
        }

        if self.peek() != Some(b']') {
            return Err(self.error("expected ']'"));
        }
        self.pos += 1;
        Ok(atom)
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
    }
}

impl ParsedGraph {
    /// Resolve an implicit bond between two parsed atoms
    pub(crate) fn implicit_order(&self, bond: &ParsedBond) -> BondOrder {
        let aromatic = |i: usize| self.atoms[i].aromatic == Some(true);
        if aromatic(bond.atom1) && aromatic(bond.atom2) {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    /// Build a concrete molecule; wildcard atoms become [`Element::Unknown`]
    pub(crate) fn to_molecule(&self, title: &str) -> MolResult<Molecule> {
        let mut mol = Molecule::new(title);
        for parsed in &self.atoms {
            let mut atom = Atom::new(parsed.element.unwrap_or(Element::Unknown))
                .aromatic(parsed.aromatic.unwrap_or(false))
                .charge(parsed.charge.unwrap_or(0));
            if parsed.bracket {
                atom.explicit_hydrogens = Some(parsed.hydrogens.unwrap_or(0));
            }
            mol.add_atom(atom);
        }
        for bond in &self.bonds {
            let order = match bond.spec {
                BondSpec::Order(order) => order,
                BondSpec::Implicit | BondSpec::Any => self.implicit_order(bond),
            };
            mol.add_bond(AtomIndex::from(bond.atom1), AtomIndex::from(bond.atom2), order)?;
        }
        Ok(mol)
    }
}

impl Molecule {
    /// Parse a SMILES string
    ///
    /// A whitespace-separated suffix is taken as the molecule title, as in
    /// `.smi` files: `"c1ccccc1 benzene"`.
    pub fn from_smiles(smiles: &str) -> MolResult<Molecule> {
        let smiles = smiles.trim();
        let (body, title) = match smiles.split_once(char::is_whitespace) {
            Some((body, title)) => (body, title.trim()),
            None => (smiles, ""),
        };
        parse(body, false)?.to_molecule(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::BondIndex;

    #[test]
    fn test_parse_chain_with_branch() {
        let mol = Molecule::from_smiles("CC(=O)O acetic acid").unwrap();
        assert_eq!(mol.title, "acetic acid");
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
        let double = mol.find_bond(AtomIndex(1), AtomIndex(2)).unwrap();
        assert_eq!(mol.bond(double).unwrap().order, BondOrder::Double);
        assert_eq!(mol.hydrogen_count(AtomIndex(3)), 1);
    }

    #[test]
    fn test_aromatic_ring_bonds() {
        let mol = Molecule::from_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.bond_count(), 6);
        assert!(mol.bonds().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(mol.hydrogen_count(AtomIndex(0)), 1);
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = Molecule::from_smiles("C[NH3+].[O-]c1cc[nH]c1").unwrap();
        let n = mol.atom(AtomIndex(1)).unwrap();
        assert_eq!(n.element, Element::Nitrogen);
        assert_eq!(n.formal_charge, 1);
        assert_eq!(mol.hydrogen_count(AtomIndex(1)), 3);
        let o = mol.atom(AtomIndex(2)).unwrap();
        assert_eq!(o.formal_charge, -1);
        assert_eq!(mol.components().len(), 2);
    }

    #[test]
    fn test_two_letter_elements() {
        let mol = Molecule::from_smiles("ClCBr").unwrap();
        let elements: Vec<Element> = mol.atoms().map(|a| a.element).collect();
        assert_eq!(
            elements,
            vec![Element::Chlorine, Element::Carbon, Element::Bromine]
        );
    }

    #[test]
    fn test_ring_closure_bond_order() {
        let mol = Molecule::from_smiles("C1CC=1").unwrap();
        assert_eq!(mol.bond(BondIndex(2)).unwrap().order, BondOrder::Double);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Molecule::from_smiles("C1CC"),
            Err(MolError::Parse { .. })
        ));
        assert!(Molecule::from_smiles("C(C").is_err());
        assert!(Molecule::from_smiles("C)C").is_err());
        assert!(Molecule::from_smiles("C~C").is_err());
        assert!(Molecule::from_smiles("C==C").is_err());
        assert!(Molecule::from_smiles("").is_err());
        assert!(Molecule::from_smiles("Xx").is_err());
    }

    #[test]
    fn test_query_syntax() {
        let graph = parse("[#6]~*", true).unwrap();
        assert_eq!(graph.atoms[0].element, Some(Element::Carbon));
        assert_eq!(graph.atoms[0].aromatic, None);
        assert_eq!(graph.atoms[1].element, None);
        assert_eq!(graph.bonds[0].spec, BondSpec::Any);
    }
}
