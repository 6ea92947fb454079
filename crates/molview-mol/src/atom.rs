//! Atom data structure

use crate::element::Element;

/// An atom in a depiction graph
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Chemical element
    pub element: Element,
    /// Aromatic flag (lowercase SMILES symbol)
    pub aromatic: bool,
    /// Formal charge
    pub formal_charge: i8,
    /// Hydrogen count given explicitly in a bracket atom; `None` derives it from valence
    pub explicit_hydrogens: Option<u8>,
}

impl Atom {
    /// Create a neutral, non-aromatic atom
    pub fn new(element: Element) -> Self {
        Atom {
            element,
            aromatic: false,
            formal_charge: 0,
            explicit_hydrogens: None,
        }
    }

    /// Builder-style aromatic flag
    pub fn aromatic(mut self, aromatic: bool) -> Self {
        self.aromatic = aromatic;
        self
    }

    /// Builder-style formal charge
    pub fn charge(mut self, charge: i8) -> Self {
        self.formal_charge = charge;
        self
    }

    /// Symbol as it would appear in SMILES (lowercase when aromatic)
    pub fn smiles_symbol(&self) -> String {
        let symbol = self.element.symbol();
        if self.aromatic {
            symbol.to_ascii_lowercase()
        } else {
            symbol.to_string()
        }
    }
}
