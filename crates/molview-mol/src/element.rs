//! Chemical element definitions
//!
//! Only the elements that show up in small organic depictions are modeled.
//! Anything else parses as [`Element::Unknown`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Chemical element, represented by its atomic number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Element {
    /// Wildcard / dummy atom (`*`)
    #[default]
    Unknown = 0,
    Hydrogen = 1,
    Boron = 5,
    Carbon = 6,
    Nitrogen = 7,
    Oxygen = 8,
    Fluorine = 9,
    Sodium = 11,
    Magnesium = 12,
    Silicon = 14,
    Phosphorus = 15,
    Sulfur = 16,
    Chlorine = 17,
    Potassium = 19,
    Calcium = 20,
    Iron = 26,
    Zinc = 30,
    Selenium = 34,
    Bromine = 35,
    Iodine = 53,
}

struct ElementData {
    element: Element,
    symbol: &'static str,
    /// Allowed valences in ascending order (empty = no implicit hydrogens)
    valences: &'static [u8],
}

const ELEMENT_DATA: &[ElementData] = &[
    ElementData { element: Element::Unknown, symbol: "*", valences: &[] },
    ElementData { element: Element::Hydrogen, symbol: "H", valences: &[1] },
    ElementData { element: Element::Boron, symbol: "B", valences: &[3] },
    ElementData { element: Element::Carbon, symbol: "C", valences: &[4] },
    ElementData { element: Element::Nitrogen, symbol: "N", valences: &[3, 5] },
    ElementData { element: Element::Oxygen, symbol: "O", valences: &[2] },
    ElementData { element: Element::Fluorine, symbol: "F", valences: &[1] },
    ElementData { element: Element::Sodium, symbol: "Na", valences: &[] },
    ElementData { element: Element::Magnesium, symbol: "Mg", valences: &[] },
    ElementData { element: Element::Silicon, symbol: "Si", valences: &[4] },
    ElementData { element: Element::Phosphorus, symbol: "P", valences: &[3, 5] },
    ElementData { element: Element::Sulfur, symbol: "S", valences: &[2, 4, 6] },
    ElementData { element: Element::Chlorine, symbol: "Cl", valences: &[1] },
    ElementData { element: Element::Potassium, symbol: "K", valences: &[] },
    ElementData { element: Element::Calcium, symbol: "Ca", valences: &[] },
    ElementData { element: Element::Iron, symbol: "Fe", valences: &[] },
    ElementData { element: Element::Zinc, symbol: "Zn", valences: &[] },
    ElementData { element: Element::Selenium, symbol: "Se", valences: &[2, 4, 6] },
    ElementData { element: Element::Bromine, symbol: "Br", valences: &[1] },
    ElementData { element: Element::Iodine, symbol: "I", valences: &[1] },
];

static SYMBOL_MAP: OnceLock<AHashMap<&'static str, Element>> = OnceLock::new();

fn symbol_map() -> &'static AHashMap<&'static str, Element> {
    SYMBOL_MAP.get_or_init(|| {
        ELEMENT_DATA
            .iter()
            .map(|data| (data.symbol, data.element))
            .collect()
    })
}

impl Element {
    fn data(&self) -> &'static ElementData {
        ELEMENT_DATA
            .iter()
            .find(|d| d.element == *self)
            .unwrap_or(&ELEMENT_DATA[0])
    }

    /// Look up an element by its case-sensitive symbol (`"Cl"`, not `"CL"`)
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        symbol_map().get(symbol).copied()
    }

    /// Look up an element by atomic number
    pub fn from_atomic_number(number: u8) -> Option<Element> {
        ELEMENT_DATA
            .iter()
            .find(|d| d.element as u8 == number)
            .map(|d| d.element)
    }

    /// Atomic number (0 for the wildcard)
    #[inline]
    pub fn atomic_number(&self) -> u8 {
        *self as u8
    }

    /// Element symbol
    pub fn symbol(&self) -> &'static str {
        self.data().symbol
    }

    /// Default valences used to derive implicit hydrogen counts
    pub fn valences(&self) -> &'static [u8] {
        self.data().valences
    }

    /// F, Cl, Br, I
    pub fn is_halogen(&self) -> bool {
        matches!(
            self,
            Element::Fluorine | Element::Chlorine | Element::Bromine | Element::Iodine
        )
    }

    /// Elements written without brackets in SMILES when uncharged
    pub fn is_organic_subset(&self) -> bool {
        matches!(
            self,
            Element::Boron
                | Element::Carbon
                | Element::Nitrogen
                | Element::Oxygen
                | Element::Phosphorus
                | Element::Sulfur
                | Element::Fluorine
                | Element::Chlorine
                | Element::Bromine
                | Element::Iodine
        )
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(Element::from_symbol("Cl"), Some(Element::Chlorine));
        assert_eq!(Element::from_symbol("CL"), None);
        assert_eq!(Element::from_symbol("*"), Some(Element::Unknown));
        assert_eq!(Element::Bromine.symbol(), "Br");
    }

    #[test]
    fn test_atomic_number_roundtrip() {
        assert_eq!(Element::from_atomic_number(6), Some(Element::Carbon));
        assert_eq!(Element::Iodine.atomic_number(), 53);
        assert_eq!(Element::from_atomic_number(2), None);
    }

    #[test]
    fn test_halogens() {
        assert!(Element::Fluorine.is_halogen());
        assert!(!Element::Oxygen.is_halogen());
    }
}
