/// The subset of the periodic table this crate can name.
///
/// Covers the organic subset, the common heteroatoms seen in residue
/// chemistry, and a handful of metals that show up as counterions or
/// catalysts in reaction agent sections. Anything outside this set is
/// rejected at parse time rather than carried as an anonymous number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Element {
    H = 1,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Na = 11,
    Mg = 12,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    K = 19,
    Ca = 20,
    Fe = 26,
    Cu = 29,
    Zn = 30,
    Se = 34,
    Br = 35,
    Pd = 46,
    Ag = 47,
    I = 53,
    Pt = 78,
    Au = 79,
}

impl Element {
    pub fn atomic_num(self) -> u8 {
        self as u8
    }

    pub fn from_atomic_num(n: u8) -> Option<Self> {
        use Element::*;
        Some(match n {
            1 => H,
            5 => B,
            6 => C,
            7 => N,
            8 => O,
            9 => F,
            11 => Na,
            12 => Mg,
            14 => Si,
            15 => P,
            16 => S,
            17 => Cl,
            19 => K,
            20 => Ca,
            26 => Fe,
            29 => Cu,
            30 => Zn,
            34 => Se,
            35 => Br,
            46 => Pd,
            47 => Ag,
            53 => I,
            78 => Pt,
            79 => Au,
            _ => return None,
        })
    }

    pub fn from_symbol(sym: &str) -> Option<Self> {
        use Element::*;
        Some(match sym {
            "H" => H,
            "B" => B,
            "C" => C,
            "N" => N,
            "O" => O,
            "F" => F,
            "Na" => Na,
            "Mg" => Mg,
            "Si" => Si,
            "P" => P,
            "S" => S,
            "Cl" => Cl,
            "K" => K,
            "Ca" => Ca,
            "Fe" => Fe,
            "Cu" => Cu,
            "Zn" => Zn,
            "Se" => Se,
            "Br" => Br,
            "Pd" => Pd,
            "Ag" => Ag,
            "I" => I,
            "Pt" => Pt,
            "Au" => Au,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        use Element::*;
        match self {
            H => "H",
            B => "B",
            C => "C",
            N => "N",
            O => "O",
            F => "F",
            Na => "Na",
            Mg => "Mg",
            Si => "Si",
            P => "P",
            S => "S",
            Cl => "Cl",
            K => "K",
            Ca => "Ca",
            Fe => "Fe",
            Cu => "Cu",
            Zn => "Zn",
            Se => "Se",
            Br => "Br",
            Pd => "Pd",
            Ag => "Ag",
            I => "I",
            Pt => "Pt",
            Au => "Au",
        }
    }

    /// Default valences in preference order, used to derive implicit
    /// hydrogen counts. Empty for elements where implying hydrogens
    /// makes no sense (metals).
    pub fn default_valences(self) -> &'static [u8] {
        use Element::*;
        match self {
            H => &[1],
            B => &[3],
            C => &[4],
            N => &[3, 5],
            O => &[2],
            F | Cl | Br | I => &[1],
            P => &[3, 5],
            S => &[2, 4, 6],
            Se => &[2, 4, 6],
            Si => &[4],
            _ => &[],
        }
    }

    /// Elements writable without brackets in SMILES.
    pub fn in_organic_subset(self) -> bool {
        use Element::*;
        matches!(self, B | C | N | O | P | S | F | Cl | Br | I)
    }

    /// Elements that may carry the aromatic flag (lowercase notation).
    pub fn can_be_aromatic(self) -> bool {
        use Element::*;
        matches!(self, B | C | N | O | P | S | Se)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trip() {
        for n in 0..=120u8 {
            if let Some(e) = Element::from_atomic_num(n) {
                assert_eq!(e.atomic_num(), n);
                assert_eq!(Element::from_symbol(e.symbol()), Some(e));
            }
        }
    }

    #[test]
    fn two_letter_symbols_parse() {
        assert_eq!(Element::from_symbol("Cl"), Some(Element::Cl));
        assert_eq!(Element::from_symbol("Br"), Some(Element::Br));
        assert_eq!(Element::from_symbol("Se"), Some(Element::Se));
        assert_eq!(Element::from_symbol("Xx"), None);
    }

    #[test]
    fn carbon_valence() {
        assert_eq!(Element::C.default_valences(), &[4]);
        assert_eq!(Element::S.default_valences(), &[2, 4, 6]);
        assert!(Element::Fe.default_valences().is_empty());
    }

    #[test]
    fn organic_subset_membership() {
        assert!(Element::C.in_organic_subset());
        assert!(Element::Br.in_organic_subset());
        assert!(!Element::Na.in_organic_subset());
        assert!(!Element::H.in_organic_subset());
    }
}
