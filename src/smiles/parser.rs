use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use crate::atom::{Atom, Chirality};
use crate::bond::{SmilesBond, SmilesBondOrder};
use crate::element::Element;
use crate::mol::Mol;

use super::error::SmilesError;

pub(super) fn parse(input: &str) -> Result<Mol<Atom, SmilesBond>, SmilesError> {
    Parser::new(input).parse()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn parse_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos > start {
            let s: String = self.chars[start..self.pos].iter().collect();
            s.parse().ok()
        } else {
            None
        }
    }

    fn parse(&mut self) -> Result<Mol<Atom, SmilesBond>, SmilesError> {
        let mut mol: Mol<Atom, SmilesBond> = Mol::new();
        let mut stack: Vec<(NodeIndex, Option<SmilesBondOrder>)> = Vec::new();
        let mut current: Option<NodeIndex> = None;
        let mut pending_bond: Option<SmilesBondOrder> = None;
        let mut ring_map: HashMap<u16, (NodeIndex, Option<SmilesBondOrder>)> = HashMap::new();
        // Atoms written in brackets carry their hydrogen count explicitly;
        // everyone else gets implicit hydrogens assigned afterwards.
        let mut bracketed: Vec<bool> = Vec::new();

        while let Some(ch) = self.peek() {
            match ch {
                '[' => {
                    let atom = self.parse_bracket_atom()?;
                    let idx = mol.add_atom(atom);
                    bracketed.push(true);
                    connect(&mut mol, &mut current, &mut pending_bond, idx);
                }
                '(' => {
                    self.pos += 1;
                    match current {
                        Some(cur) => stack.push((cur, pending_bond.take())),
                        None => return Err(SmilesError::UnmatchedParen { pos: self.pos - 1 }),
                    }
                }
                ')' => {
                    self.pos += 1;
                    match stack.pop() {
                        Some((prev, saved)) => {
                            current = Some(prev);
                            pending_bond = saved;
                        }
                        None => return Err(SmilesError::UnmatchedParen { pos: self.pos - 1 }),
                    }
                }
                '.' => {
                    self.pos += 1;
                    current = None;
                    pending_bond = None;
                }
                '-' | '=' | '#' | ':' | '/' | '\\' => {
                    if pending_bond.is_some() {
                        return Err(SmilesError::UnexpectedChar { pos: self.pos, ch });
                    }
                    self.pos += 1;
                    pending_bond = Some(match ch {
                        '=' => SmilesBondOrder::Double,
                        '#' => SmilesBondOrder::Triple,
                        ':' => SmilesBondOrder::Aromatic,
                        // Directional bonds degrade to plain single bonds;
                        // double-bond stereo is not carried by this crate.
                        _ => SmilesBondOrder::Single,
                    });
                }
                '0'..='9' | '%' => {
                    let pos = self.pos;
                    let digit = self.parse_ring_digit()?;
                    let cur = current.ok_or(SmilesError::UnexpectedChar { pos, ch })?;
                    match ring_map.remove(&digit) {
                        Some((other, saved)) => {
                            let order = pending_bond
                                .take()
                                .or(saved)
                                .unwrap_or(SmilesBondOrder::Implicit);
                            mol.add_bond(cur, other, SmilesBond::with_order(order));
                        }
                        None => {
                            ring_map.insert(digit, (cur, pending_bond.take()));
                        }
                    }
                }
                _ => {
                    let atom = self.parse_bare_atom()?;
                    let idx = mol.add_atom(atom);
                    bracketed.push(false);
                    connect(&mut mol, &mut current, &mut pending_bond, idx);
                }
            }
        }

        if !stack.is_empty() {
            return Err(SmilesError::UnmatchedParen { pos: self.pos });
        }
        if let Some((&digit, _)) = ring_map.iter().next() {
            return Err(SmilesError::UnclosedRing { digit });
        }

        assign_implicit_hydrogens(&mut mol, &bracketed);
        Ok(mol)
    }

    fn parse_ring_digit(&mut self) -> Result<u16, SmilesError> {
        if self.peek() == Some('%') {
            let start = self.pos;
            self.pos += 1;
            match (self.peek(), self.peek_at(1)) {
                (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit() => {
                    self.pos += 2;
                    Ok((a.to_digit(10).unwrap() * 10 + b.to_digit(10).unwrap()) as u16)
                }
                _ => Err(SmilesError::UnexpectedChar { pos: start, ch: '%' }),
            }
        } else {
            let d = self.chars[self.pos].to_digit(10).unwrap() as u16;
            self.pos += 1;
            Ok(d)
        }
    }

    fn parse_bare_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        let ch = self.chars[self.pos];

        if ch.is_ascii_lowercase() {
            let element = match ch {
                'b' => Element::B,
                'c' => Element::C,
                'n' => Element::N,
                'o' => Element::O,
                'p' => Element::P,
                's' => Element::S,
                _ => {
                    return Err(SmilesError::UnknownElement {
                        pos: start,
                        symbol: ch.to_string(),
                    })
                }
            };
            self.pos += 1;
            let mut atom = Atom::from_element(element);
            atom.is_aromatic = true;
            return Ok(atom);
        }

        // Two-letter organic-subset symbols first.
        if let Some(next) = self.peek_at(1) {
            if next.is_ascii_lowercase() {
                let symbol: String = [ch, next].iter().collect();
                if let Some(e) = Element::from_symbol(&symbol) {
                    if e.in_organic_subset() {
                        self.pos += 2;
                        return Ok(Atom::from_element(e));
                    }
                }
            }
        }

        let e = Element::from_symbol(&ch.to_string()).filter(|e| e.in_organic_subset());
        match e {
            Some(e) => {
                self.pos += 1;
                Ok(Atom::from_element(e))
            }
            None => Err(SmilesError::UnknownElement {
                pos: start,
                symbol: ch.to_string(),
            }),
        }
    }

    fn parse_bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let open = self.pos;
        self.pos += 1; // consume '['

        let isotope = self.parse_number().unwrap_or(0) as u16;

        let (element, aromatic) = self.parse_bracket_symbol(open)?;
        let mut atom = Atom::from_element(element);
        atom.isotope = isotope;
        atom.is_aromatic = aromatic;

        if self.peek() == Some('@') {
            self.pos += 1;
            if self.peek() == Some('@') {
                self.pos += 1;
                atom.chirality = Chirality::Cw;
            } else {
                atom.chirality = Chirality::Ccw;
            }
        }

        if self.peek() == Some('H') {
            self.pos += 1;
            atom.hydrogen_count = self.parse_number().unwrap_or(1) as u8;
        }

        match self.peek() {
            Some('+') => {
                self.pos += 1;
                atom.formal_charge = match self.parse_number() {
                    Some(n) => n as i8,
                    None => {
                        let mut charge = 1i8;
                        while self.peek() == Some('+') {
                            self.pos += 1;
                            charge += 1;
                        }
                        charge
                    }
                };
            }
            Some('-') => {
                self.pos += 1;
                atom.formal_charge = match self.parse_number() {
                    Some(n) => -(n as i8),
                    None => {
                        let mut charge = -1i8;
                        while self.peek() == Some('-') {
                            self.pos += 1;
                            charge -= 1;
                        }
                        charge
                    }
                };
            }
            _ => {}
        }

        // Atom class: accepted for compatibility, not stored. Map numbers
        // only mean something in reaction patterns.
        if self.peek() == Some(':') {
            self.pos += 1;
            self.parse_number()
                .ok_or(SmilesError::UnclosedBracket { pos: open })?;
        }

        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(atom)
            }
            _ => Err(SmilesError::UnclosedBracket { pos: open }),
        }
    }

    fn parse_bracket_symbol(&mut self, open: usize) -> Result<(Element, bool), SmilesError> {
        let ch = self
            .peek()
            .ok_or(SmilesError::UnclosedBracket { pos: open })?;

        if ch.is_ascii_lowercase() {
            // 'se' is the only two-letter aromatic symbol we accept.
            if ch == 's' && self.peek_at(1) == Some('e') {
                self.pos += 2;
                return Ok((Element::Se, true));
            }
            let element = match ch {
                'b' => Element::B,
                'c' => Element::C,
                'n' => Element::N,
                'o' => Element::O,
                'p' => Element::P,
                's' => Element::S,
                _ => {
                    return Err(SmilesError::UnknownElement {
                        pos: self.pos,
                        symbol: ch.to_string(),
                    })
                }
            };
            self.pos += 1;
            return Ok((element, true));
        }

        if !ch.is_ascii_uppercase() {
            return Err(SmilesError::UnexpectedChar { pos: self.pos, ch });
        }

        if let Some(next) = self.peek_at(1) {
            if next.is_ascii_lowercase() {
                let symbol: String = [ch, next].iter().collect();
                if let Some(e) = Element::from_symbol(&symbol) {
                    self.pos += 2;
                    return Ok((e, false));
                }
            }
        }
        match Element::from_symbol(&ch.to_string()) {
            Some(e) => {
                self.pos += 1;
                Ok((e, false))
            }
            None => Err(SmilesError::UnknownElement {
                pos: self.pos,
                symbol: ch.to_string(),
            }),
        }
    }
}

fn connect(
    mol: &mut Mol<Atom, SmilesBond>,
    current: &mut Option<NodeIndex>,
    pending_bond: &mut Option<SmilesBondOrder>,
    idx: NodeIndex,
) {
    if let Some(prev) = *current {
        let order = pending_bond.take().unwrap_or(SmilesBondOrder::Implicit);
        mol.add_bond(prev, idx, SmilesBond::with_order(order));
    }
    *current = Some(idx);
}

/// Fill in implicit hydrogen counts for atoms written without brackets.
///
/// Aromatic atoms are counted against the aromatic valence convention (a
/// bare aromatic carbon with two ring neighbors carries one hydrogen);
/// aliphatic atoms take the lowest default valence that covers their bond
/// order sum.
fn assign_implicit_hydrogens(mol: &mut Mol<Atom, SmilesBond>, bracketed: &[bool]) {
    let indices: Vec<NodeIndex> = mol.atoms().collect();
    for idx in indices {
        if bracketed[idx.index()] {
            continue;
        }
        let atom = mol.atom(idx);
        let h = if atom.is_aromatic {
            match atom.atomic_num {
                6 => (3usize).saturating_sub(mol.degree(idx)) as u8,
                _ => 0,
            }
        } else {
            let bond_sum: u16 = mol
                .bonds_of(idx)
                .map(|e| match mol.bond(e).order {
                    SmilesBondOrder::Double => 2u16,
                    SmilesBondOrder::Triple => 3,
                    _ => 1,
                })
                .sum();
            let element = Element::from_atomic_num(atom.atomic_num);
            element
                .map(|e| {
                    e.default_valences()
                        .iter()
                        .map(|&v| v as u16)
                        .find(|&v| v >= bond_sum)
                        .map(|v| (v - bond_sum) as u8)
                        .unwrap_or(0)
                })
                .unwrap_or(0)
        };
        mol.atom_mut(idx).hydrogen_count = h;
    }
}
