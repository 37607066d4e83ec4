use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use crate::atom::Chirality;
use crate::element::Element;
use crate::mol::Mol;

use super::error::SmartsError;
use super::query::{AtomExpr, BondExpr};

pub(super) fn parse(input: &str) -> Result<Mol<AtomExpr, BondExpr>, SmartsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SmartsError::EmptyInput);
    }
    Parser::new(trimmed).parse()
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

    fn parse(&mut self) -> Result<Mol<AtomExpr, BondExpr>, SmartsError> {
        let mut mol: Mol<AtomExpr, BondExpr> = Mol::new();
        let mut stack: Vec<(NodeIndex, Option<BondExpr>)> = Vec::new();
        let mut current: Option<NodeIndex> = None;
        let mut pending_bond: Option<BondExpr> = None;
        let mut ring_map: HashMap<u16, (NodeIndex, Option<BondExpr>)> = HashMap::new();

        while let Some(ch) = self.peek() {
            match ch {
                '[' => {
                    let expr = self.parse_bracket()?;
                    let idx = mol.add_atom(expr);
                    if let Some(prev) = current {
                        let bond = pending_bond.take().unwrap_or(BondExpr::SingleOrAromatic);
                        mol.add_bond(prev, idx, bond);
                    }
                    current = Some(idx);
                }
                '(' => {
                    self.pos += 1;
                    match current {
                        Some(cur) => stack.push((cur, pending_bond.take())),
                        None => return Err(SmartsError::UnmatchedParen { pos: self.pos - 1 }),
                    }
                }
                ')' => {
                    self.pos += 1;
                    match stack.pop() {
                        Some((prev, saved)) => {
                            current = Some(prev);
                            pending_bond = saved;
                        }
                        None => return Err(SmartsError::UnmatchedParen { pos: self.pos - 1 }),
                    }
                }
                '.' => {
                    self.pos += 1;
                    current = None;
                    pending_bond = None;
                }
                '-' | '=' | '#' | '~' | ':' | '/' | '\\' => {
                    if pending_bond.is_some() {
                        return Err(SmartsError::UnexpectedChar { pos: self.pos, ch });
                    }
                    self.pos += 1;
                    pending_bond = Some(match ch {
                        '-' => BondExpr::Single,
                        '=' => BondExpr::Double,
                        '#' => BondExpr::Triple,
                        '~' => BondExpr::True,
                        ':' => BondExpr::Aromatic,
                        // Directional single bonds; stereo constraints are
                        // not enforced by this matcher.
                        _ => BondExpr::Single,
                    });
                }
                '@' => {
                    return Err(SmartsError::Unsupported {
                        pos: self.pos,
                        feature: "ring-bond query",
                    });
                }
                '$' => {
                    return Err(SmartsError::Unsupported {
                        pos: self.pos,
                        feature: "recursive query",
                    });
                }
                '0'..='9' | '%' => {
                    let pos = self.pos;
                    let digit = self.parse_ring_digit()?;
                    let cur = current.ok_or(SmartsError::UnexpectedChar { pos, ch })?;
                    match ring_map.remove(&digit) {
                        Some((other, saved)) => {
                            let bond = pending_bond
                                .take()
                                .or(saved)
                                .unwrap_or(BondExpr::SingleOrAromatic);
                            mol.add_bond(cur, other, bond);
                        }
                        None => {
                            ring_map.insert(digit, (cur, pending_bond.take()));
                        }
                    }
                }
                _ => {
                    let expr = self.parse_bare_atom()?;
                    let idx = mol.add_atom(expr);
                    if let Some(prev) = current {
                        let bond = pending_bond.take().unwrap_or(BondExpr::SingleOrAromatic);
                        mol.add_bond(prev, idx, bond);
                    }
                    current = Some(idx);
                }
            }
        }

        if !stack.is_empty() {
            return Err(SmartsError::UnmatchedParen { pos: self.pos });
        }
        if let Some((&digit, _)) = ring_map.iter().next() {
            return Err(SmartsError::UnclosedRing { digit });
        }

        Ok(mol)
    }

    fn parse_ring_digit(&mut self) -> Result<u16, SmartsError> {
        if self.peek() == Some('%') {
            let start = self.pos;
            self.pos += 1;
            match (self.peek(), self.peek_at(1)) {
                (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit() => {
                    self.pos += 2;
                    Ok((a.to_digit(10).unwrap() * 10 + b.to_digit(10).unwrap()) as u16)
                }
                _ => Err(SmartsError::UnexpectedChar { pos: start, ch: '%' }),
            }
        } else {
            let d = self.chars[self.pos].to_digit(10).unwrap() as u16;
            self.pos += 1;
            Ok(d)
        }
    }

    fn parse_bare_atom(&mut self) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        let ch = self.chars[self.pos];

        match ch {
            '*' => {
                self.pos += 1;
                return Ok(AtomExpr::True);
            }
            'a' => {
                self.pos += 1;
                return Ok(AtomExpr::Aromatic);
            }
            'A' => {
                self.pos += 1;
                return Ok(AtomExpr::Aliphatic);
            }
            _ => {}
        }

        if ch.is_ascii_lowercase() {
            let element = match ch {
                'b' => Element::B,
                'c' => Element::C,
                'n' => Element::N,
                'o' => Element::O,
                'p' => Element::P,
                's' => Element::S,
                _ => {
                    return Err(SmartsError::UnknownElement {
                        pos: start,
                        symbol: ch.to_string(),
                    })
                }
            };
            self.pos += 1;
            return Ok(AtomExpr::Element {
                atomic_num: element.atomic_num(),
                aromatic: Some(true),
            });
        }

        if let Some(next) = self.peek_at(1) {
            if next.is_ascii_lowercase() {
                let symbol: String = [ch, next].iter().collect();
                if let Some(e) = Element::from_symbol(&symbol) {
                    if e.in_organic_subset() {
                        self.pos += 2;
                        return Ok(AtomExpr::Element {
                            atomic_num: e.atomic_num(),
                            aromatic: Some(false),
                        });
                    }
                }
            }
        }

        match Element::from_symbol(&ch.to_string()).filter(|e| e.in_organic_subset()) {
            Some(e) => {
                self.pos += 1;
                Ok(AtomExpr::Element {
                    atomic_num: e.atomic_num(),
                    aromatic: Some(false),
                })
            }
            None => Err(SmartsError::UnexpectedChar { pos: start, ch }),
        }
    }

    // --- Bracket expression: `;` over `,` over `&`/adjacency over `!` ---

    fn parse_bracket(&mut self) -> Result<AtomExpr, SmartsError> {
        let open = self.pos;
        self.pos += 1; // consume '['

        let expr = self.parse_semi_expr(open)?;

        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(expr)
            }
            _ => Err(SmartsError::UnclosedBracket { pos: open }),
        }
    }

    fn parse_semi_expr(&mut self, open: usize) -> Result<AtomExpr, SmartsError> {
        let mut parts = vec![self.parse_or_expr(open)?];
        while self.peek() == Some(';') {
            self.pos += 1;
            parts.push(self.parse_or_expr(open)?);
        }
        Ok(flatten_and(parts))
    }

    fn parse_or_expr(&mut self, open: usize) -> Result<AtomExpr, SmartsError> {
        let mut parts = vec![self.parse_and_expr(open)?];
        while self.peek() == Some(',') {
            self.pos += 1;
            parts.push(self.parse_and_expr(open)?);
        }
        if parts.len() == 1 {
            Ok(parts.pop().expect("one element"))
        } else {
            Ok(AtomExpr::Or(parts))
        }
    }

    fn parse_and_expr(&mut self, open: usize) -> Result<AtomExpr, SmartsError> {
        let mut parts = vec![self.parse_unary(open, true)?];
        loop {
            // `H` reads as the element only while nothing but a leading
            // isotope has been seen, so `[2H]` is deuterium but `[CH3]`
            // is a hydrogen count.
            let elemental = parts.iter().all(|p| matches!(p, AtomExpr::Isotope(_)));
            match self.peek() {
                Some('&') => {
                    self.pos += 1;
                    parts.push(self.parse_unary(open, elemental)?);
                }
                Some(ch) if ch != ';' && ch != ',' && ch != ']' => {
                    parts.push(self.parse_unary(open, elemental)?);
                }
                _ => break,
            }
        }
        Ok(flatten_and(parts))
    }

    fn parse_unary(&mut self, open: usize, first: bool) -> Result<AtomExpr, SmartsError> {
        if self.peek() == Some('!') {
            self.pos += 1;
            let inner = self.parse_unary(open, first)?;
            return Ok(AtomExpr::Not(Box::new(inner)));
        }
        self.parse_primitive(open, first)
    }

    fn parse_primitive(&mut self, open: usize, first: bool) -> Result<AtomExpr, SmartsError> {
        let ch = self
            .peek()
            .ok_or(SmartsError::UnclosedBracket { pos: open })?;

        match ch {
            '0'..='9' => {
                let n = self.parse_number().expect("digit peeked");
                Ok(AtomExpr::Isotope(n as u16))
            }
            '#' => {
                self.pos += 1;
                let n = self
                    .parse_number()
                    .ok_or(SmartsError::UnexpectedChar { pos: self.pos, ch: '#' })?;
                Ok(AtomExpr::Element {
                    atomic_num: n as u8,
                    aromatic: None,
                })
            }
            '*' => {
                self.pos += 1;
                Ok(AtomExpr::True)
            }
            'a' => {
                self.pos += 1;
                Ok(AtomExpr::Aromatic)
            }
            // `A` is the aliphatic class unless it starts a two-letter
            // element symbol (`Ag`, `Au`).
            'A' => {
                let starts_element = self
                    .peek_at(1)
                    .map(|next| {
                        next.is_ascii_lowercase()
                            && Element::from_symbol(&[ch, next].iter().collect::<String>())
                                .is_some()
                    })
                    .unwrap_or(false);
                if starts_element {
                    self.parse_bracket_element()
                } else {
                    self.pos += 1;
                    Ok(AtomExpr::Aliphatic)
                }
            }
            'D' => {
                self.pos += 1;
                let n = self.parse_number().unwrap_or(1);
                Ok(AtomExpr::Degree(n as u8))
            }
            'H' => {
                self.pos += 1;
                match self.parse_number() {
                    Some(n) => Ok(AtomExpr::TotalHCount(n as u8)),
                    // Leading H is the element; anywhere else it is an
                    // implicit count of one, as in `[C@H]`.
                    None if first => Ok(AtomExpr::Element {
                        atomic_num: 1,
                        aromatic: Some(false),
                    }),
                    None => Ok(AtomExpr::TotalHCount(1)),
                }
            }
            '+' => {
                self.pos += 1;
                let charge = match self.parse_number() {
                    Some(n) => n as i8,
                    None => {
                        let mut c = 1i8;
                        while self.peek() == Some('+') {
                            self.pos += 1;
                            c += 1;
                        }
                        c
                    }
                };
                Ok(AtomExpr::Charge(charge))
            }
            '-' => {
                self.pos += 1;
                let charge = match self.parse_number() {
                    Some(n) => -(n as i8),
                    None => {
                        let mut c = -1i8;
                        while self.peek() == Some('-') {
                            self.pos += 1;
                            c -= 1;
                        }
                        c
                    }
                };
                Ok(AtomExpr::Charge(charge))
            }
            '@' => {
                self.pos += 1;
                if self.peek() == Some('@') {
                    self.pos += 1;
                    Ok(AtomExpr::Chirality(Chirality::Cw))
                } else {
                    Ok(AtomExpr::Chirality(Chirality::Ccw))
                }
            }
            ':' => {
                self.pos += 1;
                let n = self
                    .parse_number()
                    .ok_or(SmartsError::UnexpectedChar { pos: self.pos, ch: ':' })?;
                Ok(AtomExpr::AtomMapClass(n as u16))
            }
            'R' | 'r' | 'x' | 'X' | 'v' | 'h' | '^' | '{' | 'z' | 'Z' => {
                Err(SmartsError::Unsupported {
                    pos: self.pos,
                    feature: "ring/valence/hybridization class",
                })
            }
            '$' => Err(SmartsError::Unsupported {
                pos: self.pos,
                feature: "recursive query",
            }),
            _ => self.parse_bracket_element(),
        }
    }

    fn parse_bracket_element(&mut self) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        let ch = self.chars[self.pos];

        if ch.is_ascii_lowercase() {
            if ch == 's' && self.peek_at(1) == Some('e') {
                self.pos += 2;
                return Ok(AtomExpr::Element {
                    atomic_num: Element::Se.atomic_num(),
                    aromatic: Some(true),
                });
            }
            let element = match ch {
                'b' => Element::B,
                'c' => Element::C,
                'n' => Element::N,
                'o' => Element::O,
                'p' => Element::P,
                's' => Element::S,
                _ => {
                    return Err(SmartsError::UnknownElement {
                        pos: start,
                        symbol: ch.to_string(),
                    })
                }
            };
            self.pos += 1;
            return Ok(AtomExpr::Element {
                atomic_num: element.atomic_num(),
                aromatic: Some(true),
            });
        }

        if !ch.is_ascii_uppercase() {
            return Err(SmartsError::UnexpectedChar { pos: start, ch });
        }

        if let Some(next) = self.peek_at(1) {
            if next.is_ascii_lowercase() {
                let symbol: String = [ch, next].iter().collect();
                if let Some(e) = Element::from_symbol(&symbol) {
                    self.pos += 2;
                    return Ok(AtomExpr::Element {
                        atomic_num: e.atomic_num(),
                        aromatic: Some(false),
                    });
                }
            }
        }
        match Element::from_symbol(&ch.to_string()) {
            Some(e) => {
                self.pos += 1;
                Ok(AtomExpr::Element {
                    atomic_num: e.atomic_num(),
                    aromatic: Some(false),
                })
            }
            None => Err(SmartsError::UnknownElement {
                pos: start,
                symbol: ch.to_string(),
            }),
        }
    }
}

fn flatten_and(mut parts: Vec<AtomExpr>) -> AtomExpr {
    if parts.len() == 1 {
        parts.pop().expect("one element")
    } else {
        AtomExpr::And(parts)
    }
}
