use std::collections::HashMap;
use std::fmt::Write;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Chirality;
use crate::element::Element;
use crate::mol::Mol;

use super::query::{AtomExpr, BondExpr};

/// Write a query template back to SMARTS text.
///
/// The output round-trips through the parser but is not normalized beyond
/// that: logic trees are emitted with explicit `&`/`,`/`;` operators and
/// every compound expression is bracketed.
pub fn to_smarts(query: &Mol<AtomExpr, BondExpr>) -> String {
    let mut writer = Writer::new(query);
    writer.collect_ring_closures();
    let mut out = String::new();
    let mut first = true;
    let atoms: Vec<NodeIndex> = query.atoms().collect();
    for idx in atoms {
        if writer.visited[idx.index()] {
            continue;
        }
        if !first {
            out.push('.');
        }
        first = false;
        writer.write_atom(idx, None, &mut out);
    }
    out
}

struct Writer<'a> {
    query: &'a Mol<AtomExpr, BondExpr>,
    visited: Vec<bool>,
    tree_edges: Vec<bool>,
    ring_digits: HashMap<usize, Vec<(u16, BondExpr)>>,
}

impl<'a> Writer<'a> {
    fn new(query: &'a Mol<AtomExpr, BondExpr>) -> Self {
        Self {
            query,
            visited: vec![false; query.atom_count()],
            tree_edges: vec![false; query.bond_count()],
            ring_digits: HashMap::new(),
        }
    }

    fn collect_ring_closures(&mut self) {
        let mut seen = vec![false; self.query.atom_count()];
        let mut next_digit = 1u16;
        let atoms: Vec<NodeIndex> = self.query.atoms().collect();
        for root in atoms {
            if seen[root.index()] {
                continue;
            }
            let mut stack = vec![(root, None::<EdgeIndex>)];
            while let Some((node, via)) = stack.pop() {
                if seen[node.index()] {
                    continue;
                }
                seen[node.index()] = true;
                if let Some(edge) = via {
                    self.tree_edges[edge.index()] = true;
                }
                for edge in self.query.bonds_of(node) {
                    let (a, b) = self
                        .query
                        .bond_endpoints(edge)
                        .expect("edge endpoints must exist");
                    let other = if a == node { b } else { a };
                    if Some(edge) == via {
                        continue;
                    }
                    if seen[other.index()] {
                        if !self.tree_edges[edge.index()] {
                            let digit = next_digit;
                            next_digit += 1;
                            let expr = *self.query.bond(edge);
                            self.ring_digits
                                .entry(node.index())
                                .or_default()
                                .push((digit, expr));
                            self.ring_digits
                                .entry(other.index())
                                .or_default()
                                .push((digit, expr));
                        }
                    } else {
                        stack.push((other, Some(edge)));
                    }
                }
            }
        }
    }

    fn write_atom(&mut self, idx: NodeIndex, via: Option<EdgeIndex>, out: &mut String) {
        self.visited[idx.index()] = true;
        if let Some(edge) = via {
            out.push_str(bond_symbol(*self.query.bond(edge)));
        }
        out.push_str(&atom_token(self.query.atom(idx)));

        if let Some(digits) = self.ring_digits.get(&idx.index()).cloned() {
            for (digit, expr) in digits {
                out.push_str(bond_symbol(expr));
                if digit > 9 {
                    let _ = write!(out, "%{digit:02}");
                } else {
                    let _ = write!(out, "{digit}");
                }
            }
        }

        let children: Vec<(NodeIndex, EdgeIndex)> = self
            .query
            .neighbors(idx)
            .filter_map(|n| {
                let edge = self.query.bond_between(idx, n)?;
                (self.tree_edges[edge.index()] && !self.visited[n.index()]).then_some((n, edge))
            })
            .collect();

        for (i, &(child, edge)) in children.iter().enumerate() {
            if self.visited[child.index()] {
                continue;
            }
            if i == children.len() - 1 {
                self.write_atom(child, Some(edge), out);
            } else {
                out.push('(');
                self.write_atom(child, Some(edge), out);
                out.push(')');
            }
        }
    }
}

fn bond_symbol(expr: BondExpr) -> &'static str {
    match expr {
        BondExpr::SingleOrAromatic => "",
        BondExpr::Single => "-",
        BondExpr::Double => "=",
        BondExpr::Triple => "#",
        BondExpr::Aromatic => ":",
        BondExpr::True => "~",
    }
}

fn atom_token(expr: &AtomExpr) -> String {
    // Bare forms where the parser produces the identical expression back.
    match expr {
        AtomExpr::True => return "*".to_string(),
        AtomExpr::Aromatic => return "a".to_string(),
        AtomExpr::Aliphatic => return "A".to_string(),
        AtomExpr::Element {
            atomic_num,
            aromatic: Some(false),
        } => {
            if let Some(e) = Element::from_atomic_num(*atomic_num) {
                if e.in_organic_subset() {
                    return e.symbol().to_string();
                }
            }
        }
        AtomExpr::Element {
            atomic_num,
            aromatic: Some(true),
        } => {
            if let Some(e) = Element::from_atomic_num(*atomic_num) {
                if e.in_organic_subset() && e.can_be_aromatic() {
                    return e.symbol().to_lowercase();
                }
            }
        }
        _ => {}
    }
    format!("[{}]", expr_body(expr))
}

fn expr_body(expr: &AtomExpr) -> String {
    match expr {
        AtomExpr::True => "*".to_string(),
        AtomExpr::Aromatic => "a".to_string(),
        AtomExpr::Aliphatic => "A".to_string(),
        AtomExpr::Element {
            atomic_num,
            aromatic,
        } => match (Element::from_atomic_num(*atomic_num), aromatic) {
            (Some(e), Some(false)) => e.symbol().to_string(),
            (Some(e), Some(true)) if e.can_be_aromatic() => e.symbol().to_lowercase(),
            _ => format!("#{atomic_num}"),
        },
        AtomExpr::Isotope(i) => i.to_string(),
        AtomExpr::Degree(d) => format!("D{d}"),
        AtomExpr::TotalHCount(h) => format!("H{h}"),
        AtomExpr::Charge(c) if *c >= 0 => format!("+{c}"),
        AtomExpr::Charge(c) => format!("-{}", -c),
        AtomExpr::Chirality(Chirality::Ccw) => "@".to_string(),
        AtomExpr::Chirality(Chirality::Cw) => "@@".to_string(),
        AtomExpr::Chirality(Chirality::None) => String::new(),
        AtomExpr::AtomMapClass(n) => format!(":{n}"),
        AtomExpr::And(parts) => {
            // Map classes go last by convention.
            let mut body = Vec::new();
            let mut map = None;
            for p in parts {
                match p {
                    AtomExpr::AtomMapClass(_) => map = Some(expr_body(p)),
                    _ => body.push(expr_body(p)),
                }
            }
            let mut s = body.join("&");
            if let Some(m) = map {
                s.push_str(&m);
            }
            s
        }
        AtomExpr::Or(parts) => parts
            .iter()
            .map(expr_body)
            .collect::<Vec<_>>()
            .join(","),
        AtomExpr::Not(inner) => format!("!{}", expr_body(inner)),
    }
}
