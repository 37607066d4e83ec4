use std::collections::HashMap;
use std::fmt::Write;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::{Atom, Chirality};
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::mol::Mol;

/// Write a molecule as non-canonical Kekulé SMILES.
///
/// Output order follows atom insertion order, aromatic atoms are written
/// uppercase with their resolved bond orders, and no attempt is made at
/// canonicalization. This is an inspection and interchange format, not an
/// identity key.
pub fn to_smiles(mol: &Mol<Atom, Bond>) -> String {
    let mut writer = Writer::new(mol);
    writer.collect_ring_closures();
    let mut out = String::new();
    let mut first = true;
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
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
    mol: &'a Mol<Atom, Bond>,
    visited: Vec<bool>,
    tree_edges: Vec<bool>,
    // Per-atom ring closure digits with the bond order to print.
    ring_digits: HashMap<usize, Vec<(u16, BondOrder)>>,
}

impl<'a> Writer<'a> {
    fn new(mol: &'a Mol<Atom, Bond>) -> Self {
        Self {
            mol,
            visited: vec![false; mol.atom_count()],
            tree_edges: vec![false; mol.bond_count()],
            ring_digits: HashMap::new(),
        }
    }

    /// First pass: depth-first spanning forest; every non-tree edge becomes
    /// a ring closure digit recorded on both endpoints.
    fn collect_ring_closures(&mut self) {
        let mut seen = vec![false; self.mol.atom_count()];
        let mut next_digit = 1u16;
        let atoms: Vec<NodeIndex> = self.mol.atoms().collect();
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
                for edge in self.mol.bonds_of(node) {
                    let (a, b) = self
                        .mol
                        .bond_endpoints(edge)
                        .expect("edge endpoints must exist");
                    let other = if a == node { b } else { a };
                    if Some(edge) == via {
                        continue;
                    }
                    if seen[other.index()] {
                        if !self.tree_edges[edge.index()] {
                            let order = self.mol.bond(edge).order;
                            let digit = next_digit;
                            next_digit += 1;
                            self.ring_digits
                                .entry(node.index())
                                .or_default()
                                .push((digit, order));
                            self.ring_digits
                                .entry(other.index())
                                .or_default()
                                .push((digit, order));
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
            out.push_str(bond_symbol(self.mol.bond(edge).order));
        }
        out.push_str(&atom_token(self.mol, idx));

        if let Some(digits) = self.ring_digits.get(&idx.index()).cloned() {
            for (digit, order) in digits {
                out.push_str(bond_symbol(order));
                if digit > 9 {
                    let _ = write!(out, "%{digit:02}");
                } else {
                    let _ = write!(out, "{digit}");
                }
            }
        }

        let children: Vec<(NodeIndex, EdgeIndex)> = self
            .mol
            .neighbors(idx)
            .filter_map(|n| {
                let edge = self.mol.bond_between(idx, n)?;
                (self.tree_edges[edge.index()] && !self.visited[n.index()]).then_some((n, edge))
            })
            .collect();

        for (i, &(child, edge)) in children.iter().enumerate() {
            if self.visited[child.index()] {
                continue;
            }
            let last = i == children.len() - 1;
            if last {
                self.write_atom(child, Some(edge), out);
            } else {
                out.push('(');
                self.write_atom(child, Some(edge), out);
                out.push(')');
            }
        }
    }
}

fn bond_symbol(order: BondOrder) -> &'static str {
    match order {
        BondOrder::Single => "",
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
    }
}

fn atom_token(mol: &Mol<Atom, Bond>, idx: NodeIndex) -> String {
    let atom = mol.atom(idx);
    let element = Element::from_atomic_num(atom.atomic_num);
    let symbol = element.map(Element::symbol).unwrap_or("*");

    let bond_sum: u16 = mol
        .bonds_of(idx)
        .map(|e| mol.bond(e).order.valence() as u16)
        .sum();
    let derived_h = element
        .and_then(|e| {
            e.default_valences()
                .iter()
                .map(|&v| v as u16)
                .find(|&v| v >= bond_sum)
                .map(|v| (v - bond_sum) as u8)
        })
        .unwrap_or(0);

    let bare_ok = element.map(Element::in_organic_subset).unwrap_or(false)
        && atom.formal_charge == 0
        && atom.isotope == 0
        && atom.chirality == Chirality::None
        && atom.hydrogen_count == derived_h;

    if bare_ok {
        return symbol.to_string();
    }

    let mut token = String::from("[");
    if atom.isotope != 0 {
        let _ = write!(token, "{}", atom.isotope);
    }
    token.push_str(symbol);
    match atom.chirality {
        Chirality::None => {}
        Chirality::Ccw => token.push('@'),
        Chirality::Cw => token.push_str("@@"),
    }
    match atom.hydrogen_count {
        0 => {}
        1 => token.push('H'),
        n => {
            let _ = write!(token, "H{n}");
        }
    }
    match atom.formal_charge {
        0 => {}
        1 => token.push('+'),
        -1 => token.push('-'),
        n if n > 1 => {
            let _ = write!(token, "+{n}");
        }
        n => {
            let _ = write!(token, "-{}", -n);
        }
    }
    token.push(']');
    token
}
