use std::fmt;

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder, SmilesBond, SmilesBondOrder};
use crate::mol::Mol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KekulizeError {
    /// No alternating single/double assignment covers every aromatic atom
    /// that needs a double bond.
    Unkekulizable { atom: usize },
}

impl fmt::Display for KekulizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unkekulizable { atom } => {
                write!(f, "no Kekulé assignment found for aromatic atom {atom}")
            }
        }
    }
}

impl std::error::Error for KekulizeError {}

/// Resolve aromatic bonds to concrete single/double orders.
///
/// Every aromatic atom that must take part in one double bond (carbons,
/// two-connected nitrogens, charged nitrogens) is paired with an aromatic
/// neighbor by maximum matching over the aromatic subgraph; matched pairs
/// become double bonds, the rest single. Atoms keep their aromatic flag;
/// only bond orders are rewritten.
pub fn kekulize(mol: Mol<Atom, SmilesBond>) -> Result<Mol<Atom, Bond>, KekulizeError> {
    let n = mol.atom_count();

    // Aromatic candidate edges, and concrete orders for everything else.
    let mut candidate = vec![false; mol.bond_count()];
    for edge in mol.bonds() {
        let (a, b) = mol
            .bond_endpoints(edge)
            .expect("edge endpoints must exist");
        candidate[edge.index()] = match mol.bond(edge).order {
            SmilesBondOrder::Aromatic => true,
            SmilesBondOrder::Implicit => mol.atom(a).is_aromatic && mol.atom(b).is_aromatic,
            _ => false,
        };
    }

    let mut needs_pi = vec![false; n];
    for idx in mol.atoms() {
        needs_pi[idx.index()] = needs_double_bond(&mol, idx, &candidate);
    }

    // Pair up atoms needing a double bond via augmenting paths.
    let mut partner: Vec<Option<usize>> = vec![None; n];
    for idx in mol.atoms() {
        let u = idx.index();
        if needs_pi[u] && partner[u].is_none() {
            let mut visited = vec![false; n];
            visited[u] = true;
            augment(&mol, &candidate, &needs_pi, u, &mut partner, &mut visited);
        }
    }
    if let Some(unmatched) = (0..n).find(|&u| needs_pi[u] && partner[u].is_none()) {
        return Err(KekulizeError::Unkekulizable { atom: unmatched });
    }

    let mut out = mol.map_bonds(|_| Bond::single());
    for edge in mol.bonds() {
        let (a, b) = mol.bond_endpoints(edge).expect("edge endpoints must exist");
        let order = if candidate[edge.index()] {
            if partner[a.index()] == Some(b.index()) {
                BondOrder::Double
            } else {
                BondOrder::Single
            }
        } else {
            match mol.bond(edge).order {
                SmilesBondOrder::Double => BondOrder::Double,
                SmilesBondOrder::Triple => BondOrder::Triple,
                _ => BondOrder::Single,
            }
        };
        let out_edge = out.bond_between(a, b).expect("topology is preserved");
        out.bond_mut(out_edge).order = order;
    }
    Ok(out)
}

/// One round of Kuhn-style augmentation from an unmatched atom. The source
/// atom is pre-marked visited by the caller so it can never be claimed as a
/// partner along its own augmenting path.
fn augment(
    mol: &Mol<Atom, SmilesBond>,
    candidate: &[bool],
    needs_pi: &[bool],
    u: usize,
    partner: &mut Vec<Option<usize>>,
    visited: &mut Vec<bool>,
) -> bool {
    let node = NodeIndex::new(u);
    let neighbors: Vec<usize> = mol
        .neighbors(node)
        .filter(|&v| {
            needs_pi[v.index()]
                && mol
                    .bond_between(node, v)
                    .map(|e| candidate[e.index()])
                    .unwrap_or(false)
        })
        .map(|v| v.index())
        .collect();
    for &v in &neighbors {
        if visited[v] {
            continue;
        }
        visited[v] = true;
        match partner[v] {
            None => {
                partner[u] = Some(v);
                partner[v] = Some(u);
                return true;
            }
            Some(w) => {
                if !visited[w] {
                    visited[w] = true;
                    if augment(mol, candidate, needs_pi, w, partner, visited) {
                        partner[u] = Some(v);
                        partner[v] = Some(u);
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Whether an aromatic atom must take part in exactly one double bond in any
/// Kekulé structure. Lone-pair donors (pyrrole N, furan O, thiophene S) and
/// atoms with an exocyclic double bond already written do not.
fn needs_double_bond(mol: &Mol<Atom, SmilesBond>, idx: NodeIndex, candidate: &[bool]) -> bool {
    let atom = mol.atom(idx);
    if !atom.is_aromatic {
        return false;
    }
    // An explicit double/triple bond outside the aromatic system saturates
    // the atom (e.g. the carbonyl carbons of 2-pyridone written aromatically).
    let exocyclic_pi = mol.bonds_of(idx).any(|e| {
        !candidate[e.index()]
            && matches!(
                mol.bond(e).order,
                SmilesBondOrder::Double | SmilesBondOrder::Triple
            )
    });
    if exocyclic_pi {
        return false;
    }
    let connections = mol.degree(idx) + atom.hydrogen_count as usize;
    match atom.atomic_num {
        6 => atom.formal_charge == 0,
        7 | 15 => {
            if atom.formal_charge > 0 {
                true
            } else {
                connections < 3
            }
        }
        8 | 16 | 34 => false,
        5 => false,
        _ => connections < 3,
    }
}
