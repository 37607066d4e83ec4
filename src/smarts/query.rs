use petgraph::graph::NodeIndex;

use crate::atom::{Atom, Chirality};
use crate::bond::{Bond, BondOrder};
use crate::hydrogen::total_h_count;
use crate::mol::Mol;

/// AST node for a SMARTS atom query.
///
/// Each variant is a primitive test or a logical combination; during
/// substructure search [`AtomExpr::matches`] evaluates the tree against a
/// target atom in its molecule context.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    /// Matches any atom (`*`).
    True,
    /// Matches by element. `aromatic` is `None` for `#n` (either case),
    /// `Some(true)` for lowercase, `Some(false)` for uppercase.
    Element {
        atomic_num: u8,
        aromatic: Option<bool>,
    },
    /// Any aromatic atom (`a`).
    Aromatic,
    /// Any aliphatic atom (`A`).
    Aliphatic,
    /// Specific mass number.
    Isotope(u16),
    /// Heavy-neighbor count (`D<n>`).
    Degree(u8),
    /// Total hydrogen count, implicit plus explicit neighbors (`H<n>`).
    TotalHCount(u8),
    /// Formal charge.
    Charge(i8),
    /// Tetrahedral chirality tag (`@`/`@@`).
    Chirality(Chirality),
    /// Atom map number (`:n`). Always matches; carries reaction
    /// correspondence, not a constraint.
    AtomMapClass(u16),
    /// Logical AND of sub-expressions.
    And(Vec<AtomExpr>),
    /// Logical OR of sub-expressions.
    Or(Vec<AtomExpr>),
    /// Logical NOT of a sub-expression.
    Not(Box<AtomExpr>),
}

impl AtomExpr {
    pub fn matches(&self, mol: &Mol<Atom, Bond>, idx: NodeIndex) -> bool {
        let atom = mol.atom(idx);
        match self {
            Self::True => true,
            Self::Element {
                atomic_num,
                aromatic,
            } => {
                atom.atomic_num == *atomic_num
                    && aromatic.map(|a| atom.is_aromatic == a).unwrap_or(true)
            }
            Self::Aromatic => atom.is_aromatic,
            Self::Aliphatic => !atom.is_aromatic,
            Self::Isotope(i) => atom.isotope == *i,
            Self::Degree(d) => mol.degree(idx) == *d as usize,
            Self::TotalHCount(h) => total_h_count(mol, idx) == *h,
            Self::Charge(c) => atom.formal_charge == *c,
            Self::Chirality(c) => atom.chirality == *c,
            Self::AtomMapClass(_) => true,
            Self::And(parts) => parts.iter().all(|p| p.matches(mol, idx)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(mol, idx)),
            Self::Not(inner) => !inner.matches(mol, idx),
        }
    }

    /// The atom map number carried by this expression, if any. Zero map
    /// classes count as unmapped.
    pub fn map_num(&self) -> Option<u16> {
        match self {
            Self::AtomMapClass(0) => None,
            Self::AtomMapClass(n) => Some(*n),
            Self::And(parts) => parts.iter().find_map(AtomExpr::map_num),
            _ => None,
        }
    }

    /// Whether the expression pins the atom's total hydrogen count.
    pub fn fixes_h_count(&self) -> bool {
        match self {
            Self::TotalHCount(_) => true,
            Self::And(parts) => parts.iter().any(AtomExpr::fixes_h_count),
            _ => false,
        }
    }

    /// Whether the expression can only match a hydrogen atom node.
    pub fn is_hydrogen(&self) -> bool {
        match self {
            Self::Element { atomic_num: 1, .. } => true,
            Self::And(parts) => parts.iter().any(AtomExpr::is_hydrogen),
            _ => false,
        }
    }
}

/// AST node for a SMARTS bond query.
///
/// Implicit SMARTS bonds default to [`BondExpr::SingleOrAromatic`], unlike
/// SMILES where an unwritten bond is plain single.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondExpr {
    /// Any bond (`~`).
    True,
    /// Single bond (`-`), excluding bonds inside an aromatic system.
    Single,
    /// Double bond (`=`), excluding bonds inside an aromatic system.
    Double,
    /// Triple bond (`#`).
    Triple,
    /// Aromatic bond (`:`): both endpoints aromatic.
    Aromatic,
    /// The unwritten default.
    SingleOrAromatic,
}

impl BondExpr {
    /// Evaluate against a concrete bond; `aromatic_pair` says whether both
    /// endpoints carry the aromatic flag (Kekulé orders alone cannot tell an
    /// aromatic bond from a plain one).
    pub fn matches(&self, bond: &Bond, aromatic_pair: bool) -> bool {
        match self {
            Self::True => true,
            Self::Single => bond.order == BondOrder::Single && !aromatic_pair,
            Self::Double => bond.order == BondOrder::Double && !aromatic_pair,
            Self::Triple => bond.order == BondOrder::Triple,
            Self::Aromatic => aromatic_pair,
            Self::SingleOrAromatic => bond.order == BondOrder::Single || aromatic_pair,
        }
    }
}
