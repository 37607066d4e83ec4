mod error;
mod parser;
pub mod query;
mod writer;

pub use error::SmartsError;
pub use query::{AtomExpr, BondExpr};
pub use writer::to_smarts;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
use crate::substruct::{find_substruct_matches, AtomMapping};

/// Parse a SMARTS pattern into a query template.
pub fn from_smarts(s: &str) -> Result<Mol<AtomExpr, BondExpr>, SmartsError> {
    parser::parse(s)
}

pub fn has_smarts_match(target: &Mol<Atom, Bond>, query: &Mol<AtomExpr, BondExpr>) -> bool {
    get_smarts_match(target, query).is_some()
}

pub fn get_smarts_match(
    target: &Mol<Atom, Bond>,
    query: &Mol<AtomExpr, BondExpr>,
) -> Option<AtomMapping> {
    smarts_matches(target, query, true).into_iter().next()
}

/// Every embedding of the query, automorphic duplicates included, in a
/// deterministic order.
pub fn get_smarts_matches(
    target: &Mol<Atom, Bond>,
    query: &Mol<AtomExpr, BondExpr>,
) -> Vec<AtomMapping> {
    smarts_matches(target, query, false)
}

fn smarts_matches(
    target: &Mol<Atom, Bond>,
    query: &Mol<AtomExpr, BondExpr>,
    first_only: bool,
) -> Vec<AtomMapping> {
    find_substruct_matches(
        target,
        query,
        |t_idx, q_idx| query.atom(q_idx).matches(target, t_idx),
        |t_edge, q_edge| {
            let (a, b) = target
                .bond_endpoints(t_edge)
                .expect("edge endpoints must exist");
            let aromatic_pair = target.atom(a).is_aromatic && target.atom(b).is_aromatic;
            query.bond(q_edge).matches(target.bond(t_edge), aromatic_pair)
        },
        first_only,
    )
}

/// Whether any atom of the query can only bind a hydrogen node. Reactant
/// molecules need their implicit hydrogens materialized before such a query
/// can see them.
pub fn references_explicit_hydrogen(query: &Mol<AtomExpr, BondExpr>) -> bool {
    query.atoms().any(|i| query.atom(i).is_hydrogen())
}
