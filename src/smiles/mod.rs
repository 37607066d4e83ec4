mod error;
mod parser;
mod writer;

use crate::atom::Atom;
use crate::bond::{Bond, SmilesBond};
use crate::kekulize;
use crate::mol::Mol;

pub use error::SmilesError;
pub use writer::to_smiles;

/// Parse SMILES without resolving aromatic bonds.
pub fn parse_smiles(s: &str) -> Result<Mol<Atom, SmilesBond>, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    parser::parse(trimmed)
}

/// Parse SMILES and kekulize to concrete bond orders.
pub fn from_smiles(s: &str) -> Result<Mol<Atom, Bond>, SmilesError> {
    let mol = parse_smiles(s)?;
    Ok(kekulize::kekulize(mol)?)
}
