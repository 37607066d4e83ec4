use std::fmt;

use crate::kekulize::KekulizeError;

/// Error returned when parsing a SMILES string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    /// Input was empty or whitespace only.
    EmptyInput,
    /// A character that fits no SMILES construct at this position.
    UnexpectedChar { pos: usize, ch: char },
    /// An element symbol outside the supported table.
    UnknownElement { pos: usize, symbol: String },
    /// A `[` without its matching `]`.
    UnclosedBracket { pos: usize },
    /// Unbalanced branch parentheses.
    UnmatchedParen { pos: usize },
    /// A ring-closure digit opened but never closed.
    UnclosedRing { digit: u16 },
    /// The aromatic system admits no Kekulé assignment.
    Kekulize(KekulizeError),
}

impl fmt::Display for SmilesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty SMILES input"),
            Self::UnexpectedChar { pos, ch } => {
                write!(f, "unexpected character {ch:?} at position {pos}")
            }
            Self::UnknownElement { pos, symbol } => {
                write!(f, "unknown element symbol {symbol:?} at position {pos}")
            }
            Self::UnclosedBracket { pos } => {
                write!(f, "unclosed bracket atom starting at position {pos}")
            }
            Self::UnmatchedParen { pos } => {
                write!(f, "unmatched parenthesis at position {pos}")
            }
            Self::UnclosedRing { digit } => write!(f, "unclosed ring closure {digit}"),
            Self::Kekulize(e) => write!(f, "kekulization failed: {e}"),
        }
    }
}

impl std::error::Error for SmilesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Kekulize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<KekulizeError> for SmilesError {
    fn from(e: KekulizeError) -> Self {
        Self::Kekulize(e)
    }
}
