use std::fmt;

/// Error returned when parsing a SMARTS pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmartsError {
    /// Input was empty or whitespace only.
    EmptyInput,
    /// A character that fits no supported SMARTS construct here.
    UnexpectedChar { pos: usize, ch: char },
    /// An element symbol outside the supported table.
    UnknownElement { pos: usize, symbol: String },
    /// A recognized SMARTS construct this crate deliberately does not
    /// implement (ring classes, recursive queries, ...). Rejected rather
    /// than silently ignored.
    Unsupported { pos: usize, feature: &'static str },
    /// A `[` without its matching `]`.
    UnclosedBracket { pos: usize },
    /// Unbalanced branch parentheses.
    UnmatchedParen { pos: usize },
    /// A ring-closure digit opened but never closed.
    UnclosedRing { digit: u16 },
}

impl fmt::Display for SmartsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty SMARTS input"),
            Self::UnexpectedChar { pos, ch } => {
                write!(f, "unexpected character {ch:?} at position {pos}")
            }
            Self::UnknownElement { pos, symbol } => {
                write!(f, "unknown element symbol {symbol:?} at position {pos}")
            }
            Self::Unsupported { pos, feature } => {
                write!(f, "unsupported SMARTS feature at position {pos}: {feature}")
            }
            Self::UnclosedBracket { pos } => {
                write!(f, "unclosed bracket expression starting at position {pos}")
            }
            Self::UnmatchedParen { pos } => {
                write!(f, "unmatched parenthesis at position {pos}")
            }
            Self::UnclosedRing { digit } => write!(f, "unclosed ring closure {digit}"),
        }
    }
}

impl std::error::Error for SmartsError {}
