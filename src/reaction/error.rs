use std::fmt;

use crate::smarts::SmartsError;

/// Error returned when parsing or validating a reaction SMARTS string.
///
/// Map-number consistency is checked here, at construction time: a pattern
/// that could only fail once reactants arrive is a pattern-authoring bug and
/// should never make it into a `Reaction` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionSmartsError {
    /// No `>>` (or `>agents>`) separator found.
    MissingSeparator,
    /// More than two `>` separators.
    TooManySeparators,
    /// The reactant section is empty.
    EmptyReactants,
    /// The product section is empty.
    EmptyProducts,
    /// A SMARTS component failed to parse.
    InvalidComponent {
        section: &'static str,
        detail: SmartsError,
    },
    /// A map number used on two atoms of the same side.
    DuplicateMapNumber {
        section: &'static str,
        map_num: u16,
    },
    /// A product atom whose map number has no reactant-side counterpart:
    /// the atom claims an origin that does not exist.
    UnmappedProductAtom { map_num: u16 },
}

impl fmt::Display for ReactionSmartsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator => write!(f, "no '>>' separator found in reaction SMARTS"),
            Self::TooManySeparators => write!(f, "too many '>' separators in reaction SMARTS"),
            Self::EmptyReactants => write!(f, "reaction has no reactant templates"),
            Self::EmptyProducts => write!(f, "reaction has no product templates"),
            Self::InvalidComponent { section, detail } => {
                write!(f, "invalid {section} component: {detail}")
            }
            Self::DuplicateMapNumber { section, map_num } => {
                write!(f, "map number {map_num} appears twice in {section} templates")
            }
            Self::UnmappedProductAtom { map_num } => {
                write!(
                    f,
                    "product map number {map_num} has no reactant-side counterpart"
                )
            }
        }
    }
}

impl std::error::Error for ReactionSmartsError {}

/// Error returned when applying a reaction to reactant molecules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionError {
    /// The number of reactant molecules does not match the number of
    /// reactant templates. Checked before any matching work.
    WrongReactantCount { expected: usize, got: usize },
    /// A mapped product atom whose reactant origin could not be resolved
    /// while building a product. With a validated pattern this indicates an
    /// engine defect; it is surfaced rather than papered over with blank
    /// metadata.
    MissingProvenance { map_num: u16 },
}

impl fmt::Display for ReactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongReactantCount { expected, got } => {
                write!(f, "expected {expected} reactants, got {got}")
            }
            Self::MissingProvenance { map_num } => {
                write!(
                    f,
                    "no reactant origin for mapped product atom {map_num}; provenance lost"
                )
            }
        }
    }
}

impl std::error::Error for ReactionError {}
