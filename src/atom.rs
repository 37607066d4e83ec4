use std::collections::BTreeMap;

use crate::element::Element;

/// Tetrahedral chirality tag, parsed from `@`/`@@` and carried verbatim.
///
/// The engine neither validates nor enumerates stereochemistry; the tag is
/// just another atom attribute a pattern may test or rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chirality {
    /// No chirality recorded.
    #[default]
    None,
    /// Clockwise (`@@`) arrangement.
    Cw,
    /// Counterclockwise (`@`) arrangement.
    Ccw,
}

/// A caller-defined annotation value: a scalar or an unordered list of strings.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Text(String),
    Flag(bool),
    Int(i64),
    List(Vec<String>),
}

/// Provenance metadata attached to an atom.
///
/// The well-known fields cover what residue-definition workflows actually
/// track per atom: a canonical name, alternate names, and whether the atom
/// leaves once its fragment is bonded into a larger assembly. Everything else
/// goes into `extra`, which the reaction engine copies around without ever
/// interpreting it.
///
/// The engine's contract is copy-verbatim: it never renames an atom, never
/// infers the leaving flag, and never drops a key. An atom created by a
/// rewrite (rather than mapped from a reactant) starts with
/// `AtomMeta::default()` and it is the caller's job to name it afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtomMeta {
    pub name: Option<String>,
    pub synonyms: Vec<String>,
    pub leaving: bool,
    pub extra: BTreeMap<String, MetaValue>,
}

impl AtomMeta {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.synonyms.is_empty() && !self.leaving && self.extra.is_empty()
    }
}

/// An atom of a molecular graph: intrinsic chemistry plus provenance.
///
/// Chemical fields may be rewritten by a reaction pattern; the `meta` block
/// may not. Computed properties (valence, ring membership, coordinates) are
/// deliberately absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    /// Atomic number (1 = H, 6 = C, 7 = N, ...).
    pub atomic_num: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Mass number; `0` means natural isotopic abundance.
    pub isotope: u16,
    /// Number of implicit (suppressed) hydrogens. Not graph nodes; after
    /// SMILES parsing this count is the single source of truth for how many
    /// unwritten Hs the atom carries.
    pub hydrogen_count: u8,
    /// Whether the atom sits in an aromatic system. Bond orders stay concrete
    /// Kekulé assignments regardless of this flag.
    pub is_aromatic: bool,
    /// Tetrahedral chirality tag.
    pub chirality: Chirality,
    /// Provenance metadata, propagated verbatim through reactions.
    pub meta: AtomMeta,
}

impl Atom {
    pub fn from_element(element: Element) -> Self {
        Self {
            atomic_num: element.atomic_num(),
            ..Self::default()
        }
    }

    /// Builder-style helper for labeling workflows.
    pub fn with_name(mut self, name: &str) -> Self {
        self.meta.name = Some(name.to_string());
        self
    }

    pub fn with_leaving(mut self, leaving: bool) -> Self {
        self.meta.leaving = leaving;
        self
    }
}
