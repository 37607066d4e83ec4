//! Mapped reaction application over annotated molecular graphs.
//!
//! The core of this crate is [`reaction::react`]: apply a reaction SMARTS
//! pattern to reactant molecules and enumerate every product set, carrying
//! each reactant atom's provenance metadata (name, synonyms, leaving flag,
//! caller-defined annotations) onto the corresponding product atom. Around
//! that sit exactly the supporting pieces the engine needs: SMILES
//! ingestion, a SMARTS query subset, and VF2-style substructure search.

pub mod atom;
pub mod bond;
pub mod element;
pub mod formula;
pub mod hydrogen;
pub mod kekulize;
pub mod mol;
pub mod reaction;
pub mod smarts;
pub mod smiles;
pub mod substruct;

pub use atom::{Atom, AtomMeta, Chirality, MetaValue};
pub use bond::{Bond, BondOrder, SmilesBond, SmilesBondOrder};
pub use element::Element;
pub use formula::mol_formula;
pub use kekulize::{kekulize, KekulizeError};
pub use mol::Mol;
pub use reaction::{
    from_reaction_smarts, react, to_reaction_smarts, ProductSet, ProductSets, Reaction,
    ReactionError, ReactionSmartsError,
};
pub use smarts::{
    from_smarts, get_smarts_match, get_smarts_matches, has_smarts_match, to_smarts, SmartsError,
};
pub use smiles::{from_smiles, parse_smiles, to_smiles, SmilesError};
pub use substruct::{
    find_substruct_matches, get_substruct_match, get_substruct_matches, has_substruct_match,
    AtomMapping,
};
