/// Concrete Kekulé bond order. Aromatic input is resolved to alternating
/// single/double bonds before any matching or rewriting happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
}

impl BondOrder {
    /// Contribution to an atom's valence sum.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bond {
    pub order: BondOrder,
}

impl Bond {
    pub fn single() -> Self {
        Self {
            order: BondOrder::Single,
        }
    }

    pub fn with_order(order: BondOrder) -> Self {
        Self { order }
    }
}

/// Bond order as written in SMILES, before kekulization.
///
/// `Implicit` is what an unwritten bond parses to; it resolves to single or
/// aromatic depending on the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SmilesBondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
    #[default]
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SmilesBond {
    pub order: SmilesBondOrder,
}

impl SmilesBond {
    pub fn with_order(order: SmilesBondOrder) -> Self {
        Self { order }
    }
}
