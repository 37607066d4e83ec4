use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;

/// Total hydrogen count of an atom: the implicit count plus explicit H
/// neighbors in the graph.
pub fn total_h_count(mol: &Mol<Atom, Bond>, idx: NodeIndex) -> u8 {
    let explicit = mol
        .neighbors(idx)
        .filter(|&n| mol.atom(n).atomic_num == 1)
        .count();
    mol.atom(idx).hydrogen_count.saturating_add(explicit as u8)
}

/// Whether any atom still carries implicit hydrogens.
pub fn has_implicit_hs(mol: &Mol<Atom, Bond>) -> bool {
    mol.atoms().any(|i| mol.atom(i).hydrogen_count > 0)
}

/// Materialize implicit hydrogens as real graph atoms.
///
/// The new H atoms carry empty metadata; they never existed as caller-visible
/// atoms, so there is no provenance to preserve. Patterns that name explicit
/// hydrogen atoms (e.g. a labeled thiol H) expect the caller to have built
/// those atoms into the graph already; this helper only covers the implicit
/// remainder.
pub fn add_explicit_hs(mol: &Mol<Atom, Bond>) -> Mol<Atom, Bond> {
    let mut out = mol.clone();
    let heavy: Vec<NodeIndex> = out.atoms().collect();
    for idx in heavy {
        let count = out.atom(idx).hydrogen_count;
        for _ in 0..count {
            let h = out.add_atom(Atom {
                atomic_num: 1,
                ..Atom::default()
            });
            out.add_bond(idx, h, Bond::single());
        }
        out.atom_mut(idx).hydrogen_count = 0;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn mol(smiles: &str) -> Mol<Atom, Bond> {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    #[test]
    fn methane_gains_four_hs() {
        let m = add_explicit_hs(&mol("C"));
        assert_eq!(m.atom_count(), 5);
        assert_eq!(m.bond_count(), 4);
        let c = m.atoms().next().unwrap();
        assert_eq!(m.atom(c).hydrogen_count, 0);
        assert_eq!(total_h_count(&m, c), 4);
    }

    #[test]
    fn ethanol_h_placement() {
        let m = add_explicit_hs(&mol("CCO"));
        // C2H6O: 3 heavy + 6 H
        assert_eq!(m.atom_count(), 9);
        assert!(!has_implicit_hs(&m));
    }

    #[test]
    fn total_count_mixes_implicit_and_explicit() {
        let m = mol("C");
        let c = m.atoms().next().unwrap();
        assert_eq!(total_h_count(&m, c), 4);

        let mut partial = m.clone();
        let h = partial.add_atom(Atom {
            atomic_num: 1,
            ..Atom::default()
        });
        partial.add_bond(c, h, Bond::single());
        partial.atom_mut(c).hydrogen_count = 3;
        assert_eq!(total_h_count(&partial, c), 4);
    }

    #[test]
    fn charged_atom_keeps_no_hs() {
        let m = add_explicit_hs(&mol("[O-]"));
        assert_eq!(m.atom_count(), 1);
    }
}
