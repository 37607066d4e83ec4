use std::collections::BTreeMap;
use std::fmt::Write;

use crate::atom::Atom;
use crate::element::Element;
use crate::mol::Mol;

/// Molecular formula in Hill order: C first, then H, then the remaining
/// elements alphabetically; with no carbon present, everything alphabetical.
///
/// Hydrogen counts both implicit hydrogens and explicit H atoms.
pub fn mol_formula<B>(mol: &Mol<Atom, B>) -> String {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut hydrogens = 0usize;

    for idx in mol.atoms() {
        let atom = mol.atom(idx);
        hydrogens += atom.hydrogen_count as usize;
        if atom.atomic_num == 1 {
            hydrogens += 1;
            continue;
        }
        let sym = Element::from_atomic_num(atom.atomic_num)
            .map(Element::symbol)
            .unwrap_or("?");
        *counts.entry(sym).or_insert(0) += 1;
    }

    let mut out = String::new();
    let carbon = counts.remove("C");
    if let Some(n) = carbon {
        push_part(&mut out, "C", n);
        if hydrogens > 0 {
            push_part(&mut out, "H", hydrogens);
        }
    } else if hydrogens > 0 {
        counts.insert("H", hydrogens);
    }
    for (sym, n) in counts {
        push_part(&mut out, sym, n);
    }
    out
}

fn push_part(out: &mut String, sym: &str, count: usize) {
    if count == 1 {
        out.push_str(sym);
    } else {
        let _ = write!(out, "{sym}{count}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn formula(smiles: &str) -> String {
        mol_formula(&from_smiles(smiles).unwrap())
    }

    #[test]
    fn ethanol() {
        assert_eq!(formula("CCO"), "C2H6O");
    }

    #[test]
    fn benzene() {
        assert_eq!(formula("c1ccccc1"), "C6H6");
    }

    #[test]
    fn water_no_carbon_orders_alphabetically() {
        assert_eq!(formula("O"), "H2O");
    }

    #[test]
    fn salt_without_hydrogen() {
        assert_eq!(formula("[Na+].[Cl-]"), "ClNa");
    }

    #[test]
    fn maleimide() {
        // five-membered ring: C(=O)-CH=CH-C(=O)-NH
        assert_eq!(formula("O=C1C=CC(=O)N1"), "C4H3NO2");
    }

    #[test]
    fn explicit_hydrogens_count_once_each() {
        let mol = from_smiles("S").unwrap();
        let with_hs = crate::hydrogen::add_explicit_hs(&mol);
        assert_eq!(mol_formula(&with_hs), "H2S");
    }
}
