//! Engine-level properties: provenance completeness, conservation,
//! determinism, symmetry enumeration, and arity validation.

use std::collections::BTreeSet;

use ligate::reaction::{from_reaction_smarts, react, ReactionError};
use ligate::smiles::from_smiles;
use ligate::{Atom, Bond, Mol};

/// Parse and give every atom a unique name so provenance is observable.
fn labeled(smiles: &str) -> Mol<Atom, Bond> {
    let mut mol = from_smiles(smiles).unwrap();
    let atoms: Vec<_> = mol.atoms().collect();
    for (i, idx) in atoms.into_iter().enumerate() {
        mol.atom_mut(idx).meta.name = Some(format!("a{i}"));
        mol.atom_mut(idx)
            .meta
            .synonyms
            .push(format!("alt{i}"));
    }
    mol
}

fn names<B>(mol: &Mol<Atom, B>) -> BTreeSet<String> {
    mol.atoms()
        .filter_map(|i| mol.atom(i).meta.name.clone())
        .collect()
}

#[test]
fn every_mapped_or_carried_atom_keeps_its_metadata() {
    let rxn = from_reaction_smarts("[C:1][Br:2]>>[C:1]O").unwrap();
    let reactant = labeled("CCCBr");
    let sets: Vec<_> = react(&[&reactant], &rxn)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(sets.len(), 1);
    let product = &sets[0].products()[0];

    for idx in product.atoms() {
        let atom = product.atom(idx);
        match atom.meta.name.as_deref() {
            Some(name) => {
                // Full metadata must equal the origin's, key for key.
                let origin = reactant.named_atom(name).unwrap();
                assert_eq!(atom.meta, reactant.atom(origin).meta, "atom {name}");
            }
            None => {
                // Only the rewrite-introduced oxygen may be blank.
                assert_eq!(atom.atomic_num, 8);
                assert!(atom.meta.is_empty());
            }
        }
    }
}

#[test]
fn conservation_partitions_reactant_atoms() {
    let rxn = from_reaction_smarts("[C:1][Br:2]>>[C:1]O").unwrap();
    let reactant = labeled("BrCC(Br)CBr");
    for set in react(&[&reactant], &rxn).unwrap() {
        let set = set.unwrap();
        let product_names = names(&set.products()[0]);
        let removed_names: BTreeSet<String> = set
            .removed_atoms()
            .iter()
            .filter_map(|&(_, idx)| reactant.atom(idx).meta.name.clone())
            .collect();
        for name in names(&reactant) {
            let in_product = product_names.contains(&name);
            let removed = removed_names.contains(&name);
            assert!(
                in_product ^ removed,
                "{name}: in_product={in_product}, removed={removed}"
            );
        }
    }
}

#[test]
fn no_product_atom_duplicates_an_origin() {
    let rxn = from_reaction_smarts("[C:1][Br:2]>>[C:1]O").unwrap();
    let reactant = labeled("BrCCBr");
    for set in react(&[&reactant], &rxn).unwrap() {
        let set = set.unwrap();
        let product = &set.products()[0];
        let mut seen = BTreeSet::new();
        for idx in product.atoms() {
            if let Some(name) = product.atom(idx).meta.name.clone() {
                assert!(seen.insert(name.clone()), "{name} appears twice");
            }
        }
    }
}

#[test]
fn symmetric_reactant_yields_distinct_matches() {
    // Para-dibromobenzene: two equivalent C-Br sites.
    let rxn = from_reaction_smarts("[c:1][Br:2]>>[c:1]O").unwrap();
    let reactant = labeled("Brc1ccc(Br)cc1");
    let sets: Vec<_> = react(&[&reactant], &rxn)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(sets.len(), 2);
    assert_ne!(sets[0].match_assignment(0), sets[1].match_assignment(0));
}

#[test]
fn arity_mismatch_fails_before_matching() {
    let rxn = from_reaction_smarts("[C:1][Br:2].[N:3]>>[C:1][N:3]").unwrap();
    let a = from_smiles("CBr").unwrap();
    let b = from_smiles("N").unwrap();
    let c = from_smiles("O").unwrap();

    assert!(matches!(
        react(&[&a], &rxn),
        Err(ReactionError::WrongReactantCount {
            expected: 2,
            got: 1
        })
    ));
    assert!(matches!(
        react(&[&a, &b, &c], &rxn),
        Err(ReactionError::WrongReactantCount {
            expected: 2,
            got: 3
        })
    ));
}

#[test]
fn zero_matches_is_an_ordinary_outcome() {
    let rxn = from_reaction_smarts("[C:1][I:2]>>[C:1]O").unwrap();
    let reactant = from_smiles("CCO").unwrap();
    let sets: Vec<_> = react(&[&reactant], &rxn).unwrap().collect();
    assert!(sets.is_empty());
}

#[test]
fn repeated_enumeration_is_elementwise_identical() {
    let rxn = from_reaction_smarts("[C:1][Br:2].[N:3]>>[C:1][N:3]").unwrap();
    let a = labeled("BrCCBr");
    let b = labeled("NCCN");
    let first: Vec<_> = react(&[&a, &b], &rxn)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    let second: Vec<_> = react(&[&a, &b], &rxn)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn reactants_are_never_mutated() {
    let rxn = from_reaction_smarts("[C:1][Br:2]>>[C:1]O").unwrap();
    let reactant = labeled("CBr");
    let before = reactant.clone();
    let _ = react(&[&reactant], &rxn)
        .unwrap()
        .map(Result::unwrap)
        .collect::<Vec<_>>();
    assert_eq!(reactant, before);
}

#[test]
fn products_do_not_alias_reactant_storage() {
    let rxn = from_reaction_smarts("[C:1][Br:2]>>[C:1]O").unwrap();
    let mut reactant = labeled("CBr");
    let sets: Vec<_> = react(&[&reactant], &rxn)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    let product = sets[0].products()[0].clone();
    let snapshot = product.clone();

    // Mutating the reactant afterwards must not reach into the product.
    let c = reactant.named_atom("a0").unwrap();
    reactant.atom_mut(c).meta.name = Some("mutated".into());
    assert_eq!(product, snapshot);
}
