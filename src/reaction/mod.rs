mod apply;
pub mod error;
mod parser;
mod writer;

pub use apply::{ProductSet, ProductSets};
pub use error::{ReactionError, ReactionSmartsError};
pub use writer::to_reaction_smarts;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
use crate::smarts::{AtomExpr, BondExpr};

/// A mapped rewrite rule parsed from reaction SMARTS.
///
/// Atoms on the two sides correspond through their map numbers: a shared
/// number carries the reactant atom (and its provenance metadata) into the
/// product, a reactant-only number declares a leaving atom, and an unmapped
/// product atom is newly introduced. Construction validates all of this;
/// a `Reaction` value is always internally consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub(crate) reactant_templates: Vec<Mol<AtomExpr, BondExpr>>,
    pub(crate) product_templates: Vec<Mol<AtomExpr, BondExpr>>,
    pub(crate) agent_templates: Vec<Mol<AtomExpr, BondExpr>>,
}

impl Reaction {
    pub fn reactant_templates(&self) -> &[Mol<AtomExpr, BondExpr>] {
        &self.reactant_templates
    }

    pub fn product_templates(&self) -> &[Mol<AtomExpr, BondExpr>] {
        &self.product_templates
    }

    /// Agents are parsed and round-tripped but take no part in application.
    pub fn agent_templates(&self) -> &[Mol<AtomExpr, BondExpr>] {
        &self.agent_templates
    }
}

/// Parse and validate a reaction SMARTS string.
pub fn from_reaction_smarts(s: &str) -> Result<Reaction, ReactionSmartsError> {
    parser::parse_reaction_smarts(s)
}

/// Apply `rxn` to `reactants`, yielding one [`ProductSet`] per match.
///
/// Free-function spelling of [`Reaction::apply`] for callers that read
/// better with the reactants first.
pub fn react<'r>(
    reactants: &[&'r Mol<Atom, Bond>],
    rxn: &'r Reaction,
) -> Result<ProductSets<'r>, ReactionError> {
    rxn.apply(reactants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::mol_formula;
    use crate::smiles::from_smiles;

    fn mol(smiles: &str) -> Mol<Atom, Bond> {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    fn rxn(smarts: &str) -> Reaction {
        from_reaction_smarts(smarts).unwrap_or_else(|e| panic!("bad reaction {smarts:?}: {e}"))
    }

    // --- Parsing ---

    #[test]
    fn parse_simple_reaction() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        assert_eq!(r.reactant_templates().len(), 1);
        assert_eq!(r.product_templates().len(), 1);
        assert_eq!(r.agent_templates().len(), 0);
    }

    #[test]
    fn parse_with_agents() {
        let r = rxn("[C:1]=[C:2]>[Pd]>[C:1][C:2]");
        assert_eq!(r.agent_templates().len(), 1);
    }

    #[test]
    fn parse_multi_reactant() {
        let r = rxn("[C:1]Br.[N:2]>>[C:1][N:2]");
        assert_eq!(r.reactant_templates().len(), 2);
        assert_eq!(r.product_templates().len(), 1);
    }

    #[test]
    fn parse_errors() {
        assert!(from_reaction_smarts("[C][Br]").is_err());
        assert!(from_reaction_smarts("[C:1]>>").is_err());
        assert!(from_reaction_smarts(">>[C:1]").is_err());
        assert!(from_reaction_smarts("[C:1]>[A]>[B]>[C:1]").is_err());
    }

    // --- Application ---

    #[test]
    fn sn2_two_products() {
        // The oxygen charge must be rewritten explicitly; a mapped atom
        // keeps its reactant charge otherwise.
        let r = rxn("[C:1][Br:2].[O&H1&-1:3]>>[C:1][O&+0:3].[Br&-1:2]");
        let methyl_bromide = mol("CBr");
        let hydroxide = mol("[OH-]");
        let results = r.run(&[&methyl_bromide, &hydroxide]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].products().len(), 2);
        // Methanol and bromide.
        assert_eq!(mol_formula(&results[0].products()[0]), "CH4O");
        assert_eq!(mol_formula(&results[0].products()[1]), "Br");
    }

    #[test]
    fn substituents_carry_over() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let results = r.run(&[&mol("CCBr")]).unwrap();
        assert_eq!(results.len(), 1);
        let product = &results[0].products()[0];
        assert_eq!(product.atom_count(), 3, "ethanol has three heavy atoms");
        assert_eq!(mol_formula(product), "C2H6O");
    }

    #[test]
    fn no_match_is_an_empty_sequence_not_an_error() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let reactant = mol("CC");
        let mut sets = r.apply(&[&reactant]).unwrap();
        assert_eq!(sets.match_count(), 0);
        assert!(sets.next().is_none());
    }

    #[test]
    fn wrong_reactant_count_fails_fast() {
        let r = rxn("[C:1][Br:2].[N:3]>>[C:1][N:3]");
        let only = mol("CBr");
        let err = r.apply(&[&only]).unwrap_err();
        assert_eq!(
            err,
            ReactionError::WrongReactantCount {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn bond_order_rewrites() {
        use crate::bond::BondOrder;
        let r = rxn("[C:1][C:2]>>[C:1]=[C:2]");
        let results = r.run(&[&mol("CC")]).unwrap();
        let product = &results[0].products()[0];
        let edge = product.bonds().next().unwrap();
        assert_eq!(product.bond(edge).order, BondOrder::Double);

        let r = rxn("[C:1][C:2]>>[C:1]#[C:2]");
        let results = r.run(&[&mol("CC")]).unwrap();
        let product = &results[0].products()[0];
        let edge = product.bonds().next().unwrap();
        assert_eq!(product.bond(edge).order, BondOrder::Triple);
    }

    #[test]
    fn charge_rewrite_deprotonates() {
        let r = rxn("[O&H1:1]>>[O&-1:1]");
        let results = r.run(&[&mol("CO")]).unwrap();
        assert!(!results.is_empty());
        let product = &results[0].products()[0];
        let o = product
            .atoms()
            .find(|&i| product.atom(i).atomic_num == 8)
            .unwrap();
        assert_eq!(product.atom(o).formal_charge, -1);
        assert_eq!(product.atom(o).hydrogen_count, 0);
    }

    #[test]
    fn unmapped_product_atom_is_created_blank() {
        let r = rxn("[N:1]>>[N:1]C");
        let ammonia = mol("N");
        let results = r.run(&[&ammonia]).unwrap();
        let product = &results[0].products()[0];
        assert_eq!(product.atom_count(), 2);
        let c = product
            .atoms()
            .find(|&i| product.atom(i).atomic_num == 6)
            .unwrap();
        assert!(product.atom(c).meta.is_empty());
        assert_eq!(product.atom(c).hydrogen_count, 3);
    }

    #[test]
    fn multi_match_yields_one_set_per_site() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let dibromide = mol("BrCCBr");
        let results = r.run(&[&dibromide]).unwrap();
        assert_eq!(results.len(), 2, "one application per C-Br bond");
    }

    #[test]
    fn lazy_iteration_stops_early() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let dibromide = mol("BrCCBr");
        let mut sets = r.apply(&[&dibromide]).unwrap();
        assert_eq!(sets.match_count(), 2);
        let first = sets.next().unwrap().unwrap();
        assert_eq!(first.products().len(), 1);
        // Dropping the iterator here never builds the second product set.
    }

    #[test]
    fn restartable_via_clone() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let dibromide = mol("BrCCBr");
        let sets = r.apply(&[&dibromide]).unwrap();
        let replay = sets.clone();
        let a: Vec<_> = sets.map(Result::unwrap).collect();
        let b: Vec<_> = replay.map(Result::unwrap).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn combinations_run_last_template_fastest() {
        let r = rxn("[C:1][Br:2].[N:3]>>[C:1][N:3]");
        let dibromide = mol("BrCCBr");
        let diamine = mol("NCCN");
        let results = r.run(&[&dibromide, &diamine]).unwrap();
        // Two C-Br sites times two amine sites.
        assert_eq!(results.len(), 4);
        // The first two sets share the first template's match.
        assert_eq!(
            results[0].match_assignment(0),
            results[1].match_assignment(0)
        );
        assert_ne!(
            results[0].match_assignment(1),
            results[1].match_assignment(1)
        );
    }

    #[test]
    fn intramolecular_group_uses_single_reactant() {
        let r = rxn("([C:1](=[O:2])[O&H1:3].[N&H2:4])>>[C:1](=[O:2])[N:4]");
        assert_eq!(r.reactant_templates().len(), 1);
        // Glycine-like fragment: amide cyclization consumes one molecule.
        let amino_acid = mol("NCC(=O)O");
        let results = r.run(&[&amino_acid]).unwrap();
        assert!(!results.is_empty());
        let product = &results[0].products()[0];
        assert!(product
            .atoms()
            .any(|i| product.atom(i).atomic_num == 7));
        // The hydroxyl oxygen left.
        assert_eq!(
            product
                .atoms()
                .filter(|&i| product.atom(i).atomic_num == 8)
                .count(),
            1
        );
    }

    #[test]
    fn ring_through_substituents_stays_closed() {
        // The ring is unmatched except for its attachment carbon; carrying
        // it over must close the cycle, not duplicate atoms along two paths.
        let r = rxn("[C:1][Br:2].[N:3]>>[C:1][N:3]");
        let bromocyclohexane = mol("BrC1CCCCC1");
        let ammonia = mol("N");
        let results = r.run(&[&bromocyclohexane, &ammonia]).unwrap();
        let product = &results[0].products()[0];
        assert_eq!(product.atom_count(), 7);
        assert_eq!(product.bond_count(), 7, "ring stays closed");
    }

    #[test]
    fn deletion_set_lists_leaving_atoms() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let reactant = mol("CBr");
        let results = r.run(&[&reactant]).unwrap();
        let removed = results[0].removed_atoms();
        assert_eq!(removed.len(), 1);
        let (ri, atom) = removed[0];
        assert_eq!(ri, 0);
        assert_eq!(reactant.atom(atom).atomic_num, 35);
    }

    #[test]
    fn explicit_hydrogen_template_consumes_implicit_h() {
        let r = rxn("[S:1][H:2]>>[S:1]C");
        let methanethiol = mol("CS");
        let results = r.run(&[&methanethiol]).unwrap();
        assert!(!results.is_empty());
        let product = &results[0].products()[0];
        // S-methylated product: CSC.
        assert_eq!(mol_formula(product), "C2H6S");
    }

    #[test]
    fn aromatic_substitution_keeps_kekulized_ring() {
        use crate::bond::BondOrder;
        let r = rxn("[c:1][Br:2]>>[c:1]O");
        let bromobenzene = mol("c1ccc(Br)cc1");
        let results = r.run(&[&bromobenzene]).unwrap();
        assert!(!results.is_empty());
        let phenol = &results[0].products()[0];
        assert_eq!(phenol.atom_count(), 7);
        let doubles = phenol
            .bonds()
            .filter(|&e| phenol.bond(e).order == BondOrder::Double)
            .count();
        assert_eq!(doubles, 3, "ring keeps its three double bonds");
    }

    #[test]
    fn determinism_across_runs() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let reactant = mol("BrCC(Br)CBr");
        let first = r.run(&[&reactant]).unwrap();
        let second = r.run(&[&reactant]).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a, b);
        }
    }

    // --- Provenance ---

    #[test]
    fn mapped_atoms_keep_their_metadata() {
        use crate::atom::MetaValue;
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let mut reactant = mol("CBr");
        let c = reactant
            .atoms()
            .find(|&i| reactant.atom(i).atomic_num == 6)
            .unwrap();
        {
            let meta = &mut reactant.atom_mut(c).meta;
            meta.name = Some("CA".into());
            meta.synonyms = vec!["C1".into()];
            meta.extra
                .insert("residue".into(), MetaValue::Text("XYZ".into()));
        }
        let results = r.run(&[&reactant]).unwrap();
        let product = &results[0].products()[0];
        let pc = product.named_atom("CA").expect("name must survive");
        assert_eq!(product.atom(pc).meta, reactant.atom(c).meta);
    }

    #[test]
    fn leaving_flag_is_copied_never_inferred() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let mut reactant = mol("CBr");
        let c = reactant
            .atoms()
            .find(|&i| reactant.atom(i).atomic_num == 6)
            .unwrap();
        reactant.atom_mut(c).meta.leaving = true;
        let results = r.run(&[&reactant]).unwrap();
        let product = &results[0].products()[0];
        let pc = product
            .atoms()
            .find(|&i| product.atom(i).atomic_num == 6)
            .unwrap();
        // The flag came from the caller; the engine copies it verbatim even
        // though this atom did not leave.
        assert!(product.atom(pc).meta.leaving);
    }

    #[test]
    fn chemical_override_leaves_metadata_alone() {
        let r = rxn("[O&H1:1]>>[O&-1:1]");
        let mut reactant = mol("CO");
        let o = reactant
            .atoms()
            .find(|&i| reactant.atom(i).atomic_num == 8)
            .unwrap();
        reactant.atom_mut(o).meta.name = Some("OG".into());
        let results = r.run(&[&reactant]).unwrap();
        let product = &results[0].products()[0];
        let po = product.named_atom("OG").unwrap();
        assert_eq!(product.atom(po).formal_charge, -1);
    }

    // --- Writer ---

    #[test]
    fn writer_round_trip() {
        let r = rxn("[C:1][Br:2]>>[C:1]O");
        let s = to_reaction_smarts(&r);
        assert!(s.contains(">>"));
        let r2 = from_reaction_smarts(&s).unwrap();
        assert_eq!(r2.reactant_templates().len(), 1);
        assert_eq!(r2.product_templates().len(), 1);
    }

    #[test]
    fn writer_keeps_agents() {
        let r = rxn("[C:1]=[C:2]>[Pd]>[C:1][C:2]");
        let s = to_reaction_smarts(&r);
        let parts: Vec<&str> = s.split('>').collect();
        assert_eq!(parts.len(), 3);
        assert!(!parts[1].is_empty());
    }

    #[test]
    fn writer_preserves_component_groups() {
        let r = rxn("([C:1]=[O:2].[N:3])>>[C:1][N:3]");
        let s = to_reaction_smarts(&r);
        assert!(s.starts_with('('));
        let r2 = from_reaction_smarts(&s).unwrap();
        assert_eq!(r2.reactant_templates().len(), 1);
    }
}
