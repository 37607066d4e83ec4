use crate::mol::Mol;
use crate::smarts::{to_smarts, AtomExpr, BondExpr};

use super::Reaction;

/// Write a reaction back to reaction SMARTS text.
pub fn to_reaction_smarts(rxn: &Reaction) -> String {
    let reactants = join_section(&rxn.reactant_templates);
    let products = join_section(&rxn.product_templates);
    if rxn.agent_templates.is_empty() {
        format!("{reactants}>>{products}")
    } else {
        let agents = join_section(&rxn.agent_templates);
        format!("{reactants}>{agents}>{products}")
    }
}

fn join_section(templates: &[Mol<AtomExpr, BondExpr>]) -> String {
    templates
        .iter()
        .map(|t| {
            let s = to_smarts(t);
            // A disconnected template is one component group: its fragments
            // must all come from a single reactant.
            if s.contains('.') {
                format!("({s})")
            } else {
                s
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
