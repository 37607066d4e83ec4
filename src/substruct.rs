use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;

/// One substructure match: `(query atom, target atom)` pairs, sorted by
/// query index.
pub type AtomMapping = Vec<(NodeIndex, NodeIndex)>;

/// Enumerate embeddings of `query` into `target` under caller-supplied
/// predicates.
///
/// `atom_match(target_idx, query_idx)` and
/// `bond_match(target_edge, query_edge)` decide compatibility; the search
/// itself only enforces injectivity and connectivity. Candidate target atoms
/// are tried in index order and the query is walked in a fixed order, so the
/// result sequence is deterministic for fixed inputs. Automorphic matches
/// are all reported, in a stable order, and never deduplicated here.
pub fn find_substruct_matches<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(petgraph::graph::EdgeIndex, petgraph::graph::EdgeIndex) -> bool,
    first_only: bool,
) -> Vec<AtomMapping> {
    let mut state = Vf2 {
        target,
        query,
        atom_match,
        bond_match,
        query_order: ordered_query_atoms(query),
        query_map: vec![None; query.atom_count()],
        target_used: vec![false; target.atom_count()],
    };
    let mut results = Vec::new();
    state.recurse(0, &mut results, first_only);
    results
}

/// Query atoms sorted most-constrained (highest degree) first; ties keep
/// insertion order so enumeration stays reproducible.
fn ordered_query_atoms<A, B>(query: &Mol<A, B>) -> Vec<NodeIndex> {
    let mut order: Vec<NodeIndex> = query.atoms().collect();
    order.sort_by(|&a, &b| query.degree(b).cmp(&query.degree(a)));
    order
}

struct Vf2<'a, A1, B1, A2, B2, FA, FB> {
    target: &'a Mol<A1, B1>,
    query: &'a Mol<A2, B2>,
    atom_match: FA,
    bond_match: FB,
    query_order: Vec<NodeIndex>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
}

impl<'a, A1, B1, A2, B2, FA, FB> Vf2<'a, A1, B1, A2, B2, FA, FB>
where
    FA: Fn(NodeIndex, NodeIndex) -> bool,
    FB: Fn(petgraph::graph::EdgeIndex, petgraph::graph::EdgeIndex) -> bool,
{
    fn recurse(&mut self, depth: usize, results: &mut Vec<AtomMapping>, first_only: bool) {
        if depth == self.query_order.len() {
            let mut mapping: AtomMapping = self
                .query_order
                .iter()
                .map(|&qn| (qn, self.query_map[qn.index()].expect("mapped at full depth")))
                .collect();
            mapping.sort_by_key(|&(q, _)| q.index());
            results.push(mapping);
            return;
        }

        let query_node = self.query_order[depth];

        for t_idx in 0..self.target_used.len() {
            if self.target_used[t_idx] {
                continue;
            }
            let target_node = NodeIndex::new(t_idx);
            if !self.is_feasible(query_node, target_node) {
                continue;
            }

            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[t_idx] = true;

            self.recurse(depth + 1, results, first_only);

            self.query_map[query_node.index()] = None;
            self.target_used[t_idx] = false;

            if first_only && !results.is_empty() {
                return;
            }
        }
    }

    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        if !(self.atom_match)(target_node, query_node) {
            return false;
        }
        for q_neighbor in self.query.neighbors(query_node) {
            if let Some(t_mapped) = self.query_map[q_neighbor.index()] {
                let q_edge = self
                    .query
                    .bond_between(query_node, q_neighbor)
                    .expect("bond must exist between neighbors");
                match self.target.bond_between(target_node, t_mapped) {
                    Some(t_edge) => {
                        if !(self.bond_match)(t_edge, q_edge) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }
}

// --- Default chemistry predicates for molecule-against-molecule queries ---

pub fn has_substruct_match(target: &Mol<Atom, Bond>, query: &Mol<Atom, Bond>) -> bool {
    get_substruct_match(target, query).is_some()
}

pub fn get_substruct_match(
    target: &Mol<Atom, Bond>,
    query: &Mol<Atom, Bond>,
) -> Option<AtomMapping> {
    matches_with_default_rules(target, query, true).into_iter().next()
}

pub fn get_substruct_matches(
    target: &Mol<Atom, Bond>,
    query: &Mol<Atom, Bond>,
) -> Vec<AtomMapping> {
    matches_with_default_rules(target, query, false)
}

fn matches_with_default_rules(
    target: &Mol<Atom, Bond>,
    query: &Mol<Atom, Bond>,
    first_only: bool,
) -> Vec<AtomMapping> {
    let aromatic_pair = |mol: &Mol<Atom, Bond>, edge| {
        let (a, b) = mol.bond_endpoints(edge).expect("edge endpoints must exist");
        mol.atom(a).is_aromatic && mol.atom(b).is_aromatic
    };
    find_substruct_matches(
        target,
        query,
        |t, q| {
            let ta = target.atom(t);
            let qa = query.atom(q);
            ta.atomic_num == qa.atomic_num && (!qa.is_aromatic || ta.is_aromatic)
        },
        |t_edge, q_edge| {
            if aromatic_pair(query, q_edge) && aromatic_pair(target, t_edge) {
                return true;
            }
            target.bond(t_edge).order == query.bond(q_edge).order
        },
        first_only,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn mol(smiles: &str) -> Mol<Atom, Bond> {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    #[test]
    fn ethanol_contains_cc() {
        let target = mol("CCO");
        let query = mol("CC");
        assert!(has_substruct_match(&target, &query));
        let m = get_substruct_match(&target, &query).unwrap();
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn methane_does_not_contain_cc() {
        let target = mol("C");
        let query = mol("CC");
        assert!(!has_substruct_match(&target, &query));
        assert!(get_substruct_matches(&target, &query).is_empty());
    }

    #[test]
    fn propane_cc_matches_four_ways() {
        let matches = get_substruct_matches(&mol("CCC"), &mol("CC"));
        assert_eq!(matches.len(), 4);
    }

    #[test]
    fn cyclohexane_cc_matches_twelve_ways() {
        let matches = get_substruct_matches(&mol("C1CCCCC1"), &mol("CC"));
        assert_eq!(matches.len(), 12);
        for mapping in &matches {
            assert_eq!(mapping.len(), 2);
        }
    }

    #[test]
    fn benzene_automorphism_count() {
        let matches = get_substruct_matches(&mol("c1ccccc1"), &mol("c1ccccc1"));
        assert_eq!(matches.len(), 12);
    }

    #[test]
    fn no_duplicate_mappings() {
        let matches = get_substruct_matches(&mol("c1ccccc1"), &mol("c1ccccc1"));
        for (i, a) in matches.iter().enumerate() {
            for b in matches.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn deterministic_enumeration_order() {
        let target = mol("C1CCCCC1");
        let query = mol("CC");
        let first = get_substruct_matches(&target, &query);
        let second = get_substruct_matches(&target, &query);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_query_matches_once_empty() {
        let target = mol("CCO");
        let query: Mol<Atom, Bond> = Mol::new();
        let all = get_substruct_matches(&target, &query);
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    #[test]
    fn bond_orders_must_agree() {
        assert!(has_substruct_match(&mol("C=C"), &mol("C=C")));
        assert!(!has_substruct_match(&mol("CC"), &mol("C=C")));
        assert!(!has_substruct_match(&mol("C=C"), &mol("CC")));
    }

    #[test]
    fn aromatic_query_rejects_aliphatic_target() {
        assert!(!has_substruct_match(&mol("C1CCCCC1"), &mol("c1ccccc1")));
    }

    #[test]
    fn aromatic_ring_found_in_naphthalene() {
        assert!(has_substruct_match(&mol("c1ccc2ccccc2c1"), &mol("c1ccccc1")));
    }

    #[test]
    fn disconnected_query_spans_components() {
        let target = mol("[Na+].[Cl-]");
        let query = mol("[Na+].[Cl-]");
        let matches = get_substruct_matches(&target, &query);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn custom_predicates_ignore_bond_order() {
        let target = mol("C=C");
        let query = mol("CC");
        let matches = find_substruct_matches(
            &target,
            &query,
            |t, q| target.atom(t).atomic_num == query.atom(q).atomic_num,
            |_, _| true,
            false,
        );
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn mappings_respect_connectivity() {
        let target = mol("C1CCCCC1");
        let query = mol("CC");
        for mapping in get_substruct_matches(&target, &query) {
            let (_, t0) = mapping[0];
            let (_, t1) = mapping[1];
            assert!(target.bond_between(t0, t1).is_some());
        }
    }

    #[test]
    fn mapping_is_sorted_by_query_index() {
        let target = mol("CCO");
        let query = mol("CO");
        let m = get_substruct_match(&target, &query).unwrap();
        assert!(m.windows(2).all(|w| w[0].0.index() < w[1].0.index()));
    }
}
