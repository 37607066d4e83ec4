use std::borrow::Cow;
use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::hydrogen;
use crate::mol::Mol;
use crate::smarts::{get_smarts_matches, references_explicit_hydrogen, AtomExpr, BondExpr};
use crate::substruct::AtomMapping;

use super::error::ReactionError;
use super::Reaction;

impl Reaction {
    /// Enumerate every application of this reaction to `reactants`.
    ///
    /// Template *i* is matched against reactant *i* only. The returned
    /// sequence is lazy (products for a match are built when the element is
    /// pulled), finite, and restartable via `Clone`; its order is
    /// deterministic for fixed inputs. Automorphic matches are all present:
    /// picking `[0]` among symmetric alternatives is a caller convention,
    /// first-found and implementation-defined, not a canonical choice.
    ///
    /// No match is not an error: the iterator is simply empty.
    pub fn apply<'r>(
        &'r self,
        reactants: &[&'r Mol<Atom, Bond>],
    ) -> Result<ProductSets<'r>, ReactionError> {
        if reactants.len() != self.reactant_templates.len() {
            return Err(ReactionError::WrongReactantCount {
                expected: self.reactant_templates.len(),
                got: reactants.len(),
            });
        }

        // Templates naming explicit hydrogens can only bind them as graph
        // nodes, so implicit hydrogens are materialized first. The synthetic
        // H atoms carry empty metadata; caller-labeled hydrogens are already
        // explicit and untouched.
        let prepared: Vec<Cow<'r, Mol<Atom, Bond>>> = self
            .reactant_templates
            .iter()
            .zip(reactants.iter())
            .map(|(tmpl, &mol)| {
                if references_explicit_hydrogen(tmpl) && hydrogen::has_implicit_hs(mol) {
                    Cow::Owned(hydrogen::add_explicit_hs(mol))
                } else {
                    Cow::Borrowed(mol)
                }
            })
            .collect();

        let per_template: Vec<Vec<AtomMapping>> = self
            .reactant_templates
            .iter()
            .zip(prepared.iter())
            .map(|(tmpl, mol)| get_smarts_matches(mol.as_ref(), tmpl))
            .collect();

        let no_match = per_template.iter().any(|m| m.is_empty());
        let counter = vec![0; per_template.len()];
        Ok(ProductSets {
            rxn: self,
            reactants: prepared,
            per_template,
            counter,
            done: no_match,
        })
    }

    /// Eager variant of [`Reaction::apply`]: collect every product set.
    pub fn run(
        &self,
        reactants: &[&Mol<Atom, Bond>],
    ) -> Result<Vec<ProductSet>, ReactionError> {
        self.apply(reactants)?.collect()
    }
}

/// The products of one reaction application.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSet {
    products: Vec<Mol<Atom, Bond>>,
    matched: Vec<AtomMapping>,
    removed: Vec<(usize, NodeIndex)>,
}

impl ProductSet {
    /// Product molecules, one per product template, in template order.
    pub fn products(&self) -> &[Mol<Atom, Bond>] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Mol<Atom, Bond>> {
        self.products
    }

    /// The match that produced this set: for reactant template
    /// `template_idx`, the `(template atom, reactant atom)` assignment.
    pub fn match_assignment(&self, template_idx: usize) -> &[(NodeIndex, NodeIndex)] {
        &self.matched[template_idx]
    }

    /// Matched reactant atoms with no product counterpart, as
    /// `(reactant index, atom)` pairs: the deletion set declared by the
    /// pattern (leaving groups).
    pub fn removed_atoms(&self) -> &[(usize, NodeIndex)] {
        &self.removed
    }
}

/// Lazy sequence of [`ProductSet`]s, one per match combination.
///
/// Iteration order runs the last reactant template's matches fastest,
/// mirroring the enumeration order of the underlying substructure search.
#[derive(Clone, Debug)]
pub struct ProductSets<'r> {
    rxn: &'r Reaction,
    reactants: Vec<Cow<'r, Mol<Atom, Bond>>>,
    per_template: Vec<Vec<AtomMapping>>,
    counter: Vec<usize>,
    done: bool,
}

impl<'r> ProductSets<'r> {
    /// Total number of match combinations this sequence will yield.
    pub fn match_count(&self) -> usize {
        self.per_template.iter().map(Vec::len).product()
    }
}

impl<'r> Iterator for ProductSets<'r> {
    type Item = Result<ProductSet, ReactionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let combo: Vec<&AtomMapping> = self
            .counter
            .iter()
            .zip(self.per_template.iter())
            .map(|(&i, matches)| &matches[i])
            .collect();

        let reactants: Vec<&Mol<Atom, Bond>> =
            self.reactants.iter().map(|c| c.as_ref()).collect();
        let result = generate_products(self.rxn, &reactants, &combo);

        self.done = true;
        for i in (0..self.counter.len()).rev() {
            self.counter[i] += 1;
            if self.counter[i] < self.per_template[i].len() {
                self.done = false;
                break;
            }
            self.counter[i] = 0;
        }

        Some(result)
    }
}

fn generate_products(
    rxn: &Reaction,
    reactants: &[&Mol<Atom, Bond>],
    combo: &[&AtomMapping],
) -> Result<ProductSet, ReactionError> {
    let ctx = RewriteContext::new(rxn, reactants, combo);

    let products = rxn
        .product_templates
        .iter()
        .map(|tmpl| ctx.build_product(tmpl))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProductSet {
        products,
        matched: combo.iter().map(|m| (*m).clone()).collect(),
        removed: ctx.deletion_set(),
    })
}

struct RewriteContext<'a> {
    rxn: &'a Reaction,
    reactants: &'a [&'a Mol<Atom, Bond>],
    combo: &'a [&'a AtomMapping],
    /// Map number -> (reactant index, reactant atom) for this match.
    origin_by_map: HashMap<u16, (usize, NodeIndex)>,
    /// Per reactant: matched atom -> its template's map number.
    map_by_target: Vec<HashMap<NodeIndex, u16>>,
    /// Per reactant: the full set of matched atoms.
    matched_atoms: Vec<HashSet<NodeIndex>>,
    /// Mapped bond pairs named anywhere on the reactant side.
    reactant_bond_pairs: HashSet<(u16, u16)>,
}

impl<'a> RewriteContext<'a> {
    fn new(rxn: &'a Reaction, reactants: &'a [&'a Mol<Atom, Bond>], combo: &'a [&'a AtomMapping]) -> Self {
        let mut origin_by_map = HashMap::new();
        let mut map_by_target = vec![HashMap::new(); reactants.len()];
        let mut matched_atoms = vec![HashSet::new(); reactants.len()];

        for (ri, (tmpl, mapping)) in rxn
            .reactant_templates
            .iter()
            .zip(combo.iter())
            .enumerate()
        {
            for &(q_idx, t_idx) in mapping.iter() {
                matched_atoms[ri].insert(t_idx);
                if let Some(map_num) = tmpl.atom(q_idx).map_num() {
                    origin_by_map.insert(map_num, (ri, t_idx));
                    map_by_target[ri].insert(t_idx, map_num);
                }
            }
        }

        let mut reactant_bond_pairs = HashSet::new();
        for tmpl in &rxn.reactant_templates {
            reactant_bond_pairs.extend(mapped_bond_pairs(tmpl));
        }

        Self {
            rxn,
            reactants,
            combo,
            origin_by_map,
            map_by_target,
            matched_atoms,
            reactant_bond_pairs,
        }
    }

    fn build_product(
        &self,
        tmpl: &Mol<AtomExpr, BondExpr>,
    ) -> Result<Mol<Atom, Bond>, ReactionError> {
        let mut product: Mol<Atom, Bond> = Mol::new();
        let mut node_map: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut by_map_num: HashMap<u16, NodeIndex> = HashMap::new();
        let mut h_fixed: HashSet<NodeIndex> = HashSet::new();

        // Template atoms. A mapped atom starts as a clone of its reactant
        // origin, metadata included, and the template then overrides the
        // chemical attributes it names. Metadata is never touched: that is
        // the provenance contract. Unmapped atoms are newly introduced and
        // start blank.
        for p_idx in tmpl.atoms() {
            let expr = tmpl.atom(p_idx);
            let atom = match expr.map_num() {
                Some(map_num) => {
                    let &(ri, t_idx) = self
                        .origin_by_map
                        .get(&map_num)
                        .ok_or(ReactionError::MissingProvenance { map_num })?;
                    let mut atom = self.reactants[ri].atom(t_idx).clone();
                    apply_expr_to_atom(&mut atom, expr);
                    atom
                }
                None => {
                    let mut atom = Atom::default();
                    apply_expr_to_atom(&mut atom, expr);
                    atom
                }
            };
            let idx = product.add_atom(atom);
            node_map.insert(p_idx, idx);
            if let Some(map_num) = tmpl.atom(p_idx).map_num() {
                by_map_num.insert(map_num, idx);
            }
            if tmpl.atom(p_idx).fixes_h_count() {
                h_fixed.insert(idx);
            }
        }

        // Template bonds.
        for edge in tmpl.bonds() {
            if let Some((a, b)) = tmpl.bond_endpoints(edge) {
                product.add_bond(
                    node_map[&a],
                    node_map[&b],
                    bond_from_expr(tmpl.bond(edge)),
                );
            }
        }

        let product_bond_pairs = mapped_bond_pairs(tmpl);
        let mut carried: HashMap<(usize, NodeIndex), NodeIndex> = HashMap::new();

        for p_idx in tmpl.atoms() {
            let map_num = match tmpl.atom(p_idx).map_num() {
                Some(n) => n,
                None => continue,
            };
            let &(ri, t_idx) = match self.origin_by_map.get(&map_num) {
                Some(origin) => origin,
                None => continue,
            };
            let product_node = node_map[&p_idx];
            let reactant = self.reactants[ri];

            for neighbor in reactant.neighbors(t_idx) {
                if self.matched_atoms[ri].contains(&neighbor) {
                    // A bond between two matched atoms survives only if
                    // neither side of the pattern legislates about it.
                    if let Some(&n_map) = self.map_by_target[ri].get(&neighbor) {
                        let pair = ordered_pair(map_num, n_map);
                        if !self.reactant_bond_pairs.contains(&pair)
                            && !product_bond_pairs.contains(&pair)
                        {
                            if let Some(&n_node) = by_map_num.get(&n_map) {
                                if product.bond_between(product_node, n_node).is_none() {
                                    if let Some(e) = reactant.bond_between(t_idx, neighbor) {
                                        product.add_bond(
                                            product_node,
                                            n_node,
                                            reactant.bond(e).clone(),
                                        );
                                    }
                                }
                            }
                        }
                    }
                    continue;
                }
                self.carry_substituents(
                    &mut product,
                    &mut carried,
                    ri,
                    t_idx,
                    neighbor,
                    product_node,
                );
            }
        }

        let carried_nodes: HashSet<NodeIndex> = carried.values().copied().collect();
        recalculate_hydrogen_counts(&mut product, &h_fixed, &carried_nodes);

        Ok(product)
    }

    /// Walk the unmatched neighborhood of a matched atom and copy it whole
    /// into the product: atoms with their metadata, bonds with their order.
    fn carry_substituents(
        &self,
        product: &mut Mol<Atom, Bond>,
        carried: &mut HashMap<(usize, NodeIndex), NodeIndex>,
        ri: usize,
        anchor: NodeIndex,
        start: NodeIndex,
        product_anchor: NodeIndex,
    ) {
        let reactant = self.reactants[ri];

        if let Some(&existing) = carried.get(&(ri, start)) {
            if product.bond_between(product_anchor, existing).is_none() {
                if let Some(e) = reactant.bond_between(anchor, start) {
                    product.add_bond(product_anchor, existing, reactant.bond(e).clone());
                }
            }
            return;
        }

        let new_node = product.add_atom(reactant.atom(start).clone());
        carried.insert((ri, start), new_node);
        if let Some(e) = reactant.bond_between(anchor, start) {
            product.add_bond(product_anchor, new_node, reactant.bond(e).clone());
        }

        let mut queue = VecDeque::from([(start, new_node)]);
        while let Some((r_node, p_node)) = queue.pop_front() {
            for nb in reactant.neighbors(r_node) {
                if self.matched_atoms[ri].contains(&nb) {
                    continue;
                }
                if let Some(&existing) = carried.get(&(ri, nb)) {
                    if product.bond_between(p_node, existing).is_none() {
                        if let Some(e) = reactant.bond_between(r_node, nb) {
                            product.add_bond(p_node, existing, reactant.bond(e).clone());
                        }
                    }
                    continue;
                }
                let nb_node = product.add_atom(reactant.atom(nb).clone());
                carried.insert((ri, nb), nb_node);
                if let Some(e) = reactant.bond_between(r_node, nb) {
                    product.add_bond(p_node, nb_node, reactant.bond(e).clone());
                }
                queue.push_back((nb, nb_node));
            }
        }
    }

    /// Matched reactant atoms the pattern deletes: matched without a map
    /// number, or mapped to a number no product template uses.
    fn deletion_set(&self) -> Vec<(usize, NodeIndex)> {
        let mut used_maps = HashSet::new();
        for tmpl in &self.rxn.product_templates {
            for idx in tmpl.atoms() {
                if let Some(map_num) = tmpl.atom(idx).map_num() {
                    used_maps.insert(map_num);
                }
            }
        }

        let mut removed = Vec::new();
        for (ri, (tmpl, mapping)) in self
            .rxn
            .reactant_templates
            .iter()
            .zip(self.combo.iter())
            .enumerate()
        {
            for &(q_idx, t_idx) in mapping.iter() {
                let kept = tmpl
                    .atom(q_idx)
                    .map_num()
                    .map(|n| used_maps.contains(&n))
                    .unwrap_or(false);
                if !kept {
                    removed.push((ri, t_idx));
                }
            }
        }
        removed
    }
}

fn ordered_pair(a: u16, b: u16) -> (u16, u16) {
    (a.min(b), a.max(b))
}

fn mapped_bond_pairs(tmpl: &Mol<AtomExpr, BondExpr>) -> HashSet<(u16, u16)> {
    let mut pairs = HashSet::new();
    for edge in tmpl.bonds() {
        if let Some((a, b)) = tmpl.bond_endpoints(edge) {
            if let (Some(ma), Some(mb)) = (tmpl.atom(a).map_num(), tmpl.atom(b).map_num()) {
                pairs.insert(ordered_pair(ma, mb));
            }
        }
    }
    pairs
}

/// Apply the chemical attributes a product expression names. Provenance
/// metadata is out of bounds here by contract.
fn apply_expr_to_atom(atom: &mut Atom, expr: &AtomExpr) {
    match expr {
        AtomExpr::Element {
            atomic_num,
            aromatic,
        } => {
            atom.atomic_num = *atomic_num;
            if let Some(aromatic) = aromatic {
                atom.is_aromatic = *aromatic;
            }
        }
        AtomExpr::Charge(c) => atom.formal_charge = *c,
        AtomExpr::Isotope(i) => atom.isotope = *i,
        AtomExpr::TotalHCount(h) => atom.hydrogen_count = *h,
        AtomExpr::Chirality(c) => atom.chirality = *c,
        AtomExpr::And(parts) => {
            for p in parts {
                apply_expr_to_atom(atom, p);
            }
        }
        _ => {}
    }
}

fn bond_from_expr(expr: &BondExpr) -> Bond {
    Bond::with_order(match expr {
        BondExpr::Double => BondOrder::Double,
        BondExpr::Triple => BondOrder::Triple,
        _ => BondOrder::Single,
    })
}

/// Refresh implicit hydrogen counts on template-instantiated product atoms.
/// Atoms whose template pins an H count keep it, and carried atoms are never
/// touched; their counts came from the reactant and still hold.
fn recalculate_hydrogen_counts(
    product: &mut Mol<Atom, Bond>,
    h_fixed: &HashSet<NodeIndex>,
    carried: &HashSet<NodeIndex>,
) {
    let atoms: Vec<NodeIndex> = product.atoms().collect();
    for idx in atoms {
        if h_fixed.contains(&idx) || carried.contains(&idx) {
            continue;
        }
        let atom = product.atom(idx);
        let element = match Element::from_atomic_num(atom.atomic_num) {
            Some(e) => e,
            None => {
                product.atom_mut(idx).hydrogen_count = 0;
                continue;
            }
        };
        let valences = element.default_valences();
        if valences.is_empty() {
            product.atom_mut(idx).hydrogen_count = 0;
            continue;
        }

        let bond_sum: i16 = product
            .bonds_of(idx)
            .map(|e| product.bond(e).order.valence() as i16)
            .sum();
        let charge = atom.formal_charge as i16;

        let h = valences
            .iter()
            .filter_map(|&v| {
                let adjusted = v as i16 + charge;
                (adjusted > 0).then_some(adjusted)
            })
            .find(|&adjusted| adjusted >= bond_sum)
            .map(|adjusted| (adjusted - bond_sum) as u8)
            .unwrap_or(0);

        product.atom_mut(idx).hydrogen_count = h;
    }
}
