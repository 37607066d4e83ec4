use std::collections::HashSet;

use crate::mol::Mol;
use crate::smarts::{from_smarts, AtomExpr, BondExpr};

use super::error::ReactionSmartsError;
use super::Reaction;

pub(super) fn parse_reaction_smarts(s: &str) -> Result<Reaction, ReactionSmartsError> {
    let (reactant_text, agent_text, product_text) = split_reaction(s)?;

    let reactant_templates = parse_section(reactant_text, "reactant")?;
    if reactant_templates.is_empty() {
        return Err(ReactionSmartsError::EmptyReactants);
    }

    let product_templates = parse_section(product_text, "product")?;
    if product_templates.is_empty() {
        return Err(ReactionSmartsError::EmptyProducts);
    }

    let agent_templates = if agent_text.is_empty() {
        Vec::new()
    } else {
        parse_section(agent_text, "agent")?
    };

    validate_map_numbers(&reactant_templates, &product_templates)?;

    Ok(Reaction {
        reactant_templates,
        product_templates,
        agent_templates,
    })
}

/// Split on top-level `>` separators: either `reactants>>products` or
/// `reactants>agents>products`.
fn split_reaction(s: &str) -> Result<(&str, &str, &str), ReactionSmartsError> {
    let gt_positions = find_gt_positions(s);

    match gt_positions.len() {
        0 | 1 => Err(ReactionSmartsError::MissingSeparator),
        2 => {
            let first = gt_positions[0];
            let second = gt_positions[1];
            if first + 1 == second {
                Ok((&s[..first], "", &s[second + 1..]))
            } else {
                Ok((&s[..first], &s[first + 1..second], &s[second + 1..]))
            }
        }
        _ => Err(ReactionSmartsError::TooManySeparators),
    }
}

fn find_gt_positions(s: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut bracket_depth = 0u32;
    let mut paren_depth = 0u32;
    for (i, ch) in s.char_indices() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '>' if bracket_depth == 0 && paren_depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

/// Top-level dot-separated components of one section. A parenthesized
/// component group keeps its internal dots: it parses as one disconnected
/// template, meaning its fragments must all come from the same reactant
/// (the intramolecular case).
fn parse_section(
    text: &str,
    section: &'static str,
) -> Result<Vec<Mol<AtomExpr, BondExpr>>, ReactionSmartsError> {
    let mut templates = Vec::new();
    for component in split_on_dot(text) {
        let stripped = strip_component_group(component);
        let template = from_smarts(stripped)
            .map_err(|e| ReactionSmartsError::InvalidComponent { section, detail: e })?;
        templates.push(template);
    }
    Ok(templates)
}

fn split_on_dot(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut bracket_depth = 0u32;
    let mut paren_depth = 0u32;
    for (i, ch) in s.char_indices() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '.' if bracket_depth == 0 && paren_depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Strip one pair of parentheses wrapping the whole component, if present.
fn strip_component_group(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'(') || bytes.last() != Some(&b')') {
        return s;
    }
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 && i < bytes.len() - 1 {
                    return s;
                }
            }
            _ => {}
        }
    }
    if depth == 0 {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Construction-time provenance checks: no side reuses a map number, and
/// every mapped product atom has a reactant origin. Product atoms without a
/// map number are the explicit "newly introduced" declaration; reactant map
/// numbers absent from the products declare leaving groups.
fn validate_map_numbers(
    reactants: &[Mol<AtomExpr, BondExpr>],
    products: &[Mol<AtomExpr, BondExpr>],
) -> Result<(), ReactionSmartsError> {
    let reactant_maps = collect_map_numbers(reactants, "reactant")?;
    let product_maps = collect_map_numbers(products, "product")?;

    for map_num in product_maps {
        if !reactant_maps.contains(&map_num) {
            return Err(ReactionSmartsError::UnmappedProductAtom { map_num });
        }
    }
    Ok(())
}

fn collect_map_numbers(
    templates: &[Mol<AtomExpr, BondExpr>],
    section: &'static str,
) -> Result<HashSet<u16>, ReactionSmartsError> {
    let mut seen = HashSet::new();
    for template in templates {
        for idx in template.atoms() {
            if let Some(map_num) = template.atom(idx).map_num() {
                if !seen.insert(map_num) {
                    return Err(ReactionSmartsError::DuplicateMapNumber { section, map_num });
                }
            }
        }
    }
    Ok(seen)
}
