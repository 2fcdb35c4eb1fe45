//! Normalisation passes that bring a rule map into Chomsky Normal Form.
//!
//! Every pass takes a rule map and returns a new one. The two elimination passes are
//! worklist-driven and remember what they removed, so rules that would regenerate
//! each other (cyclic unit chains, nullable nonterminals deriving one another) are
//! handled once and the passes always terminate.

use crate::cfg::{epsilon_body, is_epsilon, sorted_bodies, symbols, Body, Rules};
use crate::types::EPSILON;
use std::collections::{BTreeMap, BTreeSet};

/// Returns `base`, primed as often as needed to avoid every name in `taken`, and
/// records the result as taken.
pub fn fresh_symbol(base: &str, taken: &mut BTreeSet<String>) -> String {
    let mut name = base.to_string();
    while taken.contains(&name) {
        name.push('\'');
    }
    taken.insert(name.clone());
    name
}

/// Every body obtained by deleting a non-empty subset of the occurrences of `symbol`.
///
/// Deleting everything leaves the epsilon body. The result is deduplicated and sorted
/// len-lex; it is empty when `symbol` does not occur.
pub fn remove_occurrences(body: &[String], symbol: &str) -> Vec<Body> {
    // (variant, whether anything was deleted)
    let mut variants: Vec<(Body, bool)> = vec![(Vec::new(), false)];

    for current in body {
        if current == symbol {
            variants = variants
                .into_iter()
                .flat_map(|(variant, deleted)| {
                    let mut kept = variant.clone();
                    kept.push(current.clone());
                    [(kept, deleted), (variant, true)]
                })
                .collect();
        } else {
            for (variant, _) in variants.iter_mut() {
                variant.push(current.clone());
            }
        }
    }

    sorted_bodies(
        variants
            .into_iter()
            .filter(|(_, deleted)| *deleted)
            .map(|(variant, _)| if variant.is_empty() { epsilon_body() } else { variant }),
    )
}

/// Removes every epsilon rule except one headed by `start`.
///
/// For each nullable nonterminal `A` in turn, its epsilon body is deleted and every body
/// mentioning `A` gains the variants with some of its `A`s deleted. A head whose
/// epsilon body was already deleted never gets one back. Nonterminals left without
/// any way to derive a terminal sentence are dropped together with the bodies that
/// use them.
pub fn remove_bad_epsilon_rules(rules: &Rules, start: &str) -> Rules {
    let mut rules = rules.clone();
    let mut removed: BTreeSet<String> = BTreeSet::new();

    while let Some(nullable) = rules
        .iter()
        .find(|(head, bodies)| *head != start && bodies.iter().any(|body| is_epsilon(body)))
        .map(|(head, _)| head.clone())
    {
        if let Some(bodies) = rules.get_mut(&nullable) {
            bodies.retain(|body| !is_epsilon(body));
        }
        removed.insert(nullable.clone());
        log::trace!("Removed epsilon rule of '{}'", nullable);

        rules = rules
            .iter()
            .map(|(head, bodies)| {
                let mut extended: Vec<Body> = bodies.clone();
                for body in bodies.iter().filter(|body| body.contains(&nullable)) {
                    extended.extend(
                        remove_occurrences(body, &nullable)
                            .into_iter()
                            .filter(|variant| !(is_epsilon(variant) && removed.contains(head))),
                    );
                }
                (head.clone(), sorted_bodies(extended))
            })
            .collect();
    }

    let rules = remove_non_generating(rules, start);
    log::debug!("Epsilon removal left {} rules", rule_count(&rules));
    rules
}

/// Drops every nonterminal other than `start` that derives no terminal sentence,
/// together with every body that mentions one.
fn remove_non_generating(mut rules: Rules, start: &str) -> Rules {
    let mut generating: BTreeSet<String> = BTreeSet::new();
    loop {
        let found: Vec<String> = rules
            .iter()
            .filter(|(head, bodies)| {
                !generating.contains(*head)
                    && bodies.iter().any(|body| {
                        body.iter()
                            .all(|symbol| !rules.contains_key(symbol) || generating.contains(symbol))
                    })
            })
            .map(|(head, _)| head.clone())
            .collect();
        if found.is_empty() {
            break;
        }
        generating.extend(found);
    }

    let useless: BTreeSet<String> = rules
        .keys()
        .filter(|head| !generating.contains(*head))
        .cloned()
        .collect();
    rules.retain(|head, _| head == start || !useless.contains(head));
    for bodies in rules.values_mut() {
        bodies.retain(|body| !body.iter().any(|symbol| useless.contains(symbol)));
    }
    rules
}

/// Removes every unit rule `A -> B` where `B` is a nonterminal.
///
/// Each removed pair is remembered: `A` inherits the bodies of `B`, except unit
/// bodies that would recreate an already removed pair or `A -> A`.
pub fn remove_unit_rules(rules: &Rules) -> Rules {
    let mut rules = rules.clone();
    let mut removed: BTreeSet<(String, String)> = BTreeSet::new();

    let is_unit = |rules: &Rules, body: &Body| body.len() == 1 && rules.contains_key(&body[0]);

    while let Some((head, target)) = rules.iter().find_map(|(head, bodies)| {
        bodies
            .iter()
            .find(|body| is_unit(&rules, body))
            .map(|body| (head.clone(), body[0].clone()))
    }) {
        removed.insert((head.clone(), target.clone()));
        log::trace!("Removed unit rule {} -> {}", head, target);

        let inherited: Vec<Body> = if head == target {
            Vec::new()
        } else {
            rules[&target]
                .iter()
                .filter(|body| {
                    !is_unit(&rules, body)
                        || (body[0] != head && !removed.contains(&(head.clone(), body[0].clone())))
                })
                .cloned()
                .collect()
        };

        if let Some(bodies) = rules.get_mut(&head) {
            bodies.retain(|body| !(body.len() == 1 && body[0] == target));
            let mut extended = std::mem::take(bodies);
            extended.extend(inherited);
            *bodies = sorted_bodies(extended);
        }
    }

    log::debug!("Unit removal left {} rules", rule_count(&rules));
    rules
}

/// Splits every body longer than two symbols into a right-leaning chain of binary
/// rules.
///
/// The chain nonterminals of the `r`-th split body are `C{r}_1`, `C{r}_2`, ..., primed
/// if a name is already in use.
pub fn remove_rules_body_length_greater_than_2(rules: &Rules) -> Rules {
    let mut taken = symbols(rules);
    let mut result: Rules = Rules::new();
    let mut chains: Vec<(String, Body)> = Vec::new();
    let mut split = 0;

    for (head, bodies) in rules {
        let mut kept = Vec::with_capacity(bodies.len());
        for body in bodies {
            if body.len() <= 2 {
                kept.push(body.clone());
                continue;
            }

            split += 1;
            let names: Vec<String> = (1..=body.len() - 2)
                .map(|j| fresh_symbol(&format!("C{}_{}", split, j), &mut taken))
                .collect();

            kept.push(vec![body[0].clone(), names[0].clone()]);
            for (j, name) in names.iter().enumerate() {
                let rest = match names.get(j + 1) {
                    Some(next) => vec![body[j + 1].clone(), next.clone()],
                    None => vec![body[j + 1].clone(), body[j + 2].clone()],
                };
                chains.push((name.clone(), rest));
            }
        }
        result.insert(head.clone(), sorted_bodies(kept));
    }

    for (name, body) in chains {
        result.insert(name, vec![body]);
    }
    result
}

/// Replaces every terminal inside a two-symbol body by a nonterminal `T_a -> a`.
pub fn replace_terminals_in_pairs(rules: &Rules) -> Rules {
    let mut taken = symbols(rules);
    let mut lifted: BTreeMap<String, String> = BTreeMap::new();

    let mut result = Rules::new();

    for (head, bodies) in rules {
        let mut replaced = Vec::with_capacity(bodies.len());
        for body in bodies {
            if body.len() != 2 {
                replaced.push(body.clone());
                continue;
            }

            let mut pair = Vec::with_capacity(2);
            for symbol in body {
                if rules.contains_key(symbol) {
                    pair.push(symbol.clone());
                } else {
                    let name = lifted
                        .entry(symbol.clone())
                        .or_insert_with(|| fresh_symbol(&format!("T_{}", symbol), &mut taken));
                    pair.push(name.clone());
                }
            }
            replaced.push(pair);
        }
        result.insert(head.clone(), sorted_bodies(replaced));
    }

    for (terminal, name) in lifted {
        result.insert(name, vec![vec![terminal]]);
    }
    result
}

/// Whether every body is two nonterminals other than `start`, one terminal, or an
/// epsilon body headed by `start`.
pub fn is_chomsky_normal_form(rules: &Rules, start: &str) -> bool {
    let is_inner = |symbol: &String| rules.contains_key(symbol) && symbol != start;

    rules.iter().all(|(head, bodies)| {
        bodies.iter().all(|body| match body.as_slice() {
            [left, right] => is_inner(left) && is_inner(right),
            [symbol] if symbol == EPSILON => head == start,
            [symbol] => !rules.contains_key(symbol),
            _ => false,
        })
    })
}

/// Converts a rule map to Chomsky Normal Form, returning the new rules and start symbol.
///
/// The passes run in this order: a fresh start rule `S0 -> start`, epsilon removal,
/// unit removal, splitting of long bodies, lifting of terminals out of pairs.
pub fn to_chomsky_normal_form(rules: &Rules, start: &str) -> (Rules, String) {
    let mut taken = symbols(rules);
    let new_start = fresh_symbol("S0", &mut taken);

    let mut rules = rules.clone();
    rules.insert(new_start.clone(), vec![vec![start.to_string()]]);

    let rules = remove_bad_epsilon_rules(&rules, &new_start);
    let rules = remove_unit_rules(&rules);
    let rules = remove_rules_body_length_greater_than_2(&rules);
    let rules = replace_terminals_in_pairs(&rules);

    log::debug!(
        "Chomsky Normal Form has {} nonterminals and {} rules",
        rules.len(),
        rule_count(&rules)
    );
    (rules, new_start)
}

fn rule_count(rules: &Rules) -> usize {
    rules.values().map(Vec::len).sum()
}
