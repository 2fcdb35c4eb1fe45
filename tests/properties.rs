//! Property-based tests for the compilers and normalisation passes.
//!
//! - Subset construction and minimisation preserve NFA languages
//! - Compiled regexes agree with the `regex` crate
//! - Grammar canonicalisation is idempotent
//! - Epsilon and unit rule removal keep their invariants and the language

use autokit::cfg::{canonicalize, is_epsilon, Cfg, Rules};
use autokit::cnf::{is_chomsky_normal_form, remove_bad_epsilon_rules, remove_unit_rules, to_chomsky_normal_form};
use autokit::words::words_to_length;
use autokit::{nfa_to_dfa, regex_to_dfa, regex_to_nfa, Nfa};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Strategies
// ============================================================================

/// Random NFAs over states q0..q3 and letters {0, 1}, with epsilon moves.
fn nfa_strategy() -> impl Strategy<Value = Nfa> {
    let edge = (0..4usize, prop::option::of(prop::sample::select(vec!['0', '1'])), 0..4usize);
    (prop::collection::vec(edge, 0..10), prop::collection::vec(any::<bool>(), 4)).prop_map(
        |(edges, accepting)| {
            let mut table: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
            table.insert(("q0".to_string(), "0".to_string()), Vec::new());
            for (from, letter, to) in edges {
                table
                    .entry((format!("q{}", from), letter.map(String::from).unwrap_or_default()))
                    .or_default()
                    .push(format!("q{}", to));
            }

            let mentioned: BTreeSet<String> = table
                .iter()
                .flat_map(|((from, _), targets)| std::iter::once(from).chain(targets))
                .cloned()
                .collect();
            let accept: Vec<String> = (0..4)
                .filter(|&i| accepting[i])
                .map(|i| format!("q{}", i))
                .filter(|state| mentioned.contains(state))
                .collect();

            Nfa::new(table, "q0", accept).unwrap()
        },
    )
}

/// Random well-formed regexes over {a, b}.
fn regex_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![Just("a".to_string()), Just("b".to_string())];
    leaf.prop_recursive(4, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({} + {})", l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{}{}", l, r)),
            inner.prop_map(|r| format!("({})*", r)),
        ]
    })
}

fn body_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    let symbol = prop::sample::select(vec!["S", "A", "B", "a", "b"]);
    prop_oneof![
        1 => Just(vec![""]),
        4 => prop::collection::vec(symbol, 1..=3),
    ]
}

/// Random grammars with heads S, A and B over terminals a and b.
fn rules_strategy() -> impl Strategy<Value = Rules> {
    let bodies = || prop::collection::vec(body_strategy(), 1..=3);
    (bodies(), bodies(), bodies())
        .prop_map(|(s, a, b)| canonicalize([("S", s), ("A", a), ("B", b)]).unwrap())
}

// ============================================================================
// Helpers
// ============================================================================

fn binary() -> BTreeSet<char> {
    BTreeSet::from(['0', '1'])
}

fn has_non_start_epsilon(rules: &Rules, start: &str) -> bool {
    rules
        .iter()
        .any(|(head, bodies)| head != start && bodies.iter().any(|body| is_epsilon(body)))
}

fn language(rules: &Rules, start: &str, n: usize) -> Vec<Vec<String>> {
    Cfg::new(rules.clone(), start).unwrap().language(n)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_subset_construction_preserves_language(nfa in nfa_strategy()) {
        let dfa = nfa_to_dfa(&nfa).unwrap();
        let minimal = dfa.minimize().unwrap();

        for word in words_to_length(5, &binary()) {
            prop_assert_eq!(dfa.accepts(&word), nfa.accepts(&word), "word {:?}", word);
            prop_assert_eq!(minimal.accepts(&word), nfa.accepts(&word), "word {:?}", word);
        }
        prop_assert!(minimal.states().len() <= dfa.states().len());
    }

    #[test]
    fn prop_regex_matches_reference(regex in regex_strategy()) {
        let nfa = regex_to_nfa(&regex).unwrap();
        let dfa = regex_to_dfa(&regex).unwrap();
        let reference = regex::Regex::new(&format!("^(?:{})$", regex.replace(' ', "").replace('+', "|"))).unwrap();

        for word in words_to_length(4, &BTreeSet::from(['a', 'b'])) {
            let expected = reference.is_match(&word);
            prop_assert_eq!(nfa.accepts(&word), expected, "{} on {:?}", regex, word);
            prop_assert_eq!(dfa.accepts(&word), expected, "{} on {:?}", regex, word);
        }
    }

    #[test]
    fn prop_canonicalize_is_idempotent(rules in rules_strategy()) {
        let again = canonicalize(rules.clone()).unwrap();
        prop_assert_eq!(&again, &rules);

        for bodies in rules.values() {
            let mut sorted = bodies.clone();
            sorted.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
            sorted.dedup();
            prop_assert_eq!(&sorted, bodies);
        }
    }

    #[test]
    fn prop_epsilon_removal(rules in rules_strategy()) {
        let removed = remove_bad_epsilon_rules(&rules, "S");

        prop_assert!(!has_non_start_epsilon(&removed, "S"));
        prop_assert_eq!(language(&removed, "S", 4), language(&rules, "S", 4));
    }

    #[test]
    fn prop_unit_removal(rules in rules_strategy()) {
        let removed = remove_unit_rules(&rules);

        for bodies in removed.values() {
            for body in bodies {
                prop_assert!(!(body.len() == 1 && removed.contains_key(&body[0])), "unit body {:?}", body);
            }
        }
        prop_assert_eq!(language(&removed, "S", 4), language(&rules, "S", 4));
    }

    #[test]
    fn prop_chomsky_normal_form(rules in rules_strategy()) {
        let (normal, start) = to_chomsky_normal_form(&rules, "S");

        prop_assert!(is_chomsky_normal_form(&normal, &start));
        prop_assert_eq!(language(&normal, &start, 4), language(&rules, "S", 4));
    }
}
