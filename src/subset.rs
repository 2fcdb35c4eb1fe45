//! Subset construction algorithm for converting an NFA with epsilon moves to a DFA.

use crate::cnf::fresh_symbol;
use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::transition::len_lex;
use crate::types::AutomatonError;
use std::collections::{BTreeMap, BTreeSet};

/// A set of NFA states in canonical (len-lex sorted) order.
pub type Subset<'a> = Vec<&'a str>;

/// Renders a subset as a DFA state name, e.g. `{q1,q2}`.
pub fn subset_name(subset: &[&str]) -> String {
    format!("{{{}}}", subset.join(","))
}

fn canonical<'a>(states: BTreeSet<&'a str>) -> Subset<'a> {
    let mut subset: Subset<'a> = states.into_iter().collect();
    subset.sort_by(|a, b| len_lex(a, b));
    subset
}

/// Lazy subset construction over one NFA.
pub struct SubsetConstruction<'a> {
    nfa: &'a Nfa,
}

impl<'a> SubsetConstruction<'a> {
    pub fn new(nfa: &'a Nfa) -> Self {
        Self { nfa }
    }

    /// Every state reachable from `states` by zero or more epsilon moves.
    pub fn epsilon_closure(&self, states: impl IntoIterator<Item = &'a str>) -> BTreeSet<&'a str> {
        let mut closure: BTreeSet<&'a str> = BTreeSet::new();
        let mut queue: Vec<&'a str> = Vec::new();

        for state in states {
            if closure.insert(state) {
                queue.push(state);
            }
        }

        while let Some(current) = queue.pop() {
            for next in self.nfa.next_states(current, None) {
                if closure.insert(next.as_str()) {
                    queue.push(next.as_str());
                }
            }
        }

        closure
    }

    /// The start subset: the epsilon closure of the NFA start state.
    pub fn start(&self) -> Subset<'a> {
        canonical(self.epsilon_closure([self.nfa.start()]))
    }

    /// Builds the DFA transition function over subsets reachable from the start subset.
    ///
    /// Every subset gets a target for every letter. A letter no member can read leads
    /// to the empty subset, which then loops to itself.
    pub fn construct(&self) -> BTreeMap<(Subset<'a>, char), Subset<'a>> {
        let mut transition = BTreeMap::new();
        let mut visited: BTreeSet<Subset<'a>> = BTreeSet::new();

        let start = self.start();
        visited.insert(start.clone());
        let mut worklist = vec![start];

        while let Some(current) = worklist.pop() {
            for &letter in self.nfa.alphabet() {
                let moved = current
                    .iter()
                    .flat_map(|state| self.nfa.next_states(state, Some(letter)))
                    .map(String::as_str);
                let next = canonical(self.epsilon_closure(moved));

                if visited.insert(next.clone()) {
                    worklist.push(next.clone());
                }
                transition.insert((current.clone(), letter), next);
            }
        }

        log::debug!(
            "Subset construction produced {} states from {} NFA states",
            visited.len(),
            self.nfa.states().len()
        );

        transition
    }

    /// Builds the DFA. A subset accepts iff it contains an NFA accept state.
    ///
    /// States are named by [`subset_name`]. NFA state names may themselves contain
    /// `{`, `,` or `}`, so distinct subsets can render alike; later ones are primed
    /// until their name is unique.
    pub fn to_dfa(&self) -> Result<Dfa, AutomatonError> {
        let transition = self.construct();
        let start = self.start();

        let mut subsets: Vec<&Subset<'a>> = vec![&start];
        let mut seen: BTreeSet<&Subset<'a>> = BTreeSet::from([&start]);
        for ((subset, _), next) in &transition {
            for candidate in [subset, next] {
                if seen.insert(candidate) {
                    subsets.push(candidate);
                }
            }
        }

        let mut taken: BTreeSet<String> = BTreeSet::new();
        let names: BTreeMap<&Subset<'a>, String> = subsets
            .iter()
            .map(|&subset| (subset, fresh_symbol(&subset_name(subset), &mut taken)))
            .collect();
        let name = |subset: &Subset<'a>| names.get(subset).cloned().unwrap_or_default();

        let accept: Vec<String> = subsets
            .iter()
            .filter(|subset| subset.iter().any(|state| self.nfa.accept().contains(*state)))
            .map(|&subset| name(subset))
            .collect();

        let entries = transition
            .iter()
            .map(|((subset, letter), next)| ((name(subset), letter.to_string()), name(next)));

        Dfa::new(entries, &name(&start), accept)
    }
}

/// Converts an NFA into an equivalent DFA whose states are named after NFA subsets.
pub fn nfa_to_dfa(nfa: &Nfa) -> Result<Dfa, AutomatonError> {
    SubsetConstruction::new(nfa).to_dfa()
}
