//! Deterministic finite automata: construction, membership and minimisation.

use crate::analyzer::reachable_states;
use crate::transition::{len_lex, DfaTransition};
use crate::types::AutomatonError;
use crate::words::Recognizer;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A deterministic finite automaton.
///
/// States and alphabet are derived from the transition function. A DFA whose table is
/// empty (empty alphabet) consists of its start state alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    transition: DfaTransition,
    states: BTreeSet<String>,
    start: String,
    accept: BTreeSet<String>,
}

impl Dfa {
    /// Creates a DFA from `((state, letter), next_state)` entries.
    ///
    /// # Errors
    ///
    /// Fails if the table is malformed or not total, or if `start`/`accept` name
    /// states the table does not mention.
    pub fn new<I, S, L, T, A, N>(transitions: I, start: &str, accept: A) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L), T)>,
        S: AsRef<str>,
        L: AsRef<str>,
        T: AsRef<str>,
        A: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        Self::from_transition(DfaTransition::new(transitions)?, start, accept)
    }

    /// Creates a DFA from an already validated transition table.
    pub fn from_transition<A, N>(
        transition: DfaTransition,
        start: &str,
        accept: A,
    ) -> Result<Self, AutomatonError>
    where
        A: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let states = if transition.is_empty() {
            BTreeSet::from([start.to_string()])
        } else {
            transition.states().clone()
        };

        if !states.contains(start) {
            return Err(AutomatonError::UnknownState {
                role: "Start",
                state: start.to_string(),
            });
        }

        let accept = accept
            .into_iter()
            .map(|state| {
                let state = state.as_ref();
                if states.contains(state) {
                    Ok(state.to_string())
                } else {
                    Err(AutomatonError::UnknownState {
                        role: "Accept",
                        state: state.to_string(),
                    })
                }
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            transition,
            states,
            start: start.to_string(),
            accept,
        })
    }

    pub fn transition(&self) -> &DfaTransition {
        &self.transition
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        self.transition.alphabet()
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn accept(&self) -> &BTreeSet<String> {
        &self.accept
    }

    /// Folds the transition function over the word, returning the final state.
    ///
    /// Returns `None` if the word contains a letter outside the alphabet.
    pub fn run(&self, word: &str) -> Option<&str> {
        word.chars()
            .try_fold(self.start.as_str(), |state, letter| {
                self.transition.get(state, letter)
            })
    }

    /// Whether the word is accepted. Out-of-alphabet letters reject.
    pub fn accepts(&self, word: &str) -> bool {
        self.run(word)
            .is_some_and(|state| self.accept.contains(state))
    }

    fn successors<'a>(&'a self, state: &'a str) -> impl Iterator<Item = (char, &'a str)> + 'a {
        self.alphabet()
            .iter()
            .filter_map(move |&letter| self.transition.get(state, letter).map(|next| (letter, next)))
    }

    /// States reachable from the start state.
    pub fn reachable_states(&self) -> BTreeSet<&str> {
        reachable_states(&self.start, |state| {
            self.successors(state).map(|(_, next)| next).collect::<Vec<_>>()
        })
    }

    /// Returns the minimal DFA for the same language.
    ///
    /// Unreachable states are dropped, then blocks of equivalent states are found by
    /// Moore partition refinement. Each block is named after its len-lex smallest member.
    pub fn minimize(&self) -> Result<Dfa, AutomatonError> {
        let reachable = self.reachable_states();

        let mut blocks: BTreeMap<&str, usize> = reachable
            .iter()
            .map(|&state| (state, usize::from(self.accept.contains(state))))
            .collect();
        let mut block_count = blocks.values().collect::<BTreeSet<_>>().len();

        loop {
            let mut signatures: BTreeMap<(usize, Vec<usize>), usize> = BTreeMap::new();
            let mut refined = BTreeMap::new();

            for &state in &reachable {
                let successors = self
                    .successors(state)
                    .map(|(_, next)| blocks.get(next).copied().unwrap_or(usize::MAX))
                    .collect();
                let key = (blocks[state], successors);
                let next_id = signatures.len();
                let id = *signatures.entry(key).or_insert(next_id);
                refined.insert(state, id);
            }

            blocks = refined;
            if signatures.len() == block_count {
                break;
            }
            block_count = signatures.len();
        }

        let mut representatives: BTreeMap<usize, &str> = BTreeMap::new();
        for (&state, &block) in &blocks {
            representatives
                .entry(block)
                .and_modify(|current| {
                    if len_lex(state, current).is_lt() {
                        *current = state;
                    }
                })
                .or_insert(state);
        }

        let name = |state: &str| representatives[&blocks[state]];

        let mut entries = BTreeSet::new();
        for &state in &reachable {
            for (letter, next) in self.successors(state) {
                entries.insert(((name(state), letter.to_string()), name(next)));
            }
        }
        let accept: BTreeSet<&str> = reachable
            .iter()
            .filter(|state| self.accept.contains(**state))
            .map(|state| name(state))
            .collect();

        log::debug!(
            "Minimised DFA from {} to {} states",
            self.states.len(),
            representatives.len()
        );

        Dfa::new(entries, name(&self.start), accept)
    }
}

impl Recognizer for Dfa {
    fn input_alphabet(&self) -> &BTreeSet<char> {
        self.alphabet()
    }

    fn recognizes(&self, word: &str) -> bool {
        self.accepts(word)
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alphabet: Vec<String> = self.alphabet().iter().map(char::to_string).collect();
        write!(
            f,
            "<{}-state DFA with alphabet {{{}}}>",
            self.states.len(),
            alphabet.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts words containing a '1' whose final '1' is followed by an even number of '0's.
    fn create_m1() -> Dfa {
        Dfa::new(
            [
                (("q1", "0"), "q1"),
                (("q1", "1"), "q2"),
                (("q2", "0"), "q3"),
                (("q2", "1"), "q2"),
                (("q3", "0"), "q2"),
                (("q3", "1"), "q2"),
            ],
            "q1",
            ["q2"],
        )
        .unwrap()
    }

    #[test]
    fn test_dfa_creation() {
        let dfa = create_m1();
        assert_eq!(dfa.states().len(), 3);
        assert_eq!(dfa.alphabet(), &BTreeSet::from(['0', '1']));
        assert_eq!(dfa.start(), "q1");
        assert_eq!(dfa.accept(), &BTreeSet::from(["q2".to_string()]));
        assert_eq!(dfa.to_string(), "<3-state DFA with alphabet {0,1}>");
    }

    #[test]
    fn test_dfa_accepts() {
        let dfa = create_m1();
        assert!(dfa.accepts("1"));
        assert!(dfa.accepts("100"));
        assert!(dfa.accepts("010100"));
        assert!(!dfa.accepts(""));
        assert!(!dfa.accepts("000"));
        assert!(!dfa.accepts("010"));
    }

    #[test]
    fn test_dfa_rejects_foreign_letters() {
        let dfa = create_m1();
        assert!(!dfa.accepts("12"));
        assert_eq!(dfa.run("1a"), None);
    }

    #[test]
    fn test_dfa_language() {
        let dfa = create_m1();
        assert_eq!(
            dfa.language(3).unwrap(),
            vec!["1", "01", "11", "001", "011", "100", "101", "111"]
        );
        assert_eq!(dfa.language_lazy(3).count(), 8);
        assert_eq!(dfa.language_unbounded().take(3).collect::<Vec<_>>(), vec!["1", "01", "11"]);
    }

    #[test]
    fn test_dfa_invalid_start_and_accept() {
        let entries = [(("q1", "0"), "q1")];
        assert_eq!(
            Dfa::new(entries, "qx", ["q1"]),
            Err(AutomatonError::UnknownState {
                role: "Start",
                state: "qx".to_string()
            })
        );
        assert_eq!(
            Dfa::new(entries, "q1", ["q1", "qx"]),
            Err(AutomatonError::UnknownState {
                role: "Accept",
                state: "qx".to_string()
            })
        );
    }

    #[test]
    fn test_dfa_empty_alphabet() {
        let entries: Vec<((&str, &str), &str)> = Vec::new();
        let dfa = Dfa::new(entries, "q0", ["q0"]).unwrap();
        assert!(dfa.accepts(""));
        assert!(!dfa.accepts("a"));
        assert_eq!(dfa.language(4).unwrap(), vec![""]);
    }

    #[test]
    fn test_dfa_minimize_merges_equivalent_states() {
        // Ends with '1', with q2 and q3 equivalent and q4 unreachable.
        let dfa = Dfa::new(
            [
                (("q1", "0"), "q1"),
                (("q1", "1"), "q2"),
                (("q2", "0"), "q1"),
                (("q2", "1"), "q3"),
                (("q3", "0"), "q1"),
                (("q3", "1"), "q2"),
                (("q4", "0"), "q4"),
                (("q4", "1"), "q4"),
            ],
            "q1",
            ["q2", "q3"],
        )
        .unwrap();

        let minimal = dfa.minimize().unwrap();
        assert_eq!(minimal.states().len(), 2);
        assert_eq!(minimal.start(), "q1");
        assert_eq!(minimal.accept(), &BTreeSet::from(["q2".to_string()]));
        assert_eq!(minimal.language(5).unwrap(), dfa.language(5).unwrap());
    }

    #[test]
    fn test_dfa_minimize_keeps_minimal_dfa() {
        let dfa = create_m1();
        let minimal = dfa.minimize().unwrap();
        assert_eq!(minimal.states().len(), 3);
        assert_eq!(minimal.language(6).unwrap(), dfa.language(6).unwrap());
    }
}
