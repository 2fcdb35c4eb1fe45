//! Nondeterministic finite automata with epsilon moves, simulated by breadth-first search
//! over `(state, suffix)` configurations.

use crate::config::{rebuild_path, NfaConfig};
use crate::transition::NfaTransition;
use crate::types::AutomatonError;
use crate::words::Recognizer;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

/// A nondeterministic finite automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa {
    transition: NfaTransition,
    states: BTreeSet<String>,
    start: String,
    accept: BTreeSet<String>,
}

impl Nfa {
    /// Creates an NFA from `((state, letter), next_states)` entries, where an empty letter
    /// is an epsilon move.
    pub fn new<I, S, L, V, T, A, N>(transitions: I, start: &str, accept: A) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L), V)>,
        S: AsRef<str>,
        L: AsRef<str>,
        V: IntoIterator<Item = T>,
        T: AsRef<str>,
        A: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        Self::from_transition(NfaTransition::new(transitions)?, start, accept)
    }

    /// Creates an NFA from an already validated transition relation.
    pub fn from_transition<A, N>(
        transition: NfaTransition,
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

        let mut accepting = BTreeSet::new();
        for state in accept {
            let state = state.as_ref();
            if !states.contains(state) {
                return Err(AutomatonError::UnknownState {
                    role: "Accept",
                    state: state.to_string(),
                });
            }
            accepting.insert(state.to_string());
        }

        Ok(Self {
            transition,
            states,
            start: start.to_string(),
            accept: accepting,
        })
    }

    pub fn transition(&self) -> &NfaTransition {
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

    /// States reachable in one step on `letter` (`None` for epsilon). Empty when the
    /// relation has no entry.
    pub fn next_states(&self, state: &str, letter: Option<char>) -> &BTreeSet<String> {
        self.transition.get(state, letter)
    }

    /// Whether the word is accepted. Out-of-alphabet letters reject.
    pub fn accepts(&self, word: &str) -> bool {
        self.trace(word).is_some()
    }

    /// Returns the first accepting branch found, from `(start, word)` to an accepting
    /// configuration with nothing left to read.
    ///
    /// The search is breadth first, so the branch has the fewest steps. Each
    /// `(state, suffix)` pair is expanded once, which bounds the search even with
    /// epsilon cycles.
    pub fn trace<'a>(&'a self, word: &'a str) -> Option<Vec<NfaConfig<'a>>> {
        if !word.chars().all(|letter| self.alphabet().contains(&letter)) {
            return None;
        }

        let root = NfaConfig::new(&self.start, word);
        let mut queue = VecDeque::from([root]);
        let mut visited = HashSet::new();
        let mut parents: HashMap<NfaConfig<'a>, NfaConfig<'a>> = HashMap::new();

        while let Some(current) = queue.pop_front() {
            if current.suffix.is_empty() && self.accept.contains(current.state) {
                return Some(rebuild_path(&parents, current));
            }
            if !visited.insert(current) {
                continue;
            }

            let mut successors = Vec::new();
            if let Some(letter) = current.suffix.chars().next() {
                let rest = &current.suffix[letter.len_utf8()..];
                for next in self.next_states(current.state, Some(letter)) {
                    successors.push(NfaConfig::new(next, rest));
                }
            }
            for next in self.next_states(current.state, None) {
                successors.push(NfaConfig::new(next, current.suffix));
            }

            for next in successors {
                if next != root {
                    parents.entry(next).or_insert(current);
                }
                queue.push_back(next);
            }
        }

        None
    }
}

impl Recognizer for Nfa {
    fn input_alphabet(&self) -> &BTreeSet<char> {
        self.alphabet()
    }

    fn recognizes(&self, word: &str) -> bool {
        self.accepts(word)
    }
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alphabet: Vec<String> = self.alphabet().iter().map(char::to_string).collect();
        write!(
            f,
            "<{}-state NFA with alphabet {{{}}}>",
            self.states.len(),
            alphabet.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts words containing `11` or `101`.
    fn create_n1() -> Nfa {
        Nfa::new(
            [
                (("q1", "0"), vec!["q1"]),
                (("q1", "1"), vec!["q1", "q2"]),
                (("q2", ""), vec!["q3"]),
                (("q2", "0"), vec!["q3"]),
                (("q3", "1"), vec!["q4"]),
                (("q4", "0"), vec!["q4"]),
                (("q4", "1"), vec!["q4"]),
            ],
            "q1",
            ["q4"],
        )
        .unwrap()
    }

    #[test]
    fn test_nfa_creation() {
        let nfa = create_n1();
        assert_eq!(nfa.states().len(), 4);
        assert_eq!(nfa.to_string(), "<4-state NFA with alphabet {0,1}>");
        assert_eq!(nfa.next_states("q1", Some('1')).len(), 2);
        assert!(nfa.next_states("q3", Some('0')).is_empty());
    }

    #[test]
    fn test_nfa_accepts() {
        let nfa = create_n1();
        assert!(nfa.accepts("11"));
        assert!(nfa.accepts("101"));
        assert!(nfa.accepts("010110"));
        assert!(!nfa.accepts(""));
        assert!(!nfa.accepts("0"));
        assert!(!nfa.accepts("1001"));
        assert!(!nfa.accepts("1a1"));
    }

    #[test]
    fn test_nfa_language() {
        let nfa = create_n1();
        assert_eq!(nfa.language(3).unwrap(), vec!["11", "011", "101", "110", "111"]);
    }

    #[test]
    fn test_nfa_trace_follows_epsilon_moves() {
        let nfa = create_n1();
        let path: Vec<String> = nfa
            .trace("11")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(path, vec!["(q1, 11)", "(q2, 1)", "(q3, 1)", "(q4, ε)"]);
        assert!(nfa.trace("10").is_none());
    }

    #[test]
    fn test_nfa_epsilon_cycle_terminates() {
        let nfa = Nfa::new(
            [
                (("q1", ""), vec!["q2"]),
                (("q2", ""), vec!["q1"]),
                (("q2", "a"), vec!["q3"]),
                (("q3", "a"), vec![]),
            ],
            "q1",
            ["q3"],
        )
        .unwrap();

        assert!(nfa.accepts("a"));
        assert!(!nfa.accepts(""));
        assert!(!nfa.accepts("aa"));
    }

    #[test]
    fn test_nfa_invalid_states() {
        let entries = [(("q1", "a"), vec!["q2"])];
        assert_eq!(
            Nfa::new(entries.clone(), "q0", ["q2"]),
            Err(AutomatonError::UnknownState {
                role: "Start",
                state: "q0".to_string()
            })
        );
        assert!(matches!(
            Nfa::new(entries, "q1", ["q9"]),
            Err(AutomatonError::UnknownState { role: "Accept", .. })
        ));
    }
}
