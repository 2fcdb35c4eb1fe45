//! Pushdown automata, simulated by breadth-first search over `(state, suffix, stack)`
//! configurations.
//!
//! The stack is a string whose first character is the top. Acceptance is by final
//! state with the input consumed, whatever remains on the stack. The search has no
//! step bound, so it is a semi-decision procedure for machines whose stack can grow
//! without limit on epsilon moves.

use crate::config::{rebuild_path, PdaConfig};
use crate::transition::PdaTransition;
use crate::types::AutomatonError;
use crate::words::Recognizer;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

/// A pushdown automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pda {
    transition: PdaTransition,
    start: String,
    accept: BTreeSet<String>,
}

impl Pda {
    /// Creates a PDA from `((state, letter, top), [(next_state, push)])` entries, where
    /// empty letters are epsilon.
    pub fn new<I, S, L, K, V, T, P, A, N>(
        transitions: I,
        start: &str,
        accept: A,
    ) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L, K), V)>,
        S: AsRef<str>,
        L: AsRef<str>,
        K: AsRef<str>,
        V: IntoIterator<Item = (T, P)>,
        T: AsRef<str>,
        P: AsRef<str>,
        A: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let transition = PdaTransition::new(transitions)?;
        let states = transition.states();

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
            start: start.to_string(),
            accept: accepting,
        })
    }

    pub fn transition(&self) -> &PdaTransition {
        &self.transition
    }

    pub fn states(&self) -> &BTreeSet<String> {
        self.transition.states()
    }

    pub fn input_alphabet(&self) -> &BTreeSet<char> {
        self.transition.input_alphabet()
    }

    pub fn stack_alphabet(&self) -> &BTreeSet<char> {
        self.transition.stack_alphabet()
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn accept(&self) -> &BTreeSet<String> {
        &self.accept
    }

    /// Every configuration one step away.
    ///
    /// Tries reading the next letter or nothing, combined with popping the stack top or
    /// nothing; only the components a matching key actually reads are consumed.
    pub fn next_configs<'a>(&'a self, config: &PdaConfig<'a>) -> Vec<PdaConfig<'a>> {
        let letter = config.suffix.chars().next();
        let top = config.top();

        let mut letters = vec![None];
        letters.extend(letter.map(Some));
        let mut tops = vec![None];
        tops.extend(top.map(Some));

        let mut configs = Vec::new();
        for &read in &letters {
            let suffix = match read {
                Some(letter) => &config.suffix[letter.len_utf8()..],
                None => config.suffix,
            };

            for &pop in &tops {
                let rest = match pop {
                    Some(top) => &config.stack[top.len_utf8()..],
                    None => config.stack.as_str(),
                };

                for (next, push) in self.transition.get(config.state, read, pop) {
                    let mut stack = String::with_capacity(rest.len() + 1);
                    stack.extend(*push);
                    stack.push_str(rest);
                    configs.push(PdaConfig::new(next, suffix, stack));
                }
            }
        }

        configs
    }

    /// Whether the word is accepted. Out-of-alphabet letters reject.
    pub fn accepts(&self, word: &str) -> bool {
        self.trace(word).is_some()
    }

    /// Returns the first accepting branch found by breadth-first search, from
    /// `(start, word, ε)` to an accepting configuration with the input consumed.
    pub fn trace<'a>(&'a self, word: &'a str) -> Option<Vec<PdaConfig<'a>>> {
        if !word
            .chars()
            .all(|letter| self.input_alphabet().contains(&letter))
        {
            return None;
        }

        let root = PdaConfig::new(&self.start, word, "");
        let mut queue = VecDeque::from([root.clone()]);
        let mut visited = HashSet::new();
        let mut parents: HashMap<PdaConfig<'a>, PdaConfig<'a>> = HashMap::new();

        while let Some(current) = queue.pop_front() {
            if current.suffix.is_empty() && self.accept.contains(current.state) {
                return Some(rebuild_path(&parents, current));
            }
            if visited.contains(&current) {
                continue;
            }

            for next in self.next_configs(&current) {
                if next != root && !parents.contains_key(&next) {
                    parents.insert(next.clone(), current.clone());
                }
                queue.push_back(next);
            }
            visited.insert(current);
        }

        None
    }
}

impl Recognizer for Pda {
    fn input_alphabet(&self) -> &BTreeSet<char> {
        self.transition.input_alphabet()
    }

    fn recognizes(&self, word: &str) -> bool {
        self.accepts(word)
    }
}

impl fmt::Display for Pda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |letters: &BTreeSet<char>| {
            letters
                .iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        write!(
            f,
            "<{}-state PDA with input alphabet {{{}}} and stack alphabet {{{}}}>",
            self.states().len(),
            join(self.input_alphabet()),
            join(self.stack_alphabet())
        )
    }
}
