//! Validated transition tables for the four automaton models.
//!
//! Each table is built from raw string entries, checks every letter is a single
//! character, and derives the state set and alphabet(s) from its own entries so they
//! can never disagree with the table. The tables expose lookup-with-default,
//! containment and iteration; they never simulate anything themselves.

use crate::types::{AutomatonError, Direction, BLANK};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

static NO_STATES: BTreeSet<String> = BTreeSet::new();
static NO_MOVES: BTreeSet<(String, Option<char>)> = BTreeSet::new();

/// Orders strings by length first, then lexicographically.
pub fn len_lex(a: &str, b: &str) -> Ordering {
    a.chars()
        .count()
        .cmp(&b.chars().count())
        .then_with(|| a.cmp(b))
}

/// Returns the states sorted in len-lex order.
pub fn sorted_len_lex<'a>(states: impl IntoIterator<Item = &'a String>) -> Vec<&'a str> {
    let mut sorted: Vec<&str> = states.into_iter().map(String::as_str).collect();
    sorted.sort_by(|a, b| len_lex(a, b));
    sorted
}

/// Checks a state name or letter for forbidden characters.
pub(crate) fn check_name(name: &str) -> Result<(), AutomatonError> {
    match name.chars().find(|&c| crate::types::is_forbidden(c)) {
        Some(c) => Err(AutomatonError::ForbiddenCharacter(c, name.to_string())),
        None => Ok(()),
    }
}

/// Parses a letter that may be empty (epsilon).
pub(crate) fn parse_letter(letter: &str) -> Result<Option<char>, AutomatonError> {
    check_name(letter)?;
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => Ok(Some(c)),
        _ => Err(AutomatonError::InvalidLetter(letter.to_string())),
    }
}

/// Parses a letter that must be exactly one character.
pub(crate) fn parse_required_letter(letter: &str) -> Result<char, AutomatonError> {
    parse_letter(letter)?.ok_or_else(|| AutomatonError::InvalidLetter(letter.to_string()))
}

fn parse_state(state: &str) -> Result<String, AutomatonError> {
    check_name(state)?;
    Ok(state.to_string())
}

/// Total transition function `(state, letter) -> state` of a DFA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfaTransition {
    function: BTreeMap<String, BTreeMap<char, String>>,
    states: BTreeSet<String>,
    alphabet: BTreeSet<char>,
}

impl DfaTransition {
    /// Builds the table and checks it is full: every derived state has a target for
    /// every derived letter.
    pub fn new<I, S, L, T>(entries: I) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L), T)>,
        S: AsRef<str>,
        L: AsRef<str>,
        T: AsRef<str>,
    {
        let mut function: BTreeMap<String, BTreeMap<char, String>> = BTreeMap::new();
        let mut states = BTreeSet::new();
        let mut alphabet = BTreeSet::new();

        for ((state, letter), next) in entries {
            let state = parse_state(state.as_ref())?;
            let letter = parse_required_letter(letter.as_ref())?;
            let next = parse_state(next.as_ref())?;

            states.insert(state.clone());
            states.insert(next.clone());
            alphabet.insert(letter);

            let row = function.entry(state.clone()).or_default();
            if row.get(&letter).is_some_and(|existing| *existing != next) {
                return Err(AutomatonError::ConflictingTransition(state, letter));
            }
            row.insert(letter, next);
        }

        let transition = Self {
            function,
            states,
            alphabet,
        };
        transition.validate_fullness()?;

        Ok(transition)
    }

    fn validate_fullness(&self) -> Result<(), AutomatonError> {
        for state in &self.states {
            for &letter in &self.alphabet {
                if self.get(state, letter).is_none() {
                    return Err(AutomatonError::MissingTransition(state.clone(), letter));
                }
            }
        }
        Ok(())
    }

    /// Looks up the next state.
    ///
    /// # Arguments
    ///
    /// * `state` - The current state.
    /// * `letter` - The letter read.
    ///
    /// # Returns
    ///
    /// The target state, or `None` when the pair has no entry.
    pub fn get(&self, state: &str, letter: char) -> Option<&str> {
        self.function
            .get(state)
            .and_then(|row| row.get(&letter))
            .map(String::as_str)
    }

    /// Whether the pair has an entry.
    pub fn contains(&self, state: &str, letter: char) -> bool {
        self.get(state, letter).is_some()
    }

    /// Iterates `(state, letter, next_state)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, char, &str)> {
        self.function.iter().flat_map(|(state, row)| {
            row.iter()
                .map(move |(&letter, next)| (state.as_str(), letter, next.as_str()))
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.function.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every state named as a source or a target.
    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    /// The letters read by some entry.
    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }
}

/// Transition relation `(state, letter-or-ε) -> {states}` of an NFA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfaTransition {
    function: BTreeMap<String, BTreeMap<Option<char>, BTreeSet<String>>>,
    states: BTreeSet<String>,
    alphabet: BTreeSet<char>,
}

impl NfaTransition {
    /// Builds the relation. An empty letter denotes an epsilon move; entries with the
    /// same key are merged.
    pub fn new<I, S, L, V, T>(entries: I) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L), V)>,
        S: AsRef<str>,
        L: AsRef<str>,
        V: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut function: BTreeMap<String, BTreeMap<Option<char>, BTreeSet<String>>> =
            BTreeMap::new();
        let mut states = BTreeSet::new();
        let mut alphabet = BTreeSet::new();

        for ((state, letter), targets) in entries {
            let state = parse_state(state.as_ref())?;
            let letter = parse_letter(letter.as_ref())?;

            let mut next_states = BTreeSet::new();
            for target in targets {
                next_states.insert(parse_state(target.as_ref())?);
            }

            states.insert(state.clone());
            states.extend(next_states.iter().cloned());
            alphabet.extend(letter);

            function
                .entry(state)
                .or_default()
                .entry(letter)
                .or_default()
                .extend(next_states);
        }

        Ok(Self {
            function,
            states,
            alphabet,
        })
    }

    /// Targets of `(state, letter)`; empty when no entry exists.
    pub fn get(&self, state: &str, letter: Option<char>) -> &BTreeSet<String> {
        self.function
            .get(state)
            .and_then(|row| row.get(&letter))
            .unwrap_or(&NO_STATES)
    }

    /// Whether `(state, letter)` has an entry, even one with no targets.
    pub fn contains(&self, state: &str, letter: Option<char>) -> bool {
        self.function
            .get(state)
            .is_some_and(|row| row.contains_key(&letter))
    }

    /// Iterates `(state, letter, next_states)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<char>, &BTreeSet<String>)> {
        self.function.iter().flat_map(|(state, row)| {
            row.iter()
                .map(move |(&letter, targets)| (state.as_str(), letter, targets))
        })
    }

    /// Whether the relation has no entries.
    pub fn is_empty(&self) -> bool {
        self.function.is_empty()
    }

    /// Every state named as a source or a target.
    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    /// The non-epsilon letters read by some entry.
    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }
}

/// A PDA transition target: next state and the letter pushed (if any).
pub type PdaMove = (String, Option<char>);

/// Transition relation `(state, letter-or-ε, stack-top-or-ε) -> {(state, push)}` of a PDA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdaTransition {
    function: BTreeMap<String, BTreeMap<(Option<char>, Option<char>), BTreeSet<PdaMove>>>,
    states: BTreeSet<String>,
    input_alphabet: BTreeSet<char>,
    stack_alphabet: BTreeSet<char>,
}

impl PdaTransition {
    /// Builds the relation. Empty input or stack letters denote epsilon; at most one
    /// stack letter is popped and pushed per step.
    pub fn new<I, S, L, K, V, T, P>(entries: I) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L, K), V)>,
        S: AsRef<str>,
        L: AsRef<str>,
        K: AsRef<str>,
        V: IntoIterator<Item = (T, P)>,
        T: AsRef<str>,
        P: AsRef<str>,
    {
        let mut function: BTreeMap<
            String,
            BTreeMap<(Option<char>, Option<char>), BTreeSet<PdaMove>>,
        > = BTreeMap::new();
        let mut states = BTreeSet::new();
        let mut input_alphabet = BTreeSet::new();
        let mut stack_alphabet = BTreeSet::new();

        for ((state, letter, top), targets) in entries {
            let state = parse_state(state.as_ref())?;
            let letter = parse_letter(letter.as_ref())?;
            let top = parse_letter(top.as_ref())?;

            let mut moves = BTreeSet::new();
            for (next, push) in targets {
                let next = parse_state(next.as_ref())?;
                let push = parse_letter(push.as_ref())?;
                states.insert(next.clone());
                stack_alphabet.extend(push);
                moves.insert((next, push));
            }

            states.insert(state.clone());
            input_alphabet.extend(letter);
            stack_alphabet.extend(top);

            function
                .entry(state)
                .or_default()
                .entry((letter, top))
                .or_default()
                .extend(moves);
        }

        Ok(Self {
            function,
            states,
            input_alphabet,
            stack_alphabet,
        })
    }

    /// Moves for `(state, letter, top)`; empty when no entry exists.
    pub fn get(&self, state: &str, letter: Option<char>, top: Option<char>) -> &BTreeSet<PdaMove> {
        self.function
            .get(state)
            .and_then(|row| row.get(&(letter, top)))
            .unwrap_or(&NO_MOVES)
    }

    /// Whether `(state, letter, top)` has an entry.
    pub fn contains(&self, state: &str, letter: Option<char>, top: Option<char>) -> bool {
        self.function
            .get(state)
            .is_some_and(|row| row.contains_key(&(letter, top)))
    }

    /// Iterates `(state, letter, top, moves)` entries.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&str, Option<char>, Option<char>, &BTreeSet<PdaMove>)> {
        self.function.iter().flat_map(|(state, row)| {
            row.iter()
                .map(move |(&(letter, top), moves)| (state.as_str(), letter, top, moves))
        })
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    /// Letters read from the input.
    pub fn input_alphabet(&self) -> &BTreeSet<char> {
        &self.input_alphabet
    }

    /// Letters pushed or matched on the stack.
    pub fn stack_alphabet(&self) -> &BTreeSet<char> {
        &self.stack_alphabet
    }
}

/// The action a Turing Machine takes on reading a letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TmMove {
    pub next_state: String,
    pub write: char,
    pub direction: Direction,
}

/// Total transition function `(state, tape letter) -> (state, write, direction)` of a TM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmTransition {
    function: BTreeMap<String, BTreeMap<char, TmMove>>,
    states: BTreeSet<String>,
    input_alphabet: BTreeSet<char>,
    tape_alphabet: BTreeSet<char>,
}

impl TmTransition {
    /// Builds the table for the given halting states.
    ///
    /// The tape alphabet always contains [`BLANK`]; the input alphabet excludes the blank
    /// and every reserved letter. Missing entries for non-halting states are completed
    /// to reject, rewriting the letter read and moving right.
    pub fn new<I, S, L, N, W, D>(
        entries: I,
        accept: &str,
        reject: &str,
        reserved: &BTreeSet<char>,
    ) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L), (N, W, D))>,
        S: AsRef<str>,
        L: AsRef<str>,
        N: AsRef<str>,
        W: AsRef<str>,
        D: AsRef<str>,
    {
        if accept == reject {
            return Err(AutomatonError::IdenticalHaltingStates(accept.to_string()));
        }

        let mut function: BTreeMap<String, BTreeMap<char, TmMove>> = BTreeMap::new();
        let mut states: BTreeSet<String> = [parse_state(accept)?, parse_state(reject)?].into();
        let mut tape_alphabet = BTreeSet::from([BLANK]);

        for ((state, letter), (next, write, direction)) in entries {
            let state = parse_state(state.as_ref())?;
            if state == accept || state == reject {
                return Err(AutomatonError::HaltingStateInKey(state));
            }

            let letter = parse_required_letter(letter.as_ref())?;
            let tm_move = TmMove {
                next_state: parse_state(next.as_ref())?,
                write: parse_required_letter(write.as_ref())?,
                direction: Direction::parse(direction.as_ref())?,
            };

            states.insert(state.clone());
            states.insert(tm_move.next_state.clone());
            tape_alphabet.insert(letter);
            tape_alphabet.insert(tm_move.write);

            let row = function.entry(state.clone()).or_default();
            if row.get(&letter).is_some_and(|existing| *existing != tm_move) {
                return Err(AutomatonError::ConflictingTransition(state, letter));
            }
            row.insert(letter, tm_move);
        }

        let input_alphabet = tape_alphabet
            .iter()
            .copied()
            .filter(|letter| *letter != BLANK && !reserved.contains(letter))
            .collect();

        let mut transition = Self {
            function,
            states,
            input_alphabet,
            tape_alphabet,
        };
        transition.complete(accept, reject);

        Ok(transition)
    }

    /// Sends every missing `(state, letter)` pair to the reject state.
    fn complete(&mut self, accept: &str, reject: &str) {
        for state in &self.states {
            if state == accept || state == reject {
                continue;
            }

            let row = self.function.entry(state.clone()).or_default();
            for &letter in &self.tape_alphabet {
                row.entry(letter).or_insert_with(|| TmMove {
                    next_state: reject.to_string(),
                    write: letter,
                    direction: Direction::Right,
                });
            }
        }
    }

    /// Looks up the move taken on reading `letter` in `state`.
    ///
    /// # Returns
    ///
    /// The move, or `None` when the machine has no entry for the pair.
    pub fn get(&self, state: &str, letter: char) -> Option<&TmMove> {
        self.function.get(state).and_then(|row| row.get(&letter))
    }

    /// Whether the pair has a move.
    pub fn contains(&self, state: &str, letter: char) -> bool {
        self.get(state, letter).is_some()
    }

    /// Iterates `(state, letter, move)` entries, including completed ones.
    pub fn iter(&self) -> impl Iterator<Item = (&str, char, &TmMove)> {
        self.function.iter().flat_map(|(state, row)| {
            row.iter()
                .map(move |(&letter, tm_move)| (state.as_str(), letter, tm_move))
        })
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    /// Letters input words may contain.
    pub fn input_alphabet(&self) -> &BTreeSet<char> {
        &self.input_alphabet
    }

    /// Every letter read or written, blank included.
    pub fn tape_alphabet(&self) -> &BTreeSet<char> {
        &self.tape_alphabet
    }
}
