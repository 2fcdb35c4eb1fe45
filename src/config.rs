//! Configurations: snapshots of a computation used as nodes of the search graph.
//!
//! Configurations carry no history. Equality and hashing cover exactly the fields that
//! identify a node, so they can be stored in visited sets directly; traces are rebuilt
//! from predecessor maps instead.

use crate::types::BLANK;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Walks a predecessor map back from `last` to the root of the search.
pub(crate) fn rebuild_path<C: Clone + Eq + Hash>(parents: &HashMap<C, C>, last: C) -> Vec<C> {
    let mut path = vec![last];
    while let Some(parent) = path.last().and_then(|config| parents.get(config)) {
        path.push(parent.clone());
    }
    path.reverse();
    path
}

fn display_word(word: &str) -> &str {
    if word.is_empty() {
        "ε"
    } else {
        word
    }
}

/// NFA configuration: current state and the unread suffix of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NfaConfig<'a> {
    pub state: &'a str,
    pub suffix: &'a str,
}

impl<'a> NfaConfig<'a> {
    pub fn new(state: &'a str, suffix: &'a str) -> Self {
        Self { state, suffix }
    }
}

impl fmt::Display for NfaConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.state, display_word(self.suffix))
    }
}

/// PDA configuration: state, unread suffix and stack contents (top first).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PdaConfig<'a> {
    pub state: &'a str,
    pub suffix: &'a str,
    pub stack: String,
}

impl<'a> PdaConfig<'a> {
    pub fn new(state: &'a str, suffix: &'a str, stack: impl Into<String>) -> Self {
        Self {
            state,
            suffix,
            stack: stack.into(),
        }
    }

    /// The letter at the top of the stack, if any.
    pub fn top(&self) -> Option<char> {
        self.stack.chars().next()
    }
}

impl fmt::Display for PdaConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.state,
            display_word(self.suffix),
            display_word(&self.stack)
        )
    }
}

/// Turing Machine configuration: state, tape contents and head position.
///
/// The tape is singly infinite; cells beyond its end are blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TmConfig<'a> {
    pub state: &'a str,
    pub tape: Vec<char>,
    pub head: usize,
}

impl<'a> TmConfig<'a> {
    pub fn new(state: &'a str, tape: Vec<char>, head: usize) -> Self {
        Self { state, tape, head }
    }

    /// The letter under the head, or blank past the end of the tape.
    pub fn letter(&self) -> char {
        self.tape.get(self.head).copied().unwrap_or(BLANK)
    }
}

/// Renders as `xx(q1)#0`: the state is written immediately left of the scanned cell.
impl fmt::Display for TmConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let split = self.head.min(self.tape.len());
        let before: String = self.tape[..split].iter().collect();
        let after: String = self.tape[split..].iter().collect();
        write!(f, "{}({}){}", before, self.state, after)?;
        if after.is_empty() {
            write!(f, "{}", BLANK)?;
        }
        Ok(())
    }
}
