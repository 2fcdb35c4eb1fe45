//! This module defines the core data structures and types shared by every automaton model,
//! the regular-expression compiler and the grammar engine: reserved symbols, execution
//! limits, head directions, decision outcomes, and error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Rule;

/// The blank letter written on unvisited Turing Machine tape cells.
pub const BLANK: char = '_';
/// The grammar symbol denoting the empty production.
pub const EPSILON: &str = "ε";
/// Default name of the Turing Machine accept state.
pub const DEFAULT_TM_ACCEPT: &str = "qa";
/// Default name of the Turing Machine reject state.
pub const DEFAULT_TM_REJECT: &str = "qr";
/// The maximum number of steps a Turing Machine executes before giving up.
pub const MAX_EXECUTION_STEPS: usize = 10000;
/// The largest number of words an eager language enumeration will materialize.
pub const MAX_EAGER_WORDS: u128 = 1_000_000;
/// Default word length used by callers that have no better bound.
pub const DEFAULT_LANGUAGE_LENGTH: usize = 5;

/// Characters that may never appear in a state name or a letter.
pub(crate) fn is_forbidden(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

/// Represents the possible directions a Turing Machine head can move.
///
/// The tape is singly infinite, so there is no neutral move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left (floored at the first cell).
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// Parses `L`/`R` in either case.
    pub fn parse(input: &str) -> Result<Self, AutomatonError> {
        match input {
            "L" | "l" => Ok(Direction::Left),
            "R" | "r" => Ok(Direction::Right),
            _ => Err(AutomatonError::InvalidDirection(input.to_string())),
        }
    }
}

/// The decision reached by a Turing Machine on one input word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The accept state was entered.
    Accept,
    /// The reject state was entered, or the word was outside the input alphabet.
    Reject,
    /// A configuration repeated, or the step budget ran out.
    Undecided,
}

impl Outcome {
    pub fn is_accept(self) -> bool {
        self == Outcome::Accept
    }
}

/// Represents the outcome of a single Turing Machine execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine performed a step and continues execution.
    Continue,
    /// The machine has reached a decision.
    Halt(Outcome),
}

/// How analyzer findings are treated when a Turing Machine is constructed.
///
/// - `Normal` (default): findings are logged and kept as warnings.
/// - `Strict`: the first finding fails construction.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    Strict,
}

/// Errors raised while constructing or enumerating an automaton.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    /// A letter was not exactly one character (or empty, where epsilon is allowed).
    #[error("Letter '{0}' must be a single character")]
    InvalidLetter(String),
    /// A state or letter contains a whitespace or control character.
    #[error("Forbidden character {0:?} used in '{1}'")]
    ForbiddenCharacter(char, String),
    /// A deterministic transition table lacks an entry.
    #[error("Transition function is missing key ({0}, {1})")]
    MissingTransition(String, char),
    /// The same deterministic key was given two different targets.
    #[error("Conflicting transitions for key ({0}, {1})")]
    ConflictingTransition(String, char),
    /// A start/accept state is not mentioned by the transition table.
    #[error("{role} state '{state}' is not listed in the transition function")]
    UnknownState { role: &'static str, state: String },
    /// A halting state appears as the source of a Turing Machine transition.
    #[error("Unexpected appearance of halting state '{0}' in transition key")]
    HaltingStateInKey(String),
    /// The accept and reject states coincide.
    #[error("Accept and reject states cannot be equal (both '{0}')")]
    IdenticalHaltingStates(String),
    /// A head direction other than `L`/`R`.
    #[error("Unrecognised direction '{0}'")]
    InvalidDirection(String),
    /// Indicates an analyzer finding promoted to an error in strict mode.
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// An eager enumeration would materialize too many words.
    #[error("Refusing to generate {words} words in memory (limit {limit}); use lazy enumeration")]
    LanguageTooLarge { words: u128, limit: u128 },
}

/// Errors raised while compiling a regular expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegexError {
    /// The expression does not follow the regex grammar.
    #[error("Invalid regular expression at position {position}: {source}")]
    Syntax {
        position: usize,
        #[source]
        source: Box<pest::error::Error<Rule>>,
    },
    /// A GNFA edge label could not be classified.
    #[error("Failed to eliminate label '{0}'")]
    Elimination(String),
    /// A GNFA edge or state referenced by an elimination does not exist.
    #[error("Edge ({0}, {1}, '{2}') is not in the GNFA")]
    MissingEdge(String, String, String),
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
}

/// Errors raised while constructing a context-free grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The start symbol has no rules.
    #[error("Start symbol '{0}' is not a declared nonterminal")]
    UndeclaredStart(String),
    /// A body of several symbols contains epsilon.
    #[error("Epsilon cannot appear inside the compound body {1:?} of '{0}'")]
    EpsilonInCompound(String, Vec<String>),
    /// A nonterminal name is empty.
    #[error("Nonterminal names cannot be empty")]
    EmptyNonterminal,
}
