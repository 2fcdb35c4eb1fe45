//! This crate provides the core logic for a formal-language toolkit.
//! It includes modules for simulating finite automata, pushdown automata and Turing
//! Machines, compiling regular expressions into automata, analyzing automata for
//! likely mistakes, and normalizing context-free grammars into Chomsky Normal Form.

pub mod analyzer;
pub mod cfg;
pub mod cnf;
pub mod config;
pub mod dfa;
pub mod gnfa;
pub mod nfa;
pub mod parser;
pub mod pda;
pub mod subset;
pub mod tm;
pub mod transition;
pub mod types;
pub mod words;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the analysis functions and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze_dfa, analyze_nfa, analyze_pda, analyze_tm, AnalysisError};
/// Re-exports the grammar type and its rule representation.
pub use cfg::{canonicalize, Cfg, RawBody, Rules};
/// Re-exports the configuration types used in computation traces.
pub use config::{NfaConfig, PdaConfig, TmConfig};
pub use dfa::Dfa;
/// Re-exports the regex compilers from the gnfa module.
pub use gnfa::{regex_to_dfa, regex_to_nfa, Gnfa};
pub use nfa::Nfa;
/// Re-exports the regex validation functions from the parser module.
pub use parser::{add_concat, is_valid, validate};
pub use pda::Pda;
/// Re-exports the subset construction from NFA to DFA.
pub use subset::nfa_to_dfa;
/// Re-exports the Turing Machine model, its options and the stepwise executor.
pub use tm::{Computation, Tm, TmOptions, TuringMachine};
/// Re-exports various shared types and limits from the types module.
pub use types::{
    AutomatonError, Direction, GrammarError, Mode, Outcome, RegexError, Step, BLANK, EPSILON,
    MAX_EXECUTION_STEPS,
};
/// Re-exports the `Recognizer` trait shared by every automaton model.
pub use words::Recognizer;
