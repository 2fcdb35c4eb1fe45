//! This module provides functions for analyzing automata to detect likely mistakes
//! before they are run: states that can never be entered, and machines whose accept
//! states cannot be reached at all. Findings are reported, never repaired.

use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::pda::Pda;
use crate::tm::Tm;
use crate::types::AutomatonError;
use std::collections::BTreeSet;
use thiserror::Error;

/// Represents the findings the analyzer can report for an automaton.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum AnalysisError {
    /// No accept state can be reached from the start state (named here), so the
    /// language is empty.
    #[error("No accept state is reachable from start state '{0}'")]
    AcceptUnreachable(String),
    /// States that no sequence of transitions from the start state enters.
    #[error("Unreachable states detected: {0:?}")]
    UnreachableStates(Vec<String>),
}

impl From<AnalysisError> for AutomatonError {
    /// Converts an `AnalysisError` into an `AutomatonError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        AutomatonError::ValidationError(error.to_string())
    }
}

/// Collects every state reachable from `start` by a worklist traversal of the
/// transition graph described by `successors`.
pub fn reachable_states<'a, F, I>(start: &'a str, successors: F) -> BTreeSet<&'a str>
where
    F: Fn(&'a str) -> I,
    I: IntoIterator<Item = &'a str>,
{
    let mut visited = BTreeSet::new();
    let mut queue = vec![start];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for next in successors(state) {
            if !visited.contains(next) {
                queue.push(next);
            }
        }
    }

    visited
}

/// Runs both checks against a reachable set, skipping states listed in `ignore`.
fn check_reachability<'a>(
    start: &str,
    states: &'a BTreeSet<String>,
    accept: impl IntoIterator<Item = &'a String>,
    reachable: &BTreeSet<&str>,
    ignore: &[&str],
) -> Vec<AnalysisError> {
    let mut errors = Vec::new();

    let accept: Vec<&String> = accept.into_iter().collect();
    if !accept.is_empty() && !accept.iter().any(|state| reachable.contains(state.as_str())) {
        errors.push(AnalysisError::AcceptUnreachable(start.to_string()));
    }

    // BTreeSet iteration keeps the report sorted
    let unreachable: Vec<String> = states
        .iter()
        .filter(|state| !reachable.contains(state.as_str()) && !ignore.contains(&state.as_str()))
        .cloned()
        .collect();
    if !unreachable.is_empty() {
        errors.push(AnalysisError::UnreachableStates(unreachable));
    }

    errors
}

/// Analyzes a DFA.
pub fn analyze_dfa(dfa: &Dfa) -> Vec<AnalysisError> {
    let reachable = dfa.reachable_states();
    check_reachability(dfa.start(), dfa.states(), dfa.accept(), &reachable, &[])
}

/// Analyzes an NFA. Epsilon moves count as ordinary edges.
pub fn analyze_nfa(nfa: &Nfa) -> Vec<AnalysisError> {
    let reachable = reachable_states(nfa.start(), |state| {
        nfa.transition()
            .iter()
            .filter(move |(from, _, _)| *from == state)
            .flat_map(|(_, _, targets)| targets.iter().map(String::as_str))
            .collect::<Vec<_>>()
    });
    check_reachability(nfa.start(), nfa.states(), nfa.accept(), &reachable, &[])
}

/// Analyzes a PDA's control graph, ignoring the stack. A state reported unreachable
/// here is unreachable under every stack discipline.
pub fn analyze_pda(pda: &Pda) -> Vec<AnalysisError> {
    let reachable = reachable_states(pda.start(), |state| {
        pda.transition()
            .iter()
            .filter(move |(from, _, _, _)| *from == state)
            .flat_map(|(_, _, _, moves)| moves.iter().map(|(next, _)| next.as_str()))
            .collect::<Vec<_>>()
    });
    check_reachability(pda.start(), pda.states(), pda.accept(), &reachable, &[])
}

/// Analyzes a Turing Machine, including the reject edges added by completion.
///
/// The reject state is always reachable by completion, so it is never reported.
pub fn analyze_tm(tm: &Tm) -> Vec<AnalysisError> {
    let reachable = reachable_states(tm.start(), |state| {
        tm.transition()
            .iter()
            .filter(move |(from, _, _)| *from == state)
            .map(|(_, _, tm_move)| tm_move.next_state.as_str())
            .collect::<Vec<_>>()
    });
    let accept = tm.states().iter().filter(|state| *state == tm.accept());
    check_reachability(tm.start(), tm.states(), accept, &reachable, &[tm.accept(), tm.reject()])
}
