//! Regex compilation through a generalized NFA.
//!
//! A GNFA starts as a single edge `s0 -> t` labelled by the whole regex (with explicit
//! `.` concatenation). Compound labels are then eliminated one at a time, each
//! elimination replacing an edge with shorter-labelled edges, until every label is
//! a single letter or empty. The result reads off directly as an NFA.

use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::parser::{add_concat, validate};
use crate::subset::nfa_to_dfa;
use crate::types::RegexError;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// A GNFA edge, labelled by an arbitrary regex fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.label, self.to)
    }
}

/// How a label is taken apart: by its loosest-binding top-level operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elimination {
    /// A single letter or the empty label, possibly in brackets.
    Primitive,
    Union(String, String),
    Concat(String, String),
    Star(String),
}

/// Removes every pair of brackets that encloses the whole label: `((a+b))` becomes
/// `a+b`, while `(a)(b)` is left alone.
pub fn trim_enclosing_brackets(label: &str) -> &str {
    let mut label = label;

    while label.starts_with('(') && label.ends_with(')') {
        let mut depth = 0usize;
        let mut closes_at = None;
        for (i, c) in label.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            }
            if depth == 0 {
                closes_at = Some(i);
                break;
            }
        }

        if closes_at == Some(label.len() - 1) {
            label = &label[1..label.len() - 1];
        } else {
            break;
        }
    }

    label
}

/// Positions of `op` outside any brackets.
fn top_level(label: &str, op: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in label.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if c == op && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Decides how a label is eliminated.
///
/// After trimming enclosing brackets, the leftmost top-level `+` splits a union; failing
/// that, the leftmost top-level `.` splits a concatenation; failing that, a trailing `*`
/// stars everything before it.
///
/// # Errors
///
/// * `RegexError::Elimination` if the label contains operators but matches no rule.
pub fn classify(label: &str) -> Result<Elimination, RegexError> {
    let trimmed = trim_enclosing_brackets(label);

    if !trimmed.contains(|c| matches!(c, '+' | '.' | '*')) {
        return Ok(Elimination::Primitive);
    }

    if let Some(i) = top_level(trimmed, '+') {
        return Ok(Elimination::Union(
            trimmed[..i].to_string(),
            trimmed[i + 1..].to_string(),
        ));
    }

    if let Some(i) = top_level(trimmed, '.') {
        return Ok(Elimination::Concat(
            trimmed[..i].to_string(),
            trimmed[i + 1..].to_string(),
        ));
    }

    match trimmed.strip_suffix('*') {
        Some(inner) => Ok(Elimination::Star(inner.to_string())),
        None => Err(RegexError::Elimination(label.to_string())),
    }
}

/// A generalized NFA under elimination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gnfa {
    states: Vec<String>,
    edges: Vec<Edge>,
    start: String,
    accept: String,
}

impl Gnfa {
    /// Creates the two-state GNFA for a regex that already has explicit concatenation.
    pub fn new(regex: &str) -> Self {
        Self {
            states: vec!["s0".to_string(), "t".to_string()],
            edges: vec![Edge::new("s0", "t", regex)],
            start: "s0".to_string(),
            accept: "t".to_string(),
        }
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    /// Whether every label is a letter or empty.
    pub fn is_primitive(&self) -> bool {
        self.edges
            .iter()
            .all(|edge| matches!(classify(&edge.label), Ok(Elimination::Primitive)))
    }

    /// Adds a fresh state. States are named `s0, t, s1, s2, ...`.
    fn new_state(&mut self) -> String {
        let state = format!("s{}", self.states.len() - 1);
        self.states.push(state.clone());
        state
    }

    fn remove_edge(&mut self, edge: &Edge) -> Result<(), RegexError> {
        let missing = || {
            RegexError::MissingEdge(edge.from.clone(), edge.to.clone(), edge.label.clone())
        };

        if !self.states.contains(&edge.from) || !self.states.contains(&edge.to) {
            return Err(missing());
        }
        let position = self.edges.iter().position(|e| e == edge).ok_or_else(missing)?;
        self.edges.remove(position);
        Ok(())
    }

    fn add_edges<const N: usize>(&mut self, edges: [Edge; N]) -> [Edge; N] {
        self.edges.extend(edges.iter().cloned());
        edges
    }

    /// Replaces `s1 -[R1+R2]-> s2` with parallel edges labelled `R1` and `R2`.
    pub fn eliminate_union(
        &mut self,
        edge: &Edge,
        left: &str,
        right: &str,
    ) -> Result<[Edge; 2], RegexError> {
        self.remove_edge(edge)?;
        Ok(self.add_edges([
            Edge::new(&edge.from, &edge.to, left),
            Edge::new(&edge.from, &edge.to, right),
        ]))
    }

    /// Replaces `s1 -[R1.R2]-> s2` with `s1 -[R1]-> s3 -[R2]-> s2` through a fresh `s3`.
    pub fn eliminate_concat(
        &mut self,
        edge: &Edge,
        left: &str,
        right: &str,
    ) -> Result<[Edge; 2], RegexError> {
        self.remove_edge(edge)?;
        let middle = self.new_state();
        Ok(self.add_edges([
            Edge::new(&edge.from, &middle, left),
            Edge::new(&middle, &edge.to, right),
        ]))
    }

    /// Replaces `s1 -[R*]-> s2` with empty edges into and out of a fresh `s3` that
    /// loops on `R`.
    pub fn eliminate_star(&mut self, edge: &Edge, inner: &str) -> Result<[Edge; 3], RegexError> {
        self.remove_edge(edge)?;
        let middle = self.new_state();
        Ok(self.add_edges([
            Edge::new(&edge.from, &middle, ""),
            Edge::new(&middle, &edge.to, ""),
            Edge::new(&middle, &middle, inner),
        ]))
    }

    /// Eliminates compound labels until every edge is primitive.
    ///
    /// Edges are processed from a worklist; each elimination queues the edges it
    /// creates. Every new label is strictly shorter than the one it replaces, so the
    /// worklist drains.
    pub fn eliminate(&mut self) -> Result<(), RegexError> {
        let mut queue: VecDeque<Edge> = self.edges.iter().cloned().collect();

        while let Some(edge) = queue.pop_front() {
            let created: Vec<Edge> = match classify(&edge.label)? {
                Elimination::Primitive => continue,
                Elimination::Union(left, right) => {
                    self.eliminate_union(&edge, &left, &right)?.into()
                }
                Elimination::Concat(left, right) => {
                    self.eliminate_concat(&edge, &left, &right)?.into()
                }
                Elimination::Star(inner) => self.eliminate_star(&edge, &inner)?.into(),
            };

            log::trace!("Eliminated {} into {} edges", edge, created.len());
            queue.extend(created);
        }

        Ok(())
    }

    /// Eliminates all compound labels and reads the edges off as an NFA.
    pub fn to_nfa(mut self) -> Result<Nfa, RegexError> {
        self.eliminate()?;

        let mut transitions: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
        for edge in &self.edges {
            let letter = trim_enclosing_brackets(&edge.label).to_string();
            transitions
                .entry((edge.from.clone(), letter))
                .or_default()
                .push(edge.to.clone());
        }

        log::debug!(
            "GNFA reduced to {} states and {} edges",
            self.states.len(),
            self.edges.len()
        );

        Ok(Nfa::new(transitions, &self.start, [&self.accept])?)
    }
}

/// Compiles a regex into an equivalent NFA.
///
/// # Errors
///
/// * `RegexError::Syntax` if the regex is not well formed.
pub fn regex_to_nfa(regex: &str) -> Result<Nfa, RegexError> {
    validate(regex)?;
    Gnfa::new(&add_concat(regex)).to_nfa()
}

/// Compiles a regex into an equivalent DFA by subset construction on its NFA.
pub fn regex_to_dfa(regex: &str) -> Result<Dfa, RegexError> {
    let nfa = regex_to_nfa(regex)?;
    Ok(nfa_to_dfa(&nfa)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::Recognizer;

    #[test]
    fn test_trim_enclosing_brackets() {
        assert_eq!(trim_enclosing_brackets("(a)"), "a");
        assert_eq!(trim_enclosing_brackets("((a+b))"), "a+b");
        assert_eq!(trim_enclosing_brackets("(a).(b)"), "(a).(b)");
        assert_eq!(trim_enclosing_brackets("(a)*"), "(a)*");
        assert_eq!(trim_enclosing_brackets("()"), "");
        assert_eq!(trim_enclosing_brackets(""), "");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("a").unwrap(), Elimination::Primitive);
        assert_eq!(classify("").unwrap(), Elimination::Primitive);
        assert_eq!(classify("((b))").unwrap(), Elimination::Primitive);
        assert_eq!(
            classify("a+b+c").unwrap(),
            Elimination::Union("a".to_string(), "b+c".to_string())
        );
        assert_eq!(
            classify("a.b+c").unwrap(),
            Elimination::Union("a.b".to_string(), "c".to_string())
        );
        assert_eq!(
            classify("(a+b).c").unwrap(),
            Elimination::Concat("(a+b)".to_string(), "c".to_string())
        );
        assert_eq!(
            classify("(a)*").unwrap(),
            Elimination::Star("(a)".to_string())
        );
        assert_eq!(
            classify("(a+b)*").unwrap(),
            Elimination::Star("(a+b)".to_string())
        );
        assert_eq!(
            classify("a*b"),
            Err(RegexError::Elimination("a*b".to_string()))
        );
    }

    #[test]
    fn test_eliminate_concat_names_states() {
        let mut gnfa = Gnfa::new("a.b");
        gnfa.eliminate().unwrap();

        assert_eq!(gnfa.states(), ["s0", "t", "s1"]);
        assert_eq!(
            gnfa.edges(),
            [Edge::new("s0", "s1", "a"), Edge::new("s1", "t", "b")]
        );
        assert!(gnfa.is_primitive());
    }

    #[test]
    fn test_eliminate_star() {
        let mut gnfa = Gnfa::new("a*");
        let edge = gnfa.edges()[0].clone();
        let created = gnfa.eliminate_star(&edge, "a").unwrap();

        assert_eq!(created[2], Edge::new("s1", "s1", "a"));
        assert_eq!(gnfa.edges().len(), 3);
        assert!(gnfa.is_primitive());
    }

    #[test]
    fn test_eliminate_missing_edge() {
        let mut gnfa = Gnfa::new("a+b");
        let ghost = Edge::new("s0", "t", "c+d");
        assert_eq!(
            gnfa.eliminate_union(&ghost, "c", "d"),
            Err(RegexError::MissingEdge(
                "s0".to_string(),
                "t".to_string(),
                "c+d".to_string()
            ))
        );

        let unknown = Edge::new("s0", "s9", "a+b");
        assert!(gnfa.eliminate_union(&unknown, "a", "b").is_err());
    }

    #[test]
    fn test_regex_to_nfa_language() {
        let nfa = regex_to_nfa("a*b*").unwrap();
        assert_eq!(
            nfa.language(3).unwrap(),
            vec!["", "a", "b", "aa", "ab", "bb", "aaa", "aab", "abb", "bbb"]
        );
    }

    #[test]
    fn test_regex_to_nfa_union_and_brackets() {
        let nfa = regex_to_nfa("(0 + 1)* 1").unwrap();
        assert!(nfa.accepts("1"));
        assert!(nfa.accepts("0101"));
        assert!(!nfa.accepts(""));
        assert!(!nfa.accepts("10"));
    }

    #[test]
    fn test_regex_to_nfa_empty() {
        let nfa = regex_to_nfa("").unwrap();
        assert!(nfa.alphabet().is_empty());
        assert_eq!(nfa.language(3).unwrap(), vec![""]);
    }

    #[test]
    fn test_regex_to_nfa_invalid() {
        assert!(matches!(
            regex_to_nfa("a+*"),
            Err(RegexError::Syntax { .. })
        ));
        assert!(matches!(
            regex_to_nfa("a\tb"),
            Err(RegexError::Syntax { position: 1, .. })
        ));
    }

    #[test]
    fn test_regex_to_dfa() {
        let dfa = regex_to_dfa("(a+b)*abb").unwrap();
        assert!(dfa.accepts("abb"));
        assert!(dfa.accepts("babb"));
        assert!(!dfa.accepts("abba"));
        assert_eq!(dfa.minimize().unwrap().states().len(), 4);

        let empty = regex_to_dfa("").unwrap();
        assert_eq!(empty.states().len(), 1);
        assert!(empty.accepts(""));
    }
}
