//! Context-free grammars: canonical rule maps, symbol extraction, bounded language
//! enumeration, membership, union and conversion to Chomsky Normal Form.

use crate::cnf;
use crate::types::{GrammarError, EPSILON};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An ordered sequence of symbols on the right-hand side of a rule.
pub type Body = Vec<String>;

/// Canonical rule map: every nonterminal with its deduplicated, len-lex sorted bodies.
pub type Rules = BTreeMap<String, Vec<Body>>;

/// A rule body as written by the caller.
///
/// A bare symbol is never split into characters: `"abc"` is one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBody {
    Symbol(String),
    Sequence(Vec<String>),
}

impl From<&str> for RawBody {
    fn from(symbol: &str) -> Self {
        RawBody::Symbol(symbol.to_string())
    }
}

impl From<String> for RawBody {
    fn from(symbol: String) -> Self {
        RawBody::Symbol(symbol)
    }
}

impl From<Vec<String>> for RawBody {
    fn from(symbols: Vec<String>) -> Self {
        RawBody::Sequence(symbols)
    }
}

impl From<Vec<&str>> for RawBody {
    fn from(symbols: Vec<&str>) -> Self {
        RawBody::Sequence(symbols.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RawBody {
    fn from(symbols: [&str; N]) -> Self {
        RawBody::Sequence(symbols.iter().map(|s| s.to_string()).collect())
    }
}

/// Whether a symbol stands for the empty production.
pub fn is_epsilon_symbol(symbol: &str) -> bool {
    symbol.is_empty() || symbol == EPSILON
}

/// Whether a body is the epsilon body.
pub fn is_epsilon(body: &[String]) -> bool {
    matches!(body, [symbol] if symbol == EPSILON)
}

/// The epsilon body.
pub fn epsilon_body() -> Body {
    vec![EPSILON.to_string()]
}

/// Orders bodies by length first, then symbol by symbol.
pub fn body_len_lex(a: &[String], b: &[String]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Deduplicates and sorts bodies in len-lex order.
pub fn sorted_bodies(bodies: impl IntoIterator<Item = Body>) -> Vec<Body> {
    let mut sorted: Vec<Body> = bodies.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    sorted.sort_by(|a, b| body_len_lex(a, b));
    sorted
}

fn canonical_body(head: &str, raw: RawBody) -> Result<Body, GrammarError> {
    let symbols = match raw {
        RawBody::Symbol(symbol) => vec![symbol],
        RawBody::Sequence(symbols) => symbols,
    };

    if symbols.is_empty() || (symbols.len() == 1 && is_epsilon_symbol(&symbols[0])) {
        return Ok(epsilon_body());
    }
    if symbols.len() > 1 && symbols.iter().any(|s| is_epsilon_symbol(s)) {
        return Err(GrammarError::EpsilonInCompound(head.to_string(), symbols));
    }

    Ok(symbols)
}

/// Normalises a rule map.
///
/// Empty bodies and `""` become the epsilon body; bodies are deduplicated and sorted
/// len-lex. Repeated heads are merged.
///
/// # Errors
///
/// * `GrammarError::EmptyNonterminal` if a head is the empty string.
/// * `GrammarError::EpsilonInCompound` if epsilon is one of several symbols in a body.
pub fn canonicalize<I, K, B, R>(rules: I) -> Result<Rules, GrammarError>
where
    I: IntoIterator<Item = (K, B)>,
    K: AsRef<str>,
    B: IntoIterator<Item = R>,
    R: Into<RawBody>,
{
    let mut collected: BTreeMap<String, Vec<Body>> = BTreeMap::new();

    for (head, bodies) in rules {
        let head = head.as_ref();
        if head.is_empty() {
            return Err(GrammarError::EmptyNonterminal);
        }
        let entry = collected.entry(head.to_string()).or_default();
        for raw in bodies {
            entry.push(canonical_body(head, raw.into())?);
        }
    }

    Ok(collected
        .into_iter()
        .map(|(head, bodies)| (head, sorted_bodies(bodies)))
        .collect())
}

/// Every symbol used by the rules, heads included.
pub fn symbols(rules: &Rules) -> BTreeSet<String> {
    rules
        .iter()
        .flat_map(|(head, bodies)| std::iter::once(head).chain(bodies.iter().flatten()))
        .filter(|symbol| *symbol != EPSILON)
        .cloned()
        .collect()
}

/// Symbols that appear in bodies but are neither heads nor epsilon.
pub fn terminals_of(rules: &Rules) -> BTreeSet<String> {
    rules
        .values()
        .flatten()
        .flatten()
        .filter(|symbol| *symbol != EPSILON && !rules.contains_key(*symbol))
        .cloned()
        .collect()
}

/// A context-free grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cfg {
    rules: Rules,
    start: String,
    terminals: BTreeSet<String>,
}

impl Cfg {
    /// Canonicalises `rules` and builds the grammar.
    ///
    /// # Errors
    ///
    /// Any error of [`canonicalize`], or `GrammarError::UndeclaredStart` if `start` has
    /// no entry in the rule map.
    pub fn new<I, K, B, R>(rules: I, start: &str) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = (K, B)>,
        K: AsRef<str>,
        B: IntoIterator<Item = R>,
        R: Into<RawBody>,
    {
        let rules = canonicalize(rules)?;
        if !rules.contains_key(start) {
            return Err(GrammarError::UndeclaredStart(start.to_string()));
        }

        Ok(Self {
            terminals: terminals_of(&rules),
            rules,
            start: start.to_string(),
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    /// The nonterminals, start symbol first and the rest in order.
    pub fn nonterminals(&self) -> Vec<&str> {
        std::iter::once(self.start.as_str())
            .chain(
                self.rules
                    .keys()
                    .map(String::as_str)
                    .filter(|head| *head != self.start),
            )
            .collect()
    }

    pub fn terminals(&self) -> &BTreeSet<String> {
        &self.terminals
    }

    pub fn is_nonterminal(&self, symbol: &str) -> bool {
        self.rules.contains_key(symbol)
    }

    /// Every sentence of at most `n` terminals the grammar derives, in len-lex order.
    ///
    /// Computed as a least fixpoint: each nonterminal's set of short sentences is grown
    /// from its bodies until nothing changes. Derivations never shrink, so truncating
    /// at `n` symbols loses nothing.
    pub fn language(&self, n: usize) -> Vec<Vec<String>> {
        let mut derived: BTreeMap<&str, BTreeSet<Vec<&str>>> = self
            .rules
            .keys()
            .map(|head| (head.as_str(), BTreeSet::new()))
            .collect();

        loop {
            let mut changed = false;

            for (head, bodies) in &self.rules {
                let mut found: Vec<Vec<&str>> = Vec::new();
                for body in bodies {
                    found.extend(self.expand_body(body, &derived, n));
                }

                if let Some(sentences) = derived.get_mut(head.as_str()) {
                    for sentence in found {
                        changed |= sentences.insert(sentence);
                    }
                }
            }

            if !changed {
                break;
            }
        }

        let mut language: Vec<Vec<String>> = derived
            .remove(self.start.as_str())
            .unwrap_or_default()
            .into_iter()
            .map(|sentence| sentence.into_iter().map(String::from).collect())
            .collect();
        language.sort_by(|a, b| body_len_lex(a, b));
        language
    }

    /// The sentences of at most `n` terminals a body derives from what is known so far.
    fn expand_body<'a>(
        &'a self,
        body: &'a [String],
        derived: &BTreeMap<&str, BTreeSet<Vec<&'a str>>>,
        n: usize,
    ) -> BTreeSet<Vec<&'a str>> {
        let mut partial: BTreeSet<Vec<&'a str>> = BTreeSet::from([Vec::new()]);

        for symbol in body.iter().filter(|symbol| *symbol != EPSILON) {
            let mut extended = BTreeSet::new();
            match derived.get(symbol.as_str()) {
                Some(options) => {
                    for prefix in &partial {
                        for option in options {
                            if prefix.len() + option.len() <= n {
                                extended.insert([prefix.as_slice(), option.as_slice()].concat());
                            }
                        }
                    }
                }
                None => {
                    for prefix in &partial {
                        if prefix.len() < n {
                            let mut sentence = prefix.clone();
                            sentence.push(symbol.as_str());
                            extended.insert(sentence);
                        }
                    }
                }
            }
            partial = extended;
            if partial.is_empty() {
                break;
            }
        }

        partial
    }

    /// Whether the grammar derives exactly this sequence of terminals.
    ///
    /// Each nonterminal collects the spans `(i, j)` of the sentence it derives until a
    /// fixpoint is reached; the sentence is generated iff the start symbol spans it all.
    pub fn generates<S: AsRef<str>>(&self, sentence: &[S]) -> bool {
        let words: Vec<&str> = sentence.iter().map(|s| s.as_ref()).collect();
        let len = words.len();
        let mut spans: BTreeMap<&str, BTreeSet<(usize, usize)>> = self
            .rules
            .keys()
            .map(|head| (head.as_str(), BTreeSet::new()))
            .collect();

        loop {
            let mut changed = false;

            for (head, bodies) in &self.rules {
                let mut found = BTreeSet::new();
                for body in bodies {
                    let mut reach: BTreeSet<(usize, usize)> = (0..=len).map(|i| (i, i)).collect();
                    for symbol in body.iter().filter(|symbol| *symbol != EPSILON) {
                        reach = match spans.get(symbol.as_str()) {
                            Some(sub) => reach
                                .iter()
                                .flat_map(|&(i, j)| sub.range((j, 0)..=(j, len)).map(move |&(_, k)| (i, k)))
                                .collect(),
                            None => reach
                                .iter()
                                .filter(|&&(_, j)| words.get(j) == Some(&symbol.as_str()))
                                .map(|&(i, j)| (i, j + 1))
                                .collect(),
                        };
                    }
                    found.extend(reach);
                }

                if let Some(known) = spans.get_mut(head.as_str()) {
                    for span in found {
                        changed |= known.insert(span);
                    }
                }
            }

            if !changed {
                break;
            }
        }

        spans
            .get(self.start.as_str())
            .is_some_and(|known| known.contains(&(0, len)))
    }

    /// A grammar for the union of both languages.
    ///
    /// A fresh start symbol derives either start symbol. Nonterminals that would clash
    /// with a symbol of the other grammar are renamed first, so the two rule sets stay
    /// independent even over different terminal alphabets.
    pub fn union(&self, other: &Cfg) -> Result<Cfg, GrammarError> {
        let mut taken: BTreeSet<String> = symbols(&self.rules);
        taken.extend(symbols(&other.rules));

        let left = rename_nonterminals(&self.rules, &other.terminals, &mut taken);
        let self_symbols = symbols(&self.rules);
        let right = rename_nonterminals(&other.rules, &self_symbols, &mut taken);

        let start = cnf::fresh_symbol("S0", &mut taken);
        let left_start = left.renamed(&self.start);
        let right_start = right.renamed(&other.start);

        let mut rules = left.rules;
        rules.extend(right.rules);
        rules.insert(start.clone(), vec![vec![left_start], vec![right_start]]);

        Cfg::new(rules, &start)
    }

    /// An equivalent grammar in Chomsky Normal Form.
    pub fn to_chomsky_normal_form(&self) -> Result<Cfg, GrammarError> {
        let (rules, start) = cnf::to_chomsky_normal_form(&self.rules, &self.start);
        Cfg::new(rules, &start)
    }

    pub fn is_chomsky_normal_form(&self) -> bool {
        cnf::is_chomsky_normal_form(&self.rules, &self.start)
    }
}

struct Renamed {
    rules: Rules,
    names: BTreeMap<String, String>,
}

impl Renamed {
    fn renamed(&self, symbol: &str) -> String {
        self.names
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| symbol.to_string())
    }
}

/// Renames every nonterminal found in `clashes` to a fresh name.
fn rename_nonterminals(rules: &Rules, clashes: &BTreeSet<String>, taken: &mut BTreeSet<String>) -> Renamed {
    let names: BTreeMap<String, String> = rules
        .keys()
        .filter(|head| clashes.contains(*head))
        .map(|head| (head.clone(), cnf::fresh_symbol(head, taken)))
        .collect();

    let mut renamed = Renamed {
        rules: Rules::new(),
        names,
    };
    for (head, bodies) in rules {
        let bodies = bodies
            .iter()
            .map(|body| body.iter().map(|symbol| renamed.renamed(symbol)).collect())
            .collect();
        renamed.rules.insert(renamed.renamed(head), bodies);
    }
    renamed
}

impl fmt::Display for Cfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, head) in self.nonterminals().into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let bodies: Vec<String> = self.rules[head].iter().map(|body| body.join(" ")).collect();
            write!(f, "{} ::= {}", head, bodies.join(" | "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(symbols: &[&str]) -> Body {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn joined(language: Vec<Vec<String>>) -> Vec<String> {
        language.into_iter().map(|sentence| sentence.concat()).collect()
    }

    /// A -> 0 A 1 | B, B -> #
    fn create_balanced() -> Cfg {
        Cfg::new(
            [
                ("A", vec![RawBody::from(["0", "A", "1"]), RawBody::from("B")]),
                ("B", vec![RawBody::from("#")]),
            ],
            "A",
        )
        .unwrap()
    }

    #[test]
    fn test_canonicalize_bodies() {
        let rules = canonicalize([("A", vec![RawBody::from("a"), RawBody::from(["b", "c"]), RawBody::from(vec!["d"])])])
            .unwrap();
        assert_eq!(rules["A"], vec![body(&["a"]), body(&["d"]), body(&["b", "c"])]);
    }

    #[test]
    fn test_canonicalize_epsilon() {
        for raw in [RawBody::from(""), RawBody::from(EPSILON), RawBody::Sequence(vec![]), RawBody::from([""])] {
            let rules = canonicalize([("A", vec![raw])]).unwrap();
            assert_eq!(rules["A"], vec![epsilon_body()]);
        }
    }

    #[test]
    fn test_canonicalize_dedup_and_sort() {
        let rules = canonicalize([("A", vec![vec!["b", "a"], vec!["a"], vec!["a", "b"], vec!["b"], vec!["a"]])]).unwrap();
        assert_eq!(
            rules["A"],
            vec![body(&["a"]), body(&["b"]), body(&["a", "b"]), body(&["b", "a"])]
        );
    }

    #[test]
    fn test_canonicalize_keeps_symbols_whole() {
        let rules = canonicalize([("A", vec!["abc"])]).unwrap();
        assert_eq!(rules["A"], vec![body(&["abc"])]);
    }

    #[test]
    fn test_canonicalize_errors() {
        assert!(matches!(
            canonicalize([("A", vec![vec!["a", ""]])]),
            Err(GrammarError::EpsilonInCompound(head, _)) if head == "A"
        ));
        assert!(matches!(
            canonicalize([("", vec!["a"])]),
            Err(GrammarError::EmptyNonterminal)
        ));
        assert!(canonicalize(Vec::<(&str, Vec<&str>)>::new()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_start() {
        let result = Cfg::new([("A", vec!["a"]), ("B", vec!["b"])], "C");
        assert!(matches!(result, Err(GrammarError::UndeclaredStart(s)) if s == "C"));
    }

    #[test]
    fn test_symbols() {
        let cfg = Cfg::new(
            [("S", vec![vec!["A", "b"]]), ("A", vec![vec!["a"], vec![""]])],
            "S",
        )
        .unwrap();
        assert_eq!(cfg.nonterminals(), vec!["S", "A"]);
        assert_eq!(cfg.terminals(), &BTreeSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_display() {
        assert_eq!(create_balanced().to_string(), "A ::= B | 0 A 1\nB ::= #");
    }

    #[test]
    fn test_language() {
        let cfg = create_balanced();
        assert_eq!(joined(cfg.language(5)), vec!["#", "0#1", "00#11"]);
        assert!(cfg.language(0).is_empty());
    }

    #[test]
    fn test_language_with_epsilon_and_left_recursion() {
        let cfg = Cfg::new([("S", vec![vec!["S", "a"], vec![""]])], "S").unwrap();
        assert_eq!(joined(cfg.language(3)), vec!["", "a", "aa", "aaa"]);
    }

    #[test]
    fn test_generates() {
        let cfg = create_balanced();
        assert!(cfg.generates(&["0", "0", "#", "1", "1"]));
        assert!(cfg.generates(&["#"]));
        assert!(!cfg.generates(&["0", "#"]));
        assert!(!cfg.generates::<&str>(&[]));

        let nullable = Cfg::new([("S", vec![vec!["S", "S"], vec!["(", "S", ")"], vec![""]])], "S").unwrap();
        assert!(nullable.generates::<&str>(&[]));
        assert!(nullable.generates(&["(", "(", ")", ")", "(", ")"]));
        assert!(!nullable.generates(&["(", ")", ")"]));
    }

    #[test]
    fn test_union() {
        let zeros = Cfg::new([("S", vec![vec!["0", "S"], vec!["0"]])], "S").unwrap();
        let ones = Cfg::new([("S", vec![vec!["1", "S"], vec!["1"]])], "S").unwrap();
        let union = zeros.union(&ones).unwrap();

        assert_eq!(union.start(), "S0");
        assert_eq!(union.nonterminals(), vec!["S0", "S", "S'"]);
        assert_eq!(joined(union.language(2)), vec!["0", "1", "00", "11"]);
    }

    #[test]
    fn test_union_renames_nonterminal_used_as_terminal() {
        let left = Cfg::new([("A", vec!["x"])], "A").unwrap();
        let right = Cfg::new([("x", vec!["A"])], "x").unwrap();
        let union = left.union(&right).unwrap();

        assert!(union.generates(&["x"]));
        assert!(union.generates(&["A"]));
        assert_eq!(union.terminals().len(), 2);
    }

    #[test]
    fn test_to_chomsky_normal_form() {
        let cfg = create_balanced();
        assert!(!cfg.is_chomsky_normal_form());

        let cnf = cfg.to_chomsky_normal_form().unwrap();
        assert!(cnf.is_chomsky_normal_form());
        assert_eq!(cnf.language(7), cfg.language(7));
    }
}
