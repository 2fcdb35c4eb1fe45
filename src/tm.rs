//! This module defines the single-tape Turing Machine model and the `TuringMachine`
//! stepper that executes it. The tape is singly infinite and grows to the right on
//! demand; the machine decides each word as accept, reject or undecided.

use crate::analyzer::{analyze_tm, AnalysisError};
use crate::config::TmConfig;
use crate::transition::{TmMove, TmTransition};
use crate::types::{
    AutomatonError, Direction, Mode, Outcome, Step, BLANK, DEFAULT_TM_ACCEPT, DEFAULT_TM_REJECT,
    MAX_EXECUTION_STEPS,
};
use crate::words::Recognizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Construction options for a Turing Machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TmOptions {
    /// Name of the accept state.
    pub accept: String,
    /// Name of the reject state.
    pub reject: String,
    /// Tape-only letters that may not appear in input words.
    pub reserved: BTreeSet<char>,
    /// Steps executed before a run is reported undecided.
    pub max_steps: usize,
    pub mode: Mode,
}

impl Default for TmOptions {
    fn default() -> Self {
        Self {
            accept: DEFAULT_TM_ACCEPT.to_string(),
            reject: DEFAULT_TM_REJECT.to_string(),
            reserved: BTreeSet::new(),
            max_steps: MAX_EXECUTION_STEPS,
            mode: Mode::default(),
        }
    }
}

impl TmOptions {
    /// Sets the name of the accept state.
    ///
    /// # Arguments
    ///
    /// * `accept` - A state name that no transition may leave.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    /// Sets the name of the reject state.
    ///
    /// # Arguments
    ///
    /// * `reject` - A state name distinct from the accept state.
    pub fn with_reject(mut self, reject: impl Into<String>) -> Self {
        self.reject = reject.into();
        self
    }

    /// Sets the tape-only letters.
    ///
    /// # Arguments
    ///
    /// * `reserved` - Letters the machine may write but input words may not contain.
    pub fn with_reserved(mut self, reserved: impl IntoIterator<Item = char>) -> Self {
        self.reserved = reserved.into_iter().collect();
        self
    }

    /// Sets the step budget after which a run is undecided.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets how analyzer findings are treated at construction.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// The result of running a Turing Machine on one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computation {
    /// How the run ended.
    pub outcome: Outcome,
    /// The tape when the machine stopped.
    pub tape: Vec<char>,
    /// Number of transitions taken.
    pub steps: usize,
}

/// A deterministic single-tape Turing Machine with one accept and one reject state.
#[derive(Debug, Clone)]
pub struct Tm {
    transition: TmTransition,
    start: String,
    accept: String,
    reject: String,
    max_steps: usize,
    warnings: Vec<AnalysisError>,
}

impl Tm {
    /// Creates a machine with the default options (`qa`/`qr`, no reserved letters).
    pub fn new<I, S, L, N, W, D>(transitions: I, start: &str) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L), (N, W, D))>,
        S: AsRef<str>,
        L: AsRef<str>,
        N: AsRef<str>,
        W: AsRef<str>,
        D: AsRef<str>,
    {
        Self::with_options(transitions, start, TmOptions::default())
    }

    /// Creates a machine from `((state, letter), (next_state, write, direction))` entries.
    ///
    /// Analyzer findings are logged and kept as [`Tm::warnings`] in `Normal` mode;
    /// in `Strict` mode the first one fails construction.
    pub fn with_options<I, S, L, N, W, D>(
        transitions: I,
        start: &str,
        options: TmOptions,
    ) -> Result<Self, AutomatonError>
    where
        I: IntoIterator<Item = ((S, L), (N, W, D))>,
        S: AsRef<str>,
        L: AsRef<str>,
        N: AsRef<str>,
        W: AsRef<str>,
        D: AsRef<str>,
    {
        let transition = TmTransition::new(
            transitions,
            &options.accept,
            &options.reject,
            &options.reserved,
        )?;

        if !transition.states().contains(start) {
            return Err(AutomatonError::UnknownState {
                role: "Start",
                state: start.to_string(),
            });
        }

        let mut tm = Self {
            transition,
            start: start.to_string(),
            accept: options.accept,
            reject: options.reject,
            max_steps: options.max_steps,
            warnings: Vec::new(),
        };

        let findings = analyze_tm(&tm);
        match options.mode {
            Mode::Strict => {
                if let Some(error) = findings.into_iter().next() {
                    return Err(error.into());
                }
            }
            Mode::Normal => {
                for finding in &findings {
                    log::warn!("{}: {}", tm, finding);
                }
                tm.warnings = findings;
            }
        }

        Ok(tm)
    }

    /// The completed transition function.
    pub fn transition(&self) -> &TmTransition {
        &self.transition
    }

    /// Every state, halting states included.
    pub fn states(&self) -> &BTreeSet<String> {
        self.transition.states()
    }

    /// Letters input words may contain.
    pub fn input_alphabet(&self) -> &BTreeSet<char> {
        self.transition.input_alphabet()
    }

    /// Letters that may appear on the tape, blank included.
    pub fn tape_alphabet(&self) -> &BTreeSet<char> {
        self.transition.tape_alphabet()
    }

    /// The start state.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// The accept state.
    pub fn accept(&self) -> &str {
        &self.accept
    }

    /// The reject state.
    pub fn reject(&self) -> &str {
        &self.reject
    }

    /// Steps executed before a run is reported undecided.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Analyzer findings recorded at construction in `Normal` mode.
    pub fn warnings(&self) -> &[AnalysisError] {
        &self.warnings
    }

    /// The decision a state stands for, if it is a halting state.
    pub fn halting_outcome(&self, state: &str) -> Option<Outcome> {
        if state == self.accept {
            Some(Outcome::Accept)
        } else if state == self.reject {
            Some(Outcome::Reject)
        } else {
            None
        }
    }

    /// Moves the head one cell, returning its new position.
    ///
    /// Moving left from the first cell leaves the head in place. Moving right past the
    /// end of the tape appends blank cells.
    pub fn move_head(head: usize, tape: &mut Vec<char>, direction: Direction) -> usize {
        match direction {
            Direction::Left => head.saturating_sub(1),
            Direction::Right => {
                let head = head + 1;
                if head >= tape.len() {
                    tape.resize(head + 1, BLANK);
                }
                head
            }
        }
    }

    /// The configuration one step after `config`, or `None` in a halting state.
    pub fn next_config<'a>(&'a self, config: &TmConfig<'a>) -> Option<TmConfig<'a>> {
        let TmMove {
            next_state,
            write,
            direction,
        } = self.transition.get(config.state, config.letter())?;

        let mut tape = config.tape.clone();
        if config.head >= tape.len() {
            tape.resize(config.head + 1, BLANK);
        }
        tape[config.head] = *write;
        let head = Self::move_head(config.head, &mut tape, *direction);

        Some(TmConfig::new(next_state, tape, head))
    }

    /// The configuration the machine starts in on `word`: the word on the tape (a
    /// single blank if it is empty) with the head on the first cell.
    pub fn initial_config(&self, word: &str) -> TmConfig<'_> {
        let tape = if word.is_empty() {
            vec![BLANK]
        } else {
            word.chars().collect()
        };
        TmConfig::new(&self.start, tape, 0)
    }

    /// Whether the word is built from input letters only.
    pub fn is_input(&self, word: &str) -> bool {
        word.chars()
            .all(|letter| letter != BLANK && self.input_alphabet().contains(&letter))
    }

    /// Creates a stepper positioned at the start of the computation on `word`.
    pub fn machine(&self, word: &str) -> TuringMachine<'_> {
        TuringMachine::new(self, word)
    }

    /// Decides the word.
    ///
    /// Words containing the blank or letters outside the input alphabet are rejected
    /// without running the machine.
    pub fn accepts(&self, word: &str) -> Outcome {
        self.machine(word).run()
    }

    /// Runs the machine on the word and returns the outcome with the final tape.
    pub fn compute(&self, word: &str) -> Computation {
        let mut machine = self.machine(word);
        let outcome = machine.run();

        Computation {
            outcome,
            tape: machine.tape().to_vec(),
            steps: machine.step_count(),
        }
    }

    /// Every configuration the machine passes through on the word, including the
    /// initial and final ones.
    pub fn trace(&self, word: &str) -> Vec<TmConfig<'_>> {
        let mut machine = self.machine(word);
        let mut configs = vec![machine.config().clone()];

        loop {
            let steps = machine.step_count();
            let step = machine.step();
            if machine.step_count() > steps {
                configs.push(machine.config().clone());
            }
            if let Step::Halt(_) = step {
                break;
            }
        }

        configs
    }
}

impl Recognizer for Tm {
    fn input_alphabet(&self) -> &BTreeSet<char> {
        self.transition.input_alphabet()
    }

    /// Only `Accept` counts as membership.
    fn recognizes(&self, word: &str) -> bool {
        self.accepts(word).is_accept()
    }
}

impl fmt::Display for Tm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |letters: &BTreeSet<char>| {
            letters
                .iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        // Halting states are not counted.
        write!(
            f,
            "<{}-state TM with input alphabet {{{}}} and tape alphabet {{{}}}>",
            self.states().len().saturating_sub(2),
            join(self.input_alphabet()),
            join(self.tape_alphabet())
        )
    }
}

/// Executes a [`Tm`] on one word, one step at a time.
///
/// The stepper remembers every configuration it has been in. Re-entering one means the
/// computation can never halt, and the word is undecided; so is exhausting the step
/// budget.
pub struct TuringMachine<'a> {
    tm: &'a Tm,
    initial: TmConfig<'a>,
    config: TmConfig<'a>,
    visited: HashSet<TmConfig<'a>>,
    step_count: usize,
    outcome: Option<Outcome>,
    valid_input: bool,
}

impl<'a> TuringMachine<'a> {
    /// Creates a stepper for `tm` on `word`.
    pub fn new(tm: &'a Tm, word: &str) -> Self {
        let initial = tm.initial_config(word);
        let valid_input = tm.is_input(word);

        let mut machine = Self {
            tm,
            config: initial.clone(),
            initial,
            visited: HashSet::new(),
            step_count: 0,
            outcome: None,
            valid_input,
        };
        machine.reset();
        machine
    }

    /// Executes a single step of the computation.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if the machine moved to a new, non-halting configuration.
    /// * `Step::Halt(outcome)` once the word is decided (or found undecidable).
    pub fn step(&mut self) -> Step {
        if let Some(outcome) = self.outcome {
            return Step::Halt(outcome);
        }

        if self.step_count >= self.tm.max_steps() {
            log::debug!(
                "Step budget of {} exhausted in state '{}'",
                self.tm.max_steps(),
                self.config.state
            );
            return self.halt(Outcome::Undecided);
        }

        let Some(next) = self.tm.next_config(&self.config) else {
            return self.halt(self.tm.halting_outcome(self.config.state).unwrap_or(Outcome::Reject));
        };

        self.config = next;
        self.step_count += 1;

        if let Some(outcome) = self.tm.halting_outcome(self.config.state) {
            return self.halt(outcome);
        }

        if !self.visited.insert(self.config.clone()) {
            log::debug!(
                "Configuration {} repeated after {} steps",
                self.config,
                self.step_count
            );
            return self.halt(Outcome::Undecided);
        }

        Step::Continue
    }

    fn halt(&mut self, outcome: Outcome) -> Step {
        self.outcome = Some(outcome);
        Step::Halt(outcome)
    }

    /// Runs until the word is decided or the step budget runs out.
    pub fn run(&mut self) -> Outcome {
        loop {
            if let Step::Halt(outcome) = self.step() {
                return outcome;
            }
        }
    }

    /// Resets the stepper to the initial configuration.
    pub fn reset(&mut self) {
        self.config = self.initial.clone();
        self.step_count = 0;
        self.visited.clear();
        self.visited.insert(self.initial.clone());
        self.outcome = if self.valid_input {
            self.tm.halting_outcome(self.initial.state)
        } else {
            Some(Outcome::Reject)
        };
    }

    /// The current configuration.
    pub fn config(&self) -> &TmConfig<'a> {
        &self.config
    }

    /// The current state.
    pub fn state(&self) -> &str {
        self.config.state
    }

    /// The tape as written so far.
    pub fn tape(&self) -> &[char] {
        &self.config.tape
    }

    /// Position of the head, counted from the left end of the tape.
    pub fn head(&self) -> usize {
        self.config.head
    }

    /// Steps taken since the last reset.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// The decision, once the machine has halted.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Entry = ((&'static str, &'static str), (&'static str, &'static str, &'static str));

    /// Decides { w#w | w ∈ {0,1}* }, crossing off matched letters with `x`.
    fn create_w_hash_w() -> Tm {
        let entries: Vec<Entry> = vec![
            (("q1", "#"), ("q8", "#", "R")),
            (("q1", "0"), ("q2", "x", "R")),
            (("q1", "1"), ("q3", "x", "R")),
            (("q1", "_"), ("qr", "_", "R")),
            (("q1", "x"), ("qr", "x", "R")),
            (("q2", "#"), ("q4", "#", "R")),
            (("q2", "0"), ("q2", "0", "R")),
            (("q2", "1"), ("q2", "1", "R")),
            (("q3", "#"), ("q5", "#", "R")),
            (("q3", "0"), ("q3", "0", "R")),
            (("q3", "1"), ("q3", "1", "R")),
            (("q4", "0"), ("q6", "x", "L")),
            (("q4", "x"), ("q4", "x", "R")),
            (("q5", "1"), ("q6", "x", "L")),
            (("q5", "x"), ("q5", "x", "R")),
            (("q6", "#"), ("q7", "#", "L")),
            (("q6", "0"), ("q6", "0", "L")),
            (("q6", "1"), ("q6", "1", "L")),
            (("q6", "x"), ("q6", "x", "L")),
            (("q7", "0"), ("q7", "0", "L")),
            (("q7", "1"), ("q7", "1", "L")),
            (("q7", "x"), ("q1", "x", "R")),
            (("q8", "_"), ("qa", "_", "R")),
            (("q8", "x"), ("q8", "x", "R")),
        ];
        Tm::with_options(entries, "q1", TmOptions::default().with_reserved(['x'])).unwrap()
    }

    /// Bounces between the first two cells forever.
    fn create_looping() -> Vec<Entry> {
        vec![
            (("q1", "a"), ("q2", "a", "R")),
            (("q2", "_"), ("q1", "_", "L")),
        ]
    }

    fn tape(cells: &str) -> Vec<char> {
        cells.chars().collect()
    }

    #[test]
    fn test_tm_creation() {
        let tm = create_w_hash_w();
        assert_eq!(tm.states().len(), 10);
        assert_eq!(tm.input_alphabet(), &BTreeSet::from(['#', '0', '1']));
        assert_eq!(tm.tape_alphabet(), &BTreeSet::from(['#', '0', '1', '_', 'x']));
        assert_eq!(tm.accept(), "qa");
        assert_eq!(tm.reject(), "qr");
        assert!(tm.warnings().is_empty());
        assert_eq!(
            tm.to_string(),
            "<8-state TM with input alphabet {#,0,1} and tape alphabet {#,0,1,_,x}>"
        );
    }

    #[test]
    fn test_tm_invalid_start() {
        let entries: Vec<Entry> = vec![(("q1", "a"), ("qa", "a", "R"))];
        assert_eq!(
            Tm::new(entries, "qx").unwrap_err(),
            AutomatonError::UnknownState {
                role: "Start",
                state: "qx".to_string()
            }
        );
    }

    #[test]
    fn test_tm_accepts() {
        let tm = create_w_hash_w();
        for word in ["#", "0#0", "1#1", "01#01", "101#101"] {
            assert_eq!(tm.accepts(word), Outcome::Accept, "{word}");
        }
        for word in ["", "0#", "1#", "0#1", "10#01"] {
            assert_eq!(tm.accepts(word), Outcome::Reject, "{word}");
        }
    }

    #[test]
    fn test_tm_rejects_foreign_and_blank_letters() {
        let tm = create_w_hash_w();
        assert_eq!(tm.accepts("0#x"), Outcome::Reject);
        assert_eq!(tm.accepts("0_0"), Outcome::Reject);
        assert_eq!(tm.accepts("2"), Outcome::Reject);
        assert_eq!(tm.compute("2").steps, 0);
    }

    #[test]
    fn test_tm_compute_final_tape() {
        let tm = create_w_hash_w();
        assert_eq!(tm.compute("#").tape, tape("#__"));
        assert_eq!(tm.compute("0#0").tape, tape("x#x__"));
        assert_eq!(tm.compute("101#101").tape, tape("xxx#xxx__"));
        assert_eq!(tm.compute("").tape, tape("__"));
        assert_eq!(tm.compute("0#").tape, tape("x#__"));
        assert_eq!(tm.compute("0#1").tape, tape("x#1_"));
        assert_eq!(tm.compute("10#01").tape, tape("x0#01"));
    }

    #[test]
    fn test_tm_language() {
        let tm = create_w_hash_w();
        let language = tm.language(8).unwrap();
        assert_eq!(language.len(), 15);
        assert_eq!(language[..3], ["#", "0#0", "1#1"]);
        assert!(language.contains(&"110#110".to_string()));
    }

    #[test]
    fn test_tm_loop_is_undecided() {
        let _ = env_logger::builder().is_test(true).try_init();
        let tm = Tm::new(create_looping(), "q1").unwrap();

        let computation = tm.compute("a");
        assert_eq!(computation.outcome, Outcome::Undecided);
        assert_eq!(computation.steps, 3);
        assert_eq!(tm.warnings().len(), 1);
        assert!(tm.language(3).unwrap().is_empty());
    }

    #[test]
    fn test_tm_strict_mode_rejects_warnings() {
        let result = Tm::with_options(
            create_looping(),
            "q1",
            TmOptions::default().with_mode(Mode::Strict),
        );
        assert!(matches!(result, Err(AutomatonError::ValidationError(_))));
    }

    #[test]
    fn test_tm_step_budget() {
        // Walks right forever over fresh blanks, so no configuration repeats.
        let entries: Vec<Entry> = vec![
            (("q1", "a"), ("q1", "a", "R")),
            (("q1", "_"), ("q1", "_", "R")),
            (("q1", "b"), ("qa", "b", "R")),
        ];
        let tm = Tm::with_options(entries, "q1", TmOptions::default().with_max_steps(50)).unwrap();

        let computation = tm.compute("a");
        assert_eq!(computation.outcome, Outcome::Undecided);
        assert_eq!(computation.steps, 50);
        assert_eq!(tm.accepts("ab"), Outcome::Accept);
    }

    #[test]
    fn test_move_head() {
        let mut cells = tape("ab");
        assert_eq!(Tm::move_head(0, &mut cells, Direction::Left), 0);
        assert_eq!(Tm::move_head(1, &mut cells, Direction::Left), 0);
        assert_eq!(Tm::move_head(0, &mut cells, Direction::Right), 1);
        assert_eq!(cells, tape("ab"));
        assert_eq!(Tm::move_head(1, &mut cells, Direction::Right), 2);
        assert_eq!(cells, tape("ab_"));
    }

    #[test]
    fn test_next_config() {
        let tm = create_w_hash_w();
        let config = tm.initial_config("0#0");
        let next = tm.next_config(&config).unwrap();
        assert_eq!(next.to_string(), "x(q2)#0");

        let halted = TmConfig::new("qa", tape("#"), 0);
        assert!(tm.next_config(&halted).is_none());
    }

    #[test]
    fn test_turing_machine_steps_and_reset() {
        let tm = create_w_hash_w();
        let mut machine = tm.machine("0#0");

        assert_eq!(machine.state(), "q1");
        assert_eq!(machine.step(), Step::Continue);
        assert_eq!(machine.state(), "q2");
        assert_eq!(machine.head(), 1);
        assert_eq!(machine.step_count(), 1);

        assert_eq!(machine.run(), Outcome::Accept);
        assert_eq!(machine.step(), Step::Halt(Outcome::Accept));

        machine.reset();
        assert_eq!(machine.state(), "q1");
        assert_eq!(machine.tape(), &['0', '#', '0']);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.outcome(), None);
    }

    #[test]
    fn test_trace() {
        let tm = create_w_hash_w();
        let configs: Vec<String> = tm.trace("#").iter().map(ToString::to_string).collect();
        assert_eq!(configs, vec!["(q1)#", "#(q8)_", "#_(qa)_"]);
    }

    #[test]
    fn test_computation_serialization() {
        let tm = create_w_hash_w();
        let json = serde_json::to_string(&tm.compute("#")).unwrap();
        assert_eq!(json, r##"{"outcome":"Accept","tape":["#","_","_"],"steps":2}"##);
    }
}
