//! This module provides the regular-expression front end, utilizing the `pest` crate.
//! It defines the grammar for regexes in `regex.pest`, validates input against it, extracts
//! alphabets, and rewrites implicit concatenation into the explicit `.` operator consumed
//! by the GNFA compiler.

use crate::types::RegexError;
use pest::{error::InputLocation, Parser as PestParser};
use pest_derive::Parser as PestParser;
use std::collections::BTreeSet;

/// Derives a `PestParser` for the regex grammar defined in `regex.pest`.
#[derive(PestParser)]
#[grammar = "regex.pest"]
pub struct RegexParser;

/// Characters that can never be letters: brackets, operators and space.
pub const OPERATORS: [char; 6] = ['(', ')', '+', '*', '.', ' '];

pub fn is_operator(c: char) -> bool {
    OPERATORS.contains(&c)
}

/// The letters of a regex: every character that is not an operator.
pub fn alphabet_of(regex: &str) -> BTreeSet<char> {
    regex.chars().filter(|&c| !is_operator(c)).collect()
}

/// Checks the regex against the grammar.
///
/// The empty string is the regex of the empty word and is always valid.
///
/// # Errors
///
/// * `RegexError::Syntax` naming the byte position where parsing failed.
pub fn validate(regex: &str) -> Result<(), RegexError> {
    if regex.is_empty() {
        return Ok(());
    }

    RegexParser::parse(Rule::regex, regex).map_err(|e| {
        let position = match e.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        RegexError::Syntax {
            position,
            source: Box::new(e),
        }
    })?;

    Ok(())
}

pub fn is_valid(regex: &str) -> bool {
    validate(regex).is_ok()
}

/// Inserts `.` wherever juxtaposition means concatenation, after removing spaces.
///
/// A `.` goes between a letter, `)` or `*` and a following letter or `(`; for example
/// `a*(b+c)d` becomes `a*.(b+c).d`.
pub fn add_concat(regex: &str) -> String {
    let chars: Vec<char> = regex.chars().filter(|&c| c != ' ').collect();
    let mut result = String::with_capacity(chars.len() * 2);

    for (i, &c) in chars.iter().enumerate() {
        result.push(c);
        if let Some(&next) = chars.get(i + 1) {
            let ends_operand = !is_operator(c) || c == ')' || c == '*';
            let starts_operand = !is_operator(next) || next == '(';
            if ends_operand && starts_operand {
                result.push('.');
            }
        }
    }

    result
}
