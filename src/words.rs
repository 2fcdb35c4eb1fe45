//! Enumeration of words over an alphabet in increasing length, then lexicographic order,
//! and the `Recognizer` trait that turns any membership test into a bounded language.

use crate::types::{AutomatonError, DEFAULT_LANGUAGE_LENGTH, MAX_EAGER_WORDS};
use std::collections::BTreeSet;

/// A lazy, len-lex ordered sequence of words over a sorted alphabet.
///
/// Words are produced by an odometer over letter indices: the last position turns
/// fastest, so words of equal length come out in alphabet order.
#[derive(Debug, Clone)]
pub struct Words {
    alphabet: Vec<char>,
    digits: Vec<usize>,
    max_len: Option<usize>,
    exact: bool,
    done: bool,
}

impl Words {
    fn new(alphabet: &BTreeSet<char>, start_len: usize, max_len: Option<usize>, exact: bool) -> Self {
        Self {
            alphabet: alphabet.iter().copied().collect(),
            digits: vec![0; start_len],
            max_len,
            exact,
            done: false,
        }
    }

    fn current(&self) -> String {
        self.digits.iter().map(|&d| self.alphabet[d]).collect()
    }

    /// Advances the odometer, growing the word length when every position wraps.
    fn advance(&mut self) {
        for digit in self.digits.iter_mut().rev() {
            *digit += 1;
            if *digit < self.alphabet.len() {
                return;
            }
            *digit = 0;
        }

        if self.exact {
            self.done = true;
            return;
        }

        let next_len = self.digits.len() + 1;
        if self.max_len.is_some_and(|max| next_len > max) {
            self.done = true;
        } else {
            self.digits = vec![0; next_len];
        }
    }
}

impl Iterator for Words {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // Only the empty word exists over an empty alphabet.
        if self.alphabet.is_empty() {
            self.done = true;
            return self.digits.is_empty().then(String::new);
        }

        let word = self.current();
        self.advance();
        Some(word)
    }
}

/// All words of length exactly `n`.
pub fn words_of_length(n: usize, alphabet: &BTreeSet<char>) -> Words {
    Words::new(alphabet, n, Some(n), true)
}

/// All words of length at most `n`.
pub fn words_to_length(n: usize, alphabet: &BTreeSet<char>) -> Words {
    Words::new(alphabet, 0, Some(n), false)
}

/// Every word over the alphabet, without a length bound.
pub fn all_words(alphabet: &BTreeSet<char>) -> Words {
    Words::new(alphabet, 0, None, false)
}

/// Number of words of length exactly `n`, saturating at `u128::MAX`.
pub fn count_words_of_length(n: usize, alphabet_len: usize) -> u128 {
    let exponent = u32::try_from(n).unwrap_or(u32::MAX);
    (alphabet_len as u128).saturating_pow(exponent)
}

/// Number of words of length at most `n`, saturating at `u128::MAX`.
pub fn count_words_to_length(n: usize, alphabet_len: usize) -> u128 {
    match alphabet_len {
        0 => 1,
        1 => (n as u128).saturating_add(1),
        _ => {
            // With two or more letters the sum saturates within 128 lengths.
            let mut total: u128 = 0;
            for i in 0..=n {
                total = total.saturating_add(count_words_of_length(i, alphabet_len));
                if total == u128::MAX {
                    break;
                }
            }
            total
        }
    }
}

/// Collects all words of length at most `n`, refusing sizes above `MAX_EAGER_WORDS`.
pub fn collect_words_to_length(
    n: usize,
    alphabet: &BTreeSet<char>,
) -> Result<Vec<String>, AutomatonError> {
    check_eager_size(count_words_to_length(n, alphabet.len()))?;
    Ok(words_to_length(n, alphabet).collect())
}

fn check_eager_size(words: u128) -> Result<(), AutomatonError> {
    if words >= MAX_EAGER_WORDS {
        return Err(AutomatonError::LanguageTooLarge {
            words,
            limit: MAX_EAGER_WORDS,
        });
    }
    Ok(())
}

/// A membership test over a fixed input alphabet.
///
/// Implemented by every automaton model; the provided methods enumerate the
/// recognised language up to a word length.
pub trait Recognizer {
    /// The letters input words may be built from.
    fn input_alphabet(&self) -> &BTreeSet<char>;

    /// Whether the word belongs to the language.
    fn recognizes(&self, word: &str) -> bool;

    /// Accepted words of length at most `n`, in len-lex order.
    ///
    /// Fails without enumerating anything when the candidate set exceeds
    /// `MAX_EAGER_WORDS`.
    fn language(&self, n: usize) -> Result<Vec<String>, AutomatonError>
    where
        Self: Sized,
    {
        check_eager_size(count_words_to_length(n, self.input_alphabet().len()))?;
        Ok(self.language_lazy(n).collect())
    }

    /// Accepted words of length at most `DEFAULT_LANGUAGE_LENGTH`.
    fn language_default(&self) -> Result<Vec<String>, AutomatonError>
    where
        Self: Sized,
    {
        self.language(DEFAULT_LANGUAGE_LENGTH)
    }

    /// Accepted words of length at most `n`, produced on demand.
    fn language_lazy(&self, n: usize) -> LanguageIter<'_, Self>
    where
        Self: Sized,
    {
        LanguageIter {
            recognizer: self,
            words: words_to_length(n, self.input_alphabet()),
        }
    }

    /// Every accepted word, produced on demand with no length bound.
    fn language_unbounded(&self) -> LanguageIter<'_, Self>
    where
        Self: Sized,
    {
        LanguageIter {
            recognizer: self,
            words: all_words(self.input_alphabet()),
        }
    }
}

/// Iterator returned by [`Recognizer::language_lazy`].
pub struct LanguageIter<'a, R> {
    recognizer: &'a R,
    words: Words,
}

impl<R: Recognizer> Iterator for LanguageIter<'_, R> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.words
            .by_ref()
            .find(|word| self.recognizer.recognizes(word))
    }
}
