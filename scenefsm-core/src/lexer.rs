//! Tokenizer for state machine programs.
//!
//! Source text is split into a flat token stream:
//!
//! - `#` starts a comment that runs to the end of the line
//! - space, tab, CR and LF separate tokens
//! - `(`, `)`, `,` and `;` are always tokens of their own, even when glued
//!   to a word (`State(menu);` is five tokens)
//!
//! There are no string literals and no escapes. Tokenizing never fails;
//! anything malformed surfaces later as a parse or validation error.

use serde::Serialize;
use std::fmt;

/// Characters that always form single-character tokens.
const PUNCTUATION: [char; 4] = ['(', ')', ',', ';'];

/// A single token with the 1-based line it started on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub line: u32,
}

impl Token {
    pub fn new(text: impl Into<String>, line: u32) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }

    /// Returns true if this token is exactly the given punctuation character.
    pub fn is_punct(&self, c: char) -> bool {
        let mut chars = self.text.chars();
        chars.next() == Some(c) && chars.next().is_none()
    }

    /// Returns true if this token is an identifier.
    pub fn is_identifier(&self) -> bool {
        is_identifier(&self.text)
    }

    /// Returns the numeric value of this token, if it is a number.
    pub fn as_number(&self) -> Option<f64> {
        parse_number(&self.text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returns true if `s` starts with a letter or underscore and continues with
/// letters, digits, or underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parses a floating-point literal.
pub fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok()
}

/// Removes `#` comments, keeping line breaks so line numbers survive.
pub fn strip_comments(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let mut in_comment = false;

    for c in source.chars() {
        if c == '#' {
            in_comment = true;
        } else if c == '\n' || c == '\r' {
            in_comment = false;
        }
        if !in_comment {
            result.push(c);
        }
    }

    result
}

/// Splits a program into tokens, stripping comments first.
pub fn tokenize(source: &str) -> Vec<Token> {
    let stripped = strip_comments(source);
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut word_line = 1;
    let mut line = 1;

    for c in stripped.chars() {
        if is_separator(c) || PUNCTUATION.contains(&c) {
            if !word.is_empty() {
                tokens.push(Token::new(std::mem::take(&mut word), word_line));
            }
            if PUNCTUATION.contains(&c) {
                tokens.push(Token::new(c, line));
            }
            if c == '\n' {
                line += 1;
            }
        } else {
            if word.is_empty() {
                word_line = line;
            }
            word.push(c);
        }
    }

    if !word.is_empty() {
        tokens.push(Token::new(word, word_line));
    }

    tokens
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
