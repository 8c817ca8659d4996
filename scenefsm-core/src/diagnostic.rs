//! Compile-time diagnostics.
//!
//! Every fault found by the parser or binder is recorded here and logged
//! through `tracing`. Nothing stops a pass; the caller decides what to do
//! with the collected list once compilation finishes.

use crate::command::Command;
use crate::lexer::Token;
use serde::Serialize;
use std::fmt;

/// Tokens shown on each side of a syntax error.
const CONTEXT_TOKENS: usize = 3;

/// Category of a compile-time fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Token stream does not match the grammar.
    Syntax,
    /// Keyword outside the command vocabulary.
    UnrecognizedCommand,
    /// Wrong argument count or type, or an unresolved reference.
    Validation,
    /// A declaration or attachment that must be unique appeared again.
    Duplication,
}

impl DiagnosticKind {
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "syntax error",
            DiagnosticKind::UnrecognizedCommand => "unrecognized command",
            DiagnosticKind::Validation => "validation error",
            DiagnosticKind::Duplication => "duplication error",
        }
    }
}

/// A single compile-time fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}: {}", line, self.kind.label(), self.message),
            None => write!(f, "{}: {}", self.kind.label(), self.message),
        }
    }
}

/// Accumulates diagnostics across the parse and bind passes.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn push(&mut self, kind: DiagnosticKind, line: Option<u32>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
            line,
        };
        tracing::error!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    /// Records a syntax error at `index`, naming the expected token.
    pub fn syntax(&mut self, tokens: &[Token], index: usize, expected: &str) {
        self.push(
            DiagnosticKind::Syntax,
            line_at(tokens, index),
            format!("at: {}; expected: {}", context(tokens, index), expected),
        );
    }

    /// Records an unrecognized keyword at `index`.
    pub fn unrecognized(&mut self, tokens: &[Token], index: usize, name: &str) {
        self.push(
            DiagnosticKind::UnrecognizedCommand,
            line_at(tokens, index),
            format!("at: {}; not a command: {}", context(tokens, index), name),
        );
    }

    /// Records a validation error against a command.
    pub fn validation(&mut self, command: &Command, message: impl fmt::Display) {
        self.push(
            DiagnosticKind::Validation,
            Some(command.line),
            format!("at: {} {}", command, message),
        );
    }

    /// Records a duplicate declaration or attachment.
    pub fn duplication(&mut self, command: &Command, message: impl fmt::Display) {
        self.push(
            DiagnosticKind::Duplication,
            Some(command.line),
            format!("{}; last call: {}", message, command),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

fn line_at(tokens: &[Token], index: usize) -> Option<u32> {
    tokens
        .get(index)
        .or_else(|| tokens.last())
        .map(|token| token.line)
}

/// Renders the tokens around `index`, bracketing the offending one.
fn context(tokens: &[Token], index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_TOKENS);
    let end = (index + CONTEXT_TOKENS + 1).min(tokens.len());
    let mut parts: Vec<String> = Vec::new();

    for (i, token) in tokens.iter().enumerate().take(end).skip(start) {
        if i == index {
            parts.push(format!("[{}]", token.text));
        } else {
            parts.push(token.text.clone());
        }
    }
    if index >= tokens.len() {
        parts.push("[<end of input>]".to_string());
    }

    parts.join(" ")
}
