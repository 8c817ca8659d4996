//! Compilation pipeline: source text to [`StateGraph`].

use crate::binder::bind;
use crate::command::Command;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::CoreError;
use crate::graph::StateGraph;
use crate::lexer::tokenize;
use crate::parser::parse;
use std::path::Path;

/// A compiled program: its commands, diagnostics, and bound graph.
///
/// Compilation never fails outright. A program with any diagnostic is
/// invalid, and its graph is kept for inspection only.
#[derive(Debug, Clone)]
pub struct Program {
    commands: Vec<Command>,
    diagnostics: Vec<Diagnostic>,
    graph: StateGraph,
}

impl Program {
    /// Tokenizes, parses, and binds `source`.
    pub fn compile(source: &str) -> Self {
        let tokens = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let commands = parse(&tokens, &mut diagnostics);
        let graph = bind(&commands, &mut diagnostics);

        if graph.is_valid() {
            tracing::debug!(
                "compiled {} commands into {} states, {} events (checksum {})",
                commands.len(),
                graph.states.len(),
                graph.events.len(),
                graph.checksum
            );
        } else {
            tracing::warn!("program has {} error(s)", diagnostics.len());
        }

        Self {
            commands,
            diagnostics: diagnostics.into_vec(),
            graph,
        }
    }

    /// Reads and compiles a program file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::compile(&source))
    }

    pub fn is_valid(&self) -> bool {
        self.graph.is_valid()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    /// Normalized listing, one canonical command per line.
    pub fn listing(&self) -> String {
        self.commands
            .iter()
            .map(Command::canonical)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Consumes the program, returning its graph if it compiled cleanly.
    pub fn into_graph(self) -> Result<StateGraph, CoreError> {
        if !self.graph.is_valid() {
            return Err(CoreError::InvalidProgram {
                errors: self.graph.error_count(),
            });
        }
        Ok(self.graph)
    }
}
