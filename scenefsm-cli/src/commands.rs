//! Command execution.

use crate::Commands;
use colored::Colorize;
use scenefsm_core::lexer::tokenize;
use scenefsm_core::{LogFlags, Program, State, StateGraph, TransitionRow};
use serde::Serialize;
use std::path::Path;

/// Text to print and whether the command succeeded.
pub struct Output {
    pub text: String,
    pub success: bool,
}

impl Output {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Executes a one-shot command and returns the formatted output.
pub fn execute(cmd: Commands) -> Result<Output, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl { .. } => unreachable!(),

        Commands::Check { file } => {
            let program = Program::from_file(&file)?;
            Ok(Output {
                text: format_check(&file, &program),
                success: program.is_valid(),
            })
        }

        Commands::Tokens { file } => {
            let source = std::fs::read_to_string(&file)?;
            Ok(Output::ok(format_tokens(&source)))
        }

        Commands::Commands { file } => {
            let program = Program::from_file(&file)?;
            Ok(Output::ok(format_commands(&program)))
        }

        Commands::Graph { file, json } => {
            let program = Program::from_file(&file)?;
            let text = if json {
                serde_json::to_string_pretty(&GraphView::new(program.graph()))?
            } else {
                format_graph(program.graph())
            };
            Ok(Output {
                text,
                success: program.is_valid(),
            })
        }
    }
}

/// Summary line plus one line per diagnostic.
pub fn format_check(file: &Path, program: &Program) -> String {
    let graph = program.graph();
    if program.is_valid() {
        return format!(
            "{} {} ({} states, {} events, checksum {})",
            "OK".green(),
            file.display().to_string().cyan(),
            graph.states().count(),
            graph.events().count(),
            graph.checksum()
        );
    }

    let mut output = format!(
        "{} {}: {} error(s)\n",
        "INVALID".red(),
        file.display().to_string().cyan(),
        program.diagnostics().len()
    );
    for diagnostic in program.diagnostics() {
        output.push_str(&format!("  {}\n", diagnostic));
    }
    output.trim_end().to_string()
}

pub fn format_tokens(source: &str) -> String {
    tokenize(source)
        .iter()
        .map(|token| format!("{:>4}  {}", token.line, token.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_commands(program: &Program) -> String {
    let mut output = String::new();
    for command in program.commands() {
        output.push_str(&format!(
            "{:>4}  {}\n",
            command.line,
            command.canonical().cyan()
        ));
    }
    for diagnostic in program.diagnostics() {
        output.push_str(&format!("{}\n", diagnostic.to_string().red()));
    }
    output.trim_end().to_string()
}

pub fn format_graph(graph: &StateGraph) -> String {
    let mut output = graph.to_string();

    let table = graph.transition_table();
    if !table.is_empty() {
        output.push_str(&format!("\n{}\n", "Transitions:".bold()));
        for row in &table {
            output.push_str(&format!("  {}\n", row));
        }
    }

    output.trim_end().to_string()
}

/// JSON projection of a graph.
#[derive(Serialize)]
struct GraphView<'a> {
    valid: bool,
    checksum: &'a str,
    start: Option<&'a str>,
    error: Option<&'a str>,
    states: Vec<&'a State>,
    events: Vec<&'a str>,
    transitions: Vec<TransitionRow>,
    log_flags: LogFlags,
}

impl<'a> GraphView<'a> {
    fn new(graph: &'a StateGraph) -> Self {
        Self {
            valid: graph.is_valid(),
            checksum: graph.checksum(),
            start: graph.start_state().map(|s| s.name.as_str()),
            error: graph.error_state().map(|s| s.name.as_str()),
            states: graph.states().collect(),
            events: graph.events().map(|e| e.name.as_str()).collect(),
            transitions: graph.transition_table(),
            log_flags: graph.log_flags(),
        }
    }
}
