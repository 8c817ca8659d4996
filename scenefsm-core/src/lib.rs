//! # scenefsm-core
//!
//! State machine language and runtime for scenefsm.
//!
//! This crate provides:
//! - Tokenizing and parsing of state machine programs
//! - Binding parsed commands into an immutable [`StateGraph`]
//! - Compile-time diagnostics
//! - A tick-driven [`Interpreter`] with timed, named, and back transitions
//! - The [`ResourceActivator`] seam for loading state resources

pub mod activator;
pub mod binder;
pub mod command;
pub mod diagnostic;
pub mod error;
pub mod graph;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod program;

pub use activator::{ActivationHandle, Completed, ImmediateActivator, ResourceActivator};
pub use command::{ArgKind, Command, CommandKind};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::CoreError;
pub use graph::{Event, LogFlags, Name, State, StateGraph, TransitionRow};
pub use interpreter::{
    EventSender, Interpreter, Status, Submission, TickOutcome, TransitionRecord, Trigger,
};
pub use lexer::Token;
pub use program::Program;
