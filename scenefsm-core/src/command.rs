//! Parsed program statements and the fixed command vocabulary.

use serde::Serialize;
use std::fmt;

/// Kind of value a command argument must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Any identifier (e.g. a resource name or a new state name).
    Identifier,
    /// A declared state.
    State,
    /// A declared event.
    Event,
    /// A finite, non-negative number of seconds.
    Time,
}

impl ArgKind {
    pub fn label(self) -> &'static str {
        match self {
            ArgKind::Identifier => "Identifier",
            ArgKind::State => "State",
            ArgKind::Event => "Event",
            ArgKind::Time => "Time",
        }
    }
}

/// Every keyword the language accepts, in vocabulary order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandKind {
    DefineStart,
    DefineError,
    State,
    LoadScene,
    LoadSceneAdditive,
    TimedTransition,
    Event,
    NamedTransition,
    BackTransition,
    LogStateEntry,
    LogStateExit,
    LogSceneLoaded,
    LogTimedTransitions,
    LogNamedTransitions,
    LogBackTransitions,
    LogAllTransitions,
    LogAll,
}

impl CommandKind {
    pub const ALL: [CommandKind; 17] = [
        CommandKind::DefineStart,
        CommandKind::DefineError,
        CommandKind::State,
        CommandKind::LoadScene,
        CommandKind::LoadSceneAdditive,
        CommandKind::TimedTransition,
        CommandKind::Event,
        CommandKind::NamedTransition,
        CommandKind::BackTransition,
        CommandKind::LogStateEntry,
        CommandKind::LogStateExit,
        CommandKind::LogSceneLoaded,
        CommandKind::LogTimedTransitions,
        CommandKind::LogNamedTransitions,
        CommandKind::LogBackTransitions,
        CommandKind::LogAllTransitions,
        CommandKind::LogAll,
    ];

    /// Looks up a keyword, ignoring case.
    pub fn from_keyword(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(name))
    }

    /// Position of this keyword in the vocabulary.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical spelling of the keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            CommandKind::DefineStart => "DefineStart",
            CommandKind::DefineError => "DefineError",
            CommandKind::State => "State",
            CommandKind::LoadScene => "LoadScene",
            CommandKind::LoadSceneAdditive => "LoadSceneAdditive",
            CommandKind::TimedTransition => "TimedTransition",
            CommandKind::Event => "Event",
            CommandKind::NamedTransition => "NamedTransition",
            CommandKind::BackTransition => "BackTransition",
            CommandKind::LogStateEntry => "LogStateEntry",
            CommandKind::LogStateExit => "LogStateExit",
            CommandKind::LogSceneLoaded => "LogSceneLoaded",
            CommandKind::LogTimedTransitions => "LogTimedTransitions",
            CommandKind::LogNamedTransitions => "LogNamedTransitions",
            CommandKind::LogBackTransitions => "LogBackTransitions",
            CommandKind::LogAllTransitions => "LogAllTransitions",
            CommandKind::LogAll => "LogAll",
        }
    }

    /// Argument kinds this command takes.
    pub fn signature(self) -> &'static [ArgKind] {
        use ArgKind::*;
        match self {
            CommandKind::State | CommandKind::Event => &[Identifier],
            CommandKind::DefineStart | CommandKind::DefineError => &[State],
            CommandKind::LoadScene | CommandKind::LoadSceneAdditive => &[State, Identifier],
            CommandKind::TimedTransition => &[State, State, Time],
            CommandKind::NamedTransition => &[State, State, Event],
            CommandKind::BackTransition => &[State, Event],
            CommandKind::LogStateEntry
            | CommandKind::LogStateExit
            | CommandKind::LogSceneLoaded
            | CommandKind::LogTimedTransitions
            | CommandKind::LogNamedTransitions
            | CommandKind::LogBackTransitions
            | CommandKind::LogAllTransitions
            | CommandKind::LogAll => &[],
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One parsed statement: a recognized keyword and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    /// Keyword as written in the source.
    pub name: String,
    pub args: Vec<String>,
    pub kind: CommandKind,
    /// Line of the keyword.
    pub line: u32,
}

impl Command {
    pub fn new(kind: CommandKind, args: Vec<String>) -> Self {
        Self {
            name: kind.keyword().to_string(),
            args,
            kind,
            line: 0,
        }
    }

    pub fn is(&self, kind: CommandKind) -> bool {
        self.kind == kind
    }

    /// Returns the statement with the keyword in canonical spelling.
    pub fn canonical(&self) -> String {
        format!("{}({});", self.kind.keyword(), self.args.join(", "))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({});", self.name, self.args.join(", "))
    }
}
