//! The compiled state graph.
//!
//! States and events are keyed by [`Name`], the lower-cased form of the
//! identifier, so `Menu` and `MENU` are the same entity everywhere. Each
//! entity also keeps the spelling of its first declaration for display.
//!
//! A graph is built once by the binder and never mutated afterwards.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Canonical identity of a state or event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(raw: &str) -> Self {
        Self(raw.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub name: String,
    #[serde(skip)]
    key: Name,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = Name::new(&name);
        Self { name, key }
    }

    pub fn key(&self) -> &Name {
        &self.key
    }
}

/// Transition fired automatically after a delay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedTransition {
    pub target: Name,
    pub seconds: f64,
}

impl TimedTransition {
    /// The delay as a `Duration`, saturating at `Duration::MAX`.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.seconds).unwrap_or(Duration::MAX)
    }
}

/// A node of the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub name: String,
    #[serde(skip)]
    key: Name,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub additive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed: Option<TimedTransition>,
    /// Event -> target state.
    pub named: BTreeMap<Name, Name>,
    /// Events that pop the history stack.
    pub back: BTreeSet<Name>,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = Name::new(&name);
        Self {
            name,
            key,
            resource: None,
            additive: false,
            timed: None,
            named: BTreeMap::new(),
            back: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> &Name {
        &self.key
    }

    /// Events this state accepts: named-transition keys plus back triggers.
    pub fn accepted_events(&self) -> impl Iterator<Item = &Name> {
        self.named.keys().chain(self.back.iter())
    }

    /// Returns true if leaving this state by a back transition should unload
    /// its resource.
    pub fn unloads_on_back(&self) -> bool {
        self.additive && self.resource.is_some()
    }
}

/// Logging switches set by `Log*` directives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogFlags {
    pub state_entry: bool,
    pub state_exit: bool,
    pub scene_loaded: bool,
    pub timed_transitions: bool,
    pub named_transitions: bool,
    pub back_transitions: bool,
}

/// One logging switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFlag {
    StateEntry,
    StateExit,
    SceneLoaded,
    TimedTransitions,
    NamedTransitions,
    BackTransitions,
}

impl LogFlag {
    /// Directive that sets this flag on its own.
    pub fn directive(self) -> &'static str {
        match self {
            LogFlag::StateEntry => "LogStateEntry",
            LogFlag::StateExit => "LogStateExit",
            LogFlag::SceneLoaded => "LogSceneLoaded",
            LogFlag::TimedTransitions => "LogTimedTransitions",
            LogFlag::NamedTransitions => "LogNamedTransitions",
            LogFlag::BackTransitions => "LogBackTransitions",
        }
    }
}

impl LogFlags {
    /// Every flag set.
    pub fn all() -> Self {
        Self {
            state_entry: true,
            state_exit: true,
            scene_loaded: true,
            timed_transitions: true,
            named_transitions: true,
            back_transitions: true,
        }
    }

    pub fn get(&self, flag: LogFlag) -> bool {
        match flag {
            LogFlag::StateEntry => self.state_entry,
            LogFlag::StateExit => self.state_exit,
            LogFlag::SceneLoaded => self.scene_loaded,
            LogFlag::TimedTransitions => self.timed_transitions,
            LogFlag::NamedTransitions => self.named_transitions,
            LogFlag::BackTransitions => self.back_transitions,
        }
    }

    /// Sets a flag, returning whether it was already set.
    pub fn set(&mut self, flag: LogFlag) -> bool {
        let slot = match flag {
            LogFlag::StateEntry => &mut self.state_entry,
            LogFlag::StateExit => &mut self.state_exit,
            LogFlag::SceneLoaded => &mut self.scene_loaded,
            LogFlag::TimedTransitions => &mut self.timed_transitions,
            LogFlag::NamedTransitions => &mut self.named_transitions,
            LogFlag::BackTransitions => &mut self.back_transitions,
        };
        std::mem::replace(slot, true)
    }
}

/// How a transition row is triggered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowTrigger {
    Timed { seconds: f64 },
    Named { event: String },
    Back { event: String },
}

/// A flattened transition, for display and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRow {
    pub from: String,
    /// `None` for back transitions, whose target is decided at run time.
    pub to: Option<String>,
    pub trigger: RowTrigger,
}

impl fmt::Display for TransitionRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to = self.to.as_deref().unwrap_or("<go back>");
        match &self.trigger {
            RowTrigger::Timed { seconds } => {
                write!(f, "{} -> {} [after {}s]", self.from, to, seconds)
            }
            RowTrigger::Named { event } => write!(f, "{} -> {} [{}]", self.from, to, event),
            RowTrigger::Back { event } => write!(f, "{} -> {} [{}]", self.from, to, event),
        }
    }
}

/// Immutable, cross-referenced state machine.
#[derive(Debug, Clone, Serialize)]
pub struct StateGraph {
    pub(crate) states: BTreeMap<Name, State>,
    pub(crate) state_order: Vec<Name>,
    pub(crate) events: BTreeMap<Name, Event>,
    pub(crate) event_order: Vec<Name>,
    pub(crate) start: Option<Name>,
    pub(crate) error: Option<Name>,
    pub(crate) log_flags: LogFlags,
    pub(crate) checksum: String,
    /// Diagnostics recorded while compiling the source.
    pub(crate) errors: usize,
}

impl StateGraph {
    /// Looks up a state by any spelling of its name.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(&Name::new(name))
    }

    pub fn state_by_key(&self, key: &Name) -> Option<&State> {
        self.states.get(key)
    }

    /// Looks up an event by any spelling of its name.
    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(&Name::new(name))
    }

    pub fn event_by_key(&self, key: &Name) -> Option<&Event> {
        self.events.get(key)
    }

    /// States in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.state_order.iter().filter_map(|k| self.states.get(k))
    }

    /// Events in declaration order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.event_order.iter().filter_map(|k| self.events.get(k))
    }

    pub fn start_state(&self) -> Option<&State> {
        self.start.as_ref().and_then(|k| self.states.get(k))
    }

    pub fn error_state(&self) -> Option<&State> {
        self.error.as_ref().and_then(|k| self.states.get(k))
    }

    pub fn log_flags(&self) -> LogFlags {
        self.log_flags
    }

    /// CRC32C of the canonical program listing.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Returns true if the graph was bound from a program without errors.
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }

    /// Number of diagnostics recorded while compiling the source.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Display name of a state key, falling back to the key itself.
    pub fn state_display<'a>(&'a self, key: &'a Name) -> &'a str {
        self.states
            .get(key)
            .map(|s| s.name.as_str())
            .unwrap_or(key.as_str())
    }

    /// Display name of an event key, falling back to the key itself.
    pub fn event_display<'a>(&'a self, key: &'a Name) -> &'a str {
        self.events
            .get(key)
            .map(|e| e.name.as_str())
            .unwrap_or(key.as_str())
    }

    /// Transitions leaving `state`, timed first, then named, then back.
    pub fn transitions_from(&self, state: &State) -> Vec<TransitionRow> {
        let mut rows = Vec::new();

        if let Some(timed) = &state.timed {
            rows.push(TransitionRow {
                from: state.name.clone(),
                to: Some(self.state_display(&timed.target).to_string()),
                trigger: RowTrigger::Timed {
                    seconds: timed.seconds,
                },
            });
        }
        for (event, target) in &state.named {
            rows.push(TransitionRow {
                from: state.name.clone(),
                to: Some(self.state_display(target).to_string()),
                trigger: RowTrigger::Named {
                    event: self.event_display(event).to_string(),
                },
            });
        }
        for event in &state.back {
            rows.push(TransitionRow {
                from: state.name.clone(),
                to: None,
                trigger: RowTrigger::Back {
                    event: self.event_display(event).to_string(),
                },
            });
        }

        rows
    }

    /// Full transition table in state declaration order.
    pub fn transition_table(&self) -> Vec<TransitionRow> {
        self.states()
            .flat_map(|state| self.transitions_from(state))
            .collect()
    }
}

impl fmt::Display for StateGraph {
    /// One line per state: `name[resource]: target[trigger] ...`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in self.states() {
            if self.start.as_ref() == Some(state.key()) {
                write!(f, "<start> ")?;
            }
            if self.error.as_ref() == Some(state.key()) {
                write!(f, "<error> ")?;
            }
            write!(f, "{}", state.name)?;
            if let Some(resource) = &state.resource {
                let mode = if state.additive { "+" } else { "" };
                write!(f, "[{}{}]", mode, resource)?;
            }
            write!(f, ":")?;
            if let Some(timed) = &state.timed {
                write!(f, " {}[{}]", self.state_display(&timed.target), timed.seconds)?;
            }
            for (event, target) in &state.named {
                write!(
                    f,
                    " {}[{}]",
                    self.state_display(target),
                    self.event_display(event)
                )?;
            }
            for event in &state.back {
                write!(f, " <go back>[{}]", self.event_display(event))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalized() {
        assert_eq!(Name::new("MainMenu"), Name::from("mainmenu"));
        assert_eq!(Name::new("MainMenu").as_str(), "mainmenu");
    }

    #[test]
    fn test_state_keeps_display_name() {
        let state = State::new("MainMenu");
        assert_eq!(state.name, "MainMenu");
        assert_eq!(state.key().as_str(), "mainmenu");
        assert!(!state.unloads_on_back());
    }

    #[test]
    fn test_accepted_events() {
        let mut state = State::new("a");
        state.named.insert(Name::new("go"), Name::new("b"));
        state.back.insert(Name::new("back"));
        let accepted: Vec<&str> = state.accepted_events().map(|n| n.as_str()).collect();
        assert_eq!(accepted, vec!["go", "back"]);
    }

    #[test]
    fn test_log_flags_set_reports_previous() {
        let mut flags = LogFlags::default();
        assert!(!flags.set(LogFlag::StateEntry));
        assert!(flags.set(LogFlag::StateEntry));
        assert!(flags.get(LogFlag::StateEntry));
        assert!(!flags.get(LogFlag::StateExit));
        assert!(LogFlags::all().get(LogFlag::BackTransitions));
    }

    #[test]
    fn test_timed_delay() {
        let timed = TimedTransition {
            target: Name::new("b"),
            seconds: 0.25,
        };
        assert_eq!(timed.delay(), Duration::from_millis(250));

        let timed = TimedTransition {
            target: Name::new("b"),
            seconds: 1e20,
        };
        assert_eq!(timed.delay(), Duration::MAX);
    }
}
