//! Semantic validation and binding.
//!
//! The binder walks the parsed commands in a fixed order of passes, each
//! relying on the tables filled by the ones before it:
//!
//! 1. `State` declarations
//! 2. `Event` declarations
//! 3. `DefineStart` / `DefineError`
//! 4. `LoadScene` / `LoadSceneAdditive`
//! 5. `TimedTransition`
//! 6. `NamedTransition`
//! 7. `BackTransition`
//! 8. `Log*` directives
//!
//! A directive whose arguments do not fit its signature is reported and
//! ignored. Duplicate declarations keep the first occurrence; duplicate
//! attachments are reported and the later one overwrites the earlier.

use crate::command::{ArgKind, Command, CommandKind};
use crate::diagnostic::Diagnostics;
use crate::graph::{Event, LogFlag, LogFlags, Name, State, StateGraph, TimedTransition};
use crate::lexer::{is_identifier, parse_number};
use std::collections::BTreeMap;
use std::time::Duration;

/// Builds a graph from parsed commands, recording faults in `diagnostics`.
///
/// `diagnostics` should already hold the parse faults; the graph counts
/// everything in it when deciding whether it is valid.
pub fn bind(commands: &[Command], diagnostics: &mut Diagnostics) -> StateGraph {
    let mut binder = Binder::new(commands, diagnostics);
    binder.collect_states();
    binder.collect_events();
    binder.resolve_endpoints();
    binder.attach_resources();
    binder.attach_timed_transitions();
    binder.attach_named_transitions();
    binder.attach_back_transitions();
    binder.collect_log_flags();
    binder.finish()
}

fn of_kind(commands: &[Command], kind: CommandKind) -> impl Iterator<Item = &Command> {
    commands.iter().filter(move |c| c.kind == kind)
}

struct Binder<'a> {
    commands: &'a [Command],
    diagnostics: &'a mut Diagnostics,
    states: BTreeMap<Name, State>,
    state_order: Vec<Name>,
    events: BTreeMap<Name, Event>,
    event_order: Vec<Name>,
    start: Option<Name>,
    error: Option<Name>,
    log_flags: LogFlags,
}

impl<'a> Binder<'a> {
    fn new(commands: &'a [Command], diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            commands,
            diagnostics,
            states: BTreeMap::new(),
            state_order: Vec::new(),
            events: BTreeMap::new(),
            event_order: Vec::new(),
            start: None,
            error: None,
            log_flags: LogFlags::default(),
        }
    }

    fn collect_states(&mut self) {
        for command in of_kind(self.commands, CommandKind::State) {
            if !self.check_signature(command) {
                continue;
            }
            let state = State::new(command.args[0].as_str());
            if self.states.contains_key(state.key()) {
                self.diagnostics.duplication(
                    command,
                    format!("State {} defined more than once", state.name),
                );
                continue;
            }
            self.state_order.push(state.key().clone());
            self.states.insert(state.key().clone(), state);
        }
    }

    fn collect_events(&mut self) {
        for command in of_kind(self.commands, CommandKind::Event) {
            if !self.check_signature(command) {
                continue;
            }
            let event = Event::new(command.args[0].as_str());
            if self.events.contains_key(event.key()) {
                self.diagnostics.duplication(
                    command,
                    format!("Event {} defined more than once", event.name),
                );
                continue;
            }
            self.event_order.push(event.key().clone());
            self.events.insert(event.key().clone(), event);
        }
    }

    fn resolve_endpoints(&mut self) {
        for kind in [CommandKind::DefineStart, CommandKind::DefineError] {
            for command in of_kind(self.commands, kind) {
                if !self.check_signature(command) {
                    continue;
                }
                let slot = match kind {
                    CommandKind::DefineStart => &mut self.start,
                    _ => &mut self.error,
                };
                if slot.is_some() {
                    self.diagnostics
                        .duplication(command, format!("{} command called more than once", kind));
                }
                *slot = Some(Name::new(&command.args[0]));
            }
        }
    }

    fn attach_resources(&mut self) {
        let commands = self.commands.iter().filter(|c| {
            matches!(
                c.kind,
                CommandKind::LoadScene | CommandKind::LoadSceneAdditive
            )
        });
        for command in commands {
            if !self.check_signature(command) {
                continue;
            }
            let Some(state) = self.states.get_mut(&Name::new(&command.args[0])) else {
                continue;
            };
            if state.resource.is_some() {
                self.diagnostics.duplication(
                    command,
                    "LoadScene or LoadSceneAdditive command called more than once on the same state",
                );
            }
            state.resource = Some(command.args[1].clone());
            state.additive = command.is(CommandKind::LoadSceneAdditive);
        }
    }

    fn attach_timed_transitions(&mut self) {
        for command in of_kind(self.commands, CommandKind::TimedTransition) {
            if !self.check_signature(command) {
                continue;
            }
            let Some(seconds) = parse_number(&command.args[2]) else {
                continue;
            };
            let Some(state) = self.states.get_mut(&Name::new(&command.args[0])) else {
                continue;
            };
            if state.timed.is_some() {
                self.diagnostics.duplication(
                    command,
                    "TimedTransition command called more than once on the same state",
                );
            }
            state.timed = Some(TimedTransition {
                target: Name::new(&command.args[1]),
                seconds,
            });
        }
    }

    fn attach_named_transitions(&mut self) {
        for command in of_kind(self.commands, CommandKind::NamedTransition) {
            if !self.check_signature(command) {
                continue;
            }
            let Some(state) = self.states.get_mut(&Name::new(&command.args[0])) else {
                continue;
            };
            let event = Name::new(&command.args[2]);
            let target = Name::new(&command.args[1]);
            if state.named.insert(event, target).is_some() {
                self.diagnostics.duplication(
                    command,
                    "NamedTransition command called more than once for the same event on the same state",
                );
            }
        }
    }

    fn attach_back_transitions(&mut self) {
        for command in of_kind(self.commands, CommandKind::BackTransition) {
            if !self.check_signature(command) {
                continue;
            }
            let Some(state) = self.states.get_mut(&Name::new(&command.args[0])) else {
                continue;
            };
            if !state.back.insert(Name::new(&command.args[1])) {
                self.diagnostics.duplication(
                    command,
                    "BackTransition command called more than once for the same event on the same state",
                );
            }
        }
    }

    fn collect_log_flags(&mut self) {
        use LogFlag::*;

        for command in self.commands {
            let flags: &[LogFlag] = match command.kind {
                CommandKind::LogStateEntry => &[StateEntry],
                CommandKind::LogStateExit => &[StateExit],
                CommandKind::LogSceneLoaded => &[SceneLoaded],
                CommandKind::LogTimedTransitions => &[TimedTransitions],
                CommandKind::LogNamedTransitions => &[NamedTransitions],
                CommandKind::LogBackTransitions => &[BackTransitions],
                CommandKind::LogAllTransitions => {
                    &[TimedTransitions, NamedTransitions, BackTransitions]
                }
                CommandKind::LogAll => &[
                    StateEntry,
                    StateExit,
                    SceneLoaded,
                    TimedTransitions,
                    NamedTransitions,
                    BackTransitions,
                ],
                _ => continue,
            };
            if !self.check_signature(command) {
                continue;
            }
            for flag in flags {
                if self.log_flags.set(*flag) {
                    self.diagnostics.duplication(
                        command,
                        format!("{} command called more than once", flag.directive()),
                    );
                }
            }
        }
    }

    /// Checks argument count and kinds, reporting a validation error on
    /// mismatch.
    fn check_signature(&mut self, command: &Command) -> bool {
        let signature = command.kind.signature();
        let expected = signature
            .iter()
            .map(|kind| format!("<{}>", kind.label()))
            .collect::<Vec<_>>()
            .join(", ");
        let usage = format!(
            "{} command takes {} argument(s) of type(s): {}",
            command.kind,
            signature.len(),
            expected
        );

        if command.args.len() != signature.len() {
            self.diagnostics.validation(command, usage);
            return false;
        }

        for (kind, arg) in signature.iter().zip(&command.args) {
            if let Err(reason) = self.check_arg(*kind, arg) {
                self.diagnostics
                    .validation(command, format!("{}; {}", usage, reason));
                return false;
            }
        }

        true
    }

    fn check_arg(&self, kind: ArgKind, arg: &str) -> Result<(), String> {
        match kind {
            ArgKind::Identifier if !is_identifier(arg) => {
                Err(format!("'{}' is not an identifier", arg))
            }
            ArgKind::State if !is_identifier(arg) || !self.states.contains_key(&Name::new(arg)) => {
                Err(format!("'{}' is not a declared state", arg))
            }
            ArgKind::Event if !is_identifier(arg) || !self.events.contains_key(&Name::new(arg)) => {
                Err(format!("'{}' is not a declared event", arg))
            }
            ArgKind::Time
                if !parse_number(arg).is_some_and(|secs| secs.is_finite() && secs >= 0.0) =>
            {
                Err(format!("'{}' is not a non-negative number of seconds", arg))
            }
            ArgKind::Time
                if !parse_number(arg)
                    .is_some_and(|secs| Duration::try_from_secs_f64(secs).is_ok()) =>
            {
                Err(format!("'{}' seconds is too long a delay", arg))
            }
            _ => Ok(()),
        }
    }

    fn finish(self) -> StateGraph {
        let listing = self
            .commands
            .iter()
            .map(Command::canonical)
            .collect::<Vec<_>>()
            .join("\n");
        let checksum = format!("{:08x}", crc32c::crc32c(listing.as_bytes()));

        StateGraph {
            states: self.states,
            state_order: self.state_order,
            events: self.events,
            event_order: self.event_order,
            start: self.start,
            error: self.error,
            log_flags: self.log_flags,
            checksum,
            errors: self.diagnostics.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use proptest::prelude::*;

    fn bind_source(source: &str) -> (StateGraph, Diagnostics) {
        let tokens = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let commands = parse(&tokens, &mut diagnostics);
        let graph = bind(&commands, &mut diagnostics);
        (graph, diagnostics)
    }

    const SAMPLE: &str = "
        State(Menu); State(Game); State(Pause); State(Crash);
        Event(start); Event(pause); Event(back);
        DefineStart(menu);
        DefineError(crash);
        LoadScene(Menu, MenuScene);
        LoadSceneAdditive(Pause, PauseOverlay);
        TimedTransition(Crash, Menu, 2.5);
        NamedTransition(Menu, Game, start);
        NamedTransition(Game, Pause, pause);
        BackTransition(Pause, back);
        LogAllTransitions();
        LogStateEntry();
    ";

    #[test]
    fn test_bind_sample() {
        let (graph, diagnostics) = bind_source(SAMPLE);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);

        assert_eq!(graph.states().count(), 4);
        assert_eq!(graph.events().count(), 3);
        assert_eq!(graph.start_state().unwrap().name, "Menu");
        assert_eq!(graph.error_state().unwrap().name, "Crash");

        let menu = graph.state("MENU").unwrap();
        assert_eq!(menu.resource.as_deref(), Some("MenuScene"));
        assert!(!menu.additive);
        assert_eq!(menu.named.get(&Name::new("start")), Some(&Name::new("game")));

        let pause = graph.state("pause").unwrap();
        assert!(pause.additive);
        assert!(pause.unloads_on_back());
        assert!(pause.back.contains(&Name::new("back")));

        let crash = graph.state("crash").unwrap();
        let timed = crash.timed.as_ref().unwrap();
        assert_eq!(timed.target, Name::new("menu"));
        assert_eq!(timed.seconds, 2.5);

        let flags = graph.log_flags();
        assert!(flags.state_entry);
        assert!(flags.timed_transitions && flags.named_transitions && flags.back_transitions);
        assert!(!flags.state_exit);
        assert!(!flags.scene_loaded);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let (graph, _) = bind_source(SAMPLE);
        let names: Vec<&str> = graph.states().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Menu", "Game", "Pause", "Crash"]);
    }

    #[test]
    fn test_duplicate_state_first_wins() {
        let (graph, diagnostics) = bind_source("State(Menu); State(MENU);");
        assert_eq!(diagnostics.count(DiagnosticKind::Duplication), 1);
        assert_eq!(graph.states().count(), 1);
        assert_eq!(graph.state("menu").unwrap().name, "Menu");
    }

    #[test]
    fn test_duplicate_event() {
        let (graph, diagnostics) = bind_source("Event(go); Event(Go);");
        assert_eq!(diagnostics.count(DiagnosticKind::Duplication), 1);
        assert_eq!(graph.events().count(), 1);
    }

    #[test]
    fn test_undeclared_references() {
        let (graph, diagnostics) = bind_source(
            "State(a); Event(go);
             DefineStart(nowhere);
             NamedTransition(a, b, go);
             NamedTransition(a, a, stop);
             BackTransition(b, go);",
        );
        assert_eq!(diagnostics.count(DiagnosticKind::Validation), 4);
        assert!(graph.start_state().is_none());
        assert!(graph.state("a").unwrap().named.is_empty());
    }

    #[test]
    fn test_wrong_argument_count() {
        let (graph, diagnostics) = bind_source("State(a, b); State(c); LogAll(c);");
        assert_eq!(diagnostics.count(DiagnosticKind::Validation), 2);
        assert_eq!(graph.states().count(), 1);
        assert_eq!(graph.log_flags(), LogFlags::default());
        let message = &diagnostics.iter().next().unwrap().message;
        assert!(message.contains("State command takes 1 argument(s) of type(s): <Identifier>"));
    }

    #[test]
    fn test_numeric_state_name_rejected() {
        let (graph, diagnostics) = bind_source("State(12);");
        assert_eq!(diagnostics.count(DiagnosticKind::Validation), 1);
        assert_eq!(graph.states().count(), 0);
    }

    #[test]
    fn test_timed_transition_rejects_bad_time() {
        let (graph, diagnostics) = bind_source(
            "State(a); State(b);
             TimedTransition(a, b, -1);
             TimedTransition(b, a, soon);
             TimedTransition(b, a, inf);",
        );
        assert_eq!(diagnostics.count(DiagnosticKind::Validation), 3);
        assert!(graph.state("a").unwrap().timed.is_none());
        assert!(graph.state("b").unwrap().timed.is_none());
    }

    #[test]
    fn test_timed_transition_rejects_unrepresentable_delay() {
        let (graph, diagnostics) = bind_source(
            "State(a); State(b);
             TimedTransition(a, b, 1e20);
             TimedTransition(b, a, 1e15);",
        );
        assert_eq!(diagnostics.count(DiagnosticKind::Validation), 1);
        let message = &diagnostics.iter().next().unwrap().message;
        assert!(message.contains("'1e20' seconds is too long a delay"));
        assert!(graph.state("a").unwrap().timed.is_none());
        assert_eq!(graph.state("b").unwrap().timed.as_ref().unwrap().seconds, 1e15);
    }

    #[test]
    fn test_zero_second_timed_transition_allowed() {
        let (graph, diagnostics) = bind_source("State(a); TimedTransition(a, a, 0);");
        assert!(diagnostics.is_empty());
        assert_eq!(graph.state("a").unwrap().timed.as_ref().unwrap().seconds, 0.0);
    }

    #[test]
    fn test_duplicate_attachments_last_write_wins() {
        let (graph, diagnostics) = bind_source(
            "State(a); State(b); State(c); Event(go);
             DefineStart(a); DefineStart(b);
             LoadScene(a, one); LoadSceneAdditive(a, two);
             TimedTransition(a, b, 1); TimedTransition(a, c, 2);
             NamedTransition(a, b, go); NamedTransition(a, c, GO);
             BackTransition(b, go); BackTransition(b, Go);",
        );
        assert_eq!(diagnostics.count(DiagnosticKind::Duplication), 5);
        assert_eq!(diagnostics.len(), 5);

        assert_eq!(graph.start_state().unwrap().name, "b");
        let a = graph.state("a").unwrap();
        assert_eq!(a.resource.as_deref(), Some("two"));
        assert!(a.additive);
        assert_eq!(a.timed.as_ref().unwrap().target, Name::new("c"));
        assert_eq!(a.named.get(&Name::new("go")), Some(&Name::new("c")));
        assert_eq!(graph.state("b").unwrap().back.len(), 1);
    }

    #[test]
    fn test_log_all_duplicate_checked_per_flag() {
        let (graph, diagnostics) =
            bind_source("LogStateEntry(); LogNamedTransitions(); LogAll();");
        assert_eq!(diagnostics.count(DiagnosticKind::Duplication), 2);
        assert_eq!(graph.log_flags(), LogFlags::all());

        let (_, diagnostics) = bind_source("LogAllTransitions(); LogAllTransitions();");
        assert_eq!(diagnostics.count(DiagnosticKind::Duplication), 3);
    }

    #[test]
    fn test_passes_run_after_errors() {
        let (graph, diagnostics) = bind_source(
            "State(a); State(a); Event(x); DefineStart(zzz); DefineError(a); LogSceneLoaded();",
        );
        assert_eq!(diagnostics.count(DiagnosticKind::Duplication), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::Validation), 1);
        assert_eq!(graph.error_state().unwrap().name, "a");
        assert!(graph.log_flags().scene_loaded);
    }

    #[test]
    fn test_checksum_ignores_keyword_case() {
        let (a, _) = bind_source("State(a); Event(go);");
        let (b, _) = bind_source("STATE(a);\n# comment\nevent(go);");
        let (c, _) = bind_source("State(b); Event(go);");
        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
        assert_eq!(a.checksum().len(), 8);
    }

    fn recase(name: &str, mask: &[bool]) -> String {
        name.chars()
            .zip(mask.iter().cycle())
            .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
            .collect()
    }

    proptest! {
        #[test]
        fn duplicate_state_reported_once(
            name in "[a-z][a-z0-9_]{0,10}",
            first in proptest::collection::vec(any::<bool>(), 1..8),
            second in proptest::collection::vec(any::<bool>(), 1..8),
        ) {
            let a = recase(&name, &first);
            let b = recase(&name, &second);
            let (graph, diagnostics) = bind_source(&format!("State({}); State({});", a, b));

            prop_assert_eq!(diagnostics.count(DiagnosticKind::Duplication), 1);
            prop_assert_eq!(diagnostics.len(), 1);
            prop_assert_eq!(graph.states().count(), 1);
            prop_assert_eq!(&graph.state(&name).unwrap().name, &a);
        }
    }
}
