//! Runtime interpreter for a compiled [`StateGraph`].
//!
//! One interpreter is one live machine. It cycles through three statuses
//! for every state it enters:
//!
//! ```text
//! Entering -> ActivatingResource -> WaitingForTransition -> (exit) -> Entering
//! ```
//!
//! Everything happens inside [`Interpreter::tick`]. A tick starts pending
//! activation, polls the activation handle, and once the state is waiting
//! checks its triggers: the timed transition first, then the pending event
//! queue in FIFO order. At most one transition fires per tick. A timed
//! transition fires once the time spent waiting exceeds its delay, so even a
//! zero delay waits for a later tick.
//!
//! Events arrive through [`EventSender`] handles, which may live on other
//! threads. A sender checks the event against the accepted set of the
//! current state and enqueues it under the same lock the interpreter takes
//! when it switches states, so an event is never accepted for a state that
//! has already been left.

use crate::activator::{ActivationHandle, ResourceActivator};
use crate::error::CoreError;
use crate::graph::{Name, State, StateGraph};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

/// Where the interpreter is in the cycle for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Entering,
    ActivatingResource,
    WaitingForTransition,
}

/// Result of submitting an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Submission {
    /// Queued for the next tick.
    Accepted,
    /// Not accepted by the current state.
    Dropped,
}

/// What made a transition fire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    Timed { seconds: f64 },
    Named { event: String },
    Back { event: String },
}

/// A transition that fired, with display names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub from: String,
    pub to: String,
    pub trigger: Trigger,
    /// Pending events thrown away by the transition.
    pub discarded: Vec<String>,
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Waiting, nothing fired.
    Idle,
    /// A resource activation is still in flight.
    Activating,
    Transitioned(TransitionRecord),
}

impl TickOutcome {
    pub fn transition(&self) -> Option<&TransitionRecord> {
        match self {
            TickOutcome::Transitioned(record) => Some(record),
            _ => None,
        }
    }
}

enum Phase<H> {
    Entering,
    Activating {
        handle: H,
        resource: String,
        unloading: bool,
    },
    Waiting {
        since: Instant,
    },
}

/// State shared between the interpreter and its senders.
#[derive(Debug)]
struct Mailbox {
    current: Name,
    accepted: HashSet<Name>,
    pending: VecDeque<Name>,
}

impl Mailbox {
    fn enter(&mut self, state: &State) {
        self.current = state.key().clone();
        self.accepted = state.accepted_events().cloned().collect();
    }
}

/// Cloneable handle for submitting events from any thread.
#[derive(Debug, Clone)]
pub struct EventSender {
    graph: Arc<StateGraph>,
    mailbox: Arc<Mutex<Mailbox>>,
}

impl EventSender {
    /// Submits an event by name (any casing).
    ///
    /// Unknown names are an error. Known events the current state does not
    /// accept are dropped with a warning.
    pub fn submit(&self, name: &str) -> Result<Submission, CoreError> {
        let event = self
            .graph
            .event(name)
            .ok_or_else(|| CoreError::UnknownEvent {
                name: name.to_string(),
            })?;

        let mut mailbox = self.mailbox.lock();
        if !mailbox.accepted.contains(event.key()) {
            tracing::warn!(
                "Event {} not accepted in state {}; dropped",
                event.name,
                self.graph.state_display(&mailbox.current)
            );
            return Ok(Submission::Dropped);
        }

        mailbox.pending.push_back(event.key().clone());
        tracing::trace!("queued event {}", event.name);
        Ok(Submission::Accepted)
    }
}

/// A running instance of a state machine.
pub struct Interpreter<A: ResourceActivator> {
    graph: Arc<StateGraph>,
    activator: A,
    current: Name,
    phase: Phase<A::Handle>,
    /// Previously visited states, most recent last. Never holds the same
    /// state twice in a row.
    history: Vec<Name>,
    mailbox: Arc<Mutex<Mailbox>>,
    /// Resource to unload instead of loading on the next entry.
    unload_on_entry: Option<String>,
}

impl<A: ResourceActivator> Interpreter<A> {
    /// Creates an interpreter positioned at the start state.
    pub fn new(graph: Arc<StateGraph>, activator: A) -> Result<Self, CoreError> {
        if !graph.is_valid() {
            return Err(CoreError::InvalidProgram {
                errors: graph.error_count(),
            });
        }
        let start = graph.start_state().ok_or(CoreError::NoStartState)?;
        let current = start.key().clone();

        let mut mailbox = Mailbox {
            current: current.clone(),
            accepted: HashSet::new(),
            pending: VecDeque::new(),
        };
        mailbox.enter(start);

        if graph.log_flags().state_entry {
            tracing::info!("Entering state {}", start.name);
        }

        Ok(Self {
            graph,
            current,
            activator,
            phase: Phase::Entering,
            history: Vec::new(),
            mailbox: Arc::new(Mutex::new(mailbox)),
            unload_on_entry: None,
        })
    }

    /// Advances the machine using the current time.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    /// Advances the machine as if the clock read `now`.
    pub fn tick_at(&mut self, now: Instant) -> TickOutcome {
        let Some(since) = self.settle(now) else {
            return TickOutcome::Activating;
        };
        match self.poll_triggers(now, since) {
            Some(record) => TickOutcome::Transitioned(record),
            None => TickOutcome::Idle,
        }
    }

    /// Submits an event. See [`EventSender::submit`].
    pub fn submit_event(&self, name: &str) -> Result<Submission, CoreError> {
        self.sender().submit(name)
    }

    /// Returns a handle for submitting events from elsewhere.
    pub fn sender(&self) -> EventSender {
        EventSender {
            graph: Arc::clone(&self.graph),
            mailbox: Arc::clone(&self.mailbox),
        }
    }

    pub fn graph(&self) -> &Arc<StateGraph> {
        &self.graph
    }

    pub fn activator(&self) -> &A {
        &self.activator
    }

    pub fn current_state(&self) -> Option<&State> {
        self.graph.state_by_key(&self.current)
    }

    /// Display name of the current state.
    pub fn current_name(&self) -> &str {
        self.graph.state_display(&self.current)
    }

    pub fn status(&self) -> Status {
        match self.phase {
            Phase::Entering => Status::Entering,
            Phase::Activating { .. } => Status::ActivatingResource,
            Phase::Waiting { .. } => Status::WaitingForTransition,
        }
    }

    /// Display names of previously visited states, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .iter()
            .map(|key| self.graph.state_display(key).to_string())
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.mailbox.lock().pending.len()
    }

    /// Display names of the events the current state accepts.
    pub fn accepted_events(&self) -> BTreeSet<String> {
        self.mailbox
            .lock()
            .accepted
            .iter()
            .map(|key| self.graph.event_display(key).to_string())
            .collect()
    }

    /// Moves through entry and activation, returning when the current state
    /// started waiting, or `None` while activation is in flight.
    fn settle(&mut self, now: Instant) -> Option<Instant> {
        if matches!(self.phase, Phase::Entering) {
            self.phase = self.begin_activation(now);
        }

        if let Phase::Activating {
            handle,
            resource,
            unloading,
        } = &self.phase
        {
            if !handle.is_complete() {
                return None;
            }
            if *unloading {
                tracing::debug!("Unloaded {}", resource);
            } else if self.graph.log_flags().scene_loaded {
                tracing::info!("Loaded {}", resource);
            }
            self.phase = Phase::Waiting { since: now };
        }

        match self.phase {
            Phase::Waiting { since } => Some(since),
            _ => None,
        }
    }

    fn begin_activation(&mut self, now: Instant) -> Phase<A::Handle> {
        if let Some(resource) = self.unload_on_entry.take() {
            let handle = self.activator.deactivate(&resource);
            return Phase::Activating {
                handle,
                resource,
                unloading: true,
            };
        }

        let graph = Arc::clone(&self.graph);
        match graph.state_by_key(&self.current) {
            Some(State {
                resource: Some(resource),
                additive,
                ..
            }) => Phase::Activating {
                handle: self.activator.activate(resource, *additive),
                resource: resource.clone(),
                unloading: false,
            },
            _ => Phase::Waiting { since: now },
        }
    }

    fn poll_triggers(&mut self, now: Instant, since: Instant) -> Option<TransitionRecord> {
        let graph = Arc::clone(&self.graph);
        let state = graph.state_by_key(&self.current)?;
        let shared = Arc::clone(&self.mailbox);
        let mut mailbox = shared.lock();

        if let Some(timed) = &state.timed {
            if now.saturating_duration_since(since) > timed.delay() {
                let trigger = Trigger::Timed {
                    seconds: timed.seconds,
                };
                return Some(self.fire(&mut mailbox, timed.target.clone(), trigger));
            }
        }

        while let Some(event) = mailbox.pending.pop_front() {
            let event_name = graph.event_display(&event).to_string();

            if let Some(target) = state.named.get(&event) {
                let trigger = Trigger::Named { event: event_name };
                return Some(self.fire(&mut mailbox, target.clone(), trigger));
            }

            if state.back.contains(&event) {
                match self.pop_history() {
                    Some(target) => {
                        if state.unloads_on_back() {
                            self.unload_on_entry = state.resource.clone();
                        }
                        let trigger = Trigger::Back { event: event_name };
                        return Some(self.fire(&mut mailbox, target, trigger));
                    }
                    None => {
                        tracing::warn!(
                            "Back event {} in state {} with empty history; dropped",
                            event_name,
                            state.name
                        );
                        continue;
                    }
                }
            }

            tracing::warn!(
                "Event {} has no transition from state {}; dropped",
                event_name,
                state.name
            );
        }

        None
    }

    /// Pops the most recent history entry that differs from the current
    /// state, along with any entries above it. History is left untouched
    /// when there is no such entry.
    fn pop_history(&mut self) -> Option<Name> {
        let index = self
            .history
            .iter()
            .rposition(|previous| *previous != self.current)?;
        let target = self.history[index].clone();
        self.history.truncate(index);
        Some(target)
    }

    fn fire(&mut self, mailbox: &mut Mailbox, target: Name, trigger: Trigger) -> TransitionRecord {
        if self.history.last() != Some(&self.current) {
            self.history.push(self.current.clone());
        }

        let graph = Arc::clone(&self.graph);
        let discarded: Vec<String> = mailbox
            .pending
            .drain(..)
            .map(|event| {
                let name = graph.event_display(&event).to_string();
                tracing::warn!(
                    "Possible race condition: transition dropped pending event {}",
                    name
                );
                name
            })
            .collect();

        let from = graph.state_display(&self.current).to_string();
        let to = graph.state_display(&target).to_string();
        let flags = graph.log_flags();

        if flags.state_exit {
            tracing::info!("Exiting state {}", from);
        }
        match &trigger {
            Trigger::Timed { seconds } if flags.timed_transitions => {
                tracing::info!("Timed transition {} -> {} after {}s", from, to, seconds);
            }
            Trigger::Named { event } if flags.named_transitions => {
                tracing::info!("Named transition {} -> {} on {}", from, to, event);
            }
            Trigger::Back { event } if flags.back_transitions => {
                tracing::info!("Back transition {} -> {} on {}", from, to, event);
            }
            _ => {}
        }

        if let Some(state) = graph.state_by_key(&target) {
            mailbox.enter(state);
        }
        self.current = target;
        self.phase = Phase::Entering;

        if flags.state_entry {
            tracing::info!("Entering state {}", to);
        }

        TransitionRecord {
            from,
            to,
            trigger,
            discarded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activator::ImmediateActivator;
    use crate::program::Program;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn compile(source: &str) -> Arc<StateGraph> {
        Arc::new(Program::compile(source).into_graph().unwrap())
    }

    fn interpreter(source: &str) -> Interpreter<ImmediateActivator> {
        Interpreter::new(compile(source), ImmediateActivator::new()).unwrap()
    }

    /// Records every call; handles complete once the gate is open.
    #[derive(Default)]
    struct RecordingActivator {
        calls: Vec<String>,
        gate: Arc<AtomicBool>,
    }

    struct GateHandle(Arc<AtomicBool>);

    impl ActivationHandle for GateHandle {
        fn is_complete(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl RecordingActivator {
        fn open() -> Self {
            let activator = Self::default();
            activator.gate.store(true, Ordering::SeqCst);
            activator
        }
    }

    impl ResourceActivator for RecordingActivator {
        type Handle = GateHandle;

        fn activate(&mut self, resource: &str, additive: bool) -> GateHandle {
            let mode = if additive { "additive" } else { "exclusive" };
            self.calls.push(format!("activate {} {}", resource, mode));
            GateHandle(Arc::clone(&self.gate))
        }

        fn deactivate(&mut self, resource: &str) -> GateHandle {
            self.calls.push(format!("deactivate {}", resource));
            GateHandle(Arc::clone(&self.gate))
        }
    }

    #[test]
    fn test_go_scenario() {
        let mut fsm = interpreter(
            "State(A); State(B); Event(go);
             DefineStart(A);
             NamedTransition(A, B, go);",
        );
        assert_eq!(fsm.submit_event("go").unwrap(), Submission::Accepted);

        let outcome = fsm.tick();
        let record = outcome.transition().unwrap();
        assert_eq!(record.from, "A");
        assert_eq!(record.to, "B");
        assert_eq!(
            record.trigger,
            Trigger::Named {
                event: "go".into()
            }
        );
        assert_eq!(fsm.current_name(), "B");

        assert_eq!(fsm.submit_event("go").unwrap(), Submission::Dropped);
        assert_eq!(fsm.pending_len(), 0);
    }

    #[test]
    fn test_unknown_event_is_error() {
        let fsm = interpreter("State(A); DefineStart(A);");
        let err = fsm.submit_event("jump").unwrap_err();
        assert!(matches!(err, CoreError::UnknownEvent { ref name } if name == "jump"));
    }

    #[test]
    fn test_event_names_case_insensitive() {
        let mut fsm = interpreter(
            "State(A); State(B); Event(Go); DefineStart(A); NamedTransition(A, B, go);",
        );
        assert_eq!(fsm.submit_event("GO").unwrap(), Submission::Accepted);
        assert!(fsm.tick().transition().is_some());
    }

    #[test]
    fn test_timed_transition() {
        let mut fsm = interpreter(
            "State(A); State(B); DefineStart(A); TimedTransition(A, B, 0.1);",
        );
        let t0 = Instant::now();

        assert_eq!(fsm.tick_at(t0), TickOutcome::Idle);
        assert_eq!(fsm.status(), Status::WaitingForTransition);
        assert_eq!(fsm.tick_at(t0 + Duration::from_millis(50)), TickOutcome::Idle);
        assert_eq!(fsm.tick_at(t0 + Duration::from_millis(100)), TickOutcome::Idle);

        let outcome = fsm.tick_at(t0 + Duration::from_millis(101));
        let record = outcome.transition().unwrap();
        assert_eq!(record.trigger, Trigger::Timed { seconds: 0.1 });
        assert_eq!(fsm.current_name(), "B");
        assert_eq!(fsm.status(), Status::Entering);
    }

    #[test]
    fn test_zero_delay_fires_on_next_tick() {
        let mut fsm = interpreter(
            "State(Splash); State(Menu); DefineStart(Splash); TimedTransition(Splash, Menu, 0);",
        );
        let t0 = Instant::now();
        assert_eq!(fsm.tick_at(t0), TickOutcome::Idle);
        assert_eq!(fsm.tick_at(t0), TickOutcome::Idle);
        assert!(fsm
            .tick_at(t0 + Duration::from_millis(1))
            .transition()
            .is_some());
        assert_eq!(fsm.current_name(), "Menu");
    }

    #[test]
    fn test_long_delay_never_fires() {
        let mut fsm = interpreter(
            "State(A); State(B); Event(go);
             DefineStart(A);
             TimedTransition(A, B, 1e18);
             NamedTransition(A, B, go);",
        );
        let t0 = Instant::now();
        assert_eq!(fsm.tick_at(t0), TickOutcome::Idle);
        assert_eq!(fsm.tick_at(t0 + Duration::from_secs(1_000_000)), TickOutcome::Idle);

        fsm.submit_event("go").unwrap();
        assert!(fsm.tick_at(t0).transition().is_some());
    }

    #[test]
    fn test_time_wins_race() {
        let mut fsm = interpreter(
            "State(A); State(B); State(C); Event(go);
             DefineStart(A);
             TimedTransition(A, B, 0.1);
             NamedTransition(A, C, go);",
        );
        let t0 = Instant::now();
        assert_eq!(fsm.tick_at(t0), TickOutcome::Idle);

        assert_eq!(fsm.submit_event("go").unwrap(), Submission::Accepted);
        let outcome = fsm.tick_at(t0 + Duration::from_millis(200));
        let record = outcome.transition().unwrap();
        assert_eq!(record.to, "B");
        assert_eq!(record.discarded, vec!["go".to_string()]);
        assert_eq!(fsm.pending_len(), 0);
    }

    #[test]
    fn test_one_transition_per_tick_discards_rest() {
        let mut fsm = interpreter(
            "State(A); State(B); State(C); Event(go); Event(other);
             DefineStart(A);
             NamedTransition(A, B, go);
             NamedTransition(A, C, other);
             NamedTransition(B, C, other);",
        );
        fsm.submit_event("go").unwrap();
        fsm.submit_event("other").unwrap();

        let outcome = fsm.tick();
        let record = outcome.transition().unwrap();
        assert_eq!(record.to, "B");
        assert_eq!(record.discarded, vec!["other".to_string()]);
        assert_eq!(fsm.tick(), TickOutcome::Idle);
        assert_eq!(fsm.current_name(), "B");
    }

    #[test]
    fn test_no_spurious_transitions() {
        let mut fsm = interpreter("State(Idle); Event(poke); DefineStart(Idle);");
        let t0 = Instant::now();
        for secs in [0, 1, 10, 1000, 100_000] {
            assert_eq!(fsm.tick_at(t0 + Duration::from_secs(secs)), TickOutcome::Idle);
        }
        assert_eq!(fsm.submit_event("poke").unwrap(), Submission::Dropped);
        assert_eq!(fsm.current_name(), "Idle");
        assert!(fsm.history().is_empty());
    }

    #[test]
    fn test_back_returns_to_distinct_prior_state() {
        let mut fsm = interpreter(
            "State(A); State(B); State(C); Event(next); Event(back);
             DefineStart(A);
             NamedTransition(A, B, next);
             NamedTransition(B, C, next);
             BackTransition(C, back);
             BackTransition(B, back);",
        );
        fsm.submit_event("next").unwrap();
        fsm.tick();
        fsm.submit_event("next").unwrap();
        fsm.tick();
        assert_eq!(fsm.current_name(), "C");
        assert_eq!(fsm.history(), vec!["A", "B"]);

        fsm.submit_event("back").unwrap();
        let outcome = fsm.tick();
        let record = outcome.transition().unwrap();
        assert_eq!(record.to, "B");
        assert_eq!(
            record.trigger,
            Trigger::Back {
                event: "back".into()
            }
        );
        assert_eq!(fsm.history(), vec!["A", "C"]);

        // Going back again returns to the most recently left state.
        fsm.submit_event("back").unwrap();
        fsm.tick();
        assert_eq!(fsm.current_name(), "C");
    }

    #[test]
    fn test_history_skips_self_loops() {
        let mut fsm = interpreter(
            "State(A); State(B); Event(again); Event(back); Event(go);
             DefineStart(A);
             NamedTransition(A, A, again);
             BackTransition(A, back);
             NamedTransition(A, B, go);",
        );
        fsm.submit_event("again").unwrap();
        fsm.tick();
        fsm.submit_event("again").unwrap();
        fsm.tick();
        assert_eq!(fsm.history(), vec!["A"]);

        // Only A in history, so back has nowhere to go and history is kept.
        fsm.submit_event("back").unwrap();
        assert_eq!(fsm.tick(), TickOutcome::Idle);
        assert_eq!(fsm.history(), vec!["A"]);

        // Draining continues past a dropped back event.
        fsm.submit_event("back").unwrap();
        fsm.submit_event("go").unwrap();
        let outcome = fsm.tick();
        let record = outcome.transition().unwrap();
        assert_eq!(record.to, "B");
        assert!(record.discarded.is_empty());
    }

    #[test]
    fn test_activation_and_additive_unload_on_back() {
        let source = "
            State(Game); State(Pause); Event(pause); Event(resume);
            DefineStart(Game);
            LoadScene(Game, Level1);
            LoadSceneAdditive(Pause, PauseMenu);
            NamedTransition(Game, Pause, pause);
            BackTransition(Pause, resume);
        ";
        let mut fsm = Interpreter::new(compile(source), RecordingActivator::open()).unwrap();

        assert_eq!(fsm.tick(), TickOutcome::Idle);
        fsm.submit_event("pause").unwrap();
        assert!(fsm.tick().transition().is_some());
        assert_eq!(fsm.tick(), TickOutcome::Idle);

        fsm.submit_event("resume").unwrap();
        assert!(fsm.tick().transition().is_some());
        assert_eq!(fsm.current_name(), "Game");
        assert_eq!(fsm.tick(), TickOutcome::Idle);

        assert_eq!(
            fsm.activator().calls,
            vec![
                "activate Level1 exclusive",
                "activate PauseMenu additive",
                "deactivate PauseMenu",
            ]
        );
    }

    #[test]
    fn test_waits_for_activation() {
        let source = "
            State(A); State(B); Event(go);
            DefineStart(A);
            LoadScene(A, Big);
            NamedTransition(A, B, go);
        ";
        let mut fsm = Interpreter::new(compile(source), RecordingActivator::default()).unwrap();
        let gate = Arc::clone(&fsm.activator().gate);

        assert_eq!(fsm.tick(), TickOutcome::Activating);
        assert_eq!(fsm.status(), Status::ActivatingResource);

        // Accepted while loading, but not acted on until loaded.
        assert_eq!(fsm.submit_event("go").unwrap(), Submission::Accepted);
        assert_eq!(fsm.tick(), TickOutcome::Activating);
        assert_eq!(fsm.pending_len(), 1);

        gate.store(true, Ordering::SeqCst);
        assert!(fsm.tick().transition().is_some());
        assert_eq!(fsm.activator().calls.len(), 1);
    }

    #[test]
    fn test_timer_starts_after_activation() {
        let source = "
            State(A); State(B);
            DefineStart(A);
            LoadScene(A, Slow);
            TimedTransition(A, B, 1);
        ";
        let mut fsm = Interpreter::new(compile(source), RecordingActivator::default()).unwrap();
        let gate = Arc::clone(&fsm.activator().gate);
        let t0 = Instant::now();

        assert_eq!(fsm.tick_at(t0), TickOutcome::Activating);
        gate.store(true, Ordering::SeqCst);
        let loaded = t0 + Duration::from_secs(5);
        assert_eq!(fsm.tick_at(loaded), TickOutcome::Idle);
        assert_eq!(
            fsm.tick_at(loaded + Duration::from_secs(1)),
            TickOutcome::Idle
        );
        assert!(fsm
            .tick_at(loaded + Duration::from_millis(1001))
            .transition()
            .is_some());
    }

    #[test]
    fn test_accepted_set_follows_state() {
        let mut fsm = interpreter(
            "State(A); State(B); Event(go); Event(Back);
             DefineStart(A);
             NamedTransition(A, B, go);
             BackTransition(B, back);",
        );
        assert_eq!(fsm.accepted_events(), BTreeSet::from(["go".to_string()]));
        fsm.submit_event("go").unwrap();
        fsm.tick();
        assert_eq!(fsm.accepted_events(), BTreeSet::from(["Back".to_string()]));
    }

    #[test]
    fn test_sender_from_other_thread() {
        let mut fsm = interpreter(
            "State(A); State(B); Event(go); DefineStart(A); NamedTransition(A, B, go);",
        );
        let sender = fsm.sender();
        let handle = std::thread::spawn(move || sender.submit("go"));
        assert_eq!(handle.join().unwrap().unwrap(), Submission::Accepted);

        assert!(fsm.tick().transition().is_some());
        assert_eq!(fsm.current_name(), "B");
    }

    #[test]
    fn test_rejects_invalid_or_startless_graph() {
        let invalid = Program::compile("State(A); DefineStart(B);");
        let graph = Arc::new(invalid.graph().clone());
        let err = Interpreter::new(graph, ImmediateActivator::new()).err().unwrap();
        assert_eq!(err.error_code(), "INVALID_PROGRAM");

        let err = Interpreter::new(compile("State(A);"), ImmediateActivator::new())
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::NoStartState));
    }

    #[test]
    fn test_error_state_is_ordinary() {
        let mut fsm = interpreter(
            "State(Boot); State(Crash); Event(fail); Event(retry);
             DefineStart(Boot);
             DefineError(Crash);
             NamedTransition(Boot, Crash, fail);
             NamedTransition(Crash, Boot, retry);",
        );
        fsm.submit_event("fail").unwrap();
        fsm.tick();
        fsm.submit_event("retry").unwrap();
        fsm.tick();
        assert_eq!(fsm.current_name(), "Boot");
    }
}
