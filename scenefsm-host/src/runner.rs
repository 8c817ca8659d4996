//! Tick loop driving a live interpreter.

use crate::activator::SimulatedActivator;
use crate::config::{Config, RuntimeConfig};
use crate::error::HostError;
use parking_lot::Mutex;
use scenefsm_core::{
    EventSender, Interpreter, Program, ResourceActivator, StateGraph, Status, Submission,
    TickOutcome, TransitionRecord,
};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::time::MissedTickBehavior;

/// Compiles a program file, refusing programs with diagnostics.
pub fn load_graph(path: impl AsRef<Path>) -> Result<Arc<StateGraph>, HostError> {
    let path = path.as_ref();
    let program = Program::from_file(path)?;
    if !program.is_valid() {
        return Err(HostError::InvalidProgram {
            path: path.display().to_string(),
            errors: program.diagnostics().len(),
        });
    }

    let graph = program.into_graph()?;
    tracing::info!(
        "Loaded program {} ({} states, {} events, checksum {})",
        path.display(),
        graph.states().count(),
        graph.events().count(),
        graph.checksum()
    );
    Ok(Arc::new(graph))
}

/// Runner counters.
#[derive(Debug, Default)]
pub struct RunnerStats {
    pub ticks_total: AtomicU64,
    pub transitions_total: AtomicU64,
    pub events_accepted: AtomicU64,
    pub events_dropped: AtomicU64,
}

/// Point-in-time view of a runner.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerSnapshot {
    pub state: String,
    pub status: Status,
    pub history: Vec<String>,
    pub pending: usize,
    pub ticks: u64,
    pub transitions: u64,
}

/// Owns an interpreter and ticks it on a fixed interval.
pub struct Runner<A: ResourceActivator> {
    interpreter: Mutex<Interpreter<A>>,
    sender: EventSender,
    transitions: broadcast::Sender<TransitionRecord>,
    tick_interval: Duration,
    stats: RunnerStats,
    shutdown: AtomicBool,
    notify: Notify,
}

impl Runner<SimulatedActivator> {
    /// Loads the configured program and builds a runner around it.
    pub fn from_config(config: &Config) -> Result<Self, HostError> {
        let graph = load_graph(&config.program.path)?;
        let activator = SimulatedActivator::new(config.runtime.activation_latency());
        let interpreter = Interpreter::new(graph, activator)?;
        Ok(Self::new(interpreter, &config.runtime))
    }
}

impl<A: ResourceActivator> Runner<A> {
    pub fn new(interpreter: Interpreter<A>, config: &RuntimeConfig) -> Self {
        let (transitions, _) = broadcast::channel(config.transition_buffer.max(1));
        Self {
            sender: interpreter.sender(),
            interpreter: Mutex::new(interpreter),
            transitions,
            tick_interval: config.tick_interval(),
            stats: RunnerStats::default(),
            shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Returns a handle for submitting events from other tasks.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Subscribes to transitions fired from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionRecord> {
        self.transitions.subscribe()
    }

    /// Submits an event to the machine.
    pub fn submit(&self, name: &str) -> Result<Submission, HostError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(HostError::ShuttingDown);
        }

        let submission = self.sender.submit(name)?;
        match submission {
            Submission::Accepted => self.stats.events_accepted.fetch_add(1, Ordering::Relaxed),
            Submission::Dropped => self.stats.events_dropped.fetch_add(1, Ordering::Relaxed),
        };
        Ok(submission)
    }

    /// Runs one tick and publishes any transition.
    pub fn tick(&self) -> TickOutcome {
        let outcome = self.interpreter.lock().tick();
        self.stats.ticks_total.fetch_add(1, Ordering::Relaxed);

        if let TickOutcome::Transitioned(record) = &outcome {
            self.stats.transitions_total.fetch_add(1, Ordering::Relaxed);
            // No receivers is fine.
            let _ = self.transitions.send(record.clone());
        }

        outcome
    }

    /// Ticks on the configured interval until [`Runner::shutdown`] is called.
    pub async fn run(&self) {
        tracing::info!(
            "Runner started in state {} (tick_interval_ms={})",
            self.interpreter.lock().current_name(),
            self.tick_interval.as_millis()
        );

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = interval.tick() => {}
            }

            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            self.tick();
        }

        tracing::info!(
            "Runner stopped after {} ticks, {} transitions",
            self.stats.ticks_total.load(Ordering::Relaxed),
            self.stats.transitions_total.load(Ordering::Relaxed)
        );
    }

    /// Signals the tick loop to stop and rejects further events.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }

    pub fn snapshot(&self) -> RunnerSnapshot {
        let interpreter = self.interpreter.lock();
        RunnerSnapshot {
            state: interpreter.current_name().to_string(),
            status: interpreter.status(),
            history: interpreter.history(),
            pending: interpreter.pending_len(),
            ticks: self.stats.ticks_total.load(Ordering::Relaxed),
            transitions: self.stats.transitions_total.load(Ordering::Relaxed),
        }
    }
}
