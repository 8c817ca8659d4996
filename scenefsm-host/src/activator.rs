//! Simulated resource activator.
//!
//! Stands in for a real scene loader: every load or unload completes after
//! a fixed latency, and the set of loaded resources is tracked so hosts
//! can display it.

use parking_lot::Mutex;
use scenefsm_core::{ActivationHandle, ResourceActivator};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handle that completes at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct DelayedHandle {
    ready_at: Instant,
}

impl ActivationHandle for DelayedHandle {
    fn is_complete(&self) -> bool {
        Instant::now() >= self.ready_at
    }
}

/// Activator that completes every operation after `latency`.
#[derive(Debug, Clone)]
pub struct SimulatedActivator {
    latency: Duration,
    loaded: Arc<Mutex<Vec<String>>>,
}

impl SimulatedActivator {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            loaded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared view of the loaded resources, oldest first.
    pub fn loaded(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.loaded)
    }

    fn handle(&self) -> DelayedHandle {
        DelayedHandle {
            ready_at: Instant::now() + self.latency,
        }
    }
}

impl ResourceActivator for SimulatedActivator {
    type Handle = DelayedHandle;

    fn activate(&mut self, resource: &str, additive: bool) -> DelayedHandle {
        let mut loaded = self.loaded.lock();
        if !additive {
            loaded.clear();
        }
        loaded.push(resource.to_string());
        tracing::debug!(
            "Activating {} ({})",
            resource,
            if additive { "additive" } else { "exclusive" }
        );
        drop(loaded);
        self.handle()
    }

    fn deactivate(&mut self, resource: &str) -> DelayedHandle {
        let mut loaded = self.loaded.lock();
        if let Some(pos) = loaded.iter().rposition(|r| r == resource) {
            loaded.remove(pos);
        }
        tracing::debug!("Deactivating {}", resource);
        drop(loaded);
        self.handle()
    }
}
