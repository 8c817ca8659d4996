//! Resource activation seam.
//!
//! The interpreter asks an activator to load or unload a state's resource
//! and polls the returned handle once per tick until it reports completion.

/// An in-flight activation or deactivation.
pub trait ActivationHandle: Send {
    fn is_complete(&self) -> bool;
}

/// Loads and unloads the resources attached to states.
pub trait ResourceActivator: Send {
    type Handle: ActivationHandle;

    /// Starts loading `resource`. An additive load keeps whatever is
    /// already loaded; an exclusive one replaces it.
    fn activate(&mut self, resource: &str, additive: bool) -> Self::Handle;

    /// Starts unloading a resource previously loaded additively.
    fn deactivate(&mut self, resource: &str) -> Self::Handle;
}

/// Handle that is complete from the start.
#[derive(Debug, Clone, Copy, Default)]
pub struct Completed;

impl ActivationHandle for Completed {
    fn is_complete(&self) -> bool {
        true
    }
}

/// Activator whose operations finish immediately.
#[derive(Debug, Clone, Default)]
pub struct ImmediateActivator {
    loaded: Vec<String>,
}

impl ImmediateActivator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources currently loaded, oldest first.
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }
}

impl ResourceActivator for ImmediateActivator {
    type Handle = Completed;

    fn activate(&mut self, resource: &str, additive: bool) -> Completed {
        if !additive {
            self.loaded.clear();
        }
        self.loaded.push(resource.to_string());
        Completed
    }

    fn deactivate(&mut self, resource: &str) -> Completed {
        if let Some(pos) = self.loaded.iter().rposition(|r| r == resource) {
            self.loaded.remove(pos);
        }
        Completed
    }
}
