//! Owned stores for loaded components and live instances.
//!
//! Both stores serialize every lookup, insertion and removal behind a mutex.
//! A poisoned lock is recovered, since the guarded maps stay consistent
//! between operations.

use crate::error::{SimError, SimResult};
use sm_core::ComponentId;
use sm_fmu::{ComponentDescriptor, FmuResult, Instance, Status};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Components {
    arena: Vec<Arc<ComponentDescriptor>>,
    by_key: HashMap<String, ComponentId>,
}

/// Arena of loaded components, addressable by id or by source key.
#[derive(Debug, Default)]
pub struct ComponentStore {
    inner: Mutex<Components>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the component cached under `key`, loading it on first use.
    ///
    /// The lock is held while loading, so a key is loaded at most once.
    pub fn get_or_load(
        &self,
        key: &str,
        load: impl FnOnce() -> FmuResult<ComponentDescriptor>,
    ) -> SimResult<(ComponentId, Arc<ComponentDescriptor>)> {
        let mut inner = lock(&self.inner);
        if let Some(&id) = inner.by_key.get(key) {
            return Ok((id, Arc::clone(&inner.arena[id.index()])));
        }
        let descriptor = Arc::new(load()?);
        let id = ComponentId::from_index(inner.arena.len())?;
        inner.arena.push(Arc::clone(&descriptor));
        inner.by_key.insert(key.to_string(), id);
        tracing::debug!(key, %id, component = descriptor.name(), "component cached");
        Ok((id, descriptor))
    }

    pub fn get(&self, id: ComponentId) -> Option<Arc<ComponentDescriptor>> {
        lock(&self.inner).arena.get(id.index()).cloned()
    }

    pub fn lookup(&self, key: &str) -> Option<ComponentId> {
        lock(&self.inner).by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type SharedInstance = Arc<Mutex<Instance>>;

/// Live instances created through the explicit lifecycle, keyed by name.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: Mutex<HashMap<String, SharedInstance>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<prefix>-<uuid>`
    pub fn generate_name(prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4())
    }

    pub fn insert(&self, instance: Instance) -> SimResult<String> {
        let name = instance.name().to_string();
        let mut instances = lock(&self.instances);
        if instances.contains_key(&name) {
            return Err(SimError::InvalidArg {
                what: "instance name already registered",
            });
        }
        instances.insert(name.clone(), Arc::new(Mutex::new(instance)));
        Ok(name)
    }

    pub fn get(&self, name: &str) -> SimResult<SharedInstance> {
        lock(&self.instances)
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::UnknownInstance {
                name: name.to_string(),
            })
    }

    /// Run `f` with exclusive access to the named instance.
    pub fn with_instance<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Instance) -> SimResult<T>,
    ) -> SimResult<T> {
        let shared = self.get(name)?;
        let mut instance = lock(&shared);
        f(&mut instance)
    }

    /// Unregister and terminate the named instance.
    ///
    /// If a call still holds the instance, termination happens when it
    /// releases it. The name is unknown from here on either way.
    pub fn destroy(&self, name: &str) -> SimResult<Option<Status>> {
        let shared = lock(&self.instances)
            .remove(name)
            .ok_or_else(|| SimError::UnknownInstance {
                name: name.to_string(),
            })?;
        match Arc::try_unwrap(shared) {
            Ok(mutex) => {
                let instance = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);
                Ok(Some(instance.destroy()))
            }
            Err(_) => {
                tracing::debug!(instance = name, "instance in use, termination deferred");
                Ok(None)
            }
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.instances).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        lock(&self.instances).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
