//! Build-time dependency resolution.
//!
//! A [`Resolver`] is handed to every provider while it runs. Requesting a
//! service through it records the edge `current -> requested` and builds the
//! requested service first if nothing has started building it yet. A service
//! that is already `Building` (a cycle) is returned as its pending slot.
//!
//! Each nested build gets its own resolver, so the "current service" is a
//! plain field rather than state shared across the whole container.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use super::entry::{BuildState, Entry};
use super::service::{Service, ServiceRef};
use crate::core::WeaveError;

/// Options that stay fixed for a whole build pass.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BuildOptions {
    pub(crate) dedupe_edges: bool,
}

/// Dependency resolver passed to providers during `build()`.
pub struct Resolver<'a, C> {
    entries: &'a mut HashMap<String, Entry<C>>,
    context: &'a C,
    current: &'a str,
    options: BuildOptions,
}

impl<'a, C> Resolver<'a, C> {
    /// The shared context the container was configured with.
    pub fn context(&self) -> &C {
        self.context
    }

    /// Name of the service whose provider is running.
    pub fn service_name(&self) -> &str {
        self.current
    }

    /// Request a service by name, building it first if necessary.
    ///
    /// # Errors
    ///
    /// - [`WeaveError::NotFound`] if `name` is not registered
    /// - Any error from building `name` (or its own dependencies)
    pub fn get_service(&mut self, name: &str) -> Result<ServiceRef, WeaveError> {
        let state = match self.entries.get(name) {
            Some(entry) => entry.state,
            None => return Err(WeaveError::not_found(name)),
        };

        self.record_edge(name);

        if state == BuildState::Unbuilt {
            build_entry(self.entries, self.context, name, self.options)?;
        }

        self.entries.get(name).map(|entry| entry.slot.clone()).ok_or_else(|| WeaveError::not_found(name))
    }

    /// Typed variant of [`get_service`](Self::get_service).
    ///
    /// # Errors
    ///
    /// As `get_service`, plus [`WeaveError::TypeMismatch`].
    pub fn get<R: Send + Sync + 'static>(&mut self, name: &str) -> Result<Service<R>, WeaveError> {
        self.get_service(name)?.downcast::<R>()
    }

    /// Typed request that panics on failure.
    ///
    /// # Panics
    ///
    /// Panics if `name` is missing, fails to build, or has another type.
    #[track_caller]
    pub fn must_get<R: Send + Sync + 'static>(&mut self, name: &str) -> Service<R> {
        match self.get(name) {
            Ok(service) => service,
            Err(err) => panic!("{err}"),
        }
    }

    /// Typed request that reports any failure as `None`.
    ///
    /// A failed nested build is not propagated; the requesting provider
    /// decides whether it can do without the service.
    pub fn try_get<R: Send + Sync + 'static>(&mut self, name: &str) -> Option<Service<R>> {
        self.get(name).ok()
    }

    fn record_edge(&mut self, name: &str) {
        let dedupe = self.options.dedupe_edges;
        if let Some(current) = self.entries.get_mut(self.current) {
            if dedupe && current.dependencies.iter().any(|dep| dep == name) {
                return;
            }
            trace!("{} -> {}", self.current, name);
            current.dependencies.push(name.to_string());
        }
    }
}

/// Run the provider for `name` unless it has already started.
///
/// The entry is marked `Building` before its provider runs so that cyclic
/// requests get the pending slot instead of recursing. On failure the entry
/// goes back to `Unbuilt` and the edges recorded by the failed attempt are
/// dropped.
pub(crate) fn build_entry<C>(
    entries: &mut HashMap<String, Entry<C>>,
    context: &C,
    name: &str,
    options: BuildOptions,
) -> Result<(), WeaveError> {
    let (factory, recorded) = {
        let entry = entries.get_mut(name).ok_or_else(|| WeaveError::not_found(name))?;
        if entry.state != BuildState::Unbuilt {
            return Ok(());
        }
        let Some(factory) = entry.factory.clone() else {
            return Err(WeaveError::PreconditionViolation {
                operation: "build",
                reason: format!("provider for service [{name}] was discarded by compact()"),
            });
        };
        entry.state = BuildState::Building;
        (factory, entry.dependencies.len())
    };

    trace!("Building service [{}]", name);

    let result = {
        let mut resolver = Resolver {
            entries: &mut *entries,
            context,
            current: name,
            options,
        };
        factory(context, &mut resolver)
    };

    let entry = entries.get_mut(name).ok_or_else(|| WeaveError::not_found(name))?;
    match result {
        Ok(()) => {
            entry.state = BuildState::Built;
            debug!("Built service [{}] ({} dependencies)", name, entry.dependencies.len().saturating_sub(recorded));
            Ok(())
        }
        Err(err) => {
            entry.state = BuildState::Unbuilt;
            entry.dependencies.truncate(recorded);
            let err = match err.downcast::<WeaveError>() {
                Ok(weave_error) => weave_error,
                Err(other) => WeaveError::build_failed(name, &other),
            };
            warn!("Rolled back service [{}]: {}", name, err);
            Err(err)
        }
    }
}
