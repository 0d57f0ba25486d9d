//! The service container and its build engine.
//!
//! A [`Container`] holds named providers. Nothing runs at registration time:
//! each provider only receives an empty [`Service`] slot. [`Container::build`]
//! then runs every provider once, depth first. A provider asks the
//! [`Resolver`] it is given for the services it needs, which builds them first
//! and records the dependency edge.
//!
//! # Cycles
//!
//! A provider that requests a service whose own provider is still running gets
//! that service's slot while it is still empty. The build does not recurse and
//! does not fail. The slot fills in as soon as the other provider returns, so
//! a handle captured this way is complete once `build()` has returned, but it
//! must not be dereferenced inside the provider that captured it.
//!
//! # Examples
//!
//! ```rust
//! use weave::container::{Container, Service};
//!
//! struct Settings {
//!     url: String,
//! }
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct Users {
//!     db: Service<Database>,
//! }
//!
//! let container = Container::with_context(Settings {
//!     url: "postgres://localhost".to_string(),
//! });
//! container.provide("database", |settings: &Settings, _| {
//!     Ok(Database {
//!         url: settings.url.clone(),
//!     })
//! });
//! container.provide("users", |_, resolver| {
//!     Ok(Users {
//!         db: resolver.get::<Database>("database")?,
//!     })
//! });
//!
//! container.build()?;
//! let users = container.must_make::<Users>("users");
//! assert_eq!(users.db.url, "postgres://localhost");
//! # Ok::<(), weave::core::WeaveError>(())
//! ```

mod entry;
mod resolver;
mod service;


use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};
use std::thread::{self, ThreadId};

use tracing::{debug, info, trace, warn};

pub use entry::BuildState;
pub use resolver::Resolver;
pub use service::{Service, ServiceRef};

use entry::{Entry, Factory};
use resolver::{BuildOptions, build_entry};

use crate::config::WeaveConfig;
use crate::core::WeaveError;
use crate::graph::DependencyGraph;
use crate::registry::ServiceRegistry;
use crate::render;

type ReadyCallback = Box<dyn FnOnce() + Send>;

struct Inner<C> {
    context: Option<Arc<C>>,
    entries: HashMap<String, Entry<C>>,
    built: bool,
    config: WeaveConfig,
}

/// Named providers plus the state of their last build.
///
/// All methods take `&self`; the container can be shared behind an `Arc`.
/// Providers must request dependencies through their [`Resolver`], never
/// through the container itself, because `build()` holds the container lock
/// while providers run. A provider that calls back into its own container
/// gets [`WeaveError::PreconditionViolation`] from the fallible methods and
/// a panic from the others.
pub struct Container<C> {
    inner: RwLock<Inner<C>>,
    ready: Mutex<Vec<ReadyCallback>>,
    /// Thread currently running providers, if any.
    builder: Mutex<Option<ThreadId>>,
}

/// Marks the current thread as the builder until dropped, including on panic.
struct BuilderMark<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> BuilderMark<'a> {
    fn new(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Self(slot)
    }
}

impl Drop for BuilderMark<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

const REENTRY_REASON: &str = "a provider called its own container; use the Resolver inside providers";

/// Wrap a typed provider so it fills `service` when it succeeds.
fn erase<C, R, F>(service: Service<R>, factory: F) -> Factory<C>
where
    C: 'static,
    R: Send + Sync + 'static,
    F: Fn(&C, &mut Resolver<'_, C>) -> anyhow::Result<R> + Send + Sync + 'static,
{
    Arc::new(move |context: &C, resolver: &mut Resolver<'_, C>| {
        let value = factory(context, resolver)?;
        service
            .populate(value)
            .map_err(|_| anyhow::anyhow!("service slot was populated more than once"))
    })
}

fn precondition(operation: &'static str, reason: &str) -> WeaveError {
    WeaveError::PreconditionViolation {
        operation,
        reason: reason.to_string(),
    }
}

impl<C: Send + Sync + 'static> Container<C> {
    /// Create an empty container with default settings and no context.
    pub fn new() -> Self {
        Self::with_config(WeaveConfig::default())
    }

    /// Create an empty container with the given settings.
    pub fn with_config(config: WeaveConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                context: None,
                entries: HashMap::new(),
                built: false,
                config,
            }),
            ready: Mutex::new(Vec::new()),
            builder: Mutex::new(None),
        }
    }

    /// Create an empty container that builds with `context`.
    pub fn with_context(context: C) -> Self {
        let container = Self::new();
        container.set_context(context);
        container
    }

    /// Set the context handed to every provider.
    pub fn set_context(&self, context: C) {
        self.set_shared_context(Arc::new(context));
    }

    /// Set a context that is also owned elsewhere.
    pub fn set_shared_context(&self, context: Arc<C>) {
        self.write().context = Some(context);
    }

    /// Current settings.
    pub fn config(&self) -> WeaveConfig {
        self.read().config.clone()
    }

    /// Register `factory` as the provider for `name`.
    ///
    /// A previous provider with the same name is replaced, together with its
    /// slot and recorded edges. Any registration marks the container as not
    /// built, so the next `build()` runs the new provider.
    pub fn provide<R, F>(&self, name: impl Into<String>, factory: F)
    where
        R: Send + Sync + 'static,
        F: Fn(&C, &mut Resolver<'_, C>) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let name = name.into();
        let service = Service::<R>::placeholder();
        let slot = ServiceRef::new(&name, &service);
        let entry = Entry::new(slot, erase(service, factory));

        let mut inner = self.write();
        if inner.entries.insert(name.clone(), entry).is_some() {
            debug!("Replaced provider for service [{}]", name);
        } else {
            trace!("Registered provider for service [{}]", name);
        }
        inner.built = false;
    }

    /// Queue `callback` to run after the next successful build.
    ///
    /// Callbacks run in the order they were queued, once each, after the
    /// container lock is released. A callback queued after a build has
    /// finished waits for the next build that actually runs providers.
    pub fn ready<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.ready_callbacks().push(Box::new(callback));
    }

    /// Run every provider that has not been built yet.
    ///
    /// Does nothing if the container is already built. Services are visited
    /// in name order; each one builds its dependencies on demand.
    ///
    /// # Errors
    ///
    /// - [`WeaveError::PreconditionViolation`] if no context has been set, or
    ///   if a provider was discarded by [`compact`](Self::compact)
    /// - [`WeaveError::NotFound`] if a provider requests an unregistered name
    /// - [`WeaveError::BuildFailed`] if a provider returns an error
    ///
    /// The first failure stops the build. Services built before it stay
    /// built, the failing ones are rolled back, and the container stays
    /// unbuilt so `build()` can be called again.
    pub fn build(&self) -> Result<(), WeaveError> {
        self.check_reentry("build")?;
        let callbacks = {
            let mut guard = self.write();
            let inner = &mut *guard;
            if inner.built {
                trace!("Container already built");
                return Ok(());
            }

            let Some(context) = inner.context.clone() else {
                return Err(precondition("build", "no context has been set"));
            };

            // A provider that panicked leaves its entry mid-build
            for (name, entry) in &mut inner.entries {
                if entry.state == BuildState::Building {
                    warn!("Resetting service [{}] left over from an interrupted build", name);
                    entry.reset();
                }
            }

            let options = BuildOptions {
                dedupe_edges: inner.config.dedupe_edges,
            };
            let mut names: Vec<String> = inner.entries.keys().cloned().collect();
            names.sort();

            debug!("Building {} services", names.len());
            let mark = BuilderMark::new(&self.builder);
            for name in &names {
                build_entry(&mut inner.entries, &*context, name, options)?;
            }
            drop(mark);

            inner.built = true;
            debug!("Build complete");
            std::mem::take(&mut *self.ready_callbacks())
        };

        if !callbacks.is_empty() {
            debug!("Running {} ready callbacks", callbacks.len());
        }
        for callback in callbacks {
            callback();
        }
        Ok(())
    }

    /// Whether the last `build()` completed and nothing was registered since.
    pub fn is_built(&self) -> bool {
        self.read().built
    }

    /// Build state of `name`, or `None` if it is not registered.
    pub fn build_state(&self, name: &str) -> Option<BuildState> {
        self.read().entries.get(name).map(|entry| entry.state)
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Whether no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.read().entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up a service slot without building anything.
    ///
    /// A registered service that has not been built yet returns its empty
    /// slot, unless strict lookups are enabled.
    ///
    /// # Errors
    ///
    /// - [`WeaveError::NotFound`] if `name` is not registered
    /// - [`WeaveError::NotBuilt`] under strict lookups, if `name` is not built
    /// - [`WeaveError::PreconditionViolation`] if called from inside a provider
    pub fn get_service(&self, name: &str) -> Result<ServiceRef, WeaveError> {
        self.check_reentry("get_service")?;
        let inner = self.read();
        let entry = inner.entries.get(name).ok_or_else(|| WeaveError::not_found(name))?;
        if inner.config.strict_lookups && entry.state != BuildState::Built {
            return Err(WeaveError::NotBuilt {
                service: name.to_string(),
            });
        }
        Ok(entry.slot.clone())
    }

    /// Typed lookup.
    ///
    /// # Errors
    ///
    /// As [`get_service`](Self::get_service), plus [`WeaveError::TypeMismatch`].
    pub fn make<R: Send + Sync + 'static>(&self, name: &str) -> Result<Service<R>, WeaveError> {
        self.get_service(name)?.downcast::<R>()
    }

    /// Typed lookup that panics on failure.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not registered or was registered with another type.
    #[track_caller]
    pub fn must_make<R: Send + Sync + 'static>(&self, name: &str) -> Service<R> {
        match self.make(name) {
            Ok(service) => service,
            Err(err) => panic!("{err}"),
        }
    }

    /// Typed lookup that reports failure as `None`.
    pub fn try_make<R: Send + Sync + 'static>(&self, name: &str) -> Option<Service<R>> {
        self.make(name).ok()
    }

    /// Snapshot of the edges recorded so far.
    ///
    /// Only complete after `build()`, and empty after `compact()`.
    pub fn dependency_graph(&self) -> DependencyGraph {
        let inner = self.read();
        DependencyGraph::from_edges(
            inner
                .entries
                .iter()
                .map(|(name, entry)| (name.as_str(), entry.dependencies.iter().map(String::as_str))),
        )
    }

    /// The first dependency cycle found, as a closed path.
    pub fn circular_dependency(&self) -> Option<Vec<String>> {
        self.dependency_graph().detect_cycle()
    }

    /// Whether the recorded edges contain a cycle.
    pub fn has_circular_dependency(&self) -> bool {
        self.circular_dependency().is_some()
    }

    /// Every distinct cycle, each starting at its smallest name.
    pub fn all_circular_dependencies(&self) -> Vec<Vec<String>> {
        self.dependency_graph().all_cycles()
    }

    /// Plain-text report of the dependency graph.
    pub fn print_dependency_graph(&self) -> String {
        render::text_report(&self.dependency_graph())
    }

    /// Graphviz rendering of the dependency graph.
    pub fn generate_dot_graph(&self) -> String {
        let options = self.read().config.render.clone();
        render::dot_graph(&self.dependency_graph(), &options)
    }

    /// Copy every built service into a standalone registry.
    ///
    /// The registry shares the service slots but nothing else, so it is not
    /// affected by a later `compact()` or by dropping the container.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::PreconditionViolation`] if the container is not built.
    pub fn try_extract(&self) -> Result<ServiceRegistry, WeaveError> {
        self.check_reentry("extract")?;
        let inner = self.read();
        if !inner.built {
            return Err(precondition("extract", "build() has not completed"));
        }

        let registry = ServiceRegistry::new();
        for (name, entry) in &inner.entries {
            if entry.state == BuildState::Built {
                registry.set(name.clone(), entry.slot.clone());
            }
        }
        info!("Extracted {} services", registry.len());
        Ok(registry)
    }

    /// Like [`try_extract`](Self::try_extract), but panics if not built.
    ///
    /// # Panics
    ///
    /// Panics if `build()` has not completed.
    #[track_caller]
    pub fn extract(&self) -> ServiceRegistry {
        match self.try_extract() {
            Ok(registry) => registry,
            Err(err) => panic!("{err}"),
        }
    }

    /// Drop providers, recorded edges, queued callbacks and the context.
    ///
    /// Built services stay available. The dependency graph is empty
    /// afterwards, and providers cannot run again.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::PreconditionViolation`] if the container is not built.
    pub fn try_compact(&self) -> Result<(), WeaveError> {
        self.check_reentry("compact")?;
        let mut guard = self.write();
        let inner = &mut *guard;
        if !inner.built {
            return Err(precondition("compact", "build() has not completed"));
        }

        inner.context = None;
        self.ready_callbacks().clear();
        for entry in inner.entries.values_mut() {
            entry.compact();
        }
        info!("Compacted container with {} services", inner.entries.len());
        Ok(())
    }

    /// Like [`try_compact`](Self::try_compact), but panics if not built.
    ///
    /// # Panics
    ///
    /// Panics if `build()` has not completed.
    #[track_caller]
    pub fn compact(&self) {
        if let Err(err) = self.try_compact() {
            panic!("{err}");
        }
    }

    fn on_build_thread(&self) -> bool {
        *self.builder.lock().unwrap_or_else(PoisonError::into_inner) == Some(thread::current().id())
    }

    fn check_reentry(&self, operation: &'static str) -> Result<(), WeaveError> {
        if self.on_build_thread() {
            return Err(precondition(operation, REENTRY_REASON));
        }
        Ok(())
    }

    // The build thread already holds the write lock; waiting here would hang.
    #[track_caller]
    fn assert_not_reentrant(&self) {
        if self.on_build_thread() {
            panic!("{}", precondition("access the container", REENTRY_REASON));
        }
    }

    #[track_caller]
    fn read(&self) -> RwLockReadGuard<'_, Inner<C>> {
        self.assert_not_reentrant();
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[track_caller]
    fn write(&self) -> RwLockWriteGuard<'_, Inner<C>> {
        self.assert_not_reentrant();
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ready_callbacks(&self) -> MutexGuard<'_, Vec<ReadyCallback>> {
        self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Send + Sync + 'static> Default for Container<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Container<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = match self.inner.try_read() {
            Ok(inner) => inner,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return f.debug_struct("Container").field("state", &"<building>").finish_non_exhaustive();
            }
        };
        let mut names: Vec<&String> = inner.entries.keys().collect();
        names.sort();
        f.debug_struct("Container")
            .field("services", &names)
            .field("built", &inner.built)
            .field("has_context", &inner.context.is_some())
            .finish()
    }
}
