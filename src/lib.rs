//! weave - a lazy, cycle-tolerant service container
//!
//! Register named providers, build them once, and inspect the dependency graph
//! the build recorded along the way.
//!
//! # Architecture Overview
//!
//! - Providers are registered by name and run only when [`Container::build`]
//!   is called. Each provider requests its dependencies through a
//!   [`Resolver`], which builds them first and records the edge.
//! - Every service owns a slot allocated at registration. Dependents hold
//!   clones of that slot, which the engine fills in place, so two services can
//!   refer to each other.
//! - The recorded edges form a [`DependencyGraph`] that can be checked for
//!   cycles, ordered, and rendered as text or Graphviz.
//! - After a build, services can be extracted into a standalone
//!   [`ServiceRegistry`], and the container can drop its build-time data.
//!
//! # Core Modules
//!
//! - [`container`] - registration, the build engine, typed accessors
//! - [`graph`] - adjacency snapshot, cycle detection and enumeration
//! - [`registry`] - concurrent name to value store used for extraction
//! - [`render`] - text report and DOT output
//!
//! ## Supporting Modules
//!
//! - [`core`] - error types and user-facing error contexts
//! - [`config`] - container and rendering settings (TOML)
//! - [`cli`] - the `weave` binary
//! - [`constants`] - shared defaults
//!
//! # Example
//!
//! ```rust
//! use weave::container::{Container, Service};
//!
//! struct Ping {
//!     pong: Service<Pong>,
//! }
//!
//! struct Pong {
//!     ping: Service<Ping>,
//! }
//!
//! let container = Container::with_context(());
//! container.provide("ping", |_, resolver| {
//!     Ok(Ping {
//!         pong: resolver.get("pong")?,
//!     })
//! });
//! container.provide("pong", |_, resolver| {
//!     Ok(Pong {
//!         ping: resolver.get("ping")?,
//!     })
//! });
//!
//! container.build()?;
//! assert!(container.has_circular_dependency());
//!
//! let ping = container.must_make::<Ping>("ping");
//! assert!(ping.pong.ping.ptr_eq(&ping));
//! # Ok::<(), weave::core::WeaveError>(())
//! ```
//!
//! [`Container::build`]: container::Container::build
//! [`Resolver`]: container::Resolver
//! [`DependencyGraph`]: graph::DependencyGraph
//! [`ServiceRegistry`]: registry::ServiceRegistry

// Engine
pub mod container;
pub mod graph;
pub mod registry;
pub mod render;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
