//! Per-service bookkeeping.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::resolver::Resolver;
use super::service::ServiceRef;

/// Build state of a registered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    /// Registered, provider not yet run (or rolled back after a failure).
    Unbuilt,
    /// Provider is running. Requests for this service return its pending slot.
    Building,
    /// Provider completed and the slot is populated.
    Built,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbuilt => write!(f, "unbuilt"),
            Self::Building => write!(f, "building"),
            Self::Built => write!(f, "built"),
        }
    }
}

/// Erased provider: runs the user factory and populates the entry's slot.
pub(crate) type Factory<C> =
    Arc<dyn Fn(&C, &mut Resolver<'_, C>) -> anyhow::Result<()> + Send + Sync>;

pub(crate) struct Entry<C> {
    pub(crate) slot: ServiceRef,
    /// Dropped by `compact()`.
    pub(crate) factory: Option<Factory<C>>,
    /// Names requested while this entry was being built, in request order.
    pub(crate) dependencies: Vec<String>,
    pub(crate) state: BuildState,
}

impl<C> Entry<C> {
    pub(crate) fn new(slot: ServiceRef, factory: Factory<C>) -> Self {
        Self {
            slot,
            factory: Some(factory),
            dependencies: Vec::new(),
            state: BuildState::Unbuilt,
        }
    }

    /// Forget a build attempt that never finished.
    pub(crate) fn reset(&mut self) {
        self.state = BuildState::Unbuilt;
        self.dependencies.clear();
    }

    /// Release build-time data. The slot stays.
    pub(crate) fn compact(&mut self) {
        self.factory = None;
        self.dependencies = Vec::new();
    }
}
