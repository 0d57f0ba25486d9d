//! Output slots handed out by the container.
//!
//! Every registered provider gets its slot at registration time, before the
//! provider ever runs. Dependents that request a service receive a clone of
//! that slot, and the build engine fills it in place once the provider returns.
//! This is what lets two providers hold references to each other: whichever
//! one is requested mid-construction hands out its still-empty slot, and the
//! slot becomes readable as soon as its own provider finishes.

use std::any::{Any, type_name};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use crate::core::WeaveError;

/// Shared handle to a service instance.
///
/// Cloning is cheap and every clone observes the same slot. A handle obtained
/// while its provider was still running (a cyclic reference) stays empty until
/// that provider returns, so it must not be dereferenced from inside the
/// requesting provider.
pub struct Service<R> {
    cell: Arc<OnceLock<R>>,
}

impl<R> Service<R> {
    pub(crate) fn placeholder() -> Self {
        Self {
            cell: Arc::new(OnceLock::new()),
        }
    }

    /// The instance, or `None` if its provider has not completed.
    pub fn get(&self) -> Option<&R> {
        self.cell.get()
    }

    /// Whether the provider for this slot has completed.
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Whether two handles refer to the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Store the built instance. Fails if the slot was already filled.
    pub(crate) fn populate(&self, value: R) -> Result<(), R> {
        self.cell.set(value)
    }
}

impl<R> Clone for Service<R> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<R> Deref for Service<R> {
    type Target = R;

    /// # Panics
    ///
    /// Panics if the slot has not been populated yet.
    fn deref(&self) -> &R {
        match self.cell.get() {
            Some(value) => value,
            None => panic!(
                "service of type {} accessed before its provider completed; \
                 defer access to cyclic dependencies until build() returns",
                type_name::<R>()
            ),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Service<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Service").field(value).finish(),
            None => f.write_str("Service(<pending>)"),
        }
    }
}

/// Type-erased slot, as stored by the container and the extracted registry.
#[derive(Clone)]
pub struct ServiceRef {
    name: Arc<str>,
    type_name: &'static str,
    slot: Arc<dyn Any + Send + Sync>,
}

impl ServiceRef {
    pub(crate) fn new<R: Send + Sync + 'static>(name: &str, service: &Service<R>) -> Self {
        Self {
            name: Arc::from(name),
            type_name: type_name::<R>(),
            slot: service.cell.clone(),
        }
    }

    /// Name the slot was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the value the provider produces.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the typed handle.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::TypeMismatch`] if the slot holds another type.
    pub fn downcast<R: Send + Sync + 'static>(&self) -> Result<Service<R>, WeaveError> {
        Arc::clone(&self.slot)
            .downcast::<OnceLock<R>>()
            .map(|cell| Service {
                cell,
            })
            .map_err(|_| WeaveError::TypeMismatch {
                service: self.name.to_string(),
                expected: type_name::<R>(),
                found: self.type_name,
            })
    }

    /// Whether both refs point at the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRef").field("name", &self.name).field("type", &self.type_name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_filled_in_place() {
        let service: Service<String> = Service::placeholder();
        let early = service.clone();
        assert!(!early.is_ready());
        assert!(early.get().is_none());

        service.populate("ready".to_string()).unwrap();
        assert!(early.is_ready());
        assert_eq!(&*early, "ready");
        assert!(early.ptr_eq(&service));
    }

    #[test]
    fn test_populate_twice_fails() {
        let service: Service<u8> = Service::placeholder();
        assert!(service.populate(1).is_ok());
        assert_eq!(service.populate(2), Err(2));
        assert_eq!(*service, 1);
    }

    #[test]
    #[should_panic(expected = "accessed before its provider completed")]
    fn test_deref_pending_panics() {
        let service: Service<u8> = Service::placeholder();
        let _ = *service;
    }

    #[test]
    fn test_downcast_matches_and_mismatches() {
        let service: Service<u32> = Service::placeholder();
        let erased = ServiceRef::new("counter", &service);
        assert_eq!(erased.name(), "counter");

        let typed = erased.downcast::<u32>().unwrap();
        assert!(typed.ptr_eq(&service));

        match erased.downcast::<String>() {
            Err(WeaveError::TypeMismatch {
                service,
                found,
                ..
            }) => {
                assert_eq!(service, "counter");
                assert_eq!(found, "u32");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_output() {
        let service: Service<u8> = Service::placeholder();
        assert_eq!(format!("{service:?}"), "Service(<pending>)");
        service.populate(7).unwrap();
        assert_eq!(format!("{service:?}"), "Service(7)");
    }
}
