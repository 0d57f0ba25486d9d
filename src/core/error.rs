//! Error handling for weave
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`WeaveError`]) for every failure the container can report
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions for the CLI
//!
//! # Error Categories
//!
//! - **Resolution**: [`WeaveError::NotFound`], [`WeaveError::NotBuilt`]
//! - **Construction**: [`WeaveError::BuildFailed`]
//! - **Typed access**: [`WeaveError::TypeMismatch`]
//! - **Lifecycle**: [`WeaveError::PreconditionViolation`]
//! - **Graph analysis**: [`WeaveError::CircularDependency`]
//! - **Configuration**: [`WeaveError::ConfigError`], [`WeaveError::Io`], [`WeaveError::Toml`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use weave::core::{WeaveError, ErrorContext};
//!
//! let context = ErrorContext::new(WeaveError::NotFound { service: "database".to_string() })
//!     .with_suggestion("Register a provider named 'database' before calling build()")
//!     .with_details("Providers may request only services that are registered in the container");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for weave operations.
///
/// `NotFound` and `BuildFailed` abort a whole build pass and always name the
/// service that caused the failure. `TypeMismatch` is produced by the typed
/// accessors, `PreconditionViolation` by lifecycle operations invoked out of order.
#[derive(Error, Debug)]
pub enum WeaveError {
    /// A service name was requested that has no registered provider.
    #[error("service [{service}] not found")]
    NotFound {
        /// The requested service name
        service: String,
    },

    /// A provider returned an error instead of an instance.
    ///
    /// The entry is rolled back to unbuilt and the build pass stops.
    #[error("service [{service}] build failed: {reason}")]
    BuildFailed {
        /// The service whose provider failed
        service: String,
        /// The provider's error, rendered with its cause chain
        reason: String,
    },

    /// A typed accessor found a value of a different type than requested.
    #[error("service [{service}] has type {found}, not {expected}")]
    TypeMismatch {
        /// The service that was looked up
        service: String,
        /// The type the caller asked for
        expected: &'static str,
        /// The type the provider was registered with
        found: &'static str,
    },

    /// A lifecycle operation was invoked in a state that does not allow it.
    #[error("cannot {operation}: {reason}")]
    PreconditionViolation {
        /// The operation that was attempted (e.g. "extract", "compact", "build")
        operation: &'static str,
        /// Why the operation is not allowed right now
        reason: String,
    },

    /// A registered service was looked up before it was built.
    ///
    /// Only reported when strict lookups are enabled in [`crate::config::WeaveConfig`].
    #[error("service [{service}] has not been built yet")]
    NotBuilt {
        /// The unbuilt service
        service: String,
    },

    /// A dependency cycle prevents an operation that needs an acyclic graph.
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency {
        /// The closed cycle path, first element repeated at the end
        cycle: Vec<String>,
    },

    /// Configuration content was invalid.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// I/O error while reading configuration or topology files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl WeaveError {
    /// Create a `NotFound` error for `service`.
    pub fn not_found(service: impl Into<String>) -> Self {
        Self::NotFound {
            service: service.into(),
        }
    }

    /// Create a `BuildFailed` error, rendering `reason` with its full cause chain.
    pub fn build_failed(service: impl Into<String>, reason: &anyhow::Error) -> Self {
        Self::BuildFailed {
            service: service.into(),
            reason: format!("{reason:#}"),
        }
    }

    /// The service this error is about, if any.
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::NotFound {
                service,
            }
            | Self::BuildFailed {
                service,
                ..
            }
            | Self::TypeMismatch {
                service,
                ..
            }
            | Self::NotBuilt {
                service,
            } => Some(service),
            _ => None,
        }
    }
}

/// Error context wrapper that carries a suggestion and details for display.
///
/// Produced by [`user_friendly_error`] and printed by the `weave` binary.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: WeaveError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: WeaveError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr.
    ///
    /// Error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// [`WeaveError`]s get tailored suggestions; I/O and TOML errors get generic
/// file guidance; anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<ErrorContext>() {
        Ok(ctx) => return ctx,
        Err(error) => error,
    };

    let error = match error.downcast::<WeaveError>() {
        Ok(weave_error) => return create_error_context(weave_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::NotFound {
            return ErrorContext::new(WeaveError::ConfigError {
                message: error.to_string(),
            })
            .with_suggestion("Check that the file exists and the path is correct");
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(WeaveError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax. Verify quotes, brackets, and table headers");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(WeaveError::ConfigError {
        message,
    })
}

fn create_error_context(error: WeaveError) -> ErrorContext {
    match &error {
        WeaveError::NotFound {
            service,
        } => {
            let suggestion = format!(
                "Register a provider named '{service}' or fix the name requested by its dependent"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Providers may only request services registered in the same container")
        }
        WeaveError::BuildFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Fix the failing provider; no service instances are available until every provider succeeds")
            .with_details("A failed provider aborts the whole build pass"),
        WeaveError::TypeMismatch {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Request the service with the same type its provider was registered with"),
        WeaveError::PreconditionViolation {
            ..
        } => ErrorContext::new(error).with_suggestion("Call build() successfully before extract() or compact()"),
        WeaveError::NotBuilt {
            ..
        } => ErrorContext::new(error).with_suggestion("Call build() before looking services up"),
        WeaveError::CircularDependency {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Break the cycle by removing one of the listed dependencies")
            .with_details("Cycles are tolerated while building, but some analyses require an acyclic graph"),
        _ => ErrorContext::new(error),
    }
}
