//! # Error Handling
//!
//! Every fallible operation in the photobooth library returns [`BoothResult`].
//! The error type carries the failure category plus an [`ErrorContext`] with
//! operation name, free-form context and recovery hints.
//!
//! ## Taxonomy
//!
//! The outpainting core raises three kinds of failure:
//!
//! - `InvalidGeometry`: source not square or target width unusable. Raised
//!   before any provider request is made.
//! - `Provider`: a fill, generation or chat request came back unsuccessful
//!   or without the expected payload.
//! - `Decode`: returned bytes are not a decodable image. Callers treat this
//!   the same as a provider failure.
//!
//! The remaining variants cover the ambient concerns (configuration, prompt
//! validation, transport, timeouts, file output).
//!
//! ## Classification
//!
//! - `Retryable`: whether a caller could reasonably try again. The library
//!   itself never retries.
//! - `HasSeverity` / `HasRecoverySuggestion`: presentation hints for the UI layer.
//!
//! ## Usage
//!
//! ```rust
//! use photobooth::error::{BoothError, Retryable};
//!
//! let error = BoothError::provider("openai", "fill_left", Some(503), "service unavailable")
//!     .with_context("extending 1024px background to 1820px");
//!
//! assert_eq!(error.category(), "provider");
//! assert!(error.is_retryable());
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

use booth_geometry::GeometryError;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational errors
    Info,
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that fail the current request
    Error,
    /// Errors that need the user to change something before anything works
    Critical,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Whether this error was explicitly marked retryable
    pub retryable: bool,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            retryable: false,
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }
}

/// Base error type for the photobooth library
#[derive(Debug)]
pub enum BoothError {
    /// Source or target dimensions cannot be outpainted
    InvalidGeometry {
        operation: String,
        source: GeometryError,
        context: ErrorContext,
    },
    /// A provider request returned non-success or a malformed payload
    Provider {
        provider: String,
        operation: String,
        status: Option<u16>,
        reason: String,
        context: ErrorContext,
    },
    /// Bytes could not be decoded as an image (or as base64)
    Decode {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// User input validation errors
    Validation {
        field: String,
        constraint: String,
        value: String,
        context: ErrorContext,
    },
    /// Transport-level failures talking to a provider
    Network {
        operation: String,
        address: Option<String>,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Timeout errors
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// External library errors
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl BoothError {
    /// Create a geometry error
    pub fn invalid_geometry(operation: impl Into<String>, source: GeometryError) -> Self {
        Self::InvalidGeometry {
            operation: operation.into(),
            source,
            context: ErrorContext::new().with_recovery_suggestion(
                "Use a square source image and a target width between the source width and three times it",
            ),
        }
    }

    /// Create a provider error
    pub fn provider(
        provider: impl Into<String>,
        operation: impl Into<String>,
        status: Option<u16>,
        reason: impl Into<String>,
    ) -> Self {
        let reason = reason.into();
        let mut context = ErrorContext::new();
        if status == Some(401) {
            context = context
                .with_severity(ErrorSeverity::Critical)
                .with_recovery_suggestion("Check the configured API key");
        } else if is_safety_message(&reason) {
            context = context
                .with_severity(ErrorSeverity::Warning)
                .with_recovery_suggestion("The provider's safety system rejected the prompt; try a different prompt");
        }
        Self::Provider {
            provider: provider.into(),
            operation: operation.into(),
            status,
            reason,
            context,
        }
    }

    /// Create a decode error
    pub fn decode(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create a validation error
    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a network error
    pub fn network(operation: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            address: None,
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Attach the file path an I/O error refers to
    pub fn with_path(mut self, new_path: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(new_path.into());
        }
        self
    }

    /// Attach the remote address a network error refers to
    pub fn with_address(mut self, new_address: impl Into<String>) -> Self {
        if let Self::Network { address, .. } = &mut self {
            *address = Some(new_address.into());
        }
        self
    }

    /// Attach the underlying cause of a network error
    pub fn with_source(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        if let Self::Network { source, .. } = &mut self {
            *source = Some(Box::new(cause));
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Mark as retryable
    pub fn retryable(mut self) -> Self {
        self.context_mut().retryable = true;
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::InvalidGeometry { context, .. } => context,
            Self::Provider { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::InvalidGeometry { context, .. } => context,
            Self::Provider { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidGeometry { .. } => "invalid_geometry",
            Self::Provider { .. } => "provider",
            Self::Decode { .. } => "decode",
            Self::Config { .. } => "config",
            Self::Validation { .. } => "validation",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }

    /// True for failures of the provider round trip: non-success responses,
    /// malformed payloads and undecodable images alike.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Decode { .. })
    }

    /// True when the provider refused the prompt through its safety system.
    pub fn is_content_rejection(&self) -> bool {
        matches!(self, Self::Provider { reason, .. } if is_safety_message(reason))
    }
}

fn is_safety_message(reason: &str) -> bool {
    reason.contains("safety system")
}

impl fmt::Display for BoothError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoothError::InvalidGeometry {
                operation, source, ..
            } => {
                write!(f, "Invalid geometry for {}: {}", operation, source)
            }
            BoothError::Provider {
                provider,
                operation,
                status,
                reason,
                ..
            } => {
                if let Some(status) = status {
                    write!(
                        f,
                        "{} request '{}' failed (HTTP {}): {}",
                        provider, operation, status, reason
                    )
                } else {
                    write!(f, "{} request '{}' failed: {}", provider, operation, reason)
                }
            }
            BoothError::Decode {
                operation, reason, ..
            } => {
                write!(f, "Failed to decode image during {}: {}", operation, reason)
            }
            BoothError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            BoothError::Validation {
                field,
                constraint,
                value,
                ..
            } => {
                if value.is_empty() {
                    write!(f, "Invalid {}: {}", field, constraint)
                } else {
                    write!(f, "Invalid {} '{}': {}", field, value, constraint)
                }
            }
            BoothError::Network {
                operation,
                address,
                source,
                ..
            } => {
                write!(f, "Network error during {}", operation)?;
                if let Some(address) = address {
                    write!(f, " ({})", address)?;
                }
                if let Some(source) = source {
                    write!(f, ": {}", source)?;
                }
                Ok(())
            }
            BoothError::Timeout {
                operation,
                duration_ms,
                ..
            } => {
                write!(f, "{} timed out after {}ms", operation, duration_ms)
            }
            BoothError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(f, "I/O error during {} on {}: {}", operation, path, source)
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            BoothError::External {
                library, source, ..
            } => {
                write!(f, "{} error: {}", library, source)
            }
        }
    }
}

impl StdError for BoothError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidGeometry { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            Self::Network {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type BoothResult<T> = Result<T, BoothError>;

/// Trait for errors that can be retried
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;

    /// Get the recommended retry delay in milliseconds
    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }
}

impl Retryable for BoothError {
    fn is_retryable(&self) -> bool {
        self.context().retryable
            || match self {
                Self::Timeout { .. } | Self::Network { .. } => true,
                Self::Provider {
                    status: Some(status),
                    ..
                } => *status == 429 || *status >= 500,
                _ => false,
            }
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::Timeout { .. } => Some(1000),
            Self::Network { .. } => Some(2000),
            Self::Provider {
                status: Some(429), ..
            } => Some(20_000),
            Self::Provider { .. } if self.is_retryable() => Some(5000),
            _ => None,
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for BoothError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for BoothError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

impl From<std::io::Error> for BoothError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for BoothError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error)
    }
}

impl From<image::ImageError> for BoothError {
    fn from(error: image::ImageError) -> Self {
        Self::decode("image", error.to_string())
    }
}

impl From<base64::DecodeError> for BoothError {
    fn from(error: base64::DecodeError) -> Self {
        Self::decode("base64", error.to_string())
    }
}

impl From<GeometryError> for BoothError {
    fn from(error: GeometryError) -> Self {
        Self::invalid_geometry("outpaint", error)
    }
}
