//! Error types for clock-fingerprint monitoring.
//!
//! All errors implement the `std::error::Error` trait and carry enough context
//! to tell an operator what to fix.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: the CAN interface is missing or down at setup
//! - **I/O Errors**: a read failure while monitoring (fatal to the loop)
//! - **Singular Matrix Errors**: the filter was given parameters that make the
//!   innovation variance non-positive
//! - **Configuration Errors**: invalid or unparsable configuration values
//! - **Platform Errors**: live capture requested on a non-Linux host
//! - **Task Errors**: the spawned monitor task panicked or was aborted
//!
//! A frame without a kernel timestamp is not an error: the monitor skips it.
//!
//! ## Recovery
//!
//! The monitoring core is fail-fast and never retries. Callers that want to
//! restart a session can consult [`SentinelError::is_retryable`]:
//!
//! ```rust
//! use sentinel::SentinelError;
//!
//! let error = SentinelError::connection_failed("vcan0", "no such device");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type alias for sentinel operations.
pub type Result<T, E = SentinelError> = std::result::Result<T, E>;

/// Main error type for sentinel operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SentinelError {
    #[error("Failed to open CAN interface '{interface}': {reason}")]
    Connection {
        interface: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error while {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Innovation variance is not positive ({innovation_variance:e}); check measurement_noise")]
    SingularMatrix { innovation_variance: f64 },

    #[error("Invalid configuration for '{field}': {reason}")]
    Config { field: String, reason: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },

    #[error("Monitor task failed: {reason}")]
    Task { reason: String },
}

impl SentinelError {
    /// Returns whether restarting the session may succeed without a config change.
    pub fn is_retryable(&self) -> bool {
        match self {
            SentinelError::Connection { .. } => true,
            SentinelError::Io { .. } => true,
            SentinelError::SingularMatrix { .. } => false,
            SentinelError::Config { .. } => false,
            SentinelError::Parse { .. } => false,
            SentinelError::UnsupportedPlatform { .. } => false,
            SentinelError::Task { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SentinelError::Connection { .. } => vec![
                "Load the virtual CAN module: sudo modprobe vcan",
                "Create the interface: sudo ip link add dev vcan0 type vcan",
                "Bring the interface up: sudo ip link set up vcan0",
                "Check permissions for raw CAN sockets",
            ],
            SentinelError::Io { .. } => vec![
                "Check the interface is still up",
                "Inspect kernel logs for CAN driver errors",
                "Restart the monitoring session",
            ],
            SentinelError::SingularMatrix { .. } => vec![
                "Set measurement_noise to a positive value",
                "Use the square of the receiver jitter standard deviation",
            ],
            SentinelError::Config { .. } => vec![
                "Check the configuration value ranges",
                "Remove the field to fall back to its default",
            ],
            SentinelError::Parse { .. } => vec![
                "Check the configuration file is valid YAML",
                "Verify field names and value types",
            ],
            SentinelError::UnsupportedPlatform { .. } => vec![
                "Run live capture on Linux with SocketCAN",
                "Use ReplaySource for offline evaluation on other platforms",
            ],
            SentinelError::Task { .. } => vec![
                "Check the logs for a panic in the monitor task",
                "Restart the monitoring session",
            ],
        }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(interface: impl Into<String>, reason: impl Into<String>) -> Self {
        SentinelError::Connection { interface: interface.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        interface: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        SentinelError::Connection {
            interface: interface.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Helper constructor for I/O errors with context.
    pub fn io_error(context: impl Into<String>, source: std::io::Error) -> Self {
        SentinelError::Io { context: context.into(), source }
    }

    /// Helper constructor for configuration errors.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SentinelError::Config { field: field.into(), reason: reason.into() }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        SentinelError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}

impl From<serde_yaml_ng::Error> for SentinelError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        SentinelError::Parse { context: "configuration YAML".to_string(), details: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_carry_their_context(
                interface in "[a-z]{1,8}[0-9]",
                reason in ".*",
                field in "\\w+",
                variance in -1.0f64..0.0f64,
            ) {
                let connection_msg = SentinelError::connection_failed(interface.clone(), reason.clone()).to_string();
                prop_assert!(connection_msg.contains(&interface));
                prop_assert!(connection_msg.contains(&reason));

                let config_msg = SentinelError::config_invalid(field.clone(), "must be positive").to_string();
                prop_assert!(config_msg.contains(&field));

                let singular_msg = SentinelError::SingularMatrix { innovation_variance: variance }.to_string();
                prop_assert!(!singular_msg.is_empty());
            }

            #[test]
            fn io_error_keeps_caller_context_and_source(context in "[a-z ]{1,40}", message in ".*") {
                let err = SentinelError::io_error(context.clone(), std::io::Error::other(message.clone()));
                prop_assert!(err.to_string().contains(&context));
                match err {
                    SentinelError::Io { context: kept, source } => {
                        prop_assert_eq!(kept, context);
                        prop_assert_eq!(source.to_string(), message);
                    }
                    _ => prop_assert!(false, "Expected Io error from io_error"),
                }
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<SentinelError>();

        let error = SentinelError::connection_failed("vcan0", "test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        assert!(SentinelError::connection_failed("vcan0", "down").is_retryable());
        assert!(SentinelError::io_error("receiving", std::io::Error::other("boom")).is_retryable());
        assert!(!SentinelError::SingularMatrix { innovation_variance: 0.0 }.is_retryable());
        assert!(!SentinelError::config_invalid("measurement_noise", "zero").is_retryable());
    }

    #[test]
    fn every_variant_has_suggestions() {
        let errors = [
            SentinelError::connection_failed("vcan0", "down"),
            SentinelError::io_error("receiving", std::io::Error::other("boom")),
            SentinelError::SingularMatrix { innovation_variance: -1.0 },
            SentinelError::config_invalid("nominal_interval", "zero"),
            SentinelError::Parse { context: "yaml".into(), details: "bad".into() },
            SentinelError::unsupported_platform("Live capture", "Linux"),
            SentinelError::Task { reason: "panicked".into() },
        ];

        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty(), "no suggestions for {error}");
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn connection_source_is_chained() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "No such device");
        let error = SentinelError::connection_failed_with_source("can9", "bind failed", Box::new(source));
        let chained = std::error::Error::source(&error).expect("source should be preserved");
        assert!(chained.to_string().contains("No such device"));
    }
}
