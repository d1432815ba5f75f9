//! Ports and Adapters Infrastructure
//!
//! This module provides the foundational types for the ports-and-adapters
//! pattern used across the integration layer.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Integration Hub                            │
//! │        (agent-scoped routing, import orchestration)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Port Traits                             │
//! │      (CrmAdapter, CredentialStore, ContactRepository)        │
//! │    Defined in domain_crm, depend only on core_kernel         │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!                    │                         │
//!         ┌─────────┴─────────┐     ┌────────┴────────┐
//!         │ Provider Adapter  │     │  Backing Store   │
//!         │ (REST API to one  │     │  (in-memory or   │
//!         │  CRM vendor)      │     │  cache-backed)   │
//!         └───────────────────┘     └──────────────────┘
//! ```
//!
//! All port implementations report failures through the unified `PortError`
//! type, so callers can classify errors (transient vs. configuration vs.
//! not-found) without knowing which adapter produced them.

use std::fmt;
use thiserror::Error;

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across provider adapters and backing
/// stores.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The requested CRM provider is not registered
    ///
    /// This is a configuration or client error, never retried.
    #[error("Unknown CRM: {crm_id}")]
    UnknownProvider { crm_id: String },

    /// Authentication or authorization against the provider failed
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit exceeded for the provider API
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The operation timed out
    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    /// Connection to the provider failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider reported a server-side failure (5xx)
    #[error("Service unavailable: HTTP {status}: {message}")]
    ServiceUnavailable { status: u16, message: String },

    /// The provider rejected the request (non-5xx, non-auth)
    #[error("Provider error: HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    /// A provider payload could not be decoded
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates an UnknownProvider error
    pub fn unknown_provider(crm_id: impl Into<String>) -> Self {
        PortError::UnknownProvider {
            crm_id: crm_id.into(),
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        PortError::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a Timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        PortError::Timeout {
            operation: operation.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Connection error with an underlying cause
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PortError::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        PortError::Serialization {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
        }
    }

    /// Maps an HTTP status code and response body to a port error
    ///
    /// Used by adapters after a non-success response. 404 maps to a generic
    /// NotFound; adapters that can return `None` for missing entities check
    /// the status before calling this.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => PortError::Unauthorized { message },
            404 => PortError::NotFound {
                entity_type: "resource".to_string(),
                id: message,
            },
            408 => PortError::Timeout { operation: message },
            429 => PortError::RateLimited {
                retry_after_secs: 60,
            },
            500..=599 => PortError::ServiceUnavailable { status, message },
            _ => PortError::Provider { status, message },
        }
    }

    /// Returns true if this error indicates a transient failure that may
    /// succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::RateLimited { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if this error is a configuration/client error that
    /// should never be retried
    pub fn is_configuration(&self) -> bool {
        matches!(self, PortError::UnknownProvider { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Contact", "abc-123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Contact"));
        assert!(error.to_string().contains("abc-123"));
    }

    #[test]
    fn test_port_error_transient() {
        let timeout = PortError::timeout("get_contacts");
        assert!(timeout.is_transient());

        let rate_limited = PortError::RateLimited {
            retry_after_secs: 60,
        };
        assert!(rate_limited.is_transient());

        let unknown = PortError::unknown_provider("acmecrm");
        assert!(!unknown.is_transient());
        assert!(unknown.is_configuration());
    }

    #[test]
    fn test_unknown_provider_message() {
        let error = PortError::unknown_provider("unknown-provider");
        assert_eq!(error.to_string(), "Unknown CRM: unknown-provider");
    }

    #[test]
    fn test_from_status_auth() {
        assert!(matches!(
            PortError::from_status(401, "bad token"),
            PortError::Unauthorized { .. }
        ));
        assert!(matches!(
            PortError::from_status(403, "forbidden"),
            PortError::Unauthorized { .. }
        ));
    }

    #[test]
    fn test_from_status_server_errors_are_transient() {
        let error = PortError::from_status(503, "upstream down");
        assert!(error.is_transient());
        assert!(error.to_string().contains("503"));
    }

    #[test]
    fn test_from_status_client_error() {
        let error = PortError::from_status(422, "validation failed");
        assert!(!error.is_transient());
        assert!(matches!(error, PortError::Provider { status: 422, .. }));
    }
}
