//! CRM Integration Domain
//!
//! This crate defines the normalized model and port contracts that let the
//! platform talk to third-party real-estate CRM systems through one
//! uniform surface, plus the provider adapters that implement that
//! contract against each vendor's API.
//!
//! # Normalized model
//!
//! Providers disagree on everything: field names, status vocabularies,
//! pagination, authentication. The types here are the provider-agnostic
//! shapes the rest of the platform consumes:
//!
//! - **Contact** - identified by `(external_id, crm_source)`
//! - **Property** - a listing with normalized type and status
//! - **Activity** / **Task** - interactions and follow-ups written to a CRM
//! - **Inspection** - an open-home event
//! - **Credentials** / **AgentCrmSettings** - per-agent connection state
//!
//! # Mapping rule
//!
//! A provider's absence of a field must never become a crash. Every
//! mapping from provider payloads to the normalized model is a total
//! function: unknown classifications become `Unknown`, unrecognized
//! listing statuses become the provider's most-likely-active default, and
//! unmapped outbound vocabularies land in the provider's generic bucket.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_crm::adapters::RexAdapter;
//! use domain_crm::ports::CrmAdapter;
//! use domain_crm::Credentials;
//!
//! let adapter = RexAdapter::new(reqwest::Client::new());
//! let result = adapter.test_connection(&credentials).await;
//! if result.success {
//!     println!("connected as {:?}", result.agent_name);
//! }
//! ```

pub mod activity;
pub mod adapters;
pub mod contact;
pub mod credentials;
pub mod inspection;
pub mod phone;
pub mod ports;
pub mod property;

pub use activity::{Activity, ActivityType, Task, TaskPriority};
pub use adapters::{AgentBoxAdapter, RexAdapter, VaultReAdapter};
pub use contact::{Contact, ContactClassification};
pub use credentials::{AgentCrmSettings, ConnectionResult, Credentials};
pub use inspection::Inspection;
pub use ports::{ContactRepository, CredentialStore, CrmAdapter, UpsertOutcome};
pub use property::{ListingStatus, Property, PropertyType};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockCrmAdapter;
