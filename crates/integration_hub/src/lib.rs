//! CRM Integration Hub
//!
//! The routing layer between the platform and third-party CRM systems.
//! The hub resolves "this agent's CRM" at call time: it looks up the
//! agent's stored binding, selects the matching provider adapter from its
//! registry, and delegates, so callers pass an `AgentId` instead of
//! provider ids and credentials.
//!
//! # Components
//!
//! - [`CrmIntegrationHub`] - the single public surface the platform
//!   depends on
//! - [`import`] - the paginated, rate-limited, cancellable contact import
//!   job
//! - [`settings`] - credential store implementations (in-memory, and
//!   TTL-cache-backed for production)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use integration_hub::{CrmIntegrationHub, InMemoryCredentialStore};
//! use domain_crm::{AgentBoxAdapter, RexAdapter, VaultReAdapter};
//!
//! let client = reqwest::Client::new();
//! let hub = CrmIntegrationHub::new(
//!     vec![
//!         Arc::new(RexAdapter::new(client.clone())),
//!         Arc::new(AgentBoxAdapter::new(client.clone())),
//!         Arc::new(VaultReAdapter::new(client)),
//!     ],
//!     Arc::new(InMemoryCredentialStore::new()),
//!     contact_repository,
//! );
//!
//! let contact = hub.find_contact_by_phone(agent_id, "+61 412 345 678").await?;
//! ```

pub mod hub;
pub mod import;
pub mod settings;

pub use hub::{AdapterInfo, CrmIntegrationHub};
pub use import::{ImportConfig, ImportCounters, ImportResult};
pub use settings::{
    CacheBackend, CachedCredentialStore, InMemoryCache, InMemoryCredentialStore,
};
