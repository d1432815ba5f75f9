//! CRM Domain Ports
//!
//! This module defines the port interfaces for the CRM integration domain,
//! enabling swappable implementations (real provider adapters, mocks, and
//! pluggable backing stores).
//!
//! # Architecture
//!
//! Three ports cross this domain's boundary:
//!
//! - **`CrmAdapter`**: one implementation per CRM provider, translating the
//!   normalized contract into that provider's REST API. The hub holds a
//!   registry of these keyed by provider id.
//! - **`CredentialStore`**: persists which provider + credentials an agent
//!   has bound. Backing store is pluggable (in-memory, distributed cache).
//! - **`ContactRepository`**: the platform's own contact store, consumed by
//!   the import job. Upserts are keyed by `(external_id, crm_source)` so
//!   repeated imports never create duplicates.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_crm::ports::CrmAdapter;
//! use std::sync::Arc;
//!
//! // The hub resolves an adapter by provider id and delegates
//! let adapter: Arc<dyn CrmAdapter> = registry.get("rex")?;
//! let result = adapter.test_connection(&credentials).await;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{AgentId, DomainPort, PageRequest, PagedResult, PortError};

use crate::activity::{Activity, Task};
use crate::contact::Contact;
use crate::credentials::{AgentCrmSettings, ConnectionResult, Credentials};
use crate::inspection::Inspection;
use crate::property::Property;

/// The capability contract every CRM provider adapter implements.
///
/// Adapters are stateless per call: all connection state arrives through
/// `Credentials` on each method, and every method completes (success or
/// failure) before returning - no background work, no streaming state.
///
/// # Error contract
///
/// - `test_connection` never returns an error for auth or transport
///   failure; it reports through `ConnectionResult::failed`.
/// - Every other method surfaces provider failures as `PortError` and lets
///   them propagate to the hub.
/// - Mapping from provider payloads to the normalized model is total:
///   missing or unrecognized provider fields become declared defaults,
///   never errors.
#[async_trait]
pub trait CrmAdapter: DomainPort {
    /// Unique registry identifier for this provider (e.g. "rex")
    fn crm_id(&self) -> &'static str;

    /// Human-readable provider name for UI listings
    fn display_name(&self) -> &'static str;

    /// Performs a lightweight authenticated call to verify the credentials
    async fn test_connection(&self, credentials: &Credentials) -> ConnectionResult;

    // ========================================================================
    // Contacts
    // ========================================================================

    /// Retrieves a page of contacts
    ///
    /// # Arguments
    ///
    /// * `page` - Normalized pagination, translated to the provider's
    ///   native parameters
    /// * `modified_since` - Incremental-sync filter, passed through where
    ///   the provider supports it and silently ignored where it does not
    async fn get_contacts(
        &self,
        credentials: &Credentials,
        page: PageRequest,
        modified_since: Option<DateTime<Utc>>,
    ) -> Result<PagedResult<Contact>, PortError>;

    /// Gets a single contact by its provider-native id
    ///
    /// # Returns
    ///
    /// `None` when the provider reports the contact does not exist
    async fn get_contact_by_id(
        &self,
        credentials: &Credentials,
        external_id: &str,
    ) -> Result<Option<Contact>, PortError>;

    /// Searches contacts by phone number
    ///
    /// The phone number is normalized (digits plus optional leading `+`)
    /// before it reaches the provider.
    async fn search_contacts_by_phone(
        &self,
        credentials: &Credentials,
        phone: &str,
    ) -> Result<Vec<Contact>, PortError>;

    /// Creates a new contact in the provider
    async fn create_contact(
        &self,
        credentials: &Credentials,
        contact: &Contact,
    ) -> Result<Contact, PortError>;

    /// Updates an existing contact
    async fn update_contact(
        &self,
        credentials: &Credentials,
        external_id: &str,
        contact: &Contact,
    ) -> Result<Contact, PortError>;

    // ========================================================================
    // Properties
    // ========================================================================

    /// Retrieves a page of active listings
    async fn get_properties(
        &self,
        credentials: &Credentials,
        page: PageRequest,
    ) -> Result<PagedResult<Property>, PortError>;

    /// Gets a single listing by its provider-native id
    async fn get_property_by_id(
        &self,
        credentials: &Credentials,
        external_id: &str,
    ) -> Result<Option<Property>, PortError>;

    /// Searches listings by address fragment
    async fn search_properties_by_address(
        &self,
        credentials: &Credentials,
        address_query: &str,
    ) -> Result<Vec<Property>, PortError>;

    // ========================================================================
    // Activities & Tasks
    // ========================================================================

    /// Logs an activity, returning the provider-native activity id
    ///
    /// Activity types unmapped by the provider's vocabulary land in its
    /// generic "note" bucket.
    async fn log_activity(
        &self,
        credentials: &Credentials,
        activity: &Activity,
    ) -> Result<String, PortError>;

    /// Creates a follow-up task, returning the provider-native task id
    async fn create_task(
        &self,
        credentials: &Credentials,
        task: &Task,
    ) -> Result<String, PortError>;

    // ========================================================================
    // Inspections
    // ========================================================================

    /// Gets upcoming inspections, optionally filtered to one provider-native
    /// agent id
    async fn upcoming_inspections(
        &self,
        credentials: &Credentials,
        agent_id: Option<&str>,
    ) -> Result<Vec<Inspection>, PortError>;
}

/// Persistence for agent-to-provider bindings.
///
/// The store must support concurrent reads and writes keyed by `AgentId`
/// with no cross-agent interference; no cross-key transactions are needed.
#[async_trait]
pub trait CredentialStore: DomainPort {
    /// Gets the agent's binding
    ///
    /// # Returns
    ///
    /// `None` means "not connected" - a valid terminal state, not an error.
    async fn get_connection(&self, agent_id: AgentId)
        -> Result<Option<AgentCrmSettings>, PortError>;

    /// Upserts the agent's binding, overwriting any prior one
    ///
    /// Enforces the single-binding invariant: saving a connection to a new
    /// provider replaces the old provider's binding.
    async fn save_connection(
        &self,
        agent_id: AgentId,
        crm_id: &str,
        credentials: Credentials,
    ) -> Result<(), PortError>;

    /// Deletes the agent's binding; deleting a missing binding is a no-op
    async fn delete_connection(&self, agent_id: AgentId) -> Result<(), PortError>;
}

/// Outcome of upserting an imported contact into the platform store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new contact row was created
    Inserted,
    /// An existing contact was refreshed with newer data
    Updated,
    /// An existing contact was already up to date
    Skipped,
}

/// The platform's contact store, written to by the import job.
///
/// Implementations must upsert by `(external_id, crm_source)`: importing
/// the same provider twice must never create duplicates.
#[async_trait]
pub trait ContactRepository: DomainPort {
    /// Inserts or updates one imported contact
    async fn upsert(&self, contact: &Contact) -> Result<UpsertOutcome, PortError>;
}

/// Mock implementations for testing
///
/// These adapters store everything in memory and are useful for unit
/// testing the hub without network or database dependencies.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    use crate::phone;

    /// In-memory mock implementation of `CrmAdapter`
    ///
    /// Contacts live in a map keyed by external id; pagination and phone
    /// search behave like a well-behaved provider.
    #[derive(Debug, Default)]
    pub struct MockCrmAdapter {
        contacts: Arc<RwLock<HashMap<String, Contact>>>,
        properties: Arc<RwLock<HashMap<String, Property>>>,
        inspections: Arc<RwLock<Vec<Inspection>>>,
    }

    impl MockCrmAdapter {
        /// Creates an empty mock adapter
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with contacts for testing
        pub async fn with_contacts(contacts: Vec<Contact>) -> Self {
            let adapter = Self::new();
            {
                let mut map = adapter.contacts.write().await;
                for contact in contacts {
                    map.insert(contact.external_id.clone(), contact);
                }
            }
            adapter
        }

        /// Adds a property
        pub async fn add_property(&self, property: Property) {
            self.properties
                .write()
                .await
                .insert(property.external_id.clone(), property);
        }

        /// Adds an inspection
        pub async fn add_inspection(&self, inspection: Inspection) {
            self.inspections.write().await.push(inspection);
        }
    }

    impl DomainPort for MockCrmAdapter {}

    #[async_trait]
    impl CrmAdapter for MockCrmAdapter {
        fn crm_id(&self) -> &'static str {
            "mock"
        }

        fn display_name(&self) -> &'static str {
            "Mock CRM"
        }

        async fn test_connection(&self, _credentials: &Credentials) -> ConnectionResult {
            ConnectionResult::ok(Some("Mock Agent".to_string()), Some("Mock Office".to_string()))
        }

        async fn get_contacts(
            &self,
            _credentials: &Credentials,
            page: PageRequest,
            _modified_since: Option<DateTime<Utc>>,
        ) -> Result<PagedResult<Contact>, PortError> {
            let map = self.contacts.read().await;
            let mut all: Vec<Contact> = map.values().cloned().collect();
            all.sort_by(|a, b| a.external_id.cmp(&b.external_id));

            let total = all.len() as u32;
            let items = all
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.page_size as usize)
                .collect();

            Ok(PagedResult::new(items, page.page, page.page_size, total))
        }

        async fn get_contact_by_id(
            &self,
            _credentials: &Credentials,
            external_id: &str,
        ) -> Result<Option<Contact>, PortError> {
            Ok(self.contacts.read().await.get(external_id).cloned())
        }

        async fn search_contacts_by_phone(
            &self,
            _credentials: &Credentials,
            phone: &str,
        ) -> Result<Vec<Contact>, PortError> {
            let needle = phone::normalize(phone);
            let map = self.contacts.read().await;
            Ok(map
                .values()
                .filter(|c| {
                    c.best_phone()
                        .map(|p| phone::normalize(p) == needle)
                        .unwrap_or(false)
                })
                .cloned()
                .collect())
        }

        async fn create_contact(
            &self,
            _credentials: &Credentials,
            contact: &Contact,
        ) -> Result<Contact, PortError> {
            let mut created = contact.clone();
            created.external_id = Uuid::new_v4().to_string();
            created.crm_source = self.crm_id().to_string();
            self.contacts
                .write()
                .await
                .insert(created.external_id.clone(), created.clone());
            Ok(created)
        }

        async fn update_contact(
            &self,
            _credentials: &Credentials,
            external_id: &str,
            contact: &Contact,
        ) -> Result<Contact, PortError> {
            let mut map = self.contacts.write().await;
            if !map.contains_key(external_id) {
                return Err(PortError::not_found("Contact", external_id));
            }
            let mut updated = contact.clone();
            updated.external_id = external_id.to_string();
            updated.crm_source = self.crm_id().to_string();
            map.insert(external_id.to_string(), updated.clone());
            Ok(updated)
        }

        async fn get_properties(
            &self,
            _credentials: &Credentials,
            page: PageRequest,
        ) -> Result<PagedResult<Property>, PortError> {
            let map = self.properties.read().await;
            let mut all: Vec<Property> = map.values().cloned().collect();
            all.sort_by(|a, b| a.external_id.cmp(&b.external_id));

            let total = all.len() as u32;
            let items = all
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.page_size as usize)
                .collect();

            Ok(PagedResult::new(items, page.page, page.page_size, total))
        }

        async fn get_property_by_id(
            &self,
            _credentials: &Credentials,
            external_id: &str,
        ) -> Result<Option<Property>, PortError> {
            Ok(self.properties.read().await.get(external_id).cloned())
        }

        async fn search_properties_by_address(
            &self,
            _credentials: &Credentials,
            address_query: &str,
        ) -> Result<Vec<Property>, PortError> {
            let needle = address_query.to_lowercase();
            let map = self.properties.read().await;
            Ok(map
                .values()
                .filter(|p| p.address.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }

        async fn log_activity(
            &self,
            _credentials: &Credentials,
            _activity: &Activity,
        ) -> Result<String, PortError> {
            Ok(Uuid::new_v4().to_string())
        }

        async fn create_task(
            &self,
            _credentials: &Credentials,
            _task: &Task,
        ) -> Result<String, PortError> {
            Ok(Uuid::new_v4().to_string())
        }

        async fn upcoming_inspections(
            &self,
            _credentials: &Credentials,
            agent_id: Option<&str>,
        ) -> Result<Vec<Inspection>, PortError> {
            let inspections = self.inspections.read().await;
            Ok(inspections
                .iter()
                .filter(|i| match agent_id {
                    Some(id) => i.agent_id.as_deref() == Some(id),
                    None => true,
                })
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockCrmAdapter;
    use super::*;

    fn creds() -> Credentials {
        Credentials::with_api_key(AgentId::new(), "test-key")
    }

    #[tokio::test]
    async fn test_mock_adapter_pagination() {
        let contacts: Vec<Contact> = (0..5)
            .map(|n| Contact::new(format!("c-{n}"), "mock"))
            .collect();
        let adapter = MockCrmAdapter::with_contacts(contacts).await;

        let page = adapter
            .get_contacts(&creds(), PageRequest::new(1, 2), None)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next_page());
    }

    #[tokio::test]
    async fn test_mock_adapter_phone_search_normalizes() {
        let mut contact = Contact::new("c-1", "mock");
        contact.mobile = Some("+61 412 345 678".to_string());
        let adapter = MockCrmAdapter::with_contacts(vec![contact]).await;

        let found = adapter
            .search_contacts_by_phone(&creds(), "+61 (412) 345-678")
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_adapter_update_missing_contact() {
        let adapter = MockCrmAdapter::new();
        let contact = Contact::new("ghost", "mock");

        let result = adapter.update_contact(&creds(), "ghost", &contact).await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
    }
}
