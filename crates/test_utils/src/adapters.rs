//! Scripted fake ports
//!
//! Deterministic `CrmAdapter` and `ContactRepository` implementations for
//! exercising the hub without network access. The scripted adapter serves
//! pre-canned contact pages, records how often each surface was hit, and
//! can inject failures or cancellation at a chosen page.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use core_kernel::{DomainPort, PageRequest, PagedResult, PortError};
use domain_crm::{
    Activity, ConnectionResult, Contact, ContactRepository, Credentials, CrmAdapter, Inspection,
    Property, Task, UpsertOutcome,
};

/// A `CrmAdapter` that serves scripted data and records call counts.
pub struct ScriptedCrmAdapter {
    crm_id: &'static str,
    pages: Vec<Vec<Contact>>,
    phone_results: Vec<Contact>,
    properties: Vec<Property>,
    inspections: Vec<Inspection>,
    fail_on_page: Option<u32>,
    cancel_on_page: Option<(u32, CancellationToken)>,
    contact_page_requests: AtomicU32,
    phone_search_requests: AtomicU32,
    activities_logged: AtomicU32,
    tasks_created: AtomicU32,
}

impl ScriptedCrmAdapter {
    /// Creates an adapter with no scripted data
    pub fn new(crm_id: &'static str) -> Self {
        Self {
            crm_id,
            pages: Vec::new(),
            phone_results: Vec::new(),
            properties: Vec::new(),
            inspections: Vec::new(),
            fail_on_page: None,
            cancel_on_page: None,
            contact_page_requests: AtomicU32::new(0),
            phone_search_requests: AtomicU32::new(0),
            activities_logged: AtomicU32::new(0),
            tasks_created: AtomicU32::new(0),
        }
    }

    /// Scripts the contact pages `get_contacts` will serve
    pub fn with_contact_pages(mut self, pages: Vec<Vec<Contact>>) -> Self {
        self.pages = pages;
        self
    }

    /// Scripts the results of any phone search
    pub fn with_phone_results(mut self, contacts: Vec<Contact>) -> Self {
        self.phone_results = contacts;
        self
    }

    /// Scripts the results of any address search
    pub fn with_properties(mut self, properties: Vec<Property>) -> Self {
        self.properties = properties;
        self
    }

    /// Scripts the upcoming inspections
    pub fn with_inspections(mut self, inspections: Vec<Inspection>) -> Self {
        self.inspections = inspections;
        self
    }

    /// Makes `get_contacts` fail when the given page is requested
    pub fn failing_on_page(mut self, page: u32) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    /// Cancels the token while serving the given page, simulating a caller
    /// that disconnects mid-import
    pub fn cancelling_on_page(mut self, page: u32, token: CancellationToken) -> Self {
        self.cancel_on_page = Some((page, token));
        self
    }

    /// Number of `get_contacts` calls served so far
    pub fn contact_page_requests(&self) -> u32 {
        self.contact_page_requests.load(Ordering::SeqCst)
    }

    /// Number of phone searches served so far
    pub fn phone_search_requests(&self) -> u32 {
        self.phone_search_requests.load(Ordering::SeqCst)
    }

    /// Number of activities logged so far
    pub fn activities_logged(&self) -> u32 {
        self.activities_logged.load(Ordering::SeqCst)
    }

    /// Number of tasks created so far
    pub fn tasks_created(&self) -> u32 {
        self.tasks_created.load(Ordering::SeqCst)
    }

    fn total_contacts(&self) -> u32 {
        self.pages.iter().map(|page| page.len() as u32).sum()
    }
}

impl DomainPort for ScriptedCrmAdapter {}

#[async_trait]
impl CrmAdapter for ScriptedCrmAdapter {
    fn crm_id(&self) -> &'static str {
        self.crm_id
    }

    fn display_name(&self) -> &'static str {
        "Scripted CRM"
    }

    async fn test_connection(&self, _credentials: &Credentials) -> ConnectionResult {
        ConnectionResult::ok(
            Some("Scripted Agent".to_string()),
            Some("Scripted Office".to_string()),
        )
    }

    async fn get_contacts(
        &self,
        _credentials: &Credentials,
        page: PageRequest,
        _modified_since: Option<DateTime<Utc>>,
    ) -> Result<PagedResult<Contact>, PortError> {
        self.contact_page_requests.fetch_add(1, Ordering::SeqCst);

        if let Some((cancel_page, token)) = &self.cancel_on_page {
            if *cancel_page == page.page {
                token.cancel();
            }
        }

        if self.fail_on_page == Some(page.page) {
            return Err(PortError::from_status(503, "scripted provider outage"));
        }

        let items = self
            .pages
            .get((page.page - 1) as usize)
            .cloned()
            .unwrap_or_default();

        Ok(PagedResult::new(
            items,
            page.page,
            page.page_size,
            self.total_contacts(),
        ))
    }

    async fn get_contact_by_id(
        &self,
        _credentials: &Credentials,
        external_id: &str,
    ) -> Result<Option<Contact>, PortError> {
        Ok(self
            .pages
            .iter()
            .flatten()
            .find(|c| c.external_id == external_id)
            .cloned())
    }

    async fn search_contacts_by_phone(
        &self,
        _credentials: &Credentials,
        _phone: &str,
    ) -> Result<Vec<Contact>, PortError> {
        self.phone_search_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.phone_results.clone())
    }

    async fn create_contact(
        &self,
        _credentials: &Credentials,
        contact: &Contact,
    ) -> Result<Contact, PortError> {
        Ok(contact.clone())
    }

    async fn update_contact(
        &self,
        _credentials: &Credentials,
        _external_id: &str,
        contact: &Contact,
    ) -> Result<Contact, PortError> {
        Ok(contact.clone())
    }

    async fn get_properties(
        &self,
        _credentials: &Credentials,
        page: PageRequest,
    ) -> Result<PagedResult<Property>, PortError> {
        Ok(PagedResult::new(
            self.properties.clone(),
            page.page,
            page.page_size,
            self.properties.len() as u32,
        ))
    }

    async fn get_property_by_id(
        &self,
        _credentials: &Credentials,
        external_id: &str,
    ) -> Result<Option<Property>, PortError> {
        Ok(self
            .properties
            .iter()
            .find(|p| p.external_id == external_id)
            .cloned())
    }

    async fn search_properties_by_address(
        &self,
        _credentials: &Credentials,
        _address_query: &str,
    ) -> Result<Vec<Property>, PortError> {
        Ok(self.properties.clone())
    }

    async fn log_activity(
        &self,
        _credentials: &Credentials,
        _activity: &Activity,
    ) -> Result<String, PortError> {
        let n = self.activities_logged.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("scripted-activity-{n}"))
    }

    async fn create_task(
        &self,
        _credentials: &Credentials,
        _task: &Task,
    ) -> Result<String, PortError> {
        let n = self.tasks_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("scripted-task-{n}"))
    }

    async fn upcoming_inspections(
        &self,
        _credentials: &Credentials,
        agent_id: Option<&str>,
    ) -> Result<Vec<Inspection>, PortError> {
        Ok(self
            .inspections
            .iter()
            .filter(|i| match agent_id {
                Some(id) => i.agent_id.as_deref() == Some(id),
                None => true,
            })
            .cloned()
            .collect())
    }
}

/// A `CrmAdapter` whose every operation fails, for exercising best-effort
/// error swallowing.
pub struct FailingCrmAdapter {
    crm_id: &'static str,
}

impl FailingCrmAdapter {
    /// Creates a failing adapter registered under the given id
    pub fn new(crm_id: &'static str) -> Self {
        Self { crm_id }
    }

    fn outage() -> PortError {
        PortError::from_status(503, "simulated provider outage")
    }
}

impl DomainPort for FailingCrmAdapter {}

#[async_trait]
impl CrmAdapter for FailingCrmAdapter {
    fn crm_id(&self) -> &'static str {
        self.crm_id
    }

    fn display_name(&self) -> &'static str {
        "Failing CRM"
    }

    async fn test_connection(&self, _credentials: &Credentials) -> ConnectionResult {
        ConnectionResult::failed(Self::outage().to_string())
    }

    async fn get_contacts(
        &self,
        _credentials: &Credentials,
        _page: PageRequest,
        _modified_since: Option<DateTime<Utc>>,
    ) -> Result<PagedResult<Contact>, PortError> {
        Err(Self::outage())
    }

    async fn get_contact_by_id(
        &self,
        _credentials: &Credentials,
        _external_id: &str,
    ) -> Result<Option<Contact>, PortError> {
        Err(Self::outage())
    }

    async fn search_contacts_by_phone(
        &self,
        _credentials: &Credentials,
        _phone: &str,
    ) -> Result<Vec<Contact>, PortError> {
        Err(Self::outage())
    }

    async fn create_contact(
        &self,
        _credentials: &Credentials,
        _contact: &Contact,
    ) -> Result<Contact, PortError> {
        Err(Self::outage())
    }

    async fn update_contact(
        &self,
        _credentials: &Credentials,
        _external_id: &str,
        _contact: &Contact,
    ) -> Result<Contact, PortError> {
        Err(Self::outage())
    }

    async fn get_properties(
        &self,
        _credentials: &Credentials,
        _page: PageRequest,
    ) -> Result<PagedResult<Property>, PortError> {
        Err(Self::outage())
    }

    async fn get_property_by_id(
        &self,
        _credentials: &Credentials,
        _external_id: &str,
    ) -> Result<Option<Property>, PortError> {
        Err(Self::outage())
    }

    async fn search_properties_by_address(
        &self,
        _credentials: &Credentials,
        _address_query: &str,
    ) -> Result<Vec<Property>, PortError> {
        Err(Self::outage())
    }

    async fn log_activity(
        &self,
        _credentials: &Credentials,
        _activity: &Activity,
    ) -> Result<String, PortError> {
        Err(Self::outage())
    }

    async fn create_task(
        &self,
        _credentials: &Credentials,
        _task: &Task,
    ) -> Result<String, PortError> {
        Err(Self::outage())
    }

    async fn upcoming_inspections(
        &self,
        _credentials: &Credentials,
        _agent_id: Option<&str>,
    ) -> Result<Vec<Inspection>, PortError> {
        Err(Self::outage())
    }
}

/// In-memory `ContactRepository` that records upserts.
///
/// Upserts are keyed by `(external_id, crm_source)` and report real
/// insert/update/skip outcomes, so import tests can assert counter
/// arithmetic.
#[derive(Default)]
pub struct RecordingContactRepository {
    contacts: RwLock<HashMap<(String, String), Contact>>,
    upsert_calls: AtomicU32,
}

impl RecordingContactRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of upsert calls received
    pub fn upsert_calls(&self) -> u32 {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Number of distinct contacts stored
    pub async fn len(&self) -> usize {
        self.contacts.read().await.len()
    }

    /// Whether the repository is empty
    pub async fn is_empty(&self) -> bool {
        self.contacts.read().await.is_empty()
    }

    /// Whether a contact with this identity has been stored
    pub async fn contains(&self, external_id: &str, crm_source: &str) -> bool {
        self.contacts
            .read()
            .await
            .contains_key(&(external_id.to_string(), crm_source.to_string()))
    }
}

impl DomainPort for RecordingContactRepository {}

#[async_trait]
impl ContactRepository for RecordingContactRepository {
    async fn upsert(&self, contact: &Contact) -> Result<UpsertOutcome, PortError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let key = (contact.external_id.clone(), contact.crm_source.clone());
        let mut contacts = self.contacts.write().await;

        let outcome = match contacts.get(&key) {
            None => UpsertOutcome::Inserted,
            Some(existing) if existing == contact => UpsertOutcome::Skipped,
            Some(_) => UpsertOutcome::Updated,
        };
        contacts.insert(key, contact.clone());

        Ok(outcome)
    }
}
