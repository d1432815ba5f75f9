//! Rex adapter
//!
//! Integrates with the Rex Software REST API. Rex paginates with
//! `page`/`per_page` and wraps every payload in a `data`/`meta` envelope.
//! Authentication is a bearer token when one is present, falling back to an
//! `X-Api-Key` header.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_kernel::{DomainPort, PageRequest, PagedResult, PortError};

use crate::activity::{Activity, ActivityType, Task, TaskPriority};
use crate::adapters::http::{optional_json, read_json, require_success, transport_error};
use crate::contact::{Contact, ContactClassification};
use crate::credentials::{ConnectionResult, Credentials};
use crate::inspection::Inspection;
use crate::phone;
use crate::ports::CrmAdapter;
use crate::property::{ListingStatus, Property, PropertyType};

const DEFAULT_BASE_URL: &str = "https://api.rexsoftware.com/v1";
const CRM_ID: &str = "rex";

/// Adapter for the Rex CRM.
#[derive(Debug, Clone)]
pub struct RexAdapter {
    client: Client,
}

impl RexAdapter {
    /// Creates the adapter around a long-lived HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a request with Rex authentication applied.
    ///
    /// Rex accepts OAuth bearer tokens or legacy API keys; the bearer token
    /// wins when both are present.
    fn request(&self, method: Method, path: &str, credentials: &Credentials) -> RequestBuilder {
        let base = credentials.base_url_or(DEFAULT_BASE_URL);
        let mut request = self.client.request(method, format!("{base}{path}"));

        if let Some(token) = &credentials.access_token {
            request = request.bearer_auth(token);
        } else if let Some(key) = &credentials.api_key {
            request = request.header("X-Api-Key", key);
        }

        request
    }
}

impl DomainPort for RexAdapter {}

#[async_trait]
impl CrmAdapter for RexAdapter {
    fn crm_id(&self) -> &'static str {
        CRM_ID
    }

    fn display_name(&self) -> &'static str {
        "Rex"
    }

    async fn test_connection(&self, credentials: &Credentials) -> ConnectionResult {
        let send = async {
            let response = self
                .request(Method::GET, "/account", credentials)
                .send()
                .await
                .map_err(|e| transport_error("rex test_connection", e))?;
            let response = require_success(response).await?;
            read_json::<RexAccount>(response).await
        };

        match send.await {
            Ok(account) => ConnectionResult::ok(account.name, account.office_name),
            Err(err) => ConnectionResult::failed(err.to_string()),
        }
    }

    #[instrument(level = "debug", skip_all, fields(crm = CRM_ID, page = page.page))]
    async fn get_contacts(
        &self,
        credentials: &Credentials,
        page: PageRequest,
        modified_since: Option<DateTime<Utc>>,
    ) -> Result<PagedResult<Contact>, PortError> {
        let mut query = vec![
            ("page".to_string(), page.page.to_string()),
            ("per_page".to_string(), page.page_size.to_string()),
        ];
        if let Some(since) = modified_since {
            query.push(("modified_since".to_string(), since.to_rfc3339()));
        }

        let response = self
            .request(Method::GET, "/contacts", credentials)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error("rex get_contacts", e))?;
        let response = require_success(response).await?;
        let envelope: RexPage<RexContact> = read_json(response).await?;

        let meta = envelope.meta.unwrap_or_default();
        Ok(PagedResult::new(
            envelope.data.into_iter().map(map_contact).collect(),
            meta.current_page.unwrap_or(page.page),
            page.page_size,
            meta.total.unwrap_or(0),
        ))
    }

    async fn get_contact_by_id(
        &self,
        credentials: &Credentials,
        external_id: &str,
    ) -> Result<Option<Contact>, PortError> {
        let response = self
            .request(Method::GET, &format!("/contacts/{external_id}"), credentials)
            .send()
            .await
            .map_err(|e| transport_error("rex get_contact_by_id", e))?;

        let envelope: Option<RexSingle<RexContact>> = optional_json(response).await?;
        Ok(envelope.and_then(|e| e.data).map(map_contact))
    }

    async fn search_contacts_by_phone(
        &self,
        credentials: &Credentials,
        phone: &str,
    ) -> Result<Vec<Contact>, PortError> {
        let normalized = phone::normalize(phone);
        let response = self
            .request(Method::GET, "/contacts", credentials)
            .query(&[("phone", normalized.as_str())])
            .send()
            .await
            .map_err(|e| transport_error("rex search_contacts_by_phone", e))?;
        let response = require_success(response).await?;
        let envelope: RexPage<RexContact> = read_json(response).await?;

        Ok(envelope.data.into_iter().map(map_contact).collect())
    }

    async fn create_contact(
        &self,
        credentials: &Credentials,
        contact: &Contact,
    ) -> Result<Contact, PortError> {
        let body = RexContactWrite::from_contact(contact);
        let response = self
            .request(Method::POST, "/contacts", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("rex create_contact", e))?;
        let response = require_success(response).await?;
        let envelope: RexSingle<RexContact> = read_json(response).await?;

        envelope
            .data
            .map(map_contact)
            .ok_or_else(|| PortError::serialization("rex create_contact: empty data envelope"))
    }

    async fn update_contact(
        &self,
        credentials: &Credentials,
        external_id: &str,
        contact: &Contact,
    ) -> Result<Contact, PortError> {
        let body = RexContactWrite::from_contact(contact);
        let response = self
            .request(Method::PUT, &format!("/contacts/{external_id}"), credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("rex update_contact", e))?;
        let response = require_success(response).await?;
        let envelope: RexSingle<RexContact> = read_json(response).await?;

        envelope
            .data
            .map(map_contact)
            .ok_or_else(|| PortError::serialization("rex update_contact: empty data envelope"))
    }

    async fn get_properties(
        &self,
        credentials: &Credentials,
        page: PageRequest,
    ) -> Result<PagedResult<Property>, PortError> {
        let response = self
            .request(Method::GET, "/listings", credentials)
            .query(&[
                ("page", page.page.to_string()),
                ("per_page", page.page_size.to_string()),
                ("status", "active".to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("rex get_properties", e))?;
        let response = require_success(response).await?;
        let envelope: RexPage<RexListing> = read_json(response).await?;

        let meta = envelope.meta.unwrap_or_default();
        Ok(PagedResult::new(
            envelope.data.into_iter().map(map_property).collect(),
            meta.current_page.unwrap_or(page.page),
            page.page_size,
            meta.total.unwrap_or(0),
        ))
    }

    async fn get_property_by_id(
        &self,
        credentials: &Credentials,
        external_id: &str,
    ) -> Result<Option<Property>, PortError> {
        let response = self
            .request(Method::GET, &format!("/listings/{external_id}"), credentials)
            .send()
            .await
            .map_err(|e| transport_error("rex get_property_by_id", e))?;

        let envelope: Option<RexSingle<RexListing>> = optional_json(response).await?;
        Ok(envelope.and_then(|e| e.data).map(map_property))
    }

    async fn search_properties_by_address(
        &self,
        credentials: &Credentials,
        address_query: &str,
    ) -> Result<Vec<Property>, PortError> {
        let response = self
            .request(Method::GET, "/listings", credentials)
            .query(&[("address", address_query)])
            .send()
            .await
            .map_err(|e| transport_error("rex search_properties_by_address", e))?;
        let response = require_success(response).await?;
        let envelope: RexPage<RexListing> = read_json(response).await?;

        Ok(envelope.data.into_iter().map(map_property).collect())
    }

    #[instrument(level = "debug", skip_all, fields(crm = CRM_ID))]
    async fn log_activity(
        &self,
        credentials: &Credentials,
        activity: &Activity,
    ) -> Result<String, PortError> {
        let body = RexActivityWrite {
            contact_id: activity.contact_id.clone(),
            listing_id: activity.property_id.clone(),
            activity_type: map_activity_type(activity.activity_type).to_string(),
            subject: activity.subject.clone(),
            notes: activity.description.clone(),
            timestamp: activity.timestamp,
            duration_minutes: activity.duration_minutes(),
        };

        let response = self
            .request(Method::POST, "/activities", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("rex log_activity", e))?;
        let response = require_success(response).await?;
        let envelope: RexSingle<RexCreated> = read_json(response).await?;

        Ok(envelope.data.and_then(|d| d.id).unwrap_or_default())
    }

    #[instrument(level = "debug", skip_all, fields(crm = CRM_ID))]
    async fn create_task(
        &self,
        credentials: &Credentials,
        task: &Task,
    ) -> Result<String, PortError> {
        let body = RexTaskWrite {
            contact_id: task.contact_id.clone(),
            listing_id: task.property_id.clone(),
            subject: task.subject.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: map_priority(task.priority).to_string(),
            assigned_to: task.assigned_to_agent_id.clone(),
        };

        let response = self
            .request(Method::POST, "/tasks", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("rex create_task", e))?;
        let response = require_success(response).await?;
        let envelope: RexSingle<RexCreated> = read_json(response).await?;

        Ok(envelope.data.and_then(|d| d.id).unwrap_or_default())
    }

    async fn upcoming_inspections(
        &self,
        credentials: &Credentials,
        agent_id: Option<&str>,
    ) -> Result<Vec<Inspection>, PortError> {
        let mut query = vec![("upcoming".to_string(), "true".to_string())];
        if let Some(id) = agent_id {
            query.push(("agent_id".to_string(), id.to_string()));
        }

        let response = self
            .request(Method::GET, "/inspections", credentials)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error("rex upcoming_inspections", e))?;
        let response = require_success(response).await?;
        let envelope: RexPage<RexInspection> = read_json(response).await?;

        Ok(envelope.data.into_iter().map(map_inspection).collect())
    }
}

// ============================================================================
// Mapping
// ============================================================================

fn map_contact(rex: RexContact) -> Contact {
    let now = Utc::now();
    let first = rex.first_name.clone().unwrap_or_default();
    let last = rex.last_name.clone().unwrap_or_default();

    Contact {
        external_id: rex.id.unwrap_or_default(),
        crm_source: CRM_ID.to_string(),
        full_name: format!("{first} {last}").trim().to_string(),
        first_name: rex.first_name,
        last_name: rex.last_name,
        email: rex.email,
        phone: rex.phone,
        mobile: rex.mobile,
        classification: parse_classification(rex.contact_type.as_deref()),
        lead_source: rex.source,
        last_contact_date: rex.last_contacted_at,
        created_at: rex.created_at.unwrap_or(now),
        updated_at: rex.updated_at.unwrap_or(now),
        custom_fields: Default::default(),
    }
}

fn map_property(rex: RexListing) -> Property {
    Property {
        external_id: rex.id.unwrap_or_default(),
        crm_source: CRM_ID.to_string(),
        address: rex.address.unwrap_or_default(),
        suburb: rex.suburb,
        state: rex.state,
        postcode: rex.postcode,
        property_type: parse_property_type(rex.property_type.as_deref()),
        status: parse_listing_status(rex.status.as_deref()),
        price_from: rex.price_from,
        price_to: rex.price_to,
        price_display: rex.price_display,
        bedrooms: rex.bedrooms,
        bathrooms: rex.bathrooms,
        car_spaces: rex.car_spaces,
        agent_id: rex.agent_id,
        listed_date: rex.listed_at,
    }
}

fn map_inspection(rex: RexInspection) -> Inspection {
    let now = Utc::now();
    Inspection {
        external_id: rex.id.unwrap_or_default(),
        property_id: rex.listing_id.unwrap_or_default(),
        property_address: rex.address,
        start_time: rex.start_time.unwrap_or(now),
        end_time: rex
            .end_time
            .unwrap_or(now + chrono::Duration::minutes(30)),
        agent_id: rex.agent_id,
        rsvp_count: rex.rsvp_count,
    }
}

fn parse_classification(raw: Option<&str>) -> ContactClassification {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("buyer") => ContactClassification::Buyer,
        Some("seller") | Some("vendor") => ContactClassification::Seller,
        Some("investor") => ContactClassification::Investor,
        Some("tenant") => ContactClassification::Tenant,
        Some("landlord") => ContactClassification::Landlord,
        Some("agent") => ContactClassification::OtherAgent,
        _ => ContactClassification::Unknown,
    }
}

fn classification_to_rex(classification: ContactClassification) -> &'static str {
    match classification {
        ContactClassification::Buyer => "buyer",
        ContactClassification::Seller => "seller",
        ContactClassification::Investor => "investor",
        ContactClassification::Tenant => "tenant",
        ContactClassification::Landlord => "landlord",
        ContactClassification::OtherAgent => "agent",
        _ => "other",
    }
}

fn parse_property_type(raw: Option<&str>) -> PropertyType {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("unit") => PropertyType::Unit,
        Some("apartment") => PropertyType::Apartment,
        Some("townhouse") => PropertyType::Townhouse,
        Some("land") => PropertyType::Land,
        Some("rural") => PropertyType::Rural,
        Some("commercial") => PropertyType::Commercial,
        _ => PropertyType::House,
    }
}

fn parse_listing_status(raw: Option<&str>) -> ListingStatus {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("under_contract") | Some("under contract") => ListingStatus::UnderContract,
        Some("sold") => ListingStatus::Sold,
        Some("withdrawn") => ListingStatus::Withdrawn,
        Some("off_market") => ListingStatus::OffMarket,
        _ => ListingStatus::Active,
    }
}

fn map_activity_type(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::Call => "call",
        ActivityType::Email => "email",
        ActivityType::Sms => "sms",
        ActivityType::Inspection => "inspection",
        ActivityType::Meeting => "meeting",
        ActivityType::Task => "task",
        ActivityType::Note => "note",
    }
}

fn map_priority(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "low",
        TaskPriority::High => "high",
        TaskPriority::Urgent => "urgent",
        TaskPriority::Normal => "normal",
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct RexPage<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    meta: Option<RexMeta>,
}

#[derive(Debug, Deserialize)]
struct RexSingle<T> {
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct RexMeta {
    current_page: Option<u32>,
    total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RexAccount {
    name: Option<String>,
    office_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RexContact {
    id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    mobile: Option<String>,
    #[serde(rename = "type")]
    contact_type: Option<String>,
    source: Option<String>,
    last_contacted_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct RexContactWrite {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    mobile: Option<String>,
    #[serde(rename = "type")]
    contact_type: String,
    source: Option<String>,
}

impl RexContactWrite {
    fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name_or_split(),
            last_name: contact.last_name_or_split(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            mobile: contact.mobile.clone(),
            contact_type: classification_to_rex(contact.classification).to_string(),
            source: contact.lead_source.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RexListing {
    id: Option<String>,
    address: Option<String>,
    suburb: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    property_type: Option<String>,
    status: Option<String>,
    price_from: Option<Decimal>,
    price_to: Option<Decimal>,
    price_display: Option<String>,
    bedrooms: Option<u32>,
    bathrooms: Option<u32>,
    car_spaces: Option<u32>,
    agent_id: Option<String>,
    listed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RexInspection {
    id: Option<String>,
    listing_id: Option<String>,
    address: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    agent_id: Option<String>,
    rsvp_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RexCreated {
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct RexActivityWrite {
    contact_id: Option<String>,
    listing_id: Option<String>,
    #[serde(rename = "type")]
    activity_type: String,
    subject: String,
    notes: Option<String>,
    timestamp: DateTime<Utc>,
    duration_minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
struct RexTaskWrite {
    contact_id: Option<String>,
    listing_id: Option<String>,
    subject: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    priority: String,
    assigned_to: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_classification_defaults() {
        assert_eq!(
            parse_classification(Some("hot-lead")),
            ContactClassification::Unknown
        );
        assert_eq!(parse_classification(None), ContactClassification::Unknown);
    }

    #[test]
    fn test_classification_parsing_is_case_insensitive() {
        assert_eq!(
            parse_classification(Some("BUYER")),
            ContactClassification::Buyer
        );
        assert_eq!(
            parse_classification(Some("Vendor")),
            ContactClassification::Seller
        );
    }

    #[test]
    fn test_unknown_status_defaults_to_active() {
        assert_eq!(parse_listing_status(Some("listed")), ListingStatus::Active);
        assert_eq!(parse_listing_status(None), ListingStatus::Active);
    }

    #[test]
    fn test_known_statuses() {
        assert_eq!(
            parse_listing_status(Some("under contract")),
            ListingStatus::UnderContract
        );
        assert_eq!(parse_listing_status(Some("SOLD")), ListingStatus::Sold);
    }

    #[test]
    fn test_unmapped_activity_type_falls_back_to_note() {
        assert_eq!(map_activity_type(ActivityType::Note), "note");
        assert_eq!(map_activity_type(ActivityType::Call), "call");
    }

    #[test]
    fn test_map_contact_builds_full_name() {
        let raw: RexContact = serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "first_name": "Jane",
            "last_name": "Citizen",
            "type": "buyer"
        }))
        .unwrap();

        let contact = map_contact(raw);
        assert_eq!(contact.external_id, "c-1");
        assert_eq!(contact.crm_source, "rex");
        assert_eq!(contact.full_name, "Jane Citizen");
        assert_eq!(contact.classification, ContactClassification::Buyer);
    }

    #[test]
    fn test_map_contact_tolerates_missing_fields() {
        let raw: RexContact = serde_json::from_value(serde_json::json!({})).unwrap();
        let contact = map_contact(raw);

        assert_eq!(contact.external_id, "");
        assert_eq!(contact.full_name, "");
        assert_eq!(contact.classification, ContactClassification::Unknown);
    }

    #[test]
    fn test_contact_write_splits_full_name() {
        let mut contact = Contact::new("c-1", "rex");
        contact.full_name = "Jane Maree Citizen".to_string();

        let write = RexContactWrite::from_contact(&contact);
        assert_eq!(write.first_name.as_deref(), Some("Jane"));
        assert_eq!(write.last_name.as_deref(), Some("Maree Citizen"));
        assert_eq!(write.contact_type, "other");
    }

    #[test]
    fn test_map_inspection_defaults_window() {
        let raw: RexInspection = serde_json::from_value(serde_json::json!({
            "id": "i-1",
            "listing_id": "p-1"
        }))
        .unwrap();

        let inspection = map_inspection(raw);
        assert_eq!(inspection.duration(), chrono::Duration::minutes(30));
    }

    #[test]
    fn test_page_envelope_tolerates_missing_meta() {
        let envelope: RexPage<RexContact> =
            serde_json::from_value(serde_json::json!({ "data": [] })).unwrap();
        assert!(envelope.meta.is_none());
        assert!(envelope.data.is_empty());
    }
}
