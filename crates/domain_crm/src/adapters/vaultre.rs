//! VaultRE adapter
//!
//! Integrates with the MRI Vault CRM API, used by several of the large
//! franchise networks. VaultRE paginates with `limit`/`offset` (derived
//! here from the normalized page request), uses numeric entity ids which
//! are stringified into the normalized model, and wraps lists in an
//! `items`/`total_count` envelope. Authentication is OAuth bearer-only.

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

const DEFAULT_BASE_URL: &str = "https://api.vaultre.com.au/api/v1.3";
const CRM_ID: &str = "vaultre";

/// Adapter for the VaultRE (MRI Vault) CRM.
#[derive(Debug, Clone)]
pub struct VaultReAdapter {
    client: Client,
}

impl VaultReAdapter {
    /// Creates the adapter around a long-lived HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn request(&self, method: Method, path: &str, credentials: &Credentials) -> RequestBuilder {
        let base = credentials.base_url_or(DEFAULT_BASE_URL);
        let mut request = self
            .client
            .request(method, format!("{base}{path}"))
            .header("Accept", "application/json");

        if let Some(token) = &credentials.access_token {
            request = request.bearer_auth(token);
        }

        request
    }
}

impl DomainPort for VaultReAdapter {}

#[async_trait]
impl CrmAdapter for VaultReAdapter {
    fn crm_id(&self) -> &'static str {
        CRM_ID
    }

    fn display_name(&self) -> &'static str {
        "VaultRE"
    }

    async fn test_connection(&self, credentials: &Credentials) -> ConnectionResult {
        let send = async {
            let response = self
                .request(Method::GET, "/me", credentials)
                .send()
                .await
                .map_err(|e| transport_error("vaultre test_connection", e))?;
            let response = require_success(response).await?;
            read_json::<VaultUser>(response).await
        };

        match send.await {
            Ok(user) => ConnectionResult::ok(user.full_name, user.office_name),
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
            ("limit".to_string(), page.page_size.to_string()),
            ("offset".to_string(), page.offset().to_string()),
        ];
        if let Some(since) = modified_since {
            query.push((
                "modified_since".to_string(),
                since.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            ));
        }

        let response = self
            .request(Method::GET, "/contacts", credentials)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error("vaultre get_contacts", e))?;
        let response = require_success(response).await?;
        let envelope: VaultList<VaultContact> = read_json(response).await?;

        Ok(PagedResult::new(
            envelope.items.into_iter().map(map_contact).collect(),
            page.page,
            page.page_size,
            envelope.total_count.unwrap_or(0),
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
            .map_err(|e| transport_error("vaultre get_contact_by_id", e))?;

        let contact: Option<VaultContact> = optional_json(response).await?;
        Ok(contact.map(map_contact))
    }

    async fn search_contacts_by_phone(
        &self,
        credentials: &Credentials,
        phone: &str,
    ) -> Result<Vec<Contact>, PortError> {
        let normalized = phone::normalize(phone);
        let response = self
            .request(Method::GET, "/contacts/search", credentials)
            .query(&[("phone", normalized.as_str())])
            .send()
            .await
            .map_err(|e| transport_error("vaultre search_contacts_by_phone", e))?;
        let response = require_success(response).await?;
        let envelope: VaultList<VaultContact> = read_json(response).await?;

        Ok(envelope.items.into_iter().map(map_contact).collect())
    }

    async fn create_contact(
        &self,
        credentials: &Credentials,
        contact: &Contact,
    ) -> Result<Contact, PortError> {
        let body = VaultContactWrite::from_contact(contact);
        let response = self
            .request(Method::POST, "/contacts", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("vaultre create_contact", e))?;
        let response = require_success(response).await?;
        let created: VaultContact = read_json(response).await?;

        Ok(map_contact(created))
    }

    async fn update_contact(
        &self,
        credentials: &Credentials,
        external_id: &str,
        contact: &Contact,
    ) -> Result<Contact, PortError> {
        let body = VaultContactWrite::from_contact(contact);
        let response = self
            .request(Method::PUT, &format!("/contacts/{external_id}"), credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("vaultre update_contact", e))?;
        let response = require_success(response).await?;
        let updated: VaultContact = read_json(response).await?;

        Ok(map_contact(updated))
    }

    async fn get_properties(
        &self,
        credentials: &Credentials,
        page: PageRequest,
    ) -> Result<PagedResult<Property>, PortError> {
        let response = self
            .request(Method::GET, "/listings", credentials)
            .query(&[
                ("limit", page.page_size.to_string()),
                ("offset", page.offset().to_string()),
                ("status", "active".to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("vaultre get_properties", e))?;
        let response = require_success(response).await?;
        let envelope: VaultList<VaultListing> = read_json(response).await?;

        Ok(PagedResult::new(
            envelope.items.into_iter().map(map_property).collect(),
            page.page,
            page.page_size,
            envelope.total_count.unwrap_or(0),
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
            .map_err(|e| transport_error("vaultre get_property_by_id", e))?;

        let listing: Option<VaultListing> = optional_json(response).await?;
        Ok(listing.map(map_property))
    }

    async fn search_properties_by_address(
        &self,
        credentials: &Credentials,
        address_query: &str,
    ) -> Result<Vec<Property>, PortError> {
        let response = self
            .request(Method::GET, "/listings/search", credentials)
            .query(&[("address", address_query)])
            .send()
            .await
            .map_err(|e| transport_error("vaultre search_properties_by_address", e))?;
        let response = require_success(response).await?;
        let envelope: VaultList<VaultListing> = read_json(response).await?;

        Ok(envelope.items.into_iter().map(map_property).collect())
    }

    #[instrument(level = "debug", skip_all, fields(crm = CRM_ID))]
    async fn log_activity(
        &self,
        credentials: &Credentials,
        activity: &Activity,
    ) -> Result<String, PortError> {
        let body = VaultNoteWrite {
            contact_id: activity.contact_id.clone(),
            listing_id: activity.property_id.clone(),
            category: map_activity_category(activity.activity_type).to_string(),
            subject: activity.subject.clone(),
            body: activity.description.clone(),
            activity_date: activity.timestamp,
        };

        let response = self
            .request(Method::POST, "/notes", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("vaultre log_activity", e))?;
        let response = require_success(response).await?;
        let created: VaultCreated = read_json(response).await?;

        Ok(created.id.map(|id| id.to_string()).unwrap_or_default())
    }

    #[instrument(level = "debug", skip_all, fields(crm = CRM_ID))]
    async fn create_task(
        &self,
        credentials: &Credentials,
        task: &Task,
    ) -> Result<String, PortError> {
        let body = VaultTaskWrite {
            contact_id: task.contact_id.clone(),
            listing_id: task.property_id.clone(),
            subject: task.subject.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: map_priority(task.priority),
            assigned_to_user_id: task.assigned_to_agent_id.clone(),
        };

        let response = self
            .request(Method::POST, "/tasks", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("vaultre create_task", e))?;
        let response = require_success(response).await?;
        let created: VaultCreated = read_json(response).await?;

        Ok(created.id.map(|id| id.to_string()).unwrap_or_default())
    }

    async fn upcoming_inspections(
        &self,
        credentials: &Credentials,
        agent_id: Option<&str>,
    ) -> Result<Vec<Inspection>, PortError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let mut query = vec![
            ("from_date".to_string(), today),
            ("status".to_string(), "scheduled".to_string()),
        ];
        if let Some(id) = agent_id {
            query.push(("agent_id".to_string(), id.to_string()));
        }

        let response = self
            .request(Method::GET, "/inspections", credentials)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error("vaultre upcoming_inspections", e))?;
        let response = require_success(response).await?;
        let envelope: VaultList<VaultInspection> = read_json(response).await?;

        Ok(envelope.items.into_iter().map(map_inspection).collect())
    }
}

// ============================================================================
// Mapping
// ============================================================================

fn map_contact(vault: VaultContact) -> Contact {
    let now = Utc::now();
    let first = vault.first_name.clone().unwrap_or_default();
    let last = vault.last_name.clone().unwrap_or_default();
    let full_name = vault
        .display_name
        .clone()
        .unwrap_or_else(|| format!("{first} {last}").trim().to_string());

    Contact {
        external_id: vault.id.map(|id| id.to_string()).unwrap_or_default(),
        crm_source: CRM_ID.to_string(),
        full_name,
        first_name: vault.first_name,
        last_name: vault.last_name,
        email: vault.email,
        phone: vault.phone,
        mobile: vault.mobile,
        classification: parse_classification(vault.contact_type.as_deref()),
        lead_source: vault.source,
        last_contact_date: vault.last_contact_date,
        created_at: vault.created_at.unwrap_or(now),
        updated_at: vault.updated_at.unwrap_or(now),
        custom_fields: Default::default(),
    }
}

fn map_property(vault: VaultListing) -> Property {
    Property {
        external_id: vault.id.map(|id| id.to_string()).unwrap_or_default(),
        crm_source: CRM_ID.to_string(),
        address: vault.full_address.unwrap_or_default(),
        suburb: vault.suburb,
        state: vault.state,
        postcode: vault.postcode,
        property_type: parse_property_type(vault.property_type.as_deref()),
        status: parse_listing_status(vault.status.as_deref()),
        price_from: vault.price_from,
        price_to: vault.price_to,
        price_display: vault.price_display,
        bedrooms: vault.bedrooms,
        bathrooms: vault.bathrooms,
        car_spaces: vault.car_spaces,
        agent_id: vault.agent_id.map(|id| id.to_string()),
        listed_date: vault.listed_date,
    }
}

fn map_inspection(vault: VaultInspection) -> Inspection {
    let now = Utc::now();
    Inspection {
        external_id: vault.id.map(|id| id.to_string()).unwrap_or_default(),
        property_id: vault.listing_id.map(|id| id.to_string()).unwrap_or_default(),
        property_address: vault.address,
        start_time: vault.start_time.unwrap_or(now),
        end_time: vault
            .end_time
            .unwrap_or(now + chrono::Duration::minutes(30)),
        agent_id: vault.agent_id.map(|id| id.to_string()),
        rsvp_count: vault.attendee_count,
    }
}

fn parse_classification(raw: Option<&str>) -> ContactClassification {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("buyer") => ContactClassification::Buyer,
        Some("seller") | Some("vendor") => ContactClassification::Seller,
        Some("investor") => ContactClassification::Investor,
        Some("tenant") => ContactClassification::Tenant,
        Some("landlord") | Some("owner") => ContactClassification::Landlord,
        Some("agent") => ContactClassification::OtherAgent,
        _ => ContactClassification::Unknown,
    }
}

fn classification_to_vault(classification: ContactClassification) -> &'static str {
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
        Some("under_offer") | Some("under offer") | Some("conditional") => {
            ListingStatus::UnderContract
        }
        Some("sold") | Some("settled") => ListingStatus::Sold,
        Some("withdrawn") => ListingStatus::Withdrawn,
        Some("off_market") => ListingStatus::OffMarket,
        _ => ListingStatus::Active,
    }
}

fn map_activity_category(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::Call => "Phone Call",
        ActivityType::Email => "Email",
        ActivityType::Sms => "SMS",
        ActivityType::Inspection => "Inspection",
        ActivityType::Meeting => "Meeting",
        _ => "Note",
    }
}

fn map_priority(priority: TaskPriority) -> u8 {
    match priority {
        TaskPriority::Low => 1,
        TaskPriority::Normal => 2,
        TaskPriority::High => 3,
        TaskPriority::Urgent => 4,
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct VaultList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    total_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VaultUser {
    full_name: Option<String>,
    office_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VaultContact {
    id: Option<i64>,
    display_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    mobile: Option<String>,
    contact_type: Option<String>,
    source: Option<String>,
    last_contact_date: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct VaultContactWrite {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    mobile: Option<String>,
    contact_type: String,
    source: Option<String>,
}

impl VaultContactWrite {
    fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name_or_split(),
            last_name: contact.last_name_or_split(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            mobile: contact.mobile.clone(),
            contact_type: classification_to_vault(contact.classification).to_string(),
            source: contact.lead_source.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VaultListing {
    id: Option<i64>,
    full_address: Option<String>,
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
    agent_id: Option<i64>,
    listed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct VaultInspection {
    id: Option<i64>,
    listing_id: Option<i64>,
    address: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    agent_id: Option<i64>,
    attendee_count: Option<u32>,
}

#[derive(Debug, Serialize)]
struct VaultNoteWrite {
    contact_id: Option<String>,
    listing_id: Option<String>,
    category: String,
    subject: String,
    body: Option<String>,
    activity_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct VaultTaskWrite {
    contact_id: Option<String>,
    listing_id: Option<String>,
    subject: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    priority: u8,
    assigned_to_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VaultCreated {
    id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_stringified() {
        let raw: VaultContact = serde_json::from_value(serde_json::json!({
            "id": 40213,
            "display_name": "Jane Citizen"
        }))
        .unwrap();

        let contact = map_contact(raw);
        assert_eq!(contact.external_id, "40213");
        assert_eq!(contact.crm_source, "vaultre");
    }

    #[test]
    fn test_display_name_preferred_over_parts() {
        let raw: VaultContact = serde_json::from_value(serde_json::json!({
            "id": 1,
            "display_name": "Dr Jane Citizen",
            "first_name": "Jane",
            "last_name": "Citizen"
        }))
        .unwrap();

        assert_eq!(map_contact(raw).full_name, "Dr Jane Citizen");
    }

    #[test]
    fn test_owner_classified_as_landlord() {
        assert_eq!(
            parse_classification(Some("owner")),
            ContactClassification::Landlord
        );
    }

    #[test]
    fn test_conditional_status_is_under_contract() {
        assert_eq!(
            parse_listing_status(Some("conditional")),
            ListingStatus::UnderContract
        );
        assert_eq!(parse_listing_status(Some("settled")), ListingStatus::Sold);
    }

    #[test]
    fn test_unrecognized_status_defaults_to_active() {
        assert_eq!(
            parse_listing_status(Some("coming_soon")),
            ListingStatus::Active
        );
    }

    #[test]
    fn test_priority_mapping_is_total() {
        assert_eq!(map_priority(TaskPriority::Low), 1);
        assert_eq!(map_priority(TaskPriority::Normal), 2);
        assert_eq!(map_priority(TaskPriority::High), 3);
        assert_eq!(map_priority(TaskPriority::Urgent), 4);
    }

    #[test]
    fn test_unmapped_activity_category_is_note() {
        assert_eq!(map_activity_category(ActivityType::Task), "Note");
        assert_eq!(map_activity_category(ActivityType::Call), "Phone Call");
    }

    #[test]
    fn test_list_envelope_tolerates_missing_items() {
        let envelope: VaultList<VaultContact> =
            serde_json::from_value(serde_json::json!({ "total_count": 0 })).unwrap();
        assert!(envelope.items.is_empty());
    }
}
