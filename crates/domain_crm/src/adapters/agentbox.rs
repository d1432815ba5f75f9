//! AgentBox adapter
//!
//! Integrates with Reapit's AgentBox platform API. AgentBox paginates with
//! `pageNumber`/`pageSize` and wraps list payloads in an
//! `_embedded`/`totalCount` envelope. Authentication is bearer-only, with a
//! pinned `api-version` header on every request. Activities are written as
//! journal entries; inspections are viewing-type appointments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_kernel::{DomainPort, PageRequest, PagedResult, PortError};

use crate::activity::{Activity, ActivityType, Task};
use crate::adapters::http::{optional_json, read_json, require_success, transport_error};
use crate::contact::{Contact, ContactClassification};
use crate::credentials::{ConnectionResult, Credentials};
use crate::inspection::Inspection;
use crate::phone;
use crate::ports::CrmAdapter;
use crate::property::{ListingStatus, Property, PropertyType};

const DEFAULT_BASE_URL: &str = "https://platform.reapit.cloud";
const API_VERSION: &str = "2021-08-01";
const CRM_ID: &str = "agentbox";

/// Adapter for the AgentBox (Reapit) CRM.
#[derive(Debug, Clone)]
pub struct AgentBoxAdapter {
    client: Client,
}

impl AgentBoxAdapter {
    /// Creates the adapter around a long-lived HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn request(&self, method: Method, path: &str, credentials: &Credentials) -> RequestBuilder {
        let base = credentials.base_url_or(DEFAULT_BASE_URL);
        let mut request = self
            .client
            .request(method, format!("{base}{path}"))
            .header("api-version", API_VERSION);

        if let Some(token) = &credentials.access_token {
            request = request.bearer_auth(token);
        }

        request
    }
}

impl DomainPort for AgentBoxAdapter {}

#[async_trait]
impl CrmAdapter for AgentBoxAdapter {
    fn crm_id(&self) -> &'static str {
        CRM_ID
    }

    fn display_name(&self) -> &'static str {
        "AgentBox"
    }

    async fn test_connection(&self, credentials: &Credentials) -> ConnectionResult {
        let send = async {
            let response = self
                .request(Method::GET, "/negotiators/me", credentials)
                .send()
                .await
                .map_err(|e| transport_error("agentbox test_connection", e))?;
            let response = require_success(response).await?;
            read_json::<AbNegotiator>(response).await
        };

        match send.await {
            Ok(negotiator) => ConnectionResult::ok(negotiator.name, negotiator.office_name),
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
            ("pageNumber".to_string(), page.page.to_string()),
            ("pageSize".to_string(), page.page_size.to_string()),
        ];
        if let Some(since) = modified_since {
            query.push(("modifiedFrom".to_string(), since.to_rfc3339()));
        }

        let response = self
            .request(Method::GET, "/contacts", credentials)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error("agentbox get_contacts", e))?;
        let response = require_success(response).await?;
        let envelope: AbPage<AbContact> = read_json(response).await?;

        // AgentBox echoes no page metadata; the request's page is the page.
        Ok(PagedResult::new(
            envelope.embedded.into_iter().map(map_contact).collect(),
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
            .map_err(|e| transport_error("agentbox get_contact_by_id", e))?;

        let contact: Option<AbContact> = optional_json(response).await?;
        Ok(contact.map(map_contact))
    }

    async fn search_contacts_by_phone(
        &self,
        credentials: &Credentials,
        phone: &str,
    ) -> Result<Vec<Contact>, PortError> {
        let normalized = phone::normalize(phone);
        let response = self
            .request(Method::GET, "/contacts", credentials)
            .query(&[("mobilePhone", normalized.as_str())])
            .send()
            .await
            .map_err(|e| transport_error("agentbox search_contacts_by_phone", e))?;
        let response = require_success(response).await?;
        let envelope: AbPage<AbContact> = read_json(response).await?;

        Ok(envelope.embedded.into_iter().map(map_contact).collect())
    }

    async fn create_contact(
        &self,
        credentials: &Credentials,
        contact: &Contact,
    ) -> Result<Contact, PortError> {
        let body = AbContactWrite::from_contact(contact);
        let response = self
            .request(Method::POST, "/contacts", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("agentbox create_contact", e))?;
        let response = require_success(response).await?;
        let created: AbContact = read_json(response).await?;

        Ok(map_contact(created))
    }

    async fn update_contact(
        &self,
        credentials: &Credentials,
        external_id: &str,
        contact: &Contact,
    ) -> Result<Contact, PortError> {
        let body = AbContactWrite::from_contact(contact);
        let response = self
            .request(
                Method::PATCH,
                &format!("/contacts/{external_id}"),
                credentials,
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("agentbox update_contact", e))?;
        let response = require_success(response).await?;
        let updated: AbContact = read_json(response).await?;

        Ok(map_contact(updated))
    }

    async fn get_properties(
        &self,
        credentials: &Credentials,
        page: PageRequest,
    ) -> Result<PagedResult<Property>, PortError> {
        let response = self
            .request(Method::GET, "/properties", credentials)
            .query(&[
                ("pageNumber", page.page.to_string()),
                ("pageSize", page.page_size.to_string()),
                ("marketingMode", "selling".to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("agentbox get_properties", e))?;
        let response = require_success(response).await?;
        let envelope: AbPage<AbProperty> = read_json(response).await?;

        Ok(PagedResult::new(
            envelope.embedded.into_iter().map(map_property).collect(),
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
            .request(
                Method::GET,
                &format!("/properties/{external_id}"),
                credentials,
            )
            .send()
            .await
            .map_err(|e| transport_error("agentbox get_property_by_id", e))?;

        let property: Option<AbProperty> = optional_json(response).await?;
        Ok(property.map(map_property))
    }

    async fn search_properties_by_address(
        &self,
        credentials: &Credentials,
        address_query: &str,
    ) -> Result<Vec<Property>, PortError> {
        let response = self
            .request(Method::GET, "/properties", credentials)
            .query(&[("address", address_query)])
            .send()
            .await
            .map_err(|e| transport_error("agentbox search_properties_by_address", e))?;
        let response = require_success(response).await?;
        let envelope: AbPage<AbProperty> = read_json(response).await?;

        Ok(envelope.embedded.into_iter().map(map_property).collect())
    }

    #[instrument(level = "debug", skip_all, fields(crm = CRM_ID))]
    async fn log_activity(
        &self,
        credentials: &Credentials,
        activity: &Activity,
    ) -> Result<String, PortError> {
        // AgentBox models activities as journal entries hung off a contact
        // or, failing that, a property.
        let (associated_type, associated_id) = match (&activity.contact_id, &activity.property_id)
        {
            (Some(contact_id), _) => ("contact", contact_id.clone()),
            (None, Some(property_id)) => ("property", property_id.clone()),
            (None, None) => ("contact", String::new()),
        };

        let description = match &activity.description {
            Some(description) => format!("{}\n\n{}", activity.subject, description),
            None => activity.subject.clone(),
        };

        let body = AbJournalEntryWrite {
            associated_type: associated_type.to_string(),
            associated_id,
            type_id: map_activity_type_id(activity.activity_type).to_string(),
            description,
            timestamp: activity.timestamp,
        };

        let response = self
            .request(Method::POST, "/journalEntries", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("agentbox log_activity", e))?;
        let response = require_success(response).await?;
        let created: AbCreated = read_json(response).await?;

        Ok(created.id.unwrap_or_default())
    }

    #[instrument(level = "debug", skip_all, fields(crm = CRM_ID))]
    async fn create_task(
        &self,
        credentials: &Credentials,
        task: &Task,
    ) -> Result<String, PortError> {
        let body = AbTaskWrite {
            contact_id: task.contact_id.clone(),
            property_id: task.property_id.clone(),
            text: task.subject.clone(),
            notes: task.description.clone(),
            activate: task.due_date,
            negotiator_id: task.assigned_to_agent_id.clone(),
        };

        let response = self
            .request(Method::POST, "/tasks", credentials)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("agentbox create_task", e))?;
        let response = require_success(response).await?;
        let created: AbCreated = read_json(response).await?;

        Ok(created.id.unwrap_or_default())
    }

    async fn upcoming_inspections(
        &self,
        credentials: &Credentials,
        agent_id: Option<&str>,
    ) -> Result<Vec<Inspection>, PortError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let mut query = vec![
            ("start".to_string(), today),
            ("type".to_string(), "viewing".to_string()),
        ];
        if let Some(id) = agent_id {
            query.push(("negotiatorId".to_string(), id.to_string()));
        }

        let response = self
            .request(Method::GET, "/appointments", credentials)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error("agentbox upcoming_inspections", e))?;
        let response = require_success(response).await?;
        let envelope: AbPage<AbAppointment> = read_json(response).await?;

        Ok(envelope.embedded.into_iter().map(map_inspection).collect())
    }
}

// ============================================================================
// Mapping
// ============================================================================

fn map_contact(ab: AbContact) -> Contact {
    let now = Utc::now();
    let forename = ab.forename.clone().unwrap_or_default();
    let surname = ab.surname.clone().unwrap_or_default();

    Contact {
        external_id: ab.id.unwrap_or_default(),
        crm_source: CRM_ID.to_string(),
        full_name: format!("{forename} {surname}").trim().to_string(),
        first_name: ab.forename,
        last_name: ab.surname,
        email: ab.email,
        phone: ab.home_phone.or(ab.work_phone),
        mobile: ab.mobile_phone,
        classification: parse_classification(ab.marketing_consent.as_deref()),
        lead_source: ab.source,
        last_contact_date: None,
        created_at: ab.created.unwrap_or(now),
        updated_at: ab.modified.unwrap_or(now),
        custom_fields: Default::default(),
    }
}

fn map_property(ab: AbProperty) -> Property {
    let address = ab.address.unwrap_or_default();
    let line = match &address.building_number {
        Some(number) => format!("{number} {}", address.line1.clone().unwrap_or_default())
            .trim()
            .to_string(),
        None => address.line1.clone().unwrap_or_default(),
    };

    let selling = ab.selling.unwrap_or_default();
    Property {
        external_id: ab.id.unwrap_or_default(),
        crm_source: CRM_ID.to_string(),
        address: line,
        suburb: address.line3,
        state: address.line4,
        postcode: address.postcode,
        property_type: parse_property_type(ab.property_type.as_deref()),
        status: parse_listing_status(selling.status.as_deref()),
        price_from: selling.price,
        price_to: None,
        price_display: None,
        bedrooms: ab.bedrooms,
        bathrooms: ab.bathrooms,
        car_spaces: None,
        agent_id: None,
        listed_date: None,
    }
}

fn map_inspection(ab: AbAppointment) -> Inspection {
    let now = Utc::now();
    Inspection {
        external_id: ab.id.unwrap_or_default(),
        property_id: ab.property_id.unwrap_or_default(),
        property_address: None,
        start_time: ab.start.unwrap_or(now),
        end_time: ab.end.unwrap_or(now + chrono::Duration::minutes(30)),
        agent_id: ab.negotiator_ids.and_then(|ids| ids.into_iter().next()),
        rsvp_count: None,
    }
}

// AgentBox has no contact-type field; marketing mode is the closest signal.
fn parse_classification(raw: Option<&str>) -> ContactClassification {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("buying") => ContactClassification::Buyer,
        Some("selling") => ContactClassification::Seller,
        _ => ContactClassification::Unknown,
    }
}

fn parse_property_type(raw: Option<&str>) -> PropertyType {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("flat") | Some("apartment") => PropertyType::Apartment,
        Some("land") => PropertyType::Land,
        _ => PropertyType::House,
    }
}

fn parse_listing_status(raw: Option<&str>) -> ListingStatus {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("underoffer") => ListingStatus::UnderContract,
        Some("sold") | Some("completed") => ListingStatus::Sold,
        Some("withdrawn") => ListingStatus::Withdrawn,
        _ => ListingStatus::Active,
    }
}

fn map_activity_type_id(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::Call => "telephoneCall",
        ActivityType::Email => "email",
        ActivityType::Sms => "sms",
        ActivityType::Inspection => "viewing",
        ActivityType::Meeting => "meeting",
        _ => "note",
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct AbPage<T> {
    #[serde(rename = "_embedded", default = "Vec::new")]
    embedded: Vec<T>,
    #[serde(rename = "totalCount")]
    total_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbNegotiator {
    name: Option<String>,
    office_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbContact {
    id: Option<String>,
    forename: Option<String>,
    surname: Option<String>,
    email: Option<String>,
    mobile_phone: Option<String>,
    home_phone: Option<String>,
    work_phone: Option<String>,
    marketing_consent: Option<String>,
    source: Option<String>,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AbContactWrite {
    forename: Option<String>,
    surname: Option<String>,
    email: Option<String>,
    mobile_phone: Option<String>,
    source: Option<String>,
}

impl AbContactWrite {
    fn from_contact(contact: &Contact) -> Self {
        Self {
            forename: contact.first_name_or_split(),
            surname: contact.last_name_or_split(),
            email: contact.email.clone(),
            mobile_phone: contact.mobile.clone().or_else(|| contact.phone.clone()),
            source: contact.lead_source.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbProperty {
    id: Option<String>,
    address: Option<AbAddress>,
    #[serde(rename = "type")]
    property_type: Option<String>,
    bedrooms: Option<u32>,
    bathrooms: Option<u32>,
    selling: Option<AbSelling>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbAddress {
    building_number: Option<String>,
    line1: Option<String>,
    line3: Option<String>,
    line4: Option<String>,
    postcode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AbSelling {
    status: Option<String>,
    price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbAppointment {
    id: Option<String>,
    property_id: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    negotiator_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AbJournalEntryWrite {
    associated_type: String,
    associated_id: String,
    type_id: String,
    description: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AbTaskWrite {
    contact_id: Option<String>,
    property_id: Option<String>,
    text: String,
    notes: Option<String>,
    activate: Option<DateTime<Utc>>,
    negotiator_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AbCreated {
    id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_only_knows_marketing_modes() {
        assert_eq!(
            parse_classification(Some("buying")),
            ContactClassification::Buyer
        );
        assert_eq!(
            parse_classification(Some("selling")),
            ContactClassification::Seller
        );
        assert_eq!(
            parse_classification(Some("renting")),
            ContactClassification::Unknown
        );
    }

    #[test]
    fn test_under_offer_status() {
        assert_eq!(
            parse_listing_status(Some("underOffer")),
            ListingStatus::UnderContract
        );
        assert_eq!(
            parse_listing_status(Some("completed")),
            ListingStatus::Sold
        );
        assert_eq!(parse_listing_status(Some("forSale")), ListingStatus::Active);
    }

    #[test]
    fn test_map_contact_prefers_home_phone_for_landline() {
        let raw: AbContact = serde_json::from_value(serde_json::json!({
            "id": "ab-1",
            "forename": "Jane",
            "surname": "Citizen",
            "homePhone": "0298765432",
            "workPhone": "0211112222",
            "mobilePhone": "0412345678"
        }))
        .unwrap();

        let contact = map_contact(raw);
        assert_eq!(contact.phone.as_deref(), Some("0298765432"));
        assert_eq!(contact.mobile.as_deref(), Some("0412345678"));
        assert_eq!(contact.crm_source, "agentbox");
    }

    #[test]
    fn test_map_property_assembles_address() {
        let raw: AbProperty = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "address": {
                "buildingNumber": "12",
                "line1": "High Street",
                "line3": "Newtown",
                "line4": "NSW",
                "postcode": "2042"
            },
            "selling": { "status": "underOffer" }
        }))
        .unwrap();

        let property = map_property(raw);
        assert_eq!(property.address, "12 High Street");
        assert_eq!(property.suburb.as_deref(), Some("Newtown"));
        assert_eq!(property.status, ListingStatus::UnderContract);
    }

    #[test]
    fn test_map_property_tolerates_missing_everything() {
        let raw: AbProperty = serde_json::from_value(serde_json::json!({})).unwrap();
        let property = map_property(raw);

        assert_eq!(property.address, "");
        assert_eq!(property.status, ListingStatus::Active);
        assert_eq!(property.property_type, PropertyType::House);
    }

    #[test]
    fn test_activity_type_ids() {
        assert_eq!(map_activity_type_id(ActivityType::Call), "telephoneCall");
        assert_eq!(map_activity_type_id(ActivityType::Inspection), "viewing");
        assert_eq!(map_activity_type_id(ActivityType::Task), "note");
    }

    #[test]
    fn test_page_envelope_field_names() {
        let envelope: AbPage<AbContact> = serde_json::from_value(serde_json::json!({
            "_embedded": [{ "id": "ab-1" }],
            "totalCount": 41
        }))
        .unwrap();

        assert_eq!(envelope.embedded.len(), 1);
        assert_eq!(envelope.total_count, Some(41));
    }
}
