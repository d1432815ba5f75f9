//! Test Data Fixtures
//!
//! Pre-built entities for common test scenarios. Fixtures are grouped into
//! small namespace structs so call sites read like
//! `ContactFixtures::jane("rex")`.

use chrono::{Duration, Utc};
use core_kernel::AgentId;
use domain_crm::{
    Activity, ActivityType, Contact, ContactClassification, Credentials, Inspection, Property,
    Task, TaskPriority,
};

/// Credential fixtures
pub struct CredentialFixtures;

impl CredentialFixtures {
    /// API-key credentials for a fresh agent
    pub fn api_key() -> Credentials {
        Credentials::with_api_key(AgentId::new(), "test-api-key")
    }

    /// API-key credentials for a known agent
    pub fn api_key_for(agent_id: AgentId) -> Credentials {
        Credentials::with_api_key(agent_id, "test-api-key")
    }

    /// Bearer-token credentials for a known agent
    pub fn bearer_for(agent_id: AgentId) -> Credentials {
        Credentials::with_access_token(agent_id, "test-access-token")
    }
}

/// Contact fixtures
pub struct ContactFixtures;

impl ContactFixtures {
    /// A fully populated buyer contact
    pub fn jane(crm_source: &str) -> Contact {
        let mut contact = Contact::new("c-jane", crm_source);
        contact.full_name = "Jane Citizen".to_string();
        contact.first_name = Some("Jane".to_string());
        contact.last_name = Some("Citizen".to_string());
        contact.email = Some("jane.citizen@example.com".to_string());
        contact.mobile = Some("+61412345678".to_string());
        contact.classification = ContactClassification::Buyer;
        contact.lead_source = Some("portal-enquiry".to_string());
        contact
    }

    /// A batch of `count` contacts with sequential external ids
    ///
    /// Ids continue from `start`, so consecutive batches form the pages of
    /// one provider data set.
    pub fn batch(crm_source: &str, start: u32, count: u32) -> Vec<Contact> {
        (start..start + count)
            .map(|n| {
                let mut contact = Contact::new(format!("c-{n:05}"), crm_source);
                contact.full_name = format!("Contact {n}");
                contact.mobile = Some(format!("+6140000{n:04}"));
                contact
            })
            .collect()
    }

    /// Pages of batch contacts with the given sizes, e.g. `[100, 100, 40]`
    pub fn pages(crm_source: &str, sizes: &[u32]) -> Vec<Vec<Contact>> {
        let mut start = 1;
        sizes
            .iter()
            .map(|&size| {
                let page = Self::batch(crm_source, start, size);
                start += size;
                page
            })
            .collect()
    }
}

/// Property fixtures
pub struct PropertyFixtures;

impl PropertyFixtures {
    /// An active four-bedroom house listing
    pub fn high_street(crm_source: &str) -> Property {
        let mut property = Property::new("p-high-st", crm_source, "12 High Street");
        property.suburb = Some("Newtown".to_string());
        property.state = Some("NSW".to_string());
        property.postcode = Some("2042".to_string());
        property.bedrooms = Some(4);
        property.bathrooms = Some(2);
        property.car_spaces = Some(1);
        property.price_display = Some("$1.2m - $1.3m".to_string());
        property
    }
}

/// Activity and task fixtures
pub struct ActivityFixtures;

impl ActivityFixtures {
    /// A finished seven-minute call against a contact
    pub fn buyer_call() -> Activity {
        let mut activity = Activity::call("c-jane", "Call with buyer");
        activity.description = Some("Discussed offer strategy for 12 High Street".to_string());
        activity.duration_secs = Some(420);
        activity
    }

    /// A note with no linked contact or property
    pub fn orphan_note() -> Activity {
        Activity::new(ActivityType::Note, "Unlinked note")
    }

    /// A high-priority follow-up due tomorrow
    pub fn follow_up() -> Task {
        Task::new("Send contract of sale")
            .for_contact("c-jane")
            .due(Utc::now() + Duration::days(1))
            .with_priority(TaskPriority::High)
    }
}

/// Inspection fixtures
pub struct InspectionFixtures;

impl InspectionFixtures {
    /// A half-hour open home next Saturday morning
    pub fn open_home(agent_id: Option<&str>) -> Inspection {
        let start = Utc::now() + Duration::days(2);
        Inspection {
            external_id: "insp-1".to_string(),
            property_id: "p-high-st".to_string(),
            property_address: Some("12 High Street, Newtown".to_string()),
            start_time: start,
            end_time: start + Duration::minutes(30),
            agent_id: agent_id.map(str::to_owned),
            rsvp_count: Some(9),
        }
    }
}
