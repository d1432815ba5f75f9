//! Tests for the normalized CRM model

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{AgentId, PageRequest, PagedResult};
use domain_crm::{
    Activity, ActivityType, AgentCrmSettings, Contact, ContactClassification, ConnectionResult,
    Credentials, ListingStatus, Property, PropertyType, Task, TaskPriority,
};

// ============================================================================
// Contact Tests
// ============================================================================

mod contact_tests {
    use super::*;

    #[test]
    fn test_identity_pair() {
        let contact = Contact::new("40213", "vaultre");
        assert_eq!(contact.identity(), ("40213", "vaultre"));
    }

    #[test]
    fn test_same_external_id_different_source_is_different_identity() {
        let rex = Contact::new("1001", "rex");
        let vault = Contact::new("1001", "vaultre");
        assert_ne!(rex.identity(), vault.identity());
    }

    #[test]
    fn test_classification_serde_roundtrip() {
        let all = [
            ContactClassification::Unknown,
            ContactClassification::Buyer,
            ContactClassification::Seller,
            ContactClassification::Investor,
            ContactClassification::Tenant,
            ContactClassification::Landlord,
            ContactClassification::Vendor,
            ContactClassification::OtherAgent,
        ];

        for classification in all {
            let json = serde_json::to_string(&classification).unwrap();
            let back: ContactClassification = serde_json::from_str(&json).unwrap();
            assert_eq!(classification, back);
        }
    }

    #[test]
    fn test_contact_serde_roundtrip() {
        let mut contact = Contact::new("c-1", "rex");
        contact.full_name = "Jane Citizen".to_string();
        contact.email = Some("jane@example.com".to_string());
        contact
            .custom_fields
            .insert("campaign".to_string(), "spring-2025".to_string());

        let json = serde_json::to_string(&contact).unwrap();
        let back: Contact = serde_json::from_str(&json).unwrap();
        assert_eq!(contact, back);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    #[test]
    fn test_property_defaults() {
        let property = Property::new("p-1", "rex", "1 High St");
        assert_eq!(property.property_type, PropertyType::House);
        assert_eq!(property.status, ListingStatus::Active);
    }

    #[test]
    fn test_price_range() {
        let mut property = Property::new("p-1", "rex", "1 High St");
        property.price_from = Some(dec!(800000));
        property.price_to = Some(dec!(880000));
        property.price_display = Some("$800k - $880k".to_string());

        let json = serde_json::to_string(&property).unwrap();
        let back: Property = serde_json::from_str(&json).unwrap();
        assert_eq!(back.price_from, Some(dec!(800000)));
    }
}

// ============================================================================
// Activity & Task Tests
// ============================================================================

mod activity_tests {
    use super::*;

    #[test]
    fn test_default_activity_type_is_note() {
        assert_eq!(ActivityType::default(), ActivityType::Note);
    }

    #[test]
    fn test_default_priority_is_normal() {
        assert_eq!(TaskPriority::default(), TaskPriority::Normal);
    }

    #[test]
    fn test_call_activity_with_duration() {
        let mut activity = Activity::call("c-9", "Buyer call-back");
        activity.duration_secs = Some(420);
        activity.timestamp = Utc.with_ymd_and_hms(2025, 6, 14, 9, 30, 0).unwrap();

        assert_eq!(activity.duration_minutes(), Some(7));
        assert_eq!(activity.contact_id.as_deref(), Some("c-9"));
    }

    #[test]
    fn test_task_due_builder() {
        let due = Utc.with_ymd_and_hms(2025, 6, 20, 17, 0, 0).unwrap();
        let task = Task::new("Chase contract").due(due);
        assert_eq!(task.due_date, Some(due));
    }
}

// ============================================================================
// Credentials & Settings Tests
// ============================================================================

mod credentials_tests {
    use super::*;

    #[test]
    fn test_connection_result_failed_keeps_message() {
        let result = ConnectionResult::failed("Unknown CRM: acme");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown CRM: acme"));
        assert!(result.agent_name.is_none());
    }

    #[test]
    fn test_settings_single_binding_shape() {
        let agent_id = AgentId::new();
        let settings = AgentCrmSettings::new(
            agent_id,
            "agentbox",
            Credentials::with_access_token(agent_id, "tok"),
        );

        assert_eq!(settings.crm_id, "agentbox");
        assert_eq!(settings.agent_id, agent_id);
        assert!(settings.last_sync_at.is_none());
    }

    #[test]
    fn test_credentials_survive_json_storage() {
        let agent_id = AgentId::new();
        let mut creds = Credentials::with_api_key(agent_id, "key-123");
        creds
            .additional_settings
            .insert("office_id".to_string(), "77".to_string());

        let json = serde_json::to_string(&creds).unwrap();
        let back: Credentials = serde_json::from_str(&json).unwrap();
        assert_eq!(creds, back);
    }
}

// ============================================================================
// Paging Tests (through domain usage)
// ============================================================================

mod paging_tests {
    use super::*;

    #[test]
    fn test_contact_page_of_240_items() {
        let page: PagedResult<Contact> = PagedResult::new(Vec::new(), 1, 100, 240);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next_page());

        let last: PagedResult<Contact> = PagedResult::new(Vec::new(), 3, 100, 240);
        assert!(!last.has_next_page());
    }

    #[test]
    fn test_page_request_walk() {
        let mut request = PageRequest::first();
        assert_eq!(request.page, 1);
        request = request.next();
        request = request.next();
        assert_eq!(request.page, 3);
        assert_eq!(request.offset(), 200);
    }
}
