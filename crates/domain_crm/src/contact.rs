//! Normalized contact model
//!
//! A `Contact` is a person record normalized from any CRM provider. Within
//! the integration layer a contact is identified by the pair
//! `(external_id, crm_source)` - external ids are only unique within one
//! provider, never across providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a provider classifies a contact.
///
/// Provider vocabularies differ ("vendor", "owner", "landlord", ...); each
/// adapter owns the translation into this enum, and anything it cannot
/// resolve becomes `Unknown` rather than an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactClassification {
    #[default]
    Unknown,
    Buyer,
    Seller,
    Investor,
    Tenant,
    Landlord,
    Vendor,
    OtherAgent,
}

/// A contact normalized from a CRM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Provider-native identifier
    pub external_id: String,
    /// Id of the CRM provider this contact came from
    pub crm_source: String,
    /// Display name as the provider reports it
    pub full_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub classification: ContactClassification,
    /// Where the lead originated, provider vocabulary
    pub lead_source: Option<String>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Provider-specific fields with no normalized equivalent
    pub custom_fields: HashMap<String, String>,
}

impl Contact {
    /// Creates a contact with the given identity and empty optional fields
    pub fn new(external_id: impl Into<String>, crm_source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            external_id: external_id.into(),
            crm_source: crm_source.into(),
            full_name: String::new(),
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            mobile: None,
            classification: ContactClassification::Unknown,
            lead_source: None,
            last_contact_date: None,
            created_at: now,
            updated_at: now,
            custom_fields: HashMap::new(),
        }
    }

    /// The identity of this contact within the integration layer
    pub fn identity(&self) -> (&str, &str) {
        (&self.external_id, &self.crm_source)
    }

    /// First name, falling back to the first word of the full name
    ///
    /// Adapters use this when building outbound payloads for providers that
    /// require split name fields.
    pub fn first_name_or_split(&self) -> Option<String> {
        self.first_name.clone().or_else(|| {
            self.full_name
                .split_whitespace()
                .next()
                .map(str::to_owned)
        })
    }

    /// Last name, falling back to everything after the first word of the
    /// full name
    pub fn last_name_or_split(&self) -> Option<String> {
        self.last_name.clone().or_else(|| {
            let mut parts = self.full_name.split_whitespace();
            parts.next()?;
            let rest = parts.collect::<Vec<_>>().join(" ");
            if rest.is_empty() {
                None
            } else {
                Some(rest)
            }
        })
    }

    /// Best phone number for matching: mobile first, then landline
    pub fn best_phone(&self) -> Option<&str> {
        self.mobile.as_deref().or(self.phone.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_default_is_unknown() {
        assert_eq!(
            ContactClassification::default(),
            ContactClassification::Unknown
        );
    }

    #[test]
    fn test_name_split_from_full_name() {
        let mut contact = Contact::new("c-1", "rex");
        contact.full_name = "Jane Maree Citizen".to_string();

        assert_eq!(contact.first_name_or_split().as_deref(), Some("Jane"));
        assert_eq!(
            contact.last_name_or_split().as_deref(),
            Some("Maree Citizen")
        );
    }

    #[test]
    fn test_name_split_prefers_explicit_fields() {
        let mut contact = Contact::new("c-1", "rex");
        contact.full_name = "Displayed Differently".to_string();
        contact.first_name = Some("Jane".to_string());
        contact.last_name = Some("Citizen".to_string());

        assert_eq!(contact.first_name_or_split().as_deref(), Some("Jane"));
        assert_eq!(contact.last_name_or_split().as_deref(), Some("Citizen"));
    }

    #[test]
    fn test_name_split_single_word() {
        let mut contact = Contact::new("c-1", "rex");
        contact.full_name = "Cher".to_string();

        assert_eq!(contact.first_name_or_split().as_deref(), Some("Cher"));
        assert_eq!(contact.last_name_or_split(), None);
    }

    #[test]
    fn test_best_phone_prefers_mobile() {
        let mut contact = Contact::new("c-1", "rex");
        contact.phone = Some("0298765432".to_string());
        contact.mobile = Some("0412345678".to_string());

        assert_eq!(contact.best_phone(), Some("0412345678"));
    }
}
