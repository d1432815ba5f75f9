//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the fields they care about.

use chrono::{DateTime, Utc};
use domain_crm::{Contact, ContactClassification, ListingStatus, Property, PropertyType};

/// Builder for test contacts
pub struct TestContactBuilder {
    contact: Contact,
}

impl Default for TestContactBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContactBuilder {
    /// Creates a builder with a generic rex-sourced contact
    pub fn new() -> Self {
        let mut contact = Contact::new("c-0001", "rex");
        contact.full_name = "Test Contact".to_string();
        Self { contact }
    }

    /// Sets the external id
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.contact.external_id = external_id.into();
        self
    }

    /// Sets the source provider
    pub fn with_crm_source(mut self, crm_source: impl Into<String>) -> Self {
        self.contact.crm_source = crm_source.into();
        self
    }

    /// Sets the full name
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.contact.full_name = full_name.into();
        self
    }

    /// Sets the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.contact.email = Some(email.into());
        self
    }

    /// Sets the mobile number
    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.contact.mobile = Some(mobile.into());
        self
    }

    /// Sets the classification
    pub fn with_classification(mut self, classification: ContactClassification) -> Self {
        self.contact.classification = classification;
        self
    }

    /// Sets the provider update timestamp
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.contact.updated_at = updated_at;
        self
    }

    /// Finishes the build
    pub fn build(self) -> Contact {
        self.contact
    }
}

/// Builder for test properties
pub struct TestPropertyBuilder {
    property: Property,
}

impl Default for TestPropertyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPropertyBuilder {
    /// Creates a builder with a generic active house listing
    pub fn new() -> Self {
        Self {
            property: Property::new("p-0001", "rex", "1 Test Street"),
        }
    }

    /// Sets the external id
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.property.external_id = external_id.into();
        self
    }

    /// Sets the address line
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.property.address = address.into();
        self
    }

    /// Sets the property type
    pub fn with_property_type(mut self, property_type: PropertyType) -> Self {
        self.property.property_type = property_type;
        self
    }

    /// Sets the listing status
    pub fn with_status(mut self, status: ListingStatus) -> Self {
        self.property.status = status;
        self
    }

    /// Finishes the build
    pub fn build(self) -> Property {
        self.property
    }
}
