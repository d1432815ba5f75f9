//! Normalized property listing model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Physical type of a listed property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    #[default]
    House,
    Unit,
    Apartment,
    Townhouse,
    Land,
    Rural,
    Commercial,
}

/// Where a listing sits in its sales lifecycle.
///
/// Adapters default unrecognized provider statuses to `Active` - most
/// records a provider returns from a listing query are live listings, so
/// Active is the least-wrong guess for a vocabulary miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingStatus {
    #[default]
    Active,
    UnderContract,
    Sold,
    Withdrawn,
    OffMarket,
}

/// A property listing normalized from a CRM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Provider-native identifier
    pub external_id: String,
    /// Id of the CRM provider this listing came from
    pub crm_source: String,
    pub address: String,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub property_type: PropertyType,
    pub status: ListingStatus,
    pub price_from: Option<Decimal>,
    pub price_to: Option<Decimal>,
    /// Marketing price string exactly as the provider displays it
    pub price_display: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub car_spaces: Option<u32>,
    /// Provider-native id of the listing agent
    pub agent_id: Option<String>,
    pub listed_date: Option<DateTime<Utc>>,
}

impl Property {
    /// Creates a listing with the given identity and address
    pub fn new(
        external_id: impl Into<String>,
        crm_source: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            crm_source: crm_source.into(),
            address: address.into(),
            suburb: None,
            state: None,
            postcode: None,
            property_type: PropertyType::House,
            status: ListingStatus::Active,
            price_from: None,
            price_to: None,
            price_display: None,
            bedrooms: None,
            bathrooms: None,
            car_spaces: None,
            agent_id: None,
            listed_date: None,
        }
    }

    /// Whether the listing is still on the market
    pub fn is_on_market(&self) -> bool {
        matches!(
            self.status,
            ListingStatus::Active | ListingStatus::UnderContract
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let property = Property::new("p-1", "vaultre", "1 High St");
        assert_eq!(property.property_type, PropertyType::House);
        assert_eq!(property.status, ListingStatus::Active);
        assert!(property.is_on_market());
    }

    #[test]
    fn test_sold_listing_is_off_market() {
        let mut property = Property::new("p-1", "vaultre", "1 High St");
        property.status = ListingStatus::Sold;
        assert!(!property.is_on_market());
    }

    #[test]
    fn test_price_range_serde_roundtrip() {
        let mut property = Property::new("p-1", "rex", "1 High St");
        property.price_from = Some(dec!(750000));
        property.price_to = Some(dec!(825000));

        let json = serde_json::to_string(&property).unwrap();
        let back: Property = serde_json::from_str(&json).unwrap();
        assert_eq!(property, back);
    }
}
