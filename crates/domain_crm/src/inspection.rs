//! Open-home inspection events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An upcoming open-home or private viewing pulled from the agent's CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    /// Provider-native identifier
    pub external_id: String,
    /// Provider-native id of the property being inspected
    pub property_id: String,
    pub property_address: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Provider-native id of the hosting agent
    pub agent_id: Option<String>,
    /// Confirmed attendee count, where the provider tracks RSVPs
    pub rsvp_count: Option<u32>,
}

impl Inspection {
    /// Duration of the inspection window
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_duration() {
        let inspection = Inspection {
            external_id: "i-1".to_string(),
            property_id: "p-1".to_string(),
            property_address: Some("1 High St".to_string()),
            start_time: Utc.with_ymd_and_hms(2025, 6, 14, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 6, 14, 10, 30, 0).unwrap(),
            agent_id: None,
            rsvp_count: Some(12),
        };

        assert_eq!(inspection.duration(), chrono::Duration::minutes(30));
    }
}
