//! Credentials and agent connection settings
//!
//! `Credentials` is an opaque bag of whatever a provider needs to
//! authenticate. The hub never inspects it; each adapter picks the fields
//! its provider understands inside its own request-building step, and
//! adapters never mutate it (they are stateless per call).

use chrono::{DateTime, Utc};
use core_kernel::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Connection credentials for one agent against one CRM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    /// The platform agent these credentials belong to
    pub agent_id: AgentId,
    pub api_key: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    /// Overrides the adapter's default API base URL (sandbox, regional
    /// endpoints)
    pub base_url: Option<String>,
    /// Free-form provider-specific settings
    pub additional_settings: HashMap<String, String>,
}

impl Credentials {
    /// Creates an empty credential bag for an agent
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            api_key: None,
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            token_expiry: None,
            base_url: None,
            additional_settings: HashMap::new(),
        }
    }

    /// Creates credentials authenticating with an API key
    pub fn with_api_key(agent_id: AgentId, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::new(agent_id)
        }
    }

    /// Creates credentials authenticating with a bearer access token
    pub fn with_access_token(agent_id: AgentId, access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::new(agent_id)
        }
    }

    /// Sets a base URL override
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The base URL to use, falling back to the adapter's default
    pub fn base_url_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url.as_deref().unwrap_or(default)
    }
}

/// Result of testing a connection to a CRM provider.
///
/// Connection tests never surface auth or transport failures as errors;
/// they report them here so the caller can show an actionable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionResult {
    pub success: bool,
    pub error: Option<String>,
    /// Name of the authenticated agent, as the provider knows them
    pub agent_name: Option<String>,
    /// Name of the agent's office
    pub office_name: Option<String>,
}

impl ConnectionResult {
    /// A successful connection test
    pub fn ok(agent_name: Option<String>, office_name: Option<String>) -> Self {
        Self {
            success: true,
            error: None,
            agent_name,
            office_name,
        }
    }

    /// A failed connection test with a human-readable reason
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            agent_name: None,
            office_name: None,
        }
    }
}

/// Binds one agent to exactly one CRM provider.
///
/// Created when an agent completes a successful import, read on every
/// agent-scoped hub call, deleted on disconnect. One agent has at most one
/// active binding at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCrmSettings {
    pub agent_id: AgentId,
    /// Registry id of the bound provider ("rex", "agentbox", "vaultre")
    pub crm_id: String,
    /// The agent's id within the provider, where known
    pub crm_agent_id: Option<String>,
    pub credentials: Credentials,
    pub connected_at: DateTime<Utc>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl AgentCrmSettings {
    /// Creates a binding stamped with the current time
    pub fn new(agent_id: AgentId, crm_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            agent_id,
            crm_id: crm_id.into(),
            crm_agent_id: None,
            credentials,
            connected_at: Utc::now(),
            last_sync_at: None,
        }
    }

    /// Records a completed sync at the current time
    pub fn mark_synced(&mut self) {
        self.last_sync_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_override() {
        let agent_id = AgentId::new();
        let creds = Credentials::with_api_key(agent_id, "key")
            .with_base_url("https://sandbox.example.com");

        assert_eq!(
            creds.base_url_or("https://api.example.com"),
            "https://sandbox.example.com"
        );
    }

    #[test]
    fn test_base_url_default() {
        let creds = Credentials::new(AgentId::new());
        assert_eq!(
            creds.base_url_or("https://api.example.com"),
            "https://api.example.com"
        );
    }

    #[test]
    fn test_connection_result_constructors() {
        let ok = ConnectionResult::ok(Some("Jane Citizen".to_string()), None);
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = ConnectionResult::failed("HTTP 401: Unauthorized");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("HTTP 401: Unauthorized"));
    }

    #[test]
    fn test_settings_serde_roundtrip() {
        let agent_id = AgentId::new();
        let settings = AgentCrmSettings::new(
            agent_id,
            "vaultre",
            Credentials::with_access_token(agent_id, "tok-123"),
        );

        let json = serde_json::to_string(&settings).unwrap();
        let back: AgentCrmSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn test_mark_synced() {
        let agent_id = AgentId::new();
        let mut settings =
            AgentCrmSettings::new(agent_id, "rex", Credentials::new(agent_id));
        assert!(settings.last_sync_at.is_none());

        settings.mark_synced();
        assert!(settings.last_sync_at.is_some());
    }
}
