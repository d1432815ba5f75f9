//! Strongly-typed identifiers for platform entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types. Identifiers originating
//! in external CRM systems are plain strings and stay on the domain models;
//! only platform-owned entities get a typed id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Platform identifiers
define_id!(AgentId, "AGT");

// Operational identifiers
define_id!(ImportJobId, "IMP");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_display_includes_prefix() {
        let id = AgentId::new();
        assert!(id.to_string().starts_with("AGT-"));
    }

    #[test]
    fn test_agent_id_roundtrip_with_prefix() {
        let id = AgentId::new();
        let parsed: AgentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_agent_id_parses_bare_uuid() {
        let uuid = Uuid::new_v4();
        let parsed: AgentId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.as_uuid(), &uuid);
    }

    #[test]
    fn test_serde_transparent() {
        let id = ImportJobId::new();
        let json = serde_json::to_string(&id).unwrap();
        // Serializes as a bare UUID string, no prefix
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }

    #[test]
    fn test_ids_are_distinct_types() {
        // Compile-time property; just exercise both constructors
        let agent = AgentId::new_v7();
        let job = ImportJobId::new_v7();
        assert_ne!(agent.as_uuid(), job.as_uuid());
    }
}
