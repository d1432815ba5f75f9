//! Unit tests for the Identifiers module
//!
//! Tests cover identifier creation, parsing, conversion, and display
//! formatting.

use core_kernel::{AgentId, ImportJobId};
use uuid::Uuid;

mod agent_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = AgentId::new();
        let id2 = AgentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = AgentId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = AgentId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = AgentId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(AgentId::prefix(), "AGT");
    }

    #[test]
    fn test_display_format() {
        let id = AgentId::new();
        assert!(id.to_string().starts_with("AGT-"));
    }

    #[test]
    fn test_from_str_with_prefix() {
        let original = AgentId::new();
        let parsed: AgentId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_from_str_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed: AgentId = uuid.to_string().parse().unwrap();
        assert_eq!(*parsed.as_uuid(), uuid);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        let result: Result<AgentId, _> = "not-a-uuid".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = AgentId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

mod import_job_id_tests {
    use super::*;

    #[test]
    fn test_prefix() {
        assert_eq!(ImportJobId::prefix(), "IMP");
    }

    #[test]
    fn test_display_roundtrip() {
        let id = ImportJobId::new();
        let parsed: ImportJobId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
