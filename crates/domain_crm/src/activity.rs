//! Activities and follow-up tasks
//!
//! An `Activity` is an interaction already had (a call that just ended, a
//! note, an inspection attended); a `Task` is work still to do. Both are
//! written *to* the agent's CRM, never read back, so neither carries an
//! external id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of interaction being logged.
///
/// Providers have their own vocabularies (journal type ids, note
/// categories); adapters map this enum outbound and fall back to the
/// provider's generic "note" bucket for anything unmapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    #[default]
    Note,
    Call,
    Email,
    Sms,
    Inspection,
    Meeting,
    Task,
}

/// An interaction to log against a contact and/or property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Provider-native contact id this activity relates to
    pub contact_id: Option<String>,
    /// Provider-native property id this activity relates to
    pub property_id: Option<String>,
    pub activity_type: ActivityType,
    pub subject: String,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: Option<u32>,
    pub metadata: HashMap<String, String>,
}

impl Activity {
    /// Creates an activity stamped with the current time
    pub fn new(activity_type: ActivityType, subject: impl Into<String>) -> Self {
        Self {
            contact_id: None,
            property_id: None,
            activity_type,
            subject: subject.into(),
            description: None,
            timestamp: Utc::now(),
            duration_secs: None,
            metadata: HashMap::new(),
        }
    }

    /// Creates a call activity for the given contact
    pub fn call(contact_id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            contact_id: Some(contact_id.into()),
            ..Self::new(ActivityType::Call, subject)
        }
    }

    /// Call duration in whole minutes, for providers that count minutes
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_secs.map(|secs| secs / 60)
    }
}

/// Priority of a follow-up task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// A follow-up task to create in the agent's CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Provider-native contact id this task relates to
    pub contact_id: Option<String>,
    /// Provider-native property id this task relates to
    pub property_id: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    /// Provider-native id of the agent the task is assigned to
    pub assigned_to_agent_id: Option<String>,
}

impl Task {
    /// Creates a task with default (normal) priority
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            contact_id: None,
            property_id: None,
            subject: subject.into(),
            description: None,
            due_date: None,
            priority: TaskPriority::Normal,
            assigned_to_agent_id: None,
        }
    }

    /// Attaches the task to a contact
    pub fn for_contact(mut self, contact_id: impl Into<String>) -> Self {
        self.contact_id = Some(contact_id.into());
        self
    }

    /// Sets the due date
    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_defaults() {
        let activity = Activity::new(ActivityType::Note, "Left voicemail");
        assert_eq!(activity.activity_type, ActivityType::Note);
        assert!(activity.contact_id.is_none());
    }

    #[test]
    fn test_call_constructor_links_contact() {
        let activity = Activity::call("c-42", "Called about 1 High St");
        assert_eq!(activity.activity_type, ActivityType::Call);
        assert_eq!(activity.contact_id.as_deref(), Some("c-42"));
    }

    #[test]
    fn test_duration_minutes_truncates() {
        let mut activity = Activity::call("c-42", "Quick call");
        activity.duration_secs = Some(150);
        assert_eq!(activity.duration_minutes(), Some(2));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(TaskPriority::Urgent > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Normal);
        assert!(TaskPriority::Normal > TaskPriority::Low);
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new("Send contract")
            .for_contact("c-7")
            .with_priority(TaskPriority::High);

        assert_eq!(task.contact_id.as_deref(), Some("c-7"));
        assert_eq!(task.priority, TaskPriority::High);
        assert!(task.due_date.is_none());
    }
}
