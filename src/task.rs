//! Task and user data structures.
//!
//! This module defines the core `Task` struct shared by parent tasks and
//! subtasks, the lightweight parent stub carried by subtasks, and the
//! `User` record referenced by task owners. Wire quirks (date-only ISO
//! strings, empty string meaning "no date set") are normalised here at the
//! serde boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::fields::Status;

/// Lightweight reference to a parent task, carried by subtasks instead of
/// the full parent object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParentRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A unit of work on the board.
///
/// The same structure serves parent tasks and subtasks: a subtask carries a
/// `parent` stub and lives in its parent's `children` sequence, newest
/// first. A task without an `id` has not been persisted yet; the server
/// assigns identifiers on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "iso_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Owner by user id. Resolved against the board's user table, never
    /// embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Task>>,
}

impl Task {
    /// Draft for a new top-level task. The server assigns the id.
    pub fn new(name: impl Into<String>) -> Self {
        Task {
            id: None,
            name: name.into(),
            status: Status::Awaiting,
            start_date: None,
            due_date: None,
            owner: None,
            parent: None,
            children: None,
        }
    }

    /// Draft for a subtask of the task identified by `parent_id`, carrying
    /// the parent stub the creation endpoint expects.
    pub fn subtask_of(parent_id: impl Into<String>, name: impl Into<String>) -> Self {
        Task {
            parent: Some(ParentRef {
                id: parent_id.into(),
                name: String::new(),
            }),
            ..Task::new(name)
        }
    }

    /// The server-assigned id, or the local refusal for unsaved drafts.
    pub fn persisted_id(&self) -> Result<&str, BoardError> {
        self.id
            .as_deref()
            .ok_or(BoardError::MissingIdentifier { entity: "task" })
    }

    /// Whether this task has at least one subtask.
    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A user that tasks can reference as owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Date-only wire format. Dates travel as ISO `YYYY-MM-DD` strings; both a
/// missing field and an empty string mean "no date set".
mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_date_normalises_to_none() {
        let task: Task =
            serde_json::from_str(r#"{"name":"Draft","dueDate":"","startDate":"  "}"#).unwrap();
        assert_eq!(task.start_date, None);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn test_iso_date_round_trip() {
        let task: Task =
            serde_json::from_str(r#"{"name":"Draft","dueDate":"2024-01-01"}"#).unwrap();
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 1, 1));

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"dueDate\":\"2024-01-01\""));
        assert!(!json.contains("startDate"));
    }

    #[test]
    fn test_minimal_wire_task_defaults() {
        let task: Task = serde_json::from_str(r#"{"name":"Draft"}"#).unwrap();
        assert_eq!(task.id, None);
        assert_eq!(task.status, Status::Awaiting);
        assert!(task.children.is_none());
        assert!(!task.has_children());
    }

    #[test]
    fn test_subtask_draft_carries_parent_stub() {
        let draft = Task::subtask_of("7", "Write tests");
        assert_eq!(draft.id, None);
        assert_eq!(draft.status, Status::Awaiting);
        let parent = draft.parent.unwrap();
        assert_eq!(parent.id, "7");
        assert_eq!(parent.name, "");
    }

    #[test]
    fn test_persisted_id_refuses_drafts() {
        let draft = Task::new("Draft");
        assert!(matches!(
            draft.persisted_id(),
            Err(BoardError::MissingIdentifier { .. })
        ));

        let mut saved = Task::new("Saved");
        saved.id = Some("1".into());
        assert_eq!(saved.persisted_id().unwrap(), "1");
    }
}
