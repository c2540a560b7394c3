//! Enumerations and field types for the task board.
//!
//! This module defines the closed status enumeration shared by tasks and
//! subtasks, along with its wire, display and style-class derivations.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a task.
///
/// The first four variants are the board columns. `Completed` and
/// `Cancelled` never render as columns but appear on the wire for finished
/// work; together with `Closed` they form the terminal statuses that
/// suppress the overdue derivation. `Completed` is also the value counted
/// by subtask progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Awaiting,
    Started,
    Closed,
    Overdue,
    Completed,
    Cancelled,
}

impl Default for Status {
    fn default() -> Self {
        Status::Awaiting
    }
}

impl Status {
    /// Board columns, in display order.
    pub const COLUMNS: [Status; 4] = [
        Status::Awaiting,
        Status::Started,
        Status::Closed,
        Status::Overdue,
    ];

    /// Whether this status ends a task's lifecycle. Terminal tasks are
    /// never flagged overdue.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Closed | Status::Completed | Status::Cancelled)
    }

    /// Style tag for card rendering: the wire value lower-cased with
    /// underscores turned into hyphens.
    pub fn style_tag(self) -> &'static str {
        match self {
            Status::Awaiting => "awaiting",
            Status::Started => "started",
            Status::Closed => "closed",
            Status::Overdue => "overdue",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
        }
    }

    /// Human-readable column label.
    pub fn label(self) -> &'static str {
        match self {
            Status::Awaiting => "Awaiting",
            Status::Started => "Started",
            Status::Closed => "Closed",
            Status::Overdue => "Overdue",
            Status::Completed => "Completed",
            Status::Cancelled => "Cancelled",
        }
    }
}
