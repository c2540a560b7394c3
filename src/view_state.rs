//! Transient view state for the board UI.
//!
//! Dropdown visibility, the detail modal and the add-forms never touch the
//! gateway; they reset wholesale when the modal closes. Open dropdowns are
//! a keyed set rather than per-entity flag maps, so entries cannot outlive
//! the entities they describe.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::BoardError;
use crate::fields::Status;
use crate::task::Task;

/// Which picker a dropdown entry belongs to. At most one dropdown per kind
/// is open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropdownKind {
    OwnerPicker,
    StatusPicker,
}

/// UI-local state for the board and the task detail modal.
#[derive(Debug, Default)]
pub struct ViewState {
    open_dropdowns: HashSet<(DropdownKind, String)>,
    /// Task currently shown in the detail modal, by id.
    pub selected_task: Option<String>,
    pub name_draft: String,
    pub start_date_draft: String,
    pub due_date_draft: String,
    /// Column whose quick-add form is open.
    pub quick_add_column: Option<Status>,
    pub new_task_title: String,
    pub adding_subtask: bool,
    pub new_subtask_title: String,
}

impl ViewState {
    pub fn new() -> Self {
        ViewState::default()
    }

    /// Toggle one dropdown. Opening an entry closes every other entry of
    /// the same kind.
    pub fn toggle_dropdown(&mut self, kind: DropdownKind, id: &str) {
        let key = (kind, id.to_string());
        if self.open_dropdowns.contains(&key) {
            self.open_dropdowns.remove(&key);
        } else {
            self.open_dropdowns.retain(|(k, _)| *k != kind);
            self.open_dropdowns.insert(key);
        }
    }

    pub fn is_dropdown_open(&self, kind: DropdownKind, id: &str) -> bool {
        self.open_dropdowns.contains(&(kind, id.to_string()))
    }

    pub fn close_dropdown(&mut self, kind: DropdownKind, id: &str) {
        self.open_dropdowns.remove(&(kind, id.to_string()));
    }

    /// Open the detail modal for `task`, seeding the editor drafts from
    /// its current values.
    pub fn open_details(&mut self, task: &Task) {
        self.selected_task = task.id.clone();
        self.name_draft = task.name.clone();
        self.start_date_draft = task
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        self.due_date_draft = task.due_date.map(|d| d.to_string()).unwrap_or_default();
        self.adding_subtask = false;
        self.new_subtask_title.clear();
    }

    /// Close the modal and drop every transient entry tied to it.
    pub fn close_details(&mut self) {
        self.selected_task = None;
        self.name_draft.clear();
        self.start_date_draft.clear();
        self.due_date_draft.clear();
        self.adding_subtask = false;
        self.new_subtask_title.clear();
        self.open_dropdowns.clear();
    }

    pub fn open_quick_add(&mut self, column: Status) {
        self.quick_add_column = Some(column);
        self.new_task_title.clear();
    }

    pub fn cancel_quick_add(&mut self) {
        self.quick_add_column = None;
        self.new_task_title.clear();
    }

    pub fn open_add_subtask(&mut self) {
        self.adding_subtask = true;
        self.new_subtask_title.clear();
    }

    pub fn cancel_add_subtask(&mut self) {
        self.adding_subtask = false;
        self.new_subtask_title.clear();
    }
}

/// Normalise a date editor draft before it reaches the gateway: an empty
/// draft means "no date set", anything else must be a strict ISO date.
pub fn parse_date_draft(draft: &str) -> Result<Option<NaiveDate>, BoardError> {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BoardError::ValidationFailed {
            detail: format!("not a valid date: {trimmed:?}"),
        })
}
