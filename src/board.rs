//! Board store and view-model derivations.
//!
//! `Board` owns the in-memory task collection and the user lookup table,
//! orchestrates gateway calls for creation, deletion and field mutations,
//! and fans change notifications out to registered observers. The
//! derivations at the bottom of the module (column filtering, overdue
//! flag, subtask progress, card style class) are pure reads over that
//! state: no I/O, with "today" supplied by the caller.
//!
//! All mutation runs on one logical thread; gateway responses interleave
//! as asynchronous callbacks, never in parallel, so the collection needs
//! no locking.

use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::BoardError;
use crate::fields::Status;
use crate::gateway::{TaskGateway, UserGateway};
use crate::mutation::{apply_field_mutation, FieldPatch, PendingMutation};
use crate::reconcile;
use crate::task::{Task, User};

/// Change notification fanned out to registered observers.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    TaskCreated(String),
    TaskUpdated(String),
    TaskDeleted(String),
    UserCreated(String),
}

/// In-memory board state: the task collection and the user lookup table.
#[derive(Debug)]
pub struct Board {
    pub tasks: Vec<Task>,
    users: HashMap<String, User>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Board {
            tasks: Vec::new(),
            users: HashMap::new(),
            events,
        }
    }

    /// Register an observer for board change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: BoardEvent) {
        // No receivers is fine; notifications are best-effort.
        let _ = self.events.send(event);
    }

    /// Get a top-level task by id.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id.as_deref() == Some(id))
    }

    /// Get a mutable reference to a top-level task by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id.as_deref() == Some(id))
    }

    fn subtask_mut(&mut self, parent_id: &str, child_id: &str) -> Option<&mut Task> {
        self.get_mut(parent_id)?
            .children
            .as_mut()?
            .iter_mut()
            .find(|c| c.id.as_deref() == Some(child_id))
    }

    /// Replace the whole collection from the backend. On failure the local
    /// collection is left untouched and the error propagates.
    pub async fn refresh<G>(&mut self, gateway: &G) -> Result<(), BoardError>
    where
        G: TaskGateway + ?Sized,
    {
        self.tasks = gateway.list_tasks().await?;
        Ok(())
    }

    /// Create a top-level task from a quick-add title. The created task is
    /// appended to the collection with the server-assigned id.
    pub async fn create_task<G>(&mut self, title: &str, gateway: &G) -> Result<(), BoardError>
    where
        G: TaskGateway + ?Sized,
    {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::ValidationFailed {
                detail: "task title cannot be empty".into(),
            });
        }
        let created = gateway.create_task(&Task::new(title)).await?;
        let id = created.id.clone();
        self.tasks.push(created);
        if let Some(id) = id {
            self.emit(BoardEvent::TaskCreated(id));
        }
        Ok(())
    }

    /// Create a subtask under `parent_id`. The created subtask is prepended
    /// so the newest renders first, and the parent is reported updated.
    pub async fn create_subtask<G>(
        &mut self,
        parent_id: &str,
        title: &str,
        gateway: &G,
    ) -> Result<(), BoardError>
    where
        G: TaskGateway + ?Sized,
    {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::ValidationFailed {
                detail: "subtask title cannot be empty".into(),
            });
        }
        if self.get(parent_id).is_none() {
            warn!(parent_id, "cannot add a subtask to an unknown parent");
            return Ok(());
        }
        let created = gateway.create_task(&Task::subtask_of(parent_id, title)).await?;
        if let Some(parent) = self.get_mut(parent_id) {
            reconcile::insert_child(parent, created);
        }
        self.emit(BoardEvent::TaskUpdated(parent_id.to_string()));
        Ok(())
    }

    /// Delete a task. The server cascades into subtasks; the local mirror
    /// of that cascade is dropping the task's whole subtree here.
    pub async fn delete_task<G>(&mut self, id: &str, gateway: &G) -> Result<(), BoardError>
    where
        G: TaskGateway + ?Sized,
    {
        gateway.delete_task(id).await?;
        self.remove_local(id);
        self.emit(BoardEvent::TaskDeleted(id.to_string()));
        Ok(())
    }

    fn remove_local(&mut self, id: &str) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id.as_deref() != Some(id));
        if self.tasks.len() == before {
            // Not a top-level task: prune it from any subtask sequence.
            for parent in &mut self.tasks {
                if let Some(children) = parent.children.as_mut() {
                    children.retain(|c| c.id.as_deref() != Some(id));
                }
            }
        }
    }

    /// Mutate one field of a top-level task optimistically.
    ///
    /// A task that is no longer present is a logged no-op; it was deleted
    /// while the view still referenced it.
    pub async fn set_task_field<G>(
        &mut self,
        id: &str,
        patch: FieldPatch,
        gateway: &G,
    ) -> Result<(), BoardError>
    where
        G: TaskGateway + ?Sized,
    {
        let Some(task) = self.get_mut(id) else {
            warn!(task_id = id, "mutation for an unknown task");
            return Ok(());
        };
        apply_field_mutation(task, patch, gateway).await?;
        self.emit(BoardEvent::TaskUpdated(id.to_string()));
        Ok(())
    }

    /// Mutate one field of a subtask optimistically.
    ///
    /// A server-returned copy is merged through the reconciler so sequence
    /// order is preserved; a failure rolls back just the mutated field. If
    /// the subtask vanished while the request was in flight there is
    /// nothing to roll back and the failure is reported as-is.
    pub async fn set_subtask_field<G>(
        &mut self,
        parent_id: &str,
        child_id: &str,
        patch: FieldPatch,
        gateway: &G,
    ) -> Result<(), BoardError>
    where
        G: TaskGateway + ?Sized,
    {
        let request = patch.clone();
        let pending = match self.subtask_mut(parent_id, child_id) {
            Some(child) => PendingMutation::begin(child, patch)?,
            None => {
                warn!(parent_id, child_id, "mutation for an unknown subtask");
                return Ok(());
            }
        };
        match request.send(pending.entity_id(), gateway).await {
            Ok(Some(updated)) => {
                match self.get_mut(parent_id) {
                    Some(parent) => reconcile::replace_child(parent, updated),
                    None => warn!(parent_id, "parent vanished while a subtask mutation was in flight"),
                }
                self.emit(BoardEvent::TaskUpdated(parent_id.to_string()));
                Ok(())
            }
            Ok(None) => {
                self.emit(BoardEvent::TaskUpdated(parent_id.to_string()));
                Ok(())
            }
            Err(err) => match self.subtask_mut(parent_id, child_id) {
                Some(child) => Err(pending.abort(child, err)),
                None => Err(pending.into_failure(err)),
            },
        }
    }

    /// Refetch and adopt the subtask sequence of `parent_id`. A failed
    /// fetch leaves the parent with an empty sequence, never stale data.
    pub async fn load_subtasks<G>(&mut self, parent_id: &str, gateway: &G)
    where
        G: TaskGateway + ?Sized,
    {
        let fetched = gateway.children_of(parent_id).await;
        match self.get_mut(parent_id) {
            Some(parent) => reconcile::load_children(parent, fetched),
            None => warn!(parent_id, "subtask refetch for an unknown parent"),
        }
    }

    /// Merge a task update pushed up from the detail view. Returns `false`
    /// when the task is no longer present, in which case the caller should
    /// refresh the whole collection.
    pub fn absorb_update(&mut self, updated: Task) -> bool {
        let Some(id) = updated.id.clone() else {
            return false;
        };
        match self.tasks.iter_mut().find(|t| t.id.as_deref() == Some(id.as_str())) {
            Some(slot) => {
                *slot = updated;
                self.emit(BoardEvent::TaskUpdated(id));
                true
            }
            None => {
                warn!(task_id = %id, "updated task not present locally");
                false
            }
        }
    }

    /// Fill the user lookup table from the backend.
    pub async fn load_users<G>(&mut self, gateway: &G) -> Result<(), BoardError>
    where
        G: UserGateway + ?Sized,
    {
        let users = gateway.list_users().await?;
        self.users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Ok(())
    }

    /// Create a user and add it to the lookup table.
    pub async fn create_user<G>(&mut self, name: &str, gateway: &G) -> Result<User, BoardError>
    where
        G: UserGateway + ?Sized,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::ValidationFailed {
                detail: "user name cannot be empty".into(),
            });
        }
        let user = gateway.create_user(name).await?;
        self.users.insert(user.id.clone(), user.clone());
        self.emit(BoardEvent::UserCreated(user.id.clone()));
        Ok(user)
    }

    /// Resolve a task's owner reference against the lookup table.
    pub fn resolve_owner(&self, task: &Task) -> Option<&User> {
        self.users.get(task.owner.as_deref()?)
    }

    /// Users sorted by display name, for owner pickers.
    pub fn users(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }

    /// Tasks in `status`, original order preserved.
    pub fn filter_by_status(&self, status: Status) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }
}

/// Whether `task` is past due as of `today`.
///
/// Date-only comparison; any time-of-day component was already dropped at
/// the wire boundary. Tasks without a due date and tasks in a terminal
/// status are never overdue.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    match task.due_date {
        Some(due) if !task.status.is_terminal() => due < today,
        _ => false,
    }
}

/// Share of completed subtasks, as a percentage in `[0, 100]`. A task
/// without subtasks reports zero.
pub fn progress(task: &Task) -> f64 {
    match task.children.as_deref() {
        None | Some([]) => 0.0,
        Some(children) => {
            let completed = children
                .iter()
                .filter(|c| c.status == Status::Completed)
                .count();
            completed as f64 / children.len() as f64 * 100.0
        }
    }
}

/// Composite style class for a board card: the status tag plus an overdue
/// marker when the deadline has passed.
pub fn card_style_class(task: &Task, today: NaiveDate) -> String {
    let mut classes = format!("task-card status-tag-{}", task.status.style_tag());
    if is_overdue(task, today) {
        classes.push_str(" task-overdue");
    }
    classes
}
