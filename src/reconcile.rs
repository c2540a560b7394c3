//! Subtask sequence reconciliation.
//!
//! Keeps a parent task's `children` sequence consistent with server
//! responses. Identity is always by id: entities the server has not named
//! yet are never reconciliation targets. A response that references a
//! subtask no longer present locally is logged and dropped; the entity may
//! have been deleted while the request was in flight.

use tracing::warn;

use crate::error::GatewayError;
use crate::task::Task;

/// Prepend `child` to `parent`'s subtasks, creating the sequence if absent.
/// Newest subtasks render first.
pub fn insert_child(parent: &mut Task, child: Task) {
    parent.children.get_or_insert_with(Vec::new).insert(0, child);
}

/// Replace the subtask whose id matches `updated`, preserving order.
///
/// A miss is a safe no-op: the sequence is left unchanged and the miss is
/// logged.
pub fn replace_child(parent: &mut Task, updated: Task) {
    let Some(id) = updated.id.clone() else {
        warn!("refusing to reconcile a subtask without an id");
        return;
    };
    let Some(children) = parent.children.as_mut() else {
        warn!(subtask_id = %id, "reconciliation miss: parent has no subtasks");
        return;
    };
    match children.iter_mut().find(|c| c.id.as_deref() == Some(id.as_str())) {
        Some(slot) => *slot = updated,
        None => warn!(subtask_id = %id, "reconciliation miss: subtask not present locally"),
    }
}

/// Adopt a full refetch of `parent`'s subtasks.
///
/// A failed fetch empties the sequence rather than leaving stale entries.
pub fn load_children(parent: &mut Task, fetched: Result<Vec<Task>, GatewayError>) {
    match fetched {
        Ok(children) => parent.children = Some(children),
        Err(err) => {
            warn!(parent_id = ?parent.id, %err, "subtask refetch failed, clearing local subtasks");
            parent.children = Some(Vec::new());
        }
    }
}
