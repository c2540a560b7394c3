//! Optimistic field mutations with deterministic rollback.
//!
//! Every field-level editor on the board follows the same cycle: write the
//! new value locally so the UI reflects it immediately, issue the PATCH,
//! then either adopt the server's authoritative copy or restore the
//! captured original. The cycle is identical for parent tasks and
//! subtasks; only the field being patched varies.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{BoardError, GatewayError};
use crate::fields::Status;
use crate::gateway::TaskGateway;
use crate::task::Task;

/// New value for a single mutable task field.
///
/// Applying a patch swaps the value into the task and hands back the
/// displaced original as another patch, so a rollback is nothing more than
/// applying the captured one.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    Name(String),
    StartDate(Option<NaiveDate>),
    DueDate(Option<NaiveDate>),
    Status(Status),
    /// Owner by user id; `None` clears the owner.
    Owner(Option<String>),
}

impl FieldPatch {
    /// Field name used in errors and logs.
    pub fn field(&self) -> &'static str {
        match self {
            FieldPatch::Name(_) => "name",
            FieldPatch::StartDate(_) => "startDate",
            FieldPatch::DueDate(_) => "dueDate",
            FieldPatch::Status(_) => "status",
            FieldPatch::Owner(_) => "owner",
        }
    }

    /// Issue the PATCH endpoint matching this field for `id`.
    pub async fn send<G>(&self, id: &str, gateway: &G) -> Result<Option<Task>, GatewayError>
    where
        G: TaskGateway + ?Sized,
    {
        match self {
            FieldPatch::Name(v) => gateway.patch_name(id, v).await,
            FieldPatch::StartDate(v) => gateway.patch_start_date(id, *v).await,
            FieldPatch::DueDate(v) => gateway.patch_due_date(id, *v).await,
            FieldPatch::Status(v) => gateway.patch_status(id, *v).await,
            FieldPatch::Owner(v) => gateway.patch_owner(id, v.as_deref()).await,
        }
    }

    /// Swap this value into `task`, returning the displaced original.
    fn swap(self, task: &mut Task) -> FieldPatch {
        match self {
            FieldPatch::Name(v) => FieldPatch::Name(std::mem::replace(&mut task.name, v)),
            FieldPatch::StartDate(v) => {
                FieldPatch::StartDate(std::mem::replace(&mut task.start_date, v))
            }
            FieldPatch::DueDate(v) => {
                FieldPatch::DueDate(std::mem::replace(&mut task.due_date, v))
            }
            FieldPatch::Status(v) => FieldPatch::Status(std::mem::replace(&mut task.status, v)),
            FieldPatch::Owner(v) => FieldPatch::Owner(std::mem::replace(&mut task.owner, v)),
        }
    }
}

/// An optimistic write awaiting its gateway outcome.
///
/// Holds no borrow of the task, so several mutations on one entity may be
/// in flight at once; each captures its own rollback value, and rolling
/// back one field never disturbs another. Two in-flight mutations of the
/// same field race: whichever resolves last determines the final local
/// value. There is no request sequencing; that race is accepted and
/// documented rather than papered over.
#[derive(Debug)]
pub struct PendingMutation {
    entity_id: String,
    field: &'static str,
    rollback: FieldPatch,
}

impl PendingMutation {
    /// Apply `patch` to `task` optimistically.
    ///
    /// Tasks without a server-assigned id and empty names are refused
    /// before any state changes or network traffic.
    pub fn begin(task: &mut Task, patch: FieldPatch) -> Result<PendingMutation, BoardError> {
        let entity_id = task.persisted_id()?.to_string();
        if let FieldPatch::Name(name) = &patch {
            if name.trim().is_empty() {
                return Err(BoardError::ValidationFailed {
                    detail: "task name cannot be empty".into(),
                });
            }
        }
        let field = patch.field();
        let rollback = patch.swap(task);
        debug!(%entity_id, field, "optimistic write applied");
        Ok(PendingMutation {
            entity_id,
            field,
            rollback,
        })
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Resolve with the gateway's success response. A returned task
    /// replaces the local entity wholesale, the server being authoritative
    /// for every field; a bare confirmation keeps the optimistic value.
    pub fn commit(self, task: &mut Task, server: Option<Task>) {
        if let Some(server) = server {
            *task = server;
        }
        debug!(entity_id = %self.entity_id, field = self.field, "mutation committed");
    }

    /// Resolve with a gateway failure: restore the captured original value
    /// of this field, leaving every other field alone, and report what
    /// failed.
    pub fn abort(self, task: &mut Task, err: GatewayError) -> BoardError {
        let PendingMutation {
            entity_id,
            field,
            rollback,
        } = self;
        rollback.swap(task);
        debug!(%entity_id, field, "optimistic write rolled back");
        BoardError::RemoteMutationFailed {
            field,
            entity_id,
            detail: err.to_string(),
        }
    }

    /// Failure report for a mutation whose entity disappeared while the
    /// request was in flight. There is nothing left to roll back.
    pub fn into_failure(self, err: GatewayError) -> BoardError {
        BoardError::RemoteMutationFailed {
            field: self.field,
            entity_id: self.entity_id,
            detail: err.to_string(),
        }
    }
}

/// Run one full optimistic mutation cycle on `task` against `gateway`.
///
/// The optimistic value is visible to any reader of `task` for as long as
/// the call is in flight; on failure the field is restored to its
/// pre-mutation value before the error is returned. No retry is attempted.
pub async fn apply_field_mutation<G>(
    task: &mut Task,
    patch: FieldPatch,
    gateway: &G,
) -> Result<(), BoardError>
where
    G: TaskGateway + ?Sized,
{
    let request = patch.clone();
    let pending = PendingMutation::begin(task, patch)?;
    match request.send(pending.entity_id(), gateway).await {
        Ok(server) => {
            pending.commit(task, server);
            Ok(())
        }
        Err(err) => Err(pending.abort(task, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::StubTaskGateway;

    fn saved(id: &str, name: &str) -> Task {
        let mut task = Task::new(name);
        task.id = Some(id.into());
        task
    }

    #[test]
    fn test_begin_refuses_unsaved_tasks() {
        let mut draft = Task::new("Draft");
        let result = PendingMutation::begin(&mut draft, FieldPatch::Status(Status::Started));
        assert!(matches!(result, Err(BoardError::MissingIdentifier { .. })));
        assert_eq!(draft.status, Status::Awaiting);
    }

    #[test]
    fn test_begin_refuses_empty_name() {
        let mut task = saved("1", "Draft");
        let result = PendingMutation::begin(&mut task, FieldPatch::Name("   ".into()));
        assert!(matches!(result, Err(BoardError::ValidationFailed { .. })));
        assert_eq!(task.name, "Draft");
    }

    #[test]
    fn test_optimistic_write_is_immediately_visible() {
        let mut task = saved("1", "Draft");
        let pending =
            PendingMutation::begin(&mut task, FieldPatch::Status(Status::Started)).unwrap();
        assert_eq!(task.status, Status::Started);
        assert_eq!(pending.entity_id(), "1");
        assert_eq!(pending.field(), "status");
    }

    #[test]
    fn test_commit_without_body_keeps_optimistic_value() {
        let mut task = saved("1", "Draft");
        let pending = PendingMutation::begin(&mut task, FieldPatch::Name("Renamed".into())).unwrap();
        pending.commit(&mut task, None);
        assert_eq!(task.name, "Renamed");
        assert_eq!(task.id.as_deref(), Some("1"));
    }

    #[test]
    fn test_commit_with_body_adopts_server_copy_wholesale() {
        let mut task = saved("1", "Draft");
        task.owner = Some("user-9".into());

        let pending =
            PendingMutation::begin(&mut task, FieldPatch::Status(Status::Started)).unwrap();

        // The server copy carries drift on another field too.
        let mut server = saved("1", "Draft (triaged)");
        server.status = Status::Started;
        pending.commit(&mut task, Some(server));

        assert_eq!(task.id.as_deref(), Some("1"));
        assert_eq!(task.name, "Draft (triaged)");
        assert_eq!(task.status, Status::Started);
        assert_eq!(task.owner, None);
    }

    #[test]
    fn test_abort_restores_only_its_own_field() {
        let mut task = saved("1", "Draft");
        task.owner = Some("user-2".into());

        let pending =
            PendingMutation::begin(&mut task, FieldPatch::Status(Status::Started)).unwrap();
        task.name = "Renamed meanwhile".into();

        let err = pending.abort(&mut task, GatewayError::ConnectionFailed("refused".into()));

        assert_eq!(task.status, Status::Awaiting);
        assert_eq!(task.name, "Renamed meanwhile");
        assert_eq!(task.owner.as_deref(), Some("user-2"));
        match err {
            BoardError::RemoteMutationFailed {
                field, entity_id, ..
            } => {
                assert_eq!(field, "status");
                assert_eq!(entity_id, "1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_concurrent_mutations_on_different_fields_are_independent() {
        let mut task = saved("1", "Draft");

        let status_pending =
            PendingMutation::begin(&mut task, FieldPatch::Status(Status::Started)).unwrap();
        let owner_pending =
            PendingMutation::begin(&mut task, FieldPatch::Owner(Some("user-3".into()))).unwrap();

        // Rolling back the status mutation leaves the owner's optimistic
        // value in place.
        status_pending.abort(&mut task, GatewayError::Timeout(5000));
        assert_eq!(task.status, Status::Awaiting);
        assert_eq!(task.owner.as_deref(), Some("user-3"));

        owner_pending.commit(&mut task, None);
        assert_eq!(task.owner.as_deref(), Some("user-3"));
    }

    #[test]
    fn test_same_field_race_resolves_last_writer_wins() {
        let mut task = saved("1", "Draft");

        let first =
            PendingMutation::begin(&mut task, FieldPatch::Status(Status::Started)).unwrap();
        let second =
            PendingMutation::begin(&mut task, FieldPatch::Status(Status::Closed)).unwrap();

        // First response lands, then the second fails: its rollback value
        // is the first mutation's optimistic write, which therefore wins.
        first.commit(&mut task, None);
        second.abort(&mut task, GatewayError::Timeout(5000));
        assert_eq!(task.status, Status::Started);
    }

    #[tokio::test]
    async fn test_round_trip_keeps_id_and_optimistic_value() {
        let gateway = StubTaskGateway::new();
        let mut task = saved("1", "Draft");

        apply_field_mutation(&mut task, FieldPatch::Status(Status::Started), &gateway)
            .await
            .unwrap();

        assert_eq!(task.id.as_deref(), Some("1"));
        assert_eq!(task.status, Status::Started);
        assert_eq!(gateway.calls().await, vec!["patch_status 1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_status_update_reverts_and_surfaces_entity_id() {
        let gateway = StubTaskGateway::new();
        gateway
            .script_patch(Err(GatewayError::ConnectionFailed("network down".into())))
            .await;

        let mut task = saved("1", "Draft");
        let err = apply_field_mutation(&mut task, FieldPatch::Status(Status::Started), &gateway)
            .await
            .unwrap_err();

        assert_eq!(task.status, Status::Awaiting);
        match err {
            BoardError::RemoteMutationFailed {
                entity_id, detail, ..
            } => {
                assert_eq!(entity_id, "1");
                assert!(detail.contains("network down"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsaved_task_makes_no_gateway_call() {
        let gateway = StubTaskGateway::new();
        let mut draft = Task::new("Draft");

        let err = apply_field_mutation(&mut draft, FieldPatch::Name("Renamed".into()), &gateway)
            .await
            .unwrap_err();

        assert!(matches!(err, BoardError::MissingIdentifier { .. }));
        assert!(gateway.calls().await.is_empty());
        assert_eq!(draft.name, "Draft");
    }

    #[tokio::test]
    async fn test_server_copy_replaces_entity_through_driver() {
        let gateway = StubTaskGateway::new();
        let mut server = saved("1", "Draft");
        server.status = Status::Started;
        server.owner = Some("user-5".into());
        gateway.script_patch(Ok(Some(server))).await;

        let mut task = saved("1", "Draft");
        apply_field_mutation(&mut task, FieldPatch::Status(Status::Started), &gateway)
            .await
            .unwrap();

        assert_eq!(task.owner.as_deref(), Some("user-5"));
        assert_eq!(task.status, Status::Started);
    }
}
