//! # Task Board
//!
//! Client-side state engine for a kanban-style task board backed by a REST
//! API: a board of tasks with statuses, optional dates, assignable owners
//! and nested subtasks, edited field by field.
//!
//! ## Key pieces
//!
//! - **Optimistic mutations**: every field edit is applied locally first,
//!   then confirmed or rolled back against the backend
//!   ([`mutation::apply_field_mutation`]). Concurrent edits to different
//!   fields of one task stay independent; same-field races resolve
//!   last-writer-wins.
//! - **Subtask reconciliation**: server responses merge into a parent's
//!   subtask sequence by id, preserving order ([`reconcile`]).
//! - **Board derivations**: column filtering, the overdue flag, subtask
//!   progress and card style classes are pure reads over board state
//!   ([`board`]).
//! - **Gateways**: the REST backend is reached through the [`gateway`]
//!   traits; an HTTP implementation and scriptable stubs are provided.
//!
//! ## Example
//!
//! ```no_run
//! use task_board::{ApiConfig, Board, FieldPatch, Status};
//! use task_board::gateway::HttpGateway;
//!
//! # async fn run() -> Result<(), task_board::BoardError> {
//! let gateway = HttpGateway::new(&ApiConfig::from_env().unwrap_or_default());
//! let mut board = Board::new();
//! board.refresh(&gateway).await?;
//! board
//!     .set_task_field("1", FieldPatch::Status(Status::Started), &gateway)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod config;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod mutation;
pub mod reconcile;
pub mod task;
pub mod view_state;

pub use board::{card_style_class, is_overdue, progress, Board, BoardEvent};
pub use config::ApiConfig;
pub use error::{BoardError, GatewayError};
pub use fields::Status;
pub use mutation::{apply_field_mutation, FieldPatch, PendingMutation};
pub use task::{ParentRef, Task, User};
pub use view_state::{parse_date_draft, DropdownKind, ViewState};
