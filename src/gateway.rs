//! Remote task and user gateways.
//!
//! The board talks to its REST backend through these traits. `HttpGateway`
//! is the production implementation; `StubTaskGateway` and
//! `StubUserGateway` answer from scripted outcomes so state logic can be
//! exercised without a live server.
//!
//! Partial updates use one PATCH endpoint per field. Each returns the
//! server's updated copy of the task when the response carries a body, or
//! `None` when the server answers with bare confirmation; callers keep
//! their optimistic value in the latter case.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;

use crate::config::ApiConfig;
use crate::error::GatewayError;
use crate::fields::Status;
use crate::task::{Task, User};

/// Remote CRUD surface for tasks.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, GatewayError>;

    /// Create a task; the server assigns the id. A draft carrying a
    /// `parent` stub is created as a subtask.
    async fn create_task(&self, task: &Task) -> Result<Task, GatewayError>;

    /// Delete a task. The server cascades into all subtasks.
    async fn delete_task(&self, id: &str) -> Result<(), GatewayError>;

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Task>, GatewayError>;

    async fn patch_name(&self, id: &str, name: &str) -> Result<Option<Task>, GatewayError>;

    async fn patch_start_date(
        &self,
        id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<Task>, GatewayError>;

    async fn patch_due_date(
        &self,
        id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<Task>, GatewayError>;

    async fn patch_status(&self, id: &str, status: Status) -> Result<Option<Task>, GatewayError>;

    /// Update the owner reference. `None` clears it.
    async fn patch_owner(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> Result<Option<Task>, GatewayError>;
}

/// Remote user directory.
#[async_trait]
pub trait UserGateway: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, GatewayError>;

    async fn create_user(&self, name: &str) -> Result<User, GatewayError>;
}

/// HTTP implementation of both gateways against the REST backend.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(config: &ApiConfig) -> Self {
        HttpGateway {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_connect() {
            GatewayError::ConnectionFailed(err.to_string())
        } else {
            GatewayError::Rejected(err.to_string())
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::decoded(response).await
    }

    async fn send_patch(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Option<Task>, GatewayError> {
        let response = self
            .client
            .patch(self.url(path))
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::updated_task(response).await
    }

    async fn decoded<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// PATCH responses may be a full task or empty confirmation.
    async fn updated_task(response: reqwest::Response) -> Result<Option<Task>, GatewayError> {
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Extract the server-provided detail from an error response. The
    /// backend reports it under `entity` when available.
    async fn rejection(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("entity").and_then(|d| d.as_str()).map(str::to_string))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        GatewayError::Rejected(detail)
    }
}

#[async_trait]
impl TaskGateway for HttpGateway {
    async fn list_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        self.get_json("/tasks").await
    }

    async fn create_task(&self, task: &Task) -> Result<Task, GatewayError> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .json(task)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::decoded(response).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{id}")))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Task>, GatewayError> {
        self.get_json(&format!("/tasks/{parent_id}/subtasks")).await
    }

    async fn patch_name(&self, id: &str, name: &str) -> Result<Option<Task>, GatewayError> {
        self.send_patch(&format!("/tasks/{id}/name"), json!({ "name": name }))
            .await
    }

    async fn patch_start_date(
        &self,
        id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<Task>, GatewayError> {
        let body = json!({ "startDate": date.map(|d| d.format("%Y-%m-%d").to_string()) });
        self.send_patch(&format!("/tasks/{id}/start-date"), body).await
    }

    async fn patch_due_date(
        &self,
        id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<Task>, GatewayError> {
        let body = json!({ "dueDate": date.map(|d| d.format("%Y-%m-%d").to_string()) });
        self.send_patch(&format!("/tasks/{id}/due-date"), body).await
    }

    async fn patch_status(&self, id: &str, status: Status) -> Result<Option<Task>, GatewayError> {
        self.send_patch(&format!("/tasks/{id}/status"), json!({ "status": status }))
            .await
    }

    async fn patch_owner(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> Result<Option<Task>, GatewayError> {
        self.send_patch(&format!("/tasks/{id}/owner"), json!({ "ownerId": owner }))
            .await
    }
}

#[async_trait]
impl UserGateway for HttpGateway {
    async fn list_users(&self) -> Result<Vec<User>, GatewayError> {
        self.get_json("/users").await
    }

    async fn create_user(&self, name: &str) -> Result<User, GatewayError> {
        let response = self
            .client
            .post(self.url("/users"))
            .json(&json!({ "name": name }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::decoded(response).await
    }
}

/// Scripted in-memory task gateway for tests.
///
/// Outcomes are queued per operation and consumed in order; an empty queue
/// falls back to a benign default (empty list, echoed create with a
/// generated id, confirmation-only patch). Every received call is recorded
/// so tests can assert that an operation was, or was not, issued.
#[derive(Default)]
pub struct StubTaskGateway {
    lists: Mutex<VecDeque<Result<Vec<Task>, GatewayError>>>,
    creates: Mutex<VecDeque<Result<Task, GatewayError>>>,
    deletes: Mutex<VecDeque<Result<(), GatewayError>>>,
    children: Mutex<VecDeque<Result<Vec<Task>, GatewayError>>>,
    patches: Mutex<VecDeque<Result<Option<Task>, GatewayError>>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl StubTaskGateway {
    pub fn new() -> Self {
        StubTaskGateway::default()
    }

    pub async fn script_list(&self, outcome: Result<Vec<Task>, GatewayError>) {
        self.lists.lock().await.push_back(outcome);
    }

    pub async fn script_create(&self, outcome: Result<Task, GatewayError>) {
        self.creates.lock().await.push_back(outcome);
    }

    pub async fn script_delete(&self, outcome: Result<(), GatewayError>) {
        self.deletes.lock().await.push_back(outcome);
    }

    pub async fn script_children(&self, outcome: Result<Vec<Task>, GatewayError>) {
        self.children.lock().await.push_back(outcome);
    }

    pub async fn script_patch(&self, outcome: Result<Option<Task>, GatewayError>) {
        self.patches.lock().await.push_back(outcome);
    }

    /// Calls received so far, in order, as `"method id"` strings.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }

    async fn next_patch(&self) -> Result<Option<Task>, GatewayError> {
        self.patches.lock().await.pop_front().unwrap_or(Ok(None))
    }
}

#[async_trait]
impl TaskGateway for StubTaskGateway {
    async fn list_tasks(&self) -> Result<Vec<Task>, GatewayError> {
        self.record("list_tasks".into()).await;
        self.lists.lock().await.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_task(&self, task: &Task) -> Result<Task, GatewayError> {
        self.record(format!("create_task {}", task.name)).await;
        match self.creates.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => {
                let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let mut created = task.clone();
                created.id = Some(format!("task-{n}"));
                Ok(created)
            }
        }
    }

    async fn delete_task(&self, id: &str) -> Result<(), GatewayError> {
        self.record(format!("delete_task {id}")).await;
        self.deletes.lock().await.pop_front().unwrap_or(Ok(()))
    }

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Task>, GatewayError> {
        self.record(format!("children_of {parent_id}")).await;
        self.children.lock().await.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn patch_name(&self, id: &str, _name: &str) -> Result<Option<Task>, GatewayError> {
        self.record(format!("patch_name {id}")).await;
        self.next_patch().await
    }

    async fn patch_start_date(
        &self,
        id: &str,
        _date: Option<NaiveDate>,
    ) -> Result<Option<Task>, GatewayError> {
        self.record(format!("patch_start_date {id}")).await;
        self.next_patch().await
    }

    async fn patch_due_date(
        &self,
        id: &str,
        _date: Option<NaiveDate>,
    ) -> Result<Option<Task>, GatewayError> {
        self.record(format!("patch_due_date {id}")).await;
        self.next_patch().await
    }

    async fn patch_status(&self, id: &str, _status: Status) -> Result<Option<Task>, GatewayError> {
        self.record(format!("patch_status {id}")).await;
        self.next_patch().await
    }

    async fn patch_owner(
        &self,
        id: &str,
        _owner: Option<&str>,
    ) -> Result<Option<Task>, GatewayError> {
        self.record(format!("patch_owner {id}")).await;
        self.next_patch().await
    }
}

/// Scripted in-memory user gateway for tests.
#[derive(Default)]
pub struct StubUserGateway {
    lists: Mutex<VecDeque<Result<Vec<User>, GatewayError>>>,
    creates: Mutex<VecDeque<Result<User, GatewayError>>>,
    next_id: AtomicU64,
}

impl StubUserGateway {
    pub fn new() -> Self {
        StubUserGateway::default()
    }

    pub async fn script_list(&self, outcome: Result<Vec<User>, GatewayError>) {
        self.lists.lock().await.push_back(outcome);
    }

    pub async fn script_create(&self, outcome: Result<User, GatewayError>) {
        self.creates.lock().await.push_back(outcome);
    }
}

#[async_trait]
impl UserGateway for StubUserGateway {
    async fn list_users(&self) -> Result<Vec<User>, GatewayError> {
        self.lists.lock().await.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_user(&self, name: &str) -> Result<User, GatewayError> {
        match self.creates.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => {
                let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                Ok(User {
                    id: format!("user-{n}"),
                    name: name.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_create_assigns_ids() {
        let stub = StubTaskGateway::new();
        let created = stub.create_task(&Task::new("Draft")).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("task-1"));
        assert_eq!(created.name, "Draft");

        let second = stub.create_task(&Task::new("Next")).await.unwrap();
        assert_eq!(second.id.as_deref(), Some("task-2"));
    }

    #[tokio::test]
    async fn test_stub_scripted_outcomes_pop_in_order() {
        let stub = StubTaskGateway::new();
        stub.script_patch(Err(GatewayError::Timeout(5000))).await;
        stub.script_patch(Ok(None)).await;

        assert!(stub.patch_status("1", Status::Started).await.is_err());
        assert!(stub.patch_status("1", Status::Started).await.unwrap().is_none());
        assert_eq!(
            stub.calls().await,
            vec!["patch_status 1".to_string(), "patch_status 1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_stub_user_gateway_echoes_name() {
        let stub = StubUserGateway::new();
        let user = stub.create_user("Ana").await.unwrap();
        assert_eq!(user.name, "Ana");
        assert_eq!(user.id, "user-1");
    }
}
