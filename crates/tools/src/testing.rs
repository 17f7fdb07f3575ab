//! In-memory [`PlatformApi`] for handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use mcp::{Arguments, ToolRegistry};
use platform::types::{
    IntegrationConnection, InviteUserRequest, Sandbox, ServiceAccount, ServiceAccountRequest,
    UpdateUserRoleRequest, Workspace, WorkspaceUser,
};
use platform::{ApiResponse, PlatformApi};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::context::ToolContext;

/// Replies with canned responses keyed by operation name and records every
/// call. Operations without a canned response answer 500; operations marked
/// with [`fail`](Self::fail) never get a response at all.
#[derive(Default)]
pub struct MockPlatform {
    responses: Mutex<HashMap<&'static str, (u16, Value)>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `operation` with `status` and a JSON body.
    pub fn respond(self, operation: &'static str, status: u16, body: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(operation, (status, body));
        self
    }

    /// Make `operation` fail before any response arrives.
    pub fn fail(self, operation: &'static str) -> Self {
        self.failing.lock().unwrap().insert(operation);
        self
    }

    /// Every call so far, as `operation` or `operation:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Request bodies sent by create/update calls, in order.
    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    fn reply<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        argument: Option<&str>,
    ) -> platform::Result<ApiResponse<T>> {
        let call = match argument {
            Some(argument) => format!("{operation}:{argument}"),
            None => operation.to_string(),
        };
        self.calls.lock().unwrap().push(call);

        if self.failing.lock().unwrap().contains(operation) {
            let cause = serde_json::from_str::<Value>("{").unwrap_err();
            return Err(platform::Error::Decode(cause));
        }

        let canned = self.responses.lock().unwrap().get(operation).cloned();
        let (status, body) = canned.unwrap_or((500, Value::String("unexpected call".into())));
        if !(200..300).contains(&status) {
            let message = body.as_str().map(str::to_string).unwrap_or_default();
            return Ok(ApiResponse::failed(status, message));
        }
        if body.is_null() {
            return Ok(ApiResponse::empty(status));
        }
        Ok(ApiResponse::ok(status, serde_json::from_value(body)?))
    }

    fn record<B: serde::Serialize>(&self, body: &B) {
        let value = serde_json::to_value(body).unwrap();
        self.bodies.lock().unwrap().push(value);
    }
}

impl PlatformApi for MockPlatform {
    async fn list_workspaces(&self) -> platform::Result<ApiResponse<Vec<Workspace>>> {
        self.reply("list_workspaces", None)
    }

    async fn get_workspace(&self, name: &str) -> platform::Result<ApiResponse<Workspace>> {
        self.reply("get_workspace", Some(name))
    }

    async fn list_integration_connections(
        &self,
    ) -> platform::Result<ApiResponse<Vec<IntegrationConnection>>> {
        self.reply("list_integration_connections", None)
    }

    async fn get_integration_connection(
        &self,
        name: &str,
    ) -> platform::Result<ApiResponse<IntegrationConnection>> {
        self.reply("get_integration_connection", Some(name))
    }

    async fn create_integration_connection(
        &self,
        connection: &IntegrationConnection,
    ) -> platform::Result<ApiResponse<IntegrationConnection>> {
        self.record(connection);
        self.reply("create_integration_connection", connection.metadata.name.as_deref())
    }

    async fn delete_integration_connection(
        &self,
        name: &str,
    ) -> platform::Result<ApiResponse<Value>> {
        self.reply("delete_integration_connection", Some(name))
    }

    async fn list_service_accounts(&self) -> platform::Result<ApiResponse<Vec<ServiceAccount>>> {
        self.reply("list_service_accounts", None)
    }

    async fn create_service_account(
        &self,
        request: &ServiceAccountRequest,
    ) -> platform::Result<ApiResponse<ServiceAccount>> {
        self.record(request);
        self.reply("create_service_account", request.name.as_deref())
    }

    async fn update_service_account(
        &self,
        client_id: &str,
        request: &ServiceAccountRequest,
    ) -> platform::Result<ApiResponse<ServiceAccount>> {
        self.record(request);
        self.reply("update_service_account", Some(client_id))
    }

    async fn delete_service_account(&self, client_id: &str) -> platform::Result<ApiResponse<Value>> {
        self.reply("delete_service_account", Some(client_id))
    }

    async fn list_sandboxes(&self) -> platform::Result<ApiResponse<Vec<Sandbox>>> {
        self.reply("list_sandboxes", None)
    }

    async fn get_sandbox(&self, name: &str) -> platform::Result<ApiResponse<Sandbox>> {
        self.reply("get_sandbox", Some(name))
    }

    async fn create_sandbox(&self, sandbox: &Sandbox) -> platform::Result<ApiResponse<Sandbox>> {
        self.record(sandbox);
        self.reply("create_sandbox", sandbox.metadata.name.as_deref())
    }

    async fn delete_sandbox(&self, name: &str) -> platform::Result<ApiResponse<Value>> {
        self.reply("delete_sandbox", Some(name))
    }

    async fn list_workspace_users(&self) -> platform::Result<ApiResponse<Vec<WorkspaceUser>>> {
        self.reply("list_workspace_users", None)
    }

    async fn invite_workspace_user(
        &self,
        request: &InviteUserRequest,
    ) -> platform::Result<ApiResponse<WorkspaceUser>> {
        self.record(request);
        self.reply("invite_workspace_user", Some(&request.email))
    }

    async fn update_workspace_user_role(
        &self,
        sub: &str,
        request: &UpdateUserRoleRequest,
    ) -> platform::Result<ApiResponse<WorkspaceUser>> {
        self.record(request);
        self.reply("update_workspace_user_role", Some(sub))
    }

    async fn remove_workspace_user(&self, sub: &str) -> platform::Result<ApiResponse<Value>> {
        self.reply("remove_workspace_user", Some(sub))
    }
}

pub fn context(mock: MockPlatform) -> Arc<ToolContext<MockPlatform>> {
    Arc::new(ToolContext::new(mock))
}

pub fn offline() -> Arc<ToolContext<MockPlatform>> {
    Arc::new(ToolContext::unavailable("missing API key"))
}

pub fn args(value: Value) -> Arguments {
    Arguments::new(value.as_object().cloned().unwrap_or_else(Map::new))
}

/// Dispatch through a registry and return `(is_error, text)`.
pub async fn call(registry: &ToolRegistry, name: &str, arguments: Value) -> (bool, String) {
    let outcome = registry
        .dispatch(name, arguments.as_object().cloned())
        .await
        .unwrap();
    (outcome.is_error, outcome.text)
}
