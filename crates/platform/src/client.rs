//! reqwest-backed Blaxel API client.

use crate::types::{
    IntegrationConnection, InviteUserRequest, Sandbox, ServiceAccount, ServiceAccountRequest,
    UpdateUserRoleRequest, Workspace, WorkspaceUser,
};
use crate::{ApiResponse, Error, PlatformApi, Result};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Production API URL.
pub const DEFAULT_API_URL: &str = "https://api.blaxel.ai/v0";

const WORKSPACE_HEADER: &str = "X-Blaxel-Workspace";
const USER_AGENT: &str = concat!("blaxel-mcp/", env!("CARGO_PKG_VERSION"));

/// API key and workspace every request is scoped to.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub workspace: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, workspace: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            workspace: workspace.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("workspace", &self.workspace)
            .finish()
    }
}

/// Builder for creating a [`PlatformClient`].
#[derive(Debug, Clone)]
pub struct PlatformClientBuilder {
    credentials: Credentials,
    api_url: String,
    timeout: Option<Duration>,
}

impl PlatformClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<PlatformClient> {
        if self.credentials.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        if self.credentials.workspace.is_empty() {
            return Err(Error::MissingWorkspace);
        }

        let base =
            Url::parse(&self.api_url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidUrl(self.api_url));
        }

        let mut http = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(PlatformClient {
            http: http.build()?,
            base,
            credentials: self.credentials,
        })
    }
}

/// Blaxel management API client.
///
/// Cheap to share behind an `Arc`; `reqwest::Client` pools connections
/// internally and is safe for concurrent use.
pub struct PlatformClient {
    http: reqwest::Client,
    base: Url,
    credentials: Credentials,
}

impl PlatformClient {
    pub fn builder(credentials: Credentials) -> PlatformClientBuilder {
        PlatformClientBuilder::new(credentials)
    }

    pub fn workspace(&self) -> &str {
        &self.credentials.workspace
    }

    pub fn api_url(&self) -> &str {
        self.base.as_str()
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<ApiResponse<T>> {
        let url = self.url(segments)?;
        self.execute(self.http.get(url)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let url = self.url(segments)?;
        self.execute(self.http.post(url).json(body)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let url = self.url(segments)?;
        self.execute(self.http.put(url).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<ApiResponse<T>> {
        let url = self.url(segments)?;
        self.execute(self.http.delete(url)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = request
            .bearer_auth(&self.credentials.api_key)
            .header(WORKSPACE_HEADER, self.credentials.workspace.as_str())
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let url = response.url().path().to_string();
        let bytes = response.bytes().await?;
        debug!(status, path = %url, bytes = bytes.len(), "platform response");

        if !(200..300).contains(&status) {
            return Ok(ApiResponse::failed(status, error_message(&bytes)));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiResponse::empty(status));
        }

        let body = serde_json::from_slice(&bytes)?;
        Ok(ApiResponse::ok(status, body))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract a readable message from an error body, falling back to raw text.
fn error_message(bytes: &[u8]) -> String {
    serde_json::from_slice::<ApiErrorBody>(bytes)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).trim().to_string())
}

impl PlatformApi for PlatformClient {
    async fn list_workspaces(&self) -> Result<ApiResponse<Vec<Workspace>>> {
        self.get(&["workspaces"]).await
    }

    async fn get_workspace(&self, name: &str) -> Result<ApiResponse<Workspace>> {
        self.get(&["workspaces", name]).await
    }

    async fn list_integration_connections(
        &self,
    ) -> Result<ApiResponse<Vec<IntegrationConnection>>> {
        self.get(&["integrations", "connections"]).await
    }

    async fn get_integration_connection(
        &self,
        name: &str,
    ) -> Result<ApiResponse<IntegrationConnection>> {
        self.get(&["integrations", "connections", name]).await
    }

    async fn create_integration_connection(
        &self,
        connection: &IntegrationConnection,
    ) -> Result<ApiResponse<IntegrationConnection>> {
        self.post(&["integrations", "connections"], connection).await
    }

    async fn delete_integration_connection(&self, name: &str) -> Result<ApiResponse<Value>> {
        self.delete(&["integrations", "connections", name]).await
    }

    async fn list_service_accounts(&self) -> Result<ApiResponse<Vec<ServiceAccount>>> {
        self.get(&["service_accounts"]).await
    }

    async fn create_service_account(
        &self,
        request: &ServiceAccountRequest,
    ) -> Result<ApiResponse<ServiceAccount>> {
        self.post(&["service_accounts"], request).await
    }

    async fn update_service_account(
        &self,
        client_id: &str,
        request: &ServiceAccountRequest,
    ) -> Result<ApiResponse<ServiceAccount>> {
        self.put(&["service_accounts", client_id], request).await
    }

    async fn delete_service_account(&self, client_id: &str) -> Result<ApiResponse<Value>> {
        self.delete(&["service_accounts", client_id]).await
    }

    async fn list_sandboxes(&self) -> Result<ApiResponse<Vec<Sandbox>>> {
        self.get(&["sandboxes"]).await
    }

    async fn get_sandbox(&self, name: &str) -> Result<ApiResponse<Sandbox>> {
        self.get(&["sandboxes", name]).await
    }

    async fn create_sandbox(&self, sandbox: &Sandbox) -> Result<ApiResponse<Sandbox>> {
        self.post(&["sandboxes"], sandbox).await
    }

    async fn delete_sandbox(&self, name: &str) -> Result<ApiResponse<Value>> {
        self.delete(&["sandboxes", name]).await
    }

    async fn list_workspace_users(&self) -> Result<ApiResponse<Vec<WorkspaceUser>>> {
        self.get(&["users"]).await
    }

    async fn invite_workspace_user(
        &self,
        request: &InviteUserRequest,
    ) -> Result<ApiResponse<WorkspaceUser>> {
        self.post(&["users"], request).await
    }

    async fn update_workspace_user_role(
        &self,
        sub: &str,
        request: &UpdateUserRoleRequest,
    ) -> Result<ApiResponse<WorkspaceUser>> {
        self.put(&["users", sub], request).await
    }

    async fn remove_workspace_user(&self, sub: &str) -> Result<ApiResponse<Value>> {
        self.delete(&["users", sub]).await
    }
}
