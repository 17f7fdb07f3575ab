//! The remote operations the tool handlers depend on.

use crate::types::{
    IntegrationConnection, InviteUserRequest, Sandbox, ServiceAccount, ServiceAccountRequest,
    UpdateUserRoleRequest, Workspace, WorkspaceUser,
};
use crate::{ApiResponse, Result};
use serde_json::Value;
use std::future::Future;

/// Trait for Blaxel management API clients.
///
/// One method per remote operation. Each returns the transported response;
/// only transport and decoding failures are errors.
pub trait PlatformApi: Send + Sync + 'static {
    fn list_workspaces(&self) -> impl Future<Output = Result<ApiResponse<Vec<Workspace>>>> + Send;

    fn get_workspace(&self, name: &str)
    -> impl Future<Output = Result<ApiResponse<Workspace>>> + Send;

    fn list_integration_connections(
        &self,
    ) -> impl Future<Output = Result<ApiResponse<Vec<IntegrationConnection>>>> + Send;

    fn get_integration_connection(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ApiResponse<IntegrationConnection>>> + Send;

    fn create_integration_connection(
        &self,
        connection: &IntegrationConnection,
    ) -> impl Future<Output = Result<ApiResponse<IntegrationConnection>>> + Send;

    fn delete_integration_connection(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ApiResponse<Value>>> + Send;

    fn list_service_accounts(
        &self,
    ) -> impl Future<Output = Result<ApiResponse<Vec<ServiceAccount>>>> + Send;

    fn create_service_account(
        &self,
        request: &ServiceAccountRequest,
    ) -> impl Future<Output = Result<ApiResponse<ServiceAccount>>> + Send;

    fn update_service_account(
        &self,
        client_id: &str,
        request: &ServiceAccountRequest,
    ) -> impl Future<Output = Result<ApiResponse<ServiceAccount>>> + Send;

    fn delete_service_account(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<ApiResponse<Value>>> + Send;

    fn list_sandboxes(&self) -> impl Future<Output = Result<ApiResponse<Vec<Sandbox>>>> + Send;

    fn get_sandbox(&self, name: &str) -> impl Future<Output = Result<ApiResponse<Sandbox>>> + Send;

    fn create_sandbox(
        &self,
        sandbox: &Sandbox,
    ) -> impl Future<Output = Result<ApiResponse<Sandbox>>> + Send;

    fn delete_sandbox(&self, name: &str) -> impl Future<Output = Result<ApiResponse<Value>>> + Send;

    fn list_workspace_users(
        &self,
    ) -> impl Future<Output = Result<ApiResponse<Vec<WorkspaceUser>>>> + Send;

    fn invite_workspace_user(
        &self,
        request: &InviteUserRequest,
    ) -> impl Future<Output = Result<ApiResponse<WorkspaceUser>>> + Send;

    fn update_workspace_user_role(
        &self,
        sub: &str,
        request: &UpdateUserRoleRequest,
    ) -> impl Future<Output = Result<ApiResponse<WorkspaceUser>>> + Send;

    fn remove_workspace_user(
        &self,
        sub: &str,
    ) -> impl Future<Output = Result<ApiResponse<Value>>> + Send;
}
