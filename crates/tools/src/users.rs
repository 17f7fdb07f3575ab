//! Workspace member tools.

use std::sync::Arc;

use mcp::{Arguments, Field, InputSchema, RegistryError, ToolDescriptor, ToolRegistry};
use platform::{InviteUserRequest, PlatformApi, UpdateUserRoleRequest, WorkspaceUser};
use policy::{Capability, Policy};
use serde::Serialize;
use serde_json::json;

use crate::context::{ToolContext, bind};
use crate::error::{Result, ToolError};
use crate::filter::{Filter, MatchPolicy, filter_schema, list_and_marshal, marshal};
use crate::response::{ensure_success, into_body};

const DOMAIN: &str = "user";

pub const DEFAULT_ROLE: &str = "member";

#[derive(Debug, Serialize)]
struct UserView {
    sub: String,
    email: String,
    given_name: String,
    family_name: String,
    role: String,
    accepted: bool,
    email_verified: bool,
}

impl From<WorkspaceUser> for UserView {
    fn from(user: WorkspaceUser) -> Self {
        Self {
            sub: user.sub.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            given_name: user.given_name.unwrap_or_default(),
            family_name: user.family_name.unwrap_or_default(),
            role: user.role.unwrap_or_default(),
            accepted: user.accepted.unwrap_or_default(),
            email_verified: user.email_verified.unwrap_or_default(),
        }
    }
}

fn sub_field() -> Field {
    Field::string("sub", "User subject identifier, as returned by list_users").required()
}

pub fn register<C: PlatformApi>(
    registry: &mut ToolRegistry,
    context: &Arc<ToolContext<C>>,
    policy: &Policy,
) -> std::result::Result<(), RegistryError> {
    registry.register(
        policy,
        ToolDescriptor::new(
            "list_users",
            Capability::Read,
            "List members and pending invitations of the workspace",
        )
        .with_schema(filter_schema("email")),
        bind(context, list_users::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new("get_user", Capability::Read, "Get a workspace member by email")
            .with_schema(
                InputSchema::new().field(Field::string("email", "Email address").required()),
            ),
        bind(context, get_user::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "invite_user",
            Capability::Write,
            "Invite a user to the workspace by email",
        )
        .with_schema(
            InputSchema::new()
                .field(Field::string("email", "Email address to invite").required())
                .field(Field::string(
                    "role",
                    format!("Workspace role (default {DEFAULT_ROLE})"),
                )),
        ),
        bind(context, invite_user::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "update_user_role",
            Capability::Write,
            "Change the role of a workspace member",
        )
        .with_schema(
            InputSchema::new()
                .field(sub_field())
                .field(Field::string("role", "New role, e.g. admin or member").required()),
        ),
        bind(context, update_user_role::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "remove_user",
            Capability::Write,
            "Remove a member from the workspace",
        )
        .with_schema(InputSchema::new().field(sub_field())),
        bind(context, remove_user::<C>),
    )?;

    Ok(())
}

async fn list_users<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let query = arguments.optional_str("filter")?.unwrap_or_default();

    let users = fetch_all(client).await?;
    let filter = Filter::new(query, MatchPolicy::CaseSensitive);
    Ok(list_and_marshal(&users, &filter, |u| u.email.as_str())?)
}

async fn get_user<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let email = arguments.required_str("email")?;

    let user = fetch_all(client)
        .await?
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .ok_or_else(|| ToolError::NotFound(format!("user {email} not found in workspace")))?;
    Ok(marshal(&user)?)
}

async fn invite_user<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let email = arguments.required_str("email")?;
    let request = InviteUserRequest {
        email: email.to_string(),
        role: arguments
            .non_empty_str("role")?
            .unwrap_or(DEFAULT_ROLE)
            .to_string(),
    };

    let response = client
        .invite_workspace_user(&request)
        .await
        .map_err(|e| ToolError::remote_call("invite user", e))?;
    if response.status == 409 {
        return Err(ToolError::AlreadyExists(format!("user {email}")));
    }
    let invited = into_body("invite user", response)?;
    Ok(marshal(&UserView::from(invited))?)
}

async fn update_user_role<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let sub = arguments.required_str("sub")?;
    let request = UpdateUserRoleRequest {
        role: arguments.required_str("role")?.to_string(),
    };

    let response = client
        .update_workspace_user_role(sub, &request)
        .await
        .map_err(|e| ToolError::remote_call("update user role", e))?;
    if response.status == 404 {
        return Err(not_in_workspace(sub));
    }
    let user = into_body("update user role", response)?;
    Ok(marshal(&UserView::from(user))?)
}

async fn remove_user<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let sub = arguments.required_str("sub")?;

    let response = client
        .remove_workspace_user(sub)
        .await
        .map_err(|e| ToolError::remote_call("remove user", e))?;
    if response.status == 404 {
        return Err(not_in_workspace(sub));
    }
    ensure_success("remove user", response)?;
    Ok(marshal(&json!({ "removed": sub }))?)
}

async fn fetch_all<C: PlatformApi>(client: &C) -> Result<Vec<UserView>> {
    let response = client
        .list_workspace_users()
        .await
        .map_err(|e| ToolError::remote_call("list users", e))?;
    Ok(into_body("list users", response)?
        .into_iter()
        .map(UserView::from)
        .collect())
}

fn not_in_workspace(sub: &str) -> ToolError {
    ToolError::NotFound(format!("user {sub} not found in workspace"))
}
