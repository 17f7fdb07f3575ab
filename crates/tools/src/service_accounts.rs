//! Service account tools.
//!
//! The API has no get-by-id endpoint, so `get_service_account` scans the
//! full listing.

use std::sync::Arc;

use mcp::{Arguments, Field, InputSchema, RegistryError, ToolDescriptor, ToolRegistry};
use platform::{PlatformApi, ServiceAccount, ServiceAccountRequest};
use policy::{Capability, Policy};
use serde::Serialize;
use serde_json::json;

use crate::context::{ToolContext, bind};
use crate::error::{Result, ToolError};
use crate::filter::{Filter, MatchPolicy, filter_schema, list_and_marshal, marshal};
use crate::response::{ensure_success, into_body};

const DOMAIN: &str = "service account";

#[derive(Debug, Serialize)]
struct ServiceAccountView {
    client_id: String,
    name: String,
    description: String,
    created_at: String,
    updated_at: String,
}

impl From<ServiceAccount> for ServiceAccountView {
    fn from(account: ServiceAccount) -> Self {
        Self {
            client_id: account.client_id.unwrap_or_default(),
            name: account.name.unwrap_or_default(),
            description: account.description.unwrap_or_default(),
            created_at: account.created_at.unwrap_or_default(),
            updated_at: account.updated_at.unwrap_or_default(),
        }
    }
}

/// The create response, the only time the client secret is visible.
#[derive(Debug, Serialize)]
struct CreatedServiceAccount {
    #[serde(flatten)]
    account: ServiceAccountView,
    client_secret: String,
    note: &'static str,
}

const SECRET_NOTE: &str = "Store the client secret now; it cannot be retrieved again.";

fn client_id_schema() -> InputSchema {
    InputSchema::new().field(Field::string("client_id", "Service account client ID").required())
}

pub fn register<C: PlatformApi>(
    registry: &mut ToolRegistry,
    context: &Arc<ToolContext<C>>,
    policy: &Policy,
) -> std::result::Result<(), RegistryError> {
    registry.register(
        policy,
        ToolDescriptor::new(
            "list_service_accounts",
            Capability::Read,
            "List service accounts in the workspace",
        )
        .with_schema(filter_schema("name")),
        bind(context, list_service_accounts::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "get_service_account",
            Capability::Read,
            "Get a service account by client ID",
        )
        .with_schema(client_id_schema()),
        bind(context, get_service_account::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "create_service_account",
            Capability::Write,
            "Create a service account and return its client credentials",
        )
        .with_schema(
            InputSchema::new()
                .field(Field::string("name", "Service account name").required())
                .field(Field::string("description", "What the account is used for")),
        ),
        bind(context, create_service_account::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "update_service_account",
            Capability::Write,
            "Rename a service account or change its description",
        )
        .with_schema(
            client_id_schema()
                .field(Field::string("name", "New name"))
                .field(Field::string("description", "New description")),
        ),
        bind(context, update_service_account::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "delete_service_account",
            Capability::Write,
            "Delete a service account",
        )
        .with_schema(client_id_schema()),
        bind(context, delete_service_account::<C>),
    )?;

    Ok(())
}

async fn list_service_accounts<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let query = arguments.optional_str("filter")?.unwrap_or_default();

    let accounts = fetch_all(client).await?;
    let filter = Filter::new(query, MatchPolicy::CaseSensitive);
    Ok(list_and_marshal(&accounts, &filter, |a| a.name.as_str())?)
}

async fn get_service_account<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let client_id = arguments.required_str("client_id")?;

    let account = fetch_all(client)
        .await?
        .into_iter()
        .find(|a| a.client_id == client_id)
        .ok_or_else(|| not_found(client_id))?;
    Ok(marshal(&account)?)
}

async fn create_service_account<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let name = arguments.required_str("name")?;
    let request = ServiceAccountRequest {
        name: Some(name.to_string()),
        description: arguments.non_empty_str("description")?.map(str::to_string),
    };

    let response = client
        .create_service_account(&request)
        .await
        .map_err(|e| ToolError::remote_call("create service account", e))?;
    if response.status == 409 {
        return Err(ToolError::AlreadyExists(format!("service account {name}")));
    }
    let mut account = into_body("create service account", response)?;
    let client_secret = account.client_secret.take().unwrap_or_default();
    Ok(marshal(&CreatedServiceAccount {
        account: account.into(),
        client_secret,
        note: SECRET_NOTE,
    })?)
}

async fn update_service_account<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let client_id = arguments.required_str("client_id")?;
    let request = ServiceAccountRequest {
        name: arguments.non_empty_str("name")?.map(str::to_string),
        description: arguments.non_empty_str("description")?.map(str::to_string),
    };
    if request.name.is_none() && request.description.is_none() {
        return Err(ToolError::InvalidInput(
            "name or description is required".to_string(),
        ));
    }

    let response = client
        .update_service_account(client_id, &request)
        .await
        .map_err(|e| ToolError::remote_call("update service account", e))?;
    if response.status == 404 {
        return Err(not_found(client_id));
    }
    let account = into_body("update service account", response)?;
    Ok(marshal(&ServiceAccountView::from(account))?)
}

async fn delete_service_account<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let client_id = arguments.required_str("client_id")?;

    let response = client
        .delete_service_account(client_id)
        .await
        .map_err(|e| ToolError::remote_call("delete service account", e))?;
    if response.status == 404 {
        return Err(not_found(client_id));
    }
    ensure_success("delete service account", response)?;
    Ok(marshal(&json!({ "deleted": client_id }))?)
}

async fn fetch_all<C: PlatformApi>(client: &C) -> Result<Vec<ServiceAccountView>> {
    let response = client
        .list_service_accounts()
        .await
        .map_err(|e| ToolError::remote_call("list service accounts", e))?;
    Ok(into_body("list service accounts", response)?
        .into_iter()
        .map(ServiceAccountView::from)
        .collect())
}

fn not_found(client_id: &str) -> ToolError {
    ToolError::NotFound(format!("service account {client_id} not found"))
}
