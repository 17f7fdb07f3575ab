//! Integration connection tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use mcp::{Arguments, Field, InputSchema, RegistryError, ToolDescriptor, ToolRegistry};
use platform::{IntegrationConnection, IntegrationConnectionSpec, Metadata, PlatformApi};
use policy::{Capability, Policy};
use serde::Serialize;
use serde_json::json;

use crate::context::{ToolContext, bind};
use crate::error::{Result, ToolError};
use crate::filter::{Filter, MatchPolicy, filter_schema, list_and_marshal, marshal};
use crate::response::{ensure_success, into_body};

const DOMAIN: &str = "integration";

/// Secret values never leave the server; only their keys are shown.
#[derive(Debug, Serialize)]
struct IntegrationView {
    name: String,
    display_name: String,
    integration: String,
    workspace: String,
    config: BTreeMap<String, String>,
    secret_keys: Vec<String>,
    created_at: String,
    updated_at: String,
}

impl From<IntegrationConnection> for IntegrationView {
    fn from(connection: IntegrationConnection) -> Self {
        let IntegrationConnection { metadata, spec } = connection;
        Self {
            name: metadata.name.unwrap_or_default(),
            display_name: metadata.display_name.unwrap_or_default(),
            integration: spec.integration.unwrap_or_default(),
            workspace: metadata.workspace.unwrap_or_default(),
            config: spec.config.unwrap_or_default(),
            secret_keys: spec.secret.unwrap_or_default().into_keys().collect(),
            created_at: metadata.created_at.unwrap_or_default(),
            updated_at: metadata.updated_at.unwrap_or_default(),
        }
    }
}

fn name_schema() -> InputSchema {
    InputSchema::new().field(Field::string("name", "Integration connection name").required())
}

pub fn register<C: PlatformApi>(
    registry: &mut ToolRegistry,
    context: &Arc<ToolContext<C>>,
    policy: &Policy,
) -> std::result::Result<(), RegistryError> {
    registry.register(
        policy,
        ToolDescriptor::new(
            "list_integrations",
            Capability::Read,
            "List integration connections in the workspace",
        )
        .with_schema(filter_schema("connection name")),
        bind(context, list_integrations::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "get_integration",
            Capability::Read,
            "Get an integration connection by name",
        )
        .with_schema(name_schema()),
        bind(context, get_integration::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "create_integration",
            Capability::Write,
            "Create a connection to a third-party integration such as github or openai",
        )
        .with_schema(
            InputSchema::new()
                .field(Field::string("name", "Connection name").required())
                .field(
                    Field::string("integration", "Integration provider, e.g. github").required(),
                )
                .field(Field::string_map("secret", "Secret values, e.g. API keys"))
                .field(Field::string_map("config", "Non-secret configuration values")),
        ),
        bind(context, create_integration::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "delete_integration",
            Capability::Write,
            "Delete an integration connection",
        )
        .with_schema(name_schema()),
        bind(context, delete_integration::<C>),
    )?;

    Ok(())
}

async fn list_integrations<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let query = arguments.optional_str("filter")?.unwrap_or_default();

    let response = client
        .list_integration_connections()
        .await
        .map_err(|e| ToolError::remote_call("list integration connections", e))?;
    let connections: Vec<IntegrationView> = into_body("list integration connections", response)?
        .into_iter()
        .map(IntegrationView::from)
        .collect();

    let filter = Filter::new(query, MatchPolicy::CaseInsensitive);
    Ok(list_and_marshal(&connections, &filter, |c| c.name.as_str())?)
}

async fn get_integration<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let name = arguments.required_str("name")?;

    let response = client
        .get_integration_connection(name)
        .await
        .map_err(|e| ToolError::remote_call("get integration connection", e))?;
    if response.status == 404 {
        return Err(not_found(name));
    }
    let connection = into_body("get integration connection", response)?;
    Ok(marshal(&IntegrationView::from(connection))?)
}

async fn create_integration<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let name = arguments.required_str("name")?;
    let integration = arguments.required_str("integration")?;

    let connection = IntegrationConnection {
        metadata: Metadata::named(name),
        spec: IntegrationConnectionSpec {
            integration: Some(integration.to_string()),
            config: arguments.optional_string_map("config")?,
            secret: arguments.optional_string_map("secret")?,
        },
    };

    let response = client
        .create_integration_connection(&connection)
        .await
        .map_err(|e| ToolError::remote_call("create integration connection", e))?;
    if response.status == 409 {
        return Err(ToolError::AlreadyExists(format!("integration connection {name}")));
    }
    let created = into_body("create integration connection", response)?;
    Ok(marshal(&IntegrationView::from(created))?)
}

async fn delete_integration<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let name = arguments.required_str("name")?;

    let response = client
        .delete_integration_connection(name)
        .await
        .map_err(|e| ToolError::remote_call("delete integration connection", e))?;
    if response.status == 404 {
        return Err(not_found(name));
    }
    ensure_success("delete integration connection", response)?;
    Ok(marshal(&json!({ "deleted": name }))?)
}

fn not_found(name: &str) -> ToolError {
    ToolError::NotFound(format!("integration connection {name} not found"))
}
