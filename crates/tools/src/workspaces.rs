//! Workspace tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use mcp::{Arguments, Field, InputSchema, RegistryError, ToolDescriptor, ToolRegistry};
use platform::{PlatformApi, Workspace};
use policy::{Capability, Policy};
use serde::Serialize;

use crate::context::{ToolContext, bind};
use crate::error::{Result, ToolError};
use crate::filter::{Filter, MatchPolicy, filter_schema, list_and_marshal, marshal};
use crate::response::into_body;

const DOMAIN: &str = "workspace";

#[derive(Debug, Serialize)]
struct WorkspaceView {
    name: String,
    display_name: String,
    region: String,
    status: String,
    account_id: String,
    labels: BTreeMap<String, String>,
    created_at: String,
}

impl From<Workspace> for WorkspaceView {
    fn from(workspace: Workspace) -> Self {
        Self {
            name: workspace.name.unwrap_or_default(),
            display_name: workspace.display_name.unwrap_or_default(),
            region: workspace.region.unwrap_or_default(),
            status: workspace.status.unwrap_or_default(),
            account_id: workspace.account_id.unwrap_or_default(),
            labels: workspace.labels.unwrap_or_default(),
            created_at: workspace.created_at.unwrap_or_default(),
        }
    }
}

pub fn register<C: PlatformApi>(
    registry: &mut ToolRegistry,
    context: &Arc<ToolContext<C>>,
    policy: &Policy,
) -> std::result::Result<(), RegistryError> {
    registry.register(
        policy,
        ToolDescriptor::new(
            "list_workspaces",
            Capability::Read,
            "List the workspaces the configured credentials can access",
        )
        .with_schema(filter_schema("workspace name")),
        bind(context, list_workspaces::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new("get_workspace", Capability::Read, "Get a workspace by name")
            .with_schema(
                InputSchema::new().field(Field::string("name", "Workspace name").required()),
            ),
        bind(context, get_workspace::<C>),
    )?;

    Ok(())
}

async fn list_workspaces<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let query = arguments.optional_str("filter")?.unwrap_or_default();

    let response = client
        .list_workspaces()
        .await
        .map_err(|e| ToolError::remote_call("list workspaces", e))?;
    let workspaces: Vec<WorkspaceView> = into_body("list workspaces", response)?
        .into_iter()
        .map(WorkspaceView::from)
        .collect();

    let filter = Filter::new(query, MatchPolicy::CaseInsensitive);
    Ok(list_and_marshal(&workspaces, &filter, |w| w.name.as_str())?)
}

async fn get_workspace<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let name = arguments.required_str("name")?;

    let response = client
        .get_workspace(name)
        .await
        .map_err(|e| ToolError::remote_call("get workspace", e))?;
    if response.status == 404 {
        return Err(ToolError::NotFound(format!("workspace {name} not found")));
    }
    let workspace = WorkspaceView::from(into_body("get workspace", response)?);
    Ok(marshal(&workspace)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPlatform, args, call, context, offline};
    use serde_json::{Value, json};

    fn registry(context: &Arc<ToolContext<MockPlatform>>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        register(&mut registry, context, &Policy::permissive()).unwrap();
        registry
    }

    fn workspaces() -> Value {
        json!([
            { "name": "Production", "displayName": "Prod", "region": "us-pdx-1" },
            { "name": "staging" },
            { "name": "prod-eu", "labels": { "team": "infra" } }
        ])
    }

    #[tokio::test]
    async fn list_filters_case_insensitively() {
        let context = context(MockPlatform::new().respond("list_workspaces", 200, workspaces()));
        let (is_error, text) = call(&registry(&context), "list_workspaces", json!({ "filter": "PROD" })).await;

        assert!(!is_error, "{text}");
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["items"][0]["name"], "Production");
        assert_eq!(value["items"][0]["display_name"], "Prod");
        assert_eq!(value["items"][1]["name"], "prod-eu");
        assert_eq!(value["items"][1]["region"], "");
    }

    #[tokio::test]
    async fn list_is_repeatable() {
        let context = context(MockPlatform::new().respond("list_workspaces", 200, workspaces()));
        let registry = registry(&context);
        let first = call(&registry, "list_workspaces", json!({})).await;
        let second = call(&registry, "list_workspaces", json!({})).await;
        assert_eq!(first, second);
        assert_eq!(context.client(DOMAIN).unwrap().calls().len(), 2);
    }

    #[tokio::test]
    async fn get_maps_not_found() {
        let context = context(MockPlatform::new().respond("get_workspace", 404, json!("no such workspace")));
        let err = get_workspace(context, args(json!({ "name": "ghost" }))).await.unwrap_err();
        assert_eq!(err.to_string(), "workspace ghost not found");
    }

    #[tokio::test]
    async fn get_requires_name_without_calling_out() {
        let context = context(MockPlatform::new());
        let err = get_workspace(Arc::clone(&context), args(json!({ "name": "" }))).await.unwrap_err();
        assert_eq!(err.to_string(), "name is required");
        assert!(context.client(DOMAIN).unwrap().calls().is_empty());
    }

    #[tokio::test]
    async fn offline_client_fails_every_tool() {
        let registry = registry(&offline());
        for (tool, arguments) in [
            ("list_workspaces", json!({})),
            ("get_workspace", json!({ "name": "prod" })),
        ] {
            let (is_error, text) = call(&registry, tool, arguments).await;
            assert!(is_error);
            assert!(text.contains("not initialized"), "{tool}: {text}");
        }
    }

    #[tokio::test]
    async fn transport_failure_keeps_the_cause() {
        let failing = context(MockPlatform::new().fail("list_workspaces"));
        let err = list_workspaces(failing, args(json!({}))).await.unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, ToolError::RemoteCall { .. }));
        assert!(
            text.starts_with("failed to list workspaces: failed to decode response: EOF"),
            "{text}"
        );
    }
}
