//! Sandbox tools.

use std::sync::Arc;

use mcp::{Arguments, Field, InputSchema, RegistryError, ToolDescriptor, ToolRegistry};
use platform::{Metadata, PlatformApi, Port, Sandbox, SandboxRuntime, SandboxSpec};
use policy::{Capability, Policy};
use serde::Serialize;
use serde_json::json;

use crate::context::{ToolContext, bind};
use crate::error::{Result, ToolError};
use crate::filter::{Filter, MatchPolicy, filter_schema, list_and_marshal, marshal};
use crate::response::{ensure_success, into_body};

const DOMAIN: &str = "sandbox";

pub const DEFAULT_IMAGE: &str = "blaxel/prod-base:latest";
/// Megabytes.
pub const DEFAULT_MEMORY: u64 = 4096;

#[derive(Debug, Serialize)]
struct SandboxView {
    name: String,
    display_name: String,
    status: String,
    image: String,
    memory: u64,
    ports: Vec<Port>,
    region: String,
    created_at: String,
    updated_at: String,
}

impl From<Sandbox> for SandboxView {
    fn from(sandbox: Sandbox) -> Self {
        let Sandbox {
            metadata,
            spec,
            status,
        } = sandbox;
        let runtime = spec.runtime.unwrap_or_default();
        Self {
            name: metadata.name.unwrap_or_default(),
            display_name: metadata.display_name.unwrap_or_default(),
            status: status.unwrap_or_default(),
            image: runtime.image.unwrap_or_default(),
            memory: runtime.memory.unwrap_or_default(),
            ports: runtime.ports.unwrap_or_default(),
            region: spec.region.unwrap_or_default(),
            created_at: metadata.created_at.unwrap_or_default(),
            updated_at: metadata.updated_at.unwrap_or_default(),
        }
    }
}

fn name_schema() -> InputSchema {
    InputSchema::new().field(Field::string("name", "Sandbox name").required())
}

pub fn register<C: PlatformApi>(
    registry: &mut ToolRegistry,
    context: &Arc<ToolContext<C>>,
    policy: &Policy,
) -> std::result::Result<(), RegistryError> {
    registry.register(
        policy,
        ToolDescriptor::new("list_sandboxes", Capability::Read, "List sandboxes in the workspace")
            .with_schema(filter_schema("sandbox name")),
        bind(context, list_sandboxes::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new("get_sandbox", Capability::Read, "Get a sandbox by name")
            .with_schema(name_schema()),
        bind(context, get_sandbox::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new("create_sandbox", Capability::Write, "Create a sandbox").with_schema(
            name_schema()
                .field(Field::string(
                    "image",
                    format!("Container image (default {DEFAULT_IMAGE})"),
                ))
                .field(Field::integer(
                    "memory",
                    format!("Memory in MB (default {DEFAULT_MEMORY})"),
                ))
                .field(Field::integer_array("ports", "Ports to expose over HTTP"))
                .field(Field::string("region", "Deployment region")),
        ),
        bind(context, create_sandbox::<C>),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new("delete_sandbox", Capability::Write, "Delete a sandbox")
            .with_schema(name_schema()),
        bind(context, delete_sandbox::<C>),
    )?;

    Ok(())
}

async fn list_sandboxes<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let query = arguments.optional_str("filter")?.unwrap_or_default();

    let response = client
        .list_sandboxes()
        .await
        .map_err(|e| ToolError::remote_call("list sandboxes", e))?;
    let sandboxes: Vec<SandboxView> = into_body("list sandboxes", response)?
        .into_iter()
        .map(SandboxView::from)
        .collect();

    let filter = Filter::new(query, MatchPolicy::CaseInsensitive);
    Ok(list_and_marshal(&sandboxes, &filter, |s| s.name.as_str())?)
}

async fn get_sandbox<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let name = arguments.required_str("name")?;

    let response = client
        .get_sandbox(name)
        .await
        .map_err(|e| ToolError::remote_call("get sandbox", e))?;
    if response.status == 404 {
        return Err(not_found(name));
    }
    let sandbox = into_body("get sandbox", response)?;
    Ok(marshal(&SandboxView::from(sandbox))?)
}

async fn create_sandbox<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let name = arguments.required_str("name")?;
    let sandbox = sandbox_request(name, &arguments)?;

    let response = client
        .create_sandbox(&sandbox)
        .await
        .map_err(|e| ToolError::remote_call("create sandbox", e))?;
    if response.status == 409 {
        return Err(ToolError::AlreadyExists(format!("sandbox {name}")));
    }
    let created = into_body("create sandbox", response)?;
    Ok(marshal(&SandboxView::from(created))?)
}

fn sandbox_request(name: &str, arguments: &Arguments) -> Result<Sandbox> {
    let memory = arguments.optional_u64("memory")?.unwrap_or(DEFAULT_MEMORY);
    if memory == 0 {
        return Err(ToolError::InvalidInput("memory must be greater than zero".into()));
    }
    let ports = arguments.optional_u16_list("ports")?.map(|ports| {
        ports
            .into_iter()
            .map(|target| Port {
                name: None,
                target: Some(target),
                protocol: Some("HTTP".into()),
            })
            .collect()
    });

    Ok(Sandbox {
        metadata: Metadata::named(name),
        spec: SandboxSpec {
            runtime: Some(SandboxRuntime {
                image: Some(
                    arguments
                        .non_empty_str("image")?
                        .unwrap_or(DEFAULT_IMAGE)
                        .to_string(),
                ),
                memory: Some(memory),
                ports,
                generation: None,
            }),
            region: arguments.non_empty_str("region")?.map(str::to_string),
        },
        status: None,
    })
}

async fn delete_sandbox<C: PlatformApi>(
    context: Arc<ToolContext<C>>,
    arguments: Arguments,
) -> Result<String> {
    let client = context.client(DOMAIN)?;
    let name = arguments.required_str("name")?;

    let response = client
        .delete_sandbox(name)
        .await
        .map_err(|e| ToolError::remote_call("delete sandbox", e))?;
    if response.status == 404 {
        return Err(not_found(name));
    }
    ensure_success("delete sandbox", response)?;
    Ok(marshal(&json!({ "deleted": name }))?)
}

fn not_found(name: &str) -> ToolError {
    ToolError::NotFound(format!("sandbox {name} not found"))
}
