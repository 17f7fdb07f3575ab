//! MCP server over stdio, backed by a [`ToolRegistry`].

use std::future::Future;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt, transport};
use tracing::{error, info};

use crate::error::{DispatchError, Error, Result};
use crate::protocol::{CallOutcome, ToolDescriptor};
use crate::registry::ToolRegistry;

/// Server name reported during initialization.
pub const SERVER_NAME: &str = "blaxel-mcp";

/// Protocol front end for a finished registry.
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    instructions: Option<String>,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve on stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        info!(tools = self.registry.len(), "serving MCP over stdio");
        let service = self
            .serve(transport::stdio())
            .await
            .map_err(|e| Error::Initialize(e.to_string()))?;

        let reason = service.waiting().await.map_err(|e| {
            error!("serving error: {e}");
            Error::Serve(e.to_string())
        })?;
        info!(?reason, "MCP session ended");
        Ok(())
    }
}

fn to_rmcp_tool(descriptor: &ToolDescriptor) -> Tool {
    Tool::new(
        descriptor.name.clone(),
        descriptor.description.clone(),
        Arc::new(descriptor.schema.to_json()),
    )
}

impl From<CallOutcome> for CallToolResult {
    fn from(outcome: CallOutcome) -> Self {
        let content = vec![Content::text(outcome.text)];
        if outcome.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: self.instructions.clone(),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<ListToolsResult, ErrorData>> + Send + '_ {
        let tools = self.registry.descriptors().map(to_rmcp_tool).collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = std::result::Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            match self.registry.dispatch(&request.name, request.arguments).await {
                Ok(outcome) => Ok(outcome.into()),
                Err(e @ DispatchError::UnknownTool(_)) => {
                    Err(ErrorData::invalid_params(e.to_string(), None))
                }
            }
        }
    }
}
