//! Blaxel tools for the MCP registry.
//!
//! Five remote resource domains (workspaces, integrations, service accounts,
//! sandboxes, users) written against [`platform::PlatformApi`], plus the
//! local project tools that shell out to `bl`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mcp::ToolRegistry;
//! use platform::{Credentials, PlatformClient};
//! use policy::Policy;
//! use tools::{ProjectShell, ToolContext};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PlatformClient::builder(Credentials::new("bl_...", "my-workspace")).build()?;
//! let context = Arc::new(ToolContext::new(client));
//! let shell = Arc::new(ProjectShell::new());
//!
//! let mut registry = ToolRegistry::new();
//! tools::register_all(&mut registry, &Policy::read_only(), &context, &shell)?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
pub mod filter;
pub mod integrations;
pub mod local;
mod response;
pub mod sandboxes;
pub mod service_accounts;
pub mod users;
pub mod workspaces;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use mcp::{RegistryError, ToolRegistry};
use platform::PlatformApi;
use policy::Policy;

pub use context::ToolContext;
pub use error::{Result, ToolError};
pub use filter::{Filter, MatchPolicy, filter_and_marshal, list_and_marshal};
pub use local::{ProjectKind, ProjectShell};

/// Register every tool, remote domains first, in a fixed order.
pub fn register_all<C: PlatformApi>(
    registry: &mut ToolRegistry,
    policy: &Policy,
    context: &Arc<ToolContext<C>>,
    shell: &Arc<ProjectShell>,
) -> std::result::Result<(), RegistryError> {
    workspaces::register(registry, context, policy)?;
    integrations::register(registry, context, policy)?;
    service_accounts::register(registry, context, policy)?;
    sandboxes::register(registry, context, policy)?;
    users::register(registry, context, policy)?;
    local::register(registry, shell, policy)?;
    Ok(())
}
