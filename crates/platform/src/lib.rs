//! Blaxel management API client.
//!
//! This crate is the remote side of the MCP tools: typed records, a response
//! envelope that keeps the HTTP status visible to callers, the
//! [`PlatformApi`] trait the tool handlers are written against, and a
//! reqwest-backed [`PlatformClient`].
//!
//! # Example
//!
//! ```no_run
//! use platform::{Credentials, PlatformApi, PlatformClient};
//!
//! # async fn example() -> platform::Result<()> {
//! let client = PlatformClient::builder(Credentials::new("bl_...", "my-workspace")).build()?;
//!
//! let response = client.list_sandboxes().await?;
//! if let Some(sandboxes) = response.body {
//!     for sandbox in sandboxes {
//!         println!("{:?}", sandbox.metadata.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod client;
mod error;
mod response;
pub mod types;

pub use api::PlatformApi;
pub use client::{Credentials, DEFAULT_API_URL, PlatformClient, PlatformClientBuilder};
pub use error::{Error, Result};
pub use response::ApiResponse;
pub use types::{
    IntegrationConnection, IntegrationConnectionSpec, InviteUserRequest, Metadata, Port, Sandbox,
    SandboxRuntime, SandboxSpec, ServiceAccount, ServiceAccountRequest, UpdateUserRoleRequest,
    Workspace, WorkspaceUser,
};
