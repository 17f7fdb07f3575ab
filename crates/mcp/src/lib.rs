//! Dispatch shell for Blaxel MCP tools.
//!
//! Tools are declared as data ([`ToolDescriptor`] + [`InputSchema`]), bound
//! to async handlers in a [`ToolRegistry`], and exposed to MCP clients over
//! stdio by [`McpServer`].
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Arguments, Field, HandlerResult, InputSchema, McpServer, ToolDescriptor, ToolRegistry};
//! use policy::{Capability, Policy};
//!
//! # async fn example() -> mcp::Result<()> {
//! let policy = Policy::read_only();
//! let mut registry = ToolRegistry::new();
//!
//! let descriptor = ToolDescriptor::new("greet", Capability::Read, "Say hello")
//!     .with_schema(InputSchema::new().field(Field::string("name", "Who to greet").required()));
//!
//! registry.register(&policy, descriptor, |args: Arguments| async move {
//!     HandlerResult::from(args.required_str("name").map(|n| format!("hello {n}")))
//! })?;
//!
//! McpServer::new(registry).serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod registry;
mod schema;
mod server;

pub use error::{DispatchError, Error, RegistryError, Result};
pub use protocol::{ArgumentError, Arguments, CallOutcome, HandlerResult, ToolDescriptor};
pub use registry::{ArgumentValidation, HandlerFuture, Registration, ToolHandler, ToolRegistry};
pub use schema::{Field, FieldKind, InputSchema, SchemaError};
pub use server::{McpServer, SERVER_NAME};
