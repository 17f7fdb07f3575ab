//! Registration policy for Blaxel MCP tools.
//!
//! Core principle: **a mutating tool only exists if the policy allows it.**
//! The policy is decided once at startup and handed to every registration
//! function; there is no runtime toggle.

mod capability;
mod policy;

pub use capability::Capability;
pub use policy::{Decision, Policy};
