//! Shared state handed to every remote tool handler.

use std::future::Future;
use std::sync::Arc;

use mcp::{Arguments, HandlerResult, ToolHandler};
use platform::PlatformApi;

use crate::error::{Result, ToolError};

/// The remote client, or the reason it could not be built.
///
/// Tools are registered either way. When the client is missing every remote
/// handler fails with [`ToolError::ClientUnavailable`] instead of calling out.
pub struct ToolContext<C> {
    client: Option<C>,
    unavailable: String,
}

impl<C: PlatformApi> ToolContext<C> {
    pub fn new(client: C) -> Self {
        Self {
            client: Some(client),
            unavailable: String::new(),
        }
    }

    /// A context without a client. `reason` is reported by every call.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            client: None,
            unavailable: reason.into(),
        }
    }

    /// The client, or a `"{domain} client not initialized"` failure.
    pub fn client(&self, domain: &'static str) -> Result<&C> {
        self.client.as_ref().ok_or_else(|| ToolError::ClientUnavailable {
            domain,
            reason: self.unavailable.clone(),
        })
    }
}

impl<C> std::fmt::Debug for ToolContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("client", &self.client.is_some())
            .field("unavailable", &self.unavailable)
            .finish()
    }
}

/// Bind a handler function to shared state.
///
/// The function receives its own clone of the `Arc` so the returned future
/// is `'static`, and its error is rendered through `Display`.
pub(crate) fn bind<S, F, Fut>(state: &Arc<S>, handler: F) -> impl ToolHandler + 'static
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    let state = Arc::clone(state);
    move |arguments: Arguments| {
        let call = handler(Arc::clone(&state), arguments);
        async move { HandlerResult::from(call.await) }
    }
}
