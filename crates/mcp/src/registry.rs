//! Tool registry and dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use policy::{Decision, Policy};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{DispatchError, RegistryError};
use crate::protocol::{Arguments, CallOutcome, HandlerResult, ToolDescriptor};

/// Boxed future returned by a [`ToolHandler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Something that can serve a tool invocation.
///
/// Implemented for any `Fn(Arguments) -> impl Future<Output = HandlerResult>`,
/// so async closures capturing an `Arc` context register directly.
pub trait ToolHandler: Send + Sync {
    fn call(&self, arguments: Arguments) -> HandlerFuture;
}

impl<F, Fut> ToolHandler for F
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, arguments: Arguments) -> HandlerFuture {
        Box::pin(self(arguments))
    }
}

/// Whether the dispatch shell checks arguments against the declared schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentValidation {
    #[default]
    Enforce,
    Skip,
}

/// What happened to a registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// The policy denied the tool's capability; it does not exist.
    Suppressed { reason: String },
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Immutable-after-startup table of tools, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    suppressed: Vec<String>,
    validation: ArgumentValidation,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validation(mut self, validation: ArgumentValidation) -> Self {
        self.validation = validation;
        self
    }

    /// Register a tool if the policy allows its capability.
    pub fn register<H>(
        &mut self,
        policy: &Policy,
        descriptor: ToolDescriptor,
        handler: H,
    ) -> Result<Registration, RegistryError>
    where
        H: ToolHandler + 'static,
    {
        if self.index.contains_key(&descriptor.name) || self.suppressed.contains(&descriptor.name) {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }

        if let Decision::Deny { reason } = policy.check(descriptor.capability) {
            debug!(tool = %descriptor.name, %reason, "tool suppressed");
            self.suppressed.push(descriptor.name);
            return Ok(Registration::Suppressed { reason });
        }

        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            handler: Arc::new(handler),
        });
        Ok(Registration::Registered)
    }

    /// Registered tools, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    /// Names the policy kept out of the registry.
    pub fn suppressed(&self) -> &[String] {
        &self.suppressed
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.lookup(name).map(|t| &t.descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Resolve a tool, validate its arguments and run its handler.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallOutcome, DispatchError> {
        let tool = self
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;
        let arguments = Arguments::from(arguments);

        if self.validation == ArgumentValidation::Enforce {
            if let Err(e) = tool.descriptor.schema.validate(arguments.as_map()) {
                debug!(tool = name, error = %e, "arguments rejected");
                return Ok(CallOutcome::failure(e.to_string()));
            }
        }

        debug!(tool = name, "dispatching tool call");
        let result = tool.handler.call(arguments).await;
        if !result.is_success() {
            debug!(tool = name, error = result.text(), "tool call failed");
        }
        Ok(CallOutcome::from(result))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.iter().map(|t| &t.descriptor.name).collect::<Vec<_>>())
            .field("suppressed", &self.suppressed)
            .field("validation", &self.validation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, InputSchema};
    use policy::Capability;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_descriptor(name: &str, capability: Capability) -> ToolDescriptor {
        ToolDescriptor::new(name, capability, "Echo the name argument").with_schema(
            InputSchema::new().field(Field::string("name", "What to echo").required()),
        )
    }

    fn echo(arguments: Arguments) -> impl Future<Output = HandlerResult> + Send {
        let result = arguments.required_str("name").map(str::to_string);
        async move { HandlerResult::from(result) }
    }

    fn args(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    #[test]
    fn registration_preserves_order() {
        let mut registry = ToolRegistry::new();
        let policy = Policy::permissive();
        for name in ["b_tool", "a_tool", "c_tool"] {
            registry.register(&policy, echo_descriptor(name, Capability::Read), echo).unwrap();
        }
        let names: Vec<_> = registry.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["b_tool", "a_tool", "c_tool"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        let policy = Policy::permissive();
        registry.register(&policy, echo_descriptor("x", Capability::Read), echo).unwrap();
        let err = registry
            .register(&policy, echo_descriptor("x", Capability::Write), echo)
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool(name) if name == "x"));
    }

    #[test]
    fn read_only_suppresses_mutating_tools() {
        let mut registry = ToolRegistry::new();
        let policy = Policy::read_only();
        let read = registry.register(&policy, echo_descriptor("get", Capability::Read), echo);
        let write = registry.register(&policy, echo_descriptor("delete", Capability::Write), echo);
        let exec = registry.register(&policy, echo_descriptor("deploy", Capability::Exec), echo);

        assert_eq!(read.unwrap(), Registration::Registered);
        assert!(matches!(write.unwrap(), Registration::Suppressed { .. }));
        assert!(matches!(exec.unwrap(), Registration::Suppressed { .. }));
        assert!(registry.contains("get"));
        assert!(!registry.contains("delete"));
        assert_eq!(registry.suppressed(), ["delete", "deploy"]);
    }

    #[tokio::test]
    async fn suppressed_tool_is_unknown_at_dispatch() {
        let mut registry = ToolRegistry::new();
        registry
            .register(&Policy::read_only(), echo_descriptor("delete", Capability::Write), echo)
            .unwrap();
        let err = registry
            .dispatch("delete", args(json!({ "name": "x" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown tool: delete");
    }

    #[tokio::test]
    async fn dispatch_runs_handler() {
        let mut registry = ToolRegistry::new();
        registry
            .register(&Policy::permissive(), echo_descriptor("echo", Capability::Read), echo)
            .unwrap();
        let outcome = registry.dispatch("echo", args(json!({ "name": "hi" }))).await.unwrap();
        assert_eq!(outcome, CallOutcome::success("hi"));
    }

    #[tokio::test]
    async fn boundary_validation_stops_before_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut registry = ToolRegistry::new();
        registry
            .register(
                &Policy::permissive(),
                echo_descriptor("echo", Capability::Read),
                move |arguments: Arguments| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    echo(arguments)
                },
            )
            .unwrap();

        let outcome = registry.dispatch("echo", None).await.unwrap();
        assert!(outcome.is_error);
        assert!(outcome.text.contains("name is required"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_revalidates_when_boundary_skipped() {
        let mut registry = ToolRegistry::new().with_validation(ArgumentValidation::Skip);
        registry
            .register(&Policy::permissive(), echo_descriptor("echo", Capability::Read), echo)
            .unwrap();

        // Present but empty passes any presence check; the handler still refuses it.
        let outcome = registry.dispatch("echo", args(json!({ "name": "" }))).await.unwrap();
        assert_eq!(outcome, CallOutcome::failure("name is required"));
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let mut registry = ToolRegistry::new();
        registry
            .register(&Policy::permissive(), echo_descriptor("echo", Capability::Read), echo)
            .unwrap();
        let first = registry.dispatch("echo", args(json!({ "name": "x" }))).await.unwrap();
        let second = registry.dispatch("echo", args(json!({ "name": "x" }))).await.unwrap();
        assert_eq!(first, second);
    }
}
