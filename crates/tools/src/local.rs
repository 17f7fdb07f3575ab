//! Local project tools backed by the `bl` command-line tool.
//!
//! Each tool checks the preconditions `bl` does not check from this call
//! site, then runs it as a subprocess and reports its combined output.
//! There is no timeout: a hanging `bl` hangs the tool call.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use mcp::{Arguments, Field, InputSchema, RegistryError, ToolDescriptor, ToolRegistry};
use policy::{Capability, Policy};
use tokio::process::Command;
use tracing::debug;

use crate::context::bind;
use crate::error::{Result, ToolError};

pub const DEFAULT_COMMAND: &str = "bl";

/// File names that mark a directory as a deployable project.
pub const PROJECT_DESCRIPTORS: [&str; 2] = ["blaxel.yaml", "blaxel.yml"];

/// The kinds of project `bl` can scaffold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Agent,
    Job,
    Sandbox,
    McpServer,
}

impl ProjectKind {
    pub const ALL: [ProjectKind; 4] = [
        ProjectKind::Agent,
        ProjectKind::Job,
        ProjectKind::Sandbox,
        ProjectKind::McpServer,
    ];

    pub fn subcommand(self) -> &'static str {
        match self {
            ProjectKind::Agent => "create-agent-app",
            ProjectKind::Job => "create-job",
            ProjectKind::Sandbox => "create-sandbox",
            ProjectKind::McpServer => "create-mcp-server",
        }
    }

    pub fn tool_name(self) -> &'static str {
        match self {
            ProjectKind::Agent => "local_create_agent",
            ProjectKind::Job => "local_create_job",
            ProjectKind::Sandbox => "local_create_sandbox",
            ProjectKind::McpServer => "local_create_mcp_server",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ProjectKind::Agent => "agent",
            ProjectKind::Job => "job",
            ProjectKind::Sandbox => "sandbox",
            ProjectKind::McpServer => "MCP server",
        }
    }
}

/// Runs `bl` on behalf of the local tools.
#[derive(Debug, Clone)]
pub struct ProjectShell {
    command: String,
    workspace: Option<String>,
}

impl Default for ProjectShell {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectShell {
    pub fn new() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            workspace: None,
        }
    }

    /// Use a different executable in place of `bl`.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Append `--workspace NAME` to every invocation.
    pub fn with_workspace(mut self, workspace: Option<String>) -> Self {
        self.workspace = workspace.filter(|w| !w.is_empty());
        self
    }

    /// Scaffold a new project. The directory must not exist yet.
    pub async fn create(
        &self,
        kind: ProjectKind,
        directory: &str,
        template: Option<&str>,
    ) -> Result<String> {
        if Path::new(directory).exists() {
            return Err(ToolError::AlreadyExists(format!("directory {directory}")));
        }

        let mut args = vec![kind.subcommand().to_string(), directory.to_string()];
        self.push_workspace(&mut args);
        if let Some(template) = template {
            args.push("--template".into());
            args.push(template.into());
        }
        args.push("-y".into());

        let output = self.execute(&args).await?;
        Ok(format!(
            "Created {} project in {directory}\n\n{output}",
            kind.label()
        ))
    }

    /// Deploy the project in `directory`.
    pub async fn deploy(&self, directory: &str) -> Result<String> {
        let path = Path::new(directory);
        if !path.is_dir() {
            return Err(ToolError::InvalidInput(format!(
                "directory {directory} does not exist"
            )));
        }
        if !PROJECT_DESCRIPTORS.iter().any(|f| path.join(f).is_file()) {
            return Err(ToolError::InvalidInput(format!(
                "directory {directory} does not appear to be a valid Blaxel project (no {} found)",
                PROJECT_DESCRIPTORS.join(" or ")
            )));
        }

        let mut args = vec!["deploy".to_string(), "--directory".into(), directory.into()];
        self.push_workspace(&mut args);
        args.push("-y".into());

        let output = self.execute(&args).await?;
        Ok(format!("Deployed {directory}\n\n{output}"))
    }

    /// Run a deployed resource, optionally with a JSON payload.
    pub async fn run(&self, resource_type: &str, name: &str, data: Option<&str>) -> Result<String> {
        let mut args = vec!["run".to_string(), resource_type.into(), name.into()];
        if let Some(data) = data {
            serde_json::from_str::<serde_json::Value>(data)
                .map_err(|e| ToolError::InvalidInput(format!("data must be valid JSON: {e}")))?;
            args.push("--data".into());
            args.push(data.into());
        }
        self.push_workspace(&mut args);

        let output = self.execute(&args).await?;
        Ok(format!("Ran {resource_type} {name}\n\n{output}"))
    }

    fn push_workspace(&self, args: &mut Vec<String>) {
        if let Some(workspace) = &self.workspace {
            args.push("--workspace".into());
            args.push(workspace.clone());
        }
    }

    /// Run the command and return its output.
    ///
    /// The two streams are captured separately, so the result is all of
    /// stdout followed by all of stderr; lines the process interleaved
    /// across them are not kept in write order. A non-zero exit fails with
    /// exactly that text.
    async fn execute(&self, args: &[String]) -> Result<String> {
        debug!(command = %self.command, ?args, "running project command");

        let output = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                command: format!("{} {}", self.command, args.join(" ")),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            debug!(status = %output.status, "project command failed");
            return Err(ToolError::ExternalProcess(combined));
        }
        Ok(combined)
    }
}

fn create_schema(kind: ProjectKind) -> InputSchema {
    InputSchema::new()
        .field(
            Field::string(
                "directory",
                format!("Directory to create the {} project in; must not exist", kind.label()),
            )
            .required(),
        )
        .field(Field::string("template", "Template name to scaffold from"))
}

pub fn register(
    registry: &mut ToolRegistry,
    shell: &Arc<ProjectShell>,
    policy: &Policy,
) -> std::result::Result<(), RegistryError> {
    for kind in ProjectKind::ALL {
        registry.register(
            policy,
            ToolDescriptor::new(
                kind.tool_name(),
                Capability::Exec,
                format!("Scaffold a new {} project on disk with `bl`", kind.label()),
            )
            .with_schema(create_schema(kind)),
            bind(shell, move |shell: Arc<ProjectShell>, arguments: Arguments| {
                create_project(shell, arguments, kind)
            }),
        )?;
    }

    registry.register(
        policy,
        ToolDescriptor::new(
            "local_deploy",
            Capability::Exec,
            "Deploy a local project directory with `bl deploy`",
        )
        .with_schema(
            InputSchema::new().field(
                Field::string("directory", "Project directory containing blaxel.yaml").required(),
            ),
        ),
        bind(shell, deploy_project),
    )?;

    registry.register(
        policy,
        ToolDescriptor::new(
            "local_run",
            Capability::Exec,
            "Run a deployed agent, job or function with `bl run`",
        )
        .with_schema(
            InputSchema::new()
                .field(
                    Field::string("resource_type", "Resource type, e.g. agent or job").required(),
                )
                .field(Field::string("name", "Resource name").required())
                .field(Field::string("data", "JSON payload to send")),
        ),
        bind(shell, run_resource),
    )?;

    Ok(())
}

async fn create_project(
    shell: Arc<ProjectShell>,
    arguments: Arguments,
    kind: ProjectKind,
) -> Result<String> {
    let directory = arguments.required_str("directory")?;
    let template = arguments.non_empty_str("template")?;
    shell.create(kind, directory, template).await
}

async fn deploy_project(shell: Arc<ProjectShell>, arguments: Arguments) -> Result<String> {
    let directory = arguments.required_str("directory")?;
    shell.deploy(directory).await
}

async fn run_resource(shell: Arc<ProjectShell>, arguments: Arguments) -> Result<String> {
    let resource_type = arguments.required_str("resource_type")?;
    let name = arguments.required_str("name")?;
    let data = arguments.non_empty_str("data")?;
    shell.run(resource_type, name, data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::call;
    use serde_json::json;

    /// A shell whose command cannot exist, so any spawn attempt fails loudly.
    fn unreachable_shell() -> ProjectShell {
        ProjectShell::new().with_command("/nonexistent/bl-for-tests")
    }

    fn registry(shell: ProjectShell, policy: &Policy) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        register(&mut registry, &Arc::new(shell), policy).unwrap();
        registry
    }

    #[tokio::test]
    async fn create_refuses_existing_directory() {
        let registry = registry(unreachable_shell(), &Policy::permissive());
        for kind in ProjectKind::ALL {
            let (is_error, text) =
                call(&registry, kind.tool_name(), json!({ "directory": "." })).await;
            assert!(is_error);
            assert!(text.contains("already exists"), "{text}");
        }
    }

    #[tokio::test]
    async fn deploy_requires_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "not a project").unwrap();
        let err = unreachable_shell()
            .deploy(dir.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("does not appear to be a valid Blaxel project"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn deploy_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = unreachable_shell()
            .deploy(missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn either_descriptor_name_passes_precondition() {
        for descriptor in PROJECT_DESCRIPTORS {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join(descriptor), "name: app\n").unwrap();
            let err = unreachable_shell()
                .deploy(dir.path().to_str().unwrap())
                .await
                .unwrap_err();
            // Gets as far as trying to start the command.
            assert!(matches!(err, ToolError::Spawn { .. }), "{descriptor}: {err}");
        }
    }

    #[tokio::test]
    async fn run_rejects_invalid_data() {
        let err = unreachable_shell()
            .run("agent", "helper", Some("{not json"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("data must be valid JSON"));
    }

    #[tokio::test]
    async fn run_requires_both_arguments() {
        let registry = registry(unreachable_shell(), &Policy::permissive());
        let (is_error, text) = call(&registry, "local_run", json!({ "resource_type": "agent" })).await;
        assert!(is_error);
        assert_eq!(text, "name is required");
    }

    #[test]
    fn read_only_registers_no_local_tools() {
        let registry = registry(unreachable_shell(), &Policy::read_only());
        assert!(registry.is_empty());
        assert_eq!(registry.suppressed().len(), 6);
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-bl");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn shell(path: &Path) -> ProjectShell {
            ProjectShell::new()
                .with_command(path.to_str().unwrap())
                .with_workspace(Some("acme".into()))
        }

        #[tokio::test]
        async fn create_passes_arguments_in_order() {
            let dir = tempfile::tempdir().unwrap();
            let bl = script(dir.path(), r#"echo "$@""#);
            let target = dir.path().join("agent");
            let target = target.to_str().unwrap();

            let text = shell(&bl)
                .create(ProjectKind::Agent, target, Some("template-py"))
                .await
                .unwrap();
            assert!(text.starts_with(&format!("Created agent project in {target}")));
            assert!(text.ends_with(&format!(
                "create-agent-app {target} --workspace acme --template template-py -y\n"
            )));
        }

        #[tokio::test]
        async fn deploy_and_run_arguments() {
            let dir = tempfile::tempdir().unwrap();
            let bl = script(dir.path(), r#"echo "$@""#);
            let project = dir.path().join("project");
            std::fs::create_dir(&project).unwrap();
            std::fs::write(project.join("blaxel.yml"), "").unwrap();
            let project = project.to_str().unwrap();

            let text = shell(&bl).deploy(project).await.unwrap();
            assert!(text.ends_with(&format!("deploy --directory {project} --workspace acme -y\n")));

            let text = shell(&bl)
                .run("agent", "helper", Some(r#"{"q":1}"#))
                .await
                .unwrap();
            assert!(text.ends_with("run agent helper --data {\"q\":1} --workspace acme\n"));
        }

        #[tokio::test]
        async fn failure_is_exactly_the_combined_output() {
            let dir = tempfile::tempdir().unwrap();
            let bl = script(dir.path(), "echo out\necho err >&2\nexit 3");
            let target = dir.path().join("job");

            let err = shell(&bl)
                .create(ProjectKind::Job, target.to_str().unwrap(), None)
                .await
                .unwrap_err();
            assert!(matches!(err, ToolError::ExternalProcess(_)));
            assert_eq!(err.to_string(), "out\nerr\n");
        }

        #[tokio::test]
        async fn stderr_follows_stdout_whatever_the_write_order() {
            let dir = tempfile::tempdir().unwrap();
            let bl = script(dir.path(), "echo first >&2\necho second");

            let text = shell(&bl).run("job", "nightly", None).await.unwrap();
            assert!(text.ends_with("second\nfirst\n"), "{text}");
        }
    }
}
