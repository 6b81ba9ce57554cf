//! Container image build and container run stages.
//!
//! Both stages shell out to the `docker` CLI; the container engine is an
//! external collaborator, not something this crate talks to over an API.

use super::{run_to_outcome, Stage};
use crate::context::RunContext;
use crate::core::StageOutcome;
use crate::exec::{CommandRunner, CommandSpec, ProcessRunner};
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

/// Builds a container image with `docker build`.
pub struct ImageBuildStage {
    name: String,
    image: String,
    dockerfile: Option<PathBuf>,
    context_dir: PathBuf,
    build_args: Vec<(String, String)>,
    runner: Arc<dyn CommandRunner>,
}

impl ImageBuildStage {
    /// Creates a stage that builds `image` from the current directory.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            dockerfile: None,
            context_dir: PathBuf::from("."),
            build_args: Vec::new(),
            runner: Arc::new(ProcessRunner::new()),
        }
    }

    /// Sets the dockerfile path (`-f`).
    #[must_use]
    pub fn with_dockerfile(mut self, dockerfile: impl Into<PathBuf>) -> Self {
        self.dockerfile = Some(dockerfile.into());
        self
    }

    /// Sets the build context directory.
    #[must_use]
    pub fn with_context_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.context_dir = dir.into();
        self
    }

    /// Adds a `--build-arg` pair.
    #[must_use]
    pub fn with_build_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_args.push((key.into(), value.into()));
        self
    }

    /// Replaces the command runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Assembles the `docker build` invocation.
    #[must_use]
    pub fn command_spec(&self) -> CommandSpec {
        let mut spec = CommandSpec::new("docker").with_args(["build", "-t"]);
        spec = spec.with_arg(self.image.as_str());
        if let Some(dockerfile) = &self.dockerfile {
            spec = spec
                .with_arg("-f")
                .with_arg(dockerfile.display().to_string());
        }
        for (key, value) in &self.build_args {
            spec = spec.with_arg("--build-arg").with_arg(format!("{key}={value}"));
        }
        spec.with_arg(self.context_dir.display().to_string())
    }
}

impl Debug for ImageBuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuildStage")
            .field("name", &self.name)
            .field("image", &self.image)
            .field("dockerfile", &self.dockerfile)
            .field("context_dir", &self.context_dir)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for ImageBuildStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
        run_to_outcome(self.runner.as_ref(), &self.command_spec()).await
    }
}

/// Runs one command inside a container with `docker run`.
///
/// The container is removed after the run unless [`keep_container`] is
/// called.
///
/// [`keep_container`]: ContainerRunStage::keep_container
pub struct ContainerRunStage {
    name: String,
    image: String,
    command: Vec<String>,
    volumes: Vec<(String, String)>,
    remove: bool,
    runner: Arc<dyn CommandRunner>,
}

impl ContainerRunStage {
    /// Creates a stage that runs `command` inside `image`.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, image: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            image: image.into(),
            command: command.into_iter().map(Into::into).collect(),
            volumes: Vec::new(),
            remove: true,
            runner: Arc::new(ProcessRunner::new()),
        }
    }

    /// Adds a bind mount (`-v host:container`).
    ///
    /// The host path is passed to docker verbatim; docker requires it to
    /// be absolute.
    #[must_use]
    pub fn with_volume(mut self, host: impl Into<String>, container: impl Into<String>) -> Self {
        self.volumes.push((host.into(), container.into()));
        self
    }

    /// Keeps the container around after the run (drops `--rm`).
    #[must_use]
    pub fn keep_container(mut self) -> Self {
        self.remove = false;
        self
    }

    /// Replaces the command runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Assembles the `docker run` invocation.
    #[must_use]
    pub fn command_spec(&self) -> CommandSpec {
        let mut spec = CommandSpec::new("docker").with_arg("run");
        if self.remove {
            spec = spec.with_arg("--rm");
        }
        for (host, container) in &self.volumes {
            spec = spec.with_arg("-v").with_arg(format!("{host}:{container}"));
        }
        spec.with_arg(self.image.as_str())
            .with_args(self.command.iter().cloned())
    }
}

impl Debug for ContainerRunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerRunStage")
            .field("name", &self.name)
            .field("image", &self.image)
            .field("command", &self.command)
            .field("volumes", &self.volumes)
            .field("remove", &self.remove)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for ContainerRunStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
        run_to_outcome(self.runner.as_ref(), &self.command_spec()).await
    }
}
