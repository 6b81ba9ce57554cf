//! Declarative pipeline manifests.
//!
//! A manifest is a checked-in JSON file describing the stage sequence.
//! Parsing and conversion surface every problem as a configuration
//! error, before any stage executes.

use crate::errors::ConfigError;
use crate::exec::CommandSpec;
use crate::pipeline::Pipeline;
use crate::stages::{CommandStage, ContainerRunStage, ImageBuildStage, Stage};
#[cfg(feature = "upload")]
use crate::stages::UploadStage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn default_pipeline_name() -> String {
    "pipeline".to_string()
}

fn default_context_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_remove() -> bool {
    true
}

fn default_token_env() -> String {
    "ZIPLINE_TOKEN".to_string()
}

fn default_field_name() -> String {
    "file".to_string()
}

/// Top-level pipeline manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineManifest {
    /// Pipeline name.
    #[serde(default = "default_pipeline_name")]
    pub name: String,
    /// Ordered stage entries; declaration order is execution order.
    pub stages: Vec<StageManifest>,
}

impl PipelineManifest {
    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the text is not a valid
    /// manifest.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|err| ConfigError::manifest(err.to_string()))
    }

    /// Loads a manifest from a file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read or
    /// parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            ConfigError::manifest(format!("cannot read '{}': {err}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Returns the stage names in declaration order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(StageManifest::name).collect()
    }

    /// Converts the manifest into a validated pipeline.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a stage entry is invalid or
    /// the sequence fails pipeline validation.
    pub fn into_pipeline(self) -> Result<Pipeline, ConfigError> {
        let mut builder = Pipeline::builder(self.name);
        for stage in self.stages {
            builder = builder.add_shared(stage.into_stage()?);
        }
        builder.build()
    }
}

/// One stage entry in a manifest, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageManifest {
    /// One external command.
    Command {
        /// Stage name.
        name: String,
        /// Program to run.
        program: String,
        /// Program arguments.
        #[serde(default)]
        args: Vec<String>,
        /// Working directory.
        #[serde(default)]
        current_dir: Option<PathBuf>,
        /// Environment variables.
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// A container image build.
    ImageBuild {
        /// Stage name.
        name: String,
        /// Image tag to build.
        image: String,
        /// Dockerfile path.
        #[serde(default)]
        dockerfile: Option<PathBuf>,
        /// Build context directory.
        #[serde(default = "default_context_dir")]
        context_dir: PathBuf,
        /// Build arguments.
        #[serde(default)]
        build_args: HashMap<String, String>,
    },
    /// One command inside a container.
    ContainerRun {
        /// Stage name.
        name: String,
        /// Image to run.
        image: String,
        /// Command argv.
        command: Vec<String>,
        /// Bind mounts as `host:container`; relative host paths are
        /// resolved against the current directory.
        #[serde(default)]
        volumes: Vec<String>,
        /// Remove the container after the run.
        #[serde(default = "default_remove")]
        remove: bool,
    },
    /// An artifact upload.
    Upload {
        /// Stage name.
        name: String,
        /// Endpoint URL.
        url: String,
        /// Artifact file to upload.
        file: PathBuf,
        /// Environment variable holding the token.
        #[serde(default = "default_token_env")]
        token_env: String,
        /// Multipart field name.
        #[serde(default = "default_field_name")]
        field_name: String,
    },
}

impl StageManifest {
    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Command { name, .. }
            | Self::ImageBuild { name, .. }
            | Self::ContainerRun { name, .. }
            | Self::Upload { name, .. } => name,
        }
    }

    /// Builds the stage this entry describes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the entry is invalid, or names
    /// a stage kind this build does not include.
    pub fn into_stage(self) -> Result<Arc<dyn Stage>, ConfigError> {
        match self {
            Self::Command {
                name,
                program,
                args,
                current_dir,
                env,
            } => {
                let mut spec = CommandSpec::new(program).with_args(args);
                if let Some(dir) = current_dir {
                    spec = spec.with_current_dir(dir);
                }
                for (key, value) in env {
                    spec = spec.with_env(key, value);
                }
                Ok(Arc::new(CommandStage::new(name, spec)))
            }
            Self::ImageBuild {
                name,
                image,
                dockerfile,
                context_dir,
                build_args,
            } => {
                let mut stage = ImageBuildStage::new(name, image).with_context_dir(context_dir);
                if let Some(dockerfile) = dockerfile {
                    stage = stage.with_dockerfile(dockerfile);
                }
                for (key, value) in build_args {
                    stage = stage.with_build_arg(key, value);
                }
                Ok(Arc::new(stage))
            }
            Self::ContainerRun {
                name,
                image,
                command,
                volumes,
                remove,
            } => {
                let mut stage = ContainerRunStage::new(name, image, command);
                if !remove {
                    stage = stage.keep_container();
                }
                for volume in volumes {
                    let (host, container) = parse_volume(&volume)?;
                    stage = stage.with_volume(host, container);
                }
                Ok(Arc::new(stage))
            }
            #[cfg(feature = "upload")]
            Self::Upload {
                name,
                url,
                file,
                token_env,
                field_name,
            } => Ok(Arc::new(
                UploadStage::new(name, url, file)
                    .with_token_env(token_env)
                    .with_field_name(field_name),
            )),
            #[cfg(not(feature = "upload"))]
            Self::Upload { name, .. } => Err(ConfigError::manifest(format!(
                "stage '{name}' requires upload support, which this build does not include"
            ))),
        }
    }
}

/// Splits a `host:container` mount and resolves a relative host path
/// against the current directory (docker needs it absolute).
fn parse_volume(volume: &str) -> Result<(String, String), ConfigError> {
    let invalid =
        || ConfigError::manifest(format!("volume '{volume}' must be 'host:container'"));

    let (host, container) = volume.split_once(':').ok_or_else(invalid)?;
    if host.is_empty() || container.is_empty() {
        return Err(invalid());
    }

    let host_path = Path::new(host);
    let host = if host_path.is_relative() {
        let cwd = std::env::current_dir().map_err(|err| {
            ConfigError::manifest(format!("cannot resolve current directory: {err}"))
        })?;
        if host == "." { cwd } else { cwd.join(host_path) }
            .display()
            .to_string()
    } else {
        host.to_string()
    };

    Ok((host, container.to_string()))
}
