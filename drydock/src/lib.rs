//! # Drydock
//!
//! A staged CI pipeline runner.
//!
//! Drydock executes an ordered list of named stages strictly one at a
//! time, stopping at the first failure:
//!
//! - **Stages**: each stage invokes one external action (a command, a
//!   container build, a containerized command, an artifact upload)
//! - **Fail-fast runs**: the first failing stage halts the run; nothing
//!   after it executes, nothing is retried
//! - **Reports**: every run produces a report naming each executed
//!   stage, and on failure the failing stage's position, name, and cause
//! - **Manifests**: pipelines can be declared in a checked-in JSON file
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drydock::prelude::*;
//!
//! let pipeline = Pipeline::builder("kernel-ci")
//!     .add_stage(ImageBuildStage::new("buildenv", "buildenv").with_dockerfile("ci/buildenv.Dockerfile"))
//!     .add_stage(ContainerRunStage::new("compile", "buildenv", ["make", "build-x86_64"]))
//!     .add_stage(UploadStage::new("upload", "https://share.example.com/api/upload", "dist/kernel.iso"))
//!     .build()?;
//!
//! let report = pipeline.run().await;
//! println!("{}", report.render_text());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod exec;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{PipelineManifest, StageManifest};
    pub use crate::context::{RunContext, RunIdentity};
    pub use crate::core::{FailureCause, StageOutcome, StageStatus};
    pub use crate::errors::{ConfigError, DrydockError, ExecError};
    pub use crate::events::{EventKind, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent};
    pub use crate::exec::{CommandRunner, CommandSpec, ProcessExit, ProcessRunner};
    pub use crate::pipeline::{Pipeline, PipelineBuilder, RunOutcome, RunReport, StageRecord};
    #[cfg(feature = "upload")]
    pub use crate::stages::UploadStage;
    pub use crate::stages::{
        AsyncFnStage, CommandStage, ContainerRunStage, FnStage, ImageBuildStage, NoOpStage, Stage,
    };
}
