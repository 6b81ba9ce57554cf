//! CI harness for drydock pipelines.
//!
//! Loads a pipeline manifest, runs it, renders the report, and turns the
//! outcome into a process exit code the CI host can act on.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use drydock::config::PipelineManifest;
use drydock::core::FailureCause;
use drydock::errors::{ConfigError, ConfigSuggestions};
use drydock::pipeline::RunOutcome;
use std::path::PathBuf;
use std::process::ExitCode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "drydock")]
#[command(version = VERSION)]
#[command(about = "Staged CI pipeline runner")]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and report the outcome
    Run(RunArgs),
    /// Validate the manifest without executing anything
    Check(ManifestArgs),
    /// List the stages in execution order
    Stages(ManifestArgs),
}

#[derive(Args)]
struct ManifestArgs {
    /// Path to the pipeline manifest.
    #[arg(long, default_value = "drydock.json")]
    manifest: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    common: ManifestArgs,

    /// Report format.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match dispatch(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            if let Some(hint) = config_hint(&err) {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(error_exit_code(&err))
        }
    }
}

fn config_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<ConfigError>()
        .and_then(ConfigError::code)
        .and_then(ConfigSuggestions::get)
}

async fn dispatch(cli: Cli) -> anyhow::Result<u8> {
    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Check(args) => check(&args),
        Commands::Stages(args) => stages(&args),
    }
}

async fn run(args: RunArgs) -> anyhow::Result<u8> {
    tracing::info!(manifest = %args.common.manifest.display(), "loading manifest");
    let manifest = PipelineManifest::from_path(&args.common.manifest)?;
    let pipeline = manifest.into_pipeline()?;

    let report = pipeline.run().await;

    match args.report {
        ReportFormat::Text => println!("{}", report.render_text()),
        ReportFormat::Json => {
            println!("{}", report.to_json().context("rendering the run report")?);
        }
    }

    Ok(outcome_exit_code(&report.outcome))
}

fn check(args: &ManifestArgs) -> anyhow::Result<u8> {
    let manifest = PipelineManifest::from_path(&args.manifest)?;
    let pipeline = manifest.into_pipeline()?;
    println!("ok: '{}' with {} stages", pipeline.name(), pipeline.len());
    Ok(0)
}

fn stages(args: &ManifestArgs) -> anyhow::Result<u8> {
    let manifest = PipelineManifest::from_path(&args.manifest)?;
    for (index, name) in manifest.stage_names().iter().enumerate() {
        println!("{}. {name}", index + 1);
    }
    Ok(0)
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Maps a run outcome to the process exit code.
///
/// Success is 0. A stage that failed with an exit code passes that code
/// through (clamped to 1..=255 so a failure can never exit 0); any other
/// failure cause is 1.
fn outcome_exit_code(outcome: &RunOutcome) -> u8 {
    match outcome.cause() {
        None => 0,
        Some(FailureCause::ExitCode(code)) => clamp_exit_code(*code),
        Some(_) => 1,
    }
}

fn clamp_exit_code(code: i32) -> u8 {
    if code <= 0 {
        1
    } else if code >= 255 {
        255
    } else {
        u8::try_from(code).unwrap_or(255)
    }
}

/// Configuration problems exit 2; everything else exits 1.
fn error_exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from([
            "drydock", "run", "--manifest", "ci.json", "--report", "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.common.manifest, PathBuf::from("ci.json"));
                assert_eq!(args.report, ReportFormat::Json);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_clamp_exit_code() {
        assert_eq!(clamp_exit_code(1), 1);
        assert_eq!(clamp_exit_code(7), 7);
        assert_eq!(clamp_exit_code(254), 254);
        assert_eq!(clamp_exit_code(255), 255);
        assert_eq!(clamp_exit_code(300), 255);
        assert_eq!(clamp_exit_code(0), 1);
        assert_eq!(clamp_exit_code(-9), 1);
    }

    #[test]
    fn test_outcome_exit_code() {
        assert_eq!(outcome_exit_code(&RunOutcome::Completed), 0);

        let exit_code = RunOutcome::Failed {
            stage: "compile".to_string(),
            position: 2,
            cause: FailureCause::ExitCode(7),
        };
        assert_eq!(outcome_exit_code(&exit_code), 7);

        let signal = RunOutcome::Failed {
            stage: "compile".to_string(),
            position: 2,
            cause: FailureCause::Signal(9),
        };
        assert_eq!(outcome_exit_code(&signal), 1);

        let error = RunOutcome::Failed {
            stage: "upload".to_string(),
            position: 3,
            cause: FailureCause::Error("token missing".to_string()),
        };
        assert_eq!(outcome_exit_code(&error), 1);
    }

    #[test]
    fn test_config_errors_exit_two() {
        let config: anyhow::Error = ConfigError::empty().into();
        assert_eq!(error_exit_code(&config), 2);

        let other = anyhow::anyhow!("network down");
        assert_eq!(error_exit_code(&other), 1);
    }

    #[test]
    fn test_config_hint_lookup() {
        let config: anyhow::Error = ConfigError::empty().into();
        assert!(config_hint(&config).is_some());
        assert!(config_hint(&anyhow::anyhow!("network down")).is_none());
    }

    fn write_manifest(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("drydock.json");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_passes_stage_exit_code_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            &dir,
            r#"{ "name": "ci", "stages": [
                { "kind": "command", "name": "ok", "program": "true" },
                { "kind": "command", "name": "boom", "program": "sh", "args": ["-c", "exit 7"] }
            ] }"#,
        );

        let cli = Cli::try_parse_from([
            "drydock",
            "run",
            "--manifest",
            path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(dispatch(cli).await.unwrap(), 7);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_succeeds_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            &dir,
            r#"{ "name": "ci", "stages": [
                { "kind": "command", "name": "a", "program": "true" },
                { "kind": "command", "name": "b", "program": "true" }
            ] }"#,
        );

        let cli = Cli::try_parse_from([
            "drydock",
            "run",
            "--manifest",
            path.to_str().unwrap(),
            "--report",
            "json",
        ])
        .unwrap();

        assert_eq!(dispatch(cli).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_check_reports_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(&dir, r#"{ "stages": [] }"#);

        let cli = Cli::try_parse_from([
            "drydock",
            "check",
            "--manifest",
            path.to_str().unwrap(),
        ])
        .unwrap();

        let err = dispatch(cli).await.unwrap_err();
        assert_eq!(error_exit_code(&err), 2);
    }

    #[tokio::test]
    async fn test_stages_lists_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            &dir,
            r#"{ "stages": [
                { "kind": "command", "name": "lint", "program": "true" },
                { "kind": "command", "name": "build", "program": "true" }
            ] }"#,
        );

        let cli = Cli::try_parse_from([
            "drydock",
            "stages",
            "--manifest",
            path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(dispatch(cli).await.unwrap(), 0);
    }
}
