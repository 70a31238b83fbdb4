use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use focusmate_ai::cloud::CloudRuntime;
use focusmate_ai::diagnostics::{self, TokenState};
use focusmate_ai::health::{HealthMonitor, MonitorSettings};
use focusmate_ai::probe::{self, NoticeLatch};
use focusmate_ai::runtime::SimulatedRuntime;
use focusmate_ai::{AiCore, CoreConfig, HostRuntime, OperationKind, ProcessingMode};
use log::{info, warn};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "ai-doctor")]
#[command(about = "Inspect, diagnose and exercise the FocusMate AI core")]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every diagnostic check against a simulated runtime
    Diagnose {
        /// Runtime fixture JSON
        #[arg(long)]
        runtime: PathBuf,
        /// Print the report as JSON instead of logging it
        #[arg(long)]
        json: bool,
    },
    /// Probe a runtime and run one health check
    Status {
        #[arg(long)]
        runtime: PathBuf,
    },
    /// Validate the origin-trial tokens of an HTML page
    Tokens {
        html: PathBuf,
        /// Deployment URL the tokens must cover
        #[arg(long)]
        origin: Option<String>,
    },
    /// Run one operation
    Run {
        /// summarize, rewrite, extract-tasks or translate
        operation: OperationKind,
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "academic")]
        mode: ProcessingMode,
        #[arg(long, conflicts_with = "cloud", required_unless_present = "cloud")]
        runtime: Option<PathBuf>,
        /// Use the OpenRouter provider instead of a fixture
        #[arg(long)]
        cloud: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<CoreConfig> {
    match path {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(CoreConfig::default()),
    }
}

fn load_runtime(path: &Path) -> Result<Arc<dyn HostRuntime>> {
    let runtime = SimulatedRuntime::from_file(path)
        .with_context(|| format!("Failed to load runtime fixture {}", path.display()))?;
    Ok(Arc::new(runtime))
}

async fn diagnose(runtime: &Path, json: bool, config: &CoreConfig) -> Result<()> {
    let runtime = load_runtime(runtime)?;
    let report = diagnostics::run_diagnostics(runtime, config)
        .await
        .context("Diagnostics did not complete")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        diagnostics::log_report(&report);
    }
    Ok(())
}

async fn status(runtime: &Path, config: &CoreConfig) -> Result<()> {
    let runtime = load_runtime(runtime)?;
    let min_version = config.min_runtime_version;

    let latch = NoticeLatch::new();
    let (_, notice) = probe::probe_with_notice(runtime.as_ref(), &latch, min_version);
    if let Some(notice) = notice {
        warn!("{}", notice);
    }

    println!("{}", probe::quick_status(runtime.as_ref(), min_version));
    println!();
    println!("{}", probe::compatibility_summary(runtime.as_ref(), min_version));

    let monitor = HealthMonitor::new(runtime, MonitorSettings::from(config));
    let health = monitor.perform_health_check().await;
    println!();
    println!("Health: {}", health.user_friendly_message());
    Ok(())
}

fn tokens(html: &Path, origin: Option<&str>) -> Result<bool> {
    let content = std::fs::read_to_string(html)
        .with_context(|| format!("Failed to read {}", html.display()))?;
    let page = origin
        .map(Url::parse)
        .transpose()
        .context("Invalid --origin URL")?;

    let raw = diagnostics::extract_tokens_from_html(&content);
    let report = diagnostics::validate_tokens(&raw, page.as_ref(), chrono::Utc::now());

    for check in &report.results {
        match &check.state {
            TokenState::Active {
                token,
                matches_origin,
            } => {
                let expires = token
                    .expires_at()
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| token.expiry.to_string());
                info!("✅ Token {}: {} (expires {})", check.index, token.feature, expires);
                if *matches_origin == Some(false) {
                    warn!("   origin {} does not cover the page", token.origin);
                }
            }
            TokenState::Expired { token } => {
                warn!("⏰ Token {}: {} expired", check.index, token.feature);
            }
            TokenState::Invalid { error } => {
                warn!("❌ Token {}: {}", check.index, error);
            }
        }
    }

    for feature in &report.missing_features {
        warn!("Missing token for {}", feature);
    }

    println!(
        "{} tokens: {} active, {} expired, {} invalid",
        report.total(),
        report.active(),
        report.expired(),
        report.invalid()
    );

    Ok(report.invalid() == 0 && report.expired() == 0)
}

async fn run(
    operation: OperationKind,
    text: &str,
    mode: ProcessingMode,
    runtime: Option<&Path>,
    config: CoreConfig,
) -> Result<bool> {
    let runtime: Arc<dyn HostRuntime> = match runtime {
        Some(path) => load_runtime(path)?,
        None => Arc::new(CloudRuntime::new(&config.cloud)),
    };

    let core = AiCore::new(runtime, config);
    let result = core.invoke(operation, text, mode).await;

    if result.is_degraded() {
        warn!("Result is degraded");
    }
    println!("{}", result.display_text());
    Ok(!result.is_failed())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let ok = match cli.command {
        Command::Diagnose { runtime, json } => {
            diagnose(&runtime, json, &config).await?;
            true
        }
        Command::Status { runtime } => {
            status(&runtime, &config).await?;
            true
        }
        Command::Tokens { html, origin } => tokens(&html, origin.as_deref())?,
        Command::Run {
            operation,
            text,
            mode,
            runtime,
            cloud: _,
        } => run(operation, &text, mode, runtime.as_deref(), config).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
