mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use certitude_ai::azure::{DEFAULT_API_VERSION, DEFAULT_DEPLOYMENT};
use certitude_ai::{AzureConfig, AzureOracle, FieldOracle, StaticOracle, explain};
use certitude_core::document::file_type_for;
use certitude_core::{ApiRegistry, SecurityGuard, TrustList, VerifyConfig};
use certitude_pipeline::{DocumentOutcome, FsTextSource, Pipeline, TextSource};
use certitude_store::audit::DEFAULT_AUDIT_LOG;
use certitude_store::batch::DEFAULT_BATCH_OUTPUT;
use certitude_store::{AuditLogger, JsonlAuditLog};
use certitude_sync::{HttpProbe, RegistryVerifier};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "certitude", version, about = "Certificate extraction and verification")]
struct Cli {
    /// Only files under this directory may be read.
    #[arg(long, env = "CERTITUDE_DATA_ROOT", default_value = "data", global = true)]
    data_root: PathBuf,

    /// JSON file of the form {"trusted_issuers": [...]}.
    #[arg(
        long,
        env = "CERTITUDE_TRUST_LIST",
        default_value = "trusted_issuers.json",
        global = true
    )]
    trust_list: PathBuf,

    /// JSON array of {issuer, api_url, kind}; the built-in registry if omitted.
    #[arg(long, env = "CERTITUDE_REGISTRY", global = true)]
    registry: Option<PathBuf>,

    /// Append-only audit log (JSON lines).
    #[arg(long, env = "CERTITUDE_AUDIT_LOG", default_value = DEFAULT_AUDIT_LOG, global = true)]
    audit_log: PathBuf,

    /// Oracle calls per document.
    #[arg(long, default_value_t = certitude_core::config::DEFAULT_ENSEMBLE_ATTEMPTS, global = true)]
    attempts: usize,

    /// Per-call oracle timeout in seconds.
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,

    /// Query registry endpoints over HTTP instead of the offline check.
    #[arg(long, global = true)]
    live_registry: bool,

    #[command(flatten)]
    azure: AzureArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct AzureArgs {
    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true, global = true)]
    azure_api_key: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_ENDPOINT", global = true)]
    azure_endpoint: Option<String>,

    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT", default_value = DEFAULT_DEPLOYMENT, global = true)]
    azure_deployment: String,

    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = DEFAULT_API_VERSION, global = true)]
    azure_api_version: String,
}

#[derive(Subcommand)]
enum Command {
    /// Verify one certificate and print its report.
    Verify {
        /// Path to the certificate file.
        file: PathBuf,
    },
    /// Verify every file named in a list (one path per line, CSV-compatible).
    Batch {
        /// Path to the batch list.
        list: PathBuf,

        /// Where to write the redacted results.
        #[arg(long, short, default_value = DEFAULT_BATCH_OUTPUT)]
        output: PathBuf,

        /// Documents processed at once.
        #[arg(long, default_value_t = certitude_core::config::DEFAULT_BATCH_CONCURRENCY)]
        concurrency: usize,
    },
    /// Show classifier signals for one file without extracting fields.
    Classify {
        /// Path to the file.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("certitude v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = build_config(&cli)?;

    match &cli.command {
        Command::Verify { file } => {
            let pipeline = build_pipeline(&cli, config)?;
            match pipeline.process_path(file).await {
                DocumentOutcome::Processed(report) => {
                    display::print_report_card(&report);
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                DocumentOutcome::NotProcessed { path, reason } => {
                    bail!("{} not processed: {reason}", path.display());
                }
            }
        }
        Command::Batch {
            list,
            output,
            concurrency,
        } => {
            config.batch_concurrency = *concurrency;
            config.validate()?;
            let pipeline = build_pipeline(&cli, config)?;
            let run = pipeline
                .run_batch(list)
                .await
                .with_context(|| format!("batch {}", list.display()))?;
            run.write_results(output)
                .with_context(|| format!("writing {}", output.display()))?;
            display::print_batch_summary(&run.summary, output);
        }
        Command::Classify { file } => classify(&config, file)?,
    }

    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<VerifyConfig> {
    let registry = match &cli.registry {
        Some(path) => ApiRegistry::load(path)?,
        None => ApiRegistry::default(),
    };
    let config = VerifyConfig {
        data_root: cli.data_root.clone(),
        ensemble_attempts: cli.attempts,
        oracle_timeout: Duration::from_secs(cli.timeout_secs),
        trust_list: TrustList::load(&cli.trust_list),
        registry,
        ..Default::default()
    };
    config.validate()?;
    Ok(config)
}

fn build_oracle(args: &AzureArgs) -> anyhow::Result<Arc<dyn FieldOracle>> {
    let azure = AzureConfig {
        api_key: args.azure_api_key.clone(),
        endpoint: args.azure_endpoint.clone(),
        deployment: args.azure_deployment.clone(),
        api_version: args.azure_api_version.clone(),
    };
    if azure.is_configured() {
        Ok(Arc::new(AzureOracle::new(&azure)?))
    } else {
        warn!("Azure OpenAI credentials not configured, using static demo extraction");
        Ok(Arc::new(StaticOracle::demo()))
    }
}

fn build_pipeline(cli: &Cli, config: VerifyConfig) -> anyhow::Result<Pipeline> {
    let oracle = build_oracle(&cli.azure)?;
    let registry = config.registry.clone();
    let timeout = config.oracle_timeout;
    let audit = AuditLogger::new(Arc::new(JsonlAuditLog::new(&cli.audit_log)));

    let mut pipeline = Pipeline::new(config, oracle, audit)
        .with_context(|| format!("data root {}", cli.data_root.display()))?;
    if cli.live_registry {
        let probe = HttpProbe::new(timeout)?;
        pipeline = pipeline.with_verifier(Arc::new(RegistryVerifier::new(registry, probe)));
    }
    Ok(pipeline)
}

fn classify(config: &VerifyConfig, file: &Path) -> anyhow::Result<()> {
    let guard = SecurityGuard::new(&config.data_root, config.max_file_size)
        .with_context(|| format!("data root {}", config.data_root.display()))?;
    let resolved = guard.admit(file)?;
    let text = FsTextSource::new(guard).extract_text(&resolved)?;
    let file_type = file_type_for(&resolved);
    let classification = explain(&file_type, &text.text);
    display::print_classification(&resolved, &file_type, &classification);
    Ok(())
}
