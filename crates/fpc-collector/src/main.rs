//! FPC collector
//!
//! Polls every configured device once and prints the Prometheus text
//! exposition of the results to stdout, one device after another in
//! configuration order. Devices are polled concurrently.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-3: Content of Audit Records - Structured logging
//! - AU-12: Audit Record Generation - Log poll outcome per device

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use junos_fpc_collector::{export, CollectorConfig, FpcCollector, MetricSample, TargetConfig};

#[derive(Debug, Parser)]
#[command(version, about = "Collect Junos FPC/PIC status as Prometheus metrics")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, conflicts_with_all = ["target", "fixtures"])]
    config: Option<PathBuf>,

    /// Single target name (used with --fixtures)
    #[arg(long, requires = "fixtures")]
    target: Option<String>,

    /// Directory of captured replies for --target
    #[arg(long, requires = "target")]
    fixtures: Option<PathBuf>,

    /// Metric name prefix, overrides the configuration
    #[arg(long)]
    namespace: Option<String>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<CollectorConfig> {
        let mut config = match (self.config, self.target, self.fixtures) {
            (Some(path), _, _) => CollectorConfig::from_file(&path)
                .with_context(|| format!("loading {}", path.display()))?,
            (None, Some(name), Some(fixtures)) => CollectorConfig {
                targets: vec![TargetConfig {
                    name,
                    fixtures: Some(fixtures),
                    command: None,
                }],
                ..CollectorConfig::default()
            },
            _ => anyhow::bail!("either --config or --target with --fixtures is required"),
        };

        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Initialize structured logging on stderr
fn init_logging(default_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))
}

async fn poll_target(
    collector: Arc<FpcCollector>,
    target: TargetConfig,
) -> anyhow::Result<String> {
    let client = target.client()?;
    let mut samples: Vec<MetricSample> = Vec::new();
    collector
        .collect(client.as_ref(), &mut samples, &target.name)
        .await?;
    Ok(export::encode_text(&samples)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Args::parse().into_config()?;
    init_logging(&config.log_level)?;

    info!(
        targets = config.targets.len(),
        namespace = %config.namespace,
        "fpc-collector: Starting poll"
    );

    let collector = Arc::new(FpcCollector::with_namespace(config.namespace.clone()));
    let handles: Vec<_> = config
        .targets
        .into_iter()
        .map(|target| {
            let name = target.name.clone();
            let handle = tokio::spawn(poll_target(collector.clone(), target));
            (name, handle)
        })
        .collect();

    let mut failed = 0usize;
    for (name, handle) in handles {
        match handle.await? {
            Ok(text) => print!("{text}"),
            Err(e) => {
                error!(target_name = %name, error = %e, "fpc-collector: Poll failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        info!("fpc-collector: Poll complete");
        Ok(ExitCode::SUCCESS)
    }
}
