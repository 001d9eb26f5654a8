//! Graph Deployment Operator
//!
//! Watches `GraphDeployment` resources, applies their storage claims and
//! records the registry pull secrets available to their images.

use clap::Parser;
use kube::{Client, CustomResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use graph_deployment_operator::controlplane::run;
use graph_deployment_operator::{
    DeadlineSecretRetriever, Error, GraphDeployment, KubeSecretRetriever, OperatorConfig, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Graph Deployment Operator - storage claims and registry credentials
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Field manager name for server-side apply
    #[arg(long, env = "FIELD_MANAGER", default_value = "graph-deployment-operator")]
    field_manager: String,

    /// Requeue interval after a successful reconciliation, in seconds
    #[arg(long, env = "REQUEUE_SECS", default_value = "300")]
    requeue_secs: u64,

    /// Retry delay after a transient failure, in seconds
    #[arg(long, env = "ERROR_BACKOFF_SECS", default_value = "5")]
    error_backoff_secs: u64,

    /// Deadline for a registry secret lookup, in seconds
    #[arg(long, env = "LOOKUP_TIMEOUT_SECS", default_value = "10")]
    lookup_timeout_secs: u64,

    /// Only watch this namespace
    #[arg(long, env = "WATCH_NAMESPACE")]
    watch_namespace: Option<String>,

    /// Print the GraphDeployment CRD as YAML and exit
    #[arg(long)]
    print_crd: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn operator_config(&self) -> Result<OperatorConfig> {
        if self.field_manager.is_empty() {
            return Err(Error::Configuration("field manager must not be empty".into()));
        }

        Ok(OperatorConfig {
            field_manager: self.field_manager.clone(),
            requeue_interval: Duration::from_secs(self.requeue_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
            lookup_timeout: Duration::from_secs(self.lookup_timeout_secs),
            watch_namespace: self.watch_namespace.clone(),
        })
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_crd {
        print!("{}", serde_yaml::to_string(&GraphDeployment::crd())?);
        return Ok(());
    }

    init_logging(&args);
    let config = args.operator_config()?;

    info!("Starting Graph Deployment Operator");
    info!("  Version: {}", graph_deployment_operator::VERSION);
    info!("  Field manager: {}", config.field_manager);
    info!("  Requeue interval: {:?}", config.requeue_interval);
    info!("  Lookup timeout: {:?}", config.lookup_timeout);

    let client = Client::try_default().await?;
    let retriever = Arc::new(DeadlineSecretRetriever::new(
        KubeSecretRetriever::new(client.clone()),
        config.lookup_timeout,
    ));

    run(client, retriever, config).await?;

    info!("Operator shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "kube=info", "tower=warn"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
