mod backends;
mod cli;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use bridge_catalog::Catalog;
use bridge_config::{ConfigBroadcaster, CycleSignals, ReadinessGate};
use bridge_queue::{QueueMatcherRunner, TemplateJobSpecRenderer};
use bridge_scanner::{S3ClientFactory, Scanner};
use bridge_tfx::{DefaultSinkFactory, TfxReconciler};
use bridge_types::{BridgeMetrics, ErrorSuppressor, ErrorKind};
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use backends::{LoggingJobSpecSink, NullQueueFactsProvider, UnimplementedConfigMapBackend};
use cli::Cli;

const DEFAULT_JOB_SPEC_TEMPLATE: &str = r#"{"queue":"{queue}","node_group":"{node_group}","instance_type":"{instance_type}","price_per_hour":{price_per_hour}}"#;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init();

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!(
        service = %cli.service_name,
        working_dir = %cli.working_dir,
        prom_address = %cli.prom_address,
        prom_refresh = ?cli.prom_refresh,
        k8s_namespace = cli.k8s_namespace.as_deref().unwrap_or("-"),
        "starting model-serving bridge"
    );

    let registry = prometheus::Registry::new();
    let metrics = Arc::new(BridgeMetrics::register(&registry).context("failed to register metrics")?);
    let error_suppressor = Arc::new(ErrorSuppressor::new());
    let catalog = Arc::new(Catalog::new());

    let broadcaster = Arc::new(ConfigBroadcaster::new(cli.initial_snapshot()));
    let readiness = Arc::new(ReadinessGate::new(broadcaster));

    let cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();

    let scanner = Scanner {
        catalog: catalog.clone(),
        readiness: readiness.clone(),
        client_factory: Arc::new(S3ClientFactory { region: cli.aws_default_region.clone() }),
        signals: CycleSignals::new(),
        metrics: metrics.clone(),
        error_suppressor: error_suppressor.clone(),
        success_interval: cli.s3_refresh,
    };
    let scanner_cancel = cancel.clone();
    tasks.spawn(async move { ("scanner", scanner.run(scanner_cancel).await.map_err(Some)) });

    let reconciler = TfxReconciler {
        catalog: catalog.clone(),
        readiness: readiness.clone(),
        sink_factory: Arc::new(DefaultSinkFactory { config_map_backend: Arc::new(UnimplementedConfigMapBackend) }),
        signals: CycleSignals::new(),
        tick_interval: bridge_tfx::DEFAULT_TICK_INTERVAL,
        metrics: metrics.clone(),
        error_suppressor: error_suppressor.clone(),
    };
    let reconciler_cancel = cancel.clone();
    tasks.spawn(async move {
        reconciler.run(reconciler_cancel).await;
        ("tfx-reconciler", Ok(()))
    });

    let queue_matcher = QueueMatcherRunner {
        facts: Arc::new(NullQueueFactsProvider),
        renderer: Arc::new(TemplateJobSpecRenderer::new(DEFAULT_JOB_SPEC_TEMPLATE)),
        sink: Arc::new(LoggingJobSpecSink),
        signals: CycleSignals::new(),
        tick_interval: bridge_queue::DEFAULT_TICK_INTERVAL,
        metrics: metrics.clone(),
        error_suppressor: error_suppressor.clone(),
    };
    let queue_cancel = cancel.clone();
    tasks.spawn(async move {
        queue_matcher.run(queue_cancel).await;
        ("queue-matcher", Ok(()))
    });

    let mut exit_code = 0;
    let mut shutting_down = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c(), if !shutting_down => {
                info!("received shutdown signal");
                shutting_down = true;
                cancel.cancel();
            }
            joined = tasks.join_next() => {
                match joined {
                    None => break,
                    Some(Ok((name, Err(Some(e))))) if e.kind() == ErrorKind::Configuration => {
                        error!(task = name, error = %e, "task failed with a fatal configuration error");
                        exit_code = 1;
                        if !shutting_down {
                            shutting_down = true;
                            cancel.cancel();
                        }
                    }
                    Some(Ok((name, Err(Some(e))))) => {
                        error!(task = name, error = %e, "task exited with an error");
                    }
                    Some(Ok((_name, Ok(())))) | Some(Ok((_name, Err(None)))) => {}
                    Some(Err(join_err)) => {
                        error!(error = %join_err, "task panicked or was cancelled");
                    }
                }
            }
        }
    }

    std::process::exit(exit_code);
}
