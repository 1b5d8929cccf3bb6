use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use opspulse_cache::AuthCache;
use opspulse_core::TenantId;
use opspulse_delivery::{DeliveryWorker, SenderRegistry};
use opspulse_dispatcher::Dispatcher;
use opspulse_evaluator::Evaluator;
use opspulse_ingest::{IngestDeps, IngestPipeline, InMemoryQuarantineSink};
use opspulse_server::api::{router, AppState};
use opspulse_server::auth::AdminApiKeys;
use opspulse_server::config::PulseConfig;
use opspulse_server::state_factory::Backends;
use opspulse_state_postgres::PostgresConfig;
use opspulse_writer::{BatchWriter, HttpLineSink};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "opspulse-server", about = "OpsConductor-Pulse telemetry pipeline entry points")]
struct Cli {
    #[arg(short, long, default_value = "pulse.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP device ingress + admin API + health endpoint (C1, C3).
    IngestServer {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the liveness/threshold evaluator tick loop (C4).
    Evaluator,
    /// Run the alert-to-job dispatcher tick loop (C5).
    Dispatcher,
    /// Run the delivery worker claim/send loop (C6).
    Delivery,
}

fn load_config(path: &str) -> Result<PulseConfig, Box<dyn std::error::Error>> {
    let mut config: PulseConfig = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)?
    } else {
        info!(path, "config file not found, using defaults");
        toml::from_str("")?
    };
    config.apply_env_overrides();
    Ok(config)
}

async fn build_backends(config: &PulseConfig) -> Result<Backends, Box<dyn std::error::Error>> {
    match &config.postgres.url {
        Some(url) => {
            let pg_config = PostgresConfig {
                url: url.clone(),
                pool_size: config.postgres.pool_size,
                schema: config.postgres.schema.clone(),
                table_prefix: config.postgres.table_prefix.clone(),
                ..Default::default()
            };
            info!("connecting to postgres state backend");
            Ok(Backends::postgres(pg_config).await?)
        }
        None => {
            info!("using in-memory state backend");
            Ok(Backends::in_memory())
        }
    }
}

fn tenant_ids(config: &PulseConfig) -> Vec<TenantId> {
    config.tenants.ids.iter().cloned().map(TenantId::new).collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::IngestServer { host, port } => run_ingest_server(config, host, port).await,
        Commands::Evaluator => run_evaluator(config).await,
        Commands::Dispatcher => run_dispatcher(config).await,
        Commands::Delivery => run_delivery(config).await,
    }
}

async fn run_ingest_server(
    config: PulseConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let backends = build_backends(&config).await?;

    let cache = Arc::new(AuthCache::new(config.auth_cache_config()));
    let sink = HttpLineSink::new(reqwest::Client::new(), config.influx.endpoint_base.clone());
    let writer = BatchWriter::new(config.writer_config(), Arc::new(sink));
    let quarantine = Arc::new(InMemoryQuarantineSink::default());

    let ingest = IngestPipeline::spawn(
        config.ingest_config(),
        IngestDeps {
            cache: Arc::clone(&cache),
            registry: Arc::clone(&backends.registry),
            device_state: Arc::clone(&backends.device_state),
            latest_samples: Arc::clone(&backends.samples),
            writer,
            quarantine: quarantine.clone(),
        },
    );

    let admin_keys = Arc::new(AdminApiKeys::build(&config.admin.api_keys));
    if admin_keys.is_empty() {
        tracing::warn!("no admin API keys configured; /admin/v1 endpoints are unreachable");
    }

    let state = AppState {
        ingest,
        cache,
        registry: backends.registry,
        alerts: backends.alerts,
        jobs: backends.jobs,
        quarantine,
        admin_keys,
    };
    let app = router(state);

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "opspulse ingest server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("opspulse ingest server shut down");
    Ok(())
}

async fn run_evaluator(config: PulseConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backends = build_backends(&config).await?;
    let tenants = Arc::new(opspulse_evaluator::StaticTenantSource::new(tenant_ids(&config)));

    let evaluator = Evaluator::new(
        config.evaluator_config(),
        tenants,
        backends.device_state,
        backends.alerts,
        backends.rules,
        backends.registry,
        backends.samples,
    );

    evaluator.start();
    info!("evaluator started");
    shutdown_signal().await;
    evaluator.stop().await;
    info!("evaluator shut down");
    Ok(())
}

async fn run_dispatcher(config: PulseConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backends = build_backends(&config).await?;
    let tenants = Arc::new(opspulse_dispatcher::StaticTenantSource::new(tenant_ids(&config)));

    let dispatcher = Dispatcher::new(
        config.dispatcher_config(),
        tenants,
        backends.routes,
        backends.alerts,
        backends.registry,
        backends.jobs,
    );

    dispatcher.start();
    info!("dispatcher started");
    shutdown_signal().await;
    dispatcher.stop().await;
    info!("dispatcher shut down");
    Ok(())
}

async fn run_delivery(config: PulseConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backends = build_backends(&config).await?;

    let worker = DeliveryWorker::new(
        config.delivery_config(),
        backends.routes,
        backends.jobs,
        SenderRegistry::default(),
    );

    worker.start();
    info!("delivery worker started");
    shutdown_signal().await;
    worker.stop().await;
    info!("delivery worker shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
