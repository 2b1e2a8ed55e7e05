use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use homeguard::api::create_app;
use homeguard::config::{load_config, HomeGuardConfig};
use homeguard::controller::{Controller, EventLog};
use homeguard::device::DeviceFleet;
use homeguard::nats::{forward_payloads, NatsClient, Publisher, UnavailablePublisher};
use homeguard::state::{BridgeMetrics, DeviceStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "homeguard", about = "Voice-driven home security controller and device simulator")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "HOMEGUARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    role: Option<Role>,
}

#[derive(Subcommand, Clone, Copy, Debug)]
enum Role {
    /// Observer-facing server and status consumer
    Controller,
    /// Simulated devices listening for commands
    Devices,
    /// Both in one process (default)
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homeguard=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HomeGuardConfig::default(),
    };

    let role = cli.role.unwrap_or(Role::All);
    info!(?role, "HomeGuard starting...");

    // In one process both sides count into the counters served by /api/metrics
    let metrics = BridgeMetrics::new();
    match role {
        Role::Controller => run_controller(config, metrics).await,
        Role::Devices => run_devices(config, metrics).await,
        Role::All => {
            tokio::try_join!(
                run_controller(config.clone(), metrics.clone()),
                run_devices(config, metrics)
            )?;
            Ok(())
        }
    }
}

async fn run_controller(config: HomeGuardConfig, metrics: BridgeMetrics) -> Result<()> {
    let capacity = config.observers.channel_capacity;
    let store = Arc::new(DeviceStore::with_metrics(capacity, metrics));
    let log = EventLog::new(capacity);

    // Broker trouble degrades the controller instead of stopping it
    let (publisher, subscription) = match connect_controller(&config).await {
        Ok((client, subscriber)) => {
            let publisher: Arc<dyn Publisher> = Arc::new(client.publisher());
            (publisher, Some(subscriber))
        }
        Err(e) => {
            let reason = format!("{:#}", e);
            error!(error = %reason, "Could not reach NATS broker; commands will fail until restart");
            let publisher: Arc<dyn Publisher> = Arc::new(UnavailablePublisher::new(reason));
            (publisher, None)
        }
    };

    let controller = Arc::new(Controller::new(
        store,
        log,
        publisher,
        config.nats.command_subject.clone(),
    ));

    if let Some(subscriber) = subscription {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(forward_payloads(subscriber, tx));
        let dispatcher = Arc::clone(&controller);
        tokio::spawn(async move { dispatcher.run(rx).await });
    }

    let app = create_app(controller, &config.server);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!(addr = %config.server.bind_addr, "Observer server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Observer server failed")?;

    Ok(())
}

async fn connect_controller(
    config: &HomeGuardConfig,
) -> Result<(NatsClient, async_nats::Subscriber)> {
    let client = NatsClient::connect(config.nats.clone()).await?;
    let subscriber = client.subscribe_status().await?;
    Ok((client, subscriber))
}

async fn run_devices(config: HomeGuardConfig, metrics: BridgeMetrics) -> Result<()> {
    // Devices must announce their initial state, so no broker means no fleet
    let client = NatsClient::connect(config.nats.clone())
        .await
        .context("Device fleet cannot start without the NATS broker")?;
    let subscriber = client.subscribe_commands().await?;

    let publisher: Arc<dyn Publisher> = Arc::new(client.publisher());
    let mut fleet = DeviceFleet::start(
        publisher,
        &config.nats.status_subject,
        &config.simulation,
        metrics,
    )
    .await?;

    let (tx, rx) = mpsc::channel(config.observers.channel_capacity.max(1));
    tokio::spawn(forward_payloads(subscriber, tx));

    tokio::select! {
        _ = fleet.run(rx) => {}
        _ = shutdown_signal() => {}
    }

    fleet.shutdown().await;
    info!("Device fleet stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
