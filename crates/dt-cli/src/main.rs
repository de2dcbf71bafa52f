//! `dt-server` — binary entry point: argument parsing, config resolution,
//! `tracing-subscriber` initialization, and wiring the controller and
//! transport layer together.

mod cli;
mod config;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::ResolvedConfig;
use dt_generator::{generate, GenerationParamsBuilder};
use dt_transport::{build_app, serve, ActionQueue, SignalQueue, SimulationController, DEFAULT_CAPACITY};
use dt_world::World;

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Either import the configured map or generate a fresh procedural one
/// seeded from the resolved simulation config.
fn build_world(config: &ResolvedConfig) -> anyhow::Result<World> {
    if let Some(path) = &config.map_path {
        let text = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading map {}: {e}", path.display()))?;
        let doc: dt_world::MapDocument = serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("parsing map {}: {e}", path.display()))?;
        let (graph, buildings) = dt_world::import_map(&doc)?;
        let mut world = World::new(config.sim.clone(), graph);
        world.buildings = buildings;
        Ok(world)
    } else {
        let params = GenerationParamsBuilder::new(config.sim.seed).build()?;
        let generated = generate(&params);
        let mut world = World::new(config.sim.clone(), generated.graph);
        world.buildings = generated.buildings;
        Ok(world)
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = ResolvedConfig::resolve(&cli)?;
    init_tracing(&config.log_level);

    info!(host = %config.host, port = config.port, seed = config.sim.seed, "starting dt-server");

    let world = build_world(&config)?;

    let actions: Arc<ActionQueue> = Arc::new(ActionQueue::new(DEFAULT_CAPACITY));
    let signals: Arc<SignalQueue> = Arc::new(SignalQueue::new(DEFAULT_CAPACITY));
    let shutdown = Arc::new(AtomicBool::new(false));

    let controller = SimulationController::new(config.sim.clone(), world, actions.clone(), signals.clone());
    let controller_shutdown = shutdown.clone();
    let controller_handle = std::thread::Builder::new()
        .name("dt-controller".into())
        .spawn(move || controller.run(controller_shutdown))
        .map_err(|e| anyhow::anyhow!("spawning controller thread: {e}"))?;

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let exit_code = runtime.block_on(async move {
        let app = build_app(actions, signals);
        let addr = format!("{}:{}", config.host, config.port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!(%addr, %err, "failed to bind");
                return ExitCode::FAILURE;
            }
        };

        let mut server = tokio::spawn(serve(listener, app));
        tokio::select! {
            result = &mut server => {
                if let Ok(Err(err)) = result {
                    error!(%err, "server task failed");
                    return ExitCode::FAILURE;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                // The transport task is cancelled and awaited with a 5s
                // deadline on shutdown, not just dropped.
                info!("received ctrl-c, shutting down");
                server.abort();
                if tokio::time::timeout(std::time::Duration::from_secs(5), server).await.is_err() {
                    error!("transport task did not shut down within 5s");
                }
            }
        }
        ExitCode::SUCCESS
    });

    shutdown.store(true, Ordering::Relaxed);
    if controller_handle.join().is_err() {
        error!("controller thread panicked during shutdown");
    }

    Ok(exit_code)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("dt-server: {err}");
            ExitCode::FAILURE
        }
    }
}
