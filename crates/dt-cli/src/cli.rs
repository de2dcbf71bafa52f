use std::path::PathBuf;

use clap::Parser;

/// Runs the logistics simulator's WebSocket server.
#[derive(Parser, Debug)]
#[command(name = "dt-server", version, about)]
pub struct Cli {
    /// TOML config file, applied before environment variables and flags.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP/WebSocket server to.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the HTTP/WebSocket server to.
    #[arg(long)]
    pub port: Option<u16>,

    /// `tracing-subscriber` filter directive, e.g. `info`, `dt_world=debug`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Master RNG seed for this run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Ticks per second of wall-clock time while the simulation is running.
    #[arg(long)]
    pub tick_rate: Option<f64>,

    /// Road map JSON document (`map.export` shape) to import at startup
    /// instead of generating a fresh procedural map.
    #[arg(long)]
    pub map: Option<PathBuf>,
}
