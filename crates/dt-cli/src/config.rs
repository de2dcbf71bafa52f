//! Configuration precedence: built-in defaults, then an optional `--config`
//! TOML file, then `DT_`-prefixed environment variables, then CLI flags.
//! Each layer only overrides fields it actually sets.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use dt_core::SimConfig;

use crate::cli::Cli;

#[derive(Debug)]
pub struct ResolvedConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub sim: SimConfig,
    pub map_path: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, log_level: "info".to_string(), sim: SimConfig::default(), map_path: None }
    }
}

/// Mirrors [`ResolvedConfig`] but with every field optional — the shape of
/// both the TOML file and one "layer" of override.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub dt_s: Option<f64>,
    pub tick_rate: Option<f64>,
    pub seed: Option<u64>,
    pub fuel_price_volatility: Option<f64>,
    pub initial_fuel_price: Option<f64>,
    pub map_path: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.host { self.host = v; }
        if let Some(v) = file.port { self.port = v; }
        if let Some(v) = file.log_level { self.log_level = v; }
        if let Some(v) = file.dt_s { self.sim.dt_s = v; }
        if let Some(v) = file.tick_rate { self.sim.tick_rate = v; }
        if let Some(v) = file.seed { self.sim.seed = v; }
        if let Some(v) = file.fuel_price_volatility { self.sim.fuel_price_volatility = v; }
        if let Some(v) = file.initial_fuel_price { self.sim.initial_fuel_price = v; }
        if let Some(v) = file.map_path { self.map_path = Some(v); }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var("DT_HOST") { self.host = v; }
        if let Ok(v) = env::var("DT_PORT") {
            if let Ok(port) = v.parse() { self.port = port; }
        }
        if let Ok(v) = env::var("DT_LOG_LEVEL") { self.log_level = v; }
        if let Ok(v) = env::var("DT_SEED") {
            if let Ok(seed) = v.parse() { self.sim.seed = seed; }
        }
        if let Ok(v) = env::var("DT_TICK_RATE") {
            if let Ok(rate) = v.parse() { self.sim.tick_rate = rate; }
        }
        if let Ok(v) = env::var("DT_MAP") { self.map_path = Some(PathBuf::from(v)); }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.host { self.host = v.clone(); }
        if let Some(v) = cli.port { self.port = v; }
        if let Some(v) = &cli.log_level { self.log_level = v.clone(); }
        if let Some(v) = cli.seed { self.sim.seed = v; }
        if let Some(v) = cli.tick_rate { self.sim.tick_rate = v; }
        if let Some(v) = &cli.map { self.map_path = Some(v.clone()); }
    }

    /// Resolve the full precedence chain: defaults -> `--config` TOML ->
    /// `DT_*` env -> CLI flags.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = ResolvedConfig::default();

        if let Some(path) = &cli.config {
            let text = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
            let file: ConfigFile = toml::from_str(&text).map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?;
            config.apply_file(file);
        }

        config.apply_env();
        config.apply_cli(cli);

        Ok(config)
    }
}
