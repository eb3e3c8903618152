use anyhow::{Context, Result, anyhow};
use clap::Parser;
use config::{Config, ConfigOverrides, load_from_env, load_from_file, merge_configs, validate};
use gateway_server::{
    AppState, GatewayServer,
    telemetry::{init_tracing, install_metrics}
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "commentary-gateway",
    version,
    about = "Rate-limited, cached gateway in front of an inference service"
)]
struct Args {
    #[arg(short, long, env = "GW_CONFIG_FILE", help = "Path to a TOML or YAML config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Address to bind (overrides config)")]
    host: Option<String>,

    #[arg(short, long, help = "Port to bind (overrides config)")]
    port: Option<u16>,

    #[arg(long, help = "Inference provider: openai, synthetic or auto")]
    provider: Option<String>
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            provider: self.provider.clone()
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let file_config = match &args.config {
        Some(path) => load_from_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => Config::default()
    };
    let env_config =
        load_from_env().map_err(|e| anyhow!("invalid environment configuration: {e}"))?;

    let config = merge_configs(
        Config::default(),
        file_config,
        "file",
        env_config,
        "env",
        &args.overrides(),
        "cli"
    );
    validate(&config).context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_tracing(&config.observability).map_err(|e| anyhow!(e))?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting commentary gateway");

    let backend = adapters::build_backend(&config.upstream)?;
    info!(
        backend = backend.name(),
        synthetic = backend.is_synthetic(),
        "Inference backend selected"
    );

    let mut state = AppState::new(&config, backend);
    if config.observability.metrics_enabled {
        state = state.with_metrics(install_metrics()?);
    }

    GatewayServer::new(config.server.clone(), state).run().await?;
    Ok(())
}
