use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mc_stress::{BotConfig, Swarm, SwarmOptions};

#[derive(Parser)]
#[command(name = "mc-stress")]
#[command(about = "Connect a swarm of roaming bots to a Minecraft server")]
struct Cli {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,

    /// Number of bots to launch
    #[arg(long, default_value_t = 1)]
    count: usize,
    /// Pause between consecutive joins
    #[arg(long, default_value_t = 100)]
    join_delay_ms: u64,
    #[arg(long, default_value = "Bot")]
    username_prefix: String,
    /// Seed movement randomness for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    speed: Option<f64>,
    #[arg(long)]
    radius: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    center_x: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    center_z: Option<f64>,
    /// Stay at spawn height: no climbing, descending or falling
    #[arg(long)]
    no_y_axis: bool,

    #[arg(long)]
    view_distance: Option<i8>,
    #[arg(long)]
    protocol_version: Option<u32>,
    #[arg(long)]
    resource_pack_response: Option<u32>,
    /// Log teleports at debug level only
    #[arg(long)]
    quiet_teleports: bool,

    /// JSON file with `BotConfig` fields; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Filter directive used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn bot_config(&self) -> mc_stress::Result<BotConfig> {
        let mut config = match &self.config {
            Some(path) => BotConfig::from_json_file(path)?,
            None => BotConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(radius) = self.radius {
            config.radius = radius;
        }
        if let Some(x) = self.center_x {
            config.center_x = x;
        }
        if let Some(z) = self.center_z {
            config.center_z = z;
        }
        if self.no_y_axis {
            config.y_axis = false;
        }
        if let Some(distance) = self.view_distance {
            config.view_distance = distance;
        }
        if let Some(version) = self.protocol_version {
            config.protocol_version = version;
        }
        if let Some(response) = self.resource_pack_response {
            config.resource_pack_response = response;
        }
        if self.quiet_teleports {
            config.log_teleports = false;
        }

        config.validate()?;
        Ok(config)
    }

    fn swarm_options(&self) -> SwarmOptions {
        SwarmOptions {
            count: self.count,
            join_delay: Duration::from_millis(self.join_delay_ms),
            username_prefix: self.username_prefix.clone(),
            seed: self.seed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.bot_config()?;
    let options = cli.swarm_options();
    info!(
        "Starting {} bot(s) against {} (protocol {}, radius {}, speed {})",
        options.count,
        config.server_addr(),
        config.protocol_version,
        config.radius,
        config.speed,
    );

    let swarm = Swarm::new(config)?;
    let handle = swarm.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            handle.shutdown();
        }
    });

    let outcomes = swarm.run(&options).await;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(reason) => info!(username = %outcome.username, ?reason, "bot finished"),
            Err(e) => {
                failed += 1;
                warn!(username = %outcome.username, error = %e, "bot failed");
            }
        }
    }
    info!("{} bot(s) finished, {} failed", outcomes.len(), failed);
    Ok(())
}
