mod config;
mod filter;
mod mavlink;
mod metrics;
mod policy;
mod relay;

use config::Config;
use metrics::Metrics;
use relay::Relay;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)?,
        None => Config::example(),
    };

    let log_filter = std::env::var("RUST_LOG")
        .ok()
        .unwrap_or_else(|| config.log_level.clone());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("mav-serial-filter starting");
    tracing::info!("  VM endpoint:  {}", config.vm.bind_addr);
    tracing::info!("  PX4 endpoint: {}", config.px4.connect_addr);
    tracing::info!("  Stats interval: {}s", config.stats_interval_secs);

    let metrics = Metrics::new();
    if config.stats_interval_secs > 0 {
        metrics.clone().start_stats_logger(config.stats_interval_secs);
    }

    Relay::bootstrap(&config, metrics).await
}
