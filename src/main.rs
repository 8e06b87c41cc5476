use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use csp_portal::config::PortalConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = PortalConfig::from_env().apply_args(&args);

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "csp_portal",
        "CSP portal starting: RUST_LOG='{}', http_port={}, state_dir='{}', data_url={}",
        rust_log,
        config.http_port,
        config.state_dir.display(),
        config.data_url.as_deref().unwrap_or("<memory>")
    );

    csp_portal::server::run(config).await
}
