// levelwatch entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config from the environment
// 3. Build the page fetcher and notifier
// 4. Spawn the watcher loop task
// 5. Serve the status endpoint in the foreground

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use levelwatch::config::Config;
use levelwatch::fetch::HttpFetcher;
use levelwatch::notify::Notifier;
use levelwatch::server;
use levelwatch::status::StatusShared;
use levelwatch::watcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("levelwatch starting up");

    // 2. Load config
    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Config loaded: {} watched player(s), {}s interval, min level {}",
        config.watch_list.len(),
        config.poll_interval.as_secs(),
        config.min_level
    );
    if config.watch_list.is_empty() {
        warn!("WATCHED_PLAYERS is empty; the loop will run but report nothing");
    }

    // 3. Build the fetcher and notifier
    let fetcher = HttpFetcher::from_config(&config).context("failed to build page fetcher")?;
    if config.proxy.is_some() {
        info!("fetching through configured proxy");
    }

    let notifier = Notifier::from_config(&config);
    match &notifier {
        Notifier::Active(_) => info!("Discord notifier active"),
        Notifier::Disabled => info!("Discord notifier disabled (no webhook URL)"),
    }

    let status = Arc::new(StatusShared::new());

    // 4. Spawn the watcher loop task
    let watcher_handle = tokio::spawn(watcher::run(
        config.clone(),
        fetcher,
        notifier,
        Arc::clone(&status),
    ));

    // 5. Serve the status endpoint in the foreground. The watcher keeps
    // running even if the endpoint fails to bind.
    if let Err(e) = server::run(config.status_port, status).await {
        error!("status endpoint error: {e}");
    }

    let _ = watcher_handle.await;
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("levelwatch=info,warn")),
        )
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
