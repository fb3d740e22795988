// The perpetual poll cycle: fetch → parse → diff → notify → persist → sleep.
//
// Runs on its own spawned task, strictly sequentially; the only retry
// mechanism is the next tick. A failed fetch abandons the whole cycle —
// no parse, no diff, and crucially no persistence write.

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetch::PageFetcher;
use crate::notify::Notifier;
use crate::roster;
use crate::state;
use crate::status::StatusShared;
use crate::tracker::Tracker;

/// Run the watcher loop forever. Loads persisted state once, then polls at
/// the configured interval. The sleep starts after a cycle completes.
pub async fn run<F>(
    config: Config,
    fetcher: F,
    notifier: Notifier,
    status: std::sync::Arc<StatusShared>,
) where
    F: PageFetcher,
{
    let mut tracker = Tracker::new(state::load(&config.state_path), config.min_level);
    info!(
        watched = config.watch_list.len(),
        interval_secs = config.poll_interval.as_secs(),
        "watcher started"
    );

    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately, so the first poll happens at startup.
        ticker.tick().await;
        run_cycle(&config, &fetcher, &notifier, &mut tracker, &status).await;
    }
}

/// One full cycle against one roster snapshot.
pub async fn run_cycle(
    config: &Config,
    fetcher: &dyn PageFetcher,
    notifier: &Notifier,
    tracker: &mut Tracker,
    status: &StatusShared,
) {
    debug!("checking online players");

    let markup = match fetcher.fetch().await {
        Ok(markup) => markup,
        Err(e) => {
            warn!("fetch failed, skipping cycle: {e}");
            status.record_failed_fetch();
            return;
        }
    };

    let snapshot = roster::parse(&markup);
    debug!(online = snapshot.len(), "roster parsed");

    let events = tracker.observe(&config.watch_list, &snapshot);
    for event in &events {
        info!(
            player = %event.player,
            old = event.old_level,
            new = event.new_level,
            direction = ?event.direction,
            "level change"
        );
        notifier.notify(event).await;
    }

    // Unconditional at the end of every completed cycle, so first-seen
    // registrations are captured even when no event fired.
    if let Err(e) = state::save(&config.state_path, tracker.state()) {
        warn!(
            path = %config.state_path.display(),
            "failed to persist level state: {e}"
        );
    }

    status.record_cycle(snapshot.len(), events.len());
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
