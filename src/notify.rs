// Discord webhook notifications for level-change events.
//
// Delivery is best-effort and fire-and-forget: a failed POST is logged and
// swallowed so it can never stall the poll cycle or affect state persistence.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::Config;
use crate::tracker::{Direction, LevelChangeEvent};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

const COLOR_UP: u32 = 0x00FF00;
const COLOR_DOWN: u32 = 0xFF0000;

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// High-level wrapper that is either an active webhook client or disabled
/// (no webhook URL configured).
pub enum Notifier {
    Active(DiscordNotifier),
    Disabled,
}

impl Notifier {
    /// Build a `Notifier` from the application config. Returns `Active` when
    /// a webhook URL is configured, otherwise `Disabled`.
    pub fn from_config(config: &Config) -> Self {
        match &config.webhook_url {
            Some(url) => Notifier::Active(DiscordNotifier::new(url.clone())),
            None => Notifier::Disabled,
        }
    }

    /// Announce one level-change event. Best-effort; never returns an error.
    pub async fn notify(&self, event: &LevelChangeEvent) {
        match self {
            Notifier::Active(client) => client.send(event).await,
            Notifier::Disabled => {
                info!(
                    player = %event.player,
                    old = event.old_level,
                    new = event.new_level,
                    "no webhook configured, not announcing"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DiscordNotifier
// ---------------------------------------------------------------------------

/// Low-level webhook client posting embed payloads.
pub struct DiscordNotifier {
    http: reqwest::Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(WEBHOOK_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            webhook_url,
        }
    }

    /// POST the embed for `event`. Non-2xx responses and transport errors are
    /// logged and discarded.
    pub async fn send(&self, event: &LevelChangeEvent) {
        let payload = build_payload(event);

        match self.http.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) => {
                let status = response.status();
                // Discord answers 204 No Content on success; accept 200 too.
                if status.as_u16() == 200 || status.as_u16() == 204 {
                    info!(player = %event.player, "webhook delivered");
                } else {
                    let body = response.text().await.unwrap_or_default();
                    warn!(%status, body, "webhook rejected the payload");
                }
            }
            Err(e) => {
                warn!(player = %event.player, "webhook delivery failed: {e}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Payload construction
// ---------------------------------------------------------------------------

/// Build the `{"embeds": [...]}` webhook body for an event. Up transitions
/// get an affirmative title and green; down transitions a negative title and
/// red.
pub(crate) fn build_payload(event: &LevelChangeEvent) -> Value {
    let (title, description, color) = match event.direction {
        Direction::Up => (
            "Level up!",
            format!("**{}** gained a level.", event.player),
            COLOR_UP,
        ),
        Direction::Down => (
            "Level down",
            format!("**{}** lost a level.", event.player),
            COLOR_DOWN,
        ),
    };

    json!({
        "embeds": [{
            "title": title,
            "description": description,
            "color": color,
            "fields": [
                {
                    "name": "Player",
                    "value": event.player,
                    "inline": true,
                },
                {
                    "name": "Level",
                    "value": format!("{} -> {}", event.old_level, event.new_level),
                    "inline": true,
                },
            ],
        }]
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn up_event() -> LevelChangeEvent {
        LevelChangeEvent {
            player: "Alienwarre".to_string(),
            old_level: 527,
            new_level: 530,
            direction: Direction::Up,
        }
    }

    fn down_event() -> LevelChangeEvent {
        LevelChangeEvent {
            player: "Zeus".to_string(),
            old_level: 480,
            new_level: 465,
            direction: Direction::Down,
        }
    }

    #[test]
    fn up_payload_shape() {
        let payload = build_payload(&up_event());
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "Level up!");
        assert_eq!(embed["color"], 0x00FF00);
        assert_eq!(embed["fields"][0]["name"], "Player");
        assert_eq!(embed["fields"][0]["value"], "Alienwarre");
        assert_eq!(embed["fields"][1]["name"], "Level");
        assert_eq!(embed["fields"][1]["value"], "527 -> 530");
        assert_eq!(embed["fields"][1]["inline"], true);
    }

    #[test]
    fn down_payload_shape() {
        let payload = build_payload(&down_event());
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "Level down");
        assert_eq!(embed["color"], 0xFF0000);
        assert_eq!(embed["fields"][1]["value"], "480 -> 465");
    }

    #[test]
    fn payload_has_exactly_one_embed() {
        let payload = build_payload(&up_event());
        assert_eq!(payload["embeds"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn description_names_the_player() {
        let payload = build_payload(&down_event());
        let description = payload["embeds"][0]["description"].as_str().unwrap();
        assert!(description.contains("Zeus"));
    }

    #[test]
    fn from_config_without_webhook_is_disabled() {
        let config = crate::config::Config::from_lookup(|_| None).unwrap();
        assert!(matches!(Notifier::from_config(&config), Notifier::Disabled));
    }

    #[test]
    fn from_config_with_webhook_is_active() {
        let config = crate::config::Config::from_lookup(|key| {
            (key == "DISCORD_WEBHOOK_URL")
                .then(|| "https://discord.com/api/webhooks/1/token".to_string())
        })
        .unwrap();
        assert!(matches!(Notifier::from_config(&config), Notifier::Active(_)));
    }
}
