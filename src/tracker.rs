// Level tracking: the poll-diff-notify core.
//
// The tracker owns the last-known-level mapping and compares it against each
// cycle's roster snapshot. Per watched player: absent from the snapshot is
// inert (never used to infer death or logout); first observation records the
// level silently; a higher or lower level emits exactly one event and records
// the new value; an equal level is a no-op. Entries are never removed.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::state::LevelState;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Emitted when a watched player's level changed since the last observation.
/// Consumed immediately by the notifier, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChangeEvent {
    pub player: String,
    pub old_level: u32,
    pub new_level: u32,
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Per-player level state machine over the persisted level mapping.
///
/// The state is owned exclusively by the watcher task; there is exactly one
/// writer.
pub struct Tracker {
    state: LevelState,
    min_level: u32,
}

impl Tracker {
    pub fn new(state: LevelState, min_level: u32) -> Self {
        Self { state, min_level }
    }

    /// The current last-known-level mapping, for persistence.
    pub fn state(&self) -> &LevelState {
        &self.state
    }

    /// Diff one roster snapshot against the stored state for every watched
    /// player, in watch-list order. Mutates the stored state for each player
    /// that is currently online and returns the change events to announce.
    ///
    /// Levels below the configured minimum are still recorded so the
    /// threshold is re-evaluated against fresh data next cycle, but their
    /// change events are suppressed.
    pub fn observe(
        &mut self,
        watch_list: &[String],
        snapshot: &HashMap<String, u32>,
    ) -> Vec<LevelChangeEvent> {
        let mut events = Vec::new();

        for player in watch_list {
            let Some(&current) = snapshot.get(player) else {
                debug!(%player, "offline or not on the roster");
                continue;
            };

            match self.state.get(player).copied() {
                None => {
                    info!(%player, level = current, "first observation");
                    self.state.insert(player.clone(), current);
                }
                Some(previous) if current == previous => {
                    debug!(%player, level = current, "online, level unchanged");
                }
                Some(previous) => {
                    let direction = if current > previous {
                        Direction::Up
                    } else {
                        Direction::Down
                    };
                    if current >= self.min_level {
                        events.push(LevelChangeEvent {
                            player: player.clone(),
                            old_level: previous,
                            new_level: current,
                            direction,
                        });
                    } else {
                        debug!(
                            %player,
                            level = current,
                            min_level = self.min_level,
                            "level changed below minimum, not announcing"
                        );
                    }
                    self.state.insert(player.clone(), current);
                }
            }
        }

        events
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
