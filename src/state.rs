// Persisted level state: a JSON object mapping player name → last-known
// level, rewritten in full after every successful cycle.
//
// Loading never fails: a missing or corrupt file degrades to an empty map
// (fresh-start semantics, players re-register as first-seen). A write failure
// is the caller's to log; in-memory state stays current either way.

use std::collections::BTreeMap;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The last-known-level mapping. Serializes transparently as a bare JSON
/// object (`{"name": level, ...}`); a `BTreeMap` keeps the file
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelState(pub BTreeMap<String, u32>);

impl Deref for LevelState {
    type Target = BTreeMap<String, u32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for LevelState {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<BTreeMap<String, u32>> for LevelState {
    fn from(map: BTreeMap<String, u32>) -> Self {
        Self(map)
    }
}

/// Load the level state from `path`. Missing file ⇒ empty map; unreadable or
/// corrupt file ⇒ empty map with a warning. Never an error.
pub fn load(path: &Path) -> LevelState {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no previous state file, starting fresh");
            return LevelState::default();
        }
        Err(e) => {
            warn!(path = %path.display(), "failed to read state file, starting fresh: {e}");
            return LevelState::default();
        }
    };

    match serde_json::from_str(&text) {
        Ok(state) => state,
        Err(e) => {
            warn!(path = %path.display(), "corrupt state file, starting fresh: {e}");
            LevelState::default()
        }
    }
}

/// Rewrite the state file in full.
pub fn save(path: &Path, state: &LevelState) -> io::Result<()> {
    let json = serde_json::to_string(state)?;
    std::fs::write(path, json)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
