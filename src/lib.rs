// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod fetch;
pub mod notify;
pub mod roster;
pub mod server;
pub mod state;
pub mod status;
pub mod tracker;
pub mod watcher;
