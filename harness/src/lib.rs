//! # Tank Tournament Harness
//!
//! Runs tournaments between dynamically loaded plugins: algorithm plugins
//! (a `Player` plus a `TankAlgorithm` per tank) battle each other under
//! game-manager plugins (full-rules referees).
//!
//! Two modes exist:
//! - **Comparative**: one map, two fixed algorithms, a folder of game
//!   managers; every referee judges the same match and the report groups
//!   referees by identical outcome.
//! - **Competition**: a folder of maps, one referee, a folder of algorithms;
//!   a rotation schedule pairs the algorithms across maps and the report
//!   ranks them by score (win 3, tie 1, loss 0).
//!
//! The flow is `main -> Config -> Tournament`: the tournament loads plugins
//! through the [`plugin_host::PluginHost`], enumerates the match set, runs
//! matches on a fixed-size [`worker_pool::WorkerPool`] and hands the
//! accumulated results to the [`reporter`]. Matches are pure functions of
//! their inputs and reports are sorted by stable keys, so the output never
//! depends on worker interleaving.

pub mod config;
pub mod error_log;
pub mod logger;
pub mod map_loader;
pub mod plugin_host;
pub mod registry;
pub mod reporter;
pub mod tournament;
pub mod worker_pool;
