//! Match enumeration and dispatch for the two tournament modes.
//!
//! The tournament loads plugins through the host, enumerates the match set
//! deterministically, runs every match on the worker pool and collects one
//! entry per completed match behind a single mutex. Workers never touch
//! cross-match state; a panicking plugin costs only its own match.

use std::env::consts::DLL_EXTENSION;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use battle_interface::{GameOverReason, GameResult};
use tracing::{error, info, instrument, warn};

use crate::config::{Config, Mode};
use crate::error_log::ErrorLog;
use crate::map_loader::{load_map, MapData};
use crate::plugin_host::PluginHost;
use crate::registry::{AlgorithmEntry, GameManagerEntry};
use crate::reporter;
use crate::worker_pool::WorkerPool;

/// One comparative-mode result: how one referee judged the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparativeEntry {
    pub gm_name: String,
    pub winner: u8,
    pub reason: GameOverReason,
    pub rounds: usize,
    pub final_state: String,
}

/// One competition-mode result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionEntry {
    pub map_file: String,
    pub algo1: String,
    pub algo2: String,
    pub winner: u8,
}

/// Pairings `(i, j)` for one map in competition mode.
///
/// Map `m` rotates every algorithm `i` against `(i + 1 + (m mod (A-1))) mod A`.
/// When `A` is even, the middle offset would pair everyone twice (i against
/// i + A/2 and back), so the second half is skipped for that map.
pub fn competition_pairings(num_algorithms: usize, map_index: usize) -> Vec<(usize, usize)> {
    let a = num_algorithms;
    if a < 2 {
        return Vec::new();
    }
    let offset = map_index % (a - 1);
    let mirrored = a % 2 == 0 && offset == a / 2 - 1;
    let mut pairs = Vec::with_capacity(a);
    for i in 0..a {
        if mirrored && i >= a / 2 {
            continue;
        }
        pairs.push((i, (i + 1 + offset) % a));
    }
    pairs
}

/// Run one match, isolating plugin panics to this match only.
#[instrument(skip_all, fields(gm = gm_entry.name(), map = %map.path.display()))]
fn play_match(
    gm_entry: &GameManagerEntry,
    verbose: bool,
    map: &MapData,
    algo1: &AlgorithmEntry,
    algo2: &AlgorithmEntry,
) -> Result<GameResult, String> {
    let map_name = map.path.display().to_string();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut gm = gm_entry.create(verbose);
        let mut player1 = algo1.create_player(1, map.rows, map.cols, map.max_steps, map.num_shells);
        let mut player2 = algo2.create_player(2, map.rows, map.cols, map.max_steps, map.num_shells);
        gm.run(
            map.cols,
            map.rows,
            &map.view,
            &map_name,
            map.max_steps,
            map.num_shells,
            player1.as_mut(),
            algo1.name(),
            player2.as_mut(),
            algo2.name(),
            algo1.tank_factory(),
            algo2.tank_factory(),
        )
    }));
    outcome.map_err(|_| {
        format!(
            "match '{}' vs '{}' under '{}' on '{map_name}' aborted: plugin panicked",
            algo1.name(),
            algo2.name(),
            gm_entry.name()
        )
    })
}

/// Comparative mode: the same match once per loaded game manager.
pub fn run_comparative_matches(
    num_threads: usize,
    verbose: bool,
    map: Arc<MapData>,
    algo1: Arc<AlgorithmEntry>,
    algo2: Arc<AlgorithmEntry>,
    game_managers: &[Arc<GameManagerEntry>],
    error_log: &Arc<ErrorLog>,
) -> Vec<ComparativeEntry> {
    let results: Arc<Mutex<Vec<ComparativeEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let mut pool = WorkerPool::new(num_threads);
    for gm_entry in game_managers {
        let gm_entry = Arc::clone(gm_entry);
        let map = Arc::clone(&map);
        let algo1 = Arc::clone(&algo1);
        let algo2 = Arc::clone(&algo2);
        let results = Arc::clone(&results);
        let error_log = Arc::clone(error_log);
        pool.execute(move || match play_match(&gm_entry, verbose, &map, &algo1, &algo2) {
            Ok(result) => {
                let entry = ComparativeEntry {
                    gm_name: gm_entry.name().to_string(),
                    winner: result.winner,
                    reason: result.reason,
                    rounds: result.rounds,
                    final_state: result.game_state.render(),
                };
                results.lock().expect("mutex poisoning").push(entry);
            }
            Err(message) => error_log.record(&message),
        });
    }
    pool.shutdown();
    let final_results = std::mem::take(&mut *results.lock().expect("mutex poisoning"));
    final_results
}

/// Competition mode: the rotation schedule across every valid map.
pub fn run_competition_matches(
    num_threads: usize,
    verbose: bool,
    maps: &[Arc<MapData>],
    algorithms: &[Arc<AlgorithmEntry>],
    game_manager: Arc<GameManagerEntry>,
    error_log: &Arc<ErrorLog>,
) -> Vec<CompetitionEntry> {
    let results: Arc<Mutex<Vec<CompetitionEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let mut pool = WorkerPool::new(num_threads);
    for (map_index, map) in maps.iter().enumerate() {
        for (i, j) in competition_pairings(algorithms.len(), map_index) {
            let gm_entry = Arc::clone(&game_manager);
            let map = Arc::clone(map);
            let algo1 = Arc::clone(&algorithms[i]);
            let algo2 = Arc::clone(&algorithms[j]);
            let results = Arc::clone(&results);
            let error_log = Arc::clone(error_log);
            pool.execute(move || match play_match(&gm_entry, verbose, &map, &algo1, &algo2) {
                Ok(result) => {
                    let entry = CompetitionEntry {
                        map_file: map.path.display().to_string(),
                        algo1: algo1.name().to_string(),
                        algo2: algo2.name().to_string(),
                        winner: result.winner,
                    };
                    results.lock().expect("mutex poisoning").push(entry);
                }
                Err(message) => error_log.record(&message),
            });
        }
    }
    pool.shutdown();
    let final_results = std::mem::take(&mut *results.lock().expect("mutex poisoning"));
    final_results
}

/// Dynamic libraries in a folder, sorted so the match set never depends on
/// directory iteration order.
fn plugin_paths(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == DLL_EXTENSION))
                .collect()
        })
        .unwrap_or_default();
    paths.sort();
    paths
}

/// Regular files in a folder, sorted.
fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect()
        })
        .unwrap_or_default();
    paths.sort();
    paths
}

/// Whole-run orchestration: load plugins, dispatch, report.
pub struct Tournament {
    config: Config,
    host: PluginHost,
    error_log: Arc<ErrorLog>,
}

impl Tournament {
    pub fn new(config: Config) -> Tournament {
        Tournament { config, host: PluginHost::new(), error_log: Arc::new(ErrorLog::new()) }
    }

    /// Run to completion; the return value is the process exit code.
    pub fn run(&mut self) -> i32 {
        let mode = self.config.mode.clone();
        let code = match mode {
            Mode::Comparative { game_map, game_managers_folder, algorithm1, algorithm2 } => {
                self.run_comparative(&game_map, &game_managers_folder, &algorithm1, &algorithm2)
            }
            Mode::Competition { game_maps_folder, game_manager, algorithms_folder } => {
                self.run_competition(&game_maps_folder, &game_manager, &algorithms_folder)
            }
        };
        self.error_log.write_map_errors();
        code
    }

    fn run_comparative(
        &mut self,
        game_map: &Path,
        gm_folder: &Path,
        algorithm1: &Path,
        algorithm2: &Path,
    ) -> i32 {
        let map = match load_map(game_map) {
            Ok(map) => Arc::new(map),
            Err(err) => {
                self.error_log.record_map_error(game_map, &err.to_string());
                error!(map = %game_map.display(), %err, "cannot load game map");
                return 1;
            }
        };

        // exactly two algorithms are specified, so each one is required
        for path in [algorithm1, algorithm2] {
            if let Err(err) = self.host.load_algorithm(path) {
                self.error_log.record(&format!("algorithm '{}': {err}", path.display()));
                error!(plugin = %path.display(), %err, "required algorithm failed to load");
                return 1;
            }
        }

        // referees are resilient: one surviving plugin is enough
        for path in plugin_paths(gm_folder) {
            if let Err(err) = self.host.load_game_manager(&path) {
                self.error_log.record(&format!("game manager '{}': {err}", path.display()));
                warn!(plugin = %path.display(), %err, "skipping game manager");
            }
        }
        if self.host.game_managers.is_empty() {
            error!("no game manager plugin could be loaded");
            return 1;
        }
        info!(
            game_managers = self.host.game_managers.len(),
            threads = self.config.num_threads,
            "comparative run starting"
        );

        let algo1 = Arc::clone(&self.host.algorithms.entries()[0]);
        let algo2 = Arc::clone(&self.host.algorithms.entries()[1]);
        let entries = run_comparative_matches(
            self.config.num_threads,
            self.config.verbose,
            Arc::clone(&map),
            Arc::clone(&algo1),
            Arc::clone(&algo2),
            self.host.game_managers.entries(),
            &self.error_log,
        );
        info!(matches = entries.len(), "comparative run finished");

        drop(reporter::write_comparative_file(
            gm_folder,
            &game_map.display().to_string(),
            algo1.name(),
            algo2.name(),
            &entries,
            &self.error_log,
        ));
        0
    }

    fn run_competition(
        &mut self,
        maps_folder: &Path,
        game_manager: &Path,
        algorithms_folder: &Path,
    ) -> i32 {
        let map_files = files_in(maps_folder);
        if map_files.is_empty() {
            error!(folder = %maps_folder.display(), "no files found in game_maps_folder");
            return 1;
        }

        // the single referee is required
        if let Err(err) = self.host.load_game_manager(game_manager) {
            self.error_log.record(&format!("game manager '{}': {err}", game_manager.display()));
            error!(plugin = %game_manager.display(), %err, "game manager failed to load");
            return 1;
        }

        // algorithms are resilient, but a competition needs at least two
        for path in plugin_paths(algorithms_folder) {
            if let Err(err) = self.host.load_algorithm(&path) {
                self.error_log.record(&format!("algorithm '{}': {err}", path.display()));
                warn!(plugin = %path.display(), %err, "skipping algorithm");
            }
        }
        if self.host.algorithms.len() < 2 {
            error!(loaded = self.host.algorithms.len(), "need at least 2 algorithms");
            return 1;
        }

        let mut maps = Vec::new();
        for path in &map_files {
            match load_map(path) {
                Ok(map) => maps.push(Arc::new(map)),
                Err(err) => {
                    self.error_log.record_map_error(path, &err.to_string());
                    warn!(map = %path.display(), %err, "skipping invalid map");
                }
            }
        }
        if maps.is_empty() {
            error!("no valid maps to run");
            return 1;
        }
        info!(
            maps = maps.len(),
            algorithms = self.host.algorithms.len(),
            threads = self.config.num_threads,
            "competition run starting"
        );

        let gm_entry = Arc::clone(&self.host.game_managers.entries()[0]);
        let entries = run_competition_matches(
            self.config.num_threads,
            self.config.verbose,
            &maps,
            self.host.algorithms.entries(),
            Arc::clone(&gm_entry),
            &self.error_log,
        );
        info!(matches = entries.len(), "competition run finished");

        drop(reporter::write_competition_file(
            algorithms_folder,
            &maps_folder.display().to_string(),
            gm_entry.name(),
            &entries,
            &self.error_log,
        ));
        0
    }
}
