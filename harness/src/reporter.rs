//! Result file writers with stable, interleaving-independent layouts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use battle_interface::GameOverReason;
use tracing::{info, warn};

use crate::error_log::{timestamp, ErrorLog};
use crate::tournament::{ComparativeEntry, CompetitionEntry};

/// `"Tie: ..."` / `"Player N won: ..."` line used in comparative reports.
pub fn outcome_message(winner: u8, reason: GameOverReason) -> String {
    let prefix = match winner {
        1 => "Player 1 won: ",
        2 => "Player 2 won: ",
        _ => "Tie: ",
    };
    let cause = match reason {
        GameOverReason::AllTanksDead => "all opponent tanks dead",
        GameOverReason::MaxSteps => "max steps reached",
        GameOverReason::ZeroShells => "no shells remaining",
    };
    format!("{prefix}{cause}")
}

/// Build the comparative report: a header, then one block per group of game
/// managers that produced the identical outcome. Groups are ordered by
/// descending size (ties by outcome key ascending), names inside a group
/// lexicographically.
pub fn comparative_report(
    game_map: &str,
    algo1: &str,
    algo2: &str,
    entries: &[ComparativeEntry],
) -> String {
    let mut groups: BTreeMap<(u8, GameOverReason, usize, &str), Vec<&str>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry((entry.winner, entry.reason, entry.rounds, entry.final_state.as_str()))
            .or_default()
            .push(entry.gm_name.as_str());
    }
    let mut ordered: Vec<_> = groups.into_iter().collect();
    ordered.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));

    let mut out = format!("game_map={game_map}\nalgorithm1={algo1}\nalgorithm2={algo2}\n\n");
    for ((winner, reason, rounds, final_state), mut names) in ordered {
        names.sort_unstable();
        out.push_str(&names.join(","));
        out.push('\n');
        out.push_str(&outcome_message(winner, reason));
        out.push('\n');
        out.push_str(&rounds.to_string());
        out.push('\n');
        // the final state already carries one newline per row
        out.push_str(final_state);
        out.push('\n');
    }
    out
}

/// Build the competition report: a header, then `<algorithm> <score>` lines
/// sorted by score descending (ties by name so the file is deterministic).
/// Scoring: win 3, tie 1 for both, loss 0.
pub fn competition_report(
    maps_folder: &str,
    gm_name: &str,
    entries: &[CompetitionEntry],
) -> String {
    let mut scores: BTreeMap<&str, u32> = BTreeMap::new();
    for entry in entries {
        let _ = scores.entry(entry.algo1.as_str()).or_default();
        let _ = scores.entry(entry.algo2.as_str()).or_default();
        match entry.winner {
            1 => *scores.entry(entry.algo1.as_str()).or_default() += 3,
            2 => *scores.entry(entry.algo2.as_str()).or_default() += 3,
            _ => {
                *scores.entry(entry.algo1.as_str()).or_default() += 1;
                *scores.entry(entry.algo2.as_str()).or_default() += 1;
            }
        }
    }
    let mut ranked: Vec<_> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut out = format!("game_maps_folder={maps_folder}\ngame_manager={gm_name}\n\n");
    for (name, score) in ranked {
        out.push_str(&format!("{name} {score}\n"));
    }
    out
}

fn write_or_stdout(path: PathBuf, body: &str, error_log: &ErrorLog) -> Option<PathBuf> {
    match std::fs::write(&path, body) {
        Ok(()) => {
            info!(file = %path.display(), "results written");
            Some(path)
        }
        Err(err) => {
            warn!(file = %path.display(), %err, "cannot create results file, printing to stdout");
            error_log.record(&format!("cannot create {}: {err}", path.display()));
            print!("{body}");
            None
        }
    }
}

/// Write `comparative_results_<timestamp>.txt` into the game-managers folder,
/// falling back to stdout with the identical layout.
pub fn write_comparative_file(
    dir: &Path,
    game_map: &str,
    algo1: &str,
    algo2: &str,
    entries: &[ComparativeEntry],
    error_log: &ErrorLog,
) -> Option<PathBuf> {
    let body = comparative_report(game_map, algo1, algo2, entries);
    let path = dir.join(format!("comparative_results_{}.txt", timestamp()));
    write_or_stdout(path, &body, error_log)
}

/// Write `competition_<timestamp>.txt` into the algorithms folder, falling
/// back to stdout with the identical layout.
pub fn write_competition_file(
    dir: &Path,
    maps_folder: &str,
    gm_name: &str,
    entries: &[CompetitionEntry],
    error_log: &ErrorLog,
) -> Option<PathBuf> {
    let body = competition_report(maps_folder, gm_name, entries);
    let path = dir.join(format!("competition_{}.txt", timestamp()));
    write_or_stdout(path, &body, error_log)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparative_entry(gm: &str, winner: u8, rounds: usize, state: &str) -> ComparativeEntry {
        ComparativeEntry {
            gm_name: gm.to_string(),
            winner,
            reason: if winner == 0 { GameOverReason::MaxSteps } else { GameOverReason::AllTanksDead },
            rounds,
            final_state: state.to_string(),
        }
    }

    #[test]
    fn groups_identical_outcomes_and_orders_by_size() {
        let entries = vec![
            comparative_entry("zeta", 1, 7, "1    \n"),
            comparative_entry("alpha", 0, 9, "1   2\n"),
            comparative_entry("midgard", 1, 7, "1    \n"),
        ];
        let report = comparative_report("maps/duel.txt", "hunter", "camper", &entries);
        assert_eq!(
            report,
            "game_map=maps/duel.txt\n\
             algorithm1=hunter\n\
             algorithm2=camper\n\
             \n\
             midgard,zeta\n\
             Player 1 won: all opponent tanks dead\n\
             7\n\
             1    \n\
             \n\
             alpha\n\
             Tie: max steps reached\n\
             9\n\
             1   2\n\
             \n"
        );
    }

    #[test]
    fn equal_sized_groups_order_by_outcome_key() {
        let entries = vec![
            comparative_entry("b", 2, 4, "s\n"),
            comparative_entry("a", 1, 4, "s\n"),
        ];
        let report = comparative_report("m", "x", "y", &entries);
        let player1 = report.find("Player 1 won").unwrap();
        let player2 = report.find("Player 2 won").unwrap();
        assert!(player1 < player2);
    }

    fn competition_entry(map: &str, a1: &str, a2: &str, winner: u8) -> CompetitionEntry {
        CompetitionEntry {
            map_file: map.to_string(),
            algo1: a1.to_string(),
            algo2: a2.to_string(),
            winner,
        }
    }

    #[test]
    fn scores_three_one_zero() {
        let entries = vec![
            competition_entry("m1", "hunter", "camper", 1),
            competition_entry("m1", "camper", "wanderer", 0),
            competition_entry("m2", "hunter", "wanderer", 2),
        ];
        let report = competition_report("maps", "referee", &entries);
        assert_eq!(
            report,
            "game_maps_folder=maps\n\
             game_manager=referee\n\
             \n\
             wanderer 4\n\
             hunter 3\n\
             camper 1\n"
        );
    }

    #[test]
    fn losers_still_appear_with_zero() {
        let entries = vec![competition_entry("m", "winner", "loser", 1)];
        let report = competition_report("maps", "gm", &entries);
        assert!(report.contains("winner 3\n"));
        assert!(report.contains("loser 0\n"));
    }

    #[test]
    fn files_land_in_the_given_folder() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new();
        let entries = vec![comparative_entry("gm", 1, 3, "1\n")];
        let path = write_comparative_file(dir.path(), "m", "a", "b", &entries, &log).unwrap();
        assert!(path.starts_with(dir.path()));
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.starts_with("game_map=m\n"));
    }
}
