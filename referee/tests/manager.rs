//! Whole-match behavior of the reference referee.

mod common;

use battle_interface::ActionRequest::*;
use battle_interface::{BoardSnapshot, GameManager, GameOverReason, SatelliteView};
use tank_referee::manager::RefereeGameManager;

use common::{scripted_factory, SilentPlayer};

fn map_view(rows: &[&str]) -> BoardSnapshot {
    BoardSnapshot::from_fn(rows.len(), rows[0].len(), |x, y| rows[y].as_bytes()[x] as char)
}

#[test]
fn referee_runs_a_full_match() {
    let map = map_view(&["2  1 "]);
    let mut gm = RefereeGameManager::new(false);
    let mut p1 = SilentPlayer;
    let mut p2 = SilentPlayer;
    let f1 = scripted_factory(vec![vec![Shoot]]);
    let f2 = scripted_factory(vec![vec![]]);

    let result = gm.run(5, 1, &map, "duel", 100, 4, &mut p1, "alpha", &mut p2, "beta", &f1, &f2);

    assert_eq!(result.winner, 1);
    assert_eq!(result.reason, GameOverReason::AllTanksDead);
    assert_eq!(result.rounds, 2);
    assert_eq!(result.remaining_tanks, [1, 0]);
    assert_eq!(result.game_state.render(), "   1 \n");
}

#[test]
fn missing_opponent_ends_before_the_first_turn() {
    let map = map_view(&["1    "]);
    let mut gm = RefereeGameManager::new(false);
    let mut p1 = SilentPlayer;
    let mut p2 = SilentPlayer;
    let f1 = scripted_factory(vec![vec![]]);
    let f2 = scripted_factory(vec![vec![]]);

    let result = gm.run(5, 1, &map, "empty", 100, 4, &mut p1, "alpha", &mut p2, "beta", &f1, &f2);

    assert_eq!(result.winner, 1);
    assert_eq!(result.reason, GameOverReason::AllTanksDead);
    assert_eq!(result.rounds, 0);
    assert_eq!(result.remaining_tanks, [1, 0]);
}

#[test]
fn empty_map_is_an_immediate_tie() {
    let map = map_view(&["  #  "]);
    let mut gm = RefereeGameManager::new(false);
    let mut p1 = SilentPlayer;
    let mut p2 = SilentPlayer;
    let f1 = scripted_factory(vec![]);
    let f2 = scripted_factory(vec![]);

    let result = gm.run(5, 1, &map, "walls", 10, 4, &mut p1, "alpha", &mut p2, "beta", &f1, &f2);

    assert_eq!(result.winner, 0);
    assert_eq!(result.reason, GameOverReason::AllTanksDead);
    assert_eq!(result.rounds, 0);
    assert_eq!(result.remaining_tanks, [0, 0]);
}

#[test]
fn max_steps_maps_to_its_reason() {
    let map = map_view(&["1   2"]);
    let mut gm = RefereeGameManager::new(false);
    let mut p1 = SilentPlayer;
    let mut p2 = SilentPlayer;
    let f1 = scripted_factory(vec![vec![]]);
    let f2 = scripted_factory(vec![vec![]]);

    let result = gm.run(5, 1, &map, "calm", 5, 3, &mut p1, "alpha", &mut p2, "beta", &f1, &f2);

    assert_eq!(result.winner, 0);
    assert_eq!(result.reason, GameOverReason::MaxSteps);
    assert_eq!(result.rounds, 5);
    assert_eq!(result.remaining_tanks, [1, 1]);
}

#[test]
fn zero_shell_stall_maps_to_its_reason() {
    let map = map_view(&["1   2"]);
    let mut gm = RefereeGameManager::new(false);
    let mut p1 = SilentPlayer;
    let mut p2 = SilentPlayer;
    let f1 = scripted_factory(vec![vec![]]);
    let f2 = scripted_factory(vec![vec![]]);

    let result = gm.run(5, 1, &map, "dry", 1000, 0, &mut p1, "alpha", &mut p2, "beta", &f1, &f2);

    assert_eq!(result.winner, 0);
    assert_eq!(result.reason, GameOverReason::ZeroShells);
    assert_eq!(result.rounds, 40);
}

#[test]
fn results_are_reproducible() {
    let run_once = || {
        let map = map_view(&["2  1 "]);
        let mut gm = RefereeGameManager::new(false);
        let mut p1 = SilentPlayer;
        let mut p2 = SilentPlayer;
        let f1 = scripted_factory(vec![vec![Shoot]]);
        let f2 = scripted_factory(vec![vec![]]);
        gm.run(5, 1, &map, "duel", 100, 4, &mut p1, "alpha", &mut p2, "beta", &f1, &f2)
    };
    let first = run_once();
    let second = run_once();
    assert_eq!(first.winner, second.winner);
    assert_eq!(first.reason, second.reason);
    assert_eq!(first.rounds, second.rounds);
    assert_eq!(first.remaining_tanks, second.remaining_tanks);
    assert_eq!(first.game_state, second.game_state);
}

#[test]
fn map_view_out_of_range_is_empty_for_loading() {
    // the referee loads only in-bounds cells; a snapshot view answers '&'
    let map = map_view(&["1"]);
    assert_eq!(map.get_object_at(5, 5), '&');
}
