//! Concurrency-shaped tests against the store API: racing duel-start
//! requests must converge on a single pending duel per pair and per player.

use outbreak_duel::duel::DuelStatus;
use outbreak_duel::GameState;
use std::sync::{Arc, Mutex};
use std::thread;

fn setup(gs: &mut GameState, equipes: &[&str]) -> u64 {
    let game_id = gs.ensure_running_game();
    gs.ensure_deck(game_id);
    for equipe in equipes {
        gs.ensure_player(game_id, equipe, equipe);
    }
    game_id
}

#[test]
fn concurrent_starts_for_one_pair_create_one_duel() {
    let mut gs = GameState::seeded(61);
    let game_id = setup(&mut gs, &["red", "blue"]);
    let shared = Arc::new(Mutex::new(gs));

    let mut handles = Vec::new();
    for (source, target) in [("red", "blue"), ("blue", "red"), ("red", "blue"), ("blue", "red")] {
        let shared = Arc::clone(&shared);
        handles.push(thread::spawn(move || {
            let mut gs = shared.lock().expect("state lock");
            gs.start_duel(game_id, source, target)
                .expect("start succeeds")
                .duel_id
        }));
    }
    let ids: Vec<u64> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    let gs = shared.lock().expect("state lock");
    assert_eq!(gs.duels.len(), 1, "exactly one duel row exists");
    assert!(ids.iter().all(|id| *id == ids[0]), "every caller got the same id");
}

#[test]
fn racing_starts_across_players_never_double_book_anyone() {
    let mut gs = GameState::seeded(62);
    let game_id = setup(&mut gs, &["red", "blue", "green", "yellow"]);
    let shared = Arc::new(Mutex::new(gs));

    let pairs = [
        ("red", "blue"),
        ("blue", "green"),
        ("green", "yellow"),
        ("yellow", "red"),
        ("red", "green"),
        ("blue", "yellow"),
    ];
    let mut handles = Vec::new();
    for (source, target) in pairs {
        let shared = Arc::clone(&shared);
        handles.push(thread::spawn(move || {
            let mut gs = shared.lock().expect("state lock");
            let _ = gs.start_duel(game_id, source, target);
        }));
    }
    for h in handles {
        h.join().expect("thread panicked");
    }

    let gs = shared.lock().expect("state lock");
    for equipe in ["red", "blue", "green", "yellow"] {
        let pending = gs
            .duels
            .iter()
            .filter(|d| d.status == DuelStatus::Pending && d.involves(equipe))
            .count();
        assert!(
            pending <= 1,
            "{equipe} is in {pending} pending duels at once"
        );
    }
}

#[test]
fn pending_invariant_survives_resolution_and_restart() {
    use outbreak_duel::duel::resolve::{resolve_duel, ResolveTrigger};

    let mut gs = GameState::seeded(63);
    let game_id = setup(&mut gs, &["red", "blue"]);

    let first = gs.start_duel(game_id, "red", "blue").expect("created");
    gs.catalog.upsert("NUM_4");
    gs.catalog.upsert("NUM_2");
    let red_card = gs.mint_card(
        game_id,
        "NUM_4",
        outbreak_duel::deck::Zone::Hand,
        Some("red".to_string()),
    );
    let blue_card = gs.mint_card(
        game_id,
        "NUM_2",
        outbreak_duel::deck::Zone::Hand,
        Some("blue".to_string()),
    );
    let token = gs.card(red_card).expect("card").token.clone();
    gs.submit_card(first.duel_id, "red", &token).expect("submit");
    let token = gs.card(blue_card).expect("card").token.clone();
    gs.submit_card(first.duel_id, "blue", &token).expect("submit");
    resolve_duel(&mut gs, first.duel_id, ResolveTrigger::Lazy)
        .expect("resolves")
        .expect("finalized");

    // The pair can duel again now that the first duel is resolved, and the
    // new duel is a fresh row.
    let second = gs.start_duel(game_id, "red", "blue").expect("created");
    assert_ne!(first.duel_id, second.duel_id);
    let pending = gs
        .duels
        .iter()
        .filter(|d| d.status == DuelStatus::Pending && d.involves("red"))
        .count();
    assert_eq!(pending, 1);
}
