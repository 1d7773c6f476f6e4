// Property-based tests over draw quotas and numeric resolution
use outbreak_duel::catalog::{num_code, CODE_SHOTGUN};
use outbreak_duel::deck::{Zone, HAND_CAP, SPECIAL_HAND_CAP};
use outbreak_duel::duel::resolve::{resolve_duel, ResolveTrigger};
use outbreak_duel::GameState;
use proptest::prelude::*;

proptest! {
    /// Whatever the RNG does, drawing to exhaustion never breaks the hand
    /// cap, the special quota, or the human shotgun guarantee.
    #[test]
    fn proptest_draw_quotas_hold(seed in 0u64..10_000) {
        let mut gs = GameState::seeded(seed);
        let game_id = gs.ensure_running_game();
        gs.ensure_deck(game_id);
        gs.ensure_player(game_id, "red", "Red");
        while gs.draw_one(game_id, "red").is_some() {}
        prop_assert!(gs.hand_size(game_id, "red") <= HAND_CAP);
        prop_assert!(gs.hand_special_count(game_id, "red") <= SPECIAL_HAND_CAP);
        prop_assert!(gs.hand_has_code(game_id, "red", CODE_SHOTGUN));
    }

    /// Numeric resolution always crowns the higher sum (or no one on a
    /// tie), independent of submission interleaving.
    #[test]
    fn proptest_numeric_winner_matches_sums(
        red_values in prop::collection::vec(1u32..=10, 1..=4),
        blue_values in prop::collection::vec(1u32..=10, 1..=4),
    ) {
        let mut gs = GameState::seeded(7);
        let game_id = gs.ensure_running_game();
        gs.ensure_player(game_id, "red", "Red");
        gs.ensure_player(game_id, "blue", "Blue");
        let duel_id = gs.start_duel(game_id, "red", "blue").expect("created").duel_id;

        for (equipe, values) in [("red", &red_values), ("blue", &blue_values)] {
            for v in values {
                let code = num_code(*v);
                gs.catalog.upsert(&code);
                let card_id = gs.mint_card(game_id, &code, Zone::Hand, Some(equipe.to_string()));
                let token = gs.card(card_id).expect("card").token.clone();
                gs.submit_card(duel_id, equipe, &token).expect("submit");
            }
        }

        let result = resolve_duel(&mut gs, duel_id, ResolveTrigger::Forced)
            .expect("resolves")
            .expect("finalized");
        let red_sum: u32 = red_values.iter().sum();
        let blue_sum: u32 = blue_values.iter().sum();
        let expected = if red_sum > blue_sum {
            Some("red")
        } else if blue_sum > red_sum {
            Some("blue")
        } else {
            None
        };
        prop_assert_eq!(result.winner_equipe_id.as_deref(), expected);
        if red_sum != blue_sum {
            let loser_max = if red_sum > blue_sum {
                blue_values.iter().max()
            } else {
                red_values.iter().max()
            };
            let expected_code = loser_max.map(|v| num_code(*v));
            prop_assert_eq!(
                result.won_card_code.as_deref(),
                expected_code.as_deref()
            );
        } else {
            prop_assert_eq!(result.won_card_code, None);
        }
    }
}
