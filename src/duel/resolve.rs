use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{self, CardType, CODE_SHOTGUN, CODE_ZOMBIE};
use crate::deck::Zone;
use crate::duel::{DuelPlay, DuelStatus};
use crate::event_log::EventPayload;
use crate::player::Role;
use crate::state::{now_millis, GameState};
use crate::status_messages::Fault;

/// What asked for the resolution. Lazy triggers (submit, status poll) only
/// run numeric resolution once both participants have posted; a forced
/// trigger resolves on whatever sums stand.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResolveTrigger {
    Lazy,
    Forced,
}

/// The stored outcome of a resolved duel, returned verbatim on every
/// subsequent resolve call.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DuelResult {
    pub winner_equipe_id: Option<String>,
    pub logs: Vec<String>,
    pub effects: Vec<String>,
    pub won_card_code: Option<String>,
    pub won_card_label: Option<String>,
}

struct Resolution {
    winner: Option<String>,
    logs: Vec<String>,
    effects: Vec<String>,
    won_card: Option<u64>,
}

fn play_value(play: &DuelPlay) -> u32 {
    play.num_value
        .or_else(|| catalog::num_value_from_code(&play.card_code))
        .unwrap_or(0)
}

/// The loser's single highest-value posted NUM card, by posted value.
fn highest_posted_num(plays: &[DuelPlay], equipe_id: &str) -> Option<DuelPlay> {
    plays
        .iter()
        .filter(|p| p.equipe_id == equipe_id && p.card_type == CardType::Num)
        .max_by_key(|p| play_value(p))
        .cloned()
}

/// Resolve a duel. Returns `None` while the duel stays pending, otherwise
/// the (possibly previously stored) result.
///
/// Safe to invoke from any number of concurrent readers: the RESOLVED
/// short-circuit guarantees exactly one call mutates state, and every later
/// call returns the identical stored outcome.
pub fn resolve_duel(
    gs: &mut GameState,
    duel_id: u64,
    trigger: ResolveTrigger,
) -> Result<Option<DuelResult>, Fault> {
    let duel = gs
        .duel(duel_id)
        .ok_or_else(|| Fault::not_found("duel_not_found", "no such duel"))?;

    if duel.status == DuelStatus::Resolved {
        return Ok(Some(DuelResult {
            winner_equipe_id: duel.winner.clone(),
            logs: duel.logs.clone(),
            effects: duel.effects.clone(),
            won_card_code: duel.won_card_code.clone(),
            won_card_label: duel.won_card_label.clone(),
        }));
    }

    let game_id = duel.game_id;
    let player_a = duel.player_a.clone();
    let player_b = duel.player_b.clone();
    let plays = gs.plays_for_duel(duel_id);
    if plays.is_empty() {
        return Ok(None);
    }

    // A special card, once played, terminates the duel regardless of what
    // the opponent has or has not submitted.
    let last_special = plays
        .iter()
        .rev()
        .find(|p| p.card_type.is_special())
        .cloned();

    let resolution = match last_special {
        Some(special) => {
            let actor = special.equipe_id.clone();
            let opponent = if actor == player_a {
                player_b.clone()
            } else {
                player_a.clone()
            };
            resolve_special(gs, game_id, &special, &actor, &opponent, &plays)
        }
        None => {
            if trigger == ResolveTrigger::Lazy {
                let a_posted = plays.iter().any(|p| p.equipe_id == player_a);
                let b_posted = plays.iter().any(|p| p.equipe_id == player_b);
                if !(a_posted && b_posted) {
                    return Ok(None);
                }
            }
            resolve_numeric(gs, &player_a, &player_b, &plays)
        }
    };

    Ok(Some(finalize(gs, duel_id, resolution)))
}

fn resolve_special(
    gs: &mut GameState,
    game_id: u64,
    special: &DuelPlay,
    actor: &str,
    opponent: &str,
    plays: &[DuelPlay],
) -> Resolution {
    let mut logs = Vec::new();
    let mut effects = Vec::new();
    let mut won_card = None;

    let actor_role = gs
        .player(game_id, actor)
        .map(|p| p.role.clone())
        .unwrap_or(Role::Eliminated);
    let opponent_role = gs
        .player(game_id, opponent)
        .map(|p| p.role.clone())
        .unwrap_or(Role::Eliminated);

    let winner = match special.card_type {
        CardType::Shotgun => {
            if opponent_role == Role::Zombie {
                logs.push(format!("{actor} fires the shotgun: {opponent} is eliminated"));
                let hand = gs.hand_card_ids(game_id, opponent);
                let taken = hand.len();
                for card_id in hand {
                    gs.transition_card(card_id, Zone::Hand, Some(actor.to_string()));
                }
                if let Some(p) = gs.player_mut(game_id, opponent) {
                    p.eliminate();
                }
                logs.push(format!("{actor} takes {opponent}'s entire hand ({taken} cards)"));
                effects.push(format!("eliminated:{opponent}"));
                effects.push(format!("hand_transferred:{taken}:{actor}"));
                Some(actor.to_string())
            } else {
                match highest_posted_num(plays, opponent) {
                    Some(best) => {
                        logs.push(format!(
                            "{actor} fires the shotgun at a human: {} changes hands",
                            best.card_code
                        ));
                        if let Some(card_id) = best.card_id {
                            gs.transition_card(card_id, Zone::Hand, Some(actor.to_string()));
                            won_card = Some(card_id);
                        }
                        effects.push(format!("card_transfer:{}:{actor}", best.card_code));
                    }
                    None => {
                        logs.push(format!(
                            "{actor} fires the shotgun at a human: {opponent} posted no card to transfer"
                        ));
                    }
                }
                Some(actor.to_string())
            }
        }
        CardType::Vaccine => {
            if opponent_role == Role::Zombie {
                logs.push(format!("{actor} administers the vaccine: {opponent} is human again"));
                if let Some(p) = gs.player_mut(game_id, opponent) {
                    p.convert_to_human();
                }
                effects.push(format!("role_change:{opponent}:human"));
                let zombie_card = gs
                    .hand_card_ids(game_id, opponent)
                    .into_iter()
                    .find(|id| {
                        gs.card(*id)
                            .map(|c| c.def_code == CODE_ZOMBIE)
                            .unwrap_or(false)
                    });
                if let Some(card_id) = zombie_card {
                    gs.transition_card(card_id, Zone::Discard, None);
                    if let Some(game) = gs.game_mut(game_id) {
                        game.discard_count += 1;
                    }
                    logs.push(format!("{opponent} discards a zombie card"));
                    effects.push(format!("card_discarded:{CODE_ZOMBIE}:{opponent}"));
                }
                for equipe in [actor, opponent] {
                    gs.give_specific_from_deck_or_forge(game_id, equipe, CODE_SHOTGUN);
                    effects.push(format!("card_granted:{CODE_SHOTGUN}:{equipe}"));
                }
                logs.push("both duelists receive a fresh shotgun".to_string());
                Some(actor.to_string())
            } else {
                logs.push(format!("{actor}'s vaccine has no effect on a human"));
                None
            }
        }
        CardType::Zombie => {
            if actor_role == Role::Zombie && opponent_role == Role::Human {
                logs.push(format!("{actor} bites {opponent}: they join the horde"));
                if let Some(p) = gs.player_mut(game_id, opponent) {
                    p.convert_to_zombie();
                }
                effects.push(format!("role_change:{opponent}:zombie"));
                for equipe in [actor, opponent] {
                    gs.give_specific_from_deck_or_forge(game_id, equipe, CODE_ZOMBIE);
                    effects.push(format!("card_granted:{CODE_ZOMBIE}:{equipe}"));
                }
                logs.push("both duelists receive a fresh zombie card".to_string());
                Some(actor.to_string())
            } else {
                logs.push(format!(
                    "{actor}'s zombie card has no effect: it takes a zombie biting a human"
                ));
                None
            }
        }
        CardType::Num => {
            logs.push(format!("unknown special card {}", special.card_code));
            None
        }
    };

    Resolution {
        winner,
        logs,
        effects,
        won_card,
    }
}

fn resolve_numeric(
    gs: &mut GameState,
    player_a: &str,
    player_b: &str,
    plays: &[DuelPlay],
) -> Resolution {
    let mut logs = Vec::new();
    let mut effects = Vec::new();
    let mut won_card = None;

    let sum_of = |equipe: &str| -> u32 {
        plays
            .iter()
            .filter(|p| p.equipe_id == equipe && p.card_type == CardType::Num)
            .map(play_value)
            .sum()
    };
    let sum_a = sum_of(player_a);
    let sum_b = sum_of(player_b);
    logs.push(format!("{player_a} posted {sum_a}, {player_b} posted {sum_b}"));

    let winner = if sum_a == sum_b {
        logs.push("tie: no card changes hands".to_string());
        None
    } else {
        let (winner, loser) = if sum_a > sum_b {
            (player_a, player_b)
        } else {
            (player_b, player_a)
        };
        logs.push(format!("{winner} wins the exchange"));
        match highest_posted_num(plays, loser) {
            Some(best) => {
                if let Some(card_id) = best.card_id {
                    gs.transition_card(card_id, Zone::Hand, Some(winner.to_string()));
                    won_card = Some(card_id);
                }
                logs.push(format!("{winner} takes {} from {loser}", best.card_code));
                effects.push(format!("card_transfer:{}:{winner}", best.card_code));
            }
            None => {
                logs.push(format!("{loser} posted no card to transfer"));
            }
        }
        Some(winner.to_string())
    };

    Resolution {
        winner,
        logs,
        effects,
        won_card,
    }
}

/// Commit the outcome: stamp the duel, store the narration, release both
/// participants and clear incoming-duel pointers aimed at this duel.
fn finalize(gs: &mut GameState, duel_id: u64, resolution: Resolution) -> DuelResult {
    let won_card_dto = resolution.won_card.and_then(|id| {
        let card = gs.card(id)?;
        let def = gs.catalog.get(&card.def_code)?;
        Some((def.code.clone(), def.label.clone()))
    });
    let (won_card_code, won_card_label) = match won_card_dto {
        Some((code, label)) => (Some(code), Some(label)),
        None => (None, None),
    };

    let mut participants = Vec::new();
    let mut game_id = 0;
    if let Some(duel) = gs.duel_mut(duel_id) {
        duel.status = DuelStatus::Resolved;
        duel.winner = resolution.winner.clone();
        duel.resolved_at = Some(now_millis());
        duel.logs = resolution.logs.clone();
        duel.effects = resolution.effects.clone();
        duel.won_card_code = won_card_code.clone();
        duel.won_card_label = won_card_label.clone();
        game_id = duel.game_id;
        participants.push(duel.player_a.clone());
        participants.push(duel.player_b.clone());
    }
    for equipe in participants {
        if let Some(p) = gs.player_mut(game_id, &equipe) {
            p.locked_in_duel = false;
            if p.incoming_duel == Some(duel_id) {
                p.incoming_duel = None;
            }
        }
    }
    gs.event_log.append(
        "DuelResolved",
        EventPayload::DuelResolved {
            duel_id,
            winner: resolution.winner.clone(),
        },
    );
    log::info!(
        "duel {duel_id} resolved, winner: {}",
        resolution.winner.as_deref().unwrap_or("none")
    );

    DuelResult {
        winner_equipe_id: resolution.winner,
        logs: resolution.logs,
        effects: resolution.effects,
        won_card_code,
        won_card_label,
    }
}
