use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::{openapi, JsonSchema};

use crate::deck::{CardDto, Zone};
use crate::event_log::EventPayload;
use crate::state::GameState;
use crate::status_messages::{new_status, ApiError, Fault, Status};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DrawRequest {
    pub equipe_id: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DrawResponse {
    pub card: CardDto,
    pub hand_size: usize,
}

/// Draw one card. A blocked draw (full hand, quota, exhausted deck) is an
/// expected outcome reported as `deck_empty_or_quota_blocked`, not a server
/// failure.
#[openapi]
#[post("/games/<game_id>/draw", format = "json", data = "<req>")]
pub async fn draw_card(
    game_id: u64,
    req: Json<DrawRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<Json<DrawResponse>, ApiError> {
    let req = req.into_inner();
    let mut gs = game_state.lock().await;
    if gs.game(game_id).is_none() {
        return Err(Fault::not_found("game_not_found", "no such game").response());
    }
    let eliminated = match gs.player(game_id, &req.equipe_id) {
        Some(p) => p.is_eliminated(),
        None => {
            return Err(
                Fault::not_found("player_not_in_game", "player not in this game").response(),
            )
        }
    };
    if eliminated {
        return Err(
            Fault::bad_request("player_eliminated", "eliminated players draw nothing").response(),
        );
    }
    gs.ensure_deck(game_id);
    match gs.draw_one(game_id, &req.equipe_id) {
        Some(card_id) => {
            let card_code = gs
                .card(card_id)
                .map(|c| c.def_code.clone())
                .unwrap_or_default();
            gs.event_log.append(
                "CardDrawn",
                EventPayload::CardDrawn {
                    game_id,
                    equipe_id: req.equipe_id.clone(),
                    card_code,
                },
            );
            let card = gs.card_dto(card_id).ok_or_else(|| {
                Fault::not_found("card_def_not_found", "drawn card has no definition").response()
            })?;
            let hand_size = gs.hand_size(game_id, &req.equipe_id);
            Ok(Json(DrawResponse { card, hand_size }))
        }
        None => {
            log::debug!("draw blocked for {} in game {game_id}", req.equipe_id);
            Err(Fault::conflict(
                "deck_empty_or_quota_blocked",
                "no eligible card could be drawn",
            )
            .response())
        }
    }
}

/// Current hand of a player, tokens included: the tokens are the play
/// credentials for submit-card.
#[openapi]
#[get("/games/<game_id>/players/<equipe_id>/hand")]
pub async fn get_hand(
    game_id: u64,
    equipe_id: String,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<Json<Vec<CardDto>>, ApiError> {
    let gs = game_state.lock().await;
    if gs.game(game_id).is_none() {
        return Err(Fault::not_found("game_not_found", "no such game").response());
    }
    if gs.player(game_id, &equipe_id).is_none() {
        return Err(Fault::not_found("player_not_in_game", "player not in this game").response());
    }
    Ok(Json(gs.hand_dtos(game_id, &equipe_id)))
}

/// Admin reset: every card of the game is burned and a pristine deck is
/// minted in its place. The only path that writes the Burn zone.
#[openapi]
#[post("/games/<game_id>/reset-deck")]
pub async fn reset_deck(
    game_id: u64,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<Json<Status>, ApiError> {
    let mut gs = game_state.lock().await;
    if gs.game(game_id).is_none() {
        return Err(Fault::not_found("game_not_found", "no such game").response());
    }
    let card_ids: Vec<u64> = gs
        .cards
        .iter()
        .filter(|c| c.game_id == game_id && c.zone != Zone::Burn)
        .map(|c| c.id)
        .collect();
    for id in card_ids {
        gs.transition_card(id, Zone::Burn, None);
    }
    gs.ensure_deck(game_id);
    gs.event_log
        .append("DeckReset", EventPayload::DeckReset { game_id });
    Ok(new_status("deck_reset", "a pristine deck was minted"))
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SeedRequest {
    pub seed: u64,
}

/// Test endpoint: reseed the deterministic RNG.
#[post("/tests/seed", format = "json", data = "<req>")]
pub async fn set_test_seed(
    req: Json<SeedRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> rocket::http::Status {
    let req = req.into_inner();
    let mut gs = game_state.lock().await;
    gs.reseed(req.seed);
    gs.event_log
        .append("SeedSet", EventPayload::SeedSet { seed: req.seed });
    rocket::http::Status::Created
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SetHandRequest {
    pub game_id: u64,
    pub equipe_id: String,
    pub card_codes: Vec<String>,
}

/// Test endpoint: replace a player's hand with the given codes (existing
/// hand goes back to the deck; the new cards are forged).
#[post("/tests/hand", format = "json", data = "<req>")]
pub async fn set_test_hand(
    req: Json<SetHandRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<Json<Vec<CardDto>>, ApiError> {
    let req = req.into_inner();
    let mut gs = game_state.lock().await;
    if gs.player(req.game_id, &req.equipe_id).is_none() {
        return Err(Fault::not_found("player_not_in_game", "no such player").response());
    }
    for id in gs.hand_card_ids(req.game_id, &req.equipe_id) {
        gs.transition_card(id, Zone::Deck, None);
    }
    for code in &req.card_codes {
        gs.catalog.upsert(code);
        gs.mint_card(
            req.game_id,
            code,
            Zone::Hand,
            Some(req.equipe_id.clone()),
        );
    }
    Ok(Json(gs.hand_dtos(req.game_id, &req.equipe_id)))
}
