use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::{openapi, JsonSchema};

use crate::duel::resolve::{resolve_duel, DuelResult, ResolveTrigger};
use crate::duel::{DuelPlay, DuelStatus, TargetValidation};
use crate::player::PlayerView;
use crate::state::GameState;
use crate::status_messages::{ApiError, Fault};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StartDuelRequest {
    pub game_id: u64,
    pub source_equipe_id: String,
    pub target_equipe_id: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StartDuelResponse {
    pub duel_id: u64,
    pub message: String,
}

/// Consolidated duel view returned by submit, status poll and
/// force-resolve alike.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DuelView {
    pub duel_id: u64,
    pub status: DuelStatus,
    pub winner_equipe_id: Option<String>,
    pub result: Option<DuelResult>,
    pub plays: Vec<DuelPlay>,
    pub state: Vec<PlayerView>,
}

/// Build the consolidated view, attempting resolution first so polling
/// clients drive the lifecycle lazily.
fn build_duel_view(
    gs: &mut GameState,
    duel_id: u64,
    trigger: ResolveTrigger,
) -> Result<DuelView, Fault> {
    let result = resolve_duel(gs, duel_id, trigger)?;
    let duel = gs
        .duel(duel_id)
        .ok_or_else(|| Fault::not_found("duel_not_found", "no such duel"))?;
    let game_id = duel.game_id;
    let (player_a, player_b) = (duel.player_a.clone(), duel.player_b.clone());
    let status = duel.status.clone();
    let winner = duel.winner.clone();
    if gs.game(game_id).is_none() {
        return Err(Fault::not_found(
            "game_not_found_for_duel",
            "the duel's game no longer exists",
        ));
    }
    let state = [player_a, player_b]
        .iter()
        .filter_map(|equipe| gs.player_view(game_id, equipe))
        .collect();
    Ok(DuelView {
        duel_id,
        status,
        winner_equipe_id: winner,
        result,
        plays: gs.plays_for_duel(duel_id),
        state,
    })
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ValidateTargetRequest {
    pub game_id: u64,
    pub actor_equipe_id: String,
    pub target_equipe_id: String,
    pub duel_id: Option<u64>,
}

/// Pre-flight check before a duel-start: is this target attackable, and,
/// when a duel id is given, is it this duel's counterpart?
#[openapi]
#[post("/duels/validate-target", format = "json", data = "<req>")]
pub async fn validate_target(
    req: Json<ValidateTargetRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<Json<TargetValidation>, ApiError> {
    let req = req.into_inner();
    let mut gs = game_state.lock().await;
    gs.validate_target(
        req.game_id,
        &req.actor_equipe_id,
        &req.target_equipe_id,
        req.duel_id,
    )
    .map(Json)
    .map_err(Fault::response)
}

/// Start (or idempotently re-enter) a duel between two players.
#[openapi]
#[post("/duels", format = "json", data = "<req>")]
pub async fn start_duel(
    req: Json<StartDuelRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<(rocket::http::Status, Json<StartDuelResponse>), ApiError> {
    let req = req.into_inner();
    let mut gs = game_state.lock().await;
    let outcome = gs
        .start_duel(req.game_id, &req.source_equipe_id, &req.target_equipe_id)
        .map_err(Fault::response)?;
    let (status, message) = if outcome.created {
        (rocket::http::Status::Created, "duel created".to_string())
    } else {
        (
            rocket::http::Status::Ok,
            "pending duel already existed for this pair".to_string(),
        )
    };
    Ok((
        status,
        Json(StartDuelResponse {
            duel_id: outcome.duel_id,
            message,
        }),
    ))
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SubmitCardRequest {
    pub equipe_id: String,
    pub card_token: String,
}

/// Submit one card into a duel, then attempt lazy resolution.
#[openapi]
#[post("/duels/<duel_id>/plays", format = "json", data = "<req>")]
pub async fn submit_card(
    duel_id: u64,
    req: Json<SubmitCardRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<(rocket::http::Status, Json<DuelView>), ApiError> {
    let req = req.into_inner();
    let mut gs = game_state.lock().await;
    gs.submit_card(duel_id, &req.equipe_id, &req.card_token)
        .map_err(Fault::response)?;
    let view = build_duel_view(&mut gs, duel_id, ResolveTrigger::Lazy)
        .map_err(Fault::response)?;
    Ok((rocket::http::Status::Created, Json(view)))
}

/// Poll a duel. The poll itself attempts resolution, so no background
/// scheduler is needed to finish duels.
#[openapi]
#[get("/duels/<duel_id>?<equipe_id>")]
pub async fn duel_status(
    duel_id: u64,
    equipe_id: Option<String>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<Json<DuelView>, ApiError> {
    if let Some(ref equipe) = equipe_id {
        log::debug!("duel {duel_id} polled by {equipe}");
    }
    let mut gs = game_state.lock().await;
    build_duel_view(&mut gs, duel_id, ResolveTrigger::Lazy)
        .map(Json)
        .map_err(Fault::response)
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ForceResolveRequest {
    pub equipe_id: String,
}

/// Force resolution regardless of submission completeness. Only a
/// participant may force their own duel.
#[openapi]
#[post("/duels/<duel_id>/resolve", format = "json", data = "<req>")]
pub async fn force_resolve(
    duel_id: u64,
    req: Json<ForceResolveRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<Json<DuelView>, ApiError> {
    let req = req.into_inner();
    let mut gs = game_state.lock().await;
    let duel = gs
        .duel(duel_id)
        .ok_or_else(|| Fault::not_found("duel_not_found", "no such duel").response())?;
    let game_id = duel.game_id;
    let involved = duel.involves(&req.equipe_id);
    if gs.player(game_id, &req.equipe_id).is_none() {
        return Err(Fault::not_found("player_not_in_game", "player not in game").response());
    }
    if !involved {
        return Err(Fault::bad_request(
            "player_not_in_duel",
            "only a participant may force resolution",
        )
        .response());
    }
    build_duel_view(&mut gs, duel_id, ResolveTrigger::Forced)
        .map(Json)
        .map_err(Fault::response)
}
