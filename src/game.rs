use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::{openapi, JsonSchema};

use crate::deck::CardDto;
use crate::event_log::EventPayload;
use crate::player::Role;
use crate::state::{now_millis, GameState};
use crate::status_messages::{ApiError, Fault};

const DEFAULT_GAME_DURATION_SECS: u64 = 3600;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum GamePhase {
    Setup,
    Lobby,
    Running,
    Finished,
}

/// One game session. The duel core only reads `ends_at` and the two
/// draw/discard tallies; round bookkeeping lives with the outer app.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Game {
    pub id: u64,
    pub phase: GamePhase,
    pub ends_at: u64,
    pub draw_count: u64,
    pub discard_count: u64,
}

impl Game {
    pub fn new(id: u64) -> Self {
        let duration_secs = std::env::var("GAME_DURATION_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_GAME_DURATION_SECS);
        Game {
            id,
            phase: GamePhase::Running,
            ends_at: now_millis() + duration_secs * 1000,
            draw_count: 0,
            discard_count: 0,
        }
    }
}

impl GameState {
    pub fn find_running_game(&self) -> Option<u64> {
        self.games
            .iter()
            .find(|g| g.phase == GamePhase::Running)
            .map(|g| g.id)
    }

    /// Insert guard mirroring the duel-creation one: at most one running
    /// game; a colliding insert reports the game that won.
    pub fn insert_game(&mut self, game: Game) -> Result<u64, u64> {
        if game.phase == GamePhase::Running {
            if let Some(existing) = self.find_running_game() {
                return Err(existing);
            }
        }
        let id = game.id;
        self.games.push(game);
        Ok(id)
    }

    /// The active-game reference is an explicit lookup, created on miss.
    /// A losing insert reuses the game that committed first.
    pub fn ensure_running_game(&mut self) -> u64 {
        if let Some(id) = self.find_running_game() {
            return id;
        }
        let game = Game::new(self.mint_game_id());
        match self.insert_game(game) {
            Ok(id) => id,
            Err(existing) => existing,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct JoinRequest {
    pub equipe_id: String,
    pub name: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct JoinResponse {
    pub game_id: u64,
    pub equipe_id: String,
    pub role: Role,
    pub created: bool,
    pub hand: Vec<CardDto>,
}

/// Join the running game (created on miss), registering the player on
/// first join and dealing their initial hand.
#[openapi]
#[post("/games/join", format = "json", data = "<req>")]
pub async fn join_game(
    req: Json<JoinRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<(rocket::http::Status, Json<JoinResponse>), ApiError> {
    let req = req.into_inner();
    if req.equipe_id.trim().is_empty() {
        return Err(Fault::bad_request("equipe_id_missing", "equipe_id must not be empty")
            .response());
    }
    let mut gs = game_state.lock().await;
    let game_id = gs.ensure_running_game();
    gs.ensure_deck(game_id);
    let created = gs.ensure_player(game_id, &req.equipe_id, &req.name);
    if created {
        gs.deal_initial_hand(game_id, &req.equipe_id);
        gs.event_log.append(
            "PlayerJoined",
            EventPayload::PlayerJoined {
                game_id,
                equipe_id: req.equipe_id.clone(),
            },
        );
    }
    let role = match gs.player(game_id, &req.equipe_id) {
        Some(p) => p.role.clone(),
        None => {
            return Err(
                Fault::not_found("player_not_in_game", "player registration failed").response(),
            )
        }
    };
    let hand = gs.hand_dtos(game_id, &req.equipe_id);
    let status = if created {
        rocket::http::Status::Created
    } else {
        rocket::http::Status::Ok
    };
    Ok((
        status,
        Json(JoinResponse {
            game_id,
            equipe_id: req.equipe_id,
            role,
            created,
            hand,
        }),
    ))
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SetRoleRequest {
    pub game_id: u64,
    pub equipe_id: String,
    pub role: Role,
}

/// Test endpoint: force a player's role (matchmaking is an external
/// collaborator in production).
#[post("/tests/role", format = "json", data = "<req>")]
pub async fn set_test_role(
    req: Json<SetRoleRequest>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Result<rocket::http::Status, ApiError> {
    let req = req.into_inner();
    let mut gs = game_state.lock().await;
    match gs.player_mut(req.game_id, &req.equipe_id) {
        Some(p) => {
            if req.role == Role::Eliminated {
                p.eliminate();
            } else {
                p.role = req.role;
            }
            Ok(rocket::http::Status::NoContent)
        }
        None => Err(Fault::not_found("player_not_in_game", "no such player").response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_running_game_reuses_the_winner() {
        let mut gs = GameState::seeded(21);
        let first = gs.ensure_running_game();
        let second = gs.ensure_running_game();
        assert_eq!(first, second);
        assert_eq!(gs.games.len(), 1);
    }

    #[test]
    fn insert_guard_rejects_second_running_game() {
        let mut gs = GameState::seeded(22);
        let first = gs.ensure_running_game();
        let loser = Game::new(999);
        assert_eq!(gs.insert_game(loser), Err(first));
    }
}
