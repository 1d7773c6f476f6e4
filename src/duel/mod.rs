use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{self, CardType};
use crate::deck::Zone;
use crate::event_log::EventPayload;
use crate::player::PlayerView;
use crate::state::{now_millis, GameState};
use crate::status_messages::Fault;

pub mod endpoints;
pub mod resolve;

/// A player may post at most this many numeric cards into one duel;
/// specials are exempt because they terminate the duel on their own.
pub const MAX_NUMERIC_ROUNDS: u32 = 4;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum DuelStatus {
    Pending,
    Resolved,
}

/// A pairing of two players. `player_a` is the challenger, `player_b` the
/// target; the pair is unordered for uniqueness purposes but stable across
/// reads. `winner == None` encodes both "unresolved" and "tie".
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Duel {
    pub id: u64,
    pub game_id: u64,
    pub player_a: String,
    pub player_b: String,
    pub status: DuelStatus,
    pub winner: Option<String>,
    pub created_at: u64,
    pub resolved_at: Option<u64>,
    pub logs: Vec<String>,
    pub effects: Vec<String>,
    pub won_card_code: Option<String>,
    pub won_card_label: Option<String>,
}

impl Duel {
    pub fn involves(&self, equipe_id: &str) -> bool {
        self.player_a == equipe_id || self.player_b == equipe_id
    }

    pub fn is_pair(&self, a: &str, b: &str) -> bool {
        (self.player_a == a && self.player_b == b) || (self.player_a == b && self.player_b == a)
    }

    pub fn opponent_of(&self, equipe_id: &str) -> Option<&str> {
        if self.player_a == equipe_id {
            Some(&self.player_b)
        } else if self.player_b == equipe_id {
            Some(&self.player_a)
        } else {
            None
        }
    }
}

/// One submitted card. Immutable once recorded; `card_id` is an audit-only
/// reference to the physical instance. `submit_seq` orders submissions
/// across both players, which is what "last-submitted special" means.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct DuelPlay {
    pub duel_id: u64,
    pub equipe_id: String,
    pub card_id: Option<u64>,
    pub card_code: String,
    pub card_type: CardType,
    pub num_value: Option<u32>,
    pub round_index: u32,
    pub submitted_at: u64,
    pub submit_seq: u64,
}

/// Typed conflict reported by the duel insert guard, carrying the id of
/// the pending duel that already occupies the slot.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DuelInsertConflict {
    PairPending(u64),
    PlayerPending(u64),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StartDuelOutcome {
    pub duel_id: u64,
    pub created: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct TargetValidation {
    pub valid: bool,
    pub target: PlayerView,
    pub duel_id: Option<u64>,
    pub message: String,
}

impl GameState {
    pub fn duel(&self, duel_id: u64) -> Option<&Duel> {
        self.duels.iter().find(|d| d.id == duel_id)
    }

    pub fn duel_mut(&mut self, duel_id: u64) -> Option<&mut Duel> {
        self.duels.iter_mut().find(|d| d.id == duel_id)
    }

    pub fn find_pending_duel_for_pair(&self, game_id: u64, a: &str, b: &str) -> Option<u64> {
        self.duels
            .iter()
            .find(|d| d.game_id == game_id && d.status == DuelStatus::Pending && d.is_pair(a, b))
            .map(|d| d.id)
    }

    pub fn find_pending_duel_involving(&self, game_id: u64, equipe_id: &str) -> Option<u64> {
        self.duels
            .iter()
            .find(|d| {
                d.game_id == game_id && d.status == DuelStatus::Pending && d.involves(equipe_id)
            })
            .map(|d| d.id)
    }

    /// Uniqueness guard: at most one pending duel per unordered pair, and
    /// at most one pending duel per player. A colliding insert reports the
    /// duel that already holds the slot instead of writing a duplicate.
    pub fn insert_duel(&mut self, duel: Duel) -> Result<u64, DuelInsertConflict> {
        if let Some(id) =
            self.find_pending_duel_for_pair(duel.game_id, &duel.player_a, &duel.player_b)
        {
            return Err(DuelInsertConflict::PairPending(id));
        }
        for participant in [&duel.player_a, &duel.player_b] {
            if let Some(id) = self.find_pending_duel_involving(duel.game_id, participant) {
                return Err(DuelInsertConflict::PlayerPending(id));
            }
        }
        let id = duel.id;
        self.duels.push(duel);
        Ok(id)
    }

    /// Lock both participants and point the target's incoming-duel marker
    /// at the duel. Re-applied on idempotent re-entry so the flags stay in
    /// sync even if a previous request half-completed.
    pub fn lock_pair_for_duel(&mut self, duel_id: u64) {
        let Some(duel) = self.duel(duel_id) else {
            return;
        };
        let (game_id, source, target) = (
            duel.game_id,
            duel.player_a.clone(),
            duel.player_b.clone(),
        );
        if let Some(p) = self.player_mut(game_id, &source) {
            p.locked_in_duel = true;
        }
        if let Some(p) = self.player_mut(game_id, &target) {
            p.locked_in_duel = true;
            p.incoming_duel = Some(duel_id);
        }
    }

    /// Create or re-enter a duel between `source` and `target`.
    ///
    /// The anti-duplicate rules run in three layers: an idempotent pair
    /// lookup, the per-player pending check, and the insert guard with its
    /// reload-and-reuse recovery. Whatever interleaving wins a race, both
    /// callers end up with the same duel id.
    pub fn start_duel(
        &mut self,
        game_id: u64,
        source: &str,
        target: &str,
    ) -> Result<StartDuelOutcome, Fault> {
        self.game(game_id)
            .ok_or_else(|| Fault::not_found("game_not_found", "no such game"))?;
        let src = self
            .player(game_id, source)
            .ok_or_else(|| Fault::not_found("source_invalid", "source player not in game"))?;
        let src_alive = src.is_alive();
        let tgt = self
            .player(game_id, target)
            .ok_or_else(|| Fault::not_found("target_invalid", "target player not in game"))?;
        if source == target {
            return Err(Fault::bad_request(
                "target_invalid",
                "a player cannot duel themselves",
            ));
        }
        if !src_alive || !tgt.is_alive() {
            return Err(Fault::bad_request(
                "player_dead",
                "both players must be alive to duel",
            ));
        }

        if let Some(id) = self.find_pending_duel_for_pair(game_id, source, target) {
            self.lock_pair_for_duel(id);
            return Ok(StartDuelOutcome {
                duel_id: id,
                created: false,
            });
        }

        for participant in [source, target] {
            if self.find_pending_duel_involving(game_id, participant).is_some() {
                return Err(Fault::conflict(
                    "player_already_in_pending_duel",
                    format!("{participant} is already engaged in a pending duel"),
                ));
            }
        }

        let duel = Duel {
            id: self.mint_duel_id(),
            game_id,
            player_a: source.to_string(),
            player_b: target.to_string(),
            status: DuelStatus::Pending,
            winner: None,
            created_at: now_millis(),
            resolved_at: None,
            logs: Vec::new(),
            effects: Vec::new(),
            won_card_code: None,
            won_card_label: None,
        };
        match self.insert_duel(duel) {
            Ok(id) => {
                self.lock_pair_for_duel(id);
                self.event_log.append(
                    "DuelStarted",
                    EventPayload::DuelStarted {
                        duel_id: id,
                        source: source.to_string(),
                        target: target.to_string(),
                    },
                );
                log::info!("duel {id} started: {source} vs {target}");
                Ok(StartDuelOutcome {
                    duel_id: id,
                    created: true,
                })
            }
            Err(_) => {
                // Lost a creation race: reload and reuse the duel that
                // committed first rather than surfacing the collision.
                if let Some(id) = self.find_pending_duel_for_pair(game_id, source, target) {
                    self.lock_pair_for_duel(id);
                    return Ok(StartDuelOutcome {
                        duel_id: id,
                        created: false,
                    });
                }
                if let Some(id) = self
                    .find_pending_duel_involving(game_id, source)
                    .or_else(|| self.find_pending_duel_involving(game_id, target))
                {
                    return Ok(StartDuelOutcome {
                        duel_id: id,
                        created: false,
                    });
                }
                Err(Fault::conflict(
                    "duel_conflict",
                    "concurrent duel creation could not be reconciled",
                ))
            }
        }
    }

    /// Read-side target check; with a duel id it additionally verifies
    /// membership and re-marks the incoming-duel pointer and locks.
    pub fn validate_target(
        &mut self,
        game_id: u64,
        actor: &str,
        target: &str,
        duel_id: Option<u64>,
    ) -> Result<TargetValidation, Fault> {
        self.game(game_id)
            .ok_or_else(|| Fault::not_found("game_not_found", "no such game"))?;
        self.player(game_id, actor)
            .ok_or_else(|| Fault::not_found("player_not_in_game", "actor not in game"))?;
        let tgt = self
            .player(game_id, target)
            .ok_or_else(|| Fault::not_found("target_not_found", "target not in game"))?;
        if actor == target {
            return Err(Fault::bad_request(
                "self_target",
                "you cannot target yourself",
            ));
        }
        if !tgt.is_alive() {
            return Err(Fault::bad_request(
                "target_eliminated",
                "target is already out of the game",
            ));
        }

        if let Some(did) = duel_id {
            let duel = self
                .duel(did)
                .ok_or_else(|| Fault::not_found("duel_not_found", "no such duel"))?;
            if duel.game_id != game_id {
                return Err(Fault::bad_request(
                    "duel_game_mismatch",
                    "duel belongs to another game",
                ));
            }
            if duel.status != DuelStatus::Pending {
                return Err(Fault::bad_request("duel_not_pending", "duel already resolved"));
            }
            if !duel.is_pair(actor, target) {
                return Err(Fault::bad_request(
                    "duel_players_mismatch",
                    "actor and target are not this duel's participants",
                ));
            }
            if let Some(p) = self.player_mut(game_id, actor) {
                p.locked_in_duel = true;
            }
            if let Some(p) = self.player_mut(game_id, target) {
                p.locked_in_duel = true;
                p.incoming_duel = Some(did);
            }
        }

        let view = self
            .player_view(game_id, target)
            .ok_or_else(|| Fault::not_found("target_not_found", "target not in game"))?;
        Ok(TargetValidation {
            valid: true,
            target: view,
            duel_id,
            message: "target is valid".to_string(),
        })
    }

    pub fn plays_for_duel(&self, duel_id: u64) -> Vec<DuelPlay> {
        let mut plays: Vec<DuelPlay> = self
            .plays
            .iter()
            .filter(|p| p.duel_id == duel_id)
            .cloned()
            .collect();
        plays.sort_by_key(|p| p.submit_seq);
        plays
    }

    fn numeric_play_count(&self, duel_id: u64, equipe_id: &str) -> u32 {
        self.plays
            .iter()
            .filter(|p| {
                p.duel_id == duel_id && p.equipe_id == equipe_id && p.card_type == CardType::Num
            })
            .count() as u32
    }

    /// Record one submitted card: the capability token is consumed, the
    /// card leaves the hand, and an immutable play row is appended.
    pub fn submit_card(
        &mut self,
        duel_id: u64,
        equipe_id: &str,
        card_token: &str,
    ) -> Result<DuelPlay, Fault> {
        let duel = self
            .duel(duel_id)
            .ok_or_else(|| Fault::not_found("duel_not_found", "no such duel"))?;
        let game_id = duel.game_id;
        if self.player(game_id, equipe_id).is_none() {
            return Err(Fault::not_found("player_not_in_game", "player not in game"));
        }
        if !duel.involves(equipe_id) {
            return Err(Fault::bad_request(
                "player_not_in_duel",
                "player is not a participant of this duel",
            ));
        }
        if duel.status != DuelStatus::Pending {
            return Err(Fault::bad_request("duel_not_pending", "duel already resolved"));
        }
        let opponent = duel
            .opponent_of(equipe_id)
            .map(str::to_string)
            .ok_or_else(|| Fault::not_found("opponent_not_found", "no opponent in duel"))?;
        if self.player(game_id, &opponent).is_none() {
            return Err(Fault::not_found("opponent_not_found", "opponent not in game"));
        }

        let card_id = self
            .find_hand_card_by_token(game_id, equipe_id, card_token)
            .ok_or_else(|| {
                Fault::not_found("card_not_found_in_hand", "no such card in your hand")
            })?;
        let code = match self.card(card_id) {
            Some(c) => c.def_code.clone(),
            None => return Err(Fault::not_found("card_not_found_in_hand", "card vanished")),
        };
        let def = self
            .catalog
            .get(&code)
            .ok_or_else(|| Fault::not_found("card_def_not_found", "unknown card definition"))?;
        let card_type = def.card_type.clone();
        let num_value = catalog::num_value_from_code(&code);

        if card_type == CardType::Num
            && self.numeric_play_count(duel_id, equipe_id) >= MAX_NUMERIC_ROUNDS
        {
            return Err(Fault::conflict(
                "max_rounds_reached_for_player",
                format!("at most {MAX_NUMERIC_ROUNDS} numeric cards per player per duel"),
            ));
        }

        let round_index = self
            .plays
            .iter()
            .filter(|p| p.duel_id == duel_id && p.equipe_id == equipe_id)
            .count() as u32
            + 1;
        let submit_seq = self.mint_play_seq();
        let play = DuelPlay {
            duel_id,
            equipe_id: equipe_id.to_string(),
            card_id: Some(card_id),
            card_code: code.clone(),
            card_type,
            num_value,
            round_index,
            submitted_at: now_millis(),
            submit_seq,
        };
        self.plays.push(play.clone());

        // The played card leaves the hand immediately; its stale token can
        // never replay.
        self.transition_card(card_id, Zone::Discard, None);
        if let Some(game) = self.game_mut(game_id) {
            game.discard_count += 1;
        }
        self.event_log.append(
            "CardSubmitted",
            EventPayload::CardSubmitted {
                duel_id,
                equipe_id: equipe_id.to_string(),
                card_code: code,
                round_index,
            },
        );
        Ok(play)
    }
}
