use rand::SeedableRng;
use rand_pcg::Lcg64Xsh32;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::deck::token::TokenForge;
use crate::deck::{Card, Zone};
use crate::duel::{Duel, DuelPlay};
use crate::event_log::EventLog;
use crate::game::Game;
use crate::player::{Player, PlayerView};

pub fn now_millis() -> u64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(dur) => dur.as_millis() as u64,
        Err(_) => 0,
    }
}

/// The shared in-memory store behind every request handler.
///
/// The uniqueness guards on duel/game insertion play the role the storage
/// layer's unique constraints play in a database-backed deployment; callers
/// run the reload-and-reuse recovery paths on top of them.
#[derive(Debug)]
pub struct GameState {
    pub games: Vec<Game>,
    pub players: Vec<Player>,
    pub cards: Vec<Card>,
    pub duels: Vec<Duel>,
    pub plays: Vec<DuelPlay>,
    pub catalog: Catalog,
    pub event_log: Arc<EventLog>,
    pub rng: Lcg64Xsh32,
    pub token_forge: TokenForge,
    next_game_id: u64,
    next_card_id: u64,
    next_duel_id: u64,
    next_play_seq: u64,
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            games: Vec::new(),
            players: Vec::new(),
            cards: Vec::new(),
            duels: Vec::new(),
            plays: Vec::new(),
            catalog: Catalog::new(),
            event_log: Arc::new(EventLog::new()),
            rng: Lcg64Xsh32::from_entropy(),
            token_forge: TokenForge::from_env(),
            next_game_id: 0,
            next_card_id: 0,
            next_duel_id: 0,
            next_play_seq: 0,
        }
    }

    /// Deterministic state for tests and reseeding.
    pub fn seeded(seed: u64) -> Self {
        let mut gs = GameState::new();
        gs.reseed(seed);
        gs
    }

    pub fn reseed(&mut self, seed: u64) {
        let mut seed_bytes = [0u8; 16];
        seed_bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        seed_bytes[8..16].copy_from_slice(&seed.to_le_bytes());
        self.rng = Lcg64Xsh32::from_seed(seed_bytes);
    }

    pub fn mint_game_id(&mut self) -> u64 {
        self.next_game_id += 1;
        self.next_game_id
    }

    pub fn mint_duel_id(&mut self) -> u64 {
        self.next_duel_id += 1;
        self.next_duel_id
    }

    pub fn mint_play_seq(&mut self) -> u64 {
        self.next_play_seq += 1;
        self.next_play_seq
    }

    pub fn game(&self, game_id: u64) -> Option<&Game> {
        self.games.iter().find(|g| g.id == game_id)
    }

    pub fn game_mut(&mut self, game_id: u64) -> Option<&mut Game> {
        self.games.iter_mut().find(|g| g.id == game_id)
    }

    pub fn player(&self, game_id: u64, equipe_id: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.game_id == game_id && p.equipe_id == equipe_id)
    }

    pub fn player_mut(&mut self, game_id: u64, equipe_id: &str) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.game_id == game_id && p.equipe_id == equipe_id)
    }

    /// Register the (game, equipe) pair on first join. Returns true when a
    /// new player was created; re-joins leave existing state untouched.
    pub fn ensure_player(&mut self, game_id: u64, equipe_id: &str, name: &str) -> bool {
        if self.player(game_id, equipe_id).is_some() {
            return false;
        }
        self.players.push(Player::new(game_id, equipe_id, name));
        true
    }

    pub fn card(&self, card_id: u64) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn mint_card(
        &mut self,
        game_id: u64,
        code: &str,
        zone: Zone,
        owner: Option<String>,
    ) -> u64 {
        self.next_card_id += 1;
        let id = self.next_card_id;
        let token = self.token_forge.mint(id, zone.tag(), owner.as_deref());
        self.cards.push(Card {
            id,
            game_id,
            def_code: code.to_string(),
            owner,
            zone,
            token,
        });
        id
    }

    /// Resolve a play credential: only a card currently in this player's
    /// hand, carrying exactly this token, is playable.
    pub fn find_hand_card_by_token(
        &self,
        game_id: u64,
        equipe_id: &str,
        token: &str,
    ) -> Option<u64> {
        self.cards
            .iter()
            .find(|c| {
                c.game_id == game_id
                    && c.zone == Zone::Hand
                    && c.owner.as_deref() == Some(equipe_id)
                    && c.token == token
            })
            .map(|c| c.id)
    }

    pub fn player_view(&self, game_id: u64, equipe_id: &str) -> Option<PlayerView> {
        let p = self.player(game_id, equipe_id)?;
        Some(PlayerView {
            equipe_id: p.equipe_id.clone(),
            name: p.name.clone(),
            role: p.role.clone(),
            lives: p.lives,
            is_alive: p.is_alive(),
            locked_in_duel: p.locked_in_duel,
            incoming_duel: p.incoming_duel,
            hand_size: self.hand_size(game_id, equipe_id),
        })
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
