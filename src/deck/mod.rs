use rand::RngCore;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{self, CardType, CODE_SHOTGUN, CODE_ZOMBIE};
use crate::player::Role;
use crate::state::GameState;

pub mod endpoints;
pub mod token;

/// Where a card instance currently lives.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum Zone {
    Deck,
    Hand,
    Discard,
    Burn,
}

impl Zone {
    pub fn tag(&self) -> &'static str {
        match self {
            Zone::Deck => "Deck",
            Zone::Hand => "Hand",
            Zone::Discard => "Discard",
            Zone::Burn => "Burn",
        }
    }
}

/// A physical card instance. The `token` is the single-use play credential,
/// reissued on every zone/owner transition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Card {
    pub id: u64,
    pub game_id: u64,
    pub def_code: String,
    pub owner: Option<String>,
    pub zone: Zone,
    pub token: String,
}

/// Card DTO, stable across all endpoints.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CardDto {
    pub card_id: String,
    pub token: String,
    pub label: String,
    pub text: String,
    pub card_type: CardType,
    pub value: Option<u32>,
    pub is_special: bool,
}

pub const HAND_CAP: usize = 7;
pub const SPECIAL_HAND_CAP: usize = 2;
pub const DRAW_ATTEMPTS: usize = 30;
const INITIAL_NUM_TARGET: usize = 5;
const INITIAL_NUM_ATTEMPTS: usize = 50;
const INITIAL_TOPUP_ATTEMPTS: usize = 20;

/// Role-based eligibility: NUM always; ZOMBIE only for zombies;
/// VACCINE/SHOTGUN only for humans.
pub fn def_allowed_for_role(card_type: &CardType, role: &Role) -> bool {
    match card_type {
        CardType::Num => true,
        CardType::Zombie => *role == Role::Zombie,
        CardType::Shotgun | CardType::Vaccine => *role == Role::Human,
    }
}

impl GameState {
    /// Idempotent deck setup: a no-op while the game still has cards in the
    /// Deck zone, otherwise upserts the catalog and mints the fixed
    /// composition. Safe to call on every request that might need the deck.
    pub fn ensure_deck(&mut self, game_id: u64) {
        if self
            .cards
            .iter()
            .any(|c| c.game_id == game_id && c.zone == Zone::Deck)
        {
            return;
        }
        self.catalog.ensure_all();
        for (code, copies) in catalog::deck_composition() {
            for _ in 0..copies {
                self.mint_card(game_id, &code, Zone::Deck, None);
            }
        }
    }

    /// Move a card to a new zone/owner and reissue its token.
    pub fn transition_card(&mut self, card_id: u64, zone: Zone, owner: Option<String>) {
        let token = self.token_forge.mint(card_id, zone.tag(), owner.as_deref());
        if let Some(card) = self.cards.iter_mut().find(|c| c.id == card_id) {
            card.zone = zone;
            card.owner = owner;
            card.token = token;
        }
    }

    pub fn hand_card_ids(&self, game_id: u64, equipe_id: &str) -> Vec<u64> {
        self.cards
            .iter()
            .filter(|c| {
                c.game_id == game_id
                    && c.zone == Zone::Hand
                    && c.owner.as_deref() == Some(equipe_id)
            })
            .map(|c| c.id)
            .collect()
    }

    pub fn hand_size(&self, game_id: u64, equipe_id: &str) -> usize {
        self.hand_card_ids(game_id, equipe_id).len()
    }

    pub fn hand_has_code(&self, game_id: u64, equipe_id: &str, code: &str) -> bool {
        self.hand_card_ids(game_id, equipe_id)
            .iter()
            .any(|id| self.card(*id).map(|c| c.def_code == code).unwrap_or(false))
    }

    pub fn hand_special_count(&self, game_id: u64, equipe_id: &str) -> usize {
        self.hand_card_ids(game_id, equipe_id)
            .iter()
            .filter(|id| {
                self.card(**id)
                    .map(|c| catalog::card_type_of(&c.def_code).is_special())
                    .unwrap_or(false)
            })
            .count()
    }

    fn hand_num_count(&self, game_id: u64, equipe_id: &str) -> usize {
        self.hand_card_ids(game_id, equipe_id)
            .iter()
            .filter(|id| {
                self.card(**id)
                    .map(|c| catalog::card_type_of(&c.def_code) == CardType::Num)
                    .unwrap_or(false)
            })
            .count()
    }

    /// Draw one card for a player, or `None` when the draw is blocked
    /// (full hand, exhausted deck, or nothing eligible). Callers report the
    /// blocked case as `deck_empty_or_quota_blocked`, never as a hard error.
    pub fn draw_one(&mut self, game_id: u64, equipe_id: &str) -> Option<u64> {
        if self.hand_size(game_id, equipe_id) >= HAND_CAP {
            return None;
        }
        let role = self.player(game_id, equipe_id)?.role.clone();

        // Mandatory-card rule: the role guarantee is served before any
        // random draw, forging if the deck cannot supply it.
        match role {
            Role::Human if !self.hand_has_code(game_id, equipe_id, CODE_SHOTGUN) => {
                return Some(self.give_specific_from_deck_or_forge(
                    game_id,
                    equipe_id,
                    CODE_SHOTGUN,
                ));
            }
            Role::Zombie if self.hand_size(game_id, equipe_id) == 0 => {
                return Some(self.give_specific_from_deck_or_forge(
                    game_id,
                    equipe_id,
                    CODE_ZOMBIE,
                ));
            }
            _ => {}
        }

        for _ in 0..DRAW_ATTEMPTS {
            let deck: Vec<u64> = self
                .cards
                .iter()
                .filter(|c| c.game_id == game_id && c.zone == Zone::Deck)
                .map(|c| c.id)
                .collect();
            if deck.is_empty() {
                return None;
            }
            let pick = (self.rng.next_u64() as usize) % deck.len();
            let card_id = deck[pick];
            let code = match self.card(card_id) {
                Some(c) => c.def_code.clone(),
                None => continue,
            };
            let card_type = catalog::card_type_of(&code);

            // Rejected samples never left the Deck zone; resample.
            if !def_allowed_for_role(&card_type, &role) {
                continue;
            }
            if card_type == CardType::Zombie && self.hand_has_code(game_id, equipe_id, CODE_ZOMBIE)
            {
                continue;
            }
            if card_type.is_special()
                && self.hand_special_count(game_id, equipe_id) >= SPECIAL_HAND_CAP
            {
                continue;
            }

            self.transition_card(card_id, Zone::Hand, Some(equipe_id.to_string()));
            if let Some(game) = self.game_mut(game_id) {
                game.draw_count += 1;
            }
            return Some(card_id);
        }
        None
    }

    /// Find one instance of `code` still in the deck and hand it over, or
    /// forge a fresh instance straight into the hand. Deck scarcity never
    /// blocks a mandatory-card guarantee.
    pub fn give_specific_from_deck_or_forge(
        &mut self,
        game_id: u64,
        equipe_id: &str,
        code: &str,
    ) -> u64 {
        self.catalog.upsert(code);
        let in_deck = self
            .cards
            .iter()
            .find(|c| c.game_id == game_id && c.zone == Zone::Deck && c.def_code == code)
            .map(|c| c.id);
        let card_id = match in_deck {
            Some(id) => {
                self.transition_card(id, Zone::Hand, Some(equipe_id.to_string()));
                id
            }
            None => self.mint_card(game_id, code, Zone::Hand, Some(equipe_id.to_string())),
        };
        if let Some(game) = self.game_mut(game_id) {
            game.draw_count += 1;
        }
        card_id
    }

    /// Reset the player's hand and deal a fresh one: numeric cards first
    /// (at least five when the deck can supply them), topped up to seven,
    /// with the shotgun guarantee applied last.
    pub fn deal_initial_hand(&mut self, game_id: u64, equipe_id: &str) {
        for id in self.hand_card_ids(game_id, equipe_id) {
            self.transition_card(id, Zone::Deck, None);
        }

        let mut attempts = 0;
        while self.hand_num_count(game_id, equipe_id) < INITIAL_NUM_TARGET
            && attempts < INITIAL_NUM_ATTEMPTS
        {
            attempts += 1;
            let nums: Vec<u64> = self
                .cards
                .iter()
                .filter(|c| {
                    c.game_id == game_id
                        && c.zone == Zone::Deck
                        && catalog::card_type_of(&c.def_code) == CardType::Num
                })
                .map(|c| c.id)
                .collect();
            if nums.is_empty() {
                break;
            }
            let pick = (self.rng.next_u64() as usize) % nums.len();
            let card_id = nums[pick];
            self.transition_card(card_id, Zone::Hand, Some(equipe_id.to_string()));
            if let Some(game) = self.game_mut(game_id) {
                game.draw_count += 1;
            }
        }

        let mut attempts = 0;
        while self.hand_size(game_id, equipe_id) < HAND_CAP && attempts < INITIAL_TOPUP_ATTEMPTS {
            attempts += 1;
            if self.draw_one(game_id, equipe_id).is_none() {
                break;
            }
        }

        self.ensure_shotgun_for_human(game_id, equipe_id);
    }

    /// Unconditional shotgun guarantee for humans. When the guarantee
    /// pushes the hand above the cap, the lowest-value numeric card is
    /// discarded to restore it.
    pub fn ensure_shotgun_for_human(&mut self, game_id: u64, equipe_id: &str) {
        let is_human = self
            .player(game_id, equipe_id)
            .map(|p| p.role == Role::Human)
            .unwrap_or(false);
        if !is_human || self.hand_has_code(game_id, equipe_id, CODE_SHOTGUN) {
            return;
        }
        self.give_specific_from_deck_or_forge(game_id, equipe_id, CODE_SHOTGUN);

        if self.hand_size(game_id, equipe_id) > HAND_CAP {
            let lowest_num = self
                .hand_card_ids(game_id, equipe_id)
                .into_iter()
                .filter_map(|id| {
                    let card = self.card(id)?;
                    let value = catalog::num_value_from_code(&card.def_code)?;
                    Some((id, value))
                })
                .min_by_key(|(_, value)| *value);
            if let Some((card_id, _)) = lowest_num {
                self.transition_card(card_id, Zone::Discard, None);
                if let Some(game) = self.game_mut(game_id) {
                    game.discard_count += 1;
                }
            }
        }
    }

    pub fn card_dto(&self, card_id: u64) -> Option<CardDto> {
        let card = self.card(card_id)?;
        let def = self.catalog.get(&card.def_code)?;
        Some(CardDto {
            card_id: def.code.clone(),
            token: card.token.clone(),
            label: def.label.clone(),
            text: def.text.clone(),
            card_type: def.card_type.clone(),
            value: catalog::num_value_from_code(&def.code),
            is_special: def.card_type.is_special(),
        })
    }

    pub fn hand_dtos(&self, game_id: u64, equipe_id: &str) -> Vec<CardDto> {
        self.hand_card_ids(game_id, equipe_id)
            .into_iter()
            .filter_map(|id| self.card_dto(id))
            .collect()
    }
}
