use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

/// Player role as a sum type: the inconsistent flag combinations of a
/// boolean-based model are unrepresentable.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum Role {
    Human,
    Zombie,
    Eliminated,
}

/// One player per (game, equipe) pair.
///
/// `incoming_duel` is a weak reference: an id plus a lookup, cleared by
/// duel resolution.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Player {
    pub game_id: u64,
    pub equipe_id: String,
    pub name: String,
    pub role: Role,
    pub lives: u32,
    pub locked_in_duel: bool,
    pub incoming_duel: Option<u64>,
}

impl Player {
    pub fn new(game_id: u64, equipe_id: &str, name: &str) -> Self {
        Player {
            game_id,
            equipe_id: equipe_id.to_string(),
            name: name.to_string(),
            role: Role::Human,
            lives: 1,
            locked_in_duel: false,
            incoming_duel: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0 && self.role != Role::Eliminated
    }

    pub fn is_zombie(&self) -> bool {
        self.role == Role::Zombie
    }

    pub fn is_eliminated(&self) -> bool {
        self.role == Role::Eliminated
    }

    /// Single mutation point for elimination: eliminated implies dead,
    /// unlocked and free of duel pointers.
    pub fn eliminate(&mut self) {
        self.role = Role::Eliminated;
        self.lives = 0;
        self.locked_in_duel = false;
        self.incoming_duel = None;
    }

    /// Role conversions never resurrect an eliminated player.
    pub fn convert_to_zombie(&mut self) {
        if self.role == Role::Human {
            self.role = Role::Zombie;
        }
    }

    pub fn convert_to_human(&mut self) {
        if self.role == Role::Zombie {
            self.role = Role::Human;
        }
    }
}

/// Read-side projection of a player, as embedded in duel state views.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PlayerView {
    pub equipe_id: String,
    pub name: String,
    pub role: Role,
    pub lives: u32,
    pub is_alive: bool,
    pub locked_in_duel: bool,
    pub incoming_duel: Option<u64>,
    pub hand_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eliminate_clears_everything() {
        let mut p = Player::new(1, "red", "Red Team");
        p.role = Role::Zombie;
        p.locked_in_duel = true;
        p.incoming_duel = Some(9);
        p.eliminate();
        assert!(p.is_eliminated());
        assert!(!p.is_alive());
        assert!(!p.is_zombie());
        assert!(!p.locked_in_duel);
        assert_eq!(p.incoming_duel, None);
    }

    #[test]
    fn conversions_skip_eliminated() {
        let mut p = Player::new(1, "blue", "Blue Team");
        p.eliminate();
        p.convert_to_zombie();
        assert_eq!(p.role, Role::Eliminated);
        p.convert_to_human();
        assert_eq!(p.role, Role::Eliminated);
    }
}
