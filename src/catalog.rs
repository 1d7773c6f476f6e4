use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

pub const CODE_ZOMBIE: &str = "ZOMBIE";
pub const CODE_SHOTGUN: &str = "SHOTGUN";
pub const CODE_VACCINE: &str = "VACCINE";

/// The four card families of the duel game.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub enum CardType {
    Num,
    Zombie,
    Shotgun,
    Vaccine,
}

impl CardType {
    /// Specials terminate a duel the moment they are played.
    pub fn is_special(&self) -> bool {
        !matches!(self, CardType::Num)
    }
}

/// Immutable catalog entry. Created once at game setup, never mutated.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CardDefinition {
    pub code: String,
    pub label: String,
    pub text: String,
    pub card_type: CardType,
}

pub fn card_type_of(code: &str) -> CardType {
    match code {
        CODE_ZOMBIE => CardType::Zombie,
        CODE_SHOTGUN => CardType::Shotgun,
        CODE_VACCINE => CardType::Vaccine,
        _ => CardType::Num,
    }
}

/// Extract the numeric value carried in a card code (`NUM_7` -> 7).
pub fn num_value_from_code(code: &str) -> Option<u32> {
    if card_type_of(code) != CardType::Num {
        return None;
    }
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

pub fn num_code(value: u32) -> String {
    format!("NUM_{value}")
}

fn definition_for(code: &str) -> CardDefinition {
    match code {
        CODE_ZOMBIE => CardDefinition {
            code: code.to_string(),
            label: "Zombie".to_string(),
            text: "Played by a zombie against a human: the victim joins the horde."
                .to_string(),
            card_type: CardType::Zombie,
        },
        CODE_SHOTGUN => CardDefinition {
            code: code.to_string(),
            label: "Shotgun".to_string(),
            text: "Eliminates a zombie opponent on the spot; against a human it only robs their best number.".to_string(),
            card_type: CardType::Shotgun,
        },
        CODE_VACCINE => CardDefinition {
            code: code.to_string(),
            label: "Vaccine".to_string(),
            text: "Cures a zombie opponent back to humanity.".to_string(),
            card_type: CardType::Vaccine,
        },
        _ => {
            let value = num_value_from_code(code).unwrap_or(0);
            CardDefinition {
                code: code.to_string(),
                label: format!("Number {value}"),
                text: format!("Worth {value} points in a duel."),
                card_type: CardType::Num,
            }
        }
    }
}

/// Fixed deck composition minted per game: 8 copies of each NUM_1..NUM_10,
/// 4 ZOMBIE, 10 VACCINE, 10 SHOTGUN.
pub fn deck_composition() -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = (1..=10).map(|n| (num_code(n), 8)).collect();
    out.push((CODE_ZOMBIE.to_string(), 4));
    out.push((CODE_VACCINE.to_string(), 10));
    out.push((CODE_SHOTGUN.to_string(), 10));
    out
}

/// Registry of all card definitions, keyed by code.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    defs: Vec<CardDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog { defs: Vec::new() }
    }

    /// Idempotent upsert by code. Unknown codes get a synthesized entry so
    /// `give_specific_from_deck_or_forge` can never miss a definition.
    pub fn upsert(&mut self, code: &str) {
        if self.defs.iter().any(|d| d.code == code) {
            return;
        }
        self.defs.push(definition_for(code));
    }

    /// Upsert the full catalog used by the fixed deck composition.
    pub fn ensure_all(&mut self) {
        for (code, _) in deck_composition() {
            self.upsert(&code);
        }
    }

    pub fn get(&self, code: &str) -> Option<&CardDefinition> {
        self.defs.iter().find(|d| d.code == code)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_value_extraction() {
        assert_eq!(num_value_from_code("NUM_7"), Some(7));
        assert_eq!(num_value_from_code("NUM_10"), Some(10));
        assert_eq!(num_value_from_code(CODE_ZOMBIE), None);
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut catalog = Catalog::new();
        catalog.upsert(CODE_SHOTGUN);
        catalog.upsert(CODE_SHOTGUN);
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get(CODE_SHOTGUN).map(|d| d.card_type.clone()),
            Some(CardType::Shotgun)
        );
    }

    #[test]
    fn composition_totals() {
        let total: usize = deck_composition().iter().map(|(_, n)| n).sum();
        assert_eq!(total, 104);
    }
}
