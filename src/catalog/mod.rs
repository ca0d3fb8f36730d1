//! Card catalog: immutable combatant definitions plus a normalized-key lookup.
//! Keys are built from each card's id, name and image token; the first card to claim a
//! key keeps it.

pub mod cards;
pub mod loader;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub use cards::builtin_cards;
pub use loader::{catalog_from_path, load_catalog_file, CatalogFile, DEFAULT_CATALOG_PATH};

pub const DEFAULT_PLAYER_NAME: &str = "Fang";
pub const DEFAULT_ENEMY_NAME: &str = "Pearl";
pub const MAX_ATTACKS_PER_TURN: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyClass {
    Tank,
    Normal,
    Glass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    Shotgun,
    Sniper,
    Burst,
    Rapid,
    Melee,
    MultiHit,
    Spray,
}

fn default_attacks_per_turn() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: u32,
    pub name: String,
    pub image: String,
    pub health: u32,
    pub attack: u32,
    #[serde(default = "default_attacks_per_turn")]
    pub attacks_per_turn: u32,
    pub body_class: BodyClass,
    pub weapon_type: WeaponType,
}

impl CardDefinition {
    /// Image file name without its extension (`bs_pearl.png` -> `bs_pearl`).
    pub fn image_token(&self) -> &str {
        match self.image.rfind('.') {
            Some(dot) if dot > 0 => &self.image[..dot],
            _ => &self.image,
        }
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Empty,
    DuplicateId(u32),
    InvalidCard { id: u32, reason: &'static str },
    InvalidTiming(ConfigError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read catalog: {err}"),
            Self::Parse(err) => write!(f, "invalid catalog json: {err}"),
            Self::Empty => write!(f, "catalog contains no cards"),
            Self::DuplicateId(id) => write!(f, "duplicate card id {id}"),
            Self::InvalidCard { id, reason } => write!(f, "card {id}: {reason}"),
            Self::InvalidTiming(err) => write!(f, "catalog {err}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidTiming(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ConfigError> for CatalogError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidTiming(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

/// Normalize a lookup key: lowercase, then drop everything outside `[a-z0-9]`.
pub fn normalize_card_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect()
}

fn index_keys(cards: &[CardDefinition]) -> HashMap<String, usize> {
    let mut keys = HashMap::new();
    for (index, card) in cards.iter().enumerate() {
        let id_key = card.id.to_string();
        for raw in [id_key.as_str(), card.name.as_str(), card.image_token()] {
            let key = normalize_card_key(raw);
            if !key.is_empty() {
                keys.entry(key).or_insert(index);
            }
        }
    }
    keys
}

#[derive(Debug, Clone)]
pub struct CardCatalog {
    cards: Vec<CardDefinition>,
    /// Normalized key -> index into `cards`.
    keys: HashMap<String, usize>,
}

impl CardCatalog {
    pub fn new(cards: Vec<CardDefinition>) -> Result<Self, CatalogError> {
        if cards.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, card) in cards.iter().enumerate() {
            if card.health == 0 {
                return Err(CatalogError::InvalidCard {
                    id: card.id,
                    reason: "health must be positive",
                });
            }
            if card.attacks_per_turn == 0 || card.attacks_per_turn > MAX_ATTACKS_PER_TURN {
                return Err(CatalogError::InvalidCard {
                    id: card.id,
                    reason: "attacks_per_turn must be between 1 and 64",
                });
            }
            if cards[..index].iter().any(|other| other.id == card.id) {
                return Err(CatalogError::DuplicateId(card.id));
            }
        }

        Ok(Self {
            keys: index_keys(&cards),
            cards,
        })
    }

    /// The built-in roster. It is known-valid, so validation is skipped.
    pub fn builtin() -> Self {
        let cards = builtin_cards();
        Self {
            keys: index_keys(&cards),
            cards,
        }
    }

    /// Resolve a card by id, name or image token. Empty or unmatched input yields `None`.
    pub fn lookup(&self, key: &str) -> Option<&CardDefinition> {
        let normalized = normalize_card_key(key);
        if normalized.is_empty() {
            return None;
        }
        self.keys.get(&normalized).map(|&index| &self.cards[index])
    }

    pub fn by_id(&self, id: u32) -> Option<&CardDefinition> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn cards(&self) -> &[CardDefinition] {
        &self.cards
    }

    pub fn default_player(&self) -> &CardDefinition {
        self.cards
            .iter()
            .find(|card| card.name == DEFAULT_PLAYER_NAME)
            .unwrap_or(&self.cards[0])
    }

    pub fn default_enemy(&self) -> &CardDefinition {
        self.cards
            .iter()
            .find(|card| card.name == DEFAULT_ENEMY_NAME)
            .or_else(|| self.cards.get(1))
            .unwrap_or_else(|| self.default_player())
    }
}

impl Default for CardCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
