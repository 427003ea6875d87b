//! Room registry: code generation and case-insensitive room lookup.

use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::sync::RwLock;

use crate::state::deck::CardSet;
use crate::state::game::Game;

/// Shared handle to one room's game state.
pub type RoomHandle = Arc<RwLock<Game>>;

/// Words used to build human-memorable room codes.
const CODE_WORDS: &[&str] = &[
    "MANGO", "TIGER", "PIXEL", "NOVA", "COMET", "LASER", "DISCO", "TURBO",
    "NACHO", "WAFFLE", "ROBOT", "NINJA", "PANDA", "COSMO", "BANJO", "TACO",
];

/// Registry of active rooms keyed by upper-cased room code.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Create a new room with a fresh code, drawing decks from `cards`.
    ///
    /// Returns the generated code and the room handle.
    pub fn create(&self, cards: &CardSet) -> (String, RoomHandle) {
        let code = loop {
            let candidate = generate_room_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle: RoomHandle = Arc::new(RwLock::new(Game::new(code.clone(), cards)));
        self.rooms.insert(code.clone(), handle.clone());
        (code, handle)
    }

    /// Look up a room by code, case-insensitively.
    pub fn get(&self, code: &str) -> Option<RoomHandle> {
        self.rooms
            .get(&code.to_uppercase())
            .map(|r| r.value().clone())
    }

    /// Remove a room. Returns whether it existed.
    pub fn remove(&self, code: &str) -> bool {
        self.rooms.remove(&code.to_uppercase()).is_some()
    }

    /// Number of active rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no room is registered.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Word plus a two-digit suffix, e.g. `TIGER42`.
fn generate_room_code() -> String {
    let mut rng = rand::rng();
    let word = CODE_WORDS.choose(&mut rng).copied().unwrap_or("MANGO");
    let suffix: u8 = rng.random_range(10..100);
    format!("{word}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_set() -> CardSet {
        CardSet {
            prompts: Vec::new(),
            answers: Vec::new(),
        }
    }

    #[test]
    fn generated_codes_are_word_plus_two_digits() {
        for _ in 0..50 {
            let code = generate_room_code();
            let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
            let word: String = code.chars().filter(|c| c.is_ascii_alphabetic()).collect();
            assert_eq!(digits.len(), 2);
            assert!(CODE_WORDS.contains(&word.as_str()));
            assert!(code.ends_with(&digits));
        }
    }

    #[test]
    fn create_registers_room_under_its_code() {
        let registry = RoomRegistry::new();

        let (code, _handle) = registry.create(&card_set());

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&code).is_some());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = RoomRegistry::new();
        let (code, _handle) = registry.create(&card_set());

        assert!(registry.get(&code.to_lowercase()).is_some());
        assert!(registry.get(&code).is_some());
        assert!(registry.get("UNKNOWN00").is_none());
    }

    #[test]
    fn remove_drops_the_room() {
        let registry = RoomRegistry::new();
        let (code, _handle) = registry.create(&card_set());

        assert!(registry.remove(&code.to_lowercase()));
        assert!(!registry.remove(&code));
        assert!(registry.is_empty());
    }
}
