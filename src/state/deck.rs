//! Card types and shuffled draw-pile construction.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// An answer card held in a player's hand and submitted against a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCard {
    /// Identifier unique within the deck, including custom additions.
    pub id: String,
    /// Card text shown to players.
    pub text: String,
    /// Whether the card was contributed by a player rather than the dataset.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_custom: bool,
}

/// A prompt card that opens a round and dictates how many answers to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCard {
    /// Identifier unique within the deck, including custom additions.
    pub id: String,
    /// Fill-in-the-blank text shown to players.
    pub text: String,
    /// Number of answer cards a submission must contain (1 to 3).
    pub pick: u8,
}

/// The full card dataset a room draws its decks from.
#[derive(Debug, Clone)]
pub struct CardSet {
    /// Prompt cards available to the room.
    pub prompts: Vec<PromptCard>,
    /// Answer cards available to the room.
    pub answers: Vec<AnswerCard>,
}

impl CardSet {
    /// Build a randomly ordered prompt draw pile. Cards are drawn from the
    /// front of the deque and returned to the back.
    pub fn shuffled_prompt_deck(&self) -> VecDeque<PromptCard> {
        shuffled(&self.prompts)
    }

    /// Build a randomly ordered answer draw pile.
    pub fn shuffled_answer_deck(&self) -> VecDeque<AnswerCard> {
        shuffled(&self.answers)
    }
}

/// Uniform Fisher–Yates shuffle into a fresh draw pile.
pub fn shuffled<T: Clone>(cards: &[T]) -> VecDeque<T> {
    let mut pile: Vec<T> = cards.to_vec();
    pile.shuffle(&mut rand::rng());
    pile.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(n: usize) -> Vec<AnswerCard> {
        (0..n)
            .map(|i| AnswerCard {
                id: format!("a{i}"),
                text: format!("answer {i}"),
                is_custom: false,
            })
            .collect()
    }

    #[test]
    fn shuffled_deck_keeps_every_card() {
        let set = CardSet {
            prompts: Vec::new(),
            answers: answers(40),
        };

        let deck = set.shuffled_answer_deck();

        assert_eq!(deck.len(), 40);
        for card in &set.answers {
            assert!(deck.iter().any(|c| c.id == card.id));
        }
    }

    #[test]
    fn shuffled_deck_of_empty_set_is_empty() {
        let set = CardSet {
            prompts: Vec::new(),
            answers: Vec::new(),
        };

        assert!(set.shuffled_prompt_deck().is_empty());
        assert!(set.shuffled_answer_deck().is_empty());
    }
}
