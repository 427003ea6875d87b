//! Authoritative per-room game state machine.
//!
//! A [`Game`] owns everything about one room: roster, phase, draw piles,
//! the current prompt, submissions, and scoring. Every mutation goes
//! through one of its operations; each operation validates against the
//! current phase first and leaves state untouched when it refuses.

use std::collections::VecDeque;

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use uuid::Uuid;

use crate::state::deck::{AnswerCard, CardSet, PromptCard};

/// Number of answer cards a player holds between rounds.
pub const HAND_SIZE: usize = 10;
/// Score a player must reach to win the game.
pub const DEFAULT_MAX_SCORE: u32 = 7;
/// Minimum roster size required to start or continue a game.
pub const MIN_PLAYERS: usize = 3;
/// Maximum roster size; joins beyond this are rejected.
pub const MAX_PLAYERS: usize = 8;

/// High-level phases a room moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Waiting for players; joins, leaves, and custom cards allowed.
    Lobby,
    /// Non-judge players are submitting answer cards.
    Playing,
    /// The judge is picking the winning submission.
    Judging,
    /// The winning submission is shown before the next round.
    Reveal,
    /// Terminal: score threshold reached, roster too small, or deck exhausted.
    Ended,
}

/// One player's state inside a room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Stable identity assigned at join time, immutable for the player's
    /// lifetime in the room. Independent of any transport connection id.
    pub id: Uuid,
    /// Display name, unique within the room case-insensitively.
    pub name: String,
    /// Rounds won so far.
    pub score: u32,
    /// Answer cards currently dealt to this player.
    pub hand: Vec<AnswerCard>,
    /// Whether this player may start games and advance rounds.
    pub is_host: bool,
    /// Transport-level liveness flag, toggled by the connection layer.
    pub is_connected: bool,
}

/// One player's answer cards for the current round.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Submitting player.
    pub player_id: Uuid,
    /// Exactly `pick` cards, in the order the player chose them.
    pub cards: Vec<AnswerCard>,
}

/// A player-contributed card returned by [`Game::add_custom_card`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CustomCard {
    /// A new prompt card.
    Prompt(PromptCard),
    /// A new answer card.
    Answer(AnswerCard),
}

/// Which deck a custom card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    /// Prompt deck.
    Prompt,
    /// Answer deck.
    Answer,
}

/// Authoritative state for one room.
#[derive(Debug)]
pub struct Game {
    room_code: String,
    phase: GamePhase,
    players: IndexMap<Uuid, Player>,
    current_judge: Option<Uuid>,
    current_prompt: Option<PromptCard>,
    submissions: Vec<Submission>,
    winning_submission: Option<Submission>,
    round_number: u32,
    max_score: u32,
    custom_answer_cards: Vec<AnswerCard>,
    custom_prompt_cards: Vec<PromptCard>,
    prompt_deck: VecDeque<PromptCard>,
    answer_deck: VecDeque<AnswerCard>,
}

impl Game {
    /// Build an empty lobby for `room_code`, drawing its decks from `cards`.
    pub fn new(room_code: String, cards: &CardSet) -> Self {
        Self {
            room_code,
            phase: GamePhase::Lobby,
            players: IndexMap::new(),
            current_judge: None,
            current_prompt: None,
            submissions: Vec::new(),
            winning_submission: None,
            round_number: 0,
            max_score: DEFAULT_MAX_SCORE,
            custom_answer_cards: Vec::new(),
            custom_prompt_cards: Vec::new(),
            prompt_deck: cards.shuffled_prompt_deck(),
            answer_deck: cards.shuffled_answer_deck(),
        }
    }

    /// Room code this game is registered under.
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Current round, starting at 1 once the game starts.
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    /// Score threshold that ends the game.
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Stable id of the current judge, if a round is under way.
    pub fn current_judge(&self) -> Option<Uuid> {
        self.current_judge
    }

    /// Prompt card for the current round.
    pub fn current_prompt(&self) -> Option<&PromptCard> {
        self.current_prompt.as_ref()
    }

    /// Submissions recorded so far this round.
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// The submission the judge picked this round, if any.
    pub fn winning_submission(&self) -> Option<&Submission> {
        self.winning_submission.as_ref()
    }

    /// Roster in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Look up a player by stable id.
    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Number of players currently in the room.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Stable ids of every player, in roster order.
    pub fn player_ids(&self) -> Vec<Uuid> {
        self.players.keys().copied().collect()
    }

    /// Whether `id` identifies the room's host.
    pub fn is_host(&self, id: Uuid) -> bool {
        self.players.get(&id).is_some_and(|p| p.is_host)
    }

    /// The player with the highest score, used to name a winner when the
    /// game ends without anyone reaching `max_score`.
    pub fn leading_player(&self) -> Option<&Player> {
        self.players.values().max_by_key(|p| p.score)
    }

    /// Add a player to the lobby.
    ///
    /// Returns `None` without mutating when the game already started, the
    /// room is full, or the name is taken (case-insensitively).
    pub fn add_player(&mut self, id: Uuid, name: &str, is_host: bool) -> Option<&Player> {
        if self.phase != GamePhase::Lobby {
            return None;
        }
        if self.players.len() >= MAX_PLAYERS {
            return None;
        }
        if self
            .players
            .values()
            .any(|p| p.name.eq_ignore_ascii_case(name))
        {
            return None;
        }

        let player = Player {
            id,
            name: name.to_owned(),
            score: 0,
            hand: Vec::new(),
            is_host,
            is_connected: true,
        };
        self.players.insert(id, player);
        self.players.get(&id)
    }

    /// Remove a player, returning their hand to the bottom of the answer
    /// pile so the cards stay in circulation without being redealt at once.
    ///
    /// Dropping below [`MIN_PLAYERS`] mid-game ends the game. Removing the
    /// current judge advances the round through [`Game::next_round`] so no
    /// orphaned judge reference survives.
    pub fn remove_player(&mut self, id: Uuid) -> bool {
        let Some(player) = self.players.shift_remove(&id) else {
            return false;
        };

        self.answer_deck.extend(player.hand);

        if self.phase != GamePhase::Lobby && self.players.len() < MIN_PLAYERS {
            self.phase = GamePhase::Ended;
        }

        if self.current_judge == Some(id) && self.phase != GamePhase::Ended {
            let _ = self.next_round();
        }

        true
    }

    /// Mark a player as disconnected without removing them.
    pub fn disconnect_player(&mut self, id: Uuid) -> Option<&Player> {
        let player = self.players.get_mut(&id)?;
        player.is_connected = false;
        self.players.get(&id)
    }

    /// Flip a disconnected player back to connected.
    pub fn reconnect_player(&mut self, id: Uuid) -> Option<&Player> {
        let player = self.players.get_mut(&id)?;
        player.is_connected = true;
        self.players.get(&id)
    }

    /// Start the game from the lobby.
    ///
    /// Merges custom cards into both piles, reshuffles, deals every player
    /// a full hand, picks a random judge, and draws the first prompt.
    pub fn start_game(&mut self) -> bool {
        if self.phase != GamePhase::Lobby {
            return false;
        }
        if self.players.len() < MIN_PLAYERS {
            return false;
        }

        self.answer_deck
            .extend(self.custom_answer_cards.iter().cloned());
        self.prompt_deck
            .extend(self.custom_prompt_cards.iter().cloned());
        self.answer_deck.make_contiguous().shuffle(&mut rand::rng());
        self.prompt_deck.make_contiguous().shuffle(&mut rand::rng());

        for player in self.players.values_mut() {
            player.hand = draw(&mut self.answer_deck, HAND_SIZE);
        }

        let judge_index = rand::rng().random_range(0..self.players.len());
        self.current_judge = self.players.get_index(judge_index).map(|(id, _)| *id);

        self.round_number = 1;
        match self.prompt_deck.pop_front() {
            Some(prompt) => {
                self.current_prompt = Some(prompt);
                self.phase = GamePhase::Playing;
            }
            // Only reachable with a pathological custom dataset.
            None => self.phase = GamePhase::Ended,
        }

        true
    }

    /// Record a player's submission for the current round.
    ///
    /// All-or-nothing: the hand is only mutated once every card id has been
    /// verified present, so a rejected submission leaves it intact. When the
    /// last eligible submission lands, submissions are shuffled (so order
    /// does not betray authorship) and the phase moves to judging.
    pub fn submit_cards(&mut self, player_id: Uuid, card_ids: &[String]) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        if self.current_judge == Some(player_id) {
            return false;
        }
        let Some(player) = self.players.get(&player_id) else {
            return false;
        };
        if self.submissions.iter().any(|s| s.player_id == player_id) {
            return false;
        }

        let required = self.current_prompt.as_ref().map_or(1, |p| p.pick as usize);
        if card_ids.len() != required {
            return false;
        }

        let mut cards: Vec<AnswerCard> = Vec::with_capacity(card_ids.len());
        for card_id in card_ids {
            let Some(card) = player.hand.iter().find(|c| &c.id == card_id) else {
                return false;
            };
            if cards.iter().any(|c| c.id == card.id) {
                // Same card listed twice.
                return false;
            }
            cards.push(card.clone());
        }

        if let Some(player) = self.players.get_mut(&player_id) {
            player
                .hand
                .retain(|c| !card_ids.iter().any(|id| id == &c.id));
        }

        self.submissions.push(Submission { player_id, cards });

        let eligible = self
            .players
            .values()
            .filter(|p| Some(p.id) != self.current_judge && p.is_connected)
            .count();
        if self.submissions.len() >= eligible {
            self.submissions.shuffle(&mut rand::rng());
            self.phase = GamePhase::Judging;
        }

        true
    }

    /// Let the current judge pick the round winner.
    ///
    /// Awards a point and moves to reveal, or ends the game when the winner
    /// reaches [`Game::max_score`].
    pub fn pick_winner(&mut self, judge_id: Uuid, winning_player_id: Uuid) -> bool {
        if self.phase != GamePhase::Judging {
            return false;
        }
        if self.current_judge != Some(judge_id) {
            return false;
        }
        let Some(winning) = self
            .submissions
            .iter()
            .find(|s| s.player_id == winning_player_id)
            .cloned()
        else {
            return false;
        };

        if let Some(winner) = self.players.get_mut(&winning_player_id) {
            winner.score += 1;
            if winner.score >= self.max_score {
                self.winning_submission = Some(winning);
                self.phase = GamePhase::Ended;
                return true;
            }
        }

        self.winning_submission = Some(winning);
        self.phase = GamePhase::Reveal;
        true
    }

    /// Advance to the next round: refill hands, rotate the judge to the next
    /// roster index, and draw a fresh prompt.
    ///
    /// Allowed from reveal, and from playing so the connection layer can
    /// recover from the judge leaving mid-round. Ends the game instead when
    /// the prompt pile is exhausted.
    pub fn next_round(&mut self) -> bool {
        if self.phase != GamePhase::Reveal && self.phase != GamePhase::Playing {
            return false;
        }

        for player in self.players.values_mut() {
            let needed = HAND_SIZE.saturating_sub(player.hand.len());
            if needed > 0 {
                player.hand.extend(draw(&mut self.answer_deck, needed));
            }
        }

        // A removed judge no longer has a roster index; rotation restarts
        // at the first player in that case.
        let next_index = self
            .current_judge
            .and_then(|id| self.players.get_index_of(&id))
            .map_or(0, |i| (i + 1) % self.players.len());
        self.current_judge = self.players.get_index(next_index).map(|(id, _)| *id);

        let Some(prompt) = self.prompt_deck.pop_front() else {
            self.phase = GamePhase::Ended;
            return true;
        };

        self.current_prompt = Some(prompt);
        self.submissions.clear();
        self.winning_submission = None;
        self.round_number += 1;
        self.phase = GamePhase::Playing;
        true
    }

    /// Register a player-contributed card.
    ///
    /// The card joins the room's custom list immediately but only enters a
    /// draw pile when [`Game::start_game`] merges and reshuffles.
    pub fn add_custom_card(&mut self, kind: CardKind, text: &str, pick: u8) -> CustomCard {
        let id = format!("custom-{}", &Uuid::new_v4().simple().to_string()[..8]);

        match kind {
            CardKind::Prompt => {
                let card = PromptCard {
                    id,
                    text: text.to_owned(),
                    pick,
                };
                self.custom_prompt_cards.push(card.clone());
                CustomCard::Prompt(card)
            }
            CardKind::Answer => {
                let card = AnswerCard {
                    id,
                    text: text.to_owned(),
                    is_custom: true,
                };
                self.custom_answer_cards.push(card.clone());
                CustomCard::Answer(card)
            }
        }
    }

    /// Grant host to the first roster entry when no host remains.
    ///
    /// Returns the promoted player's id, or `None` when a host exists or the
    /// room is empty.
    pub fn ensure_host(&mut self) -> Option<Uuid> {
        if self.players.values().any(|p| p.is_host) {
            return None;
        }
        let player = self.players.values_mut().next()?;
        player.is_host = true;
        Some(player.id)
    }
}

/// Draw up to `count` cards from the top of a pile. Short draws are the
/// defined underflow behavior; no reshuffle of discards.
fn draw<T>(deck: &mut VecDeque<T>, count: usize) -> Vec<T> {
    let take = count.min(deck.len());
    deck.drain(..take).collect()
}
