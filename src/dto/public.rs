//! Owned, per-player projections of room state.
//!
//! Snapshots sent over the wire are always built here, never by exposing
//! live state: each recipient gets their own copy with everyone else's
//! hand stripped and submission authorship hidden while it matters.

use serde::Serialize;
use uuid::Uuid;

use crate::state::deck::{AnswerCard, PromptCard};
use crate::state::game::{Game, GamePhase, Submission};

/// One player's entry in a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PublicPlayer {
    /// Stable player id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Rounds won so far.
    pub score: u32,
    /// Whether this player is the room host.
    pub is_host: bool,
    /// Transport-level liveness.
    pub is_connected: bool,
    /// Hand contents. Populated only for the snapshot's recipient.
    pub hand: Vec<AnswerCard>,
}

/// One submission as shown to players.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSubmission {
    /// Submitting player. Only revealed while the judge is picking and
    /// during the reveal; `None` otherwise, so card order cannot be
    /// matched to authorship.
    pub player_id: Option<Uuid>,
    /// Submitted cards in chosen order.
    pub cards: Vec<AnswerCard>,
}

/// A player's final score line for the game-over report.
#[derive(Debug, Clone, Serialize)]
pub struct FinalScore {
    /// Stable player id.
    pub player_id: Uuid,
    /// Display name.
    pub name: String,
    /// Final score.
    pub score: u32,
}

/// Full room snapshot personalized for one recipient.
#[derive(Debug, Clone, Serialize)]
pub struct PublicGameState {
    /// Room code.
    pub room_code: String,
    /// Current phase.
    pub phase: GamePhase,
    /// Current round, 0 while in the lobby.
    pub round_number: u32,
    /// Score threshold that ends the game.
    pub max_score: u32,
    /// Current judge, if a round is under way.
    pub current_judge: Option<Uuid>,
    /// Prompt for the current round.
    pub current_prompt: Option<PromptCard>,
    /// Roster in join order.
    pub players: Vec<PublicPlayer>,
    /// Submissions recorded so far this round.
    pub submissions: Vec<PublicSubmission>,
    /// The submission the judge picked, once revealed.
    pub winning_submission: Option<PublicSubmission>,
}

impl PublicGameState {
    /// Project a snapshot for `for_player`.
    pub fn project(game: &Game, for_player: Uuid) -> Self {
        let reveal_authors = matches!(game.phase(), GamePhase::Judging | GamePhase::Reveal);

        Self {
            room_code: game.room_code().to_owned(),
            phase: game.phase(),
            round_number: game.round_number(),
            max_score: game.max_score(),
            current_judge: game.current_judge(),
            current_prompt: game.current_prompt().cloned(),
            players: game
                .players()
                .map(|p| PublicPlayer {
                    id: p.id,
                    name: p.name.clone(),
                    score: p.score,
                    is_host: p.is_host,
                    is_connected: p.is_connected,
                    hand: if p.id == for_player {
                        p.hand.clone()
                    } else {
                        Vec::new()
                    },
                })
                .collect(),
            submissions: game
                .submissions()
                .iter()
                .map(|s| project_submission(s, reveal_authors))
                .collect(),
            winning_submission: game
                .winning_submission()
                .map(|s| project_submission(s, true)),
        }
    }

    /// Final score lines, highest first.
    pub fn final_scores(game: &Game) -> Vec<FinalScore> {
        let mut scores: Vec<FinalScore> = game
            .players()
            .map(|p| FinalScore {
                player_id: p.id,
                name: p.name.clone(),
                score: p.score,
            })
            .collect();
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores
    }
}

fn project_submission(submission: &Submission, reveal_author: bool) -> PublicSubmission {
    PublicSubmission {
        player_id: reveal_author.then_some(submission.player_id),
        cards: submission.cards.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::deck::CardSet;

    fn playing_game() -> (Game, Vec<Uuid>) {
        let cards = CardSet {
            prompts: (0..10)
                .map(|i| PromptCard {
                    id: format!("p{i}"),
                    text: format!("prompt {i}"),
                    pick: 1,
                })
                .collect(),
            answers: (0..60)
                .map(|i| AnswerCard {
                    id: format!("a{i}"),
                    text: format!("answer {i}"),
                    is_custom: false,
                })
                .collect(),
        };
        let mut game = Game::new("PIXEL77".into(), &cards);
        let ids: Vec<Uuid> = ["Alice", "Bob", "Charlie"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let id = Uuid::new_v4();
                game.add_player(id, name, i == 0);
                id
            })
            .collect();
        assert!(game.start_game());
        (game, ids)
    }

    #[test]
    fn only_the_recipient_sees_their_hand() {
        let (game, ids) = playing_game();

        let snapshot = PublicGameState::project(&game, ids[1]);

        for player in &snapshot.players {
            if player.id == ids[1] {
                assert!(!player.hand.is_empty());
            } else {
                assert!(player.hand.is_empty());
            }
        }
    }

    #[test]
    fn submission_authors_are_hidden_while_playing() {
        let (mut game, ids) = playing_game();
        let submitter = ids
            .iter()
            .copied()
            .find(|id| game.current_judge() != Some(*id))
            .unwrap();
        let card_id = game.player(submitter).unwrap().hand[0].id.clone();
        assert!(game.submit_cards(submitter, &[card_id]));

        let snapshot = PublicGameState::project(&game, ids[0]);

        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.submissions.len(), 1);
        assert!(snapshot.submissions[0].player_id.is_none());
        assert!(!snapshot.submissions[0].cards.is_empty());
    }

    fn non_judges(game: &Game, ids: &[Uuid]) -> Vec<Uuid> {
        ids.iter()
            .copied()
            .filter(|id| game.current_judge() != Some(*id))
            .collect()
    }

    #[test]
    fn submission_authors_are_revealed_during_judging() {
        let (mut game, ids) = playing_game();
        for id in non_judges(&game, &ids) {
            let card_id = game.player(id).unwrap().hand[0].id.clone();
            assert!(game.submit_cards(id, &[card_id]));
        }
        assert_eq!(game.phase(), GamePhase::Judging);

        let snapshot = PublicGameState::project(&game, ids[0]);

        assert!(snapshot.submissions.iter().all(|s| s.player_id.is_some()));
    }

    #[test]
    fn submission_authors_are_hidden_again_once_the_game_ends() {
        let (mut game, ids) = playing_game();
        let submitters = non_judges(&game, &ids);
        for id in &submitters {
            let card_id = game.player(*id).unwrap().hand[0].id.clone();
            assert!(game.submit_cards(*id, &[card_id]));
        }
        assert_eq!(game.phase(), GamePhase::Judging);

        // Dropping below the minimum mid-judging ends the game with the
        // round's submissions still on the table.
        assert!(game.remove_player(submitters[0]));
        assert_eq!(game.phase(), GamePhase::Ended);
        assert!(!game.submissions().is_empty());

        let snapshot = PublicGameState::project(&game, ids[0]);

        assert!(snapshot.submissions.iter().all(|s| s.player_id.is_none()));
    }

    #[test]
    fn final_scores_are_sorted_descending() {
        let (game, _ids) = playing_game();

        let scores = PublicGameState::final_scores(&game);

        assert_eq!(scores.len(), 3);
        assert!(scores.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
