//! WebSocket message types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::public::{FinalScore, PublicGameState};
use crate::state::game::{CardKind, CustomCard};

#[derive(Debug, Deserialize)]
/// Messages accepted from game WebSocket clients.
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Create a room and join it as host.
    #[serde(rename = "create-room")]
    CreateRoom {
        /// Host display name.
        name: String,
    },
    /// Join an existing lobby.
    #[serde(rename = "join-room")]
    JoinRoom {
        /// Room code, any case.
        room_code: String,
        /// Display name.
        name: String,
    },
    /// Reclaim a seat after a disconnect.
    #[serde(rename = "rejoin-room")]
    RejoinRoom {
        /// Room code, any case.
        room_code: String,
        /// Stable player id handed out when the seat was first taken.
        player_id: Uuid,
    },
    /// Start the game (host only).
    #[serde(rename = "start-game")]
    StartGame,
    /// Submit answer cards for the current round.
    #[serde(rename = "submit-cards")]
    SubmitCards {
        /// Card ids from the sender's hand, in chosen order.
        card_ids: Vec<String>,
    },
    /// Pick the round winner (judge only).
    #[serde(rename = "pick-winner")]
    PickWinner {
        /// Player whose submission wins.
        player_id: Uuid,
    },
    /// Advance to the next round (host only).
    #[serde(rename = "next-round")]
    NextRound,
    /// Contribute a custom card to the room (lobby only).
    #[serde(rename = "add-custom-card")]
    AddCustomCard {
        /// Which deck the card belongs to.
        card_type: CustomCardType,
        /// Card text.
        text: String,
        /// Pick count for prompt cards; defaults to 1.
        pick: Option<u8>,
    },
    /// Anything this server version does not understand.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Deserialize)]
/// Deck selector for custom cards.
#[serde(rename_all = "lowercase")]
pub enum CustomCardType {
    /// Prompt deck.
    Prompt,
    /// Answer deck.
    Answer,
}

impl From<CustomCardType> for CardKind {
    fn from(value: CustomCardType) -> Self {
        match value {
            CustomCardType::Prompt => CardKind::Prompt,
            CustomCardType::Answer => CardKind::Answer,
        }
    }
}

#[derive(Debug, Serialize)]
/// Messages sent to game WebSocket clients.
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Room created; the sender is its host.
    #[serde(rename = "room-created")]
    RoomCreated {
        /// Generated room code.
        room_code: String,
        /// Stable id to keep for rejoining.
        player_id: Uuid,
        /// Initial snapshot.
        state: PublicGameState,
    },
    /// The sender joined a room.
    #[serde(rename = "room-joined")]
    RoomJoined {
        /// Upper-cased room code.
        room_code: String,
        /// Stable id to keep for rejoining.
        player_id: Uuid,
        /// Personalized snapshot.
        state: PublicGameState,
    },
    /// Another player joined the lobby.
    #[serde(rename = "player-joined")]
    PlayerJoined {
        /// New player's id.
        player_id: Uuid,
        /// New player's name.
        name: String,
    },
    /// A player left or was removed.
    #[serde(rename = "player-left")]
    PlayerLeft {
        /// Removed player's id.
        player_id: Uuid,
        /// Player promoted to host, when the host left.
        new_host: Option<Uuid>,
    },
    /// A player's socket dropped; their seat is held for the grace period.
    #[serde(rename = "player-disconnected")]
    PlayerDisconnected {
        /// Disconnected player's id.
        player_id: Uuid,
    },
    /// A disconnected player reclaimed their seat.
    #[serde(rename = "player-reconnected")]
    PlayerReconnected {
        /// Reconnected player's id.
        player_id: Uuid,
    },
    /// The game started. Personalized per recipient.
    #[serde(rename = "game-started")]
    GameStarted {
        /// Personalized snapshot.
        state: PublicGameState,
    },
    /// A new round began. Personalized per recipient.
    #[serde(rename = "new-round")]
    NewRound {
        /// Personalized snapshot.
        state: PublicGameState,
    },
    /// A player locked in their submission.
    #[serde(rename = "card-submitted")]
    CardSubmitted {
        /// Submitting player's id.
        player_id: Uuid,
        /// Submissions recorded so far this round.
        submission_count: usize,
    },
    /// All submissions are in; the judge is picking.
    #[serde(rename = "judging-started")]
    JudgingStarted {
        /// Personalized snapshot.
        state: PublicGameState,
    },
    /// The judge picked a winner.
    #[serde(rename = "winner-picked")]
    WinnerPicked {
        /// Winning player's id.
        player_id: Uuid,
        /// Personalized snapshot.
        state: PublicGameState,
    },
    /// The game is over.
    #[serde(rename = "game-ended")]
    GameEnded {
        /// Winning player, if any player remains.
        winner_id: Option<Uuid>,
        /// Final scores, highest first.
        scores: Vec<FinalScore>,
    },
    /// A custom card was registered for the room.
    #[serde(rename = "custom-card-added")]
    CustomCardAdded {
        /// The card as it will enter the deck at game start.
        card: CustomCard,
    },
    /// An intent was rejected.
    #[serde(rename = "error")]
    Error {
        /// Human-readable reason.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_messages_deserialize_from_tagged_json() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "join-room", "room_code": "tiger42", "name": "Ada"}"#)
                .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::JoinRoom { room_code, name }
                if room_code == "tiger42" && name == "Ada"
        ));

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "start-game"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartGame));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type": "add-custom-card", "card_type": "prompt", "text": "____?", "pick": 2}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::AddCustomCard { card_type: CustomCardType::Prompt, pick: Some(2), .. }
        ));
    }

    #[test]
    fn unknown_message_types_fall_back_to_unknown() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "launch-missiles"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Unknown));
    }

    #[test]
    fn outbound_messages_carry_their_type_tag() {
        let json = serde_json::to_string(&ServerMessage::PlayerLeft {
            player_id: Uuid::nil(),
            new_host: None,
        })
        .unwrap();
        assert!(json.contains(r#""type":"player-left""#));

        let json = serde_json::to_string(&ServerMessage::Error {
            message: "not your turn".into(),
        })
        .unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains("not your turn"));
    }
}
