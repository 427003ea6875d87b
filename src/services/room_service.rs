//! Room intent handlers.
//!
//! One handler per inbound message, all operating on the room resolved
//! from the sender's connection binding. Handlers take the room's write
//! lock, apply the state machine operation, and fan the fallout out to
//! every seated player, personalizing snapshots per recipient.

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        public::PublicGameState,
        validation,
        ws::{ClientMessage, ServerMessage},
    },
    error::ServiceError,
    services::websocket_service::send_message,
    state::{
        SharedState,
        connections::{Binding, DISCONNECT_GRACE, ROOM_GRACE, TimerKey},
        game::{Game, GamePhase, MIN_PLAYERS},
        registry::RoomHandle,
    },
};

/// Route an inbound intent to its handler.
pub async fn dispatch(
    state: &SharedState,
    connection_id: Uuid,
    intent: ClientMessage,
) -> Result<(), ServiceError> {
    match intent {
        ClientMessage::CreateRoom { name } => create_room(state, connection_id, &name).await,
        ClientMessage::JoinRoom { room_code, name } => {
            join_room(state, connection_id, &room_code, &name).await
        }
        ClientMessage::RejoinRoom {
            room_code,
            player_id,
        } => rejoin_room(state, connection_id, &room_code, player_id).await,
        ClientMessage::StartGame => start_game(state, connection_id).await,
        ClientMessage::SubmitCards { card_ids } => {
            submit_cards(state, connection_id, &card_ids).await
        }
        ClientMessage::PickWinner { player_id } => {
            pick_winner(state, connection_id, player_id).await
        }
        ClientMessage::NextRound => next_round(state, connection_id).await,
        ClientMessage::AddCustomCard {
            card_type,
            text,
            pick,
        } => add_custom_card(state, connection_id, card_type.into(), &text, pick).await,
        ClientMessage::Unknown => Ok(()),
    }
}

async fn create_room(
    state: &SharedState,
    connection_id: Uuid,
    name: &str,
) -> Result<(), ServiceError> {
    validation::validate_player_name(name)?;

    let player_id = Uuid::new_v4();
    let (room_code, room) = state.rooms().create(state.config().cards());
    let mut game = room.write().await;
    if game.add_player(player_id, name.trim(), true).is_none() {
        return Err(ServiceError::InvalidState("could not seat the host".into()));
    }
    state.connections().bind(connection_id, &room_code, player_id);

    info!(room = %room_code, player = %player_id, "room created");
    send_to_connection(
        state,
        connection_id,
        &ServerMessage::RoomCreated {
            room_code: room_code.clone(),
            player_id,
            state: PublicGameState::project(&game, player_id),
        },
    );
    Ok(())
}

async fn join_room(
    state: &SharedState,
    connection_id: Uuid,
    room_code: &str,
    name: &str,
) -> Result<(), ServiceError> {
    validation::validate_player_name(name)?;

    let room = state
        .rooms()
        .get(room_code)
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_code}` not found")))?;
    let mut game = room.write().await;

    if game.phase() != GamePhase::Lobby {
        return Err(ServiceError::InvalidState(
            "game already in progress".into(),
        ));
    }

    // A join into a previously emptied room revives it: the joiner becomes
    // host and the pending deletion is called off.
    let becomes_host = game.is_empty();
    let player_id = Uuid::new_v4();
    let Some(player) = game.add_player(player_id, name.trim(), becomes_host) else {
        return Err(ServiceError::InvalidInput(
            "that name is taken or the room is full".into(),
        ));
    };
    let player_name = player.name.clone();
    let code = game.room_code().to_owned();
    state.timers().cancel(&TimerKey::RoomDeletion(code.clone()));
    state.connections().bind(connection_id, &code, player_id);

    info!(room = %code, player = %player_id, "player joined");
    broadcast_except(
        state,
        &game,
        player_id,
        &ServerMessage::PlayerJoined {
            player_id,
            name: player_name,
        },
    );
    send_to_connection(
        state,
        connection_id,
        &ServerMessage::RoomJoined {
            room_code: code,
            player_id,
            state: PublicGameState::project(&game, player_id),
        },
    );
    Ok(())
}

async fn rejoin_room(
    state: &SharedState,
    connection_id: Uuid,
    room_code: &str,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let room = state
        .rooms()
        .get(room_code)
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_code}` not found")))?;
    let mut game = room.write().await;

    if game.reconnect_player(player_id).is_none() {
        return Err(ServiceError::NotFound(
            "no seat to reclaim in this room".into(),
        ));
    }
    state.timers().cancel(&TimerKey::PlayerRemoval(player_id));
    let code = game.room_code().to_owned();
    state.connections().bind(connection_id, &code, player_id);

    info!(room = %code, player = %player_id, "player reconnected");
    broadcast_except(
        state,
        &game,
        player_id,
        &ServerMessage::PlayerReconnected { player_id },
    );
    send_to_connection(
        state,
        connection_id,
        &ServerMessage::RoomJoined {
            room_code: code,
            player_id,
            state: PublicGameState::project(&game, player_id),
        },
    );
    Ok(())
}

async fn start_game(state: &SharedState, connection_id: Uuid) -> Result<(), ServiceError> {
    let (binding, room) = bound_room(state, connection_id)?;
    let mut game = room.write().await;

    if !game.is_host(binding.player_id) {
        return Err(ServiceError::Unauthorized(
            "only the host may start the game".into(),
        ));
    }
    if game.phase() != GamePhase::Lobby {
        return Err(ServiceError::InvalidState("game already started".into()));
    }
    if game.player_count() < MIN_PLAYERS {
        return Err(ServiceError::InvalidState(format!(
            "need at least {MIN_PLAYERS} players to start"
        )));
    }
    if !game.start_game() {
        return Err(ServiceError::InvalidState("game cannot start".into()));
    }

    info!(room = %game.room_code(), round = game.round_number(), "game started");
    if game.phase() == GamePhase::Ended {
        broadcast(state, &game, &game_ended_message(&game));
    } else {
        broadcast_snapshots(state, &game, |snapshot| ServerMessage::GameStarted {
            state: snapshot,
        });
    }
    Ok(())
}

async fn submit_cards(
    state: &SharedState,
    connection_id: Uuid,
    card_ids: &[String],
) -> Result<(), ServiceError> {
    let (binding, room) = bound_room(state, connection_id)?;
    let mut game = room.write().await;

    if game.phase() != GamePhase::Playing {
        return Err(ServiceError::InvalidState(
            "submissions are not open right now".into(),
        ));
    }
    if game.current_judge() == Some(binding.player_id) {
        return Err(ServiceError::Unauthorized(
            "the judge does not submit cards".into(),
        ));
    }
    if !game.submit_cards(binding.player_id, card_ids) {
        return Err(ServiceError::InvalidInput(
            "submission rejected: wrong count, unknown card, or already submitted".into(),
        ));
    }

    broadcast(
        state,
        &game,
        &ServerMessage::CardSubmitted {
            player_id: binding.player_id,
            submission_count: game.submissions().len(),
        },
    );
    if game.phase() == GamePhase::Judging {
        info!(room = %game.room_code(), "all submissions in, judging begins");
        broadcast_snapshots(state, &game, |snapshot| ServerMessage::JudgingStarted {
            state: snapshot,
        });
    }
    Ok(())
}

async fn pick_winner(
    state: &SharedState,
    connection_id: Uuid,
    winning_player_id: Uuid,
) -> Result<(), ServiceError> {
    let (binding, room) = bound_room(state, connection_id)?;
    let mut game = room.write().await;

    if game.phase() != GamePhase::Judging {
        return Err(ServiceError::InvalidState(
            "there is nothing to judge right now".into(),
        ));
    }
    if game.current_judge() != Some(binding.player_id) {
        return Err(ServiceError::Unauthorized(
            "only the judge picks the winner".into(),
        ));
    }
    if !game.pick_winner(binding.player_id, winning_player_id) {
        return Err(ServiceError::InvalidInput(
            "that player has no submission this round".into(),
        ));
    }

    info!(room = %game.room_code(), winner = %winning_player_id, "winner picked");
    broadcast_snapshots(state, &game, |snapshot| ServerMessage::WinnerPicked {
        player_id: winning_player_id,
        state: snapshot,
    });
    if game.phase() == GamePhase::Ended {
        broadcast(state, &game, &game_ended_message(&game));
    }
    Ok(())
}

async fn next_round(state: &SharedState, connection_id: Uuid) -> Result<(), ServiceError> {
    let (binding, room) = bound_room(state, connection_id)?;
    let mut game = room.write().await;

    if !game.is_host(binding.player_id) {
        return Err(ServiceError::Unauthorized(
            "only the host may advance the round".into(),
        ));
    }
    if !game.next_round() {
        return Err(ServiceError::InvalidState(
            "the round cannot be advanced right now".into(),
        ));
    }

    if game.phase() == GamePhase::Ended {
        info!(room = %game.room_code(), "prompt pile exhausted, game over");
        broadcast(state, &game, &game_ended_message(&game));
    } else {
        info!(room = %game.room_code(), round = game.round_number(), "next round");
        broadcast_snapshots(state, &game, |snapshot| ServerMessage::NewRound {
            state: snapshot,
        });
    }
    Ok(())
}

async fn add_custom_card(
    state: &SharedState,
    connection_id: Uuid,
    kind: crate::state::game::CardKind,
    text: &str,
    pick: Option<u8>,
) -> Result<(), ServiceError> {
    let (_binding, room) = bound_room(state, connection_id)?;
    let mut game = room.write().await;

    if game.phase() != GamePhase::Lobby {
        return Err(ServiceError::InvalidState(
            "custom cards can only be added before the game starts".into(),
        ));
    }
    validation::validate_card_text(text)?;
    let pick = pick.unwrap_or(1);
    validation::validate_pick(pick)?;

    let card = game.add_custom_card(kind, text.trim(), pick);
    broadcast(state, &game, &ServerMessage::CustomCardAdded { card });
    Ok(())
}

/// Fallout of a socket closing: immediate removal in the lobby, otherwise a
/// held seat with a removal timer.
pub async fn handle_disconnect(state: &SharedState, binding: Binding) {
    let Some(room) = state.rooms().get(&binding.room_code) else {
        return;
    };
    let mut game = room.write().await;
    let code = game.room_code().to_owned();

    if game.player(binding.player_id).is_none() {
        if game.is_empty() {
            schedule_room_deletion(state, &code);
        }
        return;
    }

    if game.phase() == GamePhase::Lobby {
        remove_player_with_fallout(state, &mut game, binding.player_id);
        if game.is_empty() {
            schedule_room_deletion(state, &code);
        }
        return;
    }

    game.disconnect_player(binding.player_id);
    info!(room = %code, player = %binding.player_id, "player disconnected, holding seat");
    broadcast(
        state,
        &game,
        &ServerMessage::PlayerDisconnected {
            player_id: binding.player_id,
        },
    );

    let timer_state = state.clone();
    let player_id = binding.player_id;
    state.timers().schedule(
        TimerKey::PlayerRemoval(player_id),
        DISCONNECT_GRACE,
        async move {
            removal_grace_expired(timer_state, code, player_id).await;
        },
    );
}

/// Fired when a disconnected player's grace period lapses. Re-checks under
/// the room lock; a player who reconnected in the meantime keeps their seat.
async fn removal_grace_expired(state: SharedState, room_code: String, player_id: Uuid) {
    let Some(room) = state.rooms().get(&room_code) else {
        return;
    };
    let mut game = room.write().await;
    let still_gone = game.player(player_id).is_some_and(|p| !p.is_connected);
    if !still_gone {
        return;
    }

    info!(room = %room_code, player = %player_id, "grace period expired, removing player");
    remove_player_with_fallout(&state, &mut game, player_id);
    if game.is_empty() {
        schedule_room_deletion(&state, &room_code);
    }
}

/// Remove a player and announce everything that follows from it: host
/// handover, a forced round advance when the judge left, or the game ending
/// when the roster shrank below the minimum.
fn remove_player_with_fallout(state: &SharedState, game: &mut Game, player_id: Uuid) {
    let round_before = game.round_number();
    let ended_before = game.phase() == GamePhase::Ended;
    if !game.remove_player(player_id) {
        return;
    }
    let new_host = game.ensure_host();

    broadcast(
        state,
        game,
        &ServerMessage::PlayerLeft {
            player_id,
            new_host,
        },
    );

    if game.phase() == GamePhase::Ended {
        if !ended_before {
            broadcast(state, game, &game_ended_message(game));
        }
    } else if game.round_number() > round_before {
        broadcast_snapshots(state, game, |snapshot| ServerMessage::NewRound {
            state: snapshot,
        });
    }
}

/// Schedule deletion of an empty room, replacing any pending deletion timer.
fn schedule_room_deletion(state: &SharedState, room_code: &str) {
    let timer_state = state.clone();
    let code = room_code.to_owned();
    info!(room = %code, "room empty, scheduling deletion");
    state.timers().schedule(
        TimerKey::RoomDeletion(code.clone()),
        ROOM_GRACE,
        async move {
            if let Some(room) = timer_state.rooms().get(&code)
                && room.read().await.is_empty()
            {
                timer_state.rooms().remove(&code);
                info!(room = %code, "deleted empty room");
            }
        },
    );
}

fn bound_room(
    state: &SharedState,
    connection_id: Uuid,
) -> Result<(Binding, RoomHandle), ServiceError> {
    let binding = state
        .connections()
        .binding(connection_id)
        .ok_or_else(|| ServiceError::InvalidState("join a room first".into()))?;
    let room = state.rooms().get(&binding.room_code).ok_or_else(|| {
        ServiceError::NotFound(format!("room `{}` no longer exists", binding.room_code))
    })?;
    Ok((binding, room))
}

fn game_ended_message(game: &Game) -> ServerMessage {
    let winner_id = game
        .winning_submission()
        .map(|s| s.player_id)
        .or_else(|| game.leading_player().map(|p| p.id));
    ServerMessage::GameEnded {
        winner_id,
        scores: PublicGameState::final_scores(game),
    }
}

fn send_to_connection(state: &SharedState, connection_id: Uuid, message: &ServerMessage) {
    if let Some(tx) = state.connections().sender(connection_id) {
        send_message(&tx, message);
    }
}

fn send_to_player(state: &SharedState, player_id: Uuid, message: &ServerMessage) {
    if let Some(tx) = state.connections().player_sender(player_id) {
        send_message(&tx, message);
    }
}

fn broadcast(state: &SharedState, game: &Game, message: &ServerMessage) {
    for player_id in game.player_ids() {
        send_to_player(state, player_id, message);
    }
}

fn broadcast_except(state: &SharedState, game: &Game, skip: Uuid, message: &ServerMessage) {
    for player_id in game.player_ids() {
        if player_id != skip {
            send_to_player(state, player_id, message);
        }
    }
}

fn broadcast_snapshots<F>(state: &SharedState, game: &Game, build: F)
where
    F: Fn(PublicGameState) -> ServerMessage,
{
    for player_id in game.player_ids() {
        let snapshot = PublicGameState::project(game, player_id);
        send_to_player(state, player_id, &build(snapshot));
    }
}
