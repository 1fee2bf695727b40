use std::time::Instant;

use bincode::{
    config::standard,
    serde::{decode_from_slice, encode_to_vec},
};
use tracing::{debug, error, info, trace, warn};

use common::{
    constants::MAX_GUESS_BYTES,
    names::{sanitize_display_name, sanitize_room_code},
    net::AppChannel,
    protocol::{ALREADY_JOINED_MESSAGE, ClientMessage, ServerMessage},
};

use crate::{
    directory::SessionDirectory,
    error::SessionError,
    net::{ServerNetworkEvent, ServerNetworkHandle},
    registry::ParticipantId,
};

/// One pass of the server loop: connection events, inbound intents in
/// arrival order, timers, then outbound notifications.
pub fn update(
    network: &mut dyn ServerNetworkHandle,
    directory: &mut SessionDirectory,
    now: Instant,
) {
    process_events(network, directory, now);
    handle_messages(network, directory, now);
    directory.poll(now);
    flush(network, directory);
}

pub fn process_events(
    network: &mut dyn ServerNetworkHandle,
    directory: &mut SessionDirectory,
    now: Instant,
) {
    while let Some(event) = network.get_event() {
        match event {
            ServerNetworkEvent::ClientConnected { client_id } => {
                info!(client_id, "client connected");
            }
            ServerNetworkEvent::ClientDisconnected { client_id, reason } => {
                info!(client_id, %reason, "client disconnected");
                directory.leave(ParticipantId(client_id), now);
            }
        }
    }
}

pub fn handle_messages(
    network: &mut dyn ServerNetworkHandle,
    directory: &mut SessionDirectory,
    now: Instant,
) {
    for client_id in network.clients_id() {
        while let Some(data) = network.receive_message(client_id, AppChannel::ReliableOrdered) {
            let Ok((message, _)) = decode_from_slice::<ClientMessage, _>(&data, standard()) else {
                warn!(client_id, "malformed data, disconnecting");
                network.disconnect(client_id);
                directory.leave(ParticipantId(client_id), now);
                break;
            };

            handle_message(network, directory, ParticipantId(client_id), message, now);
        }
    }
}

fn handle_message(
    network: &mut dyn ServerNetworkHandle,
    directory: &mut SessionDirectory,
    id: ParticipantId,
    message: ClientMessage,
    now: Instant,
) {
    trace!(participant = %id, kind = <&'static str>::from(&message), "message received");

    let result = match message {
        ClientMessage::Join { display_name, room } => {
            if directory.room_of(id).is_some() {
                reject_join(network, id, ALREADY_JOINED_MESSAGE);
                return;
            }
            let names = sanitize_display_name(&display_name)
                .and_then(|name| sanitize_room_code(&room).map(|room| (name, room)));
            match names {
                Ok((name, room)) => directory.join(id, &name, &room).map(|_| ()),
                Err(err) => {
                    reject_join(network, id, &err.to_string());
                    return;
                }
            }
        }
        ClientMessage::StartGame => directory.start_game(id, now),
        ClientMessage::SubmitGuess(text) => {
            if text.len() > MAX_GUESS_BYTES {
                debug!(participant = %id, "overly long guess ignored");
                return;
            }
            directory.submit_guess(id, &text, now).map(|_| ())
        }
        ClientMessage::Leave => {
            directory.leave(id, now);
            Ok(())
        }
    };

    match result {
        Ok(()) => {}
        Err(SessionError::InvalidGuessContext(reason)) => {
            trace!(participant = %id, ?reason, "guess ignored");
        }
        Err(err @ SessionError::InsufficientParticipants { .. }) => {
            info!(participant = %id, %err, "start refused");
        }
        Err(err) => debug!(participant = %id, %err, "intent ignored"),
    }
}

fn reject_join(network: &mut dyn ServerNetworkHandle, id: ParticipantId, message: &str) {
    let message = ServerMessage::JoinRejected {
        message: message.to_string(),
    };
    send(network, &[id], &message);
}

/// Sends everything the sessions emitted since the last flush.
pub fn flush(network: &mut dyn ServerNetworkHandle, directory: &mut SessionDirectory) {
    for delivery in directory.drain_outbox() {
        send(network, &delivery.recipients, &delivery.message);
    }
}

fn send(
    network: &mut dyn ServerNetworkHandle,
    recipients: &[ParticipantId],
    message: &ServerMessage,
) {
    let payload = match encode_to_vec(message, standard()) {
        Ok(payload) => payload,
        Err(err) => {
            error!(kind = message.variant_name(), %err, "failed to serialize message");
            return;
        }
    };

    let channel = match message {
        ServerMessage::TimerUpdate { .. } => AppChannel::Unreliable,
        _ => AppChannel::ReliableOrdered,
    };

    for recipient in recipients {
        network.send_message(recipient.0, channel, payload.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::GameSettings, session::Phase, test_helpers::MockServerNetwork, words::WordList,
    };
    use common::protocol::{NOT_ENOUGH_PLAYERS_MESSAGE, ParticipantView};

    fn directory() -> SessionDirectory {
        SessionDirectory::new(
            GameSettings::default(),
            WordList::new(["Apple"]).unwrap(),
        )
    }

    fn join(network: &mut MockServerNetwork, client_id: u64, name: &str) {
        network.add_client(client_id);
        network.queue_client_message(
            client_id,
            &ClientMessage::Join {
                display_name: name.to_string(),
                room: String::new(),
            },
        );
    }

    #[test]
    fn join_registers_participant_and_welcomes_them() {
        let mut network = MockServerNetwork::new();
        let mut directory = directory();
        let now = Instant::now();

        join(&mut network, 1, "  Alice ");
        update(&mut network, &mut directory, now);

        assert_eq!(directory.room_of(ParticipantId(1)), Some("main"));
        let msgs = network.get_sent_messages(1);
        assert_eq!(
            msgs[0],
            ServerMessage::Welcome {
                user_id: 1,
                username: "Alice".to_string(),
                room: "main".to_string()
            }
        );
        assert_eq!(
            msgs[1],
            ServerMessage::UserList {
                participants: vec![ParticipantView {
                    user_id: 1,
                    username: "Alice".to_string(),
                    score: 0,
                    is_drawing: false
                }]
            }
        );
    }

    #[test]
    fn invalid_display_name_is_rejected_and_not_registered() {
        let mut network = MockServerNetwork::new();
        let mut directory = directory();

        join(&mut network, 1, "   ");
        update(&mut network, &mut directory, Instant::now());

        assert_eq!(directory.room_of(ParticipantId(1)), None);
        assert!(matches!(
            network.get_sent_messages(1).as_slice(),
            [ServerMessage::JoinRejected { .. }]
        ));
    }

    #[test]
    fn second_join_from_same_connection_is_rejected() {
        let mut network = MockServerNetwork::new();
        let mut directory = directory();
        let now = Instant::now();

        join(&mut network, 1, "Alice");
        update(&mut network, &mut directory, now);
        network.clear_sent_messages();

        network.queue_client_message(
            1,
            &ClientMessage::Join {
                display_name: "Again".to_string(),
                room: "elsewhere".to_string(),
            },
        );
        update(&mut network, &mut directory, now);

        assert_eq!(
            network.get_sent_messages(1),
            vec![ServerMessage::JoinRejected {
                message: ALREADY_JOINED_MESSAGE.to_string()
            }]
        );
        assert_eq!(directory.room_count(), 1);
    }

    #[test]
    fn malformed_data_disconnects_the_client() {
        let mut network = MockServerNetwork::new();
        let mut directory = directory();
        let now = Instant::now();

        join(&mut network, 1, "Alice");
        update(&mut network, &mut directory, now);
        network.queue_raw_message(1, vec![0xff, 0xff, 0xff]);
        update(&mut network, &mut directory, now);

        assert_eq!(network.disconnected_clients, vec![1]);
        assert_eq!(directory.room_of(ParticipantId(1)), None);
    }

    #[test]
    fn full_round_over_the_gateway() {
        let mut network = MockServerNetwork::new();
        let mut directory = directory();
        let start = Instant::now();

        join(&mut network, 1, "A");
        join(&mut network, 2, "B");
        update(&mut network, &mut directory, start);
        network.clear_sent_messages();

        network.queue_client_message(2, &ClientMessage::StartGame);
        update(&mut network, &mut directory, start);

        let alice = network.get_sent_messages(1);
        let bob = network.get_sent_messages(2);
        assert!(alice.contains(&ServerMessage::YouAreDrawing {
            word: "Apple".to_string()
        }));
        assert!(
            !bob.iter()
                .any(|m| matches!(m, ServerMessage::YouAreDrawing { .. }))
        );
        assert!(bob.iter().any(|m| matches!(
            m,
            ServerMessage::NewRound { drawer, .. } if drawer == "A"
        )));
        assert_eq!(
            network.channels_used_for(2, "TimerUpdate"),
            vec![AppChannel::Unreliable]
        );
        network.clear_sent_messages();

        network.queue_client_message(2, &ClientMessage::SubmitGuess(" APPLE ".to_string()));
        update(&mut network, &mut directory, start + Duration::from_secs(1));

        let bob = network.get_sent_messages(2);
        let scores = bob
            .iter()
            .find_map(|m| match m {
                ServerMessage::CorrectGuess { scores, .. } => Some(scores.clone()),
                _ => None,
            })
            .expect("expected CorrectGuess");
        assert_eq!(
            scores.iter().map(|p| p.score).collect::<Vec<_>>(),
            vec![50, 100]
        );

        network.clear_sent_messages();
        update(&mut network, &mut directory, start + Duration::from_secs(4));
        assert!(network.get_sent_messages(1).iter().any(|m| matches!(
            m,
            ServerMessage::NewRound { drawer, .. } if drawer == "B"
        )));
    }

    #[test]
    fn disconnect_of_drawer_with_two_players_aborts_the_game() {
        let mut network = MockServerNetwork::new();
        let mut directory = directory();
        let now = Instant::now();

        join(&mut network, 1, "A");
        join(&mut network, 2, "B");
        update(&mut network, &mut directory, now);
        network.queue_client_message(1, &ClientMessage::StartGame);
        update(&mut network, &mut directory, now);
        assert_eq!(
            directory.session("main").map(|s| s.phase()),
            Some(Phase::Active)
        );
        network.clear_sent_messages();

        network.remove_client(1);
        network.queue_event(ServerNetworkEvent::ClientDisconnected {
            client_id: 1,
            reason: "timeout".to_string(),
        });
        update(&mut network, &mut directory, now);

        let bob = network.get_sent_messages(2);
        assert!(matches!(
            &bob[0],
            ServerMessage::UserLeft { username, user_id: 1 } if username == "A"
        ));
        assert!(bob.contains(&ServerMessage::GameError {
            message: NOT_ENOUGH_PLAYERS_MESSAGE.to_string()
        }));
        assert_eq!(
            directory.session("main").map(|s| s.phase()),
            Some(Phase::Idle)
        );
    }

    #[test]
    fn leave_intent_removes_participant_but_keeps_connection() {
        let mut network = MockServerNetwork::new();
        let mut directory = directory();
        let now = Instant::now();

        join(&mut network, 1, "A");
        join(&mut network, 2, "B");
        update(&mut network, &mut directory, now);

        network.queue_client_message(2, &ClientMessage::Leave);
        update(&mut network, &mut directory, now);

        assert_eq!(directory.room_of(ParticipantId(2)), None);
        assert!(network.disconnected_clients.is_empty());

        network.clear_sent_messages();
        join(&mut network, 2, "B2");
        update(&mut network, &mut directory, now);
        assert_eq!(directory.room_of(ParticipantId(2)), Some("main"));
    }

    #[test]
    fn intents_before_joining_are_ignored() {
        let mut network = MockServerNetwork::new();
        let mut directory = directory();

        network.add_client(1);
        network.queue_client_message(1, &ClientMessage::StartGame);
        network.queue_client_message(1, &ClientMessage::SubmitGuess("apple".to_string()));
        update(&mut network, &mut directory, Instant::now());

        assert!(network.get_sent_messages(1).is_empty());
        assert_eq!(directory.room_count(), 0);
    }
}
