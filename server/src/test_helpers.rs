use std::collections::{HashMap, VecDeque};

use bincode::{
    config::standard,
    serde::{decode_from_slice, encode_to_vec},
};

use crate::net::{ServerNetworkEvent, ServerNetworkHandle};
use common::{
    net::AppChannel,
    protocol::{ClientMessage, ServerMessage},
};

#[derive(Default)]
pub struct MockServerNetwork {
    /// **Incoming Event Queue:** Simulates connection events.
    /// `process_events` drains this through `network.get_event()`.
    events_to_process: VecDeque<ServerNetworkEvent>,

    /// **Incoming Message Queue (Client -> Server):** Serialized intents per client.
    /// `handle_messages` drains this through `network.receive_message(client_id)`.
    client_messages: HashMap<u64, VecDeque<Vec<u8>>>,

    /// **Outgoing Message Log (Server -> Specific Client):** Every payload sent
    /// to a client, with the channel it went out on. Rooms mean there is no
    /// transport-level broadcast, so this is the only outgoing log.
    sent_messages: HashMap<u64, Vec<(AppChannel, Vec<u8>)>>,

    /// **Disconnection Log:** Client ids passed to `network.disconnect()`.
    pub disconnected_clients: Vec<u64>,

    /// **Master Client List:** Who is connected, in connection order.
    client_ids: Vec<u64>,
}

impl MockServerNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&mut self, client_id: u64) {
        if !self.client_ids.contains(&client_id) {
            self.client_ids.push(client_id);
        }
        self.client_messages.entry(client_id).or_default();
        self.sent_messages.entry(client_id).or_default();
    }

    pub fn remove_client(&mut self, client_id: u64) {
        self.client_ids.retain(|&id| id != client_id);
    }

    pub fn queue_event(&mut self, event: ServerNetworkEvent) {
        self.events_to_process.push_back(event);
    }

    pub fn queue_client_message(&mut self, client_id: u64, message: &ClientMessage) {
        let payload =
            encode_to_vec(message, standard()).expect("failed to serialize ClientMessage");
        self.queue_raw_message(client_id, payload);
    }

    pub fn queue_raw_message(&mut self, client_id: u64, message: Vec<u8>) {
        self.client_messages
            .entry(client_id)
            .or_default()
            .push_back(message);
    }

    /// Decoded messages received by `client_id`, oldest first.
    pub fn get_sent_messages(&self, client_id: u64) -> Vec<ServerMessage> {
        self.sent_messages
            .get(&client_id)
            .map(|sent| {
                sent.iter()
                    .map(|(_, payload)| {
                        decode_from_slice::<ServerMessage, _>(payload, standard())
                            .expect("failed to deserialize ServerMessage")
                            .0
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn channels_used_for(&self, client_id: u64, variant: &str) -> Vec<AppChannel> {
        self.sent_messages
            .get(&client_id)
            .into_iter()
            .flatten()
            .filter(|(_, payload)| {
                decode_from_slice::<ServerMessage, _>(payload, standard())
                    .map(|(message, _)| message.variant_name() == variant)
                    .unwrap_or(false)
            })
            .map(|(channel, _)| *channel)
            .collect()
    }

    pub fn clear_sent_messages(&mut self) {
        for sent in self.sent_messages.values_mut() {
            sent.clear();
        }
    }
}

impl ServerNetworkHandle for MockServerNetwork {
    fn get_event(&mut self) -> Option<ServerNetworkEvent> {
        self.events_to_process.pop_front()
    }

    fn clients_id(&self) -> Vec<u64> {
        self.client_ids.clone()
    }

    fn receive_message(&mut self, client_id: u64, _channel: AppChannel) -> Option<Vec<u8>> {
        self.client_messages
            .entry(client_id)
            .or_default()
            .pop_front()
    }

    fn send_message(&mut self, client_id: u64, channel: AppChannel, message: Vec<u8>) {
        self.sent_messages
            .entry(client_id)
            .or_default()
            .push((channel, message));
    }

    fn disconnect(&mut self, client_id: u64) {
        self.disconnected_clients.push(client_id);
        self.client_ids.retain(|&id| id != client_id);
    }
}
