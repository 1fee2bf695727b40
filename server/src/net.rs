use std::{net::SocketAddr, time::Duration};

use renet::{RenetServer, ServerEvent};
use renet_netcode::{ServerAuthentication, ServerConfig};

use common::net::AppChannel;

pub enum ServerNetworkEvent {
    ClientConnected { client_id: u64 },
    ClientDisconnected { client_id: u64, reason: String },
}

/// What the gateway needs from a transport. Rooms are not a transport concept,
/// so every outbound message is addressed to one client.
pub trait ServerNetworkHandle {
    fn get_event(&mut self) -> Option<ServerNetworkEvent>;
    fn clients_id(&self) -> Vec<u64>;
    fn receive_message(&mut self, client_id: u64, channel: AppChannel) -> Option<Vec<u8>>;
    fn send_message(&mut self, client_id: u64, channel: AppChannel, message: Vec<u8>);
    fn disconnect(&mut self, client_id: u64);
}

pub struct RenetServerNetworkHandle<'a> {
    pub server: &'a mut RenetServer,
}

impl ServerNetworkHandle for RenetServerNetworkHandle<'_> {
    fn get_event(&mut self) -> Option<ServerNetworkEvent> {
        self.server.get_event().map(|event| match event {
            ServerEvent::ClientConnected { client_id } => {
                ServerNetworkEvent::ClientConnected { client_id }
            }
            ServerEvent::ClientDisconnected { client_id, reason } => {
                ServerNetworkEvent::ClientDisconnected {
                    client_id,
                    reason: reason.to_string(),
                }
            }
        })
    }

    fn clients_id(&self) -> Vec<u64> {
        self.server.clients_id()
    }

    fn receive_message(&mut self, client_id: u64, channel: AppChannel) -> Option<Vec<u8>> {
        self.server
            .receive_message(client_id, channel)
            .map(|bytes| bytes.to_vec())
    }

    fn send_message(&mut self, client_id: u64, channel: AppChannel, message: Vec<u8>) {
        self.server.send_message(client_id, channel, message);
    }

    fn disconnect(&mut self, client_id: u64) {
        self.server.disconnect(client_id);
    }
}

/// Netcode without connect tokens: a participant is whoever they say they are.
pub fn build_server_config(
    current_time: Duration,
    protocol_id: u64,
    public_addr: SocketAddr,
    max_clients: usize,
) -> ServerConfig {
    ServerConfig {
        current_time,
        max_clients,
        protocol_id,
        public_addresses: vec![public_addr],
        authentication: ServerAuthentication::Unsecure,
    }
}
