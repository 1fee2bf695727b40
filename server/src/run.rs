use std::{
    net::{SocketAddr, UdpSocket},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use renet::RenetServer;
use renet_netcode::NetcodeServerTransport;
use tracing::info;

use crate::{
    config::ServerConfig,
    directory::SessionDirectory,
    error::RunError,
    gateway,
    net::{self, RenetServerNetworkHandle},
};

pub fn run_server(
    socket: UdpSocket,
    config: ServerConfig,
    running: Arc<AtomicBool>,
) -> Result<(), RunError> {
    let current_time = SystemTime::now().duration_since(UNIX_EPOCH)?;
    let protocol_id = common::protocol::version();

    let server_config = net::build_server_config(
        current_time,
        protocol_id,
        config.address,
        config.max_clients,
    );
    let mut transport = NetcodeServerTransport::new(server_config, socket)?;
    let connection_config = common::net::connection_config();
    let mut server = RenetServer::new(connection_config);
    let mut directory = SessionDirectory::new(config.game.clone(), config.words.clone());

    print_server_banner(protocol_id, config.address, &config);
    server_loop(&mut server, &mut transport, &mut directory, &running)?;

    server.disconnect_all();
    transport.send_packets(&mut server);
    info!("server shutting down");
    Ok(())
}

fn print_server_banner(protocol_id: u64, server_addr: SocketAddr, config: &ServerConfig) {
    println!("  Game version:   {}", protocol_id);
    println!("  Server address: {}", server_addr);
    println!("  Round length:   {}s", config.game.round_secs);
    println!("  Word list:      {} words", config.words.len());
}

fn server_loop(
    server: &mut RenetServer,
    transport: &mut NetcodeServerTransport,
    directory: &mut SessionDirectory,
    running: &AtomicBool,
) -> Result<(), RunError> {
    let mut last_updated = Instant::now();

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        let duration = now - last_updated;
        last_updated = now;

        transport.update(duration, server)?;
        server.update(duration);

        let mut network_handle = RenetServerNetworkHandle { server };
        gateway::update(&mut network_handle, directory, now);

        transport.send_packets(server);
        thread::sleep(Duration::from_millis(16));
    }

    Ok(())
}
