use std::{
    io, process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use server::{config::ServerConfig, run, telemetry};

fn main() {
    telemetry::init_tracing();

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Server shutting down.");
        handler_flag.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Error: Failed to set Ctrl-C handler.");
        eprintln!("Details: {}.", e);
        process::exit(1);
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Invalid configuration.");
            eprintln!("Details: {}.", e);
            process::exit(1);
        }
    };

    let socket = match common::net::bind_socket(config.address) {
        Ok(socket) => {
            println!("Server listening on {}.", config.address);
            socket
        }
        Err(e) => {
            eprintln!("Error: Failed to bind socket.");
            eprintln!("Details: {}.", e);
            if e.kind() == io::ErrorKind::AddrInUse {
                eprintln!("Is another instance of the server already running?");
            }
            process::exit(1);
        }
    };

    if let Err(e) = run::run_server(socket, config, running) {
        eprintln!("Error: {}.", e);
        process::exit(1);
    }
}
