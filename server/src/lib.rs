pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod net;
pub mod registry;
pub mod run;
pub mod session;
pub mod telemetry;
pub mod words;

#[cfg(test)]
mod test_helpers;
