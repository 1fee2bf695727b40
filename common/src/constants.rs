// Rounds:
pub const DEFAULT_ROUND_SECONDS: u32 = 60;
pub const DEFAULT_GRACE_SECONDS: u64 = 3; // Pause between a round ending and the next one starting.
pub const MIN_PARTICIPANTS: usize = 2;
pub const MAX_ROUND_SECONDS: u32 = 3600;
pub const MAX_GRACE_SECONDS: u64 = 3600;

// Scoring:
pub const GUESSER_REWARD: u32 = 100;
pub const DRAWER_REWARD: u32 = 50;

// Server:
pub const MAX_PLAYERS: usize = 10;
pub const NETCODE_MAX_CLIENTS: usize = 1024; // renetcode panics above this.
pub const DEFAULT_ROOM: &str = "main";
pub const MAX_GUESS_BYTES: usize = 64;
