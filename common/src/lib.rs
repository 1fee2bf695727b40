pub mod constants;
pub mod names;
pub mod net;
pub mod protocol;
