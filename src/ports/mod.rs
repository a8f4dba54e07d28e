//! Port traits: the seams between the domain and the outside world.

pub mod config_port;
pub mod terminal_port;
