// Observer WebSocket protocol and per-connection handling

pub mod manager;
pub mod protocol;

pub use manager::ConnectionManager;
pub use protocol::{ClientMessage, ServerMessage};
