//! WebSocket relay: client registry and upgrade handler.

pub mod handler;
pub mod registry;

pub use handler::prices_ws_handler;
pub use registry::{ClientRegistry, CLIENT_BUFFER};
