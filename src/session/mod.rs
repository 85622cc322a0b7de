//! Control channel sessions
//!
//! This module handles:
//! - Accepting WebSocket controllers
//! - Tracking connected sessions and the optional session cap
//! - Decoding frames and queueing commands on the shared device
//! - Relaying replies back on the originating connection

mod connection;
mod manager;

pub use connection::{serve, ControlSession};
pub use manager::{SessionInfo, SessionManager};
