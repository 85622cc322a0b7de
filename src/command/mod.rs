//! Command execution for the pointer device
//!
//! This module handles:
//! - Serializing commands from every session onto the single device
//! - Dispatching each command to its handler
//! - Routing replies and failures back to the originating session

mod executor;
pub mod handlers;

pub use executor::{CommandExecutor, CommandResult, DeviceHandle, ReplySink, SubmitError};
