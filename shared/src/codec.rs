//! Text frame codec
//!
//! Every inbound frame is one command line:
//! ```text
//! <command> <arg1> <arg2> ...
//! ```
//!
//! The frame is decoded as UTF-8, trimmed, then split on single spaces.
//! Consecutive spaces are not collapsed and produce empty arguments.

use thiserror::Error;

use crate::limits::MAX_FRAME_SIZE;

/// Errors that can occur while decoding an inbound frame
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Frame too large: {0} bytes (max: {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),

    #[error("Frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// A command line split into its name and positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub name: String,
    pub args: Vec<String>,
}

impl RawFrame {
    /// Split an already decoded line into a frame
    pub fn split(line: &str) -> Self {
        let mut parts = line.trim().split(' ').map(str::to_owned);
        let name = parts.next().unwrap_or_default();
        Self {
            name,
            args: parts.collect(),
        }
    }
}

/// Decode a raw frame payload into a command line
pub fn decode_frame(payload: &[u8]) -> Result<RawFrame, CodecError> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge(payload.len()));
    }

    let text = std::str::from_utf8(payload)?;
    Ok(RawFrame::split(text))
}
