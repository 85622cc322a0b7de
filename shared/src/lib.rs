//! Remote Pointer Shared Protocol Types
//!
//! This crate provides the text protocol, frame codec and path geometry shared
//! by the pointer control service and its clients.

pub mod codec;
pub mod geometry;
pub mod protocol;

pub use codec::{decode_frame, CodecError, RawFrame};
pub use geometry::{capture_region, circle_path, rectangle_path, PathPoint, Point, Region};
pub use protocol::{Command, CommandKind, Direction, ProtocolError, Reply};

/// Fixed protocol parameters
pub mod limits {
    /// Number of points on a `draw_circle` path, independent of radius
    pub const CIRCLE_STEPS: usize = 314;

    /// Pointer speed applied while dragging a rectangle or square
    pub const DRAW_SPEED: f64 = 20.0;

    /// Side length in pixels of the `prnt_scrn` capture square
    pub const CAPTURE_SIDE: u32 = 200;

    /// Largest inbound frame accepted (64 KiB)
    pub const MAX_FRAME_SIZE: usize = 64 * 1024;

    /// Text sent once when a controller connects
    pub const GREETING: &str = "something";
}
