//! Pointer device abstraction for pluggable actuation backends

use super::DeviceResult;
use async_trait::async_trait;
use bytes::Bytes;
use remote_pointer_shared::{Direction, PathPoint, Point, Region};
use std::path::PathBuf;

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Middle,
}

/// Reference to a captured image held by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureHandle {
    /// Image written to a file on disk
    File(PathBuf),
    /// Image kept in memory under an id
    Memory(u64),
}

/// Physical pointer and screen capture collaborator.
///
/// Pointer position and speed are a single global resource, so a device is
/// owned by exactly one executor and every method takes `&mut self`.
#[async_trait]
pub trait PointerDevice: Send {
    /// Move the pointer by `pixels` in `direction`, paced by the current speed
    async fn move_relative(&mut self, direction: Direction, pixels: i32) -> DeviceResult<()>;

    /// Current pointer location
    async fn position(&mut self) -> DeviceResult<Point>;

    async fn press_button(&mut self, button: Button) -> DeviceResult<()>;

    async fn release_button(&mut self, button: Button) -> DeviceResult<()>;

    /// Move through every point in order without touching button state
    async fn move_path(&mut self, points: &[PathPoint]) -> DeviceResult<()>;

    /// Press the primary button, move through `points`, release.
    ///
    /// The button must be released even when a move fails.
    async fn drag(&mut self, points: &[PathPoint]) -> DeviceResult<()>;

    /// Movement speed in pixels per step
    async fn speed(&mut self) -> DeviceResult<f64>;

    async fn set_speed(&mut self, speed: f64) -> DeviceResult<()>;

    /// Capture a screen region and keep the image for `read_capture`
    async fn capture_region(&mut self, region: Region) -> DeviceResult<CaptureHandle>;

    /// Read the encoded bytes of a previous capture
    async fn read_capture(&mut self, handle: &CaptureHandle) -> DeviceResult<Bytes>;

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}
