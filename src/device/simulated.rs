//! In-memory pointer device
//!
//! Keeps a virtual pointer and records every call. Used as the dry-run
//! backend and by tests, which inspect it through a [`DeviceProbe`].

use super::{Button, CaptureHandle, DeviceError, DeviceResult, PointerDevice};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use remote_pointer_shared::{Direction, PathPoint, Point, Region};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Speed a fresh simulated pointer starts with
pub const DEFAULT_SIMULATED_SPEED: f64 = 10.0;

/// PNG file signature, prefixed to synthesized captures
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    MoveRelative { direction: Direction, pixels: i32 },
    Position,
    Press(Button),
    Release(Button),
    MovePath(Vec<PathPoint>),
    Drag(Vec<PathPoint>),
    Speed,
    SetSpeed(f64),
    Capture(Region),
    ReadCapture(CaptureHandle),
}

/// Operations that can be told to fail or stall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Move,
    Position,
    Drag,
    Capture,
}

#[derive(Debug)]
struct SimState {
    position: Point,
    speed: f64,
    pressed: Vec<Button>,
    journal: Vec<DeviceCall>,
    captures: HashMap<u64, Bytes>,
    next_capture_id: u64,
    capture_bytes: Option<Bytes>,
    failures: HashMap<FailPoint, String>,
    delays: HashMap<FailPoint, Duration>,
}

impl SimState {
    fn take_failure(&mut self, point: FailPoint) -> Option<String> {
        self.failures.remove(&point)
    }

    fn take_delay(&mut self, point: FailPoint) -> Option<Duration> {
        self.delays.remove(&point)
    }

    fn jump_to(&mut self, p: &PathPoint) {
        self.position = Point::new(p.x.round() as i32, p.y.round() as i32);
    }
}

/// Virtual pointer device
pub struct SimulatedDevice {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedDevice {
    /// Create a device with the pointer at the origin
    pub fn new() -> Self {
        Self::with_position(Point::default())
    }

    /// Create a device with the pointer at `position`
    pub fn with_position(position: Point) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                position,
                speed: DEFAULT_SIMULATED_SPEED,
                pressed: Vec::new(),
                journal: Vec::new(),
                captures: HashMap::new(),
                next_capture_id: 0,
                capture_bytes: None,
                failures: HashMap::new(),
                delays: HashMap::new(),
            })),
        }
    }

    /// Start with `speed` instead of the default
    pub fn with_initial_speed(self, speed: f64) -> Self {
        self.state.lock().speed = speed;
        self
    }

    /// Use fixed bytes for every subsequent capture
    pub fn set_capture_bytes(&self, bytes: impl Into<Bytes>) {
        self.state.lock().capture_bytes = Some(bytes.into());
    }

    /// Make the next call of the given kind fail with `message`
    pub fn fail_next(&self, point: FailPoint, message: impl Into<String>) {
        self.state.lock().failures.insert(point, message.into());
    }

    /// Make the next call of the given kind stall for `delay` before it
    /// takes effect
    pub fn delay_next(&self, point: FailPoint, delay: Duration) {
        self.state.lock().delays.insert(point, delay);
    }

    /// Observer that stays valid after the device is moved into an executor
    pub fn probe(&self) -> DeviceProbe {
        DeviceProbe {
            state: self.state.clone(),
        }
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [`SimulatedDevice`]
#[derive(Clone)]
pub struct DeviceProbe {
    state: Arc<Mutex<SimState>>,
}

impl DeviceProbe {
    pub fn position(&self) -> Point {
        self.state.lock().position
    }

    pub fn speed(&self) -> f64 {
        self.state.lock().speed
    }

    pub fn pressed(&self) -> Vec<Button> {
        self.state.lock().pressed.clone()
    }

    /// Every call recorded so far, in order
    pub fn journal(&self) -> Vec<DeviceCall> {
        self.state.lock().journal.clone()
    }

    /// Calls that change device state, skipping queries
    pub fn mutations(&self) -> Vec<DeviceCall> {
        self.journal()
            .into_iter()
            .filter(|c| {
                !matches!(
                    c,
                    DeviceCall::Position | DeviceCall::Speed | DeviceCall::ReadCapture(_)
                )
            })
            .collect()
    }

    pub fn fail_next(&self, point: FailPoint, message: impl Into<String>) {
        self.state.lock().failures.insert(point, message.into());
    }
}

/// Sleep for an armed delay, if any. The state lock is not held meanwhile.
async fn stall(state: &Mutex<SimState>, point: FailPoint) {
    let delay = state.lock().take_delay(point);
    if let Some(delay) = delay {
        debug!(?point, ?delay, "simulated stall");
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl PointerDevice for SimulatedDevice {
    async fn move_relative(&mut self, direction: Direction, pixels: i32) -> DeviceResult<()> {
        self.state
            .lock()
            .journal
            .push(DeviceCall::MoveRelative { direction, pixels });
        stall(&self.state, FailPoint::Move).await;

        let mut state = self.state.lock();
        if let Some(msg) = state.take_failure(FailPoint::Move) {
            return Err(DeviceError::Injection(msg));
        }

        let (dx, dy) = direction.unit();
        state.position.x = state.position.x.saturating_add(dx.saturating_mul(pixels));
        state.position.y = state.position.y.saturating_add(dy.saturating_mul(pixels));
        debug!(x = state.position.x, y = state.position.y, "simulated move");
        Ok(())
    }

    async fn position(&mut self) -> DeviceResult<Point> {
        self.state.lock().journal.push(DeviceCall::Position);
        stall(&self.state, FailPoint::Position).await;

        let mut state = self.state.lock();
        if let Some(msg) = state.take_failure(FailPoint::Position) {
            return Err(DeviceError::Unavailable(msg));
        }
        Ok(state.position)
    }

    async fn press_button(&mut self, button: Button) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.journal.push(DeviceCall::Press(button));
        if !state.pressed.contains(&button) {
            state.pressed.push(button);
        }
        Ok(())
    }

    async fn release_button(&mut self, button: Button) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.journal.push(DeviceCall::Release(button));
        state.pressed.retain(|b| *b != button);
        Ok(())
    }

    async fn move_path(&mut self, points: &[PathPoint]) -> DeviceResult<()> {
        self.state
            .lock()
            .journal
            .push(DeviceCall::MovePath(points.to_vec()));
        stall(&self.state, FailPoint::Move).await;

        let mut state = self.state.lock();
        if let Some(msg) = state.take_failure(FailPoint::Move) {
            return Err(DeviceError::Injection(msg));
        }
        if let Some(last) = points.last() {
            state.jump_to(last);
        }
        Ok(())
    }

    async fn drag(&mut self, points: &[PathPoint]) -> DeviceResult<()> {
        self.state.lock().journal.push(DeviceCall::Drag(points.to_vec()));
        stall(&self.state, FailPoint::Drag).await;

        let mut state = self.state.lock();

        // A failed drag stops after the first segment with the button released
        if let Some(msg) = state.take_failure(FailPoint::Drag) {
            if let Some(first) = points.first() {
                state.jump_to(first);
            }
            return Err(DeviceError::Injection(msg));
        }

        if let Some(last) = points.last() {
            state.jump_to(last);
        }
        Ok(())
    }

    async fn speed(&mut self) -> DeviceResult<f64> {
        let mut state = self.state.lock();
        state.journal.push(DeviceCall::Speed);
        Ok(state.speed)
    }

    async fn set_speed(&mut self, speed: f64) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.journal.push(DeviceCall::SetSpeed(speed));
        state.speed = speed;
        Ok(())
    }

    async fn capture_region(&mut self, region: Region) -> DeviceResult<CaptureHandle> {
        self.state.lock().journal.push(DeviceCall::Capture(region));
        stall(&self.state, FailPoint::Capture).await;

        let mut state = self.state.lock();
        if let Some(msg) = state.take_failure(FailPoint::Capture) {
            return Err(DeviceError::Capture(msg));
        }

        let bytes = match &state.capture_bytes {
            Some(bytes) => bytes.clone(),
            None => {
                let mut synthesized = PNG_SIGNATURE.to_vec();
                synthesized.extend_from_slice(
                    format!(
                        "{},{} {}x{}",
                        region.left, region.top, region.width, region.height
                    )
                    .as_bytes(),
                );
                Bytes::from(synthesized)
            }
        };

        let id = state.next_capture_id;
        state.next_capture_id += 1;
        state.captures.insert(id, bytes);
        Ok(CaptureHandle::Memory(id))
    }

    async fn read_capture(&mut self, handle: &CaptureHandle) -> DeviceResult<Bytes> {
        let path = {
            let mut state = self.state.lock();
            state.journal.push(DeviceCall::ReadCapture(handle.clone()));
            match handle {
                CaptureHandle::Memory(id) => {
                    return state.captures.get(id).cloned().ok_or_else(|| {
                        DeviceError::Capture(format!("no capture with id {}", id))
                    });
                }
                CaptureHandle::File(path) => path.clone(),
            }
        };

        Ok(Bytes::from(tokio::fs::read(path).await?))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
