//! Native pointer backend
//!
//! `enigo` injects pointer input, `xcap` grabs the monitor under the capture
//! region and `image` crops and encodes it to PNG.

use super::{Button, CaptureHandle, DeviceError, DeviceResult, PointerDevice};
use crate::config::DeviceSettings;
use async_trait::async_trait;
use bytes::Bytes;
use enigo::{Coordinate, Direction as Press, Enigo, Mouse, Settings};
use remote_pointer_shared::{Direction, PathPoint, Point, Region};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// Pointer backed by the operating system
///
/// macOS: Accessibility permission required
/// Linux: X11 session required
pub struct NativeDevice {
    enigo: Enigo,
    speed: f64,
    step_interval: Duration,
    capture_dir: TempDir,
    next_capture: u64,
}

impl NativeDevice {
    pub fn new(settings: &DeviceSettings) -> DeviceResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| DeviceError::Unavailable(format!("failed to create Enigo: {e}")))?;
        let capture_dir = tempfile::Builder::new()
            .prefix(&settings.capture_dir_prefix)
            .tempdir()?;

        info!("Captures will be written to {}", capture_dir.path().display());

        Ok(Self {
            enigo,
            speed: settings.pointer_speed,
            step_interval: settings.step_interval(),
            capture_dir,
            next_capture: 0,
        })
    }

    fn location(&self) -> DeviceResult<Point> {
        let (x, y) = self
            .enigo
            .location()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        Ok(Point::new(x, y))
    }

    fn jump(&mut self, x: i32, y: i32) -> DeviceResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| DeviceError::Injection(e.to_string()))
    }

    /// Move to `target` in steps of at most `speed` pixels
    async fn glide(&mut self, target: &PathPoint) -> DeviceResult<()> {
        let from = self.location()?;
        let dx = target.x - from.x as f64;
        let dy = target.y - from.y as f64;
        let distance = dx.hypot(dy);

        let steps = glide_steps(distance, self.speed);

        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            let x = (from.x as f64 + dx * t).round() as i32;
            let y = (from.y as f64 + dy * t).round() as i32;
            self.jump(x, y)?;
            if !self.step_interval.is_zero() {
                tokio::time::sleep(self.step_interval).await;
            }
        }
        Ok(())
    }

    fn capture_path(&mut self) -> PathBuf {
        let n = self.next_capture;
        self.next_capture += 1;
        self.capture_dir.path().join(format!("capture-{n}.png"))
    }
}

/// Upper bound on interpolation steps for a single move
const MAX_GLIDE_STEPS: u32 = 32_768;

/// Number of interpolation steps for a move of `distance` at `speed`
fn glide_steps(distance: f64, speed: f64) -> u32 {
    if !(speed.is_finite() && speed > 0.0 && distance.is_finite()) {
        return 1;
    }
    (distance / speed).ceil().clamp(1.0, MAX_GLIDE_STEPS as f64) as u32
}

fn to_enigo(button: Button) -> enigo::Button {
    match button {
        Button::Left => enigo::Button::Left,
        Button::Right => enigo::Button::Right,
        Button::Middle => enigo::Button::Middle,
    }
}

/// Grab the monitor containing the region center, crop to the region
/// (clamped to that monitor) and write a PNG to `path`
fn capture_to_file(region: Region, path: &std::path::Path) -> DeviceResult<()> {
    let center_x = region.left.saturating_add((region.width / 2) as i32);
    let center_y = region.top.saturating_add((region.height / 2) as i32);

    let monitor = xcap::Monitor::from_point(center_x, center_y)
        .map_err(|e| DeviceError::Capture(format!("no monitor at {center_x},{center_y}: {e}")))?;
    let origin_x = monitor.x().map_err(|e| DeviceError::Capture(e.to_string()))?;
    let origin_y = monitor.y().map_err(|e| DeviceError::Capture(e.to_string()))?;
    let screen = monitor
        .capture_image()
        .map_err(|e| DeviceError::Capture(e.to_string()))?;

    let left = region.left.saturating_sub(origin_x).max(0) as u32;
    let top = region.top.saturating_sub(origin_y).max(0) as u32;
    let width = region.width.min(screen.width().saturating_sub(left));
    let height = region.height.min(screen.height().saturating_sub(top));
    if width == 0 || height == 0 {
        return Err(DeviceError::Capture("region is off screen".into()));
    }

    let cropped = image::imageops::crop_imm(&screen, left, top, width, height).to_image();
    cropped
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| DeviceError::Capture(e.to_string()))?;

    debug!(width, height, path = %path.display(), "region captured");
    Ok(())
}

#[async_trait]
impl PointerDevice for NativeDevice {
    async fn move_relative(&mut self, direction: Direction, pixels: i32) -> DeviceResult<()> {
        let from = self.location()?;
        let (ux, uy) = direction.unit();
        let target = PathPoint::new(
            from.x as f64 + ux.saturating_mul(pixels) as f64,
            from.y as f64 + uy.saturating_mul(pixels) as f64,
        );
        self.glide(&target).await
    }

    async fn position(&mut self) -> DeviceResult<Point> {
        self.location()
    }

    async fn press_button(&mut self, button: Button) -> DeviceResult<()> {
        self.enigo
            .button(to_enigo(button), Press::Press)
            .map_err(|e| DeviceError::Injection(e.to_string()))
    }

    async fn release_button(&mut self, button: Button) -> DeviceResult<()> {
        self.enigo
            .button(to_enigo(button), Press::Release)
            .map_err(|e| DeviceError::Injection(e.to_string()))
    }

    async fn move_path(&mut self, points: &[PathPoint]) -> DeviceResult<()> {
        for point in points {
            self.glide(point).await?;
        }
        Ok(())
    }

    async fn drag(&mut self, points: &[PathPoint]) -> DeviceResult<()> {
        self.press_button(Button::Left).await?;
        let moved = self.move_path(points).await;
        let released = self.release_button(Button::Left).await;
        moved?;
        released
    }

    async fn speed(&mut self) -> DeviceResult<f64> {
        Ok(self.speed)
    }

    async fn set_speed(&mut self, speed: f64) -> DeviceResult<()> {
        self.speed = speed;
        Ok(())
    }

    async fn capture_region(&mut self, region: Region) -> DeviceResult<CaptureHandle> {
        let path = self.capture_path();
        let target = path.clone();
        tokio::task::spawn_blocking(move || capture_to_file(region, &target))
            .await
            .map_err(|e| DeviceError::Capture(format!("capture task failed: {e}")))??;
        Ok(CaptureHandle::File(path))
    }

    async fn read_capture(&mut self, handle: &CaptureHandle) -> DeviceResult<Bytes> {
        match handle {
            CaptureHandle::File(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            CaptureHandle::Memory(id) => Err(DeviceError::Capture(format!(
                "capture {id} is not held by the native backend"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
