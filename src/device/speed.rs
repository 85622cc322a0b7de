//! Scoped speed override

use super::{DeviceResult, PointerDevice};
use futures::future::BoxFuture;
use tracing::{debug, warn};

/// Run `op` with the device speed set to `speed`, then put the previous speed
/// back whether `op` succeeded or failed.
///
/// A failed `op` wins over a failed restore so the caller sees the original
/// cause.
pub async fn with_speed<T, F>(
    device: &mut dyn PointerDevice,
    speed: f64,
    op: F,
) -> DeviceResult<T>
where
    F: for<'a> FnOnce(&'a mut dyn PointerDevice) -> BoxFuture<'a, DeviceResult<T>>,
{
    let saved = device.speed().await?;
    device.set_speed(speed).await?;
    debug!(saved, speed, "speed override");

    let result = op(&mut *device).await;

    let restored = device.set_speed(saved).await;
    if let Err(ref e) = restored {
        warn!("failed to restore speed {}: {}", saved, e);
    }

    let value = result?;
    restored?;
    Ok(value)
}
