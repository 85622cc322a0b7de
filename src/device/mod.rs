//! Pointer device collaborators
//!
//! This module handles:
//! - The `PointerDevice` abstraction over pointer actuation and capture
//! - A simulated backend for dry runs and tests
//! - The native backend (feature `native`)
//! - Scoped overrides of the shared pointer speed

mod error;
mod simulated;
mod speed;
mod traits;

#[cfg(feature = "native")]
mod native;

pub use error::{DeviceError, DeviceResult};
pub use simulated::{DeviceCall, DeviceProbe, FailPoint, SimulatedDevice};
pub use speed::with_speed;
pub use traits::{Button, CaptureHandle, PointerDevice};

#[cfg(feature = "native")]
pub use native::NativeDevice;

use crate::config::{DeviceBackend, DeviceSettings};
use tracing::{info, warn};

/// Create the configured device backend.
///
/// Falls back to the simulated device when the native backend is not compiled
/// in or cannot be initialized.
pub fn create_device(settings: &DeviceSettings) -> Box<dyn PointerDevice> {
    if settings.backend == DeviceBackend::Native {
        #[cfg(feature = "native")]
        {
            match NativeDevice::new(settings) {
                Ok(device) => {
                    info!("Native pointer device initialized");
                    return Box::new(device);
                }
                Err(e) => warn!("Native device unavailable, using simulated pointer: {}", e),
            }
        }

        #[cfg(not(feature = "native"))]
        warn!("Built without the `native` feature, using simulated pointer");
    }

    info!("Simulated pointer device initialized");
    Box::new(SimulatedDevice::new().with_initial_speed(settings.pointer_speed))
}
