//! Screen capture handler

use super::HandlerContext;
use crate::command::CommandResult;
use crate::device::DeviceResult;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use remote_pointer_shared::{capture_region, Reply};
use tracing::debug;

/// Handle `prnt_scrn`
///
/// Captures a square around the pointer and replies with the image as base64.
pub async fn handle_print_screen(ctx: &mut HandlerContext<'_>) -> CommandResult {
    match capture(ctx).await {
        Ok(base64) => CommandResult::reply(Reply::PrintScreen { base64 }),
        Err(e) => CommandResult::Failed {
            message: format!("Failed to capture screen: {}", e),
        },
    }
}

async fn capture(ctx: &mut HandlerContext<'_>) -> DeviceResult<String> {
    let center = ctx.device.position().await?;
    let region = capture_region(center, ctx.settings.capture_side);

    let handle = ctx.device.capture_region(region).await?;
    let bytes = ctx.device.read_capture(&handle).await?;
    debug!(?region, bytes = bytes.len(), "screen captured");

    Ok(STANDARD.encode(&bytes))
}
