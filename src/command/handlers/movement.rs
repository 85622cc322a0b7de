//! Relative pointer movement handler

use super::HandlerContext;
use crate::command::CommandResult;
use remote_pointer_shared::Direction;
use tracing::debug;

/// Handle `mouse_left` / `mouse_right` / `mouse_up` / `mouse_down`
pub async fn handle_move_relative(
    ctx: &mut HandlerContext<'_>,
    direction: Direction,
    pixels: i32,
) -> CommandResult {
    debug!(?direction, pixels, "moving pointer");

    match ctx.device.move_relative(direction, pixels).await {
        Ok(()) => CommandResult::done(),
        Err(e) => CommandResult::Failed {
            message: format!("Failed to move pointer: {}", e),
        },
    }
}
