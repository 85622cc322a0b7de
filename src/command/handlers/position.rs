//! Pointer position query handler

use super::HandlerContext;
use crate::command::CommandResult;
use remote_pointer_shared::Reply;

/// Handle `mouse_position`
pub async fn handle_mouse_position(ctx: &mut HandlerContext<'_>) -> CommandResult {
    match ctx.device.position().await {
        Ok(p) => CommandResult::reply(Reply::MousePosition { x: p.x, y: p.y }),
        Err(e) => CommandResult::Failed {
            message: format!("Failed to read pointer position: {}", e),
        },
    }
}
