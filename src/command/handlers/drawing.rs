//! Drawing gesture handlers (circle, rectangle, square)

use super::HandlerContext;
use crate::command::CommandResult;
use crate::device::{with_speed, Button, DeviceResult, PointerDevice};
use futures::FutureExt;
use remote_pointer_shared::geometry::{circle_path_with_steps, rectangle_path};
use tracing::debug;

/// Handle `draw_circle`
///
/// The circle is centered on the current pointer position and traced with the
/// primary button held.
pub async fn handle_draw_circle(ctx: &mut HandlerContext<'_>, radius: f64) -> CommandResult {
    match draw_circle(ctx, radius).await {
        Ok(()) => CommandResult::done(),
        Err(e) => CommandResult::Failed {
            message: format!("Failed to draw circle: {}", e),
        },
    }
}

async fn draw_circle(ctx: &mut HandlerContext<'_>, radius: f64) -> DeviceResult<()> {
    let center = ctx.device.position().await?;
    let path = circle_path_with_steps(
        radius,
        center.x as f64,
        center.y as f64,
        ctx.settings.circle_steps,
    );
    debug!(radius, x = center.x, y = center.y, points = path.len(), "drawing circle");

    ctx.device.press_button(Button::Left).await?;
    let moved = ctx.device.move_path(&path).await;
    // Never leave the button held down
    let released = ctx.device.release_button(Button::Left).await;
    moved?;
    released
}

/// Handle `draw_rectangle`
///
/// The rectangle is anchored at the current pointer position and dragged at
/// the draw speed. The previous speed is restored whatever the outcome.
pub async fn handle_draw_rectangle(
    ctx: &mut HandlerContext<'_>,
    height: i32,
    width: i32,
) -> CommandResult {
    match draw_rectangle(ctx, height, width).await {
        Ok(()) => CommandResult::done(),
        Err(e) => CommandResult::Failed {
            message: format!("Failed to draw rectangle: {}", e),
        },
    }
}

/// Handle `draw_square`
pub async fn handle_draw_square(ctx: &mut HandlerContext<'_>, side: i32) -> CommandResult {
    match draw_rectangle(ctx, side, side).await {
        Ok(()) => CommandResult::done(),
        Err(e) => CommandResult::Failed {
            message: format!("Failed to draw square: {}", e),
        },
    }
}

async fn draw_rectangle(ctx: &mut HandlerContext<'_>, height: i32, width: i32) -> DeviceResult<()> {
    let origin = ctx.device.position().await?;
    let path = rectangle_path(origin, height, width);
    debug!(height, width, x = origin.x, y = origin.y, "drawing rectangle");

    let device: &mut dyn PointerDevice = &mut *ctx.device;
    with_speed(device, ctx.settings.draw_speed, move |d| {
        async move { d.drag(&path).await }.boxed()
    })
    .await
}
