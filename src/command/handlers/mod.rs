//! Command handlers for the control commands

mod capture;
mod drawing;
mod movement;
mod position;

pub use capture::handle_print_screen;
pub use drawing::{handle_draw_circle, handle_draw_rectangle, handle_draw_square};
pub use movement::handle_move_relative;
pub use position::handle_mouse_position;

use crate::config::DeviceSettings;
use crate::device::PointerDevice;

/// Context passed to command handlers
pub struct HandlerContext<'a> {
    pub device: &'a mut dyn PointerDevice,
    pub settings: &'a DeviceSettings,
}
