//! Command and reply grammar of the control channel

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::codec::RawFrame;
use crate::limits::GREETING;

/// Errors produced while turning a frame into a typed command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command")]
    UnknownCommand(String),

    #[error("expected {expected} argument(s), got {got}")]
    ArgumentCount {
        kind: CommandKind,
        expected: usize,
        got: usize,
    },

    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber {
        kind: CommandKind,
        field: &'static str,
        value: String,
    },
}

impl ProtocolError {
    /// Command name the error refers to, as received
    pub fn command(&self) -> &str {
        match self {
            ProtocolError::UnknownCommand(name) => name,
            ProtocolError::ArgumentCount { kind, .. } => kind.as_str(),
            ProtocolError::InvalidNumber { kind, .. } => kind.as_str(),
        }
    }
}

/// The closed set of command names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    MouseLeft,
    MouseRight,
    MouseUp,
    MouseDown,
    MousePosition,
    DrawCircle,
    DrawRectangle,
    DrawSquare,
    PrintScreen,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::MouseLeft,
        CommandKind::MouseRight,
        CommandKind::MouseUp,
        CommandKind::MouseDown,
        CommandKind::MousePosition,
        CommandKind::DrawCircle,
        CommandKind::DrawRectangle,
        CommandKind::DrawSquare,
        CommandKind::PrintScreen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::MouseLeft => "mouse_left",
            CommandKind::MouseRight => "mouse_right",
            CommandKind::MouseUp => "mouse_up",
            CommandKind::MouseDown => "mouse_down",
            CommandKind::MousePosition => "mouse_position",
            CommandKind::DrawCircle => "draw_circle",
            CommandKind::DrawRectangle => "draw_rectangle",
            CommandKind::DrawSquare => "draw_square",
            CommandKind::PrintScreen => "prnt_scrn",
        }
    }

    /// Number of positional arguments the command takes
    pub fn arity(&self) -> usize {
        match self {
            CommandKind::MousePosition | CommandKind::PrintScreen => 0,
            CommandKind::DrawRectangle => 2,
            _ => 1,
        }
    }
}

impl FromStr for CommandKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_owned()))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a relative pointer move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit offset in screen space (y grows downwards)
    pub fn unit(&self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

/// A validated command ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MoveRelative { direction: Direction, pixels: i32 },
    MousePosition,
    DrawCircle { radius: f64 },
    DrawRectangle { height: i32, width: i32 },
    DrawSquare { side: i32 },
    PrintScreen,
}

impl Command {
    /// Validate a frame against the command table
    pub fn parse(frame: &RawFrame) -> Result<Self, ProtocolError> {
        let kind: CommandKind = frame.name.parse()?;

        if frame.args.len() != kind.arity() {
            return Err(ProtocolError::ArgumentCount {
                kind,
                expected: kind.arity(),
                got: frame.args.len(),
            });
        }

        let args = &frame.args;
        let command = match kind {
            CommandKind::MouseLeft => move_by(kind, Direction::Left, &args[0])?,
            CommandKind::MouseRight => move_by(kind, Direction::Right, &args[0])?,
            CommandKind::MouseUp => move_by(kind, Direction::Up, &args[0])?,
            CommandKind::MouseDown => move_by(kind, Direction::Down, &args[0])?,
            CommandKind::MousePosition => Command::MousePosition,
            CommandKind::DrawCircle => Command::DrawCircle {
                radius: number(kind, "radius", &args[0])?,
            },
            CommandKind::DrawRectangle => Command::DrawRectangle {
                height: number(kind, "height", &args[0])?,
                width: number(kind, "width", &args[1])?,
            },
            CommandKind::DrawSquare => Command::DrawSquare {
                side: number(kind, "side", &args[0])?,
            },
            CommandKind::PrintScreen => Command::PrintScreen,
        };

        Ok(command)
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::MoveRelative { direction, .. } => match direction {
                Direction::Left => CommandKind::MouseLeft,
                Direction::Right => CommandKind::MouseRight,
                Direction::Up => CommandKind::MouseUp,
                Direction::Down => CommandKind::MouseDown,
            },
            Command::MousePosition => CommandKind::MousePosition,
            Command::DrawCircle { .. } => CommandKind::DrawCircle,
            Command::DrawRectangle { .. } => CommandKind::DrawRectangle,
            Command::DrawSquare { .. } => CommandKind::DrawSquare,
            Command::PrintScreen => CommandKind::PrintScreen,
        }
    }
}

fn move_by(kind: CommandKind, direction: Direction, raw: &str) -> Result<Command, ProtocolError> {
    Ok(Command::MoveRelative {
        direction,
        pixels: number(kind, "pixels", raw)?,
    })
}

fn number<T: FromStr>(
    kind: CommandKind,
    field: &'static str,
    raw: &str,
) -> Result<T, ProtocolError> {
    raw.parse().map_err(|_| ProtocolError::InvalidNumber {
        kind,
        field,
        value: raw.to_owned(),
    })
}

/// Outbound frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Greeting,
    MousePosition { x: i32, y: i32 },
    PrintScreen { base64: String },
    Error { command: String, message: String },
}

impl Reply {
    /// Error reply for a frame that failed validation
    pub fn rejected(err: &ProtocolError) -> Self {
        Reply::Error {
            command: err.command().to_owned(),
            message: err.to_string(),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Reply::Greeting => GREETING.to_owned(),
            Reply::MousePosition { x, y } => format!("mouse_position {},{}", x, y),
            Reply::PrintScreen { base64 } => format!("prnt_scrn {}", base64),
            Reply::Error { command, message } => {
                let command = if command.is_empty() { "-" } else { command };
                format!("error {} {}", command, message)
            }
        }
    }
}
