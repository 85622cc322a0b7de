//! Command executor - owns the device and runs commands one at a time

use super::handlers::{self, HandlerContext};
use crate::config::DeviceSettings;
use crate::device::PointerDevice;
use remote_pointer_shared::{Command, Reply};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outbound reply queue of one session
pub type ReplySink = mpsc::UnboundedSender<Reply>;

/// Result of command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Command completed, optionally with a reply frame
    Completed { reply: Option<Reply> },
    /// The device failed while executing the command
    Failed { message: String },
}

impl CommandResult {
    pub fn done() -> Self {
        CommandResult::Completed { reply: None }
    }

    pub fn reply(reply: Reply) -> Self {
        CommandResult::Completed { reply: Some(reply) }
    }
}

/// Why a command could not be queued without waiting
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("device busy")]
    Busy,
    #[error("device executor stopped")]
    Stopped,
}

/// A command waiting for the device
struct Job {
    session_id: u64,
    command: Command,
    reply: ReplySink,
}

/// Cloneable handle for queueing commands on the device
#[derive(Clone)]
pub struct DeviceHandle {
    jobs: mpsc::Sender<Job>,
}

impl DeviceHandle {
    /// Queue a command for execution.
    ///
    /// Never waits: returns once the command is queued, or `Busy` when the
    /// queue is full. Any reply is delivered to `reply` when the command
    /// completes.
    pub fn submit(
        &self,
        session_id: u64,
        command: Command,
        reply: ReplySink,
    ) -> Result<(), SubmitError> {
        self.jobs
            .try_send(Job {
                session_id,
                command,
                reply,
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => SubmitError::Busy,
                TrySendError::Closed(_) => SubmitError::Stopped,
            })
    }
}

/// Executes commands against the device, strictly in arrival order
pub struct CommandExecutor {
    device: Box<dyn PointerDevice>,
    settings: DeviceSettings,
    jobs: mpsc::Receiver<Job>,
    executed: u64,
}

impl CommandExecutor {
    /// Create an executor and the handle that feeds it
    pub fn new(
        device: Box<dyn PointerDevice>,
        settings: DeviceSettings,
        capacity: usize,
    ) -> (Self, DeviceHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let executor = Self {
            device,
            settings,
            jobs: rx,
            executed: 0,
        };
        (executor, DeviceHandle { jobs: tx })
    }

    /// Create an executor and run it on its own task
    pub fn spawn(
        device: Box<dyn PointerDevice>,
        settings: DeviceSettings,
        capacity: usize,
    ) -> (DeviceHandle, JoinHandle<()>) {
        let (executor, handle) = Self::new(device, settings, capacity);
        let task = tokio::spawn(executor.run());
        (handle, task)
    }

    /// Run until every `DeviceHandle` is dropped
    pub async fn run(mut self) {
        info!("Command executor started ({} device)", self.device.name());

        while let Some(job) = self.jobs.recv().await {
            let kind = job.command.kind();
            let started = Instant::now();

            debug!(session = job.session_id, "Executing command: {}", kind);
            let result = self.execute(&job.command).await;
            self.executed += 1;

            let reply = match result {
                CommandResult::Completed { reply } => {
                    debug!(
                        session = job.session_id,
                        "Command {} completed in {:?}",
                        kind,
                        started.elapsed()
                    );
                    reply
                }
                CommandResult::Failed { message } => {
                    warn!(session = job.session_id, "Command {} failed: {}", kind, message);
                    Some(Reply::Error {
                        command: kind.as_str().to_owned(),
                        message,
                    })
                }
            };

            if let Some(reply) = reply {
                if job.reply.send(reply).is_err() {
                    debug!(session = job.session_id, "Session closed before reply to {}", kind);
                }
            }
        }

        info!("Command executor stopped after {} commands", self.executed);
    }

    /// Dispatch one command to its handler
    pub async fn execute(&mut self, command: &Command) -> CommandResult {
        let mut ctx = HandlerContext {
            device: self.device.as_mut(),
            settings: &self.settings,
        };

        match *command {
            Command::MoveRelative { direction, pixels } => {
                handlers::handle_move_relative(&mut ctx, direction, pixels).await
            }
            Command::MousePosition => handlers::handle_mouse_position(&mut ctx).await,
            Command::DrawCircle { radius } => handlers::handle_draw_circle(&mut ctx, radius).await,
            Command::DrawRectangle { height, width } => {
                handlers::handle_draw_rectangle(&mut ctx, height, width).await
            }
            Command::DrawSquare { side } => handlers::handle_draw_square(&mut ctx, side).await,
            Command::PrintScreen => handlers::handle_print_screen(&mut ctx).await,
        }
    }
}
