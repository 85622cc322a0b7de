//! Individual controller session handling

use super::SessionManager;
use crate::command::{DeviceHandle, ReplySink, SubmitError};
use anyhow::{anyhow, Result};
use futures::{SinkExt, StreamExt};
use remote_pointer_shared::{decode_frame, Command, Reply};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

/// One open control channel
pub struct ControlSession<S> {
    id: u64,
    addr: SocketAddr,
    ws: WebSocketStream<S>,
    device: DeviceHandle,
}

impl<S> ControlSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Perform the WebSocket handshake on a raw stream
    pub async fn accept(stream: S, id: u64, addr: SocketAddr, device: DeviceHandle) -> Result<Self> {
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| anyhow!("WebSocket handshake with {} failed: {}", addr, e))?;
        Ok(Self {
            id,
            addr,
            ws,
            device,
        })
    }

    /// Run the session until the controller disconnects.
    ///
    /// Replies are written by a separate task so frames keep being read while
    /// earlier commands wait for the device.
    pub async fn run(self) -> Result<()> {
        let Self {
            id,
            addr,
            ws,
            device,
        } = self;
        let (mut sink, mut stream) = ws.split();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Reply>();

        tokio::spawn(async move {
            while let Some(reply) = reply_rx.recv().await {
                if let Err(e) = sink.send(Message::text(reply.encode())).await {
                    debug!(session = id, "Write to {} failed: {}", addr, e);
                    return;
                }
            }
            let _ = sink.close().await;
        });

        let _ = reply_tx.send(Reply::Greeting);

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    handle_frame(id, text.as_str().as_bytes(), &device, &reply_tx)?;
                }
                Ok(Message::Binary(data)) => {
                    handle_frame(id, &data[..], &device, &reply_tx)?;
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {} // Ping/Pong are answered by the protocol layer
                Err(e) => {
                    warn!(session = id, "Read error from {}: {}", addr, e);
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Decode one frame and queue it, or answer with an error frame.
///
/// Never waits on the device, so the read loop keeps draining frames while
/// earlier commands are still queued.
fn handle_frame(
    session_id: u64,
    payload: &[u8],
    device: &DeviceHandle,
    reply: &ReplySink,
) -> Result<()> {
    let frame = match decode_frame(payload) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(session = session_id, "Dropping undecodable frame: {}", e);
            let _ = reply.send(Reply::Error {
                command: String::new(),
                message: e.to_string(),
            });
            return Ok(());
        }
    };

    debug!(session = session_id, "received: {} {:?}", frame.name, frame.args);

    match Command::parse(&frame) {
        Ok(command) => {
            let kind = command.kind();
            match device.submit(session_id, command, reply.clone()) {
                Ok(()) => Ok(()),
                Err(SubmitError::Busy) => {
                    warn!(session = session_id, "Device queue full, dropping {}", kind);
                    let _ = reply.send(Reply::Error {
                        command: kind.as_str().to_owned(),
                        message: SubmitError::Busy.to_string(),
                    });
                    Ok(())
                }
                Err(e @ SubmitError::Stopped) => Err(anyhow!(e)),
            }
        }
        Err(e) => {
            debug!(session = session_id, "Rejected frame: {}", e);
            let _ = reply.send(Reply::rejected(&e));
            Ok(())
        }
    }
}

/// Accept controllers on `listener` until it fails
pub async fn serve(
    listener: TcpListener,
    sessions: Arc<SessionManager>,
    device: DeviceHandle,
) -> Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;

        let sessions = sessions.clone();
        let device = device.clone();
        tokio::spawn(async move {
            let Some(id) = sessions.register(addr).await else {
                warn!("Refusing controller {}: session limit reached", addr);
                refuse(stream, addr).await;
                return;
            };
            info!(session = id, "Controller connected: {}", addr);

            match ControlSession::accept(stream, id, addr, device).await {
                Ok(session) => {
                    if let Err(e) = session.run().await {
                        error!(session = id, "Session error: {}", e);
                    }
                }
                Err(e) => warn!(session = id, "{}", e),
            }

            sessions.unregister(id).await;
            info!(session = id, "Controller disconnected: {}", addr);
        });
    }
}

/// Complete the handshake only to tell the controller it was not admitted
async fn refuse<S>(stream: S, addr: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let reply = Reply::Error {
        command: String::new(),
        message: "session limit reached".into(),
    };
    if let Err(e) = ws.send(Message::text(reply.encode())).await {
        debug!("Failed to notify {}: {}", addr, e);
    }
    let _ = ws.close(None).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandExecutor;
    use crate::config::DeviceSettings;
    use crate::device::{DeviceCall, DeviceProbe, FailPoint, SimulatedDevice};
    use remote_pointer_shared::{Direction, Point};
    use std::time::Duration;
    use tokio::io::DuplexStream;

    type Client = WebSocketStream<DuplexStream>;

    async fn connect(device: SimulatedDevice) -> (Client, DeviceProbe) {
        let probe = device.probe();
        let (handle, _task) =
            CommandExecutor::spawn(Box::new(device), DeviceSettings::default(), 8);
        (connect_handle(handle).await, probe)
    }

    async fn connect_handle(handle: DeviceHandle) -> Client {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();

        tokio::spawn(async move {
            let session = ControlSession::accept(server_io, 1, addr, handle)
                .await
                .expect("handshake");
            session.run().await.expect("session");
        });

        let (client, _) = tokio_tungstenite::client_async("ws://localhost/", client_io)
            .await
            .expect("client handshake");
        client
    }

    async fn next_text(client: &mut Client) -> String {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                other => panic!("expected text frame, got {:?}", other),
            }
        }
    }

    async fn send(client: &mut Client, line: &str) {
        client.send(Message::text(line)).await.expect("send");
    }

    #[tokio::test]
    async fn test_greeting_sent_on_connect() {
        let (mut client, _probe) = connect(SimulatedDevice::new()).await;
        assert_eq!(next_text(&mut client).await, "something");
    }

    #[tokio::test]
    async fn test_mouse_position_round_trip() {
        let (mut client, _probe) = connect(SimulatedDevice::with_position(Point::new(100, 200))).await;
        next_text(&mut client).await;

        send(&mut client, "mouse_position").await;
        assert_eq!(next_text(&mut client).await, "mouse_position 100,200");
    }

    #[tokio::test]
    async fn test_unknown_command_keeps_session_alive() {
        let (mut client, probe) = connect(SimulatedDevice::with_position(Point::new(100, 200))).await;
        next_text(&mut client).await;

        send(&mut client, "foo bar").await;
        assert_eq!(next_text(&mut client).await, "error foo unknown command");

        send(&mut client, "mouse_left 10").await;
        send(&mut client, "mouse_position").await;
        assert_eq!(next_text(&mut client).await, "mouse_position 90,200");
        assert!(probe.journal().contains(&DeviceCall::MoveRelative {
            direction: Direction::Left,
            pixels: 10
        }));
    }

    #[tokio::test]
    async fn test_invalid_argument_not_dispatched() {
        let (mut client, probe) = connect(SimulatedDevice::new()).await;
        next_text(&mut client).await;

        send(&mut client, "mouse_up abc").await;
        assert_eq!(
            next_text(&mut client).await,
            "error mouse_up invalid number for pixels: \"abc\""
        );
        assert!(probe.journal().is_empty());
    }

    #[tokio::test]
    async fn test_binary_frame_decoded_as_text() {
        let (mut client, _probe) = connect(SimulatedDevice::with_position(Point::new(3, 4))).await;
        next_text(&mut client).await;

        client
            .send(Message::binary(b"mouse_position\n".to_vec()))
            .await
            .unwrap();
        assert_eq!(next_text(&mut client).await, "mouse_position 3,4");
    }

    #[tokio::test]
    async fn test_print_screen_reply() {
        let device = SimulatedDevice::with_position(Point::new(300, 300));
        device.set_capture_bytes(&b"hi"[..]);
        let (mut client, _probe) = connect(device).await;
        next_text(&mut client).await;

        send(&mut client, "prnt_scrn").await;
        assert_eq!(next_text(&mut client).await, "prnt_scrn aGk=");
    }

    #[tokio::test]
    async fn test_frames_answered_while_device_stalled() {
        let device = SimulatedDevice::with_position(Point::new(50, 50));
        device.delay_next(FailPoint::Drag, Duration::from_millis(500));
        let (mut client, probe) = connect(device).await;
        next_text(&mut client).await;

        send(&mut client, "draw_rectangle 10 10").await;
        send(&mut client, "foo").await;
        assert_eq!(next_text(&mut client).await, "error foo unknown command");

        // The drag is still in flight
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(probe.speed(), 20.0);
        assert!(matches!(probe.journal().last(), Some(DeviceCall::Drag(_))));

        send(&mut client, "mouse_position").await;
        assert_eq!(next_text(&mut client).await, "mouse_position 50,50");
        assert_eq!(probe.speed(), 10.0);
    }

    #[tokio::test]
    async fn test_full_queue_replies_busy() {
        // An executor that never runs keeps its queue full
        let (executor, handle) =
            CommandExecutor::new(Box::new(SimulatedDevice::new()), DeviceSettings::default(), 1);
        let mut client = connect_handle(handle).await;
        next_text(&mut client).await;

        send(&mut client, "mouse_left 1").await;
        send(&mut client, "mouse_left 2").await;
        assert_eq!(next_text(&mut client).await, "error mouse_left device busy");

        send(&mut client, "foo").await;
        assert_eq!(next_text(&mut client).await, "error foo unknown command");
        drop(executor);
    }

    #[tokio::test]
    async fn test_serve_enforces_session_limit() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sessions = Arc::new(SessionManager::new(Some(1)));
        let (handle, _task) = CommandExecutor::spawn(
            Box::new(SimulatedDevice::new()),
            DeviceSettings::default(),
            8,
        );
        tokio::spawn(serve(listener, sessions.clone(), handle));

        let url = format!("ws://{}", addr);
        let (mut first, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        assert_eq!(
            match first.next().await {
                Some(Ok(Message::Text(t))) => t.as_str().to_owned(),
                other => panic!("unexpected {:?}", other),
            },
            "something"
        );

        let (mut second, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        match second.next().await {
            Some(Ok(Message::Text(t))) => {
                assert_eq!(t.as_str(), "error - session limit reached")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(sessions.count().await, 1);
    }
}
