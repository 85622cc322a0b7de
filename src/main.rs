mod assets;
mod command;
mod config;
mod device;
mod session;

use command::CommandExecutor;
use config::Settings;
use session::SessionManager;
use std::sync::Arc;
use tokio::net::TcpListener;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let settings = Settings::load()?;

    info!("Remote pointer starting");
    info!("  Control channel: ws://{}", settings.ws_bind);
    info!("  Assets: http://{} ({})", settings.http_bind, settings.asset_root.display());
    info!("  Device backend: {:?}", settings.device.backend);

    let device = device::create_device(&settings.device);
    info!("Pointer device: {}", device.name());

    let (device_handle, executor_task) =
        CommandExecutor::spawn(device, settings.device.clone(), settings.queue_capacity);

    let sessions = Arc::new(SessionManager::new(settings.max_sessions));

    let http_listener = TcpListener::bind(&settings.http_bind).await?;
    let asset_root = settings.asset_root.clone();
    tokio::spawn(async move {
        if let Err(e) = assets::serve_assets(http_listener, asset_root).await {
            error!("Asset server stopped: {}", e);
        }
    });

    let ws_listener = TcpListener::bind(&settings.ws_bind).await?;
    info!("Listening for controllers on {}", ws_listener.local_addr()?);

    tokio::select! {
        result = session::serve(ws_listener, sessions, device_handle) => {
            if let Err(e) = &result {
                error!("Control listener failed: {}", e);
            }
            result
        }
        _ = executor_task => {
            error!("Command executor stopped");
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
