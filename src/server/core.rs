use log::info;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::server::routes::build_router;
use crate::server::state::AppState;

pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    /// Prepares the storage root and binds the listener. A config built in code may use
    /// port 0 to bind a free port; loaded configs reject it in `validate`.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let storage_root = config.server.storage_root_path();
        std::fs::create_dir_all(&storage_root)?;
        info!("Storage root directory: {}", storage_root.display());

        let socket = config.server.http_socket();
        let listener = TcpListener::bind(&socket).await?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            listener,
            state: AppState::new(config)?,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn start(self) -> Result<(), ServerError> {
        info!("Starting STL Hub on {}", self.local_addr()?);
        let router = build_router(self.state);
        axum::serve(self.listener, router).await?;
        Ok(())
    }
}
