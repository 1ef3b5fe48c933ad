//! HTTP server lifecycle

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::routes::{router, AppState};

/// Chat gateway server
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a server around the shared state
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Serve on `bind` until `shutdown` resolves
    pub async fn run<F>(self, bind: SocketAddr, shutdown: F) -> hyper::Result<()>
    where
        F: Future<Output = ()>,
    {
        let app = router(self.state);
        let server = axum::Server::try_bind(&bind)?
            .serve(app.into_make_service_with_connect_info::<SocketAddr>());

        info!(addr = %server.local_addr(), "Chat gateway listening");
        server.with_graceful_shutdown(shutdown).await?;
        info!("Chat gateway stopped");

        Ok(())
    }
}
