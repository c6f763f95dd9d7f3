//! JSON API for the agent dashboard and the public intake forms.
//!
//! Every response uses the `{ok, ...}` envelope the dashboard pages
//! expect. All persistent state lives behind the relay; the only state
//! held here is the per-process dashboard cache in `AppState`.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::router;

use relay::{Dashboard, RelayClient};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

pub struct AppState {
    pub client: RelayClient,
    pub agents: Vec<String>,
    pub statuses: Vec<String>,
    pub dashboard: RwLock<Dashboard>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(client: RelayClient, agents: Vec<String>, statuses: Vec<String>) -> SharedState {
        Arc::new(AppState {
            client,
            agents,
            statuses,
            dashboard: RwLock::new(Dashboard::new()),
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub async fn serve(host: &str, port: u16, state: SharedState) -> Result<(), ServeError> {
    let app = router(state);
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!(host, port, "agent api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
