pub mod error;
pub mod handlers;
pub mod persona;
pub mod router;
pub mod state;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use error::ApiError;
pub use persona::{load_persona, DEFAULT_PERSONA};
pub use router::build_router;
pub use state::AppState;

/// Serve `router` until `shutdown` is cancelled, letting in-flight requests
/// finish.
pub async fn serve(listener: TcpListener, router: Router, shutdown: CancellationToken) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::providers::{ProviderError, RemoteGenerator, TextGenerator};

    struct Fixed;

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok("Use a min-heap.".to_string())
        }
    }

    #[tokio::test]
    async fn test_serve_until_cancelled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let router = build_router(AppState::new(Arc::new(Fixed)), None);
        let server = tokio::spawn(serve(listener, router, shutdown.clone()));

        let remote = RemoteGenerator::new(&format!("http://{}", addr)).unwrap();
        assert_eq!(remote.generate("top k?").await.unwrap(), "Use a min-heap.");
        drop(remote);

        shutdown.cancel();
        server.await.unwrap().unwrap();
    }
}
