pub mod gemini;
pub mod remote;
pub mod traits;
pub mod types;

pub use gemini::GeminiProvider;
pub use remote::RemoteGenerator;
pub use traits::TextGenerator;
pub use types::ProviderError;

/// Serve `router` on an ephemeral local port and return its base URL.
#[cfg(test)]
pub(crate) async fn spawn_test_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
