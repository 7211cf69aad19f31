// Server loop module
// Accept loop plus graceful drain of open connections on shutdown

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` resolves, then wait up to
/// `performance.shutdown_timeout` seconds for open connections to finish.
pub async fn start_server_loop<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => match accept_result {
                Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                Err(e) => tracing::error!("Failed to accept connection: {e}"),
            },
            () = &mut shutdown => break,
        }
    }

    // Stop accepting before draining
    drop(listener);
    drain_connections(&state).await;
}

async fn drain_connections(state: &AppState) {
    let active = state.active_connections.load(Ordering::SeqCst);
    logger::log_shutdown(active);

    let deadline = Instant::now() + Duration::from_secs(state.config.performance.shutdown_timeout);
    loop {
        let remaining = state.active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            tracing::info!("All connections closed");
            return;
        }
        if Instant::now() >= deadline {
            tracing::warn!("Shutdown timeout reached, {remaining} connection(s) still open");
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn exchange(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_serves_requests_until_shutdown() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::load_from("does-not-exist/filebox").unwrap();
        config.storage.data_dir = tmp.path().join("data").to_string_lossy().into_owned();
        config.storage.public_dir = tmp.path().join("public").to_string_lossy().into_owned();
        config.performance.shutdown_timeout = 1;
        let state = Arc::new(AppState::new(config).unwrap());

        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(start_server_loop(listener, Arc::clone(&state), async {
            let _ = rx.await;
        }));

        let response = exchange(
            addr,
            "GET /files HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.to_ascii_lowercase().contains("server: filebox"));
        assert!(response.ends_with("[]"));

        let response = exchange(
            addr,
            "DELETE /files/a.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 405"));

        tx.send(()).unwrap();
        server.await.unwrap();
        assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
