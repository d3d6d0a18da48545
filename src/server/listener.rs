//! Background listener thread.
//!
//! The socket is bound on the caller's thread so a bind failure is reported
//! synchronously. Serving then happens on a dedicated thread that owns a
//! single-threaded tokio runtime; the host's update loop never touches it.
//!
//! Stopping closes the listening socket at once and gives open connections
//! `shutdown_grace` to finish. Whatever is still open after that is dropped
//! together with the runtime, so a stalled client cannot hold up `stop()`.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{error, info, warn};

use super::config::ServerConfig;
use super::routes::{ServerState, build_router};
use crate::core::{BridgeError, Result};
use crate::queue::CommandQueue;

pub struct CommandServer;

impl CommandServer {
    /// Binds the configured address and starts serving on a new thread.
    ///
    /// Records accepted on `POST /command` are pushed onto `queue`.
    pub fn start(config: &ServerConfig, queue: CommandQueue) -> Result<ServerHandle> {
        config.validate()?;

        let addr = config.address();
        let std_listener =
            std::net::TcpListener::bind(&addr).map_err(|source| BridgeError::Bind {
                addr: addr.clone(),
                source,
            })?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| BridgeError::Runtime(err.to_string()))?;

        let state =
            ServerState::new(queue, local_addr.port()).request_timeout(config.request_timeout);
        let router = build_router(state);

        let running = Arc::new(AtomicBool::new(true));
        let running_for_worker = running.clone();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let grace = config.shutdown_grace;

        let join_handle = thread::Builder::new()
            .name("bci-command-server".to_string())
            .spawn(move || {
                let served =
                    runtime.block_on(serve_until_stopped(std_listener, router, stop_rx, grace));
                if let Err(err) = served {
                    error!(error = %err, "command server terminated");
                }
                // Dropping the runtime here closes any connection the drain
                // gave up on.
                drop(runtime);
                running_for_worker.store(false, Ordering::SeqCst);
            })
            .map_err(|err| BridgeError::Thread(err.to_string()))?;

        info!(address = %local_addr, "BCI command server started");

        Ok(ServerHandle {
            local_addr,
            running,
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
        })
    }
}

async fn serve_until_stopped(
    std_listener: std::net::TcpListener,
    router: axum::Router,
    stop_rx: oneshot::Receiver<()>,
    grace: Duration,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::from_std(std_listener)?;
    let (drain_tx, drain_rx) = oneshot::channel::<()>();

    let serve = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = drain_rx.await;
        })
        .into_future();
    tokio::pin!(serve);

    tokio::select! {
        served = &mut serve => served,
        _ = stop_rx => {
            let _ = drain_tx.send(());
            match tokio::time::timeout(grace, &mut serve).await {
                Ok(served) => served,
                Err(_) => {
                    warn!(
                        grace_ms = grace.as_millis() as u64,
                        "open connections dropped after shutdown grace"
                    );
                    Ok(())
                }
            }
        }
    }
}

/// Owner of a running listener. Dropping it stops the server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    stop_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clears the running flag, closes the listening socket and joins the
    /// worker thread. In-flight requests get the configured shutdown grace
    /// to finish; connections still open after it are closed.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(join_handle) = self.join_handle.take() {
            join_handle
                .join()
                .map_err(|_| BridgeError::Thread("command server thread panicked".to_string()))?;
            info!(address = %self.local_addr, "BCI command server stopped");
        }

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "command server shutdown failed");
        }
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("local_addr", &self.local_addr)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::sync::mpsc;
    use std::time::Instant;

    fn ephemeral() -> ServerConfig {
        ServerConfig::new().port(0)
    }

    /// Stops `handle` on another thread and reports how long it took, or
    /// `None` if it had not returned after five seconds.
    fn stop_within_five_seconds(handle: ServerHandle) -> Option<Duration> {
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let started = Instant::now();
            let result = handle.stop();
            let _ = done_tx.send((result, started.elapsed()));
        });

        let (result, elapsed) = done_rx.recv_timeout(Duration::from_secs(5)).ok()?;
        result.unwrap();
        Some(elapsed)
    }

    #[test]
    fn test_start_and_stop() {
        let handle = CommandServer::start(&ephemeral(), CommandQueue::new()).unwrap();
        assert!(handle.is_running());
        assert_ne!(handle.port(), 0);
        handle.stop().unwrap();
    }

    #[test]
    fn test_bind_conflict_is_reported() {
        let first = CommandServer::start(&ephemeral(), CommandQueue::new()).unwrap();
        let taken = ServerConfig::new().port(first.port());

        let err = CommandServer::start(&taken, CommandQueue::new()).unwrap_err();
        assert!(matches!(err, BridgeError::Bind { .. }));
        assert!(first.is_running());
    }

    #[test]
    fn test_port_is_free_after_stop() {
        let handle = CommandServer::start(&ephemeral(), CommandQueue::new()).unwrap();
        let port = handle.port();
        handle.stop().unwrap();

        let again = CommandServer::start(&ServerConfig::new().port(port), CommandQueue::new());
        assert!(again.is_ok());
    }

    #[test]
    fn test_stop_with_half_sent_headers_returns_promptly() {
        let config = ephemeral().shutdown_grace(Duration::from_millis(200));
        let handle = CommandServer::start(&config, CommandQueue::new()).unwrap();

        let mut client = TcpStream::connect(handle.local_addr()).unwrap();
        client
            .write_all(b"GET /ping HTTP/1.1\r\nHost: x\r\n")
            .unwrap();
        thread::sleep(Duration::from_millis(50));

        let elapsed = stop_within_five_seconds(handle).expect("stop should not hang");
        assert!(elapsed < Duration::from_secs(2), "stop took {:?}", elapsed);

        // The abandoned connection is closed, not left dangling.
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        match client.read_to_end(&mut Vec::new()) {
            Ok(_) => {}
            Err(err) => assert!(
                !matches!(
                    err.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ),
                "connection still open: {}",
                err
            ),
        }
    }

    #[test]
    fn test_stop_with_half_sent_body_returns_promptly() {
        let config = ephemeral()
            .without_request_timeout()
            .shutdown_grace(Duration::from_millis(200));
        let handle = CommandServer::start(&config, CommandQueue::new()).unwrap();

        let mut client = TcpStream::connect(handle.local_addr()).unwrap();
        client
            .write_all(b"POST /command HTTP/1.1\r\nHost: x\r\nContent-Length: 100\r\n\r\n{\"com")
            .unwrap();
        thread::sleep(Duration::from_millis(50));

        let elapsed = stop_within_five_seconds(handle).expect("stop should not hang");
        assert!(elapsed < Duration::from_secs(2), "stop took {:?}", elapsed);
    }

    #[test]
    fn test_stop_with_idle_keep_alive_connection() {
        let handle = CommandServer::start(&ephemeral(), CommandQueue::new()).unwrap();

        let mut client = TcpStream::connect(handle.local_addr()).unwrap();
        client
            .write_all(b"GET /ping HTTP/1.1\r\nHost: x\r\n\r\n")
            .unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut buf = [0u8; 512];
        let read = client.read(&mut buf).unwrap();
        assert!(String::from_utf8_lossy(&buf[..read]).starts_with("HTTP/1.1 200"));

        assert!(stop_within_five_seconds(handle).is_some());
    }

    #[test]
    fn test_stalled_body_is_cut_off_by_request_timeout() {
        let config = ephemeral().request_timeout(Duration::from_millis(200));
        let handle = CommandServer::start(&config, CommandQueue::new()).unwrap();

        let mut client = TcpStream::connect(handle.local_addr()).unwrap();
        client
            .write_all(b"POST /command HTTP/1.1\r\nHost: x\r\nContent-Length: 100\r\n\r\n{\"com")
            .unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(3)))
            .unwrap();
        let mut buf = [0u8; 512];
        let read = client.read(&mut buf).unwrap();
        assert!(String::from_utf8_lossy(&buf[..read]).starts_with("HTTP/1.1 408"));

        handle.stop().unwrap();
    }
}
