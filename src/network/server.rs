//! TCP Server
//!
//! Accepts connections and dispatches them to a fixed pool of worker
//! threads through a bounded channel.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use super::connection::Connection;
use crate::config::Config;
use crate::error::{Result, SigninError};
use crate::signin::SigninService;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Cloneable handle that stops a running server
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for signlog
pub struct Server {
    config: Config,
    service: Arc<SigninService>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listen address from the config
    pub fn bind(config: Config, service: Arc<SigninService>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            SigninError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            service,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Actual bound address (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Start the server (blocking until shutdown)
    ///
    /// Workers finish the connections they hold before this returns.
    pub fn run(&self) -> Result<()> {
        let workers = self.config.worker_threads.max(1);
        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections.max(1));

        tracing::info!(
            "Listening on {} ({} workers, max {} connections)",
            self.local_addr()?,
            workers,
            self.config.max_connections
        );

        let handles = (0..workers)
            .map(|id| self.spawn_worker(id, rx.clone()))
            .collect::<Result<Vec<_>>>()?;
        drop(rx);

        let accepted = self.accept_loop(&tx);

        // Closing the channel lets idle workers exit
        drop(tx);
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        tracing::info!("Server stopped");
        accepted
    }

    fn accept_loop(&self, tx: &Sender<TcpStream>) -> Result<()> {
        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    // Accepted sockets inherit non-blocking mode on some platforms
                    stream.set_nonblocking(false)?;
                    self.dispatch(tx, stream, addr);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    return Err(SigninError::Network(e.to_string()));
                }
            }
        }
        Ok(())
    }

    fn dispatch(&self, tx: &Sender<TcpStream>, stream: TcpStream, addr: SocketAddr) {
        if self.active.load(Ordering::SeqCst) + tx.len() >= self.config.max_connections {
            tracing::warn!("Rejecting {}: connection limit reached", addr);
            return;
        }
        match tx.try_send(stream) {
            Ok(()) => tracing::trace!("Queued connection from {}", addr),
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Rejecting {}: connection queue full", addr);
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::error!("Worker pool is gone, dropping {}", addr);
            }
        }
    }

    fn spawn_worker(&self, id: usize, rx: Receiver<TcpStream>) -> Result<JoinHandle<()>> {
        let service = Arc::clone(&self.service);
        let active = Arc::clone(&self.active);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("signlog-worker-{}", id))
            .spawn(move || {
                for stream in rx.iter() {
                    active.fetch_add(1, Ordering::SeqCst);
                    if let Err(e) = serve(stream, &service, read_ms, write_ms) {
                        tracing::debug!("Connection closed with error: {}", e);
                    }
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .map_err(|e| SigninError::Network(format!("failed to spawn worker: {}", e)))
    }
}

fn serve(
    stream: TcpStream,
    service: &Arc<SigninService>,
    read_ms: u64,
    write_ms: u64,
) -> Result<()> {
    let mut connection = Connection::new(stream, Arc::clone(service))?;
    connection.set_timeouts(read_ms, write_ms)?;
    connection.handle()
}
