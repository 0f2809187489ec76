//! TCP server for tally connections.
//!
//! Serves connections strictly sequentially: one connection is fully
//! processed (length header, payload drain, count response, histogram
//! fold) before the next is accepted. The absence of concurrency is the
//! synchronization strategy for the global histogram; only the shutdown
//! flag crosses threads, and it is atomic.
//!
//! Known limitation: per-connection reads and the response write carry
//! no timeout, so a stalled peer stalls the whole server until it
//! resumes or disconnects.

use crate::config::ServerConfig;
use crate::histogram::Histogram;
use crate::protocol::{self, CHUNK_SIZE};
use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the accept loop re-checks the shutdown flag while idle.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Server instance owning the listener and the global histogram.
pub struct Server {
    listener: TcpListener,
    global: Histogram,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listening socket described by `config`.
    pub fn bind(config: &ServerConfig) -> io::Result<Self> {
        let addr: SocketAddr = config
            .listen_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = create_listener(addr, config.backlog)?;
        info!(address = %listener.local_addr()?, "Server listening");

        Ok(Self {
            listener,
            global: Histogram::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle used to request graceful shutdown from another thread
    /// (typically a signal handler).
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept and serve connections until the shutdown flag is set.
    ///
    /// The flag is observed only between connections; an in-flight
    /// connection always completes first. Errors inside one connection
    /// are logged and never abort the loop. Returns the accumulated
    /// global histogram for the caller to report.
    pub fn run(mut self) -> io::Result<Histogram> {
        let mut local = Histogram::new();

        while !self.shutdown.load(Ordering::SeqCst) {
            let (stream, peer) = match self.listener.accept() {
                Ok(pair) => pair,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer, "New connection");
            local.reset();
            handle_connection(stream, &mut local);
            self.global.merge(&local);
        }

        info!("Shutdown requested, serving stopped");
        Ok(self.global)
    }
}

/// Serve one accepted connection.
///
/// Reads the length header, drains the declared payload into `local`,
/// and writes the count response. A malformed or short header gets a
/// clean count of 0; `local` is untouched in that case. The stream is
/// closed when the handler returns.
fn handle_connection(mut stream: TcpStream, local: &mut Histogram) {
    // The listener is nonblocking; accepted streams must not be.
    if let Err(e) = stream.set_nonblocking(false) {
        warn!(error = %e, "Failed to switch stream to blocking mode");
        return;
    }

    let declared = match protocol::read_u32(&mut stream) {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "Failed to read length header");
            if let Err(e) = protocol::write_u32(&mut stream, 0) {
                warn!(error = %e, "Failed to send count");
            }
            return;
        }
    };

    if declared > 0 {
        drain_payload(&mut stream, declared, local);
    }

    let count = local.total();
    if let Err(e) = protocol::write_u32(&mut stream, count) {
        warn!(error = %e, "Failed to send count");
    }
    debug!(declared, count, "Connection served");
}

/// Consume exactly `declared` payload bytes, counting printables into
/// `local` as they arrive.
///
/// Each read is capped at the bytes still owed, so the drain never
/// consumes past the frame. A zero read (peer closed early) or a fatal
/// I/O error ends the drain; whatever was counted so far stands.
fn drain_payload<R: Read>(reader: &mut R, declared: u32, local: &mut Histogram) {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut remaining = declared as u64;

    while remaining > 0 {
        let want = remaining.min(CHUNK_SIZE as u64) as usize;
        match reader.read(&mut chunk[..want]) {
            Ok(0) => {
                warn!(remaining, "Peer closed before declared length");
                break;
            }
            Ok(n) => {
                local.observe(&chunk[..n]);
                remaining -= n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, remaining, "Read failed mid-payload");
                break;
            }
        }
    }
}

/// Create the listening socket with `SO_REUSEADDR` set.
///
/// The socket is nonblocking so the accept loop can poll the shutdown
/// flag between connections instead of parking in `accept` forever.
fn create_listener(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(socket.into())
}
