//! char-tally server entry point.
//!
//! Listens on the given port, serves tally clients sequentially, and
//! on Ctrl-C dumps the accumulated printable-character histogram to
//! standard output before exiting.

use char_tally::config::ServerConfig;
use char_tally::server::Server;
use std::sync::atomic::Ordering;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        backlog = config.backlog,
        "Starting char-tally server"
    );

    let server = Server::bind(&config)?;

    // An interrupt flips the flag; the accept loop observes it between
    // connections and winds down.
    let shutdown = server.shutdown_flag();
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
    })?;

    let global = server.run()?;

    // The histogram dump is protocol output, not logging: exactly 95
    // lines on stdout in a fixed format.
    let stdout = std::io::stdout();
    global.report(&mut stdout.lock())?;

    Ok(())
}
