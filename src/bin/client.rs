//! char-tally client entry point.
//!
//! Streams one local file to a tally server and prints the returned
//! printable-character count. Any failure is terminal: diagnostics go
//! to stderr and the process exits nonzero.

use char_tally::client;
use char_tally::config::ClientArgs;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ClientArgs::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let count = client::exchange(args.address, args.port, &args.file)?;
    println!("# of printable characters: {count}");

    Ok(())
}
