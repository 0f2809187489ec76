//! char-tally: a printable-character tally service over TCP
//!
//! A client streams a local file to the server in one length-prefixed
//! exchange; the server replies with the number of printable ASCII bytes
//! it saw and folds a per-connection character histogram into a global
//! one. On graceful shutdown the server dumps the global histogram.
//!
//! Features:
//! - Length-prefixed wire framing (4-byte big-endian)
//! - Exact-I/O helpers that hide partial reads and writes
//! - Strictly sequential serving with cooperative shutdown
//! - Configuration via CLI arguments or TOML file

pub mod client;
pub mod config;
pub mod histogram;
pub mod protocol;
pub mod server;
