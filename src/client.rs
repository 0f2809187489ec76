//! Client side of the tally protocol.
//!
//! Performs exactly one framed exchange: stream a local file to the
//! server, then read back the printable-byte count. There are no
//! retries; the first failure is terminal for the invoking process.

use crate::protocol::{self, CHUNK_SIZE};
use std::fs::File;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Run one exchange against `address:port`, streaming the file at
/// `path`.
///
/// Returns the server's printable-byte count for the file. A
/// zero-length file is legal: the header declares 0, no payload is
/// sent, and the server still responds.
pub fn exchange(address: Ipv4Addr, port: u16, path: &Path) -> Result<u32, ClientError> {
    let mut file =
        File::open(path).map_err(|e| ClientError::FileOpen(path.to_path_buf(), e))?;
    let file_len = file
        .metadata()
        .map_err(|e| ClientError::FileOpen(path.to_path_buf(), e))?
        .len();

    // The frame length is a 32-bit count; larger files cannot be framed.
    let declared: u32 = file_len
        .try_into()
        .map_err(|_| ClientError::FileTooLarge(path.to_path_buf(), file_len))?;

    let addr = SocketAddr::V4(SocketAddrV4::new(address, port));
    let mut stream = TcpStream::connect(addr).map_err(|e| ClientError::Connect(addr, e))?;
    debug!(peer = %addr, file = %path.display(), bytes = declared, "Connected");

    protocol::write_u32(&mut stream, declared).map_err(ClientError::Send)?;

    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;
    loop {
        let n = file.read(&mut chunk).map_err(ClientError::FileRead)?;
        if n == 0 {
            break;
        }
        stream.write_all(&chunk[..n]).map_err(ClientError::Send)?;
        sent += n as u64;
    }
    debug!(sent, "Payload streamed");

    let count = protocol::read_u32(&mut stream).map_err(ClientError::Receive)?;
    Ok(count)
}

/// Client exchange errors
#[derive(Debug)]
pub enum ClientError {
    FileOpen(PathBuf, std::io::Error),
    FileRead(std::io::Error),
    FileTooLarge(PathBuf, u64),
    Connect(SocketAddr, std::io::Error),
    Send(std::io::Error),
    Receive(std::io::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::FileOpen(path, e) => {
                write!(f, "Failed to open file '{}': {}", path.display(), e)
            }
            ClientError::FileRead(e) => write!(f, "Failed to read file: {e}"),
            ClientError::FileTooLarge(path, len) => write!(
                f,
                "File '{}' is {} bytes, above the 32-bit frame limit",
                path.display(),
                len
            ),
            ClientError::Connect(addr, e) => {
                write!(f, "Failed to connect to {addr}: {e}")
            }
            ClientError::Send(e) => write!(f, "Failed to send payload to server: {e}"),
            ClientError::Receive(e) => {
                write!(f, "Failed to receive count from server: {e}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_file_open_error() {
        let err = exchange(
            Ipv4Addr::LOCALHOST,
            1,
            Path::new("/nonexistent/definitely-missing"),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::FileOpen(_, _)));
    }

    #[test]
    fn test_unreachable_server_is_connect_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // Port 1 on localhost is essentially never listening.
        let err = exchange(Ipv4Addr::LOCALHOST, 1, file.path()).unwrap_err();
        assert!(matches!(err, ClientError::Connect(_, _)));
    }

    #[test]
    fn test_error_messages_name_the_operation() {
        let err = ClientError::FileTooLarge(PathBuf::from("/tmp/big"), u64::MAX);
        let msg = err.to_string();
        assert!(msg.contains("/tmp/big"));
        assert!(msg.contains("32-bit"));
    }
}
