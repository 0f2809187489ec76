//! Wire framing for the tally protocol.
//!
//! One exchange per TCP connection, all integers big-endian:
//! 1. Client sends a 4-byte unsigned payload length `N`.
//! 2. Client sends exactly `N` raw payload bytes.
//! 3. Server sends back a 4-byte unsigned printable-byte count.
//!
//! The payload may arrive in arbitrarily small fragments; both frame
//! integers and the payload must be reassembled to their exact declared
//! size before they mean anything. `read_u32`/`write_u32` hide that
//! short-I/O behavior behind an exact contract.

use bytes::{BufMut, BytesMut};
use std::io::{self, Read, Write};

/// Size of a frame integer (length prefix and count response).
pub const HEADER_LEN: usize = 4;

/// Transfer chunk size used by both peers when streaming payload.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Write a frame integer, looping until all 4 bytes are flushed.
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    let mut buf = BytesMut::with_capacity(HEADER_LEN);
    buf.put_u32(value);
    writer.write_all(&buf)
}

/// Read a frame integer, looping until all 4 bytes have arrived.
///
/// Returns `UnexpectedEof` if the peer closes before the integer is
/// complete.
pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; HEADER_LEN];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_u32_big_endian() {
        let mut out = Vec::new();
        write_u32(&mut out, 0x0102_0304).unwrap();
        assert_eq!(out, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_read_u32_big_endian() {
        let mut input = Cursor::new(vec![0x00, 0x00, 0x01, 0x00]);
        assert_eq!(read_u32(&mut input).unwrap(), 256);
    }

    #[test]
    fn test_round_trip_extremes() {
        for value in [0u32, 1, u32::MAX] {
            let mut out = Vec::new();
            write_u32(&mut out, value).unwrap();
            assert_eq!(read_u32(&mut Cursor::new(out)).unwrap(), value);
        }
    }

    #[test]
    fn test_read_u32_short_input() {
        let mut input = Cursor::new(vec![0x01, 0x02]);
        let err = read_u32(&mut input).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
