// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Length-delimited frames: an unsigned varint length prefix followed by that
//! many payload bytes. Every record in a CAR stream, header included, is one
//! frame.

use crate::Error;
use std::io::{self, Read, Write};
use unsigned_varint::{decode, encode};

/// Writes one frame whose payload is the concatenation of `parts`.
/// Returns the number of bytes emitted, prefix included.
pub fn ld_write<W: Write + ?Sized>(writer: &mut W, parts: &[&[u8]]) -> io::Result<u64> {
    let payload_len = parts.iter().map(|part| part.len() as u64).sum::<u64>();
    let mut buf = encode::u64_buffer();
    let prefix = encode::u64(payload_len, &mut buf);
    writer.write_all(prefix)?;
    for part in parts {
        writer.write_all(part)?;
    }
    Ok(prefix.len() as u64 + payload_len)
}

/// Reads one frame payload. Returns `Ok(None)` if the stream is exhausted
/// before the first prefix byte.
pub fn ld_read<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, Error> {
    let Some(len) = read_length_prefix(reader)? else {
        return Ok(None);
    };
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(Error::TruncatedFrame {
            expected: len,
            found: buf.len() as u64,
        });
    }
    Ok(Some(buf))
}

/// Size of a frame carrying `payload_len` bytes, prefix included.
pub fn ld_size(payload_len: u64) -> u64 {
    let mut buf = encode::u64_buffer();
    encode::u64(payload_len, &mut buf).len() as u64 + payload_len
}

fn read_length_prefix<R: Read>(reader: &mut R) -> Result<Option<u64>, Error> {
    let mut buf = encode::u64_buffer();
    for i in 0..buf.len() {
        let mut byte = [0u8; 1];
        match reader.read_exact(&mut byte) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                if i == 0 {
                    return Ok(None);
                }
                // At least one more prefix byte was announced by the continuation bit.
                return Err(Error::TruncatedFrame {
                    expected: i as u64 + 1,
                    found: i as u64,
                });
            }
            Err(e) => return Err(e.into()),
        }
        buf[i] = byte[0];
        if decode::is_last(byte[0]) {
            let (len, _) = decode::u64(&buf[..=i])
                .map_err(|e| Error::MalformedFrame(format!("invalid length prefix: {e}")))?;
            return Ok(Some(len));
        }
    }
    Err(Error::MalformedFrame(
        "length prefix does not fit in 64 bits".to_owned(),
    ))
}
