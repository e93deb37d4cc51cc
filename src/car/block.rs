// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::frame::{ld_size, ld_write};
use crate::Error;
use cid::Cid;
use cid::multihash::Multihash;
use multihash_codetable::{Code, MultihashDigest as _};
use std::io::{self, Write};

/// Multicodec code of the identity multihash, whose digest is the data itself.
pub const IDENTITY_HASH: u64 = 0x00;

/// IPLD block: a CID together with the bytes it addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    pub cid: Cid,
    pub data: Vec<u8>,
}

impl Block {
    pub fn new(cid: Cid, data: Vec<u8>) -> Self {
        Self { cid, data }
    }

    /// Hashes `data` with `code` and wraps it in a `CIDv1` tagged with `codec`.
    pub fn from_data(codec: u64, code: Code, data: Vec<u8>) -> Self {
        let cid = Cid::new_v1(codec, code.digest(&data));
        Self { cid, data }
    }

    /// Size of this block's frame, length prefix included.
    pub fn frame_len(&self) -> u64 {
        ld_size((self.cid.encoded_len() + self.data.len()) as u64)
    }

    // Write a varint frame containing the cid and the data
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<u64> {
        ld_write(writer, &[&self.cid.to_bytes(), &self.data])
    }

    /// Splits a frame payload into its CID and data. The CID encoding is
    /// self-describing so no separate length is needed.
    pub fn from_frame(mut frame: Vec<u8>) -> Result<Self, Error> {
        let mut cursor = io::Cursor::new(frame.as_slice());
        let cid = Cid::read_bytes(&mut cursor).map_err(|e| Error::InvalidBlock(e.to_string()))?;
        let cid_len = cursor.position() as usize;
        let data = frame.split_off(cid_len);
        Ok(Self { cid, data })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Re-hashes the data with the hash function declared by the CID.
    pub fn validate(&self) -> Result<(), Error> {
        let actual = fingerprint(&self.cid, &self.data)?;
        if actual != self.cid {
            return Err(Error::IntegrityMismatch {
                expected: self.cid,
                actual,
            });
        }
        Ok(())
    }
}

/// Computes the CID of `data` using the version, codec and hash function of
/// `prefix`.
pub fn fingerprint(prefix: &Cid, data: &[u8]) -> Result<Cid, Error> {
    let hash = prefix.hash();
    let digest = if hash.code() == IDENTITY_HASH {
        match Multihash::<64>::wrap(IDENTITY_HASH, data) {
            Ok(digest) => digest,
            // Oversized identity payloads can never match.
            Err(_) => {
                return Err(Error::InvalidBlock(format!(
                    "identity CID {prefix} cannot address {} bytes",
                    data.len()
                )));
            }
        }
    } else {
        let code = Code::try_from(hash.code()).map_err(|_| {
            Error::InvalidBlock(format!("unsupported multihash code {:#x}", hash.code()))
        })?;
        let digest = code.digest(data);
        if hash.size() < digest.size() {
            digest.truncate(hash.size())
        } else {
            digest
        }
    };
    Cid::new(prefix.version(), prefix.codec(), digest).map_err(|e| Error::InvalidBlock(e.to_string()))
}
