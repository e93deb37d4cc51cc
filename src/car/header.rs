// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::frame::{ld_read, ld_size, ld_write};
use crate::Error;
use cid::Cid;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// The only CAR version this codec reads and writes.
pub const CAR_VERSION: u64 = 1;

/// CAR file header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarHeader {
    // The roots array must contain one or more CIDs.
    // See <https://ipld.io/specs/transport/car/carv1/#constraints>
    #[serde(default)]
    pub roots: Vec<Cid>,
    pub version: u64,
}

impl CarHeader {
    /// Creates a version 1 header
    pub fn new(roots: Vec<Cid>) -> Self {
        Self {
            roots,
            version: CAR_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.version != CAR_VERSION {
            return Err(Error::UnsupportedVersion(self.version));
        }
        if self.roots.is_empty() {
            return Err(Error::EmptyRootSet);
        }
        Ok(())
    }

    /// DAG-CBOR encoding of the header, without the frame prefix.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        self.validate()?;
        serde_ipld_dagcbor::to_vec(self).map_err(|e| Error::MalformedHeader(e.to_string()))
    }

    /// Decodes and validates a header frame payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let header: CarHeader = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|e| Error::MalformedHeader(e.to_string()))?;
        header.validate()?;
        Ok(header)
    }

    /// Number of bytes [`CarHeader::write`] emits, computed without I/O.
    pub fn encoded_len(&self) -> Result<u64, Error> {
        Ok(ld_size(self.to_bytes()?.len() as u64))
    }

    /// Writes the header frame. Returns the number of bytes written.
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<u64, Error> {
        let bytes = self.to_bytes()?;
        let written = ld_write(writer, &[&bytes])?;
        tracing::debug!(roots = self.roots.len(), bytes = written, "wrote CAR header");
        Ok(written)
    }

    /// Reads the header frame. Returns the header together with the number
    /// of bytes consumed from `reader`.
    pub fn read<R: Read>(reader: &mut R) -> Result<(Self, u64), Error> {
        let bytes = ld_read(reader)?.ok_or(Error::NotAnArchive)?;
        let header = Self::from_bytes(&bytes)?;
        Ok((header, ld_size(bytes.len() as u64)))
    }
}

impl From<Vec<Cid>> for CarHeader {
    fn from(roots: Vec<Cid>) -> Self {
        Self::new(roots)
    }
}
