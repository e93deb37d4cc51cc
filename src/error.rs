// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use thiserror::Error;

/// CAR codec error
#[derive(Debug, Error)]
pub enum Error {
    /// The stream ended in the middle of a frame.
    #[error("truncated frame: expected {expected} bytes, found {found}")]
    TruncatedFrame { expected: u64, found: u64 },
    /// The frame length prefix is not a valid unsigned varint.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// The first frame could not be decoded as a CAR header.
    #[error("malformed CAR header: {0}")]
    MalformedHeader(String),
    #[error("unsupported CAR version: {0}")]
    UnsupportedVersion(u64),
    #[error("CAR header has no roots")]
    EmptyRootSet,
    /// The stream ended before a header frame could be read.
    #[error("not a CAR archive: stream is empty")]
    NotAnArchive,
    /// A block frame does not start with a valid CID.
    #[error("invalid block frame: {0}")]
    InvalidBlock(String),
    #[error("content integrity mismatch for block {expected}, actual: {actual}")]
    IntegrityMismatch { expected: Cid, actual: Cid },
    #[error("failed to fetch node {cid}")]
    Fetch {
        cid: Cid,
        #[source]
        source: anyhow::Error,
    },
    #[error("link policy failed")]
    LinkPolicy(#[source] anyhow::Error),
    #[error("block sink rejected insert")]
    Sink(#[source] anyhow::Error),
    #[error("block visitor failed")]
    Visitor(#[source] anyhow::Error),
    #[error("operation cancelled")]
    Cancelled,
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`], used by callers to decide what to do
/// with partially written or partially loaded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Format,
    Integrity,
    Fetch,
    Sink,
    Cancelled,
    Io,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::TruncatedFrame { .. }
            | Error::MalformedFrame(_)
            | Error::MalformedHeader(_)
            | Error::UnsupportedVersion(_)
            | Error::EmptyRootSet
            | Error::NotAnArchive
            | Error::InvalidBlock(_) => ErrorCategory::Format,
            Error::IntegrityMismatch { .. } => ErrorCategory::Integrity,
            Error::Fetch { .. } | Error::LinkPolicy(_) => ErrorCategory::Fetch,
            Error::Sink(_) | Error::Visitor(_) => ErrorCategory::Sink,
            Error::Cancelled => ErrorCategory::Cancelled,
            Error::Io(_) => ErrorCategory::Io,
        }
    }
}
