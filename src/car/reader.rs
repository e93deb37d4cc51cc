// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::frame::{ld_read, ld_size};
use super::{Block, CarHeader};
use crate::Error;
use std::fs::{File, Metadata};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File an archive is being read from. Purely informational; attached to
/// block positions for callers that reference data in place.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
    pub metadata: Metadata,
}

/// Where a block's data lives inside the archive.
#[derive(Debug, Clone)]
pub struct BlockPosition {
    /// Byte offset of the block data, past the frame prefix and CID.
    pub offset: u64,
    pub source: Option<Arc<FileSource>>,
}

/// Reads a CAR stream sequentially, verifying every block against its CID.
pub struct CarReader<R> {
    reader: BufReader<R>,
    header: CarHeader,
    offset: u64,
    source: Option<Arc<FileSource>>,
    failed: bool,
}

impl<R: Read> CarReader<R> {
    /// Creates a new `CarReader` and parses the `CarHeader`
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut reader = BufReader::new(reader);
        let (header, offset) = CarHeader::read(&mut reader)?;
        tracing::debug!(roots = header.roots.len(), "read CAR header");
        Ok(Self {
            reader,
            header,
            offset,
            source: None,
            failed: false,
        })
    }

    /// Attaches file information reported by [`CarReader::next_positioned`].
    pub fn with_file_source(mut self, source: FileSource) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn header(&self) -> &CarHeader {
        &self.header
    }

    pub fn into_header(self) -> CarHeader {
        self.header
    }

    /// Number of bytes consumed so far, header included.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the next verified block, or `None` at the end of the archive.
    pub fn next_block(&mut self) -> Result<Option<Block>, Error> {
        Ok(self.next_positioned()?.map(|(block, _)| block))
    }

    /// Like [`CarReader::next_block`], also reporting where the block data
    /// starts in the archive.
    pub fn next_positioned(&mut self) -> Result<Option<(Block, BlockPosition)>, Error> {
        let Some(frame) = ld_read(&mut self.reader)? else {
            return Ok(None);
        };
        let frame_len = ld_size(frame.len() as u64);
        let block = Block::from_frame(frame)?;
        block.validate()?;

        let position = BlockPosition {
            offset: self.offset + frame_len - block.data.len() as u64,
            source: self.source.clone(),
        };
        self.offset += frame_len;
        tracing::trace!(cid = %block.cid, offset = position.offset, "read block");
        Ok(Some((block, position)))
    }
}

impl CarReader<File> {
    /// Opens a CAR file, recording its path and metadata as the block source.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = std::path::absolute(path.as_ref())?;
        let file = File::open(&path)?;
        let metadata = file.metadata()?;
        Ok(Self::new(file)?.with_file_source(FileSource { path, metadata }))
    }
}

impl<R: Read> Iterator for CarReader<R> {
    type Item = Result<Block, Error>;

    // Stops after the first error; the stream position is unknown past it.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_block().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
