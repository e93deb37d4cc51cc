// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Block, CarHeader, CarReader};
use crate::Error;
use fvm_ipld_blockstore::Blockstore;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::io::Read;

/// Number of blocks buffered before a bulk insert.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Destination of blocks read from an archive.
pub trait BlockSink {
    fn put_block(&self, block: Block) -> anyhow::Result<()>;

    /// Returns the bulk insertion capability, if this sink has one.
    fn as_bulk(&self) -> Option<&dyn BulkBlockSink> {
        None
    }
}

/// A sink that can insert many blocks in one call.
pub trait BulkBlockSink: BlockSink {
    fn put_blocks(&self, blocks: Vec<Block>) -> anyhow::Result<()>;
}

impl<BS: Blockstore> BlockSink for BS {
    fn put_block(&self, block: Block) -> anyhow::Result<()> {
        self.put_keyed(&block.cid, &block.data)
    }

    fn as_bulk(&self) -> Option<&dyn BulkBlockSink> {
        Some(self)
    }
}

impl<BS: Blockstore> BulkBlockSink for BS {
    fn put_blocks(&self, blocks: Vec<Block>) -> anyhow::Result<()> {
        self.put_many_keyed(blocks.into_iter().map(|Block { cid, data }| (cid, data)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Blocks per bulk insert. Ignored by sinks without bulk capability.
    #[default(DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

enum SinkMode<'a> {
    Single(&'a dyn BlockSink),
    Bulk(&'a dyn BulkBlockSink),
}

/// Drains CAR streams into a block sink. The sink's capability is probed
/// once, here, rather than per block.
pub struct CarLoader<'a> {
    mode: SinkMode<'a>,
    options: LoadOptions,
}

impl<'a> CarLoader<'a> {
    pub fn new(sink: &'a dyn BlockSink) -> Self {
        let mode = match sink.as_bulk() {
            Some(bulk) => SinkMode::Bulk(bulk),
            None => SinkMode::Single(sink),
        };
        Self {
            mode,
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Loads every block of `reader` and returns its header. On error, blocks
    /// already handed to the sink stay there.
    pub fn load<R: Read>(&self, mut reader: CarReader<R>) -> Result<CarHeader, Error> {
        let mut count = 0usize;
        match self.mode {
            SinkMode::Single(sink) => {
                while let Some(block) = reader.next_block()? {
                    sink.put_block(block).map_err(Error::Sink)?;
                    count += 1;
                }
            }
            SinkMode::Bulk(sink) => {
                let batch_size = self.options.batch_size.max(1);
                let mut buf = Vec::with_capacity(batch_size);
                while let Some(block) = reader.next_block()? {
                    buf.push(block);
                    count += 1;
                    if buf.len() >= batch_size {
                        let batch = std::mem::replace(&mut buf, Vec::with_capacity(batch_size));
                        tracing::trace!(blocks = batch.len(), "flushing batch");
                        sink.put_blocks(batch).map_err(Error::Sink)?;
                    }
                }
                if !buf.is_empty() {
                    tracing::trace!(blocks = buf.len(), "flushing final batch");
                    sink.put_blocks(buf).map_err(Error::Sink)?;
                }
            }
        }
        tracing::debug!(blocks = count, "loaded CAR");
        Ok(reader.into_header())
    }
}

/// Stream blocks from a CAR archive into a block sink.
/// The sink is not restored to its original state in case of errors.
pub fn load_car<R: Read>(sink: &dyn BlockSink, reader: R) -> Result<CarHeader, Error> {
    CarLoader::new(sink).load(CarReader::new(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::write_car;
    use crate::db::MemoryDB;
    use crate::test_utils::{raw_block, sample_dag, store_blocks};
    use parking_lot::Mutex;
    use quickcheck_macros::quickcheck;
    use std::io::Cursor;

    /// Records how blocks arrive, optionally failing after some inserts.
    #[derive(Default)]
    struct RecordingSink {
        db: MemoryDB,
        bulk: bool,
        calls: Mutex<Vec<usize>>,
        fail_after: Option<usize>,
    }

    impl RecordingSink {
        fn record(&self, n: usize) -> anyhow::Result<()> {
            let mut calls = self.calls.lock();
            if self.fail_after.is_some_and(|limit| calls.len() >= limit) {
                anyhow::bail!("sink is full");
            }
            calls.push(n);
            Ok(())
        }
    }

    impl BlockSink for RecordingSink {
        fn put_block(&self, block: Block) -> anyhow::Result<()> {
            self.record(1)?;
            self.db.put_block(block)
        }

        fn as_bulk(&self) -> Option<&dyn BulkBlockSink> {
            if self.bulk { Some(self) } else { None }
        }
    }

    impl BulkBlockSink for RecordingSink {
        fn put_blocks(&self, blocks: Vec<Block>) -> anyhow::Result<()> {
            self.record(blocks.len())?;
            self.db.put_blocks(blocks)
        }
    }

    fn car_of_leaves(n: usize) -> Vec<u8> {
        let db = MemoryDB::default();
        let leaves: Vec<_> = (0..n)
            .map(|i| raw_block(format!("leaf {i}").as_bytes()))
            .collect();
        store_blocks(&db, &leaves);
        let links: Vec<(String, cid::Cid)> = leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| (format!("l{i:05}"), leaf.cid))
            .collect();
        let named: Vec<(&str, cid::Cid)> = links.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        let root = crate::test_utils::dag_block("root", &named);
        store_blocks(&db, [&root]);
        let mut car = Vec::<u8>::new();
        write_car(&db, &[root.cid], &mut car).unwrap();
        car
    }

    #[test]
    fn roundtrip_into_memory_db() {
        let dag = sample_dag();
        let mut car = Vec::<u8>::new();
        write_car(&dag.store(), &[dag.nd3.cid], &mut car).unwrap();

        let db = MemoryDB::default();
        let header = load_car(&db, Cursor::new(&car)).unwrap();
        assert_eq!(header.roots, vec![dag.nd3.cid]);
        for block in dag.blocks() {
            assert_eq!(db.get(&block.cid).unwrap().as_ref(), Some(&block.data));
        }
    }

    #[test]
    fn full_batches_plus_remainder() {
        // 2500 leaves plus the root.
        let car = car_of_leaves(2500);
        let sink = RecordingSink {
            bulk: true,
            ..Default::default()
        };
        CarLoader::new(&sink)
            .load(CarReader::new(Cursor::new(&car)).unwrap())
            .unwrap();
        assert_eq!(*sink.calls.lock(), vec![1000, 1000, 501]);
        assert_eq!(sink.db.len(), 2501);
    }

    #[test]
    fn single_insert_without_bulk_capability() {
        let car = car_of_leaves(3);
        let sink = RecordingSink::default();
        load_car(&sink, Cursor::new(&car)).unwrap();
        assert_eq!(*sink.calls.lock(), vec![1; 4]);
    }

    #[test]
    fn sink_error_aborts_without_rollback() {
        let car = car_of_leaves(10);
        let sink = RecordingSink {
            bulk: true,
            fail_after: Some(1),
            ..Default::default()
        };
        let err = CarLoader::new(&sink)
            .with_options(LoadOptions { batch_size: 4 })
            .load(CarReader::new(Cursor::new(&car)).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::Sink(_)), "{err}");
        assert_eq!(sink.db.len(), 4);
    }

    #[test]
    fn options_from_toml() {
        let options: LoadOptions = toml::from_str("batch_size = 16").unwrap();
        assert_eq!(options.batch_size, 16);
        let options: LoadOptions = toml::from_str("").unwrap();
        assert_eq!(options, LoadOptions::default());
        assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[quickcheck]
    fn batch_and_single_loads_agree(leaves: u8, batch_size: u8) {
        let car = car_of_leaves(usize::from(leaves));

        let bulk = RecordingSink {
            bulk: true,
            ..Default::default()
        };
        CarLoader::new(&bulk)
            .with_options(LoadOptions {
                batch_size: usize::from(batch_size),
            })
            .load(CarReader::new(Cursor::new(&car)).unwrap())
            .unwrap();

        let single = RecordingSink::default();
        load_car(&single, Cursor::new(&car)).unwrap();

        let mut bulk_cids = bulk.db.cids();
        let mut single_cids = single.db.cids();
        bulk_cids.sort();
        single_cids.sort();
        assert_eq!(bulk_cids, single_cids);
        assert_eq!(bulk_cids.len(), usize::from(leaves) + 1);
    }
}
