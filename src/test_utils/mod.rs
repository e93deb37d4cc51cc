// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::car::Block;
use crate::db::MemoryDB;
use crate::ipld::{DAG_CBOR, IPLD_RAW};
use cid::Cid;
use fvm_ipld_blockstore::Blockstore as _;
use ipld_core::ipld::Ipld;
use multihash_codetable::Code;
use std::collections::BTreeMap;

pub fn raw_block(data: &[u8]) -> Block {
    Block::from_data(IPLD_RAW, Code::Blake2b256, data.to_vec())
}

/// DAG-CBOR node `{"data": name, <link name>: <link>, ...}`.
pub fn dag_block(name: &str, links: &[(&str, Cid)]) -> Block {
    let mut map = BTreeMap::from([("data".to_owned(), Ipld::String(name.to_owned()))]);
    for (link_name, cid) in links {
        map.insert((*link_name).to_owned(), Ipld::Link(*cid));
    }
    let bytes = serde_ipld_dagcbor::to_vec(&Ipld::Map(map)).expect("infallible");
    Block::from_data(DAG_CBOR, Code::Blake2b256, bytes)
}

pub fn store_blocks<'a>(db: &MemoryDB, blocks: impl IntoIterator<Item = &'a Block>) {
    for block in blocks {
        db.put_keyed(&block.cid, &block.data).expect("infallible");
    }
}

/// The diamond-ish DAG used across tests:
///
/// ```text
/// nd3 ─ bear ──▶ c
///  └── second ─▶ nd2 ─ dog ──▶ b
///                 ├─── first ─▶ nd1 ─ cat ─▶ a
///                 └── repeat ─▶ nd1
/// ```
pub struct SampleDag {
    pub a: Block,
    pub b: Block,
    pub c: Block,
    pub nd1: Block,
    pub nd2: Block,
    pub nd3: Block,
}

pub fn sample_dag() -> SampleDag {
    let a = raw_block(b"aaaa");
    let b = raw_block(b"bbbb");
    let c = raw_block(b"cccc");
    let nd1 = dag_block("nd1", &[("cat", a.cid)]);
    let nd2 = dag_block(
        "nd2",
        &[("first", nd1.cid), ("dog", b.cid), ("repeat", nd1.cid)],
    );
    let nd3 = dag_block("nd3", &[("second", nd2.cid), ("bear", c.cid)]);
    SampleDag {
        a,
        b,
        c,
        nd1,
        nd2,
        nd3,
    }
}

impl SampleDag {
    pub fn blocks(&self) -> [&Block; 6] {
        [&self.a, &self.b, &self.c, &self.nd1, &self.nd2, &self.nd3]
    }

    pub fn store(&self) -> MemoryDB {
        let db = MemoryDB::default();
        store_blocks(&db, self.blocks());
        db
    }
}
