// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

#![allow(dead_code)]

use ahash::{HashMap, HashSet};
use cid::Cid;
use forest_car::car::Block;
use forest_car::db::MemoryDB;
use forest_car::ipld::{DAG_CBOR, IPLD_RAW};
use fvm_ipld_blockstore::Blockstore as _;
use ipld_core::ipld::Ipld;
use multihash_codetable::Code;
use quickcheck::{Arbitrary, Gen};
use std::collections::BTreeMap;

pub fn raw_block(data: &[u8]) -> Block {
    Block::from_data(IPLD_RAW, Code::Sha2_256, data.to_vec())
}

pub fn dag_block(name: &str, links: &[(String, Cid)]) -> Block {
    let mut map = BTreeMap::from([("data".to_owned(), Ipld::String(name.to_owned()))]);
    for (link_name, cid) in links {
        map.insert(link_name.clone(), Ipld::Link(*cid));
    }
    let bytes = serde_ipld_dagcbor::to_vec(&Ipld::Map(map)).unwrap();
    Block::from_data(DAG_CBOR, Code::Blake2b256, bytes)
}

/// A random DAG: node `i` may only link to nodes `j < i`, so it is acyclic.
#[derive(Debug, Clone)]
pub struct RandomDag {
    pub blocks: Vec<Block>,
    pub children: HashMap<Cid, Vec<Cid>>,
    pub roots: Vec<Cid>,
}

impl Arbitrary for RandomDag {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::from(u8::arbitrary(g) % 24) + 1;
        let mut blocks: Vec<Block> = Vec::with_capacity(n);
        let mut children = HashMap::default();
        for i in 0..n {
            let links: Vec<(String, Cid)> = blocks
                .iter()
                .enumerate()
                .filter(|_| u8::arbitrary(g) % 4 == 0)
                .map(|(j, block)| (format!("n{j}"), block.cid))
                .collect();
            let block = if links.is_empty() && bool::arbitrary(g) {
                raw_block(format!("leaf {i}").as_bytes())
            } else {
                dag_block(&format!("node {i}"), &links)
            };
            children.insert(block.cid, links.into_iter().map(|(_, cid)| cid).collect());
            blocks.push(block);
        }
        let root_count = usize::from(u8::arbitrary(g) % 3) + 1;
        let roots = (0..root_count)
            .map(|_| g.choose(&blocks).unwrap().cid)
            .collect();
        RandomDag {
            blocks,
            children,
            roots,
        }
    }
}

impl RandomDag {
    pub fn store(&self) -> MemoryDB {
        let db = MemoryDB::default();
        for block in &self.blocks {
            db.put_keyed(&block.cid, &block.data).unwrap();
        }
        db
    }

    pub fn block(&self, cid: &Cid) -> &Block {
        self.blocks.iter().find(|b| &b.cid == cid).unwrap()
    }

    /// Everything reachable from `roots` without passing through `avoid`.
    pub fn reachable_avoiding(&self, roots: &[Cid], avoid: Option<Cid>) -> HashSet<Cid> {
        let mut seen = HashSet::default();
        let mut stack: Vec<Cid> = roots.to_vec();
        while let Some(cid) = stack.pop() {
            if !seen.insert(cid) {
                continue;
            }
            for child in &self.children[&cid] {
                if Some(*child) != avoid {
                    stack.push(*child);
                }
            }
        }
        seen
    }

    pub fn reachable(&self) -> HashSet<Cid> {
        self.reachable_avoiding(&self.roots, None)
    }
}
