// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::car::Block;
use anyhow::Context as _;
use cid::Cid;
use fvm_ipld_blockstore::Blockstore;
use ipld_core::ipld::Ipld;

/// Multicodec code for DAG-CBOR encoded nodes.
pub const DAG_CBOR: u64 = 0x71;
/// Multicodec code for raw, link-free blocks.
pub const IPLD_RAW: u64 = 0x55;

/// A directed edge from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// Slash-separated path of the link inside its parent.
    pub name: String,
    pub cid: Cid,
    /// Cumulative size of the child DAG, if the parent records it.
    pub size: Option<u64>,
}

impl Link {
    pub fn new(name: impl Into<String>, cid: Cid) -> Self {
        Self {
            name: name.into(),
            cid,
            size: None,
        }
    }
}

/// A decoded DAG vertex. The CID always matches the underlying block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    block: Block,
    links: Vec<Link>,
}

impl Node {
    pub fn new(block: Block, links: Vec<Link>) -> Self {
        Self { block, links }
    }

    /// Decodes the outgoing links of `block` according to its codec. Raw and
    /// unknown codecs are treated as leaves.
    pub fn decode(block: Block) -> anyhow::Result<Self> {
        let links = match block.cid.codec() {
            DAG_CBOR => {
                let ipld: Ipld = serde_ipld_dagcbor::from_slice(&block.data)
                    .with_context(|| format!("failed to decode DAG-CBOR node {}", block.cid))?;
                let mut links = vec![];
                collect_links(&ipld, &mut vec![], &mut links);
                links
            }
            _ => vec![],
        };
        Ok(Self { block, links })
    }

    pub fn cid(&self) -> &Cid {
        &self.block.cid
    }

    pub fn data(&self) -> &[u8] {
        &self.block.data
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn into_block(self) -> Block {
        self.block
    }
}

// Depth-first, in map-key then list-index order, so link order is stable.
fn collect_links(ipld: &Ipld, path: &mut Vec<String>, links: &mut Vec<Link>) {
    match ipld {
        Ipld::Link(cid) => links.push(Link {
            name: path.join("/"),
            cid: *cid,
            size: None,
        }),
        Ipld::Map(map) => {
            if let (Some(Ipld::Link(cid)), Some(Ipld::Integer(size))) =
                (map.get("Hash"), map.get("Tsize"))
            {
                links.push(Link {
                    name: path.join("/"),
                    cid: *cid,
                    size: u64::try_from(*size).ok(),
                });
                return;
            }
            for (key, value) in map {
                path.push(key.clone());
                collect_links(value, path, links);
                path.pop();
            }
        }
        Ipld::List(list) => {
            for (index, value) in list.iter().enumerate() {
                path.push(index.to_string());
                collect_links(value, path, links);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Read-only access to the nodes of a DAG.
pub trait NodeSource {
    /// Fetches and decodes the node addressed by `cid`. Missing nodes are an
    /// error.
    fn fetch(&self, cid: &Cid) -> anyhow::Result<Node>;
}

impl<BS: Blockstore> NodeSource for BS {
    fn fetch(&self, cid: &Cid) -> anyhow::Result<Node> {
        let data = self
            .get(cid)?
            .with_context(|| format!("block {cid} not found"))?;
        Node::decode(Block::new(*cid, data))
    }
}

/// Decides which links of a node a graph walk follows.
pub trait LinkPolicy {
    fn links(&self, node: &Node) -> anyhow::Result<Vec<Link>>;
}

/// Follows every link the node declares.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredLinks;

impl LinkPolicy for DeclaredLinks {
    fn links(&self, node: &Node) -> anyhow::Result<Vec<Link>> {
        Ok(node.links().to_vec())
    }
}

impl<F> LinkPolicy for F
where
    F: Fn(&Node) -> anyhow::Result<Vec<Link>>,
{
    fn links(&self, node: &Node) -> anyhow::Result<Vec<Link>> {
        self(node)
    }
}
