// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Selective export: only the part of each DAG a selector reaches is
//! written. The visit order is fully determined by the sources and the
//! selectors, so the export can be sized in advance ([`SelectiveCar::prepare`])
//! and replayed later ([`PreparedCar::dump`]) with byte-identical output.

use super::{CarHeader, check_cancelled};
use crate::Error;
use crate::cid_collections::CidHashSet;
use crate::ipld::{Decision, Node, NodeSource, Selector};
use ahash::HashSet;
use cid::Cid;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// A root and the selector applied to the DAG below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagSpec<S> {
    pub root: Cid,
    pub selector: S,
}

impl<S> DagSpec<S> {
    pub fn new(root: Cid, selector: S) -> Self {
        Self { root, selector }
    }
}

/// A block as it is being emitted by [`SelectiveCar::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectiveBlock<'a> {
    pub cid: Cid,
    pub data: &'a [u8],
    /// Offset of the block frame in the output.
    pub offset: u64,
    /// Length of the block frame, prefix included.
    pub size: u64,
}

pub struct SelectiveCar<'a, N, S> {
    source: &'a N,
    dags: Vec<DagSpec<S>>,
    cancel: Option<CancellationToken>,
}

impl<'a, N: NodeSource, S: Selector> SelectiveCar<'a, N, S> {
    pub fn new(source: &'a N, dags: Vec<DagSpec<S>>) -> Self {
        Self {
            source,
            dags,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn header(&self) -> CarHeader {
        CarHeader::new(self.dags.iter().map(|dag| dag.root).collect())
    }

    /// Computes the blocks and the exact byte size of the export without
    /// writing anything.
    pub fn prepare(&self) -> Result<PreparedCar<'a, N>, Error> {
        let header = self.header();
        let mut size = header.encoded_len()?;
        let mut cids = vec![];
        self.traverse(|node| {
            size += node.block().frame_len();
            cids.push(*node.cid());
            Ok(())
        })?;
        tracing::debug!(blocks = cids.len(), bytes = size, "prepared selective CAR");
        Ok(PreparedCar {
            source: self.source,
            header,
            cids,
            size,
            cancel: self.cancel.clone(),
        })
    }

    /// Writes the export in one pass, calling `visitor` once per emitted
    /// block. Returns the number of bytes written.
    pub fn write<W, F>(&self, writer: &mut W, mut visitor: F) -> Result<u64, Error>
    where
        W: Write + ?Sized,
        F: FnMut(&SelectiveBlock<'_>) -> anyhow::Result<()>,
    {
        let mut offset = self.header().write(writer)?;
        self.traverse(|node| {
            let size = node.block().write(writer)?;
            let block = SelectiveBlock {
                cid: *node.cid(),
                data: node.data(),
                offset,
                size,
            };
            offset += size;
            visitor(&block).map_err(Error::Visitor)
        })?;
        Ok(offset)
    }

    /// Depth-first walk over every [`DagSpec`], emitting each node on its first
    /// visit. A node reached again under a different selector is explored
    /// again, since that selector may follow other links.
    fn traverse(&self, mut emit: impl FnMut(&Node) -> Result<(), Error>) -> Result<(), Error> {
        let mut emitted = CidHashSet::new();
        let mut explored: HashSet<(Cid, S)> = HashSet::default();
        for dag in &self.dags {
            let mut stack = vec![(dag.root, dag.selector.clone())];
            while let Some((cid, selector)) = stack.pop() {
                if explored.contains(&(cid, selector.clone())) {
                    continue;
                }
                check_cancelled(self.cancel.as_ref())?;
                let node = self
                    .source
                    .fetch(&cid)
                    .map_err(|source| Error::Fetch { cid, source })?;
                if emitted.insert(cid) {
                    emit(&node)?;
                }
                let children: Vec<_> = node
                    .links()
                    .iter()
                    .enumerate()
                    .filter_map(|(index, link)| match selector.decide(&node, index, link) {
                        Decision::Descend(next) => Some((link.cid, next)),
                        Decision::Skip => None,
                    })
                    .collect();
                explored.insert((cid, selector));
                stack.extend(children.into_iter().rev());
            }
        }
        Ok(())
    }
}

/// The outcome of [`SelectiveCar::prepare`]: the header, the ordered list of
/// blocks and the exact size of the archive [`PreparedCar::dump`] will write.
pub struct PreparedCar<'a, N> {
    source: &'a N,
    header: CarHeader,
    cids: Vec<Cid>,
    size: u64,
    cancel: Option<CancellationToken>,
}

impl<N: NodeSource> PreparedCar<'_, N> {
    pub fn header(&self) -> &CarHeader {
        &self.header
    }

    pub fn cids(&self) -> &[Cid] {
        &self.cids
    }

    /// Total archive size in bytes, header included.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Re-fetches and writes the prepared blocks in order. Returns the number
    /// of bytes written.
    pub fn dump<W: Write + ?Sized>(&self, writer: &mut W) -> Result<u64, Error> {
        let mut written = self.header.write(writer)?;
        for &cid in &self.cids {
            check_cancelled(self.cancel.as_ref())?;
            let node = self
                .source
                .fetch(&cid)
                .map_err(|source| Error::Fetch { cid, source })?;
            written += node.block().write(writer)?;
        }
        Ok(written)
    }
}
