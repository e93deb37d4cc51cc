// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{CarHeader, check_cancelled};
use crate::Error;
use crate::cid_collections::CidHashSet;
use crate::ipld::{DeclaredLinks, LinkPolicy, NodeSource};
use cid::Cid;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Writes the DAGs reachable from a set of roots as one CAR stream.
///
/// Every reachable node is emitted exactly once, on first encounter, even
/// when several roots or paths reach it. Nodes are written as fetched; the
/// writer trusts the source and does not re-hash.
pub struct CarWriter<'a, S, P = DeclaredLinks> {
    source: &'a S,
    policy: P,
    cancel: Option<CancellationToken>,
}

impl<'a, S: NodeSource> CarWriter<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            policy: DeclaredLinks,
            cancel: None,
        }
    }
}

impl<'a, S: NodeSource, P: LinkPolicy> CarWriter<'a, S, P> {
    /// Replaces the link discovery policy, e.g. to prune subtrees.
    pub fn with_link_policy<Q: LinkPolicy>(self, policy: Q) -> CarWriter<'a, S, Q> {
        CarWriter {
            source: self.source,
            policy,
            cancel: self.cancel,
        }
    }

    /// The token is polled between node visits. A cancelled write leaves
    /// truncated output behind.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Writes the header followed by every node reachable from `roots`.
    /// Returns the number of bytes written.
    pub fn write<W: Write + ?Sized>(&self, roots: &[Cid], writer: &mut W) -> Result<u64, Error> {
        let header = CarHeader::new(roots.to_vec());
        let mut written = header.write(writer)?;

        let mut seen = CidHashSet::new();
        for root in roots {
            let mut stack = vec![*root];
            while let Some(cid) = stack.pop() {
                if !seen.insert(cid) {
                    continue;
                }
                check_cancelled(self.cancel.as_ref())?;
                let node = self
                    .source
                    .fetch(&cid)
                    .map_err(|source| Error::Fetch { cid, source })?;
                written += node.block().write(writer)?;
                let links = self.policy.links(&node).map_err(Error::LinkPolicy)?;
                // Reversed so the first link is visited first.
                stack.extend(links.iter().rev().map(|link| link.cid));
            }
        }
        tracing::debug!(blocks = seen.len(), bytes = written, "wrote CAR");
        Ok(written)
    }
}

/// Writes every node reachable from `roots`, following all declared links.
pub fn write_car<S: NodeSource, W: Write + ?Sized>(
    source: &S,
    roots: &[Cid],
    writer: &mut W,
) -> Result<u64, Error> {
    CarWriter::new(source).write(roots, writer)
}
