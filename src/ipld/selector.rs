// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Link, Node};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Outcome of evaluating a selector against one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<S> {
    /// Follow the link, evaluating the child with the given selector.
    Descend(S),
    Skip,
}

/// A predicate over the links of a node, deciding which of them a selective
/// walk follows. Selectors are values: descending a link yields the selector
/// that applies to the child, which is how recursion limits and nested
/// matches are expressed.
pub trait Selector: Clone + Eq + Hash + Debug {
    fn decide(&self, node: &Node, index: usize, link: &Link) -> Decision<Self>;
}

/// A small selector language covering the common explore patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkSelector {
    /// Stop at the current node.
    Matcher,
    /// Follow every link, at most `depth` levels further (`None` is unbounded).
    All { depth: Option<u64> },
    /// Follow only the link at position `index`, continuing with `next`.
    Index {
        index: usize,
        next: Box<LinkSelector>,
    },
    /// Follow only the links with the given names.
    Fields(BTreeMap<String, LinkSelector>),
}

impl LinkSelector {
    /// Selects the complete DAG.
    pub fn everything() -> Self {
        LinkSelector::All { depth: None }
    }
}

impl Selector for LinkSelector {
    fn decide(&self, _node: &Node, index: usize, link: &Link) -> Decision<Self> {
        match self {
            LinkSelector::Matcher => Decision::Skip,
            LinkSelector::All { depth: None } => Decision::Descend(self.clone()),
            LinkSelector::All { depth: Some(0) } => Decision::Skip,
            LinkSelector::All { depth: Some(n) } => {
                Decision::Descend(LinkSelector::All { depth: Some(n - 1) })
            }
            LinkSelector::Index { index: i, next } if *i == index => {
                Decision::Descend(next.as_ref().clone())
            }
            LinkSelector::Index { .. } => Decision::Skip,
            LinkSelector::Fields(fields) => fields
                .get(&link.name)
                .map_or(Decision::Skip, |next| Decision::Descend(next.clone())),
        }
    }
}
