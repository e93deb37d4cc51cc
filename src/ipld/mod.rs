// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod node;
pub mod selector;

pub use node::{DAG_CBOR, DeclaredLinks, IPLD_RAW, Link, LinkPolicy, Node, NodeSource};
pub use selector::{Decision, LinkSelector, Selector};
