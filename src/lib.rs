// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Content-addressed archive (CARv1) codec.
//!
//! - [`car::CarWriter`] walks a DAG from its roots and writes every reachable
//!   block once.
//! - [`car::CarReader`] streams blocks back, verifying each against its CID.
//! - [`car::CarLoader`] drains a reader into a block sink, batching inserts
//!   when the sink supports it.
//! - [`car::SelectiveCar`] exports the parts of DAGs chosen by selectors, and
//!   can size the output exactly before writing it.

pub mod car;
pub mod cid_collections;
pub mod db;
mod error;
pub mod ipld;
#[cfg(test)]
mod test_utils;

pub use error::{Error, ErrorCategory};
