// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! CARv1: `[varint][DAG-CBOR header]` followed by any number of
//! `[varint][CID bytes ++ block data]` frames. No trailer, index or checksum.
//! See <https://ipld.io/specs/transport/car/carv1/>

mod block;
pub mod frame;
mod header;
mod loader;
mod reader;
mod selective;
mod writer;

pub use block::{Block, IDENTITY_HASH, fingerprint};
pub use header::{CAR_VERSION, CarHeader};
pub use loader::{
    BlockSink, BulkBlockSink, CarLoader, DEFAULT_BATCH_SIZE, LoadOptions, load_car,
};
pub use reader::{BlockPosition, CarReader, FileSource};
pub use selective::{DagSpec, PreparedCar, SelectiveBlock, SelectiveCar};
pub use writer::{CarWriter, write_car};

use crate::Error;
use tokio_util::sync::CancellationToken;

fn check_cancelled(token: Option<&CancellationToken>) -> Result<(), Error> {
    match token {
        Some(token) if token.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}
