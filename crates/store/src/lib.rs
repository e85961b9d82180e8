// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The Process Store (Component A) and Subscription Store (Component B):
//! the process engine's durable records.
//!
//! Both stores are plain in-memory maps guarded by `parking_lot::RwLock`,
//! matching the materialized-state shape the teacher's daemon builds from
//! WAL replay (`daemon/src/storage/state/mod.rs`), periodically persisted
//! through [`snapshot::Snapshot`].

mod error;
mod path_hash;
mod process_store;
mod snapshot;
mod subscription_store;

pub use error::StoreError;
pub use path_hash::full_path_hash;
pub use process_store::ProcessStore;
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use subscription_store::SubscriptionStore;
