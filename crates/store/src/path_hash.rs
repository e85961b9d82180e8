// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The filesystem subscription partition key: a double SHA-256 hash of
//! `(parent_path, file_name)`, grounded on
//! `original_source/.../filesystem_subscriptions/client.py`'s
//! `create_full_path_hash_from_path`.

use sha2::{Digest, Sha256};

fn hex_sha256(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// `SHA256(SHA256(parent_path) + "-" + SHA256(file_name))`, hex-encoded at
/// every step (SPEC_FULL.md §3).
pub fn full_path_hash(parent_path: &str, file_name: &str) -> String {
    let path_hash = hex_sha256(parent_path);
    let name_hash = hex_sha256(file_name);
    hex_sha256(&format!("{path_hash}-{name_hash}"))
}
