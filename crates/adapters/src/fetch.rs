// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridges Storage (D) and Auth (E) into the
//! [`ratio_resolver::FileContentFetcher`] contract the Reference Resolver
//! (F) calls when a `REF:…` target is an unqualified `File` value
//! (SPEC_FULL.md §4.3: "requiring a valid bearer token").

use crate::auth::TokenVerifier;
use crate::storage::Storage;
use async_trait::async_trait;
use ratio_resolver::{FileContentFetcher, ResolveError};
use std::sync::Arc;

pub struct AuthorizedFileFetcher {
    storage: Arc<dyn Storage>,
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthorizedFileFetcher {
    pub fn new(storage: Arc<dyn Storage>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { storage, verifier }
    }
}

#[async_trait]
impl FileContentFetcher for AuthorizedFileFetcher {
    async fn fetch(&self, path: &str, token: &str) -> Result<Vec<u8>, ResolveError> {
        self.verifier.verify(token).map_err(|e| ResolveError::FetchFailed(e.to_string()))?;
        self.storage.get(path).await.map_err(|e| ResolveError::FetchFailed(e.to_string()))
    }
}
