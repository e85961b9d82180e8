// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-auth extraction: reads `x-ratio-authorization`, verifies the JWT
//! (Component E via [`ratio_adapters::TokenVerifier`]), and hands the
//! resolved principal to the route handler (SPEC_FULL.md §4.5/§6).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ratio_adapters::Claims;
use std::sync::Arc;

pub const AUTH_HEADER: &str = "x-ratio-authorization";

/// The authenticated caller, plus the raw bearer token for onward use
/// (leaf dispatch, `REF:` file fetches).
pub struct AuthContext {
    pub claims: Claims,
    pub token: String,
}

impl AuthContext {
    pub fn require_owner_or_admin(&self, owner: &str) -> Result<(), ApiError> {
        if self.claims.is_owner_or_admin(owner) {
            Ok(())
        } else {
            Err(ApiError::Auth(ratio_adapters::AuthError::NotOwnerOrAdmin))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Auth(ratio_adapters::AuthError::Malformed("missing x-ratio-authorization header".to_string())))?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).to_string();
        let claims = state.verifier.verify(&token)?;
        Ok(AuthContext { claims, token })
    }
}
