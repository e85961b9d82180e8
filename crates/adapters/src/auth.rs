// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component E: the auth/token-issuing service. Tokens are three-segment
//! (header.payload.signature) RSA-signed bearer tokens carrying identity
//! and group claims (SPEC_FULL.md §6). `jsonwebtoken`'s RS256 is the
//! idiomatic stand-in for the source's RSASSA_PKCS1_V1_5_SHA_256.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is expired")]
    Expired,

    #[error("token signature invalid")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("caller is not admin and is not the owner of this resource")]
    NotOwnerOrAdmin,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            other => AuthError::Malformed(other.to_string()),
        }
    }
}

/// Claims carried by every bearer token (SPEC_FULL.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Entity (principal) id.
    pub sub: String,
    /// Every group the entity belongs to.
    pub auth_grps: Vec<String>,
    /// The entity's primary group.
    pub p_grp: String,
    pub admin: bool,
    /// Default working directory ("home") for processes this token launches.
    pub home: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    /// Customer/tenant id, when multi-tenant.
    pub cus: Option<String>,
}

impl Claims {
    pub fn is_owner_or_admin(&self, owner: &str) -> bool {
        self.admin || self.sub == owner
    }
}

/// Issues new bearer tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, claims: &Claims) -> Result<String, AuthError>;
}

/// Verifies bearer tokens and returns their claims. Expiration is
/// enforced here — mandatory before every authenticated op
/// (SPEC_FULL.md §6).
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// RS256 JWT-backed implementation of both traits.
pub struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtAuth {
    pub fn new(rsa_private_pem: &[u8], rsa_public_pem: &[u8], issuer: impl Into<String>) -> Result<Self, AuthError> {
        Ok(Self {
            encoding_key: EncodingKey::from_rsa_pem(rsa_private_pem).map_err(|e| AuthError::Malformed(e.to_string()))?,
            decoding_key: DecodingKey::from_rsa_pem(rsa_public_pem).map_err(|e| AuthError::Malformed(e.to_string()))?,
            issuer: issuer.into(),
        })
    }

    /// Build a fresh set of claims for `entity`, valid for `active_hours`.
    pub fn build_claims(
        &self,
        entity: impl Into<String>,
        groups: Vec<String>,
        primary_group: impl Into<String>,
        admin: bool,
        home: impl Into<String>,
        active_hours: u32,
        customer: Option<String>,
    ) -> Claims {
        let now = Utc::now();
        Claims {
            sub: entity.into(),
            auth_grps: groups,
            p_grp: primary_group.into(),
            admin,
            home: home.into(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(active_hours as i64)).timestamp(),
            iss: self.issuer.clone(),
            cus: customer,
        }
    }
}

impl TokenIssuer for JwtAuth {
    fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        let header = Header::new(Algorithm::RS256);
        Ok(encode(&header, claims, &self.encoding_key)?)
    }
}

impl TokenVerifier for JwtAuth {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}
