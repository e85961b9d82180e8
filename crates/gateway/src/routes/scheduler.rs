// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/scheduler/*` — CRUD over the Subscription Stores (Component B,
//! spec.md §6).

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use ratio_core::{FilesystemSubscription, GeneralSubscription, SubscriptionCommon, SubscriptionId};
use ratio_store::full_path_hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Either flavor of subscription a caller can create; exactly one of
/// `file_path` (filesystem-keyed) or `event_type` (general) selects which.
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub tool_definition: String,
    #[serde(default)]
    pub process_owner: Option<String>,
    pub expiration: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub single_use: bool,
    pub filter_conditions: Option<serde_json::Value>,
    pub execution_working_directory: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub file_event_type: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSubscriptionResponse {
    pub subscription_id: SubscriptionId,
}

pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<CreateSubscriptionRequest>,
) -> Result<Json<CreateSubscriptionResponse>, ApiError> {
    let owner = body.process_owner.unwrap_or_else(|| auth.claims.sub.clone());
    auth.require_owner_or_admin(&owner)?;

    let subscription_id = SubscriptionId::new();
    let common = SubscriptionCommon {
        subscription_id,
        tool_definition: body.tool_definition,
        process_owner: owner,
        expiration: body.expiration,
        single_use: body.single_use,
        last_execution: None,
        filter_conditions: body.filter_conditions,
        execution_working_directory: body.execution_working_directory,
    };

    match (body.file_path, body.event_type) {
        (Some(file_path), None) => {
            let (parent_path, file_name) = ratio_store_path_split(&file_path);
            let sub = FilesystemSubscription {
                common,
                full_path_hash: full_path_hash(parent_path, file_name),
                file_path,
                file_type: body.file_type,
                file_event_type: body.file_event_type,
            };
            state.subscription_store.insert_filesystem(sub);
        }
        (None, Some(event_type)) => {
            state.subscription_store.insert_general(GeneralSubscription { common, event_type });
        }
        _ => {
            return Err(ApiError::Validation(ratio_validator::ValidationError {
                path: String::new(),
                message: "exactly one of file_path or event_type must be present".to_string(),
            }))
        }
    }

    Ok(Json(CreateSubscriptionResponse { subscription_id }))
}

fn ratio_store_path_split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionIdRequest {
    pub subscription_id: String,
}

/// One of the two stored shapes, serialized uniformly for `describe`/`list`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SubscriptionView {
    Filesystem(FilesystemSubscription),
    General(GeneralSubscription),
}

pub async fn describe_subscription(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<SubscriptionIdRequest>,
) -> Result<Json<SubscriptionView>, ApiError> {
    let id = SubscriptionId::from_string(&body.subscription_id);
    if let Some(sub) = state.subscription_store.get_filesystem(&id) {
        auth.require_owner_or_admin(&sub.common.process_owner)?;
        return Ok(Json(SubscriptionView::Filesystem(sub)));
    }
    if let Some(sub) = state.subscription_store.get_general(&id) {
        auth.require_owner_or_admin(&sub.common.process_owner)?;
        return Ok(Json(SubscriptionView::General(sub)));
    }
    Err(ApiError::NotFound(format!("no subscription {}", body.subscription_id)))
}

pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<SubscriptionIdRequest>,
) -> Result<(), ApiError> {
    let id = SubscriptionId::from_string(&body.subscription_id);
    if let Some(sub) = state.subscription_store.get_filesystem(&id) {
        auth.require_owner_or_admin(&sub.common.process_owner)?;
        state.subscription_store.delete_filesystem(&id);
        return Ok(());
    }
    if let Some(sub) = state.subscription_store.get_general(&id) {
        auth.require_owner_or_admin(&sub.common.process_owner)?;
        state.subscription_store.delete_general(&id);
        return Ok(());
    }
    Err(ApiError::NotFound(format!("no subscription {}", body.subscription_id)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSubscriptionsRequest {
    #[serde(default)]
    pub process_owner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListSubscriptionsResponse {
    pub filesystem: Vec<FilesystemSubscription>,
    pub general: Vec<GeneralSubscription>,
}

pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(body): Json<ListSubscriptionsRequest>,
) -> Result<Json<ListSubscriptionsResponse>, ApiError> {
    let mut filesystem = state.subscription_store.list_filesystem();
    let mut general = state.subscription_store.list_general();
    filesystem.retain(|s| auth.claims.is_owner_or_admin(&s.common.process_owner));
    general.retain(|s| auth.claims.is_owner_or_admin(&s.common.process_owner));
    if let Some(owner) = &body.process_owner {
        filesystem.retain(|s| &s.common.process_owner == owner);
        general.retain(|s| &s.common.process_owner == owner);
    }
    Ok(Json(ListSubscriptionsResponse { filesystem, general }))
}
