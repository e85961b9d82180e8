// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Resolver` holds the arguments of the current process plus the
//! registered responses of terminal siblings, and answers `REF:…` queries
//! against them.

use crate::reference::{RefContext, Reference};
use crate::ResolveError;
use async_trait::async_trait;
use ratio_core::{ExecutionId, FileRef, TypedValue};
use std::collections::BTreeMap;

/// Fetches file content from the external Storage (D) contract. The
/// resolver never touches a filesystem directly — content access always
/// goes through this trait, fulfilled by `ratio-adapters` in the daemon.
#[async_trait]
pub trait FileContentFetcher: Send + Sync {
    async fn fetch(&self, path: &str, token: &str) -> Result<Vec<u8>, ResolveError>;
}

/// What a successfully-resolved reference evaluates to. Distinct from
/// [`TypedValue`] only in that a `File` target without an attribute
/// resolves to content bytes, not a [`FileRef`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    String(String),
    Number(f64),
    Boolean(bool),
    List(Vec<TypedValue>),
    Object(BTreeMap<String, TypedValue>),
    FileContent(Vec<u8>),
}

/// `{arguments: mapping, responses: mapping execution_id -> mapping name -> TypedValue}`
/// per SPEC_FULL.md §4.3.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    arguments: BTreeMap<String, TypedValue>,
    responses: BTreeMap<ExecutionId, BTreeMap<String, TypedValue>>,
}

impl Resolver {
    pub fn new(arguments: BTreeMap<String, TypedValue>) -> Self {
        Self { arguments, responses: BTreeMap::new() }
    }

    /// Register a sibling's declared output. Call once per (execution_id,
    /// name) pair as each sibling reaches a terminal status.
    pub fn add_response(&mut self, execution_id: ExecutionId, name: String, value: TypedValue) {
        self.responses.entry(execution_id).or_default().insert(name, value);
    }

    pub fn has_sibling(&self, execution_id: &ExecutionId) -> bool {
        self.responses.contains_key(execution_id)
    }

    fn lookup(&self, reference: &Reference) -> Result<Option<&TypedValue>, ResolveError> {
        match &reference.context {
            RefContext::Arguments => Ok(self.arguments.get(&reference.key)),
            RefContext::Sibling(execution_id) => {
                let sibling = self
                    .responses
                    .get(execution_id)
                    .ok_or_else(|| ResolveError::UnknownContext(execution_id.to_string()))?;
                Ok(sibling.get(&reference.key))
            }
        }
    }

    /// Parse and resolve a `REF:…` string with no file-content fetch
    /// involved. Fails with `FetchFailed` if resolution would require
    /// fetching file content (use [`Resolver::resolve`] for that case).
    pub fn resolve_sync(&self, ref_string: &str) -> Result<ResolvedValue, ResolveError> {
        let reference = Reference::parse(ref_string)?;
        let value = self
            .lookup(&reference)?
            .ok_or_else(|| ResolveError::KeyNotFound(reference.key.clone()))?;
        self.project(value, reference.attribute.as_deref())
    }

    /// Parse and resolve a `REF:…` string, fetching file content lazily
    /// through `fetcher` when the target is an unqualified `File` value.
    pub async fn resolve(
        &self,
        ref_string: &str,
        token: Option<&str>,
        fetcher: &dyn FileContentFetcher,
    ) -> Result<ResolvedValue, ResolveError> {
        let reference = Reference::parse(ref_string)?;
        let value = self
            .lookup(&reference)?
            .ok_or_else(|| ResolveError::KeyNotFound(reference.key.clone()))?;

        if reference.attribute.is_none() {
            if let TypedValue::File(file_ref) = value {
                let token = token.ok_or(ResolveError::MissingToken)?;
                let bytes = fetcher.fetch(&file_ref.path, token).await?;
                return Ok(ResolvedValue::FileContent(bytes));
            }
        }

        self.project(value, reference.attribute.as_deref())
    }

    /// Apply the attribute-access rule for `value`'s kind.
    fn project(
        &self,
        value: &TypedValue,
        attribute: Option<&str>,
    ) -> Result<ResolvedValue, ResolveError> {
        match (value, attribute) {
            (TypedValue::String(_) | TypedValue::Number(_) | TypedValue::Boolean(_), Some(attr)) => {
                Err(ResolveError::InvalidAttribute { kind: value.kind_name(), attribute: attr.to_string() })
            }
            (TypedValue::String(s), None) => Ok(ResolvedValue::String(s.clone())),
            (TypedValue::Number(n), None) => Ok(ResolvedValue::Number(*n)),
            (TypedValue::Boolean(b), None) => Ok(ResolvedValue::Boolean(*b)),

            (TypedValue::List(items), None) => Ok(ResolvedValue::List(items.clone())),
            (TypedValue::List(items), Some(attr)) => project_list_attribute(items, attr),

            (TypedValue::Object(map), None) => Ok(ResolvedValue::Object(map.clone())),
            (TypedValue::Object(map), Some(key)) => {
                // Missing key yields null, not an error (SPEC_FULL.md §4.3).
                Ok(map
                    .get(key)
                    .cloned()
                    .map(typed_value_to_resolved)
                    .unwrap_or(ResolvedValue::Object(BTreeMap::new())))
            }

            (TypedValue::File(file_ref), Some(attr)) => project_file_attribute(file_ref, attr),
            (TypedValue::File(_), None) => {
                // Unqualified file access resolves to content, which the
                // async `resolve()` path short-circuits to before ever
                // calling `project`. Reaching here means `resolve_sync`
                // was asked for file content, which it cannot fetch.
                Err(ResolveError::FetchFailed(
                    "file content requires the async resolve() path".to_string(),
                ))
            }
        }
    }
}

fn typed_value_to_resolved(value: TypedValue) -> ResolvedValue {
    match value {
        TypedValue::String(s) => ResolvedValue::String(s),
        TypedValue::Number(n) => ResolvedValue::Number(n),
        TypedValue::Boolean(b) => ResolvedValue::Boolean(b),
        TypedValue::List(items) => ResolvedValue::List(items),
        TypedValue::Object(map) => ResolvedValue::Object(map),
        TypedValue::File(f) => ResolvedValue::Object(BTreeMap::from([(
            "path".to_string(),
            TypedValue::String(f.path),
        )])),
    }
}

fn project_list_attribute(items: &[TypedValue], attr: &str) -> Result<ResolvedValue, ResolveError> {
    match attr {
        "length" => Ok(ResolvedValue::Number(items.len() as f64)),
        "first" => items
            .first()
            .cloned()
            .map(typed_value_to_resolved)
            .ok_or_else(|| ResolveError::IndexOutOfRange(0, items.len())),
        "last" => items
            .last()
            .cloned()
            .map(typed_value_to_resolved)
            .ok_or_else(|| ResolveError::IndexOutOfRange(items.len().saturating_sub(1), items.len())),
        other => {
            let index: usize = other
                .parse()
                .map_err(|_| ResolveError::InvalidAttribute { kind: "list", attribute: other.to_string() })?;
            items
                .get(index)
                .cloned()
                .map(typed_value_to_resolved)
                .ok_or(ResolveError::IndexOutOfRange(index, items.len()))
        }
    }
}

fn project_file_attribute(file_ref: &FileRef, attr: &str) -> Result<ResolvedValue, ResolveError> {
    match attr {
        "file_name" => Ok(ResolvedValue::String(file_ref.file_name().to_string())),
        "path" => Ok(ResolvedValue::String(file_ref.path.clone())),
        "parent_directory" => Ok(ResolvedValue::String(file_ref.parent_directory().to_string())),
        other => Err(ResolveError::InvalidAttribute { kind: "file", attribute: other.to_string() }),
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
