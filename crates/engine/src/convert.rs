// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversions between [`serde_json::Value`] literals, [`TypedValue`], and
//! a resolved reference's [`ResolvedValue`] — the glue the composite
//! executor needs when materializing an instruction's argument bindings
//! and a composite's `response_reference_map`.

use ratio_resolver::ResolvedValue;
use serde_json::Value;
use std::collections::BTreeMap;

/// Interpret a literal (non-`REF:`) JSON value as a [`TypedValue`],
/// recursing into lists/objects. `null` has no closed-set counterpart
/// (SPEC_FULL.md §4.3's six kinds are exhaustive) so it maps to an empty
/// object, matching the resolver's own "missing key yields null" choice of
/// representing absence as an empty object rather than inventing a
/// seventh kind.
pub fn json_literal_to_typed(value: &Value) -> ratio_core::TypedValue {
    use ratio_core::TypedValue;
    match value {
        Value::String(s) => TypedValue::String(s.clone()),
        Value::Number(n) => TypedValue::Number(n.as_f64().unwrap_or(0.0)),
        Value::Bool(b) => TypedValue::Boolean(*b),
        Value::Array(items) => TypedValue::List(items.iter().map(json_literal_to_typed).collect()),
        Value::Object(map) => {
            TypedValue::Object(map.iter().map(|(k, v)| (k.clone(), json_literal_to_typed(v))).collect())
        }
        Value::Null => TypedValue::Object(BTreeMap::new()),
    }
}

/// A successfully resolved `REF:…` target, turned back into a
/// [`TypedValue`] so it can sit in a child process's argument object or a
/// composite's response object. Unqualified file content becomes a UTF-8
/// string (lossy) — the only one of the six kinds that can carry arbitrary
/// text content for a downstream tool to consume.
pub fn resolved_to_typed(value: ResolvedValue) -> ratio_core::TypedValue {
    use ratio_core::TypedValue;
    match value {
        ResolvedValue::String(s) => TypedValue::String(s),
        ResolvedValue::Number(n) => TypedValue::Number(n),
        ResolvedValue::Boolean(b) => TypedValue::Boolean(b),
        ResolvedValue::List(items) => TypedValue::List(items),
        ResolvedValue::Object(map) => TypedValue::Object(map),
        ResolvedValue::FileContent(bytes) => TypedValue::String(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

/// A resolved value projected into plain JSON, for the condition
/// evaluator's field lookups (SPEC_FULL.md §4.6/§9).
pub fn resolved_to_json(value: ResolvedValue) -> Value {
    match value {
        ResolvedValue::String(s) => Value::String(s),
        ResolvedValue::Number(n) => serde_json::json!(n),
        ResolvedValue::Boolean(b) => Value::Bool(b),
        ResolvedValue::List(items) => serde_json::to_value(items).unwrap_or(Value::Null),
        ResolvedValue::Object(map) => serde_json::to_value(map).unwrap_or(Value::Null),
        ResolvedValue::FileContent(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
    }
}
