// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared boolean-condition language used by both a composite
//! instruction's `conditions` (evaluated against resolved reference
//! values, SPEC_FULL.md §4.6) and a subscription's `filter_conditions`
//! (evaluated against an incoming event payload, SPEC_FULL.md §4.8).
//!
//! Reproduced from the source's `ConditionEvaluator`: a JSON array is an
//! implicit AND-group (the pre-group format); a JSON object with a
//! `logic` key is a structured group (`{ logic: "AND"|"OR", conditions:
//! [...], groups: [...] }`) evaluated recursively; any other JSON object
//! is a single condition (`{ param, operator, value }`). An empty
//! condition list or group is vacuously `true`.
//!
//! Per the resolved open question in SPEC_FULL.md §9/§4.8, an unknown
//! operator is caught at the single-condition boundary and evaluates to
//! `false` for that condition only — a compound `OR` group with one
//! unknown-operator member can still pass on its other members.

use serde_json::{Map, Value};

/// Evaluate `condition` against values produced by `lookup`. `lookup` is
/// called only with a condition's `param` when that string starts with
/// `"REF:"` (resolved however the caller's domain resolves references —
/// the Reference Resolver (F) against sibling responses for the composite
/// executor, against the event payload bound as `arguments` for the
/// scheduler); a `param` without that prefix is the literal left operand
/// itself, not a key into anything. `value` is always taken literally,
/// never REF-resolved, matching `_evaluate_single_condition`.
pub fn evaluate(condition: &Value, lookup: &dyn Fn(&str) -> Option<Value>) -> bool {
    match condition {
        Value::Array(items) => items.iter().all(|c| evaluate(c, lookup)),
        Value::Object(map) if map.contains_key("logic") => evaluate_group(map, lookup),
        Value::Object(_) => evaluate_single(condition, lookup),
        _ => false,
    }
}

fn evaluate_group(map: &Map<String, Value>, lookup: &dyn Fn(&str) -> Option<Value>) -> bool {
    let logic = map.get("logic").and_then(Value::as_str).unwrap_or("AND");
    let conditions = map.get("conditions").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
    let groups = map.get("groups").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);

    let results: Vec<bool> =
        conditions.iter().map(|c| evaluate_single(c, lookup)).chain(groups.iter().map(|g| evaluate(g, lookup))).collect();

    if results.is_empty() {
        return true;
    }

    match logic {
        "OR" => results.into_iter().any(|r| r),
        _ => results.into_iter().all(|r| r),
    }
}

/// One `{ param, operator, value }` leaf. Any malformed shape or unknown
/// operator is caught here and evaluates to `false`, never panics or
/// propagates as an error.
fn evaluate_single(condition: &Value, lookup: &dyn Fn(&str) -> Option<Value>) -> bool {
    let Some(param) = condition.get("param").and_then(Value::as_str) else { return false };
    let Some(operator) = condition.get("operator").and_then(Value::as_str) else { return false };
    let actual = resolve_param(param, lookup);
    let expected = condition.get("value").cloned();

    match operator {
        "exists" => actual.is_some(),
        "not_exists" => actual.is_none(),
        "equals" => expected.is_some_and(|e| actual.as_ref() == Some(&e)),
        "not_equals" => match (actual, expected) {
            (Some(a), Some(e)) => a != e,
            _ => false,
        },
        "greater_than" => numeric_compare(actual, expected, |a, b| a > b),
        "greater_than_or_equal" => numeric_compare(actual, expected, |a, b| a >= b),
        "less_than" => numeric_compare(actual, expected, |a, b| a < b),
        "less_than_or_equal" => numeric_compare(actual, expected, |a, b| a <= b),
        "contains" => match (actual, expected) {
            (Some(Value::Array(items)), Some(e)) => items.contains(&e),
            (Some(Value::String(s)), Some(e)) => e.as_str().is_some_and(|needle| s.contains(needle)),
            _ => false,
        },
        "not_contains" => match (actual, expected) {
            (Some(Value::Array(items)), Some(e)) => !items.contains(&e),
            (Some(Value::String(s)), Some(e)) => e.as_str().is_some_and(|needle| !s.contains(needle)),
            _ => false,
        },
        "starts_with" => match (actual.as_ref().and_then(Value::as_str), expected) {
            (Some(s), Some(e)) => e.as_str().is_some_and(|needle| s.starts_with(needle)),
            _ => false,
        },
        "ends_with" => match (actual.as_ref().and_then(Value::as_str), expected) {
            (Some(s), Some(e)) => e.as_str().is_some_and(|needle| s.ends_with(needle)),
            _ => false,
        },
        "in" => match (actual, expected.and_then(|v| v.as_array().cloned())) {
            (Some(a), Some(values)) => values.contains(&a),
            _ => false,
        },
        "not_in" => match (actual, expected.and_then(|v| v.as_array().cloned())) {
            (Some(a), Some(values)) => !values.contains(&a),
            _ => false,
        },
        _ => false,
    }
}

/// Resolve the `param` operand: the literal string itself, or (when it
/// starts with `"REF:"`) whatever `lookup` resolves it to — mirrors
/// `_evaluate_single_condition`'s `param_value` handling exactly.
fn resolve_param(param: &str, lookup: &dyn Fn(&str) -> Option<Value>) -> Option<Value> {
    if param.starts_with("REF:") {
        lookup(param)
    } else {
        Some(Value::String(param.to_string()))
    }
}

fn numeric_compare(actual: Option<Value>, expected: Option<Value>, cmp: impl FnOnce(f64, f64) -> bool) -> bool {
    let Some(actual) = actual.as_ref().and_then(as_f64) else { return false };
    let Some(expected) = expected.as_ref().and_then(as_f64) else { return false };
    cmp(actual, expected)
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
