//! Approximate serialized-size estimation
//!
//! Decides whether an error payload is small enough to forward to the
//! reporting backend. The cost model weighs strings at two bytes per
//! UTF-16 code unit, numbers at eight bytes, and booleans at four;
//! containers themselves contribute nothing. An empty object therefore
//! estimates to zero bytes. That quirk is part of the contract and is
//! asserted literally in the tests.

use serde_json::Value;

use crate::exception::{CapturedError, TagValue};

/// Estimate the serialized size of a value graph in bytes.
///
/// The walk uses an explicit stack rather than recursion, so arbitrarily
/// deep inputs cannot overflow the call stack, and it exits early once the
/// running total reaches `budget`. Never fails.
pub fn estimate_size(value: &Value, budget: usize) -> usize {
    let mut stack: Vec<&Value> = vec![value];
    let mut bytes = 0usize;

    while let Some(value) = stack.pop() {
        if bytes >= budget {
            break;
        }
        match value {
            Value::Bool(_) => bytes += 4,
            Value::Number(_) => bytes += 8,
            Value::String(s) => bytes += utf16_cost(s),
            Value::Null => {}
            Value::Array(items) => stack.extend(items.iter()),
            Value::Object(map) => stack.extend(map.values()),
        }
    }

    bytes
}

/// Whether a value's estimate is strictly under `budget`.
///
/// An estimate of exactly `budget` is over.
pub fn is_within_budget(value: &Value, budget: usize) -> bool {
    estimate_size(value, budget) < budget
}

/// Estimate the serialized size of a captured error without a
/// serialization round-trip: its string fields, tag scalars, and the aux
/// value graph, under the same cost model and early exit.
pub fn estimate_error_size(error: &CapturedError, budget: usize) -> usize {
    let mut bytes = utf16_cost(&error.message);
    if let Some(name) = &error.name {
        bytes += utf16_cost(name);
    }
    if let Some(stack) = &error.stack {
        bytes += utf16_cost(stack);
    }

    for tag in error.tags.values() {
        if bytes >= budget {
            return bytes;
        }
        bytes += tag_cost(tag);
    }

    for value in error.aux.values() {
        if bytes >= budget {
            break;
        }
        bytes += estimate_size(value, budget - bytes);
    }

    bytes
}

/// Whether a captured error's estimate is strictly under `budget`.
pub fn error_within_budget(error: &CapturedError, budget: usize) -> bool {
    estimate_error_size(error, budget) < budget
}

fn utf16_cost(s: &str) -> usize {
    s.encode_utf16().count() * 2
}

fn tag_cost(tag: &TagValue) -> usize {
    match tag {
        TagValue::Str(s) => utf16_cost(s),
        TagValue::Int(_) => 8,
        TagValue::Float(_) => 8,
        TagValue::Bool(_) => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_costs_match_the_model() {
        assert_eq!(estimate_size(&json!(true), usize::MAX), 4);
        assert_eq!(estimate_size(&json!(42), usize::MAX), 8);
        assert_eq!(estimate_size(&json!(1.5), usize::MAX), 8);
        assert_eq!(estimate_size(&json!("abcd"), usize::MAX), 8);
        assert_eq!(estimate_size(&json!(null), usize::MAX), 0);
    }

    #[test]
    fn empty_object_estimates_to_zero() {
        assert_eq!(estimate_size(&json!({}), usize::MAX), 0);
        assert_eq!(estimate_size(&json!([]), usize::MAX), 0);
    }

    #[test]
    fn containers_are_free_but_contents_are_not() {
        let value = json!({"a": {"b": ["xy", 1, true]}});
        // "xy" = 4, number = 8, bool = 4
        assert_eq!(estimate_size(&value, usize::MAX), 16);
    }

    #[test]
    fn non_bmp_strings_count_surrogate_pairs() {
        // One astral-plane character is two UTF-16 code units.
        assert_eq!(estimate_size(&json!("\u{1F600}"), usize::MAX), 4);
    }

    #[test]
    fn budget_boundary_is_strict() {
        let value = json!("abcd"); // estimates to exactly 8
        assert!(!is_within_budget(&value, 8));
        assert!(is_within_budget(&value, 9));
        assert!(!is_within_budget(&value, 7));
    }

    #[test]
    fn walk_short_circuits_at_the_budget() {
        let big: Vec<Value> = (0..10_000).map(|_| json!("0123456789")).collect();
        let value = Value::Array(big);

        let estimate = estimate_size(&value, 100);
        assert!(estimate >= 100);
        // Early exit: nowhere near the full 200_000-byte traversal.
        assert!(estimate < 200);
    }

    #[test]
    fn error_estimate_covers_all_fields() {
        let error = CapturedError::named("Name", "msg")
            .stack("stack")
            .tag("t", true)
            .aux_entry("data", json!([1, 2]));

        // name 8 + message 6 + stack 10 + bool tag 4 + two numbers 16
        assert_eq!(estimate_error_size(&error, usize::MAX), 44);
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let mut value = json!("x");
        for _ in 0..10_000 {
            value = Value::Array(vec![value]);
        }
        assert_eq!(estimate_size(&value, usize::MAX), 2);
    }
}
