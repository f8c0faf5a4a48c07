// ── Dynamic value semantics ──
//
// Equality, ordering, and string coercion over `serde_json::Value`.
// A missing field is `None` and is distinct from an explicit `null`.

use std::cmp::Ordering;

use serde_json::Value;

/// Strict equality: no type coercion, but numbers compare by numeric value
/// (`1` equals `1.0`). Arrays and objects compare structurally.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Strict equality over possibly-missing values. Two missing values are equal;
/// a missing value never equals `null`.
pub fn strict_eq_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => strict_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Relational comparison. Two strings compare lexicographically; any other
/// pair is compared numerically after coercion. `None` means incomparable,
/// in which case every relational test is false.
pub fn compare(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    if let (Some(Value::String(x)), Some(Value::String(y))) = (a, b) {
        return Some(x.cmp(y));
    }
    let x = to_number(a)?;
    let y = to_number(b)?;
    x.partial_cmp(&y)
}

/// Total order used by sorters.
///
/// Values rank by class first: null, booleans and numbers (compared as
/// numbers, null as 0), then strings (lexicographic), then arrays and
/// objects (by their JSON text). Unlike [`compare`], every pair is ordered
/// and the order is transitive, so it is safe to hand to `sort_by`.
pub fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Array(_) | Value::Object(_) => 2,
        }
    }

    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_) | Value::Object(_), _) => a.to_string().cmp(&b.to_string()),
        _ => {
            let x = to_number(Some(a)).unwrap_or_default();
            let y = to_number(Some(b)).unwrap_or_default();
            x.total_cmp(&y)
        }
    })
}

/// Numeric coercion. Missing values, arrays, objects and unparseable strings
/// have no numeric value.
pub fn to_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().ok()?
            }
        }
        Value::Array(_) | Value::Object(_) => return None,
    };
    (!n.is_nan()).then_some(n)
}

/// String coercion used by the `like` operator.
pub fn to_display_string(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return "undefined".into();
    };
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_u64().map(|u| u.to_string()))
            .or_else(|| n.as_f64().map(|f| f.to_string()))
            .unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display_string(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".into(),
    }
}

/// Hashable key for an id value, consistent with [`strict_eq`] for scalars.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct IdKey(String);

impl IdKey {
    pub(crate) fn of(value: &Value) -> Self {
        let key = match value {
            Value::Null => "z:null".to_owned(),
            Value::Bool(b) => format!("b:{b}"),
            Value::Number(n) => match n.as_f64() {
                Some(f) => format!("n:{f}"),
                None => format!("n:{n}"),
            },
            Value::String(s) => format!("s:{s}"),
            other => format!("j:{other}"),
        };
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_by_value() {
        assert!(strict_eq(&json!(1), &json!(1.0)));
        assert!(!strict_eq(&json!(1), &json!("1")));
        assert!(!strict_eq(&json!(null), &json!(0)));
    }

    #[test]
    fn missing_is_not_null() {
        assert!(!strict_eq_opt(None, Some(&Value::Null)));
        assert!(strict_eq_opt(None, None));
    }

    #[test]
    fn strings_order_lexicographically() {
        assert_eq!(
            compare(Some(&json!("apple")), Some(&json!("banana"))),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(Some(&json!("10")), Some(&json!("9"))),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn mixed_pairs_coerce_to_numbers() {
        assert_eq!(
            compare(Some(&json!("10")), Some(&json!(9))),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare(Some(&json!(null)), Some(&json!(1))),
            Some(Ordering::Less)
        );
        assert_eq!(compare(Some(&json!("abc")), Some(&json!(1))), None);
        assert_eq!(compare(None, Some(&json!(1))), None);
    }

    #[test]
    fn sort_order_ranks_by_class() {
        let mut values = vec![
            json!("10"),
            json!([1]),
            json!(9.5),
            json!("9"),
            json!(null),
            json!("abc"),
            json!(true),
            json!({"a": 1}),
            json!(-2),
        ];
        values.sort_by(sort_cmp);
        assert_eq!(
            values,
            vec![
                json!(-2),
                json!(null),
                json!(true),
                json!(9.5),
                json!("10"),
                json!("9"),
                json!("abc"),
                json!([1]),
                json!({"a": 1}),
            ]
        );
    }

    #[test]
    fn sort_order_is_transitive_on_mixed_values() {
        let values = [
            json!("10"),
            json!("9"),
            json!(9.5),
            json!(10),
            json!("abc"),
            json!(null),
            json!(false),
            json!([2, 1]),
        ];
        for a in &values {
            assert_eq!(sort_cmp(a, a), Ordering::Equal);
            for b in &values {
                assert_eq!(sort_cmp(a, b), sort_cmp(b, a).reverse());
                for c in &values {
                    if sort_cmp(a, b).is_le() && sort_cmp(b, c).is_le() {
                        assert!(sort_cmp(a, c).is_le(), "{a} <= {b} <= {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn display_string_mirrors_loose_coercion() {
        assert_eq!(to_display_string(Some(&json!(1.0))), "1");
        assert_eq!(to_display_string(Some(&json!(2.5))), "2.5");
        assert_eq!(to_display_string(Some(&json!(null))), "null");
        assert_eq!(to_display_string(Some(&json!([1, null, "a"]))), "1,,a");
        assert_eq!(to_display_string(Some(&json!({"a": 1}))), "[object Object]");
        assert_eq!(to_display_string(None), "undefined");
    }

    #[test]
    fn id_keys_agree_with_strict_eq_for_scalars() {
        assert_eq!(IdKey::of(&json!(3)), IdKey::of(&json!(3.0)));
        assert_ne!(IdKey::of(&json!(3)), IdKey::of(&json!("3")));
    }
}
