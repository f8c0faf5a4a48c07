// ── Filter and sorter descriptors ──
//
// Declarative descriptors that shape the projected view returned by
// `DataStore::get_records()`. Both serialize to the conventional
// `{property, operator, value}` / `{property, direction}` shapes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use super::record::Fields;
use super::value::{compare, sort_cmp, strict_eq_opt, to_display_string};

// ── Filter ──────────────────────────────────────────────────────────

/// Comparison applied by a [`Filter`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FilterOperator {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive substring match after string coercion.
    Like,
    /// Membership in an array filter value.
    In,
}

/// A single predicate on one record property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub property: String,
    #[serde(default)]
    pub operator: FilterOperator,
    pub value: Value,
}

impl Filter {
    pub fn new(property: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            operator,
            value: value.into(),
        }
    }

    /// Equality filter (the default operator).
    pub fn equals(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, FilterOperator::Eq, value)
    }

    /// Whether `fields` satisfies this filter.
    pub fn matches(&self, fields: &Fields) -> bool {
        let actual = fields.get(&self.property);
        let expected = &self.value;
        match self.operator {
            FilterOperator::Eq => strict_eq_opt(actual, Some(expected)),
            FilterOperator::Ne => !strict_eq_opt(actual, Some(expected)),
            FilterOperator::Gt => compare(actual, Some(expected)) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                compare(actual, Some(expected)),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => compare(actual, Some(expected)) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                compare(actual, Some(expected)),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => {
                let haystack = to_display_string(actual).to_lowercase();
                let needle = to_display_string(Some(expected)).to_lowercase();
                haystack.contains(&needle)
            }
            FilterOperator::In => match expected {
                Value::Array(members) => members
                    .iter()
                    .any(|member| strict_eq_opt(actual, Some(member))),
                _ => false,
            },
        }
    }
}

// ── Sorter ──────────────────────────────────────────────────────────

/// Sort direction. Serialized as `"ASC"` / `"DESC"`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One key of a multi-key sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorter {
    pub property: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sorter {
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new(property, SortDirection::Desc)
    }

    /// Compare two records on this key alone, using [`sort_cmp`].
    /// Records missing the property sort last in either direction.
    pub fn compare(&self, a: &Fields, b: &Fields) -> Ordering {
        match (a.get(&self.property), b.get(&self.property)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => match self.direction {
                SortDirection::Asc => sort_cmp(x, y),
                SortDirection::Desc => sort_cmp(x, y).reverse(),
            },
        }
    }
}

/// Multi-key comparator: the first sorter that does not tie decides.
pub fn compare_records(sorters: &[Sorter], a: &Fields, b: &Fields) -> Ordering {
    sorters
        .iter()
        .map(|sorter| sorter.compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
