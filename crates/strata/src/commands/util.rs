//! Shared helpers for command handlers: argument parsing and id lookup.

use serde_json::Value;

use strata_core::{DataStore, Filter, FilterOperator, SortDirection, Sorter};

use crate::error::CliError;

/// Parse a command-line value as JSON when possible, else as a string.
///
/// `30` becomes a number, `true` a boolean, `[1,2]` an array; `Oslo`
/// stays the string `"Oslo"`.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Parse `property:operator:value` or `property:value` (equality).
///
/// For `in`, a value that is not a JSON array is split on commas.
pub fn parse_filter(raw: &str) -> Result<Filter, CliError> {
    let invalid = |reason: String| CliError::Validation {
        field: "filter".into(),
        reason,
    };

    let mut parts = raw.splitn(3, ':');
    let property = parts.next().unwrap_or_default();
    if property.is_empty() {
        return Err(invalid(format!("missing property in '{raw}'")));
    }
    let (operator, value) = match (parts.next(), parts.next()) {
        (Some(op), Some(value)) => {
            let operator: FilterOperator = op
                .parse()
                .map_err(|_| invalid(format!("unknown operator '{op}' in '{raw}'")))?;
            (operator, value)
        }
        (Some(value), None) => (FilterOperator::Eq, value),
        _ => return Err(invalid(format!("expected property:operator:value, got '{raw}'"))),
    };

    let value = match (operator, parse_value(value)) {
        (FilterOperator::In, array @ Value::Array(_)) => array,
        (FilterOperator::In, _) => Value::Array(value.split(',').map(parse_value).collect()),
        (_, parsed) => parsed,
    };
    Ok(Filter::new(property, operator, value))
}

/// Parse `property` or `property:asc|desc`.
pub fn parse_sorter(raw: &str) -> Result<Sorter, CliError> {
    let (property, direction) = match raw.split_once(':') {
        Some((property, dir)) => {
            let direction: SortDirection = dir.parse().map_err(|_| CliError::Validation {
                field: "sort".into(),
                reason: format!("expected asc or desc, got '{dir}'"),
            })?;
            (property, direction)
        }
        None => (raw, SortDirection::Asc),
    };
    if property.is_empty() {
        return Err(CliError::Validation {
            field: "sort".into(),
            reason: format!("missing property in '{raw}'"),
        });
    }
    Ok(Sorter::new(property, direction))
}

pub fn parse_filters(raw: &[String]) -> Result<Vec<Filter>, CliError> {
    raw.iter().map(|f| parse_filter(f)).collect()
}

pub fn parse_sorters(raw: &[String]) -> Result<Vec<Sorter>, CliError> {
    raw.iter().map(|s| parse_sorter(s)).collect()
}

/// Apply parsed `--filter` / `--sort` arguments to the store.
pub fn apply_query(store: &DataStore, filters: &[String], sorters: &[String]) -> Result<(), CliError> {
    let filters = parse_filters(filters)?;
    let sorters = parse_sorters(sorters)?;
    if !filters.is_empty() {
        store.filter(filters, true);
    }
    if !sorters.is_empty() {
        store.sort(sorters);
    }
    Ok(())
}

/// Resolve a command-line id to the stored id value.
///
/// `"7"` matches a numeric id 7 or a string id "7", whichever exists.
pub fn resolve_id(store: &DataStore, raw: &str) -> Result<Value, CliError> {
    let parsed = parse_value(raw);
    let candidates = [parsed, Value::String(raw.to_owned())];
    candidates
        .into_iter()
        .find(|id| store.get_by_id(id).is_some())
        .ok_or_else(|| CliError::NotFound {
            identifier: raw.into(),
        })
}
