//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Records are
//! schemaless, so tables are assembled column by column with
//! `tabled::builder::Builder`; structured formats use serde, plain emits
//! one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use strata_core::Record;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render records in the chosen format.
///
/// - `table`: one row per record; `columns` selects and orders the
///   columns, otherwise every key is shown in order of first appearance
/// - `json` / `json-compact` / `yaml`: the records' fields via serde
/// - `plain`: the `id_field` value of each record, one per line
pub fn render_records(
    format: OutputFormat,
    records: &[Record],
    columns: &[String],
    id_field: &str,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_table(records, columns)),
        OutputFormat::Json => render_json(records, false),
        OutputFormat::JsonCompact => render_json(records, true),
        OutputFormat::Yaml => render_yaml(records),
        OutputFormat::Plain => Ok(records
            .iter()
            .map(|r| cell(r.fields().get(id_field)))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Render a single serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are not
/// tabular.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

/// Display form of a field: strings bare, missing empty, the rest as JSON.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn render_table(records: &[Record], columns: &[String]) -> String {
    let snapshots: Vec<_> = records.iter().map(Record::fields).collect();

    let headers: Vec<String> = if columns.is_empty() {
        let mut seen = Vec::new();
        for fields in &snapshots {
            for key in fields.keys() {
                if !seen.contains(key) {
                    seen.push(key.clone());
                }
            }
        }
        seen
    } else {
        columns.to_vec()
    };

    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_uppercase()));
    for fields in &snapshots {
        builder.push_record(headers.iter().map(|h| cell(fields.get(h))));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Key/value listing for one record.
pub fn render_detail(record: &Record) -> String {
    let fields = record.fields();
    let width = fields.keys().map(String::len).max().unwrap_or(0);
    fields
        .iter()
        .map(|(key, value)| format!("{key:<width$}  {}", cell(Some(value))))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indented text tree of nested nodes.
pub fn render_tree(
    nodes: &[Value],
    children_field: &str,
    label_field: &str,
    id_field: &str,
    color: bool,
) -> String {
    let mut lines = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        push_tree_lines(
            &mut lines,
            node,
            "",
            i + 1 == nodes.len(),
            true,
            &TreeFields {
                children: children_field,
                label: label_field,
                id: id_field,
                color,
            },
        );
    }
    lines.join("\n")
}

struct TreeFields<'a> {
    children: &'a str,
    label: &'a str,
    id: &'a str,
    color: bool,
}

fn push_tree_lines(
    lines: &mut Vec<String>,
    node: &Value,
    prefix: &str,
    last: bool,
    top: bool,
    fields: &TreeFields<'_>,
) {
    let id = cell(node.get(fields.id));
    let label = node.get(fields.label).map(|v| cell(Some(v)));
    let text = match (label, fields.color) {
        (Some(label), true) => format!("{} {}", label, format!("({id})").dimmed()),
        (Some(label), false) => format!("{label} ({id})"),
        (None, true) => id.bold().to_string(),
        (None, false) => id,
    };

    let (branch, next_prefix) = if top {
        (String::new(), String::new())
    } else if last {
        (format!("{prefix}└── "), format!("{prefix}    "))
    } else {
        (format!("{prefix}├── "), format!("{prefix}│   "))
    };
    lines.push(format!("{branch}{text}"));

    let children = node
        .get(fields.children)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (i, child) in children.iter().enumerate() {
        push_tree_lines(
            lines,
            child,
            &next_prefix,
            i + 1 == children.len(),
            false,
            fields,
        );
    }
}

/// Pretty-printed or compact JSON.
pub(crate) fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

/// YAML output.
pub(crate) fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
