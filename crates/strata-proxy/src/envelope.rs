// Payload decoding shared by every proxy.
//
// Sources may answer with a bare array of objects or with an envelope
// `{ "data": [...] }`. Anything else is a decode error.

use serde::Deserialize;
use serde_json::Value;
use strata_core::Record;

use crate::error::{Error, preview};

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Bare(Vec<Value>),
    Envelope { data: Vec<Value> },
}

/// Decode a response or file body into fresh records.
pub(crate) fn decode_records(body: &str) -> Result<Vec<Record>, Error> {
    let payload: Payload = serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!(
            "expected a JSON array or {{\"data\": [...]}} envelope: {e} (body preview: {:?})",
            preview(body, 200)
        ),
        body: body.to_owned(),
    })?;

    let items = match payload {
        Payload::Bare(items) | Payload::Envelope { data: items } => items,
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Record::new(fields)),
            other => Err(Error::Deserialization {
                message: format!("item {index} is not an object: {}", kind(&other)),
                body: body.to_owned(),
            }),
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
