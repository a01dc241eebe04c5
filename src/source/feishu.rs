//! Decoding of Feishu Bitable open-API payloads.
//!
//! Accepted shapes, for both fields and records:
//! - the API envelope `{"code":0,"msg":"ok","data":{"items":[...]}}`
//! - the inner `{"items":[...]}`
//! - a bare list, either in API form or already converted

use super::{SourceError, TableSource};
use crate::model::{CellValue, Field, FieldType, Row};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ApiField {
    field_id: String,
    field_name: String,
    #[serde(rename = "type")]
    typ: i64,
}

/// Map a numeric Feishu field type onto the value types the tree knows.
pub fn convert_field_type(typ: i64) -> FieldType {
    match typ {
        2 | 1001 | 1002 | 1003 => FieldType::Number, // number, progress, currency, rating
        3 | 4 => FieldType::Select,                  // single / multi select
        5 | 20 | 21 => FieldType::Date,              // date, created / modified time
        _ => FieldType::Text,
    }
}

/// Strip the envelope and return the item list.
fn items(payload: &str) -> Result<Vec<Value>, SourceError> {
    let mut value: Value = serde_json::from_str(payload)?;

    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        if code != 0 {
            let msg = value
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(SourceError::Api { code, msg });
        }
    }
    if let Some(data) = value.get_mut("data") {
        value = data.take();
    }
    if let Some(inner) = value.get_mut("items") {
        value = inner.take();
    }

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(SourceError::Shape("expected a list of items")),
    }
}

pub fn parse_fields(payload: &str) -> Result<Vec<Field>, SourceError> {
    items(payload)?
        .into_iter()
        .map(|item| {
            if item.get("field_id").is_some() {
                let api: ApiField = serde_json::from_value(item)?;
                Ok(Field::new(api.field_id, api.field_name, convert_field_type(api.typ)))
            } else {
                Ok(serde_json::from_value(item)?)
            }
        })
        .collect()
}

/// Decode records into rows keyed by field id.
///
/// Cells keyed by field name are re-keyed to the field's id. Numeric cells of
/// date fields are millisecond timestamps and become dates.
pub fn parse_records(payload: &str, fields: &[Field]) -> Result<Vec<Row>, SourceError> {
    items(payload)?
        .into_iter()
        .map(|item| {
            let Value::Object(mut record) = item else {
                return Err(SourceError::Shape("expected record objects"));
            };
            let cells = match record.remove("fields") {
                Some(Value::Object(cells)) => cells,
                Some(_) => return Err(SourceError::Shape("record fields must be an object")),
                None => record,
            };
            Ok(cells
                .into_iter()
                .map(|(key, value)| convert_cell(key, value, fields))
                .collect())
        })
        .collect()
}

fn convert_cell(key: String, value: Value, fields: &[Field]) -> (String, CellValue) {
    let field = fields
        .iter()
        .find(|f| f.id == key)
        .or_else(|| fields.iter().find(|f| f.name == key));

    let Some(field) = field else {
        return (key, CellValue::from(value));
    };

    let timestamp = (field.value_type == FieldType::Date)
        .then(|| value.as_i64())
        .flatten()
        .and_then(DateTime::<Utc>::from_timestamp_millis);
    let cell = match timestamp {
        Some(dt) => CellValue::Date(dt.date_naive()),
        None => CellValue::from(value),
    };
    (field.id.clone(), cell)
}

/// Table backed by raw payload text, e.g. responses fetched by the page or
/// files exported from the open API.
pub struct FeishuSource {
    fields_payload: String,
    records_payload: String,
    fields: Vec<Field>,
}

impl FeishuSource {
    pub fn new(fields_payload: impl Into<String>, records_payload: impl Into<String>) -> Self {
        Self {
            fields_payload: fields_payload.into(),
            records_payload: records_payload.into(),
            fields: Vec::new(),
        }
    }
}

impl TableSource for FeishuSource {
    fn fields(&mut self) -> Result<Vec<Field>, SourceError> {
        self.fields = parse_fields(&self.fields_payload)?;
        Ok(self.fields.clone())
    }

    fn rows(&mut self) -> Result<Vec<Row>, SourceError> {
        parse_records(&self.records_payload, &self.fields)
    }
}
