use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Select,
}

/// A selectable column of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", alias = "valueType", default)]
    pub value_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

impl Field {
    pub fn new(id: impl Into<String>, name: impl Into<String>, value_type: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value_type,
            required: false,
        }
    }
}

/// A single cell. Displays the way the host page stringifies it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
    List(Vec<CellValue>),
}

impl CellValue {
    /// Absent, null and empty-text cells group under the placeholder key.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::List(items) => items.iter().all(CellValue::is_blank),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write_number(f, *n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Text(s) => f.write_str(s),
            CellValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// Number formatting of JavaScript's `String(n)`: plain decimals for
/// magnitudes in `[1e-6, 1e21)`, exponent form (`1e+21`, `1.5e-7`) outside.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n == 0.0 {
        return f.write_str("0");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    let magnitude = n.abs();
    if n.is_nan() || (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{}", n);
    }
    let exp = format!("{:e}", n);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => write!(f, "{}e+{}", mantissa, power),
        _ => f.write_str(&exp),
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(b),
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Null),
            Value::String(s) => CellValue::Text(s),
            Value::Array(items) => CellValue::List(items.into_iter().map(CellValue::from).collect()),
            // Rich cells (users, links, options) carry their label in one of these keys
            Value::Object(map) => ["text", "name", "value"]
                .iter()
                .find_map(|key| map.get(*key).cloned())
                .map(CellValue::from)
                .unwrap_or(CellValue::Null),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(CellValue::from)
    }
}

/// One record, keyed by field id.
pub type Row = BTreeMap<String, CellValue>;

/// Build a row from `(field id, value)` pairs.
pub fn row<K, V, I>(cells: I) -> Row
where
    K: Into<String>,
    V: Into<CellValue>,
    I: IntoIterator<Item = (K, V)>,
{
    cells.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// A configured grouping key.
///
/// Level 0 is the single top dimension; every other dimension sits on
/// level 1 and is sequenced by `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub field_id: String,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(
        default,
        alias = "markdownFormat",
        skip_serializing_if = "Option::is_none"
    )]
    pub format_template: Option<String>,
}

impl Dimension {
    pub fn top(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            level: 0,
            order: Some(0),
            format_template: None,
        }
    }

    pub fn low(field_id: impl Into<String>, order: u32) -> Self {
        Self {
            field_id: field_id.into(),
            level: 1,
            order: Some(order),
            format_template: None,
        }
    }

    pub fn is_top(&self) -> bool {
        self.level == 0
    }

    /// Sort key: level first, then order within the level.
    pub fn rank(&self) -> (u32, u32) {
        (self.level, self.order.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_display_matches_js() {
        assert_eq!(CellValue::Number(1000000.0).to_string(), "1000000");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Number(0.0).to_string(), "0");
        assert_eq!(CellValue::Number(-0.0).to_string(), "0");
        assert_eq!(CellValue::Number(-12.25).to_string(), "-12.25");
    }

    #[test]
    fn test_number_exponent_range_matches_js() {
        assert_eq!(CellValue::Number(1e21).to_string(), "1e+21");
        assert_eq!(CellValue::Number(-2.5e22).to_string(), "-2.5e+22");
        assert_eq!(CellValue::Number(1.5e-8).to_string(), "1.5e-8");
        assert_eq!(CellValue::Number(1e-7).to_string(), "1e-7");
        assert_eq!(CellValue::Number(1e-6).to_string(), "0.000001");
        assert_eq!(CellValue::Number(123456789012345680000.0).to_string(), "123456789012345680000");
        assert_eq!(CellValue::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(CellValue::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_list_display() {
        let v = CellValue::List(vec!["a".into(), "b".into()]);
        assert_eq!(v.to_string(), "a,b");
    }

    #[test]
    fn test_blank_values() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::Text(String::new()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(!CellValue::Bool(false).is_blank());
    }

    #[test]
    fn test_cell_from_rich_object() {
        let v: CellValue = serde_json::from_str(r#"{"id":"ou_1","name":"张三"}"#).unwrap();
        assert_eq!(v, CellValue::Text("张三".into()));

        let v: CellValue = serde_json::from_str(r#"[{"text":"a"},{"text":"b"}]"#).unwrap();
        assert_eq!(v.to_string(), "a,b");
    }

    #[test]
    fn test_field_json_uses_type_key() {
        let f: Field = serde_json::from_str(r#"{"id":"budget","name":"预算","type":"number"}"#).unwrap();
        assert_eq!(f.value_type, FieldType::Number);
        assert!(!f.required);

        let f: Field = serde_json::from_str(r#"{"id":"x","name":"X","valueType":"date"}"#).unwrap();
        assert_eq!(f.value_type, FieldType::Date);
    }

    #[test]
    fn test_dimension_accepts_markdown_format_key() {
        let d: Dimension =
            serde_json::from_str(r#"{"fieldId":"country","level":0,"markdownFormat":"**{value}**"}"#)
                .unwrap();
        assert_eq!(d.format_template.as_deref(), Some("**{value}**"));
        assert_eq!(d.rank(), (0, 0));
    }
}
