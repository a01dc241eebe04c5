//! Table data sources: the host SDK, Feishu open-API payloads, and the
//! built-in demo table used when the SDK never shows up.

mod feishu;
mod mock;
mod probe;

pub use feishu::{convert_field_type, parse_fields, parse_records, FeishuSource};
pub use mock::MockSource;
pub use probe::{wait_blocking, Probe, ProbePolicy, ProbeStep};

use crate::model::{Field, Row};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Host SDK unavailable")]
    SdkUnavailable,
    #[error("API error {code}: {msg}")]
    Api { code: i64, msg: String },
    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Unexpected payload shape: {0}")]
    Shape(&'static str),
    #[error("{0}")]
    Other(String),
}

/// Supplies the field catalog and the fully materialized rows.
pub trait TableSource {
    fn fields(&mut self) -> Result<Vec<Field>, SourceError>;
    fn rows(&mut self) -> Result<Vec<Row>, SourceError>;
}

/// A completed fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedTable {
    pub fields: Vec<Field>,
    pub rows: Vec<Row>,
}

/// Fetch fields, then rows. A field failure aborts the load.
pub fn load(source: &mut dyn TableSource) -> Result<LoadedTable, SourceError> {
    let fields = source.fields().inspect_err(|e| warn!(error = %e, "field fetch failed"))?;
    let rows = source.rows().inspect_err(|e| warn!(error = %e, "row fetch failed"))?;
    debug!(fields = fields.len(), rows = rows.len(), "table loaded");
    Ok(LoadedTable { fields, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing {
        rows_called: bool,
    }

    impl TableSource for Failing {
        fn fields(&mut self) -> Result<Vec<Field>, SourceError> {
            Err(SourceError::SdkUnavailable)
        }

        fn rows(&mut self) -> Result<Vec<Row>, SourceError> {
            self.rows_called = true;
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_field_failure_aborts() {
        let mut source = Failing { rows_called: false };
        assert!(matches!(load(&mut source), Err(SourceError::SdkUnavailable)));
        assert!(!source.rows_called);
    }

    #[test]
    fn test_load_mock() {
        let table = load(&mut MockSource::default()).unwrap();
        assert_eq!(table.fields.len(), 7);
        assert_eq!(table.rows.len(), 5);
    }
}
