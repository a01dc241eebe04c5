pub mod config;
pub mod format;
pub mod hierarchy;
pub mod html;
pub mod measure;
pub mod model;
pub mod presenter;
pub mod selection;
pub mod source;
pub mod style;
pub mod text;
pub mod workspace;

use wasm_bindgen::prelude::*;

use config::ViewConfig;
use source::{load, FeishuSource, MockSource, Probe, ProbePolicy, ProbeStep, SourceError};
use workspace::{LoadOutcome, LoadToken, Workspace};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render a single value through a format template to HTML
#[wasm_bindgen(js_name = "renderTemplate")]
pub fn render_template(template: &str, value: &str, field_names: Option<js_sys::Array>) -> String {
    let names = field_names.map(|a| strings(&a)).unwrap_or_default();
    format::render_html(Some(template), value, &names)
}

/// Plugin state exposed to the page.
///
/// Everything crosses the boundary as JSON strings or plain strings; the
/// page owns fetching and DOM updates.
#[wasm_bindgen]
pub struct Plugin {
    workspace: Workspace,
    probe: Probe,
}

#[wasm_bindgen]
impl Plugin {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Plugin, JsValue> {
        let workspace = match config_json.as_deref() {
            Some(json) => Workspace::with_config(&ViewConfig::from_json(json).map_err(js_error)?),
            None => Workspace::new(),
        };
        Ok(Plugin {
            workspace,
            probe: Probe::new(ProbePolicy::default()),
        })
    }

    /// Report whether the host SDK is present. Returns
    /// `{"step":"ready"}`, `{"step":"retry","delayMs":500}` or
    /// `{"step":"fallback"}`. The demo table is loaded once, when the probe
    /// first falls back; later polls only repeat the answer.
    #[wasm_bindgen(js_name = "pollSdk")]
    pub fn poll_sdk(&mut self, available: bool) -> String {
        let pending = self.probe.finished().is_none();
        let step = self.probe.poll(available);
        if pending && step == ProbeStep::Fallback {
            self.load_mock();
        }
        match step {
            ProbeStep::Ready => r#"{"step":"ready"}"#.to_string(),
            ProbeStep::Retry(delay) => {
                format!(r#"{{"step":"retry","delayMs":{}}}"#, delay.as_millis())
            }
            ProbeStep::Fallback => r#"{"step":"fallback"}"#.to_string(),
        }
    }

    /// Start a fetch; pass the returned token to `finishLoad`.
    #[wasm_bindgen(js_name = "beginLoad")]
    pub fn begin_load(&mut self) -> u64 {
        self.workspace.begin_load().value()
    }

    /// Apply fetched field and record payloads. Returns `applied`, `stale`
    /// or `failed`.
    #[wasm_bindgen(js_name = "finishLoad")]
    pub fn finish_load(&mut self, token: u64, fields_json: &str, records_json: &str) -> String {
        let result = load(&mut FeishuSource::new(fields_json, records_json));
        outcome_name(self.workspace.finish_load(LoadToken::from_value(token), result))
    }

    /// Record a fetch that failed on the page side.
    #[wasm_bindgen(js_name = "failLoad")]
    pub fn fail_load(&mut self, token: u64, message: &str) -> String {
        let result = Err(SourceError::Other(message.to_string()));
        outcome_name(self.workspace.finish_load(LoadToken::from_value(token), result))
    }

    #[wasm_bindgen(js_name = "loadMock")]
    pub fn load_mock(&mut self) {
        let token = self.workspace.begin_load();
        let result = load(&mut MockSource);
        self.workspace.finish_load(token, result);
    }

    #[wasm_bindgen(js_name = "isLoading")]
    pub fn is_loading(&self) -> bool {
        self.workspace.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.workspace.error().map(str::to_string)
    }

    #[wasm_bindgen(js_name = "fieldsJson")]
    pub fn fields_json(&self) -> String {
        to_json(self.workspace.fields())
    }

    #[wasm_bindgen(js_name = "dimensionsJson")]
    pub fn dimensions_json(&self) -> String {
        to_json(&self.workspace.selection().ordered())
    }

    /// Returns whether the field is selected afterwards.
    #[wasm_bindgen(js_name = "toggleField")]
    pub fn toggle_field(&mut self, field_id: &str) -> bool {
        self.workspace.toggle_field(field_id);
        self.workspace.selection().is_selected(field_id)
    }

    #[wasm_bindgen(js_name = "reorderLowDimensions")]
    pub fn reorder_low_dimensions(&mut self, order: js_sys::Array) -> bool {
        self.workspace.reorder_low_dimensions(&strings(&order))
    }

    #[wasm_bindgen(js_name = "setFormat")]
    pub fn set_format(&mut self, field_id: &str, template: Option<String>) -> bool {
        self.workspace.set_format(field_id, template)
    }

    #[wasm_bindgen(js_name = "applyDefaultFormats")]
    pub fn apply_default_formats(&mut self) {
        self.workspace.apply_default_formats();
    }

    #[wasm_bindgen(js_name = "toggleNode")]
    pub fn toggle_node(&mut self, path: js_sys::Array) -> bool {
        self.workspace.toggle_node(&strings(&path))
    }

    #[wasm_bindgen(js_name = "expandAll")]
    pub fn expand_all(&mut self) {
        self.workspace.expand_all();
    }

    #[wasm_bindgen(js_name = "collapseAll")]
    pub fn collapse_all(&mut self) {
        self.workspace.collapse_all();
    }

    #[wasm_bindgen(js_name = "treeJson")]
    pub fn tree_json(&self) -> String {
        to_json(&self.workspace.tree())
    }

    #[wasm_bindgen(js_name = "visibleJson")]
    pub fn visible_json(&self) -> String {
        let tree = self.workspace.tree();
        to_json(&self.workspace.visible(&tree))
    }

    #[wasm_bindgen(js_name = "renderHtml")]
    pub fn render_html(&self) -> String {
        self.workspace.render_html()
    }

    #[wasm_bindgen(js_name = "exportConfig")]
    pub fn export_config(&self) -> String {
        self.workspace.config().to_json()
    }

    #[wasm_bindgen(js_name = "importConfig")]
    pub fn import_config(&mut self, json: &str) -> Result<(), JsValue> {
        let config = ViewConfig::from_json(json).map_err(js_error)?;
        self.workspace.apply_config(&config);
        Ok(())
    }
}

fn strings(array: &js_sys::Array) -> Vec<String> {
    array.iter().filter_map(|v| v.as_string()).collect()
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn outcome_name(outcome: LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Applied => "applied",
        LoadOutcome::Stale => "stale",
        LoadOutcome::Failed => "failed",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &str = r#"[{"id":"country","name":"国家","type":"text"}]"#;
    const RECORDS: &str = r#"[{"country":"美国"},{"country":"加拿大"}]"#;

    fn plugin() -> Plugin {
        Plugin {
            workspace: Workspace::new(),
            probe: Probe::new(ProbePolicy::default()),
        }
    }

    #[test]
    fn test_fallback_loads_demo_table_once() {
        let mut p = plugin();
        for _ in 0..9 {
            assert!(p.poll_sdk(false).contains("retry"));
        }
        assert_eq!(p.poll_sdk(false), r#"{"step":"fallback"}"#);
        assert_eq!(p.workspace.rows().len(), 5);

        let token = p.begin_load();
        assert_eq!(p.poll_sdk(false), r#"{"step":"fallback"}"#);
        assert!(p.is_loading());
        assert_eq!(p.finish_load(token, FIELDS, RECORDS), "applied");
        assert_eq!(p.workspace.rows().len(), 2);
    }

    #[test]
    fn test_ready_does_not_load() {
        let mut p = plugin();
        assert_eq!(p.poll_sdk(true), r#"{"step":"ready"}"#);
        assert!(p.workspace.rows().is_empty());
    }

    #[test]
    fn test_stale_and_failed_loads() {
        let mut p = plugin();
        let first = p.begin_load();
        let second = p.begin_load();
        assert_eq!(p.finish_load(first, FIELDS, RECORDS), "stale");
        assert_eq!(p.fail_load(second, "timeout"), "failed");
        assert_eq!(p.error().as_deref(), Some("timeout"));
    }
}
