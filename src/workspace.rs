//! The single owner of plugin state.
//!
//! UI events call into a [`Workspace`] one at a time. Loads are split into
//! [`Workspace::begin_load`] and [`Workspace::finish_load`] so a fetch can be
//! in flight while the user keeps editing; only the most recently issued
//! token is applied.

use crate::config::ViewConfig;
use crate::hierarchy::{build, BuildOptions, Grouping};
use crate::html::{HtmlRenderer, RenderContext};
use crate::model::{Field, Row};
use crate::presenter::{visible_nodes, Expansion, VisibleNode};
use crate::selection::{Selection, SelectionError, Toggle};
use crate::source::{LoadedTable, SourceError};
use crate::style::StyleConfig;
use crate::text::TextRenderer;
use tracing::{debug, info, warn};

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn from_value(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was started; the result was dropped.
    Stale,
    /// The fetch failed; previous data is kept.
    Failed,
}

#[derive(Debug, Default)]
pub struct Workspace {
    fields: Vec<Field>,
    rows: Vec<Row>,
    selection: Selection,
    expansion: Expansion,
    options: BuildOptions,
    style: StyleConfig,
    latest_token: u64,
    loading: bool,
    error: Option<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &ViewConfig) -> Self {
        Self {
            selection: config.selection(),
            options: config.build_options(),
            style: config.style.clone(),
            ..Self::default()
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn expansion(&self) -> &Expansion {
        &self.expansion
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed load, if it has not been superseded.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn config(&self) -> ViewConfig {
        ViewConfig::capture(&self.selection, &self.options, &self.style)
    }

    /// Replace dimensions, placeholder and style from `config`.
    pub fn apply_config(&mut self, config: &ViewConfig) {
        self.selection = config.selection();
        if !self.fields.is_empty() {
            self.selection.retain_fields(&self.fields);
        }
        self.options = config.build_options();
        self.style = config.style.clone();
        self.refresh_expansion();
    }

    pub fn begin_load(&mut self) -> LoadToken {
        self.latest_token += 1;
        self.loading = true;
        self.error = None;
        debug!(token = self.latest_token, "load started");
        LoadToken(self.latest_token)
    }

    pub fn finish_load(
        &mut self,
        token: LoadToken,
        result: Result<LoadedTable, SourceError>,
    ) -> LoadOutcome {
        if token.0 != self.latest_token {
            debug!(token = token.0, latest = self.latest_token, "stale load dropped");
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(table) => {
                info!(fields = table.fields.len(), rows = table.rows.len(), "table loaded");
                let dropped = self.selection.retain_fields(&table.fields);
                if !dropped.is_empty() {
                    warn!(?dropped, "selected fields no longer in catalog");
                }
                self.fields = table.fields;
                self.rows = table.rows;
                self.refresh_expansion();
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "load failed");
                self.error = Some(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Toggle a field in or out of the dimensions. Unknown fields and a
    /// reached dimension limit are ignored.
    pub fn toggle_field(&mut self, field_id: &str) -> Option<Toggle> {
        if !self.fields.is_empty() && !self.fields.iter().any(|f| f.id == field_id) {
            warn!(field = field_id, "toggle of unknown field ignored");
            return None;
        }
        let toggled = self.ignore_config_error(|s| s.toggle_field(field_id))?;
        self.refresh_expansion();
        Some(toggled)
    }

    /// Returns `false` when `order` did not match the low dimensions.
    pub fn reorder_low_dimensions<S: AsRef<str>>(&mut self, order: &[S]) -> bool {
        let applied = self
            .ignore_config_error(|s| s.reorder_low_dimensions(order))
            .is_some();
        if applied {
            self.refresh_expansion();
        }
        applied
    }

    /// Returns `false` when the field has no active dimension.
    pub fn set_format(&mut self, field_id: &str, template: Option<String>) -> bool {
        self.ignore_config_error(|s| s.set_format(field_id, template))
            .is_some()
    }

    pub fn apply_default_formats(&mut self) {
        self.selection.apply_default_formats();
    }

    pub fn toggle_node(&mut self, path: &[String]) -> bool {
        self.expansion.toggle(path)
    }

    pub fn expand_all(&mut self) {
        let tree = self.tree();
        self.expansion.expand_all(&tree);
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    /// Group the current rows by the current dimensions.
    pub fn tree(&self) -> Grouping {
        build(&self.rows, &self.selection.ordered(), &self.options)
    }

    pub fn visible<'a>(&self, tree: &'a Grouping) -> Vec<VisibleNode<'a>> {
        visible_nodes(tree, &self.expansion)
    }

    pub fn render_html(&self) -> String {
        let tree = self.tree();
        HtmlRenderer::new(self.style.clone()).render(&tree, &self.expansion, &self.context())
    }

    pub fn render_text(&self) -> String {
        let tree = self.tree();
        TextRenderer::default().render(&tree, &self.expansion, &self.context())
    }

    fn context(&self) -> RenderContext<'_> {
        RenderContext::new(&self.fields, &self.selection)
    }

    fn ignore_config_error<T>(
        &mut self,
        op: impl FnOnce(&mut Selection) -> Result<T, SelectionError>,
    ) -> Option<T> {
        match op(&mut self.selection) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "configuration change ignored");
                None
            }
        }
    }

    /// Expanded paths are only meaningful for the current tree shape.
    fn refresh_expansion(&mut self) {
        let tree = self.tree();
        self.expansion.retain_existing(&tree);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{load, MockSource};

    fn loaded() -> Workspace {
        let mut ws = Workspace::new();
        let token = ws.begin_load();
        let table = load(&mut MockSource).unwrap();
        assert_eq!(ws.finish_load(token, Ok(table)), LoadOutcome::Applied);
        ws
    }

    fn keys(tree: &Grouping) -> Vec<&str> {
        tree.nodes().iter().map(|n| n.key.as_str()).collect()
    }

    #[test]
    fn test_load_and_group() {
        let mut ws = loaded();
        assert!(!ws.is_loading());
        assert_eq!(ws.toggle_field("country"), Some(Toggle::Added));
        assert_eq!(ws.toggle_field("region"), Some(Toggle::Added));

        let tree = ws.tree();
        assert_eq!(keys(&tree), vec!["美国", "加拿大"]);
        assert_eq!(tree.nodes()[0].row_count(), 3);
        assert_eq!(tree.row_count(), 5);
    }

    #[test]
    fn test_no_dimensions_is_flat() {
        let ws = loaded();
        assert!(matches!(ws.tree(), Grouping::Flat(rows) if rows.len() == 5));
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let mut ws = Workspace::new();
        let first = ws.begin_load();
        let second = ws.begin_load();

        let stale = LoadedTable {
            fields: vec![Field::new("x", "X", Default::default())],
            rows: Vec::new(),
        };
        assert_eq!(ws.finish_load(first, Ok(stale)), LoadOutcome::Stale);
        assert!(ws.fields().is_empty());
        assert!(ws.is_loading());

        let fresh = load(&mut MockSource).unwrap();
        assert_eq!(ws.finish_load(second, Ok(fresh)), LoadOutcome::Applied);
        assert_eq!(ws.fields().len(), 7);
        assert!(!ws.is_loading());
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let mut ws = loaded();
        ws.toggle_field("country");
        let token = ws.begin_load();
        assert_eq!(
            ws.finish_load(token, Err(SourceError::Other("network down".into()))),
            LoadOutcome::Failed
        );
        assert_eq!(ws.error(), Some("network down"));
        assert_eq!(ws.rows().len(), 5);
        assert!(ws.selection().is_selected("country"));

        ws.begin_load();
        assert_eq!(ws.error(), None);
    }

    #[test]
    fn test_reload_drops_missing_fields() {
        let mut ws = loaded();
        ws.toggle_field("country");
        ws.toggle_field("region");

        let token = ws.begin_load();
        let table = LoadedTable {
            fields: vec![Field::new("region", "地区", Default::default())],
            rows: Vec::new(),
        };
        ws.finish_load(token, Ok(table));
        assert_eq!(ws.selection().top().unwrap().field_id, "region");
    }

    #[test]
    fn test_config_errors_are_noops() {
        let mut ws = loaded();
        assert_eq!(ws.toggle_field("nope"), None);
        assert!(!ws.set_format("country", Some("**{value}**".into())));
        ws.toggle_field("country");
        ws.toggle_field("region");
        assert!(!ws.reorder_low_dimensions(&["country"]));
        assert!(ws.set_format("region", Some("**{value}**".into())));
    }

    #[test]
    fn test_expansion_survives_reorder_only_for_existing_paths() {
        let mut ws = loaded();
        ws.toggle_field("country");
        ws.toggle_field("region");
        ws.toggle_field("manager");
        ws.expand_all();
        assert!(ws.expansion().is_expanded(&["美国".to_string(), "洛杉矶".to_string()]));

        assert!(ws.reorder_low_dimensions(&["manager", "region"]));
        assert!(ws.expansion().is_expanded(&["美国".to_string()]));
        assert!(!ws.expansion().is_expanded(&["美国".to_string(), "洛杉矶".to_string()]));
        assert!(!ws.expansion().is_expanded(&["美国".to_string(), "张三".to_string()]));
    }

    #[test]
    fn test_render_html_and_text() {
        let mut ws = loaded();
        ws.toggle_field("country");
        ws.toggle_field("region");
        ws.set_format("country", Some("<text_tag color='red'>国家</text_tag>".into()));
        ws.toggle_node(&["美国".to_string()]);

        let html = ws.render_html();
        assert!(html.contains(r#"<span style="color: red; font-weight: bold;">美国</span>"#));
        assert!(html.contains("洛杉矶"));
        assert!(!html.contains("多伦多"));

        let text = ws.render_text();
        assert!(text.contains("▾ 美国"));
        assert!(text.contains("▸ 加拿大"));
    }

    #[test]
    fn test_config_round_trip() {
        let mut ws = loaded();
        ws.toggle_field("country");
        ws.toggle_field("status");
        ws.apply_default_formats();
        let config = ws.config();

        let mut other = loaded();
        other.apply_config(&config);
        assert_eq!(other.selection(), ws.selection());
        assert_eq!(
            other.selection().dimension("status").unwrap().format_template.as_deref(),
            Some("**{value}**")
        );
    }
}
