//! Field selection and dimension assignment.
//!
//! The editor works with a two-tier hierarchy: the first selected field is
//! the single top dimension (level 0), every later field is a low dimension
//! (level 1) sequenced by `order`. After every operation:
//!
//! - at most one dimension has level 0, and it exists whenever any does
//! - low dimensions carry a dense `order` of `0..n-1`
//! - `selected` keeps insertion order regardless of level or order

use crate::model::{Dimension, Field};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("No active dimension for field: {0}")]
    NotFound(String),
    #[error("Reorder does not match the current low dimensions")]
    OrderMismatch,
    #[error("Dimension limit reached ({0})")]
    LimitReached(usize),
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    selected: Vec<String>,
    dimensions: Vec<Dimension>,
    limit: Option<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of selected fields.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Rebuild from an imported dimension list.
    ///
    /// Entries are ranked by `(level, order)`, duplicates are dropped and the
    /// result is compacted, so any list normalizes to a valid state.
    pub fn from_dimensions(dimensions: Vec<Dimension>, limit: Option<usize>) -> Self {
        let mut ranked: Vec<Dimension> = Vec::with_capacity(dimensions.len());
        for dim in dimensions {
            if !ranked.iter().any(|d| d.field_id == dim.field_id) {
                ranked.push(dim);
            }
        }
        ranked.sort_by_key(Dimension::rank);
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }

        let mut selection = Self {
            selected: ranked.iter().map(|d| d.field_id.clone()).collect(),
            dimensions: ranked,
            limit,
        };
        selection.compact();
        selection
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, field_id: &str) -> bool {
        self.selected.iter().any(|id| id == field_id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Dimensions in insertion order.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, field_id: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.field_id == field_id)
    }

    pub fn top(&self) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.is_top())
    }

    /// Low dimensions sorted by `order`.
    pub fn low_dimensions(&self) -> Vec<&Dimension> {
        let mut low: Vec<&Dimension> = self.dimensions.iter().filter(|d| !d.is_top()).collect();
        low.sort_by_key(|d| d.rank());
        low
    }

    /// Dimensions in grouping order: level, then order.
    pub fn ordered(&self) -> Vec<Dimension> {
        let mut dims = self.dimensions.clone();
        dims.sort_by_key(Dimension::rank);
        dims
    }

    pub fn toggle_field(&mut self, field_id: &str) -> Result<Toggle, SelectionError> {
        if self.is_selected(field_id) {
            self.remove_field(field_id);
            Ok(Toggle::Removed)
        } else {
            self.add_field(field_id)?;
            Ok(Toggle::Added)
        }
    }

    /// Append a field. Returns `false` when it was already selected.
    pub fn add_field(&mut self, field_id: &str) -> Result<bool, SelectionError> {
        if self.is_selected(field_id) {
            return Ok(false);
        }
        if let Some(limit) = self.limit {
            if self.selected.len() >= limit {
                return Err(SelectionError::LimitReached(limit));
            }
        }

        let dimension = if self.dimensions.is_empty() {
            Dimension::top(field_id)
        } else {
            let low_count = self.dimensions.iter().filter(|d| !d.is_top()).count();
            Dimension::low(field_id, low_count as u32)
        };
        debug!(field = field_id, level = dimension.level, "dimension added");

        self.selected.push(field_id.to_string());
        self.dimensions.push(dimension);
        Ok(true)
    }

    /// Drop a field and its dimension. Returns `false` when it was not selected.
    pub fn remove_field(&mut self, field_id: &str) -> bool {
        if !self.is_selected(field_id) {
            return false;
        }
        self.selected.retain(|id| id != field_id);
        self.dimensions.retain(|d| d.field_id != field_id);
        self.compact();
        debug!(field = field_id, remaining = self.selected.len(), "dimension removed");
        true
    }

    /// Keep only fields still present in `fields`.
    pub fn retain_fields(&mut self, fields: &[Field]) -> Vec<String> {
        let dropped: Vec<String> = self
            .selected
            .iter()
            .filter(|id| !fields.iter().any(|f| &f.id == *id))
            .cloned()
            .collect();
        for id in &dropped {
            self.remove_field(id);
        }
        dropped
    }

    /// Assign `order` from the position of each field id in `new_order`.
    pub fn reorder_low_dimensions<S: AsRef<str>>(&mut self, new_order: &[S]) -> Result<(), SelectionError> {
        let low: Vec<&str> = self
            .dimensions
            .iter()
            .filter(|d| !d.is_top())
            .map(|d| d.field_id.as_str())
            .collect();

        let is_permutation = new_order.len() == low.len()
            && low.iter().all(|id| new_order.iter().filter(|n| n.as_ref() == *id).count() == 1);
        if !is_permutation {
            return Err(SelectionError::OrderMismatch);
        }

        for (index, field_id) in new_order.iter().enumerate() {
            if let Some(dim) = self
                .dimensions
                .iter_mut()
                .find(|d| !d.is_top() && d.field_id == field_id.as_ref())
            {
                dim.order = Some(index as u32);
            }
        }
        Ok(())
    }

    /// Set or clear the format template of a dimension.
    pub fn set_format(&mut self, field_id: &str, template: Option<String>) -> Result<(), SelectionError> {
        let dim = self
            .dimensions
            .iter_mut()
            .find(|d| d.field_id == field_id)
            .ok_or_else(|| SelectionError::NotFound(field_id.to_string()))?;
        dim.format_template = template.filter(|t| !t.is_empty());
        Ok(())
    }

    /// Give formatless low dimensions the default look for their position.
    pub fn apply_default_formats(&mut self) {
        for dim in self.dimensions.iter_mut().filter(|d| !d.is_top()) {
            if dim.format_template.is_none() {
                dim.format_template = default_format(dim.order.unwrap_or(0));
            }
        }
    }

    /// Re-establish the level/order invariant, keeping the current ranking.
    fn compact(&mut self) {
        let mut ranked: Vec<(usize, (u32, u32))> = self
            .dimensions
            .iter()
            .enumerate()
            .map(|(i, d)| (i, d.rank()))
            .collect();
        ranked.sort_by_key(|&(i, rank)| (rank, i));

        for (position, (index, _)) in ranked.into_iter().enumerate() {
            let dim = &mut self.dimensions[index];
            if position == 0 {
                dim.level = 0;
                dim.order = Some(0);
            } else {
                dim.level = 1;
                dim.order = Some(position as u32 - 1);
            }
        }
    }
}

/// Default format for the low dimension at `order`.
pub fn default_format(order: u32) -> Option<String> {
    match order {
        0 => Some("**{value}**".to_string()),
        1 => Some("<text_tag color='red'>{value}</text_tag>".to_string()),
        2 => Some("*{value}*".to_string()),
        _ => None,
    }
}
