//! Listing visitors
//!
//! Read-only reports over a catalog: a flat listing of every stream and
//! its properties, and a listing restricted to what the selection rules
//! (or automatic inclusion) actually selected.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::traverse::{CatalogVisitor, breadcrumb_components, visit};

/// Walk `catalog` and list every stream with its property leaf names.
pub fn list_properties(catalog: &mut Value) -> IndexMap<String, HashSet<String>> {
    let mut visitor = ListVisitor::new();
    visit(catalog, &mut visitor);
    visitor.into_properties()
}

/// Walk `catalog` and report the selected streams with their selected
/// property names.
pub fn list_selected(catalog: &mut Value) -> IndexMap<String, HashSet<String>> {
    let mut visitor = ListSelectedVisitor::new();
    visit(catalog, &mut visitor);
    visitor.selected_properties()
}

/// Visitor that records every stream and its property leaf names, in
/// stream order.
#[derive(Debug, Default)]
pub struct ListVisitor {
    properties: IndexMap<String, HashSet<String>>,
}

impl ListVisitor {
    /// Create an empty listing visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the visitor and return the stream → properties report.
    pub fn into_properties(self) -> IndexMap<String, HashSet<String>> {
        self.properties
    }
}

impl CatalogVisitor for ListVisitor {
    fn on_stream(&mut self, node: &mut Value, _path: &str) {
        let Some(name) = node.get("stream").and_then(Value::as_str) else {
            return;
        };
        self.properties.entry(name.to_string()).or_default();
    }

    fn on_property(&mut self, _node: &mut Value, path: &str) {
        let name = path.rsplit_once('.').map_or(path, |(_, leaf)| leaf);
        let Some((_, properties)) = self.properties.last_mut() else {
            tracing::debug!("property at '{}' before any stream, skipping", path);
            return;
        };
        properties.insert(name.to_string());
    }
}

/// A stream or property name paired with its selection outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SelectedNode {
    /// Stream name, or dotted property name within its stream
    pub key: String,
    /// Whether the node ended up selected
    pub selected: bool,
}

/// Visitor that aggregates per-stream selection outcomes.
///
/// An entry counts as selected when its metadata has
/// `inclusion: "automatic"` or `selected: true`; an entry without a
/// metadata mapping is not selected.
#[derive(Debug, Default)]
pub struct ListSelectedVisitor {
    streams: HashSet<SelectedNode>,
    properties: IndexMap<String, HashSet<SelectedNode>>,
    current: Option<String>,
}

impl ListSelectedVisitor {
    /// Create an empty selected-listing visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stream seen, with its selection outcome.
    pub fn streams(&self) -> &HashSet<SelectedNode> {
        &self.streams
    }

    /// Every property seen, with its selection outcome, per stream.
    pub fn properties(&self) -> &IndexMap<String, HashSet<SelectedNode>> {
        &self.properties
    }

    /// The final report: selected streams mapped to their selected
    /// property names.
    ///
    /// A stream recorded as unselected is dropped entirely, properties
    /// included, even if some of those properties are individually
    /// marked selected.
    pub fn selected_properties(&self) -> IndexMap<String, HashSet<String>> {
        self.properties
            .iter()
            .filter(|(name, _)| {
                !self
                    .streams
                    .iter()
                    .any(|stream| !stream.selected && stream.key == **name)
            })
            .map(|(name, properties)| {
                let selected = properties
                    .iter()
                    .filter(|property| property.selected)
                    .map(|property| property.key.clone())
                    .collect();
                (name.clone(), selected)
            })
            .collect()
    }

    fn is_node_selected(node: &Value) -> bool {
        let Some(metadata) = node.get("metadata") else {
            return false;
        };
        metadata.get("inclusion").and_then(Value::as_str) == Some("automatic")
            || metadata
                .get("selected")
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }
}

impl CatalogVisitor for ListSelectedVisitor {
    fn on_stream(&mut self, node: &mut Value, _path: &str) {
        let Some(name) = node.get("stream").and_then(Value::as_str) else {
            return;
        };
        self.current = Some(name.to_string());
        self.properties.insert(name.to_string(), HashSet::new());
    }

    fn on_stream_metadata(&mut self, node: &mut Value, path: &str) {
        let Some(stream) = &self.current else {
            tracing::debug!("metadata entry at '{}' outside any stream, skipping", path);
            return;
        };
        self.streams.insert(SelectedNode {
            key: stream.clone(),
            selected: Self::is_node_selected(node),
        });
    }

    fn on_property_metadata(&mut self, node: &mut Value, path: &str) {
        let Some(stream) = self.current.clone() else {
            tracing::debug!("metadata entry at '{}' outside any stream, skipping", path);
            return;
        };
        let Some(crumbs) = breadcrumb_components(node) else {
            tracing::debug!("unreadable breadcrumb at '{}', skipping", path);
            return;
        };

        // the breadcrumb's first element is the stream name
        let name = crumbs.get(1..).unwrap_or_default().join(".");
        let selected = Self::is_node_selected(node);
        if let Some(properties) = self.properties.get_mut(&stream) {
            properties.insert(SelectedNode {
                key: name,
                selected,
            });
        }
    }
}
