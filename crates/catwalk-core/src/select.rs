//! Selection visitor
//!
//! Applies a set of selection rules to a catalog in place: stream-level
//! and property-level `selected` flags are written into the metadata
//! entries, and metadata missing from legacy catalogs is backfilled with
//! synthetic entries. The catalog is never shrunk; the only fields
//! written are `selected` flags and appended entries.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};

use crate::pattern::{SelectPattern, matches_patterns};
use crate::traverse::{CatalogVisitor, breadcrumb_components, has_empty_breadcrumb, visit};

static PROPERTY_COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"properties\.(\w+)").expect("valid property component regex"));

/// Apply selection rules to `catalog` in place.
///
/// Each rule is parsed with [`SelectPattern::parse`]. Streams are matched
/// by name against the non-negated stream patterns only: exclusions apply
/// at property granularity, never at stream granularity. Properties are
/// matched by their dotted breadcrumb path against both the include and
/// exclude property patterns.
///
/// ```
/// use serde_json::json;
///
/// let mut catalog = json!({
///     "streams": [{
///         "stream": "users",
///         "schema": {"properties": {"id": {"type": "integer"}}},
///         "metadata": [{"breadcrumb": [], "metadata": {"inclusion": "available"}}]
///     }]
/// });
/// catwalk_core::select(&mut catalog, ["users"]);
/// assert_eq!(catalog["streams"][0]["selected"], json!(true));
/// ```
pub fn select<I, S>(catalog: &mut Value, rules: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut visitor = SelectVisitor::new(rules);
    visit(catalog, &mut visitor);
    visitor.finish(catalog);
}

/// Scope of the stream most recently entered by the traversal.
struct StreamScope {
    name: String,
    /// Breadcrumbs already present in the stream's metadata sequence
    known: HashSet<Vec<String>>,
    /// Breadcrumbs discovered on properties but absent from the metadata,
    /// in discovery order
    missing: Vec<Vec<String>>,
}

/// Visitor that writes selection state into a catalog.
///
/// Use [`select`] for the common case. Driving the visitor manually
/// requires calling [`SelectVisitor::finish`] after the traversal so
/// that metadata entries for legacy catalogs get backfilled:
///
/// ```rust,ignore
/// let mut visitor = SelectVisitor::new(rules);
/// visit(&mut catalog, &mut visitor);
/// visitor.finish(&mut catalog);
/// ```
pub struct SelectVisitor {
    patterns: Vec<SelectPattern>,
    streams: Vec<StreamScope>,
}

impl SelectVisitor {
    /// Parse `rules` into a visitor. Accepts any strings; rule parsing
    /// never fails.
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: rules
                .into_iter()
                .map(|rule| SelectPattern::parse(rule.as_ref()))
                .collect(),
            streams: Vec::new(),
        }
    }

    /// Append the metadata entries recorded as missing during traversal.
    ///
    /// Properties of legacy catalogs may have no metadata entry at all.
    /// A handler cannot reach back into the stream's metadata sequence
    /// while the walk holds the property subtree, so the missing
    /// breadcrumbs are collected per stream and appended here. Backfilled
    /// entries carry `inclusion: "automatic"` and no `selected` flag;
    /// their selection is decided when a later traversal visits them.
    pub fn finish(self, catalog: &mut Value) {
        let Some(streams) = catalog.get_mut("streams").and_then(Value::as_array_mut) else {
            return;
        };

        for scope in self.streams.into_iter().filter(|s| !s.missing.is_empty()) {
            let Some(stream) = streams.iter_mut().find(|stream| {
                stream.get("stream").and_then(Value::as_str) == Some(scope.name.as_str())
            }) else {
                tracing::debug!("stream '{}' disappeared before backfill", scope.name);
                continue;
            };
            let Some(entries) = stream.get_mut("metadata").and_then(Value::as_array_mut) else {
                continue;
            };

            for breadcrumb in scope.missing {
                tracing::debug!("backfilling metadata for {:?}", breadcrumb);
                entries.push(json!({
                    "breadcrumb": breadcrumb,
                    "metadata": {"inclusion": "automatic"},
                }));
            }
        }
    }

    fn stream_matches(&self, stream: &str) -> bool {
        matches_patterns(
            stream,
            self.patterns
                .iter()
                .filter(|pattern| !pattern.negated)
                .map(|pattern| pattern.stream_pattern.as_str()),
            std::iter::empty(),
        )
    }

    fn property_matches(&self, property: &str) -> bool {
        matches_patterns(
            property,
            self.patterns
                .iter()
                .filter(|pattern| !pattern.negated)
                .map(|pattern| pattern.property_pattern.as_str()),
            self.patterns
                .iter()
                .filter(|pattern| pattern.negated)
                .map(|pattern| pattern.property_pattern.as_str()),
        )
    }

    /// Write `selected` into a metadata mapping (or a stream object,
    /// which carries a top-level `selected` key for older consumers).
    fn update_selection(node: &mut Value, path: &str, selected: bool) {
        if let Some(map) = node.as_object_mut() {
            map.insert("selected".to_string(), Value::Bool(selected));
        }
        if selected {
            tracing::debug!("'{}' has been selected", path);
        } else {
            tracing::debug!("'{}' has not been selected", path);
        }
    }

    /// The synthetic entry describing a stream itself.
    fn stream_metadata_entry() -> Value {
        json!({
            "breadcrumb": [],
            "metadata": {"inclusion": "automatic"},
        })
    }
}

impl CatalogVisitor for SelectVisitor {
    fn on_stream(&mut self, node: &mut Value, path: &str) {
        let Some(name) = node.get("stream").and_then(Value::as_str).map(str::to_string) else {
            tracing::debug!("stream at '{}' has no name, skipping", path);
            return;
        };
        let selected = self.stream_matches(&name);

        let Some(map) = node.as_object_mut() else {
            return;
        };
        if map.get("metadata").and_then(Value::as_array).is_none() {
            // Legacy catalog: the stream has no metadata sequence at all
            let mut entry = Self::stream_metadata_entry();
            if let Some(metadata) = entry.get_mut("metadata") {
                Self::update_selection(metadata, path, selected);
            }
            map.insert("metadata".to_string(), Value::Array(vec![entry]));
        } else if let Some(entries) = map.get_mut("metadata").and_then(Value::as_array_mut) {
            match entries.iter().position(has_empty_breadcrumb) {
                Some(index) => {
                    if let Some(metadata) = entries[index].get_mut("metadata") {
                        Self::update_selection(metadata, path, selected);
                    }
                }
                None => {
                    // Legacy catalog: no entry describes the stream itself
                    let mut entry = Self::stream_metadata_entry();
                    if let Some(metadata) = entry.get_mut("metadata") {
                        Self::update_selection(metadata, path, selected);
                    }
                    entries.insert(0, entry);
                }
            }
        }

        // the stream object itself carries a `selected` key
        Self::update_selection(node, path, selected);

        let known = node
            .get("metadata")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(breadcrumb_components).collect())
            .unwrap_or_default();
        self.streams.push(StreamScope {
            name,
            known,
            missing: Vec::new(),
        });
    }

    fn on_stream_metadata(&mut self, node: &mut Value, path: &str) {
        let Some(scope) = self.streams.last() else {
            tracing::debug!("metadata entry at '{}' outside any stream, skipping", path);
            return;
        };
        let selected = self.stream_matches(&scope.name);
        if let Some(metadata) = node.get_mut("metadata") {
            Self::update_selection(metadata, path, selected);
        }
    }

    fn on_property(&mut self, _node: &mut Value, path: &str) {
        let Some(scope) = self.streams.last_mut() else {
            tracing::debug!("property at '{}' outside any stream, skipping", path);
            return;
        };

        let mut breadcrumb = vec![scope.name.clone()];
        breadcrumb.extend(
            PROPERTY_COMPONENT
                .captures_iter(path)
                .map(|capture| capture[1].to_string()),
        );

        if scope.known.insert(breadcrumb.clone()) {
            scope.missing.push(breadcrumb);
        }
    }

    fn on_property_metadata(&mut self, node: &mut Value, path: &str) {
        let Some(crumbs) = breadcrumb_components(node) else {
            tracing::debug!("unreadable breadcrumb at '{}', skipping", path);
            return;
        };
        let selected = self.property_matches(&crumbs.join("."));
        if let Some(metadata) = node.get_mut("metadata") {
            Self::update_selection(metadata, path, selected);
        }
    }
}
