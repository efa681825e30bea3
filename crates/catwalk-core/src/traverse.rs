//! Catalog tree traversal and node classification
//!
//! The walk is depth-first and pre-order over a `serde_json::Value`:
//! objects are mappings, arrays are sequences, everything else is a
//! scalar. A textual path is threaded through the recursion (`.<key>`
//! per object child, `[<index>]` per array element) and the shape of
//! that path, not any declared type, decides what a node is:
//!
//! - `streams[<i>]` suffix → [`CatalogNodeKind::Stream`]
//! - `schema.properties.` anywhere in the path →
//!   [`CatalogNodeKind::Property`] (fires again for each nested
//!   `properties.<name>` object)
//! - `metadata[<i>]` suffix on an object with a `breadcrumb` field →
//!   [`CatalogNodeKind::StreamMetadata`] when the breadcrumb is an empty
//!   array, [`CatalogNodeKind::PropertyMetadata`] otherwise
//!
//! The checks are independent: a node may classify as zero, one, or more
//! kinds, and every object and array child is walked regardless.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static STREAM_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"streams\[\d+\]$").expect("valid stream path regex"));

static PROPERTY_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"schema\.properties\..*$").expect("valid property path regex"));

static METADATA_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"metadata\[\d+\]$").expect("valid metadata path regex"));

/// Structural classification of a catalog node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogNodeKind {
    /// One element of the top-level `streams` sequence
    Stream,
    /// The breadcrumb-empty metadata entry describing the stream itself
    StreamMetadata,
    /// A property schema object, including nested object properties
    Property,
    /// A metadata entry with a non-empty breadcrumb
    PropertyMetadata,
}

/// Visitor over classified catalog nodes.
///
/// One handler per node kind, each defaulting to a no-op, so an
/// implementation only overrides the kinds it cares about. Handlers may
/// mutate the node they receive or aggregate into visitor-owned state.
///
/// A visitor instance is traversal-scoped: it may carry state such as
/// the current stream, so create a fresh instance per document rather
/// than reusing one across traversals.
pub trait CatalogVisitor {
    /// Called for each stream object
    fn on_stream(&mut self, _node: &mut Value, _path: &str) {}

    /// Called for the metadata entry describing the stream itself
    fn on_stream_metadata(&mut self, _node: &mut Value, _path: &str) {}

    /// Called for each property schema object
    fn on_property(&mut self, _node: &mut Value, _path: &str) {}

    /// Called for each property metadata entry
    fn on_property_metadata(&mut self, _node: &mut Value, _path: &str) {}
}

/// Invoke the handler matching `kind` on `visitor`.
///
/// The match is total: every kind maps to exactly one handler, and a
/// kind a visitor does not override falls through to the trait's no-op
/// default rather than being an error.
pub fn dispatch<V: CatalogVisitor>(
    visitor: &mut V,
    kind: CatalogNodeKind,
    node: &mut Value,
    path: &str,
) {
    match kind {
        CatalogNodeKind::Stream => visitor.on_stream(node, path),
        CatalogNodeKind::StreamMetadata => visitor.on_stream_metadata(node, path),
        CatalogNodeKind::Property => visitor.on_property(node, path),
        CatalogNodeKind::PropertyMetadata => visitor.on_property_metadata(node, path),
    }
}

/// Walk `catalog` depth-first, dispatching classified nodes to `visitor`.
pub fn visit<V: CatalogVisitor>(catalog: &mut Value, visitor: &mut V) {
    visit_node(catalog, visitor, "");
}

fn visit_node<V: CatalogVisitor>(node: &mut Value, visitor: &mut V, path: &str) {
    match node {
        Value::Object(_) => visit_object(node, visitor, path),
        Value::Array(children) => {
            for (index, child) in children.iter_mut().enumerate() {
                visit_node(child, visitor, &format!("{path}[{index}]"));
            }
        }
        _ => tracing::trace!("skipping node at '{}'", path),
    }
}

fn visit_object<V: CatalogVisitor>(node: &mut Value, visitor: &mut V, path: &str) {
    tracing::trace!("visiting node at '{}'", path);

    if STREAM_PATH.is_match(path) {
        dispatch(visitor, CatalogNodeKind::Stream, node, path);
    }

    if PROPERTY_PATH.is_match(path) {
        dispatch(visitor, CatalogNodeKind::Property, node, path);
    }

    if METADATA_PATH.is_match(path) && node.get("breadcrumb").is_some() {
        let kind = if has_empty_breadcrumb(node) {
            CatalogNodeKind::StreamMetadata
        } else {
            CatalogNodeKind::PropertyMetadata
        };
        dispatch(visitor, kind, node, path);
    }

    // A handler may have replaced the node wholesale, so re-check the shape.
    let Some(children) = node.as_object_mut() else {
        return;
    };
    for (key, child) in children.iter_mut() {
        visit_node(child, visitor, &format!("{path}.{key}"));
    }
}

pub(crate) fn has_empty_breadcrumb(node: &Value) -> bool {
    node.get("breadcrumb")
        .and_then(Value::as_array)
        .is_some_and(Vec::is_empty)
}

/// The breadcrumb of a metadata entry, if it is an array of strings.
pub(crate) fn breadcrumb_components(entry: &Value) -> Option<Vec<String>> {
    entry
        .get("breadcrumb")?
        .as_array()?
        .iter()
        .map(|component| component.as_str().map(str::to_string))
        .collect()
}
