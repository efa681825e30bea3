//! Catwalk Core Library
//!
//! This crate provides the catalog engine for Catwalk:
//! - Selection rule parsing and glob matching
//! - Catalog tree traversal with structural node classification
//! - Visitors that select streams/properties or aggregate reports
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Catalog   │────▶│  Traversal  │────▶│   Visitor   │
//! │   (JSON)    │     │ (classify)  │     │ (select/list)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! The catalog is a plain `serde_json::Value`: a top-level object with a
//! `streams` array, where each stream carries a `schema` and a `metadata`
//! array of breadcrumb-keyed entries. Traversal walks the document
//! depth-first, classifies each object by the shape of its path, and
//! dispatches it to a [`CatalogVisitor`]. Visitors either mutate
//! selection state in place ([`SelectVisitor`]) or build reports
//! ([`ListVisitor`], [`ListSelectedVisitor`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use catwalk_core::{list_selected, select};
//!
//! let mut catalog = load_catalog()?;
//! select(&mut catalog, ["users.*", "!users.password"]);
//! for (stream, properties) in list_selected(&mut catalog) {
//!     println!("{stream}: {properties:?}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod list;
pub mod pattern;
pub mod select;
pub mod traverse;

pub use list::{ListSelectedVisitor, ListVisitor, SelectedNode, list_properties, list_selected};
pub use pattern::{SelectPattern, matches_patterns};
pub use select::{SelectVisitor, select};
pub use traverse::{CatalogNodeKind, CatalogVisitor, dispatch, visit};
