//! Integration tests for the complete catalog selection pipeline
//!
//! Tests drive full catalogs through selection and listing to verify:
//! - Rule parsing, glob matching, and stream/property selection together
//! - Legacy catalog backfill (missing metadata sequences and entries)
//! - Selection followed by selected-listing as a CLI caller would use it
//! - Stability of repeated selection over the same catalog

use serde_json::{Value, json};

use catwalk_core::{SelectVisitor, list_properties, list_selected, select, visit};

/// A catalog the way a well-behaved producer emits it: schemas and
/// complete metadata, nothing selected yet.
fn full_catalog() -> Value {
    json!({
        "streams": [
            {
                "stream": "users",
                "schema": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "email": {"type": "string"},
                        "password": {"type": "string"},
                        "address": {
                            "type": "object",
                            "properties": {
                                "city": {"type": "string"},
                                "zip": {"type": "string"}
                            }
                        }
                    }
                },
                "metadata": [
                    {"breadcrumb": [], "metadata": {"inclusion": "available"}},
                    {"breadcrumb": ["users", "id"], "metadata": {"inclusion": "automatic"}},
                    {"breadcrumb": ["users", "email"], "metadata": {"inclusion": "available"}},
                    {"breadcrumb": ["users", "password"], "metadata": {"inclusion": "available"}},
                    {"breadcrumb": ["users", "address"], "metadata": {"inclusion": "available"}},
                    {"breadcrumb": ["users", "address", "city"], "metadata": {"inclusion": "available"}},
                    {"breadcrumb": ["users", "address", "zip"], "metadata": {"inclusion": "available"}}
                ]
            },
            {
                "stream": "orders",
                "schema": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "total": {"type": "number"}
                    }
                },
                "metadata": [
                    {"breadcrumb": [], "metadata": {"inclusion": "available"}},
                    {"breadcrumb": ["orders", "id"], "metadata": {"inclusion": "automatic"}},
                    {"breadcrumb": ["orders", "total"], "metadata": {"inclusion": "available"}}
                ]
            }
        ]
    })
}

/// A catalog from an old producer: no metadata at all.
fn legacy_catalog() -> Value {
    json!({
        "streams": [
            {
                "stream": "events",
                "schema": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "payload": {"type": "object"}
                    }
                }
            }
        ]
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// =============================================================================
// Selection + Listing Pipeline
// =============================================================================

#[test]
fn test_select_then_list_selected() {
    init_tracing();
    let mut catalog = full_catalog();

    select(&mut catalog, ["users.*", "!users.password"]);
    let report = list_selected(&mut catalog);

    let users = report.get("users").expect("users should be selected");
    assert!(users.contains("id"), "automatic properties stay included");
    assert!(users.contains("email"));
    assert!(users.contains("address.city"));
    assert!(
        !users.contains("password"),
        "excluded property must not appear"
    );
    assert!(
        report.get("orders").is_none(),
        "unselected streams are dropped from the report"
    );
}

#[test]
fn test_whole_stream_rule_selects_all_its_properties() {
    init_tracing();
    let mut catalog = full_catalog();

    select(&mut catalog, ["orders.*"]);
    let report = list_selected(&mut catalog);

    assert_eq!(
        report.get("orders").map(|properties| properties.len()),
        Some(2)
    );
    assert!(report.get("users").is_none());
}

#[test]
fn test_listing_is_independent_of_selection() {
    init_tracing();
    let mut catalog = full_catalog();

    let before = list_properties(&mut catalog);
    select(&mut catalog, ["users.email"]);
    let after = list_properties(&mut catalog);

    assert_eq!(before, after, "selection must not change the schema listing");
    assert!(before.get("users").is_some_and(|p| p.contains("email")));
    assert!(before.get("orders").is_some_and(|p| p.contains("total")));
}

// =============================================================================
// Legacy Catalog Backfill
// =============================================================================

#[test]
fn test_legacy_catalog_gets_metadata_backfilled() {
    init_tracing();
    let mut catalog = legacy_catalog();

    select(&mut catalog, ["events"]);

    let entries = catalog["streams"][0]["metadata"]
        .as_array()
        .expect("metadata sequence should be created");
    assert_eq!(entries[0]["breadcrumb"], json!([]));
    assert_eq!(entries[0]["metadata"]["inclusion"], json!("automatic"));
    assert_eq!(entries[0]["metadata"]["selected"], json!(true));
    assert!(
        entries
            .iter()
            .any(|entry| entry["breadcrumb"] == json!(["events", "id"])),
        "schema properties get metadata entries"
    );
    assert!(
        entries
            .iter()
            .any(|entry| entry["breadcrumb"] == json!(["events", "payload"]))
    );
}

#[test]
fn test_backfilled_catalog_reports_stream_as_selected() {
    init_tracing();
    let mut catalog = legacy_catalog();

    select(&mut catalog, ["events"]);
    let report = list_selected(&mut catalog);

    // backfilled entries are automatically included
    let events = report.get("events").expect("events should be selected");
    assert!(events.contains("id"));
    assert!(events.contains("payload"));
}

// =============================================================================
// Stability
// =============================================================================

#[test]
fn test_reselection_does_not_duplicate_metadata() {
    init_tracing();
    let mut catalog = legacy_catalog();

    select(&mut catalog, ["events.id"]);
    let first = catalog["streams"][0]["metadata"].as_array().unwrap().len();

    select(&mut catalog, ["events.id"]);
    let second = catalog["streams"][0]["metadata"].as_array().unwrap().len();
    assert_eq!(first, second);

    // a second pass decides selection for entries backfilled by the first;
    // from then on the catalog is a fixpoint
    let settled = catalog.clone();
    select(&mut catalog, ["events.id"]);
    assert_eq!(catalog, settled);
}

#[test]
fn test_changing_rules_flips_selection_in_place() {
    init_tracing();
    let mut catalog = full_catalog();

    select(&mut catalog, ["users"]);
    assert_eq!(catalog["streams"][0]["selected"], json!(true));

    select(&mut catalog, ["orders"]);
    assert_eq!(catalog["streams"][0]["selected"], json!(false));
    assert_eq!(catalog["streams"][1]["selected"], json!(true));
}

// =============================================================================
// Driving the Visitor Manually
// =============================================================================

#[test]
fn test_manual_visitor_drive_matches_select() {
    init_tracing();
    let mut driven = full_catalog();
    let mut visitor = SelectVisitor::new(["users.email"]);
    visit(&mut driven, &mut visitor);
    visitor.finish(&mut driven);

    let mut selected = full_catalog();
    select(&mut selected, ["users.email"]);

    assert_eq!(driven, selected);
}
