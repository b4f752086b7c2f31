use geostage::geom::GeometryKind;
use geostage::inmemory::InMemoryWorkspaceProvider;
use geostage::{
    FileCatalog, Filter, FilterOperator, Operation, SessionId, SourceRef, StagingEngine, TableRef,
    WorkspaceLocation,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn water_points_fixture(file_name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("geostage-tests");
    std::fs::create_dir_all(&dir).expect("fixture dir");
    let path = dir.join(file_name);
    let features: Vec<serde_json::Value> = (0..10)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [i as f64, i as f64]},
                "properties": {
                    "id": i,
                    "status": if i < 4 { "active" } else { "inactive" }
                }
            })
        })
        .collect();
    std::fs::write(
        &path,
        json!({"type": "FeatureCollection", "features": features}).to_string(),
    )
    .expect("write fixture");
    path
}

fn build_engine(fixture: &str) -> StagingEngine {
    let provider = Arc::new(InMemoryWorkspaceProvider::new());
    let catalog = Arc::new(FileCatalog::new());
    catalog.register("water_points", water_points_fixture(fixture));
    StagingEngine::new(provider, WorkspaceLocation::new("exec.sqlite"), catalog)
}

fn status_equals_active() -> Filter {
    Filter {
        column: "status".to_string(),
        operator: FilterOperator::Equals,
        value: json!("active"),
    }
}

/// Ingests the fixture filtered to active rows and returns the staged ref.
fn stage_active(engine: &StagingEngine, id: &SessionId) -> TableRef {
    let result = engine
        .execute(
            id,
            &Operation::Ingest {
                source: SourceRef::Dataset {
                    name: "water_points".to_string(),
                },
                filters: vec![status_equals_active()],
                destination: None,
            },
        )
        .expect("execute ingest");
    assert!(result.success, "ingest failed: {:?}", result.error);
    assert_eq!(result.row_count, Some(4));
    result.output.expect("output ref")
}

#[test]
fn filter_with_superset_membership_keeps_all_rows() {
    let engine = build_engine("exec_superset.geojson");
    let id = engine.create_session().expect("create");
    let staged = stage_active(&engine, &id);

    let result = engine
        .execute(
            &id,
            &Operation::Filter {
                input: staged,
                filters: vec![Filter {
                    column: "status".to_string(),
                    operator: FilterOperator::In,
                    value: json!(["active", "pending"]),
                }],
                destination: None,
            },
        )
        .expect("execute filter");
    assert!(result.success, "filter failed: {:?}", result.error);
    assert_eq!(result.row_count, Some(4));
}

#[test]
fn buffer_turns_points_into_areas() {
    let engine = build_engine("exec_buffer.geojson");
    let id = engine.create_session().expect("create");
    let staged = stage_active(&engine, &id);
    let staged_name = staged.name().to_string();

    let result = engine
        .execute(
            &id,
            &Operation::Buffer {
                input: staged,
                distance: Some(100.0),
                destination: None,
            },
        )
        .expect("execute buffer");
    assert!(result.success, "buffer failed: {:?}", result.error);
    assert_eq!(result.row_count, Some(4));

    let output_name = result.output.expect("output").name().to_string();
    let tables = engine.list_tables(&id, true).expect("list tables");
    let buffered = tables
        .iter()
        .find(|t| t.name == output_name)
        .expect("buffered table listed");
    assert_eq!(buffered.geometry, Some(GeometryKind::Area));
    assert_eq!(buffered.row_count, 4);

    let source = tables
        .iter()
        .find(|t| t.name == staged_name)
        .expect("source table listed");
    assert_eq!(source.geometry, Some(GeometryKind::Point));
    // Non-geometry columns carry over unchanged.
    assert_eq!(buffered.schema, source.schema);
}

#[test]
fn buffer_without_distance_is_invalid_and_stages_nothing() {
    let engine = build_engine("exec_nodist.geojson");
    let id = engine.create_session().expect("create");
    let staged = stage_active(&engine, &id);
    let before = engine.list_tables(&id, true).expect("list").len();

    let result = engine
        .execute(
            &id,
            &Operation::Buffer {
                input: staged,
                distance: None,
                destination: None,
            },
        )
        .expect("execute buffer");
    assert!(!result.success);
    assert!(result.output.is_none());
    let error = result.error.expect("error detail");
    assert!(error.contains("distance"), "error: {error}");

    let after = engine.list_tables(&id, true).expect("list").len();
    assert_eq!(before, after, "failed buffer staged a table");
}

#[test]
fn unknown_dataset_is_an_embedded_not_found() {
    let engine = build_engine("exec_unknown.geojson");
    let id = engine.create_session().expect("create");
    let result = engine
        .execute(
            &id,
            &Operation::Ingest {
                source: SourceRef::Dataset {
                    name: "sewer_lines".to_string(),
                },
                filters: Vec::new(),
                destination: None,
            },
        )
        .expect("execute");
    assert!(!result.success);
    assert!(result.error.expect("error").contains("not registered"));
}

#[test]
fn temporary_ref_from_another_session_is_rejected() {
    let engine = build_engine("exec_cross.geojson");
    let owner = engine.create_session().expect("create owner");
    let staged = stage_active(&engine, &owner);

    let other = engine.create_session().expect("create other");
    let result = engine
        .execute(
            &other,
            &Operation::Filter {
                input: staged,
                filters: Vec::new(),
                destination: None,
            },
        )
        .expect("execute");
    assert!(!result.success);
    assert!(result.error.expect("error").contains("belongs to session"));
}

#[test]
fn unknown_column_fails_without_staging() {
    let engine = build_engine("exec_badcol.geojson");
    let id = engine.create_session().expect("create");
    let staged = stage_active(&engine, &id);
    let before = engine.list_tables(&id, true).expect("list").len();

    let result = engine
        .execute(
            &id,
            &Operation::Filter {
                input: staged,
                filters: vec![Filter {
                    column: "owner".to_string(),
                    operator: FilterOperator::Equals,
                    value: json!("x"),
                }],
                destination: None,
            },
        )
        .expect("execute");
    assert!(!result.success);
    assert!(result.error.expect("error").contains("column"));
    assert_eq!(engine.list_tables(&id, true).expect("list").len(), before);
}

#[test]
fn explicit_destination_collision_is_reported() {
    let engine = build_engine("exec_collide.geojson");
    let id = engine.create_session().expect("create");

    let op = Operation::Ingest {
        source: SourceRef::Dataset {
            name: "water_points".to_string(),
        },
        filters: Vec::new(),
        destination: Some("loaded".to_string()),
    };
    let first = engine.execute(&id, &op).expect("first");
    assert!(first.success);
    let second = engine.execute(&id, &op).expect("second");
    assert!(!second.success);
    assert!(second.error.expect("error").contains("already exists"));
}
