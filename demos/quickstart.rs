use geostage::inmemory::InMemoryWorkspaceProvider;
use geostage::{
    EngineResult, FileCatalog, Filter, FilterOperator, Operation, SourceRef, StagingEngine,
    WorkspaceLocation,
};
use serde_json::json;
use std::sync::Arc;

fn write_sample_dataset() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("geostage-quickstart");
    std::fs::create_dir_all(&dir).expect("create sample dir");
    let path = dir.join("water_points.geojson");
    let features: Vec<serde_json::Value> = (0..10)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [174.0 + i as f64 * 0.01, -41.0]},
                "properties": {
                    "id": i,
                    "status": if i % 2 == 0 { "active" } else { "inactive" }
                }
            })
        })
        .collect();
    std::fs::write(
        &path,
        json!({"type": "FeatureCollection", "features": features}).to_string(),
    )
    .expect("write sample dataset");
    path
}

fn main() -> EngineResult<()> {
    println!("== Staging session demo ==");
    let catalog = Arc::new(FileCatalog::new());
    catalog.register("water_points", write_sample_dataset());
    let engine = StagingEngine::new(
        Arc::new(InMemoryWorkspaceProvider::new()),
        WorkspaceLocation::new("demo.sqlite"),
        catalog,
    );

    let session = engine.create_session()?;
    println!("Created session {session}");

    let result = engine.execute(
        &session,
        &Operation::Ingest {
            source: SourceRef::Dataset {
                name: "water_points".to_string(),
            },
            filters: vec![Filter {
                column: "status".to_string(),
                operator: FilterOperator::Equals,
                value: json!("active"),
            }],
            destination: None,
        },
    )?;
    println!("{}", result.message);

    let staged = result.output.expect("staged table");
    let buffered = engine.execute(
        &session,
        &Operation::Buffer {
            input: staged.clone(),
            distance: Some(0.002),
            destination: None,
        },
    )?;
    println!("{}", buffered.message);

    let output = buffered.output.expect("buffered table");
    engine.commit_table(&session, output.name(), "active_coverage")?;
    println!("Committed {} -> active_coverage", output.name());

    for table in engine.list_tables(&session, true)? {
        println!(
            "table {} ({} rows, temporary: {})",
            table.name, table.row_count, table.is_temporary
        );
    }

    engine.destroy_session(&session)?;
    println!("Session destroyed; uncommitted staging tables dropped");
    Ok(())
}
