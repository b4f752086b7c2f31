//! Operation executors: ingest, filter, buffer.
//!
//! Each executor translates a declarative [`Operation`] plus a session into
//! a newly staged temporary table. Failures never propagate out; they are
//! embedded in the returned [`OperationResult`]. Staging is all-or-nothing:
//! the output table is written and registered last, so an executor that
//! fails mid-way leaves nothing tracked.

use crate::catalog::DatasetCatalog;
use crate::dataset::{load_vector_file, Dataset, Feature};
use crate::error::{execution, invalid_argument, not_found, EngineResult};
use crate::model::{Filter, FilterOperator, Operation, OperationResult, SourceRef, TableRef};
use crate::session::StagingSession;
use crate::value::{coerce_json, json_as_lower_text, ColumnKind, Value};
use std::path::PathBuf;

struct Staged {
    table: String,
    rows: u64,
    message: String,
}

/// Runs one operation against a session, converting any failure into a
/// failed result.
pub fn execute_operation(
    session: &mut StagingSession,
    catalog: &dyn DatasetCatalog,
    operation: &Operation,
) -> OperationResult {
    let outcome = match operation {
        Operation::Ingest {
            source,
            filters,
            destination,
        } => run_ingest(session, catalog, source, filters, destination.as_deref()),
        Operation::Filter {
            input,
            filters,
            destination,
        } => run_filter(session, input, filters, destination.as_deref()),
        Operation::Buffer {
            input,
            distance,
            destination,
        } => run_buffer(session, input, *distance, destination.as_deref()),
    };
    match outcome {
        Ok(staged) => OperationResult::succeeded(
            TableRef::Temporary {
                name: staged.table,
                session_id: session.id().clone(),
            },
            staged.rows,
            staged.message,
        ),
        Err(err) => OperationResult::failed(err),
    }
}

fn run_ingest(
    session: &mut StagingSession,
    catalog: &dyn DatasetCatalog,
    source: &SourceRef,
    filters: &[Filter],
    destination: Option<&str>,
) -> EngineResult<Staged> {
    let (label, path) = match source {
        SourceRef::Dataset { name } => (name.clone(), catalog.resolve(name)?),
        SourceRef::File { path } => (path.clone(), PathBuf::from(path)),
    };
    let dataset = load_vector_file(&path)?;
    let loaded = dataset.len();
    let filtered = apply_filters(dataset, filters)?;
    let kept = filtered.len();

    let name = stage_name(session, destination, "ingest");
    let table = session.ingest(&filtered, Some(&name))?;
    Ok(Staged {
        table,
        rows: kept as u64,
        message: format!("ingested '{label}': {loaded} rows loaded, {kept} after filters"),
    })
}

fn run_filter(
    session: &mut StagingSession,
    input: &TableRef,
    filters: &[Filter],
    destination: Option<&str>,
) -> EngineResult<Staged> {
    let dataset = resolve_input(session, input)?;
    let loaded = dataset.len();
    let filtered = apply_filters(dataset, filters)?;
    let kept = filtered.len();

    let name = stage_name(session, destination, "filtered");
    let table = session.ingest(&filtered, Some(&name))?;
    Ok(Staged {
        table,
        rows: kept as u64,
        message: format!(
            "filtered '{}': {loaded} rows in, {kept} rows out",
            input.name()
        ),
    })
}

fn run_buffer(
    session: &mut StagingSession,
    input: &TableRef,
    distance: Option<f64>,
    destination: Option<&str>,
) -> EngineResult<Staged> {
    let Some(distance) = distance else {
        return Err(invalid_argument("buffer requires a distance"));
    };
    let dataset = resolve_input(session, input)?;

    let mut buffered = dataset.empty_like();
    for (row, feature) in dataset.features.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            return Err(execution(format!(
                "row {row} of '{}' has no geometry to buffer",
                input.name()
            )));
        };
        buffered.push_feature(feature.values.clone(), Some(geometry.buffer(distance)?))?;
    }
    let rows = buffered.len();

    let name = stage_name(session, destination, "buffered");
    let table = session.ingest(&buffered, Some(&name))?;
    Ok(Staged {
        table,
        rows: rows as u64,
        message: format!(
            "buffered '{}' by {distance}: {rows} rows",
            input.name()
        ),
    })
}

fn stage_name(session: &StagingSession, destination: Option<&str>, prefix: &str) -> String {
    match destination {
        Some(name) => name.to_string(),
        None => session.generate_temp_table_name(prefix),
    }
}

/// Reads the operation input.
///
/// Persistent refs read straight from the backing store; temporary refs must
/// name this session and be tracked by it.
fn resolve_input(session: &StagingSession, input: &TableRef) -> EngineResult<Dataset> {
    match input {
        TableRef::Persistent { name } => session.read_table(name),
        TableRef::Temporary { name, session_id } => {
            if session_id != session.id() {
                return Err(invalid_argument(format!(
                    "temporary table '{name}' belongs to session '{session_id}'"
                )));
            }
            if !session.is_tracked(name) {
                return Err(not_found(format!(
                    "temporary table '{name}' is not tracked by this session"
                )));
            }
            session.read_table(name)
        }
    }
}

/// Applies a filter chain in declaration order; each clause narrows the
/// surviving row set (strictly conjunctive).
pub fn apply_filters(dataset: Dataset, filters: &[Filter]) -> EngineResult<Dataset> {
    let mut current = dataset;
    for filter in filters {
        let survivors = apply_filter(&current, filter)?;
        current = Dataset {
            schema: current.schema.clone(),
            crs: current.crs.clone(),
            features: survivors,
        };
    }
    Ok(current)
}

fn apply_filter(dataset: &Dataset, filter: &Filter) -> EngineResult<Vec<Feature>> {
    let Some(column) = dataset.schema.column_index(&filter.column) else {
        return Err(not_found(format!("column '{}' not found", filter.column)));
    };
    let kind = dataset.schema.columns[column].kind;

    match filter.operator {
        FilterOperator::Contains => {
            let Some(needle) = json_as_lower_text(&filter.value) else {
                return Err(invalid_argument(
                    "contains requires a scalar comparison value",
                ));
            };
            Ok(retain(dataset, column, |value| {
                value
                    .as_text()
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            }))
        }
        FilterOperator::GreaterThan | FilterOperator::LessThan => {
            if kind == ColumnKind::Boolean {
                return Err(execution(format!(
                    "column '{}' is boolean and has no ordering",
                    filter.column
                )));
            }
            let Some(target) = coerce_json(&filter.value, kind) else {
                return Err(execution(format!(
                    "cannot compare column '{}' against {}",
                    filter.column, filter.value
                )));
            };
            let want = if filter.operator == FilterOperator::GreaterThan {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Less
            };
            Ok(retain(dataset, column, |value| {
                value.compare(&target) == Some(want)
            }))
        }
        FilterOperator::Equals | FilterOperator::In => {
            let raw = normalized_list(&filter.value);
            let targets: Vec<Value> = raw
                .iter()
                .filter_map(|v| coerce_json(v, kind))
                .collect();
            let native = retain(dataset, column, |value| targets.contains(value));
            if !native.is_empty() {
                return Ok(native);
            }
            // Zero native matches: retry as case-insensitive text. Deliberate
            // fallback, not an optimization.
            let needles: Vec<String> = raw.iter().filter_map(json_as_lower_text).collect();
            Ok(retain(dataset, column, |value| {
                value
                    .as_text()
                    .map(|text| needles.contains(&text.to_lowercase()))
                    .unwrap_or(false)
            }))
        }
        FilterOperator::NotEquals | FilterOperator::NotIn => {
            let raw = normalized_list(&filter.value);
            let targets: Vec<Value> = raw
                .iter()
                .filter_map(|v| coerce_json(v, kind))
                .collect();
            // Null is never equal to anything, so it survives the negative
            // operators.
            Ok(retain(dataset, column, |value| {
                value.is_null() || !targets.contains(value)
            }))
        }
    }
}

/// A scalar comparison value is treated as a single-element list.
fn normalized_list(raw: &serde_json::Value) -> Vec<serde_json::Value> {
    match raw {
        serde_json::Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn retain(dataset: &Dataset, column: usize, keep: impl Fn(&Value) -> bool) -> Vec<Feature> {
    dataset
        .features
        .iter()
        .filter(|feature| keep(&feature.values[column]))
        .cloned()
        .collect()
}
