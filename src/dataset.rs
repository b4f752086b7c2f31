//! In-memory tabular datasets and the vector-file loaders.
//!
//! A dataset is a schema plus rows; each row carries values aligned with the
//! schema columns and an optional geometry. Loaders infer column kinds so the
//! filter coercion policy has something concrete to coerce against.

use crate::error::{csv_error, execution, invalid_argument, io_error, serde_error, EngineResult};
use crate::geom::Geometry;
use crate::value::{ColumnKind, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reference system assumed when a source does not declare one.
pub const DEFAULT_CRS: &str = "EPSG:4326";

/// One named, typed column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column list for a table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// One row: attribute values aligned with the schema, plus geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub values: Vec<Value>,
    pub geometry: Option<Geometry>,
}

/// A tabular/geometric dataset held in memory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub schema: Schema,
    pub crs: String,
    pub features: Vec<Feature>,
}

impl Dataset {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            crs: DEFAULT_CRS.to_string(),
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Appends a row, enforcing schema alignment.
    pub fn push_feature(
        &mut self,
        values: Vec<Value>,
        geometry: Option<Geometry>,
    ) -> EngineResult<()> {
        if values.len() != self.schema.columns.len() {
            return Err(execution(format!(
                "row has {} values but the schema has {} columns",
                values.len(),
                self.schema.columns.len()
            )));
        }
        self.features.push(Feature { values, geometry });
        Ok(())
    }

    /// Copy of this dataset with no rows, same schema and CRS.
    pub fn empty_like(&self) -> Dataset {
        Dataset {
            schema: self.schema.clone(),
            crs: self.crs.clone(),
            features: Vec::new(),
        }
    }
}

/// Loads a vector file, dispatching on the file extension.
pub fn load_vector_file(path: &Path) -> EngineResult<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "geojson" | "json" => load_geojson(path),
        "csv" => load_csv(path),
        other => Err(invalid_argument(format!(
            "unsupported dataset format '{other}' for {}",
            path.display()
        ))),
    }
}

#[derive(Deserialize)]
struct GeoJsonCollection {
    #[serde(default)]
    features: Vec<GeoJsonFeature>,
}

#[derive(Deserialize)]
struct GeoJsonFeature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Parses a GeoJSON FeatureCollection.
///
/// Column kinds are inferred across all features: integers widen to float on
/// mixed numeric columns, any other mix collapses to text. Properties absent
/// from a feature become null.
pub fn load_geojson(path: &Path) -> EngineResult<Dataset> {
    let raw = std::fs::read_to_string(path).map_err(io_error)?;
    let collection: GeoJsonCollection = serde_json::from_str(&raw).map_err(serde_error)?;

    let mut names: Vec<String> = Vec::new();
    let mut kinds: Vec<Option<ColumnKind>> = Vec::new();
    for feature in &collection.features {
        let Some(props) = &feature.properties else {
            continue;
        };
        for (name, value) in props {
            let idx = match names.iter().position(|n| n == name) {
                Some(idx) => idx,
                None => {
                    names.push(name.clone());
                    kinds.push(None);
                    names.len() - 1
                }
            };
            kinds[idx] = unify_kind(kinds[idx], value);
        }
    }

    let columns = names
        .into_iter()
        .zip(kinds)
        .map(|(name, kind)| Column {
            name,
            kind: kind.unwrap_or(ColumnKind::Text),
        })
        .collect();
    let mut dataset = Dataset::new(Schema::new(columns));

    for feature in collection.features {
        let props = feature.properties.unwrap_or_default();
        let values = dataset
            .schema
            .columns
            .iter()
            .map(|col| match props.get(&col.name) {
                Some(raw) => json_to_value(raw, col.kind),
                None => Value::Null,
            })
            .collect();
        dataset.push_feature(values, feature.geometry)?;
    }
    Ok(dataset)
}

/// Parses a headed CSV file with per-column kind inference.
///
/// Inference order matches the coercion policy: integer, float, boolean,
/// text. Empty cells are null and do not vote.
pub fn load_csv(path: &Path) -> EngineResult<Dataset> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        records.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    let columns = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Column {
            name: name.clone(),
            kind: infer_csv_kind(records.iter().filter_map(|r| r.get(idx))),
        })
        .collect();
    let mut dataset = Dataset::new(Schema::new(columns));

    for record in &records {
        let values = dataset
            .schema
            .columns
            .iter()
            .enumerate()
            .map(|(idx, col)| parse_csv_cell(record.get(idx).map(String::as_str), col.kind))
            .collect();
        dataset.push_feature(values, None)?;
    }
    Ok(dataset)
}

fn unify_kind(current: Option<ColumnKind>, raw: &serde_json::Value) -> Option<ColumnKind> {
    use serde_json::Value as Json;
    let observed = match raw {
        Json::Null => return current,
        Json::Bool(_) => ColumnKind::Boolean,
        Json::Number(n) if n.as_i64().is_some() => ColumnKind::Integer,
        Json::Number(_) => ColumnKind::Float,
        _ => ColumnKind::Text,
    };
    Some(match current {
        None => observed,
        Some(kind) if kind == observed => kind,
        Some(ColumnKind::Integer) if observed == ColumnKind::Float => ColumnKind::Float,
        Some(ColumnKind::Float) if observed == ColumnKind::Integer => ColumnKind::Float,
        Some(_) => ColumnKind::Text,
    })
}

fn json_to_value(raw: &serde_json::Value, kind: ColumnKind) -> Value {
    use serde_json::Value as Json;
    match raw {
        Json::Null => Value::Null,
        Json::Bool(b) if kind == ColumnKind::Boolean => Value::Bool(*b),
        Json::Number(n) if kind == ColumnKind::Integer => {
            n.as_i64().map(Value::Int).unwrap_or(Value::Null)
        }
        Json::Number(n) if kind == ColumnKind::Float => {
            n.as_f64().map(Value::Float).unwrap_or(Value::Null)
        }
        Json::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

fn infer_csv_kind<'a>(cells: impl Iterator<Item = &'a String>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let observed = if cell.parse::<i64>().is_ok() {
            ColumnKind::Integer
        } else if cell.parse::<f64>().is_ok() {
            ColumnKind::Float
        } else if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
            ColumnKind::Boolean
        } else {
            ColumnKind::Text
        };
        kind = Some(match kind {
            None => observed,
            Some(k) if k == observed => k,
            Some(ColumnKind::Integer) if observed == ColumnKind::Float => ColumnKind::Float,
            Some(ColumnKind::Float) if observed == ColumnKind::Integer => ColumnKind::Float,
            Some(_) => ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Text)
}

fn parse_csv_cell(cell: Option<&str>, kind: ColumnKind) -> Value {
    let Some(cell) = cell else {
        return Value::Null;
    };
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Integer => cell
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or(Value::Null),
        ColumnKind::Float => cell
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::Null),
        ColumnKind::Boolean => Value::Bool(cell.eq_ignore_ascii_case("true")),
        ColumnKind::Text => Value::Text(cell.to_string()),
    }
}
