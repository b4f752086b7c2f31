use geostage::executors::apply_filters;
use geostage::{Column, ColumnKind, Dataset, ErrorKind, Filter, FilterOperator, Schema, Value};
use proptest::prelude::*;
use serde_json::json;

fn text_column(name: &str, cells: &[Option<&str>]) -> Dataset {
    let schema = Schema::new(vec![Column {
        name: name.to_string(),
        kind: ColumnKind::Text,
    }]);
    let mut dataset = Dataset::new(schema);
    for cell in cells {
        let value = match cell {
            Some(text) => Value::Text(text.to_string()),
            None => Value::Null,
        };
        dataset.push_feature(vec![value], None).expect("push");
    }
    dataset
}

fn int_column(name: &str, cells: &[Option<i64>]) -> Dataset {
    let schema = Schema::new(vec![Column {
        name: name.to_string(),
        kind: ColumnKind::Integer,
    }]);
    let mut dataset = Dataset::new(schema);
    for cell in cells {
        let value = match cell {
            Some(n) => Value::Int(*n),
            None => Value::Null,
        };
        dataset.push_feature(vec![value], None).expect("push");
    }
    dataset
}

fn filter(column: &str, operator: FilterOperator, value: serde_json::Value) -> Filter {
    Filter {
        column: column.to_string(),
        operator,
        value,
    }
}

#[test]
fn equals_and_not_equals_partition_rows() {
    let data = text_column("status", &[Some("active"), Some("inactive"), None]);
    let eq = apply_filters(
        data.clone(),
        &[filter("status", FilterOperator::Equals, json!("active"))],
    )
    .expect("equals");
    assert_eq!(eq.len(), 1);

    // Null is never equal, so it survives the negative operator.
    let ne = apply_filters(
        data,
        &[filter("status", FilterOperator::NotEquals, json!("active"))],
    )
    .expect("not equals");
    assert_eq!(ne.len(), 2);
}

#[test]
fn chain_is_strictly_conjunctive() {
    let data = int_column("n", &[Some(1), Some(5), Some(9)]);
    let out = apply_filters(
        data,
        &[
            filter("n", FilterOperator::GreaterThan, json!(2)),
            filter("n", FilterOperator::LessThan, json!(8)),
        ],
    )
    .expect("chain");
    assert_eq!(out.len(), 1);
    assert_eq!(out.features[0].values[0], Value::Int(5));
}

#[test]
fn ordering_on_boolean_column_is_an_error() {
    let schema = Schema::new(vec![Column {
        name: "flag".to_string(),
        kind: ColumnKind::Boolean,
    }]);
    let mut data = Dataset::new(schema);
    data.push_feature(vec![Value::Bool(true)], None).expect("push");

    let err = apply_filters(
        data,
        &[filter("flag", FilterOperator::GreaterThan, json!(true))],
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Execution);
}

#[test]
fn ordering_on_text_is_lexicographic() {
    let data = text_column("name", &[Some("alder"), Some("birch"), Some("cedar")]);
    let out = apply_filters(
        data,
        &[filter("name", FilterOperator::GreaterThan, json!("b"))],
    )
    .expect("ordinal");
    assert_eq!(out.len(), 2);
}

#[test]
fn contains_is_case_insensitive_and_skips_nulls() {
    let data = text_column("label", &[Some("Water Main"), Some("sewer"), None]);
    let out = apply_filters(
        data,
        &[filter("label", FilterOperator::Contains, json!("WATER"))],
    )
    .expect("contains");
    assert_eq!(out.len(), 1);
}

#[test]
fn native_miss_falls_back_to_case_insensitive_text() {
    let data = text_column("status", &[Some("Existing"), Some("Private")]);
    let out = apply_filters(
        data,
        &[filter("status", FilterOperator::Equals, json!("existing"))],
    )
    .expect("fallback equals");
    assert_eq!(out.len(), 1);
}

#[test]
fn fallback_does_not_widen_a_native_hit() {
    // One exact match exists, so the case-insensitive retry must not run.
    let data = text_column("status", &[Some("active"), Some("ACTIVE")]);
    let out = apply_filters(
        data,
        &[filter("status", FilterOperator::Equals, json!("active"))],
    )
    .expect("native equals");
    assert_eq!(out.len(), 1);
}

#[test]
fn in_coerces_values_to_the_column_kind() {
    let data = int_column("id", &[Some(5), Some(6), None]);
    let out = apply_filters(
        data,
        &[filter("id", FilterOperator::In, json!(["5", 7]))],
    )
    .expect("in");
    assert_eq!(out.len(), 1);
    assert_eq!(out.features[0].values[0], Value::Int(5));
}

#[test]
fn not_in_keeps_nulls() {
    let data = text_column("status", &[Some("active"), None]);
    let out = apply_filters(
        data,
        &[filter("status", FilterOperator::NotIn, json!(["active"]))],
    )
    .expect("not in");
    assert_eq!(out.len(), 1);
    assert!(out.features[0].values[0].is_null());
}

proptest! {
    /// `in` with a scalar behaves exactly like `in` with the singleton list.
    #[test]
    fn scalar_in_matches_singleton_list(
        cells in prop::collection::vec("[a-d]", 0..24),
        needle in "[a-d]",
    ) {
        let rows: Vec<Option<&str>> = cells.iter().map(|s| Some(s.as_str())).collect();
        let scalar = apply_filters(
            text_column("tag", &rows),
            &[filter("tag", FilterOperator::In, json!(needle))],
        )
        .expect("scalar in");
        let singleton = apply_filters(
            text_column("tag", &rows),
            &[filter("tag", FilterOperator::In, json!([needle]))],
        )
        .expect("singleton in");
        prop_assert_eq!(scalar.features, singleton.features);
    }

    /// A conjunctive chain never grows the row set.
    #[test]
    fn filters_only_narrow(
        cells in prop::collection::vec(proptest::option::of(-50i64..50), 0..32),
        threshold in -50i64..50,
    ) {
        let data = int_column("n", &cells);
        let total = data.len();
        let out = apply_filters(
            data,
            &[filter("n", FilterOperator::GreaterThan, json!(threshold))],
        )
        .expect("gt");
        prop_assert!(out.len() <= total);
    }
}
