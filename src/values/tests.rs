use super::*;

fn column(field: &str, column_type: ColumnType) -> TableColumn {
    TableColumn {
        field: field.to_string(),
        column_type,
        properties: None,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[test]
fn no_contributing_values_omits_key() {
    let col = column("title", ColumnType::Text);
    assert_eq!(combine_values(Some(&col), &[]), None);
}

#[test]
fn single_value_coercion() {
    let text = column("title", ColumnType::Text);
    assert_eq!(
        combine_values(Some(&text), &strings(&["hello"])),
        Some(FieldValue::Text("hello".to_string()))
    );

    let int = column("count", ColumnType::Integer);
    assert_eq!(
        combine_values(Some(&int), &strings(&["42"])),
        Some(FieldValue::Integer(42))
    );
    assert_eq!(
        combine_values(Some(&int), &strings(&["3.7"])),
        Some(FieldValue::Integer(3))
    );
    assert_eq!(
        combine_values(Some(&int), &strings(&["nope"])),
        Some(FieldValue::Integer(0))
    );

    let float = column("price", ColumnType::Float);
    assert_eq!(
        combine_values(Some(&float), &strings(&["9.5"])),
        Some(FieldValue::Float(9.5))
    );
    assert_eq!(
        combine_values(Some(&float), &strings(&["nope"])),
        Some(FieldValue::Float(0.0))
    );

    let boolean = column("active", ColumnType::Bool);
    assert_eq!(
        combine_values(Some(&boolean), &strings(&["TRUE"])),
        Some(FieldValue::Bool(true))
    );
    assert_eq!(
        combine_values(Some(&boolean), &strings(&["1"])),
        Some(FieldValue::Bool(true))
    );
    assert_eq!(
        combine_values(Some(&boolean), &strings(&["yes"])),
        Some(FieldValue::Bool(false))
    );
}

#[test]
fn single_value_coercion_is_idempotent() {
    // Re-running the combiner over its own rendered output changes nothing.
    let int = column("count", ColumnType::Integer);
    let first = combine_values(Some(&int), &strings(&["42"])).expect("should combine");
    let FieldValue::Integer(n) = first else {
        panic!("expected integer");
    };
    let second = combine_values(Some(&int), &[n.to_string()]).expect("should combine");
    assert_eq!(second, FieldValue::Integer(42));
}

#[test]
fn json_single_value_kept_as_parsed_json() {
    let json = column("meta", ColumnType::Json);
    assert_eq!(
        combine_values(Some(&json), &strings(&[r#"{"a":1}"#])),
        Some(FieldValue::Json(serde_json::json!({"a": 1})))
    );
    // Non-JSON text stays a plain string value.
    assert_eq!(
        combine_values(Some(&json), &strings(&["plain"])),
        Some(FieldValue::Json(Value::String("plain".to_string())))
    );
}

#[test]
fn multi_value_integer_sum() {
    let int = column("count", ColumnType::Integer);
    assert_eq!(
        combine_values(Some(&int), &strings(&["3", "4"])),
        Some(FieldValue::Integer(7))
    );
    assert_eq!(
        combine_values(Some(&int), &strings(&["3", "junk"])),
        Some(FieldValue::Integer(3))
    );

    let bigint = column("total", ColumnType::Bigint);
    assert_eq!(
        combine_values(Some(&bigint), &strings(&["10000000000", "1"])),
        Some(FieldValue::Integer(10_000_000_001))
    );
}

#[test]
fn multi_value_float_sum() {
    let float = column("price", ColumnType::Float);
    assert_eq!(
        combine_values(Some(&float), &strings(&["1.5", "2.25"])),
        Some(FieldValue::Float(3.75))
    );
}

#[test]
fn multi_value_bool_any_truthy() {
    let boolean = column("active", ColumnType::Bool);
    assert_eq!(
        combine_values(Some(&boolean), &strings(&["true", "0"])),
        Some(FieldValue::Bool(true))
    );
    assert_eq!(
        combine_values(Some(&boolean), &strings(&["false", "0"])),
        Some(FieldValue::Bool(false))
    );
}

#[test]
fn multi_value_text_space_joined() {
    let text = column("title", ColumnType::Text);
    assert_eq!(
        combine_values(Some(&text), &strings(&["foo", "bar"])),
        Some(FieldValue::Text("foo bar".to_string()))
    );
    // Empty contributions are dropped before joining.
    assert_eq!(
        combine_values(Some(&text), &strings(&["foo", "  ", "bar"])),
        Some(FieldValue::Text("foo bar".to_string()))
    );
}

#[test]
fn multi_value_json_collects_raw_values() {
    let json = column("meta", ColumnType::Json);
    assert_eq!(
        combine_values(Some(&json), &strings(&["1", "2"])),
        Some(FieldValue::Json(serde_json::json!(["1", "2"])))
    );
}

#[test]
fn missing_column_metadata_treated_as_text() {
    assert_eq!(
        combine_values(None, &strings(&["a", "b"])),
        Some(FieldValue::Text("a b".to_string()))
    );
}

#[test]
fn unknown_column_type_treated_as_text() {
    let other = column("tags", ColumnType::Other("multi64".to_string()));
    assert_eq!(
        combine_values(Some(&other), &strings(&["a", "b"])),
        Some(FieldValue::Text("a b".to_string()))
    );
}

#[test]
fn vector_literals_dropped_for_scalar_destinations() {
    let text = column("title", ColumnType::Text);
    assert_eq!(combine_values(Some(&text), &strings(&["[1,2,3]"])), None);
    assert_eq!(
        combine_values(Some(&text), &strings(&["[1,2,3]", "hello"])),
        Some(FieldValue::Text("hello".to_string()))
    );
}

#[test]
fn vector_column_never_written_directly() {
    let vector = column("embedding", ColumnType::FloatVector);
    assert_eq!(combine_values(Some(&vector), &strings(&["[1,2,3]"])), None);
    assert_eq!(combine_values(Some(&vector), &strings(&["hello"])), None);
}

#[test]
fn field_value_to_json() {
    assert_eq!(
        Value::from(FieldValue::Text("x".to_string())),
        Value::String("x".to_string())
    );
    assert_eq!(Value::from(FieldValue::Integer(3)), serde_json::json!(3));
    assert_eq!(Value::from(FieldValue::Float(1.5)), serde_json::json!(1.5));
    assert_eq!(Value::from(FieldValue::Bool(true)), Value::Bool(true));
    assert_eq!(
        Value::from(FieldValue::Json(serde_json::json!([1, 2]))),
        serde_json::json!([1, 2])
    );
}
