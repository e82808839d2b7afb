use super::*;
use crate::api::CombinedFields;
use serde_json::json;
use std::collections::HashMap;

fn row_from(value: Value) -> Map<String, Value> {
    value.as_object().expect("row must be an object").clone()
}

fn combined_config(source_fields: &[&str], weights: &[(&str, f32)]) -> VectorColumnConfig {
    VectorColumnConfig {
        table: "products".to_string(),
        column: "embedding".to_string(),
        model: "all-MiniLM-L6-v2".to_string(),
        combined_fields: Some(CombinedFields {
            source_fields: source_fields.iter().map(|f| (*f).to_string()).collect(),
            weights: weights
                .iter()
                .map(|(f, w)| ((*f).to_string(), *w))
                .collect::<HashMap<_, _>>(),
        }),
    }
}

#[test]
fn field_inputs_built_from_populated_sources() {
    let row = row_from(json!({
        "title": "Red Shoes",
        "description": "",
        "image": "https://example.com/shoe.png",
    }));
    let config = combined_config(&["title", "description", "image"], &[("title", 2.0)]);

    let fields = build_field_inputs(&row, &config);
    assert_eq!(fields.len(), 2);

    assert_eq!(fields[0].content, "Red Shoes");
    assert_eq!(fields[0].kind, ContentKind::Text);
    assert_eq!(fields[0].weight, 2.0);
    assert_eq!(fields[0].model_name, "all-MiniLM-L6-v2");

    assert_eq!(fields[1].content, "https://example.com/shoe.png");
    assert_eq!(fields[1].kind, ContentKind::Image);
    assert_eq!(fields[1].weight, 1.0);
}

#[test]
fn field_inputs_empty_when_no_source_has_content() {
    let row = row_from(json!({ "title": "", "other": "ignored" }));
    let config = combined_config(&["title", "description"], &[]);

    assert!(build_field_inputs(&row, &config).is_empty());
}

#[test]
fn field_inputs_serialize_structured_values() {
    let row = row_from(json!({ "tags": ["red", "shoes"] }));
    let config = combined_config(&["tags"], &[]);

    let fields = build_field_inputs(&row, &config);
    assert_eq!(fields[0].content, r#"["red","shoes"]"#);
}

#[test]
fn single_source_skips_the_vector_column_itself() {
    let row = row_from(json!({
        "embedding": [0.1, 0.2],
        "title": "Red Shoes",
    }));

    let (content, kind) = pick_single_source(&row, "embedding").expect("should find source");
    assert_eq!(content, "Red Shoes");
    assert_eq!(kind, ContentKind::Text);
}

#[test]
fn single_source_none_when_row_otherwise_empty() {
    let row = row_from(json!({ "embedding": [0.1], "title": "" }));
    assert!(pick_single_source(&row, "embedding").is_none());
}

#[test]
fn single_source_classifies_images() {
    let row = row_from(json!({ "photo": "https://example.com/p.jpg" }));
    let (content, kind) = pick_single_source(&row, "embedding").expect("should find source");
    assert_eq!(content, "https://example.com/p.jpg");
    assert_eq!(kind, ContentKind::Image);
}

#[test]
fn row_content_stringification() {
    let row = row_from(json!({
        "s": "text",
        "n": 42,
        "b": true,
        "o": {"a": 1},
        "null": null,
        "blank": "   ",
    }));

    assert_eq!(row_content(&row, "s").as_deref(), Some("text"));
    assert_eq!(row_content(&row, "n").as_deref(), Some("42"));
    assert_eq!(row_content(&row, "b").as_deref(), Some("true"));
    assert_eq!(row_content(&row, "o").as_deref(), Some(r#"{"a":1}"#));
    assert_eq!(row_content(&row, "null"), None);
    assert_eq!(row_content(&row, "blank"), None);
    assert_eq!(row_content(&row, "missing"), None);
}
