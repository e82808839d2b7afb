use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file_with(name_suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(name_suffix)
        .tempfile()
        .expect("should create temp file");
    file.write_all(content.as_bytes())
        .expect("should write temp file");
    file
}

#[test]
fn format_from_file_name() {
    assert_eq!(
        SourceFormat::from_file_name("data.csv").expect("csv"),
        SourceFormat::Csv
    );
    assert_eq!(
        SourceFormat::from_file_name("data.TSV").expect("tsv"),
        SourceFormat::Tsv
    );
    assert_eq!(
        SourceFormat::from_file_name("data.txt").expect("txt"),
        SourceFormat::Tsv
    );
    assert_eq!(
        SourceFormat::from_file_name("data.json").expect("json"),
        SourceFormat::Json
    );
    assert!(SourceFormat::from_file_name("data.xlsx").is_err());
    assert!(SourceFormat::from_file_name("noextension").is_err());
}

#[test]
fn csv_parsing() {
    let parsed = parse_text(
        "name, age ,city\nAda, 36 ,London\n\nAlan,41,Manchester\n",
        SourceFormat::Csv,
        None,
    )
    .expect("should parse csv");

    assert_eq!(parsed.headers, vec!["name", "age", "city"]);
    assert_eq!(parsed.total_rows, 2);
    assert_eq!(parsed.rows[0], vec!["Ada", "36", "London"]);
    assert_eq!(parsed.rows[1], vec!["Alan", "41", "Manchester"]);
    assert_eq!(parsed.format, SourceFormat::Csv);
}

#[test]
fn tsv_parsing() {
    let parsed = parse_text(
        "name\tbio\nAda\tmathematician\n",
        SourceFormat::Tsv,
        None,
    )
    .expect("should parse tsv");

    assert_eq!(parsed.headers, vec!["name", "bio"]);
    assert_eq!(parsed.rows, vec![vec!["Ada", "mathematician"]]);
}

#[test]
fn csv_with_quoted_fields() {
    let parsed = parse_text(
        "name,bio\nAda,\"math, logic\"\n",
        SourceFormat::Csv,
        None,
    )
    .expect("should parse csv");

    assert_eq!(parsed.rows[0], vec!["Ada", "math, logic"]);
}

#[test]
fn preview_is_capped_but_total_is_not() {
    let mut text = "id\n".to_string();
    for i in 0..250 {
        text.push_str(&format!("{}\n", i));
    }

    let parsed = parse_text(&text, SourceFormat::Csv, Some(PREVIEW_ROWS))
        .expect("should parse csv");
    assert_eq!(parsed.rows.len(), PREVIEW_ROWS);
    assert_eq!(parsed.total_rows, 250);

    let full = parse_text(&text, SourceFormat::Csv, None).expect("should parse csv");
    assert_eq!(full.rows.len(), 250);
}

#[test]
fn empty_file_rejected() {
    assert!(matches!(
        parse_text("   \n  ", SourceFormat::Csv, None),
        Err(UploadError::EmptyFile)
    ));
}

#[test]
fn json_array_of_objects() {
    let parsed = parse_text(
        r#"[{"name":"Ada","tags":["math"],"score":9.5},{"name":"Alan"}]"#,
        SourceFormat::Json,
        None,
    )
    .expect("should parse json");

    assert_eq!(parsed.headers, vec!["name", "tags", "score"]);
    assert_eq!(parsed.total_rows, 2);
    assert_eq!(parsed.rows[0], vec!["Ada", r#"["math"]"#, "9.5"]);
    // Keys missing from later elements yield empty strings.
    assert_eq!(parsed.rows[1], vec!["Alan", "", ""]);
}

#[test]
fn json_single_object() {
    let parsed = parse_text(
        r#"{"name":"Ada","age":36}"#,
        SourceFormat::Json,
        None,
    )
    .expect("should parse json");

    assert_eq!(parsed.headers, vec!["name", "age"]);
    assert_eq!(parsed.total_rows, 1);
    assert_eq!(parsed.rows, vec![vec!["Ada", "36"]]);
}

#[test]
fn json_nested_objects_serialized_back() {
    let parsed = parse_text(
        r#"[{"name":"Ada","address":{"city":"London"}}]"#,
        SourceFormat::Json,
        None,
    )
    .expect("should parse json");

    assert_eq!(parsed.rows[0][1], r#"{"city":"London"}"#);
}

#[test]
fn json_invalid_shapes_rejected() {
    assert!(matches!(
        parse_text("[]", SourceFormat::Json, None),
        Err(UploadError::InvalidJsonShape(_))
    ));
    assert!(matches!(
        parse_text("[1,2,3]", SourceFormat::Json, None),
        Err(UploadError::InvalidJsonShape(_))
    ));
    assert!(matches!(
        parse_text("42", SourceFormat::Json, None),
        Err(UploadError::InvalidJsonShape(_))
    ));
    assert!(matches!(
        parse_text("not json at all", SourceFormat::Json, None),
        Err(UploadError::InvalidJsonShape(_))
    ));
}

#[test]
fn unsupported_extension_rejected_from_path() {
    let file = temp_file_with(".parquet", "data");
    assert!(matches!(
        parse_preview(file.path(), MAX_FILE_SIZE_BYTES, PREVIEW_ROWS),
        Err(UploadError::UnsupportedFormat(_))
    ));
}

#[test]
fn oversize_file_rejected_before_parsing() {
    let file = temp_file_with(".csv", "a,b\n1,2\n");
    let result = parse_preview(file.path(), 4, PREVIEW_ROWS);
    assert!(matches!(result, Err(UploadError::SizeExceeded { .. })));
}

#[test]
fn parse_from_path_round_trip() {
    let file = temp_file_with(".csv", "name,age\nAda,36\n");
    let parsed =
        parse_preview(file.path(), MAX_FILE_SIZE_BYTES, PREVIEW_ROWS).expect("should parse file");
    assert_eq!(parsed.headers, vec!["name", "age"]);
    assert_eq!(parsed.total_rows, 1);
    assert_eq!(parsed.sample_row(), Some(&["Ada".to_string(), "36".to_string()][..]));
}

#[test]
fn vector_literal_detection() {
    assert!(is_vector_literal("[1,2,3]"));
    assert!(is_vector_literal("[0.5, -1.25]"));
    assert!(!is_vector_literal("[1,\"a\"]"));
    assert!(!is_vector_literal("not json"));
    assert!(!is_vector_literal("[]"));
    assert!(!is_vector_literal("{\"a\":1}"));
    assert!(!is_vector_literal(""));
}
