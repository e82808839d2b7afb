
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Metadata table holding embedding-model bindings for vector columns
const VECTOR_SETTINGS_TABLE: &str = "manager_vector_column_settings";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request rejected by server: {0}")]
    Rejected(String),

    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),

    #[error("invalid URL: {0}")]
    Url(String),
}

/// Declared type of a table column, as reported by `DESC <table>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Bigint,
    Float,
    Bool,
    Json,
    Timestamp,
    FloatVector,
    Other(String),
}

impl ColumnType {
    #[inline]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "text" | "string" => Self::Text,
            "integer" | "int" | "uint" => Self::Integer,
            "bigint" => Self::Bigint,
            "float" => Self::Float,
            "bool" | "boolean" => Self::Bool,
            "json" => Self::Json,
            "timestamp" => Self::Timestamp,
            "float_vector" => Self::FloatVector,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Bigint => "bigint",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Json => "json",
            Self::Timestamp => "timestamp",
            Self::FloatVector => "float_vector",
            Self::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// One column of a destination table
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub field: String,
    pub column_type: ColumnType,
    pub properties: Option<String>,
}

impl TableColumn {
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.column_type == ColumnType::FloatVector
    }
}

/// Embedding-model binding for a vector-capable column.
///
/// A binding may exist for a non-vector column as well; sibling vector
/// columns can source their content from it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VectorColumnConfig {
    pub table: String,
    pub column: String,
    pub model: String,
    pub combined_fields: Option<CombinedFields>,
}

/// Weighted multi-field sourcing for a combined embedding
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CombinedFields {
    #[serde(default)]
    pub source_fields: Vec<String>,
    #[serde(default)]
    pub weights: HashMap<String, f32>,
}

impl CombinedFields {
    #[inline]
    pub fn weight_for(&self, field: &str) -> f32 {
        self.weights.get(field).copied().unwrap_or(1.0)
    }
}

/// Client for the search engine's JSON HTTP interface
#[derive(Debug, Clone)]
pub struct SearchApiClient {
    base_url: Url,
    agent: ureq::Agent,
}

impl SearchApiClient {
    #[inline]
    pub fn new(base_url: Url) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Self { base_url, agent }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// List the names of all tables on the engine
    #[inline]
    pub fn list_tables(&self) -> Result<Vec<String>, ApiError> {
        let rows = self.sql_rows("SHOW TABLES")?;

        let tables = rows
            .iter()
            .filter_map(|row| {
                row.get("Table")
                    .or_else(|| row.get("Index"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect();

        Ok(tables)
    }

    /// Fetch the column metadata of a table via `DESC`
    #[inline]
    pub fn describe_table(&self, table: &str) -> Result<Vec<TableColumn>, ApiError> {
        let rows = self.sql_rows(&format!("DESC {}", table))?;

        let columns = rows
            .iter()
            .filter_map(|row| {
                let field = row.get("Field").and_then(Value::as_str)?;
                let raw_type = row.get("Type").and_then(Value::as_str)?;
                let properties = row
                    .get("Properties")
                    .and_then(Value::as_str)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string);

                Some(TableColumn {
                    field: field.to_string(),
                    column_type: ColumnType::parse(raw_type),
                    properties,
                })
            })
            .collect();

        Ok(columns)
    }

    /// Execute a CREATE TABLE statement
    #[inline]
    pub fn create_table(&self, sql: &str) -> Result<(), ApiError> {
        debug!("Executing: {}", sql);
        self.sql_rows(sql)?;
        Ok(())
    }

    /// Create one record. Called once per imported row.
    #[inline]
    pub fn insert(&self, table: &str, doc: &Map<String, Value>) -> Result<(), ApiError> {
        let url = self.join("insert")?;
        let body = json!({ "table": table, "doc": doc }).to_string();

        let response_text = self.post_json(&url, &body)?;

        let response: Value = serde_json::from_str(&response_text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        if let Some(error) = response.get("error") {
            if !error.is_null() {
                return Err(ApiError::Rejected(error.to_string()));
            }
        }

        Ok(())
    }

    /// Fetch embedding-model bindings for a table's columns.
    ///
    /// A missing or empty settings table means no vector columns are
    /// configured; only transport failures propagate.
    #[inline]
    pub fn list_vector_configs(&self, table: &str) -> Result<Vec<VectorColumnConfig>, ApiError> {
        let url = self.join("search")?;
        let body = json!({
            "table": VECTOR_SETTINGS_TABLE,
            "query": { "equals": { "tbl_name": table } },
            "limit": 1000,
        })
        .to_string();

        let response_text = match self.post_json(&url, &body) {
            Ok(text) => text,
            Err(ApiError::Rejected(message)) => {
                debug!(
                    "Vector settings lookup rejected (table likely absent): {}",
                    message
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let response: Value = serde_json::from_str(&response_text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        let hits = response
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let configs = hits
            .iter()
            .filter_map(|hit| parse_vector_config(hit.get("_source").unwrap_or(hit)))
            .collect();

        Ok(configs)
    }

    fn sql_rows(&self, query: &str) -> Result<Vec<Map<String, Value>>, ApiError> {
        let url = self.join("sql")?;

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("mode", "raw")
            .append_pair("query", query)
            .finish();

        debug!("SQL query: {}", query);

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send(&body)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(classify_ureq_error)?;

        let response: Value = serde_json::from_str(&response_text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        // Raw mode responds with an array of result sets; only the first matters here.
        let first = response
            .as_array()
            .and_then(|sets| sets.first())
            .ok_or_else(|| ApiError::InvalidResponse("empty result set".to_string()))?;

        if let Some(error) = first.get("error").and_then(Value::as_str) {
            if !error.is_empty() {
                return Err(ApiError::Rejected(error.to_string()));
            }
        }

        let rows = first
            .get("data")
            .and_then(Value::as_array)
            .map(|data| {
                data.iter()
                    .filter_map(|row| row.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }

    fn post_json(&self, url: &Url, body: &str) -> Result<String, ApiError> {
        self.agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(body)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(classify_ureq_error)
    }

    fn join(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Url(e.to_string()))
    }
}

fn parse_vector_config(source: &Value) -> Option<VectorColumnConfig> {
    let table = source.get("tbl_name").and_then(Value::as_str)?;
    let column = source.get("col_name").and_then(Value::as_str)?;
    let model = source.get("mdl_name").and_then(Value::as_str)?;

    let combined_fields = match source.get("combined_fields") {
        // Stored as JSON text inside a json column; tolerate both shapes.
        Some(Value::String(raw)) if !raw.trim().is_empty() => {
            match serde_json::from_str::<CombinedFields>(raw) {
                Ok(fields) => Some(fields),
                Err(e) => {
                    warn!(
                        "Ignoring malformed combined_fields for {}.{}: {}",
                        table, column, e
                    );
                    None
                }
            }
        }
        Some(value @ Value::Object(_)) => match serde_json::from_value(value.clone()) {
            Ok(fields) => Some(fields),
            Err(e) => {
                warn!(
                    "Ignoring malformed combined_fields for {}.{}: {}",
                    table, column, e
                );
                None
            }
        },
        _ => None,
    };

    let combined_fields = combined_fields.filter(|f: &CombinedFields| !f.source_fields.is_empty());

    Some(VectorColumnConfig {
        table: table.to_string(),
        column: column.to_string(),
        model: model.to_string(),
        combined_fields,
    })
}

pub(crate) fn classify_ureq_error(error: ureq::Error) -> ApiError {
    match error {
        ureq::Error::StatusCode(code) => ApiError::Rejected(format!("HTTP {}", code)),
        ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound
        | ureq::Error::Timeout(_)
        | ureq::Error::Io(_) => ApiError::Transport(error.to_string()),
        other => ApiError::Transport(other.to_string()),
    }
}
