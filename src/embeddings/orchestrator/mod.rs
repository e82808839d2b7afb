#[cfg(test)]
mod tests;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::{TableColumn, VectorColumnConfig};
use crate::embeddings::client::{ContentKind, EmbeddingClient, FieldInput, classify_content};

/// Fills the vector columns of an assembled row by driving the embedding
/// service. Runs after the scalar destinations are populated.
///
/// Embedding failures are swallowed per column: the row is inserted
/// without that vector rather than failing the batch.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingOrchestrator<'a> {
    client: &'a EmbeddingClient,
}

impl<'a> EmbeddingOrchestrator<'a> {
    #[inline]
    pub fn new(client: &'a EmbeddingClient) -> Self {
        Self { client }
    }

    /// Generate and inject a vector for every configured vector column
    /// with contributing content in the row.
    #[inline]
    pub fn populate_vectors(
        &self,
        row: &mut Map<String, Value>,
        configs: &[VectorColumnConfig],
        columns: &[TableColumn],
    ) {
        for config in configs {
            let is_vector_column = columns
                .iter()
                .any(|column| column.field == config.column && column.is_vector());
            if !is_vector_column {
                // Bindings on non-vector columns only feed sibling vector
                // columns; there is nothing to generate for them.
                continue;
            }

            match self.generate_vector(row, config) {
                Some(vector) => {
                    row.insert(config.column.clone(), Value::from(vector));
                }
                None => {
                    debug!("No vector generated for column {}", config.column);
                }
            }
        }
    }

    fn generate_vector(
        &self,
        row: &Map<String, Value>,
        config: &VectorColumnConfig,
    ) -> Option<Vec<f32>> {
        let result = if config.combined_fields.is_some() {
            let fields = build_field_inputs(row, config);
            if fields.is_empty() {
                debug!(
                    "Skipping vector column {}: no source fields with content",
                    config.column
                );
                return None;
            }
            self.client.embed_multi_field(&fields, true)
        } else {
            let (content, kind) = pick_single_source(row, &config.column)?;
            match kind {
                ContentKind::Image => self.client.embed_image(&[content], &config.model, true),
                ContentKind::Text => self.client.embed_text(&[content], &config.model, true),
            }
        };

        match result {
            Ok(embeddings) => {
                let vector = embeddings.into_iter().next();
                if vector.is_none() {
                    warn!(
                        "Embedding service returned no vectors for column {}",
                        config.column
                    );
                }
                vector
            }
            Err(e) => {
                warn!(
                    "Embedding generation failed for column {}: {}",
                    config.column, e
                );
                None
            }
        }
    }
}

/// Weighted inputs for a combined embedding: one per configured source
/// field with non-empty content in the row
fn build_field_inputs(row: &Map<String, Value>, config: &VectorColumnConfig) -> Vec<FieldInput> {
    let Some(combined) = &config.combined_fields else {
        return Vec::new();
    };

    combined
        .source_fields
        .iter()
        .filter_map(|field| {
            let content = row_content(row, field)?;
            Some(FieldInput {
                content: content.clone(),
                kind: classify_content(&content),
                weight: combined.weight_for(field),
                model_name: config.model.clone(),
            })
        })
        .collect()
}

/// First populated field of the row other than the vector column itself
fn pick_single_source(row: &Map<String, Value>, vector_column: &str) -> Option<(String, ContentKind)> {
    row.iter()
        .filter(|(key, _)| key.as_str() != vector_column)
        .find_map(|(key, _)| row_content(row, key))
        .map(|content| {
            let kind = classify_content(&content);
            (content, kind)
        })
}

/// Stringified, non-empty content of one row field
fn row_content(row: &Map<String, Value>, field: &str) -> Option<String> {
    let content = match row.get(field)? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        // Objects and arrays are serialized back to JSON text for embedding.
        other => other.to_string(),
    };

    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}
