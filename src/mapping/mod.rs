
pub mod editor;

pub use editor::{EditOutcome, edit_mappings};

use tracing::debug;

use crate::api::TableColumn;
use crate::ingest::is_vector_literal;

/// Mapping from one source field of an upload to a destination column.
///
/// Several mappings may share one destination; the value combiner merges
/// their contributions at import time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub source_field: String,
    pub destination: String,
    pub enabled: bool,
}

impl FieldMapping {
    #[inline]
    pub fn unmapped(source_field: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            destination: String::new(),
            enabled: false,
        }
    }

    /// Eligible for import: enabled with a non-empty destination
    #[inline]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.destination.is_empty()
    }

    /// Reassign the destination column. Clearing the destination also
    /// disables the mapping; assigning one enables it.
    #[inline]
    pub fn set_destination(&mut self, destination: impl Into<String>) {
        self.destination = destination.into();
        self.enabled = !self.destination.is_empty();
    }

    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Propose one mapping per source header using the destination table's
/// column metadata and a sample row for type sniffing.
#[inline]
pub fn suggest_mappings(
    headers: &[String],
    sample_row: Option<&[String]>,
    columns: &[TableColumn],
) -> Vec<FieldMapping> {
    headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let sample = sample_row.and_then(|row| row.get(index)).map(String::as_str);
            let destination = suggest_destination(header, sample, columns);

            let mut mapping = FieldMapping::unmapped(header.clone());
            if let Some(destination) = destination {
                debug!("Suggested mapping: {} -> {}", header, destination);
                mapping.set_destination(destination);
            }
            mapping
        })
        .collect()
}

/// Pick a destination for one header. A vector-literal sample targets the
/// first vector column; otherwise the column name is matched against the
/// header case-insensitively, with an exact match preferred over a
/// substring match in either direction.
fn suggest_destination(
    header: &str,
    sample: Option<&str>,
    columns: &[TableColumn],
) -> Option<String> {
    if sample.is_some_and(is_vector_literal) {
        return columns
            .iter()
            .find(|column| column.is_vector())
            .map(|column| column.field.clone());
    }

    let header_lower = header.to_lowercase();

    let exact = columns
        .iter()
        .find(|column| column.field.to_lowercase() == header_lower);
    if let Some(column) = exact {
        return Some(column.field.clone());
    }

    columns
        .iter()
        .find(|column| {
            let field_lower = column.field.to_lowercase();
            field_lower.contains(&header_lower) || header_lower.contains(&field_lower)
        })
        .map(|column| column.field.clone())
}

/// Mappings eligible for import, in source order
#[inline]
pub fn active_mappings(mappings: &[FieldMapping]) -> Vec<&FieldMapping> {
    mappings.iter().filter(|m| m.is_active()).collect()
}
