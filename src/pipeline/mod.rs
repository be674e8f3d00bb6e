//! High-level import pipeline.
//!
//! Combines the individual steps into one call: decode and parse the raw
//! bytes, choose a mapping set (explicit file, then compatible stored
//! template, then a fresh auto-map of the headers), project the rows through
//! it, and validate required destination fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PipelineError;
use crate::mapping::{apply_mappings, auto_map_headers, EntityField, FieldMapping};
use crate::parser::{parse_bytes_auto, CsvParseError};
use crate::registry::MappingRegistry;
use crate::validation::validate_rows;

/// Options for the import pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Use a specific mapping file instead of stored templates or auto-mapping.
    pub mapping_path: Option<String>,

    /// Don't consult stored templates.
    pub no_cache: bool,

    /// Don't save a fresh auto-mapping as a template.
    pub no_save: bool,

    /// Registry directory override (default: `.assetbook/mappings`).
    pub registry_dir: Option<String>,

    /// Name used when saving a fresh mapping template.
    pub template_name: Option<String>,
}

/// Result of a complete import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    /// Records keyed by entity field, one per data row.
    pub records: Vec<Map<String, Value>>,

    /// The mapping set that was applied.
    pub mappings: Vec<FieldMapping>,

    /// Anomalies from parsing (column-count mismatches etc.).
    pub parse_errors: Vec<CsvParseError>,

    /// Required-field failures, in row-major order.
    pub validation_errors: Vec<CsvParseError>,

    /// Template ID if a stored template was used or created.
    pub template_id: Option<String>,

    /// CSV parsing metadata.
    pub csv_info: CsvInfo,
}

/// CSV file information.
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Run the full import pipeline over raw CSV bytes.
///
/// Mapping selection order:
/// 1. explicit mapping file from `options.mapping_path`
/// 2. best compatible stored template (unless `no_cache`)
/// 3. fresh auto-map of the headers against `entity_fields`, saved as a
///    template unless `no_save`
pub fn run_import(
    bytes: &[u8],
    entity_fields: &[EntityField],
    required_fields: &[String],
    options: &ImportOptions,
) -> Result<ImportResult, PipelineError> {
    let parsed = parse_bytes_auto(bytes)?;

    let csv_info = CsvInfo {
        encoding: parsed.encoding.clone(),
        delimiter: parsed.delimiter,
        headers: parsed.headers.clone(),
        row_count: parsed.total_rows,
    };

    if parsed.rows.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let (mappings, template_id) = select_mappings(&parsed.headers, entity_fields, options)?;

    let records = apply_mappings(&parsed.rows, &mappings);

    // validate on the mapped records so required fields are destination keys
    let mapped_rows: Vec<_> = records
        .iter()
        .map(|r| {
            r.iter()
                .map(|(k, v)| (k.clone(), value_to_string(v)))
                .collect::<std::collections::HashMap<String, String>>()
        })
        .collect();
    let validation_errors = validate_rows(&mapped_rows, required_fields);

    if let Some(ref id) = template_id {
        let mut registry = registry_for(options);
        registry.update_stats(id, validation_errors.is_empty());
    }

    Ok(ImportResult {
        records,
        mappings,
        parse_errors: parsed.errors,
        validation_errors,
        template_id,
        csv_info,
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn registry_for(options: &ImportOptions) -> MappingRegistry {
    match &options.registry_dir {
        Some(dir) => MappingRegistry::with_dir(dir),
        None => MappingRegistry::new(),
    }
}

/// Pick the mapping set for this header signature.
fn select_mappings(
    headers: &[String],
    entity_fields: &[EntityField],
    options: &ImportOptions,
) -> Result<(Vec<FieldMapping>, Option<String>), PipelineError> {
    // Option 1: explicit mapping file
    if let Some(ref path) = options.mapping_path {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::InvalidMapping(e.to_string()))?;
        let mappings: Vec<FieldMapping> = serde_json::from_str(&content)
            .map_err(|e| PipelineError::InvalidMapping(e.to_string()))?;
        return Ok((mappings, None));
    }

    // Option 2: best compatible stored template
    if !options.no_cache {
        let registry = registry_for(options);
        let compatible = registry.find_compatible(headers);
        if let Some((template, _score)) = compatible.first() {
            return Ok((template.mappings.clone(), Some(template.id.clone())));
        }
    }

    // Option 3: fresh auto-map
    let mappings = auto_map_headers(headers, entity_fields);
    let template_id = if !options.no_save && mappings.iter().any(|m| m.is_mapped()) {
        let name = options.template_name.as_deref().unwrap_or("auto-mapped");
        let mut registry = registry_for(options);
        registry
            .save(mappings.clone(), name, headers.to_vec())
            .ok()
    } else {
        None
    };

    Ok((mappings, template_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fields() -> Vec<EntityField> {
        vec![
            EntityField::new("name", "Asset Name"),
            EntityField::new("serial_number", "Serial Number"),
        ]
    }

    fn options_in(dir: &std::path::Path) -> ImportOptions {
        ImportOptions {
            registry_dir: Some(dir.to_string_lossy().to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_import_auto_maps_and_validates() {
        let dir = tempdir().unwrap();
        let csv = "Name,Serial Number\nConsole,SN-1\nDimmer,";
        let result = run_import(
            csv.as_bytes(),
            &fields(),
            &["serial_number".to_string()],
            &options_in(dir.path()),
        )
        .unwrap();

        assert_eq!(result.csv_info.row_count, 2);
        assert_eq!(result.records[0]["name"], "Console");
        assert_eq!(result.records[0]["serial_number"], "SN-1");

        // second row is missing its serial
        assert_eq!(result.validation_errors.len(), 1);
        assert_eq!(result.validation_errors[0].row, 3);
        assert_eq!(
            result.validation_errors[0].column.as_deref(),
            Some("serial_number")
        );
    }

    #[test]
    fn test_import_saves_then_reuses_template() {
        let dir = tempdir().unwrap();
        let csv = "Name,Serial Number\nConsole,SN-1";

        let first = run_import(csv.as_bytes(), &fields(), &[], &options_in(dir.path())).unwrap();
        let saved_id = first.template_id.expect("fresh mapping saved");

        let second = run_import(csv.as_bytes(), &fields(), &[], &options_in(dir.path())).unwrap();
        assert_eq!(second.template_id.as_deref(), Some(saved_id.as_str()));
    }

    #[test]
    fn test_import_no_cache_no_save() {
        let dir = tempdir().unwrap();
        let csv = "Name\nConsole";
        let options = ImportOptions {
            no_cache: true,
            no_save: true,
            ..options_in(dir.path())
        };

        let result = run_import(csv.as_bytes(), &fields(), &[], &options).unwrap();
        assert!(result.template_id.is_none());

        let registry = MappingRegistry::with_dir(dir.path());
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_import_empty_input_is_error() {
        let dir = tempdir().unwrap();
        let result = run_import("Name\n".as_bytes(), &fields(), &[], &options_in(dir.path()));
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn test_import_with_explicit_mapping_file() {
        let dir = tempdir().unwrap();
        let mapping_path = dir.path().join("mapping.json");
        std::fs::write(
            &mapping_path,
            r#"[{"csv_header": "Designation", "entity_field": "name"}]"#,
        )
        .unwrap();

        let options = ImportOptions {
            mapping_path: Some(mapping_path.to_string_lossy().to_string()),
            ..options_in(dir.path())
        };
        let result = run_import("Designation\nTruss".as_bytes(), &fields(), &[], &options).unwrap();

        assert_eq!(result.records[0]["name"], "Truss");
        assert!(result.template_id.is_none());
    }

    #[test]
    fn test_import_semicolon_delimited() {
        let dir = tempdir().unwrap();
        let csv = "Name;Serial Number\nConsole;SN-1";
        let result = run_import(csv.as_bytes(), &fields(), &[], &options_in(dir.path())).unwrap();

        assert_eq!(result.csv_info.delimiter, ';');
        assert_eq!(result.records[0]["serial_number"], "SN-1");
    }
}
