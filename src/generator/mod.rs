//! CSV generation with RFC 4180-style quoting.
//!
//! [`generate_csv`] is pure and deterministic; [`write_csv_file`] is the
//! file-system side of export and prepends a UTF-8 BOM so spreadsheet tools
//! pick the right encoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::CsvError;

/// One output column: which record key to read, and the header text to emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportField {
    pub key: String,
    pub label: String,
}

impl ExportField {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Options for CSV generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvExportOptions {
    /// Column order and header labels.
    pub fields: Vec<ExportField>,
    /// Records to emit, one line each.
    pub data: Vec<Map<String, Value>>,
    /// Suggested output filename (advisory, used by the CLI).
    #[serde(default)]
    pub filename: Option<String>,
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Whether to emit the header line.
    #[serde(default = "default_include_headers")]
    pub include_headers: bool,
}

fn default_delimiter() -> char {
    ','
}

fn default_include_headers() -> bool {
    true
}

impl CsvExportOptions {
    pub fn new(fields: Vec<ExportField>, data: Vec<Map<String, Value>>) -> Self {
        Self {
            fields,
            data,
            filename: None,
            delimiter: default_delimiter(),
            include_headers: default_include_headers(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn without_headers(mut self) -> Self {
        self.include_headers = false;
        self
    }
}

/// Generate delimited text from structured records.
///
/// Produces one line per record (preceded by a header line of labels when
/// `include_headers` is set), joined by `\n` with no trailing newline.
///
/// # Example
/// ```
/// use assetbook::{generate_csv, CsvExportOptions, ExportField};
/// use serde_json::json;
///
/// let fields = vec![ExportField::new("name", "Name")];
/// let data = vec![json!({"name": "Truss, 2m"}).as_object().unwrap().clone()];
/// let csv = generate_csv(&CsvExportOptions::new(fields, data));
///
/// assert_eq!(csv, "Name\n\"Truss, 2m\"");
/// ```
pub fn generate_csv(options: &CsvExportOptions) -> String {
    let delimiter = options.delimiter;
    let mut lines = Vec::with_capacity(options.data.len() + 1);

    if options.include_headers {
        let header = options
            .fields
            .iter()
            .map(|f| escape_field(&f.label, delimiter))
            .collect::<Vec<_>>()
            .join(&delimiter.to_string());
        lines.push(header);
    }

    for record in &options.data {
        let line = options
            .fields
            .iter()
            .map(|f| escape_field(&coerce_value(record.get(&f.key)), delimiter))
            .collect::<Vec<_>>()
            .join(&delimiter.to_string());
        lines.push(line);
    }

    lines.join("\n")
}

/// Write generated CSV to a file, prefixed with a UTF-8 BOM.
pub fn write_csv_file(path: &Path, options: &CsvExportOptions) -> Result<(), CsvError> {
    let content = format!("\u{FEFF}{}", generate_csv(options));
    std::fs::write(path, content)?;
    Ok(())
}

/// Coerce a record value to its CSV string form.
///
/// Missing and null values become empty strings; strings pass through
/// unquoted; other JSON values use their display form.
fn coerce_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Quote a field when it contains the delimiter, a quote, or a line break,
/// doubling internal quotes.
fn escape_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn sample_options() -> CsvExportOptions {
        CsvExportOptions::new(
            vec![
                ExportField::new("name", "Name"),
                ExportField::new("qty", "Quantity"),
            ],
            vec![
                record(json!({"name": "Cable drum", "qty": 12})),
                record(json!({"name": "Shackle", "qty": null})),
            ],
        )
    }

    #[test]
    fn test_basic_generation() {
        let csv = generate_csv(&sample_options());
        assert_eq!(csv, "Name,Quantity\nCable drum,12\nShackle,");
    }

    #[test]
    fn test_no_headers() {
        let csv = generate_csv(&sample_options().without_headers());
        assert_eq!(csv, "Cable drum,12\nShackle,");
    }

    #[test]
    fn test_no_trailing_newline() {
        let csv = generate_csv(&sample_options());
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_missing_key_is_empty() {
        let options = CsvExportOptions::new(
            vec![ExportField::new("missing", "Missing")],
            vec![record(json!({"name": "x"}))],
        );
        assert_eq!(generate_csv(&options), "Missing\n");
    }

    #[test]
    fn test_quote_escaping() {
        let options = CsvExportOptions::new(
            vec![ExportField::new("quote", "Quote")],
            vec![record(json!({"quote": "She said \"hello\""}))],
        );
        let csv = generate_csv(&options);
        assert_eq!(csv, "Quote\n\"She said \"\"hello\"\"\"");

        let parsed = parse_csv(&csv);
        assert_eq!(parsed.rows[0]["Quote"], "She said \"hello\"");
    }

    #[test]
    fn test_comma_in_field_round_trip() {
        let options = CsvExportOptions::new(
            vec![
                ExportField::new("name", "Name"),
                ExportField::new("dept", "Department"),
            ],
            vec![record(json!({"name": "Smith, John", "dept": "Lighting"}))],
        );
        let csv = generate_csv(&options);
        let parsed = parse_csv(&csv);

        assert_eq!(parsed.headers.len(), 2);
        assert_eq!(parsed.rows[0]["Name"], "Smith, John");
        assert_eq!(parsed.rows[0]["Department"], "Lighting");
    }

    #[test]
    fn test_newline_in_field_quoted() {
        let options = CsvExportOptions::new(
            vec![ExportField::new("notes", "Notes")],
            vec![record(json!({"notes": "line one\nline two"}))],
        );
        let csv = generate_csv(&options);
        assert_eq!(csv, "Notes\n\"line one\nline two\"");

        let parsed = parse_csv(&csv);
        assert_eq!(parsed.total_rows, 1);
        assert_eq!(parsed.rows[0]["Notes"], "line one\nline two");
    }

    #[test]
    fn test_round_trip_recovers_data() {
        let options = sample_options();
        let parsed = parse_csv(&generate_csv(&options));

        assert_eq!(parsed.total_rows, 2);
        assert_eq!(parsed.rows[0]["Name"], "Cable drum");
        assert_eq!(parsed.rows[0]["Quantity"], "12");
        assert_eq!(parsed.rows[1]["Quantity"], "");
    }

    #[test]
    fn test_custom_delimiter() {
        let csv = generate_csv(&sample_options().with_delimiter(';'));
        assert_eq!(csv, "Name;Quantity\nCable drum;12\nShackle;");
    }

    #[test]
    fn test_write_csv_file_has_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv_file(&path, &sample_options()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with('\u{FEFF}'));
        assert!(content.contains("Cable drum"));
    }
}
