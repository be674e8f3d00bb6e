//! Quote-aware CSV parser with encoding and delimiter auto-detection.
//!
//! Parsing never fails: anomalies (empty input, column-count mismatches) are
//! reported as [`CsvParseError`] entries inside the [`CsvParseResult`] rather
//! than raised, and mismatched rows are still included on a best-effort basis.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CsvError;

/// A single parsing or validation anomaly.
///
/// `row` is the 1-based source line number (the header is line 1); file-level
/// anomalies such as an empty input use `row = 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvParseError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(f, "Line {}, column '{}': {}", self.row, col, self.message),
            None => write!(f, "Line {}: {}", self.row, self.message),
        }
    }
}

impl CsvParseError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Result of parsing a CSV document.
#[derive(Debug, Clone, Serialize)]
pub struct CsvParseResult {
    /// Column names in source order, as they appeared (not deduplicated).
    pub headers: Vec<String>,
    /// One map per data row. Every row carries an entry for every header;
    /// missing trailing fields are empty strings.
    pub rows: Vec<HashMap<String, String>>,
    /// Anomalies encountered, in source order.
    pub errors: Vec<CsvParseError>,
    /// Number of data rows (header excluded).
    pub total_rows: usize,
    /// Delimiter used.
    pub delimiter: char,
    /// Encoding used to decode the input (utf-8 for string input).
    pub encoding: String,
}

/// Parse comma-delimited text.
///
/// # Example
/// ```
/// use assetbook::parse_csv;
///
/// let result = parse_csv("name,age\nAlice,30\nBob,25");
///
/// assert_eq!(result.total_rows, 2);
/// assert_eq!(result.rows[0]["name"], "Alice");
/// assert_eq!(result.rows[1]["age"], "25");
/// ```
pub fn parse_csv(raw: &str) -> CsvParseResult {
    parse_csv_with_delimiter(raw, ',')
}

/// Parse delimited text with an explicit delimiter.
///
/// The first logical line is the header row. Newlines inside quoted fields do
/// not terminate a line, and a doubled quote inside quotes is an escaped
/// literal quote. Rows whose field count differs from the header count are
/// recorded as errors but still included with best-effort field assignment.
pub fn parse_csv_with_delimiter(raw: &str, delimiter: char) -> CsvParseResult {
    let text = raw.strip_prefix('\u{FEFF}').unwrap_or(raw);

    if text.is_empty() {
        return CsvParseResult {
            headers: Vec::new(),
            rows: Vec::new(),
            errors: vec![CsvParseError::new(0, "Empty file")],
            total_rows: 0,
            delimiter,
            encoding: "utf-8".to_string(),
        };
    }

    let lines = split_logical_lines(text);

    let headers: Vec<String> = split_fields(&lines[0], delimiter)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (line_idx, line) in lines.iter().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let values = split_fields(line, delimiter);

        if values.len() != headers.len() {
            errors.push(CsvParseError::new(
                line_idx + 1,
                format!("Expected {} columns, got {}", headers.len(), values.len()),
            ));
        }

        let mut row = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = values.get(i).map(|v| v.trim()).unwrap_or("");
            row.insert(header.clone(), value.to_string());
        }
        rows.push(row);
    }

    let total_rows = rows.len();
    CsvParseResult {
        headers,
        rows,
        errors,
        total_rows,
        delimiter,
        encoding: "utf-8".to_string(),
    }
}

/// Split text into logical lines, honoring quoted regions.
///
/// A `\n`, `\r`, or `\r\n` inside an open quoted region is part of the field.
/// A doubled quote (`""`) inside quotes is an escaped literal and does not
/// toggle the quoting state.
fn split_logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                current.push('"');
                if in_quotes && chars.peek() == Some(&'"') {
                    // escaped quote, carry both characters through
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            '\r' if !in_quotes => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' if !in_quotes => {
                lines.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Split one logical line into field values.
///
/// The delimiter only separates fields outside quotes, `""` inside quotes
/// becomes a literal `"`, and enclosing quotes are stripped from the output.
fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}

// =============================================================================
// Byte-level input: encoding and delimiter auto-detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> Result<String, CsvError> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .or_else(|_| Ok(String::from_utf8_lossy(bytes).to_string())),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        _ => {
            // Fallback: try UTF-8 with lossy conversion
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }
    .map_err(|e: std::string::FromUtf8Error| CsvError::EncodingError(e.to_string()))
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
///
/// Only the decode step can fail; parsing itself reports anomalies as data.
pub fn parse_bytes_auto(bytes: &[u8]) -> Result<CsvParseResult, CsvError> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    let mut result = parse_csv_with_delimiter(&content, delimiter);
    result.encoding = encoding;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let result = parse_csv("name,age\nAlice,30\nBob,25");

        assert_eq!(result.headers, vec!["name", "age"]);
        assert_eq!(result.total_rows, 2);
        assert!(result.errors.is_empty());
        assert_eq!(result.rows[0]["name"], "Alice");
        assert_eq!(result.rows[0]["age"], "30");
        assert_eq!(result.rows[1]["name"], "Bob");
    }

    #[test]
    fn test_empty_input() {
        let result = parse_csv("");

        assert!(result.headers.is_empty());
        assert!(result.rows.is_empty());
        assert_eq!(result.total_rows, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 0);
        assert_eq!(result.errors[0].message, "Empty file");
    }

    #[test]
    fn test_bom_stripped() {
        let with_bom = parse_csv("\u{FEFF}name,age\nAlice,30");
        let without = parse_csv("name,age\nAlice,30");

        assert_eq!(with_bom.headers, without.headers);
        assert_eq!(with_bom.rows[0]["name"], "Alice");
    }

    #[test]
    fn test_quoted_comma_not_split() {
        let result = parse_csv("name,title\n\"Smith, John\",Rigger");

        assert_eq!(result.total_rows, 1);
        assert!(result.errors.is_empty());
        assert_eq!(result.rows[0]["name"], "Smith, John");
        assert_eq!(result.rows[0]["title"], "Rigger");
    }

    #[test]
    fn test_escaped_quotes() {
        let result = parse_csv("quote\n\"She said \"\"hello\"\"\"");

        assert_eq!(result.rows[0]["quote"], "She said \"hello\"");
    }

    #[test]
    fn test_newline_inside_quotes() {
        let result = parse_csv("name,notes\nStage left,\"line one\nline two\"");

        assert_eq!(result.total_rows, 1);
        assert_eq!(result.rows[0]["notes"], "line one\nline two");
    }

    #[test]
    fn test_crlf_line_endings() {
        let result = parse_csv("a,b\r\n1,2\r\n3,4");

        assert_eq!(result.total_rows, 2);
        assert_eq!(result.rows[1]["b"], "4");
    }

    #[test]
    fn test_column_mismatch_reported_but_row_kept() {
        let result = parse_csv("A,B,C\n1,2\n4,5,6");

        assert_eq!(result.total_rows, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 2);
        assert_eq!(result.errors[0].message, "Expected 3 columns, got 2");
        // best-effort row: missing trailing field is empty
        assert_eq!(result.rows[0]["A"], "1");
        assert_eq!(result.rows[0]["C"], "");
        assert_eq!(result.rows[1]["C"], "6");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let result = parse_csv("a,b\n1,2\n\n3,4\n");

        assert_eq!(result.total_rows, 2);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_headers_and_values_trimmed() {
        let result = parse_csv(" name , age \n Alice , 30 ");

        assert_eq!(result.headers, vec!["name", "age"]);
        assert_eq!(result.rows[0]["age"], "30");
    }

    #[test]
    fn test_error_display_format() {
        let err = CsvParseError::new(5, "Required field is empty").with_column("age");
        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'age'"));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma_default() {
        assert_eq!(detect_delimiter("single"), ',');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab_and_pipe() {
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
    }

    #[test]
    fn test_parse_bytes_auto() {
        let result = parse_bytes_auto("name;qty\nCable drum;12".as_bytes()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.rows[0]["qty"], "12");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert!(decoded.contains("Soci"));
    }

    #[test]
    fn test_round_trip_idempotence() {
        let raw = "name,role\nAlice,Stage manager\nBob,Audio tech";
        let first = parse_csv(raw);
        let regenerated = first
            .rows
            .iter()
            .map(|r| format!("{},{}", r["name"], r["role"]))
            .collect::<Vec<_>>()
            .join("\n");
        let second = parse_csv(&format!("name,role\n{}", regenerated));

        assert_eq!(first.rows, second.rows);
    }
}
