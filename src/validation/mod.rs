//! Required-field validation for parsed CSV rows.
//!
//! Validation failures are data, not control flow: each missing or blank
//! required value becomes a [`CsvParseError`] whose `row` is the 1-based
//! source line (data row index + 2, accounting for the header line).

use std::collections::HashMap;

use crate::parser::CsvParseError;

/// Check every row for every required field, in that order.
///
/// The outer loop runs over rows and the inner loop over `required_fields`
/// exactly as given, so callers can rely on the error ordering.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use assetbook::validate_rows;
///
/// let row: HashMap<String, String> =
///     [("name".to_string(), "".to_string())].into_iter().collect();
/// let errors = validate_rows(&[row], &["name".to_string()]);
///
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].row, 2);
/// ```
pub fn validate_rows(
    rows: &[HashMap<String, String>],
    required_fields: &[String],
) -> Vec<CsvParseError> {
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        for field in required_fields {
            let blank = match row.get(field) {
                Some(value) => value.trim().is_empty(),
                None => true,
            };
            if blank {
                errors.push(
                    CsvParseError::new(
                        index + 2,
                        format!("Required field '{}' is empty", field),
                    )
                    .with_column(field.clone()),
                );
            }
        }
    }

    errors
}
