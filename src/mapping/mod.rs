//! Header auto-mapping and value transforms.
//!
//! [`auto_map_headers`] proposes an association from each source CSV column
//! to a destination entity field by normalized name matching. The matching is
//! case- and separator-insensitive but otherwise exact/substring only; it is
//! deliberately not an edit-distance matcher, so a header either lines up
//! with a field or is left unmapped for the operator to resolve.
//!
//! [`Transform`] is a small set of value coercions applied to mapped cell
//! values during import (trim, case folding, regex replace, numeric parsing).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A destination field an imported column can map onto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityField {
    /// Machine key (e.g. `serial_number`).
    pub key: String,
    /// Display label (e.g. `Serial Number`).
    pub label: String,
}

impl EntityField {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// A proposed association from a source column to a destination field.
///
/// `entity_field` is the empty string when no confident match was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub csv_header: String,
    pub entity_field: String,
    /// Optional value coercion applied on import. Never populated by
    /// [`auto_map_headers`] itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

impl FieldMapping {
    pub fn new(csv_header: impl Into<String>, entity_field: impl Into<String>) -> Self {
        Self {
            csv_header: csv_header.into(),
            entity_field: entity_field.into(),
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Whether a destination field was found.
    pub fn is_mapped(&self) -> bool {
        !self.entity_field.is_empty()
    }
}

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\-\s]+").expect("valid pattern"));

/// Lowercase and strip underscore/hyphen/whitespace runs.
fn normalize(name: &str) -> String {
    SEPARATORS.replace_all(&name.to_lowercase(), "").to_string()
}

/// Propose a destination field for each source header.
///
/// Match priority, strict and first-match-wins within each rule:
/// 1. exact match against a normalized entity field key
/// 2. exact match against a normalized entity field label
/// 3. substring match in either direction against a normalized key
///
/// # Example
/// ```
/// use assetbook::{auto_map_headers, EntityField};
///
/// let fields = vec![EntityField::new("email", "Email Address")];
/// let mappings = auto_map_headers(&["EMAIL".to_string()], &fields);
///
/// assert_eq!(mappings[0].entity_field, "email");
/// ```
pub fn auto_map_headers(csv_headers: &[String], entity_fields: &[EntityField]) -> Vec<FieldMapping> {
    csv_headers
        .iter()
        .map(|header| {
            let normalized = normalize(header);

            let matched = entity_fields
                .iter()
                .find(|f| normalize(&f.key) == normalized)
                .or_else(|| {
                    entity_fields
                        .iter()
                        .find(|f| normalize(&f.label) == normalized)
                })
                .or_else(|| {
                    entity_fields.iter().find(|f| {
                        let key = normalize(&f.key);
                        !key.is_empty()
                            && !normalized.is_empty()
                            && (key.contains(&normalized) || normalized.contains(&key))
                    })
                });

            FieldMapping::new(
                header.clone(),
                matched.map(|f| f.key.as_str()).unwrap_or(""),
            )
        })
        .collect()
}

// =============================================================================
// Value Transforms
// =============================================================================

/// Value coercions applicable to a mapped cell on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Remove leading and trailing whitespace.
    Trim,

    /// Convert to uppercase.
    Uppercase,

    /// Convert to lowercase.
    Lowercase,

    /// Replace using regex pattern.
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },

    /// Remove all non-digit characters.
    DigitsOnly,

    /// Convert to a number (integer when whole, float otherwise).
    ToNumber,

    /// Convert to boolean.
    ToBoolean {
        #[serde(default = "default_true_values")]
        true_values: Vec<String>,
    },
}

fn default_true_values() -> Vec<String> {
    vec![
        "true".to_string(),
        "1".to_string(),
        "yes".to_string(),
        "y".to_string(),
        "x".to_string(),
    ]
}

impl Transform {
    /// Apply this transform to a raw cell value.
    pub fn apply(&self, value: &str) -> Value {
        match self {
            Transform::Trim => Value::String(value.trim().to_string()),
            Transform::Uppercase => Value::String(value.to_uppercase()),
            Transform::Lowercase => Value::String(value.to_lowercase()),
            Transform::Replace { pattern, value: replacement } => {
                match Regex::new(pattern) {
                    Ok(re) => Value::String(re.replace_all(value, replacement.as_str()).to_string()),
                    Err(_) => Value::String(value.to_string()),
                }
            }
            Transform::DigitsOnly => {
                Value::String(value.chars().filter(|c| c.is_ascii_digit()).collect())
            }
            Transform::ToNumber => {
                let trimmed = value.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    Value::Number(n.into())
                } else if let Some(n) = trimmed.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
                {
                    Value::Number(n)
                } else {
                    Value::Null
                }
            }
            Transform::ToBoolean { true_values } => {
                let lower = value.trim().to_lowercase();
                Value::Bool(true_values.iter().any(|tv| tv.to_lowercase() == lower))
            }
        }
    }
}

/// Project parsed rows through confirmed mappings.
///
/// Each output record is keyed by entity field; unmapped headers are dropped
/// and each mapping's transform (when present) is applied to the cell value.
pub fn apply_mappings(
    rows: &[HashMap<String, String>],
    mappings: &[FieldMapping],
) -> Vec<Map<String, Value>> {
    rows.iter()
        .map(|row| {
            let mut record = Map::new();
            for mapping in mappings.iter().filter(|m| m.is_mapped()) {
                let raw = row.get(&mapping.csv_header).map(String::as_str).unwrap_or("");
                let value = match &mapping.transform {
                    Some(t) => t.apply(raw),
                    None => Value::String(raw.to_string()),
                };
                record.insert(mapping.entity_field.clone(), value);
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset_fields() -> Vec<EntityField> {
        vec![
            EntityField::new("name", "Asset Name"),
            EntityField::new("serial_number", "Serial Number"),
            EntityField::new("email", "Email"),
            EntityField::new("purchase_price", "Purchase Price"),
        ]
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_key_match() {
        let mappings = auto_map_headers(&headers(&["serial_number"]), &asset_fields());
        assert_eq!(mappings[0].entity_field, "serial_number");
    }

    #[test]
    fn test_case_and_separator_insensitive() {
        let mappings = auto_map_headers(
            &headers(&["EMAIL", "Serial-Number", "purchase price"]),
            &asset_fields(),
        );
        assert_eq!(mappings[0].entity_field, "email");
        assert_eq!(mappings[1].entity_field, "serial_number");
        assert_eq!(mappings[2].entity_field, "purchase_price");
    }

    #[test]
    fn test_label_match() {
        let mappings = auto_map_headers(&headers(&["Asset Name"]), &asset_fields());
        assert_eq!(mappings[0].entity_field, "name");
    }

    #[test]
    fn test_key_match_beats_label_match() {
        // "name" is an exact key, even though "Asset Name" label also exists
        let fields = vec![
            EntityField::new("display", "Name"),
            EntityField::new("name", "Full Name"),
        ];
        let mappings = auto_map_headers(&headers(&["name"]), &fields);
        assert_eq!(mappings[0].entity_field, "name");
    }

    #[test]
    fn test_substring_match() {
        let mappings = auto_map_headers(&headers(&["serial"]), &asset_fields());
        assert_eq!(mappings[0].entity_field, "serial_number");
    }

    #[test]
    fn test_first_match_wins_on_ties() {
        let fields = vec![
            EntityField::new("contact_name", "Contact"),
            EntityField::new("company_name", "Company"),
        ];
        // "name" is a substring of both keys; first field in order wins
        let mappings = auto_map_headers(&headers(&["name"]), &fields);
        assert_eq!(mappings[0].entity_field, "contact_name");
    }

    #[test]
    fn test_unmatched_maps_to_empty() {
        let mappings = auto_map_headers(&headers(&["zzz_unrelated"]), &asset_fields());
        assert_eq!(mappings[0].entity_field, "");
        assert!(!mappings[0].is_mapped());
    }

    #[test]
    fn test_transform_trim_and_cases() {
        assert_eq!(Transform::Trim.apply("  hi  "), Value::String("hi".into()));
        assert_eq!(Transform::Uppercase.apply("abc"), Value::String("ABC".into()));
        assert_eq!(Transform::Lowercase.apply("ABC"), Value::String("abc".into()));
    }

    #[test]
    fn test_transform_replace() {
        let t = Transform::Replace {
            pattern: "[-. ]".to_string(),
            value: String::new(),
        };
        assert_eq!(t.apply("123-45.6 7"), Value::String("1234567".into()));
    }

    #[test]
    fn test_transform_to_number() {
        assert_eq!(Transform::ToNumber.apply("42"), Value::Number(42.into()));
        assert_eq!(
            Transform::ToNumber.apply("12.5"),
            Value::Number(serde_json::Number::from_f64(12.5).unwrap())
        );
        assert_eq!(Transform::ToNumber.apply("n/a"), Value::Null);
    }

    #[test]
    fn test_transform_digits_only_and_boolean() {
        assert_eq!(
            Transform::DigitsOnly.apply("SN-0042/B"),
            Value::String("0042".into())
        );
        let t = Transform::ToBoolean {
            true_values: default_true_values(),
        };
        assert_eq!(t.apply("YES"), Value::Bool(true));
        assert_eq!(t.apply("no"), Value::Bool(false));
    }

    #[test]
    fn test_apply_mappings_projects_and_transforms() {
        let row: HashMap<String, String> = [
            ("Serial".to_string(), "SN-0042".to_string()),
            ("Ignored".to_string(), "x".to_string()),
        ]
        .into_iter()
        .collect();

        let mappings = vec![
            FieldMapping::new("Serial", "serial_number").with_transform(Transform::DigitsOnly),
            FieldMapping::new("Ignored", ""),
        ];

        let records = apply_mappings(&[row], &mappings);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["serial_number"], Value::String("0042".into()));
        assert!(!records[0].contains_key("Ignored"));
    }
}
