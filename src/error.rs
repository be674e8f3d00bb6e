//! Error types for the assetbook import pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - CSV file reading/decoding errors
//! - [`RegistryError`] - Mapping template registry errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Note that parse and validation *anomalies* (blank required fields,
//! column-count mismatches) are not represented here: those are data,
//! returned as [`crate::parser::CsvParseError`] entries inside result
//! structures. The types below cover failures that prevent a result from
//! being produced at all.

use thiserror::Error;

// =============================================================================
// CSV File Errors
// =============================================================================

/// Errors while reading or decoding a CSV file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the mapping template registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Template not found.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Invalid template data.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// IO error.
    #[error("Registry IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Registry JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level import orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::run_import`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV reading/decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Registry error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Mapping file could not be loaded.
    #[error("Invalid mapping file: {0}")]
    InvalidMapping(String),

    /// No data rows in the input.
    #[error("No records to import")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV file operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
