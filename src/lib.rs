//! # Assetbook - CSV import/export and asset depreciation engine
//!
//! Assetbook powers bulk data exchange and asset bookkeeping for
//! production-management tooling: supplier inventory CSVs in, mapped and
//! validated records out, plus depreciation snapshots and schedules for the
//! asset register.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV bytes  │────▶│   Parser    │────▶│   Mapping   │────▶│  Validated  │
//! │ (ISO/UTF8)  │     │ (auto-enc)  │     │ (auto/tmpl) │     │   records   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────────┐
//! │ Asset params│────▶│ Depreciation │────▶│ Snapshot /      │
//! │ (price,life)│     │ (4 methods)  │     │ schedule        │
//! └─────────────┘     └──────────────┘     └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use assetbook::parse_csv;
//!
//! let result = parse_csv("item,qty\nCable drum,12");
//! assert_eq!(result.rows[0]["item"], "Cable drum");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`parser`] - Quote-aware CSV parsing with auto-detection
//! - [`generator`] - CSV generation with RFC 4180 quoting
//! - [`validation`] - Required-field validation
//! - [`mapping`] - Header auto-mapping and value transforms
//! - [`registry`] - Stored mapping templates
//! - [`pipeline`] - End-to-end import orchestration
//! - [`depreciation`] - Depreciation snapshots and schedules

// Core modules
pub mod error;

// CSV engine
pub mod generator;
pub mod mapping;
pub mod parser;
pub mod validation;

// Mapping persistence and orchestration
pub mod pipeline;
pub mod registry;

// Depreciation engine
pub mod depreciation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, CsvResult, PipelineError, RegistryError};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv,
    parse_csv_with_delimiter, CsvParseError, CsvParseResult,
};

// =============================================================================
// Re-exports - CSV Generation
// =============================================================================

pub use generator::{generate_csv, write_csv_file, CsvExportOptions, ExportField};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::validate_rows;

// =============================================================================
// Re-exports - Mapping
// =============================================================================

pub use mapping::{apply_mappings, auto_map_headers, EntityField, FieldMapping, Transform};

// =============================================================================
// Re-exports - Registry
// =============================================================================

pub use registry::{MappingRegistry, StoredMapping};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{run_import, CsvInfo, ImportOptions, ImportResult};

// =============================================================================
// Re-exports - Depreciation
// =============================================================================

pub use depreciation::{
    calculate, generate_schedule, months_elapsed, DepreciationMethod, DepreciationParams,
    DepreciationResult, PeriodType, ScheduleEntry,
};
