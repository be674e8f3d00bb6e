//! Assetbook CLI - CSV import/export and asset depreciation
//!
//! # Main Commands
//!
//! ```bash
//! assetbook parse inventory.csv           # Parse CSV to JSON
//! assetbook import inventory.csv \
//!     --fields name:Name,serial_number:"Serial Number" \
//!     --required name                     # Full import pipeline
//! assetbook depreciate --price 10000 --salvage 1000 --life 60 \
//!     --purchased 2024-01-15 --method straight_line
//! ```
//!
//! # Other Commands
//!
//! ```bash
//! assetbook export records.json --fields name:Name   # Generate CSV
//! assetbook validate inventory.csv --required name   # Required-field check
//! assetbook map inventory.csv --fields name:Name     # Show proposed mapping
//! assetbook schedule ... --period annual             # Projection table
//! assetbook template list                            # Manage stored mappings
//! ```

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use assetbook::{
    auto_map_headers, calculate, generate_csv, generate_schedule, parse_bytes_auto,
    parse_csv_with_delimiter, run_import, validate_rows, write_csv_file, CsvExportOptions,
    DepreciationMethod, DepreciationParams, EntityField, ExportField, ImportOptions,
    MappingRegistry, PeriodType,
};

#[derive(Parser)]
#[command(name = "assetbook")]
#[command(about = "CSV import/export and asset depreciation toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON rows
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a CSV file from a JSON array of records
    Export {
        /// Input JSON file (array of objects)
        input: PathBuf,

        /// Output columns as comma-separated key:Label pairs
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        /// CSV delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Omit the header line
        #[arg(long)]
        no_headers: bool,

        /// Output file (default: stdout; file output is BOM-prefixed)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check required fields on every row of a CSV file
    Validate {
        /// Input CSV file
        input: PathBuf,

        /// Required column names
        #[arg(short, long, value_delimiter = ',')]
        required: Vec<String>,
    },

    /// Show the proposed header-to-field mapping for a CSV file
    Map {
        /// Input CSV file
        input: PathBuf,

        /// Destination fields as comma-separated key:Label pairs
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Full import pipeline: parse, map, transform, validate
    Import {
        /// Input CSV file
        input: PathBuf,

        /// Destination fields as comma-separated key:Label pairs
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Required destination field keys
        #[arg(short, long, value_delimiter = ',')]
        required: Vec<String>,

        /// Use an existing mapping file instead of templates/auto-mapping
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Don't consult stored templates
        #[arg(long)]
        no_cache: bool,

        /// Don't save a fresh mapping as a template
        #[arg(long)]
        no_save: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the current depreciation snapshot for an asset
    Depreciate {
        #[command(flatten)]
        asset: AssetArgs,
    },

    /// Project a period-by-period depreciation schedule
    Schedule {
        #[command(flatten)]
        asset: AssetArgs,

        /// Period granularity: monthly or annual
        #[arg(long, default_value = "monthly")]
        period: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage stored mapping templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(clap::Args)]
struct AssetArgs {
    /// Purchase price
    #[arg(long)]
    price: f64,

    /// Salvage value
    #[arg(long)]
    salvage: f64,

    /// Useful life in months
    #[arg(long)]
    life: u32,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    purchased: NaiveDate,

    /// Method: straight_line, declining_balance, sum_of_years_digits,
    /// units_of_production
    #[arg(long, default_value = "straight_line")]
    method: String,

    /// Units produced to date (units_of_production)
    #[arg(long)]
    units_produced: Option<f64>,

    /// Total units expected (units_of_production)
    #[arg(long)]
    total_units: Option<f64>,

    /// Evaluation date (default: today)
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List all stored templates
    List,

    /// Import a mapping JSON file as template
    Import {
        /// Mapping JSON file to import
        file: PathBuf,
        /// Name for the template
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show details of a template
    Show {
        /// Template ID
        id: String,
    },

    /// Delete a template
    Delete {
        /// Template ID
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Export {
            input,
            fields,
            delimiter,
            no_headers,
            output,
        } => cmd_export(&input, &fields, delimiter, no_headers, output.as_deref()),

        Commands::Validate { input, required } => cmd_validate(&input, &required),

        Commands::Map { input, fields } => cmd_map(&input, &fields),

        Commands::Import {
            input,
            fields,
            required,
            mapping,
            no_cache,
            no_save,
            output,
        } => cmd_import(
            &input,
            &fields,
            &required,
            mapping.as_deref(),
            no_cache,
            no_save,
            output.as_deref(),
        ),

        Commands::Depreciate { asset } => cmd_depreciate(&asset),

        Commands::Schedule {
            asset,
            period,
            output,
        } => cmd_schedule(&asset, &period, output.as_deref()),

        Commands::Template { action } => cmd_template(action),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing CSV: {}", input.display());

    let bytes = fs::read(input)?;
    let result = match delimiter {
        Some(d) => {
            let content = String::from_utf8_lossy(&bytes).to_string();
            parse_csv_with_delimiter(&content, d)
        }
        None => parse_bytes_auto(&bytes)?,
    };

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("   Parsed {} rows", result.total_rows);

    for err in result.errors.iter().take(5) {
        eprintln!("   ! {}", err);
    }
    if result.errors.len() > 5 {
        eprintln!("   ... +{} more", result.errors.len() - 5);
    }

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_export(
    input: &Path,
    field_specs: &[String],
    delimiter: char,
    no_headers: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(input)?;
    let data: Vec<Map<String, Value>> = serde_json::from_str(&content)?;

    let fields = parse_export_fields(field_specs)?;
    let mut options = CsvExportOptions::new(fields, data).with_delimiter(delimiter);
    if no_headers {
        options = options.without_headers();
    }

    eprintln!("Exporting {} records", options.data.len());

    match output {
        Some(path) => {
            write_csv_file(path, &options)?;
            eprintln!("Output written to: {}", path.display());
        }
        None => println!("{}", generate_csv(&options)),
    }

    Ok(())
}

fn cmd_validate(input: &Path, required: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Validating: {}", input.display());

    let bytes = fs::read(input)?;
    let result = parse_bytes_auto(&bytes)?;

    let errors = validate_rows(&result.rows, required);

    for err in result.errors.iter().chain(errors.iter()) {
        eprintln!("   {}", err);
    }
    eprintln!(
        "Results: {} rows, {} parse issues, {} validation errors",
        result.total_rows,
        result.errors.len(),
        errors.len()
    );

    if !errors.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_map(input: &Path, field_specs: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let result = parse_bytes_auto(&bytes)?;
    let fields = parse_entity_fields(field_specs)?;

    let mappings = auto_map_headers(&result.headers, &fields);

    for m in &mappings {
        if m.is_mapped() {
            eprintln!("   {} -> {}", m.csv_header, m.entity_field);
        } else {
            eprintln!("   {} -> (unmapped)", m.csv_header);
        }
    }

    println!("{}", serde_json::to_string_pretty(&mappings)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_import(
    input: &Path,
    field_specs: &[String],
    required: &[String],
    mapping: Option<&Path>,
    no_cache: bool,
    no_save: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Importing: {}", input.display());

    let bytes = fs::read(input)?;
    let fields = parse_entity_fields(field_specs)?;

    let options = ImportOptions {
        mapping_path: mapping.map(|p| p.to_string_lossy().to_string()),
        no_cache,
        no_save,
        registry_dir: None,
        template_name: input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string()),
    };

    let result = run_import(&bytes, &fields, required, &options)?;

    eprintln!("   Encoding: {}", result.csv_info.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.csv_info.delimiter));
    eprintln!("   Rows: {}", result.csv_info.row_count);
    if let Some(ref tid) = result.template_id {
        eprintln!("   Template: {}", tid);
    }

    for err in result.parse_errors.iter().chain(result.validation_errors.iter()).take(10) {
        eprintln!("   ! {}", err);
    }

    if result.validation_errors.is_empty() {
        eprintln!("All {} records valid", result.records.len());
    } else {
        eprintln!(
            "{} records, {} validation errors",
            result.records.len(),
            result.validation_errors.len()
        );
    }

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_depreciate(asset: &AssetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let params = asset_params(asset)?;
    let as_of = asset.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let result = calculate(&params, as_of);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_schedule(
    asset: &AssetArgs,
    period: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = asset_params(asset)?;
    let period_type = match period {
        "monthly" => PeriodType::Monthly,
        "annual" => PeriodType::Annual,
        other => return Err(format!("Unknown period type: {}", other).into()),
    };

    let schedule = generate_schedule(&params, period_type);
    eprintln!("Projected {} periods", schedule.len());

    let json = serde_json::to_string_pretty(&schedule)?;
    write_output(&json, output)?;
    Ok(())
}

fn cmd_template(action: TemplateAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = MappingRegistry::new();

    match action {
        TemplateAction::List => {
            let templates = registry.list();
            if templates.is_empty() {
                eprintln!("No templates stored yet.");
                eprintln!("   Use 'assetbook template import <file>' to add one.");
                return Ok(());
            }

            eprintln!("Stored templates ({}):\n", templates.len());
            for t in templates {
                println!("  {} ({})", t.name, t.id);
                println!("     Columns: {}", t.csv_columns.join(", "));
                println!("     Success rate: {:.0}%", t.success_rate * 100.0);
                println!("     Uses: {}", t.use_count);
                if let Some(ref last) = t.last_used {
                    println!("     Last used: {}", last);
                }
                println!();
            }
        }

        TemplateAction::Import { file, name } => {
            eprintln!("Importing template from: {}", file.display());
            let id = registry.import(&file, name.as_deref())?;
            eprintln!("Template saved with ID: {}", id);
        }

        TemplateAction::Show { id } => match registry.get(&id) {
            Some(t) => {
                println!("Template: {} ({})\n", t.name, t.id);
                println!("CSV Columns: {}", t.csv_columns.join(", "));
                println!("Created: {}", t.created_at);
                println!("Success rate: {:.0}%", t.success_rate * 100.0);
                println!("Uses: {}", t.use_count);
                println!("\nMappings:");
                println!("{}", serde_json::to_string_pretty(&t.mappings)?);
            }
            None => {
                return Err(format!("Template not found: {}", id).into());
            }
        },

        TemplateAction::Delete { id } => {
            registry.delete(&id)?;
            eprintln!("Template deleted: {}", id);
        }
    }

    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

/// Split `key:Label` specs; a bare `key` reuses the key as its label.
fn split_field_spec(spec: &str) -> (String, String) {
    match spec.split_once(':') {
        Some((key, label)) => (key.to_string(), label.to_string()),
        None => (spec.to_string(), spec.to_string()),
    }
}

fn parse_entity_fields(specs: &[String]) -> Result<Vec<EntityField>, Box<dyn std::error::Error>> {
    if specs.is_empty() {
        return Err("At least one --fields entry is required".into());
    }
    Ok(specs
        .iter()
        .map(|s| {
            let (key, label) = split_field_spec(s);
            EntityField::new(key, label)
        })
        .collect())
}

fn parse_export_fields(specs: &[String]) -> Result<Vec<ExportField>, Box<dyn std::error::Error>> {
    if specs.is_empty() {
        return Err("At least one --fields entry is required".into());
    }
    Ok(specs
        .iter()
        .map(|s| {
            let (key, label) = split_field_spec(s);
            ExportField::new(key, label)
        })
        .collect())
}

fn asset_params(asset: &AssetArgs) -> Result<DepreciationParams, Box<dyn std::error::Error>> {
    let method = match asset.method.as_str() {
        "straight_line" => DepreciationMethod::StraightLine,
        "declining_balance" => DepreciationMethod::DecliningBalance,
        "sum_of_years_digits" => DepreciationMethod::SumOfYearsDigits,
        "units_of_production" => DepreciationMethod::UnitsOfProduction,
        other => return Err(format!("Unknown depreciation method: {}", other).into()),
    };

    Ok(DepreciationParams {
        purchase_price: asset.price,
        salvage_value: asset.salvage,
        useful_life_months: asset.life,
        purchase_date: asset.purchased,
        depreciation_method: method,
        units_produced: asset.units_produced,
        total_units_expected: asset.total_units,
    })
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
