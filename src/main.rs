//! tablerecon - key-based reconciliation of tabular data

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use tablerecon::config::{OutputFormat, ReconConfig};
use tablerecon::error::Side;
use tablerecon::formula::FormulaSet;
use tablerecon::loader::{Loader, SourceDescriptor};
use tablerecon::mapper::ColumnMapping;
use tablerecon::model::KeySpec;
use tablerecon::output::render_to_stdout;
use tablerecon::pipeline::reconcile;
use tablerecon::settings::SettingsBundle;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Reconcile two tabular datasets by composite key
#[derive(Parser, Debug)]
#[command(name = "tablerecon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV file for source 1 (may come from --settings instead)
    source1: Option<PathBuf>,

    /// CSV file for source 2 (may come from --settings instead)
    source2: Option<PathBuf>,

    /// Column(s) identifying a row (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    key: Vec<String>,

    /// Column(s) to exclude from comparison (comma-separated)
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Pair a source 1 column with a source 2 column, as src1=src2 (repeatable)
    #[arg(long = "map", value_name = "SRC1=SRC2", value_parser = parse_pair)]
    map: Vec<(String, String)>,

    /// Apply an expression to a column on both sides, as col=expr (repeatable).
    /// The expression sees the cell's current value as `value`.
    #[arg(long = "formula", value_name = "COL=EXPR", value_parser = parse_pair)]
    formula: Vec<(String, String)>,

    /// Import a settings bundle; explicit flags override its values
    #[arg(long, value_name = "JSON")]
    settings: Option<PathBuf>,

    /// Export the effective settings (with inlined CSV data) after the run
    #[arg(long, value_name = "JSON")]
    export_settings: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliOutputFormat,

    /// Ignore case when comparing string values
    #[arg(long)]
    ignore_case: bool,

    /// Ignore leading/trailing whitespace in string values
    #[arg(long)]
    ignore_whitespace: bool,

    /// Tolerance for numeric comparisons (e.g., 0.001)
    #[arg(long)]
    numeric_tolerance: Option<f64>,

    /// Only show statistics, not detailed differences
    #[arg(long)]
    stats_only: bool,
}

/// Parse a KEY=VALUE argument
fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() && !v.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(has_differences) => {
            if has_differences {
                ExitCode::from(1) // Differences found
            } else {
                ExitCode::SUCCESS // No differences
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Resolve one side's source: an explicit CSV path wins over the bundle
fn resolve_source(
    path: &Option<PathBuf>,
    bundle: &SettingsBundle,
    side: Side,
) -> Result<SourceDescriptor> {
    if let Some(path) = path {
        let bytes = fs::read(path)
            .with_context(|| format!("reading {} file: {}", side, path.display()))?;
        return Ok(SourceDescriptor::Csv {
            label: path.display().to_string(),
            bytes,
        });
    }
    match bundle.source_descriptor(side)? {
        Some(descriptor) => Ok(descriptor),
        None => bail!("no {side} given: pass a CSV path or a settings bundle describing it"),
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let bundle = match &cli.settings {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("reading settings bundle: {}", path.display()))?;
            SettingsBundle::from_slice(&bytes)?
        }
        None => SettingsBundle::default(),
    };

    // Imported settings act as input defaults; explicit flags override them.
    let key_spec = if cli.key.is_empty() {
        bundle
            .key_spec()
            .context("key column(s) required: pass --key or a settings bundle with key_columns")?
    } else {
        // same trimming as bundle-declared keys
        KeySpec::parse(&cli.key.join(",")).context("key column list is empty")?
    };

    let mapping = if cli.map.is_empty() {
        bundle.mapping()?
    } else {
        ColumnMapping::from_pairs(cli.map.clone())?
    };

    let formulas = if cli.formula.is_empty() {
        bundle.formula_set()
    } else {
        FormulaSet::from_pairs(cli.formula.clone())
    };

    let excluded = if cli.exclude.is_empty() {
        bundle.excluded_columns.clone()
    } else {
        cli.exclude.clone()
    };

    let left_descriptor = resolve_source(&cli.source1, &bundle, Side::Left)?;
    let right_descriptor = resolve_source(&cli.source2, &bundle, Side::Right)?;
    let left_label = source_label(&left_descriptor);
    let right_label = source_label(&right_descriptor);

    let loader = Loader::new();
    let (left, right) = loader.load_pair(&left_descriptor, &right_descriptor);

    // A failed load aborts only its own side; the surviving side's columns
    // are still worth showing before bailing out.
    let (left, right) = match (left, right) {
        (Ok(left), Ok(right)) => (left, right),
        (Ok(left), Err(e)) => {
            eprintln!("Source 1 columns: {}", left.column_names().join(", "));
            return Err(e.into());
        }
        (Err(e), Ok(right)) => {
            eprintln!("Source 2 columns: {}", right.column_names().join(", "));
            return Err(e.into());
        }
        (Err(e1), Err(e2)) => {
            eprintln!("Error: {:#}", anyhow::Error::from(e2));
            return Err(e1.into());
        }
    };

    let config = ReconConfig::new(key_spec.clone())
        .with_mapping(mapping.clone())
        .with_formulas(formulas.clone())
        .with_excluded_columns(excluded.clone())
        .with_ignore_case(cli.ignore_case)
        .with_ignore_whitespace(cli.ignore_whitespace);
    let config = match cli.numeric_tolerance {
        Some(tolerance) => config.with_numeric_tolerance(tolerance),
        None => config,
    };

    let report = reconcile(&left, &right, &config)?;

    if let Some(path) = &cli.export_settings {
        let exported = export_bundle(
            &bundle,
            &key_spec,
            &mapping,
            &formulas,
            &excluded,
            &left_descriptor,
            &right_descriptor,
        );
        fs::write(path, exported.to_json_string()?)
            .with_context(|| format!("writing settings bundle: {}", path.display()))?;
    }

    if cli.stats_only {
        let stats = &report.diff.stats;
        println!("Source 1: {} ({} rows)", left_label, stats.left_row_count);
        println!("Source 2: {} ({} rows)", right_label, stats.right_row_count);
        println!();
        println!("Shared keys:      {}", stats.shared_keys);
        println!("Keys differing:   {}", stats.keys_differing);
        println!("Cells differing:  {}", stats.cells_differing);
        println!("Only in source 1: {}", stats.left_only);
        println!("Only in source 2: {}", stats.right_only);
        return Ok(report.diff.has_differences());
    }

    render_to_stdout(&report, &left_label, &right_label, cli.format.into())?;

    Ok(report.diff.has_differences())
}

fn source_label(descriptor: &SourceDescriptor) -> String {
    match descriptor {
        SourceDescriptor::Csv { label, .. } => label.clone(),
        SourceDescriptor::Database(conn) => format!("{} {}/{}", conn.kind, conn.host, conn.database),
    }
}

/// Build the exported bundle: effective parameters plus inlined CSV bytes
fn export_bundle(
    imported: &SettingsBundle,
    key_spec: &KeySpec,
    mapping: &ColumnMapping,
    formulas: &FormulaSet,
    excluded: &[String],
    left: &SourceDescriptor,
    right: &SourceDescriptor,
) -> SettingsBundle {
    let mut bundle = imported.clone();
    bundle.key_columns = Some(key_spec.to_joined());
    bundle.excluded_columns = excluded.to_vec();
    bundle.column_mapping = mapping
        .pairs()
        .map(|(a, b)| (a.clone(), b.clone()))
        .collect();
    bundle.formulas = formulas
        .iter()
        .map(|(a, b)| (a.clone(), b.clone()))
        .collect();

    for (side, descriptor) in [(Side::Left, left), (Side::Right, right)] {
        if let SourceDescriptor::Csv { bytes, .. } = descriptor {
            bundle.set_csv_data(side, bytes);
            match side {
                Side::Left => bundle.source1_type = Some("CSV".to_string()),
                Side::Right => bundle.source2_type = Some("CSV".to_string()),
            }
        }
    }

    bundle
}
