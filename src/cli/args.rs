use crate::types::{ColumnMapping, Field, ImportOptions, UnmappedPolicy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Import delimited-text transaction exports into a ledger store
#[derive(Parser, Debug)]
#[command(name = "ledger-import")]
#[command(about = "Validate, deduplicate and import delimited transaction files", long_about = None)]
pub struct CliArgs {
    /// Input file containing delimited transaction rows
    #[arg(value_name = "INPUT", help = "Path to the input file")]
    pub input_file: PathBuf,

    /// Number of rows per batch (commit granularity)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Rows processed and committed together (default: 500)"
    )]
    pub batch_size: Option<usize>,

    /// Number of concurrent validation workers
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Concurrent validation workers (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Accepted date format, repeatable; tried in order, first match wins
    #[arg(
        long = "date-format",
        value_name = "FORMAT",
        help = "Accepted date format (strftime), repeatable; first match wins"
    )]
    pub date_formats: Vec<String>,

    /// Fallback for entity values with no mapping
    #[arg(
        long = "on-unmapped",
        value_enum,
        default_value = "reject",
        help = "What to do with unmapped account/category values"
    )]
    pub on_unmapped: UnmappedArg,

    /// Entity-resolution cache capacity
    #[arg(
        long = "cache-capacity",
        value_name = "ENTRIES",
        help = "Bounded entity cache capacity (default: 256)"
    )]
    pub cache_capacity: Option<usize>,

    /// Dedup comparison window around the import's date range, in days
    #[arg(
        long = "dedup-window",
        value_name = "DAYS",
        help = "Days of padding when comparing against stored records (default: 3)"
    )]
    pub dedup_window: Option<u32>,

    /// Currency assumed when the input has no currency column
    #[arg(
        long = "currency",
        value_name = "CODE",
        help = "Default currency code (default: USD)"
    )]
    pub currency: Option<String>,

    /// Column override, repeatable: field=index (e.g. --map date=0)
    #[arg(
        long = "map",
        value_name = "FIELD=INDEX",
        help = "Override a column assignment inferred from the header"
    )]
    pub map: Vec<String>,

    /// Field delimiter character
    #[arg(
        long = "delimiter",
        value_name = "CHAR",
        help = "Field delimiter (default: ',')"
    )]
    pub delimiter: Option<char>,

    /// Treat the first row as data, not a header
    #[arg(long = "no-header", help = "Input has no header row")]
    pub no_header: bool,

    /// Print the full report as JSON instead of a summary
    #[arg(long = "json", help = "Emit the final report as JSON")]
    pub json: bool,
}

/// CLI spelling of the unmapped-entity policy
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum UnmappedArg {
    Reject,
    Create,
}

impl From<UnmappedArg> for UnmappedPolicy {
    fn from(arg: UnmappedArg) -> Self {
        match arg {
            UnmappedArg::Reject => UnmappedPolicy::Reject,
            UnmappedArg::Create => UnmappedPolicy::Create,
        }
    }
}

impl CliArgs {
    /// Build ImportOptions from CLI arguments, falling back to defaults
    pub fn to_options(&self) -> ImportOptions {
        let default = ImportOptions::default();
        let mut options = ImportOptions::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.workers.unwrap_or(default.validator_workers),
        );

        if !self.date_formats.is_empty() {
            options.date_formats = self.date_formats.clone();
        }
        if let Some(capacity) = self.cache_capacity {
            options.cache_capacity = capacity.max(1);
        }
        if let Some(days) = self.dedup_window {
            options.dedup_window_days = days;
        }
        if let Some(currency) = &self.currency {
            options.default_currency = currency.to_ascii_uppercase();
        }
        options.unmapped_policy = self.on_unmapped.into();
        options
    }

    /// Apply `--map field=index` overrides onto an inferred mapping
    ///
    /// Unparseable overrides are reported as errors so typos don't silently
    /// import the wrong column.
    pub fn apply_map_overrides(&self, mapping: &mut ColumnMapping) -> Result<(), String> {
        for entry in &self.map {
            let (name, index) = entry
                .split_once('=')
                .ok_or_else(|| format!("invalid --map '{entry}', expected field=index"))?;
            let field = match name.trim().to_lowercase().as_str() {
                "date" => Field::Date,
                "amount" => Field::Amount,
                "description" => Field::Description,
                "account" => Field::Account,
                "category" => Field::Category,
                "currency" => Field::Currency,
                other => return Err(format!("unknown field '{other}' in --map")),
            };
            let index: usize = index
                .trim()
                .parse()
                .map_err(|_| format!("invalid column index in --map '{entry}'"))?;
            mapping.set(field, index);
        }
        Ok(())
    }
}
