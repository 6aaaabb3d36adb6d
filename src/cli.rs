use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Sales CSV schema inference, demand forecasting, and route planning", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify columns, infer semantic roles, and report table health
    Schema(SchemaArgs),
    /// Forecast demand and issue a mission recommendation
    Forecast(ForecastArgs),
    /// Plan a multi-stop delivery route with cost and ETA estimates
    Route(RouteArgs),
    /// Preview the first few rows of a CSV file in a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Input CSV file to analyze (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit the schema report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Input CSV file to forecast from (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of future points to forecast
    #[arg(long, default_value = "30")]
    pub horizon: NonZeroUsize,
    /// Date column (defaults to the first inferred date column)
    #[arg(long = "date-column")]
    pub date_column: Option<String>,
    /// Target metric column (defaults to the inferred demand target)
    #[arg(long = "target-column")]
    pub target_column: Option<String>,
    /// Product dimension column (defaults to the first product candidate)
    #[arg(long = "product-column")]
    pub product_column: Option<String>,
    /// Region dimension column (defaults to the first region candidate)
    #[arg(long = "region-column")]
    pub region_column: Option<String>,
    /// Restrict the forecast to one product value
    #[arg(long)]
    pub product: Option<String>,
    /// Restrict the forecast to one region value
    #[arg(long)]
    pub region: Option<String>,
    /// Write history and forecast series as CSV to this path
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Emit the forecast and recommendation as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Ordered stop names from the location catalog
    #[arg(long = "stops", value_delimiter = ',', required = true)]
    pub stops: Vec<String>,
    /// Fuel price per unit used for the cost estimate
    #[arg(long = "fuel-price", default_value_t = 100.0)]
    pub fuel_price: f64,
    /// Emit the route result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input CSV file to preview (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(short = 'n', long = "rows", default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
