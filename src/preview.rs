//! First look at a sales CSV before any schema analysis runs.
//!
//! Renders the leading rows through the same [`Table`] snapshot the
//! analysis commands use, then a one-line row/column summary so truncation
//! is visible.

use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, data::Table, io_utils, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let data_table = Table::load(&args.input, delimiter, encoding)?;

    let shown: Vec<Vec<String>> = data_table.rows().iter().take(args.rows).cloned().collect();
    table::print_table(data_table.headers(), &shown);
    println!(
        "showing {} of {} row(s), {} column(s)",
        shown.len(),
        data_table.row_count(),
        data_table.column_count()
    );
    info!(
        "Previewed {} row(s) from {:?}",
        shown.len(),
        args.input
    );
    Ok(())
}
