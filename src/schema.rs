//! Column classification and health reporting for unknown sales tables.
//!
//! This module owns [`SchemaReport`], the one-shot snapshot produced by
//! [`analyze`]: every column classified as numeric, date, or categorical;
//! region/product role candidates picked out of the categorical set by
//! column-name keywords; the demand target inferred by maximum sample
//! variance; and basic health counters (missing values, duplicate rows).
//!
//! Classification is an ordered predicate chain with early exit: the numeric
//! test runs first and is exclusive, so a numeric column is never
//! reconsidered as a date or categorical column. `analyze` never fails —
//! malformed values degrade the classification instead of propagating.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use log::info;
use serde::Serialize;

use crate::{
    cli::SchemaArgs,
    data::{self, Table},
    io_utils, table,
};

/// Fraction of cells that must parse as dates for a date classification.
pub const DATE_PARSE_THRESHOLD: f64 = 0.80;

const REGION_KEYWORDS: &[&str] = &["state", "city", "region", "location"];
const PRODUCT_KEYWORDS: &[&str] = &["product", "item", "category", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnClass {
    Numeric,
    Date,
    Categorical,
}

impl ColumnClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnClass::Numeric => "numeric",
            ColumnClass::Date => "date",
            ColumnClass::Categorical => "categorical",
        }
    }
}

/// Immutable result of one schema analysis pass.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub numeric_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub region_columns: Vec<String>,
    pub product_columns: Vec<String>,
    pub demand_target: Option<String>,
    pub target_variance: Option<f64>,
    pub row_count: usize,
    pub column_count: usize,
    pub missing_values: BTreeMap<String, usize>,
    pub duplicate_rows: usize,
}

impl SchemaReport {
    pub fn class_of(&self, column: &str) -> Option<ColumnClass> {
        if self.numeric_columns.iter().any(|c| c == column) {
            Some(ColumnClass::Numeric)
        } else if self.date_columns.iter().any(|c| c == column) {
            Some(ColumnClass::Date)
        } else if self.categorical_columns.iter().any(|c| c == column) {
            Some(ColumnClass::Categorical)
        } else {
            None
        }
    }
}

/// Classifies every column, infers semantic roles and the demand target, and
/// gathers health counters. Never fails, whatever the table contains.
pub fn analyze(table: &Table) -> SchemaReport {
    let mut numeric_columns = Vec::new();
    let mut date_columns = Vec::new();
    let mut categorical_columns = Vec::new();

    for (idx, header) in table.headers().iter().enumerate() {
        let values: Vec<&str> = table.column_values(idx).collect();
        match classify_column(&values) {
            ColumnClass::Numeric => numeric_columns.push(header.clone()),
            ColumnClass::Date => date_columns.push(header.clone()),
            ColumnClass::Categorical => categorical_columns.push(header.clone()),
        }
    }

    // Role candidates come from categorical columns only; a column whose name
    // matches both keyword sets appears in both lists.
    let region_columns = match_keywords(&categorical_columns, REGION_KEYWORDS);
    let product_columns = match_keywords(&categorical_columns, PRODUCT_KEYWORDS);

    let (demand_target, target_variance) = detect_target(table, &numeric_columns);

    let mut missing_values = BTreeMap::new();
    for (idx, header) in table.headers().iter().enumerate() {
        let missing = table
            .column_values(idx)
            .filter(|cell| data::is_missing(cell))
            .count();
        if missing > 0 {
            missing_values.insert(header.clone(), missing);
        }
    }

    let mut seen: HashSet<&Vec<String>> = HashSet::with_capacity(table.row_count());
    let duplicate_rows = table.rows().iter().filter(|row| !seen.insert(row)).count();

    SchemaReport {
        numeric_columns,
        date_columns,
        categorical_columns,
        region_columns,
        product_columns,
        demand_target,
        target_variance,
        row_count: table.row_count(),
        column_count: table.column_count(),
        missing_values,
        duplicate_rows,
    }
}

/// Ordered predicate chain: numeric first (exclusive), then date, then
/// categorical as the fall-through.
pub fn classify_column(values: &[&str]) -> ColumnClass {
    if is_numeric_column(values) {
        return ColumnClass::Numeric;
    }
    if is_date_column(values) {
        return ColumnClass::Date;
    }
    ColumnClass::Categorical
}

fn is_numeric_column(values: &[&str]) -> bool {
    let mut non_missing = 0usize;
    for value in values {
        if data::is_missing(value) {
            continue;
        }
        if data::parse_numeric(value).is_none() {
            return false;
        }
        non_missing += 1;
    }
    non_missing > 0
}

/// Missing cells count against the ratio: a mostly-empty column is not a
/// date column even if its few populated cells all parse.
fn is_date_column(values: &[&str]) -> bool {
    if values.is_empty() {
        return false;
    }
    let parsed = values
        .iter()
        .filter(|value| data::parse_date(value).is_some())
        .count();
    parsed as f64 / values.len() as f64 > DATE_PARSE_THRESHOLD
}

fn match_keywords(columns: &[String], keywords: &[&str]) -> Vec<String> {
    columns
        .iter()
        .filter(|name| {
            let lowered = name.to_lowercase();
            keywords.iter().any(|keyword| lowered.contains(keyword))
        })
        .cloned()
        .collect()
}

/// Picks the numeric column with maximum sample variance among those with
/// more than one non-missing value. Exact ties keep the first column in
/// header order.
fn detect_target(table: &Table, numeric_columns: &[String]) -> (Option<String>, Option<f64>) {
    let mut best: Option<(&String, f64)> = None;
    for name in numeric_columns {
        let Some(idx) = table.column_index(name) else {
            continue;
        };
        let values: Vec<f64> = table
            .column_values(idx)
            .filter_map(data::parse_numeric)
            .collect();
        let Some(variance) = sample_variance(&values) else {
            continue;
        };
        match best {
            Some((_, best_variance)) if variance <= best_variance => {}
            _ => best = Some((name, variance)),
        }
    }
    match best {
        Some((name, variance)) => (Some(name.clone()), Some(round2(variance))),
        None => (None, None),
    }
}

/// Sample variance (ddof = 1); `None` for fewer than two values.
fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some(sum_sq / (values.len() - 1) as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn execute(args: &SchemaArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let data_table = Table::load(&args.input, delimiter, encoding)?;
    let report = analyze(&data_table);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let headers = vec![
        "column".to_string(),
        "class".to_string(),
        "roles".to_string(),
        "missing".to_string(),
    ];
    let mut rows = Vec::new();
    for column in data_table.headers() {
        let class = report
            .class_of(column)
            .map(ColumnClass::as_str)
            .unwrap_or("unknown");
        let mut roles = Vec::new();
        if report.region_columns.iter().any(|c| c == column) {
            roles.push("region");
        }
        if report.product_columns.iter().any(|c| c == column) {
            roles.push("product");
        }
        if report.demand_target.as_deref() == Some(column.as_str()) {
            roles.push("target");
        }
        let missing = report.missing_values.get(column).copied().unwrap_or(0);
        rows.push(vec![
            column.clone(),
            class.to_string(),
            if roles.is_empty() {
                "-".to_string()
            } else {
                roles.join(",")
            },
            missing.to_string(),
        ]);
    }
    table::print_table(&headers, &rows);

    println!(
        "rows: {}  columns: {}  duplicate rows: {}",
        report.row_count, report.column_count, report.duplicate_rows
    );
    match (&report.demand_target, report.target_variance) {
        (Some(target), Some(variance)) => {
            println!("demand target: {target} (variance {variance})");
        }
        _ => println!("demand target: none (no numeric column with enough samples)"),
    }
    info!(
        "Classified {} column(s) from {:?}",
        report.column_count, args.input
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Table;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn numeric_check_is_exclusive() {
        // A column of year-like integers stays numeric even though each
        // value could also be read as a date fragment.
        let t = table(&["year"], &[&["2021"], &["2022"], &["2023"]]);
        let report = analyze(&t);
        assert_eq!(report.numeric_columns, vec!["year"]);
        assert!(report.date_columns.is_empty());
        assert!(report.categorical_columns.is_empty());
    }

    #[test]
    fn date_threshold_is_strict() {
        // 4 of 5 parse -> 0.8, not > 0.8, so the column stays categorical.
        let t = table(
            &["when"],
            &[
                &["2024-01-01"],
                &["2024-01-02"],
                &["2024-01-03"],
                &["2024-01-04"],
                &["yesterday"],
            ],
        );
        let report = analyze(&t);
        assert_eq!(report.categorical_columns, vec!["when"]);
    }

    #[test]
    fn role_candidates_can_overlap() {
        let t = table(
            &["product_type", "city"],
            &[&["gadget", "Pune"], &["widget", "Agra"]],
        );
        let report = analyze(&t);
        assert_eq!(report.product_columns, vec!["product_type"]);
        assert_eq!(report.region_columns, vec!["city"]);
    }

    #[test]
    fn target_tie_keeps_first_column() {
        let t = table(
            &["a", "b"],
            &[&["1", "1"], &["2", "2"], &["3", "3"]],
        );
        let report = analyze(&t);
        assert_eq!(report.demand_target.as_deref(), Some("a"));
    }

    #[test]
    fn single_sample_columns_never_become_target() {
        let t = table(&["only"], &[&["5"]]);
        let report = analyze(&t);
        assert_eq!(report.numeric_columns, vec!["only"]);
        assert_eq!(report.demand_target, None);
        assert_eq!(report.target_variance, None);
    }

    #[test]
    fn duplicate_rows_count_occurrences_beyond_first() {
        let t = table(
            &["a", "b"],
            &[&["x", "1"], &["x", "1"], &["x", "1"], &["y", "2"]],
        );
        let report = analyze(&t);
        assert_eq!(report.duplicate_rows, 2);
    }
}
