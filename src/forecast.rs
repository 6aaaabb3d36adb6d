//! Demand forecasting with granularity fallbacks.
//!
//! [`DemandForecaster`] aggregates the target metric into calendar buckets at
//! decreasing granularity (daily → weekly → monthly) until a minimum sample
//! size is reached, fits an additive-trend exponential smoothing model on the
//! first series that qualifies, and otherwise degrades to a naive flat-mean
//! projection. The fallback chain guarantees that `forecast` always returns
//! a result: model-fit failures on degenerate series are downgraded to the
//! naive path instead of propagating.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;

use anyhow::{Context, Result, anyhow};
use augurs_core::{Fit, Predict};
use augurs_ets::AutoETS;
use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::{
    cli::ForecastArgs,
    data::{self, Table},
    decision, io_utils, schema, table,
};

/// Minimum number of buckets a series needs before trend fitting.
pub const MIN_BUCKETS: usize = 8;

/// Additive error, additive trend, no seasonal component.
const ETS_MODEL_SPEC: &str = "AAN";

/// Prediction-interval level requested from the model; only the point
/// forecast is surfaced.
const ETS_INTERVAL_LEVEL: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Naive,
}

impl Frequency {
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Naive => "naive",
        }
    }

    /// Confidence is a function of which granularity succeeded, not of model
    /// fit quality. Anything other than daily or weekly maps to Low.
    pub fn confidence(self) -> Confidence {
        match self {
            Frequency::Daily => Confidence::High,
            Frequency::Weekly => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One aggregated time-series point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    pub history: Vec<SeriesPoint>,
    pub forecast: Vec<SeriesPoint>,
    pub frequency: Frequency,
    pub confidence: Confidence,
}

/// Errors surfaced at forecaster construction; `forecast` itself never fails.
#[derive(Debug, Error)]
pub enum ForecastSetupError {
    #[error("Column '{0}' not found in table")]
    MissingColumn(String),
}

#[derive(Debug, Clone)]
struct Observation {
    date: NaiveDate,
    value: f64,
    product: Option<String>,
    region: Option<String>,
}

/// Holds the rows of one table, date-parsed and sorted once at construction.
/// Instances carry per-call derived state and are not meant to be shared
/// across threads; each request should build its own.
#[derive(Debug)]
pub struct DemandForecaster {
    observations: Vec<Observation>,
}

impl DemandForecaster {
    pub fn new(
        table: &Table,
        date_column: &str,
        target_column: &str,
        product_column: Option<&str>,
        region_column: Option<&str>,
    ) -> Result<Self, ForecastSetupError> {
        let date_idx = table
            .column_index(date_column)
            .ok_or_else(|| ForecastSetupError::MissingColumn(date_column.to_string()))?;
        let target_idx = table
            .column_index(target_column)
            .ok_or_else(|| ForecastSetupError::MissingColumn(target_column.to_string()))?;
        let product_idx = match product_column {
            Some(name) => Some(
                table
                    .column_index(name)
                    .ok_or_else(|| ForecastSetupError::MissingColumn(name.to_string()))?,
            ),
            None => None,
        };
        let region_idx = match region_column {
            Some(name) => Some(
                table
                    .column_index(name)
                    .ok_or_else(|| ForecastSetupError::MissingColumn(name.to_string()))?,
            ),
            None => None,
        };

        let mut observations = Vec::with_capacity(table.row_count());
        let mut dropped = 0usize;
        for row in table.rows() {
            let raw_date = row.get(date_idx).map(String::as_str).unwrap_or("");
            let Some(date) = data::parse_date(raw_date) else {
                dropped += 1;
                continue;
            };
            let value = row
                .get(target_idx)
                .and_then(|cell| data::parse_numeric(cell))
                .unwrap_or(0.0);
            observations.push(Observation {
                date,
                value,
                product: product_idx.map(|idx| row[idx].clone()),
                region: region_idx.map(|idx| row[idx].clone()),
            });
        }
        if dropped > 0 {
            debug!("Dropped {dropped} row(s) with unparseable '{date_column}' values");
        }
        observations.sort_by_key(|obs| obs.date);
        Ok(Self { observations })
    }

    /// Runs the fallback chain and always produces a forecast of exactly
    /// `horizon` points.
    pub fn forecast(
        &self,
        horizon: NonZeroUsize,
        product: Option<&str>,
        region: Option<&str>,
    ) -> ForecastResult {
        let rows: Vec<&Observation> = self
            .observations
            .iter()
            .filter(|obs| match (&obs.product, product) {
                (Some(have), Some(want)) => have == want,
                _ => true,
            })
            .filter(|obs| match (&obs.region, region) {
                (Some(have), Some(want)) => have == want,
                _ => true,
            })
            .collect();

        for frequency in [Frequency::Daily, Frequency::Weekly, Frequency::Monthly] {
            let history = aggregate(&rows, frequency);
            if history.len() < MIN_BUCKETS {
                debug!(
                    "{} bucket(s) at {frequency} granularity, below the minimum of {MIN_BUCKETS}",
                    history.len()
                );
                continue;
            }
            match trend_forecast(&history, horizon.get(), frequency) {
                Ok(forecast) => {
                    return ForecastResult {
                        history,
                        forecast,
                        confidence: frequency.confidence(),
                        frequency,
                    };
                }
                Err(err) => {
                    warn!("Trend fit failed on {frequency} series: {err}; using naive projection");
                    break;
                }
            }
        }

        let history = aggregate(&rows, Frequency::Daily);
        let forecast = naive_forecast(&history, horizon.get());
        ForecastResult {
            history,
            forecast,
            frequency: Frequency::Naive,
            confidence: Confidence::Low,
        }
    }
}

/// Sums observation values into calendar buckets and fills interior gaps
/// with zero, so the series has one point per bucket with no holes.
fn aggregate(rows: &[&Observation], frequency: Frequency) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for obs in rows {
        *buckets.entry(bucket_label(obs.date, frequency)).or_insert(0.0) += obs.value;
    }
    let (Some(&first), Some(&last)) = (
        buckets.keys().next(),
        buckets.keys().next_back(),
    ) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut cursor = first;
    loop {
        series.push(SeriesPoint {
            date: cursor,
            value: buckets.get(&cursor).copied().unwrap_or(0.0),
        });
        if cursor >= last {
            break;
        }
        cursor = next_bucket(cursor, frequency);
    }
    series
}

/// Daily buckets are labeled by the day itself, weekly buckets by the Sunday
/// closing the Mon–Sun week, monthly buckets by the last day of the month.
fn bucket_label(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily | Frequency::Naive => date,
        Frequency::Weekly => {
            let to_sunday = 6 - date.weekday().num_days_from_monday();
            date + Days::new(u64::from(to_sunday))
        }
        Frequency::Monthly => month_end(date),
    }
}

fn next_bucket(label: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily | Frequency::Naive => label + Days::new(1),
        Frequency::Weekly => label + Days::new(7),
        // A monthly label is a month end; the day after is the first of the
        // next month.
        Frequency::Monthly => month_end(label + Days::new(1)),
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first + Months::new(1) - Days::new(1)
}

/// Fits additive-trend exponential smoothing and extends the series by
/// `horizon` points at the bucket width of the winning frequency.
fn trend_forecast(
    history: &[SeriesPoint],
    horizon: usize,
    frequency: Frequency,
) -> Result<Vec<SeriesPoint>> {
    let last = history
        .last()
        .ok_or_else(|| anyhow!("Cannot fit a model on an empty series"))?;
    let values: Vec<f64> = history.iter().map(|point| point.value).collect();

    let model = AutoETS::new(1, ETS_MODEL_SPEC)
        .map_err(|err| anyhow!("Building ETS model: {err}"))?;
    let fitted = model
        .fit(&values)
        .map_err(|err| anyhow!("Fitting ETS model: {err}"))?;
    let predicted = fitted
        .predict(horizon, ETS_INTERVAL_LEVEL)
        .map_err(|err| anyhow!("Predicting from ETS model: {err}"))?;
    if predicted.point.len() != horizon {
        return Err(anyhow!(
            "Model produced {} point(s), expected {horizon}",
            predicted.point.len()
        ));
    }

    let mut cursor = last.date;
    let forecast = predicted
        .point
        .into_iter()
        .map(|value| {
            cursor = next_bucket(cursor, frequency);
            SeriesPoint {
                date: cursor,
                value,
            }
        })
        .collect();
    Ok(forecast)
}

/// Flat projection at the historical mean (zero when history is empty),
/// daily-spaced. With no prior timestamp the horizon anchors to today (UTC).
fn naive_forecast(history: &[SeriesPoint], horizon: usize) -> Vec<SeriesPoint> {
    let mean = if history.is_empty() {
        0.0
    } else {
        history.iter().map(|point| point.value).sum::<f64>() / history.len() as f64
    };
    let anchor = history
        .last()
        .map(|point| point.date)
        .unwrap_or_else(|| Utc::now().date_naive());
    (1..=horizon as u64)
        .map(|offset| SeriesPoint {
            date: anchor + Days::new(offset),
            value: mean,
        })
        .collect()
}

#[derive(Serialize)]
struct ForecastOutput<'a> {
    #[serde(flatten)]
    result: &'a ForecastResult,
    recommendation: &'a decision::Recommendation,
}

pub fn execute(args: &ForecastArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let data_table = Table::load(&args.input, delimiter, encoding)?;
    let report = schema::analyze(&data_table);

    let date_column = args
        .date_column
        .clone()
        .or_else(|| report.date_columns.first().cloned())
        .ok_or_else(|| anyhow!("No date column detected; supply --date-column"))?;
    let target_column = args
        .target_column
        .clone()
        .or_else(|| report.demand_target.clone())
        .ok_or_else(|| anyhow!("No numeric demand column detected; supply --target-column"))?;
    let product_column = args
        .product_column
        .clone()
        .or_else(|| report.product_columns.first().cloned());
    let region_column = args
        .region_column
        .clone()
        .or_else(|| report.region_columns.first().cloned());

    info!(
        "Forecasting '{target_column}' over '{date_column}' for {} step(s)",
        args.horizon
    );
    let forecaster = DemandForecaster::new(
        &data_table,
        &date_column,
        &target_column,
        product_column.as_deref(),
        region_column.as_deref(),
    )
    .with_context(|| format!("Preparing forecaster for {:?}", args.input))?;
    let result = forecaster.forecast(args.horizon, args.product.as_deref(), args.region.as_deref());
    let recommendation = decision::recommend(&result.forecast, result.confidence);

    if let Some(output) = &args.output {
        write_series_csv(output, &result)?;
        info!("Wrote history and forecast series to {output:?}");
    }

    if args.json {
        let output = ForecastOutput {
            result: &result,
            recommendation: &recommendation,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_series("forecast", &result.forecast);
    println!(
        "history: {} bucket(s)  frequency: {}  confidence: {}",
        result.history.len(),
        result.frequency,
        result.confidence
    );
    println!("decision: {}", recommendation.call);
    println!("reason: {}", recommendation.reason);
    println!("action: {}", recommendation.action);
    Ok(())
}

fn print_series(label: &str, series: &[SeriesPoint]) {
    let headers = vec!["date".to_string(), label.to_string()];
    let rows = series
        .iter()
        .map(|point| {
            vec![
                point.date.format("%Y-%m-%d").to_string(),
                format!("{:.2}", point.value),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}

fn write_series_csv(path: &std::path::Path, result: &ForecastResult) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path), io_utils::DEFAULT_CSV_DELIMITER)?;
    writer.write_record(["series", "date", "value"])?;
    for point in &result.history {
        writer.write_record([
            "history",
            &point.date.format("%Y-%m-%d").to_string(),
            &point.value.to_string(),
        ])?;
    }
    for point in &result.forecast {
        writer.write_record([
            "forecast",
            &point.date.format("%Y-%m-%d").to_string(),
            &point.value.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
