use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;

use common::{TestWorkspace, sales_csv};

fn cmd() -> Command {
    Command::cargo_bin("demand-pilot").expect("binary built")
}

#[test]
fn schema_reports_roles_and_target() {
    let ws = TestWorkspace::new();
    let input = ws.write("sales.csv", &sales_csv(12));

    cmd()
        .args(["schema", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(
            contains("order_date")
                .and(contains("demand target: units"))
                .and(contains("rows: 12")),
        );
}

#[test]
fn schema_json_output_parses() {
    let ws = TestWorkspace::new();
    let input = ws.write("sales.csv", &sales_csv(6));

    let output = cmd()
        .args(["schema", "--json", "-i"])
        .arg(&input)
        .output()
        .expect("run schema");
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON report");
    assert_eq!(report["demand_target"], "units");
    assert_eq!(report["date_columns"][0], "order_date");
}

#[test]
fn forecast_prints_frequency_confidence_and_decision() {
    let ws = TestWorkspace::new();
    let input = ws.write("sales.csv", &sales_csv(40));

    cmd()
        .args(["forecast", "--horizon", "10", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(
            contains("frequency: daily")
                .and(contains("confidence: High"))
                .and(contains("decision:")),
        );
}

#[test]
fn forecast_json_carries_a_recommendation() {
    let ws = TestWorkspace::new();
    let input = ws.write("sales.csv", &sales_csv(40));

    let output = cmd()
        .args(["forecast", "--json", "--horizon", "5", "-i"])
        .arg(&input)
        .output()
        .expect("run forecast");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON forecast");
    assert_eq!(value["forecast"].as_array().expect("array").len(), 5);
    assert!(value["recommendation"]["call"].is_string());
}

#[test]
fn forecast_without_dates_fails_with_guidance() {
    let ws = TestWorkspace::new();
    let input = ws.write("nodates.csv", "name,units\nwidget,4\ngadget,9\n");

    cmd()
        .args(["forecast", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("No date column detected"));
}

#[test]
fn forecast_writes_series_csv() {
    let ws = TestWorkspace::new();
    let input = ws.write("sales.csv", &sales_csv(20));
    let output = ws.path().join("series.csv");

    cmd()
        .args(["forecast", "--horizon", "4", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).expect("series file");
    assert!(written.starts_with("series,date,value"));
    assert!(written.contains("history,2024-01-01"));
    assert_eq!(written.matches("\nforecast,").count(), 4);
}

#[test]
fn route_prints_distance_cost_and_eta() {
    cmd()
        .args(["route", "--stops", "Mumbai,Delhi", "--fuel-price", "100"])
        .assert()
        .success()
        .stdout(
            contains("route: Mumbai -> Delhi")
                .and(contains("distance_km"))
                .and(contains("eta_hours")),
        );
}

#[test]
fn route_rejects_unknown_stops() {
    cmd()
        .args(["route", "--stops", "Mumbai,Atlantis"])
        .assert()
        .failure()
        .stderr(contains("Routing not supported for: Atlantis"));
}

#[test]
fn route_json_has_rounded_metrics() {
    let output = cmd()
        .args(["route", "--json", "--stops", "Mumbai,Delhi"])
        .output()
        .expect("run route");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON route");
    let distance = value["distance_km"].as_f64().expect("distance");
    assert!((distance - 1150.0).abs() < 1150.0 * 0.05);
}

#[test]
fn preview_shows_the_first_rows() {
    let ws = TestWorkspace::new();
    let input = ws.write("sales.csv", &sales_csv(15));

    cmd()
        .args(["preview", "-n", "3", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(
            contains("order_date")
                .and(contains("2024-01-03"))
                .and(contains("2024-01-04").not())
                .and(contains("showing 3 of 15 row(s), 4 column(s)")),
        );
}
