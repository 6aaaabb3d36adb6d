use chrono::{Days, NaiveDate};

use demand_pilot::decision::{MissionCall, recommend};
use demand_pilot::forecast::{Confidence, SeriesPoint};

fn series(values: &[f64]) -> Vec<SeriesPoint> {
    let start = NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date");
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| SeriesPoint {
            date: start + Days::new(idx as u64),
            value: *value,
        })
        .collect()
}

#[test]
fn negative_demand_is_no_mission_for_every_confidence() {
    for confidence in [Confidence::High, Confidence::Medium, Confidence::Low] {
        let rec = recommend(&series(&[-3.0, -3.0, -3.0]), confidence);
        assert_eq!(rec.call, MissionCall::NoMission);
        assert!(rec.reason.contains("-3.00"));
    }
}

#[test]
fn moderate_demand_with_high_confidence_is_limited() {
    let rec = recommend(&series(&[15.0; 10]), Confidence::High);
    assert_eq!(rec.call, MissionCall::LimitedMission);
}

#[test]
fn strong_demand_with_high_confidence_is_full() {
    let rec = recommend(&series(&[50.0; 10]), Confidence::High);
    assert_eq!(rec.call, MissionCall::FullMission);
    assert!(rec.reason.contains("avg 50.00"));
    assert!(rec.reason.contains("peak 50.00"));
}

#[test]
fn low_confidence_overrides_strong_demand() {
    let rec = recommend(&series(&[500.0; 5]), Confidence::Low);
    assert_eq!(rec.call, MissionCall::Wait);
}

#[test]
fn threshold_boundary_at_twenty_goes_full() {
    let rec = recommend(&series(&[20.0; 4]), Confidence::Medium);
    assert_eq!(rec.call, MissionCall::FullMission);
}

#[test]
fn zero_mean_is_no_mission() {
    let rec = recommend(&series(&[5.0, -5.0]), Confidence::High);
    assert_eq!(rec.call, MissionCall::NoMission);
}

#[test]
fn calls_render_as_screaming_snake_case() {
    assert_eq!(MissionCall::NoMission.to_string(), "NO_MISSION");
    assert_eq!(MissionCall::Wait.to_string(), "WAIT");
    assert_eq!(MissionCall::LimitedMission.to_string(), "LIMITED_MISSION");
    assert_eq!(MissionCall::FullMission.to_string(), "FULL_MISSION");
}
