//! Mission recommendation rules.
//!
//! Pure, stateless mapping from a forecast series and its confidence label
//! to one of four launch recommendations. Rules are evaluated in order and
//! the first match wins.

use std::fmt;

use serde::Serialize;

use crate::forecast::{Confidence, SeriesPoint};

/// Mean forecast demand below this level only justifies a trial run.
const LIMITED_MISSION_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionCall {
    NoMission,
    Wait,
    LimitedMission,
    FullMission,
}

impl MissionCall {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionCall::NoMission => "NO_MISSION",
            MissionCall::Wait => "WAIT",
            MissionCall::LimitedMission => "LIMITED_MISSION",
            MissionCall::FullMission => "FULL_MISSION",
        }
    }
}

impl fmt::Display for MissionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub call: MissionCall,
    pub reason: String,
    pub action: String,
}

/// Ordered rule evaluation: no demand, then low confidence, then moderate
/// demand, then full launch.
pub fn recommend(forecast: &[SeriesPoint], confidence: Confidence) -> Recommendation {
    let mean = if forecast.is_empty() {
        0.0
    } else {
        forecast.iter().map(|point| point.value).sum::<f64>() / forecast.len() as f64
    };
    let peak = forecast
        .iter()
        .map(|point| point.value)
        .fold(f64::NEG_INFINITY, f64::max);

    if mean <= 0.0 {
        return Recommendation {
            call: MissionCall::NoMission,
            reason: format!(
                "Average forecasted demand is {mean:.2}, indicating no expected demand."
            ),
            action: "Do not launch mission. Monitor demand trends.".to_string(),
        };
    }
    if confidence == Confidence::Low {
        return Recommendation {
            call: MissionCall::Wait,
            reason: format!("Forecast confidence is low with average demand {mean:.2}."),
            action: "Wait for more data before committing resources.".to_string(),
        };
    }
    if mean < LIMITED_MISSION_THRESHOLD {
        return Recommendation {
            call: MissionCall::LimitedMission,
            reason: format!("Moderate demand detected (avg {mean:.2})."),
            action: "Launch a limited-scale mission to test demand.".to_string(),
        };
    }
    Recommendation {
        call: MissionCall::FullMission,
        reason: format!("Strong demand forecast detected (avg {mean:.2}, peak {peak:.2})."),
        action: "Launch a full-scale mission.".to_string(),
    }
}
