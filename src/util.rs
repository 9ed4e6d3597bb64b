use std::time::Duration;
use time_humanize::{Accuracy, HumanTime, Tense};

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Clock-style `m:ss`; negative or non-finite input renders as `0:00`.
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Rough past-tense age such as "5 minutes ago".
pub fn relative_time(secs_ago: u64) -> String {
    if secs_ago < 1 {
        return String::from("just now");
    }
    HumanTime::from(Duration::from_secs(secs_ago)).to_text_en(Accuracy::Rough, Tense::Past)
}
