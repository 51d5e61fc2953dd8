// Points calculation for mining sessions

use chrono::{DateTime, Utc};

/// Elapsed minutes between two instants, fractional
pub fn elapsed_minutes(started: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed = now.signed_duration_since(started);
    elapsed.num_milliseconds() as f64 / 60_000.0
}

/// Calculate points earned by a mining session
///
/// Clock skew can make `now` earlier than `started`; such sessions earn
/// nothing instead of costing points.
pub fn calculate_mining_points(started: DateTime<Utc>, now: DateTime<Utc>, rate: f64) -> f64 {
    let points = elapsed_minutes(started, now) * rate;
    if points.is_finite() && points > 0.0 {
        points
    } else {
        0.0
    }
}
