use chrono::{Datelike, Duration, NaiveDate};

/// Consecutive checked-in days ending at `today`.
///
/// `checked_desc` must contain the user's checked-in dates up to and
/// including `today`, newest first; the scan stops at the first gap, so
/// the work is bounded by the streak length rather than the history.
pub fn current_streak(today: NaiveDate, checked_desc: &[NaiveDate]) -> u32 {
    let mut expected = today;
    let mut streak = 0u32;
    for &date in checked_desc {
        if date > today {
            continue;
        }
        if date != expected {
            break;
        }
        streak += 1;
        expected -= Duration::days(1);
    }
    streak
}

/// Monday and Sunday of the ISO week containing `today`.
pub fn iso_week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}
