use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::AppError;

pub const CYCLE_LENGTH_RANGE: RangeInclusive<i64> = 20..=45;
pub const PERIOD_LENGTH_RANGE: RangeInclusive<i64> = 1..=14;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Menstrual => "Menstrual",
            CyclePhase::Follicular => "Follicular",
            CyclePhase::Ovulation => "Ovulation",
            CyclePhase::Luteal => "Luteal",
        }
    }
}

/// Position within the current cycle. `phase` is `None` only in the
/// degenerate case where the last period date lies in the future
/// (`cycle_day` is then 0).
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CycleSnapshot {
    pub cycle_day: i64,
    pub phase: Option<CyclePhase>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CyclePrediction {
    pub next_period: NaiveDate,
    pub ovulation_start: NaiveDate,
    pub ovulation_end: NaiveDate,
}

pub fn validate_lengths(cycle_length: i64, period_length: i64) -> Result<(), AppError> {
    if !CYCLE_LENGTH_RANGE.contains(&cycle_length) {
        return Err(AppError::Validation(format!(
            "cycle_length must be between {} and {} days, got {}",
            CYCLE_LENGTH_RANGE.start(),
            CYCLE_LENGTH_RANGE.end(),
            cycle_length
        )));
    }
    if !PERIOD_LENGTH_RANGE.contains(&period_length) {
        return Err(AppError::Validation(format!(
            "period_length must be between {} and {} days, got {}",
            PERIOD_LENGTH_RANGE.start(),
            PERIOD_LENGTH_RANGE.end(),
            period_length
        )));
    }
    Ok(())
}

/// Map a last period date onto today's cycle day and phase.
///
/// Lengths are assumed to be range-validated at the boundary; this
/// function itself never fails. Phase windows are checked in order,
/// first match wins, so the four windows cover every day in
/// `[1, cycle_length]`.
pub fn snapshot(
    last_period: NaiveDate,
    cycle_length: i64,
    period_length: i64,
    today: NaiveDate,
) -> CycleSnapshot {
    let days_since = (today - last_period).num_days();
    if days_since < 0 {
        // Last period recorded in the future: day 0, no phase.
        return CycleSnapshot {
            cycle_day: 0,
            phase: None,
        };
    }

    let cycle_day = days_since % cycle_length + 1;
    let phase = if cycle_day <= period_length {
        CyclePhase::Menstrual
    } else if cycle_day <= cycle_length - 14 {
        CyclePhase::Follicular
    } else if cycle_day <= cycle_length - 9 {
        CyclePhase::Ovulation
    } else {
        CyclePhase::Luteal
    };

    CycleSnapshot {
        cycle_day,
        phase: Some(phase),
    }
}

/// Next expected period date and the five-day ovulation window that
/// precedes it by fourteen days.
pub fn predict(last_period: NaiveDate, cycle_length: i64) -> CyclePrediction {
    let next_period = last_period + Duration::days(cycle_length);
    let ovulation_start = next_period - Duration::days(14);
    CyclePrediction {
        next_period,
        ovulation_start,
        ovulation_end: ovulation_start + Duration::days(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn scenario_two_weeks_in_is_ovulation() {
        let snap = snapshot(d(2024, 1, 1), 28, 5, d(2024, 1, 15));
        assert_eq!(snap.cycle_day, 15);
        assert_eq!(snap.phase, Some(CyclePhase::Ovulation));
    }

    #[test]
    fn day_one_is_menstrual() {
        let snap = snapshot(d(2024, 1, 1), 28, 5, d(2024, 1, 1));
        assert_eq!(snap.cycle_day, 1);
        assert_eq!(snap.phase, Some(CyclePhase::Menstrual));
    }

    #[test]
    fn future_last_period_yields_day_zero_without_phase() {
        let snap = snapshot(d(2024, 2, 1), 28, 5, d(2024, 1, 15));
        assert_eq!(snap.cycle_day, 0);
        assert_eq!(snap.phase, None);
    }

    #[test]
    fn every_day_of_every_valid_cycle_gets_exactly_one_phase() {
        let last = d(2024, 1, 1);
        for cycle_length in 20..=45i64 {
            for period_length in 1..=14i64 {
                for offset in 0..cycle_length {
                    let today = last + Duration::days(offset);
                    let snap = snapshot(last, cycle_length, period_length, today);
                    assert!(
                        (1..=cycle_length).contains(&snap.cycle_day),
                        "cycle_day {} out of range for L={}",
                        snap.cycle_day,
                        cycle_length
                    );
                    assert!(snap.phase.is_some());
                }
            }
        }
    }

    #[test]
    fn snapshot_is_periodic_in_cycle_length() {
        let last = d(2024, 1, 1);
        let today = d(2024, 3, 9);
        for cycle_length in 20..=45i64 {
            let a = snapshot(last, cycle_length, 5, today);
            let b = snapshot(last, cycle_length, 5, today + Duration::days(cycle_length));
            assert_eq!(a.cycle_day, b.cycle_day);
            assert_eq!(a.phase, b.phase);
        }
    }

    #[test]
    fn long_period_swallows_follicular_window() {
        // period_length > cycle_length - 14 leaves no follicular days;
        // first-match-wins keeps those days menstrual.
        let snap = snapshot(d(2024, 1, 1), 21, 10, d(2024, 1, 8));
        assert_eq!(snap.cycle_day, 8);
        assert_eq!(snap.phase, Some(CyclePhase::Menstrual));
    }

    #[test]
    fn validate_rejects_out_of_range_lengths() {
        assert!(validate_lengths(28, 5).is_ok());
        assert!(validate_lengths(19, 5).is_err());
        assert!(validate_lengths(46, 5).is_err());
        assert!(validate_lengths(28, 0).is_err());
        assert!(validate_lengths(28, 15).is_err());
    }

    #[test]
    fn prediction_offsets_from_last_period() {
        let p = predict(d(2024, 1, 1), 28);
        assert_eq!(p.next_period, d(2024, 1, 29));
        assert_eq!(p.ovulation_start, d(2024, 1, 15));
        assert_eq!(p.ovulation_end, d(2024, 1, 20));
    }
}
