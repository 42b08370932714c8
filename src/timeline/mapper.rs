//! Date ↔ pixel mapping.
//!
//! Every conversion normalizes its inputs to a calendar day first, so a
//! timestamp with a residual time of day can never push a bar into the
//! neighbouring cell. Callers hand in whatever date-like value they hold and
//! never strip times themselves.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// Granularity of one grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewUnit {
    Day,
    /// Seven days anchored to Monday.
    #[default]
    Week,
}

impl ViewUnit {
    /// Number of days covered by one grid column.
    pub fn days(self) -> i64 {
        match self {
            ViewUnit::Day => 1,
            ViewUnit::Week => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewUnit::Day => "Day",
            ViewUnit::Week => "Week",
        }
    }
}

/// Anything that can be reduced to a calendar day.
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

impl<T: CalendarDay + ?Sized> CalendarDay for &T {
    fn calendar_day(&self) -> NaiveDate {
        (**self).calendar_day()
    }
}

/// Monday of the week containing `date`.
pub fn monday_of(date: impl CalendarDay) -> NaiveDate {
    let day = date.calendar_day();
    let back = i64::from(day.weekday().num_days_from_monday());
    shift_days(day, -back)
}

/// Days since Monday (Monday = 0, Sunday = 6).
pub fn day_offset_in_week(date: impl CalendarDay) -> i64 {
    i64::from(date.calendar_day().weekday().num_days_from_monday())
}

/// Pixel offset of `date` measured from `origin`.
pub fn to_pixel(
    date: impl CalendarDay,
    origin: impl CalendarDay,
    cell_width: f32,
    unit: ViewUnit,
) -> f32 {
    let date = date.calendar_day();
    let origin = origin.calendar_day();
    match unit {
        ViewUnit::Week => {
            let days = (monday_of(date) - monday_of(origin)).num_days();
            let weeks_diff = days.div_euclid(7);
            let day_offset = day_offset_in_week(date);
            weeks_diff as f32 * cell_width * 7.0 + day_offset as f32 * cell_width
        }
        ViewUnit::Day => (date - origin).num_days() as f32 * cell_width,
    }
}

/// Inverse of [`to_pixel`], rounding to the nearest whole day column.
///
/// A non-positive or non-finite cell width has no inverse; the origin is
/// returned instead.
pub fn to_date(pixel: f32, origin: impl CalendarDay, cell_width: f32, unit: ViewUnit) -> NaiveDate {
    let origin = origin.calendar_day();
    if !(cell_width > 0.0) || !cell_width.is_finite() || !pixel.is_finite() {
        return origin;
    }
    let base = match unit {
        ViewUnit::Week => monday_of(origin),
        ViewUnit::Day => origin,
    };
    let days = (pixel / cell_width).round() as i64;
    shift_days(base, days)
}

/// Snap a date onto its unit boundary (Monday in week view).
pub fn snap_to_unit(date: impl CalendarDay, unit: ViewUnit) -> NaiveDate {
    match unit {
        ViewUnit::Week => monday_of(date),
        ViewUnit::Day => date.calendar_day(),
    }
}

/// Whole-day delta for a horizontal drag of `delta_px` pixels.
///
/// Week view moves in whole weeks.
pub fn days_for_drag(delta_px: f32, cell_width: f32, unit: ViewUnit) -> i64 {
    if !(cell_width > 0.0) || !delta_px.is_finite() {
        return 0;
    }
    match unit {
        ViewUnit::Week => (delta_px / (cell_width * 7.0)).round() as i64 * 7,
        ViewUnit::Day => (delta_px / cell_width).round() as i64,
    }
}

/// Add `days` to `date`, saturating at chrono's representable range.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Parse a date as `YYYY-MM-DD`, or a timestamp whose time part is dropped.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(stamp.calendar_day());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(stamp.calendar_day());
    }
    Err(TimelineError::InvalidDate {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_pixel_for_monday_two_weeks_out() {
        // 2024-01-01 is a Monday.
        let px = to_pixel(d(2024, 1, 15), d(2024, 1, 1), 20.0, ViewUnit::Week);
        assert_eq!(px, 280.0);
    }

    #[test]
    fn week_pixel_includes_day_offset() {
        // Wednesday of the second week.
        let px = to_pixel(d(2024, 1, 10), d(2024, 1, 1), 20.0, ViewUnit::Week);
        assert_eq!(px, 7.0 * 20.0 + 2.0 * 20.0);
    }

    #[test]
    fn week_pixel_with_mid_week_origin() {
        // Origin on a Thursday still anchors to its Monday.
        let px = to_pixel(d(2024, 1, 8), d(2024, 1, 4), 10.0, ViewUnit::Week);
        assert_eq!(px, 70.0);
        let before = to_pixel(d(2023, 12, 25), d(2024, 1, 4), 10.0, ViewUnit::Week);
        assert_eq!(before, -70.0);
    }

    #[test]
    fn day_pixel_is_day_count() {
        assert_eq!(to_pixel(d(2024, 3, 1), d(2024, 2, 1), 30.0, ViewUnit::Day), 29.0 * 30.0);
        assert_eq!(to_pixel(d(2024, 1, 31), d(2024, 2, 1), 30.0, ViewUnit::Day), -30.0);
    }

    #[test]
    fn time_of_day_is_ignored() {
        let late = d(2024, 1, 5).and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        let early = d(2024, 1, 5).and_time(NaiveTime::from_hms_opt(0, 1, 0).unwrap());
        let origin = d(2024, 1, 1).and_time(NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(
            to_pixel(late, origin, 30.0, ViewUnit::Day),
            to_pixel(early, origin, 30.0, ViewUnit::Day)
        );
        assert_eq!(to_pixel(late, origin, 30.0, ViewUnit::Day), 120.0);

        let utc = Utc.from_utc_datetime(&late);
        assert_eq!(to_pixel(utc, origin, 30.0, ViewUnit::Day), 120.0);
    }

    #[test]
    fn to_date_rounds_to_nearest_day() {
        let origin = d(2024, 1, 1);
        assert_eq!(to_date(44.0, origin, 30.0, ViewUnit::Day), d(2024, 1, 2));
        assert_eq!(to_date(46.0, origin, 30.0, ViewUnit::Day), d(2024, 1, 3));
        assert_eq!(to_date(280.0, origin, 20.0, ViewUnit::Week), d(2024, 1, 15));
    }

    #[test]
    fn to_date_guards_zero_width() {
        let origin = d(2024, 6, 1);
        assert_eq!(to_date(120.0, origin, 0.0, ViewUnit::Day), origin);
        assert_eq!(to_date(120.0, origin, f32::NAN, ViewUnit::Week), origin);
    }

    #[test]
    fn drag_days_snap_to_weeks_in_week_view() {
        assert_eq!(days_for_drag(65.0, 30.0, ViewUnit::Day), 2);
        assert_eq!(days_for_drag(-44.0, 30.0, ViewUnit::Day), -1);
        assert_eq!(days_for_drag(150.0, 20.0, ViewUnit::Week), 7);
        assert_eq!(days_for_drag(50.0, 20.0, ViewUnit::Week), 0);
        assert_eq!(days_for_drag(50.0, 0.0, ViewUnit::Day), 0);
    }

    #[test]
    fn snap_and_monday() {
        assert_eq!(monday_of(d(2024, 1, 7)), d(2024, 1, 1));
        assert_eq!(snap_to_unit(d(2024, 1, 7), ViewUnit::Week), d(2024, 1, 1));
        assert_eq!(snap_to_unit(d(2024, 1, 7), ViewUnit::Day), d(2024, 1, 7));
    }

    #[test]
    fn parse_accepts_dates_and_timestamps() {
        assert_eq!(parse_date("2025-05-03").unwrap(), d(2025, 5, 3));
        assert_eq!(parse_date(" 2025-05-03T10:30:00Z ").unwrap(), d(2025, 5, 3));
        assert_eq!(parse_date("2025-05-03T10:30:00").unwrap(), d(2025, 5, 3));
        assert!(matches!(
            parse_date("03/05/2025"),
            Err(TimelineError::InvalidDate { .. })
        ));
        assert!(parse_date("2025-02-30").is_err());
    }
}
