//! Grid cell generation and the overlays derived from it.
//!
//! The cell list is the single source for weekend/holiday shading and for
//! month/week border emphasis. It is regenerated in full whenever origin,
//! view unit, zoom or the holiday set changes.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::mapper::{self, ViewUnit};

/// One column of the timeline grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub date: NaiveDate,
    /// Left edge, relative to the origin.
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub is_weekend: bool,
    pub is_holiday: bool,
    pub is_today: bool,
    pub is_first_of_month: bool,
    pub is_first_of_week: bool,
}

impl GridCell {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Non-working day: weekend or holiday.
    pub fn is_off_day(&self) -> bool {
        self.is_weekend || self.is_holiday
    }
}

/// A named holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    #[serde(default)]
    pub name: String,
}

/// Caller-supplied set of holidays. Empty by default; no calendar is built in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    days: HashMap<NaiveDate, String>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, name: impl Into<String>) {
        self.days.insert(date, name.into());
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn name(&self, date: NaiveDate) -> Option<&str> {
        self.days.get(&date).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// True when any day in `[start, start + days)` is a holiday.
    fn any_in(&self, start: NaiveDate, days: i64) -> bool {
        (0..days).any(|offset| self.contains(mapper::shift_days(start, offset)))
    }
}

impl FromIterator<Holiday> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = Holiday>>(iter: I) -> Self {
        let mut calendar = Self::new();
        for holiday in iter {
            calendar.insert(holiday.date, holiday.name);
        }
        calendar
    }
}

impl FromIterator<NaiveDate> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        let mut calendar = Self::new();
        for date in iter {
            calendar.insert(date, String::new());
        }
        calendar
    }
}

/// Unit-stepped dates between `start` and `end` inclusive.
///
/// Week view starts at the Monday on or before `start`.
pub fn visible_dates(start: NaiveDate, end: NaiveDate, unit: ViewUnit) -> Vec<NaiveDate> {
    let mut date = mapper::snap_to_unit(start, unit);
    let step = unit.days();
    let mut dates = Vec::new();
    while date <= end {
        dates.push(date);
        let next = mapper::shift_days(date, step);
        if next <= date {
            break;
        }
        date = next;
    }
    dates
}

/// Build the grid cell list for `visible_dates`.
///
/// Returns an empty list when the cell width is not positive.
pub fn generate_cells(
    visible_dates: &[NaiveDate],
    origin: NaiveDate,
    cell_width: f32,
    cell_height: f32,
    unit: ViewUnit,
    today: NaiveDate,
    holidays: &HolidayCalendar,
) -> Vec<GridCell> {
    if !(cell_width > 0.0) || !cell_width.is_finite() {
        return Vec::new();
    }
    let span = unit.days();
    let width = cell_width * span as f32;

    visible_dates
        .iter()
        .enumerate()
        .map(|(index, &date)| {
            let previous = index.checked_sub(1).map(|i| visible_dates[i]);
            let is_first_of_month = match previous {
                None => true,
                Some(prev) => prev.month() != date.month() || prev.year() != date.year(),
            };
            let is_first_of_week = match unit {
                ViewUnit::Week => true,
                ViewUnit::Day => previous.is_none() || date.weekday() == Weekday::Mon,
            };
            let (is_weekend, is_holiday, is_today) = match unit {
                ViewUnit::Day => (
                    matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
                    holidays.contains(date),
                    date == today,
                ),
                ViewUnit::Week => (
                    false,
                    holidays.any_in(date, span),
                    mapper::monday_of(today) == mapper::monday_of(date),
                ),
            };

            GridCell {
                date,
                x: mapper::to_pixel(date, origin, cell_width, unit),
                width,
                height: cell_height,
                is_weekend,
                is_holiday,
                is_today,
                is_first_of_month,
                is_first_of_week,
            }
        })
        .collect()
}

/// Border emphasis for a cell's leading edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Month,
    Week,
    None,
}

pub fn boundary_emphasis(cell: &GridCell) -> Boundary {
    if cell.is_first_of_month {
        Boundary::Month
    } else if cell.is_first_of_week {
        Boundary::Week
    } else {
        Boundary::None
    }
}

/// Cells that get weekend/holiday shading.
pub fn holiday_overlays(cells: &[GridCell]) -> impl Iterator<Item = &GridCell> {
    cells.iter().filter(|cell| cell.is_off_day())
}

/// Consecutive columns belonging to one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup {
    pub year: i32,
    pub month: u32,
    pub start_index: usize,
    pub width: f32,
    pub label: String,
}

/// Group columns by month for the upper header band.
pub fn month_groups(visible_dates: &[NaiveDate], column_width: f32) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();
    for (index, date) in visible_dates.iter().enumerate() {
        match groups.last_mut() {
            Some(group) if group.year == date.year() && group.month == date.month() => {
                group.width += column_width;
            }
            _ => groups.push(MonthGroup {
                year: date.year(),
                month: date.month(),
                start_index: index,
                width: column_width,
                label: date.format("%b %Y").to_string(),
            }),
        }
    }
    groups
}

/// Label for a week column: `M/D-D` within a month, `M/D-M/D` across months.
///
/// `include_month` adds the month to the short form (first week shown in a month).
pub fn week_label(week_start: NaiveDate, include_month: bool) -> String {
    let week_end = mapper::shift_days(week_start, 6);
    if week_start.month() == week_end.month() {
        if include_month {
            format!("{}/{}-{}", week_start.month(), week_start.day(), week_end.day())
        } else {
            format!("{}-{}", week_start.day(), week_end.day())
        }
    } else {
        format!(
            "{}/{}-{}/{}",
            week_start.month(),
            week_start.day(),
            week_end.month(),
            week_end.day()
        )
    }
}

/// Position of the vertical "today" marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TodayIndicator {
    pub x: f32,
    pub width: f32,
}

pub fn today_indicator(
    today: NaiveDate,
    origin: NaiveDate,
    cell_width: f32,
    unit: ViewUnit,
    zoom_ratio: f32,
) -> TodayIndicator {
    TodayIndicator {
        x: mapper::to_pixel(today, origin, cell_width, unit),
        width: (3.0 * zoom_ratio).round().max(2.0),
    }
}
