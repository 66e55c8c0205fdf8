//! Calendar date arithmetic shared by every screen.
//!
//! Dates travel as ISO `YYYY-MM-DD` strings on the wire and in UI state, so
//! every helper here accepts and returns strings and parses through
//! `chrono::NaiveDate` internally. Weeks start on Monday.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Short weekday labels, Monday first
pub const WEEKDAY_LABELS: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

const WEEKDAY_SHORT_LOWER: [&str; 7] = ["пн", "вт", "ср", "чт", "пт", "сб", "вс"];

const MONTH_NAMES: [&str; 12] = [
    "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь",
    "Июль", "Август", "Сентябрь", "Октябрь", "Ноябрь", "Декабрь",
];

const MONTH_NAMES_GENITIVE: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня",
    "июля", "августа", "сентября", "октября", "ноября", "декабря",
];

/// A real day inside a month grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub day: u32,
    pub iso: String,
}

pub fn parse_iso_date(iso: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(iso.trim(), ISO_FORMAT).ok()
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn iso_for(year: i32, month: u32, day: u32) -> String {
    format!("{:04}-{:02}-{:02}", year, month, day)
}

/// Check if a year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Number of days in a 1-based month; 0 for an invalid month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) { 29 } else { 28 }
        }
        _ => 0,
    }
}

/// Column of a date in a Monday-first week (Monday = 0 … Sunday = 6).
///
/// Rotates the Sunday-first weekday number: `(sunday_based + 6) % 7`.
pub fn iso_weekday(date: NaiveDate) -> u32 {
    (date.weekday().num_days_from_sunday() + 6) % 7
}

/// Build the grid for a month given its zero-based index.
///
/// Cells before day 1 and after the last day are `None`; the grid always
/// consists of whole weeks, so its length is 28, 35 or 42. An index past 11
/// rolls over into the following years.
pub fn build_month_grid(year: i32, month_index: u32) -> Vec<Option<GridCell>> {
    let year = year + (month_index / 12) as i32;
    let month = month_index % 12 + 1;
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let offset = iso_weekday(first) as usize;
    let total = days_in_month(year, month);

    let mut cells: Vec<Option<GridCell>> = Vec::with_capacity(42);
    cells.resize(offset, None);
    for day in 1..=total {
        cells.push(Some(GridCell {
            day,
            iso: iso_for(year, month, day),
        }));
    }
    while cells.len() % 7 != 0 {
        cells.push(None);
    }
    cells
}

/// Same as [`build_month_grid`] but always padded to six weeks
pub fn build_fixed_month_grid(year: i32, month_index: u32) -> Vec<Option<GridCell>> {
    let mut cells = build_month_grid(year, month_index);
    if !cells.is_empty() {
        cells.resize(42, None);
    }
    cells
}

/// Shift an ISO date by a number of days
pub fn add_days(iso: &str, delta: i64) -> Option<String> {
    let date = parse_iso_date(iso)?;
    date.checked_add_signed(Duration::days(delta)).map(format_iso_date)
}

/// The seven ISO dates of the Monday-first week containing `iso`
pub fn week_days(iso: &str) -> Option<Vec<String>> {
    let date = parse_iso_date(iso)?;
    let monday = date - Duration::days(iso_weekday(date) as i64);
    Some(
        (0..7)
            .map(|offset| format_iso_date(monday + Duration::days(offset)))
            .collect(),
    )
}

/// Nominative month name for a zero-based month index
pub fn month_name(month_index: u32) -> &'static str {
    MONTH_NAMES[(month_index % 12) as usize]
}

/// `"Январь 2025"` for a zero-based month index
pub fn month_label(year: i32, month_index: u32) -> String {
    let year = year + (month_index / 12) as i32;
    format!("{} {}", MONTH_NAMES[(month_index % 12) as usize], year)
}

/// `DD.MM` for compact visit lists
pub fn format_day_short(iso: &str) -> String {
    match parse_iso_date(iso) {
        Some(date) => date.format("%d.%m").to_string(),
        None => iso.to_string(),
    }
}

/// `DD.MM.YYYY`, or the input unchanged when it is not an ISO date
pub fn format_date_display(iso: &str) -> String {
    match parse_iso_date(iso) {
        Some(date) => date.format("%d.%m.%Y").to_string(),
        None => iso.to_string(),
    }
}

/// Day header such as `"пт, 13 июня"`
pub fn format_date_title(iso: &str) -> String {
    match parse_iso_date(iso) {
        Some(date) => format!(
            "{}, {} {}",
            WEEKDAY_SHORT_LOWER[iso_weekday(date) as usize],
            date.day(),
            MONTH_NAMES_GENITIVE[date.month0() as usize]
        ),
        None => iso.to_string(),
    }
}

/// Month being browsed in a month grid, `YYYY-MM` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthCursor {
    pub year: i32,
    /// 1-based month
    pub month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Parse `YYYY-MM`
    pub fn parse(value: &str) -> Option<Self> {
        let (year, month) = value.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    /// The month containing an ISO date
    pub fn from_iso_date(iso: &str) -> Option<Self> {
        let date = parse_iso_date(iso)?;
        Some(Self {
            year: date.year(),
            month: date.month(),
        })
    }

    pub fn month_index(&self) -> u32 {
        self.month - 1
    }

    /// Move by whole months, rolling the year as needed
    pub fn shift(&self, delta: i32) -> Self {
        let zero_based = self.year * 12 + self.month as i32 - 1 + delta;
        Self {
            year: zero_based.div_euclid(12),
            month: zero_based.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day_iso(&self) -> String {
        iso_for(self.year, self.month, 1)
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn label(&self) -> String {
        month_label(self.year, self.month_index())
    }

    pub fn grid(&self) -> Vec<Option<GridCell>> {
        build_month_grid(self.year, self.month_index())
    }
}

impl fmt::Display for MonthCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2025, 13), 0);
    }

    #[test]
    fn test_month_grid_invariants_for_every_month() {
        for year in [1900, 1999, 2000, 2015, 2024, 2025, 2026, 2100] {
            for month_index in 0..12u32 {
                let grid = build_month_grid(year, month_index);
                let weeks = grid.len() / 7;
                assert_eq!(grid.len() % 7, 0, "{}-{}", year, month_index);
                assert!((4..=6).contains(&weeks), "{}-{}: {} weeks", year, month_index, weeks);

                let real: Vec<&GridCell> = grid.iter().flatten().collect();
                assert_eq!(real.len() as u32, days_in_month(year, month_index + 1));

                let first_column = grid.iter().position(|cell| cell.is_some()).unwrap();
                let first = NaiveDate::from_ymd_opt(year, month_index + 1, 1).unwrap();
                assert_eq!(first_column as u32, first.weekday().num_days_from_monday());

                for (i, cell) in real.iter().enumerate() {
                    assert_eq!(cell.day, i as u32 + 1);
                }
            }
        }
    }

    #[test]
    fn test_month_grid_known_layouts() {
        // February 2021 starts on a Monday and has exactly four weeks
        let grid = build_month_grid(2021, 1);
        assert_eq!(grid.len(), 28);
        assert_eq!(grid[0].as_ref().unwrap().iso, "2021-02-01");

        // June 2025 starts on a Sunday
        let grid = build_month_grid(2025, 5);
        assert!(grid[..6].iter().all(|cell| cell.is_none()));
        assert_eq!(grid[6].as_ref().unwrap().iso, "2025-06-01");
        assert_eq!(grid.len(), 42);
    }

    #[test]
    fn test_fixed_month_grid_is_always_42() {
        assert_eq!(build_fixed_month_grid(2021, 1).len(), 42);
        assert_eq!(build_fixed_month_grid(2025, 5).len(), 42);
    }

    #[test]
    fn test_month_index_rolls_over() {
        let grid = build_month_grid(2024, 12);
        assert_eq!(grid.iter().flatten().next().unwrap().iso, "2025-01-01");
        assert_eq!(month_label(2024, 12), "Январь 2025");
    }

    #[test]
    fn test_iso_weekday_rotation() {
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        assert_eq!(iso_weekday(sunday), 6);
        assert_eq!(iso_weekday(monday), 0);
    }

    #[test]
    fn test_add_days() {
        assert_eq!(add_days("2025-06-30", 1).as_deref(), Some("2025-07-01"));
        assert_eq!(add_days("2025-01-01", -1).as_deref(), Some("2024-12-31"));
        assert_eq!(add_days("2024-02-28", 1).as_deref(), Some("2024-02-29"));
        assert_eq!(add_days("not-a-date", 1), None);
    }

    #[test]
    fn test_week_days() {
        let week = week_days("2025-06-15").unwrap();
        assert_eq!(week.first().unwrap(), "2025-06-09");
        assert_eq!(week.last().unwrap(), "2025-06-15");
        assert_eq!(week.len(), 7);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(format_day_short("2025-06-13"), "13.06");
        assert_eq!(format_date_display("2025-06-13"), "13.06.2025");
        assert_eq!(format_date_display("invalid-date"), "invalid-date");
        assert_eq!(format_date_title("2025-06-13"), "пт, 13 июня");
    }

    #[test]
    fn test_month_cursor_navigation() {
        let cursor = MonthCursor::parse("2025-01").unwrap();
        assert_eq!(cursor.shift(-1).to_string(), "2024-12");
        assert_eq!(cursor.shift(1).to_string(), "2025-02");
        assert_eq!(cursor.shift(12).to_string(), "2026-01");
        assert_eq!(cursor.shift(-13).to_string(), "2023-12");
        assert_eq!(cursor.first_day_iso(), "2025-01-01");
        assert_eq!(cursor.label(), "Январь 2025");
        assert!(MonthCursor::parse("2025-13").is_none());
        assert_eq!(MonthCursor::from_iso_date("2025-06-13"), MonthCursor::new(2025, 6));
    }
}
