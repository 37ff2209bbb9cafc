//! Dashboard list views.
//!
//! Each dashboard fetches a list once and re-derives its table from that list and the current
//! query on every change. Queries are plain values; applying one never touches the network.
//!
//! - [`admin`]: all patients, for staff
//! - [`doctor`]: the doctor's diagnoses, with summary statistics
//! - [`patient`]: the logged-in patient's own medical records
//!
//! All filters are conjunctive and a `None` filter means "All". Sorting is stable, so rows with
//! equal keys keep their source order. Rows without a date sort as the oldest.

pub mod admin;
pub mod doctor;
pub mod patient;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::str::FromStr;

/// Direction of the date sort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Latest,
    Oldest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "newest" => Ok(SortOrder::Latest),
            "oldest" => Ok(SortOrder::Oldest),
            other => Err(format!("unknown sort order: {other} (expected latest or oldest)")),
        }
    }
}

/// Date bucket filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateRange {
    #[default]
    AllTime,
    /// On or after the first day of the current month.
    ThisMonth,
    /// On or after the most recent Sunday.
    ThisWeek,
    /// Exactly this day.
    On(NaiveDate),
}

impl DateRange {
    /// Whether a row dated `day` falls in this bucket, relative to `today`.
    ///
    /// Undated rows only match [`DateRange::AllTime`].
    pub fn contains(self, day: Option<NaiveDate>, today: NaiveDate) -> bool {
        let Some(day) = day else {
            return self == DateRange::AllTime;
        };
        match self {
            DateRange::AllTime => true,
            DateRange::ThisMonth => day >= today.with_day(1).unwrap_or(today),
            DateRange::ThisWeek => day >= start_of_week(today),
            DateRange::On(date) => day == date,
        }
    }
}

fn start_of_week(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_sunday()))
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all-time" => Ok(DateRange::AllTime),
            "month" | "this-month" => Ok(DateRange::ThisMonth),
            "week" | "this-week" => Ok(DateRange::ThisWeek),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(DateRange::On)
                .map_err(|_| {
                    format!("unknown date range: {other} (expected all, month, week or YYYY-MM-DD)")
                }),
        }
    }
}

/// What a dashboard renders: a table, or an empty-state message instead of one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardView<T> {
    Empty { message: &'static str },
    Table(Vec<T>),
}

impl<T> DashboardView<T> {
    pub fn rows(&self) -> &[T] {
        match self {
            DashboardView::Empty { .. } => &[],
            DashboardView::Table(rows) => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DashboardView::Empty { .. })
    }
}

/// Stable-sort the filtered rows and wrap them in a view.
pub(crate) fn finish<T>(
    mut rows: Vec<T>,
    order: SortOrder,
    key: impl Fn(&T) -> Option<NaiveDateTime>,
    empty_message: &'static str,
) -> DashboardView<T> {
    if rows.is_empty() {
        return DashboardView::Empty {
            message: empty_message,
        };
    }
    rows.sort_by(|a, b| {
        let ord = key(a).cmp(&key(b));
        match order {
            SortOrder::Oldest => ord,
            SortOrder::Latest => ord.reverse(),
        }
    });
    DashboardView::Table(rows)
}

/// Case-insensitive substring match against any of `fields`. A blank needle matches everything.
pub(crate) fn matches_search(needle: &str, fields: &[Option<&str>]) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Case-insensitive equality for an optional categorical filter.
pub(crate) fn matches_choice(filter: Option<&str>, value: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(wanted) => value.is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted.trim())),
    }
}

/// Distinct non-blank values in first-seen order, used to populate filter options.
pub fn distinct_values<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values.into_iter().flatten() {
        let value = value.trim();
        if !value.is_empty() && !seen.iter().any(|s| s == value) {
            seen.push(value.to_owned());
        }
    }
    seen
}
