// src/time/dates.rs

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static DAY_MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[./](\d{1,2})").expect("day/month regex"));

/// `dd/mm` or `dd.mm` anywhere in `text` → `MM-DD`.
///
/// Validated against a leap year so `29/02` passes.
pub fn day_month(text: &str) -> Option<String> {
    let (day, month) = split_day_month(text)?;
    NaiveDate::from_ymd_opt(2000, month, day).map(|d| d.format("%m-%d").to_string())
}

/// `dd.mm` (or `dd/mm`) plus the season year → `YYYY-MM-DD`.
pub fn full_date(year: i32, text: &str) -> Option<String> {
    let (day, month) = split_day_month(text)?;
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn split_day_month(text: &str) -> Option<(u32, u32)> {
    let caps = DAY_MONTH_RE.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    Some((day, month))
}
