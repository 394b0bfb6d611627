// src/time/mod.rs

//! Race time arithmetic: canonical `H:MM:SS` durations, gaps to the leader
//! and bonus seconds.

pub mod dates;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Result, TableError};
use crate::table::value::Value;

/// Marks a rider given the same time as the rider above.
pub const TIED_MARKER: &str = ",,";
/// Seconds unit sign used by bonus and ranked-equal annotations.
pub const PRIME_MARKER: char = '″';
pub const ZERO_TIME: &str = "0:00:00";

static BONUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?)(\d+)(?::(\d{1,2}))?$").expect("bonus regex"));

/// Parse `SS`, `MM:SS` or `H:MM:SS` (optionally signed, inner spaces ignored)
/// into signed seconds.
pub fn parse_duration(text: &str) -> Result<i64> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(cleaned.as_str())),
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() > 3 {
        return Err(TableError::InvalidTime(text.to_string()));
    }

    let mut total: i64 = 0;
    for part in &parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(TableError::InvalidTime(text.to_string()));
        }
        total = part
            .parse::<i64>()
            .ok()
            .and_then(|n| total.checked_mul(60)?.checked_add(n))
            .ok_or_else(|| TableError::InvalidTime(text.to_string()))?;
    }

    Ok(if negative { -total } else { total })
}

/// Render signed seconds as `H:MM:SS` (`-H:MM:SS` when negative).
pub fn format_seconds(total: i64) -> String {
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.unsigned_abs();
    format!("{}{}:{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60, abs % 60)
}

/// Normalise duration text of any granularity into `H:MM:SS`.
pub fn format_time(text: &str) -> Result<String> {
    parse_duration(text).map(format_seconds)
}

/// Sum of two durations, canonical.
pub fn add_times(a: &str, b: &str) -> Result<String> {
    let sum = parse_duration(a)?
        .checked_add(parse_duration(b)?)
        .ok_or_else(|| TableError::InvalidTime(format!("{} + {}", a, b)))?;
    Ok(format_seconds(sum))
}

/// Bonus (or penalty) seconds as a signed canonical duration.
///
/// Accepts `N`, `-N`, `M:SS` and `-M:SS`, with or without the `″` unit.
/// Anything else is treated as no bonus.
pub fn parse_bonus(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != PRIME_MARKER && *c != '"' && *c != '\'')
        .collect();
    if cleaned.is_empty() {
        return ZERO_TIME.to_string();
    }
    let Some(caps) = BONUS_RE.captures(&cleaned) else {
        debug!(text, "unparseable bonus, using zero");
        return ZERO_TIME.to_string();
    };

    let first = caps[2].parse::<i64>().ok();
    let seconds = match caps.get(3) {
        Some(secs) => first.and_then(|minutes| {
            minutes
                .checked_mul(60)?
                .checked_add(secs.as_str().parse().ok()?)
        }),
        None => first,
    };
    let Some(seconds) = seconds else {
        debug!(text, "bonus out of range, using zero");
        return ZERO_TIME.to_string();
    };
    let signed = if &caps[1] == "-" { -seconds } else { seconds };
    format_seconds(signed)
}

/// Pick the rider's own time out of a (possibly multi-line) time cell.
///
/// Lines carrying the tied or ranked-equal markers are skipped. A lone dash
/// means no time.
pub fn time_cell(text: &str) -> Option<String> {
    let line = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .find(|l| !l.contains(TIED_MARKER) && !l.contains(PRIME_MARKER))?;
    if line == "-" {
        return None;
    }
    match format_time(line) {
        Ok(t) => Some(t),
        Err(e) => {
            debug!(line, error = %e, "time cell not parseable");
            None
        }
    }
}

/// Turn gaps to the leader into absolute times, in place.
///
/// `times[0]` is the leader's elapsed time. An unparseable gap right after
/// the leader counts as zero; later ones repeat the previous row's absolute
/// time.
pub fn absolutize(times: &mut [Value]) {
    if times.len() < 2 {
        return;
    }
    let leader = match times[0].as_str().map(parse_duration) {
        Some(Ok(secs)) => secs,
        _ => {
            warn!(leader = %times[0], "leader time unusable, leaving gaps relative");
            return;
        }
    };
    times[0] = Value::Time(format_seconds(leader));

    for i in 1..times.len() {
        let absolute = times[i]
            .as_str()
            .and_then(|t| parse_duration(t).ok())
            .and_then(|gap| leader.checked_add(gap));
        times[i] = match absolute {
            Some(secs) => Value::Time(format_seconds(secs)),
            None if i == 1 => Value::Time(format_seconds(leader)),
            None => times[i - 1].clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_normalises_granularity() {
        assert_eq!(format_time("5").unwrap(), "0:00:05");
        assert_eq!(format_time("3:07").unwrap(), "0:03:07");
        assert_eq!(format_time("4:12:09").unwrap(), "4:12:09");
        assert_eq!(format_time("04:12:09").unwrap(), "4:12:09");
        assert_eq!(format_time("75").unwrap(), "0:01:15");
        assert_eq!(format_time(" 1 : 02 : 03 ").unwrap(), "1:02:03");
        assert!(format_time("-").is_err());
        assert!(format_time("").is_err());
        assert!(format_time("1:2:3:4").is_err());
    }

    #[test]
    fn format_time_is_idempotent() {
        for input in ["5", "3:07", "104:12:09", "-0:10", "59:59"] {
            let once = format_time(input).unwrap();
            assert_eq!(format_time(&once).unwrap(), once, "input {input}");
        }
    }

    #[test]
    fn zero_is_identity_for_add_times() {
        for input in ["5", "3:07", "4:12:09"] {
            assert_eq!(add_times(ZERO_TIME, input).unwrap(), format_time(input).unwrap());
        }
        assert_eq!(add_times("1:59:50", "0:15").unwrap(), "2:00:05");
        assert_eq!(add_times("0:00:05", "-0:00:10").unwrap(), "-0:00:05");
    }

    #[test]
    fn add_times_rejects_overflowing_sums() {
        assert_eq!(
            add_times("9223372036854775807", "1").unwrap_err(),
            TableError::InvalidTime("9223372036854775807 + 1".into())
        );
        assert!(add_times("-9223372036854775807", "-1:00").is_err());
        assert_eq!(format_seconds(i64::MIN), "-2562047788015215:30:08");
    }

    #[test]
    fn oversized_bonus_counts_as_none() {
        assert_eq!(parse_bonus("999999999999999999:00″"), ZERO_TIME);
        assert_eq!(parse_bonus("99999999999999999999"), ZERO_TIME);
    }

    #[test]
    fn absolutize_treats_overflowing_gap_as_unparseable() {
        let huge = "9223372036854775807";
        let mut times: Vec<Value> = ["1:00:00", huge, "0:10", huge]
            .into_iter()
            .map(Value::from)
            .collect();
        absolutize(&mut times);
        let got: Vec<_> = times.iter().map(|v| v.as_str().unwrap()).collect();
        assert_eq!(got, vec!["1:00:00", "1:00:00", "1:00:10", "1:00:10"]);
    }

    #[test]
    fn bonus_variants() {
        assert_eq!(parse_bonus("10″"), "0:00:10");
        assert_eq!(parse_bonus("-20″"), "-0:00:20");
        assert_eq!(parse_bonus("1:05″"), "0:01:05");
        assert_eq!(parse_bonus("-1:05"), "-0:01:05");
        assert_eq!(parse_bonus(" 4 ″ "), "0:00:04");
        assert_eq!(parse_bonus(""), ZERO_TIME);
        assert_eq!(parse_bonus("n/a"), ZERO_TIME);
    }

    #[test]
    fn time_cell_skips_marker_lines() {
        assert_eq!(time_cell(",,\n0:12"), Some("0:00:12".into()));
        assert_eq!(time_cell("0:12\n,,"), Some("0:00:12".into()));
        assert_eq!(time_cell("  \n5″\n1:02:03"), Some("1:02:03".into()));
        assert_eq!(time_cell("-"), None);
        assert_eq!(time_cell(",,"), None);
        assert_eq!(time_cell("DNF"), None);
    }

    #[test]
    fn absolutize_repeats_previous_on_bad_gap() {
        let mut times: Vec<Value> = ["1:00:00", "0:00:10", "-", "0:00:20"]
            .into_iter()
            .map(Value::from)
            .collect();
        absolutize(&mut times);
        let got: Vec<_> = times.iter().map(|v| v.as_str().unwrap()).collect();
        assert_eq!(got, vec!["1:00:00", "1:00:10", "1:00:10", "1:00:30"]);
    }

    #[test]
    fn absolutize_zero_gap_right_after_leader() {
        let mut times = vec![
            Value::Time("2:00:00".into()),
            Value::Null,
            Value::Time("0:00:30".into()),
            Value::Null,
        ];
        absolutize(&mut times);
        assert_eq!(
            times,
            vec![
                Value::Time("2:00:00".into()),
                Value::Time("2:00:00".into()),
                Value::Time("2:00:30".into()),
                Value::Time("2:00:30".into()),
            ]
        );
    }

    #[test]
    fn absolutize_leaves_table_without_leader() {
        let mut times = vec![Value::Null, Value::Time("0:00:10".into())];
        absolutize(&mut times);
        assert_eq!(times[1], Value::Time("0:00:10".into()));

        let mut single = vec![Value::Time("0:10".into())];
        absolutize(&mut single);
        assert_eq!(single[0], Value::Time("0:10".into()));
    }
}
