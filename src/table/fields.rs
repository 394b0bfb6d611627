// src/table/fields.rs

//! The closed catalog of extractable fields and the strategy behind each.
//!
//! [`REGISTRY`] is built once and never mutated, so it can be shared by any
//! number of concurrent extractions. Strategies are plain data (selectors,
//! keywords, `fn` transforms); [`RowAssembler`](super::RowAssembler)
//! interprets them against whatever [`TreeNode`](crate::tree::TreeNode)
//! binding it was built on.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::{fmt, str::FromStr};

use super::value::Value;
use crate::error::{Result, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    RiderUrl,
    RiderName,
    TeamUrl,
    TeamName,
    StageUrl,
    StageName,
    RaceUrl,
    RaceName,
    NationUrl,
    NationName,
    ClimbUrl,
    ClimbName,
    Age,
    Nationality,
    Time,
    Bonus,
    ProfileIcon,
    Season,
    RiderNumber,
    Rank,
    Status,
    PrevRank,
    PcsPoints,
    UciPoints,
    Points,
    Class,
    FirstPlaces,
    SecondPlaces,
    ThirdPlaces,
    Distance,
    Date,
}

impl Field {
    pub const ALL: [Field; 31] = [
        Field::RiderUrl,
        Field::RiderName,
        Field::TeamUrl,
        Field::TeamName,
        Field::StageUrl,
        Field::StageName,
        Field::RaceUrl,
        Field::RaceName,
        Field::NationUrl,
        Field::NationName,
        Field::ClimbUrl,
        Field::ClimbName,
        Field::Age,
        Field::Nationality,
        Field::Time,
        Field::Bonus,
        Field::ProfileIcon,
        Field::Season,
        Field::RiderNumber,
        Field::Rank,
        Field::Status,
        Field::PrevRank,
        Field::PcsPoints,
        Field::UciPoints,
        Field::Points,
        Field::Class,
        Field::FirstPlaces,
        Field::SecondPlaces,
        Field::ThirdPlaces,
        Field::Distance,
        Field::Date,
    ];

    /// Row key under which the field is stored.
    pub fn name(self) -> &'static str {
        match self {
            Field::RiderUrl => "rider_url",
            Field::RiderName => "rider_name",
            Field::TeamUrl => "team_url",
            Field::TeamName => "team_name",
            Field::StageUrl => "stage_url",
            Field::StageName => "stage_name",
            Field::RaceUrl => "race_url",
            Field::RaceName => "race_name",
            Field::NationUrl => "nation_url",
            Field::NationName => "nation_name",
            Field::ClimbUrl => "climb_url",
            Field::ClimbName => "climb_name",
            Field::Age => "age",
            Field::Nationality => "nationality",
            Field::Time => "time",
            Field::Bonus => "bonus",
            Field::ProfileIcon => "profile_icon",
            Field::Season => "season",
            Field::RiderNumber => "rider_number",
            Field::Rank => "rank",
            Field::Status => "status",
            Field::PrevRank => "prev_rank",
            Field::PcsPoints => "pcs_points",
            Field::UciPoints => "uci_points",
            Field::Points => "points",
            Field::Class => "class",
            Field::FirstPlaces => "first_places",
            Field::SecondPlaces => "second_places",
            Field::ThirdPlaces => "third_places",
            Field::Distance => "distance",
            Field::Date => "date",
        }
    }

    pub fn strategy(self) -> Result<&'static Strategy> {
        REGISTRY
            .get(&self)
            .ok_or_else(|| TableError::UnknownField(self.name().to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| TableError::UnknownField(wanted.to_string()))
    }
}

/// Resolve requested field names against the fields a table offers.
/// An empty request means every available field.
pub fn select_fields<S: AsRef<str>>(requested: &[S], available: &[Field]) -> Result<Vec<Field>> {
    if requested.is_empty() {
        return Ok(available.to_vec());
    }
    requested
        .iter()
        .map(|name| {
            let field: Field = name.as_ref().parse()?;
            if available.contains(&field) {
                Ok(field)
            } else {
                Err(TableError::FieldUnavailable(field.name().to_string()))
            }
        })
        .collect()
}

/* ---------------- strategies ---------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutput {
    Href,
    Text,
}

/// Scan every anchor whose link starts with `keyword`.
pub struct AnchorRule {
    pub keyword: &'static str,
    pub output: LinkOutput,
    /// Called with `(href, text)`; `false` drops the anchor.
    pub keep: fn(&str, &str) -> bool,
    /// Header column tried first, before scanning anchors.
    pub header_column: Option<&'static str>,
}

/// Elements carrying a marker class, mapped to rows in document order.
pub struct MarkerRule {
    pub selector: &'static str,
    /// Called with the trimmed text and class tokens; `None` drops the element.
    pub read: fn(&str, &[&str]) -> Option<Value>,
}

/// A header-indexed column with a per-cell transform.
pub struct HeaderRule {
    /// Candidate labels, tried in order.
    pub labels: &'static [&'static str],
    pub parse: fn(&str) -> Value,
    /// Fill value when no candidate label is in the header.
    pub on_missing: Option<Value>,
}

pub enum Strategy {
    Anchor(AnchorRule),
    Marker(MarkerRule),
    Header(HeaderRule),
    Time,
    Bonus,
    StageUrl,
    StageName,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Anchor(rule) => f
                .debug_struct("Anchor")
                .field("keyword", &rule.keyword)
                .field("output", &rule.output)
                .field("header_column", &rule.header_column)
                .finish(),
            Strategy::Marker(rule) => f
                .debug_struct("Marker")
                .field("selector", &rule.selector)
                .finish(),
            Strategy::Header(rule) => f
                .debug_struct("Header")
                .field("labels", &rule.labels)
                .field("on_missing", &rule.on_missing)
                .finish(),
            Strategy::Time => f.write_str("Time"),
            Strategy::Bonus => f.write_str("Bonus"),
            Strategy::StageUrl => f.write_str("StageUrl"),
            Strategy::StageName => f.write_str("StageName"),
        }
    }
}

pub static REGISTRY: Lazy<IndexMap<Field, Strategy>> = Lazy::new(|| {
    use Strategy::*;

    let anchor = |keyword, output, keep: fn(&str, &str) -> bool| {
        Anchor(AnchorRule {
            keyword,
            output,
            keep,
            header_column: None,
        })
    };
    let team = |output| {
        Anchor(AnchorRule {
            keyword: "team",
            output,
            keep: not_view_link,
            header_column: Some("Team"),
        })
    };
    let marker = |selector, read: fn(&str, &[&str]) -> Option<Value>| {
        Marker(MarkerRule { selector, read })
    };
    let header = |labels: &'static [&'static str],
                  parse: fn(&str) -> Value,
                  on_missing: Option<Value>| {
        Header(HeaderRule {
            labels,
            parse,
            on_missing,
        })
    };

    IndexMap::from([
        (Field::RiderUrl, anchor("rider", LinkOutput::Href, any_link)),
        (Field::RiderName, anchor("rider", LinkOutput::Text, any_link)),
        (Field::TeamUrl, team(LinkOutput::Href)),
        (Field::TeamName, team(LinkOutput::Text)),
        (Field::StageUrl, StageUrl),
        (Field::StageName, StageName),
        (Field::RaceUrl, anchor("race", LinkOutput::Href, any_link)),
        (Field::RaceName, anchor("race", LinkOutput::Text, any_link)),
        (Field::NationUrl, anchor("nation", LinkOutput::Href, nation_overview_link)),
        (Field::NationName, anchor("nation", LinkOutput::Text, nation_name_link)),
        (Field::ClimbUrl, anchor("location", LinkOutput::Href, any_link)),
        (Field::ClimbName, anchor("location", LinkOutput::Text, any_link)),
        (Field::Age, marker(".age", read_age)),
        (Field::Nationality, marker(".flag", read_flag)),
        (Field::Time, Time),
        (Field::Bonus, Bonus),
        (Field::ProfileIcon, marker(".icon.profile", read_profile_icon)),
        (Field::Season, marker(".season", read_numeric)),
        (Field::RiderNumber, marker(".bibs", read_numeric)),
        (Field::Rank, header(&["Rnk", "pos", "Result", "#"], parse_rank, None)),
        (Field::Status, header(&["Rnk"], parse_status, None)),
        (Field::PrevRank, header(&["Prev"], parse_optional_int, Some(Value::Null))),
        (
            Field::PcsPoints,
            header(&["Pnt", "PCS points"], parse_count, Some(Value::Int(0))),
        ),
        (
            Field::UciPoints,
            header(&["UCI"], parse_points, Some(Value::Float(0.0))),
        ),
        (Field::Points, header(&["Points"], parse_points, None)),
        (Field::Class, header(&["Class"], parse_text, None)),
        (Field::FirstPlaces, header(&["Wins"], parse_count, None)),
        (Field::SecondPlaces, header(&["2nd"], parse_count, None)),
        (Field::ThirdPlaces, header(&["3rd"], parse_count, None)),
        (Field::Distance, header(&["KMs"], parse_distance, None)),
        (Field::Date, header(&["Date"], parse_text, None)),
    ])
});

/* ---------------- anchor filters ---------------- */

fn any_link(_href: &str, _text: &str) -> bool {
    true
}

fn not_view_link(_href: &str, text: &str) -> bool {
    text != "view"
}

/// Nation overview pages only, not the per-nation season-wins pages.
fn nation_overview_link(href: &str, _text: &str) -> bool {
    !href.contains("pcs")
}

/// Nation names only, not win counts rendered as nation links.
fn nation_name_link(_href: &str, text: &str) -> bool {
    !is_numeric(text) && text != "-"
}

/* ---------------- marker readers ---------------- */

fn read_age(text: &str, _classes: &[&str]) -> Option<Value> {
    Some(text.parse::<i64>().ok().into())
}

fn read_flag(_text: &str, classes: &[&str]) -> Option<Value> {
    let code = classes.get(1)?;
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(Value::Text(code.to_ascii_uppercase()))
    } else {
        None
    }
}

fn read_profile_icon(_text: &str, classes: &[&str]) -> Option<Value> {
    if classes.len() >= 3 {
        classes.last().map(|c| Value::Text(c.to_string()))
    } else {
        None
    }
}

fn read_numeric(text: &str, _classes: &[&str]) -> Option<Value> {
    Some(parse_rank(text))
}

/* ---------------- cell transforms ---------------- */

fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Integer when the cell is all digits, `Null` otherwise.
pub fn parse_rank(text: &str) -> Value {
    let text = text.trim();
    if is_numeric(text) {
        text.parse::<i64>().ok().into()
    } else {
        Value::Null
    }
}

/// `DF` (finished) for a numeric rank, the rank text itself otherwise
/// (`DNF`, `DNS`, `OTL`, `DSQ`).
pub fn parse_status(text: &str) -> Value {
    let text = text.trim();
    if is_numeric(text) {
        Value::Text("DF".into())
    } else {
        Value::Text(text.to_string())
    }
}

pub fn parse_optional_int(text: &str) -> Value {
    text.trim().parse::<i64>().ok().into()
}

/// Integer when the cell is all digits, zero otherwise.
pub fn parse_count(text: &str) -> Value {
    let text = text.trim();
    if is_numeric(text) {
        Value::Int(text.parse().unwrap_or(0))
    } else {
        Value::Int(0)
    }
}

/// Comma-decimal number; `-`, empty or garbage count as zero.
pub fn parse_points(text: &str) -> Value {
    Value::Float(parse_locale_float(text).unwrap_or(0.0))
}

/// Comma-decimal distance; `-`, empty or garbage are `Null`.
pub fn parse_distance(text: &str) -> Value {
    parse_locale_float(text).into()
}

pub fn parse_text(text: &str) -> Value {
    Value::Text(text.trim().to_string())
}

pub fn parse_locale_float(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return None;
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_field() {
        for field in Field::ALL {
            assert!(field.strategy().is_ok(), "no strategy for {field}");
        }
        assert_eq!(REGISTRY.len(), Field::ALL.len());
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
        assert_eq!(
            "colour".parse::<Field>().unwrap_err(),
            TableError::UnknownField("colour".into())
        );
    }

    #[test]
    fn rank_candidates_in_fixed_order() {
        match Field::Rank.strategy().unwrap() {
            Strategy::Header(rule) => assert_eq!(rule.labels, &["Rnk", "pos", "Result", "#"]),
            other => panic!("unexpected strategy {other:?}"),
        }
    }

    #[test]
    fn select_fields_defaults_and_validates() {
        let available = [Field::Rank, Field::RiderName, Field::Time];
        let none: [&str; 0] = [];
        assert_eq!(select_fields(&none, &available).unwrap(), available.to_vec());
        assert_eq!(
            select_fields(&["time", "rank"], &available).unwrap(),
            vec![Field::Time, Field::Rank]
        );
        assert_eq!(
            select_fields(&["bonus"], &available).unwrap_err(),
            TableError::FieldUnavailable("bonus".into())
        );
        assert!(matches!(
            select_fields(&["nope"], &available),
            Err(TableError::UnknownField(_))
        ));
    }

    #[test]
    fn locale_points() {
        assert_eq!(parse_points("12,5"), Value::Float(12.5));
        assert_eq!(parse_points("-"), Value::Float(0.0));
        assert_eq!(parse_points(""), Value::Float(0.0));
        assert_eq!(parse_points("40"), Value::Float(40.0));
        assert_eq!(parse_distance("181,7"), Value::Float(181.7));
        assert_eq!(parse_distance("-"), Value::Null);
        assert_eq!(parse_distance("NaN"), Value::Null);
        assert_eq!(parse_distance("inf"), Value::Null);
        assert_eq!(parse_points("infinity"), Value::Float(0.0));
    }

    #[test]
    fn rank_and_status_transforms() {
        assert_eq!(parse_rank("12"), Value::Int(12));
        assert_eq!(parse_rank("DNF"), Value::Null);
        assert_eq!(parse_status("3"), Value::Text("DF".into()));
        assert_eq!(parse_status("OTL"), Value::Text("OTL".into()));
        assert_eq!(parse_count(""), Value::Int(0));
        assert_eq!(parse_optional_int(""), Value::Null);
    }

    #[test]
    fn marker_readers() {
        assert_eq!(read_flag("", &["flag", "si"]), Some(Value::Text("SI".into())));
        assert_eq!(read_flag("", &["flag"]), None);
        assert_eq!(read_flag("", &["flag", "-"]), None);
        assert_eq!(read_age("", &[]), Some(Value::Null));
        assert_eq!(read_age("24", &[]), Some(Value::Int(24)));
        assert_eq!(
            read_profile_icon("", &["icon", "profile", "p4"]),
            Some(Value::Text("p4".into()))
        );
        assert_eq!(read_profile_icon("", &["icon", "profile"]), None);
    }
}
