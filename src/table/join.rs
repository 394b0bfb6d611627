// src/table/join.rs

//! Combining and reshaping finished tables.

use std::cmp::Ordering;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use super::value::{Row, Table, Value};
use crate::error::{Result, TableError};

/// Merge `right` into `left` on equal `key` values.
///
/// Each left row is paired with the first right row carrying the same key;
/// the right row's fields are copied over the left row's. Left rows without
/// a partner are kept unchanged only when `keep_unmatched` is set. Inputs
/// are not modified.
#[instrument(level = "debug", skip(left, right), fields(left = left.len(), right = right.len()))]
pub fn join(left: &[Row], right: &[Row], key: &str, keep_unmatched: bool) -> Result<Table> {
    let right_keys = right
        .iter()
        .map(|r| key_of(r, key).map(|k| (k, r)))
        .collect::<Result<Vec<_>>>()?;

    let mut joined = Table::with_capacity(left.len());
    let mut unmatched = 0usize;

    for left_row in left {
        let left_key = key_of(left_row, key)?;
        let partner = right_keys
            .iter()
            .find(|(k, _)| *k == left_key)
            .map(|&(_, r)| r);

        match partner {
            Some(right_row) => {
                let mut row = left_row.clone();
                for (name, value) in right_row {
                    row.insert(name.clone(), value.clone());
                }
                joined.push(row);
            }
            None if keep_unmatched => {
                unmatched += 1;
                joined.push(left_row.clone());
            }
            None => unmatched += 1,
        }
    }

    debug!(rows = joined.len(), unmatched, "joined");
    Ok(joined)
}

fn key_of<'a>(row: &'a Row, key: &str) -> Result<&'a Value> {
    row.get(key)
        .ok_or_else(|| TableError::MissingJoinKey(key.to_string()))
}

/// First row for every distinct `key`, keeping only `fields` (key included
/// first). Rows whose key is null or empty text are skipped.
pub fn first_per_key(table: &[Row], key: &str, fields: &[&str]) -> Result<Table> {
    let mut seen: IndexMap<String, Row> = IndexMap::new();
    for row in table {
        let value = row
            .get(key)
            .ok_or_else(|| TableError::MissingField(key.to_string()))?;
        let id = match value {
            Value::Null => continue,
            Value::Text(s) if s.is_empty() => continue,
            other => other.to_string(),
        };
        if seen.contains_key(&id) {
            continue;
        }

        let mut picked = Row::new();
        picked.insert(key.to_string(), value.clone());
        for &field in fields.iter().filter(|&&f| f != key) {
            let value = row
                .get(field)
                .ok_or_else(|| TableError::MissingField(field.to_string()))?;
            picked.insert(field.to_string(), value.clone());
        }
        seen.insert(id, picked);
    }
    Ok(seen.into_values().collect())
}

/// Stable sort on one field. Numbers compare numerically, text
/// lexicographically; nulls and missing values go last.
pub fn sort_by_field(table: &mut [Row], field: &str) {
    table.sort_by(|a, b| compare(a.get(field), b.get(field)));
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.to_string().cmp(&b.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn riders() -> Table {
        vec![
            row(&[("rider_url", "rider/a".into()), ("rank", Value::Int(1))]),
            row(&[("rider_url", "rider/b".into()), ("rank", Value::Int(2))]),
            row(&[("rider_url", "rider/c".into()), ("rank", Value::Int(3))]),
        ]
    }

    fn teams() -> Table {
        vec![
            row(&[("rider_url", "rider/b".into()), ("team_name", "Ineos".into())]),
            row(&[("rider_url", "rider/a".into()), ("team_name", "UAE".into())]),
            row(&[("rider_url", "rider/a".into()), ("team_name", "Other".into())]),
        ]
    }

    #[test]
    fn join_first_match_wins() {
        let joined = join(&riders(), &teams(), "rider_url", false).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0]["team_name"], Value::from("UAE"));
        assert_eq!(joined[0]["rank"], Value::Int(1));
        assert_eq!(joined[1]["team_name"], Value::from("Ineos"));
    }

    #[test]
    fn keep_unmatched_preserves_left_length() {
        let left = riders();
        let kept = join(&left, &teams(), "rider_url", true).unwrap();
        assert_eq!(kept.len(), left.len());
        assert_eq!(kept[2], left[2]);

        let dropped = join(&left, &teams(), "rider_url", false).unwrap();
        let matching = left
            .iter()
            .filter(|l| teams().iter().any(|r| r["rider_url"] == l["rider_url"]))
            .count();
        assert_eq!(dropped.len(), matching);
    }

    #[test]
    fn join_overwrites_shared_fields_from_right() {
        let left = vec![row(&[("id", Value::Int(1)), ("name", "old".into())])];
        let right = vec![row(&[("id", Value::Int(1)), ("name", "new".into())])];
        let joined = join(&left, &right, "id", false).unwrap();
        assert_eq!(joined[0]["name"], Value::from("new"));
        assert_eq!(left[0]["name"], Value::from("old"));
    }

    #[test]
    fn join_requires_key_on_every_row() {
        let right = vec![row(&[("team_name", "UAE".into())])];
        assert_eq!(
            join(&riders(), &right, "rider_url", true).unwrap_err(),
            TableError::MissingJoinKey("rider_url".into())
        );
    }

    #[test]
    fn first_per_key_keeps_first_occurrence() {
        let table = vec![
            row(&[("team_url", "team/a".into()), ("team_name", "A".into()), ("rank", Value::Int(1))]),
            row(&[("team_url", "".into()), ("team_name", "none".into()), ("rank", Value::Int(2))]),
            row(&[("team_url", "team/a".into()), ("team_name", "A2".into()), ("rank", Value::Int(3))]),
            row(&[("team_url", "team/b".into()), ("team_name", "B".into()), ("rank", Value::Int(4))]),
        ];
        let teams = first_per_key(&table, "team_url", &["team_name"]).unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0]["team_name"], Value::from("A"));
        assert_eq!(teams[1].keys().collect::<Vec<_>>(), vec!["team_url", "team_name"]);
    }

    #[test]
    fn sort_puts_nulls_last_and_is_stable() {
        let mut table = vec![
            row(&[("rank", Value::Null), ("id", Value::Int(0))]),
            row(&[("rank", Value::Int(10)), ("id", Value::Int(1))]),
            row(&[("rank", Value::Int(2)), ("id", Value::Int(2))]),
            row(&[("rank", Value::Int(2)), ("id", Value::Int(3))]),
        ];
        sort_by_field(&mut table, "rank");
        let ids: Vec<_> = table.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(
            ids,
            vec![Value::Int(2), Value::Int(3), Value::Int(1), Value::Int(0)]
        );
    }
}
