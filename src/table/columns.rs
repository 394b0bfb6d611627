// src/table/columns.rs

//! Column resolution: header label or (negative) ordinal → cell position.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TableError};
use crate::tree::TreeNode;

/// How a caller names a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    /// Literal position; negative counts from the end of the first row.
    Index(isize),
    /// Case-insensitive substring of a header cell.
    Header(String),
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "#{}", i),
            ColumnRef::Header(label) => write!(f, "`{}`", label),
        }
    }
}

impl From<isize> for ColumnRef {
    fn from(i: isize) -> Self {
        ColumnRef::Index(i)
    }
}

impl From<i32> for ColumnRef {
    fn from(i: i32) -> Self {
        ColumnRef::Index(i as isize)
    }
}

impl From<&str> for ColumnRef {
    fn from(label: &str) -> Self {
        ColumnRef::Header(label.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(label: String) -> Self {
        ColumnRef::Header(label)
    }
}

pub struct ColumnResolver<'a> {
    header: Option<&'a [String]>,
    row_length: usize,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(header: Option<&'a [String]>, row_length: usize) -> Self {
        Self { header, row_length }
    }

    pub fn resolve(&self, column: &ColumnRef) -> Result<usize> {
        match column {
            ColumnRef::Header(label) => self.header_index(label),
            ColumnRef::Index(i) if *i >= 0 => Ok(*i as usize),
            ColumnRef::Index(i) => {
                let resolved = self.row_length as isize + i;
                if resolved < 0 {
                    return Err(TableError::InvalidColumnIndex {
                        index: *i,
                        row_length: self.row_length,
                    });
                }
                Ok(resolved as usize)
            }
        }
    }

    /// First header cell containing `label`, ignoring case.
    pub fn header_index(&self, label: &str) -> Result<usize> {
        let header = self.header.ok_or_else(|| {
            TableError::ExpectedAbsence(format!(
                "can not parse `{}` column without table header",
                label
            ))
        })?;
        let needle = label.to_lowercase();
        header
            .iter()
            .position(|cell| cell.to_lowercase().contains(&needle))
            .ok_or_else(|| TableError::ColumnNotFound(label.to_string()))
    }
}

/// The `index`-th element child of `row`, if it is a `column_tag` cell.
pub fn cell_at<N: TreeNode>(row: &N, index: usize, column_tag: &str) -> Option<N> {
    row.child_elements()
        .into_iter()
        .nth(index)
        .filter(|cell| cell.tag() == column_tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_match_is_case_insensitive_substring() {
        let h = header(&["Rnk", "BIB", "Rider", "Team", "UCI pts", "Time"]);
        let r = ColumnResolver::new(Some(&h), 6);
        assert_eq!(r.resolve(&"uci".into()).unwrap(), 4);
        assert_eq!(r.resolve(&"rider".into()).unwrap(), 2);
        assert_eq!(r.resolve(&"TIME".into()).unwrap(), 5);
    }

    #[test]
    fn first_matching_cell_wins() {
        let h = header(&["Team", "Team time"]);
        let r = ColumnResolver::new(Some(&h), 2);
        assert_eq!(r.header_index("team").unwrap(), 0);
    }

    #[test]
    fn missing_column_and_missing_header_are_distinct() {
        let h = header(&["Rnk", "Rider"]);
        let r = ColumnResolver::new(Some(&h), 2);
        assert_eq!(
            r.header_index("Prev").unwrap_err(),
            TableError::ColumnNotFound("Prev".into())
        );

        let bare = ColumnResolver::new(None, 2);
        assert!(bare.header_index("Rnk").unwrap_err().is_expected_absence());
    }

    #[test]
    fn negative_indices_count_from_row_end() {
        let r = ColumnResolver::new(None, 5);
        assert_eq!(r.resolve(&ColumnRef::from(-2)).unwrap(), 3);
        assert_eq!(r.resolve(&ColumnRef::from(1)).unwrap(), 1);
        assert!(matches!(
            r.resolve(&ColumnRef::from(-6)),
            Err(TableError::InvalidColumnIndex { index: -6, row_length: 5 })
        ));
    }

    #[test]
    fn column_ref_deserialises_from_index_or_label() {
        let refs: Vec<ColumnRef> = serde_json::from_str(r#"[3, -1, "KMs"]"#).unwrap();
        assert_eq!(
            refs,
            vec![
                ColumnRef::Index(3),
                ColumnRef::Index(-1),
                ColumnRef::Header("KMs".into())
            ]
        );
    }
}
