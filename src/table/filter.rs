// src/table/filter.rs

//! Row selection applied when an assembler is built.
//!
//! Filters only decide which row nodes the assembler sees; the document
//! itself is never touched, so one tree can back several assemblers.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::columns::cell_at;
use crate::error::Result;
use crate::tree::TreeNode;

const STAGE_PROFILE_ICONS: &str =
    ".icon.profile.p1, .icon.profile.p2, .icon.profile.p3, .icon.profile.p4, .icon.profile.p5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    /// Every row.
    #[default]
    All,
    /// Data rows of a results table: drops spacer, note and empty-name rows.
    Results,
    /// Stage rows of a stage list: drops rest days and the summary row.
    Stages,
}

impl RowFilter {
    pub fn keep<N: TreeNode>(
        &self,
        row: &N,
        column_tag: &str,
        header: Option<&[String]>,
    ) -> Result<bool> {
        match self {
            RowFilter::All => Ok(true),
            RowFilter::Results => is_result_row(row, column_tag, header.is_some_and(is_teams_header)),
            RowFilter::Stages => is_stage_row(row),
        }
    }
}

/// A team classification header has both a `Team` and a `Class` column.
pub fn is_teams_header(header: &[String]) -> bool {
    header.iter().any(|h| h == "Team") && header.iter().any(|h| h == "Class")
}

fn is_result_row<N: TreeNode>(row: &N, column_tag: &str, teams_table: bool) -> Result<bool> {
    let cells: Vec<N> = row
        .child_elements()
        .into_iter()
        .filter(|c| c.tag() == column_tag)
        .collect();

    let first_empty = cells
        .first()
        .map_or(true, |c| c.full_text().trim().is_empty());
    if cells.len() <= 2 && first_empty {
        trace!(cells = cells.len(), "dropping empty row");
        return Ok(false);
    }
    if cells.len() == 1 && cells[0].attr("colspan").is_some() {
        trace!("dropping colspan row");
        return Ok(false);
    }
    if cells.len() > 7 {
        if let Some(name) = row.select_first(".ridername")? {
            if name.full_text().trim().is_empty() {
                trace!("dropping row without rider name");
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if teams_table && row.select_first(".flag")?.is_none() {
        trace!("dropping team row without flag");
        return Ok(false);
    }
    Ok(true)
}

fn is_stage_row<N: TreeNode>(row: &N) -> Result<bool> {
    if row.classes().contains(&"sum") {
        return Ok(false);
    }
    Ok(row.select_first(STAGE_PROFILE_ICONS)?.is_some())
}

/// Text of the first cell, used by callers that filter on a leading label.
pub fn first_cell_text<N: TreeNode>(row: &N, column_tag: &str) -> Option<String> {
    cell_at(row, 0, column_tag).map(|c| c.full_text().trim().to_string())
}
