// src/table/extract.rs

//! Interpreters for the strategies in [`REGISTRY`](super::fields::REGISTRY).

use once_cell::sync::Lazy;
use tracing::{debug, warn};
use url::Url;

use super::assembler::{ColumnOptions, RowAssembler};
use super::columns::{cell_at, ColumnRef};
use super::fields::{AnchorRule, Field, HeaderRule, LinkOutput, MarkerRule, Strategy};
use super::value::Value;
use crate::error::{Result, TableError};
use crate::time;
use crate::tree::TreeNode;

/// Relative links are resolved against this root before reading their
/// first path segment.
static SITE_ROOT: Lazy<Url> =
    Lazy::new(|| Url::parse("https://www.procyclingstats.com/").expect("site root URL"));

/// First path segment of a site link, e.g. `rider` for `rider/tadej-pogacar`.
/// Links to other hosts have none.
pub fn first_path_segment(href: &str) -> Option<String> {
    let url = SITE_ROOT.join(href.trim()).ok()?;
    if url.host_str() != SITE_ROOT.host_str() {
        return None;
    }
    url.path_segments()?
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Pad with empty text or truncate so there is one value per row.
fn align(field: Field, mut values: Vec<Value>, rows: usize) -> Vec<Value> {
    if values.len() != rows {
        warn!(
            field = field.name(),
            found = values.len(),
            rows,
            "anchor count differs from row count, aligning at the tail"
        );
        values.resize(rows, Value::Text(String::new()));
    }
    values
}

impl<N: TreeNode> RowAssembler<N> {
    /// Values of a single field, one per row, without touching the table.
    pub fn extract(&self, field: Field) -> Result<Vec<Value>> {
        match field.strategy()? {
            Strategy::Anchor(rule) => self.anchor_values(field, rule),
            Strategy::Marker(rule) => self.marker_values(rule),
            Strategy::Header(rule) => self.header_values(field, rule),
            Strategy::Time => self.time_values(),
            Strategy::Bonus => self.bonus_values(),
            Strategy::StageUrl => Ok(self
                .stage_links()?
                .into_iter()
                .map(|link| link.map(|(url, _)| url).into())
                .collect()),
            Strategy::StageName => Ok(self
                .stage_links()?
                .into_iter()
                .map(|link| link.map(|(_, name)| name).into())
                .collect()),
        }
    }

    fn anchor_values(&self, field: Field, rule: &AnchorRule) -> Result<Vec<Value>> {
        if let Some(label) = rule.header_column {
            let options = match rule.output {
                LinkOutput::Href => ColumnOptions::href(),
                LinkOutput::Text => ColumnOptions::text(),
            };
            match self.parse_extra_column(label, options, |t| Value::Text(t.trim().to_string())) {
                Ok(values) if values.len() == self.table_length() => return Ok(values),
                Ok(values) => debug!(
                    field = field.name(),
                    found = values.len(),
                    "header column incomplete, scanning anchors"
                ),
                Err(e) => debug!(field = field.name(), error = %e, "scanning anchors"),
            }
        }

        let mut values = Vec::new();
        for row in &self.rows {
            for anchor in row.select_all("a")? {
                let Some(href) = anchor.attr("href") else {
                    continue;
                };
                if first_path_segment(href).as_deref() != Some(rule.keyword) {
                    continue;
                }
                let text = anchor.full_text();
                let text = text.trim();
                if !(rule.keep)(href, text) {
                    continue;
                }
                values.push(Value::Text(match rule.output {
                    LinkOutput::Href => href.to_string(),
                    LinkOutput::Text => text.to_string(),
                }));
            }
        }
        Ok(align(field, values, self.table_length()))
    }

    fn marker_values(&self, rule: &MarkerRule) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        for row in &self.rows {
            for element in row.select_all(rule.selector)? {
                let text = element.full_text();
                if let Some(value) = (rule.read)(text.trim(), &element.classes()) {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    fn header_values(&self, field: Field, rule: &HeaderRule) -> Result<Vec<Value>> {
        for label in rule.labels {
            match self.parse_extra_column(*label, ColumnOptions::text(), rule.parse) {
                Ok(values) => return Ok(values),
                Err(e) if e.is_column_not_found() => {
                    debug!(field = field.name(), label, "column not in header");
                }
                Err(e) => return Err(e),
            }
        }
        match &rule.on_missing {
            Some(default) => {
                debug!(field = field.name(), %default, "no matching column, filling default");
                Ok(vec![default.clone(); self.table_length()])
            }
            None => Err(TableError::ColumnNotFound(rule.labels.join("|"))),
        }
    }

    fn time_values(&self) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        for row in &self.rows {
            for element in row.select_all(".time")? {
                let text = element.text_content("\n", true);
                values.push(time::time_cell(&text).map(Value::Time).unwrap_or(Value::Null));
            }
        }
        Ok(values)
    }

    fn bonus_values(&self) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        for row in &self.rows {
            for element in row.select_all(".bonis")? {
                values.push(Value::Time(time::parse_bonus(&element.full_text())));
            }
        }
        if values.is_empty() {
            return Ok(vec![Value::Time(time::ZERO_TIME.to_string()); self.table_length()]);
        }
        Ok(values)
    }

    /// Per row, the stage link and its visible name.
    ///
    /// The `Stage` column is preferred (`a[href]`, then `span[data-url]`);
    /// otherwise the first link in the row pointing at a stage.
    fn stage_links(&self) -> Result<Vec<Option<(String, String)>>> {
        let stage_column = self.resolver().resolve(&ColumnRef::from("Stage")).ok();

        let mut links = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut found = None;

            if let Some(cell) = stage_column.and_then(|i| cell_at(row, i, self.column_tag)) {
                if let Some(a) = cell.select_first("a")? {
                    found = link_of(&a, "href");
                }
                if found.is_none() {
                    if let Some(span) = cell.select_first("span[data-url]")? {
                        found = link_of(&span, "data-url");
                    }
                }
            }

            if found.is_none() {
                for element in row.select_all("a, span[data-url]")? {
                    let candidate = link_of(&element, "href").or_else(|| link_of(&element, "data-url"));
                    if let Some((url, name)) = candidate {
                        if url.contains("/stage") {
                            found = Some((url, name));
                            break;
                        }
                    }
                }
            }
            links.push(found);
        }
        Ok(links)
    }
}

fn link_of<N: TreeNode>(element: &N, attr: &str) -> Option<(String, String)> {
    let url = element.attr(attr).filter(|u| !u.is_empty())?;
    Some((url.to_string(), element.full_text().trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_segment_of_relative_and_absolute_links() {
        assert_eq!(first_path_segment("rider/tadej-pogacar").as_deref(), Some("rider"));
        assert_eq!(first_path_segment("/team/uae-2022").as_deref(), Some("team"));
        assert_eq!(
            first_path_segment("https://www.procyclingstats.com/race/tour-de-france/2022").as_deref(),
            Some("race")
        );
        assert_eq!(first_path_segment("https://twitter.com/rider"), None);
        assert_eq!(first_path_segment(""), None);
    }

    #[test]
    fn align_pads_and_truncates() {
        let three: Vec<Value> = vec!["a".into(), "b".into(), "c".into()];
        let padded = align(Field::RiderUrl, three.clone(), 5);
        assert_eq!(padded.len(), 5);
        assert_eq!(&padded[..3], &three[..]);
        assert_eq!(padded[3], Value::Text(String::new()));
        assert_eq!(padded[4], Value::Text(String::new()));

        let truncated = align(Field::RiderUrl, three, 2);
        assert_eq!(truncated, vec![Value::from("a"), Value::from("b")]);
    }
}
