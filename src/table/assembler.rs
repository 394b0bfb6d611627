// src/table/assembler.rs

use tracing::{debug, instrument, trace};

use super::columns::{cell_at, ColumnRef, ColumnResolver};
use super::fields::Field;
use super::filter::RowFilter;
use super::value::{Row, Table, Value};
use crate::error::{Result, TableError};
use crate::time;
use crate::tree::TreeNode;

/// How cell content is read by [`RowAssembler::parse_extra_column`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnOptions<'a> {
    /// Joins the cell's text nodes.
    pub separator: &'a str,
    /// Read the first anchor's `href` instead of the text (empty if none).
    pub href: bool,
}

impl<'a> ColumnOptions<'a> {
    pub fn text() -> Self {
        Self::default()
    }

    pub fn href() -> Self {
        Self {
            separator: "",
            href: true,
        }
    }

    pub fn separator(mut self, separator: &'a str) -> Self {
        self.separator = separator;
        self
    }
}

/// Builds typed rows out of one table-like node.
///
/// The row set is fixed when the assembler is built; every extractor must
/// produce exactly one value per row.
pub struct RowAssembler<N: TreeNode> {
    pub(super) header: Option<Vec<String>>,
    pub(super) rows: Vec<N>,
    pub(super) column_tag: &'static str,
    body_tag: String,
    row_tag: &'static str,
    row_length: usize,
    table_length: usize,
    table: Table,
}

impl<N: TreeNode> RowAssembler<N> {
    pub fn new(container: N) -> Result<Self> {
        Self::with_filter(container, RowFilter::All)
    }

    /// Like [`new`](Self::new), keeping only rows accepted by `filter`.
    pub fn with_filter(container: N, filter: RowFilter) -> Result<Self> {
        let (body, header) = match container.select_first("tbody")? {
            Some(tbody) => {
                let header = match container.select_first("thead")? {
                    Some(thead) => Some(
                        thead
                            .select_all("th")?
                            .iter()
                            .map(|th| th.full_text().trim().to_string())
                            .collect::<Vec<_>>(),
                    ),
                    None => None,
                };
                (tbody, header)
            }
            None => (container, None),
        };

        let row_tag = row_tag_for(body.tag())?;
        let column_tag = column_tag_for(row_tag)?;

        let mut rows = Vec::new();
        for row in body.child_elements() {
            if row.tag() == row_tag && filter.keep(&row, column_tag, header.as_deref())? {
                rows.push(row);
            }
        }

        let row_length = rows.first().map_or(0, |first| {
            first
                .child_elements()
                .iter()
                .filter(|c| c.tag() == column_tag)
                .count()
        });

        debug!(
            body = body.tag(),
            rows = rows.len(),
            columns = row_length,
            has_header = header.is_some(),
            ?filter,
            "table layout"
        );

        Ok(Self {
            header,
            table_length: rows.len(),
            body_tag: body.tag().to_string(),
            rows,
            column_tag,
            row_tag,
            row_length,
            table: Table::new(),
        })
    }

    /// Number of rows, captured at construction.
    pub fn table_length(&self) -> usize {
        self.table_length
    }

    /// Number of cells in the first row.
    pub fn row_length(&self) -> usize {
        self.row_length
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn body_tag(&self) -> &str {
        &self.body_tag
    }

    pub fn row_tag(&self) -> &'static str {
        self.row_tag
    }

    pub fn column_tag(&self) -> &'static str {
        self.column_tag
    }

    pub fn first_row(&self) -> Option<&N> {
        self.rows.first()
    }

    pub fn table(&self) -> &[Row] {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub(super) fn resolver(&self) -> ColumnResolver<'_> {
        ColumnResolver::new(self.header.as_deref(), self.row_length)
    }

    /// Extract `fields` into the table, one row per table row.
    ///
    /// Fields are merged into rows already present from earlier calls. When
    /// `time` is requested the times are made absolute afterwards.
    #[instrument(level = "debug", skip(self), fields(rows = self.table_length))]
    pub fn parse(&mut self, fields: &[Field]) -> Result<()> {
        let mut columns = Vec::with_capacity(fields.len());
        for &field in fields {
            let values = self.extract(field)?;
            if values.len() != self.table_length {
                return Err(TableError::StructuralMismatch {
                    field: field.name().to_string(),
                    expected: self.table_length,
                    got: values.len(),
                });
            }
            trace!(field = field.name(), "extracted");
            columns.push((field, values));
        }

        if self.table.is_empty() {
            self.table = (0..self.table_length).map(|_| Row::new()).collect();
        } else if self.table.len() != self.table_length {
            return Err(TableError::LengthMismatch {
                expected: self.table.len(),
                got: self.table_length,
            });
        }

        for (field, values) in columns {
            for (row, value) in self.table.iter_mut().zip(values) {
                row.insert(field.name().to_string(), value);
            }
        }

        if fields.contains(&Field::Time) && !self.table.is_empty() {
            let key = Field::Time.name();
            let mut times: Vec<Value> = self
                .table
                .iter()
                .map(|row| row.get(key).cloned().unwrap_or(Value::Null))
                .collect();
            time::absolutize(&mut times);
            for (row, t) in self.table.iter_mut().zip(times) {
                row.insert(key.to_string(), t);
            }
        }
        Ok(())
    }

    /// [`parse`](Self::parse) with fields given by name.
    pub fn parse_field_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let fields = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<Field>>>()?;
        self.parse(&fields)
    }

    /// Append a derived column. On an empty table the values seed new rows.
    pub fn extend_table<V: Into<Value>>(&mut self, name: &str, values: Vec<V>) -> Result<()> {
        if self.table.is_empty() {
            self.table = values
                .into_iter()
                .map(|v| {
                    let mut row = Row::new();
                    row.insert(name.to_string(), v.into());
                    row
                })
                .collect();
            return Ok(());
        }
        if values.len() != self.table.len() {
            return Err(TableError::LengthMismatch {
                expected: self.table.len(),
                got: values.len(),
            });
        }
        for (row, v) in self.table.iter_mut().zip(values) {
            row.insert(name.to_string(), v.into());
        }
        Ok(())
    }

    /// Read one column from every row that has it and run `transform` on
    /// each cell's text (or first link target with [`ColumnOptions::href`]).
    pub fn parse_extra_column<T, F>(
        &self,
        column: impl Into<ColumnRef>,
        options: ColumnOptions<'_>,
        transform: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&str) -> T,
    {
        let column = column.into();
        let index = self.resolver().resolve(&column)?;
        trace!(%column, index, "extra column");

        let mut values = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let Some(cell) = cell_at(row, index, self.column_tag) else {
                continue;
            };
            let text = if options.href {
                cell.select_first("a")?
                    .and_then(|a| a.attr("href").map(str::to_string))
                    .unwrap_or_default()
            } else {
                cell.text_content(options.separator, true)
            };
            values.push(transform(&text));
        }
        Ok(values)
    }

    /// Rename `from` to `to` in every row; the renamed key moves to the end.
    pub fn rename_field(&mut self, from: &str, to: &str) -> Result<()> {
        if self.table.iter().any(|row| !row.contains_key(from)) {
            return Err(TableError::MissingField(from.to_string()));
        }
        for row in &mut self.table {
            if let Some(value) = row.shift_remove(from) {
                row.insert(to.to_string(), value);
            }
        }
        Ok(())
    }

    pub fn remove_field(&mut self, name: &str) {
        for row in &mut self.table {
            row.shift_remove(name);
        }
    }
}

fn row_tag_for(body_tag: &str) -> Result<&'static str> {
    match body_tag {
        "tbody" | "table" => Ok("tr"),
        "ul" => Ok("li"),
        other => Err(TableError::UnsupportedContainer(other.to_string())),
    }
}

fn column_tag_for(row_tag: &str) -> Result<&'static str> {
    match row_tag {
        "tr" => Ok("td"),
        "li" => Ok("div"),
        other => Err(TableError::UnsupportedContainer(other.to_string())),
    }
}
