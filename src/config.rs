// src/config.rs

//! Extraction plans: which tables to pull out of a page and how.
//!
//! A plan is a list of [`TableSpec`]s, run in order against one parsed
//! document. Later tables may join onto tables produced earlier in the
//! same plan.

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, instrument, warn};

use crate::error::TableError;
use crate::table::{
    fields, join, select_fields, sort_by_field, ColumnOptions, ColumnRef, Field, RowAssembler,
    RowFilter, Table, Value,
};
use crate::time::dates;
use crate::tree::html::first_in;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractPlan {
    pub tables: Vec<TableSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    /// CSS selector of the container (`table`, `tbody` or `ul`); the first
    /// match is used.
    pub selector: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub filter: RowFilter,
    #[serde(default)]
    pub extra_columns: Vec<ExtraColumnSpec>,
    #[serde(default)]
    pub join: Option<JoinSpec>,
    /// Stable sort of the finished table on one field.
    #[serde(default)]
    pub sort_by: Option<String>,
    /// A missing container yields an empty table instead of an error.
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraColumnSpec {
    pub name: String,
    pub column: ColumnRef,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub separator: String,
    /// Season year for [`Transform::FullDate`].
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Text,
    Int,
    Float,
    DayMonth,
    /// `dd.mm` plus the column's `year` → `YYYY-MM-DD`.
    FullDate,
    Href,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Name of a table produced earlier in the plan.
    pub with: String,
    pub key: String,
    #[serde(default)]
    pub keep_unmatched: bool,
}

/// Result of one plan table, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableOutput {
    Rows(Table),
    Failed { error: String },
}

impl TableOutput {
    pub fn rows(&self) -> Option<&Table> {
        match self {
            TableOutput::Rows(rows) => Some(rows),
            TableOutput::Failed { .. } => None,
        }
    }
}

impl ExtractPlan {
    /// Read a plan from YAML (`.yaml`/`.yml`) or JSON (anything else).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .map_or(false, |ext| {
                ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml")
            });
        let plan: ExtractPlan = if is_yaml {
            serde_yaml::from_str(&text).with_context(|| format!("parsing {:?}", path))?
        } else {
            serde_json::from_str(&text).with_context(|| format!("parsing {:?}", path))?
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Field names must be known and joins must point backwards.
    pub fn validate(&self) -> Result<()> {
        for (i, spec) in self.tables.iter().enumerate() {
            select_fields(&spec.fields, &Field::ALL)
                .with_context(|| format!("table `{}`", spec.name))?;
            for extra in &spec.extra_columns {
                if extra.transform == Transform::FullDate && extra.year.is_none() {
                    return Err(anyhow!(
                        "column `{}` of `{}` needs a year for full_date",
                        extra.name,
                        spec.name
                    ));
                }
            }
            if let Some(join) = &spec.join {
                if !self.tables[..i].iter().any(|t| t.name == join.with) {
                    return Err(anyhow!(
                        "table `{}` joins `{}`, which isn't produced before it",
                        spec.name,
                        join.with
                    ));
                }
            }
        }
        Ok(())
    }

    /// Run every table against `doc`. Failures are reported per table.
    #[instrument(level = "debug", skip_all, fields(tables = self.tables.len()))]
    pub fn run(&self, doc: &Html) -> IndexMap<String, TableOutput> {
        let mut out: IndexMap<String, TableOutput> = IndexMap::new();
        for spec in &self.tables {
            let outcome = match spec.run(doc, &out) {
                Ok(rows) => TableOutput::Rows(rows),
                Err(e) if is_expected_absence(&e) => {
                    debug!(table = %spec.name, error = %e, "expected absence, empty table");
                    TableOutput::Rows(Table::new())
                }
                Err(e) => {
                    warn!(table = %spec.name, error = ?e, "table failed");
                    TableOutput::Failed {
                        error: format!("{:#}", e),
                    }
                }
            };
            out.insert(spec.name.clone(), outcome);
        }
        out
    }
}

fn is_expected_absence(e: &anyhow::Error) -> bool {
    e.downcast_ref::<TableError>()
        .is_some_and(TableError::is_expected_absence)
}

impl TableSpec {
    fn run(&self, doc: &Html, done: &IndexMap<String, TableOutput>) -> Result<Table> {
        let Some(container) = first_in(doc, &self.selector)? else {
            if self.optional {
                debug!(table = %self.name, selector = %self.selector, "optional table absent");
                return Ok(Table::new());
            }
            return Err(anyhow!("no element matches `{}`", self.selector));
        };

        let mut asm = RowAssembler::with_filter(container, self.filter)?;
        if !self.fields.is_empty() {
            let fields = select_fields(&self.fields, &Field::ALL)?;
            asm.parse(&fields)
                .with_context(|| format!("parsing fields of `{}`", self.name))?;
        }
        for extra in &self.extra_columns {
            let values = extra
                .read(&asm)
                .with_context(|| format!("column `{}` of `{}`", extra.name, self.name))?;
            asm.extend_table(&extra.name, values)?;
        }
        let mut table = asm.into_table();

        if let Some(spec) = &self.join {
            let other = done
                .get(&spec.with)
                .and_then(TableOutput::rows)
                .ok_or_else(|| anyhow!("join target `{}` has no rows", spec.with))?;
            table = join(&table, other, &spec.key, spec.keep_unmatched)?;
        }
        if let Some(field) = &self.sort_by {
            sort_by_field(&mut table, field);
        }
        Ok(table)
    }
}

impl ExtraColumnSpec {
    fn read<N: crate::tree::TreeNode>(
        &self,
        asm: &RowAssembler<N>,
    ) -> crate::error::Result<Vec<Value>> {
        let options = match self.transform {
            Transform::Href => ColumnOptions::href(),
            _ => ColumnOptions::text().separator(&self.separator),
        };
        let (transform, year) = (self.transform, self.year);
        asm.parse_extra_column(self.column.clone(), options, move |text| match transform {
            Transform::Text | Transform::Href => fields::parse_text(text),
            Transform::Int => fields::parse_optional_int(text),
            Transform::Float => fields::parse_distance(text),
            Transform::DayMonth => dates::day_month(text).into(),
            Transform::FullDate => year.and_then(|y| dates::full_date(y, text)).into(),
        })
    }
}
