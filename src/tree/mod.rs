// src/tree/mod.rs

//! Read-only view over a parsed document.
//!
//! The engine never walks markup itself; everything it needs from a document
//! goes through [`TreeNode`]. [`html`] binds it to `scraper`.

pub mod html;

use crate::error::Result;

/// Minimal query capability over one element of a document tree.
///
/// Selectors are CSS selectors evaluated against descendants of `self`,
/// results in document order.
pub trait TreeNode: Clone {
    /// Lower-case tag name, e.g. `tr`.
    fn tag(&self) -> &str;

    fn select_all(&self, selector: &str) -> Result<Vec<Self>>;

    fn select_first(&self, selector: &str) -> Result<Option<Self>> {
        Ok(self.select_all(selector)?.into_iter().next())
    }

    /// Direct element children, in document order.
    fn child_elements(&self) -> Vec<Self>;

    fn attr(&self, name: &str) -> Option<&str>;

    /// Text nodes joined with `separator`. With `deep == false` only the
    /// element's own text children are read.
    fn text_content(&self, separator: &str, deep: bool) -> String;

    fn full_text(&self) -> String {
        self.text_content("", true)
    }

    /// Whitespace-separated tokens of the `class` attribute.
    fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}
