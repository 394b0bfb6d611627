// src/tree/html.rs

use scraper::{ElementRef, Html, Selector};

use super::TreeNode;
use crate::error::{Result, TableError};

/// Compile a CSS selector, mapping parse failures into [`TableError`].
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| TableError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Parse a standalone chunk of markup (a single table, a list, ...).
pub fn parse_fragment(markup: &str) -> Html {
    Html::parse_fragment(markup)
}

/// Parse a full page.
pub fn parse_document(markup: &str) -> Html {
    Html::parse_document(markup)
}

/// All elements of `doc` matching `selector`.
pub fn select_in<'a>(doc: &'a Html, selector: &str) -> Result<Vec<ElementRef<'a>>> {
    let sel = parse_selector(selector)?;
    Ok(doc.select(&sel).collect())
}

/// First element of `doc` matching `selector`.
pub fn first_in<'a>(doc: &'a Html, selector: &str) -> Result<Option<ElementRef<'a>>> {
    let sel = parse_selector(selector)?;
    let first = doc.select(&sel).next();
    Ok(first)
}

impl<'a> TreeNode for ElementRef<'a> {
    fn tag(&self) -> &str {
        self.value().name()
    }

    fn select_all(&self, selector: &str) -> Result<Vec<Self>> {
        let sel = parse_selector(selector)?;
        Ok(self.select(&sel).collect())
    }

    fn select_first(&self, selector: &str) -> Result<Option<Self>> {
        let sel = parse_selector(selector)?;
        let first = self.select(&sel).next();
        Ok(first)
    }

    fn child_elements(&self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn text_content(&self, separator: &str, deep: bool) -> String {
        if deep {
            self.text().collect::<Vec<_>>().join(separator)
        } else {
            self.children()
                .filter_map(|child| child.value().as_text().map(|t| &**t))
                .collect::<Vec<_>>()
                .join(separator)
        }
    }
}
