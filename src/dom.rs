//! DOM query and extraction layer
//!
//! Everything that crosses the test/page boundary comes back as plain
//! serializable data. Extraction runs inside the page via small scripts
//! over `querySelectorAll`, never by inspecting stringified HTML, so
//! attribute checks are immune to serialization quirks.

use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use serde::de::DeserializeOwned;

use crate::error::{HarnessError, Result};

/// Selector queries and in-page extraction against one loaded page.
pub struct DomQuery<'a> {
    page: &'a Page,
}

impl<'a> DomQuery<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    /// Document-ordered element handles for a selector. An empty result is
    /// a normal outcome, never an error. Handles are fresh on every call;
    /// nothing is cached across queries.
    pub async fn query(&self, selector: &str) -> Result<Vec<Element>> {
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements),
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Evaluate an expression in the page context and deserialize its value.
    ///
    /// Only plain data (strings, numbers, booleans, sequences, flat maps)
    /// can cross the boundary; anything else fails loudly as
    /// [`HarnessError::Marshal`].
    pub async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self.page.evaluate(script).await?;
        result
            .into_value()
            .map_err(|e| HarnessError::Marshal(e.to_string()))
    }

    /// Number of elements matching a selector.
    pub async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.query(selector).await?.len())
    }

    /// For each match of `selector`, in document order, whether it carries
    /// the named attribute.
    pub async fn attribute_presence(&self, selector: &str, attribute: &str) -> Result<Vec<bool>> {
        let js = format!(
            "Array.from(document.querySelectorAll({sel})).map(el => el.hasAttribute({attr}))",
            sel = js_string(selector),
            attr = js_string(attribute),
        );
        self.evaluate(&js).await
    }

    /// The `id` attribute of each match, in document order. `None` for
    /// elements that have no `id` at all.
    pub async fn ids(&self, selector: &str) -> Result<Vec<Option<String>>> {
        let js = format!(
            "Array.from(document.querySelectorAll({sel})).map(el => el.getAttribute('id'))",
            sel = js_string(selector),
        );
        self.evaluate(&js).await
    }

    /// How many matches carry the `checked` attribute. The attribute, not
    /// the live property: the contract is about the document's default
    /// selection state.
    pub async fn checked_count(&self, selector: &str) -> Result<u64> {
        let js = format!(
            "Array.from(document.querySelectorAll({sel})).filter(el => el.hasAttribute('checked')).length",
            sel = js_string(selector),
        );
        self.evaluate(&js).await
    }
}

/// Quote and escape a string for interpolation into an in-page script.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
