use anyhow::{Context, Result};
use scraper::Html;
use tracing::{debug, warn};

use crate::config::RuleSet;
use crate::models::ValidatedPage;
use crate::processor::CompiledLocator;

/// Confirms a document is a real product page before anything is extracted
pub struct PageValidator {
    marker: CompiledLocator,
}

impl PageValidator {
    pub fn new(rules: &RuleSet) -> Result<Self> {
        let marker = CompiledLocator::compile(&rules.marker)
            .context("Failed to compile product page marker")?;
        Ok(Self { marker })
    }

    /// Parse `document` and keep it only if the marker element is present.
    pub fn validate(&self, url: &str, document: &str) -> Option<ValidatedPage> {
        let parsed = Html::parse_document(document);

        if self.marker.find_in(&parsed).is_none() {
            warn!("Skipping {} due to missing product price element", url);
            return None;
        }

        debug!("Valid product page found at {}", url);
        Some(ValidatedPage::new(url, parsed))
    }
}
