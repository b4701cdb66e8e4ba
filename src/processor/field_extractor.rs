use anyhow::{Context, Result};
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::config::{ExtractionRule, ListScanPolicy, ProductFormRule, RuleSet};
use crate::models::{FieldValue, ProductRecord, ValidatedPage};
use crate::processor::{CompiledLocator, element_text};

/// Reads the five product fields from a validated page.
///
/// Every field is looked up independently and never fails; a field that
/// cannot be located comes back as `FieldValue::Absent`.
pub struct FieldExtractor {
    price: Vec<CompiledRule>,
    availability: Vec<CompiledRule>,
    product_name: Vec<CompiledRule>,
    manufacturer: Vec<CompiledRule>,
    product_form: ProductFormExtractor,
}

struct CompiledRule {
    locator: CompiledLocator,
    sub_locator: Option<CompiledLocator>,
    keywords: Vec<String>,
}

struct ProductFormExtractor {
    containers: Vec<CompiledLocator>,
    keywords: Vec<String>,
    value: CompiledLocator,
    list_items: CompiledLocator,
    list_scan: ListScanPolicy,
}

impl FieldExtractor {
    pub fn new(rules: &RuleSet) -> Result<Self> {
        Ok(Self {
            price: compile_chain(&rules.price).context("Failed to compile price rules")?,
            availability: compile_chain(&rules.availability)
                .context("Failed to compile availability rules")?,
            product_name: compile_chain(&rules.product_name)
                .context("Failed to compile product name rules")?,
            manufacturer: compile_chain(&rules.manufacturer)
                .context("Failed to compile manufacturer rules")?,
            product_form: ProductFormExtractor::compile(&rules.product_form)
                .context("Failed to compile product form rule")?,
        })
    }

    /// Same rules, with a different list scan policy for the product form.
    pub fn with_list_scan(mut self, policy: ListScanPolicy) -> Self {
        self.product_form.list_scan = policy;
        self
    }

    /// E.g. "6 680 грн."
    pub fn price(&self, page: &ValidatedPage) -> FieldValue {
        apply_chain(&self.price, page.document())
    }

    /// E.g. "В наявності"
    pub fn availability(&self, page: &ValidatedPage) -> FieldValue {
        apply_chain(&self.availability, page.document())
    }

    pub fn product_name(&self, page: &ValidatedPage) -> FieldValue {
        apply_chain(&self.product_name, page.document())
    }

    pub fn manufacturer(&self, page: &ValidatedPage) -> FieldValue {
        apply_chain(&self.manufacturer, page.document())
    }

    /// E.g. "5л"
    pub fn product_form(&self, page: &ValidatedPage) -> FieldValue {
        self.product_form.extract(page.document())
    }

    pub fn extract_all(&self, page: &ValidatedPage) -> ProductRecord {
        let record = ProductRecord {
            url: page.url().to_string(),
            price: self.price(page),
            availability: self.availability(page),
            product_name: self.product_name(page),
            manufacturer: self.manufacturer(page),
            product_form: self.product_form(page),
        };

        for (field, value) in [
            ("price", &record.price),
            ("availability", &record.availability),
            ("product_name", &record.product_name),
            ("manufacturer", &record.manufacturer),
            ("product_form", &record.product_form),
        ] {
            if !value.is_present() {
                debug!("Field {} not found on {}", field, record.url);
            }
        }

        record
    }
}

fn compile_chain(rules: &[ExtractionRule]) -> Result<Vec<CompiledRule>> {
    rules.iter().map(CompiledRule::compile).collect()
}

/// First rule in the chain that yields a value wins.
fn apply_chain(chain: &[CompiledRule], document: &Html) -> FieldValue {
    chain
        .iter()
        .find_map(|rule| rule.apply(document))
        .into()
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword.as_str()))
}

/// Drop the leading label token: "Упаковка 5л коробка" -> "5л коробка".
fn strip_label(text: &str) -> String {
    text.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
}

impl CompiledRule {
    fn compile(rule: &ExtractionRule) -> Result<Self> {
        Ok(Self {
            locator: CompiledLocator::compile(&rule.locator)?,
            sub_locator: rule
                .sub_locator
                .as_ref()
                .map(CompiledLocator::compile)
                .transpose()?,
            keywords: rule.keywords.clone(),
        })
    }

    fn apply(&self, document: &Html) -> Option<String> {
        let element = if self.keywords.is_empty() {
            self.locator.find_in(document)?
        } else {
            self.locator
                .find_all_in(document)
                .into_iter()
                .find(|element| contains_any(&element_text(*element), &self.keywords))?
        };

        match &self.sub_locator {
            Some(sub) => sub.select_first(element).map(element_text),
            None => Some(element_text(element)),
        }
    }
}

impl ProductFormExtractor {
    fn compile(rule: &ProductFormRule) -> Result<Self> {
        Ok(Self {
            containers: rule
                .containers
                .iter()
                .map(CompiledLocator::compile)
                .collect::<Result<_>>()?,
            keywords: rule.keywords.clone(),
            value: CompiledLocator::compile(&rule.value)?,
            list_items: CompiledLocator::compile(&rule.list_items)?,
            list_scan: rule.list_scan,
        })
    }

    /// Attribute blocks of the first container variant that matches at all.
    fn attribute_blocks<'a>(&self, document: &'a Html) -> Option<(usize, Vec<ElementRef<'a>>)> {
        for (variant, container) in self.containers.iter().enumerate() {
            let blocks = container.find_all_in(document);
            if !blocks.is_empty() {
                return Some((variant, blocks));
            }
        }
        None
    }

    fn extract(&self, document: &Html) -> FieldValue {
        let Some((variant, blocks)) = self.attribute_blocks(document) else {
            return FieldValue::Absent;
        };

        // Only the first block mentioning packaging is considered
        let Some(block) = blocks
            .into_iter()
            .find(|block| contains_any(&block.text().collect::<String>(), &self.keywords))
        else {
            return FieldValue::Absent;
        };

        if let Some(value) = self.value.select_first(block) {
            return FieldValue::Present(element_text(value));
        }

        if !self.list_scan.allows(variant) {
            return FieldValue::Absent;
        }

        self.list_items
            .select_all(block)
            .into_iter()
            .map(element_text)
            .find(|text| contains_any(text, &self.keywords))
            .map(|text| strip_label(&text))
            .into()
    }
}
