use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html, Selector};

use crate::config::Locator;

/// A `Locator` with its selector parsed once up front.
#[derive(Debug, Clone)]
pub enum CompiledLocator {
    Class { tag: Selector, signature: String },
    Css(Selector),
}

impl CompiledLocator {
    pub fn compile(locator: &Locator) -> Result<Self> {
        match locator {
            Locator::Class { tag, class } => {
                let signature = normalize_classes(class);
                if signature.is_empty() {
                    return Err(anyhow!("empty class signature for tag '{}'", tag));
                }
                Ok(CompiledLocator::Class {
                    tag: parse_selector(tag)?,
                    signature,
                })
            }
            Locator::Css { selector } => Ok(CompiledLocator::Css(parse_selector(selector)?)),
        }
    }

    /// All matches below `scope`, in document order.
    pub fn select_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        match self {
            CompiledLocator::Class { tag, signature } => scope
                .select(tag)
                .filter(|element| class_matches(*element, signature))
                .collect(),
            CompiledLocator::Css(selector) => scope.select(selector).collect(),
        }
    }

    pub fn select_first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        match self {
            CompiledLocator::Class { tag, signature } => scope
                .select(tag)
                .find(|element| class_matches(*element, signature)),
            CompiledLocator::Css(selector) => scope.select(selector).next(),
        }
    }

    pub fn find_in<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        self.select_first(document.root_element())
    }

    pub fn find_all_in<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        self.select_all(document.root_element())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid selector '{}': {:?}", selector, e))
}

fn normalize_classes(classes: &str) -> String {
    classes.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Multi-class signatures compare against the whole class attribute, a
/// single class against each class the element carries.
fn class_matches(element: ElementRef, signature: &str) -> bool {
    let Some(attr) = element.value().attr("class") else {
        return false;
    };

    if attr.split_whitespace().any(|class| class == signature) {
        return true;
    }

    normalize_classes(attr) == signature
}

/// Concatenated, trimmed text content of an element.
pub fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
