use serde::{Deserialize, Serialize};

/// Version tag of the rule set shipped with the crate.
pub const DEFAULT_RULES_VERSION: &str = "agroplant-2024.1";

// Only a single, valid product page carries this class.
const PRODUCT_PAGE_MARKER: &str = "ds-product-main-price";

const PRODUCT_PRICE_CLASS: &str = "ds-price-new fsz-24 fw-700 dark-text";
const PRODUCT_AVAILABILITY_SELECTOR: &str =
    "div.ds-product-main-stock.d-flex.align-items-center.justify-content-center.fw-500.br-7";
const PRODUCT_NAME_CLASS: &str = "col-12 ds-page-title pb-3";
// "align-iems" is misspelled on the site itself.
const PRODUCT_MANUFACTURER_SELECTOR: &str =
    "div.ds-product-top-info.d-flex.flex-column.flex-md-row.align-iems-md-center a.blue-link";

// Packaging values are placed inconsistently across categories.
const PRODUCT_FORM_OUTER_CLASS_VARIANT_1: &str = "ds-product-main-attributes-item br-4 py-1 px-2";
const PRODUCT_FORM_OUTER_CLASS_VARIANT_2: &str = "ds-product-tab-content-text secondary-text fw-300";
const PRODUCT_FORM_INNER_CLASS: &str = "fsz-12 fw-500 ps-2";
const PRODUCT_FORM_KEYWORDS: [&str; 3] = ["Тара", "Тарна одиниця", "Упаковка"];

/// How a structural element is located in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// Elements with the given tag whose class attribute matches `class`.
    ///
    /// A multi-class signature must equal the whole (whitespace-normalized)
    /// class attribute; a single-class signature matches any element carrying
    /// that class.
    Class { tag: String, class: String },
    /// A CSS selector path.
    Css { selector: String },
}

impl Locator {
    pub fn class(tag: &str, class: &str) -> Self {
        Locator::Class {
            tag: tag.to_string(),
            class: class.to_string(),
        }
    }

    pub fn css(selector: &str) -> Self {
        Locator::Css {
            selector: selector.to_string(),
        }
    }
}

/// One entry of a field's fallback rule chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub locator: Locator,
    /// Element to read inside the located one, if any.
    #[serde(default)]
    pub sub_locator: Option<Locator>,
    /// When non-empty, a located element only counts if its text contains
    /// at least one of these.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ExtractionRule {
    pub fn single(locator: Locator) -> Self {
        Self {
            locator,
            sub_locator: None,
            keywords: Vec::new(),
        }
    }
}

/// Which container variants may fall back to scanning list items when the
/// nested value element is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListScanPolicy {
    /// Only containers found through a fallback variant (index > 0).
    #[default]
    FallbackVariants,
    /// Every container variant.
    AllVariants,
    /// No list scan at all.
    Never,
}

impl ListScanPolicy {
    pub fn allows(self, variant_index: usize) -> bool {
        match self {
            ListScanPolicy::FallbackVariants => variant_index > 0,
            ListScanPolicy::AllVariants => true,
            ListScanPolicy::Never => false,
        }
    }
}

/// Rule for the packaging form, which lives in loosely structured
/// attribute blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFormRule {
    /// Attribute block variants, tried in order; the first variant that
    /// matches anything supplies the blocks.
    pub containers: Vec<Locator>,
    pub keywords: Vec<String>,
    /// Value element nested in a matching block.
    pub value: Locator,
    /// List items scanned when `value` is missing.
    pub list_items: Locator,
    #[serde(default)]
    pub list_scan: ListScanPolicy,
}

/// The complete set of structural contracts for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub version: String,
    pub marker: Locator,
    pub price: Vec<ExtractionRule>,
    pub availability: Vec<ExtractionRule>,
    pub product_name: Vec<ExtractionRule>,
    pub manufacturer: Vec<ExtractionRule>,
    pub product_form: ProductFormRule,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            version: DEFAULT_RULES_VERSION.to_string(),
            marker: Locator::class("div", PRODUCT_PAGE_MARKER),
            price: vec![ExtractionRule::single(Locator::class(
                "div",
                PRODUCT_PRICE_CLASS,
            ))],
            availability: vec![ExtractionRule::single(Locator::css(
                PRODUCT_AVAILABILITY_SELECTOR,
            ))],
            product_name: vec![ExtractionRule::single(Locator::class(
                "div",
                PRODUCT_NAME_CLASS,
            ))],
            manufacturer: vec![ExtractionRule::single(Locator::css(
                PRODUCT_MANUFACTURER_SELECTOR,
            ))],
            product_form: ProductFormRule::default(),
        }
    }
}

impl Default for ProductFormRule {
    fn default() -> Self {
        Self {
            containers: vec![
                Locator::class("div", PRODUCT_FORM_OUTER_CLASS_VARIANT_1),
                Locator::class("div", PRODUCT_FORM_OUTER_CLASS_VARIANT_2),
            ],
            keywords: PRODUCT_FORM_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            value: Locator::class("span", PRODUCT_FORM_INNER_CLASS),
            list_items: Locator::css("ul li"),
            list_scan: ListScanPolicy::default(),
        }
    }
}
