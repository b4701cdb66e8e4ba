use scraper::Html;

use crate::fetcher::FetchError;

/// Placeholder written for a field that could not be located.
pub const UNKNOWN: &str = "Unknown";

/// Output columns, in export order.
pub const COLUMNS: [&str; 6] = [
    "url",
    "price",
    "availability",
    "product_name",
    "manufacturer",
    "product_form",
];

/// Outcome of fetching one URL.
#[derive(Debug)]
pub struct FetchResult {
    pub url: String,
    pub document: Option<String>,
    pub error: Option<FetchError>,
}

impl FetchResult {
    pub fn success(url: &str, document: String) -> Self {
        Self {
            url: url.to_string(),
            document: Some(document),
            error: None,
        }
    }

    pub fn failure(url: &str, error: FetchError) -> Self {
        Self {
            url: url.to_string(),
            document: None,
            error: Some(error),
        }
    }
}

/// A parsed document known to be a product page.
pub struct ValidatedPage {
    url: String,
    document: Html,
}

impl ValidatedPage {
    pub(crate) fn new(url: &str, document: Html) -> Self {
        Self {
            url: url.to_string(),
            document,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }
}

/// Result of extracting a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Present(String),
    Absent,
}

impl FieldValue {
    pub fn is_present(&self) -> bool {
        matches!(self, FieldValue::Present(_))
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            FieldValue::Present(value) => Some(value),
            FieldValue::Absent => None,
        }
    }

    /// Value as written to the dataset.
    pub fn as_output(&self) -> &str {
        self.as_deref().unwrap_or(UNKNOWN)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Present)
    }
}

/// One row of the final dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub url: String,
    pub price: FieldValue,
    pub availability: FieldValue,
    pub product_name: FieldValue,
    pub manufacturer: FieldValue,
    pub product_form: FieldValue,
}

impl ProductRecord {
    /// Cells in `COLUMNS` order, with missing fields as `UNKNOWN`.
    pub fn to_row(&self) -> [&str; 6] {
        [
            self.url.as_str(),
            self.price.as_output(),
            self.availability.as_output(),
            self.product_name.as_output(),
            self.manufacturer.as_output(),
            self.product_form.as_output(),
        ]
    }

    pub fn known_fields(&self) -> usize {
        [
            &self.price,
            &self.availability,
            &self.product_name,
            &self.manufacturer,
            &self.product_form,
        ]
        .iter()
        .filter(|field| field.is_present())
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let empty = FieldValue::Present(String::new());
        assert!(empty.is_present());
        assert_eq!(empty.as_output(), "");
        assert_eq!(FieldValue::Absent.as_output(), UNKNOWN);
        assert_eq!(FieldValue::from(None), FieldValue::Absent);
    }

    #[test]
    fn test_row_order_matches_columns() {
        let record = ProductRecord {
            url: "https://agroplant.com.ua/uk/p/1".to_string(),
            price: FieldValue::Present("6 680 грн.".to_string()),
            availability: FieldValue::Absent,
            product_name: FieldValue::Present("Фунгіцид".to_string()),
            manufacturer: FieldValue::Absent,
            product_form: FieldValue::Present("5л".to_string()),
        };

        assert_eq!(
            record.to_row(),
            [
                "https://agroplant.com.ua/uk/p/1",
                "6 680 грн.",
                UNKNOWN,
                "Фунгіцид",
                UNKNOWN,
                "5л"
            ]
        );
        assert_eq!(record.known_fields(), 3);
    }
}
