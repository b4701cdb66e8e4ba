pub mod rules;
pub mod scraper_config;

pub use rules::*;
pub use scraper_config::*;
