//! Harvests product pages from the agroplant.com.ua catalogue: fetch with
//! retries, confirm each page is a product page, pull five fields out of the
//! markup and assemble them into an exportable table.

pub mod config;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod storage;
