//! assayer - gold and silver resource estimates mined from company reports.
//!
//! Crawls mining company websites for technical reports and filings, extracts
//! their text, mines reserve/resource/production figures and stores
//! gold-equivalent totals per company.

pub mod cli;
pub mod config;
pub mod extraction;
pub mod mining;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scoring;
pub mod scrapers;
pub mod services;
pub mod units;
pub mod utils;
