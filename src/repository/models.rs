//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Company record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::companies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CompanyRecord {
    pub company_id: i32,
    pub ticker: String,
    pub website: Option<String>,
    pub market_cap_value: Option<f64>,
    pub market_cap_currency: Option<String>,
    pub description: Option<String>,
}

/// New company for insertion.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = schema::companies)]
pub struct NewCompany<'a> {
    pub ticker: &'a str,
    pub website: Option<&'a str>,
    pub market_cap_value: Option<f64>,
    pub market_cap_currency: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Crawl error record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::crawl_errors)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CrawlErrorRecord {
    pub id: i32,
    pub company_id: i32,
    pub url: String,
    pub message: String,
    pub retry_count: i32,
    pub resolved: bool,
    pub last_attempt: String,
    pub created_at: String,
}

/// Mineral estimate record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::mineral_estimates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MineralEstimateRecord {
    pub company_id: i32,
    pub gold_reserve_moz: Option<f64>,
    pub gold_mi_moz: Option<f64>,
    pub gold_resource_moz: Option<f64>,
    pub silver_reserve_moz: Option<f64>,
    pub silver_mi_moz: Option<f64>,
    pub silver_resource_moz: Option<f64>,
    pub aueq_reserve_moz: Option<f64>,
    pub aueq_mi_moz: Option<f64>,
    pub aueq_resource_moz: Option<f64>,
    pub last_updated: String,
}

/// Mineral estimate row for insert or replace.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::mineral_estimates)]
pub struct NewMineralEstimate<'a> {
    pub company_id: i32,
    pub gold_reserve_moz: Option<f64>,
    pub gold_mi_moz: Option<f64>,
    pub gold_resource_moz: Option<f64>,
    pub silver_reserve_moz: Option<f64>,
    pub silver_mi_moz: Option<f64>,
    pub silver_resource_moz: Option<f64>,
    pub aueq_reserve_moz: Option<f64>,
    pub aueq_mi_moz: Option<f64>,
    pub aueq_resource_moz: Option<f64>,
    pub last_updated: &'a str,
}

/// Production record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::production)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductionRecord {
    pub company_id: i32,
    pub gold_koz: Option<f64>,
    pub silver_koz: Option<f64>,
    pub aueq_koz: Option<f64>,
    pub last_updated: String,
}

/// Production row for insert or replace.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::production)]
pub struct NewProduction<'a> {
    pub company_id: i32,
    pub gold_koz: Option<f64>,
    pub silver_koz: Option<f64>,
    pub aueq_koz: Option<f64>,
    pub last_updated: &'a str,
}
