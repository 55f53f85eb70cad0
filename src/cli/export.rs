//! Export command.

use std::path::Path;

use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::config::Settings;
use crate::models::{Company, ErrorRecord};
use crate::repository::{AggregateExport, DbContext, DbError};

/// Everything the pipeline stores, as written by `export`.
#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub companies: Vec<Company>,
    /// Stored figures per company, keyed by ticker.
    pub aggregates: Vec<AggregateExport>,
    /// The whole error ledger, resolved entries included.
    pub crawl_errors: Vec<ErrorRecord>,
}

pub async fn build_export(ctx: &DbContext) -> Result<ExportDocument, DbError> {
    Ok(ExportDocument {
        exported_at: Utc::now(),
        companies: ctx.companies().get_all().await?,
        aggregates: ctx.aggregates().get_all_for_export().await?,
        crawl_errors: ctx.errors().list(None, true).await?,
    })
}

/// Write companies, aggregates and the error ledger as pretty JSON.
pub async fn cmd_export(settings: &Settings, output: Option<&Path>) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let export = build_export(&ctx).await?;
    let json = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, json).await?;
            eprintln!(
                "{} Exported {} companies, {} aggregates and {} ledger entries to {}",
                style("✓").green(),
                export.companies.len(),
                export.aggregates.len(),
                export.crawl_errors.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metal, MinedFigures, QuantityType};
    use crate::repository::CompanyInput;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_export_includes_companies_and_ledger() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("assayer.db"));
        ctx.init_schema().await.unwrap();

        let id = ctx
            .companies()
            .upsert(&CompanyInput {
                ticker: "nst".to_string(),
                website: Some("https://www.nsrltd.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        ctx.companies()
            .upsert(&CompanyInput {
                ticker: "idle".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut figures = MinedFigures::new();
        figures.set(Metal::Gold, QuantityType::Reserve, Some(3.0));
        ctx.aggregates().upsert(id, &figures).await.unwrap();

        let ledger = ctx.errors();
        ledger.record(id, "https://www.nsrltd.com/a.pdf", "HTTP 404").await.unwrap();
        ledger.record(id, "https://www.nsrltd.com/b.pdf", "timeout").await.unwrap();
        ledger.mark_resolved(id, "https://www.nsrltd.com/b.pdf").await.unwrap();

        let export = build_export(&ctx).await.unwrap();
        let json = serde_json::to_value(&export).unwrap();

        assert_eq!(json["companies"].as_array().unwrap().len(), 2);
        assert_eq!(json["aggregates"].as_array().unwrap().len(), 1);
        assert_eq!(json["aggregates"][0]["ticker"], "NST");
        // Resolved entries are exported too
        assert_eq!(json["crawl_errors"].as_array().unwrap().len(), 2);
        assert!(json["exported_at"].is_string());
    }
}
