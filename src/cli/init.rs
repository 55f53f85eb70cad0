//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let companies = ctx.companies().get_all().await?;
    if companies.is_empty() {
        println!(
            "{} No companies registered yet. Add one with 'assay company add TICKER --website URL'",
            style("!").yellow()
        );
    }

    println!(
        "{} Initialized assayer in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
