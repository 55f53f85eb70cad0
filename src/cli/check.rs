//! External tool check command.

use console::style;

/// Tools the extraction tiers shell out to, with the tier that needs them.
const TOOLS: &[(&str, &str)] = &[
    ("pdfinfo", "alternate"),
    ("pdftotext", "alternate"),
    ("pdftoppm", "ocr"),
    ("tesseract", "ocr"),
];

/// Report which extraction tools are on PATH.
pub async fn cmd_check() -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    let mut all_found = true;
    for (tool, tier) in TOOLS {
        let status = match which::which(tool) {
            Ok(path) => style(format!("✓ {}", path.display())).green(),
            Err(_) => {
                all_found = false;
                style("✗ not found".to_string()).red()
            }
        };
        println!("  {:<12} {:<11} {}", tool, tier, status);
    }

    println!();
    if all_found {
        println!("{} All extraction tiers available", style("✓").green());
    } else {
        println!(
            "{} Missing tools disable their tier; install poppler-utils and tesseract-ocr",
            style("!").yellow()
        );
    }

    Ok(())
}
