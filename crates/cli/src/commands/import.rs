//! `kbdesk import` - Bulk import a spreadsheet.

use kbdesk_core::auth::Credential;
use std::path::PathBuf;
use tracing::debug;

pub async fn run(
    file: PathBuf,
    password: Option<String>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = kbdesk_import::import_file(&file)?;
    debug!(
        file = %file.display(),
        rows = report.items.len(),
        dropped = report.dropped,
        "Spreadsheet parsed"
    );

    println!("📄 {}", file.display());
    println!("   Rows with question and answer: {}", report.items.len());
    if report.dropped > 0 {
        println!("   ⚠️  Dropped rows (missing question or answer): {}", report.dropped);
    }

    if report.items.is_empty() {
        println!("\n   Nothing to import. Expected a header row with one of");
        println!("   question: {}", kbdesk_import::QUESTION_ALIASES.join(", "));
        println!("   answer:   {}", kbdesk_import::ANSWER_ALIASES.join(", "));
        return Ok(());
    }

    if dry_run {
        for item in report.items.iter().take(5) {
            println!("   • {} → {}", item.question, item.answer);
        }
        println!("\n   Dry run, nothing written.");
        return Ok(());
    }

    let config = super::load_config()?;
    let service = super::knowledge_service(&config).await?;
    let inserted = service
        .bulk_create(Credential::from_option(password.as_deref()), &report.items)
        .await?;

    println!("✅ Imported {inserted} entries");
    Ok(())
}
