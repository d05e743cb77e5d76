//! `kbdesk list|add|delete|clear` - Knowledge base administration.
//!
//! These talk to the database directly, through the knowledge service, so
//! they work without a running gateway.

use kbdesk_core::auth::Credential;

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let service = super::knowledge_service(&config).await?;

    let entries = service.list().await?;
    if entries.is_empty() {
        println!("📭 The knowledge base is empty.");
        return Ok(());
    }

    println!("📚 {} knowledge entries (newest first)\n", entries.len());
    for entry in &entries {
        println!("  #{:<5} {}", entry.id, entry.created_at.format("%Y-%m-%d %H:%M"));
        println!("         Q: {}", entry.question);
        println!("         A: {}", entry.answer);
        println!();
    }

    Ok(())
}

pub async fn add(
    question: String,
    answer: String,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let service = super::knowledge_service(&config).await?;

    let entry = service
        .create(Credential::from_option(password.as_deref()), &question, &answer)
        .await?;
    println!("✅ Added entry #{}", entry.id);

    Ok(())
}

pub async fn delete(id: i64, password: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let service = super::knowledge_service(&config).await?;

    service
        .delete_by_id(Credential::from_option(password.as_deref()), id)
        .await?;
    println!("🗑️  Deleted entry #{id} (if it existed)");

    Ok(())
}

pub async fn clear(
    confirm: bool,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !confirm {
        return Err("Refusing to clear the knowledge base without --confirm".into());
    }

    let config = super::load_config()?;
    let service = super::knowledge_service(&config).await?;

    let removed = service
        .clear_all(Credential::from_option(password.as_deref()))
        .await?;
    println!("🧹 Removed {removed} entries");

    Ok(())
}
