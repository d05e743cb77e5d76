//! `kbdesk doctor` - Diagnose configuration and database.

use kbdesk_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 kbdesk Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file (defaults in use) — run `kbdesk onboard`");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config and re-run.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ LLM API key configured (model: {})", config.llm.model);
    } else {
        println!("  ⚠️  No LLM API key — set KBDESK_API_KEY or [llm] api_key");
        issues += 1;
    }

    match config.llm.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => println!("  ✅ LLM endpoint: {url}"),
        None => {
            println!("  ❌ No LLM endpoint — set KBDESK_API_URL or [llm] api_url");
            issues += 1;
        }
    }

    if config.has_admin_password() {
        println!("  ✅ Admin password configured");
    } else {
        println!("  ⚠️  No admin password — knowledge edits are disabled");
        issues += 1;
    }

    match super::knowledge_service(&config).await {
        Ok(service) => match service.count().await {
            Ok(count) => println!(
                "  ✅ Database OK: {} ({count} entries)",
                config.database_path().display()
            ),
            Err(e) => {
                println!("  ❌ Database query failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Cannot open database {}: {e}", config.database_path().display());
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
