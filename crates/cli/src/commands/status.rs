//! `recall status` — Show system status.
//!
//! Reads only local state (config + the authoritative record); never
//! touches the network, so it works without any credentials.

use recall_config::AppConfig;
use recall_context::ContextRecord;
use recall_session::ApprovalList;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Recall Status");
    println!("=============");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Model:         {}", config.completion.model);
    println!("  Embedding:     {} ({} dims)", config.embedding.model, config.embedding.dimension);
    println!("  Index:         {} ({})", config.index.name, config.index.backend);
    println!("  Namespace:     {}", config.index.namespace);
    println!(
        "  Pacing:        {:.1}s interval, {} attempts, {}s default backoff",
        config.pacing.min_interval_secs,
        config.pacing.max_retries,
        config.pacing.default_retry_after_secs
    );
    println!("  API key:       {}", if config.api_key.is_some() { "configured" } else { "missing" });
    println!(
        "  Index key:     {}",
        if config.index.api_key.is_some() { "configured" } else { "missing" }
    );

    let record = ContextRecord::new(config.storage.contexts_path());
    let count = record.count().await;
    println!("\n  Contexts:      {count} recorded");
    if let Some(latest) = record.latest_timestamp().await {
        println!("  Latest:        {latest}");
    }

    let approvals = ApprovalList::new(config.storage.approvals_path(), None);
    let approved = approvals.approved_ids().await;
    if !approved.is_empty() {
        println!("  Approved:      {} chat(s)", approved.len());
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file — run `recall onboard` first");
    }

    Ok(())
}
