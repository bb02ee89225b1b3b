//! `recall ingest` — Store a context fragment by hand.

use recall_config::AppConfig;

pub async fn run(owner: &str, text: &str, topic: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let client = super::build_client(&config)?;
    let contexts = super::build_context_manager(&config, client).await?;

    let id = contexts
        .ingest(owner, text, topic, serde_json::Map::new())
        .await?;

    println!("Stored context {id} (owner: {owner}, topic: {topic})");
    Ok(())
}
