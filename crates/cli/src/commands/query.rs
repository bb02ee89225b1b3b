//! `recall query` — Run a scoped relevance query.

use recall_config::AppConfig;

pub async fn run(
    owner: &str,
    text: &str,
    topic: &str,
    top_k: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let client = super::build_client(&config)?;
    let contexts = super::build_context_manager(&config, client).await?;

    let results = contexts.query(owner, text, topic, top_k).await;

    if results.is_empty() {
        println!("No matching contexts (owner: {owner}, topic: {topic})");
        return Ok(());
    }

    println!("Matches for \"{text}\" (owner: {owner}, topic: {topic}):");
    for (rank, hit) in results.iter().enumerate() {
        println!("  {}. [{:.3}] {}", rank + 1, hit.score, hit.text);
    }

    Ok(())
}
