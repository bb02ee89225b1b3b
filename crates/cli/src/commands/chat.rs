//! `recall chat` — Interactive or single-message chat mode.
//!
//! Interactive commands:
//! - `/auto on` / `/auto off` — toggle auto-reply for this session
//! - `/reset` — clear the session history
//! - `/quit` — leave
//!
//! When `RECALL_APPROVAL_PASSWORD` is set, the chat must be approved
//! with that password before any message is served.

use recall_agent::{InboundMessage, Orchestrator};
use recall_config::AppConfig;
use recall_core::session::SessionId;
use recall_providers::RequestPacer;
use recall_session::{ApprovalList, ApprovalOutcome, SessionManager};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

const CHANNEL_ID: &str = "cli";

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let client = super::build_client(&config)?;
    let contexts = super::build_context_manager(&config, client.clone()).await?;
    let sessions = Arc::new(SessionManager::new());

    let pacer = Arc::new(
        RequestPacer::new(Duration::from_secs_f64(config.pacing.min_interval_secs))
            .with_default_retry_after(Duration::from_secs(config.pacing.default_retry_after_secs)),
    );

    let orchestrator = Orchestrator::new(
        sessions,
        contexts,
        client,
        pacer,
        config.pacing.max_retries,
        super::RETRIEVAL_K,
    );

    let approvals = ApprovalList::new(
        config.storage.approvals_path(),
        std::env::var("RECALL_APPROVAL_PASSWORD").ok(),
    );

    let sender_id = std::env::var("USER").unwrap_or_else(|_| "local".to_string());

    if let Some(text) = message {
        // Single message mode
        if !approvals.is_approved(CHANNEL_ID).await {
            return Err("This chat is not approved. Run `recall chat` interactively \
                        and enter the approval password."
                .into());
        }

        let reply = orchestrator
            .handle(inbound(&sender_id, text, true))
            .await?;
        match reply {
            Some(text) => println!("{text}"),
            None => println!("(no reply)"),
        }
        return Ok(());
    }

    // Interactive mode
    if !ensure_approved(&approvals).await? {
        return Ok(());
    }

    let session = SessionId::compose(CHANNEL_ID, None);
    orchestrator.set_auto_reply(&session, true).await;

    println!();
    println!("  Recall — Interactive Mode");
    println!("  Model:     {}", config.completion.model);
    println!("  Index:     {} ({})", config.index.name, config.index.backend);
    println!("  Commands:  /auto on|off, /reset, /quit");
    println!();

    let stdin = std::io::stdin();
    print!("  You > ");
    std::io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();

        match input {
            "" => {}
            "/quit" | "/exit" | "exit" => break,
            "/reset" => {
                orchestrator.reset_session(&session).await;
                println!("  (history cleared)");
            }
            "/auto on" => {
                orchestrator.set_auto_reply(&session, true).await;
                println!("  (auto-reply on)");
            }
            "/auto off" => {
                orchestrator.set_auto_reply(&session, false).await;
                println!("  (auto-reply off — messages will be ignored)");
            }
            text => {
                let reply = orchestrator
                    .handle(inbound(&sender_id, text.to_string(), false))
                    .await?;
                match reply {
                    Some(response) => {
                        println!();
                        for out in response.lines() {
                            println!("  Recall > {out}");
                        }
                        println!();
                    }
                    None => println!("  (ignored — auto-reply is off, use /auto on)"),
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    Ok(())
}

fn inbound(sender_id: &str, text: String, explicit_target: bool) -> InboundMessage {
    InboundMessage {
        channel_id: CHANNEL_ID.into(),
        thread_id: None,
        sender_id: sender_id.to_string(),
        text,
        explicit_target,
    }
}

/// Walk the chat through approval if gating is active. Returns false
/// when the user gives up.
async fn ensure_approved(approvals: &ApprovalList) -> Result<bool, Box<dyn std::error::Error>> {
    if approvals.is_approved(CHANNEL_ID).await {
        return Ok(true);
    }

    approvals.register_pending(CHANNEL_ID).await;
    println!("  This chat requires approval.");

    let stdin = std::io::stdin();
    loop {
        print!("  Password (empty to quit) > ");
        std::io::stdout().flush()?;

        let mut attempt = String::new();
        if stdin.lock().read_line(&mut attempt)? == 0 {
            return Ok(false);
        }
        let attempt = attempt.trim();
        if attempt.is_empty() {
            return Ok(false);
        }

        match approvals.approve(CHANNEL_ID, attempt).await? {
            ApprovalOutcome::Approved | ApprovalOutcome::AlreadyApproved => {
                println!("  Approved.");
                return Ok(true);
            }
            ApprovalOutcome::WrongPassword => println!("  Wrong password."),
            ApprovalOutcome::Disabled => return Ok(true),
        }
    }
}
