//! Prompt assembly — turning session history and retrieved contexts
//! into the message sequence sent to the completion service.
//!
//! History is replayed verbatim in insertion order. Retrieved contexts
//! are folded into the final user message only, so earlier turns stay
//! exactly as the user and assistant produced them.

use recall_core::completion::ChatMessage;
use recall_core::context::RetrievedContext;
use recall_core::session::{Role, Turn};

/// Fold retrieved contexts into a user message.
///
/// With no retrieved contexts the text passes through unchanged.
pub fn augment(text: &str, retrieved: &[RetrievedContext]) -> String {
    if retrieved.is_empty() {
        return text.to_string();
    }

    let block: Vec<&str> = retrieved.iter().map(|r| r.text.as_str()).collect();
    format!("Context:\n{}\n\nUser message: {}", block.join("\n"), text)
}

/// Build the completion request from session history plus retrieval.
///
/// Expects the inbound user turn to already be the last entry of
/// `history`; that final turn is the one that gets the context block.
pub fn build_messages(history: &[Turn], retrieved: &[RetrievedContext]) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = history.iter().map(ChatMessage::from).collect();

    if let Some(last) = messages.last_mut() {
        if last.role == Role::User {
            last.content = augment(&last.content, retrieved);
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::context::ContextId;

    fn retrieved(text: &str) -> RetrievedContext {
        RetrievedContext {
            id: ContextId::from("alice_0"),
            text: text.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn no_retrieval_leaves_text_plain() {
        assert_eq!(augment("Where is the kitchen?", &[]), "Where is the kitchen?");
    }

    #[test]
    fn retrieval_prepends_context_block() {
        let hits = vec![
            retrieved("The kitchen is north of the hallway."),
            retrieved("The hallway has a red door."),
        ];
        let prompt = augment("Where is the kitchen?", &hits);
        assert_eq!(
            prompt,
            "Context:\nThe kitchen is north of the hallway.\nThe hallway has a red door.\n\nUser message: Where is the kitchen?"
        );
    }

    #[test]
    fn only_final_user_turn_is_augmented() {
        let history = vec![
            Turn::user("first question", None),
            Turn::assistant("first answer"),
            Turn::user("second question", None),
        ];
        let hits = vec![retrieved("a relevant fact")];

        let messages = build_messages(&history, &hits);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "first question");
        assert_eq!(messages[1].content, "first answer");
        assert!(messages[2].content.starts_with("Context:\n"));
        assert!(messages[2].content.ends_with("User message: second question"));
    }

    #[test]
    fn history_order_is_preserved() {
        let history = vec![
            Turn::user("t1", None),
            Turn::assistant("t2"),
            Turn::user("t3", None),
        ];
        let messages = build_messages(&history, &[]);
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn trailing_assistant_turn_is_not_augmented() {
        let history = vec![Turn::user("question", None), Turn::assistant("answer")];
        let messages = build_messages(&history, &[retrieved("fact")]);
        assert_eq!(messages[1].content, "answer");
    }
}
