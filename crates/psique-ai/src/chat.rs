use aws_sdk_bedrockruntime::Client;
use tracing::info;
use uuid::Uuid;

use psique_core::models::ai_transaction::AiTransactionKind;
use psique_core::models::chat_history::{ChatHistoryMessage, ChatRole};

use crate::converse::{AiResult, Turn, invoke_converse};
use crate::error::AiError;

/// How much of a stored conversation is replayed to the model.
pub const MAX_HISTORY_MESSAGES: usize = 20;

const CHAT_MAX_TOKENS: i32 = 2048;

/// Answer `question` in the assistant conversation of one patient.
///
/// `system_prompt` already carries the patient context
/// (see [`crate::context::assistant_system_prompt`]).
pub async fn chat_converse(
    client: &Client,
    model_id: &str,
    patient_id: Uuid,
    system_prompt: &str,
    history: &[ChatHistoryMessage],
    question: &str,
) -> Result<AiResult<String>, AiError> {
    if question.trim().is_empty() {
        return Err(AiError::EmptyInput("question is empty"));
    }
    let turns = build_turns(history, question);
    info!(patient_id = %patient_id, model = model_id, turns = turns.len(), "assistant chat");

    let (text, usage) =
        invoke_converse(client, model_id, system_prompt, &turns, CHAT_MAX_TOKENS).await?;
    let answer = text.trim().to_string();
    if answer.is_empty() {
        return Err(AiError::ResponseParse("empty assistant reply".to_string()));
    }

    Ok(AiResult::complete(
        AiTransactionKind::AssistantChat,
        model_id,
        patient_id,
        usage,
        answer,
    ))
}

/// Converse needs strictly alternating turns starting with the user. Stored
/// history can break that when an earlier answer failed, so consecutive
/// messages from the same role are merged.
pub fn build_turns(history: &[ChatHistoryMessage], question: &str) -> Vec<Turn> {
    let start = history.len().saturating_sub(MAX_HISTORY_MESSAGES);
    let mut turns: Vec<Turn> = Vec::new();

    let messages = history[start..]
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .skip_while(|(role, _)| *role != ChatRole::User)
        .chain(std::iter::once((ChatRole::User, question)));

    for (role, content) in messages {
        match turns.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(content);
            }
            _ => turns.push(match role {
                ChatRole::User => Turn::user(content),
                ChatRole::Assistant => Turn::assistant(content),
            }),
        }
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: ChatRole, content: &str) -> ChatHistoryMessage {
        ChatHistoryMessage {
            role,
            content: content.to_string(),
            timestamp: jiff::Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn question_is_appended_as_user_turn() {
        let history = vec![msg(ChatRole::User, "q1"), msg(ChatRole::Assistant, "a1")];
        let turns = build_turns(&history, "q2");
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[2].role, ChatRole::User);
        assert_eq!(turns[2].content, "q2");
        assert_eq!(turns[1].role, ChatRole::Assistant);
        assert_eq!(turns[1].content, "a1");
    }

    #[test]
    fn unanswered_question_is_merged() {
        let history = vec![
            msg(ChatRole::User, "q1"),
            msg(ChatRole::Assistant, "a1"),
            msg(ChatRole::User, "q2"),
        ];
        let turns = build_turns(&history, "q3");
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[2].content, "q2\n\nq3");
    }

    #[test]
    fn leading_assistant_turns_are_dropped() {
        let history = vec![msg(ChatRole::Assistant, "olá"), msg(ChatRole::User, "q1")];
        let turns = build_turns(&history, "q2");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "q1\n\nq2");
    }

    #[test]
    fn history_is_capped() {
        let history: Vec<_> = (0..50)
            .map(|i| {
                let role = if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant };
                msg(role, &i.to_string())
            })
            .collect();
        let turns = build_turns(&history, "last");
        assert_eq!(turns.len(), MAX_HISTORY_MESSAGES + 1);
        assert_eq!(turns[0].role, ChatRole::User);
    }
}
