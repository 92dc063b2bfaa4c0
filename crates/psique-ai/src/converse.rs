//! Shared Converse API call.

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use uuid::Uuid;

use psique_core::models::ai_transaction::{AiTransaction, AiTransactionKind, AiTransactionStatus};
use psique_core::models::chat_history::ChatRole;
use psique_core::models::token_count::{TokenCount, TokenUsage};

use crate::error::AiError;
use crate::tokens;

/// Output of one invocation plus the transaction record the caller persists.
#[derive(Debug, Clone)]
pub struct AiResult<T> {
    pub transaction: AiTransaction,
    pub output: T,
}

impl<T> AiResult<T> {
    pub(crate) fn complete(
        kind: AiTransactionKind,
        model_id: &str,
        subject_id: Uuid,
        usage: TokenUsage,
        output: T,
    ) -> Self {
        Self {
            transaction: AiTransaction {
                id: Uuid::new_v4(),
                kind,
                model_id: model_id.to_string(),
                subject_id,
                usage,
                status: AiTransactionStatus::Complete,
                created_at: jiff::Timestamp::now(),
            },
            output,
        }
    }

    pub(crate) fn map<U>(self, f: impl FnOnce(&AiTransaction, T) -> U) -> AiResult<U> {
        let output = f(&self.transaction, self.output);
        AiResult {
            transaction: self.transaction,
            output,
        }
    }
}

/// One message of a conversation sent to the model.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: ChatRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Send `turns` with `system_prompt` and return the reply text and usage.
pub async fn invoke_converse(
    client: &Client,
    model_id: &str,
    system_prompt: &str,
    turns: &[Turn],
    max_tokens: i32,
) -> Result<(String, TokenUsage), AiError> {
    let messages = turns
        .iter()
        .map(|turn| {
            let role = match turn.role {
                ChatRole::User => ConversationRole::User,
                ChatRole::Assistant => ConversationRole::Assistant,
            };
            Message::builder()
                .role(role)
                .content(ContentBlock::Text(turn.content.clone()))
                .build()
                .map_err(|e| AiError::Invocation(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let response = client
        .converse()
        .model_id(model_id)
        .system(SystemContentBlock::Text(system_prompt.to_string()))
        .set_messages(Some(messages))
        .inference_config(
            InferenceConfiguration::builder()
                .max_tokens(max_tokens)
                .temperature(0.2)
                .build(),
        )
        .send()
        .await
        .map_err(|e| AiError::Invocation(e.into_service_error().to_string()))?;

    let output_message = response
        .output()
        .and_then(|o| o.as_message().ok())
        .ok_or_else(|| AiError::ResponseParse("no message in response".to_string()))?;

    let text = output_message
        .content()
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");

    let count = response
        .usage()
        .map(tokens::extract_token_usage)
        .unwrap_or_default();

    Ok((text, tokens::usage_for(model_id, count)))
}
