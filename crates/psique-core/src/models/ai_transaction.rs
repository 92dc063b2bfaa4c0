use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::token_count::TokenUsage;

/// One model invocation, kept for auditing and cost reporting.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AiTransaction {
    pub id: Uuid,
    pub kind: AiTransactionKind,
    pub model_id: String,
    /// Session or patient the invocation was about.
    pub subject_id: Uuid,
    pub usage: TokenUsage,
    pub status: AiTransactionStatus,
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AiTransactionKind {
    SmartNotes,
    EvolutionDraft,
    AssistantChat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AiTransactionStatus {
    Pending,
    Complete,
    Failed,
}
