use aws_sdk_bedrockruntime::Client;
use tracing::info;

use psique_core::models::ai_transaction::AiTransactionKind;
use psique_core::models::smart_notes::{SmartNotes, SmartNotesBody};
use psique_core::models::transcript::Transcript;
use psique_core::text::plain_text;

use crate::converse::{AiResult, Turn, invoke_converse};
use crate::error::AiError;
use crate::prompts;

const SMART_NOTES_MAX_TOKENS: i32 = 4096;
const DRAFT_MAX_TOKENS: i32 = 2048;

/// Summarise a session transcript into [`SmartNotes`].
pub async fn generate_smart_notes(
    client: &Client,
    model_id: &str,
    transcript: &Transcript,
    patient_context: &str,
) -> Result<AiResult<SmartNotes>, AiError> {
    let dialogue = transcript.dialogue();
    if dialogue.trim().is_empty() {
        return Err(AiError::EmptyInput("transcript has no text"));
    }
    info!(session_id = %transcript.session_id, model = model_id, "generating smart notes");

    let message = format!("{patient_context}\n\n<transcript>\n{dialogue}\n</transcript>");
    let (text, usage) = invoke_converse(
        client,
        model_id,
        prompts::SMART_NOTES,
        &[Turn::user(message)],
        SMART_NOTES_MAX_TOKENS,
    )
    .await?;

    let body = parse_smart_notes(&text)?;
    let session_id = transcript.session_id;
    let result = AiResult::complete(AiTransactionKind::SmartNotes, model_id, session_id, usage, body)
        .map(|tx, body| body.into_notes(session_id, tx.id, tx.created_at));

    info!(
        session_id = %session_id,
        transaction_id = %result.transaction.id,
        risk_flags = result.output.risk_flags.len(),
        "smart notes complete"
    );
    Ok(result)
}

/// Draft an evolution from a session's SmartNotes, continuing the tone of
/// the previous evolution when there is one.
pub async fn draft_evolution(
    client: &Client,
    model_id: &str,
    notes: &SmartNotes,
    previous_evolution: Option<&str>,
) -> Result<AiResult<String>, AiError> {
    info!(session_id = %notes.session_id, model = model_id, "drafting evolution");

    let mut message = String::new();
    if let Some(previous) = previous_evolution.map(plain_text).filter(|p| !p.is_empty()) {
        message.push_str(&format!("<previous_evolution>\n{previous}\n</previous_evolution>\n\n"));
    }
    message.push_str(&format!("<smart_notes>\n{}\n</smart_notes>", render_notes(notes)));

    let (text, usage) = invoke_converse(
        client,
        model_id,
        prompts::EVOLUTION_DRAFT,
        &[Turn::user(message)],
        DRAFT_MAX_TOKENS,
    )
    .await?;

    let draft = text.trim().to_string();
    if draft.is_empty() {
        return Err(AiError::ResponseParse("empty evolution draft".to_string()));
    }

    Ok(AiResult::complete(
        AiTransactionKind::EvolutionDraft,
        model_id,
        notes.session_id,
        usage,
        draft,
    ))
}

/// Parse the model's reply into a [`SmartNotesBody`].
pub fn parse_smart_notes(text: &str) -> Result<SmartNotesBody, AiError> {
    let json = extract_json_object(text).ok_or_else(|| {
        AiError::SchemaViolation(format!("no JSON object in response: {text}"))
    })?;
    let body: SmartNotesBody = serde_json::from_str(json)
        .map_err(|e| AiError::SchemaViolation(format!("failed to parse SmartNotes: {e}")))?;
    if body.summary.trim().is_empty() {
        return Err(AiError::SchemaViolation("summary is empty".to_string()));
    }
    Ok(body)
}

/// The outermost `{...}` in a reply, tolerating Markdown code fences and
/// stray prose around it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn render_notes(notes: &SmartNotes) -> String {
    let mut out = format!("Resumo: {}\n", notes.summary);
    let sections = [
        ("Temas", &notes.main_themes),
        ("Intervenções", &notes.interventions),
        ("Riscos", &notes.risk_flags),
        ("Próximos passos", &notes.next_steps),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("{title}:\n"));
        for item in items {
            out.push_str(&format!("- {item}\n"));
        }
    }
    if !notes.patient_progress.is_empty() {
        out.push_str(&format!("Evolução do paciente: {}\n", notes.patient_progress));
    }
    out
}
