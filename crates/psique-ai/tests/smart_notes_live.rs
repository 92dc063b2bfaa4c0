//! Live Bedrock test for SmartNotes generation.
//!
//! Requires AWS credentials with Bedrock access and a model id in
//! `PSIQUE_MODEL_ID` (e.g. `us.anthropic.claude-sonnet-4-20250514-v1:0`).
//!
//! Run with: `cargo test -p psique-ai --test smart_notes_live -- --ignored`

use psique_ai::{client, notes};
use psique_core::models::transcript::{Transcript, TranscriptSegment};

#[tokio::test]
#[ignore]
async fn generates_notes_from_a_short_transcript() {
    let model_id = std::env::var("PSIQUE_MODEL_ID").expect("PSIQUE_MODEL_ID not set");
    let client = client::build_client().await;

    let segment = |speaker: &str, text: &str| TranscriptSegment {
        speaker: speaker.to_string(),
        start_seconds: 0.0,
        end_seconds: 0.0,
        text: text.to_string(),
    };
    let transcript = Transcript {
        session_id: uuid::Uuid::new_v4(),
        audio_key: "test".to_string(),
        text: String::new(),
        segments: vec![
            segment("spk_0", "Como foi a sua semana?"),
            segment("spk_1", "Difícil. Voltei a ter insônia antes das provas."),
            segment("spk_0", "Vamos retomar a técnica de respiração que treinamos."),
        ],
        created_at: jiff::Timestamp::now(),
    };

    let result = notes::generate_smart_notes(&client, &model_id, &transcript, "")
        .await
        .unwrap();
    println!("{:#?}", result.output);
    assert!(!result.output.summary.is_empty());
    assert_eq!(result.output.transaction_id, result.transaction.id);
    assert!(result.transaction.usage.tokens.input > 0);
}
