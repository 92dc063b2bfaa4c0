//! Amazon Transcribe output JSON.

use serde::Deserialize;

use psique_core::models::transcript::{Transcript, TranscriptSegment};

use crate::error::TranscribeError;

/// Text and speaker segments of a finished job.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOutput {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

impl TranscriptionOutput {
    pub fn into_transcript(
        self,
        session_id: uuid::Uuid,
        audio_key: impl Into<String>,
        created_at: jiff::Timestamp,
    ) -> Transcript {
        Transcript {
            session_id,
            audio_key: audio_key.into(),
            text: self.text,
            segments: self.segments,
            created_at,
        }
    }
}

#[derive(Deserialize)]
struct Output {
    results: Results,
}

#[derive(Deserialize)]
struct Results {
    #[serde(default)]
    transcripts: Vec<FullText>,
    #[serde(default)]
    audio_segments: Vec<AudioSegment>,
}

#[derive(Deserialize)]
struct FullText {
    transcript: String,
}

#[derive(Deserialize)]
struct AudioSegment {
    transcript: String,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    speaker_label: Option<String>,
}

/// Parse the job output. Speaker-labelled `audio_segments` are used when
/// present; otherwise only the flat `transcripts[0]` text is returned.
pub fn parse_transcript(json: &str) -> Result<TranscriptionOutput, TranscribeError> {
    let output: Output =
        serde_json::from_str(json).map_err(|e| TranscribeError::Parse(e.to_string()))?;

    let text = output
        .results
        .transcripts
        .into_iter()
        .next()
        .map(|t| t.transcript)
        .unwrap_or_default();

    let mut segments: Vec<TranscriptSegment> = Vec::new();
    for seg in output.results.audio_segments {
        let text = seg.transcript.trim();
        if text.is_empty() {
            continue;
        }
        let speaker = seg.speaker_label.unwrap_or_else(|| "spk_0".to_string());
        let start = parse_seconds(seg.start_time.as_deref());
        let end = parse_seconds(seg.end_time.as_deref());

        // Transcribe splits long turns; glue consecutive pieces of the same speaker.
        match segments.last_mut() {
            Some(last) if last.speaker == speaker => {
                last.text.push(' ');
                last.text.push_str(text);
                last.end_seconds = end;
            }
            _ => segments.push(TranscriptSegment {
                speaker,
                start_seconds: start,
                end_seconds: end,
                text: text.to_string(),
            }),
        }
    }

    Ok(TranscriptionOutput { text, segments })
}

fn parse_seconds(value: Option<&str>) -> f64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0.0)
}
