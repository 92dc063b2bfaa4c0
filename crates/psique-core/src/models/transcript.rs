use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transcript {
    pub session_id: Uuid,
    pub audio_key: String,
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    pub created_at: jiff::Timestamp,
}

/// A stretch of speech attributed to one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TranscriptSegment {
    pub speaker: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

impl Transcript {
    /// Speaker-labelled text, one line per segment. Falls back to the flat
    /// text when no diarization is available.
    pub fn dialogue(&self) -> String {
        if self.segments.is_empty() {
            return self.text.clone();
        }
        self.segments
            .iter()
            .map(|s| format!("{}: {}", s.speaker, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialogue_prefers_segments() {
        let mut t = Transcript {
            session_id: Uuid::nil(),
            audio_key: "a.mp3".into(),
            text: "oi tudo bem".into(),
            segments: vec![],
            created_at: jiff::Timestamp::UNIX_EPOCH,
        };
        assert_eq!(t.dialogue(), "oi tudo bem");

        t.segments = vec![
            TranscriptSegment {
                speaker: "spk_0".into(),
                start_seconds: 0.0,
                end_seconds: 1.0,
                text: "oi".into(),
            },
            TranscriptSegment {
                speaker: "spk_1".into(),
                start_seconds: 1.0,
                end_seconds: 2.0,
                text: "tudo bem".into(),
            },
        ];
        assert_eq!(t.dialogue(), "spk_0: oi\nspk_1: tudo bem");
    }
}
