//! psique-transcribe
//!
//! Session audio to speaker-labelled text via Amazon Transcribe.

pub mod error;
pub mod parse;

use std::time::Duration;

pub use aws_sdk_transcribe::types::MediaFormat;

use aws_sdk_transcribe::types::{LanguageCode, Media, Settings, TranscriptionJobStatus};
use tracing::{info, warn};
use uuid::Uuid;

use psique_storage::bucket::Bucket;

use crate::error::TranscribeError;
pub use crate::parse::{TranscriptionOutput, parse_transcript};

const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Prefix of the temporary job output inside the bucket.
pub const OUTPUT_PREFIX: &str = "_transcribe/";

#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// BCP-47 language code, e.g. `pt-BR`.
    pub language: String,
    /// Therapist and patient by default; couples and family sessions need more.
    pub max_speakers: i32,
    /// Give up polling after this long.
    pub deadline: Duration,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: "pt-BR".to_string(),
            max_speakers: 2,
            deadline: Duration::from_secs(12 * 60),
        }
    }
}

/// Transcribe an audio file already uploaded to `bucket`.
///
/// Starts a job with speaker labels, polls every 3 s until it finishes or
/// the deadline passes, reads the output JSON back from the bucket and
/// removes the job and its output.
pub async fn transcribe_audio(
    config: &aws_config::SdkConfig,
    bucket: &Bucket,
    audio_key: &str,
    media_format: MediaFormat,
    options: &TranscribeOptions,
) -> Result<TranscriptionOutput, TranscribeError> {
    let transcribe = aws_sdk_transcribe::Client::new(config);

    let job_name = format!("psique-{}", Uuid::new_v4());
    let s3_uri = format!("s3://{}/{audio_key}", bucket.name());
    let output_key = format!("{OUTPUT_PREFIX}{job_name}.json");

    info!(job_name, audio_key, language = %options.language, "starting transcription job");

    transcribe
        .start_transcription_job()
        .transcription_job_name(&job_name)
        .media(Media::builder().media_file_uri(&s3_uri).build())
        .media_format(media_format)
        .language_code(LanguageCode::from(options.language.as_str()))
        .settings(
            Settings::builder()
                .show_speaker_labels(true)
                .max_speaker_labels(options.max_speakers.clamp(2, 10))
                .build(),
        )
        .output_bucket_name(bucket.name())
        .output_key(&output_key)
        .send()
        .await
        .map_err(|e| TranscribeError::Api(e.into_service_error().to_string()))?;

    let result = wait_for_job(&transcribe, &job_name, options.deadline).await;
    let output = match result {
        Ok(()) => {
            info!(job_name, "transcription complete, reading result");
            read_output(bucket, &output_key).await
        }
        Err(e) => Err(e),
    };

    cleanup(&transcribe, bucket, &job_name, &output_key).await;
    output
}

async fn wait_for_job(
    transcribe: &aws_sdk_transcribe::Client,
    job_name: &str,
    deadline: Duration,
) -> Result<(), TranscribeError> {
    let started = tokio::time::Instant::now();
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let resp = transcribe
            .get_transcription_job()
            .transcription_job_name(job_name)
            .send()
            .await
            .map_err(|e| TranscribeError::Api(e.into_service_error().to_string()))?;

        let job = resp
            .transcription_job()
            .ok_or_else(|| TranscribeError::Api("no job in response".into()))?;

        match job.transcription_job_status() {
            Some(TranscriptionJobStatus::Completed) => return Ok(()),
            Some(TranscriptionJobStatus::Failed) => {
                let reason = job.failure_reason().unwrap_or("unknown").to_string();
                return Err(TranscribeError::JobFailed(reason));
            }
            _ if started.elapsed() >= deadline => return Err(TranscribeError::Timeout(deadline)),
            _ => continue,
        }
    }
}

async fn read_output(bucket: &Bucket, output_key: &str) -> Result<TranscriptionOutput, TranscribeError> {
    let fetched = bucket.get(output_key).await?;
    let json = String::from_utf8(fetched.body).map_err(|e| TranscribeError::Parse(e.to_string()))?;
    parse_transcript(&json)
}

async fn cleanup(
    transcribe: &aws_sdk_transcribe::Client,
    bucket: &Bucket,
    job_name: &str,
    output_key: &str,
) {
    if let Err(e) = bucket.delete(output_key).await {
        warn!(job_name, error = %e, "failed to delete transcription output");
    }
    if let Err(e) = transcribe
        .delete_transcription_job()
        .transcription_job_name(job_name)
        .send()
        .await
    {
        warn!(job_name, error = %e.into_service_error(), "failed to delete transcription job");
    }
}

/// Map a file extension to an Amazon Transcribe `MediaFormat`.
pub fn media_format_for_extension(ext: &str) -> Option<MediaFormat> {
    match ext.to_lowercase().as_str() {
        "mp3" => Some(MediaFormat::Mp3),
        "mp4" | "m4a" => Some(MediaFormat::Mp4),
        "wav" => Some(MediaFormat::Wav),
        "flac" => Some(MediaFormat::Flac),
        "ogg" | "oga" | "opus" => Some(MediaFormat::Ogg),
        "amr" => Some(MediaFormat::Amr),
        "webm" => Some(MediaFormat::Webm),
        _ => None,
    }
}

/// Media format from an object key or filename.
pub fn media_format_for_key(key: &str) -> Result<MediaFormat, TranscribeError> {
    let ext = key.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    media_format_for_extension(ext).ok_or_else(|| TranscribeError::UnsupportedFormat(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_recordings_are_supported() {
        assert_eq!(media_format_for_extension("WEBM"), Some(MediaFormat::Webm));
        assert_eq!(media_format_for_extension("m4a"), Some(MediaFormat::Mp4));
        assert_eq!(media_format_for_extension("opus"), Some(MediaFormat::Ogg));
        assert_eq!(media_format_for_extension("txt"), None);
    }

    #[test]
    fn format_from_key_uses_last_extension() {
        assert_eq!(
            media_format_for_key("tenants/a/audio/s/sessao.final.mp3").unwrap(),
            MediaFormat::Mp3
        );
        assert!(matches!(
            media_format_for_key("tenants/a/audio/s/noext"),
            Err(TranscribeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn defaults_target_brazilian_portuguese() {
        let options = TranscribeOptions::default();
        assert_eq!(options.language, "pt-BR");
        assert_eq!(options.max_speakers, 2);
    }
}
