use psique_transcribe::parse_transcript;

const DIARIZED: &str = r#"{
  "jobName": "psique-test",
  "status": "COMPLETED",
  "results": {
    "transcripts": [{"transcript": "Como você está? Mais ou menos. Dormi mal a semana toda."}],
    "speaker_labels": {"channel_label": "ch_0", "speakers": 2, "segments": []},
    "items": [],
    "audio_segments": [
      {"id": 0, "transcript": "Como você está?", "start_time": "0.04", "end_time": "1.2", "speaker_label": "spk_0", "items": [0, 1, 2]},
      {"id": 1, "transcript": "Mais ou menos.", "start_time": "1.9", "end_time": "2.8", "speaker_label": "spk_1", "items": [3, 4, 5]},
      {"id": 2, "transcript": "Dormi mal a semana toda.", "start_time": "3.1", "end_time": "5.0", "speaker_label": "spk_1", "items": [6, 7, 8, 9, 10]},
      {"id": 3, "transcript": " ", "start_time": "5.0", "end_time": "5.1", "speaker_label": "spk_0", "items": []}
    ]
  }
}"#;

#[test]
fn audio_segments_become_speaker_turns() {
    let out = parse_transcript(DIARIZED).unwrap();
    assert_eq!(out.segments.len(), 2);

    assert_eq!(out.segments[0].speaker, "spk_0");
    assert_eq!(out.segments[0].text, "Como você está?");
    assert!((out.segments[0].start_seconds - 0.04).abs() < 1e-9);

    assert_eq!(out.segments[1].speaker, "spk_1");
    assert_eq!(out.segments[1].text, "Mais ou menos. Dormi mal a semana toda.");
    assert!((out.segments[1].start_seconds - 1.9).abs() < 1e-9);
    assert!((out.segments[1].end_seconds - 5.0).abs() < 1e-9);

    assert!(out.text.starts_with("Como você está?"));
}

#[test]
fn empty_job_yields_empty_text() {
    let out = parse_transcript(r#"{"results": {"transcripts": []}}"#).unwrap();
    assert!(out.text.is_empty());
    assert!(out.segments.is_empty());
}
