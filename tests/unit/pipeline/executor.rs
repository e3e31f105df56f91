use std::path::Path;

use super::*;
use crate::capability::SpeechAudio;

struct Unreachable;

impl SpeechSynthesizer for Unreachable {
    fn synthesize(&self, _text: &str, _voice_id: &str) -> ReelResult<SpeechAudio> {
        panic!("synthesizer must not be called")
    }
}

impl RemoteFetcher for Unreachable {
    fn fetch_to(&self, _url: &str, _dest: &Path) -> ReelResult<u64> {
        panic!("fetcher must not be called")
    }
}

impl ObjectStore for Unreachable {
    fn upload(&self, _path: &Path, _mime_hint: &str) -> ReelResult<String> {
        panic!("store must not be called")
    }
}

fn pipeline(root: &Path) -> Pipeline {
    let cfg = PipelineConfig {
        workspace_root: Some(root.to_path_buf()),
        ..PipelineConfig::default()
    };
    Pipeline::builder(cfg)
        .synthesizer(Arc::new(Unreachable))
        .fetcher(Arc::new(Unreachable))
        .store(Arc::new(Unreachable))
        .build()
        .unwrap()
}

fn workspace_entries(root: &Path) -> usize {
    std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
}

#[test]
fn builder_requires_capabilities() {
    let err = Pipeline::builder(PipelineConfig::default())
        .fetcher(Arc::new(Unreachable))
        .store(Arc::new(Unreachable))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("speech synthesizer"));
}

#[test]
fn unknown_speaker_is_rejected_before_any_work() {
    let root = tempfile::tempdir().unwrap();
    let p = pipeline(root.path());
    let content = JobContent::Dialogue {
        lines: vec![DialogueLine {
            speaker: "stewie".to_owned(),
            text: "hello".to_owned(),
            placement: None,
        }],
    };
    let err = p
        .execute(&JobId::generate(), &content, &JobOptions::default())
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert_eq!(workspace_entries(root.path()), 0);
}

#[test]
fn unknown_narration_voice_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let p = pipeline(root.path());
    let content = JobContent::NarratedPost {
        post: NarratedPost {
            title: "Hi".to_owned(),
            ..Default::default()
        },
    };
    let options = JobOptions {
        voice: Some("nobody".to_owned()),
        ..Default::default()
    };
    let err = p.execute(&JobId::generate(), &content, &options).unwrap_err();
    assert!(err.to_string().contains("unknown voice 'nobody'"));
    assert_eq!(workspace_entries(root.path()), 0);
}

#[test]
fn job_style_scales_a_copy() {
    let root = tempfile::tempdir().unwrap();
    let p = pipeline(root.path());
    let base = p.styles().lookup("standard").clone();
    let options = JobOptions {
        subtitle_style: Some("no-such-style".to_owned()),
        subtitle_size_multiplier: Some(2.0),
        ..Default::default()
    };
    let style = p.job_style(&options).unwrap();
    assert_eq!(style.size, base.size * 2.0);
    assert_eq!(p.styles().lookup("standard"), &base);
}
