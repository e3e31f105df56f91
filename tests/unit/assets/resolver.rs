use std::path::Path;
use std::sync::Mutex;

use super::*;
use crate::capability::SpeechAudio;
use crate::job::model::JobId;
use crate::workspace::WorkspaceManager;

struct EchoSynth;

impl SpeechSynthesizer for EchoSynth {
    fn synthesize(&self, text: &str, voice_id: &str) -> ReelResult<SpeechAudio> {
        Ok(SpeechAudio {
            bytes: format!("{voice_id}:{text}").into_bytes(),
            extension: "mp3".to_owned(),
        })
    }
}

#[derive(Default)]
struct RecordingFetcher {
    urls: Mutex<Vec<String>>,
    fail: bool,
}

impl RemoteFetcher for RecordingFetcher {
    fn fetch_to(&self, url: &str, dest: &Path) -> ReelResult<u64> {
        self.urls.lock().unwrap().push(url.to_owned());
        if self.fail {
            return Err(ReelError::fetch("HTTP 404"));
        }
        std::fs::write(dest, b"payload").unwrap();
        Ok(7)
    }
}

fn resolver(fetcher: Arc<RecordingFetcher>) -> AssetResolver {
    AssetResolver::new(
        Arc::new(PipelineConfig::default()),
        Arc::new(EchoSynth),
        fetcher,
        Arc::new(TextRasterizer::new(None)),
    )
}

#[test]
fn speech_lands_in_workspace_with_resolved_voice() {
    let root = tempfile::tempdir().unwrap();
    let mut ws = WorkspaceManager::new(root.path())
        .open(&JobId::generate())
        .unwrap();
    let r = resolver(Arc::default());

    let p = r.synthesize_speech(&mut ws, "hello", "peter").unwrap();
    assert!(p.starts_with(ws.path()));
    assert_eq!(p.extension().unwrap(), "mp3");
    assert_eq!(std::fs::read(&p).unwrap(), b"BrXwCQ7xdzi6T5h2idQP:hello");

    let err = r.synthesize_speech(&mut ws, "hello", "nobody").unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn unknown_background_uses_default_url() {
    let root = tempfile::tempdir().unwrap();
    let mut ws = WorkspaceManager::new(root.path())
        .open(&JobId::generate())
        .unwrap();
    let fetcher = Arc::new(RecordingFetcher::default());
    let r = resolver(fetcher.clone());

    let p = r.resolve_background(&mut ws, Some("does-not-exist")).unwrap();
    assert_eq!(p.extension().unwrap(), "mp4");
    let cfg = PipelineConfig::default();
    assert_eq!(
        fetcher.urls.lock().unwrap().as_slice(),
        [cfg.backgrounds[&cfg.default_background].clone()]
    );
}

#[test]
fn fetch_failure_surfaces_as_fetch_error() {
    let root = tempfile::tempdir().unwrap();
    let mut ws = WorkspaceManager::new(root.path())
        .open(&JobId::generate())
        .unwrap();
    let r = resolver(Arc::new(RecordingFetcher {
        fail: true,
        ..Default::default()
    }));
    let err = r.fetch_remote(&mut ws, "https://x.test/a.mp4").unwrap_err();
    assert!(err.to_string().starts_with("fetch error:"));
}

#[test]
fn data_url_card_is_written_verbatim() {
    let root = tempfile::tempdir().unwrap();
    let mut ws = WorkspaceManager::new(root.path())
        .open(&JobId::generate())
        .unwrap();
    let r = resolver(Arc::default());
    let post = NarratedPost {
        title: "t".to_owned(),
        card_image: Some("data:image/png;base64,aGVsbG8=".to_owned()),
        ..Default::default()
    };
    let p = r.render_post_card(&mut ws, &post).unwrap();
    assert_eq!(p.extension().unwrap(), "png");
    assert_eq!(std::fs::read(&p).unwrap(), b"hello");
}

#[test]
fn unfetchable_avatar_still_draws_card() {
    let root = tempfile::tempdir().unwrap();
    let mut ws = WorkspaceManager::new(root.path())
        .open(&JobId::generate())
        .unwrap();
    let r = resolver(Arc::new(RecordingFetcher {
        fail: true,
        ..Default::default()
    }));
    let post = NarratedPost {
        title: "A story".to_owned(),
        avatar_url: Some("https://x.test/me.png".to_owned()),
        ..Default::default()
    };
    let p = r.render_post_card(&mut ws, &post).unwrap();
    assert!(image::open(&p).is_ok());
}

#[test]
fn data_url_parsing_rejects_bad_input() {
    assert!(decode_data_url("https://x/y.png").is_err());
    assert!(decode_data_url("data:image/png,plain").is_err());
    assert!(decode_data_url("data:text/html;base64,aGk=").is_err());
    assert!(decode_data_url("data:image/jpeg;base64,@@@").is_err());
    let (ext, bytes) = decode_data_url("data:image/jpeg;base64,aGk=").unwrap();
    assert_eq!((ext, bytes.as_slice()), ("jpg", b"hi".as_slice()));
}

#[test]
fn url_extension_ignores_query_and_junk() {
    assert_eq!(url_extension("https://a/b/c.mp4?x=1"), Some("mp4"));
    assert_eq!(url_extension("https://a/b/c"), None);
    assert_eq!(url_extension("https://a/b/c.m$4"), None);
}
