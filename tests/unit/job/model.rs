use super::*;
use serde_json::json;

#[test]
fn generated_ids_are_hex_and_distinct() {
    let a = JobId::generate();
    let b = JobId::generate();
    assert_eq!(a.as_str().len(), 16);
    assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
    assert!(JobId::new(a.as_str()).is_ok());
}

#[test]
fn ids_reject_path_characters() {
    assert!(JobId::new("../etc").is_err());
    assert!(JobId::new("").is_err());
    assert!(JobId::new("job_1-a").is_ok());
}

#[test]
fn dialogue_lines_accept_frontend_field_names() {
    let content: JobContent = serde_json::from_value(json!({
        "kind": "dialogue",
        "lines": [
            {"character": "peter", "text": "Hey Brian", "imagePlacement": "left"},
            {"speaker": "brian", "text": "Hi Peter"}
        ]
    }))
    .unwrap();
    let JobContent::Dialogue { lines } = &content else {
        panic!("expected dialogue");
    };
    assert_eq!(lines[0].speaker, "peter");
    assert_eq!(lines[0].placement.as_deref(), Some("left"));
    assert_eq!(lines[1].placement, None);
    assert_eq!(content.kind(), JobKind::Dialogue);
    content.validate().unwrap();
}

#[test]
fn empty_content_fails_validation() {
    let empty = JobContent::Dialogue { lines: vec![] };
    assert!(matches!(empty.validate(), Err(ReelError::Validation(_))));

    let blank_line = JobContent::Dialogue {
        lines: vec![DialogueLine {
            speaker: "peter".into(),
            text: "   ".into(),
            placement: None,
        }],
    };
    assert!(blank_line.validate().is_err());

    let untitled = JobContent::NarratedPost {
        post: NarratedPost::default(),
    };
    assert!(untitled.validate().is_err());
}

#[test]
fn post_body_text_trims_and_treats_blank_as_absent() {
    let mut post = NarratedPost {
        title: "Hi".into(),
        body: Some("  one two  ".into()),
        ..Default::default()
    };
    assert_eq!(post.body_text(), Some("one two"));
    post.body = Some("   ".into());
    assert_eq!(post.body_text(), None);
}

#[test]
fn terminal_states() {
    assert!(JobStatus::Succeeded.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
}
