use super::*;
use serde_json::json;

#[test]
fn defaults_are_valid() {
    let cfg = PipelineConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.canvas.width, 1080);
    assert_eq!(cfg.fps.num, 24);
    assert_eq!(cfg.voice_id("peter").unwrap(), "BrXwCQ7xdzi6T5h2idQP");
}

#[test]
fn partial_json_keeps_other_defaults() {
    let cfg: PipelineConfig = serde_json::from_value(json!({
        "fps": {"num": 30, "den": 1},
        "chunk_max_chars": 25,
        "outline_mode": "shadow"
    }))
    .unwrap();
    assert_eq!(cfg.fps.num, 30);
    assert_eq!(cfg.chunk_max_chars, 25);
    assert_eq!(cfg.outline_mode, OutlineMode::Shadow);
    assert_eq!(cfg.default_background, "minecraft_parkour1");
    assert_eq!(cfg.caption.art_height, 300);
}

#[test]
fn unknown_background_uses_default() {
    let cfg = PipelineConfig::default();
    let fallback = cfg.background_url(None).unwrap().to_owned();
    assert_eq!(cfg.background_url(Some("nope")).unwrap(), fallback);
    assert_ne!(cfg.background_url(Some("subway_surfers1")).unwrap(), fallback);
}

#[test]
fn unknown_voice_is_a_validation_error() {
    let cfg = PipelineConfig::default();
    assert!(matches!(
        cfg.voice_id("stewie"),
        Err(ReelError::Validation(_))
    ));
}

#[test]
fn job_options_use_camel_case_and_validate() {
    let opts: JobOptions = serde_json::from_value(json!({
        "subtitleStyle": "fire",
        "backgroundVideo": "subway_surfers2",
        "wordGroupSize": 2,
        "subtitleSizeMultiplier": 1.25
    }))
    .unwrap();
    assert_eq!(opts.style_name(), "fire");
    assert_eq!(opts.word_group_size, Some(2));
    opts.validate().unwrap();

    let bad = JobOptions {
        word_group_size: Some(0),
        ..Default::default()
    };
    assert!(bad.validate().is_err());

    let bad = JobOptions {
        subtitle_size_multiplier: Some(-1.0),
        ..Default::default()
    };
    assert!(bad.validate().is_err());
    assert_eq!(JobOptions::default().style_name(), "standard");
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = PipelineConfig {
        default_background: "missing".to_owned(),
        ..Default::default()
    };
    assert!(cfg.validate().is_err());

    let mut cfg = PipelineConfig::default();
    cfg.caption.dialogue_width = 1.5;
    assert!(cfg.validate().is_err());
}
