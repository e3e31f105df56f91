use super::*;
use crate::config::PipelineConfig;
use crate::style::table::StyleTable;
use crate::timeline::chunk::chunk_text;

fn settings() -> PlanSettings {
    let style = StyleTable::default().lookup("standard").clone();
    PlanSettings::from_config(&PipelineConfig::default(), style)
}

fn words(spec: &[(&str, f64, f64)]) -> Vec<WordTiming> {
    spec.iter()
        .map(|(w, s, e)| WordTiming::new(*w, *s, *e))
        .collect()
}

#[test]
fn sync_prefers_alignment_when_possible() {
    assert_eq!(NarrationSync::select(true, Some("body")), NarrationSync::WordAligned);
    assert_eq!(NarrationSync::select(true, Some("  ")), NarrationSync::Proportional);
    assert_eq!(NarrationSync::select(true, None), NarrationSync::Proportional);
    assert_eq!(NarrationSync::select(false, Some("body")), NarrationSync::Proportional);
}

#[test]
fn proportional_split_covers_body_exactly() {
    let chunks = chunk_text(
        "It started on a Tuesday when my upstairs neighbor decided that three in the morning was the perfect time to learn the drums",
        40,
    );
    let body = 7.3;
    let cues = proportional_cues(&chunks, body).unwrap();
    assert_eq!(cues.len(), chunks.len());
    assert_eq!(cues[0].span.start, 0.0);
    assert_eq!(cues.last().unwrap().span.end(), body);
    for pair in cues.windows(2) {
        assert!((pair[0].span.end() - pair[1].span.start).abs() < 1e-9);
    }
    let sum: f64 = cues.iter().map(|c| c.span.duration).sum();
    assert!((sum - body).abs() < 1e-9);
}

#[test]
fn proportional_weights_follow_character_counts() {
    let chunks = vec!["aaaa".to_owned(), "bb".to_owned(), "cc".to_owned()];
    let cues = proportional_cues(&chunks, 8.0).unwrap();
    assert!((cues[0].span.duration - 4.0).abs() < 1e-12);
    assert!((cues[1].span.duration - 2.0).abs() < 1e-12);
    assert!((cues[2].span.duration - 2.0).abs() < 1e-12);
}

#[test]
fn proportional_empty_chunk_list_still_yields_one_cue() {
    let cues = proportional_cues(&[], 3.0).unwrap();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].span.duration, 3.0);
}

#[test]
fn aligned_scenario_groups_body_words() {
    let w = words(&[
        ("Hi", 0.0, 0.4),
        ("one", 0.4, 0.7),
        ("two", 0.7, 1.0),
        ("three", 1.0, 1.3),
        ("four", 1.3, 1.6),
    ]);
    let aligned = aligned_cues("Hi", "one two three four", &w, 2).unwrap();
    assert_eq!(aligned.title_duration, 0.4);
    assert_eq!(aligned.cues.len(), 2);
    assert_eq!(aligned.cues[0].text, "one two");
    assert_eq!(aligned.cues[1].text, "three four");
    assert!(aligned.cues[0].span.start.abs() < 1e-9);
    assert!((aligned.cues[0].span.end() - 0.6).abs() < 1e-9);
    assert!((aligned.cues[1].span.start - 0.6).abs() < 1e-9);
    assert!((aligned.cues[1].span.end() - 1.2).abs() < 1e-9);
}

#[test]
fn aligned_offsets_are_clamped_and_monotonic() {
    // Recognizer jitter: body words that start before the title ends, and out-of-order starts.
    let w = words(&[
        ("Big", 0.0, 0.3),
        ("news", 0.3, 0.9),
        ("so", 0.8, 1.0),
        ("today", 1.0, 1.4),
        ("I", 1.2, 1.3),
        ("quit", 1.3, 1.8),
        ("my", 1.9, 2.0),
    ]);
    let aligned = aligned_cues("Big news", "so today I quit my", &w, 2).unwrap();
    assert_eq!(aligned.cues.len(), 3);
    let mut prev = 0.0;
    for cue in &aligned.cues {
        assert!(cue.span.start >= 0.0);
        assert!(cue.span.start >= prev);
        assert!(cue.span.end() >= cue.span.start);
        prev = cue.span.end();
    }
    assert_eq!(aligned.cues[2].text, "my");
}

#[test]
fn aligned_uses_source_spelling() {
    let w = words(&[("hi", 0.0, 0.2), ("its", 0.2, 0.5), ("ok", 0.5, 0.7)]);
    let aligned = aligned_cues("Hi", "it's OK", &w, 3).unwrap();
    assert_eq!(aligned.cues[0].text, "it's OK");
}

#[test]
fn aligned_punctuation_tokens_are_not_timed() {
    let w = words(&[("Hi", 0.0, 0.4), ("one", 0.4, 0.7), ("two", 0.9, 1.2)]);
    let aligned = aligned_cues("Hi", "one - two", &w, 2).unwrap();
    assert_eq!(aligned.cues.len(), 1);
    assert_eq!(aligned.cues[0].text, "one - two");
    assert!((aligned.cues[0].span.end() - 0.8).abs() < 1e-9);

    let w = words(&[("Wait", 0.0, 0.3), ("what", 0.3, 0.6), ("no", 0.6, 0.9)]);
    let aligned = aligned_cues("Wait ...", "what -- no", &w, 1).unwrap();
    assert!((aligned.title_duration - 0.3).abs() < 1e-9);
    assert_eq!(aligned.cues[0].text, "what --");
    assert_eq!(aligned.cues[1].text, "no");
}

#[test]
fn aligned_word_count_mismatch_fails_closed() {
    let fewer = words(&[("Hi", 0.0, 0.4), ("one", 0.4, 0.7)]);
    let err = aligned_cues("Hi", "one two", &fewer, 2).unwrap_err();
    assert!(matches!(err, ReelError::Alignment(_)));

    let more = words(&[("Hi", 0.0, 0.4), ("one", 0.4, 0.7), ("uh", 0.7, 0.8)]);
    assert!(matches!(
        aligned_cues("Hi", "one", &more, 2).unwrap_err(),
        ReelError::Alignment(_)
    ));
}

#[test]
fn narration_plan_splits_title_and_body() {
    let cues = proportional_cues(&chunk_text("one two three", 40), 3.0).unwrap();
    let plan = build_narration_plan(
        NarrationLayout {
            card: "card.png".into(),
            background: "bg.mp4".into(),
            audio: Some("narration.wav".into()),
            total_duration: 5.0,
            title_duration: 2.0,
            cues,
        },
        &settings(),
    )
    .unwrap();

    let card = plan.in_slot(OverlaySlot::Card).next().unwrap();
    assert_eq!((card.span.start, card.span.end()), (0.0, 2.0));
    let subs: Vec<_> = plan.in_slot(OverlaySlot::Caption).collect();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].span.start, 2.0);
    assert_eq!(subs[0].span.end(), 5.0);
    assert_eq!(plan.background().unwrap().span.duration, 5.0);
}

#[test]
fn empty_body_yields_card_only_plan() {
    let plan = build_narration_plan(
        NarrationLayout {
            card: "card.png".into(),
            background: "bg.mp4".into(),
            audio: None,
            total_duration: 1.5,
            title_duration: 1.5,
            cues: Vec::new(),
        },
        &settings(),
    )
    .unwrap();
    assert_eq!(plan.in_slot(OverlaySlot::Card).count(), 1);
    assert_eq!(plan.in_slot(OverlaySlot::Caption).count(), 0);
    assert!(
        plan.segments
            .iter()
            .all(|s| s.kind != SegmentKind::TextOverlay)
    );
}

#[test]
fn cues_past_the_audio_are_clamped() {
    let cues = vec![Cue {
        text: "late".to_owned(),
        span: TimeSpan::new(0.5, 2.0).unwrap(),
    }];
    let plan = build_narration_plan(
        NarrationLayout {
            card: "card.png".into(),
            background: "bg.mp4".into(),
            audio: None,
            total_duration: 2.0,
            title_duration: 1.0,
            cues,
        },
        &settings(),
    )
    .unwrap();
    let sub = plan.in_slot(OverlaySlot::Caption).next().unwrap();
    assert_eq!(sub.span.start, 1.5);
    assert_eq!(sub.span.end(), 2.0);
}

#[test]
fn zero_length_narration_is_rejected() {
    let err = build_narration_plan(
        NarrationLayout {
            card: "card.png".into(),
            background: "bg.mp4".into(),
            audio: None,
            total_duration: 0.0,
            title_duration: 0.0,
            cues: Vec::new(),
        },
        &settings(),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}
