use super::*;
use crate::style::table::StyleTable;

fn settings() -> PlanSettings {
    let style = StyleTable::default().lookup("standard").clone();
    PlanSettings::from_config(&PipelineConfig::default(), style)
}

fn plan_with(segments: Vec<RenderSegment>, total: f64) -> RenderPlan {
    RenderPlan {
        canvas: Canvas::default(),
        fps: Fps::default(),
        total_duration: total,
        segments,
        audio: None,
    }
}

fn caption(start: f64, duration: f64) -> RenderSegment {
    settings().caption_segment(
        "x".to_owned(),
        TimeSpan::new(start, duration).unwrap(),
        0.9,
        0.5,
    )
}

#[test]
fn anchors_parse_in_either_order() {
    assert_eq!(parse_anchor("center"), Some((HAlign::Center, VAlign::Center)));
    assert_eq!(parse_anchor("left"), Some((HAlign::Left, VAlign::Center)));
    assert_eq!(parse_anchor("top-right"), Some((HAlign::Right, VAlign::Top)));
    assert_eq!(parse_anchor("right_top"), Some((HAlign::Right, VAlign::Top)));
    assert_eq!(parse_anchor("Bottom Center"), Some((HAlign::Center, VAlign::Bottom)));
    assert_eq!(parse_anchor("left-right"), None);
    assert_eq!(parse_anchor("upstage"), None);
    assert_eq!(parse_anchor(""), None);
}

#[test]
fn zero_duration_is_rejected() {
    let s = settings();
    let plan = plan_with(vec![s.background_segment("bg.mp4".into(), 0.0).unwrap()], 0.0);
    let err = plan.validate().unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn background_must_cover_everything() {
    let s = settings();
    assert!(plan_with(vec![caption(0.0, 1.0)], 1.0).validate().is_err());

    let short_bg = s.background_segment("bg.mp4".into(), 0.5).unwrap();
    assert!(plan_with(vec![short_bg], 1.0).validate().is_err());

    let bg = s.background_segment("bg.mp4".into(), 1.0).unwrap();
    assert!(plan_with(vec![bg.clone(), bg], 1.0).validate().is_err());
}

#[test]
fn same_slot_overlap_is_rejected_but_touching_is_fine() {
    let s = settings();
    let bg = || s.background_segment("bg.mp4".into(), 2.0).unwrap();

    let touching = plan_with(vec![bg(), caption(0.0, 1.0), caption(1.0, 1.0)], 2.0);
    touching.validate().unwrap();

    let overlapping = plan_with(vec![bg(), caption(0.0, 1.2), caption(1.0, 1.0)], 2.0);
    assert!(overlapping.validate().is_err());
}

#[test]
fn segment_past_the_end_is_rejected() {
    let s = settings();
    let plan = plan_with(
        vec![s.background_segment("bg.mp4".into(), 2.0).unwrap(), caption(1.5, 1.0)],
        2.0,
    );
    assert!(plan.validate().is_err());
}

#[test]
fn plan_serializes_to_json() {
    let s = settings();
    let plan = plan_with(
        vec![s.background_segment("bg.mp4".into(), 2.0).unwrap(), caption(0.0, 2.0)],
        2.0,
    );
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["segments"][0]["kind"], "background");
    assert_eq!(json["segments"][1]["placement"]["type"], "caption_box");
    assert_eq!(json["segments"][1]["asset"]["text"], "x");
}
