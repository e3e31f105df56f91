use super::*;
use crate::config::PipelineConfig;
use crate::style::table::StyleTable;
use crate::timeline::dialogue::{DialogueClip, build_dialogue_plan};
use crate::timeline::plan::PlanSettings;

fn dialogue_plan(audio: Option<PathBuf>) -> RenderPlan {
    let style = StyleTable::default().lookup("standard").clone();
    let settings = PlanSettings::from_config(&PipelineConfig::default(), style);
    let clip = |text: &str, art: &str, d: f64| DialogueClip {
        text: text.to_owned(),
        art: PathBuf::from(art),
        placement: Some("bottom-left".to_owned()),
        duration: d,
    };
    build_dialogue_plan(
        &[
            clip("one", "peter.png", 2.0),
            clip("two", "brian.png", 3.5),
            clip("three", "peter.png", 1.0),
        ],
        "bg.mp4".into(),
        audio,
        &settings,
    )
    .unwrap()
}

fn captions(plan: &RenderPlan) -> BTreeMap<usize, PathBuf> {
    plan.segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind == SegmentKind::TextOverlay)
        .map(|(i, _)| (i, PathBuf::from(format!("caption_{i}.png"))))
        .collect()
}

#[test]
fn background_loops_and_covers_canvas() {
    let plan = dialogue_plan(None);
    let g = compile_graph(&plan, &captions(&plan)).unwrap();
    assert_eq!(g.inputs[0].options, vec!["-stream_loop", "-1"]);
    assert_eq!(g.inputs[0].path, PathBuf::from("bg.mp4"));
    assert!(g.filter_complex.starts_with(
        "[0:v]scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920"
    ));
}

#[test]
fn repeated_art_is_one_input() {
    let plan = dialogue_plan(None);
    let g = compile_graph(&plan, &captions(&plan)).unwrap();
    // background + 2 distinct art files + 3 captions
    assert_eq!(g.inputs.len(), 6);
    let peter = g
        .inputs
        .iter()
        .filter(|i| i.path == PathBuf::from("peter.png"))
        .count();
    assert_eq!(peter, 1);
}

#[test]
fn overlays_are_time_gated() {
    let plan = dialogue_plan(None);
    let g = compile_graph(&plan, &captions(&plan)).unwrap();
    assert!(g.filter_complex.contains("enable='between(t,2.000000,5.500000)'"));
    assert!(g.filter_complex.contains("scale=-1:300"));
    assert!(g.filter_complex.contains("overlay=x=0:y=H-h-0"));
    assert!(g.filter_complex.contains("overlay=x=(W-w)/2:y=H*0.8000-h/2"));
    assert!(g.filter_complex.ends_with("[vout]"));
    assert_eq!(g.filter_complex.matches("overlay=").count(), 6);
}

#[test]
fn output_args_fix_duration_rate_and_codecs() {
    let plan = dialogue_plan(Some("narration.wav".into()));
    let g = compile_graph(&plan, &captions(&plan)).unwrap();
    let args = g.output_args.join(" ");
    assert!(args.contains("-map [vout] -map 6:a -c:a aac"));
    assert!(args.contains("-t 6.500000 -r 24/1"));
    assert!(args.contains("-c:v libx264"));
    assert!(args.contains("-pix_fmt yuv420p"));
    assert!(args.contains("+faststart"));

    let silent = dialogue_plan(None);
    let g = compile_graph(&silent, &captions(&silent)).unwrap();
    assert!(g.output_args.contains(&"-an".to_owned()));
}

#[test]
fn unrasterized_text_is_a_render_error() {
    let plan = dialogue_plan(None);
    let err = compile_graph(&plan, &BTreeMap::new()).unwrap_err();
    assert!(err.to_string().starts_with("render error:"));
}

#[test]
fn args_put_input_options_before_inputs() {
    let plan = dialogue_plan(None);
    let g = compile_graph(&plan, &captions(&plan)).unwrap();
    let args: Vec<String> = g
        .to_args(Path::new("out.mp4"))
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(&args[..5], ["-y", "-stream_loop", "-1", "-i", "bg.mp4"]);
    assert_eq!(args.last().unwrap(), "out.mp4");
}
