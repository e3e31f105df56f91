use super::*;

fn constant(sample_rate: u32, channels: u16, secs: f64, value: f32) -> AudioPcm {
    let frames = (secs * f64::from(sample_rate)).round() as usize;
    AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: vec![value; frames * usize::from(channels)],
    }
}

#[test]
fn clips_start_at_cumulative_durations() {
    let a = constant(24_000, 1, 2.0, 0.25);
    let b = constant(48_000, 2, 3.5, -0.5);
    let track = concat_tracks(&[a, b]);

    assert_eq!(track.clip_starts, vec![0.0, 2.0]);
    assert!((track.duration_secs - 5.5).abs() < 1e-12);
    assert_eq!(track.frames(), 5 * 48_000 + 24_000);

    let at = |secs: f64| track.samples[(secs * 48_000.0) as usize * 2];
    assert!((at(1.0) - 0.25).abs() < 1e-6);
    assert!((at(2.5) + 0.5).abs() < 1e-6);
}

#[test]
fn mono_is_duplicated_to_both_channels() {
    let track = concat_tracks(&[constant(48_000, 1, 0.1, 0.3)]);
    assert_eq!(track.samples[100], track.samples[101]);
}

#[test]
fn empty_input_is_empty_track() {
    let track = concat_tracks(&[]);
    assert!(track.samples.is_empty());
    assert_eq!(track.duration_secs, 0.0);
}

#[test]
fn peak_normalization_hits_target() {
    let mut s = vec![0.1, -0.4, 0.2];
    normalize_peak(&mut s, 1.0);
    assert!((s[1] + 1.0).abs() < 1e-6);
    assert!((s[0] - 0.25).abs() < 1e-6);

    let mut silent = vec![0.0; 4];
    normalize_peak(&mut silent, 1.0);
    assert!(silent.iter().all(|v| *v == 0.0));
}

#[test]
fn wav_round_trip_preserves_duration() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("n.wav");
    let track = concat_tracks(&[constant(16_000, 1, 1.25, 0.5)]);
    write_wav(&track, &p).unwrap();

    let pcm = crate::assets::media::decode_audio(&p).unwrap();
    assert_eq!(pcm.sample_rate, MIX_SAMPLE_RATE);
    assert!((pcm.duration_secs() - 1.25).abs() < 1e-9);
}
