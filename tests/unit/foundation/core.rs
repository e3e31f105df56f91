use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(24, 0).is_err());
    let fps = Fps::new(30_000, 1001).unwrap();
    assert_eq!(fps.to_ffmpeg_arg(), "30000/1001");
    assert!((fps.as_f64() - 29.97).abs() < 0.01);
}

#[test]
fn canvas_requires_even_dimensions() {
    assert!(Canvas::default().validate().is_ok());
    assert!(
        Canvas {
            width: 1081,
            height: 1920
        }
        .validate()
        .is_err()
    );
    assert!(
        Canvas {
            width: 0,
            height: 2
        }
        .validate()
        .is_err()
    );
}

#[test]
fn span_bounds_and_overlap() {
    let a = TimeSpan::new(0.0, 2.0).unwrap();
    let b = TimeSpan::new(2.0, 3.5).unwrap();
    assert_eq!(b.end(), 5.5);
    assert!(!a.overlaps(b));
    assert!(a.overlaps(TimeSpan::new(1.0, 2.0).unwrap()));
    assert!(b.within(5.5));
    assert!(!b.within(5.0));
}

#[test]
fn span_rejects_negative_or_nan() {
    assert!(TimeSpan::new(-0.5, 1.0).is_err());
    assert!(TimeSpan::new(0.0, f64::NAN).is_err());
    assert!(TimeSpan::from_bounds(2.0, 1.0).is_err());
}
