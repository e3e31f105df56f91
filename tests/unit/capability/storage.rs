use super::*;

#[test]
fn signature_sorts_params_and_appends_secret() {
    let a = sign_params(
        &[("timestamp", "1700000000".to_owned()), ("folder", "reels".to_owned())],
        "s3cr3t",
    );
    let b = sign_params(
        &[("folder", "reels".to_owned()), ("timestamp", "1700000000".to_owned())],
        "s3cr3t",
    );
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);

    let mut hasher = Sha256::new();
    hasher.update(b"folder=reels&timestamp=1700000000s3cr3t");
    assert_eq!(a, hex::encode(hasher.finalize()));
}

#[test]
fn resource_type_follows_mime_family() {
    assert_eq!(resource_type("video/mp4"), "video");
    assert_eq!(resource_type("audio/wav"), "video");
    assert_eq!(resource_type("image/png"), "image");
    assert_eq!(resource_type("application/json"), "raw");
}
