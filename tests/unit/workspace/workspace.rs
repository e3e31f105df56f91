use super::*;

fn manager() -> (tempfile::TempDir, WorkspaceManager) {
    let root = tempfile::tempdir().unwrap();
    let mgr = WorkspaceManager::new(root.path().join("jobs"));
    (root, mgr)
}

#[test]
fn close_removes_everything() {
    let (_root, mgr) = manager();
    let mut ws = mgr.open(&JobId::generate()).unwrap();
    let dir = ws.path().to_path_buf();
    ws.write("a.mp3", b"abc").unwrap();
    std::fs::create_dir_all(dir.join("nested")).unwrap();
    std::fs::write(dir.join("nested").join("b.png"), b"x").unwrap();

    ws.close().unwrap();
    assert!(!dir.exists());
}

#[test]
fn drop_removes_directory_on_early_exit() {
    let (_root, mgr) = manager();
    let dir = {
        let mut ws = mgr.open(&JobId::generate()).unwrap();
        ws.write("x.wav", b"data").unwrap();
        ws.path().to_path_buf()
    };
    assert!(!dir.exists());
}

#[test]
fn drop_removes_directory_on_panic() {
    let (_root, mgr) = manager();
    let dir = std::sync::Mutex::new(PathBuf::new());
    let result = std::panic::catch_unwind(|| {
        let mut ws = mgr.open(&JobId::generate()).unwrap();
        *dir.lock().unwrap() = ws.path().to_path_buf();
        ws.write("x.wav", b"data").unwrap();
        panic!("boom");
    });
    assert!(result.is_err());
    assert!(!dir.lock().unwrap().exists());
}

#[test]
fn same_job_id_gets_distinct_directories() {
    let (_root, mgr) = manager();
    let id = JobId::generate();
    let a = mgr.open(&id).unwrap();
    let b = mgr.open(&id).unwrap();
    assert_ne!(a.path(), b.path());
    assert!(a.path().starts_with(mgr.root()));
}

#[test]
fn alloc_deduplicates_and_rejects_paths() {
    let (_root, mgr) = manager();
    let mut ws = mgr.open(&JobId::generate()).unwrap();
    let a = ws.alloc("speech.mp3").unwrap();
    let b = ws.alloc("speech.mp3").unwrap();
    assert_ne!(a, b);
    assert!(b.ends_with("speech_1.mp3"));
    assert_eq!(ws.files().len(), 2);
    assert!(ws.alloc("../escape.txt").is_err());
    assert!(ws.alloc("").is_err());
}
