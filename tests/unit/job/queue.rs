use std::time::{Duration, Instant};

use super::*;
use crate::job::model::{DialogueLine, JobStatus, NarratedPost};

struct ScriptedRunner;

impl JobRunner for ScriptedRunner {
    fn run(&self, _id: &JobId, content: &JobContent, _options: &JobOptions) -> ReelResult<JobOutput> {
        match content {
            JobContent::NarratedPost { post } if post.title == "panic" => panic!("boom"),
            JobContent::NarratedPost { post } if post.title == "fail" => {
                Err(ReelError::publish("HTTP 500"))
            }
            JobContent::NarratedPost { post } => Ok(JobOutput {
                video_url: format!("https://cdn.test/{}.mp4", post.title),
            }),
            JobContent::Dialogue { .. } => Ok(JobOutput {
                video_url: "https://cdn.test/dialogue.mp4".to_owned(),
            }),
        }
    }
}

fn post(title: &str) -> JobContent {
    JobContent::NarratedPost {
        post: NarratedPost {
            title: title.to_owned(),
            ..Default::default()
        },
    }
}

fn wait_terminal(store: &JobStore, id: &JobId) -> crate::job::model::JobRecord {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let rec = store.get(id).unwrap();
        if rec.status.is_terminal() || Instant::now() > deadline {
            return rec;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn jobs_reach_terminal_states() {
    let store = Arc::new(JobStore::new());
    let pool = WorkerPool::start(3, Arc::new(ScriptedRunner), store.clone()).unwrap();

    let ok = pool.submit(post("ok"), JobOptions::default()).unwrap();
    let failed = pool.submit(post("fail"), JobOptions::default()).unwrap();
    let panicked = pool.submit(post("panic"), JobOptions::default()).unwrap();
    let dialogue = pool
        .submit(
            JobContent::Dialogue {
                lines: vec![DialogueLine {
                    speaker: "peter".to_owned(),
                    text: "hi".to_owned(),
                    placement: None,
                }],
            },
            JobOptions::default(),
        )
        .unwrap();

    let rec = wait_terminal(&store, &ok);
    assert_eq!(rec.status, JobStatus::Succeeded);
    assert_eq!(rec.result_url.as_deref(), Some("https://cdn.test/ok.mp4"));

    let rec = wait_terminal(&store, &failed);
    assert_eq!(rec.status, JobStatus::Failed);
    assert!(rec.error.unwrap().starts_with("publish error:"));

    let rec = wait_terminal(&store, &panicked);
    assert_eq!(rec.status, JobStatus::Failed);
    assert!(rec.error.unwrap().contains("boom"));

    assert_eq!(wait_terminal(&store, &dialogue).status, JobStatus::Succeeded);
    pool.shutdown();
}

#[test]
fn invalid_content_is_rejected_at_submit() {
    let store = Arc::new(JobStore::new());
    let pool = WorkerPool::start(1, Arc::new(ScriptedRunner), store.clone()).unwrap();
    let err = pool
        .submit(JobContent::Dialogue { lines: vec![] }, JobOptions::default())
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert_eq!(store.active_count(), 0);
}

#[test]
fn shutdown_drains_queued_jobs() {
    let store = Arc::new(JobStore::new());
    let pool = WorkerPool::start(1, Arc::new(ScriptedRunner), store.clone()).unwrap();
    let ids: Vec<_> = (0..5)
        .map(|i| pool.submit(post(&format!("j{i}")), JobOptions::default()).unwrap())
        .collect();
    pool.shutdown();
    for id in ids {
        assert_eq!(store.get(&id).unwrap().status, JobStatus::Succeeded);
    }
}
