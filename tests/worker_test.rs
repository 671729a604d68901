//! Worker pipeline integration tests
//!
//! Exercises the full submit → worker → terminal-status flow against the
//! library fixture site, with chapter pages served by a local HTTP server
//! and artifacts kept in memory.

use async_trait::async_trait;
use axum::{Router, routing::get};
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::{Duration, sleep, timeout};

use comicbox::observability::Metrics;
use comicbox::sites::{Library, SiteRegistry};
use comicbox::storage::ArtifactStore;
use comicbox::tasks::{
    ChapterSelector, DeliveryError, HttpConfig, Mailer, PageDownloader, PdfRenderer, Task,
    TaskBroker, TaskSpec, TaskStatus, TaskStore, WorkerContext, spawn_workers,
};

const PNG_STUB: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Serve fixture pages on an ephemeral local port.
async fn start_page_server() -> String {
    let app = Router::new().route(
        "/pages/{comicid}/{chapter}/{page}",
        get(|| async { PNG_STUB }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

struct MockPdf;

#[async_trait]
impl PdfRenderer for MockPdf {
    async fn render(&self, _title: &str, pages: &[Bytes]) -> Result<Bytes, DeliveryError> {
        Ok(Bytes::from(format!("%PDF-1.4 {} pages", pages.len())))
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(Vec<String>, String, bool)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        receivers: &[String],
        subject: &str,
        attachment: Option<Bytes>,
    ) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((
            receivers.to_vec(),
            subject.to_string(),
            attachment.is_some(),
        ));
        Ok(())
    }
}

struct Harness {
    store: Arc<TaskStore>,
    broker: Arc<TaskBroker>,
    artifacts: Arc<ArtifactStore>,
    mailer: Arc<RecordingMailer>,
    _temp: TempDir,
}

async fn build_harness(with_delivery: bool) -> Harness {
    let base_url = start_page_server().await;

    let temp = TempDir::new().unwrap();
    let store = Arc::new(TaskStore::open(temp.path().join("tasks")).unwrap());

    let mut sites = SiteRegistry::new();
    sites.register(Arc::new(Library::with_base_url(&base_url)));

    let (broker, receivers) = TaskBroker::new(store.clone(), 2, 10);
    let artifacts = Arc::new(ArtifactStore::in_memory());
    let mailer = Arc::new(RecordingMailer::default());

    let downloader = PageDownloader::new(HttpConfig {
        max_retries: 1,
        ..HttpConfig::default()
    })
    .unwrap();

    let ctx = WorkerContext {
        store: store.clone(),
        sites: Arc::new(sites),
        artifacts: artifacts.clone(),
        downloader: Arc::new(downloader),
        pdf: with_delivery.then(|| Arc::new(MockPdf) as Arc<dyn PdfRenderer>),
        mailer: with_delivery.then(|| mailer.clone() as Arc<dyn Mailer>),
        metrics: Arc::new(Metrics::new()),
    };
    spawn_workers(ctx, receivers);

    Harness {
        store,
        broker: Arc::new(broker),
        artifacts,
        mailer,
        _temp: temp,
    }
}

fn spec(comicid: &str, chapter: ChapterSelector) -> TaskSpec {
    TaskSpec {
        site: "library".to_string(),
        comicid: comicid.to_string(),
        chapter,
        send_mail: false,
        gen_pdf: false,
        receivers: Vec::new(),
    }
}

async fn wait_terminal(store: &TaskStore, id: u64) -> Task {
    timeout(Duration::from_secs(10), async {
        loop {
            let task = store.get(id).unwrap().unwrap();
            match task.status {
                TaskStatus::Succeeded | TaskStatus::Failed => return task,
                _ => sleep(Duration::from_millis(20)).await,
            }
        }
    })
    .await
    .expect("task did not reach a terminal status")
}

#[tokio::test]
async fn specific_chapter_succeeds_and_stores_pages() {
    let h = build_harness(false).await;

    let task = h
        .broker
        .submit(spec("1", ChapterSelector::Specific(2)))
        .await
        .unwrap();

    let done = wait_terminal(&h.store, task.id).await;
    assert_eq!(done.status, TaskStatus::Succeeded);
    assert!(done.error.is_none());

    // Library chapters carry three pages
    for page in ["0001.png", "0002.png", "0003.png"] {
        let key = format!("library/1/2/{page}");
        assert!(h.artifacts.exists(&key).await.unwrap(), "missing {key}");
        assert_eq!(h.artifacts.get(&key).await.unwrap(), PNG_STUB);
    }

    // Only the requested chapter was fetched
    assert!(!h.artifacts.exists("library/1/1/0001.png").await.unwrap());
}

#[tokio::test]
async fn all_selector_fetches_every_chapter() {
    let h = build_harness(false).await;

    let task = h
        .broker
        .submit(spec("2", ChapterSelector::All))
        .await
        .unwrap();

    let done = wait_terminal(&h.store, task.id).await;
    assert_eq!(done.status, TaskStatus::Succeeded);

    assert!(h.artifacts.exists("library/2/1/0001.png").await.unwrap());
    assert!(h.artifacts.exists("library/2/2/0001.png").await.unwrap());
}

#[tokio::test]
async fn unspecified_selector_fetches_latest_chapter_only() {
    let h = build_harness(false).await;

    let task = h
        .broker
        .submit(spec("2", ChapterSelector::Unspecified))
        .await
        .unwrap();

    let done = wait_terminal(&h.store, task.id).await;
    assert_eq!(done.status, TaskStatus::Succeeded);

    assert!(h.artifacts.exists("library/2/2/0001.png").await.unwrap());
    assert!(!h.artifacts.exists("library/2/1/0001.png").await.unwrap());
}

#[tokio::test]
async fn missing_chapter_marks_task_failed() {
    let h = build_harness(false).await;

    let task = h
        .broker
        .submit(spec("1", ChapterSelector::Specific(99)))
        .await
        .unwrap();

    let done = wait_terminal(&h.store, task.id).await;
    assert_eq!(done.status, TaskStatus::Failed);
    assert!(done.error.unwrap().contains("no chapter"));
}

#[tokio::test]
async fn unknown_site_marks_task_failed() {
    let h = build_harness(false).await;

    let task = h
        .broker
        .submit(TaskSpec {
            site: "nope".to_string(),
            comicid: "1".to_string(),
            chapter: ChapterSelector::Unspecified,
            send_mail: false,
            gen_pdf: false,
            receivers: Vec::new(),
        })
        .await
        .unwrap();

    let done = wait_terminal(&h.store, task.id).await;
    assert_eq!(done.status, TaskStatus::Failed);
    assert!(done.error.unwrap().contains("site not supported"));
}

#[tokio::test]
async fn pdf_and_mail_delivery_run_when_configured() {
    let h = build_harness(true).await;

    let task = h
        .broker
        .submit(TaskSpec {
            site: "library".to_string(),
            comicid: "1".to_string(),
            chapter: ChapterSelector::Specific(1),
            send_mail: true,
            gen_pdf: true,
            receivers: vec!["reader@example.com".to_string()],
        })
        .await
        .unwrap();

    let done = wait_terminal(&h.store, task.id).await;
    assert_eq!(done.status, TaskStatus::Succeeded);

    let pdf_key = format!("library/1/1/task-{}.pdf", task.id);
    let pdf = h.artifacts.get(&pdf_key).await.unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, vec!["reader@example.com".to_string()]);
    assert!(sent[0].2, "mail should carry the rendered attachment");
}

#[tokio::test]
async fn delivery_steps_are_skipped_without_backends() {
    let h = build_harness(false).await;

    let task = h
        .broker
        .submit(TaskSpec {
            site: "library".to_string(),
            comicid: "1".to_string(),
            chapter: ChapterSelector::Specific(1),
            send_mail: true,
            gen_pdf: true,
            receivers: vec!["reader@example.com".to_string()],
        })
        .await
        .unwrap();

    // Absent pdf/mail backends are skipped, not fatal
    let done = wait_terminal(&h.store, task.id).await;
    assert_eq!(done.status, TaskStatus::Succeeded);

    let pdf_key = format!("library/1/1/task-{}.pdf", task.id);
    assert!(!h.artifacts.exists(&pdf_key).await.unwrap());
    assert!(h.mailer.sent.lock().unwrap().is_empty());
}
