//! Task worker - executes queued tasks end to end
//!
//! Each worker owns one mpsc receiver fed by the broker. Execution walks
//! the pipeline: mark running → resolve provider → expand the chapter
//! selector → fetch chapter image urls → download pages → store artifacts →
//! optional PDF render → optional mail delivery → record the final status.

use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::broker::TaskEnvelope;
use super::delivery::{DeliveryError, Mailer, PdfRenderer};
use super::http::{DownloadError, PageDownloader};
use super::store::{StoreError, TaskStore};
use super::types::{ChapterSelector, Task, TaskStatus};
use crate::observability::Metrics;
use crate::sites::{SiteError, SiteRegistry};
use crate::storage::{ArtifactStore, StorageError};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("site not supported: {0}")]
    UnknownSite(String),

    #[error("comic {0} has no chapters")]
    NoChapters(String),

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Shared dependencies handed to every worker.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<TaskStore>,
    pub sites: Arc<SiteRegistry>,
    pub artifacts: Arc<ArtifactStore>,
    pub downloader: Arc<PageDownloader>,
    /// External collaborators; absent backends log and skip their step.
    pub pdf: Option<Arc<dyn PdfRenderer>>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub metrics: Arc<Metrics>,
}

/// Spawn one task per receiver; handles live for the process lifetime.
pub fn spawn_workers(
    ctx: WorkerContext,
    receivers: Vec<mpsc::Receiver<TaskEnvelope>>,
) -> Vec<JoinHandle<()>> {
    receivers
        .into_iter()
        .enumerate()
        .map(|(worker_id, rx)| {
            let ctx = ctx.clone();
            tokio::spawn(run_worker(worker_id, rx, ctx))
        })
        .collect()
}

async fn run_worker(worker_id: usize, mut rx: mpsc::Receiver<TaskEnvelope>, ctx: WorkerContext) {
    info!(worker_id, "Worker started");

    while let Some(envelope) = rx.recv().await {
        let task = envelope.task;
        let task_id = task.id;

        info!(worker_id, task_id, site = %task.site, comicid = %task.comicid, "Processing task");

        if let Err(e) = ctx.store.set_status(task_id, TaskStatus::Running) {
            error!(worker_id, task_id, error = %e, "Failed to mark task running");
            continue;
        }

        match process_task(&ctx, &task).await {
            Ok(()) => {
                info!(worker_id, task_id, "Task succeeded");
                ctx.metrics.task_completed();
                if let Err(e) = ctx.store.set_status(task_id, TaskStatus::Succeeded) {
                    error!(worker_id, task_id, error = %e, "Failed to record success");
                }
            }
            Err(e) => {
                warn!(worker_id, task_id, error = %e, "Task failed");
                ctx.metrics.task_failed();
                if let Err(e) = ctx.store.set_failed(task_id, e.to_string()) {
                    error!(worker_id, task_id, error = %e, "Failed to record failure");
                }
            }
        }
    }

    info!(worker_id, "Worker channel closed, shutting down");
}

/// Execute one task. No retry here; a failure is recorded on the task and
/// the worker moves on.
pub async fn process_task(ctx: &WorkerContext, task: &Task) -> Result<()> {
    let provider = ctx
        .sites
        .resolve(&task.site)
        .map_err(|_| WorkerError::UnknownSite(task.site.clone()))?;

    let info = provider.get_comic_info(&task.comicid).await?;

    let chapter_numbers = expand_selector(task.chapter, info.chapters.iter().map(|c| c.chapter_number))
        .ok_or_else(|| WorkerError::NoChapters(task.comicid.clone()))?;

    let referer = [("Referer".to_string(), info.source_url.clone())];

    for chapter_number in chapter_numbers {
        let chapter = provider.get_chapter_info(&task.comicid, chapter_number).await?;

        let mut pages: Vec<Bytes> = Vec::with_capacity(chapter.image_urls.len());
        for (index, url) in chapter.image_urls.iter().enumerate() {
            let bytes = ctx.downloader.download(url, &referer).await?;
            let key = ArtifactStore::page_key(&task.site, &task.comicid, chapter_number, index, url);
            ctx.artifacts.put(&key, bytes.to_vec()).await?;
            pages.push(bytes);
        }

        info!(
            task_id = task.id,
            chapter_number,
            pages = pages.len(),
            "Chapter downloaded"
        );

        if task.gen_pdf {
            let title = format!("{} - {}", info.name, chapter.title);
            let pdf = match &ctx.pdf {
                Some(renderer) => Some(renderer.render(&title, &pages).await?),
                None => {
                    warn!(task_id = task.id, "PDF rendering requested but no renderer configured, skipping");
                    None
                }
            };

            if let Some(pdf) = pdf {
                let key = ArtifactStore::pdf_key(&task.site, &task.comicid, chapter_number, task.id);
                ctx.artifacts.put(&key, pdf.to_vec()).await?;

                if task.send_mail {
                    send_mail(ctx, task, &title, Some(pdf)).await?;
                }
            }
        } else if task.send_mail {
            send_mail(ctx, task, &info.name, None).await?;
        }
    }

    Ok(())
}

async fn send_mail(
    ctx: &WorkerContext,
    task: &Task,
    subject: &str,
    attachment: Option<Bytes>,
) -> Result<()> {
    match &ctx.mailer {
        Some(mailer) => {
            mailer.send(&task.receivers, subject, attachment).await?;
            Ok(())
        }
        None => {
            warn!(task_id = task.id, "Mail delivery requested but no mailer configured, skipping");
            Ok(())
        }
    }
}

/// Expand a chapter selector against a comic's chapter index. Returns None
/// when the comic has no chapters to resolve Unspecified against.
fn expand_selector(
    selector: ChapterSelector,
    chapters: impl Iterator<Item = u32>,
) -> Option<Vec<u32>> {
    match selector {
        ChapterSelector::All => {
            let all: Vec<u32> = chapters.collect();
            if all.is_empty() { None } else { Some(all) }
        }
        ChapterSelector::Specific(n) => Some(vec![n]),
        ChapterSelector::Unspecified => chapters.max().map(|latest| vec![latest]),
    }
}
