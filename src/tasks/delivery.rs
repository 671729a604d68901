//! Delivery boundaries: PDF rendering and mail transport.
//!
//! Both are external collaborators of the orchestration core; the worker
//! only depends on these traits. Deployments without a configured backend
//! run with neither wired in, and the worker logs and skips those steps.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("pdf rendering failed: {0}")]
    Render(String),

    #[error("mail delivery failed: {0}")]
    Send(String),
}

/// Renders a chapter's downloaded pages into a single PDF document.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, title: &str, pages: &[Bytes]) -> Result<Bytes, DeliveryError>;
}

/// Delivers a finished task's output to a list of recipients.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        receivers: &[String],
        subject: &str,
        attachment: Option<Bytes>,
    ) -> Result<(), DeliveryError>;
}
