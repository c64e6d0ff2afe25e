// ABOUTME: Document Capability seam: the injected facility that turns a URL into a fetched page.
// ABOUTME: Defines the DocumentCapability trait and the PageDocument it yields; http.rs is the production impl.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PipelineError;

pub use http::{HttpCapability, MAX_CONTENT_LENGTH};

/// A fetched page ready for DOM reads.
///
/// Holds the markup as a string rather than a parsed tree so the value can
/// cross await points; the extractor parses it synchronously in one scope.
/// Dropping the document releases everything the navigation acquired.
#[derive(Debug, Clone)]
pub struct PageDocument {
    /// The URL the caller asked for.
    pub url: String,
    /// The URL the navigation ended on, after redirects. Relative hrefs and
    /// srcs resolve against this.
    pub final_url: String,
    /// The decoded markup.
    pub html: String,
}

/// External browser/fetch facility providing rendered-DOM access for a URL.
///
/// Injected into the pipeline so tests can substitute a fixture-backed fake.
/// Implementations must release any session state on every exit path before
/// returning; the pipeline additionally bounds `navigate` with a timeout so
/// a hung navigation cannot hold a session indefinitely.
#[async_trait]
pub trait DocumentCapability: Send + Sync {
    /// Navigate to `url` and return the fetched page, or an extraction
    /// failure if the resource is unreachable.
    async fn navigate(&self, url: &str) -> Result<PageDocument, PipelineError>;
}

// A shared handle to a capability is itself a capability.
#[async_trait]
impl<C: DocumentCapability + ?Sized> DocumentCapability for Arc<C> {
    async fn navigate(&self, url: &str) -> Result<PageDocument, PipelineError> {
        (**self).navigate(url).await
    }
}
