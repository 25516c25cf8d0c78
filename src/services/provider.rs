use crate::error::Result;
use crate::models::{Provider, Track};
use async_trait::async_trait;

/// Opaque provider-specific reference detected inside free text (a video id,
/// a playlist URL, ...). Only the provider that produced it can interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef(pub String);

/// Client for one external media platform, used as a black box: URL parsing
/// and track fetching are assumed correct on the other side.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Which platform this client talks to.
    fn provider(&self) -> Provider;

    /// Scans free text for a URL this provider understands.
    fn detect_reference(&self, text: &str) -> Option<ProviderRef>;

    /// Fetches the track(s) behind a detected reference.
    async fn fetch(&self, reference: &ProviderRef) -> Result<Vec<Track>>;

    /// Plain text search, best hits first.
    async fn search(&self, query: &str) -> Result<Vec<Track>>;
}

/// A user's saved-track collection on an external platform.
#[derive(Debug, Clone)]
pub struct SavedTracks {
    pub display_name: String,
    pub tracks: Vec<Track>,
}

/// Lookup of saved-track collections by free-text user reference.
#[async_trait]
pub trait SavedTrackSource: Send + Sync {
    async fn lookup(&self, user_ref: &str) -> Result<Option<SavedTracks>>;
}
