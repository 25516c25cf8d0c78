use crate::error::{EngineError, Result};
use crate::models::{ChannelId, RangeDirective, Track, UserId};
use crate::services::disambiguator::{Disambiguator, SelectOption, Selection};
use crate::services::notify::Notifier;
use crate::services::provider::{MediaProvider, SavedTrackSource};
use crate::services::store::PlaylistStore;
use crate::Config;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Why a query resolved to nothing. Not an error: a terminal non-selection
/// outcome of the fallback-search branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAbort {
    Cancelled,
    InvalidSelection,
    TimedOut,
}

impl QueryAbort {
    /// Outcome-specific wording for the transport to show.
    pub fn message(&self) -> &'static str {
        match self {
            QueryAbort::Cancelled => "Cancelled query.",
            QueryAbort::InvalidSelection => "Invalid selection. Cancelling query.",
            QueryAbort::TimedOut => "Selection timed out. Cancelling query.",
        }
    }
}

/// Tracks collected for a query, plus the modifier flags found in it.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub tracks: Vec<Track>,
    /// `--next` pass-through for the consumer's queue insertion point.
    pub play_next: bool,
    pub shuffled: bool,
}

#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Resolved(ResolvedQuery),
    Aborted(QueryAbort),
}

/// Collects tracks for a free-text query from every source it references:
/// saved-track collections (`<user> [<range>]`), provider URLs, and other
/// playlists (`pl.<id>`), in that fixed order. Falls back to a text search
/// plus interactive disambiguation when no source yields anything.
pub struct QueryAggregator {
    store: Arc<PlaylistStore>,
    saved_tracks: Arc<dyn SavedTrackSource>,
    providers: Vec<Arc<dyn MediaProvider>>,
    notifier: Arc<dyn Notifier>,
    disambiguator: Arc<Disambiguator>,
    search_result_count: usize,
}

impl QueryAggregator {
    pub fn new(
        store: Arc<PlaylistStore>,
        saved_tracks: Arc<dyn SavedTrackSource>,
        providers: Vec<Arc<dyn MediaProvider>>,
        notifier: Arc<dyn Notifier>,
        disambiguator: Arc<Disambiguator>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            saved_tracks,
            providers,
            notifier,
            disambiguator,
            search_result_count: config.search_result_count,
        }
    }

    /// Resolves raw query text to an ordered track list. Resolver failures
    /// are reported per-reference and never abort the other sources.
    pub async fn resolve(
        &self,
        channel: &ChannelId,
        user: &UserId,
        text: &str,
    ) -> Result<QueryOutcome> {
        let play_next = text.contains("--next");
        let shuffle = text.contains("--shuffle");

        let mut collected = self.saved_track_references(channel, text).await?;
        for provider in &self.providers {
            collected.extend(self.url_reference(channel, provider.as_ref(), text).await?);
        }
        collected.extend(self.playlist_references(channel, text).await?);

        if collected.is_empty() {
            return self.search_fallback(channel, user, text, play_next).await;
        }

        if shuffle {
            collected.shuffle(&mut rand::thread_rng());
        }
        Ok(QueryOutcome::Resolved(ResolvedQuery {
            tracks: collected,
            play_next,
            shuffled: shuffle,
        }))
    }

    async fn saved_track_references(&self, channel: &ChannelId, text: &str) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        for reference in scan_saved_track_references(text) {
            let collection = match self.saved_tracks.lookup(&reference.user_ref).await {
                Ok(Some(collection)) => collection,
                Ok(None) => {
                    self.notifier
                        .send(
                            channel,
                            &format!("The user {} isn't recognized.", reference.user_ref),
                        )
                        .await?;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Saved-track lookup for {} failed: {}", reference.user_ref, e);
                    self.notifier
                        .send(
                            channel,
                            &format!("The user {} isn't recognized.", reference.user_ref),
                        )
                        .await?;
                    continue;
                }
            };
            self.notifier
                .send(
                    channel,
                    &format!("Adding {}'s tracks... Done", collection.display_name),
                )
                .await?;
            let directive = match RangeDirective::parse(&reference.range) {
                Ok(directive) => directive,
                Err(_) => {
                    self.notifier
                        .send(
                            channel,
                            &format!(
                                "The query for user {} isn't valid.",
                                collection.display_name
                            ),
                        )
                        .await?;
                    continue;
                }
            };
            let (start, end) = directive.copy_bounds(collection.tracks.len());
            tracks.extend_from_slice(&collection.tracks[start..end]);
        }
        Ok(tracks)
    }

    async fn url_reference(
        &self,
        channel: &ChannelId,
        provider: &dyn MediaProvider,
        text: &str,
    ) -> Result<Vec<Track>> {
        let Some(reference) = provider.detect_reference(text) else {
            return Ok(Vec::new());
        };
        let notice = format!("Retrieving songs from {} url...", provider.provider());
        let message = self.notifier.send(channel, &notice).await?;
        match provider.fetch(&reference).await {
            Ok(fetched) => {
                self.notifier
                    .edit(&message, &format!("{notice} Done"))
                    .await?;
                Ok(fetched)
            }
            Err(e) => {
                tracing::warn!("{} fetch failed: {}", provider.provider(), e);
                self.notifier
                    .edit(&message, &format!("{notice} Failed. {e}"))
                    .await?;
                Ok(Vec::new())
            }
        }
    }

    async fn playlist_references(&self, channel: &ChannelId, text: &str) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        for id in scan_playlist_references(text) {
            match self.store.lookup_by_playlist_id(id).await {
                Some((_, playlist)) => {
                    self.notifier
                        .send(
                            channel,
                            &format!("Adding tracks from playlist `{}`... Done", playlist.name),
                        )
                        .await?;
                    tracks.extend(playlist.tracks);
                }
                None => {
                    self.notifier
                        .send(channel, &format!("The playlist `{id}` isn't recognized."))
                        .await?;
                }
            }
        }
        Ok(tracks)
    }

    /// No source matched: search the primary provider and let the user pick.
    async fn search_fallback(
        &self,
        channel: &ChannelId,
        user: &UserId,
        text: &str,
        play_next: bool,
    ) -> Result<QueryOutcome> {
        let query = strip_modifiers(text);
        let primary = self
            .providers
            .first()
            .ok_or_else(|| EngineError::Provider("no media providers configured".to_string()))?;
        let hits: Vec<Track> = primary
            .search(&query)
            .await?
            .into_iter()
            .take(self.search_result_count)
            .collect();
        tracing::debug!("Search fallback for '{}' produced {} hits", query, hits.len());

        let options: Vec<SelectOption> = hits
            .iter()
            .enumerate()
            .map(|(idx, track)| SelectOption::numbered(idx + 1, &track.title))
            .collect();
        let selection = self
            .disambiguator
            .ask(
                self.notifier.as_ref(),
                channel,
                user,
                "Select which song you wanted to add:",
                &options,
            )
            .await?;

        Ok(match selection {
            Selection::Chosen(idx) => QueryOutcome::Resolved(ResolvedQuery {
                tracks: vec![hits[idx].clone()],
                play_next,
                shuffled: false,
            }),
            Selection::Cancelled => QueryOutcome::Aborted(QueryAbort::Cancelled),
            Selection::Invalid => QueryOutcome::Aborted(QueryAbort::InvalidSelection),
            Selection::TimedOut => QueryOutcome::Aborted(QueryAbort::TimedOut),
        })
    }
}

/// A `<userRef> [<range>]` reference found in query text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SavedTrackReference {
    user_ref: String,
    range: String,
}

/// Scans for `<word> [<range>]` pairs: a bracket group whose content matches
/// the range grammar, preceded by a whitespace-separated word. Bracket groups
/// with other content are left alone.
fn scan_saved_track_references(text: &str) -> Vec<SavedTrackReference> {
    let mut references = Vec::new();
    let mut rest = 0usize;
    while let Some(open_rel) = text[rest..].find('[') {
        let open = rest + open_rel;
        let Some(close_rel) = text[open..].find(']') else {
            break;
        };
        let close = open + close_rel;
        let content = &text[open + 1..close];
        let before = &text[rest..open];
        if RangeDirective::matches_grammar(content)
            && before.ends_with(|c: char| c.is_whitespace())
        {
            if let Some(user_ref) = before.split_whitespace().last() {
                references.push(SavedTrackReference {
                    user_ref: user_ref.to_string(),
                    range: content.trim().to_string(),
                });
                rest = close + 1;
                continue;
            }
        }
        rest = open + 1;
    }
    references
}

/// Token-bounded `pl.<id>` references, in encounter order.
fn scan_playlist_references(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter_map(|token| token.strip_prefix("pl."))
        .filter(|id| !id.is_empty())
        .collect()
}

/// Drops the `--next`/`--shuffle` modifier tokens before a text search.
fn strip_modifiers(text: &str) -> String {
    text.split_whitespace()
        .filter(|token| *token != "--next" && *token != "--shuffle")
        .collect::<Vec<_>>()
        .join(" ")
}
