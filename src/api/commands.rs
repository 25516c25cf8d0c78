use crate::error::{EngineError, Result};
use crate::models::{normalize_name, ChannelId, PlaylistSnapshot, RangeDirective, UserId};
use crate::services::resolver::{QueryAbort, QueryAggregator, QueryOutcome};
use crate::services::store::PlaylistStore;
use params::NewPlaylistParams;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

const NEW_USAGE: &str = "Incorrect usage! The format is: `new <playlistId> \"<name>\"`";
const ADD_USAGE: &str = "Incorrect usage! The format is: `add <playlistId> - (<query> | <specific>)`";
const REMOVE_USAGE: &str = "Incorrect usage! The format is: `remove <playlistId> [<range>]`";

/// A playlist command, parsed from the text after the transport has stripped
/// its command prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistCommand {
    New { id: String, name: String },
    Add { id: String, query: String },
    Remove { id: String, range: String },
    Delete { id: String },
    Info { id: String },
    List { category: Option<i64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCategory {
    Bot,
    Server,
    Personal,
}

/// One row of a `list` reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedPlaylist {
    pub owner: UserId,
    pub id: String,
    pub name: String,
    pub size: usize,
}

/// Structured outcome of one playlist command. The transport owns all
/// rendering; this crate never formats markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Created { id: String, name: String },
    /// `title` is set when exactly one track was added.
    Added { count: usize, title: Option<String> },
    Removed,
    Deleted { id: String },
    Info(PlaylistSnapshot),
    Playlists { category: ListCategory, entries: Vec<ListedPlaylist> },
    /// `list` without a usable category index: show the category overview.
    CategoryOverview,
    NoSuchCategory,
    /// The query's fallback search ended without a selection.
    QueryAborted(QueryAbort),
}

mod params {
    use validator::Validate;

    #[derive(Debug, Validate)]
    pub(super) struct NewPlaylistParams {
        #[validate(length(max = 7, message = "Playlist ID exceeds maximum character length of `7`!"))]
        pub(super) id: String,
        #[validate(length(max = 25, message = "Name exceeds maximum character length of `25`!"))]
        pub(super) name: String,
    }
}

/// Parses one command line into a [`PlaylistCommand`].
pub fn parse_command(input: &str) -> Result<PlaylistCommand> {
    let input = input.trim();
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };
    match command.to_ascii_lowercase().as_str() {
        "new" => parse_new(rest),
        "add" => parse_add(rest),
        "remove" => parse_remove(rest),
        "delete" => Ok(PlaylistCommand::Delete {
            id: required_id(rest)?,
        }),
        "info" => Ok(PlaylistCommand::Info {
            id: required_id(rest)?,
        }),
        "list" => Ok(PlaylistCommand::List {
            category: rest.split_whitespace().next().and_then(|t| t.parse().ok()),
        }),
        other => Err(EngineError::Validation(format!(
            "Unknown playlist command `{other}`."
        ))),
    }
}

fn parse_new(rest: &str) -> Result<PlaylistCommand> {
    let usage = || EngineError::Validation(NEW_USAGE.to_string());
    let (id, remainder) = rest.split_once(char::is_whitespace).ok_or_else(usage)?;
    let quoted = remainder.trim();
    let name = quoted
        .strip_prefix('"')
        .and_then(|q| q.strip_suffix('"'))
        .filter(|name| !name.is_empty() && !name.contains('"'))
        .ok_or_else(usage)?;
    Ok(PlaylistCommand::New {
        id: id.to_string(),
        name: name.to_string(),
    })
}

fn parse_add(rest: &str) -> Result<PlaylistCommand> {
    let usage = || EngineError::Validation(ADD_USAGE.to_string());
    let (id, remainder) = rest.split_once(char::is_whitespace).ok_or_else(usage)?;
    let remainder = remainder.trim_start();
    // the separator must be a standalone `-` token
    let query = remainder
        .strip_prefix('-')
        .filter(|q| q.starts_with(char::is_whitespace))
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(usage)?;
    Ok(PlaylistCommand::Add {
        id: id.to_string(),
        query: query.to_string(),
    })
}

fn parse_remove(rest: &str) -> Result<PlaylistCommand> {
    let usage = || EngineError::Validation(REMOVE_USAGE.to_string());
    let (id, remainder) = rest.split_once(char::is_whitespace).ok_or_else(usage)?;
    let range = remainder
        .trim()
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .map(str::trim)
        .filter(|r| RangeDirective::matches_grammar(r))
        .ok_or_else(usage)?;
    Ok(PlaylistCommand::Remove {
        id: id.to_string(),
        range: range.to_string(),
    })
}

fn required_id(rest: &str) -> Result<String> {
    rest.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| EngineError::Validation("Missing parameter: <playlistId>".to_string()))
}

/// Parses and dispatches playlist commands against the store and the query
/// engine, returning structured replies for the transport to render.
pub struct CommandHandler {
    store: Arc<PlaylistStore>,
    aggregator: Arc<QueryAggregator>,
    bot_user: UserId,
}

impl CommandHandler {
    pub fn new(
        store: Arc<PlaylistStore>,
        aggregator: Arc<QueryAggregator>,
        bot_user: UserId,
    ) -> Self {
        Self {
            store,
            aggregator,
            bot_user,
        }
    }

    pub async fn handle(&self, channel: &ChannelId, user: &UserId, input: &str) -> Result<Reply> {
        match parse_command(input)? {
            PlaylistCommand::New { id, name } => self.create(user, id, name).await,
            PlaylistCommand::Add { id, query } => self.add(channel, user, &id, &query).await,
            PlaylistCommand::Remove { id, range } => {
                let directive = RangeDirective::parse(&range)?;
                self.store.remove_range(user, &id, directive).await?;
                Ok(Reply::Removed)
            }
            PlaylistCommand::Delete { id } => {
                self.store.delete_playlist(user, &id).await?;
                Ok(Reply::Deleted { id })
            }
            PlaylistCommand::Info { id } => self
                .store
                .export(&id)
                .await
                .map(Reply::Info)
                .ok_or_else(|| {
                    EngineError::NotFound("That playlist does not exist!".to_string())
                }),
            PlaylistCommand::List { category } => self.list(user, category).await,
        }
    }

    async fn create(&self, user: &UserId, id: String, name: String) -> Result<Reply> {
        let name = normalize_name(&name);
        let params = NewPlaylistParams {
            id: id.clone(),
            name: name.clone(),
        };
        params
            .validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        self.store.create_playlist(user, &id, &name).await?;
        Ok(Reply::Created { id, name })
    }

    async fn add(&self, channel: &ChannelId, user: &UserId, id: &str, query: &str) -> Result<Reply> {
        match self.aggregator.resolve(channel, user, query).await? {
            QueryOutcome::Aborted(reason) => Ok(Reply::QueryAborted(reason)),
            QueryOutcome::Resolved(resolved) => {
                let count = resolved.tracks.len();
                let title = match resolved.tracks.as_slice() {
                    [only] => Some(only.title.clone()),
                    _ => None,
                };
                self.store.add_tracks(user, id, resolved.tracks).await?;
                Ok(Reply::Added { count, title })
            }
        }
    }

    async fn list(&self, user: &UserId, category: Option<i64>) -> Result<Reply> {
        let Some(category) = category else {
            return Ok(Reply::CategoryOverview);
        };
        let (category, entries) = match category {
            1 => {
                let bot = self.bot_user.clone();
                (ListCategory::Bot, owned_by(&bot, self.store.user_playlists(&bot).await))
            }
            2 => (
                ListCategory::Server,
                self.store
                    .all_playlists()
                    .await
                    .into_iter()
                    .map(|(owner, playlist)| ListedPlaylist {
                        owner,
                        id: playlist.id.clone(),
                        name: playlist.name.clone(),
                        size: playlist.size(),
                    })
                    .collect(),
            ),
            3 => (
                ListCategory::Personal,
                owned_by(user, self.store.user_playlists(user).await),
            ),
            _ => return Ok(Reply::NoSuchCategory),
        };
        Ok(Reply::Playlists { category, entries })
    }
}

fn owned_by(owner: &UserId, playlists: Vec<crate::models::Playlist>) -> Vec<ListedPlaylist> {
    playlists
        .into_iter()
        .map(|playlist| ListedPlaylist {
            owner: owner.clone(),
            id: playlist.id.clone(),
            name: playlist.name.clone(),
            size: playlist.size(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provider, Track};
    use crate::services::disambiguator::Disambiguator;
    use crate::services::notify::{MessageRef, Notifier};
    use crate::services::provider::{MediaProvider, ProviderRef, SavedTrackSource, SavedTracks};
    use crate::Config;
    use async_trait::async_trait;
    use std::time::Duration;

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        async fn send(&self, _channel: &ChannelId, _text: &str) -> Result<MessageRef> {
            Ok(MessageRef::new())
        }

        async fn edit(&self, _message: &MessageRef, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    struct NoSavedTracks;

    #[async_trait]
    impl SavedTrackSource for NoSavedTracks {
        async fn lookup(&self, _user_ref: &str) -> Result<Option<SavedTracks>> {
            Ok(None)
        }
    }

    struct UrlProvider;

    #[async_trait]
    impl MediaProvider for UrlProvider {
        fn provider(&self) -> Provider {
            Provider::YouTube
        }

        fn detect_reference(&self, text: &str) -> Option<ProviderRef> {
            text.contains("youtube.com")
                .then(|| ProviderRef("watch".to_string()))
        }

        async fn fetch(&self, _reference: &ProviderRef) -> Result<Vec<Track>> {
            Ok(vec![Track::new(
                "fetched",
                "https://youtube.com/watch",
                Provider::YouTube,
            )])
        }

        async fn search(&self, _query: &str) -> Result<Vec<Track>> {
            Ok(Vec::new())
        }
    }

    fn handler() -> (CommandHandler, Arc<PlaylistStore>) {
        let store = Arc::new(PlaylistStore::new());
        let aggregator = Arc::new(QueryAggregator::new(
            store.clone(),
            Arc::new(NoSavedTracks),
            vec![Arc::new(UrlProvider)],
            Arc::new(SilentNotifier),
            Arc::new(Disambiguator::new(Duration::from_millis(50))),
            &Config::default(),
        ));
        (
            CommandHandler::new(store.clone(), aggregator, UserId::from("bot")),
            store,
        )
    }

    #[test]
    fn parses_new_with_quoted_name() {
        assert_eq!(
            parse_command("new mix \"My Cool List\"").unwrap(),
            PlaylistCommand::New {
                id: "mix".to_string(),
                name: "My Cool List".to_string()
            }
        );
        for bad in ["new mix", "new mix My List", "new mix \"\"", "new"] {
            assert!(matches!(
                parse_command(bad),
                Err(EngineError::Validation(_))
            ));
        }
    }

    #[test]
    fn parses_add_with_separator() {
        assert_eq!(
            parse_command("add mix - lofi beats --next").unwrap(),
            PlaylistCommand::Add {
                id: "mix".to_string(),
                query: "lofi beats --next".to_string()
            }
        );
        // `-` must be a standalone token
        for bad in ["add mix lofi", "add mix -lofi", "add mix - ", "add mix"] {
            assert!(matches!(
                parse_command(bad),
                Err(EngineError::Validation(_))
            ));
        }
    }

    #[test]
    fn parses_remove_with_bracketed_range() {
        assert_eq!(
            parse_command("remove mix [2,4]").unwrap(),
            PlaylistCommand::Remove {
                id: "mix".to_string(),
                range: "2,4".to_string()
            }
        );
        assert_eq!(
            parse_command("remove mix [ all ]").unwrap(),
            PlaylistCommand::Remove {
                id: "mix".to_string(),
                range: "all".to_string()
            }
        );
        for bad in ["remove mix 2,4", "remove mix [a,b]", "remove mix [1,2,3]", "remove mix"] {
            assert!(matches!(
                parse_command(bad),
                Err(EngineError::Validation(_))
            ));
        }
    }

    #[test]
    fn parses_list_and_bare_ids() {
        assert_eq!(
            parse_command("list").unwrap(),
            PlaylistCommand::List { category: None }
        );
        assert_eq!(
            parse_command("list 2").unwrap(),
            PlaylistCommand::List { category: Some(2) }
        );
        assert_eq!(
            parse_command("list soon").unwrap(),
            PlaylistCommand::List { category: None }
        );
        assert_eq!(
            parse_command("delete mix").unwrap(),
            PlaylistCommand::Delete {
                id: "mix".to_string()
            }
        );
        assert!(parse_command("info").is_err());
        assert!(parse_command("frobnicate x").is_err());
    }

    #[tokio::test]
    async fn create_validates_and_normalizes() {
        let (handler, _) = handler();
        let channel = ChannelId::from("chan");
        let user = UserId::from("alice");

        let reply = handler
            .handle(&channel, &user, "new mix \"  My   Mix  \"")
            .await
            .unwrap();
        assert_eq!(
            reply,
            Reply::Created {
                id: "mix".to_string(),
                name: "My Mix".to_string()
            }
        );

        let err = handler
            .handle(&channel, &user, "new toolong8 \"x\"")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn add_resolves_and_appends() {
        let (handler, store) = handler();
        let channel = ChannelId::from("chan");
        let user = UserId::from("alice");
        handler
            .handle(&channel, &user, "new mix \"Mix\"")
            .await
            .unwrap();

        let reply = handler
            .handle(&channel, &user, "add mix - youtube.com/watch?v=x")
            .await
            .unwrap();
        assert_eq!(
            reply,
            Reply::Added {
                count: 1,
                title: Some("fetched".to_string())
            }
        );
        assert_eq!(store.lookup_by_playlist_id("mix").await.unwrap().1.size(), 1);
    }

    #[tokio::test]
    async fn remove_zero_bound_is_a_validation_error() {
        let (handler, _) = handler();
        let channel = ChannelId::from("chan");
        let user = UserId::from("alice");
        handler
            .handle(&channel, &user, "new mix \"Mix\"")
            .await
            .unwrap();

        let err = handler
            .handle(&channel, &user, "remove mix [0,4]")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn info_exports_and_list_reads() {
        let (handler, store) = handler();
        let channel = ChannelId::from("chan");
        let alice = UserId::from("alice");
        handler
            .handle(&channel, &alice, "new mix \"Mix\"")
            .await
            .unwrap();
        store
            .add_tracks(
                &alice,
                "mix",
                vec![Track::new("t", "https://yt/t", Provider::YouTube)],
            )
            .await
            .unwrap();

        let reply = handler.handle(&channel, &alice, "info mix").await.unwrap();
        match reply {
            Reply::Info(snapshot) => {
                assert_eq!(snapshot.owner, alice);
                assert_eq!(snapshot.size, 1);
            }
            other => panic!("expected info reply, got {other:?}"),
        }
        assert!(matches!(
            handler.handle(&channel, &alice, "info zzz").await,
            Err(EngineError::NotFound(_))
        ));

        assert_eq!(
            handler.handle(&channel, &alice, "list").await.unwrap(),
            Reply::CategoryOverview
        );
        match handler.handle(&channel, &alice, "list 3").await.unwrap() {
            Reply::Playlists { category, entries } => {
                assert_eq!(category, ListCategory::Personal);
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].id, "mix");
                assert_eq!(entries[0].size, 1);
            }
            other => panic!("expected playlists reply, got {other:?}"),
        }
        assert_eq!(
            handler.handle(&channel, &alice, "list 9").await.unwrap(),
            Reply::NoSuchCategory
        );
    }
}
