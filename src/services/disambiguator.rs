use crate::error::Result;
use crate::models::{ChannelId, UserId};
use crate::services::notify::Notifier;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

/// One entry the user can pick, plus the reply tokens that select it.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub label: String,
    pub selectors: Vec<String>,
}

impl SelectOption {
    /// The usual numbered form: label "n. title", selected by replying "n".
    pub fn numbered(position: usize, title: &str) -> Self {
        Self {
            label: format!("{position}. {title}"),
            selectors: vec![position.to_string()],
        }
    }
}

/// Terminal outcome of a selection session. Exactly one occurs per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 0-based position in the caller-provided option list.
    Chosen(usize),
    /// The user replied with the reserved "0".
    Cancelled,
    /// The reply parsed but matched no option.
    Invalid,
    /// No qualifying reply before the deadline.
    TimedOut,
}

struct PendingSession {
    session: u64,
    tx: oneshot::Sender<String>,
}

/// Interactive numbered selection over the chat transport.
///
/// `ask` is the engine's only suspension point tied to human input: it sends
/// the option list as one message and parks on a oneshot until the invoking
/// user's next message in that channel arrives via [`Disambiguator::deliver`]
/// or the deadline passes. The pending entry is torn down exactly once,
/// whichever terminal condition fires first.
pub struct Disambiguator {
    timeout: Duration,
    next_session: AtomicU64,
    pending: Mutex<HashMap<(ChannelId, UserId), PendingSession>>,
}

impl Disambiguator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            next_session: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Presents `options` (1..N plus the implicit "0. Cancel") and suspends
    /// until the invoking user replies in `channel` or the timeout elapses.
    pub async fn ask(
        &self,
        notifier: &dyn Notifier,
        channel: &ChannelId,
        user: &UserId,
        prompt: &str,
        options: &[SelectOption],
    ) -> Result<Selection> {
        let mut text = String::from(prompt);
        for option in options {
            text.push('\n');
            text.push_str(&option.label);
        }
        text.push_str("\n\n0. Cancel");

        let key = (channel.clone(), user.clone());
        let session = self.next_session.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            // A newer prompt for the same user supersedes a stale one.
            pending.insert(key.clone(), PendingSession { session, tx });
        }

        if let Err(e) = notifier.send(channel, &text).await {
            self.teardown(&key, session).await;
            return Err(e);
        }
        tracing::debug!("Selection session {} open for user {}", session, user);

        let outcome = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(content)) => interpret(&content, options),
            // Sender dropped: this session was superseded.
            Ok(Err(_)) => Selection::Cancelled,
            Err(_) => Selection::TimedOut,
        };
        self.teardown(&key, session).await;
        tracing::debug!("Selection session {} resolved: {:?}", session, outcome);
        Ok(outcome)
    }

    /// Routes an inbound chat message to a waiting session, if any. Returns
    /// true when the message was consumed as a selection reply.
    pub async fn deliver(&self, channel: &ChannelId, user: &UserId, content: &str) -> bool {
        let session = {
            let mut pending = self.pending.lock().await;
            pending.remove(&(channel.clone(), user.clone()))
        };
        match session {
            Some(s) => s.tx.send(content.to_string()).is_ok(),
            None => false,
        }
    }

    /// Removes the pending entry, but only if it still belongs to `session`
    /// (a newer session under the same key must survive).
    async fn teardown(&self, key: &(ChannelId, UserId), session: u64) {
        let mut pending = self.pending.lock().await;
        if pending.get(key).is_some_and(|p| p.session == session) {
            pending.remove(key);
        }
    }
}

/// Maps the first whitespace-delimited token of a reply to an outcome.
fn interpret(content: &str, options: &[SelectOption]) -> Selection {
    let Some(token) = content.split_whitespace().next() else {
        return Selection::Invalid;
    };
    if token == "0" {
        return Selection::Cancelled;
    }
    match options
        .iter()
        .position(|o| o.selectors.iter().any(|s| s.eq_ignore_ascii_case(token)))
    {
        Some(position) => Selection::Chosen(position),
        None => Selection::Invalid,
    }
}
