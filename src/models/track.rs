use serde::{Deserialize, Serialize};
use std::fmt;

/// External media platform a track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    YouTube,
    SoundCloud,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::YouTube => f.write_str("YouTube"),
            Provider::SoundCloud => f.write_str("SoundCloud"),
        }
    }
}

/// A single playable track reference. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub url: String,
    pub provider: Provider,
}

impl Track {
    pub fn new(title: impl Into<String>, url: impl Into<String>, provider: Provider) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            provider,
        }
    }
}
