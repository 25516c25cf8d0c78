use crate::error::{EngineError, Result};
use crate::models::{
    normalize_name, Playlist, PlaylistSnapshot, RangeDirective, Track, UserId, UserPlaylists,
    MAX_PLAYLIST_ID_LEN, MAX_PLAYLIST_NAME_LEN,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// In-memory registry of every user's playlists.
///
/// Each user's records sit behind their own lock: mutations for the same
/// user serialize, mutations for different users run independently. The
/// outer map lock is only held long enough to fetch or insert an entry.
pub struct PlaylistStore {
    users: RwLock<HashMap<UserId, Arc<Mutex<UserPlaylists>>>>,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    async fn user_entry(&self, user: &UserId) -> Arc<Mutex<UserPlaylists>> {
        {
            let users = self.users.read().await;
            if let Some(entry) = users.get(user) {
                return entry.clone();
            }
        }
        let mut users = self.users.write().await;
        users.entry(user.clone()).or_default().clone()
    }

    pub async fn create_playlist(&self, user: &UserId, id: &str, name: &str) -> Result<()> {
        if id.chars().count() > MAX_PLAYLIST_ID_LEN {
            return Err(EngineError::Validation(format!(
                "Playlist ID exceeds maximum character length of `{MAX_PLAYLIST_ID_LEN}`!"
            )));
        }
        let name = normalize_name(name);
        if name.chars().count() > MAX_PLAYLIST_NAME_LEN {
            return Err(EngineError::Validation(format!(
                "Name exceeds maximum character length of `{MAX_PLAYLIST_NAME_LEN}`!"
            )));
        }

        let entry = self.user_entry(user).await;
        let mut playlists = entry.lock().await;
        if playlists.list.contains_key(id) {
            return Err(EngineError::Duplicate(format!(
                "You already have a playlist identified by `{id}`!"
            )));
        }
        playlists.list.insert(id.to_string(), Playlist::new(id, &name));
        playlists.num += 1;
        tracing::info!("Created playlist '{}' ({}) for user {}", name, id, user);
        Ok(())
    }

    pub async fn add_tracks(&self, user: &UserId, id: &str, tracks: Vec<Track>) -> Result<()> {
        let entry = self.user_entry(user).await;
        let mut playlists = entry.lock().await;
        let playlist = playlists
            .list
            .get_mut(id)
            .ok_or_else(|| unknown_playlist(id))?;
        tracing::debug!(
            "Appending {} tracks to playlist '{}' of user {}",
            tracks.len(),
            id,
            user
        );
        playlist.tracks.extend(tracks);
        playlist.updated_at = Utc::now();
        Ok(())
    }

    /// Removes the slice addressed by `directive`. Out-of-range bounds clamp
    /// and remove nothing rather than failing.
    pub async fn remove_range(
        &self,
        user: &UserId,
        id: &str,
        directive: RangeDirective,
    ) -> Result<()> {
        let entry = self.user_entry(user).await;
        let mut playlists = entry.lock().await;
        let playlist = playlists
            .list
            .get_mut(id)
            .ok_or_else(|| unknown_playlist(id))?;
        let (start, end) = directive.removal_bounds(playlist.tracks.len());
        playlist.tracks.drain(start..end);
        playlist.updated_at = Utc::now();
        tracing::debug!(
            "Removed [{}, {}) from playlist '{}' of user {}",
            start,
            end,
            id,
            user
        );
        Ok(())
    }

    pub async fn delete_playlist(&self, user: &UserId, id: &str) -> Result<()> {
        let entry = self.user_entry(user).await;
        let mut playlists = entry.lock().await;
        if playlists.list.remove(id).is_none() {
            return Err(unknown_playlist(id));
        }
        playlists.num -= 1;
        tracing::info!("Deleted playlist '{}' of user {}", id, user);
        Ok(())
    }

    /// Finds the owner of a playlist id across all users. Deliberately not
    /// scoped to the requester: any user may reference any playlist.
    pub async fn lookup_by_playlist_id(&self, id: &str) -> Option<(UserId, Playlist)> {
        let users = self.users.read().await;
        for (user, entry) in users.iter() {
            let playlists = entry.lock().await;
            if let Some(playlist) = playlists.list.get(id) {
                return Some((user.clone(), playlist.clone()));
            }
        }
        None
    }

    /// Serializable snapshot of a playlist for external rendering. Read-only.
    pub async fn export(&self, id: &str) -> Option<PlaylistSnapshot> {
        self.lookup_by_playlist_id(id)
            .await
            .map(|(owner, playlist)| PlaylistSnapshot {
                id: playlist.id.clone(),
                name: playlist.name.clone(),
                owner,
                size: playlist.size(),
                tracks: playlist.tracks,
            })
    }

    pub async fn user_playlists(&self, user: &UserId) -> Vec<Playlist> {
        let entry = self.user_entry(user).await;
        let playlists = entry.lock().await;
        let mut list: Vec<Playlist> = playlists.list.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    /// Server-wide view: every playlist with its owner. The transport narrows
    /// this to the members it wants to show.
    pub async fn all_playlists(&self) -> Vec<(UserId, Playlist)> {
        let users = self.users.read().await;
        let mut all = Vec::new();
        for (user, entry) in users.iter() {
            let playlists = entry.lock().await;
            for playlist in playlists.list.values() {
                all.push((user.clone(), playlist.clone()));
            }
        }
        all.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at));
        all
    }

    pub async fn playlist_count(&self, user: &UserId) -> usize {
        let entry = self.user_entry(user).await;
        let playlists = entry.lock().await;
        playlists.num
    }
}

impl Default for PlaylistStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_playlist(id: &str) -> EngineError {
    EngineError::NotFound(format!("You don't have a playlist identified by `{id}`!"))
}
