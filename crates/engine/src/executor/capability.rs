use anyhow::Result;
use serde::Serialize;

/// A playlist known to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
}

/// Side-effecting player operations a routine can reach.
///
/// The executor only talks to the player through this trait, so previews and tests can supply
/// their own implementation. Every call blocks until the player has acknowledged the command.
pub trait PlaybackCapability {
    /// Select `rooms` as the current output devices, replacing any previous selection.
    fn set_outputs(&self, rooms: &[String]) -> Result<()>;
    /// Set the volume of one room.
    fn set_volume(&self, room: &str, value: u8) -> Result<()>;
    fn set_shuffle(&self, enabled: bool) -> Result<()>;
    /// Playlists matching `query`, in the player's search order.
    fn search_playlists(&self, query: &str) -> Result<Vec<Playlist>>;
    /// Name of the playlist with identifier `id`, `None` when unknown.
    fn playlist_name(&self, id: &str) -> Result<Option<String>>;
    fn play_playlist(&self, id: &str) -> Result<()>;
    /// Run a named automation shortcut.
    fn run_shortcut(&self, name: &str) -> Result<()>;
    /// Current playback state as reported by the player (for example `playing`).
    fn playback_state(&self) -> Result<String>;
    fn stop(&self) -> Result<()>;
}
