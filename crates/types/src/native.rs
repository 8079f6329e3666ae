//! Shortcut tables used by the `native` backend.
//!
//! The native backend cannot address rooms directly. Instead the user maps each
//! `(room, playlist)` and `(room, volume)` pair to a named automation shortcut.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Room-keyed shortcut mappings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NativeShortcuts {
    /// room -> playlist name -> shortcut name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub playlists: IndexMap<String, IndexMap<String, String>>,
    /// room -> volume value -> shortcut name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub volumes: IndexMap<String, IndexMap<String, String>>,
}

impl NativeShortcuts {
    /// Shortcut that starts `playlist` in `room`.
    pub fn playlist_shortcut(&self, room: &str, playlist: &str) -> Option<&str> {
        lookup(&self.playlists, room)
            .and_then(|by_name| lookup(by_name, playlist))
            .map(String::as_str)
    }

    /// Shortcut that sets `room` to exactly `value`.
    pub fn volume_shortcut(&self, room: &str, value: u8) -> Option<&str> {
        lookup(&self.volumes, room).and_then(|by_value| by_value.get(&value.to_string()).map(String::as_str))
    }
}

/// Exact key match first, then a case-insensitive match.
fn lookup<'a, V>(map: &'a IndexMap<String, V>, key: &str) -> Option<&'a V> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn shortcuts() -> NativeShortcuts {
        NativeShortcuts {
            playlists: indexmap! {
                "Kitchen".to_string() => indexmap! {
                    "Morning Jazz".to_string() => "Kitchen Jazz".to_string(),
                },
            },
            volumes: indexmap! {
                "Kitchen".to_string() => indexmap! {
                    "30".to_string() => "Kitchen Volume 30".to_string(),
                },
            },
        }
    }

    #[test]
    fn resolves_playlist_shortcuts_ignoring_case() {
        let shortcuts = shortcuts();
        assert_eq!(shortcuts.playlist_shortcut("Kitchen", "Morning Jazz"), Some("Kitchen Jazz"));
        assert_eq!(shortcuts.playlist_shortcut("kitchen", "morning jazz"), Some("Kitchen Jazz"));
        assert_eq!(shortcuts.playlist_shortcut("Bedroom", "Morning Jazz"), None);
    }

    #[test]
    fn volume_shortcuts_require_the_exact_value() {
        let shortcuts = shortcuts();
        assert_eq!(shortcuts.volume_shortcut("Kitchen", 30), Some("Kitchen Volume 30"));
        assert_eq!(shortcuts.volume_shortcut("Kitchen", 31), None);
    }
}
