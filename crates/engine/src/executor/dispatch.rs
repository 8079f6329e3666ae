//! Maps a resolved step onto capability calls for its backend.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use roomcast_types::{Backend, ResolvedParams, ResolvedStep, TransportAction};
use roomcast_util::best_match;
use tracing::debug;

use super::{ExecutionContext, wait};

pub(crate) fn dispatch(step: &ResolvedStep, context: &ExecutionContext<'_>) -> Result<()> {
    let capability = context.capability;
    match &step.resolved {
        ResolvedParams::Outputs { backend, rooms } => match backend {
            Backend::Airplay => capability.set_outputs(rooms),
            Backend::Native => bail!("out.set is not supported by the native backend"),
        },
        ResolvedParams::Play {
            backend: Backend::Airplay,
            rooms,
            playlist_id,
            query,
            volume,
            shuffle,
        } => {
            if !rooms.is_empty() {
                capability.set_outputs(rooms)?;
            }
            if let Some(volume) = volume {
                for room in rooms {
                    capability.set_volume(room, *volume)?;
                }
            }
            if let Some(shuffle) = shuffle {
                capability.set_shuffle(*shuffle)?;
            }
            let playlist_id = match (playlist_id, query) {
                (Some(playlist_id), _) => playlist_id.clone(),
                (None, Some(query)) => search_playlist(context, query)?,
                (None, None) => bail!("play requires either query or playlistId"),
            };
            capability.play_playlist(&playlist_id)
        }
        ResolvedParams::Play {
            backend: Backend::Native,
            rooms,
            playlist_id,
            query,
            ..
        } => {
            let playlist_name = match (query, playlist_id) {
                (Some(query), _) => query.clone(),
                (None, Some(playlist_id)) => capability
                    .playlist_name(playlist_id)?
                    .ok_or_else(|| anyhow!("unknown playlist id \"{playlist_id}\""))?,
                (None, None) => bail!("play requires either query or playlistId"),
            };
            if rooms.is_empty() {
                bail!("native play requires at least one room");
            }
            let shortcuts = rooms
                .iter()
                .map(|room| {
                    context
                        .shortcuts
                        .playlist_shortcut(room, &playlist_name)
                        .ok_or_else(|| anyhow!("no native shortcut mapped for room \"{room}\" and playlist \"{playlist_name}\""))
                })
                .collect::<Result<Vec<_>>>()?;
            run_shortcuts(context, &shortcuts)
        }
        ResolvedParams::Volume { backend, rooms, value } => {
            if rooms.is_empty() {
                bail!("volume.set requires at least one room from the step or the defaults");
            }
            match backend {
                Backend::Airplay => rooms.iter().try_for_each(|room| capability.set_volume(room, *value)),
                Backend::Native => {
                    let shortcuts = rooms
                        .iter()
                        .map(|room| {
                            context
                                .shortcuts
                                .volume_shortcut(room, *value)
                                .ok_or_else(|| anyhow!("no native volume shortcut mapped for room \"{room}\" at volume {value}"))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    run_shortcuts(context, &shortcuts)
                }
            }
        }
        ResolvedParams::Wait { state, timeout, timeout_ms } => {
            wait::wait_for_state(capability, *state, timeout, Duration::from_millis(*timeout_ms), context.cancel)
        }
        ResolvedParams::Transport {
            action: TransportAction::Stop,
        } => capability.stop(),
    }
}

/// Search with `query` and pick the closest playlist name.
fn search_playlist(context: &ExecutionContext<'_>, query: &str) -> Result<String> {
    let candidates = context
        .capability
        .search_playlists(query)
        .with_context(|| format!("playlist search for \"{query}\" failed"))?;
    let chosen = best_match(&candidates, query, |playlist| playlist.name.as_str())
        .ok_or_else(|| anyhow!("no playlists found matching \"{query}\""))?;
    debug!(query = %query, playlist_id = %chosen.id, playlist_name = %chosen.name, "playlist selected");
    Ok(chosen.id.clone())
}

fn run_shortcuts(context: &ExecutionContext<'_>, shortcuts: &[&str]) -> Result<()> {
    for shortcut in shortcuts {
        context.cancel.check()?;
        debug!(shortcut = %shortcut, "running native shortcut");
        context.capability.run_shortcut(shortcut)?;
    }
    Ok(())
}
