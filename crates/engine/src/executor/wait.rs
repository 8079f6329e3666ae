//! Polling for `wait` steps.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use roomcast_types::PlaybackState;
use tracing::{debug, info, warn};

use super::{CancelSignal, PlaybackCapability};

/// Delay between playback state queries.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Granularity of the sleep between polls, bounding how late a cancellation is noticed.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Block until the player reports `state`, the timeout passes, or the run is cancelled.
pub(crate) fn wait_for_state(
    capability: &dyn PlaybackCapability,
    state: PlaybackState,
    timeout_label: &str,
    timeout: Duration,
    cancel: &CancelSignal,
) -> Result<()> {
    poll_until(capability, state, timeout_label, timeout, POLL_INTERVAL, cancel)
}

fn poll_until(
    capability: &dyn PlaybackCapability,
    state: PlaybackState,
    timeout_label: &str,
    timeout: Duration,
    interval: Duration,
    cancel: &CancelSignal,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let reported = capability.playback_state()?;
        if state.matches(&reported) {
            info!(state = %state, attempts, "wait step reached state");
            return Ok(());
        }
        debug!(state = %state, reported = %reported, attempts, "wait step polling");

        if Instant::now() > deadline {
            warn!(state = %state, attempts, "wait step timed out");
            bail!("timed out after {timeout_label} waiting for state {state}");
        }
        sleep_observing(interval, cancel)?;
    }
}

fn sleep_observing(interval: Duration, cancel: &CancelSignal) -> Result<()> {
    let wake_at = Instant::now() + interval;
    loop {
        cancel.check()?;
        let now = Instant::now();
        if now >= wake_at {
            return Ok(());
        }
        thread::sleep(SLEEP_SLICE.min(wake_at - now));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::executor::Playlist;

    /// Reports the queued states in order, repeating the last one.
    struct ScriptedPlayer {
        states: RefCell<Vec<&'static str>>,
        polls: Cell<u32>,
    }

    impl ScriptedPlayer {
        fn new(states: &[&'static str]) -> Self {
            Self {
                states: RefCell::new(states.iter().rev().copied().collect()),
                polls: Cell::new(0),
            }
        }
    }

    impl PlaybackCapability for ScriptedPlayer {
        fn set_outputs(&self, _rooms: &[String]) -> Result<()> {
            Ok(())
        }
        fn set_volume(&self, _room: &str, _value: u8) -> Result<()> {
            Ok(())
        }
        fn set_shuffle(&self, _enabled: bool) -> Result<()> {
            Ok(())
        }
        fn search_playlists(&self, _query: &str) -> Result<Vec<Playlist>> {
            Ok(Vec::new())
        }
        fn playlist_name(&self, _id: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn play_playlist(&self, _id: &str) -> Result<()> {
            Ok(())
        }
        fn run_shortcut(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        fn playback_state(&self) -> Result<String> {
            self.polls.set(self.polls.get() + 1);
            let mut states = self.states.borrow_mut();
            let state = if states.len() > 1 { states.pop() } else { states.last().copied() };
            match state {
                Some(state) => Ok(state.to_string()),
                None => bail!("player unavailable"),
            }
        }
        fn stop(&self) -> Result<()> {
            Ok(())
        }
    }

    const FAST: Duration = Duration::from_millis(5);

    #[test]
    fn succeeds_on_first_matching_poll() {
        let player = ScriptedPlayer::new(&["Playing"]);
        let outcome = poll_until(&player, PlaybackState::Playing, "1s", Duration::from_secs(1), FAST, &CancelSignal::new());
        assert!(outcome.is_ok());
        assert_eq!(player.polls.get(), 1);
    }

    #[test]
    fn keeps_polling_until_the_state_matches() {
        let player = ScriptedPlayer::new(&["stopped", "paused", "playing"]);
        let outcome = poll_until(&player, PlaybackState::Playing, "1s", Duration::from_secs(1), FAST, &CancelSignal::new());
        assert!(outcome.is_ok());
        assert_eq!(player.polls.get(), 3);
    }

    #[test]
    fn times_out_with_a_descriptive_error() {
        let player = ScriptedPlayer::new(&["paused"]);
        let error = poll_until(&player, PlaybackState::Playing, "20ms", Duration::from_millis(20), FAST, &CancelSignal::new())
            .expect_err("wait should time out");
        assert_eq!(error.to_string(), "timed out after 20ms waiting for state playing");
        assert!(player.polls.get() >= 2);
    }

    #[test]
    fn state_query_errors_fail_the_wait() {
        let player = ScriptedPlayer::new(&[]);
        let error = poll_until(&player, PlaybackState::Playing, "1s", Duration::from_secs(1), FAST, &CancelSignal::new())
            .expect_err("query failure should propagate");
        assert_eq!(error.to_string(), "player unavailable");
    }

    #[test]
    fn cancellation_interrupts_the_sleep() {
        let player = ScriptedPlayer::new(&["paused"]);
        let cancel = CancelSignal::new();
        cancel.interrupt();
        let error = poll_until(&player, PlaybackState::Playing, "10m", Duration::from_secs(600), POLL_INTERVAL, &cancel)
            .expect_err("cancelled wait should fail");
        assert_eq!(error.to_string(), "routine interrupted");
        assert_eq!(player.polls.get(), 1);
    }
}
