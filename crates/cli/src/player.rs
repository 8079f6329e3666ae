//! Process-backed [`PlaybackCapability`] for macOS.
//!
//! Player commands go through `osascript`; native shortcuts go through `shortcuts run`. Each
//! child process is bounded by [`COMMAND_DEADLINE`] and by the run's [`CancelSignal`], and is
//! killed when either trips.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use roomcast_engine::{COMMAND_DEADLINE, CancelSignal, PlaybackCapability, Playlist};
use tracing::{debug, warn};

/// How often a running child is checked for completion.
const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct AppleScriptCapability {
    app: String,
    cancel: CancelSignal,
}

impl AppleScriptCapability {
    pub fn new(app: impl Into<String>, cancel: CancelSignal) -> Self {
        Self { app: app.into(), cancel }
    }

    fn tell(&self, body: &str) -> Result<String> {
        let script = format!("tell application {}\n{body}\nend tell", quote(&self.app));
        let mut command = Command::new("osascript");
        command.arg("-e").arg(script);
        run_process(command, self.command_budget(), &self.cancel).map(|output| output.trim().to_string())
    }

    fn command_budget(&self) -> Duration {
        self.cancel.remaining().map_or(COMMAND_DEADLINE, |remaining| remaining.min(COMMAND_DEADLINE))
    }
}

impl PlaybackCapability for AppleScriptCapability {
    fn set_outputs(&self, rooms: &[String]) -> Result<()> {
        let wanted = rooms.iter().map(|room| quote(room)).collect::<Vec<_>>().join(", ");
        self.tell(&format!(
            r#"set found to {{}}
repeat with deviceName in {{{wanted}}}
  set matchingDevices to (every AirPlay device whose name is (deviceName as text))
  if (count of matchingDevices) is 0 then error "AirPlay device not found: " & deviceName
  set end of found to item 1 of matchingDevices
end repeat
set current AirPlay devices to found"#
        ))
        .with_context(|| format!("failed to select outputs {}", rooms.join(", ")))?;
        Ok(())
    }

    fn set_volume(&self, room: &str, value: u8) -> Result<()> {
        self.tell(&format!("set sound volume of (first AirPlay device whose name is {}) to {value}", quote(room)))
            .with_context(|| format!("failed to set volume for {room}"))?;
        Ok(())
    }

    fn set_shuffle(&self, enabled: bool) -> Result<()> {
        self.tell(&format!("set shuffle enabled to {enabled}")).context("failed to set shuffle")?;
        Ok(())
    }

    fn search_playlists(&self, query: &str) -> Result<Vec<Playlist>> {
        let output = self.tell(&format!(
            r#"set output to ""
repeat with candidate in (every user playlist whose name contains {})
  set output to output & (persistent ID of candidate) & tab & (name of candidate) & linefeed
end repeat
return output"#,
            quote(query)
        ))?;
        Ok(parse_playlist_listing(&output))
    }

    fn playlist_name(&self, id: &str) -> Result<Option<String>> {
        let output = self.tell(&format!(
            r#"set matchingPlaylists to (every playlist whose persistent ID is {})
if (count of matchingPlaylists) is 0 then return ""
return name of item 1 of matchingPlaylists"#,
            quote(id)
        ))?;
        Ok(Some(output).filter(|name| !name.is_empty()))
    }

    fn play_playlist(&self, id: &str) -> Result<()> {
        self.tell(&format!("play (first playlist whose persistent ID is {})", quote(id)))
            .with_context(|| format!("failed to play playlist {id}"))?;
        Ok(())
    }

    fn run_shortcut(&self, name: &str) -> Result<()> {
        let mut command = Command::new("shortcuts");
        command.arg("run").arg(name);
        run_process(command, self.command_budget(), &self.cancel).with_context(|| format!("shortcut \"{name}\" failed"))?;
        Ok(())
    }

    fn playback_state(&self) -> Result<String> {
        self.tell("return player state as text")
    }

    fn stop(&self) -> Result<()> {
        self.tell("stop").context("failed to stop playback")?;
        Ok(())
    }
}

/// Run `command` to completion and return its stdout.
fn run_process(mut command: Command, budget: Duration, cancel: &CancelSignal) -> Result<String> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let deadline = Instant::now() + budget;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if let Err(cancelled) = cancel.check() {
            terminate(&mut child, &program);
            return Err(anyhow!(cancelled));
        }
        if Instant::now() >= deadline {
            terminate(&mut child, &program);
            bail!("{program} timed out after {}s", budget.as_secs_f32());
        }
        thread::sleep(CHILD_POLL_INTERVAL);
    };

    let stdout = stdout.join().map_err(|_| anyhow!("{program} stdout reader panicked"))?;
    let stderr = stderr.join().map_err(|_| anyhow!("{program} stderr reader panicked"))?;
    debug!(program = %program, status = %status, "child process finished");
    if !status.success() {
        let detail = stderr.trim();
        if detail.is_empty() {
            bail!("{program} exited with {status}");
        }
        bail!("{program} exited with {status}: {detail}");
    }
    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    })
}

fn terminate(child: &mut Child, program: &str) {
    if let Err(error) = child.kill() {
        warn!(program = %program, error = %error, "failed to kill child process");
    }
    let _ = child.wait();
}

/// AppleScript string literal for `text`.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Parse `id<TAB>name` lines.
fn parse_playlist_listing(output: &str) -> Vec<Playlist> {
    output
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(id, name)| Playlist {
            id: id.trim().to_string(),
            name: name.trim().to_string(),
        })
        .filter(|playlist| !playlist.id.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_applescript_strings() {
        assert_eq!(quote("Living Room"), "\"Living Room\"");
        assert_eq!(quote(r#"Say "hi" \o/"#), r#""Say \"hi\" \\o/""#);
    }

    #[test]
    fn parses_playlist_listing() {
        let playlists = parse_playlist_listing("A1\tMorning Jazz\nmalformed\nB2\tJazz Classics\n");
        assert_eq!(
            playlists,
            vec![
                Playlist {
                    id: "A1".into(),
                    name: "Morning Jazz".into()
                },
                Playlist {
                    id: "B2".into(),
                    name: "Jazz Classics".into()
                },
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn captures_child_output() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo hello");
        let output = run_process(command, Duration::from_secs(5), &CancelSignal::new()).expect("run sh");
        assert_eq!(output.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn reports_failing_children_with_stderr() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo nope >&2; exit 3");
        let error = run_process(command, Duration::from_secs(5), &CancelSignal::new()).expect_err("non-zero exit");
        assert!(error.to_string().ends_with("nope"), "{error}");
    }

    #[cfg(unix)]
    #[test]
    fn kills_children_that_outlive_their_budget() {
        let mut command = Command::new("sleep");
        command.arg("5");
        let started = Instant::now();
        let error = run_process(command, Duration::from_millis(100), &CancelSignal::new()).expect_err("timeout");
        assert!(error.to_string().contains("timed out"), "{error}");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn cancellation_kills_the_child() {
        let cancel = CancelSignal::new();
        cancel.interrupt();
        let mut command = Command::new("sleep");
        command.arg("5");
        let error = run_process(command, Duration::from_secs(5), &cancel).expect_err("cancelled");
        assert_eq!(error.to_string(), "routine interrupted");
    }
}
