use std::{
    process::Stdio,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use log::{debug, warn};
use minishiur_core::{PlannerError, Player, PlayerEvent, Result, SourceId};
use tokio::{
    process::Command,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub yt_dlp: String,
    pub mpv: String,
}

pub fn watch_url(id: &SourceId) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

async fn tool_available(bin: &str) -> bool {
    Command::new(bin)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Player backed by `yt-dlp` (metadata) and `mpv` (playback).
pub struct ExternalPlayer {
    config: PlayerConfig,
    ready: bool,
    duration: Arc<Mutex<f64>>,
    cue_task: Option<JoinHandle<()>>,
    stop_playback: Option<oneshot::Sender<()>>,
    events: mpsc::Sender<PlayerEvent>,
}

impl ExternalPlayer {
    /// Probe the tools; `needs_playback` also requires `mpv`.
    pub async fn connect(
        config: PlayerConfig,
        events: mpsc::Sender<PlayerEvent>,
        needs_playback: bool,
    ) -> Self {
        let mut ready = tool_available(&config.yt_dlp).await;
        if !ready {
            warn!("{} is not available", config.yt_dlp);
        }
        if needs_playback && !tool_available(&config.mpv).await {
            warn!("{} is not available", config.mpv);
            ready = false;
        }
        Self::new(config, events, ready)
    }

    fn new(config: PlayerConfig, events: mpsc::Sender<PlayerEvent>, ready: bool) -> Self {
        Self {
            config,
            ready,
            duration: Arc::new(Mutex::new(0.0)),
            cue_task: None,
            stop_playback: None,
            events,
        }
    }

    fn set_duration(slot: &Mutex<f64>, value: f64) {
        if let Ok(mut d) = slot.lock() {
            *d = value;
        }
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop_playback.take() {
            let _ = stop.send(());
        }
    }
}

#[async_trait]
impl Player for ExternalPlayer {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn cue(&mut self, id: &SourceId) -> Result<()> {
        if let Some(task) = self.cue_task.take() {
            task.abort();
        }
        Self::set_duration(&self.duration, 0.0);

        let mut command = Command::new(&self.config.yt_dlp);
        command
            .arg("--skip-download")
            .arg("--print")
            .arg("duration")
            .arg(watch_url(id))
            .kill_on_drop(true);
        let slot = Arc::clone(&self.duration);
        let id = id.clone();

        self.cue_task = Some(tokio::spawn(async move {
            match command.output().await {
                Ok(out) if out.status.success() => {
                    let stdout = String::from_utf8_lossy(&out.stdout);
                    match stdout.trim().parse::<f64>() {
                        Ok(seconds) => Self::set_duration(&slot, seconds),
                        Err(_) => warn!("Unexpected duration output for {id}: {}", stdout.trim()),
                    }
                }
                Ok(out) => warn!(
                    "yt-dlp failed for {id}: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
                Err(e) => warn!("yt-dlp could not run for {id}: {e}"),
            }
        }));
        Ok(())
    }

    fn duration(&self) -> f64 {
        self.duration.lock().map(|d| *d).unwrap_or(0.0)
    }

    async fn load(&mut self, id: &SourceId, start: f64, end: f64) -> Result<()> {
        self.stop();

        let mut command = Command::new(&self.config.mpv);
        command
            .arg(format!("--start={start:.3}"))
            .arg(format!("--end={end:.3}"))
            .arg("--force-window=yes")
            .arg(watch_url(id))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        // Keep Ctrl-C away from mpv; the shutdown path stops it.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| PlannerError::Player {
                reason: format!("could not start {}: {e}", self.config.mpv),
            })?;
        debug!("Playing {id} from {start:.1}s to {end:.1}s");

        let (stop_tx, stop_rx) = oneshot::channel();
        let events = self.events.clone();
        tokio::spawn(async move {
            let exit = tokio::select! {
                status = child.wait() => Some(status),
                _ = stop_rx => None,
            };
            let event = match exit {
                Some(Ok(s)) if s.success() => PlayerEvent::Ended,
                Some(Ok(s)) => PlayerEvent::Error(format!("player exited with {s}")),
                Some(Err(e)) => PlayerEvent::Error(e.to_string()),
                None => {
                    let _ = child.kill().await;
                    return;
                }
            };
            let _ = events.send(event).await;
        });
        self.stop_playback = Some(stop_tx);
        Ok(())
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        self.stop();
        if let Some(task) = self.cue_task.take() {
            task.abort();
        }
    }
}
