use std::{
    io,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_VOLUME: u8 = 50;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no music track configured")]
    NoTrack,
    #[error("music track not found: {0}")]
    MissingTrack(PathBuf),
    #[error("no audio player found (tried {0})")]
    NoPlayer(String),
    #[error("failed to start {player}: {source}")]
    Spawn {
        player: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Something that can loop a track in the background.
pub trait AudioBackend {
    fn play(&mut self, track: &Path, volume: u8) -> Result<(), AudioError>;
    fn pause(&mut self);
    /// False once playback has ended on its own.
    fn is_active(&mut self) -> bool {
        true
    }
}

/// Loops the track through whichever command-line player is installed.
#[derive(Default)]
pub struct CommandPlayer {
    child: Option<Child>,
}

const PLAYERS: &[&str] = &["mpv", "ffplay", "mplayer"];

fn player_args(player: &str, volume: u8) -> Vec<String> {
    let volume = volume.to_string();
    match player {
        "mpv" => vec!["--no-video".into(), "--really-quiet".into(), "--loop=inf".into(), format!("--volume={}", volume)],
        "ffplay" => vec!["-nodisp".into(), "-loglevel".into(), "quiet".into(), "-loop".into(), "0".into(), "-volume".into(), volume],
        _ => vec!["-really-quiet".into(), "-loop".into(), "0".into(), "-volume".into(), volume],
    }
}

impl CommandPlayer {
    fn is_running(&mut self) -> bool {
        match self.child.as_mut().map(|c| c.try_wait()) {
            Some(Ok(None)) => true,
            _ => false,
        }
    }
}

impl AudioBackend for CommandPlayer {
    fn play(&mut self, track: &Path, volume: u8) -> Result<(), AudioError> {
        if self.is_running() {
            return Ok(());
        }
        if !track.exists() {
            return Err(AudioError::MissingTrack(track.to_path_buf()));
        }

        for &player in PLAYERS {
            let spawned = Command::new(player)
                .args(player_args(player, volume))
                .arg(track)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match spawned {
                Ok(child) => {
                    debug!(player, pid = child.id(), "music player started");
                    self.child = Some(child);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(AudioError::Spawn { player, source }),
            }
        }

        Err(AudioError::NoPlayer(PLAYERS.join(", ")))
    }

    fn pause(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn is_active(&mut self) -> bool {
        self.is_running()
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        self.pause();
    }
}

/// Background music toggle. Playback failures are never fatal: they are
/// logged and the toggle stays in the paused state.
pub struct Music {
    backend: Box<dyn AudioBackend>,
    track: Option<PathBuf>,
    volume: u8,
    playing: bool,
    interacted: bool,
}

impl Music {
    pub fn new(backend: Box<dyn AudioBackend>, track: Option<PathBuf>, volume: u8) -> Self {
        Self {
            backend,
            track,
            volume: volume.min(100),
            playing: false,
            interacted: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn try_play(&mut self) -> Result<(), AudioError> {
        let track = self.track.as_deref().ok_or(AudioError::NoTrack)?;
        self.backend.play(track, self.volume)?;
        self.playing = true;
        info!(track = %track.display(), volume = self.volume, "music playing");
        Ok(())
    }

    /// Unsolicited start at launch; a refusal just leaves music paused.
    pub fn autoplay(&mut self) {
        if let Err(e) = self.try_play() {
            warn!(error = %e, "auto-play prevented");
            self.playing = false;
        }
    }

    pub fn toggle(&mut self) {
        self.interacted = true;
        if self.playing {
            self.backend.pause();
            self.playing = false;
            info!("music paused");
        } else {
            self.autoplay();
        }
    }

    /// Retries playback on the first click anywhere, once.
    pub fn first_interaction(&mut self) {
        if self.interacted {
            return;
        }
        self.interacted = true;
        if !self.playing {
            self.autoplay();
        }
    }

    /// Notices a player that exited by itself and flips the toggle off.
    pub fn sync(&mut self) {
        if self.playing && !self.backend.is_active() {
            warn!("music player exited");
            self.playing = false;
        }
    }

    pub fn stop(&mut self) {
        if self.playing {
            self.backend.pause();
            self.playing = false;
        }
    }
}
