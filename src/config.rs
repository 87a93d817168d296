use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::music::DEFAULT_VOLUME;

const APP_DIR: &str = "sweetdown";
pub const CONFIG_FILE: &str = "config.json";
pub const LOG_FILE: &str = "sweetdown.log";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Clone, Debug, Default)]
#[command(author, version, about = "💖 sweetdown - A Cute Terminal Countdown")]
pub struct Args {
    #[arg(short = 't', long)]
    pub theme: Option<String>,
    /// Track to loop in the background
    #[arg(short, long)]
    pub music: Option<PathBuf>,
    #[arg(long)]
    pub no_music: bool,
    #[arg(long)]
    pub no_notify: bool,
    /// JSON file with the three intro cards
    #[arg(short, long)]
    pub cards: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

// ============================================================================
// Config File
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub music_path: Option<PathBuf>,
    pub volume: u8,
    pub autoplay: bool,
    pub notifications: bool,
    pub cards_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "pastel".into(),
            music_path: Some(PathBuf::from("music.mp3")),
            volume: DEFAULT_VOLUME,
            autoplay: true,
            notifications: true,
            cards_path: None,
        }
    }
}

impl Config {
    /// CLI flags win over the file.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(t) = &args.theme { self.theme = t.clone(); }
        if let Some(m) = &args.music { self.music_path = Some(m.clone()); }
        if let Some(c) = &args.cards { self.cards_path = Some(c.clone()); }
        if args.no_music { self.autoplay = false; self.music_path = None; }
        if args.no_notify { self.notifications = false; }
    }
}

pub fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

pub fn get_path(filename: &str) -> PathBuf {
    let dir = app_dir();
    let _ = fs::create_dir_all(&dir);
    dir.join(filename)
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    fs::write(path, serde_json::to_string_pretty(data)?)
}

/// Loads the config, writing a template first if none exists yet.
pub fn load_or_init(path: &Path) -> io::Result<Config> {
    if !path.exists() {
        save_json(path, &Config::default())?;
    }
    Ok(load_json(path))
}
