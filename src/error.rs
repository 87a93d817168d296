use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid target date {input:?}: {reason}")]
    Target { input: String, reason: String },

    #[error("invalid card deck {}: {reason}", path.display())]
    Deck { path: PathBuf, reason: String },
}
