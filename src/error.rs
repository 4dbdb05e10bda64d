use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerikitError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("a simulation session is already running")]
    AlreadyRunning,

    #[error("no active simulation session")]
    NoActiveSession,

    #[error("no working file selected")]
    NoWorkingFile,

    #[error("expected artifact missing: {0}")]
    MissingArtifact(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("session error: {0}")]
    Session(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("state file error: {0}")]
    State(String),

    #[error("GUI error: {0}")]
    Gui(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VerikitError>;
