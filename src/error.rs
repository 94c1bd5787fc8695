//! Error types for each concern of the reminder manager.
//!
//! None of these are fatal to the monitor loop; callers report them and
//! carry on.

use std::path::PathBuf;

use thiserror::Error;

/// Rejected time-of-day input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no time given")]
    Empty,
    #[error("expected {expected}, got {input:?}")]
    Malformed {
        input: String,
        expected: &'static str,
    },
    #[error("hour {0} is out of range")]
    HourOutOfRange(u32),
    #[error("minute {0} is out of range")]
    MinuteOutOfRange(u32),
    #[error("missing AM/PM in {0:?}")]
    MissingMeridiem(String),
}

/// Rejected repeat policy input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepeatError {
    #[error("repeat interval must be at least one minute")]
    ZeroInterval,
    #[error("unknown repeat {0:?}, expected once, daily or a number of minutes")]
    Unknown(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no alarm at index {index} ({len} alarms)")]
    NotFound { index: usize, len: usize },
    #[error("alarm {0} was removed")]
    Removed(u64),
}

/// Failure reading or writing the alarms file.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("couldn't access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("couldn't serialize alarms: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Failure playing the alarm sound.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("no audio output device: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("couldn't start playback: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("couldn't open sound file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't decode sound file: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("couldn't find a home directory for the config")]
    NoProjectDirs,
    #[error(transparent)]
    Persist(#[from] PersistError),
}
