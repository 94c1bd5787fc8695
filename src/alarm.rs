use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{error::RepeatError, time_codec::TimeOfDay};

static UID: AtomicU64 = AtomicU64::new(0);

/// Hands out process-unique alarm ids. Ids are never persisted, every load
/// gets fresh ones.
pub fn get_uid() -> u64 {
    UID.fetch_add(1, Ordering::Relaxed) + 1
}

/// What an alarm does once it has gone off (and was not snoozed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RepeatRecord", into = "RepeatRecord")]
pub enum Repeat {
    #[default]
    Once,
    Daily,
    IntervalMinutes(u32),
}

impl Repeat {
    /// # Errors
    /// Fails for an interval of zero minutes.
    pub const fn interval(minutes: u32) -> Result<Self, RepeatError> {
        if minutes == 0 {
            Err(RepeatError::ZeroInterval)
        } else {
            Ok(Self::IntervalMinutes(minutes))
        }
    }
}

impl FromStr for Repeat {
    type Err = RepeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("once") {
            Ok(Self::Once)
        } else if s.eq_ignore_ascii_case("daily") {
            Ok(Self::Daily)
        } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse()
                .map_err(|_| RepeatError::Unknown(s.to_string()))
                .and_then(Self::interval)
        } else {
            Err(RepeatError::Unknown(s.to_string()))
        }
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => f.write_str("once"),
            Self::Daily => f.write_str("daily"),
            Self::IntervalMinutes(minutes) => write!(f, "{minutes}"),
        }
    }
}

/// On disk a repeat is either a keyword or a bare number of minutes.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RepeatRecord {
    Minutes(u32),
    Keyword(String),
}

impl TryFrom<RepeatRecord> for Repeat {
    type Error = RepeatError;

    fn try_from(record: RepeatRecord) -> Result<Self, Self::Error> {
        match record {
            RepeatRecord::Minutes(minutes) => Self::interval(minutes),
            RepeatRecord::Keyword(keyword) => keyword.parse(),
        }
    }
}

impl From<Repeat> for RepeatRecord {
    fn from(repeat: Repeat) -> Self {
        match repeat {
            Repeat::Once => Self::Keyword("once".to_string()),
            Repeat::Daily => Self::Keyword("daily".to_string()),
            Repeat::IntervalMinutes(minutes) => Self::Minutes(minutes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        })
    }
}

/// A scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub time: TimeOfDay,
    pub message: String,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub status: Status,
    /// when set this is checked instead of `time`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snooze_until: Option<TimeOfDay>,
    /// the minute this alarm last went off, so it rings at most once per minute
    #[serde(skip)]
    pub last_fired: Option<NaiveDateTime>,
    #[serde(skip, default = "get_uid")]
    pub id: u64,
}

impl Alarm {
    #[must_use]
    pub fn new(time: TimeOfDay, message: impl Into<String>, repeat: Repeat) -> Self {
        Self {
            time,
            message: message.into(),
            repeat,
            status: Status::Active,
            snooze_until: None,
            last_fired: None,
            id: get_uid(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// The minute the monitor is waiting for.
    #[must_use]
    pub fn next_target(&self) -> TimeOfDay {
        self.snooze_until.unwrap_or(self.time)
    }

    /// Applies a user edit, keeping the id and runtime state.
    pub fn apply_edit(&mut self, edit: AlarmEdit) {
        match edit {
            AlarmEdit::Time(time) => {
                // a new time supersedes whatever was pending
                self.time = time;
                self.snooze_until = None;
                self.last_fired = None;
                self.status = Status::Active;
            }
            AlarmEdit::Message(message) => self.message = message,
        }
    }
}

/// A change the user can make to an existing alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmEdit {
    Time(TimeOfDay),
    Message(String),
}
