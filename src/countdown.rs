use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Target instant as a local date-time literal.
pub const TARGET_DATE_ISO: &str = "2025-12-27T09:00:00";
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(250);

const TARGET_FMT: &str = "%Y-%m-%dT%H:%M:%S";
const SECS_PER_DAY: i64 = 86_400;

/// Parses a `YYYY-MM-DDTHH:MM:SS` literal in the local timezone.
pub fn parse_target(input: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(input, TARGET_FMT).map_err(|e| Error::Target {
        input: input.into(),
        reason: e.to_string(),
    })?;

    // A wall time that falls in a DST gap has no local instant; ambiguous
    // times resolve to the earlier one.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| Error::Target {
            input: input.into(),
            reason: "does not exist in the local timezone".into(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Remaining {
    pub days: u64,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl Remaining {
    pub const ZERO: Self = Self { days: 0, hours: 0, minutes: 0, seconds: 0 };

    /// Breaks a millisecond distance into whole days/hours/minutes/seconds.
    /// Anything at or below zero collapses to all zeros.
    pub fn from_millis(ms_until: i64) -> Self {
        if ms_until <= 0 {
            return Self::ZERO;
        }

        let total = ms_until / 1000;
        let rem = total % SECS_PER_DAY;
        Self {
            days: (total / SECS_PER_DAY) as u64,
            hours: (rem / 3600) as u8,
            minutes: (rem % 3600 / 60) as u8,
            seconds: (rem % 60) as u8,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        ((self.days * 24 + self.hours as u64) * 60 + self.minutes as u64) * 60 + self.seconds as u64
    }

    /// Display strings for days, hours, minutes and seconds. Days are left
    /// unpadded, the rest get two digits.
    pub fn fields(&self) -> [String; 4] {
        [
            self.days.to_string(),
            pad(self.hours),
            pad(self.minutes),
            pad(self.seconds),
        ]
    }
}

fn pad(n: u8) -> String {
    format!("{:02}", n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    Counting,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownEffect {
    /// Emitted once, on the sample that latched the phase to Finished.
    Celebrate,
}

/// Remaining time to a fixed target, recomputed from each clock sample.
#[derive(Debug, Clone)]
pub struct CountdownEngine {
    target: DateTime<Local>,
    sample: DateTime<Local>,
    phase: CountdownPhase,
}

impl CountdownEngine {
    /// Creates the engine without sampling; call `sample` to take the first
    /// reading so a past target still produces its `Celebrate` effect.
    pub fn new(target: DateTime<Local>, now: DateTime<Local>) -> Self {
        Self {
            target,
            sample: now,
            phase: CountdownPhase::Counting,
        }
    }

    pub fn target(&self) -> DateTime<Local> {
        self.target
    }

    pub fn ms_until(&self) -> i64 {
        (self.target - self.sample).num_milliseconds()
    }

    pub fn sample(&mut self, now: DateTime<Local>) -> Vec<CountdownEffect> {
        self.sample = now;

        if self.phase == CountdownPhase::Counting && self.ms_until() <= 0 {
            self.phase = CountdownPhase::Finished;
            info!(target_at = %self.target, "countdown finished");
            return vec![CountdownEffect::Celebrate];
        }

        debug!(remaining_s = self.remaining().total_seconds(), "countdown sampled");
        Vec::new()
    }

    pub fn remaining(&self) -> Remaining {
        Remaining::from_millis(self.ms_until())
    }

    /// Latched: stays true after the first sample at or past the target,
    /// even if the clock is later set back.
    pub fn is_finished(&self) -> bool {
        self.phase == CountdownPhase::Finished
    }
}
