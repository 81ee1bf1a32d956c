// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Point-in-time reads of a [`Tracker`] and the time source they use.
//!
//! [`Tracker`]: crate::Tracker

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    tracker::{FilesStats, TestStats},
    value::TemplateData,
};

/// Source of the current time, in milliseconds since the Unix epoch.
///
/// Any `Fn() -> u64` closure is a [`Clock`], which is handy for
/// deterministic tests.
pub trait Clock {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// [`Clock`] reading the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl<F: Fn() -> u64> Clock for F {
    fn now_millis(&self) -> u64 {
        self()
    }
}

/// Aggregated statistics of a run together with timing fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot {
    /// Aggregated test counters.
    pub tests: TestStats,

    /// Classification of files.
    pub files: FilesStats,

    /// Time the run started at, in milliseconds since the Unix epoch.
    pub start_time: u64,

    /// Time this [`Snapshot`] was taken at, in milliseconds since the Unix
    /// epoch.
    pub timestamp: u64,

    /// Whole seconds passed since [`Snapshot::start_time`], rounded.
    pub duration: u64,

    /// Time the run ended at. Only present in end-of-run [`Snapshot`]s.
    pub end_time: Option<u64>,

    /// Whole seconds the run took. Only present in end-of-run
    /// [`Snapshot`]s.
    pub total_time: Option<u64>,
}

impl Snapshot {
    /// Creates a new [`Snapshot`] taken at `now`.
    #[must_use]
    pub fn new(
        tests: TestStats,
        files: FilesStats,
        start_time: u64,
        now: u64,
        include_end: bool,
    ) -> Self {
        let duration = rounded_seconds(now.saturating_sub(start_time));
        Self {
            tests,
            files,
            start_time,
            timestamp: now,
            duration,
            end_time: include_end.then_some(now),
            total_time: include_end.then_some(duration),
        }
    }

    /// Indicates whether any test of the run failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.tests.failed_tests > 0
    }

    /// Converts this [`Snapshot`] into the [`TemplateData`] templates are
    /// rendered against.
    #[must_use]
    pub fn to_data(&self) -> TemplateData {
        let data = TemplateData::new()
            .with("passedTests", self.tests.passed_tests)
            .with("failedTests", self.tests.failed_tests)
            .with("pendingTests", self.tests.pending_tests)
            .with("totalTests", self.tests.total_tests)
            .with("passedFiles", self.files.passed_files)
            .with("failedFiles", self.files.failed_files)
            .with("pendingFiles", self.files.pending_files)
            .with("totalFiles", self.files.total_files)
            .with("startTime", self.start_time)
            .with("timestamp", self.timestamp)
            .with("duration", self.duration)
            .with("elapsedTime", self.duration);
        match (self.end_time, self.total_time) {
            (Some(end), Some(total)) => {
                data.with("endTime", end).with("totalTime", total)
            }
            _ => data,
        }
    }
}

impl From<&Snapshot> for TemplateData {
    fn from(snapshot: &Snapshot) -> Self {
        snapshot.to_data()
    }
}

/// Converts milliseconds into whole seconds, rounding half up.
const fn rounded_seconds(millis: u64) -> u64 {
    millis.saturating_add(500) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn stats() -> (TestStats, FilesStats) {
        (
            TestStats {
                passed_tests: 3,
                failed_tests: 1,
                pending_tests: 0,
                total_tests: 4,
            },
            FilesStats {
                passed_files: 1,
                failed_files: 1,
                pending_files: 0,
                total_files: 2,
            },
        )
    }

    #[test]
    fn rounds_duration_to_whole_seconds() {
        let (t, f) = stats();
        assert_eq!(Snapshot::new(t, f, 1_000, 2_499, false).duration, 1);
        assert_eq!(Snapshot::new(t, f, 1_000, 2_500, false).duration, 2);
        assert_eq!(Snapshot::new(t, f, 5_000, 1_000, false).duration, 0);
    }

    #[test]
    fn end_fields_only_at_end() {
        let (t, f) = stats();

        let progress = Snapshot::new(t, f, 0, 3_000, false).to_data();
        assert_eq!(progress.lookup("endTime"), None);
        assert_eq!(progress.lookup("totalTime"), None);
        assert_eq!(progress.lookup("elapsedTime"), Some(&Value::from(3)));

        let end = Snapshot::new(t, f, 0, 3_000, true).to_data();
        assert_eq!(end.lookup("endTime"), Some(&Value::from(3_000)));
        assert_eq!(end.lookup("totalTime"), Some(&Value::from(3)));
    }

    #[test]
    fn exposes_all_counters() {
        let (t, f) = stats();
        let data = Snapshot::new(t, f, 10, 10, false).to_data();
        for (name, expected) in [
            ("passedTests", 3),
            ("failedTests", 1),
            ("pendingTests", 0),
            ("totalTests", 4),
            ("passedFiles", 1),
            ("failedFiles", 1),
            ("pendingFiles", 0),
            ("totalFiles", 2),
            ("startTime", 10),
            ("timestamp", 10),
            ("duration", 0),
        ] {
            assert_eq!(
                data.lookup(name),
                Some(&Value::from(expected)),
                "{name}",
            );
        }
    }

    #[test]
    fn closures_are_clocks() {
        let clock = || 42_u64;
        assert_eq!(clock.now_millis(), 42);
        assert!(SystemClock.now_millis() > 0);
    }
}
