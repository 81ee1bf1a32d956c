// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Incremental statistics of a test run.
//!
//! [`Tracker`] keeps per-file counters and updates them on every legal
//! [`TestState`] transition, so answering aggregate queries never rescans
//! individual tests.

use std::collections::HashMap;

use derive_more::with_trait::Display;
use linked_hash_map::LinkedHashMap;

use crate::{
    error::{TrackerError, TrackerResult},
    snapshot::{Clock, Snapshot, SystemClock},
};

/// State of a single test.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum TestState {
    /// Test has no result yet.
    #[display("pending")]
    Pending,

    /// Test passed.
    #[display("pass")]
    Pass,

    /// Test failed.
    #[display("fail")]
    Fail,
}

/// Counters of a single file.
///
/// `passed + failed + pending` always equals the number of tests registered
/// for the file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileStats {
    /// Name of the file to display.
    pub name: String,

    /// Number of passed tests.
    pub passed: usize,

    /// Number of failed tests.
    pub failed: usize,

    /// Number of tests without a result yet.
    pub pending: usize,
}

impl FileStats {
    /// Returns the number of tests registered for the file.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.pending
    }

    /// Classifies the file by its counters.
    ///
    /// A file without any passed test is [`FileStatus::Pending`], even if it
    /// has no tests at all.
    #[must_use]
    pub const fn status(&self) -> FileStatus {
        if self.failed > 0 {
            FileStatus::Failed
        } else if self.pending > 0 || self.passed == 0 {
            FileStatus::Pending
        } else {
            FileStatus::Passed
        }
    }

    fn counter(&mut self, state: TestState) -> &mut usize {
        match state {
            TestState::Pending => &mut self.pending,
            TestState::Pass => &mut self.passed,
            TestState::Fail => &mut self.failed,
        }
    }
}

/// Classification of a file by its counters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileStatus {
    /// All the tests passed.
    Passed,

    /// At least one test failed.
    Failed,

    /// No failures, but some tests are still pending or none passed yet.
    Pending,
}

/// Aggregated test counters of a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TestStats {
    /// Number of passed tests.
    pub passed_tests: usize,

    /// Number of failed tests.
    pub failed_tests: usize,

    /// Number of tests without a result yet.
    pub pending_tests: usize,

    /// Number of registered tests.
    pub total_tests: usize,
}

impl TestStats {
    fn counter(&mut self, state: TestState) -> &mut usize {
        match state {
            TestState::Pending => &mut self.pending_tests,
            TestState::Pass => &mut self.passed_tests,
            TestState::Fail => &mut self.failed_tests,
        }
    }
}

/// Number of files per [`FileStatus`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FilesStats {
    /// Number of [`FileStatus::Passed`] files.
    pub passed_files: usize,

    /// Number of [`FileStatus::Failed`] files.
    pub failed_files: usize,

    /// Number of [`FileStatus::Pending`] files.
    pub pending_files: usize,

    /// Number of initialized files.
    pub total_files: usize,
}

#[derive(Clone, Debug)]
struct TestRecord {
    file_id: String,
    state: TestState,
}

/// Tracker of test and file statistics of a single run.
#[derive(Debug)]
pub struct Tracker<C = SystemClock> {
    clock: C,
    start_time: u64,
    files: LinkedHashMap<String, FileStats>,
    tests: HashMap<String, TestRecord>,
    totals: TestStats,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    /// Creates a new [`Tracker`] reading the system time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> Tracker<C> {
    /// Creates a new [`Tracker`] reading time from the given [`Clock`].
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        let start_time = clock.now_millis();
        Self {
            clock,
            start_time,
            files: LinkedHashMap::new(),
            tests: HashMap::new(),
            totals: TestStats::default(),
        }
    }

    /// Resets the start time and forgets all the files and tests.
    pub fn init_stats(&mut self) {
        self.start_time = self.clock.now_millis();
        self.files.clear();
        self.tests.clear();
        self.totals = TestStats::default();
    }

    /// Initializes a file with zeroed counters.
    ///
    /// # Errors
    ///
    /// With [`TrackerError::DuplicateFile`] if the file is already
    /// initialized. Its counters stay untouched then.
    pub fn initialize_file(
        &mut self,
        file_id: impl Into<String>,
        name: impl Into<String>,
    ) -> TrackerResult<()> {
        let file_id = file_id.into();
        if self.files.contains_key(&file_id) {
            return Err(TrackerError::DuplicateFile { file_id });
        }
        _ = self.files.insert(
            file_id,
            FileStats {
                name: name.into(),
                ..FileStats::default()
            },
        );
        Ok(())
    }

    /// Registers a pending test of an initialized file.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::UnknownFile`] if the file isn't initialized.
    /// - [`TrackerError::DuplicateTest`] if the test is already registered.
    pub fn register_test(
        &mut self,
        test_id: impl Into<String>,
        file_id: &str,
    ) -> TrackerResult<()> {
        let test_id = test_id.into();
        let file = self
            .files
            .get_mut(file_id)
            .ok_or_else(|| TrackerError::unknown_file(file_id))?;
        if self.tests.contains_key(&test_id) {
            return Err(TrackerError::DuplicateTest { test_id });
        }

        file.pending += 1;
        self.totals.pending_tests += 1;
        self.totals.total_tests += 1;
        _ = self.tests.insert(
            test_id,
            TestRecord {
                file_id: file_id.to_owned(),
                state: TestState::Pending,
            },
        );
        Ok(())
    }

    /// Moves a pending test into the given `state`.
    ///
    /// Only `pending -> pass` and `pending -> fail` transitions are applied.
    /// Anything else (a repeated result, a result of an already resolved
    /// test, or a `state` of [`TestState::Pending`]) changes nothing.
    ///
    /// Returns whether the counters were updated.
    ///
    /// # Errors
    ///
    /// With [`TrackerError::UnknownTest`] if the test isn't registered.
    pub fn update_test_state(
        &mut self,
        test_id: &str,
        state: TestState,
    ) -> TrackerResult<bool> {
        let test = self
            .tests
            .get_mut(test_id)
            .ok_or_else(|| TrackerError::unknown_test(test_id))?;

        if state == TestState::Pending || test.state != TestState::Pending {
            tracing::debug!(
                test_id,
                from = %test.state,
                to = %state,
                "ignored illegal test state transition"
            );
            return Ok(false);
        }

        let file = self
            .files
            .get_mut(&test.file_id)
            .ok_or_else(|| TrackerError::unknown_file(&test.file_id))?;
        *file.counter(test.state) -= 1;
        *file.counter(state) += 1;
        *self.totals.counter(test.state) -= 1;
        *self.totals.counter(state) += 1;
        test.state = state;
        Ok(true)
    }

    /// Returns the aggregated test counters.
    #[must_use]
    pub const fn aggregate_stats(&self) -> TestStats {
        self.totals
    }

    /// Classifies all the initialized files.
    #[must_use]
    pub fn file_classification(&self) -> FilesStats {
        self.files.values().fold(
            FilesStats {
                total_files: self.files.len(),
                ..FilesStats::default()
            },
            |mut acc, file| {
                match file.status() {
                    FileStatus::Passed => acc.passed_files += 1,
                    FileStatus::Failed => acc.failed_files += 1,
                    FileStatus::Pending => acc.pending_files += 1,
                }
                acc
            },
        )
    }

    /// Takes a [`Snapshot`] of the current statistics.
    ///
    /// If `include_end` is `true`, the [`Snapshot`] also carries the end
    /// time of the run.
    #[must_use]
    pub fn snapshot(&self, include_end: bool) -> Snapshot {
        Snapshot::new(
            self.aggregate_stats(),
            self.file_classification(),
            self.start_time,
            self.clock.now_millis(),
            include_end,
        )
    }

    /// Returns the time the run started at, in milliseconds since the Unix
    /// epoch.
    #[must_use]
    pub const fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Returns the counters of the given file, if it's initialized.
    #[must_use]
    pub fn file_stats(&self, file_id: &str) -> Option<&FileStats> {
        self.files.get(file_id)
    }

    /// Iterates over the initialized files in their initialization order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &FileStats)> {
        self.files.iter().map(|(id, stats)| (id.as_str(), stats))
    }

    /// Returns the state of the given test, if it's registered.
    #[must_use]
    pub fn test_state(&self, test_id: &str) -> Option<TestState> {
        self.tests.get(test_id).map(|t| t.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> Tracker<fn() -> u64> {
        fn now() -> u64 {
            1_000
        }
        let mut t = Tracker::with_clock(now as fn() -> u64);
        t.initialize_file("f1", "a.spec.ts").unwrap();
        t.register_test("t1", "f1").unwrap();
        t.register_test("t2", "f1").unwrap();
        t
    }

    fn assert_consistent<C: Clock>(t: &Tracker<C>) {
        let mut sum = TestStats::default();
        for (_, f) in t.files() {
            sum.passed_tests += f.passed;
            sum.failed_tests += f.failed;
            sum.pending_tests += f.pending;
            sum.total_tests += f.total();
        }
        assert_eq!(sum, t.aggregate_stats());
    }

    #[test]
    fn registers_pending_tests() {
        let t = tracker();
        assert_eq!(t.file_stats("f1").map(FileStats::total), Some(2));
        assert_eq!(t.file_stats("f1").map(|f| f.pending), Some(2));
        assert_eq!(t.test_state("t1"), Some(TestState::Pending));
        assert_eq!(t.aggregate_stats().total_tests, 2);
        assert_consistent(&t);
    }

    #[test]
    fn applies_legal_transitions_once() {
        let mut t = tracker();
        assert_eq!(t.update_test_state("t1", TestState::Pass), Ok(true));
        assert_eq!(t.update_test_state("t1", TestState::Pass), Ok(false));
        assert_eq!(t.update_test_state("t1", TestState::Fail), Ok(false));
        assert_eq!(t.update_test_state("t2", TestState::Pending), Ok(false));

        let f = t.file_stats("f1").unwrap();
        assert_eq!((f.passed, f.failed, f.pending), (1, 0, 1));
        assert_eq!(t.test_state("t1"), Some(TestState::Pass));
        assert_consistent(&t);
    }

    #[test]
    fn rejects_unknown_ids() {
        let mut t = tracker();
        assert_eq!(
            t.register_test("t3", "nope"),
            Err(TrackerError::unknown_file("nope")),
        );
        assert_eq!(
            t.update_test_state("nope", TestState::Fail),
            Err(TrackerError::unknown_test("nope")),
        );
        assert_consistent(&t);
    }

    #[test]
    fn rejects_duplicates() {
        let mut t = tracker();
        assert_eq!(
            t.initialize_file("f1", "other"),
            Err(TrackerError::DuplicateFile {
                file_id: "f1".into(),
            }),
        );
        assert_eq!(
            t.file_stats("f1").map(|f| f.name.as_str()),
            Some("a.spec.ts"),
        );
        assert_eq!(
            t.register_test("t1", "f1"),
            Err(TrackerError::DuplicateTest {
                test_id: "t1".into(),
            }),
        );
        assert_eq!(t.aggregate_stats().total_tests, 2);
    }

    #[test]
    fn classifies_files() {
        let mut t = tracker();
        t.initialize_file("empty", "empty.spec.ts").unwrap();
        t.initialize_file("f2", "b.spec.ts").unwrap();
        t.register_test("t3", "f2").unwrap();
        t.update_test_state("t3", TestState::Pass).unwrap();

        assert_eq!(
            t.file_classification(),
            FilesStats {
                passed_files: 1,
                failed_files: 0,
                pending_files: 2,
                total_files: 3,
            },
        );

        t.update_test_state("t1", TestState::Fail).unwrap();
        assert_eq!(t.file_classification().failed_files, 1);
        assert_eq!(t.file_classification().pending_files, 1);
    }

    #[test]
    fn init_stats_resets_everything() {
        let mut t = tracker();
        t.init_stats();
        assert_eq!(t.aggregate_stats(), TestStats::default());
        assert_eq!(t.file_classification(), FilesStats::default());
        assert_eq!(t.test_state("t1"), None);
        assert_eq!(t.start_time(), 1_000);
    }

    #[test]
    fn keeps_file_order() {
        let mut t = tracker();
        t.initialize_file("z", "z.spec.ts").unwrap();
        t.initialize_file("b", "b.spec.ts").unwrap();
        let ids: Vec<_> = t.files().map(|(id, _)| id).collect();
        assert_eq!(ids, ["f1", "z", "b"]);
    }
}
