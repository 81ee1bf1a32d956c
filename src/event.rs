// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Key occurrences in a lifecycle of a test run, delivered by the host.
//!
//! The host emits [`Event`]s serially, in this order:
//!
//! 1. [`Event::RunInit`] once;
//! 2. [`Event::FileDiscovered`] and [`Event::TestResult`] in any order;
//! 3. [`Event::RunEnd`] once.

use derive_more::with_trait::Display;

use crate::tracker::TestState;

/// Lifecycle event of a test run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Run has started.
    RunInit,

    /// File was collected together with all its tests.
    FileDiscovered {
        /// Unique ID of the file.
        file_id: String,

        /// Path of the file, its last segment is displayed.
        display_path: String,

        /// Unique IDs of the tests of the file.
        test_ids: Vec<String>,
    },

    /// Test produced a result.
    TestResult {
        /// Unique ID of the test.
        test_id: String,

        /// Result of the test.
        outcome: TestOutcome,
    },

    /// Run has finished.
    RunEnd,
}

impl Event {
    /// Creates a new [`Event::FileDiscovered`].
    #[must_use]
    pub fn file_discovered<I, S>(
        file_id: impl Into<String>,
        display_path: impl Into<String>,
        test_ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::FileDiscovered {
            file_id: file_id.into(),
            display_path: display_path.into(),
            test_ids: test_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a new [`Event::TestResult`].
    #[must_use]
    pub fn test_result(
        test_id: impl Into<String>,
        outcome: TestOutcome,
    ) -> Self {
        Self::TestResult {
            test_id: test_id.into(),
            outcome,
        }
    }
}

/// Result of a single test, as reported by the host.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum TestOutcome {
    /// Test passed.
    #[display("passed")]
    Passed,

    /// Test failed.
    #[display("failed")]
    Failed,

    /// Test hasn't finished yet.
    #[display("pending")]
    Pending,

    /// Test was skipped.
    #[display("skipped")]
    Skipped,
}

impl TestOutcome {
    /// Returns the [`TestState`] this outcome resolves a test into, if any.
    ///
    /// [`TestOutcome::Pending`] and [`TestOutcome::Skipped`] resolve nothing.
    #[must_use]
    pub const fn resolved_state(self) -> Option<TestState> {
        match self {
            Self::Passed => Some(TestState::Pass),
            Self::Failed => Some(TestState::Fail),
            Self::Pending | Self::Skipped => None,
        }
    }
}
