// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Live console progress and summary renderer for test runs.
//!
//! A [`Reporter`] receives lifecycle [`Event`]s of a test run from its host,
//! keeps pass/fail/pending counters in a [`Tracker`] and reprints a status
//! line rendered by a [`Formatter`] from a user-configurable template.
//!
//! ```rust
//! use text_reporter::{
//!     out::{Console, WritableString},
//!     Config, Coloring, Event, Reporter, TestOutcome,
//! };
//!
//! let config = Config::default()
//!     .with_progress("{passedTests}/{totalTests}")
//!     .with_success("done: {passedTests:green} passed")
//!     .with_coloring(Coloring::Never);
//! let mut reporter =
//!     Reporter::with_output(config, Console::new(WritableString::default()));
//!
//! reporter.handle_event(Event::RunInit);
//! reporter.handle_event(Event::file_discovered("f1", "tests/a.rs", ["t1"]));
//! reporter.handle_event(Event::test_result("t1", TestOutcome::Passed));
//! reporter.handle_event(Event::RunEnd);
//!
//! assert_eq!(
//!     reporter.into_output().into_inner().0,
//!     "0/1\r\x1b[K1/1\r\x1b[Kdone: 1 passed\n",
//! );
//! ```
//!
//! # Templates
//!
//! See the [`format`] module for both supported placeholder dialects.
//! Templates are rendered against the fields of a [`Snapshot`]:
//! `passedTests`, `failedTests`, `pendingTests`, `totalTests`,
//! `passedFiles`, `failedFiles`, `pendingFiles`, `totalFiles`, `startTime`,
//! `timestamp`, `duration` (also as `elapsedTime`), and, in the summary
//! only, `endTime` and `totalTime`.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(non_ascii_idents, unsafe_code)]

pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod out;
pub mod reporter;
pub mod snapshot;
pub mod style;
pub mod tracker;
pub mod value;

#[doc(inline)]
pub use self::{
    config::{ClearMode, Cli, Coloring, Config, Fallback, Templates},
    error::{
        ReporterError, ReporterResult, TemplateError, TemplateResult,
        TrackerError, TrackerResult,
    },
    event::{Event, TestOutcome},
    format::Formatter,
    out::{Console, Output},
    reporter::{Reporter, State},
    snapshot::{Clock, Snapshot, SystemClock},
    tracker::{FileStats, FileStatus, FilesStats, TestState, TestStats, Tracker},
    value::{TemplateData, Value},
};
