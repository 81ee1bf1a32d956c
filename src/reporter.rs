// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Reporter`] rendering lifecycle [`Event`]s as live status lines.

use crate::{
    config::{ClearMode, Config},
    error::{ReporterError, ReporterResult},
    event::{Event, TestOutcome},
    format::Formatter,
    out::{Console, Output, Styles},
    snapshot::{Clock, Snapshot, SystemClock},
    tracker::Tracker,
};

/// Lifecycle state of a [`Reporter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// Run hasn't started yet.
    Idle,

    /// Run is in progress.
    Running,

    /// Summary has been printed.
    Finished,
}

/// Orchestrator wiring lifecycle [`Event`]s into a [`Tracker`] and printing
/// rendered templates into an [`Output`].
///
/// The `progress` line is reprinted in place on every discovered file and
/// every passed or failed test. Once the run ends, the [`ClearMode`]
/// decides which of the printed lines are erased before the summary.
///
/// Errors never escape [`Reporter::handle_event()`]: they are logged with
/// [`tracing`] and the run goes on.
#[derive(Debug)]
pub struct Reporter<O = Console, C = SystemClock> {
    output: O,
    tracker: Tracker<C>,
    formatter: Formatter,
    styles: Styles,
    config: Config,
    state: State,

    /// Lines of the `start` template.
    start_rows: usize,

    /// Lines of the `progress` template.
    progress_rows: usize,

    start_printed: bool,
    progress_printed: bool,
}

impl Reporter {
    /// Creates a new [`Reporter`] printing into the standard output.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_output(config, Console::stdout())
    }
}

impl<O: Output> Reporter<O> {
    /// Creates a new [`Reporter`] printing into the given [`Output`].
    #[must_use]
    pub fn with_output(config: Config, output: O) -> Self {
        Self::with_clock(config, output, SystemClock)
    }
}

impl<O: Output, C: Clock> Reporter<O, C> {
    /// Creates a new [`Reporter`] printing into the given [`Output`] and
    /// reading time from the given [`Clock`].
    #[must_use]
    pub fn with_clock(config: Config, output: O, clock: C) -> Self {
        let colored = config.coloring.resolve(output.is_term());
        Self {
            formatter: Formatter::new(colored).with_fallback(config.fallback),
            styles: Styles::new(colored),
            start_rows: config.templates.start.as_deref().map_or(0, line_count),
            progress_rows: line_count(&config.templates.progress),
            output,
            tracker: Tracker::with_clock(clock),
            config,
            state: State::Idle,
            start_printed: false,
            progress_printed: false,
        }
    }

    /// Returns the current [`State`].
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Returns the [`Tracker`] of the run.
    #[must_use]
    pub const fn tracker(&self) -> &Tracker<C> {
        &self.tracker
    }

    /// Returns the [`Config`] of this [`Reporter`].
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the [`Formatter`] rendering templates.
    #[must_use]
    pub const fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Returns the [`Output`] lines are printed into.
    #[must_use]
    pub const fn output(&self) -> &O {
        &self.output
    }

    /// Unwraps this [`Reporter`] into its [`Output`].
    #[must_use]
    pub fn into_output(self) -> O {
        self.output
    }

    /// Handles the given [`Event`], logging any error.
    pub fn handle_event(&mut self, event: Event) {
        if let Err(e) = self.try_handle_event(event) {
            tracing::warn!(error = %e, "failed to handle test run event");
        }
    }

    /// Handles the given [`Event`].
    ///
    /// Events arriving in a [`State`] they don't apply to are ignored.
    ///
    /// # Errors
    ///
    /// - [`ReporterError::Tracker`] if the [`Event`] references an unknown
    ///   or duplicated file or test. The progress line is still reprinted.
    /// - [`ReporterError::Io`] if printing fails.
    pub fn try_handle_event(&mut self, event: Event) -> ReporterResult<()> {
        match event {
            Event::RunInit => self.run_init(),
            Event::FileDiscovered {
                file_id,
                display_path,
                test_ids,
            } => self.file_discovered(&file_id, &display_path, &test_ids),
            Event::TestResult { test_id, outcome } => {
                self.test_result(&test_id, outcome)
            }
            Event::RunEnd => self.run_end(),
        }
    }

    /// Starts a new run, printing the `start` template if there is one.
    ///
    /// # Errors
    ///
    /// If printing fails.
    pub fn run_init(&mut self) -> ReporterResult<()> {
        tracing::debug!(from = ?self.state, "test run started");

        self.tracker.init_stats();
        self.state = State::Running;
        self.start_printed = false;
        self.progress_printed = false;

        if let Some(start) = &self.config.templates.start {
            let data = self.tracker.snapshot(false).to_data();
            let line = self.formatter.format(start, &data);
            self.output.print(&line)?;
            self.output.print("\n")?;
            self.start_printed = true;
        }
        Ok(())
    }

    /// Registers a discovered file with all its tests, and reprints the
    /// progress line.
    ///
    /// The last `/` separated segment of the `display_path` is used as the
    /// file name.
    ///
    /// # Errors
    ///
    /// - [`ReporterError::Tracker`] if the file or any of its tests is
    ///   already registered.
    /// - [`ReporterError::Io`] if printing fails.
    pub fn file_discovered<S: AsRef<str>>(
        &mut self,
        file_id: &str,
        display_path: &str,
        test_ids: &[S],
    ) -> ReporterResult<()> {
        if self.state == State::Finished {
            tracing::debug!(file_id, "ignored file discovered after run end");
            return Ok(());
        }

        let name = display_path
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or(file_id);
        let mut result = self.tracker.initialize_file(file_id, name);
        if result.is_ok() {
            for test_id in test_ids {
                let registered =
                    self.tracker.register_test(test_id.as_ref(), file_id);
                result = result.and(registered);
            }
        }

        self.print_progress()?;
        result.map_err(ReporterError::from)
    }

    /// Records the `outcome` of a test and reprints the progress line.
    ///
    /// [`TestOutcome::Pending`] and [`TestOutcome::Skipped`] are ignored
    /// completely, without reprinting.
    ///
    /// # Errors
    ///
    /// - [`ReporterError::Tracker`] if the test is unknown.
    /// - [`ReporterError::Io`] if printing fails.
    pub fn test_result(
        &mut self,
        test_id: &str,
        outcome: TestOutcome,
    ) -> ReporterResult<()> {
        if self.state == State::Finished {
            tracing::debug!(test_id, "ignored test result after run end");
            return Ok(());
        }
        let Some(state) = outcome.resolved_state() else {
            return Ok(());
        };

        let result = self.tracker.update_test_state(test_id, state);
        self.print_progress()?;
        result.map(drop).map_err(ReporterError::from)
    }

    /// Finishes the run: erases lines according to the [`ClearMode`] and
    /// prints the summary.
    ///
    /// Does nothing unless the run is in progress.
    ///
    /// # Errors
    ///
    /// If printing fails.
    pub fn run_end(&mut self) -> ReporterResult<()> {
        if self.state != State::Running {
            tracing::debug!(state = ?self.state, "ignored run end");
            return Ok(());
        }
        self.state = State::Finished;

        let snapshot = self.tracker.snapshot(true);
        self.clear_before_summary()?;

        let summary = if snapshot.has_failures() {
            &self.config.templates.failure
        } else {
            &self.config.templates.success
        };
        let data = snapshot.to_data();
        self.output.print(&self.formatter.format(summary, &data))?;
        self.output.print("\n")?;

        if self.config.failed_files && snapshot.has_failures() {
            self.print_failed_files()?;
        }
        if let Some(end) = &self.config.templates.end {
            self.output.print(&self.formatter.format(end, &data))?;
            self.output.print("\n")?;
        }

        tracing::debug!(
            passed = snapshot.tests.passed_tests,
            failed = snapshot.tests.failed_tests,
            pending = snapshot.tests.pending_tests,
            "test run finished"
        );
        Ok(())
    }

    /// Takes a [`Snapshot`] of the current run.
    #[must_use]
    pub fn snapshot(&self, include_end: bool) -> Snapshot {
        self.tracker.snapshot(include_end)
    }

    fn print_progress(&mut self) -> ReporterResult<()> {
        let data = self.tracker.snapshot(false).to_data();
        let line =
            self.formatter.format(&self.config.templates.progress, &data);
        if self.progress_printed {
            self.output.clear_line(self.progress_rows)?;
        }
        self.output.print(&line)?;
        self.progress_printed = true;
        Ok(())
    }

    fn clear_before_summary(&mut self) -> ReporterResult<()> {
        let progress = self.progress_printed.then_some(self.progress_rows);
        let start = self.start_printed.then_some(self.start_rows);

        let rows = match self.config.clear_mode {
            ClearMode::None => {
                if self.progress_printed {
                    self.output.print("\n")?;
                }
                return Ok(());
            }
            ClearMode::Progress => progress.unwrap_or(0),
            // Cursor sits on the empty line below `start` if no progress
            // was printed.
            ClearMode::ProgressAndStart => match (progress, start) {
                (Some(p), s) => p + s.unwrap_or(0),
                (None, Some(s)) => s + 1,
                (None, None) => 0,
            },
        };
        if rows > 0 {
            self.output.clear_line(rows)?;
        }
        Ok(())
    }

    fn print_failed_files(&mut self) -> ReporterResult<()> {
        let mut listing = format!("{}\n", self.styles.header("Failed files:"));
        for (_, file) in self.tracker.files().filter(|(_, f)| f.failed > 0) {
            let line = format!(
                "- {}: {} failed, {} passed",
                file.name, file.failed, file.passed,
            );
            listing.push_str(&self.styles.err(line));
            listing.push('\n');
        }
        self.output.print(&listing)?;
        Ok(())
    }
}

/// Returns the number of terminal rows the given `template` occupies.
fn line_count(template: &str) -> usize {
    1 + template.matches('\n').count()
}
