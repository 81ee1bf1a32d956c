// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration of a [`Reporter`].
//!
//! [`Reporter`]: crate::Reporter

use std::str::FromStr;

use smart_default::SmartDefault;

pub use crate::format::Fallback;

/// Default `progress` template.
pub const DEFAULT_PROGRESS: &str = "${colors.green(`${passedTests} passed`)}, \
     ${colors.red(`${failedTests} failed`)}, \
     ${colors.yellow(`${pendingTests} pending`)}";

/// Default `success` template.
pub const DEFAULT_SUCCESS: &str =
    "All tests passed in {duration}s! \
     Files: {passedFiles}/{totalFiles} passed.";

/// Default `failure` template.
pub const DEFAULT_FAILURE: &str =
    "Some tests failed in {duration}s! \
     Files: {failedFiles}/{totalFiles} failed.";

/// Templates of the lines a [`Reporter`] prints.
///
/// [`Reporter`]: crate::Reporter
#[derive(Clone, Debug, Eq, PartialEq, SmartDefault)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default)
)]
pub struct Templates {
    /// Printed once the run starts.
    pub start: Option<String>,

    /// Reprinted in place on every discovered file and test result.
    #[default(DEFAULT_PROGRESS.to_owned())]
    pub progress: String,

    /// Printed at the end if no test failed.
    #[default(DEFAULT_SUCCESS.to_owned())]
    pub success: String,

    /// Printed at the end if any test failed.
    #[default(DEFAULT_FAILURE.to_owned())]
    pub failure: String,

    /// Printed after the summary line.
    pub end: Option<String>,
}

/// Rows erased before the final summary is printed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum ClearMode {
    /// Nothing is erased, the summary goes on a new line.
    #[cfg_attr(feature = "serde", serde(rename = "none"))]
    None,

    /// The progress block is erased.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "progress"))]
    Progress,

    /// Both the start and the progress blocks are erased.
    #[cfg_attr(feature = "serde", serde(rename = "progress+start"))]
    ProgressAndStart,
}

impl FromStr for ClearMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "progress" => Ok(Self::Progress),
            "progress+start" => Ok(Self::ProgressAndStart),
            _ => Err("possible options: none, progress, progress+start"),
        }
    }
}

/// Possible policies of a [`console`] output coloring.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Coloring {
    /// Letting [`console::colors_enabled()`] and the output terminal check
    /// decide whether output should be colored.
    #[default]
    Auto,

    /// Forcing of a colored output.
    Always,

    /// Forcing of a non-colored output.
    Never,
}

impl Coloring {
    /// Resolves this policy for an output, which is an interactive terminal
    /// if `is_term` is `true`.
    #[must_use]
    pub fn resolve(self, is_term: bool) -> bool {
        match self {
            Self::Auto => is_term && console::colors_enabled(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

impl FromStr for Coloring {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err("possible options: auto, always, never"),
        }
    }
}

/// Configuration of a [`Reporter`].
///
/// With the `serde` feature, deserializes from a record where every field is
/// optional and template fields sit at the top level:
///
/// ```json
/// { "progress": "{passedTests}/{totalTests}", "clearMode": "none" }
/// ```
///
/// [`Reporter`]: crate::Reporter
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct Config {
    /// Templates of the printed lines.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub templates: Templates,

    /// Rows erased before the summary.
    #[cfg_attr(feature = "serde", serde(alias = "clearOnEnd"))]
    pub clear_mode: ClearMode,

    /// Coloring policy.
    pub coloring: Coloring,

    /// Rendering of failed template placeholders.
    pub fallback: Fallback,

    /// Indicates whether files with failures are listed after the failure
    /// summary.
    pub failed_files: bool,
}

impl Config {
    /// Sets the `start` template.
    #[must_use]
    pub fn with_start(mut self, template: impl Into<String>) -> Self {
        self.templates.start = Some(template.into());
        self
    }

    /// Sets the `progress` template.
    #[must_use]
    pub fn with_progress(mut self, template: impl Into<String>) -> Self {
        self.templates.progress = template.into();
        self
    }

    /// Sets the `success` template.
    #[must_use]
    pub fn with_success(mut self, template: impl Into<String>) -> Self {
        self.templates.success = template.into();
        self
    }

    /// Sets the `failure` template.
    #[must_use]
    pub fn with_failure(mut self, template: impl Into<String>) -> Self {
        self.templates.failure = template.into();
        self
    }

    /// Sets the `end` template.
    #[must_use]
    pub fn with_end(mut self, template: impl Into<String>) -> Self {
        self.templates.end = Some(template.into());
        self
    }

    /// Sets the [`ClearMode`].
    #[must_use]
    pub fn with_clear_mode(mut self, mode: ClearMode) -> Self {
        self.clear_mode = mode;
        self
    }

    /// Sets the [`Coloring`] policy.
    #[must_use]
    pub fn with_coloring(mut self, coloring: Coloring) -> Self {
        self.coloring = coloring;
        self
    }

    /// Sets the [`Fallback`] policy.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Enables or disables listing of failed files.
    #[must_use]
    pub fn with_failed_files(mut self, enabled: bool) -> Self {
        self.failed_files = enabled;
        self
    }
}

/// CLI options of a [`Reporter`].
///
/// Only the options passed explicitly override a [`Config`].
///
/// [`Reporter`]: crate::Reporter
#[derive(Clone, Copy, Debug, Default, clap::Args)]
#[group(skip)]
pub struct Cli {
    /// Coloring policy for a console output.
    #[arg(long, value_name = "auto|always|never", global = true)]
    pub color: Option<Coloring>,

    /// Output erased before the final summary.
    #[arg(long, value_name = "none|progress|progress+start")]
    pub clear_on_end: Option<ClearMode>,

    /// List files with failed tests after the summary.
    #[arg(long)]
    pub failed_files: bool,
}

impl Cli {
    /// Applies these options over the given [`Config`].
    #[must_use]
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(coloring) = self.color {
            config = config.with_coloring(coloring);
        }
        if let Some(mode) = self.clear_on_end {
            config = config.with_clear_mode(mode);
        }
        let failed_files = self.failed_files || config.failed_files;
        config.with_failed_files(failed_files)
    }
}
