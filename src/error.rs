// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types of this crate.
//!
//! - [`TrackerError`]s are returned by the [`Tracker`] for lookups of unknown
//!   or already registered files and tests.
//! - [`TemplateError`]s describe why a template couldn't be rendered. They
//!   never leave [`Formatter::format()`], which falls back to the literal
//!   template text instead.
//! - [`ReporterError`] wraps both an output failure and a [`TrackerError`] for
//!   the [`Reporter`], which logs and swallows it.
//!
//! [`Formatter::format()`]: crate::Formatter::format
//! [`Reporter`]: crate::Reporter
//! [`Tracker`]: crate::Tracker

use std::io;

use derive_more::with_trait::{Display, Error, From};

/// Lookup errors of a [`Tracker`].
///
/// [`Tracker`]: crate::Tracker
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum TrackerError {
    /// Test was registered for a file that wasn't initialized.
    #[display("unknown file: {file_id}")]
    UnknownFile {
        /// ID of the missing file.
        #[error(not(source))]
        file_id: String,
    },

    /// Update references a test that was never registered.
    #[display("unknown test: {test_id}")]
    UnknownTest {
        /// ID of the missing test.
        #[error(not(source))]
        test_id: String,
    },

    /// File with the same ID is already initialized.
    #[display("file is already initialized: {file_id}")]
    DuplicateFile {
        /// ID of the duplicated file.
        #[error(not(source))]
        file_id: String,
    },

    /// Test with the same ID is already registered.
    #[display("test is already registered: {test_id}")]
    DuplicateTest {
        /// ID of the duplicated test.
        #[error(not(source))]
        test_id: String,
    },
}

impl TrackerError {
    /// Creates a new [`TrackerError::UnknownFile`].
    #[must_use]
    pub fn unknown_file(file_id: impl Into<String>) -> Self {
        Self::UnknownFile {
            file_id: file_id.into(),
        }
    }

    /// Creates a new [`TrackerError::UnknownTest`].
    #[must_use]
    pub fn unknown_test(test_id: impl Into<String>) -> Self {
        Self::UnknownTest {
            test_id: test_id.into(),
        }
    }

    /// Indicates whether this error is caused by a missing file or test.
    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        matches!(self, Self::UnknownFile { .. } | Self::UnknownTest { .. })
    }
}

/// Result type alias for [`Tracker`] operations.
///
/// [`Tracker`]: crate::Tracker
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Reasons a template placeholder couldn't be rendered.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum TemplateError {
    /// Expression doesn't parse.
    #[display("syntax error at {position}: {message}")]
    Syntax {
        /// What went wrong.
        #[error(not(source))]
        message: String,

        /// Byte offset inside the expression.
        position: usize,
    },

    /// Expression references a name that isn't in the data record.
    #[display("{name} is not defined")]
    Reference {
        /// Undefined name.
        #[error(not(source))]
        name: String,
    },

    /// Runtime type error, like calling a non-function.
    #[display("type error: {message}")]
    Type {
        /// What went wrong.
        #[error(not(source))]
        message: String,
    },

    /// Style is absent from the [`STYLES`] registry.
    ///
    /// [`STYLES`]: crate::style::STYLES
    #[display("unknown style: {name}")]
    UnknownStyle {
        /// Requested style name.
        #[error(not(source))]
        name: String,
    },
}

impl TemplateError {
    /// Creates a new [`TemplateError::Syntax`].
    #[must_use]
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Creates a new [`TemplateError::Reference`].
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference { name: name.into() }
    }

    /// Creates a new [`TemplateError::Type`].
    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }
}

/// Result type alias for template evaluation.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors of a [`Reporter`] event handling.
///
/// [`Reporter`]: crate::Reporter
#[derive(Debug, Display, Error, From)]
pub enum ReporterError {
    /// Writing into the output failed.
    #[display("output failed: {_0}")]
    Io(io::Error),

    /// [`Tracker`] rejected an update.
    ///
    /// [`Tracker`]: crate::Tracker
    #[display("tracker rejected update: {_0}")]
    Tracker(TrackerError),
}

/// Result type alias for [`Reporter`] operations.
///
/// [`Reporter`]: crate::Reporter
pub type ReporterResult<T> = Result<T, ReporterError>;
