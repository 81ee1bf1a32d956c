// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for writing output.

use std::{borrow::Cow, io, str};

use console::{Style, Term};
use derive_more::with_trait::{Deref, DerefMut, Display, From};

/// Line-based sink status lines are written into.
pub trait Output {
    /// Writes the given `text` verbatim, without adding a newline.
    ///
    /// # Errors
    ///
    /// If the underlying writer fails.
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Erases `rows` lines, starting from the current one and moving up,
    /// leaving the cursor at the start of the topmost erased line.
    ///
    /// # Errors
    ///
    /// If the underlying writer fails.
    fn clear_line(&mut self, rows: usize) -> io::Result<()>;

    /// Indicates whether this [`Output`] is an interactive terminal.
    fn is_term(&self) -> bool {
        false
    }
}

/// [`Output`] writing into an [`io::Write`]r.
#[derive(Clone, Debug)]
pub struct Console<W = Term> {
    writer: W,
    is_term: bool,
}

impl Console {
    /// Creates a new [`Console`] writing into [`Term::stdout()`].
    #[must_use]
    pub fn stdout() -> Self {
        let term = Term::stdout();
        Self {
            is_term: term.is_term(),
            writer: term,
        }
    }
}

impl<W: io::Write> Console<W> {
    /// Creates a new [`Console`] writing into the given `writer`, which is
    /// considered non-interactive.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            is_term: false,
        }
    }

    /// Returns a reference to the underlying writer.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwraps this [`Console`] into its underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> Output for Console<W> {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_str(text)?;
        self.writer.flush()
    }

    fn clear_line(&mut self, rows: usize) -> io::Result<()> {
        self.writer.clear_rows(rows)?;
        self.writer.flush()
    }

    fn is_term(&self) -> bool {
        self.is_term
    }
}

/// [`Style`]s of the lines printed outside of templates.
#[derive(Clone, Debug)]
pub struct Styles {
    /// [`Style`] for rendering headers.
    pub header: Style,

    /// [`Style`] for rendering failures.
    pub err: Style,

    /// Indicates whether styles are applied at all.
    pub is_present: bool,
}

impl Styles {
    /// Creates new [`Styles`], applied only if `is_present` is `true`.
    #[must_use]
    pub fn new(is_present: bool) -> Self {
        Self {
            header: Style::new().dim(),
            err: Style::new().red(),
            is_present,
        }
    }

    /// If styles are present, dims `input`, or leaves it "as is" otherwise.
    #[must_use]
    pub fn header<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.header, input)
    }

    /// If styles are present, colors `input` with [`Styles::err`] color, or
    /// leaves it "as is" otherwise.
    #[must_use]
    pub fn err<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.err, input)
    }

    fn apply<'a>(
        &self,
        style: &Style,
        input: impl Into<Cow<'a, str>>,
    ) -> Cow<'a, str> {
        if self.is_present {
            style.apply_to(input.into()).force_styling(true).to_string().into()
        } else {
            input.into()
        }
    }
}

/// [`io::Write`] extension for easier manipulation with strings and special
/// sequences.
pub trait WriteStrExt: io::Write {
    /// Writes the given `string` into this writer.
    ///
    /// # Errors
    ///
    /// If this writer fails to write the given `string`.
    fn write_str(&mut self, string: impl AsRef<str>) -> io::Result<()> {
        self.write_all(string.as_ref().as_bytes())
    }

    /// Writes a special sequence into this writer moving a cursor up on `n`
    /// positions.
    ///
    /// # Errors
    ///
    /// If this writer fails to write a special sequence.
    fn move_cursor_up(&mut self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.write_str(format!("\x1b[{n}A"))
    }

    /// Writes a special sequence into this writer erasing the current line
    /// and returning the cursor to its start.
    ///
    /// # Errors
    ///
    /// If this writer fails to write a special sequence.
    fn clear_line(&mut self) -> io::Result<()> {
        self.write_str("\r\x1b[K")
    }

    /// Writes special sequences into this writer erasing `n` lines upwards
    /// from the current one.
    ///
    /// # Errors
    ///
    /// If this writer fails to write a special sequence.
    fn clear_rows(&mut self, n: usize) -> io::Result<()> {
        for row in 0..n {
            if row > 0 {
                self.move_cursor_up(1)?;
            }
            self.clear_line()?;
        }
        Ok(())
    }
}

impl<T: io::Write + ?Sized> WriteStrExt for T {}

/// [`String`] wrapper implementing [`io::Write`].
#[derive(
    Clone, Debug, Default, Deref, DerefMut, Display, Eq, From, PartialEq,
)]
pub struct WritableString(pub String);

impl io::Write for WritableString {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.push_str(
            str::from_utf8(buf)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        );
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
