// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Splitting of templates into literal text and placeholders.

use lazy_regex::regex_captures;

use super::expr::find_closing_brace;

/// Piece of a template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment<'t> {
    /// Literal text, emitted as is.
    Text(&'t str),

    /// `${expression}` placeholder.
    Expr {
        /// Whole placeholder including `${` and `}`.
        source: &'t str,

        /// Expression between the braces.
        body: &'t str,
    },

    /// `{name}` or `{name:style1.style2}` placeholder.
    Placeholder {
        /// Whole placeholder including the braces.
        source: &'t str,

        /// Name of the substituted value.
        name: &'t str,

        /// Styles to apply, in the listed order.
        styles: Vec<&'t str>,
    },
}

impl<'t> Segment<'t> {
    /// Returns the template text this [`Segment`] was cut from.
    #[must_use]
    pub const fn source(&self) -> &'t str {
        match self {
            Self::Text(source)
            | Self::Expr { source, .. }
            | Self::Placeholder { source, .. } => *source,
        }
    }
}

/// Splits the given `template` into [`Segment`]s.
///
/// A backslash right before `{` or `${` is dropped and the following
/// opening sequence is kept as literal text. Unterminated `${` and braces
/// not forming a placeholder are literal text too.
#[must_use]
pub fn segments(template: &str) -> Vec<Segment<'_>> {
    let bytes = template.as_bytes();
    let mut out = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    let flush = |out: &mut Vec<_>, from: usize, to: usize| {
        if from < to {
            out.push(Segment::Text(&template[from..to]));
        }
    };

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes[i + 1..].starts_with(b"${") => {
                flush(&mut out, text_start, i);
                text_start = i + 1;
                i += 3;
            }
            b'\\' if bytes[i + 1..].starts_with(b"{") => {
                flush(&mut out, text_start, i);
                text_start = i + 1;
                i += 2;
            }
            b'$' if bytes[i + 1..].starts_with(b"{") => {
                let Some(close) = find_closing_brace(template, i + 2) else {
                    i += 2;
                    continue;
                };
                flush(&mut out, text_start, i);
                out.push(Segment::Expr {
                    source: &template[i..=close],
                    body: &template[i + 2..close],
                });
                i = close + 1;
                text_start = i;
            }
            b'{' => {
                let Some((source, name, styles)) = regex_captures!(
                    r"^\{([A-Za-z_$][\w$]*)(?::([\w$]+(?:\.[\w$]+)*))?\}",
                    &template[i..],
                ) else {
                    i += 1;
                    continue;
                };
                flush(&mut out, text_start, i);
                out.push(Segment::Placeholder {
                    source,
                    name,
                    styles: if styles.is_empty() {
                        vec![]
                    } else {
                        styles.split('.').collect()
                    },
                });
                i += source.len();
                text_start = i;
            }
            _ => i += 1,
        }
    }
    flush(&mut out, text_start, bytes.len());
    out
}
