// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rendering of status line templates.
//!
//! Two placeholder dialects are recognized in the same template:
//!
//! - `{name}`, `{name:style}` and `{name:style1.style2}` substitute a field
//!   of the [`TemplateData`], optionally wrapped into [`STYLES`]. Unknown
//!   names are left verbatim and unknown styles are skipped.
//! - `${expression}` evaluates an [`expr`]ession having the data fields and
//!   the `colors` namespace in scope.
//!
//! `\{` and `\${` escape a placeholder.
//!
//! [`STYLES`]: crate::style::STYLES

pub mod expr;
pub mod template;

use std::{borrow::Cow, str::FromStr};

use smart_default::SmartDefault;

use self::template::Segment;
use crate::{error::TemplateResult, style, value::TemplateData};

/// What a [`Formatter`] renders when a placeholder fails.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Fallback {
    /// Only the failing placeholder is left as its source text.
    #[default]
    Placeholder,

    /// The whole template is returned unchanged.
    Template,
}

impl FromStr for Fallback {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "placeholder" => Ok(Self::Placeholder),
            "template" => Ok(Self::Template),
            _ => Err("possible options: placeholder, template"),
        }
    }
}

/// Renderer of templates against [`TemplateData`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Formatter {
    /// Indicates whether styles emit ANSI sequences.
    #[default(true)]
    colored: bool,

    /// Policy for failed placeholders.
    fallback: Fallback,
}

impl Formatter {
    /// Creates a new [`Formatter`] with [`Fallback::Placeholder`] policy.
    #[must_use]
    pub const fn new(colored: bool) -> Self {
        Self {
            colored,
            fallback: Fallback::Placeholder,
        }
    }

    /// Sets the [`Fallback`] policy of this [`Formatter`].
    #[must_use]
    pub const fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Indicates whether this [`Formatter`] emits ANSI sequences.
    #[must_use]
    pub const fn is_colored(&self) -> bool {
        self.colored
    }

    /// Returns the [`Fallback`] policy of this [`Formatter`].
    #[must_use]
    pub const fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// Renders the given `template` against the given `data`.
    ///
    /// Never fails: a placeholder that can't be rendered is logged and
    /// replaced according to the [`Fallback`] policy.
    #[must_use]
    pub fn format(&self, template: &str, data: &TemplateData) -> String {
        let mut out = String::with_capacity(template.len());
        for segment in template::segments(template) {
            match self.render(&segment, data) {
                Ok(text) => out.push_str(&text),
                Err(e) => {
                    tracing::warn!(
                        template,
                        placeholder = segment.source(),
                        error = %e,
                        "failed to render template placeholder"
                    );
                    match self.fallback {
                        Fallback::Placeholder => out.push_str(segment.source()),
                        Fallback::Template => return template.to_owned(),
                    }
                }
            }
        }
        out
    }

    /// Renders the given `template` against the given `data`, stopping at
    /// the first failing placeholder.
    ///
    /// # Errors
    ///
    /// If any `${...}` placeholder fails to parse or evaluate.
    pub fn try_format(
        &self,
        template: &str,
        data: &TemplateData,
    ) -> TemplateResult<String> {
        template::segments(template)
            .iter()
            .map(|s| self.render(s, data))
            .collect()
    }

    fn render<'t>(
        &self,
        segment: &Segment<'t>,
        data: &TemplateData,
    ) -> TemplateResult<Cow<'t, str>> {
        match segment {
            Segment::Text(text) => Ok(Cow::Borrowed(*text)),
            Segment::Expr { body, .. } => {
                expr::evaluate(body, data, self.colored).map(Cow::Owned)
            }
            Segment::Placeholder {
                source,
                name,
                styles,
            } => {
                let Some(value) = data.lookup(name) else {
                    return Ok(Cow::Borrowed(*source));
                };
                let mut text = value.to_string();
                if self.colored {
                    // Innermost first.
                    for name in styles {
                        match style::lookup(name) {
                            Some(s) => text = s.paint(&text),
                            None => tracing::debug!(
                                style = name,
                                "unknown style skipped",
                            ),
                        }
                    }
                }
                Ok(Cow::Owned(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> TemplateData {
        TemplateData::new()
            .with("passedTests", 1)
            .with("failedTests", 0)
            .with("pendingTests", 1)
            .with("name", "John")
    }

    #[test]
    fn substitutes_brace_placeholders() {
        let f = Formatter::new(false);
        assert_eq!(
            f.format(
                "{passedTests} passed, {failedTests} failed, \
                 {pendingTests} pending",
                &data(),
            ),
            "1 passed, 0 failed, 1 pending",
        );
    }

    #[test]
    fn applies_styles_in_listed_order() {
        let f = Formatter::new(true);
        assert_eq!(
            f.format("{name:red.bold}", &data()),
            "\x1b[1m\x1b[31mJohn\x1b[39m\x1b[22m",
        );
        assert_eq!(
            f.format("{name:sparkly.red}", &data()),
            "\x1b[31mJohn\x1b[39m",
        );
    }

    #[test]
    fn leaves_unknown_brace_names_verbatim() {
        let f = Formatter::new(true);
        assert_eq!(f.format("{name} {age:red}", &data()), "John {age:red}");
    }

    #[test]
    fn uncolored_output_has_no_escapes() {
        let f = Formatter::new(false);
        let data = TemplateData::new().with("value", "x");
        assert_eq!(f.format("{value:red}", &data), "x");
        assert_eq!(f.format("${colors.red(value)}", &data), "x");
    }

    #[test]
    fn mixes_dialects() {
        let f = Formatter::new(false);
        assert_eq!(
            f.format("{name}: ${passedTests + failedTests}", &data()),
            "John: 1",
        );
    }

    #[test]
    fn placeholder_fallback_is_local() {
        let f = Formatter::new(false);
        assert_eq!(
            f.format("Hello ${name}, you are ${age} years old", &data()),
            "Hello John, you are ${age} years old",
        );
    }

    #[test]
    fn template_fallback_is_wide() {
        let f = Formatter::new(false).with_fallback(Fallback::Template);
        assert_eq!(
            f.format("Hello ${name}, you are ${age} years old", &data()),
            "Hello ${name}, you are ${age} years old",
        );
    }

    #[test]
    fn try_format_reports_first_error() {
        let f = Formatter::default();
        assert!(f.try_format("${missing}", &data()).is_err());
        assert_eq!(f.try_format("${name}", &data()).unwrap(), "John");
    }

    #[test]
    fn parses_fallback() {
        assert_eq!("Template".parse(), Ok(Fallback::Template));
        assert_eq!("placeholder".parse(), Ok(Fallback::Placeholder));
        assert!("other".parse::<Fallback>().is_err());
    }
}
