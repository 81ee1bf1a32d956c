// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `${...}` expression dialect.
//!
//! Expressions are a restricted subset of JavaScript expressions: literals,
//! backtick strings, property access, calls, arrow functions, arithmetic,
//! comparisons, logical operators and the ternary operator. A fixed set of
//! string, array and number methods is available, together with the
//! `colors` namespace of [`STYLES`].
//!
//! [`STYLES`]: crate::style::STYLES

pub mod ast;
mod eval;
mod lexer;
mod parser;

pub(crate) use self::lexer::find_closing_brace;
#[doc(inline)]
pub use self::{
    ast::Expr,
    eval::{Evaluator, Lambda},
    parser::parse,
};
use crate::{error::TemplateResult, value::TemplateData};

/// Parses and evaluates the given `src` expression, stringifying its result.
///
/// # Errors
///
/// If `src` doesn't parse or its evaluation fails.
pub fn evaluate(
    src: &str,
    data: &TemplateData,
    colored: bool,
) -> TemplateResult<String> {
    let expr = parse(src)?;
    Evaluator::new(data, colored)
        .eval(&expr)
        .map(|v| v.to_string())
}
