// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parser of `${...}` expressions, climbing binary operator precedence.
//!
//! # Grammar
//!
//! ```text
//! expr        := arrow | conditional
//! arrow       := (ident | '(' (ident (',' ident)*)? ')') '=>' expr
//! conditional := binary ('?' expr ':' expr)?
//! binary      := unary (op unary)*          // by precedence
//! unary       := ('!' | '-' | '+' | 'typeof') unary | postfix
//! postfix     := primary ('.' ident | '[' expr ']' | '(' args ')')*
//! primary     := number | string | template | ident | '(' expr ')'
//!              | '[' args ']'
//! template    := '`' (text | '${' expr '}')* '`'
//! ```
//!
//! Every nested expression, unary operand, applied binary operator and
//! postfix access counts against [`MAX_DEPTH`], which bounds both the
//! recursion of parsing and the depth of the produced [`Expr`].

use std::rc::Rc;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0, one_of, satisfy},
    combinator::{cond, cut, map, not, opt, value},
    multi::separated_list0,
    sequence::{delimited, preceded, terminated},
    Err, IResult,
};

use super::{
    ast::{Arrow, BinaryOp, Expr, LogicalOp, TemplatePart, UnaryOp},
    lexer::{
        identifier, is_ident_char, number, string, syntax_error,
        template_text, ws, Error, Span, MAX_DEPTH,
    },
};
use crate::{error::TemplateResult, value::Value};

/// Binding power of binary operators, lowest first.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Nullish,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
}

/// Kind of an infix operator.
#[derive(Clone, Copy, Debug)]
enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

impl Infix {
    /// Combines the given operands with this operator.
    fn apply(self, left: Expr, right: Expr) -> Expr {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            Self::Binary(op) => Expr::Binary { op, left, right },
            Self::Logical(op) => Expr::Logical { op, left, right },
        }
    }
}

/// Parses the given `src` as a single expression.
///
/// # Errors
///
/// With [`TemplateError::Syntax`] if `src` is not a valid expression, or if
/// it nests too deeply.
///
/// [`TemplateError::Syntax`]: crate::TemplateError::Syntax
pub fn parse(src: &str) -> TemplateResult<Expr> {
    let (rest, expr) = terminated(|i| expression(i, 0), multispace0)(
        Span::new(src),
    )
    .map_err(|e| syntax_error(e, src))?;

    if !rest.is_empty() {
        return Err(syntax_error(Error::Unexpected(rest).failure(), src));
    }
    Ok(expr)
}

/// Increments the nesting `depth`, failing once it exceeds [`MAX_DEPTH`].
fn deeper(input: Span<'_>, depth: usize) -> Result<usize, Err<Error<'_>>> {
    if depth < MAX_DEPTH {
        Ok(depth + 1)
    } else {
        Err(Error::TooDeep(input).failure())
    }
}

/// Matches the given `delimiter`, failing with [`Error::Expected`] if it's
/// absent.
fn expect<'s>(
    delimiter: char,
) -> impl FnMut(Span<'s>) -> IResult<Span<'s>, char, Error<'s>> {
    move |input| {
        let (input, _) = multispace0(input)?;
        char(delimiter)(input).map_err(|_: Err<Error<'s>>| {
            Error::Expected(input, delimiter).failure()
        })
    }
}

fn expression(
    input: Span<'_>,
    depth: usize,
) -> IResult<Span<'_>, Expr, Error<'_>> {
    let depth = deeper(input, depth)?;
    alt((move |i| arrow(i, depth), move |i| conditional(i, depth)))(input)
}

fn param(input: Span<'_>) -> IResult<Span<'_>, String, Error<'_>> {
    map(ws(identifier), |name| (*name.fragment()).to_owned())(input)
}

/// # Errors
///
/// ## Recoverable [`Error`]
///
/// - If `input` doesn't start with parameters followed by `=>`.
///
/// ## Irrecoverable [`Failure`]
///
/// - If the body after `=>` doesn't parse.
///
/// [`Error`]: Err::Error
/// [`Failure`]: Err::Failure
fn arrow(input: Span<'_>, depth: usize) -> IResult<Span<'_>, Expr, Error<'_>> {
    let (input, params) = alt((
        map(param, |p| vec![p]),
        delimited(
            ws(char('(')),
            separated_list0(ws(char(',')), param),
            ws(char(')')),
        ),
    ))(input)?;
    let (input, _) = ws(tag("=>"))(input)?;
    let (input, body) = cut(|i| expression(i, depth))(input)?;

    Ok((input, Expr::Arrow(Rc::new(Arrow { params, body }))))
}

fn conditional(
    input: Span<'_>,
    depth: usize,
) -> IResult<Span<'_>, Expr, Error<'_>> {
    let (input, test) = binary(input, Precedence::Lowest, depth)?;
    let Ok((rest, _)) = ws(char('?'))(input) else {
        return Ok((input, test));
    };

    let (rest, consequent) = cut(|i| expression(i, depth))(rest)?;
    let (rest, _) = expect(':')(rest)?;
    let (rest, alternate) = cut(|i| expression(i, depth))(rest)?;

    Ok((
        rest,
        Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        },
    ))
}

/// Folds operators binding tighter than `min` into a left-associative tree.
fn binary(
    input: Span<'_>,
    min: Precedence,
    mut depth: usize,
) -> IResult<Span<'_>, Expr, Error<'_>> {
    let (mut input, mut left) = unary(input, depth)?;
    loop {
        let Ok((rest, (prec, op))) = infix(input) else {
            return Ok((input, left));
        };
        if prec <= min {
            return Ok((input, left));
        }
        depth = deeper(input, depth)?;
        let (rest, right) = cut(|i| binary(i, prec, depth))(rest)?;
        left = op.apply(left, right);
        input = rest;
    }
}

fn infix(
    input: Span<'_>,
) -> IResult<Span<'_>, (Precedence, Infix), Error<'_>> {
    use Infix::{Binary, Logical};
    use Precedence as P;

    let op = |token: &'static str, prec, kind| value((prec, kind), tag(token));

    // Longer operators go first, so `<=` is never taken for `<`.
    ws(alt((
        op("??", P::Nullish, Logical(LogicalOp::Nullish)),
        op("||", P::Or, Logical(LogicalOp::Or)),
        op("&&", P::And, Logical(LogicalOp::And)),
        op("===", P::Equality, Binary(BinaryOp::StrictEq)),
        op("!==", P::Equality, Binary(BinaryOp::StrictNe)),
        op("==", P::Equality, Binary(BinaryOp::LooseEq)),
        op("!=", P::Equality, Binary(BinaryOp::LooseNe)),
        op("<=", P::Comparison, Binary(BinaryOp::Le)),
        op(">=", P::Comparison, Binary(BinaryOp::Ge)),
        op("<", P::Comparison, Binary(BinaryOp::Lt)),
        op(">", P::Comparison, Binary(BinaryOp::Gt)),
        op("+", P::Term, Binary(BinaryOp::Add)),
        op("-", P::Term, Binary(BinaryOp::Sub)),
        op("*", P::Factor, Binary(BinaryOp::Mul)),
        op("/", P::Factor, Binary(BinaryOp::Div)),
        op("%", P::Factor, Binary(BinaryOp::Rem)),
    )))(input)
}

fn unary(input: Span<'_>, depth: usize) -> IResult<Span<'_>, Expr, Error<'_>> {
    let (rest, op) = opt(ws(alt((
        value(UnaryOp::Not, terminated(char('!'), not(char('=')))),
        value(UnaryOp::Neg, char('-')),
        value(UnaryOp::Plus, char('+')),
        value(
            UnaryOp::TypeOf,
            terminated(tag("typeof"), not(satisfy(is_ident_char))),
        ),
    ))))(input)?;
    let Some(op) = op else {
        return postfix(input, depth);
    };

    let depth = deeper(input, depth)?;
    let (rest, operand) = cut(|i| unary(i, depth))(rest)?;

    Ok((
        rest,
        Expr::Unary {
            op,
            operand: Box::new(operand),
        },
    ))
}

fn postfix(
    input: Span<'_>,
    mut depth: usize,
) -> IResult<Span<'_>, Expr, Error<'_>> {
    let (mut input, mut expr) = primary(input, depth)?;
    loop {
        let Ok((rest, access)) = ws(one_of(".[("))(input) else {
            return Ok((input, expr));
        };
        depth = deeper(input, depth)?;

        (input, expr) = match access {
            '.' => {
                let (rest, property) = ws(identifier)(rest)
                    .map_err(|_| Error::PropertyName(rest).failure())?;
                let property = (*property.fragment()).to_owned();
                let object = Box::new(expr);
                (rest, Expr::Member { object, property })
            }
            '[' => {
                let (rest, index) = cut(|i| expression(i, depth))(rest)?;
                let (rest, _) = expect(']')(rest)?;
                let (object, index) = (Box::new(expr), Box::new(index));
                (rest, Expr::Index { object, index })
            }
            _ => {
                let (rest, args) = list(rest, ')', depth)?;
                let callee = Box::new(expr);
                (rest, Expr::Call { callee, args })
            }
        };
    }
}

/// Parses comma separated expressions up to the `close` delimiter. A
/// trailing comma is allowed after a non-empty list.
fn list(
    input: Span<'_>,
    close: char,
    depth: usize,
) -> IResult<Span<'_>, Vec<Expr>, Error<'_>> {
    let (input, items) =
        separated_list0(ws(char(',')), |i| expression(i, depth))(input)?;
    let (input, _) = cond(!items.is_empty(), opt(ws(char(','))))(input)?;
    let (input, _) = expect(close)(input)?;
    Ok((input, items))
}

/// # Errors
///
/// ## Recoverable [`Error`]
///
/// - [`Unexpected`] if `input` doesn't start with an operand.
///
/// [`Error`]: Err::Error
/// [`Unexpected`]: Error::Unexpected
fn primary(
    input: Span<'_>,
    depth: usize,
) -> IResult<Span<'_>, Expr, Error<'_>> {
    let (input, _) = multispace0(input)?;
    alt((
        map(number, |n| Expr::Literal(Value::Number(n))),
        map(string, |s| Expr::Literal(Value::String(s))),
        |i| template(i, depth),
        map(identifier, keyword),
        |i| group(i, depth),
        |i| array(i, depth),
    ))(input)
    .map_err(|e| match e {
        Err::Error(_) => Err::Error(Error::Unexpected(input)),
        e @ (Err::Failure(_) | Err::Incomplete(_)) => e,
    })
}

/// Resolves literal keywords among identifiers.
fn keyword(name: Span<'_>) -> Expr {
    match *name.fragment() {
        "true" => Expr::Literal(Value::Bool(true)),
        "false" => Expr::Literal(Value::Bool(false)),
        "null" => Expr::Literal(Value::Null),
        "undefined" => Expr::Literal(Value::Undefined),
        name => Expr::Ident(name.to_owned()),
    }
}

fn group(input: Span<'_>, depth: usize) -> IResult<Span<'_>, Expr, Error<'_>> {
    delimited(char('('), cut(|i| expression(i, depth)), expect(')'))(input)
}

fn array(input: Span<'_>, depth: usize) -> IResult<Span<'_>, Expr, Error<'_>> {
    preceded(char('['), map(|i| list(i, ']', depth), Expr::Array))(input)
}

/// # Errors
///
/// ## Recoverable [`Error`]
///
/// - If `input` doesn't start with a backtick.
///
/// ## Irrecoverable [`Failure`]
///
/// - [`Unterminated`] if the closing backtick is missing.
/// - If an embedded `${...}` expression doesn't parse.
///
/// [`Error`]: Err::Error
/// [`Failure`]: Err::Failure
/// [`Unterminated`]: Error::Unterminated
fn template<'s>(
    input: Span<'s>,
    depth: usize,
) -> IResult<Span<'s>, Expr, Error<'s>> {
    let (mut rest, _) = char('`')(input)?;
    let mut parts = Vec::new();
    loop {
        let (after, text) = template_text(rest)?;
        if !text.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        if let Ok((after, _)) = char::<_, Error<'s>>('`')(after) {
            return Ok((after, Expr::Template(parts)));
        }

        let (after, _) = tag("${")(after).map_err(|_: Err<Error<'s>>| {
            Error::Unterminated(input, "template string").failure()
        })?;
        let (after, expr) = cut(|i| expression(i, depth))(after)?;
        let (after, _) = expect('}')(after)?;
        parts.push(TemplatePart::Expr(expr));
        rest = after;
    }
}
