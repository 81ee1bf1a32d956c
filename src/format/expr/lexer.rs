// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lexical parsers of `${...}` expressions: literals, identifiers and
//! brace matching, all over a [`Span`] tracking byte offsets.

use derive_more::with_trait::Display;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{
        anychar, char, digit0, digit1, multispace0, one_of, satisfy,
    },
    combinator::{map, not, opt, peek, recognize, value},
    error::{ErrorKind, ParseError},
    multi::{fold_many0, many0_count},
    sequence::{delimited, pair, preceded, terminated, tuple},
    Err, IResult, Parser, Slice as _,
};
use nom_locate::LocatedSpan;

use crate::error::TemplateError;

/// Source of an expression, tracking byte offsets of its pieces.
pub(crate) type Span<'s> = LocatedSpan<&'s str>;

/// Maximum nesting of an expression.
pub(crate) const MAX_DEPTH: usize = 64;

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Skips whitespace in front of the given `parser`.
pub(crate) fn ws<'s, O, F>(
    parser: F,
) -> impl FnMut(Span<'s>) -> IResult<Span<'s>, O, Error<'s>>
where
    F: Parser<Span<'s>, O, Error<'s>>,
{
    preceded(multispace0, parser)
}

/// # Syntax
///
/// ```text
/// number   := (integer fraction? | '.' digit+) exponent?
/// integer  := digit (digit | '_')*
/// fraction := '.' digit*
/// exponent := ('e' | 'E') ('+' | '-')? digit+
/// ```
///
/// A `.` followed by an identifier is left for a property access, so
/// `1.toString` is `1` followed by `.toString`.
///
/// # Errors
///
/// ## Recoverable [`Error`]
///
/// - If `input` doesn't start with a number.
///
/// ## Irrecoverable [`Failure`]
///
/// - [`InvalidNumber`] if the matched digits don't form a number.
///
/// [`Error`]: Err::Error
/// [`Failure`]: Err::Failure
/// [`InvalidNumber`]: Error::InvalidNumber
pub(crate) fn number(input: Span<'_>) -> IResult<Span<'_>, f64, Error<'_>> {
    let integer =
        pair(digit1, take_while(|c: char| c.is_ascii_digit() || c == '_'));
    let fraction =
        pair(terminated(char('.'), not(satisfy(is_ident_start))), digit0);
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));

    let (rest, text) = recognize(pair(
        alt((
            recognize(pair(integer, opt(fraction))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(exponent),
    ))(input)?;

    text.replace('_', "")
        .parse()
        .map(|n| (rest, n))
        .map_err(|_| Error::InvalidNumber(text).failure())
}

/// # Syntax
///
/// ```text
/// identifier := (letter | '_' | '$') (letter | digit | '_' | '$')*
/// ```
pub(crate) fn identifier(
    input: Span<'_>,
) -> IResult<Span<'_>, Span<'_>, Error<'_>> {
    recognize(pair(satisfy(is_ident_start), take_while(is_ident_char)))(input)
}

/// Piece of a quoted string.
enum Fragment<'s> {
    /// Characters taken verbatim.
    Literal(Span<'s>),

    /// Single resolved character.
    Char(char),
}

/// Resolves a `\`-escape sequence. Unknown escapes stand for the escaped
/// character itself.
fn escaped_char(input: Span<'_>) -> IResult<Span<'_>, char, Error<'_>> {
    preceded(
        char('\\'),
        map(anychar, |c| match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            c => c,
        }),
    )(input)
}

/// Concatenates [`Fragment`]s matched by the given `fragment` parser.
fn fragments<'s, F>(
    fragment: F,
    input: Span<'s>,
) -> IResult<Span<'s>, String, Error<'s>>
where
    F: Parser<Span<'s>, Fragment<'s>, Error<'s>>,
{
    fold_many0(fragment, String::new, |mut out, fragment| {
        match fragment {
            Fragment::Literal(s) => out.push_str(s.fragment()),
            Fragment::Char(c) => out.push(c),
        }
        out
    })(input)
}

/// # Syntax
///
/// ```text
/// string := "'" (char | escape)* "'"
///         | '"' (char | escape)* '"'
/// ```
///
/// # Errors
///
/// ## Recoverable [`Error`]
///
/// - If `input` doesn't start with a quote.
///
/// ## Irrecoverable [`Failure`]
///
/// - [`Unterminated`] if the closing quote is missing.
///
/// [`Error`]: Err::Error
/// [`Failure`]: Err::Failure
/// [`Unterminated`]: Error::Unterminated
pub(crate) fn string<'s>(
    input: Span<'s>,
) -> IResult<Span<'s>, String, Error<'s>> {
    let (rest, quote) = one_of("'\"")(input)?;
    let normal = if quote == '"' { "\"\\" } else { "'\\" };

    let (rest, out) = fragments(
        alt((
            map(is_not(normal), Fragment::Literal),
            map(escaped_char, Fragment::Char),
        )),
        rest,
    )?;
    let (rest, _) = char(quote)(rest).map_err(|_: Err<Error<'s>>| {
        Error::Unterminated(input, "string").failure()
    })?;

    Ok((rest, out))
}

/// Literal text of a backtick string, up to its closing backtick or the
/// next `${`.
///
/// Never fails, returning an empty [`String`] if there is no text.
pub(crate) fn template_text(
    input: Span<'_>,
) -> IResult<Span<'_>, String, Error<'_>> {
    fragments(
        alt((
            map(is_not("`\\$"), Fragment::Literal),
            map(escaped_char, Fragment::Char),
            map(terminated(char('$'), not(char('{'))), Fragment::Char),
        )),
        input,
    )
}

/// Finds the byte offset of the `}` closing an expression starting at
/// `start` (right after its `${`), skipping nested braces and string
/// literals.
///
/// Returns [`None`] if there is no such `}`, or if braces nest deeper than
/// [`MAX_DEPTH`].
pub(crate) fn find_closing_brace(src: &str, start: usize) -> Option<usize> {
    let input = Span::new(src).slice(start..);
    balanced(input, 0)
        .ok()
        .map(|(rest, ())| rest.location_offset())
}

/// Skips code with balanced braces, stopping right before an unmatched `}`.
fn balanced(input: Span<'_>, depth: usize) -> IResult<Span<'_>, (), Error<'_>> {
    if depth > MAX_DEPTH {
        return Err(Error::TooDeep(input).failure());
    }
    value(
        (),
        terminated(
            many0_count(alt((
                value((), is_not("{}'\"`")),
                value((), string),
                |i| raw_template(i, depth),
                value(
                    (),
                    delimited(char('{'), |i| balanced(i, depth + 1), char('}')),
                ),
            ))),
            peek(char('}')),
        ),
    )(input)
}

/// Skips a backtick string, leaving its contents unresolved.
fn raw_template(
    input: Span<'_>,
    depth: usize,
) -> IResult<Span<'_>, (), Error<'_>> {
    value(
        (),
        delimited(
            char('`'),
            many0_count(alt((
                value((), is_not("`\\$")),
                value((), escaped_char),
                value(
                    (),
                    delimited(tag("${"), |i| balanced(i, depth + 1), char('}')),
                ),
                value((), char('$')),
            ))),
            char('`'),
        ),
    )(input)
}

/// Syntax error of an expression, positioned by its [`Span`].
#[derive(Debug, Display, Eq, PartialEq)]
pub(crate) enum Error<'s> {
    /// Input doesn't continue an expression.
    #[display("{}", unexpected(_0))]
    Unexpected(Span<'s>),

    /// Required delimiter is missing.
    #[display("expected `{_1}`")]
    Expected(Span<'s>, char),

    /// `.` isn't followed by a property name.
    #[display("expected property name after `.`")]
    PropertyName(Span<'s>),

    /// Literal opened here is never closed.
    #[display("unterminated {_1}")]
    Unterminated(Span<'s>, &'static str),

    /// Digits don't form a number.
    #[display("invalid number `{}`", _0.fragment())]
    InvalidNumber(Span<'s>),

    /// Expression nests deeper than [`MAX_DEPTH`].
    #[display("expression is nested too deeply")]
    TooDeep(Span<'s>),

    /// Recoverable error of a `nom` parser.
    #[display("{}", unexpected(_0))]
    Other(Span<'s>, ErrorKind),
}

impl<'s> Error<'s> {
    /// Hardens this [`Error`] into an irrecoverable [`Err::Failure`].
    pub(crate) fn failure(self) -> Err<Self> {
        Err::Failure(self)
    }

    /// Returns the position of this [`Error`] in the parsed source.
    fn span(&self) -> Span<'s> {
        match self {
            Self::Unexpected(span)
            | Self::Expected(span, _)
            | Self::PropertyName(span)
            | Self::Unterminated(span, _)
            | Self::InvalidNumber(span)
            | Self::TooDeep(span)
            | Self::Other(span, _) => *span,
        }
    }
}

impl<'s> ParseError<Span<'s>> for Error<'s> {
    fn from_error_kind(input: Span<'s>, kind: ErrorKind) -> Self {
        Self::Other(input, kind)
    }

    fn append(input: Span<'s>, kind: ErrorKind, other: Self) -> Self {
        if let Self::Other(..) = other {
            Self::from_error_kind(input, kind)
        } else {
            other
        }
    }
}

/// Describes the input at which an expression stopped parsing.
fn unexpected(span: &Span<'_>) -> String {
    let mut chars = span.chars();
    match (chars.next(), chars.next()) {
        (None, _) => "unexpected end of expression".to_owned(),
        (Some('='), next) if !matches!(next, Some('=' | '>')) => {
            "assignments are not supported".to_owned()
        }
        (Some(c), _) => format!("unexpected `{c}`"),
    }
}

/// Converts an error of parsing the given `src` into a
/// [`TemplateError::Syntax`].
pub(crate) fn syntax_error(err: Err<Error<'_>>, src: &str) -> TemplateError {
    match err {
        Err::Error(e) | Err::Failure(e) => {
            TemplateError::syntax(e.to_string(), e.span().location_offset())
        }
        Err::Incomplete(_) => {
            TemplateError::syntax("unexpected end of expression", src.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use nom::Slice as _;

    use super::*;

    fn complete<T>(res: IResult<Span<'_>, T, Error<'_>>) -> T {
        let (rest, out) = res.expect("ok");
        assert_eq!(*rest, "");
        out
    }

    #[test]
    fn numbers() {
        assert_eq!(complete(number(Span::new("22.5"))), 22.5);
        assert_eq!(complete(number(Span::new(".5"))), 0.5);
        assert_eq!(complete(number(Span::new("1e3"))), 1000.0);
        assert_eq!(complete(number(Span::new("2E-1"))), 0.2);
        assert_eq!(complete(number(Span::new("1_000"))), 1000.0);
        assert_eq!(complete(number(Span::new("3."))), 3.0);
    }

    #[test]
    fn number_followed_by_method() {
        let (rest, n) = number(Span::new("1.toString")).unwrap();
        assert_eq!(n, 1.0);
        assert_eq!(*rest, ".toString");
        assert_eq!(rest.location_offset(), 1);
    }

    #[test]
    fn identifiers() {
        let (rest, name) = identifier(Span::new("$total_2 + 1")).unwrap();
        assert_eq!(*name, "$total_2");
        assert_eq!(*rest, " + 1");

        assert!(identifier(Span::new("2x")).is_err());
    }

    #[test]
    fn resolves_string_escapes() {
        assert_eq!(complete(string(Span::new(r#""a\"b\n""#))), "a\"b\n");
        assert_eq!(complete(string(Span::new(r"'it\'s'"))), "it's");
        assert_eq!(complete(string(Span::new("''"))), "");
    }

    #[test]
    fn fails_on_unterminated_string() {
        let err = string(Span::new("'open")).expect_err("error");
        match err {
            Err::Failure(Error::Unterminated(span, "string")) => {
                assert_eq!(span.location_offset(), 0);
            }
            _ => panic!("wrong error: {err:?}"),
        }
        assert!(matches!(
            string(Span::new(r"'trailing\")),
            Err(Err::Failure(Error::Unterminated(..))),
        ));
    }

    #[test]
    fn template_text_stops_at_placeholder() {
        let (rest, text) =
            template_text(Span::new(r"cost: $5 \`${n}`")).unwrap();
        assert_eq!(text, "cost: $5 `");
        assert_eq!(*rest, "${n}`");
        assert_eq!(rest.location_offset(), 11);

        let (rest, text) = template_text(Span::new("`")).unwrap();
        assert_eq!(text, "");
        assert_eq!(*rest, "`");
    }

    #[test]
    fn describes_errors() {
        assert_eq!(
            Error::Unexpected(Span::new("")).to_string(),
            "unexpected end of expression",
        );
        assert_eq!(
            Error::Unexpected(Span::new("= 1")).to_string(),
            "assignments are not supported",
        );
        assert_eq!(
            Error::Unexpected(Span::new("=> 1")).to_string(),
            "unexpected `=`",
        );
        assert_eq!(
            syntax_error(
                Error::Expected(Span::new("a)").slice(1..), ']').failure(),
                "a)",
            ),
            TemplateError::syntax("expected `]`", 1),
        );
    }

    #[test]
    fn finds_closing_brace() {
        let src = "${a + {b}.c}rest";
        assert_eq!(find_closing_brace(src, 2), Some(11));

        let src = "${'}' + \"}\"}";
        assert_eq!(find_closing_brace(src, 2), Some(11));

        let src = "${`${x}}`}";
        assert_eq!(find_closing_brace(src, 2), Some(9));

        assert_eq!(find_closing_brace("${}", 2), Some(2));
        assert_eq!(find_closing_brace("${open", 2), None);
        assert_eq!(find_closing_brace("${'}", 2), None);
    }

    #[test]
    fn gives_up_on_deeply_nested_braces() {
        let (open, close) = ("{".repeat(100_000), "}".repeat(100_000));
        let src = format!("${{{open}{close}}}");
        assert_eq!(find_closing_brace(&src, 2), None);

        let depth = MAX_DEPTH / 2;
        let src = format!("${{{}{}}}", "{".repeat(depth), "}".repeat(depth));
        assert_eq!(find_closing_brace(&src, 2), Some(src.len() - 1));
    }
}
