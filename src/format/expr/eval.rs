// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sandboxed evaluation of parsed expressions.
//!
//! The only names an expression can reach are the fields of its
//! [`TemplateData`], the `colors` namespace and parameters of its own arrow
//! functions. There are no assignments and no loops. Arrow functions may
//! still recurse by applying themselves, so nesting of evaluation is bounded
//! by [`MAX_CALL_DEPTH`], and strings built by methods are bounded by
//! [`MAX_STRING_LEN`].

use std::{cell::Cell, rc::Rc};

use itertools::Itertools as _;

use super::ast::{Arrow, BinaryOp, Expr, LogicalOp, TemplatePart, UnaryOp};
use crate::{
    error::{TemplateError, TemplateResult},
    style,
    value::{number_to_string, TemplateData, Value},
};

/// Upper bound on strings produced by `repeat()`, `padStart()` and
/// `padEnd()`.
const MAX_STRING_LEN: usize = 1 << 16;

/// Upper bound on nested evaluation steps, arrow function calls included.
const MAX_CALL_DEPTH: usize = 128;

/// Arrow function value together with the parameters it captured.
#[derive(Debug, PartialEq)]
pub struct Lambda {
    arrow: Rc<Arrow>,
    captured: Vec<(String, Value)>,
}

/// Evaluator of [`Expr`]essions against a [`TemplateData`] record.
#[derive(Clone, Debug)]
pub struct Evaluator<'d> {
    data: &'d TemplateData,
    colored: bool,

    /// Number of evaluation steps currently in progress.
    depth: Cell<usize>,
}

impl<'d> Evaluator<'d> {
    /// Creates a new [`Evaluator`].
    ///
    /// If `colored` is `false`, style functions return their argument
    /// unchanged.
    #[must_use]
    pub const fn new(data: &'d TemplateData, colored: bool) -> Self {
        Self {
            data,
            colored,
            depth: Cell::new(0),
        }
    }

    /// Evaluates the given `expr`.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::Reference`] if `expr` uses an undefined name.
    /// - [`TemplateError::Type`] if `expr` calls a non-function, reads a
    ///   property of `undefined` or `null`, calls an unknown method, or
    ///   nests calls too deeply.
    pub fn eval(&self, expr: &Expr) -> TemplateResult<Value> {
        self.eval_in(expr, &[])
    }

    fn eval_in(
        &self,
        expr: &Expr,
        locals: &[(String, Value)],
    ) -> TemplateResult<Value> {
        let depth = self.depth.get();
        if depth >= MAX_CALL_DEPTH {
            return Err(TemplateError::type_error(
                "maximum call stack size exceeded",
            ));
        }
        self.depth.set(depth + 1);
        let result = self.eval_node(expr, locals);
        self.depth.set(depth);
        result
    }

    fn eval_node(
        &self,
        expr: &Expr,
        locals: &[(String, Value)],
    ) -> TemplateResult<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expr(e) => {
                            out.push_str(&self.eval_in(e, locals)?.to_string());
                        }
                    }
                }
                Ok(Value::String(out))
            }
            Expr::Ident(name) => self.lookup(name, locals),
            Expr::Array(items) => items
                .iter()
                .map(|e| self.eval_in(e, locals))
                .collect::<TemplateResult<_>>()
                .map(Value::Array),
            Expr::Member { object, property } => {
                let object = self.eval_in(object, locals)?;
                property_of(&object, property)
            }
            Expr::Index { object, index } => {
                let object = self.eval_in(object, locals)?;
                let key = self.eval_in(index, locals)?.to_string();
                property_of(&object, &key)
            }
            Expr::Call { callee, args } => self.call_expr(callee, args, locals),
            Expr::Unary { op, operand } => {
                if *op == UnaryOp::TypeOf {
                    return Ok(Value::String(
                        match self.eval_in(operand, locals) {
                            Ok(v) => v.type_name(),
                            Err(TemplateError::Reference { .. }) => "undefined",
                            Err(e) => return Err(e),
                        }
                        .to_owned(),
                    ));
                }
                let v = self.eval_in(operand, locals)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!v.is_truthy()),
                    UnaryOp::Neg => Value::Number(-v.to_number()),
                    UnaryOp::Plus | UnaryOp::TypeOf => {
                        Value::Number(v.to_number())
                    }
                })
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval_in(left, locals)?;
                let r = self.eval_in(right, locals)?;
                Ok(binary(*op, &l, &r))
            }
            Expr::Logical { op, left, right } => {
                let l = self.eval_in(left, locals)?;
                let short = match op {
                    LogicalOp::And => !l.is_truthy(),
                    LogicalOp::Or => l.is_truthy(),
                    LogicalOp::Nullish => !l.is_nullish(),
                };
                if short {
                    Ok(l)
                } else {
                    self.eval_in(right, locals)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_in(test, locals)?.is_truthy() {
                    self.eval_in(consequent, locals)
                } else {
                    self.eval_in(alternate, locals)
                }
            }
            Expr::Arrow(arrow) => Ok(Value::Lambda(Rc::new(Lambda {
                arrow: Rc::clone(arrow),
                captured: locals.to_vec(),
            }))),
        }
    }

    fn lookup(
        &self,
        name: &str,
        locals: &[(String, Value)],
    ) -> TemplateResult<Value> {
        if let Some((_, v)) = locals.iter().rev().find(|(n, _)| n == name) {
            return Ok(v.clone());
        }
        if name == "colors" {
            return Ok(Value::Colors);
        }
        self.data
            .lookup(name)
            .cloned()
            .ok_or_else(|| TemplateError::reference(name))
    }

    fn call_expr(
        &self,
        callee: &Expr,
        args: &[Expr],
        locals: &[(String, Value)],
    ) -> TemplateResult<Value> {
        let eval_args = |this: &Self| {
            args.iter()
                .map(|e| this.eval_in(e, locals))
                .collect::<TemplateResult<Vec<_>>>()
        };
        match callee {
            Expr::Member { object, property } => {
                let object = self.eval_in(object, locals)?;
                self.call_method(&object, property, eval_args(self)?)
            }
            Expr::Index { object, index } => {
                let object = self.eval_in(object, locals)?;
                let key = self.eval_in(index, locals)?.to_string();
                self.call_method(&object, &key, eval_args(self)?)
            }
            other => {
                let f = self.eval_in(other, locals)?;
                self.call(&f, eval_args(self)?, &describe(other))
            }
        }
    }

    /// Calls the given function `f` with the given `args`.
    fn call(
        &self,
        f: &Value,
        args: Vec<Value>,
        name: &str,
    ) -> TemplateResult<Value> {
        match f {
            Value::Style(style_name) => {
                let text =
                    args.first().cloned().unwrap_or_default().to_string();
                if !self.colored {
                    return Ok(Value::String(text));
                }
                let style = style::lookup(style_name).ok_or_else(|| {
                    TemplateError::UnknownStyle {
                        name: (*style_name).to_owned(),
                    }
                })?;
                Ok(Value::String(style.paint(&text)))
            }
            Value::Lambda(lambda) => {
                let mut locals = lambda.captured.clone();
                let mut args = args.into_iter();
                for param in &lambda.arrow.params {
                    let arg = args.next().unwrap_or_default();
                    locals.push((param.clone(), arg));
                }
                self.eval_in(&lambda.arrow.body, &locals)
            }
            _ => Err(TemplateError::type_error(format!(
                "{name} is not a function",
            ))),
        }
    }

    fn call_method(
        &self,
        object: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> TemplateResult<Value> {
        match object {
            Value::Colors | Value::Object(_) => {
                let f = property_of(object, name)?;
                self.call(&f, args, name)
            }
            Value::Undefined | Value::Null => Err(cannot_read(object, name)),
            Value::String(s) => string_method(s, name, &args),
            Value::Array(items) => self.array_method(items, name, args),
            Value::Number(n) => match name {
                "toFixed" => {
                    let digits = arg_number(&args, 0).unwrap_or(0.0);
                    if !(0.0..=100.0).contains(&digits) {
                        return Err(TemplateError::type_error(
                            "toFixed() digits argument must be between 0 \
                             and 100",
                        ));
                    }
                    #[allow(
                        clippy::cast_possible_truncation,
                        clippy::cast_sign_loss
                    )]
                    let digits = digits as usize;
                    Ok(Value::String(format!("{n:.digits$}")))
                }
                "toString" => Ok(Value::String(number_to_string(*n))),
                _ => Err(not_a_function(object, name)),
            },
            Value::Bool(b) if name == "toString" => {
                Ok(Value::String(b.to_string()))
            }
            _ => Err(not_a_function(object, name)),
        }
    }

    fn array_method(
        &self,
        items: &[Value],
        name: &str,
        args: Vec<Value>,
    ) -> TemplateResult<Value> {
        let callback = || {
            args.first()
                .filter(|f| matches!(f, Value::Lambda(_) | Value::Style(_)))
                .ok_or_else(|| {
                    TemplateError::type_error(format!(
                        "{} is not a function",
                        args.first().cloned().unwrap_or_default(),
                    ))
                })
        };
        let apply = |f: &Value, i: usize, item: &Value| {
            self.call(f, vec![item.clone(), Value::from(i)], name)
        };

        Ok(match name {
            "join" => {
                let sep = match args.first() {
                    None | Some(Value::Undefined) => ",".to_owned(),
                    Some(v) => v.to_string(),
                };
                Value::String(
                    items
                        .iter()
                        .map(|v| {
                            if v.is_nullish() {
                                String::new()
                            } else {
                                v.to_string()
                            }
                        })
                        .join(&sep),
                )
            }
            "toString" => {
                Value::String(Value::Array(items.to_vec()).to_string())
            }
            "map" => {
                let f = callback()?;
                Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| apply(f, i, item))
                        .collect::<TemplateResult<_>>()?,
                )
            }
            "filter" => {
                let f = callback()?;
                let mut out = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    if apply(f, i, item)?.is_truthy() {
                        out.push(item.clone());
                    }
                }
                Value::Array(out)
            }
            "find" => {
                let f = callback()?;
                for (i, item) in items.iter().enumerate() {
                    if apply(f, i, item)?.is_truthy() {
                        return Ok(item.clone());
                    }
                }
                Value::Undefined
            }
            "some" | "every" => {
                let f = callback()?;
                let every = name == "every";
                for (i, item) in items.iter().enumerate() {
                    if apply(f, i, item)?.is_truthy() != every {
                        return Ok(Value::Bool(!every));
                    }
                }
                Value::Bool(every)
            }
            "includes" => {
                let needle = args.first().cloned().unwrap_or_default();
                Value::Bool(items.iter().any(|v| *v == needle))
            }
            "indexOf" => {
                let needle = args.first().cloned().unwrap_or_default();
                items
                    .iter()
                    .position(|v| *v == needle)
                    .map_or(Value::Number(-1.0), Value::from)
            }
            "slice" => {
                let (from, to) = slice_bounds(&args, items.len());
                Value::Array(items[from..to].to_vec())
            }
            "concat" => {
                let mut out = items.to_vec();
                for arg in &args {
                    match arg {
                        Value::Array(more) => out.extend(more.iter().cloned()),
                        v => out.push(v.clone()),
                    }
                }
                Value::Array(out)
            }
            "reverse" => Value::Array(items.iter().rev().cloned().collect()),
            "at" => relative_index(&args, items.len())
                .map_or(Value::Undefined, |i| items[i].clone()),
            _ => return Err(not_a_function(&Value::Array(vec![]), name)),
        })
    }
}

/// Reads the `key` property of the given `object`.
fn property_of(object: &Value, key: &str) -> TemplateResult<Value> {
    Ok(match object {
        Value::Undefined | Value::Null => return Err(cannot_read(object, key)),
        Value::Colors => style::lookup(key)
            .map_or(Value::Undefined, |s| Value::Style(s.name)),
        Value::Object(fields) => fields.get(key).cloned().unwrap_or_default(),
        Value::String(s) => {
            if key == "length" {
                Value::from(s.chars().count())
            } else {
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map_or(Value::Undefined, |c| Value::String(c.to_string()))
            }
        }
        Value::Array(items) => {
            if key == "length" {
                Value::from(items.len())
            } else {
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default()
            }
        }
        Value::Bool(_)
        | Value::Number(_)
        | Value::Style(_)
        | Value::Lambda(_) => Value::Undefined,
    })
}

fn string_method(
    s: &str,
    name: &str,
    args: &[Value],
) -> TemplateResult<Value> {
    let len = s.chars().count();
    let string = |s: String| Ok(Value::String(s));

    match name {
        "toUpperCase" => string(s.to_uppercase()),
        "toLowerCase" => string(s.to_lowercase()),
        "trim" => string(s.trim().to_owned()),
        "trimStart" => string(s.trim_start().to_owned()),
        "trimEnd" => string(s.trim_end().to_owned()),
        "toString" => string(s.to_owned()),
        "padStart" | "padEnd" => {
            let target = checked_len(arg_number(args, 0).unwrap_or(0.0))?;
            let fill = arg_string(args, 1).unwrap_or_else(|| " ".to_owned());
            if target <= len || fill.is_empty() {
                return string(s.to_owned());
            }
            let pad: String = fill.chars().cycle().take(target - len).collect();
            string(if name == "padStart" {
                pad + s
            } else {
                s.to_owned() + &pad
            })
        }
        "repeat" => {
            let count = arg_number(args, 0).unwrap_or(0.0);
            let count = checked_len(count)?;
            if count.saturating_mul(s.len()) > MAX_STRING_LEN {
                return Err(TemplateError::type_error("invalid string length"));
            }
            string(s.repeat(count))
        }
        "slice" => {
            let (from, to) = slice_bounds(args, len);
            string(s.chars().skip(from).take(to - from).collect())
        }
        "at" => Ok(relative_index(args, len)
            .and_then(|i| s.chars().nth(i))
            .map_or(Value::Undefined, |c| Value::String(c.to_string()))),
        "charAt" => {
            let i = arg_number(args, 0).unwrap_or(0.0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let c = (i >= 0.0).then(|| s.chars().nth(i as usize)).flatten();
            string(c.map(String::from).unwrap_or_default())
        }
        "includes" | "startsWith" | "endsWith" => {
            let needle =
                arg_string(args, 0).unwrap_or_else(|| "undefined".into());
            Ok(Value::Bool(match name {
                "includes" => s.contains(&needle),
                "startsWith" => s.starts_with(&needle),
                _ => s.ends_with(&needle),
            }))
        }
        "indexOf" => {
            let needle =
                arg_string(args, 0).unwrap_or_else(|| "undefined".into());
            Ok(s.find(&needle).map_or(Value::Number(-1.0), |at| {
                Value::from(s[..at].chars().count())
            }))
        }
        "split" => Ok(Value::Array(match arg_string(args, 0) {
            None => vec![Value::from(s)],
            Some(sep) if sep.is_empty() => {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            }
            Some(sep) => s.split(sep.as_str()).map(Value::from).collect(),
        })),
        "replace" | "replaceAll" => {
            let undefined = || "undefined".to_owned();
            let from = arg_string(args, 0).unwrap_or_else(undefined);
            let to = arg_string(args, 1).unwrap_or_else(undefined);
            string(if name == "replace" {
                s.replacen(&from, &to, 1)
            } else {
                s.replace(&from, &to)
            })
        }
        "concat" => string(
            std::iter::once(s.to_owned())
                .chain(args.iter().map(ToString::to_string))
                .collect(),
        ),
        _ => Err(not_a_function(&Value::String(String::new()), name)),
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    let is_textual = |v: &Value| {
        !matches!(
            v,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_),
        )
    };

    match op {
        BinaryOp::Add if is_textual(l) || is_textual(r) => {
            Value::String(format!("{l}{r}"))
        }
        BinaryOp::Add => Value::Number(l.to_number() + r.to_number()),
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ord = match (l, r) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => l.to_number().partial_cmp(&r.to_number()),
            };
            Value::Bool(ord.is_some_and(|ord| match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::Le => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            }))
        }
        BinaryOp::StrictEq => Value::Bool(l == r),
        BinaryOp::StrictNe => Value::Bool(l != r),
        BinaryOp::LooseEq => Value::Bool(loose_eq(l, r)),
        BinaryOp::LooseNe => Value::Bool(!loose_eq(l, r)),
    }
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (a, b) if a.is_nullish() || b.is_nullish() => {
            a.is_nullish() && b.is_nullish()
        }
        (Value::Number(_) | Value::Bool(_), _)
        | (_, Value::Number(_) | Value::Bool(_)) => {
            l.to_number() == r.to_number()
        }
        (Value::String(_), Value::Array(_))
        | (Value::Array(_), Value::String(_)) => l.to_string() == r.to_string(),
        _ => l == r,
    }
}

/// Describes a callee for error messages.
fn describe(callee: &Expr) -> String {
    match callee {
        Expr::Ident(name) => name.clone(),
        Expr::Member { object, property } => {
            format!("{}.{property}", describe(object))
        }
        _ => "expression".to_owned(),
    }
}

fn cannot_read(object: &Value, key: &str) -> TemplateError {
    TemplateError::type_error(format!(
        "cannot read properties of {object} (reading '{key}')",
    ))
}

fn not_a_function(object: &Value, name: &str) -> TemplateError {
    TemplateError::type_error(format!(
        "{}.{name} is not a function",
        object.type_name(),
    ))
}

fn arg_number(args: &[Value], i: usize) -> Option<f64> {
    args.get(i).filter(|v| !v.is_nullish()).map(Value::to_number)
}

fn arg_string(args: &[Value], i: usize) -> Option<String> {
    args.get(i).filter(|v| !v.is_nullish()).map(ToString::to_string)
}

/// Converts a requested string length, rejecting negative and excessive
/// ones.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn checked_len(n: f64) -> TemplateResult<usize> {
    if n.is_nan() || n < 0.0 || n > MAX_STRING_LEN as f64 {
        return Err(TemplateError::type_error("invalid count value"));
    }
    Ok(n as usize)
}

/// Resolves a possibly negative index relative to `len`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn resolve_index(n: f64, len: usize) -> usize {
    if n < 0.0 {
        (len as f64 + n.trunc()).max(0.0) as usize
    } else {
        (n.trunc() as usize).min(len)
    }
}

/// Returns `[from, to)` bounds of a `slice(start, end)` call.
fn slice_bounds(args: &[Value], len: usize) -> (usize, usize) {
    let from = arg_number(args, 0)
        .filter(|n| !n.is_nan())
        .map_or(0, |n| resolve_index(n, len));
    let to = arg_number(args, 1)
        .filter(|n| !n.is_nan())
        .map_or(len, |n| resolve_index(n, len));
    (from, to.max(from))
}

/// Returns index of an `at(i)` call, if it's in bounds.
fn relative_index(args: &[Value], len: usize) -> Option<usize> {
    let n = arg_number(args, 0).unwrap_or(0.0);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    let i = if n < 0.0 {
        let back = (-n.trunc()) as usize;
        len.checked_sub(back)?
    } else {
        n.trunc() as usize
    };
    (i < len).then_some(i)
}
